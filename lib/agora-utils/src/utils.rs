#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CaseInsensitiveString(String);

impl From<&str> for CaseInsensitiveString {
    fn from(value: &str) -> Self {
        Self(value.to_lowercase())
    }
}

impl std::fmt::Display for CaseInsensitiveString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn log_internal_error(error: impl std::fmt::Display) {
    tracing::error!("internal error: {:#}", error);
}

/// Interprets an environment-style switch such as `USE_MOCK_DB=1`.
/// Returns `None` for values that are neither truthy nor falsy.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "On"] {
            assert_eq!(parse_flag(value), Some(true), "{value}");
        }
    }

    #[test]
    fn parses_falsy_values() {
        for value in ["", "0", "false", "No", "OFF"] {
            assert_eq!(parse_flag(value), Some(false), "{value}");
        }
    }

    #[test]
    fn case_insensitive_strings_compare_lowercased() {
        assert_eq!(CaseInsensitiveString::from("Пользователь1"), CaseInsensitiveString::from("пользователь1"));
        assert_ne!(CaseInsensitiveString::from("User1"), CaseInsensitiveString::from("User2"));
        assert_eq!(CaseInsensitiveString::from("MiXeD").to_string(), "mixed");
    }

    #[test]
    fn rejects_gibberish() {
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag("2"), None);
    }
}
