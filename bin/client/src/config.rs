use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use agora_utils::utils::parse_flag;

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

#[derive(Parser, Debug)]
#[command(name = "agora-client", about = "Loads chat rooms from a backend and prints them")]
pub struct Args {
    /// Use the in-memory mock database (also enabled by USE_MOCK_DB)
    #[arg(long)]
    mock: bool,
    /// Deployment environment; falls back to NODE_ENV, then development
    #[arg(long = "env", env = "APP_ENV", value_enum)]
    app_env: Option<AppEnv>,
    #[arg(long, env = "AGORA_ROOMS_FILE", help = "JSON file with a { \"data\": [rooms] } document")]
    rooms_file: Option<PathBuf>,
    #[arg(long, value_name = "SECONDS", help = "Keep reloading rooms at this interval until Ctrl-C")]
    watch: Option<u64>,
    #[arg(long, value_name = "PATH", help = "Write the loaded rooms to a JSON file")]
    export: Option<PathBuf>,
}

/// Environment variables read outside of clap.
#[derive(Default, Debug)]
pub struct EnvVars {
    pub use_mock_db: Option<String>,
    pub node_env: Option<String>,
}

impl EnvVars {
    pub fn from_process() -> Self {
        EnvVars {
            use_mock_db: std::env::var("USE_MOCK_DB").ok(),
            node_env: std::env::var("NODE_ENV").ok(),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Backend {
    Mock,
    File(PathBuf),
}

#[derive(Debug)]
pub struct Config {
    pub app_env: AppEnv,
    pub backend: Backend,
    pub reload_every: Option<Duration>,
    pub export: Option<PathBuf>,
}

impl Config {
    pub fn resolve(args: Args, env: &EnvVars) -> Result<Self> {
        let app_env = match (args.app_env, env.node_env.as_deref()) {
            (Some(app_env), _) => app_env,
            (None, Some(value)) => AppEnv::from_str(value.trim(), true)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("NODE_ENV has unrecognized value {value:?}"))?,
            (None, None) => AppEnv::Development,
        };

        let mock_from_env = match env.use_mock_db.as_deref() {
            Some(value) => parse_flag(value)
                .with_context(|| format!("USE_MOCK_DB has unrecognized value {value:?}"))?,
            None => false,
        };
        let use_mock = args.mock || mock_from_env;

        let backend = if use_mock {
            if app_env == AppEnv::Production {
                bail!("Mock database can't be used in production");
            }
            Backend::Mock
        } else {
            let path = args.rooms_file
                .context("Rooms file must be specified when the mock database is not used")?;
            Backend::File(path)
        };

        let reload_every = match args.watch {
            Some(0) => bail!("Watch interval must be at least one second"),
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => None,
        };

        Ok(Config { app_env, backend, reload_every, export: args.export })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> EnvVars {
        EnvVars::default()
    }

    fn use_mock_db(value: &str) -> EnvVars {
        EnvVars { use_mock_db: Some(value.into()), node_env: None }
    }

    fn node_env(value: &str) -> EnvVars {
        EnvVars { use_mock_db: None, node_env: Some(value.into()) }
    }

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("agora-client").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn mock_flag_selects_mock_backend() {
        let config = Config::resolve(args(&["--mock"]), &no_env()).unwrap();
        assert_eq!(config.backend, Backend::Mock);
    }

    #[test]
    fn env_variable_selects_mock_backend() {
        let config = Config::resolve(args(&["--env", "test"]), &use_mock_db("true")).unwrap();
        assert_eq!(config.backend, Backend::Mock);
        assert_eq!(config.app_env, AppEnv::Test);
    }

    #[test]
    fn falsy_env_variable_needs_rooms_file() {
        assert!(Config::resolve(args(&[]), &use_mock_db("0")).is_err());

        let config = Config::resolve(args(&["--rooms-file", "rooms.json"]), &use_mock_db("0")).unwrap();
        assert_eq!(config.backend, Backend::File("rooms.json".into()));
    }

    #[test]
    fn rejects_unrecognized_env_value() {
        assert!(Config::resolve(args(&["--mock"]), &use_mock_db("perhaps")).is_err());
    }

    #[test]
    fn refuses_mock_in_production() {
        assert!(Config::resolve(args(&["--mock", "--env", "production"]), &no_env()).is_err());
    }

    #[test]
    fn node_env_sets_environment() {
        let config = Config::resolve(args(&["--mock"]), &node_env("test")).unwrap();
        assert_eq!(config.app_env, AppEnv::Test);

        assert!(Config::resolve(args(&["--mock"]), &node_env("Production")).is_err());
        assert!(Config::resolve(args(&["--mock"]), &node_env("staging")).is_err());
    }

    #[test]
    fn env_flag_overrides_node_env() {
        let config = Config::resolve(args(&["--mock", "--env", "test"]), &node_env("production")).unwrap();
        assert_eq!(config.app_env, AppEnv::Test);
        assert_eq!(config.backend, Backend::Mock);
    }

    #[test]
    fn defaults_to_development() {
        let config = Config::resolve(args(&["--mock"]), &no_env()).unwrap();
        assert_eq!(config.app_env, AppEnv::Development);
    }

    #[test]
    fn parses_watch_interval() {
        let config = Config::resolve(args(&["--mock", "--watch", "5"]), &no_env()).unwrap();
        assert_eq!(config.reload_every, Some(Duration::from_secs(5)));

        assert!(Config::resolve(args(&["--mock", "--watch", "0"]), &no_env()).is_err());
    }
}
