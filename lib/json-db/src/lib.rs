//! Room backend reading a `{ "data": [...] }` document from disk.
//!
//! The file is re-read on every fetch, so edits show up on the next load.
//! A missing file means there is nothing to apply yet.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use agora_messenger::room_service::{Fetched, Payload, RoomService};
use agora_messenger::Room;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Couldn't access rooms file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed rooms file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Couldn't serialize rooms")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct Db {
    path: PathBuf,
}

impl Db {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Db { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the file with `rooms` wrapped in a payload document.
    pub async fn store(&self, rooms: &[Room]) -> Result<(), Error> {
        let document = serde_json::to_string_pretty(&Payload::new(rooms)).map_err(Error::Serialize)?;
        tokio::fs::write(&self.path, document).await
            .map_err(|source| Error::Io { path: self.path.clone(), source })?;
        tracing::debug!(path = %self.path.display(), rooms = rooms.len(), "rooms file written");
        Ok(())
    }
}

impl RoomService for Db {
    type Error = Error;

    async fn fetch_rooms(&self) -> Result<Fetched<Vec<Room>>, Error> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "rooms file not found");
                return Ok(None)
            },
            Err(source) => return Err(Error::Io { path: self.path.clone(), source }),
        };

        let payload = serde_json::from_str(&content)
            .map_err(|source| Error::Parse { path: self.path.clone(), source })?;
        Ok(Some(payload))
    }
}
