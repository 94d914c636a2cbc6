use tokio::sync::watch;

use crate::loader::{LoadState, Loader};
use crate::room_service::{Payload, RoomService};
use crate::Room;

/// Keeps the list of rooms served by a [`RoomService`], for a UI to read
/// and observe. `load_rooms` is the only way the list changes.
#[derive(Clone)]
pub struct RoomLoader<S> {
    service: S,
    loader: Loader<Vec<Room>>,
}

impl<S: RoomService> RoomLoader<S> {
    pub fn new(service: S) -> Self {
        RoomLoader { service, loader: Loader::new("rooms") }
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.loader.data()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.loader.last_error()
    }

    pub fn state(&self) -> LoadState<Vec<Room>> {
        self.loader.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<Vec<Room>>> {
        self.loader.subscribe()
    }

    /// Fetches the rooms and replaces the held list with the result. When the
    /// service has nothing to send or fails, the previous list is kept.
    pub async fn load_rooms(&self) {
        let fetch = async {
            let fetched = self.service.fetch_rooms().await;
            if let Ok(Some(Payload { data: Some(rooms) })) = &fetched {
                for room in rooms.iter().filter(|room| !room.owner_is_member()) {
                    tracing::warn!(room = %room.id, owner = %room.owner, "room owner is not among its users");
                }
            }
            fetched
        };
        self.loader.load(fetch).await;
    }
}
