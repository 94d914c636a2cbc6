use tokio::sync::watch;

use agora_utils::utils::CaseInsensitiveString;

use crate::loader::{LoadState, Loader};
use crate::room_service::RoomService;
use crate::User;

/// Directory of chat participants, loaded the same way as rooms.
#[derive(Clone)]
pub struct UserLoader<S> {
    service: S,
    loader: Loader<Vec<User>>,
}

impl<S: RoomService> UserLoader<S> {
    pub fn new(service: S) -> Self {
        UserLoader { service, loader: Loader::new("users") }
    }

    pub fn users(&self) -> Vec<User> {
        self.loader.data()
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let username = CaseInsensitiveString::from(username);
        self.loader
            .state()
            .data()
            .iter()
            .find(|user| CaseInsensitiveString::from(user.username.as_str()) == username)
            .cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.loader.last_error()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<Vec<User>>> {
        self.loader.subscribe()
    }

    pub async fn load_users(&self) {
        self.loader.load(self.service.fetch_users()).await;
    }
}
