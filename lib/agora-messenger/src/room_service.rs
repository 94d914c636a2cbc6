use std::future::Future;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Message, Room, RoomId, User};

/// Response envelope of the room service, `{ "data": ... }` on the wire.
/// A missing or null `data` means there is nothing to apply.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Payload<T> {
    pub data: Option<T>,
}

impl<T> Payload<T> {
    pub fn new(data: T) -> Self {
        Payload { data: Some(data) }
    }

    pub fn empty() -> Self {
        Payload { data: None }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// What a fetch resolves to: `None` when the service had nothing to send.
pub type Fetched<T> = Option<Payload<T>>;

// written as a macro to use Self::Error
macro_rules! async_result {
    ($t:ty) => {
        impl Future<Output = Result<$t, Self::Error>> + Send
    };
}

pub trait RoomService: 'static + Send + Sync + Clone {
    type Error: 'static + std::error::Error + Send + Sync;

    fn fetch_rooms(&self) -> async_result!(Fetched<Vec<Room>>);

    /// Participants of all rooms, deduplicated by id in first-seen order.
    fn fetch_users(&self) -> async_result!(Fetched<Vec<User>>) {
        async move {
            let rooms = match self.fetch_rooms().await?.and_then(Payload::into_data) {
                Some(rooms) => rooms,
                None => return Ok(None),
            };

            let mut seen = HashSet::new();
            let users = rooms
                .into_iter()
                .flat_map(|room| room.users)
                .filter(|user| seen.insert(user.id))
                .collect();
            Ok(Some(Payload::new(users)))
        }
    }

    /// Messages of one room. An unknown room yields nothing to apply.
    fn fetch_messages(&self, room_id: &RoomId) -> async_result!(Fetched<Vec<Message>>) {
        let room_id = *room_id;
        async move {
            let messages = self
                .fetch_rooms().await?
                .and_then(Payload::into_data)
                .and_then(|rooms| rooms.into_iter().find(|room| room.id == room_id))
                .map(|room| Payload::new(room.messages));
            Ok(messages)
        }
    }
}
