use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod loader;
pub mod messages;
pub mod room_service;
pub mod rooms;
pub mod users;

#[cfg(test)]
mod test_service;

pub type MessageId = Uuid;
pub type RoomId = Uuid;
pub type UserId = Uuid;

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        User { id, username: username.into() }
    }
}

/// A single authored entry of a room. The author is an embedded snapshot of
/// the user at the time the message was served.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub author: User,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(author: User, text: impl Into<String>) -> Self {
        Message {
            id: Uuid::new_v4(),
            text: text.into(),
            author,
            timestamp: Utc::now(),
        }
    }
}

/// A chat channel. `messages` are kept in chronological order, `owner`
/// references one of `users` by id.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub messages: Vec<Message>,
    pub users: Vec<User>,
    pub owner: UserId,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>, messages: Vec<Message>, users: Vec<User>, owner: UserId) -> Self {
        Room { id, name: name.into(), messages, users, owner }
    }

    pub fn owner_user(&self) -> Option<&User> {
        self.users.iter().find(|user| user.id == self.owner)
    }

    pub fn owner_is_member(&self) -> bool {
        self.owner_user().is_some()
    }
}
