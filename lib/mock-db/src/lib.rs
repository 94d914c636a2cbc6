use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use agora_messenger::room_service::{Fetched, Payload, RoomService};
use agora_messenger::{Message, MessageId, Room, RoomId, User, UserId};
use agora_utils::utils::CaseInsensitiveString;

const UNKNOWN_USERNAME: &str = "<unknown user>";

struct RoomRecord {
    id: RoomId,
    name: String,
    owner: UserId,
    members: Vec<UserId>,
}

struct MessageRecord {
    id: MessageId,
    room_id: RoomId,
    author: UserId,
    text: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

impl MessageRecord {
    fn new(room_id: RoomId, author: UserId, text: &str) -> Self {
        let id = uuid::Uuid::new_v4();
        let text = text.into();
        let timestamp = chrono::Utc::now();
        MessageRecord { id, room_id, author, text, timestamp }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Thread poisoning error")]
    ThreadPoisonError,
    #[error("Mock database is switched to unavailable")]
    Unavailable,
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_value: PoisonError<T>) -> Self {
        Self::ThreadPoisonError
    }
}

/// In-memory stand-in for the room backend.
#[derive(Clone)]
pub struct Db {
    users: Arc<Mutex<Vec<(UserId, String)>>>,
    rooms: Arc<Mutex<Vec<RoomRecord>>>,
    messages: Arc<Mutex<Vec<MessageRecord>>>,
    available: Arc<AtomicBool>,
}

impl Db {
    pub fn empty() -> Self {
        Db {
            users: Arc::new(Mutex::new(vec![])),
            rooms: Arc::new(Mutex::new(vec![])),
            messages: Arc::new(Mutex::new(vec![])),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A database seeded with demo users, rooms and messages.
    pub fn new() -> Self {
        let mut users_vec = vec![
            (uuid::Uuid::new_v4(), "User1".to_owned()),
            (uuid::Uuid::new_v4(), "User2".to_owned()),
            (uuid::Uuid::new_v4(), "User3".to_owned()),
            (uuid::Uuid::new_v4(), "Пользователь1".to_owned()),
        ];

        for i in 5..20 {
            users_vec.push((uuid::Uuid::new_v4(), format!("User {i}")))
        };

        let mut username_id_map = HashMap::new();
        for (id, username) in users_vec.iter() {
            username_id_map.insert(username.clone(), *id);
        }

        let general = RoomRecord {
            id: uuid::Uuid::new_v4(),
            name: "General".into(),
            owner: username_id_map["User1"],
            members: users_vec.iter().map(|(id, _)| *id).collect(),
        };
        let pair = RoomRecord {
            id: uuid::Uuid::new_v4(),
            name: "User1 & User2".into(),
            owner: username_id_map["User2"],
            members: vec![username_id_map["User2"], username_id_map["User1"]],
        };
        let notes = RoomRecord {
            id: uuid::Uuid::new_v4(),
            name: "Notes".into(),
            owner: username_id_map["User3"],
            members: vec![username_id_map["User3"]],
        };

        let messages_vec = vec![
            (&pair, "User2", "Hello 1"),
            (&pair, "User1", "Hello 2"),
            (&pair, "User2", "Hello 3"),
            (&pair, "User1", "Hello 4 😊"),
            (&notes, "User3", "Hello myself 1"),
            (&notes, "User3", "Hello myself 2"),
            (&general, "User1", "Welcome to General"),
            (&general, "User3", "Hello 5"),
        ];

        let mut messages_vec = {
            let mut res = vec![];
            for (room, author, text) in messages_vec {
                res.push(MessageRecord::new(room.id, username_id_map[author], text));
            }
            res
        };

        for i in 0..10 {
            messages_vec.push(MessageRecord::new(general.id, username_id_map["Пользователь1"], &format!("Привет! ({i})")));
        };

        for (user_id, _) in users_vec.iter().skip(4) {
            messages_vec.push(MessageRecord::new(general.id, *user_id, "Привет"));
        };

        Db {
            users: Arc::new(Mutex::new(users_vec)),
            rooms: Arc::new(Mutex::new(vec![general, pair, notes])),
            messages: Arc::new(Mutex::new(messages_vec)),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// While unavailable every fetch fails with [`Error::Unavailable`].
    pub fn set_available(&self, available: bool) {
        tracing::info!(available, "mock database availability changed");
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns `None` if the username is already taken.
    pub fn create_user(&self, username: &str) -> Result<Option<UserId>, Error> {
        let mut table_locked = self.users.lock()?;

        let requested = CaseInsensitiveString::from(username);
        if table_locked.iter().any(|record| CaseInsensitiveString::from(record.1.as_str()) == requested) {
            return Ok(None)
        };

        let user_id = uuid::Uuid::new_v4();
        table_locked.push((user_id, username.to_owned()));
        Ok(Some(user_id))
    }

    /// Creates a room with its owner as the only member. Returns `None` if
    /// the owner does not exist.
    pub fn create_room(&self, name: &str, owner: &UserId) -> Result<Option<RoomId>, Error> {
        if !self.users.lock()?.iter().any(|(id, _)| id == owner) {
            return Ok(None)
        };

        let id = uuid::Uuid::new_v4();
        self.rooms.lock()?.push(RoomRecord { id, name: name.to_owned(), owner: *owner, members: vec![*owner] });
        Ok(Some(id))
    }

    /// Returns `false` if the room or user does not exist.
    pub fn join_room(&self, room_id: &RoomId, user_id: &UserId) -> Result<bool, Error> {
        if !self.users.lock()?.iter().any(|(id, _)| id == user_id) {
            return Ok(false)
        };

        let mut rooms_lock = self.rooms.lock()?;
        let Some(room) = rooms_lock.iter_mut().find(|room| room.id == *room_id) else {
            return Ok(false)
        };
        if !room.members.contains(user_id) {
            room.members.push(*user_id);
        }
        Ok(true)
    }

    /// Appends a message to a room. Returns `None` unless the author is a
    /// member of the room.
    pub fn post_message(&self, room_id: &RoomId, author: &UserId, text: &str) -> Result<Option<MessageId>, Error> {
        let is_member = self.rooms.lock()?
            .iter()
            .any(|room| room.id == *room_id && room.members.contains(author));
        if !is_member {
            return Ok(None)
        };

        let message = MessageRecord::new(*room_id, *author, text);
        let id = message.id;
        self.messages.lock()?.push(message);
        Ok(Some(id))
    }

    fn check_available(&self) -> Result<(), Error> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Unavailable)
        }
    }

    fn usernames(&self) -> Result<HashMap<UserId, String>, Error> {
        Ok(self.users.lock()?.iter().cloned().collect())
    }

    fn user(usernames: &HashMap<UserId, String>, id: &UserId) -> User {
        let username = usernames.get(id).map(String::as_str).unwrap_or(UNKNOWN_USERNAME);
        User::new(*id, username)
    }

    fn room_messages(&self, usernames: &HashMap<UserId, String>, room_id: &RoomId) -> Result<Vec<Message>, Error> {
        let res = self.messages.lock()?
            .iter()
            .filter(|record| record.room_id == *room_id)
            .map(|record| Message {
                id: record.id,
                text: record.text.clone(),
                author: Self::user(usernames, &record.author),
                timestamp: record.timestamp,
            })
            .collect();
        Ok(res)
    }
}

impl RoomService for Db {
    type Error = Error;

    async fn fetch_rooms(&self) -> Result<Fetched<Vec<Room>>, Error> {
        self.check_available()?;
        let usernames = self.usernames()?;

        let records: Vec<(RoomId, String, UserId, Vec<UserId>)> = self.rooms.lock()?
            .iter()
            .map(|room| (room.id, room.name.clone(), room.owner, room.members.clone()))
            .collect();

        let mut rooms = Vec::with_capacity(records.len());
        for (id, name, owner, members) in records {
            let messages = self.room_messages(&usernames, &id)?;
            let users = members.iter().map(|member| Self::user(&usernames, member)).collect();
            rooms.push(Room::new(id, name, messages, users, owner));
        }
        Ok(Some(Payload::new(rooms)))
    }

    async fn fetch_users(&self) -> Result<Fetched<Vec<User>>, Error> {
        self.check_available()?;
        let users = self.users.lock()?
            .iter()
            .map(|(id, username)| User::new(*id, username.clone()))
            .collect();
        Ok(Some(Payload::new(users)))
    }

    async fn fetch_messages(&self, room_id: &RoomId) -> Result<Fetched<Vec<Message>>, Error> {
        self.check_available()?;
        if !self.rooms.lock()?.iter().any(|room| room.id == *room_id) {
            return Ok(None)
        };
        let usernames = self.usernames()?;
        Ok(Some(Payload::new(self.room_messages(&usernames, room_id)?)))
    }
}
