use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::room_service::{Fetched, RoomService};
use crate::Room;

#[derive(Debug, thiserror::Error)]
#[error("room service unavailable")]
pub struct Unavailable;

pub type Response = Result<Fetched<Vec<Room>>, Unavailable>;

struct Scripted {
    gate: Option<oneshot::Receiver<()>>,
    response: Response,
}

/// Answers `fetch_rooms` calls with queued responses, in call order. A gated
/// response is held back until its sender fires or is dropped.
#[derive(Clone, Default)]
pub struct ScriptedService {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: Response) {
        self.script.lock().unwrap().push_back(Scripted { gate: None, response });
    }

    pub fn respond_when_released(&self, response: Response) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.script.lock().unwrap().push_back(Scripted { gate: Some(gate), response });
        release
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoomService for ScriptedService {
    type Error = Unavailable;

    async fn fetch_rooms(&self) -> Response {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        let Some(Scripted { gate, response }) = scripted else {
            return Ok(None);
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        response
    }
}

pub mod fixtures {
    use uuid::Uuid;

    use crate::{Message, Room, User};

    pub fn user(username: &str) -> User {
        User::new(Uuid::new_v4(), username)
    }

    /// A room owned by the first of `users`, with one greeting per user.
    pub fn room(name: &str, users: Vec<User>) -> Room {
        let owner = users.first().map(|user| user.id).unwrap_or_else(Uuid::new_v4);
        let messages = users
            .iter()
            .map(|user| Message::new(user.clone(), format!("hello from {}", user.username)))
            .collect();
        Room::new(Uuid::new_v4(), name, messages, users, owner)
    }
}
