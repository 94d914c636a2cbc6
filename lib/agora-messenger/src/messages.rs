use tokio::sync::watch;

use crate::loader::{LoadState, Loader};
use crate::room_service::RoomService;
use crate::{Message, RoomId};

/// Messages of a single room, in chronological order.
#[derive(Clone)]
pub struct MessageLoader<S> {
    service: S,
    room_id: RoomId,
    loader: Loader<Vec<Message>>,
}

impl<S: RoomService> MessageLoader<S> {
    pub fn new(service: S, room_id: RoomId) -> Self {
        MessageLoader { service, room_id, loader: Loader::new("messages") }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn messages(&self) -> Vec<Message> {
        self.loader.data()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.loader.last_error()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<Vec<Message>>> {
        self.loader.subscribe()
    }

    pub async fn load_messages(&self) {
        self.loader.load(self.service.fetch_messages(&self.room_id)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room_service::Payload;
    use crate::test_service::fixtures::{room, user};
    use crate::test_service::ScriptedService;

    #[tokio::test]
    async fn loads_messages_of_its_room() {
        let general = room("general", vec![user("alice"), user("bob")]);
        let random = room("random", vec![user("carol")]);
        let service = ScriptedService::new();
        service.respond(Ok(Some(Payload::new(vec![random, general.clone()]))));
        let loader = MessageLoader::new(service, general.id);

        loader.load_messages().await;

        assert_eq!(loader.messages(), general.messages);
        assert_eq!(loader.room_id(), general.id);
    }

    #[tokio::test]
    async fn keeps_messages_when_room_disappears() {
        let general = room("general", vec![user("alice")]);
        let service = ScriptedService::new();
        service.respond(Ok(Some(Payload::new(vec![general.clone()]))));
        service.respond(Ok(Some(Payload::new(vec![]))));
        let loader = MessageLoader::new(service, general.id);

        loader.load_messages().await;
        loader.load_messages().await;

        assert_eq!(loader.messages(), general.messages);
        assert_eq!(loader.last_error(), None);
    }
}
