//! End-to-end gateway tests over in-process channel transports

use shelter_common::{AnimalPost, PostStatus};
use shelter_coordinator::{
    Coordinator, CoordinatorConfig, NotificationParticipant, PostParticipant,
};
use shelter_gateway::{Gateway, GatewayConfig};
use shelter_hub::{ChannelSink, ChatHub, RoomRegistry, ServerMessage};
use shelter_store::{MemoryEventStore, MemoryKvStore, MemoryPostStore, PostStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct Harness {
    gateway: Arc<Gateway>,
    registry: Arc<RoomRegistry>,
    posts: Arc<MemoryPostStore>,
}

async fn harness() -> Harness {
    let posts = Arc::new(MemoryPostStore::new());
    posts
        .insert(AnimalPost::new(42, "Cat found", "Tabby", "Main St"))
        .await
        .unwrap();
    let events = Arc::new(MemoryEventStore::new());

    let mut coordinator = Coordinator::new(
        Arc::new(MemoryKvStore::new()),
        CoordinatorConfig::default(),
    );
    coordinator.register(Arc::new(PostParticipant::new(posts.clone())));
    coordinator.register(Arc::new(NotificationParticipant::new(events.clone())));

    let registry = Arc::new(RoomRegistry::new());
    let hub = Arc::new(ChatHub::new(
        registry.clone(),
        events,
        Duration::from_secs(5),
    ));
    let gateway = Arc::new(Gateway::new(
        hub,
        Arc::new(coordinator),
        GatewayConfig::default(),
    ));

    Harness {
        gateway,
        registry,
        posts,
    }
}

/// One simulated client: an inbound frame sender plus a reply receiver
struct Client {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
    task: tokio::task::JoinHandle<()>,
}

impl Client {
    async fn connect(harness: &Harness) -> Self {
        let (tx, inbound) = mpsc::unbounded_channel();
        let (sink, rx) = ChannelSink::pair();
        let gateway = harness.gateway.clone();
        let task = tokio::spawn(async move {
            gateway.run_connection(inbound, Arc::new(sink)).await;
        });

        let mut client = Self { tx, rx, task };
        // Every connection lands in the lobby and sees its own join notice
        assert!(matches!(client.recv().await, ServerMessage::System { .. }));
        client
    }

    fn send(&self, frame: &str) {
        self.tx.send(frame.to_string()).unwrap();
    }

    async fn recv(&mut self) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("no reply within timeout")
            .expect("connection closed")
    }

    async fn disconnect(self) {
        drop(self.tx);
        drop(self.rx);
        self.task.await.unwrap();
    }
}

#[tokio::test]
async fn test_chat_message_is_acked() {
    let harness = harness().await;
    let mut client = Client::connect(&harness).await;

    client.send(r#"{"message_id":"m-1","username":"alice","message":"hi"}"#);
    assert_eq!(client.recv().await, ServerMessage::saved("m-1"));
}

#[tokio::test]
async fn test_chat_without_message_is_rejected() {
    let harness = harness().await;
    let mut client = Client::connect(&harness).await;

    client.send(r#"{"message_id":"m-2","username":"alice"}"#);
    match client.recv().await {
        ServerMessage::MessageSaved {
            message_id,
            status,
            error,
        } => {
            assert_eq!(message_id, "m-2");
            assert_eq!(status, "failure");
            assert!(error.is_some());
        }
        other => panic!("unexpected reply: {:?}", other),
    }
}

#[tokio::test]
async fn test_join_room_switches_membership() {
    let harness = harness().await;
    let mut client = Client::connect(&harness).await;

    client.send(r#"{"action":"join_room","room":"shelter-1"}"#);
    match client.recv().await {
        ServerMessage::System { message } => {
            assert_eq!(message, "A new user has joined the room: shelter-1");
        }
        other => panic!("unexpected reply: {:?}", other),
    }

    assert_eq!(harness.registry.rooms(), vec!["shelter-1".to_string()]);
}

#[tokio::test]
async fn test_history_round_trip() {
    let harness = harness().await;
    let mut client = Client::connect(&harness).await;

    client.send(r#"{"username":"alice","message":"hi"}"#);
    assert!(matches!(client.recv().await, ServerMessage::MessageSaved { .. }));

    client.send(r#"{"action":"get_history"}"#);
    match client.recv().await {
        ServerMessage::ChatHistory { history } => {
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].username, "alice");
            assert_eq!(history[0].message, "hi");
        }
        other => panic!("unexpected reply: {:?}", other),
    }
}

#[tokio::test]
async fn test_adoption_success_notifies_room() {
    let harness = harness().await;
    let mut alice = Client::connect(&harness).await;
    let mut bob = Client::connect(&harness).await;
    // Alice sees bob's join notice
    assert!(matches!(alice.recv().await, ServerMessage::System { .. }));

    alice.send(r#"{"action":"adopt","post_id":42,"username":"alice"}"#);

    assert_eq!(
        alice.recv().await,
        ServerMessage::Adoption {
            status: "success".into(),
            post_id: 42,
            error: None,
        }
    );

    // Both room members get the adoption notice
    let notice = ServerMessage::system("alice adopted post 42");
    assert_eq!(alice.recv().await, notice);
    assert_eq!(bob.recv().await, notice);

    let post = harness.posts.get(42).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Unavailable);
}

#[tokio::test]
async fn test_adoption_failure_reply_is_generic() {
    let harness = harness().await;
    harness
        .posts
        .update_status(42, PostStatus::Unavailable)
        .await
        .unwrap();
    let mut client = Client::connect(&harness).await;

    client.send(r#"{"action":"adopt","post_id":42,"username":"alice"}"#);
    assert_eq!(
        client.recv().await,
        ServerMessage::Adoption {
            status: "failure".into(),
            post_id: 42,
            error: Some("adoption failed".into()),
        }
    );
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let harness = harness().await;
    let mut client = Client::connect(&harness).await;

    client.send("not json at all");
    assert_eq!(
        client.recv().await,
        ServerMessage::error("Invalid JSON format")
    );

    // The connection survives and keeps working
    client.send(r#"{"message_id":"m-3","username":"alice","message":"still here"}"#);
    assert_eq!(client.recv().await, ServerMessage::saved("m-3"));
}

#[tokio::test]
async fn test_disconnect_leaves_room() {
    let harness = harness().await;
    let client = Client::connect(&harness).await;
    assert_eq!(harness.registry.rooms(), vec!["lobby".to_string()]);

    client.disconnect().await;
    assert!(harness.registry.rooms().is_empty());
}
