//! Runs the whole platform in one process over channel transports
//!
//! Two clients connect, chat in the lobby, and race to adopt the same post;
//! exactly one adoption succeeds and the room sees the notice.

use shelter_common::AnimalPost;
use shelter_coordinator::{
    Coordinator, CoordinatorConfig, NotificationParticipant, PostParticipant,
};
use shelter_gateway::{register_service, Gateway, GatewayConfig, LocalServiceRegistry};
use shelter_hub::{ChannelSink, ChatHub, RoomRegistry, ServerMessage};
use shelter_store::{MemoryEventStore, MemoryKvStore, MemoryPostStore, PostStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct Client {
    name: &'static str,
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Client {
    fn connect(gateway: &Arc<Gateway>, name: &'static str) -> Self {
        let (tx, inbound) = mpsc::unbounded_channel();
        let (sink, rx) = ChannelSink::pair();
        let gateway = gateway.clone();
        tokio::spawn(async move {
            gateway.run_connection(inbound, Arc::new(sink)).await;
        });
        Self { name, tx, rx }
    }

    fn send(&self, frame: &str) {
        let _ = self.tx.send(frame.to_string());
    }

    async fn drain(&mut self) {
        while let Ok(Some(reply)) =
            tokio::time::timeout(Duration::from_millis(200), self.rx.recv()).await
        {
            println!(
                "[{}] {}",
                self.name,
                serde_json::to_string(&reply).expect("serializable reply")
            );
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let posts = Arc::new(MemoryPostStore::new());
    posts
        .insert(AnimalPost::new(
            1,
            "Found: grey tabby",
            "Friendly, answers to nothing",
            "Riverside Park",
        ))
        .await
        .expect("seed post");
    let events = Arc::new(MemoryEventStore::new());

    let mut coordinator = Coordinator::new(
        Arc::new(MemoryKvStore::new()),
        CoordinatorConfig::default(),
    );
    coordinator.register(Arc::new(PostParticipant::new(posts.clone())));
    coordinator.register(Arc::new(NotificationParticipant::new(events.clone())));

    let registry = Arc::new(RoomRegistry::new());
    let hub = Arc::new(ChatHub::new(
        registry,
        events,
        Duration::from_secs(5),
    ));
    let gateway = Arc::new(Gateway::new(
        hub,
        Arc::new(coordinator),
        GatewayConfig::default(),
    ));

    let discovery = LocalServiceRegistry::new();
    register_service(&discovery, "ChatService", "ws://localhost:6789").await;

    let mut alice = Client::connect(&gateway, "alice");
    let mut bob = Client::connect(&gateway, "bob");

    alice.send(r#"{"username":"alice","message":"anyone seen the tabby from the park?"}"#);
    bob.send(r#"{"action":"get_history"}"#);

    // Both race for the same post; one wins, one gets a failure reply
    alice.send(r#"{"action":"adopt","post_id":1,"username":"alice"}"#);
    bob.send(r#"{"action":"adopt","post_id":1,"username":"bob"}"#);

    alice.drain().await;
    bob.drain().await;

    let post = posts.get(1).await.expect("store").expect("post");
    println!("post 1 is now {}", post.status);
}
