//! Integration tests driving adoptions across the post and event stores

use async_trait::async_trait;
use shelter_common::{AnimalPost, Operation, PostStatus, TransactionId};
use shelter_coordinator::{
    AdoptionPayload, Coordinator, CoordinatorConfig, CoordinatorError, NotificationParticipant,
    Participant, PostParticipant, TransactionState,
};
use shelter_lock::LockKey;
use shelter_store::{EventStore, MemoryEventStore, MemoryKvStore, MemoryPostStore, PostStore};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    coordinator: Arc<Coordinator>,
    posts: Arc<MemoryPostStore>,
    events: Arc<MemoryEventStore>,
}

async fn fixture() -> Fixture {
    let posts = Arc::new(MemoryPostStore::new());
    let events = Arc::new(MemoryEventStore::new());
    posts
        .insert(AnimalPost::new(42, "Dog found", "Collie, friendly", "Elm St"))
        .await
        .unwrap();

    let mut coordinator = Coordinator::new(
        Arc::new(MemoryKvStore::new()),
        CoordinatorConfig::default(),
    );
    coordinator.register(Arc::new(PostParticipant::new(posts.clone())));
    coordinator.register(Arc::new(NotificationParticipant::new(events.clone())));

    Fixture {
        coordinator: Arc::new(coordinator),
        posts,
        events,
    }
}

fn payload(username: &str) -> AdoptionPayload {
    AdoptionPayload {
        post_id: 42,
        username: username.into(),
        room: "shelter-1".into(),
    }
}

#[tokio::test]
async fn test_end_to_end_adoption() {
    let fx = fixture().await;
    let t1 = TransactionId::new();

    // Prepare both participants, then commit
    fx.coordinator
        .prepare(t1, "post", Operation::Adopt, payload("alice"))
        .await
        .unwrap();
    fx.coordinator
        .prepare(t1, "notification", Operation::Adopt, payload("alice"))
        .await
        .unwrap();
    fx.coordinator.commit(t1).await.unwrap();

    assert_eq!(
        fx.coordinator.transaction_state(t1).await,
        Some(TransactionState::Committed)
    );

    // The post flipped and the adoption event landed in the room log
    let post = fx.posts.get(42).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Unavailable);

    let log = fx.events.find_by_room("shelter-1").await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].username, "alice");

    // A later adoption attempt fails the precondition
    let t3 = TransactionId::new();
    let err = fx
        .coordinator
        .prepare(t3, "post", Operation::Adopt, payload("carol"))
        .await
        .unwrap_err();
    assert_eq!(err.reason_code(), "precondition_failed");
    assert_eq!(
        fx.coordinator.transaction_state(t3).await,
        Some(TransactionState::Aborted)
    );
}

#[tokio::test]
async fn test_concurrent_prepares_exactly_one_wins() {
    let fx = fixture().await;
    let t1 = TransactionId::new();
    let t2 = TransactionId::new();

    let c1 = fx.coordinator.clone();
    let c2 = fx.coordinator.clone();
    let (r1, r2) = tokio::join!(
        c1.prepare(t1, "post", Operation::Adopt, payload("alice")),
        c2.prepare(t2, "post", Operation::Adopt, payload("bob")),
    );

    let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);

    let loser = if r1.is_err() { r1 } else { r2 };
    assert_eq!(loser.unwrap_err().reason_code(), "locked");
}

#[tokio::test]
async fn test_second_prepare_while_first_holds_lock() {
    let fx = fixture().await;
    let t1 = TransactionId::new();
    let t2 = TransactionId::new();

    fx.coordinator
        .prepare(t1, "post", Operation::Adopt, payload("alice"))
        .await
        .unwrap();

    let err = fx
        .coordinator
        .prepare(t2, "post", Operation::Adopt, payload("bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::ResourceLocked(_)));

    // The losing transaction left no record behind
    assert_eq!(fx.coordinator.transaction_state(t2).await, None);
}

#[tokio::test]
async fn test_rollback_releases_the_lock() {
    let fx = fixture().await;
    let t1 = TransactionId::new();
    let t2 = TransactionId::new();

    fx.coordinator
        .prepare(t1, "post", Operation::Adopt, payload("alice"))
        .await
        .unwrap();
    fx.coordinator.rollback(t1).await.unwrap();
    assert_eq!(
        fx.coordinator.transaction_state(t1).await,
        Some(TransactionState::RolledBack)
    );

    // Post is untouched and the lock is free for the next transaction
    let post = fx.posts.get(42).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Available);
    fx.coordinator
        .prepare(t2, "post", Operation::Adopt, payload("bob"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_commit_and_rollback_one_wins() {
    for _ in 0..10 {
        let fx = fixture().await;
        let txn = TransactionId::new();
        fx.coordinator
            .prepare(txn, "post", Operation::Adopt, payload("alice"))
            .await
            .unwrap();
        fx.coordinator
            .prepare(txn, "notification", Operation::Adopt, payload("alice"))
            .await
            .unwrap();

        let c1 = fx.coordinator.clone();
        let c2 = fx.coordinator.clone();
        let (commit, rollback) = tokio::join!(c1.commit(txn), c2.rollback(txn));

        // Calls on one id are serialized; the loser observes the winner's
        // terminal state instead of interleaving with it.
        assert!(commit.is_ok() ^ rollback.is_ok());

        let state = fx.coordinator.transaction_state(txn).await.unwrap();
        let post = fx.posts.get(42).await.unwrap().unwrap();
        let log = fx.events.find_by_room("shelter-1").await.unwrap();
        if commit.is_ok() {
            assert_eq!(state, TransactionState::Committed);
            assert_eq!(post.status, PostStatus::Unavailable);
            assert_eq!(log.len(), 1);
        } else {
            assert_eq!(state, TransactionState::RolledBack);
            assert_eq!(post.status, PostStatus::Available);
            assert!(log.is_empty());
        }

        // Either way the locks are free afterwards: a fresh transaction
        // never sees a lock conflict.
        let next = TransactionId::new();
        if let Err(err) = fx
            .coordinator
            .prepare(next, "post", Operation::Adopt, payload("bob"))
            .await
        {
            assert_ne!(err.reason_code(), "locked");
        }
    }
}

#[tokio::test]
async fn test_commit_after_rollback_is_state_error() {
    let fx = fixture().await;
    let t1 = TransactionId::new();

    fx.coordinator
        .prepare(t1, "post", Operation::Adopt, payload("alice"))
        .await
        .unwrap();
    fx.coordinator.rollback(t1).await.unwrap();

    let err = fx.coordinator.commit(t1).await.unwrap_err();
    assert_eq!(err.reason_code(), "transaction_state_error");

    // No side effect from the rejected commit
    let post = fx.posts.get(42).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Available);
}

#[tokio::test]
async fn test_precondition_failure_leaves_lock_free() {
    let fx = fixture().await;
    fx.posts
        .update_status(42, PostStatus::Unavailable)
        .await
        .unwrap();

    let t1 = TransactionId::new();
    let err = fx
        .coordinator
        .prepare(t1, "post", Operation::Adopt, payload("alice"))
        .await
        .unwrap_err();
    assert_eq!(err.reason_code(), "precondition_failed");

    // The lock was released on the failure path: a transaction against a
    // now-available post succeeds.
    fx.posts
        .update_status(42, PostStatus::Available)
        .await
        .unwrap();
    let t2 = TransactionId::new();
    fx.coordinator
        .prepare(t2, "post", Operation::Adopt, payload("bob"))
        .await
        .unwrap();
}

/// Participant whose precondition check never completes
struct StalledParticipant;

#[async_trait]
impl Participant for StalledParticipant {
    fn resource_type(&self) -> &'static str {
        "stalled"
    }

    fn lock_key(&self, payload: &AdoptionPayload) -> LockKey {
        LockKey::Post {
            id: payload.post_id,
        }
    }

    async fn check_precondition(
        &self,
        _payload: &AdoptionPayload,
        _operation: Operation,
    ) -> shelter_coordinator::Result<bool> {
        std::future::pending().await
    }

    async fn apply(
        &self,
        _payload: &AdoptionPayload,
        _operation: Operation,
    ) -> shelter_coordinator::Result<()> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_participant_surfaces_timeout() {
    let mut coordinator = Coordinator::new(
        Arc::new(MemoryKvStore::new()),
        CoordinatorConfig::default(),
    );
    coordinator.register(Arc::new(StalledParticipant));

    let err = coordinator
        .prepare(
            TransactionId::new(),
            "stalled",
            Operation::Adopt,
            payload("alice"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Timeout));
    assert_eq!(err.reason_code(), "timeout");
}

#[tokio::test(start_paused = true)]
async fn test_rollback_safe_after_timed_out_prepare() {
    let mut coordinator = Coordinator::new(
        Arc::new(MemoryKvStore::new()),
        CoordinatorConfig::default(),
    );
    coordinator.register(Arc::new(StalledParticipant));

    let txn_id = TransactionId::new();
    let _ = coordinator
        .prepare(txn_id, "stalled", Operation::Adopt, payload("alice"))
        .await
        .unwrap_err();

    // The caller's cleanup rollback must not panic or corrupt anything even
    // though the prepare never succeeded.
    let err = coordinator.rollback(txn_id).await.unwrap_err();
    assert_eq!(err.reason_code(), "transaction_state_error");
}
