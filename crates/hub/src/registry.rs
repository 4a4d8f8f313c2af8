//! Room membership and broadcast fan-out

use crate::connection::{ClientSink, ConnectionId};
use crate::message::ServerMessage;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    /// Room name -> members
    rooms: HashMap<String, HashMap<ConnectionId, Arc<dyn ClientSink>>>,

    /// Which room each connection is in; exactly one room per connection
    member_rooms: HashMap<ConnectionId, String>,

    /// Connections whose sink failed a delivery, awaiting cleanup
    stale: HashSet<ConnectionId>,
}

/// Registry of live connections grouped into named rooms
///
/// All membership mutations happen under one mutex, so a broadcast snapshot
/// can never observe a half-updated member set. Rooms are created on first
/// join and deleted when the last member leaves.
#[derive(Default)]
pub struct RoomRegistry {
    inner: Mutex<Inner>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room, leaving its current room first
    ///
    /// Broadcasts a system "left" notice to the old room and a "joined"
    /// notice to the new one. Joining the room the connection is already in
    /// is a no-op.
    pub async fn join(&self, conn: ConnectionId, sink: Arc<dyn ClientSink>, room: &str) {
        let previous = {
            let mut inner = self.inner.lock();

            let previous = inner.member_rooms.get(&conn).cloned();
            if previous.as_deref() == Some(room) {
                return;
            }
            if let Some(ref old_room) = previous {
                Self::remove_member(&mut inner, conn, old_room);
            }

            inner
                .rooms
                .entry(room.to_string())
                .or_default()
                .insert(conn, sink);
            inner.member_rooms.insert(conn, room.to_string());
            previous
        };

        if let Some(old_room) = previous {
            self.broadcast(
                &old_room,
                ServerMessage::system(format!("A user has left the room: {}", old_room)),
            )
            .await;
        }
        self.broadcast(
            room,
            ServerMessage::system(format!("A new user has joined the room: {}", room)),
        )
        .await;
        tracing::debug!(%conn, room, "joined room");
    }

    /// Remove a connection from whatever room it is in
    ///
    /// Broadcasts a system "left" notice to the remaining members, if any.
    /// Returns the room that was left.
    pub async fn leave(&self, conn: ConnectionId) -> Option<String> {
        let room = {
            let mut inner = self.inner.lock();
            let room = inner.member_rooms.remove(&conn)?;
            Self::remove_member(&mut inner, conn, &room);
            inner.stale.remove(&conn);
            room
        };

        self.broadcast(
            &room,
            ServerMessage::system(format!("A user has left the room: {}", room)),
        )
        .await;
        tracing::debug!(%conn, room, "left room");
        Some(room)
    }

    /// Deliver a message to every current member of a room
    ///
    /// Sends fan out concurrently and are all awaited before returning. A
    /// failed send marks that member stale and is otherwise swallowed; it
    /// never fails the broadcast or blocks delivery to other members.
    pub async fn broadcast(&self, room: &str, message: ServerMessage) {
        let members: Vec<(ConnectionId, Arc<dyn ClientSink>)> = {
            let inner = self.inner.lock();
            match inner.rooms.get(room) {
                Some(members) => members.iter().map(|(id, s)| (*id, s.clone())).collect(),
                None => return,
            }
        };

        let sends = members.iter().map(|(conn, sink)| {
            let message = message.clone();
            async move { (*conn, sink.deliver(message).await) }
        });

        let mut failed = Vec::new();
        for (conn, result) in join_all(sends).await {
            if result.is_err() {
                tracing::warn!(%conn, room, "dropping broadcast to closed connection");
                failed.push(conn);
            }
        }

        if !failed.is_empty() {
            let mut inner = self.inner.lock();
            inner.stale.extend(failed);
        }
    }

    /// Remove members whose sinks have failed deliveries
    pub fn cleanup(&self) {
        let mut inner = self.inner.lock();
        let stale: Vec<ConnectionId> = inner.stale.drain().collect();
        for conn in stale {
            if let Some(room) = inner.member_rooms.remove(&conn) {
                Self::remove_member(&mut inner, conn, &room);
            }
        }
    }

    /// Room the connection is currently in
    pub fn room_of(&self, conn: ConnectionId) -> Option<String> {
        self.inner.lock().member_rooms.get(&conn).cloned()
    }

    /// Current members of a room
    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.inner
            .lock()
            .rooms
            .get(room)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Names of all live rooms
    pub fn rooms(&self) -> Vec<String> {
        self.inner.lock().rooms.keys().cloned().collect()
    }

    fn remove_member(inner: &mut Inner, conn: ConnectionId, room: &str) {
        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(&conn);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
    }
}
