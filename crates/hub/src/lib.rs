//! Room registry and broadcast hub
//!
//! Tracks which live connections are in which named room and fans messages
//! out to a room's members. Membership is owned exclusively by the registry
//! and mutated only through join/leave; a send failure to one member never
//! affects delivery to the others.

mod connection;
mod error;
mod hub;
mod message;
mod registry;

pub use connection::{ChannelSink, ClientSink, ConnectionId, SinkClosed};
pub use error::{HubError, Result};
pub use hub::ChatHub;
pub use message::{HistoryEntry, ServerMessage};
pub use registry::RoomRegistry;
