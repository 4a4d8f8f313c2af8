//! Realtime gateway for the shelter platform
//!
//! Runs one message pump per live connection: inbound frames are parsed and
//! routed to chat handling, room handling, or the adoption flow, which
//! drives the transaction coordinator and broadcasts the outcome to the
//! room. Transport is out of scope; a connection is an inbound frame
//! channel plus a delivery sink.

mod adoption;
mod connection;
mod registry;
mod wire;

pub use adoption::{AdoptionFlow, AdoptionResult};
pub use connection::{Gateway, GatewayConfig};
pub use registry::{register_service, LocalServiceRegistry, RegistryError, ServiceRegistry};
pub use wire::{ClientCommand, ParseError};
