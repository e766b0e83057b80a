// stratus-api: Async Rust client for the Stratus IoT control plane.
//
// One client, four API planes (data, flow, pairing, registry) plus the
// realtime rooms socket. Resource endpoints live in their own modules as
// inherent methods on `Client`; `stratus-model` owns the DTO<->domain
// conversions they delegate to.

pub mod blocks;
pub mod client;
pub mod config;
pub mod datatree;
pub mod devices;
pub mod error;
pub mod listeners;
pub mod realtime;
pub mod transport;

mod endpoints;
mod flow;
mod groups;
mod health;
mod interfaces;
mod pairing;
mod policies;
mod triggers;

pub use blocks::builtin_blocks;
pub use client::Client;
pub use config::{ApiConfig, Credentials};
pub use datatree::DataTreeNode;
pub use devices::{DevicesPage, InterfaceRef};
pub use error::Error;
pub use listeners::{ConnectionEvent, ConnectionListener, ConnectionNotice};
pub use realtime::{EventHandler, RoomHandle};
pub use transport::{TlsMode, TransportConfig};
