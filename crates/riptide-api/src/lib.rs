// riptide-api: Async Rust client for the Transmission daemon RPC interface

pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod torrents;
pub mod transport;

pub use client::{Credentials, DEFAULT_RPC_PATH, SESSION_ID_HEADER, TransmissionClient};
pub use error::Error;
pub use torrents::{ALL_FIELDS, AddSource, QueueDirection, WORKING_FIELDS};
pub use transport::{TlsMode, TransportConfig};
