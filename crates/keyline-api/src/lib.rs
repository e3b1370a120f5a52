// keyline-api: Async Rust client for a hosted document database REST API

pub mod document;
pub mod error;
pub mod memory;
pub mod rest;
pub mod store;
pub mod transport;
pub mod value;

pub use document::Document;
pub use error::Error;
pub use memory::MemoryStore;
pub use rest::{RestStore, StoreConfig};
pub use store::DocumentStore;
pub use transport::{TlsMode, TransportConfig};
pub use value::{Fields, Value};
