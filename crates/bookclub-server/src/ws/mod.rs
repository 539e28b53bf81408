pub mod connections;
pub mod handler;

pub use connections::{BroadcastError, Broadcaster, ConnectionManager};
