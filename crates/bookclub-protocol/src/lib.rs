//! Wire protocol shared by the Bookclub server and its clients.
//!
//! Realtime traffic is JSON frames tagged by `type`; REST bodies reuse the
//! payload types from [`types`].

pub mod messages;
pub mod time;
pub mod types;

pub use messages::*;
pub use types::*;
