pub mod club;
pub mod message;
pub mod user;

pub use club::*;
pub use message::*;
pub use user::*;
