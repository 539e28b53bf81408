pub mod chat;
pub mod club;
pub mod locks;
pub mod membership;
pub mod message;
pub mod roles;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;
