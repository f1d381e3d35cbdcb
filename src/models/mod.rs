pub mod concert;
pub mod user;
