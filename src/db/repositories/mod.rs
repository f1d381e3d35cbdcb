pub mod api_key;
pub mod concert;
pub mod user;
