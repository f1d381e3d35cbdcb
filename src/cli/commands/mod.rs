mod admin;
mod init;
mod key;

pub use admin::cmd_create_admin;
pub use init::cmd_init_config;
pub use key::cmd_rotate_key;
