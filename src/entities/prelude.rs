pub use super::api_keys::Entity as ApiKeys;
pub use super::concerts::Entity as Concerts;
pub use super::users::Entity as Users;
