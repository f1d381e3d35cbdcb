pub mod credential_service;
pub mod credential_service_impl;
pub use credential_service::{
    AuthenticatedKey, CredentialError, CredentialService, LoginResult,
};
pub use credential_service_impl::SeaOrmCredentialService;

pub mod concert_service;
pub mod concert_service_impl;
pub use concert_service::{ConcertError, ConcertService};
pub use concert_service_impl::SeaOrmConcertService;

pub mod upload;
pub use upload::{MediaKind, StoredFile, UploadError, UploadService};
