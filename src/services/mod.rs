//! Service layer: the metadata store operations and the upload dispatcher.

pub mod library_service;
pub mod upload_service;

use crate::clients::email::EmailRelayClient;
use self::library_service::LibraryService;
use self::upload_service::UploadService;

/// Shared handler state, one handle per collaborating service.
#[derive(Clone)]
pub struct AppState {
    pub library: LibraryService,
    pub uploads: UploadService,
    pub email: EmailRelayClient,
}
