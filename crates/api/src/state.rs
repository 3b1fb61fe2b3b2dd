use std::sync::Arc;

use storefront_core::images::ImageCollection;
use storefront_core::storage::BlobStore;
use storefront_core::upload::UploadPolicy;
use storefront_db::image_store::PgImageStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: storefront_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Image file storage.
    pub blobs: Arc<dyn BlobStore>,
    /// Image rows, over the same pool.
    pub images: Arc<PgImageStore>,
}

impl AppState {
    /// Image collection manager bound to this state's stores and upload limits.
    pub fn image_collection(&self) -> ImageCollection<'_> {
        ImageCollection::new(
            self.images.as_ref(),
            self.blobs.as_ref(),
            UploadPolicy::with_max_bytes(self.config.max_upload_bytes),
        )
    }
}
