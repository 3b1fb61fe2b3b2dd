//! PostgreSQL implementation of [`ImageStore`].

use async_trait::async_trait;
use sqlx::PgPool;
use storefront_core::error::CoreError;
use storefront_core::images::{ImageOwner, ImagePatch, ImageStore, NewImage, OrderedImage, ParentRef};
use storefront_core::types::DbId;

use crate::repositories::{BlogRepo, ImageRepo, ProductRepo};

/// Image rows backed by [`ImageRepo`]; parent checks go through the
/// product and blog repositories.
#[derive(Debug, Clone)]
pub struct PgImageStore {
    pool: PgPool,
}

impl PgImageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn internal(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Image store query failed");
    CoreError::Internal(err.to_string())
}

#[async_trait]
impl ImageStore for PgImageStore {
    async fn parent_exists(&self, parent: ParentRef) -> Result<bool, CoreError> {
        match parent.owner {
            ImageOwner::Product => ProductRepo::exists(&self.pool, parent.id).await,
            ImageOwner::Blog => BlogRepo::exists(&self.pool, parent.id).await,
        }
        .map_err(internal)
    }

    async fn list(&self, parent: ParentRef) -> Result<Vec<OrderedImage>, CoreError> {
        let rows = ImageRepo::list(&self.pool, parent).await.map_err(internal)?;
        Ok(rows.into_iter().map(OrderedImage::from).collect())
    }

    async fn find(
        &self,
        parent: ParentRef,
        image_id: DbId,
    ) -> Result<Option<OrderedImage>, CoreError> {
        let row = ImageRepo::find(&self.pool, parent, image_id)
            .await
            .map_err(internal)?;
        Ok(row.map(OrderedImage::from))
    }

    async fn max_sort_order(&self, parent: ParentRef) -> Result<Option<i32>, CoreError> {
        ImageRepo::max_sort_order(&self.pool, parent)
            .await
            .map_err(internal)
    }

    async fn insert(&self, parent: ParentRef, image: &NewImage) -> Result<OrderedImage, CoreError> {
        let row = ImageRepo::insert(&self.pool, parent, image)
            .await
            .map_err(internal)?;
        Ok(row.into())
    }

    async fn clear_primary(&self, parent: ParentRef) -> Result<u64, CoreError> {
        ImageRepo::clear_primary(&self.pool, parent)
            .await
            .map_err(internal)
    }

    async fn update(
        &self,
        parent: ParentRef,
        image_id: DbId,
        patch: &ImagePatch,
    ) -> Result<Option<OrderedImage>, CoreError> {
        let row = ImageRepo::update(&self.pool, parent, image_id, patch)
            .await
            .map_err(internal)?;
        Ok(row.map(OrderedImage::from))
    }

    async fn delete(&self, parent: ParentRef, image_id: DbId) -> Result<bool, CoreError> {
        ImageRepo::delete(&self.pool, parent, image_id)
            .await
            .map_err(internal)
    }
}
