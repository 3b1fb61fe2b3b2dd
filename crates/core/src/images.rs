//! Ordered image collections attached to products and blogs.
//!
//! Every image belongs to exactly one parent. Images are listed by ascending
//! `sort_order`; new images are appended at `max(sort_order) + 1` (or `0` for
//! an empty collection). Product images additionally carry `is_primary`, and
//! at most one image per product is primary at any time: every write that
//! sets the flag clears it on the siblings inside the same transaction
//! (see [`ImageStore::insert`] and [`ImageStore::update`]).
//!
//! Batch uploads compute the base sort order once and give the k-th file
//! `base + k`. A file that fails leaves its slot unused, so later files in
//! the same batch keep their index-derived order and gaps are possible.
//! With `set_first_as_primary` the existing primary is cleared before any
//! file of the batch is written. Until the first file is inserted the
//! product has no primary, and it keeps none if that file fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::storage::BlobStore;
use crate::types::{DbId, Timestamp};
use crate::upload::{ImageType, Upload, UploadError, UploadPolicy};

// ---------------------------------------------------------------------------
// Owners
// ---------------------------------------------------------------------------

/// The kind of entity an image collection hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageOwner {
    Product,
    Blog,
}

impl ImageOwner {
    /// Entity name used in not-found errors for the parent.
    pub fn parent_entity(self) -> &'static str {
        match self {
            ImageOwner::Product => "Product",
            ImageOwner::Blog => "Blog",
        }
    }

    /// Entity name used in not-found errors for an image.
    pub fn image_entity(self) -> &'static str {
        match self {
            ImageOwner::Product => "ProductImage",
            ImageOwner::Blog => "BlogImage",
        }
    }

    /// Only product images have a primary image.
    pub fn supports_primary(self) -> bool {
        matches!(self, ImageOwner::Product)
    }

    /// Top-level blob directory for this owner's files.
    pub fn storage_dir(self) -> &'static str {
        match self {
            ImageOwner::Product => "products",
            ImageOwner::Blog => "blogs",
        }
    }
}

/// A specific parent entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentRef {
    pub owner: ImageOwner,
    pub id: DbId,
}

impl ParentRef {
    pub fn product(id: DbId) -> Self {
        Self {
            owner: ImageOwner::Product,
            id,
        }
    }

    pub fn blog(id: DbId) -> Self {
        Self {
            owner: ImageOwner::Blog,
            id,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A persisted image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderedImage {
    pub id: DbId,
    pub parent_id: DbId,
    /// Opaque blob-store path.
    pub path: String,
    /// Stored filename (last segment of `path`).
    pub filename: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub sort_order: i32,
    /// Always `false` for blog images.
    pub is_primary: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Values for a new image row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub path: String,
    pub filename: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub sort_order: i32,
    pub is_primary: bool,
}

/// Partial update of an image. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImagePatch {
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub sort_order: Option<i32>,
    pub is_primary: Option<bool>,
}

/// Caller-supplied attributes for an uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMeta {
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub is_primary: bool,
}

/// A batch entry that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemError {
    /// Zero-based position in the submitted batch.
    pub index: usize,
    /// Filename as sent by the client.
    pub filename: String,
    pub error: String,
}

/// Outcome of [`ImageCollection::append_many`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchUploadReport {
    pub uploaded: Vec<OrderedImage>,
    pub errors: Vec<BatchItemError>,
    pub success_count: usize,
    pub error_count: usize,
}

impl BatchUploadReport {
    /// At least one file failed. Successful files are still persisted.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Persistence port
// ---------------------------------------------------------------------------

/// Persistence for image rows, scoped by parent.
///
/// Implementations must run "clear siblings' primary flag, then write" as a
/// single transaction in [`insert`](Self::insert) and
/// [`update`](Self::update).
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// The parent exists and is not soft-deleted.
    async fn parent_exists(&self, parent: ParentRef) -> Result<bool, CoreError>;

    /// All images of the parent by ascending `sort_order`, then id.
    async fn list(&self, parent: ParentRef) -> Result<Vec<OrderedImage>, CoreError>;

    /// One image, only if it belongs to `parent`.
    async fn find(&self, parent: ParentRef, image_id: DbId)
        -> Result<Option<OrderedImage>, CoreError>;

    async fn max_sort_order(&self, parent: ParentRef) -> Result<Option<i32>, CoreError>;

    /// Insert a row. When `image.is_primary` is set, siblings lose the flag
    /// in the same transaction.
    async fn insert(&self, parent: ParentRef, image: &NewImage) -> Result<OrderedImage, CoreError>;

    /// Clear the primary flag on every image of the parent.
    async fn clear_primary(&self, parent: ParentRef) -> Result<u64, CoreError>;

    /// Apply a patch to an image of `parent`. When the patch sets
    /// `is_primary = true`, all other images of the parent lose the flag in
    /// the same transaction. Returns `None` if the image is not the parent's.
    async fn update(
        &self,
        parent: ParentRef,
        image_id: DbId,
        patch: &ImagePatch,
    ) -> Result<Option<OrderedImage>, CoreError>;

    /// Delete an image of `parent`. Returns `false` if nothing was deleted.
    async fn delete(&self, parent: ParentRef, image_id: DbId) -> Result<bool, CoreError>;
}

// ---------------------------------------------------------------------------
// Collection manager
// ---------------------------------------------------------------------------

/// Operations on one parent's image collection.
pub struct ImageCollection<'a> {
    images: &'a dyn ImageStore,
    blobs: &'a dyn BlobStore,
    policy: UploadPolicy,
}

impl<'a> ImageCollection<'a> {
    pub fn new(images: &'a dyn ImageStore, blobs: &'a dyn BlobStore, policy: UploadPolicy) -> Self {
        Self {
            images,
            blobs,
            policy,
        }
    }

    /// All images of the parent, ascending `sort_order`.
    pub async fn list(&self, parent: ParentRef) -> Result<Vec<OrderedImage>, CoreError> {
        self.ensure_parent(parent).await?;
        self.images.list(parent).await
    }

    /// Validate, store and append a single image.
    pub async fn append_one(
        &self,
        parent: ParentRef,
        upload: Upload,
        meta: ImageMeta,
    ) -> Result<OrderedImage, CoreError> {
        self.ensure_parent(parent).await?;
        let sort_order = next_sort_order(self.images.max_sort_order(parent).await?);
        let is_primary = meta.is_primary && parent.owner.supports_primary();
        self.store_one(parent, &upload, &meta, sort_order, is_primary, None)
            .await
    }

    /// Store a batch of files, each independently.
    ///
    /// A failing file is reported with its index and does not stop the
    /// batch. With `set_first_as_primary`, existing primaries are cleared
    /// once up front and only the file at index 0 becomes primary.
    pub async fn append_many(
        &self,
        parent: ParentRef,
        uploads: Vec<Upload>,
        metas: Vec<ImageMeta>,
        set_first_as_primary: bool,
    ) -> Result<BatchUploadReport, CoreError> {
        self.ensure_parent(parent).await?;

        if uploads.is_empty() {
            return Err(CoreError::field("images", "At least one image is required."));
        }
        if uploads.len() > self.policy.max_batch {
            return Err(CoreError::field(
                "images",
                format!(
                    "The images may not have more than {} items.",
                    self.policy.max_batch
                ),
            ));
        }

        let mark_first = set_first_as_primary && parent.owner.supports_primary();
        if mark_first {
            self.images.clear_primary(parent).await?;
        }

        let base = next_sort_order(self.images.max_sort_order(parent).await?);
        let mut uploaded = Vec::with_capacity(uploads.len());
        let mut errors = Vec::new();

        for (index, upload) in uploads.iter().enumerate() {
            let meta = metas.get(index).cloned().unwrap_or_default();
            let sort_order = base.saturating_add(i32::try_from(index).unwrap_or(i32::MAX));
            let is_primary = mark_first && index == 0;

            match self
                .store_one(parent, upload, &meta, sort_order, is_primary, Some(index))
                .await
            {
                Ok(image) => uploaded.push(image),
                Err(err) => errors.push(BatchItemError {
                    index,
                    filename: upload.filename.clone(),
                    error: failure_message(&err),
                }),
            }
        }

        Ok(BatchUploadReport {
            success_count: uploaded.len(),
            error_count: errors.len(),
            uploaded,
            errors,
        })
    }

    /// Update an image's attributes. `is_primary` is ignored for owners
    /// without a primary image.
    pub async fn update(
        &self,
        parent: ParentRef,
        image_id: DbId,
        mut patch: ImagePatch,
    ) -> Result<OrderedImage, CoreError> {
        self.ensure_parent(parent).await?;

        if let Some(sort_order) = patch.sort_order {
            if sort_order < 0 {
                return Err(CoreError::field(
                    "sort_order",
                    "The sort_order must be at least 0.",
                ));
            }
        }
        self.check_text("alt_text", patch.alt_text.as_deref())?;
        self.check_text("caption", patch.caption.as_deref())?;

        if !parent.owner.supports_primary() {
            patch.is_primary = None;
        }

        self.images
            .update(parent, image_id, &patch)
            .await?
            .ok_or(CoreError::NotFound {
                entity: parent.owner.image_entity(),
                id: image_id,
            })
    }

    /// Remove an image and its blob. A blob that is already gone is not an
    /// error. Remaining images keep their `sort_order`.
    pub async fn delete(&self, parent: ParentRef, image_id: DbId) -> Result<(), CoreError> {
        self.ensure_parent(parent).await?;

        let image = self
            .images
            .find(parent, image_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: parent.owner.image_entity(),
                id: image_id,
            })?;

        if self.blobs.exists(&image.path).await? {
            self.blobs.delete(&image.path).await?;
        }

        if !self.images.delete(parent, image_id).await? {
            return Err(CoreError::NotFound {
                entity: parent.owner.image_entity(),
                id: image_id,
            });
        }
        Ok(())
    }

    async fn ensure_parent(&self, parent: ParentRef) -> Result<(), CoreError> {
        if self.images.parent_exists(parent).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity: parent.owner.parent_entity(),
                id: parent.id,
            })
        }
    }

    fn check_text(&self, field: &'static str, value: Option<&str>) -> Result<(), CoreError> {
        self.policy
            .check_text(field, value)
            .map_err(|e| CoreError::field(field, e.to_string()))
    }

    /// Validate, write the blob, then insert the row. The blob is removed
    /// again if the insert fails.
    async fn store_one(
        &self,
        parent: ParentRef,
        upload: &Upload,
        meta: &ImageMeta,
        sort_order: i32,
        is_primary: bool,
        batch_index: Option<usize>,
    ) -> Result<OrderedImage, CoreError> {
        self.check_text("alt_text", meta.alt_text.as_deref())?;
        self.check_text("caption", meta.caption.as_deref())?;
        let image_type = self
            .policy
            .check(upload)
            .map_err(|e: UploadError| CoreError::field("image", e.to_string()))?;

        let name = stored_name(parent.owner, image_type, batch_index);
        let path = self.blobs.store(&upload.bytes, &name).await?;

        let new_image = NewImage {
            filename: filename_of(&path).to_string(),
            path: path.clone(),
            alt_text: meta.alt_text.clone(),
            caption: meta.caption.clone(),
            sort_order,
            is_primary,
        };

        match self.images.insert(parent, &new_image).await {
            Ok(image) => Ok(image),
            Err(err) => {
                if let Err(cleanup) = self.blobs.delete(&path).await {
                    tracing::warn!(
                        path = %path,
                        error = %cleanup,
                        "Failed to remove stored file after image insert failed"
                    );
                }
                Err(err)
            }
        }
    }
}

/// `max + 1`, or `0` for an empty collection.
pub fn next_sort_order(max: Option<i32>) -> i32 {
    max.map_or(0, |m| m.saturating_add(1))
}

/// `{dir}/{unix_ts}_{uuid}[_{index}].{ext}`
fn stored_name(owner: ImageOwner, image_type: ImageType, batch_index: Option<usize>) -> String {
    let stamp = chrono::Utc::now().timestamp();
    let unique = uuid::Uuid::new_v4().simple();
    let ext = image_type.extension();
    match batch_index {
        Some(index) => format!("{}/{stamp}_{unique}_{index}.{ext}", owner.storage_dir()),
        None => format!("{}/{stamp}_{unique}.{ext}", owner.storage_dir()),
    }
}

fn filename_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Client-facing text for a failed batch entry.
fn failure_message(err: &CoreError) -> String {
    match err {
        CoreError::Validation(msg) => msg.clone(),
        CoreError::InvalidFields(fields) => fields
            .values()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    // -- in-memory ports -----------------------------------------------------

    #[derive(Default)]
    struct MemoryImages {
        parents: Vec<ParentRef>,
        rows: Mutex<Vec<(ParentRef, OrderedImage)>>,
        next_id: Mutex<DbId>,
        fail_inserts: bool,
    }

    impl MemoryImages {
        fn with_parent(parent: ParentRef) -> Self {
            Self {
                parents: vec![parent],
                ..Self::default()
            }
        }

        fn seed(&self, parent: ParentRef, sort_order: i32, is_primary: bool) -> DbId {
            let image = NewImage {
                path: format!("seed/{sort_order}.png"),
                filename: format!("{sort_order}.png"),
                alt_text: None,
                caption: None,
                sort_order,
                is_primary,
            };
            self.push(parent, &image).id
        }

        fn push(&self, parent: ParentRef, image: &NewImage) -> OrderedImage {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let now = chrono::Utc::now();
            let row = OrderedImage {
                id: *next_id,
                parent_id: parent.id,
                path: image.path.clone(),
                filename: image.filename.clone(),
                alt_text: image.alt_text.clone(),
                caption: image.caption.clone(),
                sort_order: image.sort_order,
                is_primary: image.is_primary,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().push((parent, row.clone()));
            row
        }

        fn snapshot(&self, parent: ParentRef) -> Vec<OrderedImage> {
            let mut rows: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| *p == parent)
                .map(|(_, img)| img.clone())
                .collect();
            rows.sort_by_key(|img| (img.sort_order, img.id));
            rows
        }

        fn primary_ids(&self, parent: ParentRef) -> Vec<DbId> {
            self.snapshot(parent)
                .into_iter()
                .filter(|img| img.is_primary)
                .map(|img| img.id)
                .collect()
        }

        fn clear(&self, parent: ParentRef, except: Option<DbId>) -> u64 {
            let mut cleared = 0;
            for (p, img) in self.rows.lock().unwrap().iter_mut() {
                if *p == parent && img.is_primary && Some(img.id) != except {
                    img.is_primary = false;
                    cleared += 1;
                }
            }
            cleared
        }
    }

    #[async_trait]
    impl ImageStore for MemoryImages {
        async fn parent_exists(&self, parent: ParentRef) -> Result<bool, CoreError> {
            Ok(self.parents.contains(&parent))
        }

        async fn list(&self, parent: ParentRef) -> Result<Vec<OrderedImage>, CoreError> {
            Ok(self.snapshot(parent))
        }

        async fn find(
            &self,
            parent: ParentRef,
            image_id: DbId,
        ) -> Result<Option<OrderedImage>, CoreError> {
            Ok(self.snapshot(parent).into_iter().find(|i| i.id == image_id))
        }

        async fn max_sort_order(&self, parent: ParentRef) -> Result<Option<i32>, CoreError> {
            Ok(self.snapshot(parent).iter().map(|i| i.sort_order).max())
        }

        async fn insert(
            &self,
            parent: ParentRef,
            image: &NewImage,
        ) -> Result<OrderedImage, CoreError> {
            if self.fail_inserts {
                return Err(CoreError::Internal("connection reset".into()));
            }
            if image.is_primary {
                self.clear(parent, None);
            }
            Ok(self.push(parent, image))
        }

        async fn clear_primary(&self, parent: ParentRef) -> Result<u64, CoreError> {
            Ok(self.clear(parent, None))
        }

        async fn update(
            &self,
            parent: ParentRef,
            image_id: DbId,
            patch: &ImagePatch,
        ) -> Result<Option<OrderedImage>, CoreError> {
            if self.find(parent, image_id).await?.is_none() {
                return Ok(None);
            }
            if patch.is_primary == Some(true) {
                self.clear(parent, Some(image_id));
            }
            let mut rows = self.rows.lock().unwrap();
            let (_, img) = rows
                .iter_mut()
                .find(|(p, i)| *p == parent && i.id == image_id)
                .expect("row exists");
            if let Some(alt) = &patch.alt_text {
                img.alt_text = Some(alt.clone());
            }
            if let Some(caption) = &patch.caption {
                img.caption = Some(caption.clone());
            }
            if let Some(order) = patch.sort_order {
                img.sort_order = order;
            }
            if let Some(primary) = patch.is_primary {
                img.is_primary = primary;
            }
            Ok(Some(img.clone()))
        }

        async fn delete(&self, parent: ParentRef, image_id: DbId) -> Result<bool, CoreError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|(p, i)| !(*p == parent && i.id == image_id));
            Ok(rows.len() < before)
        }
    }

    #[derive(Default)]
    struct MemoryBlobs {
        files: Mutex<HashMap<String, Vec<u8>>>,
        /// Zero-based `store` call that fails.
        fail_call: Option<usize>,
        calls: Mutex<usize>,
        fail_deletes: bool,
    }

    #[async_trait]
    impl BlobStore for MemoryBlobs {
        async fn store(&self, bytes: &[u8], suggested_name: &str) -> Result<String, CoreError> {
            let mut calls = self.calls.lock().unwrap();
            let call = *calls;
            *calls += 1;
            if self.fail_call == Some(call) {
                return Err(CoreError::Internal("disk full".into()));
            }
            self.files
                .lock()
                .unwrap()
                .insert(suggested_name.to_string(), bytes.to_vec());
            Ok(suggested_name.to_string())
        }

        async fn exists(&self, path: &str) -> Result<bool, CoreError> {
            Ok(self.files.lock().unwrap().contains_key(path))
        }

        async fn delete(&self, path: &str) -> Result<(), CoreError> {
            if self.fail_deletes {
                return Err(CoreError::Internal("permission denied".into()));
            }
            self.files.lock().unwrap().remove(path);
            Ok(())
        }
    }

    fn png(name: &str) -> Upload {
        Upload::new(name, PNG.to_vec())
    }

    fn primary() -> ImageMeta {
        ImageMeta {
            is_primary: true,
            ..ImageMeta::default()
        }
    }

    // -- list ----------------------------------------------------------------

    #[tokio::test]
    async fn list_is_ordered_by_sort_order() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        images.seed(parent, 5, false);
        images.seed(parent, 0, false);
        images.seed(parent, 2, false);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let orders: Vec<_> = collection
            .list(parent)
            .await
            .unwrap()
            .iter()
            .map(|i| i.sort_order)
            .collect();
        assert_eq!(orders, vec![0, 2, 5]);
    }

    #[tokio::test]
    async fn unknown_parent_is_not_found() {
        let images = MemoryImages::with_parent(ParentRef::product(1));
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let err = collection.list(ParentRef::product(2)).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::NotFound {
                entity: "Product",
                id: 2
            }
        );
    }

    // -- append_one ----------------------------------------------------------

    #[tokio::test]
    async fn first_image_gets_sort_order_zero() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let image = collection
            .append_one(parent, png("front.png"), ImageMeta::default())
            .await
            .unwrap();
        assert_eq!(image.sort_order, 0);
        assert!(image.path.starts_with("products/"));
        assert!(image.path.ends_with(".png"));
        assert_eq!(image.filename, image.path.trim_start_matches("products/"));
        assert!(blobs.exists(&image.path).await.unwrap());
    }

    #[tokio::test]
    async fn append_primary_replaces_existing_primary() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let a = images.seed(parent, 0, true);
        let b = images.seed(parent, 1, false);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let c = collection
            .append_one(parent, png("c.png"), primary())
            .await
            .unwrap();

        assert_eq!(c.sort_order, 2);
        assert!(c.is_primary);
        assert_eq!(images.primary_ids(parent), vec![c.id]);

        let rows = images.snapshot(parent);
        let a_row = rows.iter().find(|i| i.id == a).unwrap();
        let b_row = rows.iter().find(|i| i.id == b).unwrap();
        assert!(!a_row.is_primary);
        assert!(!b_row.is_primary);
        assert_eq!(b_row.sort_order, 1);
    }

    #[tokio::test]
    async fn append_one_rejects_invalid_file() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let err = collection
            .append_one(
                parent,
                Upload::new("notes.txt", b"hello".to_vec()),
                ImageMeta::default(),
            )
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::InvalidFields(ref f) if f.contains_key("image"));
        assert!(images.snapshot(parent).is_empty());
        assert!(blobs.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_one_rejects_long_alt_text() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let meta = ImageMeta {
            alt_text: Some("a".repeat(256)),
            ..ImageMeta::default()
        };
        let err = collection
            .append_one(parent, png("a.png"), meta)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::InvalidFields(ref f) if f.contains_key("alt_text"));
    }

    #[tokio::test]
    async fn blog_images_never_become_primary() {
        let parent = ParentRef::blog(3);
        let images = MemoryImages::with_parent(parent);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let image = collection
            .append_one(parent, png("hero.png"), primary())
            .await
            .unwrap();
        assert!(!image.is_primary);
        assert!(image.path.starts_with("blogs/"));
    }

    // -- append_many ---------------------------------------------------------

    #[tokio::test]
    async fn batch_with_invalid_middle_file_skips_its_slot() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        images.seed(parent, 0, false);
        images.seed(parent, 1, false);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let uploads = vec![
            png("one.png"),
            Upload::new("two.png", b"not an image".to_vec()),
            Upload::new("three.jpg", JPEG.to_vec()),
        ];
        let report = collection
            .append_many(parent, uploads, Vec::new(), false)
            .await
            .unwrap();

        assert!(report.is_partial());
        assert_eq!(report.success_count, 2);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.errors[0].index, 1);
        assert_eq!(report.errors[0].filename, "two.png");
        assert!(report.errors[0].error.contains("must be a file of type"));

        let orders: Vec<_> = report.uploaded.iter().map(|i| i.sort_order).collect();
        assert_eq!(orders, vec![2, 4]);
    }

    #[tokio::test]
    async fn batch_storage_failure_is_reported_per_index() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let blobs = MemoryBlobs {
            fail_call: Some(0),
            ..MemoryBlobs::default()
        };
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let report = collection
            .append_many(parent, vec![png("a.png"), png("b.png")], Vec::new(), false)
            .await
            .unwrap();

        assert_eq!(report.error_count, 1);
        assert_eq!(report.errors[0].index, 0);
        assert!(report.errors[0].error.contains("disk full"));
        assert_eq!(report.uploaded.len(), 1);
        assert_eq!(report.uploaded[0].sort_order, 1);
    }

    #[tokio::test]
    async fn batch_set_first_as_primary() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        images.seed(parent, 0, true);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let report = collection
            .append_many(
                parent,
                vec![png("a.png"), png("b.png"), png("c.png")],
                Vec::new(),
                true,
            )
            .await
            .unwrap();

        assert!(!report.is_partial());
        assert_eq!(report.success_count, 3);
        let first = &report.uploaded[0];
        assert!(first.is_primary);
        assert_eq!(first.sort_order, 1);
        assert!(report.uploaded[1..].iter().all(|i| !i.is_primary));
        assert_eq!(images.primary_ids(parent), vec![first.id]);
    }

    #[tokio::test]
    async fn batch_first_file_failure_leaves_no_primary() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        images.seed(parent, 0, true);
        let blobs = MemoryBlobs {
            fail_call: Some(0),
            ..MemoryBlobs::default()
        };
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let report = collection
            .append_many(parent, vec![png("a.png"), png("b.png")], Vec::new(), true)
            .await
            .unwrap();

        assert_eq!(report.errors[0].index, 0);
        assert!(!report.uploaded[0].is_primary);
        assert!(images.primary_ids(parent).is_empty());
    }

    #[tokio::test]
    async fn failed_insert_removes_stored_file() {
        let parent = ParentRef::product(1);
        let images = MemoryImages {
            fail_inserts: true,
            ..MemoryImages::with_parent(parent)
        };
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let result = collection
            .append_one(parent, png("a.png"), ImageMeta::default())
            .await;

        assert_matches!(result, Err(CoreError::Internal(msg)) if msg == "connection reset");
        assert!(blobs.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_cleanup_keeps_the_insert_error() {
        let parent = ParentRef::product(1);
        let images = MemoryImages {
            fail_inserts: true,
            ..MemoryImages::with_parent(parent)
        };
        let blobs = MemoryBlobs {
            fail_deletes: true,
            ..MemoryBlobs::default()
        };
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let result = collection
            .append_one(parent, png("a.png"), ImageMeta::default())
            .await;

        assert_matches!(result, Err(CoreError::Internal(msg)) if msg == "connection reset");
        assert_eq!(blobs.files.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batch_without_primary_flag_keeps_existing_primary() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let existing = images.seed(parent, 0, true);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let metas = vec![primary(), ImageMeta::default()];
        collection
            .append_many(parent, vec![png("a.png"), png("b.png")], metas, false)
            .await
            .unwrap();
        assert_eq!(images.primary_ids(parent), vec![existing]);
    }

    #[tokio::test]
    async fn batch_applies_alt_texts_by_index() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let metas = vec![ImageMeta {
            alt_text: Some("front".into()),
            ..ImageMeta::default()
        }];
        let report = collection
            .append_many(parent, vec![png("a.png"), png("b.png")], metas, false)
            .await
            .unwrap();
        assert_eq!(report.uploaded[0].alt_text.as_deref(), Some("front"));
        assert_eq!(report.uploaded[1].alt_text, None);
    }

    #[tokio::test]
    async fn batch_size_limits() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let empty = collection
            .append_many(parent, Vec::new(), Vec::new(), false)
            .await;
        assert_matches!(empty, Err(CoreError::InvalidFields(_)));

        let too_many = (0..11).map(|i| png(&format!("{i}.png"))).collect();
        let err = collection
            .append_many(parent, too_many, Vec::new(), false)
            .await;
        assert_matches!(err, Err(CoreError::InvalidFields(ref f)) if f.contains_key("images"));
        assert!(images.snapshot(parent).is_empty());
    }

    // -- update --------------------------------------------------------------

    #[tokio::test]
    async fn update_to_primary_leaves_exactly_one() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        images.seed(parent, 0, true);
        let target = images.seed(parent, 1, false);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let patch = ImagePatch {
            is_primary: Some(true),
            ..ImagePatch::default()
        };
        let updated = collection.update(parent, target, patch).await.unwrap();
        assert!(updated.is_primary);
        assert_eq!(images.primary_ids(parent), vec![target]);
    }

    #[tokio::test]
    async fn update_rejects_image_of_other_parent() {
        let mine = ParentRef::product(1);
        let other = ParentRef::product(2);
        let images = MemoryImages {
            parents: vec![mine, other],
            ..MemoryImages::default()
        };
        let foreign = images.seed(other, 0, false);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let err = collection
            .update(mine, foreign, ImagePatch::default())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            CoreError::NotFound {
                entity: "ProductImage",
                ..
            }
        );
    }

    #[tokio::test]
    async fn update_rejects_negative_sort_order() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let id = images.seed(parent, 0, false);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let patch = ImagePatch {
            sort_order: Some(-1),
            ..ImagePatch::default()
        };
        let err = collection.update(parent, id, patch).await.unwrap_err();
        assert_matches!(err, CoreError::InvalidFields(ref f) if f.contains_key("sort_order"));
    }

    #[tokio::test]
    async fn update_ignores_primary_for_blog_images() {
        let parent = ParentRef::blog(1);
        let images = MemoryImages::with_parent(parent);
        let id = images.seed(parent, 0, false);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let patch = ImagePatch {
            caption: Some("At the market".into()),
            is_primary: Some(true),
            ..ImagePatch::default()
        };
        let updated = collection.update(parent, id, patch).await.unwrap();
        assert!(!updated.is_primary);
        assert_eq!(updated.caption.as_deref(), Some("At the market"));
    }

    // -- delete --------------------------------------------------------------

    #[tokio::test]
    async fn delete_removes_blob_and_row_without_renumbering() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let a = collection
            .append_one(parent, png("a.png"), ImageMeta::default())
            .await
            .unwrap();
        let b = collection
            .append_one(parent, png("b.png"), ImageMeta::default())
            .await
            .unwrap();
        let c = collection
            .append_one(parent, png("c.png"), ImageMeta::default())
            .await
            .unwrap();

        collection.delete(parent, b.id).await.unwrap();

        assert!(!blobs.exists(&b.path).await.unwrap());
        let orders: Vec<_> = images
            .snapshot(parent)
            .iter()
            .map(|i| (i.id, i.sort_order))
            .collect();
        assert_eq!(orders, vec![(a.id, 0), (c.id, 2)]);
    }

    #[tokio::test]
    async fn delete_succeeds_when_blob_is_already_gone() {
        let parent = ParentRef::product(1);
        let images = MemoryImages::with_parent(parent);
        let id = images.seed(parent, 0, false);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        collection.delete(parent, id).await.unwrap();
        assert!(images.snapshot(parent).is_empty());
    }

    #[tokio::test]
    async fn delete_rejects_image_of_other_parent() {
        let mine = ParentRef::blog(1);
        let other = ParentRef::blog(2);
        let images = MemoryImages {
            parents: vec![mine, other],
            ..MemoryImages::default()
        };
        let foreign = images.seed(other, 0, false);
        let blobs = MemoryBlobs::default();
        let collection = ImageCollection::new(&images, &blobs, UploadPolicy::default());

        let err = collection.delete(mine, foreign).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::NotFound {
                entity: "BlogImage",
                ..
            }
        );
        assert_eq!(images.snapshot(other).len(), 1);
    }

    // -- helpers -------------------------------------------------------------

    #[test]
    fn next_sort_order_starts_at_zero() {
        assert_eq!(next_sort_order(None), 0);
        assert_eq!(next_sort_order(Some(0)), 1);
        assert_eq!(next_sort_order(Some(7)), 8);
    }
}
