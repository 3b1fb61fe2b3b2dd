//! Multipart form parsing for image uploads.
//!
//! Array fields may be sent as `images[]`, `images[3]` or plain `images`.
//! Files keep their order of appearance; `alt_texts` and `captions` entries
//! with an explicit index attach to that file, the rest fill in order.
//! Entries indexed past the batch limit are dropped.

use axum::extract::Multipart;
use storefront_core::error::CoreError;
use storefront_core::images::ImageMeta;
use storefront_core::listing::parse_flag;
use storefront_core::upload::{Upload, MAX_BATCH_UPLOADS};

use crate::error::{AppError, AppResult};

/// Parsed `POST .../images` form.
#[derive(Debug)]
pub struct SingleUploadForm {
    pub upload: Upload,
    pub meta: ImageMeta,
}

/// Parsed `POST .../images/multiple` form.
#[derive(Debug, Default)]
pub struct BatchUploadForm {
    pub uploads: Vec<Upload>,
    pub metas: Vec<ImageMeta>,
    pub set_first_as_primary: bool,
}

/// Split `name[idx]` into `("name", Some(idx))`, `name[]` into
/// `("name", None)`.
pub fn split_indexed(name: &str) -> (&str, Option<usize>) {
    match name.split_once('[') {
        Some((base, rest)) => {
            let inner = rest.trim_end_matches(']');
            (base, inner.parse().ok())
        }
        None => (name, None),
    }
}

/// Place `value` at `index` when given, else at the first free slot.
/// Slots at or beyond [`MAX_BATCH_UPLOADS`] are never allocated.
fn place(slots: &mut Vec<Option<String>>, index: Option<usize>, value: String) {
    let at = index.unwrap_or_else(|| slots.iter().position(Option::is_none).unwrap_or(slots.len()));
    if at >= MAX_BATCH_UPLOADS {
        return;
    }
    if slots.len() <= at {
        slots.resize(at + 1, None);
    }
    slots[at] = Some(value);
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub async fn read_single(mut multipart: Multipart) -> AppResult<SingleUploadForm> {
    let mut upload: Option<Upload> = None;
    let mut meta = ImageMeta::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload = Some(Upload::new(filename, data.to_vec()));
            }
            "alt_text" | "caption" | "is_primary" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match name.as_str() {
                    "alt_text" => meta.alt_text = non_empty(text),
                    "caption" => meta.caption = non_empty(text),
                    _ => meta.is_primary = parse_flag(text.trim()),
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    let upload = upload.ok_or_else(|| CoreError::field("image", "The image field is required."))?;
    Ok(SingleUploadForm { upload, meta })
}

pub async fn read_batch(mut multipart: Multipart) -> AppResult<BatchUploadForm> {
    let mut form = BatchUploadForm::default();
    let mut alt_texts: Vec<Option<String>> = Vec::new();
    let mut captions: Vec<Option<String>> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        let (base, index) = split_indexed(&name);
        match base {
            "images" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.uploads.push(Upload::new(filename, data.to_vec()));
            }
            "alt_texts" | "captions" | "set_first_as_primary" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match base {
                    "alt_texts" => place(&mut alt_texts, index, text),
                    "captions" => place(&mut captions, index, text),
                    _ => form.set_first_as_primary = parse_flag(text.trim()),
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    form.metas = (0..form.uploads.len())
        .map(|i| ImageMeta {
            alt_text: alt_texts.get(i).cloned().flatten().and_then(non_empty),
            caption: captions.get(i).cloned().flatten().and_then(non_empty),
            is_primary: false,
        })
        .collect();
    Ok(form)
}
