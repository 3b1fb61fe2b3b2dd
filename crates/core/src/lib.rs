//! Domain logic for the storefront backend: listing filters, ordered
//! image collections, upload rules and shared error/ID types. No database or
//! HTTP dependencies live here.

pub mod error;
pub mod images;
pub mod listing;
pub mod roles;
pub mod slug;
pub mod storage;
pub mod types;
pub mod upload;
