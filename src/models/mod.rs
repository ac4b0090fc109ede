//! Data model for blog records

pub mod blog;

pub use blog::{Blog, BlogAttrs, BlogField, BlogId, EntityError, FieldValue};
