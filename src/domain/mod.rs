//! Domain layer: document segmentation, block classification and pattern metadata.

pub mod blocks;
pub mod document;
pub mod error;
pub mod metadata;
