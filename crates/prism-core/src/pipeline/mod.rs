//! Input-side pipeline stages.
//!
//! - **discovery**: enumerate image files in the search folder
//! - **decode**: load and decode images with limits and timeout
//! - **hash**: BLAKE3 content hashing (model checksums, cache keys)

pub mod decode;
pub mod discovery;
pub mod hash;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::ImageEnumerator;
