//! Photo upload validation, orientation normalization and data URLs.
//!
//! Uploads pass the size/type gate first, then get normalized: decoded
//! into a fixed-origin raster (honoring any EXIF orientation) and
//! re-encoded without metadata. A photo that fails to decode is kept
//! as-is by the caller rather than aborting the upload.

pub mod dataurl;
pub mod error;
pub mod normalize;

pub use dataurl::{from_data_url, to_data_url, DecodedDataUrl};
pub use error::PhotoError;
pub use normalize::{check_upload, normalize, Normalized, MAX_UPLOAD_BYTES};
