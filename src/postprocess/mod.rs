// Postprocessing applied to the downloaded MP3

pub mod metadata;
pub mod thumbnail;

pub use metadata::{cleanup_metadata, strip_artist};
pub use thumbnail::{crop_thumbnail, square_crop_box, ThumbnailCropper};
