// Cover art cropper - squares and shrinks the embedded front cover

use std::path::Path;

use id3::frame::{Picture, PictureType};
use id3::{ErrorKind, Tag, TagLike, Version};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};

use crate::downloader::errors::DownloadError;
use crate::downloader::models::THUMBNAIL_SIZE;

/// Centered square crop: `(x, y, side)` with `side = min(width, height)`.
///
/// YouTube thumbnails are 16:9, so normally only the sides are trimmed.
/// Portrait or square sources are handled the same way instead of
/// producing an empty box.
pub fn square_crop_box(width: u32, height: u32) -> Result<(u32, u32, u32), DownloadError> {
    if width == 0 || height == 0 {
        return Err(DownloadError::InvalidGeometry { width, height });
    }
    let side = width.min(height);
    Ok(((width - side) / 2, (height - side) / 2, side))
}

pub struct ThumbnailCropper {
    /// Bounding box; the crop is only ever scaled down into it
    pub size: (u32, u32),
    pub jpeg_quality: u8,
}

impl Default for ThumbnailCropper {
    fn default() -> Self {
        Self {
            size: THUMBNAIL_SIZE,
            jpeg_quality: 90,
        }
    }
}

impl ThumbnailCropper {
    pub fn new(size: (u32, u32), jpeg_quality: u8) -> Self {
        Self { size, jpeg_quality }
    }

    /// Square the cover embedded in `mp3` and write it back.
    ///
    /// Returns the new cover dimensions, or `None` when the file carries no
    /// picture (the file is left untouched in that case).
    pub fn crop(&self, mp3: &Path) -> Result<Option<(u32, u32)>, DownloadError> {
        let mut tag = match Tag::read_from_path(mp3) {
            Ok(tag) => tag,
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => {
                tracing::warn!("No tag in {}, skipping cover crop", mp3.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(cover) = tag.pictures().next() else {
            tracing::warn!("No embedded cover in {}", mp3.display());
            return Ok(None);
        };

        let squared = self.square(&cover.data)?;
        let dimensions = squared.dimensions();
        let data = self.encode_jpeg(&squared)?;

        tag.remove_all_pictures();
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: "Cover".to_string(),
            data,
        });
        // v2.3 for player compatibility
        tag.write_to_path(mp3, Version::Id3v23)?;

        tracing::debug!(
            "Cover of {} cropped to {}x{}",
            mp3.display(),
            dimensions.0,
            dimensions.1
        );
        Ok(Some(dimensions))
    }

    fn square(&self, data: &[u8]) -> Result<DynamicImage, DownloadError> {
        let img = image::load_from_memory(data)?;
        let (width, height) = img.dimensions();
        let (x, y, side) = square_crop_box(width, height)?;

        let cropped = img.crop_imm(x, y, side, side);
        let (max_w, max_h) = self.size;
        if side > max_w || side > max_h {
            Ok(cropped.thumbnail(max_w, max_h))
        } else {
            Ok(cropped)
        }
    }

    fn encode_jpeg(&self, img: &DynamicImage) -> Result<Vec<u8>, DownloadError> {
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut buffer = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality))?;
        Ok(buffer)
    }
}

/// Crop the embedded cover of `mp3` to a square no larger than `size`
pub fn crop_thumbnail(mp3: &Path, size: (u32, u32)) -> Result<(), DownloadError> {
    ThumbnailCropper {
        size,
        ..Default::default()
    }
    .crop(mp3)
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocess::test_support::{cover_of, jpeg_bytes, write_stub_mp3};

    #[test]
    fn test_crop_box_landscape() {
        assert_eq!(square_crop_box(1280, 720).unwrap(), (280, 0, 720));
    }

    #[test]
    fn test_crop_box_portrait_and_square() {
        assert_eq!(square_crop_box(300, 600).unwrap(), (0, 150, 300));
        assert_eq!(square_crop_box(400, 400).unwrap(), (0, 0, 400));
    }

    #[test]
    fn test_crop_box_empty_image() {
        assert!(matches!(
            square_crop_box(0, 10),
            Err(DownloadError::InvalidGeometry { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_no_picture_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stub_mp3(dir.path(), "Artist - Song", "Artist", None);
        let before = std::fs::read(&path).unwrap();

        assert_eq!(ThumbnailCropper::default().crop(&path).unwrap(), None);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_wide_cover_becomes_bounded_square() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stub_mp3(dir.path(), "t", "a", Some(jpeg_bytes(1280, 720)));

        assert_eq!(ThumbnailCropper::default().crop(&path).unwrap(), Some((512, 512)));

        let (picture, img) = cover_of(&path);
        assert_eq!(img.dimensions(), (512, 512));
        assert_eq!(picture.mime_type, "image/jpeg");
        assert_eq!(picture.picture_type, PictureType::CoverFront);
        assert_eq!(picture.description, "Cover");
    }

    #[test]
    fn test_small_cover_is_not_upscaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stub_mp3(dir.path(), "t", "a", Some(jpeg_bytes(480, 360)));

        crop_thumbnail(&path, (512, 512)).unwrap();
        assert_eq!(cover_of(&path).1.dimensions(), (360, 360));
    }

    #[test]
    fn test_crop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stub_mp3(dir.path(), "t", "a", Some(jpeg_bytes(1920, 1080)));
        let cropper = ThumbnailCropper::default();

        let first = cropper.crop(&path).unwrap();
        let second = cropper.crop(&path).unwrap();
        assert_eq!(first, second);

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.pictures().count(), 1);
    }

    #[test]
    fn test_portrait_cover_is_squared() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stub_mp3(dir.path(), "t", "a", Some(jpeg_bytes(200, 300)));

        assert_eq!(ThumbnailCropper::default().crop(&path).unwrap(), Some((200, 200)));
    }
}
