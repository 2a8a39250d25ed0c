//! Turns an image file on disk into a `UserImage`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use image::GenericImageView;
use shared::domain::UserImage;

const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

pub async fn capture_user_image(path: &Path) -> Result<UserImage> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("failed to read image '{}'", path.display()))?;
    ensure_within_limit(path, metadata.len())?;

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image '{}'", path.display()))?;
    user_image_from_bytes(path, &bytes)
}

pub fn user_image_from_bytes(path: &Path, bytes: &[u8]) -> Result<UserImage> {
    if bytes.is_empty() {
        bail!("image '{}' is empty", path.display());
    }
    ensure_within_limit(path, bytes.len() as u64)?;

    let labelled = mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .with_context(|| format!("'{}' does not look like an image file", path.display()))?;

    let format = image::guess_format(bytes)
        .with_context(|| format!("unrecognised image format in '{}'", path.display()))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .with_context(|| format!("failed to decode image '{}'", path.display()))?;
    let (width, height) = decoded.dimensions();

    // the bytes decide; the extension only gates what we accept
    let mime_type = format.to_mime_type().to_string();
    if labelled.essence_str() != mime_type {
        tracing::warn!(
            labelled = labelled.essence_str(),
            detected = %mime_type,
            "image extension does not match its contents"
        );
    }
    tracing::debug!(%mime_type, width, height, "captured user image");

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    Ok(UserImage::from_bytes(file_name, mime_type, bytes))
}

fn ensure_within_limit(path: &Path, len: u64) -> Result<()> {
    if len > MAX_IMAGE_BYTES as u64 {
        bail!(
            "image '{}' is {len} bytes; the limit is {MAX_IMAGE_BYTES}",
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn captures_png_with_guessed_mime_type() {
        let bytes = tiny_png();
        let captured =
            user_image_from_bytes(Path::new("/photos/me.png"), &bytes).expect("capture");
        assert_eq!(captured.mime_type, "image/png");
        assert_eq!(captured.file_name.as_deref(), Some("me.png"));
        assert_eq!(captured.decode_bytes().expect("decode"), bytes);
    }

    fn tiny_jpeg() -> Vec<u8> {
        let image = image::RgbImage::from_pixel(2, 2, image::Rgb([0, 128, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .expect("encode jpeg");
        bytes
    }

    #[test]
    fn mime_type_follows_contents_not_extension() {
        let bytes = tiny_jpeg();
        let captured = user_image_from_bytes(Path::new("photo.png"), &bytes).expect("capture");
        assert_eq!(captured.mime_type, "image/jpeg");
        assert_eq!(captured.file_name.as_deref(), Some("photo.png"));
    }

    #[test]
    fn size_limit_is_checked_before_decoding() {
        let err = ensure_within_limit(Path::new("huge.png"), MAX_IMAGE_BYTES as u64 + 1)
            .expect_err("over limit");
        assert!(err.to_string().contains("the limit is"));
        assert!(ensure_within_limit(Path::new("ok.png"), MAX_IMAGE_BYTES as u64).is_ok());
    }

    #[tokio::test]
    async fn missing_file_is_reported_before_reading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = capture_user_image(&dir.path().join("absent.png"))
            .await
            .expect_err("missing");
        assert!(err.to_string().contains("failed to read image"));
    }

    #[test]
    fn rejects_non_image_extension() {
        let err = user_image_from_bytes(Path::new("notes.txt"), &tiny_png()).expect_err("txt");
        assert!(err.to_string().contains("does not look like an image"));
    }

    #[test]
    fn rejects_undecodable_bytes() {
        assert!(user_image_from_bytes(Path::new("broken.png"), b"not a png").is_err());
        assert!(user_image_from_bytes(Path::new("empty.png"), b"").is_err());
    }

    #[tokio::test]
    async fn reads_image_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("selfie.png");
        std::fs::write(&path, tiny_png()).expect("write");

        let captured = capture_user_image(&path).await.expect("capture");
        assert_eq!(captured.file_name.as_deref(), Some("selfie.png"));
    }
}
