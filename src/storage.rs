// SPDX-License-Identifier: MPL-2.0

//! Download naming and saving of generated photos

use crate::constants::download;
use crate::errors::{AppError, AppResult};
use crate::image_source::EncodedImage;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

fn is_allowed_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "áéíóúñÁÉÍÓÚÑ".contains(c)
}

/// Replace every character outside `[A-Za-z0-9áéíóúñÁÉÍÓÚÑ]` with `_`
pub fn sanitize_display_name(name: &str) -> String {
    name.chars()
        .map(|c| if is_allowed_name_char(c) { c } else { '_' })
        .collect()
}

/// `Prefix_Name_DD-MM-YYYY_HH-MM-SS.png`
pub fn download_filename(prefix: &str, display_name: &str, at: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.png",
        prefix,
        sanitize_display_name(display_name),
        at.format(download::TIMESTAMP_FORMAT)
    )
}

/// Write `image` as PNG into `output_dir` under `filename`
///
/// Non-PNG results are re-encoded so the content matches the extension.
pub async fn save_download(
    image: &EncodedImage,
    output_dir: &Path,
    filename: &str,
) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;
    let filepath = output_dir.join(filename);

    info!(path = %filepath.display(), mime = image.mime(), "Saving download");

    let image = image.clone();
    let png = tokio::task::spawn_blocking(move || -> AppResult<Vec<u8>> {
        if image.mime() == "image/png" {
            return Ok(image.bytes().to_vec());
        }
        let decoded = image
            .decode()
            .ok_or_else(|| AppError::Storage("generated image could not be decoded".into()))?;
        let mut buffer = Vec::new();
        decoded
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|e| AppError::Storage(format!("PNG encoding failed: {}", e)))?;
        Ok(buffer)
    })
    .await
    .map_err(|e| AppError::Storage(format!("Save task error: {}", e)))??;

    tokio::fs::write(&filepath, png).await?;
    info!(path = %filepath.display(), "Download saved");
    Ok(filepath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sanitize_keeps_accented_latin_and_replaces_the_rest() {
        assert_eq!(sanitize_display_name("José Ñíguez!"), "José_Ñíguez_");
        assert_eq!(sanitize_display_name("a/b\\c.d"), "a_b_c_d");
        assert_eq!(sanitize_display_name("Zoë"), "Zo_");
    }

    #[test]
    fn sanitized_name_uses_only_allowed_characters() {
        let sanitized = sanitize_display_name("María-José O'Neil ✨ 2024");
        assert!(
            sanitized
                .chars()
                .all(|c| is_allowed_name_char(c) || c == '_')
        );
    }

    #[test]
    fn filename_follows_prefix_name_timestamp_layout() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            download_filename("GraduationPhoto", "Ana Peña", at),
            "GraduationPhoto_Ana_Peña_09-03-2024_14-05-07.png"
        );
    }

    #[tokio::test]
    async fn jpeg_result_is_saved_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut jpeg = Vec::new();
        image::RgbImage::from_pixel(3, 3, image::Rgb([9, 9, 9]))
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();
        let encoded = EncodedImage::from_bytes(jpeg).unwrap();

        let path = save_download(&encoded, &dir.path().join("out"), "photo.png")
            .await
            .unwrap();
        let saved = std::fs::read(&path).unwrap();
        assert_eq!(
            image::guess_format(&saved).unwrap(),
            image::ImageFormat::Png
        );
    }
}
