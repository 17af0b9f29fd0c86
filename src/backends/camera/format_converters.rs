// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for V4L2 capture buffers
//!
//! Every buffer the capture thread pulls is converted to tightly packed RGBA
//! before it reaches the preview or the still capture.

use super::types::{BackendError, BackendResult};

/// Packed 4:2:2 byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packed422 {
    /// Y0 U Y1 V
    Yuyv,
    /// U Y0 V Y1
    Uyvy,
}

/// Convert packed YUV 4:2:2 to RGBA (BT.601)
pub fn yuv422_to_rgba(data: &[u8], width: u32, height: u32, order: Packed422) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let (y0, u, y1, v) = match order {
            Packed422::Yuyv => (chunk[0], chunk[1], chunk[2], chunk[3]),
            Packed422::Uyvy => (chunk[1], chunk[0], chunk[3], chunk[2]),
        };

        for y in [y0, y1] {
            if rgba.len() >= pixel_count * 4 {
                break;
            }
            let (r, g, b) = yuv_to_rgb(y, u, v);
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }

    // Short buffers (truncated DMA transfers) are padded black
    rgba.resize(pixel_count * 4, 0);
    rgba
}

/// Convert RGB to RGBA by adding alpha=255
pub fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for chunk in rgb.chunks_exact(3) {
        rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
    }
    rgba
}

/// Expand 8-bit grayscale to RGBA
pub fn gray_to_rgba(gray: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(gray.len() * 4);
    for &v in gray {
        rgba.extend_from_slice(&[v, v, v, 255]);
    }
    rgba
}

/// Decode an MJPEG buffer to RGBA, returning the decoded dimensions
pub fn mjpeg_to_rgba(data: &[u8]) -> BackendResult<(u32, u32, Vec<u8>)> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| BackendError::FormatNotSupported(format!("MJPEG decode failed: {}", e)))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((width, height, rgba.into_raw()))
}

/// Convert YUV (BT.601) to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_chroma_yields_gray() {
        // Two pixels of luma 100 with neutral chroma
        let yuyv = [100, 128, 100, 128];
        let rgba = yuv422_to_rgba(&yuyv, 2, 1, Packed422::Yuyv);
        assert_eq!(rgba, vec![100, 100, 100, 255, 100, 100, 100, 255]);
    }

    #[test]
    fn uyvy_and_yuyv_agree_on_swapped_input() {
        let yuyv = [80, 90, 160, 200];
        let uyvy = [90, 80, 200, 160];
        assert_eq!(
            yuv422_to_rgba(&yuyv, 2, 1, Packed422::Yuyv),
            yuv422_to_rgba(&uyvy, 2, 1, Packed422::Uyvy)
        );
    }

    #[test]
    fn truncated_buffer_is_padded() {
        let rgba = yuv422_to_rgba(&[16, 128, 16, 128], 4, 1, Packed422::Yuyv);
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[8..], &[0; 8]);
    }

    #[test]
    fn gray_expands_to_opaque_rgba() {
        assert_eq!(gray_to_rgba(&[7]), vec![7, 7, 7, 255]);
    }
}
