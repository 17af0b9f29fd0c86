// SPDX-License-Identifier: GPL-3.0-only

//! QR code panel shown next to the result

use crate::constants::messages;
use crate::image_source::EncodedImage;
use tracing::{debug, trace};

/// One element of the QR panel
#[derive(Debug, Clone, PartialEq)]
pub enum QrNode {
    Title(String),
    /// Bordered QR image
    Image(EncodedImage),
    Caption(String),
}

/// Container for the QR code; holds either nothing or exactly
/// title + image + caption
#[derive(Debug, Default)]
pub struct QrPanel {
    nodes: Vec<QrNode>,
    payload: Option<String>,
}

impl QrPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the panel contents with `qr`
    pub fn render(&mut self, qr: &EncodedImage) {
        self.clear();
        self.nodes.push(QrNode::Title(messages::QR_TITLE.to_string()));
        self.nodes.push(QrNode::Image(qr.clone()));
        self.nodes.push(QrNode::Caption(messages::QR_CAPTION.to_string()));
        self.payload = decode_payload(qr);
        debug!(payload = ?self.payload, "QR panel rendered");
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.payload = None;
    }

    pub fn nodes(&self) -> &[QrNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.nodes.iter().find_map(|node| match node {
            QrNode::Image(image) => Some(image),
            _ => None,
        })
    }

    /// Text encoded in the QR image (usually the download URL), if readable
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

/// Decode the first QR code found in `image`
pub fn decode_payload(image: &EncodedImage) -> Option<String> {
    let luma = image.decode()?.to_luma8();
    let (width, height) = luma.dimensions();
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            luma.get_pixel(x as u32, y as u32).0[0]
        });

    prepared.detect_grids().into_iter().find_map(|grid| match grid.decode() {
        Ok((_meta, content)) => Some(content),
        Err(e) => {
            trace!(error = %e, "QR grid did not decode");
            None
        }
    })
}
