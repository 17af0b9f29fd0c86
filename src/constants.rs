// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Default countdown before the shutter fires
    pub const COUNTDOWN_SECONDS: u32 = 3;

    /// Interval between countdown ticks
    pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

    /// How long a notification stays on screen
    pub const NOTIFICATION_DURATION: Duration = Duration::from_secs(3);

    /// How long the preview stays highlighted after a missing-image attempt
    pub const REQUIRED_HIGHLIGHT: Duration = Duration::from_millis(1500);

    /// Terminal redraw / input poll interval
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(33);

    /// Capture thread back-off when the device returns no buffer
    pub const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(10);

    /// Still-image virtual camera frame interval
    pub const VIRTUAL_FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// Backend HTTP endpoints, relative to the configured server URL
pub mod endpoints {
    /// Multipart generation endpoint
    pub const GENERATE: &str = "/api/generate";

    /// Configuration health endpoint
    pub const HEALTH: &str = "/api/health";

    /// Multipart field carrying the image file
    pub const IMAGE_FIELD: &str = "image";

    /// Multipart field carrying the prompt text
    pub const PROMPT_FIELD: &str = "prompt";

    /// File name the captured image is uploaded as
    pub const UPLOAD_FILE_NAME: &str = "captured.png";
}

/// Prompt template defaults
pub mod prompt {
    /// Default template; `{track}` and `{name}` are substituted at generation time
    pub const DEFAULT_TEMPLATE: &str = "Commemorative 50th anniversary portrait. Professional {track} graduate. \
Navy blue background with golden sparkles, soft cinematic lighting, emotional and modern professional style, \
high resolution and ultra detailed. NO TEXT, NO LETTERS, NO TYPOGRAPHY, NO WORDS in the image.";

    /// Substituted for `{track}` when no program is selected
    pub const DEFAULT_TRACK_PHRASE: &str = "the selected program";

    /// Substituted for `{name}` when the display name is empty
    pub const DEFAULT_DISPLAY_NAME: &str = "Guest";
}

/// User-facing texts
pub mod messages {
    pub const IMAGE_REQUIRED: &str = "An image is required";
    pub const GENERATION_SUCCEEDED: &str = "Image generated successfully! 🎉";
    pub const GENERATION_FAILED: &str = "Error generating the image";
    pub const DOWNLOADED: &str = "Image downloaded";
    pub const MISSING_API_KEY: &str = "⚠️ The generation server has no API key configured (GOOGLE_API_KEY)";
    pub const QR_TITLE: &str = "📱 Scan to download your photo";
    pub const QR_CAPTION: &str = "Scan with your phone to save your graduation photo";
}

/// Download file naming
pub mod download {
    /// Default file name prefix
    pub const DEFAULT_PREFIX: &str = "GraduationPhoto";

    /// Timestamp layout: DD-MM-YYYY_HH-MM-SS
    pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y_%H-%M-%S";

    /// Default folder name under the user picture directory
    pub const DEFAULT_SAVE_FOLDER: &str = "Photobooth";
}

/// Celebration bursts played when a result is presented
pub mod celebration {
    /// CESSA blue, gold and white
    pub const CONFETTI_COLORS: [(u8, u8, u8); 3] = [(0x37, 0x61, 0xe8), (0xff, 0xd7, 0x00), (0xff, 0xff, 0xff)];

    /// Grad-cap glyph for the first burst
    pub const GRAD_CAP: &str = "🎓";

    /// Default lifetime of a particle, in animation ticks
    pub const DEFAULT_TICKS: u32 = 200;
}

/// Terminal UI constants
pub mod ui {
    /// QR accent color (#3761e8)
    pub const ACCENT: (u8, u8, u8) = (0x37, 0x61, 0xe8);

    /// Caption gray (#6b7280)
    pub const MUTED: (u8, u8, u8) = (0x6b, 0x72, 0x80);

    /// Preferred preview resolution for the terminal (larger adds nothing)
    pub const PREVIEW_TARGET_PIXELS: u32 = 1280 * 720;
}

/// Supported image formats for upload and the virtual camera
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application info
pub mod app_info {
    /// Version string embedded by build.rs
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Application directory name used under config/cache/picture dirs
    pub const APP_DIR: &str = "photobooth";
}
