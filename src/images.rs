use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tracing::{debug, warn};

/// Robot images shipped with the atlas, relative to the asset directory.
pub const DEFAULT_ROBOT_IMAGES: &[(&str, &str)] = &[
    ("Franka Emika Panda", "assets/images/Franka-Emika-Panda.png"),
    (
        "Fetch Mobile Manipulator",
        "assets/images/Fetch-Mobile-Manipulator.png",
    ),
    ("WidowX 250s", "assets/images/WidowX-250.png"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageMime {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/avif")]
    Avif,
}

impl ImageMime {
    /// Unknown or missing extensions are treated as PNG.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => ImageMime::Jpeg,
            "gif" => ImageMime::Gif,
            "webp" => ImageMime::Webp,
            "avif" => ImageMime::Avif,
            _ => ImageMime::Png,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Gif => "image/gif",
            ImageMime::Webp => "image/webp",
            ImageMime::Avif => "image/avif",
        }
    }
}

/// An image embedded as a `data:` URI, so the renderer never fetches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineImage {
    pub mime: ImageMime,
    pub byte_len: usize,
    pub data_uri: String,
}

impl InlineImage {
    pub fn encode(mime: ImageMime, bytes: &[u8]) -> Self {
        let payload = STANDARD.encode(bytes);
        Self {
            mime,
            byte_len: bytes.len(),
            data_uri: format!("data:{};base64,{payload}", mime.as_str()),
        }
    }
}

pub type ImageMap = BTreeMap<String, InlineImage>;

/// Resolves each configured robot image under `asset_dir`. Robots whose file
/// is missing or unreadable are left out of the map.
pub fn resolve_images<'a, I>(asset_dir: &Path, mapping: I) -> ImageMap
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut images = ImageMap::new();
    for (robot, relative) in mapping {
        let path = asset_dir.join(relative);
        if !path.is_file() {
            debug!(robot, path = %path.display(), "robot image not found");
            continue;
        }
        match fs::read(&path) {
            Ok(bytes) => {
                let image = InlineImage::encode(ImageMime::from_path(&path), &bytes);
                images.insert(robot.to_string(), image);
            }
            Err(err) => {
                warn!(robot, path = %path.display(), error = %err, "failed to read robot image");
            }
        }
    }
    images
}
