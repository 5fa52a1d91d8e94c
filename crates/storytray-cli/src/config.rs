//! CLI configuration file

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storytray_core::{MediaFile, TrayConfig, Viewer};
use storytray_http::HttpConfig;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "storytray.toml";

/// Everything `storytray` reads from its config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding the persisted tray records
    pub data_dir: PathBuf,
    pub viewer: Viewer,
    pub tray: TrayConfig,
    pub http: HttpConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".storytray"),
            viewer: Viewer::new("me"),
            tray: TrayConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Content type guessed from a file extension
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(content_type)
}

/// Media file for `path` with its content type filled in when known
pub fn media_file(path: impl Into<PathBuf>) -> MediaFile {
    let path = path.into();
    match content_type_for(&path) {
        Some(content_type) => MediaFile::new(path).with_content_type(content_type),
        None => MediaFile::new(path),
    }
}
