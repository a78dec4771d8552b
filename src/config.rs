//! Run settings: built-in defaults, then an optional `catalog.toml`, then
//! `CATALOG_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::catalog::ExtractOptions;
use crate::error::Result;

pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";

const CATEGORIES: &[&str] = &[
    "ph", "sp", "fa", "li", "di", "sh", "be", "fu", "bk", "fit", "toy", "car", "mus",
];
const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Page holding the catalog literal.
    pub html_path: PathBuf,
    /// Text that opens the catalog literal; must end with `{`.
    pub marker: String,
    pub image_dir: PathBuf,
    /// Prefix written in front of filenames in `path` and `img:` values.
    pub image_url_prefix: String,
    pub mapping_path: PathBuf,
    pub product_list_path: PathBuf,
    pub filename_list_path: PathBuf,
    pub missing_list_path: PathBuf,
    pub backup_suffix: String,
    /// Category keys to read. Empty means every key.
    pub categories: Vec<String>,
    /// Image extensions, highest priority first.
    pub extensions: Vec<String>,
    pub default_extension: String,
    pub icon_label: String,
    pub icon_sizes: Vec<u32>,
    pub icon_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            html_path: PathBuf::from("../index.html"),
            marker: "const SD = {".to_string(),
            image_dir: PathBuf::from("."),
            image_url_prefix: "product-images-home".to_string(),
            mapping_path: PathBuf::from("product-images-info.json"),
            product_list_path: PathBuf::from("product-image-list.txt"),
            filename_list_path: PathBuf::from("image-filenames.txt"),
            missing_list_path: PathBuf::from("missing-images.txt"),
            backup_suffix: ".backup".to_string(),
            categories: CATEGORIES.iter().map(|c| c.to_string()).collect(),
            extensions: EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            default_extension: "jpg".to_string(),
            icon_label: "KOKO".to_string(),
            icon_sizes: vec![192, 512],
            icon_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Layer defaults, the config file and the environment. An explicit
    /// `path` must exist; the default `catalog.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };
        let settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(Environment::with_prefix("CATALOG"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            marker: self.marker.clone(),
            categories: self.categories.clone(),
        }
    }
}

/// Sibling of `path` that receives the pre-patch content.
pub fn backup_path_for(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
