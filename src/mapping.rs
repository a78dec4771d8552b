//! The JSON image mapping: one annotated entry per catalog record.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::catalog::ProductRecord;
use crate::config::Settings;
use crate::error::{CatalogError, Result};
use crate::naming;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// 1-based catalog position.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: u64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<String>,
    pub brand: String,
    pub name: String,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub icon: String,
    #[serde(alias = "image_filename")]
    pub filename: String,
    #[serde(default, alias = "image_path")]
    pub path: String,
    #[serde(
        default,
        rename = "existingImage",
        alias = "existing_img",
        alias = "current_img",
        deserialize_with = "empty_as_none"
    )]
    pub existing_image: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Older exports used the canonical id string as `id`.
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    Ok(Value::deserialize(d)?.as_u64().unwrap_or(0))
}

fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let s: Option<String> = Option::deserialize(d)?;
    Ok(s.filter(|s| !s.is_empty()))
}

pub fn image_url(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", prefix, filename)
    }
}

pub fn annotate(records: &[ProductRecord], settings: &Settings) -> Vec<CatalogEntry> {
    records
        .iter()
        .enumerate()
        .map(|(idx, rec)| {
            let derived =
                naming::derive_with_extension(&rec.brand, &rec.name, &settings.default_extension);
            let path = image_url(&settings.image_url_prefix, &derived.image_filename);
            CatalogEntry {
                id: idx as u64 + 1,
                category: rec.category.clone(),
                brand: rec.brand.clone(),
                name: rec.name.clone(),
                price: rec.price,
                tag: rec.tag.clone(),
                icon: rec.icon.clone(),
                filename: derived.image_filename,
                path,
                existing_image: rec.existing_image.clone(),
                description: format!("{} {} {}", rec.brand, rec.name, rec.tag).trim().to_string(),
            }
        })
        .collect()
}

pub fn read_mapping(path: &Path) -> Result<Vec<CatalogEntry>> {
    if !path.exists() {
        return Err(CatalogError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_mapping(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
    let mut json = serde_json::to_string_pretty(entries).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');
    fs::write(path, json).map_err(|e| CatalogError::io(path, e))
}
