//! Canonical image names for catalog products.
//!
//! The id is `brand + "_" + name`, lowercased, stripped of characters that are
//! unsafe in filenames, with whitespace runs collapsed to `_`. The steps run in
//! that order so the same product always maps to the same file. Two products
//! with the same brand and name share a filename; nothing disambiguates them.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXTENSION: &str = "jpg";

static FORBIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedIdentity {
    pub canonical_id: String,
    pub image_filename: String,
}

pub fn derive(brand: &str, name: &str) -> DerivedIdentity {
    derive_with_extension(brand, name, DEFAULT_EXTENSION)
}

pub fn derive_with_extension(brand: &str, name: &str, extension: &str) -> DerivedIdentity {
    let canonical_id = canonical_id(brand, name);
    let image_filename = format!("{}.{}", canonical_id, extension.trim_start_matches('.'));
    DerivedIdentity {
        canonical_id,
        image_filename,
    }
}

pub fn canonical_id(brand: &str, name: &str) -> String {
    let joined = format!("{}_{}", brand, name).to_lowercase();
    let stripped = FORBIDDEN_RE.replace_all(&joined, "");
    WHITESPACE_RE.replace_all(&stripped, "_").into_owned()
}

/// Filenames a page may try for `canonical_id`, in extension priority order.
/// Reconciliation never probes these; only the exact derived name counts.
pub fn candidate_filenames(canonical_id: &str, extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| format!("{}.{}", canonical_id, ext.trim_start_matches('.')))
        .collect()
}
