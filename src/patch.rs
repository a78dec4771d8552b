//! Attach resolved image paths to catalog records in page markup.
//!
//! A record is found by its leading `{ b: "<brand>", n: "<name>"` text inside
//! the catalog span. An existing `img:` value is replaced in place; otherwise
//! `, img: "<path>"` goes after the `i:` field, or after `n:` when there is no
//! `i:`. Everything outside the rewritten records is left byte-for-byte.
//!
//! Writes happen only when the text changed, backup first. Concurrent runs
//! against the same page are not supported.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::config::backup_path_for;
use crate::error::{CatalogError, Result};
use crate::mapping::{image_url, CatalogEntry};
use crate::scan::ImageIndex;

static IMG_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bimg\s*:\s*"([^"]*)""#).unwrap());
static ICON_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bi\s*:\s*"[^"]*""#).unwrap());
static NAME_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bn\s*:\s*"[^"]*""#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAssignment {
    pub brand: String,
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub content: String,
    /// Assignments that changed at least one record.
    pub updated: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PatchReport {
    pub updated: usize,
    /// Set only when the page was rewritten.
    pub backup: Option<PathBuf>,
}

/// Pair each entry whose image exists in `index` with its page path.
pub fn resolve_assignments(
    entries: &[CatalogEntry],
    index: &ImageIndex,
    prefix: &str,
) -> Vec<ImageAssignment> {
    entries
        .iter()
        .filter_map(|entry| {
            let stem = Path::new(&entry.filename).file_stem()?.to_string_lossy();
            let actual = index.resolve(&stem)?;
            Some(ImageAssignment {
                brand: entry.brand.clone(),
                name: entry.name.clone(),
                path: image_url(prefix, actual),
            })
        })
        .collect()
}

pub fn patch_markup(markup: &str, span: Range<usize>, assignments: &[ImageAssignment]) -> PatchOutcome {
    let mut body = markup[span.clone()].to_string();
    let mut updated = 0;

    for assignment in assignments {
        let next = patch_records(&body, assignment);
        if next != body {
            debug!(brand = %assignment.brand, name = %assignment.name, path = %assignment.path, "record updated");
            body = next;
            updated += 1;
        }
    }

    let mut content = String::with_capacity(markup.len() + body.len() - span.len());
    content.push_str(&markup[..span.start]);
    content.push_str(&body);
    content.push_str(&markup[span.end..]);
    PatchOutcome { content, updated }
}

fn patch_records(body: &str, assignment: &ImageAssignment) -> String {
    let pattern = format!(
        r#"\{{\s*b\s*:\s*"{}"\s*,\s*n\s*:\s*"{}"[^}}]*\}}"#,
        regex::escape(&assignment.brand),
        regex::escape(&assignment.name)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(error = %e, brand = %assignment.brand, "cannot build record pattern");
            return body.to_string();
        }
    };
    re.replace_all(body, |caps: &Captures| set_image(&caps[0], &assignment.path))
        .into_owned()
}

fn set_image(record: &str, path: &str) -> String {
    if let Some(value) = IMG_VALUE_RE.captures(record).and_then(|c| c.get(1)) {
        return format!("{}{}{}", &record[..value.start()], path, &record[value.end()..]);
    }
    let anchor = ICON_FIELD_RE
        .find(record)
        .or_else(|| NAME_FIELD_RE.find(record));
    match anchor {
        Some(m) => format!(
            "{}, img: \"{}\"{}",
            &record[..m.end()],
            path,
            &record[m.end()..]
        ),
        None => record.to_string(),
    }
}

/// Patch the page at `path` in place. Nothing is written when no record changes.
pub fn apply_patch(
    path: &Path,
    marker: &str,
    backup_suffix: &str,
    assignments: &[ImageAssignment],
) -> Result<PatchReport> {
    if !path.is_file() {
        return Err(CatalogError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let original = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    let Some(span) = catalog::locate(&original, marker) else {
        warn!(path = %path.display(), "catalog literal not found, nothing to patch");
        return Ok(PatchReport::default());
    };

    let outcome = patch_markup(&original, span, assignments);
    if outcome.content == original {
        info!("no records changed");
        return Ok(PatchReport::default());
    }

    let backup = backup_path_for(path, backup_suffix);
    fs::write(&backup, &original).map_err(|e| CatalogError::io(&backup, e))?;
    fs::write(path, &outcome.content).map_err(|e| CatalogError::io(path, e))?;
    info!(updated = outcome.updated, backup = %backup.display(), "page rewritten");

    Ok(PatchReport {
        updated: outcome.updated,
        backup: Some(backup),
    })
}
