//! Which catalog entries have an image on disk.
//!
//! Only the exact derived filename counts (compared lowercased). Alternate
//! extensions are a display-time fallback and are not probed here.

use std::collections::HashSet;

use crate::mapping::CatalogEntry;

#[derive(Debug, Clone, Default)]
pub struct ReconciliationReport {
    pub total: usize,
    pub matched: usize,
    /// Unmatched entries in catalog order.
    pub missing: Vec<CatalogEntry>,
}

impl ReconciliationReport {
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    /// `None` for an empty catalog.
    pub fn percent(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.matched as f64 * 100.0 / self.total as f64)
        }
    }

    pub fn percent_label(&self) -> String {
        match self.percent() {
            Some(p) => format!("{:.1}%", p),
            None => "N/A".to_string(),
        }
    }
}

/// `present` holds lowercased filenames.
pub fn reconcile(entries: &[CatalogEntry], present: &HashSet<String>) -> ReconciliationReport {
    let mut report = ReconciliationReport {
        total: entries.len(),
        ..Default::default()
    };
    for entry in entries {
        if present.contains(&entry.filename.to_lowercase()) {
            report.matched += 1;
        } else {
            report.missing.push(entry.clone());
        }
    }
    report
}
