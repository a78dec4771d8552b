//! Plain-text reports for maintainers.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{CatalogError, Result};
use crate::mapping::CatalogEntry;
use crate::reconcile::ReconciliationReport;

const WIDTH: usize = 80;
const SUMMARY_LIMIT: usize = 20;

fn rule() -> String {
    "=".repeat(WIDTH)
}

fn thin_rule() -> String {
    "-".repeat(WIDTH)
}

fn title(entry: &CatalogEntry) -> String {
    format!("{} {}", entry.brand, entry.name)
}

/// Full listing: every product with its expected filename and path.
pub fn render_product_list(entries: &[CatalogEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Product image list");
    let _ = writeln!(out, "{}\n", rule());
    let _ = writeln!(out, "{} products need images\n", entries.len());
    let _ = writeln!(out, "Instructions:");
    let _ = writeln!(out, "1. Put product images in the image folder");
    let _ = writeln!(out, "2. Image filenames must match the 'Filename' values below exactly");
    let _ = writeln!(out, "3. The page picks up images automatically after `catalog_images patch`");
    let _ = writeln!(out, "4. Products without an image fall back to their icon\n");
    let _ = writeln!(out, "{}\n", rule());

    for entry in entries {
        let _ = writeln!(out, "{}. {}", entry.id, title(entry));
        let _ = writeln!(out, "   Price: {}", entry.price);
        let _ = writeln!(out, "   Tag: {}", entry.tag);
        let _ = writeln!(out, "   Filename: {}", entry.filename);
        let _ = writeln!(out, "   Path: {}", entry.path);
        if let Some(img) = &entry.existing_image {
            let _ = writeln!(out, "   Existing image: {}", img);
        }
        out.push('\n');
    }
    out
}

/// Numbered filenames with the product each one belongs to.
pub fn render_filename_list(entries: &[CatalogEntry], extension: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Image filename list");
    let _ = writeln!(out, "{}\n", rule());
    let _ = writeln!(out, "{} products\n", entries.len());
    let _ = writeln!(out, "Filename format: brand_name.{}\n", extension);
    let _ = writeln!(out, "{}\n", thin_rule());

    for (idx, entry) in entries.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", idx + 1, entry.filename);
        let _ = writeln!(out, "   Product: {}", entry.description);
        let _ = writeln!(out, "   Price: {} points", entry.price);
    }
    out
}

pub fn render_missing_list(report: &ReconciliationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Missing image list");
    let _ = writeln!(out, "{}\n", rule());
    let _ = writeln!(out, "{} products are missing images\n", report.missing_count());
    let _ = writeln!(out, "{}\n", thin_rule());

    for (idx, entry) in report.missing.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", idx + 1, title(entry));
        let _ = writeln!(out, "   Filename: {}", entry.filename);
        let _ = writeln!(out, "   Path: {}\n", entry.path);
    }
    out
}

/// Console summary of a reconciliation run.
pub fn render_summary(report: &ReconciliationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Image upload status");
    let _ = writeln!(out, "{}\n", rule());
    let _ = writeln!(out, "Total products: {}", report.total);
    let _ = writeln!(out, "With images:    {}", report.matched);
    let _ = writeln!(out, "Missing images: {}", report.missing_count());
    let _ = writeln!(out, "Progress:       {}", report.percent_label());

    if !report.missing.is_empty() {
        let _ = writeln!(out, "\nMissing images (first {}):", SUMMARY_LIMIT);
        let _ = writeln!(out, "{}", thin_rule());
        for (idx, entry) in report.missing.iter().take(SUMMARY_LIMIT).enumerate() {
            let _ = writeln!(out, "{}. {}", idx + 1, title(entry));
            let _ = writeln!(out, "   Filename: {}", entry.filename);
        }
        if report.missing.len() > SUMMARY_LIMIT {
            let _ = writeln!(out, "\n... and {} more", report.missing.len() - SUMMARY_LIMIT);
        }
    }
    let _ = writeln!(out, "\n{}", rule());
    out
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|e| CatalogError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductRecord;
    use crate::config::Settings;
    use crate::mapping::annotate;
    use crate::reconcile::reconcile;
    use std::collections::HashSet;

    fn entries(n: usize) -> Vec<CatalogEntry> {
        let records: Vec<ProductRecord> = (0..n)
            .map(|i| ProductRecord {
                category: Some("ph".to_string()),
                brand: "Acme".to_string(),
                name: format!("Widget {}", i),
                price: 100 + i as u64,
                tag: "new".to_string(),
                icon: String::new(),
                existing_image: (i == 0).then(|| "old.jpg".to_string()),
            })
            .collect();
        annotate(&records, &Settings::default())
    }

    #[test]
    fn product_list_layout() {
        let text = render_product_list(&entries(2));
        assert!(text.starts_with(&format!("{}\nProduct image list\n", "=".repeat(80))));
        assert!(text.contains("2 products need images"));
        assert!(text.contains("1. Acme Widget 0\n   Price: 100\n   Tag: new\n   Filename: acme_widget_0.jpg\n   Path: product-images-home/acme_widget_0.jpg\n   Existing image: old.jpg\n"));
        // no existing image line for the second product
        assert!(text.ends_with("   Path: product-images-home/acme_widget_1.jpg\n\n"));
    }

    #[test]
    fn filename_list_layout() {
        let text = render_filename_list(&entries(1), "jpg");
        assert!(text.contains("Filename format: brand_name.jpg"));
        assert!(text.contains("1. acme_widget_0.jpg\n   Product: Acme Widget 0 new\n   Price: 100 points\n"));
    }

    #[test]
    fn summary_of_empty_catalog() {
        let report = reconcile(&[], &HashSet::new());
        let text = render_summary(&report);
        assert!(text.contains("Total products: 0"));
        assert!(text.contains("Progress:       N/A"));
        assert!(!text.contains("Missing images (first"));
    }

    #[test]
    fn summary_truncates_missing() {
        let report = reconcile(&entries(23), &HashSet::new());
        let text = render_summary(&report);
        assert!(text.contains("Progress:       0.0%"));
        assert!(text.contains("20. Acme Widget 19"));
        assert!(!text.contains("21. Acme Widget 20"));
        assert!(text.contains("... and 3 more"));
    }

    #[test]
    fn missing_list_layout() {
        let all = entries(3);
        let present: HashSet<String> = [all[1].filename.clone()].into_iter().collect();
        let text = render_missing_list(&reconcile(&all, &present));
        assert!(text.contains("2 products are missing images"));
        assert!(text.contains("1. Acme Widget 0\n   Filename: acme_widget_0.jpg\n"));
        assert!(text.contains("2. Acme Widget 2\n"));
    }
}
