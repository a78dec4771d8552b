use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const FIXTURE: &str = include_str!("fixtures/index.html");

fn run(dir: &Path, args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_catalog_images"))
        .args(args)
        .current_dir(dir)
        .env("CATALOG_HTML_PATH", "index.html")
        .env("RUST_LOG", "warn")
        .output()
        .expect("run CLI");
    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn site(html: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), html).unwrap();
    dir
}

#[test]
fn mapping_writes_json_and_reports() {
    let dir = site(FIXTURE);
    let out = stdout(&run(dir.path(), &["mapping"]));
    assert!(out.contains("Found 6 products"));

    let json = fs::read_to_string(dir.path().join("product-images-info.json")).unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(entries.len(), 6);
    assert_eq!(entries[0]["filename"], "apple_iphone_15_pro.jpg");
    assert_eq!(entries[0]["category"], "ph");
    assert_eq!(entries[2]["existingImage"], "product-images-home/dyson_v15_detect.jpg");
    assert_eq!(entries[3]["filename"], "nike_air_zoom_pegasus.jpg");
    // same brand and name after normalisation: same file
    assert_eq!(entries[4]["filename"], entries[5]["filename"]);

    let names = fs::read_to_string(dir.path().join("image-filenames.txt")).unwrap();
    assert!(names.contains("1. apple_iphone_15_pro.jpg"));
    assert!(dir.path().join("product-image-list.txt").exists());
}

#[test]
fn check_reports_progress_and_missing() {
    let dir = site(FIXTURE);
    run(dir.path(), &["mapping"]);
    fs::write(dir.path().join("APPLE_iphone_15_pro.jpg"), b"jpg").unwrap();
    fs::write(dir.path().join("xiaomi_redmi_note_13.png"), b"png").unwrap();

    let out = stdout(&run(dir.path(), &["check"]));
    assert!(out.contains("Total products: 6"));
    assert!(out.contains("With images:    1"));
    assert!(out.contains("Missing images: 5"));
    assert!(out.contains("Progress:       16.7%"));

    let missing = fs::read_to_string(dir.path().join("missing-images.txt")).unwrap();
    assert!(missing.starts_with("Missing image list"));
    assert!(missing.contains("1. Xiaomi Redmi Note 13\n   Filename: xiaomi_redmi_note_13.jpg"));
}

#[test]
fn check_without_mapping_exits_cleanly() {
    let dir = site(FIXTURE);
    let out = stdout(&run(dir.path(), &["check"]));
    assert!(out.contains("cannot find product-images-info.json"));
    assert!(!dir.path().join("missing-images.txt").exists());
}

#[test]
fn patch_updates_once_and_backs_up() {
    let dir = site(FIXTURE);
    fs::write(dir.path().join("nike_air_zoom_pegasus.png"), b"png").unwrap();
    fs::write(dir.path().join("dyson_v15_detect.webp"), b"webp").unwrap();

    let out = stdout(&run(dir.path(), &["patch"]));
    assert!(out.contains("Updated 2 product image paths"));

    let page = fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(page.contains(
        r#"{ b: "Nike", n: "Air Zoom / Pegasus", p: 899, t: "sale", i: "👟", img: "product-images-home/nike_air_zoom_pegasus.png" }"#
    ));
    assert!(page.contains(r#"img: "product-images-home/dyson_v15_detect.webp" }"#));
    let backup = dir.path().join("index.html.backup");
    assert_eq!(fs::read_to_string(&backup).unwrap(), FIXTURE);

    fs::remove_file(&backup).unwrap();
    let out = stdout(&run(dir.path(), &["patch"]));
    assert!(out.contains("Nothing to update."));
    assert!(!backup.exists());
    assert_eq!(fs::read_to_string(dir.path().join("index.html")).unwrap(), page);
}

#[test]
fn patch_without_images_writes_nothing() {
    let dir = site(FIXTURE);
    let out = stdout(&run(dir.path(), &["patch"]));
    assert!(out.contains("Nothing to update."));
    assert!(!dir.path().join("index.html.backup").exists());
    assert_eq!(fs::read_to_string(dir.path().join("index.html")).unwrap(), FIXTURE);
}

#[test]
fn missing_page_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let out = stdout(&run(dir.path(), &["mapping"]));
    assert!(out.contains("cannot find index.html"));
    assert!(!dir.path().join("product-images-info.json").exists());
}

#[test]
fn page_without_catalog_maps_nothing() {
    let dir = site("<html><body>coming soon</body></html>");
    let out = stdout(&run(dir.path(), &["mapping"]));
    assert!(out.contains("No product catalog found"));
    let out = stdout(&run(dir.path(), &["check"]));
    assert!(out.contains("Total products: 0"));
    assert!(out.contains("Progress:       N/A"));
}

#[test]
fn single_widget_end_to_end() {
    let html = "<script>\nconst SD = {\n    'ph': [\n        { b: \"Acme\", n: \"Widget Pro\", p: 500, t: \"new\", i: \"star\" }\n    ]\n};\n</script>\n";
    let dir = site(html);
    run(dir.path(), &["mapping"]);

    let out = stdout(&run(dir.path(), &["check"]));
    assert!(out.contains("Missing images: 1"));
    assert!(out.contains("1. Acme Widget Pro\n   Filename: acme_widget_pro.jpg"));

    fs::write(dir.path().join("acme_widget_pro.jpg"), b"jpg").unwrap();
    let out = stdout(&run(dir.path(), &["check"]));
    assert!(out.contains("With images:    1"));
    assert!(out.contains("Progress:       100.0%"));
}

#[cfg(feature = "icons")]
#[test]
fn icons_are_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let out = stdout(&run(dir.path(), &["icons"]));
    assert!(out.contains("All icons created."));
    assert!(dir.path().join("icon-192.png").exists());
    assert!(dir.path().join("icon-512.png").exists());
}
