use std::path::PathBuf;
use std::time::Instant;

use catalog_images::catalog::{self, Strategy};
use catalog_images::config::Settings;
use catalog_images::error::CatalogError;
use catalog_images::mapping::{self, CatalogEntry};
use catalog_images::scan::{self, ImageIndex};
use catalog_images::{icons, patch, reconcile, report};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "catalog_images",
    about = "Product image maintenance for the catalog page",
    after_help = "Run one instance at a time per page: `patch` backs up and then overwrites the page without locking."
)]
struct Cli {
    /// Settings file (default: ./catalog.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the catalog and write the JSON mapping plus filename reports
    Mapping,
    /// Compare the mapping against images on disk and list what is missing
    Check,
    /// Write `img:` fields for products whose image exists
    Patch,
    /// Render the placeholder PWA icons
    Icons,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    info!(settings = ?settings, "settings loaded");

    let result = match cli.command {
        Commands::Mapping => run_mapping(&settings),
        Commands::Check => run_check(&settings),
        Commands::Patch => run_patch(&settings),
        Commands::Icons => run_icons(&settings),
    };

    match result {
        Err(CatalogError::MissingInput { path }) => {
            println!("Error: cannot find {}", path.display());
            if path == settings.mapping_path {
                println!("Run `catalog_images mapping` first to generate it.");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(()) => {
            let elapsed = t0.elapsed();
            if elapsed.as_secs() >= 1 {
                println!("\nDone in {:.1}s", elapsed.as_secs_f64());
            }
            Ok(())
        }
    }
}

fn read_page(settings: &Settings) -> Result<String, CatalogError> {
    let path = &settings.html_path;
    if !path.is_file() {
        return Err(CatalogError::MissingInput { path: path.clone() });
    }
    std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))
}

fn extract_entries(settings: &Settings, html: &str) -> Vec<CatalogEntry> {
    let extraction = catalog::extract(html, &settings.extract_options());
    match extraction.strategy {
        Strategy::NotFound => println!("No product catalog found (marker `{}`)", settings.marker),
        Strategy::Lenient if extraction.skipped > 0 => println!(
            "Found {} products ({} unreadable records skipped)",
            extraction.products.len(),
            extraction.skipped
        ),
        _ => println!("Found {} products", extraction.products.len()),
    }
    mapping::annotate(&extraction.products, settings)
}

fn run_mapping(settings: &Settings) -> Result<(), CatalogError> {
    println!("Reading {}...", settings.html_path.display());
    let html = read_page(settings)?;
    let entries = extract_entries(settings, &html);

    mapping::write_mapping(&settings.mapping_path, &entries)?;
    println!("Wrote {}", settings.mapping_path.display());

    report::write_text(&settings.product_list_path, &report::render_product_list(&entries))?;
    println!("Wrote {}", settings.product_list_path.display());

    report::write_text(
        &settings.filename_list_path,
        &report::render_filename_list(&entries, &settings.default_extension),
    )?;
    println!("Wrote {}", settings.filename_list_path.display());

    println!("\nMapped {} products.", entries.len());
    println!("\nNext steps:");
    println!("1. See {} for the filenames to upload", settings.filename_list_path.display());
    println!("2. Put the images in {}", settings.image_dir.display());
    println!("3. Run `catalog_images patch` to update the page");
    Ok(())
}

fn run_check(settings: &Settings) -> Result<(), CatalogError> {
    let entries = mapping::read_mapping(&settings.mapping_path)?;

    if !settings.image_dir.is_dir() {
        warn!(dir = %settings.image_dir.display(), "image folder not found, creating it");
        std::fs::create_dir_all(&settings.image_dir)
            .map_err(|e| CatalogError::io(&settings.image_dir, e))?;
    }
    let index = scan::scan_images(&settings.image_dir, &settings.extensions)?;
    let result = reconcile::reconcile(&entries, index.names());
    print!("{}", report::render_summary(&result));

    if !result.missing.is_empty() {
        report::write_text(&settings.missing_list_path, &report::render_missing_list(&result))?;
        println!("\nWrote {}", settings.missing_list_path.display());
    }
    Ok(())
}

fn run_patch(settings: &Settings) -> Result<(), CatalogError> {
    let html = read_page(settings)?;

    let entries = match mapping::read_mapping(&settings.mapping_path) {
        Ok(entries) => {
            println!("Loaded {} products from {}", entries.len(), settings.mapping_path.display());
            entries
        }
        Err(CatalogError::MissingInput { .. }) => {
            println!("No mapping file, deriving filenames from the page");
            extract_entries(settings, &html)
        }
        Err(e) => return Err(e),
    };

    let index = match scan::scan_images(&settings.image_dir, &settings.extensions) {
        Ok(index) => index,
        Err(CatalogError::MissingInput { .. }) => ImageIndex::default(),
        Err(e) => return Err(e),
    };
    println!("Found {} image files", index.len());
    for name in index.preferred().take(10) {
        println!("  - {}", name);
    }
    if index.len() > 10 {
        println!("  ... and {} more", index.len() - 10);
    }

    let assignments = patch::resolve_assignments(&entries, &index, &settings.image_url_prefix);
    let outcome = patch::apply_patch(
        &settings.html_path,
        &settings.marker,
        &settings.backup_suffix,
        &assignments,
    )?;

    match outcome.backup {
        Some(backup) => {
            println!("Backup written to {}", backup.display());
            println!("Updated {} product image paths in {}", outcome.updated, settings.html_path.display());
        }
        None => {
            println!("Nothing to update.");
            println!("Make sure the images are in {}", settings.image_dir.display());
        }
    }
    Ok(())
}

fn run_icons(settings: &Settings) -> Result<(), CatalogError> {
    match icons::generate_icons(settings) {
        Ok(paths) => {
            for path in &paths {
                println!("Created {}", path.display());
            }
            println!("All icons created.");
            Ok(())
        }
        Err(CatalogError::ImagingUnavailable) => {
            println!("Icon rendering is not available in this build.");
            println!("Rebuild with the imaging feature enabled:");
            println!("  cargo build --features icons");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
