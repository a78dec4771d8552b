//! Placeholder PWA icons: a text label centred on an orange square.
//!
//! Rendering needs the `icons` feature (resvg). Without it
//! [`generate_icons`] returns [`CatalogError::ImagingUnavailable`].

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{CatalogError, Result};

pub const BACKGROUND: &str = "#FFA500";
pub const FOREGROUND: &str = "#1C1C1C";
/// Font size relative to the icon edge.
const FONT_SCALE: f32 = 0.35;

pub fn icon_path(dir: &Path, size: u32) -> PathBuf {
    dir.join(format!("icon-{}.png", size))
}

pub fn icon_svg(label: &str, size: u32) -> String {
    let font_size = (size as f32 * FONT_SCALE).floor();
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{s}" height="{s}" viewBox="0 0 {s} {s}">
<rect width="{s}" height="{s}" fill="{bg}"/>
<text x="{c}" y="{c}" font-family="Arial Black, Arial, Helvetica, sans-serif" font-weight="bold" font-size="{fs}" fill="{fg}" text-anchor="middle" dominant-baseline="central">{label}</text>
</svg>"#,
        s = size,
        c = size as f32 / 2.0,
        bg = BACKGROUND,
        fg = FOREGROUND,
        fs = font_size,
        label = escape_xml(label),
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(feature = "icons")]
pub fn generate_icons(settings: &Settings) -> Result<Vec<PathBuf>> {
    use std::sync::Arc;

    use resvg::{tiny_skia, usvg};
    use tracing::{info, warn};

    let mut opt = usvg::Options::default();
    Arc::make_mut(&mut opt.fontdb).load_system_fonts();
    if opt.fontdb.len() == 0 {
        warn!("no system fonts found, icons will render without a label");
    }

    std::fs::create_dir_all(&settings.icon_dir).map_err(|e| CatalogError::io(&settings.icon_dir, e))?;

    let mut written = Vec::with_capacity(settings.icon_sizes.len());
    for &size in &settings.icon_sizes {
        let svg = icon_svg(&settings.icon_label, size);
        let tree = usvg::Tree::from_str(&svg, &opt).map_err(|e| CatalogError::Icon(e.to_string()))?;
        let mut pixmap = tiny_skia::Pixmap::new(size, size)
            .ok_or_else(|| CatalogError::Icon(format!("cannot allocate a {size}x{size} pixmap")))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let path = icon_path(&settings.icon_dir, size);
        pixmap
            .save_png(&path)
            .map_err(|e| CatalogError::Icon(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), size, "icon written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(not(feature = "icons"))]
pub fn generate_icons(_settings: &Settings) -> Result<Vec<PathBuf>> {
    Err(CatalogError::ImagingUnavailable)
}
