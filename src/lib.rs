//! Catalog image maintenance for the points-mall page.
//!
//! Pipeline: page markup -> [`catalog::extract`] -> [`mapping::annotate`]
//! (filenames via [`naming::derive`]) -> [`reconcile::reconcile`] against
//! [`scan::scan_images`] -> [`patch::apply_patch`] to write `img:` fields back.

pub mod catalog;
pub mod config;
pub mod error;
pub mod icons;
pub mod mapping;
pub mod naming;
pub mod patch;
pub mod reconcile;
pub mod report;
pub mod scan;

pub use error::{CatalogError, Result};
