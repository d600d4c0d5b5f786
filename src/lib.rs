//! Core entry point for the cupping_radar crate.
//!
//! The pipeline turns raw cupping score rows into a one-page PDF holding a
//! sensory radar chart and a table of lot metadata:
//!
//! 1. [`aggregate`] averages the score rows of one lot per category.
//! 2. [`metadata`] resolves the descriptive record of the same lot.
//! 3. [`radar`] and [`table`] turn both into chart geometry and a grid.
//! 4. [`compose`] lays them out on a page, [`builder`] serializes the pages.
//!
//! [`pipeline`] ties the steps together and [`service`] maps the outcome to a
//! transport-level response.

pub mod aggregate;
pub mod builder;
pub mod compose;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod radar;
pub mod service;
pub mod sources;
pub mod table;

pub use config::{AppConfig, ReportConfig};
pub use error::ReportError;
pub use model::Lookup;
pub use pipeline::{generate_report, RenderedReport};
pub use service::{ReportResponse, ReportService};
