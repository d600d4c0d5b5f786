//! Configuration for the report pipeline and its data sources.
//!
//! Every value has a default matching the cupping spreadsheets the reports
//! were designed for, so an empty TOML file is a valid configuration.  Data
//! source locations live in [`SourcesConfig`] and are handed to the source
//! collaborators; the pipeline itself only sees [`ReportConfig`].

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{DEFAULT_CATEGORIES, DEFAULT_METADATA_LOT_COLUMN, DEFAULT_SCORE_LOT_COLUMN};

/// Errors raised while loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(io::Error),
    /// The configuration file is not valid TOML for [`AppConfig`].
    Parse(toml::de::Error),
    /// A value is out of range or inconsistent with another value.
    Invalid {
        /// Dotted path of the offending setting.
        field: &'static str,
        /// Human readable explanation.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Failed to read configuration: {err}"),
            Self::Parse(err) => write!(f, "Failed to parse configuration: {err}"),
            Self::Invalid { field, reason } => {
                write!(f, "Invalid configuration value for '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

/// A metadata column shown in the report table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name in the metadata dataset.
    pub column: String,
    /// Header shown in the table; defaults to the column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FieldSpec {
    /// Creates a field shown under `label`.
    pub fn new(column: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            label: Some(label.into()),
        }
    }

    /// Creates a field whose header is the column name itself.
    pub fn column(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            label: None,
        }
    }

    /// Returns the header shown in the table.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.column)
    }
}

/// Settings of the radar chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Score mapped to the chart center.
    pub scale_min: f64,
    /// Score mapped to the outer ring.
    pub scale_max: f64,
    /// Number of concentric grid rings.
    pub rings: usize,
    /// Title text preceding the lot identifier.
    pub title_prefix: String,
    /// Font size of the chart title in points.
    pub title_font_size: u8,
    /// Font size of the axis labels in points.
    pub label_font_size: u8,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            scale_min: 0.0,
            scale_max: 10.0,
            rings: 5,
            title_prefix: "Radar Sensory".to_owned(),
            title_font_size: 16,
            label_font_size: 9,
        }
    }
}

/// Page geometry shared by every report page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Paper width in millimetres.
    pub width_mm: f64,
    /// Paper height in millimetres.
    pub height_mm: f64,
    /// Margin applied on all four sides in millimetres.
    pub margin_mm: f64,
    /// Share of the content height given to the chart.
    pub chart_fraction: f64,
    /// Font size of the metadata table in points.
    pub table_font_size: u8,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 15.0,
            chart_fraction: 2.0 / 3.0,
            table_font_size: 8,
        }
    }
}

/// Everything the pipeline needs besides the two datasets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Score categories in chart order.
    pub categories: Vec<String>,
    /// Lot identifier column of the score dataset.
    pub score_lot_column: String,
    /// Lot identifier column of the metadata dataset.
    pub metadata_lot_column: String,
    /// Metadata columns shown in the table, in display order.
    ///
    /// Empty means every column of the lot's record in source order, each
    /// headed by its column name.
    pub metadata_fields: Vec<FieldSpec>,
    /// Radar chart settings.
    pub chart: ChartConfig,
    /// Page settings.
    pub page: PageConfig,
    /// Directory holding the font family, searched before the defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fonts_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| (*c).to_owned()).collect(),
            score_lot_column: DEFAULT_SCORE_LOT_COLUMN.to_owned(),
            metadata_lot_column: DEFAULT_METADATA_LOT_COLUMN.to_owned(),
            metadata_fields: Vec::new(),
            chart: ChartConfig::default(),
            page: PageConfig::default(),
            fonts_dir: None,
        }
    }
}

impl ReportConfig {
    /// Replaces the metadata fields and returns the updated configuration.
    pub fn with_metadata_fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = FieldSpec>,
    {
        self.metadata_fields = fields.into_iter().collect();
        self
    }

    /// Sets the font directory and returns the updated configuration.
    pub fn with_fonts_dir(mut self, dir: impl Into<Option<PathBuf>>) -> Self {
        self.fonts_dir = dir.into();
        self
    }

    /// Checks the settings for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::invalid("categories", "at least one category is required"));
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.trim().is_empty() {
                return Err(ConfigError::invalid("categories", "category names must not be empty"));
            }
            if !seen.insert(category.as_str()) {
                return Err(ConfigError::invalid(
                    "categories",
                    format!("duplicate category '{category}'"),
                ));
            }
        }

        if self.score_lot_column.trim().is_empty() {
            return Err(ConfigError::invalid("score_lot_column", "must not be empty"));
        }
        if self.metadata_lot_column.trim().is_empty() {
            return Err(ConfigError::invalid("metadata_lot_column", "must not be empty"));
        }
        if self
            .metadata_fields
            .iter()
            .any(|field| field.column.trim().is_empty())
        {
            return Err(ConfigError::invalid(
                "metadata_fields",
                "field columns must not be empty",
            ));
        }

        let chart = &self.chart;
        if !chart.scale_min.is_finite() || !chart.scale_max.is_finite() {
            return Err(ConfigError::invalid("chart.scale_min", "scale bounds must be finite"));
        }
        if chart.scale_max <= chart.scale_min {
            return Err(ConfigError::invalid(
                "chart.scale_max",
                format!(
                    "{} must be greater than scale_min {}",
                    chart.scale_max, chart.scale_min
                ),
            ));
        }
        if chart.rings == 0 {
            return Err(ConfigError::invalid("chart.rings", "at least one ring is required"));
        }

        let page = &self.page;
        if !(page.chart_fraction > 0.0 && page.chart_fraction < 1.0) {
            return Err(ConfigError::invalid(
                "page.chart_fraction",
                format!("{} is not strictly between 0 and 1", page.chart_fraction),
            ));
        }
        if page.margin_mm < 0.0 {
            return Err(ConfigError::invalid("page.margin_mm", "must not be negative"));
        }
        if page.width_mm <= 2.0 * page.margin_mm || page.height_mm <= 2.0 * page.margin_mm {
            return Err(ConfigError::invalid(
                "page.width_mm",
                "page leaves no room inside the margins",
            ));
        }

        Ok(())
    }
}

/// Locations of the two source datasets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// CSV file holding one row per cupping evaluation.
    pub scores: Option<PathBuf>,
    /// CSV file holding one descriptive row per lot.
    pub metadata: Option<PathBuf>,
}

/// Top-level configuration file layout.
///
/// ```toml
/// [sources]
/// scores = "data/radar.csv"
/// metadata = "data/fato_tipo_de_cafe.csv"
///
/// [report.chart]
/// scale_min = 6.0
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data source locations.
    pub sources: SourcesConfig,
    /// Pipeline settings.
    pub report: ReportConfig,
}

impl AppConfig {
    /// Loads and validates the configuration stored at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.report.validate()?;
        Ok(config)
    }
}
