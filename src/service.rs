//! Request-level entry point mapping pipeline outcomes to responses.
//!
//! Responses use a single encoding: a JSON payload carrying the base64
//! encoded PDF.
//!
//! ```json
//! {"fileName": "Lote - 1_radar.pdf", "pdf_base64": "JVBERi0...", "mimetype": "application/pdf"}
//! ```
//!
//! Returning the raw PDF as the response body is not supported.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ReportConfig};
use crate::error::ReportError;
use crate::pipeline::{self, RenderedReport, PDF_MIME_TYPE};
use crate::sources::{MetadataSource, ScoreSource};

/// Status of a response, mirroring the HTTP status it maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    /// The report was rendered.
    Ok,
    /// The lot is missing from one of the datasets.
    NotFound,
    /// Any other failure.
    InternalError,
}

impl ResponseStatus {
    /// Returns the HTTP status code.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
            Self::InternalError => 500,
        }
    }
}

/// Successful response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    /// Suggested file name, `<lot>_radar.pdf`.
    #[serde(rename = "fileName")]
    pub file_name: String,
    /// The PDF, standard base64 with padding.
    pub pdf_base64: String,
    /// Always `application/pdf`.
    pub mimetype: String,
}

impl ReportPayload {
    /// Encodes a rendered report.
    pub fn from_report(report: &RenderedReport) -> Self {
        Self {
            file_name: report.file_name(),
            pdf_base64: STANDARD.encode(report.bytes()),
            mimetype: PDF_MIME_TYPE.to_owned(),
        }
    }

    /// Decodes the embedded PDF.
    pub fn decode_document(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.pdf_base64)
    }
}

/// Error response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable reason; internal details are never included.
    pub detail: String,
}

/// Response body, serialized without an enclosing tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// The rendered report.
    Report(ReportPayload),
    /// The failure reason.
    Error(ErrorBody),
}

/// A response ready to be written by the transport layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportResponse {
    /// Response status.
    pub status: ResponseStatus,
    /// Response body.
    pub body: ResponseBody,
}

impl ReportResponse {
    /// Builds the response to a pipeline outcome.
    pub fn from_outcome(outcome: Result<RenderedReport, ReportError>) -> Self {
        match outcome {
            Ok(report) => Self {
                status: ResponseStatus::Ok,
                body: ResponseBody::Report(ReportPayload::from_report(&report)),
            },
            Err(err) if err.is_not_found() => Self {
                status: ResponseStatus::NotFound,
                body: ResponseBody::Error(ErrorBody {
                    detail: err.to_string(),
                }),
            },
            Err(_) => Self {
                status: ResponseStatus::InternalError,
                body: ResponseBody::Error(ErrorBody {
                    detail: "Failed to generate the report".to_owned(),
                }),
            },
        }
    }

    /// Returns the payload of a successful response.
    pub fn payload(&self) -> Option<&ReportPayload> {
        match &self.body {
            ResponseBody::Report(payload) => Some(payload),
            ResponseBody::Error(_) => None,
        }
    }

    /// Serializes the body to JSON.
    pub fn body_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.body)
    }
}

/// Drives the pipeline for single lots.
///
/// Both datasets are loaded from their sources on every call; nothing is
/// shared between requests besides the immutable configuration.
pub struct ReportService<S, M> {
    scores: S,
    metadata: M,
    config: ReportConfig,
}

impl<S, M> ReportService<S, M>
where
    S: ScoreSource,
    M: MetadataSource,
{
    /// Creates a service after validating `config`.
    pub fn new(scores: S, metadata: M, config: ReportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            scores,
            metadata,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Loads both datasets and renders the report of `lot_id`.
    ///
    /// The metadata dataset is only loaded once the lot is known to the
    /// score dataset.
    pub fn render(&self, lot_id: &str) -> Result<RenderedReport, ReportError> {
        let scores = self.scores.load_scores()?;
        let aggregate = pipeline::aggregate_lot(&scores, lot_id)?;
        let metadata = self.metadata.load_metadata()?;
        let page = pipeline::compose_page(&aggregate, &metadata, &self.config)?;
        pipeline::render_page(lot_id, page, &self.config)
    }

    /// Handles a report request for `lot_id`.
    pub fn handle(&self, lot_id: &str) -> ReportResponse {
        let outcome = self.render(lot_id);
        match &outcome {
            Ok(report) => info!("Serving {} ({} bytes)", report.file_name(), report.bytes().len()),
            Err(err) if err.is_not_found() => info!("{}", err),
            Err(err) => error!("Report for lot '{}' failed: {}", lot_id, err),
        }
        ReportResponse::from_outcome(outcome)
    }
}
