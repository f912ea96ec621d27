//! Authenticate, fetch, transform, preview, confirm, write.
//!
//! Each run walks the states of [`PipelineState`] in order and stops at
//! `Written` or `Aborted`. Any error aborts immediately and is returned as
//! is; nothing is written unless every earlier step succeeded.

use crate::api::PriceListSource;
use crate::config::AppConfig;
use crate::credentials::CredentialBlob;
use crate::error::Result;
use crate::model::PriceListDocument;
use crate::preview::{render_preview, DEFAULT_PREVIEW_LIMIT};
use crate::spreadsheet::{default_file_name, SpreadsheetWriter};
use crate::transform::{normalize, TransformWarning};
use chrono::{DateTime, Local};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    CredentialLoaded,
    Fetched,
    Transformed,
    PreviewedOrSkipped,
    Confirmed,
    Written,
    Aborted,
}

/// Asks the user whether to go ahead with the write.
pub trait Confirmation {
    /// `preview` is the rendered table; return `true` to write the file.
    fn confirm(&mut self, preview: &str) -> anyhow::Result<bool>;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmation for FixedAnswer {
    fn confirm(&mut self, _preview: &str) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

/// Where the cookie comes from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// The cookie file; refreshed cookies are written back to it.
    File(PathBuf),
    /// A blob given on the command line; never persisted.
    Inline(CredentialBlob),
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub preview: bool,
    pub preview_limit: usize,
    /// Destination; defaults to the dated file name in the working directory.
    pub output: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            preview: true,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            output: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Written {
        path: PathBuf,
        rows: usize,
        skipped: usize,
    },
    /// The user said no at the preview.
    Declined,
    /// Nothing survived the transformation; no file was written.
    NoData { fetched: usize, skipped: usize },
}

pub struct Pipeline<'a> {
    config: &'a AppConfig,
    credentials: CredentialSource,
    options: PipelineOptions,
    generated_at: DateTime<Local>,
    writer: SpreadsheetWriter,
    state: PipelineState,
    warnings: Vec<TransformWarning>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AppConfig, credentials: CredentialSource, options: PipelineOptions) -> Self {
        Self {
            config,
            credentials,
            options,
            generated_at: Local::now(),
            writer: SpreadsheetWriter::new(),
            state: PipelineState::Idle,
            warnings: Vec::new(),
        }
    }

    /// Stamp the document with `at` instead of the current time.
    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = at;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Entries dropped during the last run.
    pub fn warnings(&self) -> &[TransformWarning] {
        &self.warnings
    }

    /// The path the workbook will be written to.
    pub fn destination(&self) -> PathBuf {
        self.options
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_file_name(&self.generated_at)))
    }

    /// Run once. Errors leave the pipeline in `Aborted`.
    pub fn run(
        &mut self,
        source: &dyn PriceListSource,
        confirmation: &mut dyn Confirmation,
    ) -> anyhow::Result<PipelineOutcome> {
        self.state = PipelineState::Idle;
        self.warnings.clear();

        let result = self.run_steps(source, confirmation);
        self.state = match &result {
            Ok(PipelineOutcome::Written { .. }) => PipelineState::Written,
            _ => PipelineState::Aborted,
        };
        result
    }

    fn run_steps(
        &mut self,
        source: &dyn PriceListSource,
        confirmation: &mut dyn Confirmation,
    ) -> anyhow::Result<PipelineOutcome> {
        let mut credential = match &self.credentials {
            CredentialSource::File(path) => CredentialBlob::load(path)?,
            CredentialSource::Inline(blob) => blob.clone(),
        };
        self.advance(PipelineState::CredentialLoaded);

        let fetched = source.fetch_price_list(&credential)?;
        self.advance(PipelineState::Fetched);
        self.persist_refreshed(&mut credential, &fetched.refreshed_cookies)?;

        let normalized = normalize(&fetched.drugs);
        self.warnings = normalized.warnings;
        self.advance(PipelineState::Transformed);

        let rows = normalized.rows;
        if rows.is_empty() {
            return Ok(PipelineOutcome::NoData {
                fetched: fetched.drugs.len(),
                skipped: self.warnings.len(),
            });
        }

        if self.options.preview {
            let preview = render_preview(&rows, self.options.preview_limit);
            self.advance(PipelineState::PreviewedOrSkipped);
            if !confirmation.confirm(&preview)? {
                tracing::info!("write declined at preview");
                return Ok(PipelineOutcome::Declined);
            }
        } else {
            self.advance(PipelineState::PreviewedOrSkipped);
        }
        self.advance(PipelineState::Confirmed);

        let destination = self.destination();
        let document = PriceListDocument {
            rows,
            contact: self.config.contact.clone(),
            generated_at: self.generated_at,
        };
        let path = self.writer.write(&document, &destination)?;

        Ok(PipelineOutcome::Written {
            path,
            rows: document.rows.len(),
            skipped: self.warnings.len(),
        })
    }

    fn advance(&mut self, next: PipelineState) {
        tracing::debug!(from = ?self.state, to = ?next, "pipeline");
        self.state = next;
    }

    fn persist_refreshed(&self, credential: &mut CredentialBlob, refreshed: &CredentialBlob) -> Result<()> {
        if let CredentialSource::File(path) = &self.credentials {
            if credential.merge(refreshed) {
                credential.save(path)?;
                tracing::debug!(path = %path.display(), "saved refreshed cookies");
            }
        }
        Ok(())
    }
}
