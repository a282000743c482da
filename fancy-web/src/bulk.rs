//! Bulk export: many URLs in, one ZIP of labelled text files out.
//!
//! Per-item extraction failures never abort a run; they are written into the
//! item's artifact instead. Only packaging the archive can fail the whole run.

use std::time::Instant;

use crate::archive::{ArchiveError, CollisionPolicy, ExportArchive, ExportArtifact};
use crate::extract::PageTextExtractor;

const ARTIFACT_EXTENSION: &str = ".txt";

/// One input row: the page to extract and the label to name its file by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    pub url: String,
    pub label: String,
}

impl BulkItem {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BulkSettings {
    /// Used when a label sanitizes to nothing.
    pub fallback_label: String,
    pub collision: CollisionPolicy,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            fallback_label: "extracted_text".into(),
            collision: CollisionPolicy::default(),
        }
    }
}

/// Keep alphanumerics, spaces, `_` and `-`; drop trailing whitespace.
///
/// "Alphanumeric" is Unicode `Alphabetic` or `Numeric`, so combining vowel
/// signs (Thai, Devanagari, ...) stay attached to their syllables.
///
/// ```
/// use fancy_web::sanitize_label;
///
/// assert_eq!(sanitize_label("서울 맛집: Top 10!  "), "서울 맛집 Top 10");
/// assert_eq!(sanitize_label("a/b\\c"), "abc");
/// let once = sanitize_label("  odd*name ");
/// assert_eq!(sanitize_label(&once), once);
/// ```
pub fn sanitize_label(label: &str) -> String {
    let kept: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    kept.trim_end().to_string()
}

/// Runs the extractor over a list of items and collects the artifacts.
pub struct BulkExporter {
    extractor: PageTextExtractor,
    settings: BulkSettings,
}

impl BulkExporter {
    pub fn new(extractor: PageTextExtractor, settings: BulkSettings) -> Self {
        Self {
            extractor,
            settings,
        }
    }

    /// File name for `label`: sanitized, or the fallback label, plus `.txt`.
    pub fn artifact_filename(&self, label: &str) -> String {
        let safe = sanitize_label(label);
        let stem = if safe.is_empty() {
            self.settings.fallback_label.as_str()
        } else {
            safe.as_str()
        };
        format!("{stem}{ARTIFACT_EXTENSION}")
    }

    /// Process items in order. Items with an empty URL are skipped; every
    /// other item contributes exactly one artifact (subject to the collision
    /// policy).
    pub async fn run(&self, items: &[BulkItem]) -> ExportArchive {
        let started = Instant::now();
        let mut archive = ExportArchive::new();
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for (idx, item) in items.iter().enumerate() {
            if item.url.is_empty() {
                skipped += 1;
                tracing::debug!(target: "web.bulk", idx, "bulk.item.skipped");
                continue;
            }

            let content = match self.extractor.extract(&item.url).await {
                Ok(text) => text.joined(),
                Err(err) => {
                    failed += 1;
                    tracing::warn!(
                        target: "web.bulk",
                        idx,
                        url = %item.url,
                        kind = err.kind(),
                        error = %err,
                        "bulk.item.failed"
                    );
                    format!("Error extracting {}:\n{}: {}", item.url, err.kind(), err)
                }
            };

            let filename = self.artifact_filename(&item.label);
            let artifact = ExportArtifact { filename, content };
            let stored = archive.push(artifact, self.settings.collision);
            tracing::debug!(target: "web.bulk", idx, filename = %stored, "bulk.item.stored");
        }

        tracing::info!(
            target: "web.bulk",
            items = items.len(),
            artifacts = archive.len(),
            skipped,
            failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "bulk.done"
        );
        archive
    }

    /// [`run`](Self::run) followed by ZIP packaging.
    pub async fn export_zip(&self, items: &[BulkItem]) -> Result<Vec<u8>, ArchiveError> {
        let archive = self.run(items).await;
        archive.to_zip().inspect_err(|e| {
            tracing::error!(target: "web.bulk", error = %e, "bulk.archive.failed");
        })
    }
}
