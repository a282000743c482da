//! In-memory ZIP packaging for bulk exports.
//!
//! Artifacts are kept in insertion order and written into a fresh buffer per
//! archive, so two bulk runs in flight never share a workspace on disk.

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One named text file inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content: String,
}

/// What to do when two artifacts end up with the same filename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Keep both: `name.txt`, `name_1.txt`, `name_2.txt`, ...
    #[default]
    Disambiguate,
    /// The later artifact replaces the earlier one.
    Overwrite,
}

#[derive(Debug, Clone, Default)]
pub struct ExportArchive {
    artifacts: Vec<ExportArtifact>,
}

impl ExportArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact, resolving name clashes per `policy`. Returns the
    /// filename the artifact was stored under.
    ///
    /// ```
    /// use fancy_web::{CollisionPolicy, ExportArchive, ExportArtifact};
    ///
    /// let mut archive = ExportArchive::new();
    /// let artifact = |content: &str| ExportArtifact {
    ///     filename: "post.txt".into(),
    ///     content: content.into(),
    /// };
    /// archive.push(artifact("first"), CollisionPolicy::Disambiguate);
    /// let second = archive.push(artifact("second"), CollisionPolicy::Disambiguate);
    /// assert_eq!(second, "post_1.txt");
    ///
    /// archive.push(artifact("third"), CollisionPolicy::Overwrite);
    /// assert_eq!(archive.len(), 2);
    /// assert_eq!(archive.artifacts()[0].content, "third");
    /// ```
    pub fn push(&mut self, mut artifact: ExportArtifact, policy: CollisionPolicy) -> String {
        match policy {
            CollisionPolicy::Overwrite => {
                if let Some(existing) = self
                    .artifacts
                    .iter_mut()
                    .find(|a| a.filename == artifact.filename)
                {
                    existing.content = artifact.content;
                    return existing.filename.clone();
                }
            }
            CollisionPolicy::Disambiguate => {
                let taken: HashSet<&str> =
                    self.artifacts.iter().map(|a| a.filename.as_str()).collect();
                if taken.contains(artifact.filename.as_str()) {
                    let (stem, ext) = split_extension(&artifact.filename);
                    let unique = (1..)
                        .map(|n| format!("{stem}_{n}{ext}"))
                        .find(|candidate| !taken.contains(candidate.as_str()))
                        .unwrap_or_default();
                    artifact.filename = unique;
                }
            }
        }
        let name = artifact.filename.clone();
        self.artifacts.push(artifact);
        name
    }

    pub fn artifacts(&self) -> &[ExportArtifact] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Serialize every artifact as a deflated ZIP entry.
    pub fn to_zip(&self) -> Result<Vec<u8>, ArchiveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for artifact in &self.artifacts {
            writer.start_file(artifact.filename.as_str(), options)?;
            writer.write_all(artifact.content.as_bytes())?;
        }
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    /// Read back an archive produced by [`to_zip`](Self::to_zip).
    pub fn from_zip(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut artifacts = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            artifacts.push(ExportArtifact {
                filename: entry.name().to_string(),
                content,
            });
        }
        Ok(Self { artifacts })
    }
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    }
}
