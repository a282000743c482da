//! Blog text extraction and export.
//!
//! - [`fetch`]: the `PageFetcher` seam between extraction and the network
//! - [`extract`]: `PageTextExtractor`, iframe-aware content-container text extraction
//! - [`bulk`]: `BulkExporter`, one labelled text artifact per input row
//! - [`archive`]: in-memory ZIP packaging of artifacts
//! - [`dataset`]: CSV upload parsing into bulk items
//! - [`search`]: keyword search result collection and CSV export
//!
//! Everything here works on explicit inputs; there is no shared state between
//! calls, so concurrent requests never observe each other.

pub mod archive;
pub mod bulk;
pub mod dataset;
pub mod extract;
pub mod fetch;
pub mod search;

pub use archive::{ArchiveError, CollisionPolicy, ExportArchive, ExportArtifact};
pub use bulk::{BulkExporter, BulkItem, BulkSettings, sanitize_label};
pub use dataset::{DatasetError, read_bulk_items};
pub use extract::{ExtractError, ExtractedText, ExtractorSettings, PageTextExtractor, TextPayload};
pub use fetch::PageFetcher;
pub use search::{
    SearchError, SearchExport, SearchExporter, SearchOrder, SearchPageSource, SearchQuery,
};
