//! PDF manipulation module

pub mod links;
pub mod merge;
pub mod metadata;
pub mod title;
pub mod toc;
mod objects;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used items
pub use links::{annotate_contents, link_regions, LinkRegion};
pub use merge::{
    merge_files_with_contents, merge_with_contents, start_indices, DocumentOrder, MergeOptions,
    MergeOutcome, MergeSettings, PdfInput, SourceDocument, DEFAULT_PDF_OUTPUT,
};
pub use metadata::{count_pages, document_metadata, extract_metadata, PdfMetadata};
pub use title::{extract_best_title, file_stem, title_from_document};
pub use toc::{contents_entries, render_contents, ContentsEntry, EntryPlacement, RenderedContents};
