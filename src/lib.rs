//! docstitch Library
//!
//! A cross-platform library for stitching documents together.
//! This library provides functionality to:
//! - Merge PDFs behind a generated, clickable table of contents
//! - Add one bookmark per merged document
//! - Guess a document's title from its metadata or largest text
//! - Stitch images side by side or stacked into one JPEG
//!
//! # Example
//!
//! ```no_run
//! use docstitch::pdf::{merge_with_contents, MergeSettings, PdfInput};
//!
//! let inputs = vec![
//!     PdfInput::new("1. intro.pdf", std::fs::read("1. intro.pdf").unwrap()),
//!     PdfInput::new("2. advanced.pdf", std::fs::read("2. advanced.pdf").unwrap()),
//! ];
//!
//! let outcome = merge_with_contents(&inputs, &MergeSettings::default()).expect("Failed to merge PDFs");
//! std::fs::write("merged_with_toc.pdf", outcome.bytes).unwrap();
//! ```

pub mod error;
pub mod layout;
pub mod pdf;
pub mod raster;

// Re-export commonly used items
pub use error::{Error, Result};
