//! PDF merging with a generated, clickable contents page
//!
//! The pipeline:
//! 1. parse every input and count its pages
//! 2. work out where each document will start in the merged output
//! 3. render the contents listing with those page numbers
//! 4. concatenate contents page(s) and source pages into one page tree
//! 5. overlay a link on each contents line and add one bookmark per document

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use chrono::Local;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use log::{debug, info};

use crate::error::{Error, Result};
use crate::layout::ContentsLayout;
use super::links::{annotate_contents, link_regions, target_page};
use super::objects::{inherited_attribute, text_string, INHERITABLE_PAGE_KEYS};
use super::title::title_from_document;
use super::toc::{add_contents_font, contents_entries, render_contents, ContentsEntry, RenderedContents, CONTENTS_FONT};

/// File name used for the merged document when none is given
pub const DEFAULT_PDF_OUTPUT: &str = "merged_with_toc.pdf";

/// Fewest documents a merge accepts
pub const MIN_DOCUMENTS: usize = 2;

/// Order in which documents are concatenated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentOrder {
    /// Sort by name first (stable, byte-wise)
    #[default]
    ByName,
    /// Keep the order the inputs were supplied in
    AsGiven,
}

/// Settings for a merge, independent of where inputs come from
#[derive(Debug, Clone)]
pub struct MergeSettings {
    pub order: DocumentOrder,
    pub layout: ContentsLayout,
    /// Title recorded in the output's Info dictionary
    pub document_title: String,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            order: DocumentOrder::ByName,
            layout: ContentsLayout::default(),
            document_title: "Merged Document".to_string(),
        }
    }
}

/// Options for merging PDF files on disk
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
    pub settings: MergeSettings,
}

/// A named PDF byte stream
#[derive(Debug, Clone)]
pub struct PdfInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file, naming the input after its file name
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, std::fs::read(path)?))
    }
}

/// A parsed input document
pub struct SourceDocument {
    pub name: String,
    pub page_count: usize,
    document: Document,
}

impl SourceDocument {
    /// Parse an input, rejecting anything that isn't a PDF
    ///
    /// A PDF without pages is accepted; it takes up no pages in the output.
    pub fn parse(input: &PdfInput) -> Result<Self> {
        let document = Document::load_mem(&input.bytes).map_err(|source| Error::MalformedDocument {
            name: input.name.clone(),
            source,
        })?;

        let page_count = document.get_pages().len();
        debug!("{}: {} pages", input.name, page_count);
        Ok(Self {
            name: input.name.clone(),
            page_count,
            document,
        })
    }
}

/// Result of a merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The merged PDF
    pub bytes: Vec<u8>,
    /// Total pages, contents pages included
    pub page_count: usize,
    /// Number of leading contents pages
    pub contents_pages: usize,
    /// One entry per document, in merge order
    pub entries: Vec<ContentsEntry>,
    /// Zero-based index of each document's first page
    pub start_indices: Vec<usize>,
    /// Number of link annotations placed on the contents pages
    pub links: usize,
}

/// Zero-based start index of each document after `contents_pages` leading pages
///
/// A document without pages gets the index the next document starts at.
pub fn start_indices(page_counts: &[usize], contents_pages: usize) -> Vec<usize> {
    let mut next = contents_pages;
    page_counts
        .iter()
        .map(|&count| {
            let start = next;
            next += count;
            start
        })
        .collect()
}

/// Merge PDF byte streams behind a generated contents page
///
/// Fails without producing anything if fewer than two inputs are given or
/// any input isn't a readable PDF.
pub fn merge_with_contents(inputs: &[PdfInput], settings: &MergeSettings) -> Result<MergeOutcome> {
    if inputs.len() < MIN_DOCUMENTS {
        return Err(Error::NotEnoughDocuments(inputs.len()));
    }

    let mut ordered: Vec<&PdfInput> = inputs.iter().collect();
    if settings.order == DocumentOrder::ByName {
        ordered.sort_by(|a, b| a.name.cmp(&b.name));
    }

    let sources = ordered
        .into_iter()
        .map(SourceDocument::parse)
        .collect::<Result<Vec<_>>>()?;

    let titles: Vec<String> = sources
        .iter()
        .map(|source| title_from_document(&source.document, &source.name))
        .collect();
    let page_counts: Vec<usize> = sources.iter().map(|source| source.page_count).collect();

    let layout = &settings.layout;
    let contents_pages = layout.contents_page_count(sources.len());
    let starts = start_indices(&page_counts, contents_pages);
    let entries = contents_entries(&titles, &starts);

    let rendered = render_contents(&entries, layout)?;
    let AssembledDocument {
        mut document,
        catalog_id,
        page_ids,
    } = assemble(sources, &rendered, layout)?;

    let regions = link_regions(&rendered.placements, &starts[..rendered.placements.len()]);
    let links = annotate_contents(&mut document, &page_ids, &regions, layout)?;

    add_outline(&mut document, catalog_id, &entries, &starts, &page_ids)?;
    add_info(&mut document, &settings.document_title);

    let pruned = document.prune_objects();
    debug!("pruned {} unreferenced objects", pruned.len());

    document.compress();
    let mut bytes = Vec::new();
    document.save_to(&mut bytes)?;

    info!(
        "merged {} documents into {} pages ({} contents)",
        entries.len(),
        page_ids.len(),
        contents_pages
    );

    Ok(MergeOutcome {
        bytes,
        page_count: page_ids.len(),
        contents_pages,
        entries,
        start_indices: starts,
        links,
    })
}

/// Merge PDF files and write the result to `options.output_path`
///
/// # Example
///
/// ```no_run
/// use docstitch::pdf::{MergeOptions, MergeSettings, merge_files_with_contents};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("1. first.pdf"),
///         PathBuf::from("2. second.pdf"),
///     ],
///     output_path: PathBuf::from("merged_with_toc.pdf"),
///     settings: MergeSettings::default(),
/// };
///
/// merge_files_with_contents(&options).expect("Failed to merge");
/// ```
pub fn merge_files_with_contents(options: &MergeOptions) -> Result<MergeOutcome> {
    if options.input_paths.len() < MIN_DOCUMENTS {
        return Err(Error::NotEnoughDocuments(options.input_paths.len()));
    }

    let inputs = options
        .input_paths
        .iter()
        .map(|path| PdfInput::from_path(path))
        .collect::<Result<Vec<_>>>()?;

    let outcome = merge_with_contents(&inputs, &options.settings)?;
    std::fs::write(&options.output_path, &outcome.bytes)?;

    Ok(outcome)
}

struct AssembledDocument {
    document: Document,
    catalog_id: ObjectId,
    /// Every page of the output in order, contents pages first
    page_ids: Vec<ObjectId>,
}

/// Concatenate the contents pages and every source page into one document
fn assemble(
    sources: Vec<SourceDocument>,
    contents: &RenderedContents,
    layout: &ContentsLayout,
) -> Result<AssembledDocument> {
    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut source_page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for source in sources {
        let mut doc = source.document;

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for &page_id in &pages {
            copy_inherited_attributes(&mut doc, page_id)?;
        }

        source_page_ids.extend(pages);
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);

    // new_object_id() must hand out ids above everything just added
    merged.max_id = max_id - 1;

    let pages_id = merged.new_object_id();
    let font_id = add_contents_font(&mut merged);
    let media_box: Vec<Object> = layout.page.media_box().iter().map(|&v| v.into()).collect();

    let mut page_ids = Vec::with_capacity(contents.pages.len() + source_page_ids.len());
    for content in &contents.pages {
        let content_id = merged.add_object(Stream::new(Dictionary::new(), content.clone()));
        let page_id = merged.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { CONTENTS_FONT => font_id },
            },
        });
        page_ids.push(page_id);
    }
    page_ids.extend(&source_page_ids);

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));
    merged.objects.insert(pages_id, Object::Dictionary(pages_object));

    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", Object::Reference(catalog_id));

    // Re-parent source pages onto the new page tree
    for &page_id in &source_page_ids {
        if let Ok(Object::Dictionary(dict)) = merged.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    Ok(AssembledDocument {
        document: merged,
        catalog_id,
        page_ids,
    })
}

/// Copy attributes a page inherits from its old page tree onto the page
/// itself, since re-parenting cuts it off from its ancestors
fn copy_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited = Vec::new();
    {
        let page = doc.get_dictionary(page_id)?;
        for key in INHERITABLE_PAGE_KEYS {
            if page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                inherited.push((key.to_vec(), value.clone()));
            }
        }
    }

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page.set(key, value);
    }

    Ok(())
}

/// Add one top-level bookmark per document and open the outline panel
fn add_outline(
    doc: &mut Document,
    catalog_id: ObjectId,
    entries: &[ContentsEntry],
    starts: &[usize],
    page_ids: &[ObjectId],
) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let outline_root_id = doc.new_object_id();
    let item_ids: Vec<ObjectId> = entries.iter().map(|_| doc.new_object_id()).collect();

    for (i, entry) in entries.iter().enumerate() {
        let mut item = dictionary! {
            "Title" => text_string(&entry.title),
            "Parent" => outline_root_id,
            "Dest" => vec![Object::Reference(target_page(page_ids, starts[i])), "Fit".into()],
        };
        if i > 0 {
            item.set("Prev", item_ids[i - 1]);
        }
        if i + 1 < item_ids.len() {
            item.set("Next", item_ids[i + 1]);
        }
        doc.objects.insert(item_ids[i], Object::Dictionary(item));
    }

    doc.objects.insert(
        outline_root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => item_ids[0],
            "Last" => item_ids[item_ids.len() - 1],
            "Count" => item_ids.len() as i64,
        }),
    );

    let catalog = doc.get_dictionary_mut(catalog_id)?;
    catalog.set("Outlines", outline_root_id);
    catalog.set("PageMode", "UseOutlines");

    Ok(())
}

fn add_info(doc: &mut Document, title: &str) {
    let created = Local::now().format("D:%Y%m%d%H%M%S").to_string();
    let info_id = doc.add_object(dictionary! {
        "Title" => text_string(title),
        "Producer" => Object::string_literal(concat!("docstitch ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(created),
    });
    doc.trailer.set("Info", info_id);
}
