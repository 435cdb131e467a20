//! Clickable regions on the contents page(s)
//!
//! Every contents line gets a borderless Link annotation spanning the text
//! column, with a GoTo action to the first page of its document.

use std::collections::BTreeMap;
use lopdf::{dictionary, Document, Object, ObjectId};

use crate::error::Result;
use crate::layout::ContentsLayout;
use super::toc::EntryPlacement;

/// How far the clickable band reaches below the baseline
pub const LINK_BAND_BELOW: f32 = 2.0;
/// How far the clickable band reaches above the baseline
pub const LINK_BAND_ABOVE: f32 = 12.0;

/// A clickable line on a contents page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkRegion {
    pub entry_index: usize,
    /// Contents page (0-based) carrying the line
    pub contents_page: usize,
    /// Baseline of the line, in PDF user space
    pub vertical_position: f32,
    /// Zero-based index of the target page in the merged output
    pub target_page_index: usize,
}

impl LinkRegion {
    /// Annotation rectangle `[x1, y1, x2, y2]`
    pub fn rect(&self, layout: &ContentsLayout) -> [f32; 4] {
        [
            layout.left(),
            self.vertical_position - LINK_BAND_BELOW,
            layout.right(),
            self.vertical_position + LINK_BAND_ABOVE,
        ]
    }
}

/// Page a link or bookmark for `start_index` should open
///
/// A document without pages at the end of the output starts past the last
/// page; it points at the last page instead.
pub(crate) fn target_page(page_ids: &[ObjectId], start_index: usize) -> ObjectId {
    page_ids[start_index.min(page_ids.len().saturating_sub(1))]
}

/// Pair each placed contents line with its document's start index
///
/// # Panics
///
/// If the number of placements and start indices differ. Both come from the
/// same entry list, so a mismatch is a bug in the caller.
pub fn link_regions(placements: &[EntryPlacement], start_indices: &[usize]) -> Vec<LinkRegion> {
    assert_eq!(
        placements.len(),
        start_indices.len(),
        "one start index is required per placed contents line"
    );

    placements
        .iter()
        .map(|placement| LinkRegion {
            entry_index: placement.entry_index,
            contents_page: placement.contents_page,
            vertical_position: placement.baseline,
            target_page_index: start_indices[placement.entry_index],
        })
        .collect()
}

/// Attach one Link annotation per region to the contents pages
///
/// `page_ids` is the full merged page sequence, contents pages first.
/// Returns the number of annotations added.
pub fn annotate_contents(
    doc: &mut Document,
    page_ids: &[ObjectId],
    regions: &[LinkRegion],
    layout: &ContentsLayout,
) -> Result<usize> {
    let mut annots_by_page: BTreeMap<usize, Vec<Object>> = BTreeMap::new();

    for region in regions {
        let target_id = target_page(page_ids, region.target_page_index);
        let rect: Vec<Object> = region.rect(layout).iter().map(|&v| v.into()).collect();

        let action = dictionary! {
            "Type" => "Action",
            "S" => "GoTo",
            "D" => vec![Object::Reference(target_id), "Fit".into()],
        };
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => rect,
            "Border" => vec![0.into(), 0.into(), 0.into()],
            "A" => action,
        });

        annots_by_page
            .entry(region.contents_page)
            .or_default()
            .push(Object::Reference(annot_id));
    }

    for (contents_page, annots) in annots_by_page {
        let page = doc.get_dictionary_mut(page_ids[contents_page])?;
        let mut all = match page.get(b"Annots") {
            Ok(Object::Array(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        all.extend(annots);
        page.set("Annots", all);
    }

    Ok(regions.len())
}
