//! Contents page generation
//!
//! Lays out a "Table of Contents" listing, one line per merged document,
//! and records where each line's baseline ended up so the link annotator
//! can put a clickable rectangle over it.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, StringFormat};
use log::warn;

use crate::error::Result;
use crate::layout::{ContentsLayout, ContentsOverflow};
use super::objects::to_win_ansi;

/// Resource name of the contents font inside the page's Font dictionary
pub const CONTENTS_FONT: &str = "F1";

/// Average Helvetica glyph width as a fraction of the font size
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

/// Space kept between a title and its page number
const PAGE_NUMBER_GAP: f32 = 12.0;

const ELLIPSIS: &str = "...";

/// One line of the contents listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentsEntry {
    pub title: String,
    /// 1-based page number of the document's first page in the merged output
    pub start_page: usize,
}

/// Where an entry's line was drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryPlacement {
    /// Index into the entry list passed to [`render_contents`]
    pub entry_index: usize,
    /// Which contents page (0-based) the line is on
    pub contents_page: usize,
    /// Baseline y coordinate in PDF user space
    pub baseline: f32,
}

/// Content streams of the contents page(s) plus the line placements
#[derive(Debug, Clone)]
pub struct RenderedContents {
    /// Encoded content stream for each contents page
    pub pages: Vec<Vec<u8>>,
    /// One placement per displayed entry, in entry order
    pub placements: Vec<EntryPlacement>,
}

/// Build contents entries from titles and zero-based start indices
///
/// The printed page number is the 1-based position of the document's first
/// page in the merged output.
pub fn contents_entries(titles: &[String], start_indices: &[usize]) -> Vec<ContentsEntry> {
    assert_eq!(
        titles.len(),
        start_indices.len(),
        "every document needs exactly one start index"
    );

    titles
        .iter()
        .zip(start_indices)
        .map(|(title, &start)| ContentsEntry {
            title: title.clone(),
            start_page: start + 1,
        })
        .collect()
}

/// Render the contents listing
///
/// An empty entry list still produces one page carrying just the heading.
/// With [`ContentsOverflow::Truncate`] entries that don't fit on the single
/// page are left out and have no placement.
pub fn render_contents(entries: &[ContentsEntry], layout: &ContentsLayout) -> Result<RenderedContents> {
    let per_page = layout.entries_per_page();
    let page_count = layout.contents_page_count(entries.len());

    let displayed = match layout.overflow {
        _ if per_page == 0 => 0,
        ContentsOverflow::Paginate => entries.len(),
        ContentsOverflow::Truncate => entries.len().min(per_page),
    };
    if displayed < entries.len() {
        warn!(
            "contents page holds {} entries, dropping {} of {}",
            per_page,
            entries.len() - displayed,
            entries.len()
        );
    }

    let mut pages = Vec::with_capacity(page_count);
    let mut placements = Vec::with_capacity(displayed);

    for page_index in 0..page_count {
        let mut operations = Vec::new();

        let heading = if page_index == 0 {
            layout.heading.clone()
        } else {
            format!("{} (continued)", layout.heading)
        };
        push_text(
            &mut operations,
            &heading,
            layout.heading_font_size,
            layout.left(),
            layout.heading_baseline(),
        );

        let first = page_index * per_page;
        let last = (first + per_page).min(displayed);

        for (slot, entry_index) in (first..last).enumerate() {
            let entry = &entries[entry_index];
            let baseline = layout.entry_baseline(slot);
            let size = layout.entry_font_size;

            let number = entry.start_page.to_string();
            let number_width = estimate_text_width(&number, size);
            let title_room = layout.right() - layout.left() - number_width - PAGE_NUMBER_GAP;
            let title = fit_text(&entry.title, size, title_room);

            push_text(&mut operations, &title, size, layout.left(), baseline);
            push_text(&mut operations, &number, size, layout.right() - number_width, baseline);

            placements.push(EntryPlacement {
                entry_index,
                contents_page: page_index,
                baseline,
            });
        }

        pages.push(Content { operations }.encode()?);
    }

    Ok(RenderedContents { pages, placements })
}

/// Add the Helvetica font used by the contents pages and return its id
///
/// Helvetica is one of the 14 standard PDF fonts, so nothing is embedded.
pub fn add_contents_font(doc: &mut Document) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}

fn push_text(operations: &mut Vec<Operation>, text: &str, size: f32, x: f32, y: f32) {
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new("Tf", vec![CONTENTS_FONT.into(), size.into()]));
    operations.push(Operation::new("Td", vec![x.into(), y.into()]));
    operations.push(Operation::new(
        "Tj",
        vec![Object::String(to_win_ansi(text), StringFormat::Literal)],
    ));
    operations.push(Operation::new("ET", vec![]));
}

/// Approximate rendered width of `text` in Helvetica
fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVERAGE_GLYPH_WIDTH
}

/// Shorten `text` with an ellipsis until it fits in `max_width`
fn fit_text(text: &str, font_size: f32, max_width: f32) -> String {
    if estimate_text_width(text, font_size) <= max_width {
        return text.to_string();
    }

    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + ELLIPSIS;
        if estimate_text_width(&candidate, font_size) <= max_width {
            return candidate;
        }
    }

    ELLIPSIS.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Length, Margins};

    fn entries(count: usize) -> Vec<ContentsEntry> {
        (0..count)
            .map(|i| ContentsEntry {
                title: format!("Document {}", i + 1),
                start_page: i + 2,
            })
            .collect()
    }

    fn shown_strings(content: &[u8]) -> Vec<String> {
        Content::decode(content)
            .unwrap()
            .operations
            .into_iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_contents_entries_start_pages() {
        let titles = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let entries = contents_entries(&titles, &[1, 4, 6]);
        let pages: Vec<usize> = entries.iter().map(|e| e.start_page).collect();
        assert_eq!(pages, vec![2, 5, 7]);
    }

    #[test]
    #[should_panic]
    fn test_contents_entries_count_mismatch_panics() {
        contents_entries(&["A".to_string()], &[1, 2]);
    }

    #[test]
    fn test_empty_listing_has_heading_only() {
        let layout = ContentsLayout::default();
        let rendered = render_contents(&[], &layout).unwrap();

        assert_eq!(rendered.pages.len(), 1);
        assert!(rendered.placements.is_empty());
        assert_eq!(shown_strings(&rendered.pages[0]), vec!["Table of Contents"]);
    }

    #[test]
    fn test_lines_step_down_from_top() {
        let layout = ContentsLayout::default();
        let rendered = render_contents(&entries(3), &layout).unwrap();

        assert_eq!(rendered.placements.len(), 3);
        for (i, placement) in rendered.placements.iter().enumerate() {
            assert_eq!(placement.entry_index, i);
            assert_eq!(placement.contents_page, 0);
            assert_eq!(placement.baseline, layout.entry_baseline(i));
        }

        let shown = shown_strings(&rendered.pages[0]);
        assert_eq!(
            shown,
            vec!["Table of Contents", "Document 1", "2", "Document 2", "3", "Document 3", "4"]
        );
    }

    #[test]
    fn test_paginates_overflowing_entries() {
        let layout = ContentsLayout::default();
        let per_page = layout.entries_per_page();
        let rendered = render_contents(&entries(per_page + 2), &layout).unwrap();

        assert_eq!(rendered.pages.len(), 2);
        assert_eq!(rendered.placements.len(), per_page + 2);

        let second_page: Vec<_> = rendered
            .placements
            .iter()
            .filter(|p| p.contents_page == 1)
            .collect();
        assert_eq!(second_page.len(), 2);
        assert_eq!(second_page[0].baseline, layout.entry_baseline(0));
        assert_eq!(shown_strings(&rendered.pages[1])[0], "Table of Contents (continued)");
    }

    #[test]
    fn test_truncate_drops_overflow() {
        let layout = ContentsLayout {
            overflow: ContentsOverflow::Truncate,
            ..Default::default()
        };
        let per_page = layout.entries_per_page();
        let rendered = render_contents(&entries(per_page + 5), &layout).unwrap();

        assert_eq!(rendered.pages.len(), 1);
        assert_eq!(rendered.placements.len(), per_page);
        let bottom = layout.margins.bottom.pt() as f32;
        assert!(rendered.placements.iter().all(|p| p.baseline >= bottom));
    }

    #[test]
    fn test_no_room_below_heading_drops_every_entry() {
        for overflow in [ContentsOverflow::Paginate, ContentsOverflow::Truncate] {
            let layout = ContentsLayout {
                margins: Margins::uniform(Length::from_mm(150.0)),
                overflow,
                ..Default::default()
            };
            assert_eq!(layout.entries_per_page(), 0);

            let rendered = render_contents(&entries(4), &layout).unwrap();
            assert_eq!(rendered.pages.len(), 1);
            assert!(rendered.placements.is_empty());
            assert_eq!(shown_strings(&rendered.pages[0]), vec!["Table of Contents"]);
        }
    }

    #[test]
    fn test_contents_font_is_helvetica() {
        let mut doc = Document::with_version("1.5");
        let font_id = add_contents_font(&mut doc);
        let font = doc.get_dictionary(font_id).unwrap();
        assert_eq!(font.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
        assert_eq!(font.get(b"Encoding").unwrap().as_name().unwrap(), b"WinAnsiEncoding");
    }

    #[test]
    fn test_long_titles_are_shortened() {
        let fitted = fit_text(&"W".repeat(200), 12.0, 120.0);
        assert!(fitted.ends_with(ELLIPSIS));
        assert!(estimate_text_width(&fitted, 12.0) <= 120.0);
        assert_eq!(fit_text("Short", 12.0, 120.0), "Short");
    }
}
