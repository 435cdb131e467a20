//! Best-guess document titles
//!
//! Tried in order:
//! 1. the Info dictionary title, if it has at least three characters
//! 2. the largest-font text span on the first three pages (spans longer
//!    than 80 characters are ignored)
//! 3. the file name without its extension
//!
//! This is a heuristic. Any parse failure falls through to the file name.

use std::collections::BTreeMap;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use log::debug;

use super::metadata::{decode_pdf_string, info_string};
use super::objects::{inherited_attribute, number, resolve_dictionary};

/// Shortest metadata title that is trusted
pub const MIN_METADATA_TITLE_CHARS: usize = 3;
/// Pages scanned for a large heading
pub const TITLE_SCAN_PAGES: usize = 3;
/// Longest span still considered a title
pub const MAX_TITLE_SPAN_CHARS: usize = 80;

/// TJ adjustments at least this negative (thousandths of an em) read as a word gap
const WORD_GAP_ADJUSTMENT: f32 = -200.0;

/// A run of text shown with one font at one size on one line
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Effective font size in points
    pub size: f32,
    /// 1-based page number
    pub page: u32,
}

/// Extract the best title from raw PDF bytes
pub fn extract_best_title(bytes: &[u8], file_name: &str) -> String {
    match Document::load_mem(bytes) {
        Ok(doc) => title_from_document(&doc, file_name),
        Err(e) => {
            debug!("{}: not parseable ({}), using file name as title", file_name, e);
            file_stem(file_name)
        }
    }
}

/// Extract the best title from an already parsed document
pub fn title_from_document(doc: &Document, file_name: &str) -> String {
    if let Some(title) = metadata_title(doc) {
        debug!("{}: title from metadata", file_name);
        return title;
    }

    if let Some(title) = largest_span_text(doc) {
        debug!("{}: title from largest text span", file_name);
        return title;
    }

    file_stem(file_name)
}

/// File name with its last extension removed
pub fn file_stem(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => file_name.to_string(),
    }
}

fn metadata_title(doc: &Document) -> Option<String> {
    let title = info_string(doc, b"Title")?;
    let title = title.trim();
    if title.chars().count() >= MIN_METADATA_TITLE_CHARS {
        Some(title.to_string())
    } else {
        None
    }
}

fn largest_span_text(doc: &Document) -> Option<String> {
    let mut best: Option<TextSpan> = None;

    for span in collect_spans(doc, TITLE_SCAN_PAGES) {
        if span.text.chars().count() > MAX_TITLE_SPAN_CHARS {
            continue;
        }
        let current_max = best.as_ref().map_or(0.0, |b| b.size);
        if span.size > current_max {
            best = Some(span);
        }
    }

    best.map(|span| span.text)
}

/// Collect the non-empty text spans of the first `max_pages` pages
///
/// Pages whose content can't be read or decoded are skipped.
pub fn collect_spans(doc: &Document, max_pages: usize) -> Vec<TextSpan> {
    let mut spans = Vec::new();

    for (page_number, page_id) in doc.get_pages().into_iter().take(max_pages) {
        let content = match doc.get_page_content(page_id) {
            Ok(content) => content,
            Err(e) => {
                debug!("page {}: unreadable content ({})", page_number, e);
                continue;
            }
        };
        let operations = match Content::decode(&content) {
            Ok(content) => content.operations,
            Err(e) => {
                debug!("page {}: undecodable content ({})", page_number, e);
                continue;
            }
        };

        let fonts = page_fonts(doc, page_id);
        let mut scanner = SpanScanner::new(page_number, &fonts);

        for op in &operations {
            scanner.apply(&op.operator, &op.operands);
        }
        spans.extend(scanner.finish());
    }

    spans
}

/// How a page font's string bytes turn into text
enum FontText<'a> {
    /// Encoding lopdf resolved: a named single-byte encoding or a ToUnicode map
    Mapped { encoding: Encoding<'a>, composite: bool },
    /// Composite font with no usable ToUnicode map; its codes are glyph ids
    Opaque,
    /// Simple font relying on its built-in encoding
    Builtin,
}

impl FontText<'_> {
    fn decode(&self, bytes: &[u8]) -> String {
        match self {
            FontText::Mapped { encoding, composite } => match Document::decode_text(encoding, bytes) {
                Ok(text) => text,
                Err(_) if *composite => String::new(),
                Err(_) => decode_pdf_string(bytes),
            },
            FontText::Opaque => String::new(),
            FontText::Builtin => decode_pdf_string(bytes),
        }
    }
}

/// Text decoders for the fonts available to a page, keyed by resource name
fn page_fonts<'a>(doc: &'a Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, FontText<'a>> {
    let mut fonts = BTreeMap::new();

    let font_dict = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|res| resolve_dictionary(doc, res))
        .and_then(|res| res.get(b"Font").ok())
        .and_then(|font| resolve_dictionary(doc, font));

    if let Some(font_dict) = font_dict {
        for (name, value) in font_dict.iter() {
            if let Some(font) = resolve_dictionary(doc, value) {
                fonts.insert(name.clone(), font_text(doc, font));
            }
        }
    }

    fonts
}

fn font_text<'a>(doc: &'a Document, font: &'a Dictionary) -> FontText<'a> {
    let composite = font
        .get(b"Subtype")
        .and_then(Object::as_name)
        .is_ok_and(|subtype| subtype == b"Type0");

    if !font.has(b"Encoding") && !font.has(b"ToUnicode") {
        return if composite { FontText::Opaque } else { FontText::Builtin };
    }

    match font.get_font_encoding(doc) {
        Ok(encoding) => FontText::Mapped { encoding, composite },
        Err(e) => {
            debug!("font encoding unavailable ({})", e);
            if composite {
                FontText::Opaque
            } else {
                FontText::Builtin
            }
        }
    }
}

/// Product of two matrices' linear parts `[a b c d]`, `m` applied first
fn concat(m: [f32; 4], n: [f32; 4]) -> [f32; 4] {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
    ]
}

const IDENTITY: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

fn linear_part(operands: &[Object]) -> [f32; 4] {
    let value = |i: usize, default: f32| operands.get(i).and_then(number).unwrap_or(default);
    [value(0, 1.0), value(1, 0.0), value(2, 0.0), value(3, 1.0)]
}

struct PendingSpan {
    text: String,
    size: f32,
    font: Vec<u8>,
}

/// Walks one page's operators and groups shown text into spans
struct SpanScanner<'a> {
    page: u32,
    fonts: &'a BTreeMap<Vec<u8>, FontText<'a>>,
    font: Vec<u8>,
    font_size: f32,
    /// Linear part of the current transformation matrix
    ctm: [f32; 4],
    /// Matrices saved by `q`
    saved_ctm: Vec<[f32; 4]>,
    /// Linear part of the text matrix
    text_matrix: [f32; 4],
    pending: Option<PendingSpan>,
    spans: Vec<TextSpan>,
}

impl<'a> SpanScanner<'a> {
    fn new(page: u32, fonts: &'a BTreeMap<Vec<u8>, FontText<'a>>) -> Self {
        Self {
            page,
            fonts,
            font: Vec::new(),
            font_size: 0.0,
            ctm: IDENTITY,
            saved_ctm: Vec::new(),
            text_matrix: IDENTITY,
            pending: None,
            spans: Vec::new(),
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.saved_ctm.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved_ctm.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => self.ctm = concat(linear_part(operands), self.ctm),
            "BT" => {
                self.flush();
                self.text_matrix = IDENTITY;
            }
            "ET" | "T*" => self.flush(),
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.font = name.clone();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.font_size = size;
                }
            }
            "Tm" => {
                self.flush();
                self.text_matrix = linear_part(operands);
            }
            "Td" | "TD" => {
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if ty != 0.0 {
                    self.flush();
                }
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.push_text(&text);
                }
            }
            "'" => {
                self.flush();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.push_text(&text);
                }
            }
            "\"" => {
                self.flush();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = self.decode(bytes);
                    self.push_text(&text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => text.push_str(&self.decode(bytes)),
                            other => {
                                if number(other).is_some_and(|n| n <= WORD_GAP_ADJUSTMENT) {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                    self.push_text(&text);
                }
            }
            _ => {}
        }
    }

    /// Font size scaled by the text matrix and the CTM (length of the
    /// transformed text-space y axis)
    fn effective_size(&self) -> f32 {
        let [_, _, c, d] = concat(self.text_matrix, self.ctm);
        self.font_size.abs() * (c * c + d * d).sqrt()
    }

    fn push_text(&mut self, text: &str) {
        let size = self.effective_size();
        let same_run = self
            .pending
            .as_ref()
            .is_some_and(|p| p.size == size && p.font == self.font);
        if !same_run {
            self.flush();
        }

        match self.pending.as_mut() {
            Some(pending) => pending.text.push_str(text),
            None => {
                self.pending = Some(PendingSpan {
                    text: text.to_string(),
                    size,
                    font: self.font.clone(),
                });
            }
        }
    }

    fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            let text = pending.text.trim();
            if !text.is_empty() {
                self.spans.push(TextSpan {
                    text: text.to_string(),
                    size: pending.size,
                    page: self.page,
                });
            }
        }
    }

    /// Decode with the current font, dropping control and replacement
    /// characters left by unmapped codes
    fn decode(&self, bytes: &[u8]) -> String {
        let text = match self.fonts.get(&self.font) {
            Some(font) => font.decode(bytes),
            None => decode_pdf_string(bytes),
        };

        text.chars()
            .filter_map(|c| match c {
                '\u{FFFD}' => None,
                c if c.is_whitespace() => Some(' '),
                c if c.is_control() => None,
                c => Some(c),
            })
            .collect()
    }

    fn finish(mut self) -> Vec<TextSpan> {
        self.flush();
        self.spans
    }
}
