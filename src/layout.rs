//! Page geometry and contents page layout configuration

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Create a length from points (1/72 inch)
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * 25.4 / 72.0)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }

    /// MediaBox array values in points
    pub fn media_box(&self) -> [f32; 4] {
        [0.0, 0.0, self.width.pt() as f32, self.height.pt() as f32]
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Margins {
    /// Create margins with same value on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }

    /// Standard 1-inch margins on all sides
    pub fn standard() -> Self {
        Self::uniform(Length::from_inches(1.0))
    }

    /// Narrow margins (0.5 inches)
    pub fn narrow() -> Self {
        Self::uniform(Length::from_inches(0.5))
    }
}

/// What to do when the contents entries do not fit on one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentsOverflow {
    /// Continue the listing on additional contents pages
    #[default]
    Paginate,
    /// Keep a single contents page and drop entries that fall off the bottom
    Truncate,
}

/// Layout of the generated contents page(s)
///
/// All vertical positions are PDF user-space coordinates (origin at the
/// bottom-left corner, y growing upwards), in points.
#[derive(Debug, Clone)]
pub struct ContentsLayout {
    pub page: PageDimensions,
    pub margins: Margins,
    /// Heading printed at the top of every contents page
    pub heading: String,
    pub heading_font_size: f32,
    pub entry_font_size: f32,
    /// Distance from the heading baseline to the first entry baseline
    pub heading_gap: f32,
    /// Distance between consecutive entry baselines
    pub line_height: f32,
    pub overflow: ContentsOverflow,
}

impl Default for ContentsLayout {
    fn default() -> Self {
        Self {
            page: PageDimensions::a4(),
            margins: Margins {
                top: Length::from_pt(72.0),
                bottom: Length::from_pt(50.0),
                left: Length::from_pt(50.0),
                right: Length::from_pt(50.0),
            },
            heading: "Table of Contents".to_string(),
            heading_font_size: 20.0,
            entry_font_size: 12.0,
            heading_gap: 40.0,
            line_height: 20.0,
            overflow: ContentsOverflow::Paginate,
        }
    }
}

impl ContentsLayout {
    pub fn page_width(&self) -> f32 {
        self.page.width.pt() as f32
    }

    pub fn page_height(&self) -> f32 {
        self.page.height.pt() as f32
    }

    pub fn left(&self) -> f32 {
        self.margins.left.pt() as f32
    }

    /// X coordinate of the right margin
    pub fn right(&self) -> f32 {
        self.page_width() - self.margins.right.pt() as f32
    }

    pub fn heading_baseline(&self) -> f32 {
        self.page_height() - self.margins.top.pt() as f32
    }

    pub fn first_entry_baseline(&self) -> f32 {
        self.heading_baseline() - self.heading_gap
    }

    /// Baseline of the entry in the given slot (0 = first line below the heading)
    pub fn entry_baseline(&self, slot: usize) -> f32 {
        self.first_entry_baseline() - slot as f32 * self.line_height
    }

    /// Number of entry lines that fit above the bottom margin.
    ///
    /// Zero when even the first line would sit below the bottom margin.
    pub fn entries_per_page(&self) -> usize {
        let available = self.first_entry_baseline() - self.margins.bottom.pt() as f32;
        if available < 0.0 {
            return 0;
        }
        if self.line_height <= 0.0 {
            return 1;
        }
        (available / self.line_height).floor() as usize + 1
    }

    /// How many contents pages a listing of `entries` lines occupies
    pub fn contents_page_count(&self, entries: usize) -> usize {
        match (self.overflow, self.entries_per_page()) {
            (ContentsOverflow::Truncate, _) | (_, 0) => 1,
            (ContentsOverflow::Paginate, per_page) => entries.div_ceil(per_page).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        let len = Length::from_inches(1.0);
        assert!((len.mm() - 25.4).abs() < 0.01);
        assert!((len.pt() - 72.0).abs() < 0.01);
        assert!((Length::from_pt(72.0).mm() - 25.4).abs() < 0.01);
    }

    #[test]
    fn test_letter_size() {
        let letter = PageDimensions::letter();
        // 8.5 inches = 215.9 mm
        assert!((letter.width.mm() - 215.9).abs() < 0.1);
        // 11 inches = 279.4 mm
        assert!((letter.height.mm() - 279.4).abs() < 0.1);
        let media_box = letter.media_box();
        assert!((media_box[2] - 612.0).abs() < 0.1);
        assert!((media_box[3] - 792.0).abs() < 0.1);
    }

    #[test]
    fn test_standard_margins() {
        let margins = Margins::standard();
        assert_eq!(margins.top.mm(), 25.4); // 1 inch
        assert_eq!(margins.bottom.mm(), 25.4);
        assert_eq!(margins.left.mm(), 25.4);
        assert_eq!(margins.right.mm(), 25.4);
    }

    #[test]
    fn test_entries_step_down_by_line_height() {
        let layout = ContentsLayout::default();
        let first = layout.entry_baseline(0);
        let second = layout.entry_baseline(1);
        assert!((first - second - layout.line_height).abs() < 0.001);
        assert!(first < layout.heading_baseline());
    }

    #[test]
    fn test_entries_per_page_default_a4() {
        let layout = ContentsLayout::default();
        let per_page = layout.entries_per_page();
        // Last slot must stay above the bottom margin, the next one must not
        let bottom = layout.margins.bottom.pt() as f32;
        assert!(layout.entry_baseline(per_page - 1) >= bottom);
        assert!(layout.entry_baseline(per_page) < bottom);
    }

    #[test]
    fn test_contents_page_count() {
        let mut layout = ContentsLayout::default();
        let per_page = layout.entries_per_page();

        assert_eq!(layout.contents_page_count(0), 1);
        assert_eq!(layout.contents_page_count(per_page), 1);
        assert_eq!(layout.contents_page_count(per_page + 1), 2);

        layout.overflow = ContentsOverflow::Truncate;
        assert_eq!(layout.contents_page_count(per_page * 3), 1);
    }

    #[test]
    fn test_cramped_layout_still_fits_one_entry() {
        let layout = ContentsLayout {
            margins: Margins::uniform(Length::from_mm(140.0)),
            ..Default::default()
        };
        assert_eq!(layout.entries_per_page(), 1);
    }

    #[test]
    fn test_first_line_below_bottom_margin_fits_nothing() {
        let layout = ContentsLayout {
            margins: Margins::uniform(Length::from_mm(150.0)),
            ..Default::default()
        };
        assert!(layout.first_entry_baseline() < layout.margins.bottom.pt() as f32);
        assert_eq!(layout.entries_per_page(), 0);
        assert_eq!(layout.contents_page_count(10), 1);
    }
}
