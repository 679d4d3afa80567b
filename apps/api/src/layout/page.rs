//! Sheet sizes, margins, and the per-document configuration the planner reads.
//!
//! All lengths are millimetres measured from the top-left corner of the sheet;
//! conversion to PDF's bottom-left point space happens only at render time.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontFamily;

pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Left, top and right margin.
pub const MARGIN_MM: f32 = 10.0;
/// Body lines that would cross this margin are dropped.
pub const BOTTOM_MARGIN_MM: f32 = 20.0;
/// Height of the title header line on the first page.
pub const TITLE_LINE_HEIGHT_MM: f32 = 10.0;
/// Vertical gap after the title line and after an image.
pub const BLOCK_GAP_MM: f32 = 10.0;
/// The title is set this many points larger than the body text.
pub const TITLE_SIZE_BOOST_PT: u8 = 4;
/// Horizontal inset of wrapped text inside its block.
pub const CELL_PADDING_MM: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetSize {
    #[default]
    A4,
    Letter,
}

impl SheetSize {
    /// (width, height) in millimetres, portrait.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            SheetSize::A4 => (210.0, 297.0),
            SheetSize::Letter => (215.9, 279.4),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SheetSize::A4 => "A4",
            SheetSize::Letter => "Letter",
        }
    }

    /// Usable width between the left and right margins.
    pub fn content_width_mm(&self) -> f32 {
        self.dimensions_mm().0 - 2.0 * MARGIN_MM
    }
}

/// Everything that shapes a document besides its pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub title: String,
    pub font_family: FontFamily,
    pub font_size_pt: u8,
    pub sheet: SheetSize,
}

impl DocumentConfig {
    pub fn page_height_mm(&self) -> f32 {
        self.sheet.dimensions_mm().1
    }

    pub fn content_width_mm(&self) -> f32 {
        self.sheet.content_width_mm()
    }

    /// Line advance of wrapped body text: `size * 0.5 + 2`.
    pub fn line_height_mm(&self) -> f32 {
        f32::from(self.font_size_pt) * 0.5 + 2.0
    }

    pub fn title_size_pt(&self) -> u8 {
        self.font_size_pt.saturating_add(TITLE_SIZE_BOOST_PT)
    }

    /// Lowest y a body line may reach.
    pub fn body_limit_mm(&self) -> f32 {
        self.page_height_mm() - BOTTOM_MARGIN_MM
    }
}
