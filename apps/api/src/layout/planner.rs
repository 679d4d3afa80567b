//! Page planner: decides where the title, image and text lines of one page go.
//!
//! `plan_page` is pure. It knows nothing about PDF operators; the renderer
//! turns a `PagePlan` into drawing operations afterwards. Per page, in order:
//!
//! 1. Cursor starts at the top-left margin.
//! 2. Page 0 only: a centered bold title line, then a fixed gap.
//! 3. Image, if any: full content width, height from the aspect ratio, then a gap.
//! 4. Text, if any: wrapped block at the cursor, `size * 0.5 + 2` line advance.

use serde::Serialize;
use tracing::warn;

use crate::layout::font_metrics::{get_metrics, FontFamily, FontStyle};
use crate::layout::page::{
    DocumentConfig, BLOCK_GAP_MM, CELL_PADDING_MM, MARGIN_MM, PT_TO_MM, TITLE_LINE_HEIGHT_MM,
};
use crate::layout::wrap::wrap_text;

// ────────────────────────────────────────────────────────────────────────────
// Plan types
// ────────────────────────────────────────────────────────────────────────────

/// Intrinsic pixel size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleBlock {
    pub text: String,
    pub family: FontFamily,
    pub size_pt: u8,
    pub x_mm: f32,
    /// Baseline, measured from the top edge of the sheet.
    pub baseline_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageBlock {
    pub x_mm: f32,
    /// Top edge of the image, measured from the top edge of the sheet.
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub x_mm: f32,
    pub baseline_mm: f32,
}

/// Placement of everything drawn on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePlan {
    pub index: usize,
    pub title: Option<TitleBlock>,
    pub image: Option<ImageBlock>,
    pub lines: Vec<TextLine>,
    pub family: FontFamily,
    pub size_pt: u8,
    /// Cursor after the title block (equals the top margin on later pages).
    pub body_start_mm: f32,
    /// Cursor after the last block placed on the page.
    pub cursor_mm: f32,
    /// Wrapped lines that did not fit above the bottom margin.
    pub dropped_lines: usize,
}

impl PagePlan {
    pub fn is_blank(&self) -> bool {
        self.title.is_none() && self.image.is_none() && self.lines.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Geometry helpers
// ────────────────────────────────────────────────────────────────────────────

/// Height of an image drawn at `rendered_width_mm`, preserving aspect ratio.
pub fn scaled_image_height(size: ImageSize, rendered_width_mm: f32) -> f32 {
    if size.width_px == 0 {
        return 0.0;
    }
    size.height_px as f32 * rendered_width_mm / size.width_px as f32
}

/// Baseline that vertically centers a glyph row of `size_pt` in a line box.
fn centered_baseline(line_top_mm: f32, line_height_mm: f32, size_pt: f32) -> f32 {
    line_top_mm + line_height_mm / 2.0 + 0.3 * size_pt * PT_TO_MM
}

// ────────────────────────────────────────────────────────────────────────────
// Planner
// ────────────────────────────────────────────────────────────────────────────

/// Lays out page `index`. `image` is the intrinsic size of the page's decoded
/// image; `text` is the page's body text (empty counts as none).
pub fn plan_page(
    index: usize,
    config: &DocumentConfig,
    image: Option<ImageSize>,
    text: Option<&str>,
) -> PagePlan {
    let left = MARGIN_MM;
    let content_width = config.content_width_mm();
    let mut cursor = MARGIN_MM;

    let title = (index == 0).then(|| {
        let size_pt = config.title_size_pt();
        let metrics = get_metrics(config.font_family, FontStyle::Bold);
        let title_width = metrics.width_mm(&config.title, f32::from(size_pt));
        let block = TitleBlock {
            text: config.title.clone(),
            family: config.font_family,
            size_pt,
            x_mm: left + (content_width - title_width) / 2.0,
            baseline_mm: centered_baseline(cursor, TITLE_LINE_HEIGHT_MM, f32::from(size_pt)),
        };
        cursor += TITLE_LINE_HEIGHT_MM + BLOCK_GAP_MM;
        block
    });
    let body_start_mm = cursor;

    let image = image.map(|size| {
        let block = ImageBlock {
            x_mm: left,
            y_mm: cursor,
            width_mm: content_width,
            height_mm: scaled_image_height(size, content_width),
        };
        cursor += block.height_mm + BLOCK_GAP_MM;
        block
    });

    let mut lines = Vec::new();
    let mut dropped_lines = 0usize;

    if let Some(text) = text.filter(|t| !t.is_empty()) {
        let size_pt = f32::from(config.font_size_pt);
        let line_height = config.line_height_mm();
        let metrics = get_metrics(config.font_family, FontStyle::Regular);
        let wrapped = wrap_text(
            text,
            metrics,
            size_pt,
            content_width - 2.0 * CELL_PADDING_MM,
        );

        for line in wrapped {
            if cursor + line_height > config.body_limit_mm() {
                dropped_lines += 1;
                continue;
            }
            lines.push(TextLine {
                text: line,
                x_mm: left + CELL_PADDING_MM,
                baseline_mm: centered_baseline(cursor, line_height, size_pt),
            });
            cursor += line_height;
        }

        if dropped_lines > 0 {
            warn!(
                page = index,
                dropped = dropped_lines,
                "Text overflows the page; trailing lines were not placed"
            );
        }
    }

    PagePlan {
        index,
        title,
        image,
        lines,
        family: config.font_family,
        size_pt: config.font_size_pt,
        body_start_mm,
        cursor_mm: cursor,
        dropped_lines,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
