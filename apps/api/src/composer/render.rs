//! Document rendering: decode each page's image, plan the page, emit printpdf
//! operations, and serialize the whole document to bytes.

use bytes::Bytes;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::layout::planner::{ImageBlock, TextLine, TitleBlock};
use crate::layout::{plan_page, DocumentConfig, FontFamily, FontStyle, ImageSize, PagePlan};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Image on page {page} could not be decoded: {source}")]
    Decode {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("Image on page {page} has no pixels")]
    InvalidImage { page: usize },
}

/// One user-specified page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageInput {
    pub text: Option<String>,
    /// Raw encoded image bytes (PNG or JPEG).
    pub image: Option<Bytes>,
}

/// A decoded page image, flattened to 8-bit RGB. Lives only for the page being rendered.
struct DecodedImage {
    raw: RawImage,
    size: ImageSize,
}

impl DecodedImage {
    fn decode(page: usize, bytes: &[u8]) -> Result<Self, ComposeError> {
        let rgb = image::load_from_memory(bytes)
            .map_err(|source| ComposeError::Decode { page, source })?
            .to_rgb8();
        let (width_px, height_px) = rgb.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(ComposeError::InvalidImage { page });
        }

        Ok(Self {
            raw: RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: width_px as usize,
                height: height_px as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            },
            size: ImageSize {
                width_px,
                height_px,
            },
        })
    }
}

/// Maps a family and style onto one of the PDF base-14 fonts.
pub fn builtin_font(family: FontFamily, style: FontStyle) -> BuiltinFont {
    match (family, style) {
        (FontFamily::Helvetica, FontStyle::Regular) => BuiltinFont::Helvetica,
        (FontFamily::Helvetica, FontStyle::Bold) => BuiltinFont::HelveticaBold,
        (FontFamily::Times, FontStyle::Regular) => BuiltinFont::TimesRoman,
        (FontFamily::Times, FontStyle::Bold) => BuiltinFont::TimesBold,
        (FontFamily::Courier, FontStyle::Regular) => BuiltinFont::Courier,
        (FontFamily::Courier, FontStyle::Bold) => BuiltinFont::CourierBold,
    }
}

/// Renders `pages` into a single PDF, one output page per input page.
///
/// An image that fails to decode aborts the whole document with
/// `ComposeError::Decode` naming the page.
pub fn compose_document(
    config: &DocumentConfig,
    pages: &[PageInput],
) -> Result<Vec<u8>, ComposeError> {
    let doc = build_document(config, pages)?;

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);

    info!(
        pages = pages.len(),
        bytes = bytes.len(),
        sheet = config.sheet.name(),
        font = config.font_family.name(),
        "Document composed"
    );
    Ok(bytes)
}

fn build_document(config: &DocumentConfig, pages: &[PageInput]) -> Result<PdfDocument, ComposeError> {
    let (page_width_mm, page_height_mm) = config.sheet.dimensions_mm();
    let mut doc = PdfDocument::new(&config.title);
    let mut pdf_pages = Vec::with_capacity(pages.len());

    for (index, page) in pages.iter().enumerate() {
        // Dropped at the end of this iteration, or on the early return below.
        let decoded = page
            .image
            .as_deref()
            .map(|bytes| DecodedImage::decode(index, bytes))
            .transpose()?;

        let plan = plan_page(
            index,
            config,
            decoded.as_ref().map(|d| d.size),
            page.text.as_deref(),
        );

        let mut ops = Vec::new();
        if let Some(title) = &plan.title {
            push_title(&mut ops, title, page_height_mm);
        }
        if let (Some(block), Some(decoded)) = (&plan.image, decoded) {
            let id = doc.add_image(&decoded.raw);
            ops.push(Op::UseXobject {
                id,
                transform: image_transform(block, &decoded.size, page_height_mm),
            });
        }
        push_body(&mut ops, &plan, page_height_mm);

        debug!(
            page = index,
            lines = plan.lines.len(),
            dropped = plan.dropped_lines,
            has_image = plan.image.is_some(),
            "Page laid out"
        );
        pdf_pages.push(PdfPage::new(Mm(page_width_mm), Mm(page_height_mm), ops));
    }

    doc.pages = pdf_pages;
    Ok(doc)
}

// ────────────────────────────────────────────────────────────────────────────
// Operation builders
// ────────────────────────────────────────────────────────────────────────────

/// Converts a top-origin millimetre position into PDF's bottom-origin points.
fn pdf_point(x_mm: f32, y_from_top_mm: f32, page_height_mm: f32) -> Point {
    Point {
        x: Mm(x_mm).into_pt(),
        y: Mm(page_height_mm - y_from_top_mm).into_pt(),
    }
}

fn push_text_run(ops: &mut Vec<Op>, font: &BuiltinFont, size_pt: u8, pos: Point, text: &str) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor { pos });
    ops.push(Op::SetFontSizeBuiltinFont {
        font: font.clone(),
        size: Pt(f32::from(size_pt)),
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(text.to_string())],
        font: font.clone(),
    });
    ops.push(Op::EndTextSection);
}

fn push_title(ops: &mut Vec<Op>, title: &TitleBlock, page_height_mm: f32) {
    push_text_run(
        ops,
        &builtin_font(title.family, FontStyle::Bold),
        title.size_pt,
        pdf_point(title.x_mm, title.baseline_mm, page_height_mm),
        &title.text,
    );
}

fn push_body(ops: &mut Vec<Op>, plan: &PagePlan, page_height_mm: f32) {
    let font = builtin_font(plan.family, FontStyle::Regular);
    for TextLine {
        text,
        x_mm,
        baseline_mm,
    } in &plan.lines
    {
        if text.is_empty() {
            continue;
        }
        push_text_run(
            ops,
            &font,
            plan.size_pt,
            pdf_point(*x_mm, *baseline_mm, page_height_mm),
            text,
        );
    }
}

/// At 72 dpi one pixel is one point, so the scale factor is target points per pixel.
fn image_transform(block: &ImageBlock, size: &ImageSize, page_height_mm: f32) -> XObjectTransform {
    let width_pt = Mm(block.width_mm).into_pt().0;
    let height_pt = Mm(block.height_mm).into_pt().0;
    // The XObject is anchored at its bottom-left corner.
    let bottom_left = pdf_point(block.x_mm, block.y_mm + block.height_mm, page_height_mm);

    XObjectTransform {
        translate_x: Some(bottom_left.x),
        translate_y: Some(bottom_left.y),
        scale_x: Some(width_pt / size.width_px as f32),
        scale_y: Some(height_pt / size.height_px as f32),
        dpi: Some(72.0),
        ..Default::default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
