//! Greedy word wrap for body text blocks.
//!
//! Embedded line breaks always start a new line. Words are packed onto a line
//! while they fit; a single word wider than the whole line is split at
//! character boundaries. Spaces are kept as typed, including leading
//! indentation and runs between words; only the space a line breaks at is
//! dropped.

use crate::layout::font_metrics::FontMetricTable;

/// Wraps `text` into lines no wider than `max_width_mm` at `size_pt`.
///
/// Blank paragraphs are kept as empty lines so vertical spacing survives. A
/// single trailing newline does not produce an extra blank line.
pub fn wrap_text(
    text: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width_mm: f32,
) -> Vec<String> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        wrap_paragraph(paragraph, metrics, size_pt, max_width_mm, &mut lines);
    }
    lines
}

fn wrap_paragraph(
    paragraph: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width_mm: f32,
    lines: &mut Vec<String>,
) {
    let space_w = metrics.width_mm(" ", size_pt);
    let mut current = String::new();
    let mut current_width = 0.0_f32;
    // Whether `current` has taken a token yet. Leading spaces show up as empty
    // tokens, so an empty `current` can still be an open line.
    let mut open = false;
    let mut after_break = false;

    for word in paragraph.split(' ') {
        // The rest of a space run at a break does not indent the next line.
        if after_break && word.is_empty() {
            continue;
        }
        after_break = false;
        let word_w = metrics.width_mm(word, size_pt);

        if open {
            if current_width + space_w + word_w <= max_width_mm {
                current.push(' ');
                current.push_str(word);
                current_width += space_w + word_w;
                continue;
            }
            // Current line is full: flush it and place the word on a fresh line.
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
            if word.is_empty() {
                open = false;
                after_break = true;
                continue;
            }
        }

        open = true;
        if word_w <= max_width_mm {
            current.push_str(word);
            current_width = word_w;
        } else {
            let mut pieces = split_long_word(word, metrics, size_pt, max_width_mm);
            // The last piece stays open so following words can join it.
            if let Some(last) = pieces.pop() {
                lines.extend(pieces);
                current_width = metrics.width_mm(&last, size_pt);
                current = last;
            }
        }
    }

    if !after_break {
        lines.push(current);
    }
}

/// Splits a word into chunks that each fit `max_width_mm`. Every chunk holds at
/// least one character, even if that character alone is too wide.
fn split_long_word(
    word: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width_mm: f32,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_width = 0.0_f32;

    for c in word.chars() {
        let char_w = metrics.char_width(c) * size_pt * crate::layout::page::PT_TO_MM;
        if !piece.is_empty() && piece_width + char_w > max_width_mm {
            pieces.push(std::mem::take(&mut piece));
            piece_width = 0.0;
        }
        piece.push(c);
        piece_width += char_w;
    }

    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
