//! Editable document drafts.
//!
//! A draft is the in-progress version of a document: settings plus one page
//! draft per page. The page list is resized explicitly whenever the page count
//! changes, so `pages.len() == settings.page_count` always holds.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::composer::render::PageInput;
use crate::layout::{DocumentConfig, FontFamily, SheetSize};

pub const MIN_PAGES: usize = 1;
pub const MAX_PAGES: usize = 10;
pub const MIN_FONT_SIZE: u8 = 8;
pub const MAX_FONT_SIZE: u8 = 36;
pub const DEFAULT_FONT_SIZE: u8 = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Draft {0} not found")]
    NotFound(Uuid),

    #[error("Page count must be between {MIN_PAGES} and {MAX_PAGES}, got {0}")]
    PageCount(usize),

    #[error("Font size must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}, got {0}")]
    FontSize(u8),

    #[error("Page index {index} is out of range for a {len}-page draft")]
    PageIndex { index: usize, len: usize },

    #[error("A title is required before generating the document")]
    EmptyTitle,
}

// ────────────────────────────────────────────────────────────────────────────
// Settings
// ────────────────────────────────────────────────────────────────────────────

fn default_page_count() -> usize {
    MIN_PAGES
}

fn default_font_size() -> u8 {
    DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    FontFamily::default().name().to_string()
}

/// User-configurable document settings. Field names match the form the
/// frontend posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSettings {
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "paginas", default = "default_page_count")]
    pub page_count: usize,
    #[serde(rename = "tamano", default = "default_font_size")]
    pub font_size: u8,
    /// Kept as free text; resolved (with fallback) only when rendering.
    #[serde(rename = "fuente", default = "default_font_family")]
    pub font_family: String,
    #[serde(rename = "hoja", default)]
    pub sheet: SheetSize,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            page_count: default_page_count(),
            font_size: default_font_size(),
            font_family: default_font_family(),
            sheet: SheetSize::default(),
        }
    }
}

impl DraftSettings {
    /// The title may be empty while editing; it is only required at render time.
    pub fn validate(&self) -> Result<(), DraftError> {
        if !(MIN_PAGES..=MAX_PAGES).contains(&self.page_count) {
            return Err(DraftError::PageCount(self.page_count));
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(DraftError::FontSize(self.font_size));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Drafts
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDraft {
    pub text: String,
    pub image: Option<Bytes>,
}

impl PageDraft {
    fn to_input(&self) -> PageInput {
        PageInput {
            text: (!self.text.is_empty()).then(|| self.text.clone()),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDraft {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    last_touched: Instant,
    settings: DraftSettings,
    pages: Vec<PageDraft>,
}

impl DocumentDraft {
    pub fn new(settings: DraftSettings) -> Result<Self, DraftError> {
        settings.validate()?;
        let pages = vec![PageDraft::default(); settings.page_count];
        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            last_touched: Instant::now(),
            settings,
            pages,
        })
    }

    /// Last time the draft was created or edited through the store.
    pub fn last_touched(&self) -> Instant {
        self.last_touched
    }

    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    pub fn settings(&self) -> &DraftSettings {
        &self.settings
    }

    pub fn pages(&self) -> &[PageDraft] {
        &self.pages
    }

    /// Replaces the settings. Existing pages keep their content; the list is
    /// truncated or padded with blank pages to the new page count.
    pub fn update_settings(&mut self, settings: DraftSettings) -> Result<(), DraftError> {
        settings.validate()?;
        self.pages.resize_with(settings.page_count, PageDraft::default);
        self.settings = settings;
        Ok(())
    }

    pub fn page_mut(&mut self, index: usize) -> Result<&mut PageDraft, DraftError> {
        let len = self.pages.len();
        self.pages
            .get_mut(index)
            .ok_or(DraftError::PageIndex { index, len })
    }

    pub fn set_text(&mut self, index: usize, text: String) -> Result<(), DraftError> {
        self.page_mut(index)?.text = text;
        Ok(())
    }

    pub fn set_image(&mut self, index: usize, image: Bytes) -> Result<(), DraftError> {
        self.page_mut(index)?.image = Some(image);
        Ok(())
    }

    pub fn clear_image(&mut self, index: usize) -> Result<(), DraftError> {
        self.page_mut(index)?.image = None;
        Ok(())
    }

    /// Snapshot of everything the renderer needs. Fails when the title is blank.
    pub fn render_inputs(&self) -> Result<(DocumentConfig, Vec<PageInput>), DraftError> {
        if self.settings.title.trim().is_empty() {
            return Err(DraftError::EmptyTitle);
        }

        let config = DocumentConfig {
            title: self.settings.title.clone(),
            font_family: FontFamily::from_name(&self.settings.font_family),
            font_size_pt: self.settings.font_size,
            sheet: self.settings.sheet,
        };
        let inputs = self.pages.iter().map(PageDraft::to_input).collect();
        Ok((config, inputs))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
