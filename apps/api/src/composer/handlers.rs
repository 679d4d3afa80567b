use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::composer::draft::{DocumentDraft, DraftSettings};
use crate::composer::render::compose_document;
use crate::errors::AppError;
use crate::layout::SheetSize;
use crate::state::AppState;

const PDF_FILENAME: &str = "documento.pdf";

// ────────────────────────────────────────────────────────────────────────────
// Response shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub indice: usize,
    pub texto: String,
    pub tiene_imagen: bool,
    pub bytes_imagen: usize,
}

/// JSON view of a draft. Image bytes are summarized, never echoed back.
#[derive(Debug, Serialize, Deserialize)]
pub struct DraftView {
    pub id: Uuid,
    pub titulo: String,
    pub paginas: usize,
    pub tamano: u8,
    pub fuente: String,
    pub hoja: SheetSize,
    pub creado: DateTime<Utc>,
    #[serde(rename = "paginasDetalle")]
    pub paginas_detalle: Vec<PageView>,
}

impl From<&DocumentDraft> for DraftView {
    fn from(draft: &DocumentDraft) -> Self {
        let settings = draft.settings();
        Self {
            id: draft.id,
            titulo: settings.title.clone(),
            paginas: settings.page_count,
            tamano: settings.font_size,
            fuente: settings.font_family.clone(),
            hoja: settings.sheet,
            creado: draft.created_at,
            paginas_detalle: draft
                .pages()
                .iter()
                .enumerate()
                .map(|(indice, page)| PageView {
                    indice,
                    texto: page.text.clone(),
                    tiene_imagen: page.image.is_some(),
                    bytes_imagen: page.image.as_ref().map_or(0, |b| b.len()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageTextRequest {
    pub texto: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Draft lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/borradores
pub async fn handle_create_draft(
    State(state): State<AppState>,
    Json(settings): Json<DraftSettings>,
) -> Result<(StatusCode, Json<DraftView>), AppError> {
    let draft = state.drafts.create(settings).await?;
    let open_drafts = state.drafts.len().await;
    info!(
        draft = %draft.id,
        pages = draft.pages().len(),
        open_drafts,
        "Draft created"
    );
    Ok((StatusCode::CREATED, Json(DraftView::from(&draft))))
}

/// GET /api/borradores/:id
pub async fn handle_get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, AppError> {
    let draft = state.drafts.get(id).await?;
    Ok(Json(DraftView::from(&draft)))
}

/// PUT /api/borradores/:id
pub async fn handle_update_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(settings): Json<DraftSettings>,
) -> Result<Json<DraftView>, AppError> {
    let view = state
        .drafts
        .with_draft(id, |draft| {
            draft.update_settings(settings)?;
            Ok(DraftView::from(&*draft))
        })
        .await?;
    Ok(Json(view))
}

/// DELETE /api/borradores/:id
pub async fn handle_delete_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.drafts.remove(id).await?;
    info!(draft = %id, "Draft deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Page edits
// ────────────────────────────────────────────────────────────────────────────

/// PUT /api/borradores/:id/paginas/:indice/texto
pub async fn handle_set_page_text(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(req): Json<PageTextRequest>,
) -> Result<Json<DraftView>, AppError> {
    let view = state
        .drafts
        .with_draft(id, |draft| {
            draft.set_text(index, req.texto)?;
            Ok(DraftView::from(&*draft))
        })
        .await?;
    Ok(Json(view))
}

/// PUT /api/borradores/:id/paginas/:indice/imagen
///
/// The body is the raw encoded image. Decoding is deferred to render time.
pub async fn handle_set_page_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    body: Bytes,
) -> Result<Json<DraftView>, AppError> {
    if body.is_empty() {
        return Err(AppError::Validation("Image body is empty".to_string()));
    }
    let size = body.len();
    let view = state
        .drafts
        .with_draft(id, |draft| {
            draft.set_image(index, body)?;
            Ok(DraftView::from(&*draft))
        })
        .await?;

    info!(draft = %id, page = index, bytes = size, "Page image stored");
    Ok(Json(view))
}

/// DELETE /api/borradores/:id/paginas/:indice/imagen
pub async fn handle_clear_page_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<DraftView>, AppError> {
    let view = state
        .drafts
        .with_draft(id, |draft| {
            draft.clear_image(index)?;
            Ok(DraftView::from(&*draft))
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/borradores/:id/paginas/:indice/historia
///
/// The store lock is released while the generator runs; the result is written
/// back only if the draft and page still exist.
pub async fn handle_generate_page_text(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<DraftView>, AppError> {
    let title = state
        .drafts
        .with_draft(id, |draft| {
            draft.page_mut(index)?;
            Ok(draft.settings().title.clone())
        })
        .await?;

    let text = state.text_generator.generate(&title).await?;
    info!(draft = %id, page = index, chars = text.chars().count(), "Page text generated");

    let view = state
        .drafts
        .with_draft(id, |draft| {
            draft.set_text(index, text)?;
            Ok(DraftView::from(&*draft))
        })
        .await?;
    Ok(Json(view))
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/borradores/:id/documento
pub async fn handle_render_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (config, inputs) = state.drafts.get(id).await?.render_inputs()?;

    // CPU-bound: image decoding and PDF serialization.
    let pdf = tokio::task::spawn_blocking(move || compose_document(&config, &inputs))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{PDF_FILENAME}\""),
            ),
        ],
        pdf,
    ))
}
