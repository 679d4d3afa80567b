pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::composer::handlers as composer;
use crate::dataset::handlers as dataset;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let image_limit = DefaultBodyLimit::max(state.config.max_image_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Dataset Query Service
        .route("/api/filtros", get(dataset::handle_filter_options))
        .route("/api/datos-filtrados", get(dataset::handle_filtered_data))
        .route("/api/resumen", get(dataset::handle_summary))
        // Document Composer
        .route("/api/borradores", post(composer::handle_create_draft))
        .route(
            "/api/borradores/:id",
            get(composer::handle_get_draft)
                .put(composer::handle_update_draft)
                .delete(composer::handle_delete_draft),
        )
        .route(
            "/api/borradores/:id/paginas/:indice/texto",
            put(composer::handle_set_page_text),
        )
        .route(
            "/api/borradores/:id/paginas/:indice/imagen",
            put(composer::handle_set_page_image)
                .delete(composer::handle_clear_page_image)
                .layer(image_limit),
        )
        .route(
            "/api/borradores/:id/paginas/:indice/historia",
            post(composer::handle_generate_page_text),
        )
        .route(
            "/api/borradores/:id/documento",
            get(composer::handle_render_document),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        extract::State,
        http::{header, Method, Request, StatusCode},
        response::Response,
        Json,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::composer::draft::DraftSettings;
    use crate::composer::DraftStore;
    use crate::config::Config;
    use crate::dataset::test_support::sample_dataset;
    use crate::llm_client::{DisabledGenerator, LlmError, TextGenerator};

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, title: &str) -> Result<String, LlmError> {
            Ok(format!("Historia sobre {title}"))
        }
    }

    fn state_with(generator: Arc<dyn TextGenerator>, max_image_bytes: usize) -> AppState {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.max_image_bytes = max_image_bytes;
        AppState {
            dataset: Arc::new(sample_dataset()),
            drafts: DraftStore::new(Duration::from_secs(config.draft_ttl_secs)),
            text_generator: generator,
            config,
        }
    }

    fn app_with(generator: Arc<dyn TextGenerator>, max_image_bytes: usize) -> Router {
        build_router(state_with(generator, max_image_bytes))
    }

    fn app() -> Router {
        app_with(Arc::new(EchoGenerator), 1024 * 1024)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Body) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = send(app, Method::GET, uri, Body::empty()).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn create_draft(app: &Router, body: Value) -> String {
        let response = send(app, Method::POST, "/api/borradores", Body::from(body.to_string())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    // ── Dataset Query Service ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get_json(&app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "aula-api");
    }

    #[tokio::test]
    async fn test_filter_options_for_years_descending() {
        let (status, json) = get_json(&app(), "/api/filtros?tipo=a%C3%B1o").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"opciones": [2023, 2022, 2021]}));
    }

    #[tokio::test]
    async fn test_filter_options_for_gender_are_fixed() {
        let (_, json) = get_json(&app(), "/api/filtros?tipo=genero").await;
        assert_eq!(
            json["opciones"],
            json!([{"id": 1, "label": "Hombres"}, {"id": 2, "label": "Mujeres"}])
        );
    }

    #[tokio::test]
    async fn test_unknown_filter_type_is_empty() {
        let (status, json) = get_json(&app(), "/api/filtros?tipo=color").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"opciones": []}));
    }

    #[tokio::test]
    async fn test_filtered_data_defaults_to_year() {
        let (status, json) = get_json(&app(), "/api/datos-filtrados").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["labels"], json!([2021, 2022, 2023]));
        assert_eq!(json["values"], json!([95, 1950, 280]));
        assert_eq!(json["totalRegistros"], 5);
    }

    #[tokio::test]
    async fn test_filtered_data_with_filter_and_group() {
        let (_, json) = get_json(
            &app(),
            "/api/datos-filtrados?a%C3%B1o=2022&groupBy=institucion",
        )
        .await;
        assert_eq!(
            json["labels"],
            json!(["UNIVERSIDAD DE ANTIOQUIA", "UNIVERSIDAD NACIONAL"])
        );
        assert_eq!(json["values"], json!([300, 1650]));
        assert_eq!(json["totalRegistros"], 3);
    }

    #[tokio::test]
    async fn test_filtered_data_rejects_bad_year() {
        let (status, json) = get_json(&app(), "/api/datos-filtrados?a%C3%B1o=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_summary() {
        let (status, json) = get_json(&app(), "/api/resumen").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({"totalMatriculas": 2325, "porAño": {"2021": 95, "2022": 1950, "2023": 280}})
        );
    }

    // ── Document Composer ───────────────────────────────────────────────────

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_create_handler_future_is_send() {
        let state = state_with(Arc::new(EchoGenerator), 1024);
        let future = composer::handle_create_draft(State(state), Json(DraftSettings::default()));
        assert_send(&future);
    }

    #[tokio::test]
    async fn test_each_create_gets_a_fresh_id() {
        let app = app();
        let first = create_draft(&app, json!({"titulo": "uno"})).await;
        let second = create_draft(&app, json!({"titulo": "dos"})).await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_create_and_fetch_draft() {
        let app = app();
        let id = create_draft(&app, json!({"titulo": "El faro", "paginas": 2})).await;

        let (status, json) = get_json(&app, &format!("/api/borradores/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["titulo"], "El faro");
        assert_eq!(json["paginas"], 2);
        assert_eq!(json["paginasDetalle"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_page_count() {
        let app = app();
        let response = send(
            &app,
            Method::POST,
            "/api/borradores",
            Body::from(json!({"titulo": "x", "paginas": 11}).to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_draft_is_not_found() {
        let (status, json) = get_json(
            &app(),
            "/api/borradores/00000000-0000-0000-0000-000000000000",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_resizes_and_keeps_text() {
        let app = app();
        let id = create_draft(&app, json!({"titulo": "El faro", "paginas": 1})).await;
        send(
            &app,
            Method::PUT,
            &format!("/api/borradores/{id}/paginas/0/texto"),
            Body::from(json!({"texto": "Primera"}).to_string()),
        )
        .await;

        let response = send(
            &app,
            Method::PUT,
            &format!("/api/borradores/{id}"),
            Body::from(json!({"titulo": "El faro", "paginas": 3, "fuente": "Times"}).to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["paginas"], 3);
        assert_eq!(json["fuente"], "Times");
        assert_eq!(json["paginasDetalle"][0]["texto"], "Primera");
        assert_eq!(json["paginasDetalle"][2]["texto"], "");
    }

    #[tokio::test]
    async fn test_page_index_out_of_range_is_bad_request() {
        let app = app();
        let id = create_draft(&app, json!({"titulo": "x", "paginas": 1})).await;
        let response = send(
            &app,
            Method::PUT,
            &format!("/api/borradores/{id}/paginas/5/texto"),
            Body::from(json!({"texto": "?"}).to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_draft() {
        let app = app();
        let id = create_draft(&app, json!({"titulo": "x"})).await;
        let uri = format!("/api/borradores/{id}");

        let response = send(&app, Method::DELETE, &uri, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (status, _) = get_json(&app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_page_text_fills_page() {
        let app = app();
        let id = create_draft(&app, json!({"titulo": "El faro", "paginas": 2})).await;
        let response = send(
            &app,
            Method::POST,
            &format!("/api/borradores/{id}/paginas/1/historia"),
            Body::empty(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["paginasDetalle"][1]["texto"], "Historia sobre El faro");
        assert_eq!(json["paginasDetalle"][0]["texto"], "");
    }

    #[tokio::test]
    async fn test_generate_without_backend_is_bad_gateway() {
        let app = app_with(Arc::new(DisabledGenerator), 1024);
        let id = create_draft(&app, json!({"titulo": "El faro"})).await;
        let response = send(
            &app,
            Method::POST,
            &format!("/api/borradores/{id}/paginas/0/historia"),
            Body::empty(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_page_image_upload_and_clear() {
        let app = app();
        let id = create_draft(&app, json!({"titulo": "x"})).await;
        let uri = format!("/api/borradores/{id}/paginas/0/imagen");
        let png = png_bytes(4, 2);
        let size = png.len();

        let response = send(&app, Method::PUT, &uri, Body::from(png)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["paginasDetalle"][0]["tieneImagen"], true);
        assert_eq!(json["paginasDetalle"][0]["bytesImagen"], size);

        let response = send(&app, Method::DELETE, &uri, Body::empty()).await;
        let json = body_json(response).await;
        assert_eq!(json["paginasDetalle"][0]["tieneImagen"], false);
    }

    #[tokio::test]
    async fn test_oversized_image_is_rejected() {
        let app = app_with(Arc::new(EchoGenerator), 16);
        let id = create_draft(&app, json!({"titulo": "x"})).await;
        let response = send(
            &app,
            Method::PUT,
            &format!("/api/borradores/{id}/paginas/0/imagen"),
            Body::from(vec![0u8; 64]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_render_document_returns_pdf() {
        let app = app();
        let id = create_draft(&app, json!({"titulo": "El faro", "paginas": 2})).await;
        send(
            &app,
            Method::PUT,
            &format!("/api/borradores/{id}/paginas/0/imagen"),
            Body::from(png_bytes(8, 4)),
        )
        .await;
        send(
            &app,
            Method::PUT,
            &format!("/api/borradores/{id}/paginas/1/texto"),
            Body::from(json!({"texto": "Fin de la historia."}).to_string()),
        )
        .await;

        let response = send(
            &app,
            Method::GET,
            &format!("/api/borradores/{id}/documento"),
            Body::empty(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"documento.pdf\""
        );
        assert!(body_bytes(response).await.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_render_requires_title() {
        let app = app();
        let id = create_draft(&app, json!({"titulo": "  "})).await;
        let (status, json) = get_json(&app, &format!("/api/borradores/{id}/documento")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_render_with_undecodable_image_is_unprocessable() {
        let app = app();
        let id = create_draft(&app, json!({"titulo": "x"})).await;
        send(
            &app,
            Method::PUT,
            &format!("/api/borradores/{id}/paginas/0/imagen"),
            Body::from(b"not an image".to_vec()),
        )
        .await;
        let (status, json) = get_json(&app, &format!("/api/borradores/{id}/documento")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "UNPROCESSABLE_ENTITY");
    }
}
