use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{AppState, middleware::request_id_middleware};

pub mod catalog;
pub mod chat;
pub mod compliance;
pub mod generate;
pub mod health;
pub mod intake;
pub mod preview;
pub mod render;
pub mod sessions;
pub mod social;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(catalog::router())
        .merge(intake::router())
        .merge(sessions::router())
        .merge(generate::router())
        .merge(chat::router())
        .merge(compliance::router())
        .merge(preview::router())
        .merge(social::router())
        .merge(render::router())
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use newsroom::testing::Fakes;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::REQUEST_ID_HEADER;

    fn test_app() -> (Router, Fakes) {
        let fakes = Fakes::default();
        let app = router(AppState::new(fakes.orchestrator()));
        (app, fakes)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn intake_body() -> Value {
        json!({
            "source_type": "manual_description",
            "content": "Victims receive a wedding invitation APK over WhatsApp and lose their savings."
        })
    }

    fn generate_body(session_id: &str) -> Value {
        json!({
            "session_id": session_id,
            "target_groups": ["Elderly"],
            "languages": ["English", "Bahasa Melayu"],
            "tone": "Urgent/Warning",
            "avatar_id": "officer_malay_male_01"
        })
    }

    async fn verified_session(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/intake", Some(intake_body())).await;
        assert_eq!(status, StatusCode::OK);
        let session_id = body["data"]["session_id"].as_str().unwrap().to_string();

        let (status, _) = send(
            app,
            "POST",
            "/api/verify",
            Some(json!({"session_id": session_id, "officer_id": "OFC-001"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        session_id
    }

    #[tokio::test]
    async fn health_reports_healthy_and_tags_request() {
        let (app, _fakes) = test_app();
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["active_sessions"], 0);
    }

    #[tokio::test]
    async fn catalog_lists_avatars_and_constraints() {
        let (app, _fakes) = test_app();

        let (status, body) = send(&app, "GET", "/api/avatars", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["avatars"].as_array().unwrap().len(), 6);

        let (_, body) = send(&app, "GET", "/api/config", None).await;
        let config = &body["data"];
        assert_eq!(config["max_scene_duration"], 8);
        assert_eq!(config["supported_languages"].as_array().unwrap().len(), 6);
        assert_eq!(config["supported_tones"][0], "Urgent/Warning");
        assert_eq!(config["formats"][1]["format"], "story");
        assert_eq!(config["formats"][1]["max_duration_seconds"], 15);
    }

    #[tokio::test]
    async fn short_intake_is_rejected_without_creating_a_session() {
        let (app, _fakes) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/intake",
            Some(json!({"source_type": "manual_description", "content": "scam"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (_, body) = send(&app, "GET", "/api/sessions", None).await;
        assert_eq!(body["data"]["count"], 0);
    }

    #[tokio::test]
    async fn streaming_intake_emits_thoughts_then_result() {
        let (app, _fakes) = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/intake/stream")
            .header("content-type", "application/json")
            .body(Body::from(intake_body().to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let thought = text.find("event: thought").unwrap();
        let result = text.find("event: result").unwrap();
        assert!(thought < result);
        assert!(!text.contains("event: error"));

        let (_, body) = send(&app, "GET", "/api/sessions", None).await;
        assert_eq!(body["data"]["count"], 1);
    }

    #[tokio::test]
    async fn navigation_is_gated_on_verification() {
        let (app, _fakes) = test_app();
        let (_, body) = send(&app, "POST", "/api/intake", Some(intake_body())).await;
        let session_id = body["data"]["session_id"].as_str().unwrap().to_string();

        let navigate = json!({"session_id": session_id, "to": "configuration"});
        let (status, body) = send(&app, "POST", "/api/navigate", Some(navigate.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "fact sheet not verified");

        let (status, body) = send(
            &app,
            "POST",
            "/api/verify",
            Some(json!({
                "session_id": session_id,
                "officer_id": "OFC-001",
                "corrections": {"scam_name": "Wedding Card APK"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["verified"], true);
        assert_eq!(body["data"]["fact_sheet"]["scam_name"], "Wedding Card APK");

        let (status, body) = send(&app, "POST", "/api/navigate", Some(navigate)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["stage"], "configuration");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (app, _fakes) = test_app();
        let missing = newsroom::SessionId::new();

        let (status, body) = send(&app, "GET", &format!("/api/sessions/{}", missing), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &app,
            "POST",
            "/api/verify",
            Some(json!({"session_id": missing, "officer_id": "OFC-001"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn generate_then_chat_on_the_fact_sheet() {
        let (app, fakes) = test_app();
        let session_id = verified_session(&app).await;

        let (status, body) = send(&app, "POST", "/api/generate", Some(generate_body(&session_id))).await;
        assert_eq!(status, StatusCode::OK);
        let breakdowns = body["data"]["video_package"]["breakdowns"].as_object().unwrap();
        assert!(breakdowns.contains_key("en"));
        assert!(breakdowns.contains_key("bm"));
        assert!(body["data"]["compliance_report"].is_object());

        fakes.chat.push(
            "Sharpened the hook.\n```json\n{\"updates\": {\"story_hook\": \"The card is a trap.\"}}\n```",
        );
        let (status, body) = send(
            &app,
            "POST",
            "/api/chat/factsheet",
            Some(json!({"session_id": session_id, "message": "Make the hook punchier"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["updated"], true);
        assert_eq!(body["data"]["reply"], "Sharpened the hook.");

        let (_, body) = send(&app, "GET", &format!("/api/sessions/{}", session_id), None).await;
        assert_eq!(body["data"]["fact_sheet"]["story_hook"], "The card is a trap.");
    }

    #[tokio::test]
    async fn rejected_chat_patch_is_not_an_error() {
        let (app, fakes) = test_app();
        let session_id = verified_session(&app).await;

        fakes.chat.push(
            "Done.\n```json\n{\"updates\": {\"verified_by_officer\": false}}\n```",
        );
        let (status, body) = send(
            &app,
            "POST",
            "/api/chat/factsheet",
            Some(json!({"session_id": session_id, "message": "Unverify it"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["updated"], false);

        let (_, body) = send(&app, "GET", &format!("/api/sessions/{}", session_id), None).await;
        assert_eq!(body["data"]["fact_sheet"]["verified_by_officer"], true);
    }

    #[tokio::test]
    async fn unknown_chat_target_is_rejected() {
        let (app, _fakes) = test_app();
        let session_id = verified_session(&app).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/chat/storyboard",
            Some(json!({"session_id": session_id, "message": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn social_requires_known_platform_and_a_package() {
        let (app, _fakes) = test_app();
        let session_id = verified_session(&app).await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/social/generate",
            Some(json!({"session_id": session_id, "platform": "myspace"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", &format!("/api/social/{}", session_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, "POST", "/api/generate", Some(generate_body(&session_id))).await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/social/generate",
            Some(json!({"session_id": session_id, "platform": "tiktok"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["platform"], "tiktok");

        let (status, _) = send(&app, "GET", &format!("/api/social/{}", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn compliance_re_review_reopens_publish() {
        let (app, fakes) = test_app();
        let session_id = verified_session(&app).await;

        let (status, _) = send(&app, "POST", "/api/compliance", Some(json!({"session_id": session_id}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(&app, "POST", "/api/generate", Some(generate_body(&session_id))).await;
        fakes.chat.push(format!(
            "Done.\n```json\n{}\n```",
            json!({"updates": {"scenes": {"2": {"text_overlay": "SCAM ALERT"}}}})
        ));
        let (status, body) = send(
            &app,
            "POST",
            "/api/chat/video-package",
            Some(json!({"session_id": session_id, "message": "overlay SCAM ALERT on scene 2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["updated"], true);

        let leave = json!({"session_id": session_id, "from": "compliance", "to": "publish"});
        let (status, _) = send(&app, "POST", "/api/navigate", Some(leave.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, "POST", "/api/compliance", Some(json!({"session_id": session_id}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["passed"], true);

        let (status, _) = send(&app, "POST", "/api/navigate", Some(leave)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn avatar_recommendations_over_http() {
        let (app, fakes) = test_app();
        let session_id = verified_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/recommend-avatars",
            Some(json!({"session_id": session_id, "language": "Bahasa Melayu", "tone": "Calm"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["recommended_avatars"],
            json!(["officer_chinese_female_01", "officer_malay_male_01"])
        );
        assert_eq!(body["data"]["fallback"], false);
        assert_eq!(fakes.avatars.briefs()[0].tone, Some(newsroom::models::Tone::Calm));

        *fakes.avatars.ids.lock().unwrap() = Vec::new();
        let (_, body) = send(
            &app,
            "POST",
            "/api/recommend-avatars",
            Some(json!({"session_id": session_id})),
        )
        .await;
        assert_eq!(body["data"]["fallback"], true);
        assert_eq!(body["data"]["recommended_avatars"][0], "officer_malay_male_01");
    }

    #[tokio::test]
    async fn render_lifecycle_over_http() {
        let (app, _fakes) = test_app();
        let session_id = verified_session(&app).await;
        send(&app, "POST", "/api/generate", Some(generate_body(&session_id))).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/render",
            Some(json!({"session_id": session_id, "language_code": "en"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let project_id = body["data"]["project_id"].as_str().unwrap().to_string();
        assert_eq!(project_id, format!("{}_en", session_id));

        let (status, _) = send(
            &app,
            "POST",
            "/api/render",
            Some(json!({"session_id": session_id, "language_code": "en"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let completion = json!({
            "project_id": project_id,
            "outcome": "completed",
            "output": {"kind": "url", "url": "https://cdn.test/final.mp4"}
        });
        let (status, body) = send(&app, "POST", "/api/render/complete", Some(completion.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["accepted"], true);
        assert_eq!(body["data"]["status"], "completed");

        let (status, body) = send(&app, "POST", "/api/render/complete", Some(completion)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["duplicate"], true);

        let (status, _) = send(
            &app,
            "POST",
            "/api/render/complete",
            Some(json!({"project_id": project_id, "outcome": "failed", "reason": "late failure"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, "GET", &format!("/api/render/{}", project_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["progress_percent"], 100);
    }

    #[tokio::test]
    async fn completion_for_unknown_project_is_accepted_but_ignored() {
        let (app, _fakes) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/render/complete",
            Some(json!({"project_id": "ghost_en", "outcome": "failed", "reason": "no such job"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["data"]["accepted"], false);

        let (status, _) = send(&app, "GET", "/api/render/ghost_en", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
