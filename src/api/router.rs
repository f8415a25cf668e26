//! API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//!
//! Layer stack (outermost → innermost):
//! CORS → Extension(ApiContext) → Rate limiter → Handler

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected outside the rate
/// limiter). Endpoint handlers use `State<ApiContext>` (via `with_state`).
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let cors = cors_layer(&ctx.config.server.allowed_origins);

    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/chat/sessions", post(endpoints::chat::open))
        .route(
            "/chat/sessions/:id",
            get(endpoints::chat::get).delete(endpoints::chat::close),
        )
        .route("/chat/sessions/:id/messages", post(endpoints::chat::send))
        .route(
            "/chat/sessions/:id/activity",
            post(endpoints::chat::activity),
        )
        .route("/completion", post(endpoints::completion::complete))
        .route("/referrals/send", post(endpoints::referrals::send))
        .route("/forms/lead", post(endpoints::forms::lead))
        .route("/forms/signup", post(endpoints::forms::signup))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        // Extension must sit outside the limiter so it can extract ApiContext
        .layer(axum::Extension(ctx));

    Router::new().nest("/api", routes).layer(cors)
}

/// CORS for the site origin(s). An empty list allows any origin.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::completion::CompletionService;
    use crate::config::AppConfig;
    use crate::referral::{EmailSender, OutgoingEmail, ReferralError};

    fn test_ctx() -> ApiContext {
        ApiContext::new(AppConfig::default(), CompletionService::mock_only(), None)
    }

    struct RecordingSender {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl EmailSender for RecordingSender {
        fn send(&self, email: &OutgoingEmail) -> Result<serde_json::Value, ReferralError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(serde_json::json!({ "id": "email-123" }))
        }
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn open_session(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chat/sessions",
                serde_json::json!({ "first_name": "Mei" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_mock_mode() {
        let app = api_router(test_ctx());
        let response = app.oneshot(empty_request("GET", "/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["mock_completion"], true);
        assert_eq!(json["email_enabled"], false);
    }

    #[tokio::test]
    async fn open_session_greets_by_name() {
        let app = api_router(test_ctx());
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chat/sessions",
                serde_json::json!({ "first_name": "Mei" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["active"], true);
        assert_eq!(json["gate"], "open");
        assert!(json["messages"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Hi Mei!"));
    }

    #[tokio::test]
    async fn open_session_without_body() {
        let app = api_router(test_ctx());
        let response = app
            .oneshot(empty_request("POST", "/api/chat/sessions"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn emergency_message_round_trip() {
        let app = api_router(test_ctx());
        let id = open_session(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/chat/sessions/{id}/messages"),
                serde_json::json!({ "text": "I have severe bleeding" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["outcome"]["accepted"]["gate"], "open");
        let messages = json["session"]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["sender"], "user");
        assert_eq!(messages[2]["is_emergency"], true);
    }

    #[tokio::test]
    async fn blank_message_is_ignored() {
        let app = api_router(test_ctx());
        let id = open_session(&app).await;

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/chat/sessions/{id}/messages"),
                serde_json::json!({ "text": "   " }),
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["outcome"], "ignored");
        assert_eq!(json["session"]["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn poll_activity_and_close() {
        let app = api_router(test_ctx());
        let id = open_session(&app).await;

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/chat/sessions/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(empty_request(
                "POST",
                &format!("/api/chat/sessions/{id}/activity"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/api/chat/sessions/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(empty_request("GET", &format!("/api/chat/sessions/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_session_id_is_bad_request() {
        let app = api_router(test_ctx());
        let response = app
            .oneshot(empty_request("GET", "/api/chat/sessions/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn completion_answers_from_mock_with_prompt_alias() {
        let app = api_router(test_ctx());
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/completion",
                serde_json::json!({ "prompt": "What is a colonoscopy?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["mock"], true);
        assert!(json["reply"].as_str().unwrap().starts_with("A colonoscopy"));
    }

    #[tokio::test]
    async fn completion_requires_message() {
        let app = api_router(test_ctx());
        let response = app
            .oneshot(json_request("POST", "/api/completion", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Message is required"));
    }

    #[tokio::test]
    async fn referral_sends_through_configured_sender() {
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
        });
        let ctx = ApiContext::new(
            AppConfig::default(),
            CompletionService::mock_only(),
            Some(sender.clone() as Arc<dyn EmailSender>),
        );
        let app = api_router(ctx);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/referrals/send",
                serde_json::json!({
                    "to": "friend@example.com",
                    "referrerName": "Mei",
                    "referralLink": "https://colonaive.ai/join?ref=abc"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["sent"], true);
        assert_eq!(json["provider"]["id"], "email-123");

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["friend@example.com".to_string()]);
    }

    #[tokio::test]
    async fn referral_validation_runs_before_delivery() {
        let app = api_router(test_ctx());
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/referrals/send",
                serde_json::json!({
                    "to": "nope",
                    "referrerName": "Mei",
                    "referralLink": "https://colonaive.ai/join"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/referrals/send",
                serde_json::json!({
                    "to": "friend@example.com",
                    "referrerName": "Mei",
                    "referralLink": "https://colonaive.ai/join"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn signup_form_reports_fields() {
        let app = api_router(test_ctx());
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/forms/signup",
                serde_json::json!({ "email": "bad" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        let fields: Vec<&str> = json["error"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"firstName"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"acceptTerms"));
    }

    #[tokio::test]
    async fn lead_form_accepts_valid_input() {
        let app = api_router(test_ctx());
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/forms/lead",
                serde_json::json!({
                    "fullName": "Tan Mei Ling",
                    "email": "mei@example.sg",
                    "consent": true
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["valid"], true);
    }

    #[tokio::test]
    async fn rate_limit_returns_429() {
        let mut config = AppConfig::default();
        config.server.requests_per_minute = 2;
        let app = api_router(ApiContext::new(config, CompletionService::mock_only(), None));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(empty_request("GET", "/api/health"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.oneshot(empty_request("GET", "/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
    }

    fn open_from(forwarded_for: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat/sessions")
            .header("X-Forwarded-For", forwarded_for)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn rotating_forwarded_for_does_not_reset_limit() {
        let mut config = AppConfig::default();
        config.server.requests_per_minute = 2;
        let app = api_router(ApiContext::new(config, CompletionService::mock_only(), None));

        let mut statuses = Vec::new();
        for i in 0..10 {
            let response = app
                .clone()
                .oneshot(open_from(&format!("10.9.9.{i}")))
                .await
                .unwrap();
            statuses.push(response.status());
        }
        assert_eq!(&statuses[..2], &[StatusCode::CREATED, StatusCode::CREATED]);
        assert!(statuses[2..]
            .iter()
            .all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn trusted_forwarded_for_separates_clients() {
        let mut config = AppConfig::default();
        config.server.requests_per_minute = 1;
        config.server.trust_forwarded_for = true;
        let app = api_router(ApiContext::new(config, CompletionService::mock_only(), None));

        let first = app.clone().oneshot(open_from("10.9.9.1")).await.unwrap();
        let second = app.clone().oneshot(open_from("10.9.9.2")).await.unwrap();
        let repeat = app.oneshot(open_from("10.9.9.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        assert_eq!(second.status(), StatusCode::CREATED);
        assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn session_limit_returns_503() {
        let mut config = AppConfig::default();
        config.server.max_sessions = 1;
        let app = api_router(ApiContext::new(config, CompletionService::mock_only(), None));

        open_session(&app).await;
        let response = app
            .oneshot(empty_request("POST", "/api/chat/sessions"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "UNAVAILABLE");
    }

    #[tokio::test]
    async fn cors_preflight_is_answered() {
        let mut config = AppConfig::default();
        config.server.allowed_origins = vec!["https://colonaive.ai".into()];
        let app = api_router(ApiContext::new(config, CompletionService::mock_only(), None));

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/completion")
                    .header("Origin", "https://colonaive.ai")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "https://colonaive.ai"
        );
    }
}
