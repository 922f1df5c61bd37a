//! HTTP surface of the webhook responder.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use modbot_core::{HandleOutcome, Responder};
use serde_json::{json, Value};

pub fn router(responder: Arc<Responder>) -> Router {
    Router::new()
        .route("/notification", post(handle_notification))
        .route("/cache/clear", post(handle_cache_clear))
        .route("/healthz", get(handle_healthz))
        .with_state(responder)
}

async fn handle_notification(
    State(responder): State<Arc<Responder>>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let report = responder.handle(&payload).await;
    let mut body = json!({ "result": report.outcome.message() });
    if let Some(detail) = report.detail {
        body["detail"] = Value::String(detail);
    }
    (status_for(report.outcome), Json(body))
}

fn status_for(outcome: HandleOutcome) -> StatusCode {
    if outcome.is_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn handle_cache_clear(State(responder): State<Arc<Responder>>) -> Json<Value> {
    responder.clear_cache();
    Json(json!({ "result": "cache cleared" }))
}

async fn handle_healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use modbot_core::{
        CommentPoster, MessageCatalog, PosterError, Responder, ResponderConfig, ScorerError,
        ToxicityScorer,
    };
    use serde_json::json;

    use super::{router, status_for, HandleOutcome, StatusCode};

    struct StaticScorer(Option<f64>);

    #[async_trait]
    impl ToxicityScorer for StaticScorer {
        async fn score(&self, _text: &str, _language: &str) -> Result<Option<f64>, ScorerError> {
            Ok(self.0)
        }
    }

    struct SilentPoster;

    #[async_trait]
    impl CommentPoster for SilentPoster {
        async fn post(
            &self,
            _thread_id: u64,
            _parent_id: u64,
            _text: &str,
        ) -> Result<(), PosterError> {
            Ok(())
        }
    }

    fn test_responder() -> Arc<Responder> {
        Arc::new(Responder::new(
            ResponderConfig {
                bot_id: 400974,
                bot_name: "Токсикометр".to_string(),
                privileged_owner_id: None,
                watched_author_id: None,
                moderator_id: None,
                dedup_capacity: 8,
                score_language: "ru".to_string(),
            },
            MessageCatalog::default(),
            Arc::new(StaticScorer(Some(0.53))),
            Arc::new(SilentPoster),
        ))
    }

    #[test]
    fn only_handling_errors_map_to_500() {
        assert_eq!(status_for(HandleOutcome::Handled), StatusCode::OK);
        assert_eq!(status_for(HandleOutcome::NotRelevant), StatusCode::OK);
        assert_eq!(status_for(HandleOutcome::NoIdentifier), StatusCode::OK);
        assert_eq!(status_for(HandleOutcome::AlreadyHandled), StatusCode::OK);
        assert_eq!(
            status_for(HandleOutcome::HandlingError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn notification_route_classifies_and_responds() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = router(test_responder());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let http = reqwest::Client::new();
        let base = format!("http://{addr}");

        let response = http
            .post(format!("{base}/notification"))
            .json(&json!({}))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.expect("json body");
        assert_eq!(body["result"], "no identifier");

        let payload = json!({
            "data": {
                "id": 1,
                "text": "привет [@400974|Токсикометр]",
                "reply_to": { "id": 2, "text": "родительский коммент" },
                "content": { "id": 3 }
            }
        });
        let response = http
            .post(format!("{base}/notification"))
            .json(&payload)
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.expect("json body");
        assert_eq!(body["result"], "handled");

        // Same event id again: collapsed by the dedup cache.
        let response = http
            .post(format!("{base}/notification"))
            .json(&payload)
            .send()
            .await
            .expect("request");
        let body: serde_json::Value = response.json().await.expect("json body");
        assert_eq!(body["result"], "already handled");

        // Admin clear makes it new again.
        let response = http
            .post(format!("{base}/cache/clear"))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 200);
        let response = http
            .post(format!("{base}/notification"))
            .json(&payload)
            .send()
            .await
            .expect("request");
        let body: serde_json::Value = response.json().await.expect("json body");
        assert_eq!(body["result"], "handled");

        let response = http
            .get(format!("{base}/healthz"))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 200);
    }
}
