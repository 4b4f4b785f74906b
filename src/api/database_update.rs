use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use log::{error, info};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::migration::UpdateEngine;

pub const SUCCESS_MESSAGE: &str = "All database updates were successfully applied.";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub revision: u32,
    pub detail: String,
}

/// Response structure for GET /database-update
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpdateStatus {
    pub available: bool,
    pub current_revision: u32,
    pub pending: Vec<PendingUpdate>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateRequest {
    pub uaction: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateResponse {
    pub message: String,
}

type ApiError = (StatusCode, String);

fn internal_error(context: &str, e: impl std::fmt::Display) -> ApiError {
    error!("{}: {}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{}: {}", context, e))
}

/// Runs `f` with the engine locked, on the blocking thread pool.
async fn with_engine<T, F>(state: AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut UpdateEngine) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut engine = state
            .engine
            .lock()
            .map_err(|e| internal_error("Update engine unavailable", e))?;
        f(&mut *engine)
    })
    .await
    .map_err(|e| internal_error("Update task failed", e))?
}

/// GET /database-update
///
/// Reports whether updates are pending and describes each of them.
pub async fn get_update_status(
    State(state): State<AppState>,
) -> Result<Json<UpdateStatus>, ApiError> {
    let status = with_engine(state, |engine| {
        let current_revision = engine
            .current_revision()
            .map_err(|e| internal_error("Failed to read database revision", e))?;
        let available = engine
            .is_update_available()
            .map_err(|e| internal_error("Failed to check for pending updates", e))?;
        let pending = engine
            .pending_update_details()
            .map_err(|e| internal_error("Failed to list pending updates", e))?
            .into_iter()
            .map(|(revision, detail)| PendingUpdate { revision, detail })
            .collect::<Vec<_>>();

        Ok(UpdateStatus {
            available,
            current_revision,
            pending,
        })
    })
    .await?;

    Ok(Json(status))
}

/// POST /database-update
///
/// Form field `uaction=update` applies every pending update. On failure the
/// response is the failure report as an HTML fragment.
pub async fn apply_updates(
    State(state): State<AppState>,
    Form(request): Form<UpdateRequest>,
) -> Result<Response, ApiError> {
    if request.uaction.as_deref() != Some("update") {
        return Err((StatusCode::BAD_REQUEST, "Unknown action".to_string()));
    }

    with_engine(state, |engine| {
        if engine.apply_all_updates() {
            info!("{}", SUCCESS_MESSAGE);
            return Ok(Json(UpdateResponse {
                message: SUCCESS_MESSAGE.to_string(),
            })
            .into_response());
        }

        let report = engine
            .last_error()
            .map(|failure| failure.to_html())
            .unwrap_or_else(|| "Database update failed.".to_string());

        Ok((StatusCode::INTERNAL_SERVER_ERROR, Html(report)).into_response())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::migration::{InvocationMode, Registry, Statement, Step, StepContext};
    use crate::error::CpMigrateError;
    use crate::state_store::StateStore;
    use axum::{
        body::Body,
        http::{header, Request},
        routing::get,
        Router,
    };
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn broken_step(_ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
        Ok(vec![Statement::sql("INSERT INTO missing_table VALUES ('<b>')")])
    }

    fn app(steps: Vec<Step>, start: u32) -> Router {
        let db = Database::open_in_memory().unwrap();
        StateStore::set_schema_revision(db.conn(), start).unwrap();
        let engine = UpdateEngine::new(
            db,
            Registry::new(steps).unwrap(),
            InvocationMode::Interactive,
        );

        Router::new()
            .route("/database-update", get(get_update_status).post(apply_updates))
            .with_state(AppState::new(engine))
    }

    fn sample_steps() -> Vec<Step> {
        vec![
            Step::sql_only(1, "Creates the sample table.", &["CREATE TABLE sample (id INTEGER)"]),
            Step::noop(2, ""),
            Step::sql_only(3, "Seeds the sample table.", &["INSERT INTO sample VALUES (1)"]),
        ]
    }

    fn post_form(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/database-update")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_status_lists_pending_updates() {
        let app = app(sample_steps(), 1);
        let request = Request::builder()
            .uri("/database-update")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let status: UpdateStatus = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(
            status,
            UpdateStatus {
                available: true,
                current_revision: 1,
                pending: vec![
                    PendingUpdate {
                        revision: 1,
                        detail: "Creates the sample table.".to_string()
                    },
                    PendingUpdate {
                        revision: 3,
                        detail: "Seeds the sample table.".to_string()
                    },
                ],
            }
        );
    }

    #[tokio::test]
    async fn test_update_action_applies_everything() {
        let app = app(sample_steps(), 1);

        let response = app.clone().oneshot(post_form("uaction=update")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: UpdateResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.message, SUCCESS_MESSAGE);

        let request = Request::builder()
            .uri("/database-update")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status: UpdateStatus = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(!status.available);
        assert_eq!(status.current_revision, 4);
        assert!(status.pending.is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_returns_escaped_report() {
        let app = app(vec![Step::code(5, "Breaks.", broken_step)], 5);

        let response = app.oneshot(post_form("uaction=update")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_string(response).await;
        assert!(body.starts_with("Database update 5 failed."));
        assert!(body.contains("<strong>Exception message was:</strong>"));
        assert!(body.contains("no such table: missing_table"));
        assert!(body.contains("&lt;b&gt;"));
        assert!(!body.contains("'<b>'"));
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected() {
        let app = app(sample_steps(), 1);

        let response = app.clone().oneshot(post_form("uaction=reset")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(post_form("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
