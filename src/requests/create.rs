use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::profile::user_public_by_id;
use crate::db::models::RequestStatus;
use crate::presence::events::EventKind;
use crate::requests::RequestView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub user_id: String,
    pub worker_id: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateRequestResponse {
    pub message: String,
    pub request: RequestView,
}

/// POST /api/requests
/// Create a pending work request from a user to a worker, then push a
/// newRequest event to the worker if they are online. The HTTP response
/// does not depend on delivery: the record is durable either way.
pub async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<CreateRequestResponse>), (StatusCode, String)> {
    if body.description.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Description cannot be empty".to_string(),
        ));
    }

    let db = state.db.clone();
    let view = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;

        // Both parties must exist before the request is recorded
        let requester = user_public_by_id(&conn, &body.user_id)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query user: {}", e)))?
            .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
        let worker_exists = user_public_by_id(&conn, &body.worker_id)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query worker: {}", e)))?
            .is_some();
        if !worker_exists {
            return Err((StatusCode::NOT_FOUND, "Worker not found".to_string()));
        }

        let request_id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO requests (id, user_id, worker_id, description, location, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                request_id,
                body.user_id,
                body.worker_id,
                body.description.trim(),
                body.location,
                RequestStatus::Pending.as_str(),
                now
            ],
        )
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert request: {}", e)))?;

        // Worker-facing view: the created record plus who is asking
        let view = RequestView {
            id: request_id,
            user_id: body.user_id,
            worker_id: body.worker_id,
            description: body.description.trim().to_string(),
            location: body.location,
            status: RequestStatus::Pending.as_str().to_string(),
            created_at: now,
            user: Some(requester),
            worker: None,
        };

        Ok::<_, (StatusCode, String)>(view)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    // Fire-and-forget push to the target worker; dropped if offline
    if let Ok(payload) = serde_json::to_value(&view) {
        state.registry.deliver(&view.worker_id, EventKind::NewRequest, payload);
    }

    tracing::info!(
        request_id = %view.id,
        user_id = %view.user_id,
        worker_id = %view.worker_id,
        "Work request created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateRequestResponse {
            message: "Request sent successfully".to_string(),
            request: view,
        }),
    ))
}
