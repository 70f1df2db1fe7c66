use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::accounts::profile::user_public_by_id;
use crate::db::models::RequestStatus;
use crate::presence::events::EventKind;
use crate::requests::{request_by_id, RequestView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub message: String,
    pub request: RequestView,
}

/// PATCH /api/requests/{id}
/// Move a request to a new status (accepted/rejected/completed), then push
/// a requestStatusUpdate event to the requester if they are online. The
/// pushed record carries the worker's public profile so the requester sees
/// who answered.
pub async fn update_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<UpdateStatusResponse>, (StatusCode, String)> {
    let status = RequestStatus::from_str(&body.status)
        .ok_or((StatusCode::BAD_REQUEST, "Invalid status".to_string()))?;

    let db = state.db.clone();
    let view = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;

        let updated = conn
            .execute(
                "UPDATE requests SET status = ?1 WHERE id = ?2",
                rusqlite::params![status.as_str(), request_id],
            )
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update request: {}", e)))?;
        if updated == 0 {
            return Err((StatusCode::NOT_FOUND, "Request not found".to_string()));
        }

        let row = request_by_id(&conn, &request_id)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query request: {}", e)))?
            .ok_or((StatusCode::NOT_FOUND, "Request not found".to_string()))?;

        // Requester-facing view: the updated record plus who answered
        let worker = user_public_by_id(&conn, &row.worker_id)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query worker: {}", e)))?;

        let mut view = RequestView::from_row(row);
        view.worker = worker;
        Ok::<_, (StatusCode, String)>(view)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    // Fire-and-forget push to the requester; dropped if offline
    if let Ok(payload) = serde_json::to_value(&view) {
        state.registry.deliver(&view.user_id, EventKind::StatusUpdate, payload);
    }

    tracing::info!(
        request_id = %view.id,
        status = %view.status,
        "Work request status updated"
    );

    Ok(Json(UpdateStatusResponse {
        message: "Request updated successfully".to_string(),
        request: view,
    }))
}
