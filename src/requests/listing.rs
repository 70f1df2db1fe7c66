use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rusqlite::Connection;

use crate::accounts::profile::user_public_by_id;
use crate::requests::{map_request_row, RequestView};
use crate::state::AppState;

/// Which side of the request the caller is on, and therefore which
/// counterpart profile gets embedded in the listing.
enum Side {
    Worker,
    User,
}

fn list_requests(
    conn: &Connection,
    side: Side,
    party_id: &str,
) -> Result<Vec<RequestView>, (StatusCode, String)> {
    let sql = match side {
        Side::Worker => {
            "SELECT id, user_id, worker_id, description, location, status, created_at
             FROM requests WHERE worker_id = ?1 ORDER BY created_at DESC"
        }
        Side::User => {
            "SELECT id, user_id, worker_id, description, location, status, created_at
             FROM requests WHERE user_id = ?1 ORDER BY created_at DESC"
        }
    };

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query requests: {}", e)))?;

    let rows: Vec<_> = stmt
        .query_map([party_id], map_request_row)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query requests: {}", e)))?
        .filter_map(|r| r.ok())
        .collect();

    // Embed the counterpart's public profile per row. Fine at this scale;
    // listings are bounded by one party's request history.
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let counterpart_id = match side {
            Side::Worker => row.user_id.clone(),
            Side::User => row.worker_id.clone(),
        };
        let profile = user_public_by_id(conn, &counterpart_id)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query profile: {}", e)))?;

        let mut view = RequestView::from_row(row);
        match side {
            Side::Worker => view.user = profile,
            Side::User => view.worker = profile,
        }
        views.push(view);
    }

    Ok(views)
}

/// GET /api/requests/worker/{workerId} — Requests targeting a worker,
/// newest first, with each requester's public profile embedded.
pub async fn list_for_worker(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> Result<Json<Vec<RequestView>>, (StatusCode, String)> {
    let db = state.db.clone();

    let views = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;
        list_requests(&conn, Side::Worker, &worker_id)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    Ok(Json(views))
}

/// GET /api/requests/user/{userId} — Requests created by a user,
/// newest first, with each worker's public profile embedded.
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<RequestView>>, (StatusCode, String)> {
    let db = state.db.clone();

    let views = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;
        list_requests(&conn, Side::User, &user_id)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    Ok(Json(views))
}
