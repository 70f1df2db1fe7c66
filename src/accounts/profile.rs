use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rusqlite::Connection;
use serde::Serialize;

use crate::state::AppState;

/// Public subset of a user record: everything except the password.
/// Embedded in request payloads so each party sees who the other side is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub skills: Vec<String>,
    pub created_at: String,
}

/// Fetch a user's public profile by id. Returns None if the user does not exist.
pub fn user_public_by_id(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<UserPublic>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, role, phone, address, skills, created_at
         FROM users WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map([user_id], map_user_public)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

fn map_user_public(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserPublic> {
    let skills_json: String = row.get(6)?;
    Ok(UserPublic {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        skills: serde_json::from_str(&skills_json).unwrap_or_default(),
        created_at: row.get(7)?,
    })
}

/// GET /api/workers — List all registered workers, public fields only.
pub async fn list_workers(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserPublic>>, (StatusCode, String)> {
    let db = state.db.clone();

    let workers = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, name, email, role, phone, address, skills, created_at
                 FROM users WHERE role = 'worker' ORDER BY created_at ASC",
            )
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query workers: {}", e)))?;

        let workers: Vec<UserPublic> = stmt
            .query_map([], map_user_public)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query workers: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok::<_, (StatusCode, String)>(workers)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    Ok(Json(workers))
}

/// GET /api/user/{id} — Public profile for a single user.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserPublic>, (StatusCode, String)> {
    let db = state.db.clone();

    let user = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;
        user_public_by_id(&conn, &user_id)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query user: {}", e)))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err((StatusCode::NOT_FOUND, "User not found".to_string())),
    }
}
