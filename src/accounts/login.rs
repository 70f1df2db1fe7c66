use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user_id: String,
    pub role: String,
    pub name: String,
}

/// POST /api/login
/// Exact email/password match against the stored record.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let db = state.db.clone();

    let found = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;

        let found: Option<(String, String, String)> = conn
            .query_row(
                "SELECT id, role, name FROM users WHERE email = ?1 AND password = ?2",
                rusqlite::params![req.email.trim(), req.password],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .ok();

        Ok::<_, (StatusCode, String)>(found)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    let (user_id, role, name) = found.ok_or((
        StatusCode::UNAUTHORIZED,
        "Invalid credentials".to_string(),
    ))?;

    tracing::info!(user_id = %user_id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user_id,
        role,
        name,
    }))
}
