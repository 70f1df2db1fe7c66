use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterApiRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// "user" or "worker"
    pub role: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Skill tags; only kept for worker accounts
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterApiResponse {
    pub message: String,
    pub user_id: String,
    pub role: String,
}

/// POST /api/register
/// Create a new account. Email is the uniqueness key; workers additionally
/// carry a list of skills shown in discovery.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterApiRequest>,
) -> Result<(StatusCode, Json<RegisterApiResponse>), (StatusCode, String)> {
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name cannot be empty".to_string()));
    }
    if req.email.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Email cannot be empty".to_string()));
    }
    if req.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Password cannot be empty".to_string(),
        ));
    }

    let role = Role::from_str(&req.role)
        .ok_or((StatusCode::BAD_REQUEST, "Invalid role".to_string()))?;

    let db = state.db.clone();
    let result = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;

        // Check email uniqueness
        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                [req.email.trim()],
                |row| row.get(0),
            )
            .ok();
        if existing.is_some() {
            return Err((StatusCode::BAD_REQUEST, "User already exists".to_string()));
        }

        let user_id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();

        // Skills only apply to worker accounts
        let skills = match role {
            Role::Worker => req.skills.clone(),
            Role::User => Vec::new(),
        };
        let skills_json = serde_json::to_string(&skills)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Encode skills: {}", e)))?;

        // Credentials are stored verbatim (legacy API contract)
        conn.execute(
            "INSERT INTO users (id, name, email, password, role, phone, address, skills, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                user_id,
                req.name.trim(),
                req.email.trim(),
                req.password,
                role.as_str(),
                req.phone,
                req.address,
                skills_json,
                now
            ],
        )
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert user: {}", e)))?;

        Ok((user_id, role))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    let (user_id, role) = result;
    tracing::info!(user_id = %user_id, role = role.as_str(), "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterApiResponse {
            message: "User registered successfully".to_string(),
            user_id,
            role: role.as_str().to_string(),
        }),
    ))
}
