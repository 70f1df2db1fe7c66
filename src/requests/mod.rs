pub mod create;
pub mod listing;
pub mod status;

use rusqlite::Connection;
use serde::Serialize;

use crate::accounts::profile::UserPublic;
use crate::db::models::WorkRequest;

/// Request record as served over the API and pushed over WebSocket,
/// optionally enriched with the public profile of one or both parties.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: String,
    pub user_id: String,
    pub worker_id: String,
    pub description: String,
    pub location: Option<String>,
    pub status: String,
    pub created_at: String,
    /// Requester profile, populated for the worker-facing direction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserPublic>,
    /// Worker profile, populated for the requester-facing direction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<UserPublic>,
}

impl RequestView {
    pub fn from_row(row: WorkRequest) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            worker_id: row.worker_id,
            description: row.description,
            location: row.location,
            status: row.status,
            created_at: row.created_at,
            user: None,
            worker: None,
        }
    }
}

/// Fetch a single request row by id.
pub fn request_by_id(conn: &Connection, request_id: &str) -> rusqlite::Result<Option<WorkRequest>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, worker_id, description, location, status, created_at
         FROM requests WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map([request_id], map_request_row)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub(crate) fn map_request_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkRequest> {
    Ok(WorkRequest {
        id: row.get(0)?,
        user_id: row.get(1)?,
        worker_id: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}
