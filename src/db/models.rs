//! Database row types and domain enums for the SQLite schema
//! defined in migrations.rs.

/// Account role: clients post work requests, workers receive them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Worker,
}

impl Role {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "worker" => Some(Self::Worker),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Worker => "worker",
        }
    }
}

/// Work request lifecycle status.
/// pending -> accepted | rejected -> completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }
}

/// Work request record in the requests table
#[derive(Debug, Clone)]
pub struct WorkRequest {
    pub id: String,
    pub user_id: String,
    pub worker_id: String,
    pub description: String,
    pub location: Option<String>,
    pub status: String,
    pub created_at: String,
}
