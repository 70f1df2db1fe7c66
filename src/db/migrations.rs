use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Uses SQLite user_version pragma for tracking — no migration table needed.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "-- Migration 1: Initial schema

CREATE TABLE users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('user', 'worker')),
    phone TEXT,
    address TEXT,
    skills TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE INDEX idx_users_role ON users(role);

CREATE TABLE requests (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    worker_id TEXT NOT NULL,
    description TEXT NOT NULL,
    location TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'accepted', 'rejected', 'completed')),
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id),
    FOREIGN KEY (worker_id) REFERENCES users(id)
);

CREATE INDEX idx_requests_user ON requests(user_id, created_at);
CREATE INDEX idx_requests_worker ON requests(worker_id, created_at);
",
    )])
}
