//! Worklink marketplace server library.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod accounts;
pub mod config;
pub mod db;
pub mod presence;
pub mod requests;
pub mod routes;
pub mod state;
pub mod ws;
