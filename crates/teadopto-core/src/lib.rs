//! Core library for the TeAdopto pet-adoption client.
//!
//! Wraps the backend's REST API, persists the login session and exposes
//! typed resource operations for pets, shelters, adoption requests and users.

pub mod api;
pub mod config;
pub mod media;
pub mod resources;
pub mod session;
pub mod storage;
