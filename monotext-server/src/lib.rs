//! Monotext server: a small posting service with comments, likes, search
//! and per-user profile pages.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod middleware;
pub mod pagination;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod state;
pub mod validation;
