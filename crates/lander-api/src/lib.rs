//! Lander API
//!
//! HTTP surface over the landing-page services: the authenticated admin API
//! under `/api/v0`, public site delivery under `/lp`, and health checks.

pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
