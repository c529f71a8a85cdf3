//! # Todo Server
//!
//! A per-user to-do list API built with Axum and Tokio.
//!
//! ## Architecture
//! - `auth`: password hashing, JWT issuance/validation, the credential
//!   authority and the authentication middleware
//! - `services`: task operations scoped to the authenticated user
//! - `database`: the `Storage` trait with Postgres and in-memory backends
//! - `routes`: HTTP handlers, kept purely structural
//! - `validation`: request payload checks run before any of the above
//! - `config`: environment configuration, passed explicitly at startup

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod server;
pub mod services;
pub mod validation;

pub use config::Config;
pub use error::AppError;
pub use server::{AppState, build_router};
