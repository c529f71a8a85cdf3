// # Routes Module
//
// - This module contains all HTTP route handlers for the Todo server.
// - Routes are organized by functionality into separate submodules.
//
//  ## Available Route Modules
// - `health`: Health check and monitoring endpoints
// - `auth`: Registration, login, logout and current user
// - `tasks`: Per-user task CRUD
//
// - ## Adding New Routes
// - 1. Create a new file in the `routes/` directory
// - 2. Add the module declaration here with `pub mod module_name;`
// - 3. Register the routes in `server.rs` using the Router

/// Health check and monitoring endpoints
pub mod health;

/// Registration, login and session endpoints
pub mod auth;

/// Task CRUD endpoints
pub mod tasks;

/// Shared request extractors
pub mod extract;
