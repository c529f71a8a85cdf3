//! # Services Module
//!
//! Business logic that sits between the HTTP handlers and storage.

pub mod tasks;

pub use tasks::TaskService;
