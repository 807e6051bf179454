//! # UpTask API Server Library
//!
//! HTTP API for UpTask: accounts with email confirmation, and projects with
//! tasks, teams and notes.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Request context and body validation extractors
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
