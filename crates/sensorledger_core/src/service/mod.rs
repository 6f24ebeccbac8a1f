//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, alert rules and world-state calls into
//!   use-case level APIs.
//! - Keep CLI and other callers decoupled from storage details.

pub mod data_point_service;
