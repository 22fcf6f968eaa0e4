//! Guestbook use-case services.
//!
//! # Responsibility
//! - Orchestrate grid snapshots and repository writes into use-case APIs.
//! - Keep CLI and other outer layers decoupled from storage details.

pub mod guestbook_service;
