//! Message persistence.
//!
//! # Responsibility
//! - Define the storage contract the guestbook write path relies on.
//! - Keep SQL details out of grid and service code.
//!
//! # Invariants
//! - Storage rejects a second message on an already claimed origin cell and
//!   reports it as `RepoError::OriginTaken`, never as a generic DB error.
//! - Read paths reject invalid persisted rows instead of masking them.

pub mod message_repo;
