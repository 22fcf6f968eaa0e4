//! Guestbook domain model.
//!
//! # Responsibility
//! - Define the stored message record and its grid placement.
//! - Define the guestbook payload carried opaquely by the grid core.
//!
//! # Invariants
//! - A message's placement never changes after creation.
//! - The grid core reads only the placement and the payload text length.

pub mod message;
pub mod signature;
