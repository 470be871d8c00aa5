//! Services Layer
//!
//! This module contains pure business logic extracted from HTTP handlers.

pub mod borrow_service;

// Re-export for convenience
pub use borrow_service::{Availability, BookAvailability, BookLocks, BorrowedBookRow};
