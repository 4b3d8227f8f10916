//! API Routes
//!
//! Route handlers organized by functionality.

pub mod dashboard;
pub mod export;
pub mod health;
pub mod players;
pub mod scores;
