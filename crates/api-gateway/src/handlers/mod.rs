//! Request handlers for API endpoints

pub mod health;
pub mod hubspot;

// Re-export commonly used handlers
pub use health::*;
pub use hubspot::*;
