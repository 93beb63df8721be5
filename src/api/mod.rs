//! API Lambda handler and request processing

pub mod handler;
pub mod helpers;
pub mod parsing;

// Re-export the main types for convenience
pub use handler::UsersHandler;
pub use helpers::Envelope;
