//! Common code shared between `waste_server` and its upload client.
pub mod decision;
pub mod protocol;

/// Error type.
pub type Error = Box<dyn std::error::Error>;
