//! Response models shared with the UI layer
//!
//! Every network- or cache-facing operation of the API client produces one of
//! these values instead of returning an error.

pub mod response;

// Re-export commonly used types
pub use response::{ApiResponse, ApiStats, ConnectionReport};
