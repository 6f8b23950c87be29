//! API request handlers.

pub mod agents;
pub mod health;
pub mod sessions;

pub use agents::*;
pub use health::*;
pub use sessions::*;
