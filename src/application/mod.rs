// Application layer - use cases and orchestration around the comparison
// engine in `domain`.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
