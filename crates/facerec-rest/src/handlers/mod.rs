pub mod error;
pub mod face;
pub mod health; // liveness probe

pub use error::ApiError;
pub use face::{match_face, register};
pub use health::health_handler;
