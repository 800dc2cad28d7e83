//! Core domain types and traits for the face registration service.

pub mod codec;
pub mod error;
pub mod ids;
pub mod traits;
pub mod user;

pub use codec::{decode_vector, encode_vector, VECTOR_TEXT_PRECISION};
pub use error::{CoreError, CoreResult};
pub use ids::UserId;
pub use traits::IdentityStore;
pub use user::{BiometricVector, GalleryEntry, UserRecord};
