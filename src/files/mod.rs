//! File Storage
//!
//! Local-disk storage for uploaded files (currently avatars only), served
//! back as static content.

/// Avatar image storage
pub mod avatars;

pub use avatars::{AvatarStore, AVATAR_URL_PREFIX};
