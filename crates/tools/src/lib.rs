//! Somfy Tools library

pub mod commands;
pub mod profile;
pub mod transport;

pub use profile::{Profile, ProfileStore};
pub use transport::Bridge;
