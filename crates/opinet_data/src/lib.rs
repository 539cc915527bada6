//! Plain data records shared by the opinet crates.
//!
//! Vertex payloads of the user and media networks live here so that the
//! simulation core, the binary and the tools crate agree on one layout.

pub mod data;

pub use data::medium::Medium;
pub use data::user::User;

/// Index of a medium inside the media network.
pub type MediumId = usize;
