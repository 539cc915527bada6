//! Vertex records of the two networks.

pub mod medium;
pub mod user;
