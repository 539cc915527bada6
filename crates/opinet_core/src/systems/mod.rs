//! Per-step processes acting on the networks.

pub mod ageing;
pub mod media;
pub mod revision;
