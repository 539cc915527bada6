//! # Opinet Core
//!
//! Opinion dynamics on an adaptive social network, optionally coupled to
//! competing media outlets and to generational turnover.
//!
//! This crate contains the deterministic simulation logic:
//! - Bounded-confidence opinion and tolerance updates
//! - User revision with tie erosion and rewiring
//! - Media competition and user-media interaction
//! - Ageing with degree-preserving rebirth
//! - Structure analysis (clusters, communities, betweenness)
//!
//! All randomness flows through one caller-provided generator, so a seeded
//! `ChaCha8Rng` reproduces a run exactly.
//!
//! ## Example
//!
//! ```
//! use opinet_core::network::UserNetwork;
//! use opinet_core::systems::revision::UserRevision;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut nw = UserNetwork::with_vertices(3);
//! nw.add_edge(0, 1, 0.5);
//! nw.add_edge(0, 2, 0.5);
//!
//! let mut revision = UserRevision::new(0.5, 0.2, 0.0);
//! for _ in 0..10 {
//!     revision.revise(&mut nw, false, &mut rng);
//! }
//! assert!((nw.out_weight_sum(0) - 1.0).abs() < 1e-9);
//! ```

/// Opinion clusters, communities, reciprocity and betweenness
pub mod analysis;
/// Initial network topologies
pub mod builder;
/// Configuration management for model parameters
pub mod config;
/// Error types
pub mod error;
/// Initial vertex and edge properties
pub mod init;
/// Run statistics and logging setup
pub mod metrics;
/// Graph stores for users and media
pub mod network;
/// Output records and sinks
pub mod snapshot;
/// Per-step processes (user revision, media, ageing)
pub mod systems;
/// Opinion and tolerance update rules
pub mod update;
/// Random draws and property distributions
pub mod utils;

pub use config::{Mode, OpDynConfig};
pub use error::{ModelError, Result};
pub use metrics::{init_logging, RunStats};
pub use network::{MediaNetwork, UserNetwork, WeightNorm};
