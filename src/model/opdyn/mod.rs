use crate::model::config::{Mode, OpDynConfig};
use crate::model::network::{MediaNetwork, UserNetwork};
use crate::model::systems::ageing::AgeingEngine;
use crate::model::systems::revision::UserRevision;
use opinet_core::RunStats;
use rand_chacha::ChaCha8Rng;

pub mod init;
pub mod update;

/// The coupled opinion dynamics model: a directed user network, an optional
/// media network and the processes acting on them.
pub struct OpDyn {
    pub config: OpDynConfig,
    pub mode: Mode,
    pub time: u64,
    pub users: UserNetwork,
    pub media: Option<MediaNetwork>,
    pub revision: UserRevision,
    /// Present only when user ageing is enabled.
    pub ageing: Option<AgeingEngine>,
    pub rng: ChaCha8Rng,
    pub stats: RunStats,
    span: tracing::Span,
}

impl OpDyn {
    pub fn rewiring_count(&self) -> u64 {
        self.revision.rewiring_count()
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_media(&self) -> usize {
        self.media.as_ref().map_or(0, MediaNetwork::len)
    }

    /// Mean opinion over all users, `0.0` for an empty network.
    pub fn mean_opinion(&self) -> f64 {
        if self.users.is_empty() {
            return 0.0;
        }
        self.users.users().map(|u| u.opinion).sum::<f64>() / self.users.len() as f64
    }
}

impl std::fmt::Debug for OpDyn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpDyn")
            .field("mode", &self.mode)
            .field("time", &self.time)
            .field("users", &self.users.len())
            .field("edges", &self.users.edge_count())
            .field("media", &self.num_media())
            .finish()
    }
}
