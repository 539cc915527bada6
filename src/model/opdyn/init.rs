use crate::model::builder::NetworkBuilder;
use crate::model::config::OpDynConfig;
use crate::model::network::{MediaNetwork, UserNetwork};
use crate::model::opdyn::OpDyn;
use crate::model::systems::ageing::AgeingEngine;
use crate::model::systems::revision::UserRevision;
use anyhow::Context;
use opinet_core::init::{initialize_media, initialize_users};
use opinet_core::RunStats;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

impl OpDyn {
    /// Validates `config`, builds both networks and draws the initial
    /// properties. A configured seed makes the whole run reproducible.
    pub fn new(config: OpDynConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut rng = if let Some(seed) = config.seed {
            ChaCha8Rng::seed_from_u64(seed)
        } else {
            ChaCha8Rng::from_entropy()
        };

        let users = NetworkBuilder::users(&config.users.network, &mut rng)
            .context("Failed to build the user network")?;
        let media = if config.mode().has_media() {
            Some(
                NetworkBuilder::media(&config.media.network, &mut rng)
                    .context("Failed to build the media network")?,
            )
        } else {
            None
        };

        Self::with_networks(config, users, media, rng)
    }

    /// Starts a model on prepared topologies. Vertex properties and tie
    /// weights are (re)drawn from `config`.
    pub fn with_networks(
        config: OpDynConfig,
        mut users: UserNetwork,
        mut media: Option<MediaNetwork>,
        mut rng: ChaCha8Rng,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let mode = config.mode();
        if mode.has_media() != media.is_some() {
            anyhow::bail!("Media network must be given exactly when the media mode is enabled");
        }

        if let Some(media) = media.as_mut() {
            initialize_media(media, &config, &mut rng)
                .context("Failed to initialise the media network")?;
        }
        initialize_users(&mut users, media.as_mut(), &config, &mut rng);

        let ageing = if mode.has_ageing() {
            let curve = config
                .susceptibility_curve()
                .context("User ageing needs an age-dependent susceptibility")?;
            Some(AgeingEngine::new(
                config.parameters.replacement_rate,
                config.age_groups,
                curve,
            ))
        } else {
            None
        };

        tracing::info!(
            ?mode,
            users = users.len(),
            edges = users.edge_count(),
            media = media.as_ref().map_or(0, MediaNetwork::len),
            fingerprint = %config.fingerprint(),
            "Model initialised"
        );

        Ok(Self {
            mode,
            time: 0,
            revision: UserRevision::from_config(&config.parameters),
            users,
            media,
            ageing,
            rng,
            stats: RunStats::new(),
            span: tracing::info_span!("opdyn", ?mode),
            config,
        })
    }
}
