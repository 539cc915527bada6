//! Initial vertex and edge properties.
//!
//! Media are initialised before users so that their audience counters start
//! from zero when the users pick their outlets.

use rand::Rng;

use crate::config::OpDynConfig;
use crate::error::{ModelError, Result};
use crate::network::{MediaNetwork, UserNetwork};
use crate::utils::{rand_int, uniform_in, Distribution};

/// Upper bound (exclusive) of the initial user ages.
pub const MAX_INITIAL_AGE: usize = 85;

fn media_distribution<'a>(dist: Option<&'a Distribution>, name: &str) -> Result<&'a Distribution> {
    dist.ok_or_else(|| {
        ModelError::invalid_config(format!("{name} must be configured when media are enabled"))
    })
}

/// Draws every medium's stance and the mutual attractions.
pub fn initialize_media<R: Rng>(
    media: &mut MediaNetwork,
    config: &OpDynConfig,
    rng: &mut R,
) -> Result<()> {
    let opinion = media_distribution(config.opinion.media.as_ref(), "opinion.media")?;
    let tolerance = media_distribution(config.tolerance.media.as_ref(), "tolerance.media")?;
    let susceptibility =
        media_distribution(config.susceptibility.media.as_ref(), "susceptibility.media")?;
    let persuasiveness = &config.persuasiveness.media;
    let params = &config.parameters;

    for medium in media.media_mut() {
        medium.opinion = opinion.sample(None, rng);
        medium.tolerance = tolerance.sample(None, rng);
        medium.susceptibility = susceptibility.sample(None, rng);
        medium.persuasiveness = persuasiveness.sample(None, rng);
        medium.users = 0;
        medium.users_previous = 0;
        medium.ads = uniform_in(params.init_ads, rng);
    }
    for attraction in media.attractions_mut() {
        *attraction = uniform_in(params.attr, rng);
    }
    Ok(())
}

/// Draws every user's age and stance, assigns outlets when media are given
/// and spreads each user's attention evenly over its ties.
pub fn initialize_users<R: Rng>(
    users: &mut UserNetwork,
    mut media: Option<&mut MediaNetwork>,
    config: &OpDynConfig,
    rng: &mut R,
) {
    for v in 0..users.len() {
        let age = rand_int(1, MAX_INITIAL_AGE, rng) as u32;
        let user = users.user_mut(v);
        user.age = age;
        user.opinion = config.opinion.users.sample(Some(age), rng);
        user.tolerance = config.tolerance.users.sample(Some(age), rng);
        user.susceptibility = config.susceptibility.users.sample(Some(age), rng);
        user.used_media = None;

        if let Some(media) = media.as_deref_mut().filter(|m| !m.is_empty()) {
            let m = rand_int(0, media.len(), rng);
            user.used_media = Some(m);
            let medium = media.medium_mut(m);
            medium.users += 1;
            medium.ads += 1.0;
        }

        let out = users.out_degree(v);
        for w in users.out_neighbors(v) {
            users.set_weight(v, w, 1.0 / out as f64);
        }
    }

    if let Some(media) = media {
        media.normalize_ads();
        for medium in media.media_mut() {
            medium.users_previous = medium.users;
        }
    }
}
