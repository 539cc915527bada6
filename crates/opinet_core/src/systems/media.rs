//! Media competition and user-media interaction.

use rand::Rng;

use crate::network::{MediaNetwork, UserNetwork};
use crate::systems::revision::roulette_select;
use crate::update;
use crate::utils::{rand_int, rand_prob};

/// Per-revision decay of advertising impact.
pub const AD_DECAY: f64 = 0.9;

/// Outcome of one media revision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaRevisionReport {
    pub medium: usize,
    /// More popular competitor the medium moved towards, if any.
    pub followed: Option<usize>,
}

/// Outcome of one information revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InformationReport {
    pub user: usize,
    pub candidate: usize,
    pub switched: bool,
}

/// Lets a random medium chase its most popular competitor within its
/// tolerance and resets its advertising budget to its audience size.
pub fn media_revision<R: Rng>(media: &mut MediaNetwork, rng: &mut R) -> Option<MediaRevisionReport> {
    if media.is_empty() {
        return None;
    }
    let v = media.random_vertex(rng);
    media.medium_mut(v).ads *= AD_DECAY;

    let me = *media.medium(v);
    let mut fittest = v;
    let mut found = false;
    for w in media.neighbors(v) {
        let other = media.medium(w);
        if (me.opinion - other.opinion).abs() <= me.tolerance
            && other.users > media.medium(fittest).users
        {
            fittest = w;
            found = true;
        }
    }

    if found {
        let target = media.medium(fittest).opinion;
        let step = me.tolerance / 3.0;
        let opinion = if (me.opinion - target).abs() > step {
            let attraction = media.attraction(v, fittest).unwrap_or_default();
            me.opinion + me.susceptibility * attraction * (target - me.opinion)
        } else {
            // Too close to the competitor: keep a distance of a third of
            // the tolerance on the side the medium came from.
            let above = if me.opinion == target {
                rand_int(0, 2, rng) == 1
            } else {
                me.opinion > target
            };
            if above {
                target + step
            } else {
                target - step
            }
        };
        media.medium_mut(v).opinion = opinion;
    }

    let medium = media.medium_mut(v);
    medium.opinion = medium.opinion.clamp(0.0, 1.0);
    medium.ads = f64::from(medium.users);
    media.normalize_ads();
    let medium = media.medium_mut(v);
    medium.users_previous = medium.users;

    Some(MediaRevisionReport {
        medium: v,
        followed: found.then_some(fittest),
    })
}

/// Lets a random user sample a medium by advertising share and possibly
/// switch to it.
pub fn information_revision<R: Rng>(
    users: &mut UserNetwork,
    media: &mut MediaNetwork,
    radicalisation: f64,
    periodic: bool,
    rng: &mut R,
) -> Option<InformationReport> {
    if users.is_empty() || media.is_empty() {
        return None;
    }
    let v = users.random_vertex(rng);

    let draw = rand_prob(rng);
    let candidate = roulette_select(media.media().map(|m| m.ads_normalized), draw).unwrap_or(0);

    let user = *users.user(v);
    let (probability, within) = affordability(
        user.opinion,
        media.medium(candidate).opinion,
        user.tolerance,
        periodic,
    );

    if rand_prob(rng) > probability {
        return Some(InformationReport {
            user: v,
            candidate,
            switched: false,
        });
    }

    let medium = *media.medium(candidate);
    let actor = users.user_mut(v);
    let previous = actor.opinion;
    if within {
        update::opinion_from_medium(actor, &medium);
    }
    update::tolerance(actor, previous, radicalisation);

    if let Some(old) = actor.used_media.replace(candidate) {
        let old = media.medium_mut(old);
        old.users = old.users.saturating_sub(1);
    }
    media.medium_mut(candidate).users += 1;

    Some(InformationReport {
        user: v,
        candidate,
        switched: true,
    })
}

/// Bounded-confidence affordability of a medium: `(1, true)` when its
/// opinion is within the user's tolerance, `(0, false)` otherwise.
pub fn affordability(own: f64, offered: f64, tolerance: f64, periodic: bool) -> (f64, bool) {
    let distance = if periodic {
        distance_periodic(offered, own)
    } else {
        (offered - own).abs()
    };
    if distance <= tolerance {
        (1.0, true)
    } else {
        (0.0, false)
    }
}

/// Distance of two opinions on the unit circle.
pub fn distance_periodic(x: f64, y: f64) -> f64 {
    let d = x - y;
    let wrap = if d < -0.5 {
        -1.0
    } else if d > 0.5 {
        1.0
    } else {
        0.0
    };
    (d - wrap).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opinet_data::{Medium, User};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn complete_media(opinions: &[f64], users: &[u32]) -> MediaNetwork {
        let mut media = MediaNetwork::with_vertices(opinions.len());
        for (i, (&op, &u)) in opinions.iter().zip(users).enumerate() {
            let m = media.medium_mut(i);
            *m = Medium::new(op, 0.3, 0.5, 1.0);
            m.users = u;
            m.users_previous = u;
            m.ads = f64::from(u);
        }
        for a in 0..opinions.len() {
            for b in (a + 1)..opinions.len() {
                media.add_edge(a, b, 1.0);
            }
        }
        media.normalize_ads();
        media
    }

    #[test]
    fn test_distance_periodic() {
        assert!((distance_periodic(0.95, 0.05) - 0.1).abs() < 1e-12);
        assert!((distance_periodic(0.05, 0.95) - 0.1).abs() < 1e-12);
        assert!((distance_periodic(0.3, 0.6) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_affordability() {
        assert_eq!(affordability(0.5, 0.6, 0.2, false), (1.0, true));
        assert_eq!(affordability(0.05, 0.95, 0.2, false), (0.0, false));
        assert_eq!(affordability(0.05, 0.95, 0.2, true), (1.0, true));
    }

    #[test]
    fn test_media_revision_keeps_ad_shares_normalized() {
        let mut media = complete_media(&[0.2, 0.4, 0.9], &[10, 30, 5]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..100 {
            let report = media_revision(&mut media, &mut rng).unwrap();
            let sum: f64 = media.media().map(|m| m.ads_normalized).sum();
            assert!((sum - 1.0).abs() < 1e-9);
            let m = media.medium(report.medium);
            assert!((0.0..=1.0).contains(&m.opinion));
            assert_eq!(m.users_previous, m.users);
            assert_eq!(m.ads, f64::from(m.users));
        }
    }

    #[test]
    fn test_media_follow_more_popular_competitor() {
        // Medium 0 is far enough from medium 1 to move continuously.
        let mut media = MediaNetwork::with_vertices(2);
        *media.medium_mut(0) = Medium::new(0.2, 0.3, 0.5, 1.0);
        *media.medium_mut(1) = Medium::new(0.4, 0.3, 0.5, 1.0);
        media.medium_mut(1).users = 10;
        media.add_edge(0, 1, 0.8);

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut moved = false;
        for _ in 0..50 {
            let report = media_revision(&mut media, &mut rng).unwrap();
            if report.medium == 0 {
                assert_eq!(report.followed, Some(1));
                moved = true;
                break;
            }
        }
        assert!(moved);
        assert!((media.medium(0).opinion - 0.28).abs() < 1e-12);
    }

    #[test]
    fn test_information_revision_keeps_audience_counts() {
        let mut media = complete_media(&[0.2, 0.5, 0.8], &[0, 0, 0]);
        let mut users = UserNetwork::with_vertices(20);
        for v in 0..20 {
            let mut user = User::new(v as f64 / 19.0, 0.3, 0.4, 20);
            user.used_media = Some(v % 3);
            *users.user_mut(v) = user;
            media.medium_mut(v % 3).users += 1;
            media.medium_mut(v % 3).ads += 1.0;
        }
        media.normalize_ads();

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..300 {
            information_revision(&mut users, &mut media, 0.5, false, &mut rng).unwrap();
        }
        for m in 0..3 {
            let count = users.users().filter(|u| u.used_media == Some(m)).count();
            assert_eq!(media.medium(m).users as usize, count);
        }
        assert_eq!(media.total_users(), 20);
    }
}
