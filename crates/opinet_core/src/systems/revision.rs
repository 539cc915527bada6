//! User revision: one user-user interaction with tie adaptation.

use rand::Rng;

use crate::config::ParametersConfig;
use crate::network::{UserNetwork, WeightNorm};
use crate::update;
use crate::utils::rand_prob;

/// Surviving mass below which new ties get an equal share instead.
const MASS_PRECISION: f64 = 1e-4;

/// What a single revision did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevisionReport {
    pub vertex: usize,
    /// `None` when the roulette draw was not crossed.
    pub partner: Option<usize>,
    pub rewired: usize,
    pub norm: WeightNorm,
}

/// Parameters and accumulated state of the user revision.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRevision {
    pub weighting: f64,
    pub rewiring: f64,
    pub radicalisation: f64,
    rewiring_count: u64,
}

impl UserRevision {
    pub fn new(weighting: f64, rewiring: f64, radicalisation: f64) -> Self {
        Self {
            weighting,
            rewiring,
            radicalisation,
            rewiring_count: 0,
        }
    }

    pub fn from_config(params: &ParametersConfig) -> Self {
        Self::new(
            params.weighting,
            params.rewiring,
            params.radicalisation_parameter,
        )
    }

    /// Total number of ties added by rewiring so far.
    pub fn rewiring_count(&self) -> u64 {
        self.rewiring_count
    }

    /// Picks a random user and lets it interact. Sinks do nothing and yield
    /// `None`. In the age-coupled pass tie weights also reward similar ages.
    pub fn revise<R: Rng>(
        &mut self,
        nw: &mut UserNetwork,
        age_coupled: bool,
        rng: &mut R,
    ) -> Option<RevisionReport> {
        if nw.is_empty() {
            return None;
        }
        let v = nw.random_vertex(rng);
        if nw.out_degree(v) == 0 {
            return None;
        }

        let partner = pairwise_update(v, nw, self.radicalisation, rng);
        let rewired = self.update_weights(v, nw, age_coupled, rng);
        self.rewiring_count += rewired as u64;
        let norm = nw.normalize_weights(v);

        Some(RevisionReport {
            vertex: v,
            partner,
            rewired,
            norm,
        })
    }

    /// Erodes every outgoing tie of `v` by opinion distance and replaces
    /// some of the ties outside the confidence bound. Returns the number of
    /// ties added.
    pub fn update_weights<R: Rng>(
        &self,
        v: usize,
        nw: &mut UserNetwork,
        age_coupled: bool,
        rng: &mut R,
    ) -> usize {
        let source = *nw.user(v);
        let mut to_drop = Vec::new();
        let mut mass = 0.0;

        for (w, weight) in nw.out_edges(v) {
            let target = *nw.user(w);
            let gap = (target.opinion - source.opinion).abs();

            if gap > source.tolerance && rand_prob(rng) < self.rewiring {
                to_drop.push(w);
            }

            let mut factor = 1.0 - self.weighting * gap;
            if age_coupled {
                factor += age_affinity(source.age, target.age);
            }
            let eroded = (weight * factor).max(0.0);
            nw.set_weight(v, w, eroded);
            mass += eroded;
        }

        let mut to_add: Vec<usize> = Vec::new();
        for &dropped in &to_drop {
            let mut w = match nw.random_neighbor(v, rng) {
                Some(w) => w,
                None => nw.random_vertex(rng),
            };
            if to_drop.contains(&w) {
                w = nw.random_vertex(rng);
            } else {
                if let Some(next) = nw.random_neighbor(w, rng) {
                    w = next;
                }
                if w == v || nw.has_edge(v, w) {
                    w = nw.random_vertex(rng);
                }
            }

            if w != v && !nw.has_edge(v, w) && !to_add.contains(&w) {
                to_add.push(w);
                if let Some(removed) = nw.remove_edge(v, dropped) {
                    mass -= removed;
                }
            }
        }

        if to_add.is_empty() {
            return 0;
        }

        let remaining = nw.out_degree(v);
        let init_weight = if remaining == 0 || mass < MASS_PRECISION {
            1.0 / to_add.len() as f64
        } else {
            mass / remaining as f64
        };
        for &w in &to_add {
            nw.add_edge(v, w, init_weight);
        }
        tracing::trace!(vertex = v, added = to_add.len(), "Rewired ties");
        to_add.len()
    }
}

/// Pulls `v` towards a roulette-selected out-neighbour and adjusts its
/// tolerance. Returns the selected neighbour.
pub fn pairwise_update<R: Rng>(
    v: usize,
    nw: &mut UserNetwork,
    radicalisation: f64,
    rng: &mut R,
) -> Option<usize> {
    let edges = nw.out_edges(v);
    let draw = rand_prob(rng);
    let partner = roulette_select(edges.iter().map(|&(_, weight)| weight), draw)
        .map(|i| edges[i].0);

    // Interacting with itself leaves the user unchanged.
    let reference = match partner {
        Some(w) => nw.user(w).opinion,
        None => nw.user(v).opinion,
    };
    let user = nw.user_mut(v);
    let previous = user.opinion;
    update::opinion(user, reference);
    update::tolerance(user, previous, radicalisation);
    partner
}

/// Roulette-wheel selection: the first entry whose cumulative weight
/// reaches `draw`, or `None` when the weights never do.
pub fn roulette_select<I>(weights: I, draw: f64) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut cumulative = 0.0;
    for (i, weight) in weights.into_iter().enumerate() {
        if cumulative < draw {
            cumulative += weight;
        }
        if cumulative >= draw {
            return Some(i);
        }
    }
    None
}

/// Bonus on a tie's weight that halves every time the age gap grows by
/// half the source's age.
pub fn age_affinity(source_age: u32, target_age: u32) -> f64 {
    let gap = (f64::from(target_age) - f64::from(source_age)).abs();
    (0.5f64.ln() / 0.5 * gap / f64::from(source_age.max(1))).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opinet_data::User;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn star(opinions: &[f64], tolerance: f64) -> UserNetwork {
        let mut nw = UserNetwork::with_vertices(opinions.len());
        for (i, &op) in opinions.iter().enumerate() {
            *nw.user_mut(i) = User::new(op, tolerance, 0.5, 10);
        }
        let k = opinions.len() - 1;
        for w in 1..opinions.len() {
            nw.add_edge(0, w, 1.0 / k as f64);
            nw.add_edge(w, 0, 1.0);
        }
        nw
    }

    #[test]
    fn test_roulette_selects_crossing_edge() {
        assert_eq!(roulette_select([0.3, 0.7], 0.5), Some(1));
        assert_eq!(roulette_select([0.3, 0.7], 0.3), Some(0));
        assert_eq!(roulette_select([0.3, 0.7], 0.0), Some(0));
        assert_eq!(roulette_select([0.0, 0.0], 0.5), None);
        assert_eq!(roulette_select(Vec::<f64>::new(), 0.5), None);
    }

    #[test]
    fn test_age_affinity_halves() {
        assert!((age_affinity(20, 20) - 1.0).abs() < 1e-12);
        assert!((age_affinity(20, 30) - 0.5).abs() < 1e-12);
        assert!((age_affinity(20, 10) - 0.5).abs() < 1e-12);
        assert!((age_affinity(20, 40) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_update_weights_without_rewiring_erodes_by_distance() {
        let mut nw = star(&[0.5, 0.5, 0.7, 0.9], 1.0);
        let revision = UserRevision::new(0.5, 0.0, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(revision.update_weights(0, &mut nw, false, &mut rng), 0);
        nw.normalize_weights(0);

        let w1 = nw.weight(0, 1).unwrap();
        let w2 = nw.weight(0, 2).unwrap();
        let w3 = nw.weight(0, 3).unwrap();
        assert!(w1 > w2 && w2 > w3);
        assert!((w1 / w2 - 1.0 / 0.9).abs() < 1e-12);
        assert!((nw.out_weight_sum(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_certain_rewiring_replaces_distant_ties() {
        let mut nw = star(&[0.0, 0.05, 0.9, 0.95, 0.1, 0.5], 0.2);
        for v in 1..6 {
            for w in 1..6 {
                if v != w {
                    nw.add_edge(v, w, 0.1);
                }
            }
            nw.normalize_weights(v);
        }
        let before = nw.out_degree(0);
        let mut revision = UserRevision::new(0.5, 1.0, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let added = revision.update_weights(0, &mut nw, false, &mut rng);
        revision.rewiring_count += added as u64;
        nw.normalize_weights(0);

        assert_eq!(nw.out_degree(0), before);
        assert!(!nw.has_edge(0, 0));
        assert!((nw.out_weight_sum(0) - 1.0).abs() < 1e-9);
        assert_eq!(revision.rewiring_count(), added as u64);
    }

    #[test]
    fn test_revise_keeps_weights_normalized() {
        let mut nw = star(&[0.1, 0.2, 0.8, 0.4, 0.6], 0.3);
        let mut revision = UserRevision::new(0.5, 0.5, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..500 {
            if let Some(report) = revision.revise(&mut nw, true, &mut rng) {
                if report.norm == WeightNorm::Normalized {
                    assert!((nw.out_weight_sum(report.vertex) - 1.0).abs() < 1e-9);
                }
            }
        }
        for user in nw.users() {
            assert!((0.0..=1.0).contains(&user.opinion));
            assert!(user.tolerance > 0.0 && user.tolerance <= 1.0);
        }
        for (s, t, _) in nw.edges() {
            assert_ne!(s, t);
        }
    }

    #[test]
    fn test_sink_is_a_noop() {
        let mut nw = UserNetwork::with_vertices(1);
        let mut revision = UserRevision::new(0.5, 0.5, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(revision.revise(&mut nw, false, &mut rng), None);
        assert_eq!(*nw.user(0), User::default());
    }
}
