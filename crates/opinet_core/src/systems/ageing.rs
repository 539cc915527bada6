//! Generational turnover.
//!
//! Once per life cycle every user grows one year older. A fraction of the
//! seniors is reborn as children of current parents: the vertex keeps its
//! slot and its degree, but its ties are rewired to the parent and to young
//! peers.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::AgeGroupsConfig;
use crate::network::{MediaNetwork, UserNetwork};
use crate::utils::{rand_int, SusceptibilityCurve};

/// Weight of the parent's tie towards a new child before renormalisation.
const PARENT_TO_CHILD_WEIGHT: f64 = 0.1;

/// Vertices picked for one ageing cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub children: Vec<usize>,
    pub parents: Vec<usize>,
    pub peers: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeingOutcome {
    /// Nobody of parent age was found; users aged but nothing was rewired.
    NoParents { children: usize },
    Completed {
        children: usize,
        parents: usize,
        peers: usize,
        /// Peer slots that had to be filled with a random vertex.
        fallbacks: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeingEngine {
    pub replacement_rate: f64,
    pub groups: AgeGroupsConfig,
    pub curve: SusceptibilityCurve,
}

impl AgeingEngine {
    pub fn new(replacement_rate: f64, groups: AgeGroupsConfig, curve: SusceptibilityCurve) -> Self {
        Self {
            replacement_rate,
            groups,
            curve,
        }
    }

    /// Runs one full cycle: ageing and selection, then rebirth of every
    /// selected senior. Media audience counts follow the children's new
    /// outlets when media are given.
    pub fn run<R: Rng>(
        &self,
        nw: &mut UserNetwork,
        mut media: Option<&mut MediaNetwork>,
        rng: &mut R,
    ) -> AgeingOutcome {
        let selection = self.select(nw, rng);
        let Selection {
            children,
            parents,
            peers,
        } = &selection;

        if parents.is_empty() {
            tracing::info!("There are no parent nodes: no user ageing possible in this step");
            return AgeingOutcome::NoParents {
                children: children.len(),
            };
        }
        if children.len() > parents.len() {
            tracing::debug!(
                surplus = children.len() - parents.len(),
                "More children than parents, some parents get several children"
            );
        }
        tracing::debug!(
            children = children.len(),
            parents = parents.len(),
            peers = peers.len(),
            "Reinitialising vertices as children"
        );

        let mut cursor = 0;
        let mut fallbacks = 0;
        for (i, &child) in children.iter().enumerate() {
            let parent = parents[i % parents.len()];
            let deg = nw.degree(child);
            let in_deg = nw.in_degree(child);
            let out_deg = nw.out_degree(child);

            self.reinitialize(child, parent, nw, media.as_deref_mut(), rng);
            if deg == 0 {
                continue;
            }

            remove_edges(child, nw);
            fallbacks += add_edges(child, parent, peers, out_deg, in_deg, cursor, nw, rng);
            check_rewiring(child, parent, deg, in_deg, out_deg, nw);

            if deg > 2 {
                cursor += deg - 2;
            }
        }

        tracing::debug!("Ageing complete");
        AgeingOutcome::Completed {
            children: children.len(),
            parents: parents.len(),
            peers: peers.len(),
            fallbacks,
        }
    }

    /// Ages every user in shuffled order and collects seniors to replace,
    /// parents for them and young peers to connect them to.
    pub fn select<R: Rng>(&self, nw: &mut UserNetwork, rng: &mut R) -> Selection {
        let to_replace = (nw.len() as f64 * self.replacement_rate) as usize;
        let mut peer_budget: i64 = 0;
        let mut selection = Selection::default();

        let mut order: Vec<usize> = (0..nw.len()).collect();
        order.shuffle(rng);

        let g = &self.groups;
        for v in order {
            let user = nw.user_mut(v);
            user.age += 1;
            user.susceptibility = self.curve.at(f64::from(user.age));
            let age = user.age;

            let Selection {
                children,
                parents,
                peers,
            } = &mut selection;
            if (peers.len() as i64) >= peer_budget
                && children.len() >= to_replace
                && parents.len() >= to_replace
            {
                continue;
            }

            if age >= g.seniors.0 && children.len() < to_replace {
                children.push(v);
                // The parent takes one in- and one out-slot.
                peer_budget += nw.degree(v) as i64 - 2;
            }
            if (g.parents.0..=g.parents.1).contains(&age) && parents.len() < children.len() {
                parents.push(v);
            }
            if age <= g.children.1 && (peers.len() as i64) < peer_budget {
                peers.push(v);
            }
        }
        selection
    }

    /// Resets `child` to a newborn inheriting the parent's stance.
    fn reinitialize<R: Rng>(
        &self,
        child: usize,
        parent: usize,
        nw: &mut UserNetwork,
        media: Option<&mut MediaNetwork>,
        rng: &mut R,
    ) {
        let inherited = *nw.user(parent);
        let susceptibility = self.curve.at(1.0);
        let user = nw.user_mut(child);
        user.age = 1;
        user.opinion = inherited.opinion;
        user.tolerance = inherited.tolerance;
        user.susceptibility = susceptibility;

        let Some(media) = media.filter(|m| !m.is_empty()) else {
            return;
        };
        let medium = rand_int(0, media.len(), rng);
        if let Some(old) = user.used_media.replace(medium) {
            let old = media.medium_mut(old);
            old.users = old.users.saturating_sub(1);
        }
        media.medium_mut(medium).users += 1;
    }
}

/// Detaches `v`, zeroing its incoming ties first so that every former
/// follower keeps a normalised weight vector.
pub fn remove_edges(v: usize, nw: &mut UserNetwork) {
    for (w, _) in nw.in_edges(v) {
        nw.set_weight(w, v, 0.0);
        if nw.out_degree(w) > 1 {
            nw.normalize_weights(w);
        }
    }
    nw.clear_vertex(v);
}

/// Reconnects a detached child with exactly its former degree: one tie each
/// way with the parent, the rest to peers taken round-robin from `cursor`.
/// Returns how many peer slots fell back to a random vertex.
#[allow(clippy::too_many_arguments)]
fn add_edges<R: Rng>(
    child: usize,
    parent: usize,
    peers: &[usize],
    out_deg: usize,
    in_deg: usize,
    cursor: usize,
    nw: &mut UserNetwork,
    rng: &mut R,
) -> usize {
    let deg = out_deg + in_deg;
    let (mut out_deg, mut in_deg) = (out_deg as i64, in_deg as i64);

    let weight = if deg <= 2 || out_deg <= 1 { 1.0 } else { 0.5 };
    nw.add_edge(child, parent, weight);
    if out_deg > 0 {
        out_deg -= 1;
    } else {
        in_deg -= 1;
    }

    if in_deg <= 0 && out_deg <= 0 {
        nw.normalize_weights(parent);
        return 0;
    }
    nw.add_edge(parent, child, PARENT_TO_CHILD_WEIGHT);
    nw.normalize_weights(parent);
    if in_deg > 0 {
        in_deg -= 1;
    } else {
        out_deg -= 1;
    }
    if in_deg <= 0 && out_deg <= 0 {
        return 0;
    }

    let out_n = out_deg.max(0) as usize;
    let in_n = in_deg.max(0) as usize;
    if peers.is_empty() {
        tracing::warn!(child, "No peers available, rewiring the child to random vertices");
    }

    let mut fallbacks = 0;
    let mut peer_opinions = 0.0;
    for j in cursor..cursor + out_n {
        let mut peer = peer_at(peers, j, nw, rng);
        while peer == child || nw.has_edge(child, peer) {
            peer = nw.random_vertex(rng);
            fallbacks += 1;
        }
        nw.add_edge(child, peer, 0.5 / out_n as f64);
        nw.normalize_weights(peer);
        peer_opinions += nw.user(peer).opinion;
    }
    for j in cursor + out_n..cursor + out_n + in_n {
        let mut peer = peer_at(peers, j, nw, rng);
        while peer == child || nw.has_edge(peer, child) {
            peer = nw.random_vertex(rng);
            fallbacks += 1;
        }
        nw.add_edge(peer, child, 0.5 / in_n as f64);
        nw.normalize_weights(peer);
        peer_opinions += nw.user(peer).opinion;
    }
    nw.normalize_weights(child);

    let parent_opinion = nw.user(parent).opinion;
    nw.user_mut(child).opinion = 0.5 * (parent_opinion + peer_opinions / (out_n + in_n) as f64);

    if fallbacks > 0 {
        tracing::warn!(
            child,
            fallbacks,
            "Failed connecting to peer: edge already exists. Rewired to a random vertex; \
             consider increasing the vertex count or decreasing the replacement rate"
        );
    }
    fallbacks
}

fn peer_at<R: Rng>(peers: &[usize], j: usize, nw: &UserNetwork, rng: &mut R) -> usize {
    if peers.is_empty() {
        nw.random_vertex(rng)
    } else {
        peers[j % peers.len()]
    }
}

/// Logs violations of the degree and weight postconditions of a rebirth.
fn check_rewiring(
    child: usize,
    parent: usize,
    deg: usize,
    in_deg: usize,
    out_deg: usize,
    nw: &UserNetwork,
) -> bool {
    let mut ok = nw.degree(child) == deg
        && nw.in_degree(child).abs_diff(in_deg) <= 1
        && nw.out_degree(child).abs_diff(out_deg) <= 1;
    if !ok {
        tracing::error!(
            child,
            deg,
            deg_after = nw.degree(child),
            "Ageing did not preserve the degree"
        );
    }
    for v in [child, parent] {
        if nw.out_degree(v) > 0 {
            let sum = nw.out_weight_sum(v);
            if (sum - 1.0).abs() > 1e-12 {
                tracing::info!(vertex = v, sum, "Weight sum after ageing deviates from 1");
                ok = false;
            }
        }
    }
    ok
}
