//! Initial network topologies.

use rand::Rng;

use crate::config::{GraphModel, NetworkConfig};
use crate::error::{ModelError, Result};
use crate::network::{MediaNetwork, UserNetwork};
use crate::utils::rand_int;

/// Builds user and media graphs from their configuration. Vertex payloads
/// are left at their defaults and edge weights at 1.
pub struct NetworkBuilder;

impl NetworkBuilder {
    /// Directed user network. Erdős-Rényi draws `n·k` distinct ties.
    pub fn users<R: Rng>(cfg: &NetworkConfig, rng: &mut R) -> Result<UserNetwork> {
        let n = cfg.num_vertices;
        let k = cfg.mean_degree;
        let mut nw = UserNetwork::with_vertices(n);

        match cfg.model {
            GraphModel::ErdosRenyi => {
                let m = n * k;
                let max = n * n.saturating_sub(1);
                if m > max {
                    return Err(ModelError::network(format!(
                        "cannot place {m} directed edges on {n} vertices (at most {max})"
                    )));
                }
                while nw.edge_count() < m {
                    let s = rand_int(0, n, rng);
                    let t = rand_int(0, n, rng);
                    nw.add_edge(s, t, 1.0);
                }
            }
            GraphModel::Regular => {
                for (a, b) in ring_lattice(n, k)? {
                    nw.add_edge(a, b, 1.0);
                    nw.add_edge(b, a, 1.0);
                }
            }
            GraphModel::Complete => {
                for a in 0..n {
                    for b in 0..n {
                        nw.add_edge(a, b, 1.0);
                    }
                }
            }
        }
        tracing::debug!(vertices = n, edges = nw.edge_count(), "Built user network");
        Ok(nw)
    }

    /// Undirected media network. Erdős-Rényi draws `n·k/2` distinct ties.
    pub fn media<R: Rng>(cfg: &NetworkConfig, rng: &mut R) -> Result<MediaNetwork> {
        let n = cfg.num_vertices;
        let k = cfg.mean_degree;
        let mut nw = MediaNetwork::with_vertices(n);

        match cfg.model {
            GraphModel::ErdosRenyi => {
                let m = n * k / 2;
                let max = n * n.saturating_sub(1) / 2;
                if m > max {
                    return Err(ModelError::network(format!(
                        "cannot place {m} undirected edges on {n} vertices (at most {max})"
                    )));
                }
                while nw.edge_count() < m {
                    let a = rand_int(0, n, rng);
                    let b = rand_int(0, n, rng);
                    nw.add_edge(a, b, 1.0);
                }
            }
            GraphModel::Regular => {
                for (a, b) in ring_lattice(n, k)? {
                    nw.add_edge(a, b, 1.0);
                }
            }
            GraphModel::Complete => {
                for a in 0..n {
                    for b in (a + 1)..n {
                        nw.add_edge(a, b, 1.0);
                    }
                }
            }
        }
        tracing::debug!(vertices = n, edges = nw.edge_count(), "Built media network");
        Ok(nw)
    }
}

/// Pairs of a ring lattice where every vertex is linked to its `k / 2`
/// nearest neighbours on each side.
fn ring_lattice(n: usize, k: usize) -> Result<Vec<(usize, usize)>> {
    if k % 2 != 0 {
        return Err(ModelError::network(format!(
            "a regular lattice needs an even mean degree, got {k}"
        )));
    }
    if n > 0 && k >= n {
        return Err(ModelError::network(format!(
            "mean degree {k} too large for {n} vertices"
        )));
    }
    let mut pairs = Vec::with_capacity(n * k / 2);
    for v in 0..n {
        for j in 1..=k / 2 {
            pairs.push((v, (v + j) % n));
        }
    }
    Ok(pairs)
}
