//! Graph stores for users and media.
//!
//! Both networks keep a fixed vertex set, so petgraph's node indices stay
//! stable for the whole run and are exposed as plain `usize`. Edge indices
//! are not stable (petgraph swaps on removal) and never leak out of here.
//! Every neighbourhood accessor returns vertices in ascending index order,
//! which is the scan order all roulette draws rely on.

use opinet_data::{Medium, User};
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rand::Rng;

use crate::utils::rand_int;

/// Result of renormalising a vertex's outgoing weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightNorm {
    Normalized,
    NoOutEdges,
    /// All outgoing weights were zero; left as they are.
    ZeroMass,
}

/// Directed, weighted social network without self-loops or parallel edges.
#[derive(Debug, Clone, Default)]
pub struct UserNetwork {
    graph: DiGraph<User, f64>,
}

impl UserNetwork {
    pub fn new(graph: DiGraph<User, f64>) -> Self {
        Self { graph }
    }

    /// `n` default users and no edges.
    pub fn with_vertices(n: usize) -> Self {
        let mut graph = DiGraph::with_capacity(n, 0);
        for _ in 0..n {
            graph.add_node(User::default());
        }
        Self { graph }
    }

    pub fn graph(&self) -> &DiGraph<User, f64> {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn user(&self, v: usize) -> &User {
        &self.graph[NodeIndex::new(v)]
    }

    pub fn user_mut(&mut self, v: usize) -> &mut User {
        &mut self.graph[NodeIndex::new(v)]
    }

    pub fn users(&self) -> impl Iterator<Item = &User> + '_ {
        self.graph.node_weights()
    }

    pub fn users_mut(&mut self) -> impl Iterator<Item = &mut User> + '_ {
        self.graph.node_weights_mut()
    }

    pub fn out_degree(&self, v: usize) -> usize {
        self.graph
            .edges_directed(NodeIndex::new(v), Direction::Outgoing)
            .count()
    }

    pub fn in_degree(&self, v: usize) -> usize {
        self.graph
            .edges_directed(NodeIndex::new(v), Direction::Incoming)
            .count()
    }

    pub fn degree(&self, v: usize) -> usize {
        self.out_degree(v) + self.in_degree(v)
    }

    /// `(target, weight)` pairs sorted by target.
    pub fn out_edges(&self, v: usize) -> Vec<(usize, f64)> {
        let mut edges: Vec<(usize, f64)> = self
            .graph
            .edges_directed(NodeIndex::new(v), Direction::Outgoing)
            .map(|e| (e.target().index(), *e.weight()))
            .collect();
        edges.sort_unstable_by_key(|&(w, _)| w);
        edges
    }

    /// `(source, weight)` pairs sorted by source.
    pub fn in_edges(&self, v: usize) -> Vec<(usize, f64)> {
        let mut edges: Vec<(usize, f64)> = self
            .graph
            .edges_directed(NodeIndex::new(v), Direction::Incoming)
            .map(|e| (e.source().index(), *e.weight()))
            .collect();
        edges.sort_unstable_by_key(|&(w, _)| w);
        edges
    }

    pub fn out_neighbors(&self, v: usize) -> Vec<usize> {
        self.out_edges(v).into_iter().map(|(w, _)| w).collect()
    }

    pub fn in_neighbors(&self, v: usize) -> Vec<usize> {
        self.in_edges(v).into_iter().map(|(w, _)| w).collect()
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.graph
            .find_edge(NodeIndex::new(from), NodeIndex::new(to))
            .is_some()
    }

    pub fn weight(&self, from: usize, to: usize) -> Option<f64> {
        self.graph
            .find_edge(NodeIndex::new(from), NodeIndex::new(to))
            .map(|e| self.graph[e])
    }

    /// Returns `false` if the edge does not exist.
    pub fn set_weight(&mut self, from: usize, to: usize, weight: f64) -> bool {
        match self
            .graph
            .find_edge(NodeIndex::new(from), NodeIndex::new(to))
        {
            Some(e) => {
                self.graph[e] = weight;
                true
            }
            None => false,
        }
    }

    /// Adds `from -> to`. Self-loops and parallel edges are refused.
    pub fn add_edge(&mut self, from: usize, to: usize, weight: f64) -> bool {
        if from == to || self.has_edge(from, to) {
            return false;
        }
        self.graph
            .add_edge(NodeIndex::new(from), NodeIndex::new(to), weight);
        true
    }

    /// Removes `from -> to`, returning its weight.
    pub fn remove_edge(&mut self, from: usize, to: usize) -> Option<f64> {
        let e = self
            .graph
            .find_edge(NodeIndex::new(from), NodeIndex::new(to))?;
        self.graph.remove_edge(e)
    }

    /// Drops every edge incident to `v`, keeping the vertex.
    pub fn clear_vertex(&mut self, v: usize) {
        let node = NodeIndex::new(v);
        for dir in [Direction::Outgoing, Direction::Incoming] {
            while let Some(e) = self.graph.first_edge(node, dir) {
                self.graph.remove_edge(e);
            }
        }
    }

    pub fn out_weight_sum(&self, v: usize) -> f64 {
        self.graph
            .edges_directed(NodeIndex::new(v), Direction::Outgoing)
            .map(|e| *e.weight())
            .sum()
    }

    /// Scales the outgoing weights of `v` to sum to one.
    pub fn normalize_weights(&mut self, v: usize) -> WeightNorm {
        let node = NodeIndex::new(v);
        let edges: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        if edges.is_empty() {
            return WeightNorm::NoOutEdges;
        }

        let norm: f64 = edges.iter().map(|&e| self.graph[e]).sum();
        if norm == 0.0 {
            tracing::warn!(vertex = v, age = self.graph[node].age, "All weights are zero");
            return WeightNorm::ZeroMass;
        }

        for e in edges {
            self.graph[e] /= norm;
            if self.graph[e].is_nan() {
                tracing::error!(vertex = v, "NaN weight after normalisation");
            }
        }
        WeightNorm::Normalized
    }

    pub fn random_vertex<R: Rng>(&self, rng: &mut R) -> usize {
        rand_int(0, self.len(), rng)
    }

    /// Uniformly chosen out-neighbour, `None` for a sink.
    pub fn random_neighbor<R: Rng>(&self, v: usize, rng: &mut R) -> Option<usize> {
        let neighbors = self.out_neighbors(v);
        if neighbors.is_empty() {
            return None;
        }
        Some(neighbors[rand_int(0, neighbors.len(), rng)])
    }

    /// `(source, target, weight)` for every edge, sorted.
    pub fn edges(&self) -> Vec<(usize, usize, f64)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect();
        edges.sort_unstable_by_key(|&(s, t, _)| (s, t));
        edges
    }
}

/// Undirected media network. Edge weights are the mutual attraction.
#[derive(Debug, Clone, Default)]
pub struct MediaNetwork {
    graph: UnGraph<Medium, f64>,
}

impl MediaNetwork {
    pub fn new(graph: UnGraph<Medium, f64>) -> Self {
        Self { graph }
    }

    pub fn with_vertices(n: usize) -> Self {
        let mut graph = UnGraph::with_capacity(n, 0);
        for _ in 0..n {
            graph.add_node(Medium::default());
        }
        Self { graph }
    }

    pub fn graph(&self) -> &UnGraph<Medium, f64> {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn medium(&self, m: usize) -> &Medium {
        &self.graph[NodeIndex::new(m)]
    }

    pub fn medium_mut(&mut self, m: usize) -> &mut Medium {
        &mut self.graph[NodeIndex::new(m)]
    }

    pub fn media(&self) -> impl Iterator<Item = &Medium> + '_ {
        self.graph.node_weights()
    }

    pub fn media_mut(&mut self) -> impl Iterator<Item = &mut Medium> + '_ {
        self.graph.node_weights_mut()
    }

    pub fn degree(&self, m: usize) -> usize {
        self.graph.edges(NodeIndex::new(m)).count()
    }

    pub fn neighbors(&self, m: usize) -> Vec<usize> {
        let mut neighbors: Vec<usize> = self
            .graph
            .neighbors(NodeIndex::new(m))
            .map(NodeIndex::index)
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    pub fn add_edge(&mut self, a: usize, b: usize, attraction: f64) -> bool {
        if a == b || self.attraction(a, b).is_some() {
            return false;
        }
        self.graph
            .add_edge(NodeIndex::new(a), NodeIndex::new(b), attraction);
        true
    }

    pub fn attraction(&self, a: usize, b: usize) -> Option<f64> {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .map(|e| self.graph[e])
    }

    /// Every edge weight, in edge insertion order.
    pub fn attractions_mut(&mut self) -> impl Iterator<Item = &mut f64> + '_ {
        self.graph.edge_weights_mut()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn random_vertex<R: Rng>(&self, rng: &mut R) -> usize {
        rand_int(0, self.len(), rng)
    }

    pub fn total_users(&self) -> u64 {
        self.graph.node_weights().map(|m| u64::from(m.users)).sum()
    }

    /// Recomputes `ads_normalized` as each medium's share of the total
    /// spend. Returns `false` when the total is zero, in which case every
    /// medium gets an equal share.
    pub fn normalize_ads(&mut self) -> bool {
        let n = self.len();
        if n == 0 {
            return true;
        }
        let sum: f64 = self.graph.node_weights().map(|m| m.ads).sum();
        if sum <= 0.0 {
            tracing::warn!(media = n, "Total advertising spend is zero, using equal shares");
            for medium in self.graph.node_weights_mut() {
                medium.ads_normalized = 1.0 / n as f64;
            }
            return false;
        }
        for medium in self.graph.node_weights_mut() {
            medium.ads_normalized = medium.ads / sum;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn triangle() -> UserNetwork {
        let mut nw = UserNetwork::with_vertices(4);
        nw.add_edge(0, 2, 0.5);
        nw.add_edge(0, 1, 0.3);
        nw.add_edge(0, 3, 0.2);
        nw.add_edge(1, 0, 1.0);
        nw.add_edge(2, 0, 1.0);
        nw
    }

    #[test]
    fn test_out_edges_are_sorted_by_target() {
        let nw = triangle();
        assert_eq!(nw.out_neighbors(0), vec![1, 2, 3]);
        assert_eq!(nw.out_edges(0)[0], (1, 0.3));
        assert_eq!(nw.in_neighbors(0), vec![1, 2]);
        assert_eq!(nw.degree(0), 5);
    }

    #[test]
    fn test_add_edge_refuses_loops_and_duplicates() {
        let mut nw = triangle();
        assert!(!nw.add_edge(0, 0, 1.0));
        assert!(!nw.add_edge(0, 1, 1.0));
        assert_eq!(nw.edge_count(), 5);
        assert!(nw.add_edge(3, 1, 1.0));
    }

    #[test]
    fn test_remove_and_clear_keep_indices_stable() {
        let mut nw = triangle();
        nw.user_mut(3).opinion = 0.9;
        assert_eq!(nw.remove_edge(0, 1), Some(0.3));
        assert!(!nw.has_edge(0, 1));
        assert_eq!(nw.weight(0, 3), Some(0.2));

        nw.clear_vertex(0);
        assert_eq!(nw.edge_count(), 0);
        assert_eq!(nw.len(), 4);
        assert_eq!(nw.user(3).opinion, 0.9);
    }

    #[test]
    fn test_normalize_weights() {
        let mut nw = triangle();
        nw.set_weight(0, 1, 2.0);
        assert_eq!(nw.normalize_weights(0), WeightNorm::Normalized);
        assert!((nw.out_weight_sum(0) - 1.0).abs() < 1e-12);
        assert!((nw.weight(0, 1).unwrap() - 2.0 / 2.7).abs() < 1e-12);

        assert_eq!(nw.normalize_weights(3), WeightNorm::NoOutEdges);

        nw.set_weight(1, 0, 0.0);
        assert_eq!(nw.normalize_weights(1), WeightNorm::ZeroMass);
        assert_eq!(nw.weight(1, 0), Some(0.0));
    }

    #[test]
    fn test_random_neighbor() {
        let nw = triangle();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let w = nw.random_neighbor(0, &mut rng).unwrap();
            assert!(nw.has_edge(0, w));
        }
        assert_eq!(nw.random_neighbor(3, &mut rng), None);
    }

    #[test]
    fn test_normalize_ads() {
        let mut media = MediaNetwork::with_vertices(3);
        media.medium_mut(0).ads = 1.0;
        media.medium_mut(1).ads = 3.0;
        assert!(media.normalize_ads());
        let shares: Vec<f64> = media.media().map(|m| m.ads_normalized).collect();
        assert_eq!(shares, vec![0.25, 0.75, 0.0]);

        for m in media.media_mut() {
            m.ads = 0.0;
        }
        assert!(!media.normalize_ads());
        let sum: f64 = media.media().map(|m| m.ads_normalized).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_media_neighbors_are_symmetric() {
        let mut media = MediaNetwork::with_vertices(3);
        assert!(media.add_edge(2, 0, 0.4));
        assert!(!media.add_edge(0, 2, 0.9));
        assert_eq!(media.neighbors(0), vec![2]);
        assert_eq!(media.attraction(0, 2), Some(0.4));
        assert_eq!(media.attraction(2, 0), Some(0.4));
    }
}
