//! Structure analysis of the user network.
//!
//! The flood fills walk the graph depth-first with an explicit frame stack
//! and visit vertices in the same order as a recursive descent would: first
//! the out-neighbours, then the in-neighbours, each in ascending index order.

use std::collections::VecDeque;

use crate::network::UserNetwork;

/// Default tie strength for weighted clusters.
pub const DEFAULT_MIN_WEIGHT: f64 = 0.1;

/// Depth-first fill from `origin`. `next` lists, for a vertex, the
/// neighbours the walk may continue to, in visiting order.
fn flood_fill<F>(origin: usize, n: usize, mut next: F) -> Vec<usize>
where
    F: FnMut(usize) -> Vec<usize>,
{
    let mut visited = vec![false; n];
    let mut members = vec![origin];
    visited[origin] = true;
    let mut stack = vec![(next(origin), 0usize)];

    while let Some((candidates, pos)) = stack.last_mut() {
        let Some(&w) = candidates.get(*pos) else {
            stack.pop();
            continue;
        };
        *pos += 1;
        if !visited[w] {
            visited[w] = true;
            members.push(w);
            stack.push((next(w), 0));
        }
    }
    members
}

/// Runs `fill` from every vertex not yet covered by an earlier cluster.
/// Clusters can overlap because the fill criterion is not symmetric.
fn partition<F>(n: usize, mut fill: F) -> Vec<Vec<usize>>
where
    F: FnMut(usize) -> Vec<usize>,
{
    let mut covered = vec![false; n];
    let mut clusters = Vec::new();
    for v in 0..n {
        if covered[v] {
            continue;
        }
        let cluster = fill(v);
        for &w in &cluster {
            covered[w] = true;
        }
        clusters.push(cluster);
    }
    clusters
}

/// Users connected in either direction whose opinions lie within the
/// susceptibility of the vertex the walk currently stands on.
pub fn opinion_clusters(nw: &UserNetwork) -> Vec<Vec<usize>> {
    let n = nw.len();
    let next = |v: usize| -> Vec<usize> {
        let op = nw.user(v).opinion;
        let reach = nw.user(v).susceptibility;
        nw.out_neighbors(v)
            .into_iter()
            .chain(nw.in_neighbors(v))
            .filter(|&w| (op - nw.user(w).opinion).abs() <= reach)
            .collect()
    };
    partition(n, |v| flood_fill(v, n, next))
}

/// Like [`opinion_clusters`], but a tie only counts when its weight scaled
/// by the out-degree of its source reaches `min_weight`. A negative
/// `min_weight` selects [`DEFAULT_MIN_WEIGHT`].
pub fn weighted_opinion_clusters(nw: &UserNetwork, min_weight: f64) -> Vec<Vec<usize>> {
    let min_weight = if min_weight < 0.0 {
        DEFAULT_MIN_WEIGHT
    } else {
        min_weight
    };
    let n = nw.len();
    let next = |v: usize| -> Vec<usize> {
        let op = nw.user(v).opinion;
        let reach = nw.user(v).susceptibility;
        let out_deg = nw.out_degree(v) as f64;
        let close = |w: usize| (op - nw.user(w).opinion).abs() <= reach;

        let mut candidates: Vec<usize> = nw
            .out_edges(v)
            .into_iter()
            .filter(|&(w, weight)| close(w) && weight * out_deg >= min_weight)
            .map(|(w, _)| w)
            .collect();
        candidates.extend(
            nw.in_edges(v)
                .into_iter()
                .filter(|&(w, weight)| close(w) && weight * nw.out_degree(w) as f64 >= min_weight)
                .map(|(w, _)| w),
        );
        candidates
    };
    partition(n, |v| flood_fill(v, n, next))
}

/// Cuts the opinion-sorted population wherever two consecutive opinions
/// are at least `tolerance` apart.
pub fn opinion_groups(nw: &UserNetwork, tolerance: f64) -> Vec<Vec<usize>> {
    let mut sorted: Vec<(f64, usize)> = nw
        .users()
        .enumerate()
        .map(|(v, u)| (u.opinion, v))
        .collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut groups = Vec::new();
    let mut current = vec![sorted[0].1];
    for pair in sorted.windows(2) {
        if (pair[1].0 - pair[0].0).abs() >= tolerance {
            groups.push(std::mem::take(&mut current));
        }
        current.push(pair[1].1);
    }
    groups.push(current);
    groups
}

/// Groups of users connected via out-edges. A vertex not yet assigned
/// that has fewer than two followers and links into an existing community
/// joins every such community instead of founding its own. Isolated users
/// form singleton communities.
pub fn closed_communities(nw: &UserNetwork) -> Vec<Vec<usize>> {
    let n = nw.len();
    let mut communities: Vec<Vec<usize>> = Vec::new();
    for v in 0..n {
        if communities.iter().any(|c| c.contains(&v)) {
            continue;
        }

        let mut joined = false;
        if nw.in_degree(v) < 2 {
            for community in &mut communities {
                if community.iter().any(|&w| nw.has_edge(v, w)) {
                    community.push(v);
                    joined = true;
                }
            }
        }
        if joined {
            continue;
        }

        communities.push(flood_fill(v, n, |w| nw.out_neighbors(w)));
    }
    communities
}

/// Fraction of `v`'s out-ties that are reciprocated; 0 for a sink.
pub fn reciprocity(nw: &UserNetwork, v: usize) -> f64 {
    let out = nw.out_neighbors(v);
    if out.is_empty() {
        return 0.0;
    }
    let mutual = out.iter().filter(|&&w| nw.has_edge(w, v)).count();
    mutual as f64 / out.len() as f64
}

/// Fraction of all ties that are reciprocated; 0 without ties.
pub fn graph_reciprocity(nw: &UserNetwork) -> f64 {
    let edges = nw.edges();
    if edges.is_empty() {
        return 0.0;
    }
    let mutual = edges.iter().filter(|&&(s, t, _)| nw.has_edge(t, s)).count();
    mutual as f64 / edges.len() as f64
}

/// Unweighted betweenness centrality (Brandes) over directed shortest
/// paths.
pub fn betweenness_centrality(nw: &UserNetwork) -> Vec<f64> {
    let n = nw.len();
    let adjacency: Vec<Vec<usize>> = (0..n).map(|v| nw.out_neighbors(v)).collect();
    let mut bc = vec![0.0_f64; n];

    for s in 0..n {
        let mut stack: Vec<usize> = Vec::new();
        let mut predecessors: Vec<Vec<usize>> = vec![vec![]; n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist = vec![-1i64; n];
        let mut delta = vec![0.0_f64; n];

        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adjacency[v] {
                if dist[w] < 0 {
                    queue.push_back(w);
                    dist[w] = dist[v] + 1;
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        // Back-propagation
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                bc[w] += delta[w];
            }
        }
    }
    bc
}

/// Betweenness relative to the largest value any vertex could reach,
/// halved for directed graphs. All zero for fewer than three users.
pub fn relative_betweenness_centrality(nw: &UserNetwork) -> Vec<f64> {
    let n = nw.len();
    if n < 3 {
        return vec![0.0; n];
    }
    let factor = 2.0 / ((n - 1) as f64 * (n - 2) as f64);
    betweenness_centrality(nw)
        .into_iter()
        .map(|bc| bc * factor / 2.0)
        .collect()
}
