use serde::{Deserialize, Serialize};

use crate::analysis;
use crate::config::Mode;
use crate::error::Result;
use crate::network::{MediaNetwork, UserNetwork};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MediaSnapshot {
    pub opinions: Vec<f64>,
    pub users: Vec<u32>,
    pub ads: Vec<f64>,
    pub ads_normalized: Vec<f64>,
}

impl MediaSnapshot {
    pub fn capture(media: &MediaNetwork) -> Self {
        Self {
            opinions: media.media().map(|m| m.opinion).collect(),
            users: media.media().map(|m| m.users).collect(),
            ads: media.media().map(|m| m.ads).collect(),
            ads_normalized: media.media().map(|m| m.ads_normalized).collect(),
        }
    }
}

/// Per-vertex state of the model at one point in time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub time: u64,
    pub opinions: Vec<f64>,
    pub tolerances: Vec<f64>,
    pub susceptibilities: Vec<f64>,
    pub ages: Vec<u32>,
    pub in_degrees: Vec<usize>,
    pub out_degrees: Vec<usize>,
    pub avg_nb_opinions: Vec<f64>,
    pub media: Option<MediaSnapshot>,
    pub rewiring_count: u64,
}

impl Snapshot {
    pub fn capture(
        time: u64,
        users: &UserNetwork,
        media: Option<&MediaNetwork>,
        rewiring_count: u64,
    ) -> Self {
        let n = users.len();
        Self {
            time,
            opinions: users.users().map(|u| u.opinion).collect(),
            tolerances: users.users().map(|u| u.tolerance).collect(),
            susceptibilities: users.users().map(|u| u.susceptibility).collect(),
            ages: users.users().map(|u| u.age).collect(),
            in_degrees: (0..n).map(|v| users.in_degree(v)).collect(),
            out_degrees: (0..n).map(|v| users.out_degree(v)).collect(),
            avg_nb_opinions: (0..n).map(|v| avg_nb_opinion(users, v)).collect(),
            media: media.map(MediaSnapshot::capture),
            rewiring_count,
        }
    }
}

/// Weight-averaged opinion a user perceives from its out-neighbours.
/// Neighbours outside its tolerance count with the user's own opinion.
pub fn avg_nb_opinion(users: &UserNetwork, v: usize) -> f64 {
    let me = users.user(v);
    users
        .out_edges(v)
        .into_iter()
        .map(|(w, weight)| {
            let other = users.user(w).opinion;
            if (other - me.opinion).abs() <= me.tolerance {
                other * weight
            } else {
                me.opinion * weight
            }
        })
        .sum()
}

/// Structure of the final network.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Analysis {
    pub time: u64,
    pub num_opinion_clusters: usize,
    pub num_weighted_opinion_clusters: usize,
    pub opinion_cluster_sizes: Vec<usize>,
    pub num_opinion_groups: usize,
    pub num_closed_communities: usize,
    pub reciprocity: f64,
    pub relative_betweenness: Vec<f64>,
    pub edges: Vec<(usize, usize, f64)>,
}

impl Analysis {
    pub fn capture(time: u64, users: &UserNetwork, group_tolerance: f64, min_weight: f64) -> Self {
        let clusters = analysis::opinion_clusters(users);
        Self {
            time,
            num_opinion_clusters: clusters.len(),
            num_weighted_opinion_clusters: analysis::weighted_opinion_clusters(users, min_weight)
                .len(),
            opinion_cluster_sizes: clusters.iter().map(Vec::len).collect(),
            num_opinion_groups: analysis::opinion_groups(users, group_tolerance).len(),
            num_closed_communities: analysis::closed_communities(users).len(),
            reciprocity: analysis::graph_reciprocity(users),
            relative_betweenness: analysis::relative_betweenness_centrality(users),
            edges: users.edges(),
        }
    }
}

/// Describes the run a record stream belongs to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RunHeader {
    /// RFC 3339 timestamp of the run start.
    pub started_at: String,
    pub fingerprint: String,
    pub seed: Option<u64>,
    pub mode: Mode,
    pub num_users: usize,
    pub num_media: usize,
}

/// One line of model output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Header(RunHeader),
    Snapshot(Snapshot),
    Analysis(Analysis),
}

/// Receives the model's output as it is produced.
pub trait DataSink {
    fn write_header(&mut self, _header: &RunHeader) -> Result<()> {
        Ok(())
    }
    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<()>;
    fn write_analysis(&mut self, analysis: &Analysis) -> Result<()>;
}

/// Keeps every record in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub header: Option<RunHeader>,
    pub snapshots: Vec<Snapshot>,
    pub analyses: Vec<Analysis>,
}

impl DataSink for MemorySink {
    fn write_header(&mut self, header: &RunHeader) -> Result<()> {
        self.header = Some(header.clone());
        Ok(())
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.snapshots.push(snapshot.clone());
        Ok(())
    }

    fn write_analysis(&mut self, analysis: &Analysis) -> Result<()> {
        self.analyses.push(analysis.clone());
        Ok(())
    }
}
