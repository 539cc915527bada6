use clap::Parser;
use opinet_core::snapshot::{Analysis, Record, RunHeader, Snapshot};
use petgraph::algo::{connected_components, kosaraju_scc};
use petgraph::graph::DiGraph;
use std::fs::File;
use std::io::{BufRead, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "output/run.jsonl")]
    input: String,

    #[arg(short, long, default_value = "report.md")]
    output: String,
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Analyzing opinion dynamics run {}...", args.input);

    // 1. Read records
    let reader = BufReader::new(File::open(&args.input)?);
    let mut header: Option<RunHeader> = None;
    let mut snapshots: Vec<Snapshot> = Vec::new();
    let mut analysis: Option<Analysis> = None;
    let mut skipped = 0;

    for line in reader.lines() {
        let l = line?;
        match serde_json::from_str::<Record>(&l) {
            Ok(Record::Header(h)) => header = Some(h),
            Ok(Record::Snapshot(s)) => snapshots.push(s),
            Ok(Record::Analysis(a)) => analysis = Some(a),
            Err(_) => skipped += 1,
        }
    }

    let Some(last) = snapshots.last() else {
        anyhow::bail!("No snapshots found in {}", args.input);
    };

    // 2. Opinion trajectory
    let trajectory = snapshots
        .iter()
        .map(|s| {
            let (mean, std) = mean_and_std(&s.opinions);
            format!(
                "| {} | {:.4} | {:.4} | {} |\n",
                s.time, mean, std, s.rewiring_count
            )
        })
        .collect::<Vec<_>>()
        .join("");

    // 3. Final structure
    let structure = match &analysis {
        Some(a) => {
            let mut graph = DiGraph::<usize, f64>::new();
            let nodes: Vec<_> = (0..last.opinions.len()).map(|v| graph.add_node(v)).collect();
            for &(u, v, w) in &a.edges {
                if u < nodes.len() && v < nodes.len() {
                    graph.add_edge(nodes[u], nodes[v], w);
                }
            }
            let max_bc = a
                .relative_betweenness
                .iter()
                .cloned()
                .fold(0.0_f64, f64::max);
            format!(
                "- **Opinion Clusters**: {} (sizes {:?})\n\
                - **Weighted Opinion Clusters**: {}\n\
                - **Opinion Groups**: {}\n\
                - **Closed Communities**: {}\n\
                - **Reciprocity**: {:.4}\n\
                - **Max Relative Betweenness**: {:.4}\n\
                - **Weak Components**: {}\n\
                - **Strong Components**: {}\n",
                a.num_opinion_clusters,
                a.opinion_cluster_sizes,
                a.num_weighted_opinion_clusters,
                a.num_opinion_groups,
                a.num_closed_communities,
                a.reciprocity,
                max_bc,
                connected_components(&graph),
                kosaraju_scc(&graph).len()
            )
        }
        None => "No final analysis record.\n".to_string(),
    };

    // 4. Media
    let media = match &last.media {
        Some(m) => m
            .opinions
            .iter()
            .zip(&m.users)
            .zip(&m.ads_normalized)
            .enumerate()
            .map(|(i, ((op, users), share))| {
                format!("| {} | {:.4} | {} | {:.4} |\n", i, op, users, share)
            })
            .collect::<Vec<_>>()
            .join(""),
        None => "No media in this run.\n".to_string(),
    };

    let (mode, fingerprint, seed) = match &header {
        Some(h) => (
            format!("{:?}", h.mode),
            h.fingerprint.clone(),
            h.seed.map_or_else(|| "entropy".to_string(), |s| s.to_string()),
        ),
        None => ("unknown".into(), "unknown".into(), "unknown".into()),
    };

    let report = format!(
        "# Opinion Dynamics Report\n\n\
        ## Run\n\
        - **Mode**: {}\n\
        - **Seed**: {}\n\
        - **Config Fingerprint**: {}\n\
        - **Users**: {}\n\
        - **Final Time**: {}\n\
        - **Skipped Lines**: {}\n\n\
        ## Opinion Trajectory\n\
        | time | mean | std | rewirings |\n\
        |---|---|---|---|\n\
        {}\n\
        ## Final Structure\n\
        {}\n\
        ## Media\n\
        | medium | opinion | users | ad share |\n\
        |---|---|---|---|\n\
        {}",
        mode,
        seed,
        fingerprint,
        last.opinions.len(),
        last.time,
        skipped,
        trajectory,
        structure,
        media
    );

    std::fs::write(&args.output, report)?;
    println!("Report generated: {}", args.output);

    Ok(())
}
