//! Run statistics and logging setup.

use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;

use crate::network::WeightNorm;
use crate::systems::ageing::AgeingOutcome;

/// Counters collected over a run.
#[derive(Debug, Clone)]
pub struct RunStats {
    steps: u64,
    revisions: u64,
    rewirings: u64,
    degenerate_normalisations: u64,
    media_revisions: u64,
    medium_switches: u64,
    ageing_cycles: u64,
    ageing_skips: u64,
    start_time: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: 0,
            revisions: 0,
            rewirings: 0,
            degenerate_normalisations: 0,
            media_revisions: 0,
            medium_switches: 0,
            ageing_cycles: 0,
            ageing_skips: 0,
            start_time: Instant::now(),
        }
    }

    /// Records a completed step with its duration.
    pub fn record_step(&mut self, time: u64, duration: Duration) {
        self.steps += 1;

        // Log at info level every 1000 steps
        if self.steps.is_multiple_of(1000) {
            tracing::info!(
                time,
                rewirings = self.rewirings,
                degenerate = self.degenerate_normalisations,
                duration_us = duration.as_micros() as u64,
                "Simulation step"
            );
        }
    }

    pub fn record_revision(&mut self, rewired: usize, norm: WeightNorm) {
        self.revisions += 1;
        self.rewirings += rewired as u64;
        if norm == WeightNorm::ZeroMass {
            self.degenerate_normalisations += 1;
        }
    }

    pub fn record_media_revision(&mut self) {
        self.media_revisions += 1;
    }

    pub fn record_medium_switch(&mut self) {
        self.medium_switches += 1;
    }

    pub fn record_ageing(&mut self, outcome: &AgeingOutcome) {
        match outcome {
            AgeingOutcome::NoParents { .. } => self.ageing_skips += 1,
            AgeingOutcome::Completed { .. } => self.ageing_cycles += 1,
        }
    }

    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[must_use]
    pub fn revisions(&self) -> u64 {
        self.revisions
    }

    #[must_use]
    pub fn rewirings(&self) -> u64 {
        self.rewirings
    }

    #[must_use]
    pub fn degenerate_normalisations(&self) -> u64 {
        self.degenerate_normalisations
    }

    #[must_use]
    pub fn media_revisions(&self) -> u64 {
        self.media_revisions
    }

    #[must_use]
    pub fn medium_switches(&self) -> u64 {
        self.medium_switches
    }

    #[must_use]
    pub fn ageing_cycles(&self) -> u64 {
        self.ageing_cycles
    }

    #[must_use]
    pub fn ageing_skips(&self) -> u64 {
        self.ageing_skips
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs a one-line summary of the run so far.
    pub fn log_summary(&self) {
        tracing::info!(
            steps = self.steps,
            revisions = self.revisions,
            rewirings = self.rewirings,
            degenerate = self.degenerate_normalisations,
            media_revisions = self.media_revisions,
            switches = self.medium_switches,
            ageing_cycles = self.ageing_cycles,
            ageing_skips = self.ageing_skips,
            elapsed_ms = self.elapsed().as_millis() as u64,
            "Run summary"
        );
    }
}

/// Initialize tracing subscriber for logging. `RUST_LOG` takes precedence
/// over `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}
