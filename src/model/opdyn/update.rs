use crate::model::opdyn::OpDyn;
use crate::model::snapshot::{Analysis, DataSink, RunHeader, Snapshot};
use crate::model::systems::media;
use std::time::Instant;

impl OpDyn {
    /// Runs the processes of one time step without advancing the clock.
    ///
    /// Order within a step:
    /// - one user revision
    /// - with media: one information revision, and a media revision every
    ///   `media_time_constant` steps
    /// - with ageing: one age-coupled user revision, and an ageing cycle
    ///   whenever `time % life_cycle == 1`
    pub fn perform_step(&mut self) {
        let span = self.span.clone();
        let _entered = span.enter();

        if let Some(report) = self.revision.revise(&mut self.users, false, &mut self.rng) {
            self.stats.record_revision(report.rewired, report.norm);
        }

        if let Some(media_nw) = self.media.as_mut() {
            let params = &self.config.parameters;
            if let Some(report) = media::information_revision(
                &mut self.users,
                media_nw,
                params.radicalisation_parameter,
                params.periodic_opinion_space,
                &mut self.rng,
            ) {
                if report.switched {
                    self.stats.record_medium_switch();
                }
            }
            if self.time % params.media_time_constant == 0
                && media::media_revision(media_nw, &mut self.rng).is_some()
            {
                self.stats.record_media_revision();
            }
        }

        if let Some(engine) = self.ageing.as_ref() {
            if let Some(report) = self.revision.revise(&mut self.users, true, &mut self.rng) {
                self.stats.record_revision(report.rewired, report.norm);
            }
            if self.time % self.config.parameters.life_cycle == 1 {
                let outcome = engine.run(&mut self.users, self.media.as_mut(), &mut self.rng);
                tracing::debug!(time = self.time, ?outcome, "Ageing cycle");
                self.stats.record_ageing(&outcome);
            }
        }
    }

    /// Performs one step and advances the clock.
    pub fn iterate(&mut self) {
        let start = Instant::now();
        self.perform_step();
        self.time += 1;
        self.stats.record_step(self.time, start.elapsed());
    }

    /// Iterates `num_steps` times, writing a snapshot at the start and every
    /// `write_every` steps, and the structure analysis at the end.
    pub fn run(&mut self, sink: &mut dyn DataSink) -> anyhow::Result<()> {
        let num_steps = self.config.num_steps;
        let write_every = self.config.write_every;
        tracing::info!(num_steps, write_every, "Starting run");

        sink.write_header(&self.header())?;
        sink.write_snapshot(&self.snapshot())?;
        for _ in 0..num_steps {
            self.iterate();
            if write_every > 0 && self.time % write_every == 0 {
                sink.write_snapshot(&self.snapshot())?;
            }
        }
        sink.write_analysis(&self.analyse())?;

        self.stats.log_summary();
        Ok(())
    }

    pub fn header(&self) -> RunHeader {
        RunHeader {
            started_at: chrono::Utc::now().to_rfc3339(),
            fingerprint: self.config.fingerprint(),
            seed: self.config.seed,
            mode: self.mode,
            num_users: self.num_users(),
            num_media: self.num_media(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            self.time,
            &self.users,
            self.media.as_ref(),
            self.rewiring_count(),
        )
    }

    pub fn analyse(&self) -> Analysis {
        let analysis = &self.config.analysis;
        Analysis::capture(
            self.time,
            &self.users,
            analysis.group_tolerance,
            analysis.min_weight,
        )
    }
}
