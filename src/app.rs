use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::OpDynConfig;
use crate::model::opdyn::OpDyn;
use crate::output::{JsonlSink, NullSink};

/// Settings a run takes from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub steps: Option<u64>,
    pub output: Option<PathBuf>,
}

/// Reads and validates a TOML configuration. Without a path the defaults
/// are used.
pub fn load_config(path: Option<&Path>) -> Result<OpDynConfig> {
    let Some(path) = path else {
        return Ok(OpDynConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = OpDynConfig::from_toml(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

pub struct App {
    pub model: OpDyn,
    output: Option<PathBuf>,
}

impl App {
    pub fn new(options: RunOptions) -> Result<Self> {
        let mut config = load_config(options.config.as_deref())?;
        if options.seed.is_some() {
            config.seed = options.seed;
        }
        if let Some(steps) = options.steps {
            config.num_steps = steps;
        }
        let model = OpDyn::new(config)?;
        Ok(Self {
            model,
            output: options.output,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        match &self.output {
            Some(path) => {
                let mut sink = JsonlSink::create(path)
                    .with_context(|| format!("Failed to open output {}", path.display()))?;
                self.model.run(&mut sink)?;
                tracing::info!(lines = sink.lines(), path = %path.display(), "Output written");
            }
            None => self.model.run(&mut NullSink)?,
        }
        Ok(())
    }
}
