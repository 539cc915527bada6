use opinet::model::config::{GraphModel, OpDynConfig};
use opinet::model::opdyn::OpDyn;

#[allow(dead_code)]
pub struct OpDynBuilder {
    config: OpDynConfig,
}

#[allow(dead_code)]
impl OpDynBuilder {
    pub fn new() -> Self {
        let mut config = OpDynConfig::default();
        config.seed = Some(0);
        config.users.network.num_vertices = 50;
        config.users.network.mean_degree = 4;
        config.num_steps = 200;
        config.write_every = 50;
        Self { config }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn with_users(mut self, model: GraphModel, num_vertices: usize, mean_degree: usize) -> Self {
        self.config.users.network.model = model;
        self.config.users.network.num_vertices = num_vertices;
        self.config.users.network.mean_degree = mean_degree;
        self
    }

    pub fn with_media(mut self) -> Self {
        self.config.modes.media = true;
        self
    }

    pub fn with_ageing(mut self) -> Self {
        self.config.modes.user_ageing = true;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut OpDynConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn config(&self) -> &OpDynConfig {
        &self.config
    }

    pub fn build(self) -> OpDyn {
        OpDyn::new(self.config).expect("Failed to create model in test builder")
    }
}

/// Asserts every vertex with outgoing ties has weights summing to one.
#[allow(dead_code)]
pub fn assert_normalized(model: &OpDyn) {
    for v in 0..model.users.len() {
        if model.users.out_degree(v) > 0 {
            let sum = model.users.out_weight_sum(v);
            assert!(
                (sum - 1.0).abs() < 1e-9,
                "Weights of vertex {} sum to {}",
                v,
                sum
            );
        }
    }
}
