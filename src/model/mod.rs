pub use opinet_core::{init_logging, Mode, ModelError, OpDynConfig, RunStats};
pub use opinet_data::{Medium, MediumId, User};

pub mod analysis {
    pub use opinet_core::analysis::*;
}
pub mod builder {
    pub use opinet_core::builder::*;
}
pub mod config {
    pub use opinet_core::config::*;
}
pub mod network {
    pub use opinet_core::network::*;
}
pub mod snapshot {
    pub use opinet_core::snapshot::*;
}
pub mod systems {
    pub use opinet_core::systems::*;
}
pub mod utils {
    pub use opinet_core::utils::*;
}

pub mod opdyn;
