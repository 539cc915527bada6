use serde::{Deserialize, Serialize};

/// A media outlet competing for an audience.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Medium {
    pub opinion: f64,
    pub tolerance: f64,
    /// Editorial flexibility: how far the outlet follows a competitor.
    pub susceptibility: f64,
    /// Scales the pull the outlet exerts on its audience.
    pub persuasiveness: f64,
    /// Raw advertising spend.
    pub ads: f64,
    /// Share of the total spend; used as selection probability.
    pub ads_normalized: f64,
    /// Current audience size.
    pub users: u32,
    /// Audience size at the previous revision of this outlet.
    pub users_previous: u32,
}

impl Medium {
    pub fn new(opinion: f64, tolerance: f64, susceptibility: f64, persuasiveness: f64) -> Self {
        Self {
            opinion,
            tolerance,
            susceptibility,
            persuasiveness,
            ..Default::default()
        }
    }
}
