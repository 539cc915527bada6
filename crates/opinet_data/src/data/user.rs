use serde::{Deserialize, Serialize};

use crate::MediumId;

/// A single user of the social network.
///
/// Users occupy fixed vertex slots. Generational replacement overwrites the
/// record in place instead of allocating a new vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Current opinion in `[0, 1]`.
    pub opinion: f64,
    /// Radius of bounded confidence, in `(0, 1]`.
    pub tolerance: f64,
    /// Fraction of an opinion gap the user adopts per interaction.
    pub susceptibility: f64,
    /// Age in life cycles, starting at 1.
    pub age: u32,
    /// Medium the user currently consumes, if media are simulated.
    pub used_media: Option<MediumId>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            opinion: 0.5,
            tolerance: 1.0,
            susceptibility: 0.0,
            age: 1,
            used_media: None,
        }
    }
}

impl User {
    pub fn new(opinion: f64, tolerance: f64, susceptibility: f64, age: u32) -> Self {
        Self {
            opinion,
            tolerance,
            susceptibility,
            age,
            used_media: None,
        }
    }
}
