//! Random draws, property distributions and the age-dependent
//! susceptibility curve.
//!
//! Every helper takes the generator explicitly so the caller controls the
//! consumption order of the single simulation stream.

use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_config, Result};

/// Uniform integer in `[a, b)`.
pub fn rand_int<R: Rng>(a: usize, b: usize, rng: &mut R) -> usize {
    rng.gen_range(a..b)
}

/// Uniform real in `[a, b]`.
pub fn rand_double<R: Rng>(a: f64, b: f64, rng: &mut R) -> f64 {
    rng.gen_range(a..=b)
}

/// Uniform real in `[0, 1)`, the probability draw used by every revision.
pub fn rand_prob<R: Rng>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Normally distributed real. A degenerate `sigma` collapses onto `mu`.
pub fn gaussian<R: Rng>(mu: f64, sigma: f64, rng: &mut R) -> f64 {
    match Normal::new(mu, sigma) {
        Ok(normal) => normal.sample(rng),
        Err(_) => mu,
    }
}

/// Upper bound on the redraws of [`truncated_gaussian`].
pub const MAX_RESAMPLES: usize = 10_000;

/// Smallest standard deviation a configured gaussian may have.
pub const MIN_STDDEV: f64 = 1e-3;

/// Gaussian draw resampled until it lies strictly inside `(0, 1)`. Gives up
/// after [`MAX_RESAMPLES`] draws and returns `mu` pulled inside the interval.
pub fn truncated_gaussian<R: Rng>(mu: f64, sigma: f64, rng: &mut R) -> f64 {
    for _ in 0..MAX_RESAMPLES {
        let value = gaussian(mu, sigma, rng);
        if value > 0.0 && value < 1.0 {
            return value;
        }
    }
    tracing::warn!(mu, sigma, "Truncated gaussian did not land in (0, 1), using the mean");
    mu.clamp(f64::EPSILON, 1.0 - f64::EPSILON)
}

/// Draws from a closed interval; a zero-width interval returns its bound
/// without touching the generator.
pub fn uniform_in<R: Rng>(interval: (f64, f64), rng: &mut R) -> f64 {
    let (low, high) = interval;
    if low == high {
        low
    } else if high > low {
        rand_double(low, high, rng)
    } else {
        tracing::error!(low, high, "upper limit has to be higher than the lower");
        0.0
    }
}

/// Peaked rational curve mapping age to susceptibility.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SusceptibilityCurve {
    /// Age at which susceptibility is maximal.
    pub peak: f64,
    /// Susceptibility at age zero.
    pub val_at_0: f64,
    /// Susceptibility at the peak age.
    pub val_at_peak: f64,
}

impl Default for SusceptibilityCurve {
    fn default() -> Self {
        Self {
            peak: 20.0,
            val_at_0: 0.3,
            val_at_peak: 0.6,
        }
    }
}

impl SusceptibilityCurve {
    /// The curve must peak at a positive age with a positive maximum, and
    /// start no higher than it peaks.
    pub fn validate(&self) -> Result<()> {
        ensure_config!(
            self.peak > 0.0 && self.peak.is_finite(),
            "Invalid value for 'peak': age value must be greater than 0, got {}",
            self.peak
        );
        ensure_config!(
            self.val_at_0 > 0.0 && self.val_at_0 <= 1.0,
            "Invalid susceptibility value val_at_0: must be in (0, 1], got {}",
            self.val_at_0
        );
        ensure_config!(
            self.val_at_peak > 0.0 && self.val_at_peak <= 1.0,
            "Invalid susceptibility value val_at_peak: must be in (0, 1], got {}",
            self.val_at_peak
        );
        ensure_config!(
            self.val_at_0 <= self.val_at_peak,
            "val_at_0 ({}) must not exceed val_at_peak ({})",
            self.val_at_0,
            self.val_at_peak
        );
        Ok(())
    }

    /// Susceptibility at `age`.
    #[must_use]
    pub fn at(&self, age: f64) -> f64 {
        let c = 1.0 / self.val_at_peak;
        let b = (1.0 - c * self.val_at_0) / (c * self.val_at_0 * self.peak.powi(2));
        1.0 / (c * (1.0 + b * (age - self.peak).powi(2)))
    }
}

/// Values a vertex property may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admissible {
    /// `[0, 1]`: opinions, susceptibilities, persuasiveness.
    Unit,
    /// `(0, 1]`: tolerances.
    PositiveUnit,
}

impl Admissible {
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        match self {
            Self::Unit => (0.0..=1.0).contains(&value),
            Self::PositiveUnit => value > 0.0 && value <= 1.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Unit => "[0, 1]",
            Self::PositiveUnit => "(0, 1]",
        }
    }
}

/// How an initial vertex property is drawn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "distribution_type", rename_all = "kebab-case")]
pub enum Distribution {
    Constant { const_val: f64 },
    Uniform { uniform_int: (f64, f64) },
    Gaussian { mean: f64, stddev: f64 },
    /// Only meaningful for users, whose age is known.
    AgeDependent { custom: SusceptibilityCurve },
}

impl Distribution {
    /// Checks the parameters and that every value the distribution can
    /// produce lies in `range`. Gaussian and age-dependent draws always
    /// fall inside `(0, 1]`.
    pub fn validate(&self, name: &str, range: Admissible) -> Result<()> {
        match self {
            Self::Constant { const_val } => {
                ensure_config!(
                    range.contains(*const_val),
                    "{name}: constant value must be in {}, got {const_val}",
                    range.label()
                );
            }
            Self::Uniform { uniform_int } => {
                let (low, high) = *uniform_int;
                ensure_config!(
                    high >= low,
                    "{name}: upper limit has to be higher than the lower, got [{low}, {high}]"
                );
                ensure_config!(
                    range.contains(low) && range.contains(high),
                    "{name}: interval [{low}, {high}] must lie in {}",
                    range.label()
                );
            }
            Self::Gaussian { mean, stddev } => {
                ensure_config!(
                    *stddev >= MIN_STDDEV && stddev.is_finite(),
                    "{name}: stddev must be at least {MIN_STDDEV}, got {stddev}"
                );
                ensure_config!(
                    *mean > 0.0 && *mean < 1.0,
                    "{name}: mean of a truncated gaussian must be in (0, 1), got {mean}"
                );
            }
            Self::AgeDependent { custom } => {
                custom.validate().map_err(|e| e.with_context(name))?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_age_dependent(&self) -> bool {
        matches!(self, Self::AgeDependent { .. })
    }

    /// Draws a value. Age-dependent distributions evaluate the curve at
    /// `age`; without an age they fall back to the curve's peak value.
    pub fn sample<R: Rng>(&self, age: Option<u32>, rng: &mut R) -> f64 {
        match self {
            Self::Constant { const_val } => *const_val,
            Self::Uniform { uniform_int } => uniform_in(*uniform_int, rng),
            Self::Gaussian { mean, stddev } => truncated_gaussian(*mean, *stddev, rng),
            Self::AgeDependent { custom } => match age {
                Some(age) => custom.at(f64::from(age)),
                None => custom.val_at_peak,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_susceptibility_curve_hits_anchor_points() {
        let curve = SusceptibilityCurve {
            peak: 40.0,
            val_at_0: 0.1,
            val_at_peak: 0.9,
        };
        assert!((curve.at(40.0) - 0.9).abs() < 1e-12);
        assert!((curve.at(0.0) - 0.1).abs() < 1e-12);
        assert!(curve.at(20.0) > 0.1 && curve.at(20.0) < 0.9);
        assert!(curve.at(80.0) < curve.at(60.0));
    }

    #[test]
    fn test_curve_validation() {
        let mut curve = SusceptibilityCurve::default();
        assert!(curve.validate().is_ok());
        curve.peak = -1.0;
        assert!(curve.validate().is_err());
        curve.peak = 30.0;
        curve.val_at_0 = 1.2;
        assert!(curve.validate().is_err());
        curve.val_at_0 = 0.2;
        curve.val_at_peak = -0.1;
        assert!(curve.validate().is_err());
    }

    #[test]
    fn test_degenerate_curves_are_rejected() {
        let zero_start = SusceptibilityCurve {
            peak: 40.0,
            val_at_0: 0.0,
            val_at_peak: 0.9,
        };
        assert!(zero_start.validate().is_err());

        let zero_peak = SusceptibilityCurve {
            val_at_0: 0.1,
            val_at_peak: 0.0,
            ..zero_start
        };
        assert!(zero_peak.validate().is_err());

        let peak_at_birth = SusceptibilityCurve {
            peak: 0.0,
            val_at_0: 0.1,
            val_at_peak: 0.9,
        };
        assert!(peak_at_birth.validate().is_err());

        let start_above_peak = SusceptibilityCurve {
            peak: 40.0,
            val_at_0: 0.9,
            val_at_peak: 0.5,
        };
        assert!(start_above_peak.validate().is_err());
    }

    #[test]
    fn test_valid_curve_stays_in_unit_interval() {
        let curve = SusceptibilityCurve {
            peak: 40.0,
            val_at_0: 0.05,
            val_at_peak: 0.9,
        };
        assert!(curve.validate().is_ok());
        for age in 0..1000 {
            let s = curve.at(f64::from(age));
            assert!(s > 0.0 && s <= 0.9 + 1e-12, "age {} gives {}", age, s);
        }
    }

    #[test]
    fn test_distribution_ranges() {
        let wide = Distribution::Uniform {
            uniform_int: (0.0, 3.0),
        };
        assert!(wide.validate("opinion.users", Admissible::Unit).is_err());

        let unit = Distribution::Uniform {
            uniform_int: (0.0, 1.0),
        };
        assert!(unit.validate("opinion.users", Admissible::Unit).is_ok());
        assert!(unit
            .validate("tolerance.users", Admissible::PositiveUnit)
            .is_err());

        let zero = Distribution::Constant { const_val: 0.0 };
        assert!(zero.validate("susceptibility.users", Admissible::Unit).is_ok());
        assert!(zero
            .validate("tolerance.users", Admissible::PositiveUnit)
            .is_err());

        let negative = Distribution::Constant { const_val: -0.1 };
        assert!(negative.validate("opinion.media", Admissible::Unit).is_err());
    }

    #[test]
    fn test_gaussian_near_boundary_is_rejected() {
        let pinned = Distribution::Gaussian {
            mean: 1.0,
            stddev: 1e-20,
        };
        assert!(pinned.validate("tolerance.users", Admissible::PositiveUnit).is_err());
        let narrow = Distribution::Gaussian {
            mean: 0.5,
            stddev: 1e-20,
        };
        assert!(narrow.validate("tolerance.users", Admissible::PositiveUnit).is_err());
    }

    #[test]
    fn test_truncated_gaussian_terminates_on_the_boundary() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let value = truncated_gaussian(1.0, 1e-20, &mut rng);
        assert!(value > 0.0 && value < 1.0);
    }

    #[test]
    fn test_inits() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(uniform_in((0.8, 0.8), &mut rng), 0.8);

            let opinion = uniform_in((0.0, 1.0), &mut rng);
            assert!((0.0..=1.0).contains(&opinion));

            let s = truncated_gaussian(0.5, 0.2, &mut rng);
            assert!(s > 0.0 && s < 1.0);

            let age = rand_int(1, 100, &mut rng);
            assert!((1..100).contains(&age));
        }
    }

    #[test]
    fn test_distribution_parses_from_toml() {
        let dist: Distribution =
            toml::from_str("distribution_type = \"uniform\"\nuniform_int = [0.2, 0.4]").unwrap();
        assert_eq!(
            dist,
            Distribution::Uniform {
                uniform_int: (0.2, 0.4)
            }
        );

        let dist: Distribution = toml::from_str(
            "distribution_type = \"age-dependent\"\n[custom]\npeak = 40.0\nval_at_0 = 0.1\nval_at_peak = 0.9",
        )
        .unwrap();
        assert!(dist.is_age_dependent());
        assert!((dist.sample(Some(40), &mut ChaCha8Rng::seed_from_u64(1)) - 0.9).abs() < 1e-12);

        let unknown: std::result::Result<Distribution, _> =
            toml::from_str("distribution_type = \"poisson\"");
        assert!(unknown.is_err());
    }

    #[test]
    fn test_gaussian_validation() {
        let dist = Distribution::Gaussian {
            mean: 3.0,
            stddev: 0.1,
        };
        assert!(dist.validate("tolerance.users", Admissible::PositiveUnit).is_err());
        let dist = Distribution::Gaussian {
            mean: 0.5,
            stddev: 0.0,
        };
        assert!(dist.validate("tolerance.users", Admissible::PositiveUnit).is_err());
    }
}
