//! Configuration management for the opinion dynamics model.
//!
//! Strongly-typed structures that map onto a TOML document. Every section
//! falls back to its `Default` when it is omitted.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! seed = 42
//! num_steps = 10000
//! write_every = 100
//!
//! [modes]
//! user_ageing = true
//! media = true
//!
//! [users.network]
//! model = "erdos-renyi"
//! num_vertices = 500
//! mean_degree = 10
//!
//! [parameters]
//! rewiring = 0.2
//! weighting = 0.5
//!
//! [opinion.users]
//! distribution_type = "uniform"
//! uniform_int = [0.0, 1.0]
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ensure_config, ModelError, Result};
use crate::utils::{Admissible, Distribution, SusceptibilityCurve};

/// Which optional processes run on top of the user revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Mode {
    #[default]
    None,
    Media,
    Ageing,
    AgeingAndMedia,
}

impl Mode {
    pub fn from_flags(user_ageing: bool, media: bool) -> Self {
        match (user_ageing, media) {
            (false, false) => Self::None,
            (false, true) => Self::Media,
            (true, false) => Self::Ageing,
            (true, true) => Self::AgeingAndMedia,
        }
    }

    #[must_use]
    pub fn has_media(self) -> bool {
        matches!(self, Self::Media | Self::AgeingAndMedia)
    }

    #[must_use]
    pub fn has_ageing(self) -> bool {
        matches!(self, Self::Ageing | Self::AgeingAndMedia)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ModesConfig {
    pub user_ageing: bool,
    pub media: bool,
}

/// Random graph family used to seed a network.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GraphModel {
    /// G(n, m) with `m` derived from the mean degree.
    ErdosRenyi,
    /// Ring lattice: every vertex linked to its `k` nearest neighbours.
    Regular,
    Complete,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct NetworkConfig {
    pub model: GraphModel,
    pub num_vertices: usize,
    pub mean_degree: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct UsersConfig {
    pub network: NetworkConfig,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                model: GraphModel::ErdosRenyi,
                num_vertices: 200,
                mean_degree: 8,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct MediaConfig {
    pub network: NetworkConfig,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                model: GraphModel::Complete,
                num_vertices: 4,
                mean_degree: 3,
            },
        }
    }
}

/// Dynamics parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ParametersConfig {
    /// Exponent scale of the tolerance update; 0 freezes tolerance.
    pub radicalisation_parameter: f64,
    /// Probability of cutting a tie outside the confidence bound.
    pub rewiring: f64,
    /// How strongly opinion distance erodes a tie's weight.
    pub weighting: f64,
    /// Steps between two ageing cycles.
    pub life_cycle: u64,
    /// Fraction of users replaced per ageing cycle.
    pub replacement_rate: f64,
    /// Steps between two media revisions.
    pub media_time_constant: u64,
    pub init_ads: (f64, f64),
    /// Interval the media attraction weights are drawn from.
    pub attr: (f64, f64),
    pub periodic_opinion_space: bool,
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            radicalisation_parameter: 0.0,
            rewiring: 0.2,
            weighting: 0.5,
            life_cycle: 100,
            replacement_rate: 0.01,
            media_time_constant: 10,
            init_ads: (0.0, 0.0),
            attr: (0.1, 1.0),
            periodic_opinion_space: false,
        }
    }
}

/// Inclusive age ranges of the three generations.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct AgeGroupsConfig {
    pub children: (u32, u32),
    pub parents: (u32, u32),
    pub seniors: (u32, u32),
}

impl Default for AgeGroupsConfig {
    fn default() -> Self {
        Self {
            children: (0, 10),
            parents: (20, 40),
            seniors: (70, 1000),
        }
    }
}

/// Parameters of the final structure analysis.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Opinion gap that separates two opinion groups.
    pub group_tolerance: f64,
    /// Minimal scaled tie weight for weighted clusters; negative selects
    /// the default.
    pub min_weight: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            group_tolerance: 0.1,
            min_weight: -1.0,
        }
    }
}

/// Initial distribution of one vertex property. `media` may be left out
/// when media are not simulated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PropertyConfig {
    pub users: Distribution,
    #[serde(default)]
    pub media: Option<Distribution>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MediaPropertyConfig {
    pub media: Distribution,
}

impl Default for MediaPropertyConfig {
    fn default() -> Self {
        Self {
            media: Distribution::Constant { const_val: 0.5 },
        }
    }
}

/// Top-level model configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OpDynConfig {
    /// Seed of the single simulation stream; drawn from entropy when absent.
    pub seed: Option<u64>,
    pub num_steps: u64,
    pub write_every: u64,
    pub modes: ModesConfig,
    pub users: UsersConfig,
    pub media: MediaConfig,
    pub parameters: ParametersConfig,
    pub age_groups: AgeGroupsConfig,
    pub opinion: PropertyConfig,
    pub tolerance: PropertyConfig,
    pub susceptibility: PropertyConfig,
    pub persuasiveness: MediaPropertyConfig,
    pub analysis: AnalysisConfig,
}

impl Default for OpDynConfig {
    fn default() -> Self {
        Self {
            seed: None,
            num_steps: 1000,
            write_every: 100,
            modes: ModesConfig::default(),
            users: UsersConfig::default(),
            media: MediaConfig::default(),
            parameters: ParametersConfig::default(),
            age_groups: AgeGroupsConfig::default(),
            opinion: PropertyConfig {
                users: Distribution::Uniform {
                    uniform_int: (0.0, 1.0),
                },
                media: Some(Distribution::Uniform {
                    uniform_int: (0.0, 1.0),
                }),
            },
            tolerance: PropertyConfig {
                users: Distribution::Constant { const_val: 0.2 },
                media: Some(Distribution::Constant { const_val: 0.2 }),
            },
            susceptibility: PropertyConfig {
                users: Distribution::AgeDependent {
                    custom: SusceptibilityCurve::default(),
                },
                media: Some(Distribution::Constant { const_val: 0.1 }),
            },
            persuasiveness: MediaPropertyConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

fn ensure_probability(name: &str, value: f64) -> Result<()> {
    ensure_config!(
        (0.0..=1.0).contains(&value),
        "{name} must be in [0, 1], got {value}"
    );
    Ok(())
}

fn ensure_ordered(name: &str, range: (u32, u32)) -> Result<()> {
    ensure_config!(
        range.0 <= range.1,
        "age group '{name}' is not ordered: [{}, {}]",
        range.0,
        range.1
    );
    Ok(())
}

impl OpDynConfig {
    #[must_use]
    pub fn mode(&self) -> Mode {
        Mode::from_flags(self.modes.user_ageing, self.modes.media)
    }

    /// Validates all configuration parameters, reporting the first failure.
    ///
    /// # Validation Rules
    /// - Probabilities must be in `[0, 1]`, periods positive
    /// - `|radicalisation_parameter| <= 4`
    /// - Opinions, susceptibilities and persuasiveness are drawn from `[0, 1]`,
    ///   tolerances from `(0, 1]`
    /// - Age groups must be ordered and disjoint
    /// - Ageing needs an age-dependent user susceptibility
    /// - Media need at least one outlet and a distribution for every media
    ///   property, none of them age-dependent
    pub fn validate(&self) -> Result<()> {
        let mode = self.mode();
        let p = &self.parameters;

        ensure_config!(self.write_every > 0, "write_every must be positive");
        ensure_config!(
            self.users.network.num_vertices > 0,
            "The user network needs at least one vertex"
        );

        ensure_probability("rewiring", p.rewiring)?;
        ensure_config!(
            p.weighting >= 0.0 && p.weighting.is_finite(),
            "weighting must be non-negative, got {}",
            p.weighting
        );
        // Keeps the tolerance exponent `1 + k (y^2 - x^2)` non-negative.
        ensure_config!(
            p.radicalisation_parameter.abs() <= 4.0,
            "radicalisation_parameter must be in [-4, 4], got {}",
            p.radicalisation_parameter
        );

        ensure_config!(
            self.analysis.group_tolerance > 0.0,
            "analysis.group_tolerance must be positive"
        );

        self.opinion.users.validate("opinion.users", Admissible::Unit)?;
        self.tolerance
            .users
            .validate("tolerance.users", Admissible::PositiveUnit)?;
        self.susceptibility
            .users
            .validate("susceptibility.users", Admissible::Unit)?;

        if mode.has_ageing() {
            // Ageing fires when `time % life_cycle == 1`.
            ensure_config!(p.life_cycle > 1, "life_cycle must be at least 2");
            ensure_config!(
                p.replacement_rate > 0.0 && p.replacement_rate < 1.0,
                "replacement_rate must be in (0, 1), got {}",
                p.replacement_rate
            );
            let g = &self.age_groups;
            ensure_ordered("children", g.children)?;
            ensure_ordered("parents", g.parents)?;
            ensure_ordered("seniors", g.seniors)?;
            ensure_config!(
                g.children.1 < g.parents.0 && g.parents.1 < g.seniors.0,
                "age groups must not overlap"
            );
            ensure_config!(
                self.susceptibility.users.is_age_dependent(),
                "user ageing requires an age-dependent user susceptibility"
            );
        }

        if mode.has_media() {
            ensure_config!(
                p.media_time_constant > 0,
                "media_time_constant must be positive"
            );
            ensure_config!(
                self.media.network.num_vertices > 0,
                "The media network needs at least one vertex"
            );
            ensure_config!(
                p.init_ads.0 >= 0.0 && p.init_ads.0 <= p.init_ads.1,
                "init_ads must be an ordered non-negative interval"
            );
            ensure_config!(
                p.attr.0 >= 0.0 && p.attr.0 <= p.attr.1,
                "attr must be an ordered non-negative interval"
            );

            for (name, dist, range) in [
                ("opinion.media", self.opinion.media.as_ref(), Admissible::Unit),
                (
                    "tolerance.media",
                    self.tolerance.media.as_ref(),
                    Admissible::PositiveUnit,
                ),
                (
                    "susceptibility.media",
                    self.susceptibility.media.as_ref(),
                    Admissible::Unit,
                ),
                (
                    "persuasiveness.media",
                    Some(&self.persuasiveness.media),
                    Admissible::Unit,
                ),
            ] {
                let dist = dist.ok_or_else(|| {
                    ModelError::invalid_config(format!("{name} must be configured when media are enabled"))
                })?;
                ensure_config!(
                    !dist.is_age_dependent(),
                    "{name}: age-dependent distributions are only available for users"
                );
                dist.validate(name, range)?;
            }
        }

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The age curve used for user susceptibility, if age-dependent.
    #[must_use]
    pub fn susceptibility_curve(&self) -> Option<SusceptibilityCurve> {
        match self.susceptibility.users {
            Distribution::AgeDependent { custom } => Some(custom),
            _ => None,
        }
    }

    /// SHA-256 over the sections that shape the dynamics. Seed and run
    /// length are excluded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.modes).as_bytes());
        hasher.update(format!("{:?}", self.users).as_bytes());
        hasher.update(format!("{:?}", self.media).as_bytes());
        hasher.update(format!("{:?}", self.parameters).as_bytes());
        hasher.update(format!("{:?}", self.age_groups).as_bytes());
        hasher.update(format!("{:?}", self.opinion).as_bytes());
        hasher.update(format!("{:?}", self.tolerance).as_bytes());
        hasher.update(format!("{:?}", self.susceptibility).as_bytes());
        hasher.update(format!("{:?}", self.persuasiveness).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = OpDynConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode(), Mode::None);
    }

    #[test]
    fn test_invalid_rewiring() {
        let config = OpDynConfig {
            parameters: ParametersConfig {
                rewiring: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_replacement_rate_checked_only_with_ageing() {
        let mut config = OpDynConfig {
            parameters: ParametersConfig {
                replacement_rate: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        config.modes.user_ageing = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ageing_requires_age_dependent_susceptibility() {
        let mut config = OpDynConfig::default();
        config.modes.user_ageing = true;
        assert!(config.validate().is_ok());
        config.susceptibility.users = Distribution::Constant { const_val: 0.3 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlapping_age_groups() {
        let mut config = OpDynConfig::default();
        config.modes.user_ageing = true;
        config.age_groups.parents = (5, 40);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_media_properties_must_not_be_age_dependent() {
        let mut config = OpDynConfig::default();
        config.modes.media = true;
        assert!(config.validate().is_ok());
        config.tolerance.media = Some(Distribution::AgeDependent {
            custom: SusceptibilityCurve::default(),
        });
        assert!(config.validate().is_err());
        config.tolerance.media = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_radicalisation_parameter_bounds() {
        let mut config = OpDynConfig::default();
        config.parameters.radicalisation_parameter = 4.0;
        assert!(config.validate().is_ok());
        config.parameters.radicalisation_parameter = -4.0;
        assert!(config.validate().is_ok());
        config.parameters.radicalisation_parameter = 8.0;
        assert!(config.validate().is_err());
        config.parameters.radicalisation_parameter = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_user_properties_out_of_range() {
        let mut config = OpDynConfig::default();
        config.opinion.users = Distribution::Uniform {
            uniform_int: (0.0, 3.0),
        };
        assert!(config.validate().is_err());

        let mut config = OpDynConfig::default();
        config.tolerance.users = Distribution::Constant { const_val: 0.0 };
        assert!(config.validate().is_err());

        let mut config = OpDynConfig::default();
        config.susceptibility.users = Distribution::Constant { const_val: 1.5 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_media_properties_out_of_range() {
        let mut config = OpDynConfig::default();
        config.modes.media = true;
        config.persuasiveness.media = Distribution::Constant { const_val: 2.0 };
        assert!(config.validate().is_err());

        let mut config = OpDynConfig::default();
        config.modes.media = true;
        config.opinion.media = Some(Distribution::Uniform {
            uniform_int: (-0.5, 0.5),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_degenerate_curve_names_the_property() {
        let mut config = OpDynConfig::default();
        config.susceptibility.users = Distribution::AgeDependent {
            custom: SusceptibilityCurve {
                peak: 20.0,
                val_at_0: 0.0,
                val_at_peak: 0.6,
            },
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("susceptibility.users"));
    }

    #[test]
    fn test_from_toml() {
        let config = OpDynConfig::from_toml(
            r#"
seed = 7
num_steps = 500

[modes]
media = true

[users.network]
model = "regular"
num_vertices = 50
mean_degree = 4

[media.network]
model = "complete"
num_vertices = 3
mean_degree = 2

[parameters]
rewiring = 0.1
periodic_opinion_space = true

[tolerance.users]
distribution_type = "gaussian"
mean = 0.3
stddev = 0.05

[tolerance.media]
distribution_type = "constant"
const_val = 0.25
"#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.mode(), Mode::Media);
        assert_eq!(config.users.network.model, GraphModel::Regular);
        assert_eq!(config.parameters.rewiring, 0.1);
        assert_eq!(config.parameters.weighting, 0.5);
        assert!(config.parameters.periodic_opinion_space);
        assert_eq!(config.write_every, 100);
    }

    #[test]
    fn test_unknown_graph_model_is_a_parse_error() {
        let err = OpDynConfig::from_toml(
            "[users.network]\nmodel = \"barabasi\"\nnum_vertices = 10\nmean_degree = 2",
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
    }

    #[test]
    fn test_fingerprint_consistency() {
        let config1 = OpDynConfig::default();
        let mut config2 = OpDynConfig::default();
        config2.seed = Some(99);
        assert_eq!(config1.fingerprint(), config2.fingerprint());
        config2.parameters.weighting = 0.7;
        assert_ne!(config1.fingerprint(), config2.fingerprint());
    }
}
