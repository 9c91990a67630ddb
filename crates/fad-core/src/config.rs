//! Configuration
//!
//! FAD tuning is loaded from a TOML file (`fad_tuning.toml`). Every section
//! has defaults, so a partial file only overrides what it names.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use fad_events::ActionClass;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attractor::{
    AttractionGates, AttractionProbability, CatchabilityPenalty, FishAttractor,
    LinearBiomassAttractor, LogisticBiomassAttractor, ProbabilisticAbundanceAttractor,
    SelectivityAbundanceAttractor, SelectivityCurve,
};
use crate::biology::{GlobalBiology, LocalBiology, Species, StructuredAbundance};
use crate::capacity::{CapacityDistribution, CarryingCapacityInitializer};
use crate::deactivation::{FadDeactivationStrategy, FadRanking};
use crate::error::FadError;
use crate::fad::LastMomentCatchability;
use crate::initializer::StoreKind;
use crate::regulation::{ActiveFadLimit, RegulationSet, SeasonalClosure, YearlyActionLimit};
use crate::sea::SeaGrid;

/// Errors that can occur while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Fad(#[from] FadError),
}

/// Complete FAD simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FadConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Species in index order
    #[serde(default = "default_species")]
    pub species: Vec<SpeciesConfig>,
    #[serde(default)]
    pub sea: SeaConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub capacity: CapacityConfig,
    #[serde(default)]
    pub attractor: AttractorConfig,
    #[serde(default)]
    pub fads: FadsConfig,
    #[serde(default)]
    pub regulations: RegulationsConfig,
    #[serde(default)]
    pub deactivation: DeactivationConfig,
}

impl Default for FadConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            species: default_species(),
            sea: SeaConfig::default(),
            fleet: FleetConfig::default(),
            capacity: CapacityConfig::default(),
            attractor: AttractorConfig::default(),
            fads: FadsConfig::default(),
            regulations: RegulationsConfig::default(),
            deactivation: DeactivationConfig::default(),
        }
    }
}

impl FadConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: FadConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from `path`, falling back to defaults if it is missing or broken.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                tracing::info!("Loaded FAD tuning from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Using default FAD tuning ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Returns the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks that the sections agree with each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.species.len();
        if n == 0 {
            return Err(invalid("at least one species is required"));
        }
        if self.simulation.steps_per_day == 0 {
            return Err(invalid("simulation.steps_per_day must be positive"));
        }
        for species in &self.species {
            if species.weights.is_empty() || species.weights[0].is_empty() {
                return Err(invalid(format!("species '{}' has no weights", species.name)));
            }
            let bins = species.weights[0].len();
            if species.weights.iter().any(|row| row.len() != bins) {
                return Err(invalid(format!(
                    "species '{}' has a ragged weight table",
                    species.name
                )));
            }
        }
        if self.sea.initial_abundance.len() != n {
            return Err(invalid(format!(
                "sea.initial_abundance lists {} species, expected {}",
                self.sea.initial_abundance.len(),
                n
            )));
        }
        for (species, bins) in self.species.iter().zip(&self.sea.initial_abundance) {
            if bins.len() != species.weights[0].len() {
                return Err(invalid(format!(
                    "sea.initial_abundance for '{}' has {} bins, expected {}",
                    species.name,
                    bins.len(),
                    species.weights[0].len()
                )));
            }
        }
        if self.fads.release_probabilities.len() != n {
            return Err(invalid(format!(
                "fads.release_probabilities lists {} species, expected {}",
                self.fads.release_probabilities.len(),
                n
            )));
        }
        if !self
            .fads
            .release_probabilities
            .iter()
            .all(|p| (0.0..=1.0).contains(p))
        {
            return Err(invalid("fads.release_probabilities must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.capacity.dud_probability) {
            return Err(invalid("capacity.dud_probability must lie in [0, 1]"));
        }
        if self.capacity.per_species && self.capacity.distributions.len() != n {
            return Err(invalid(format!(
                "capacity.distributions lists {} species, expected {}",
                self.capacity.distributions.len(),
                n
            )));
        }
        if !self.capacity.per_species && self.capacity.distributions.len() != 1 {
            return Err(invalid("a global capacity needs exactly one distribution"));
        }
        if !(0.0..=1.0).contains(&self.fleet.retained_proportion) {
            return Err(invalid("fleet.retained_proportion must lie in [0, 1]"));
        }
        if self.sea.width <= 0 || self.sea.height <= 0 {
            return Err(invalid("sea dimensions must be positive"));
        }
        if let Some(selectivity) = self.attractor.model.selectivity() {
            for (species, row) in self.species.iter().zip(selectivity) {
                if row.len() != species.weights[0].len() {
                    return Err(invalid(format!(
                        "attractor selectivity for '{}' has {} bins, expected {}",
                        species.name,
                        row.len(),
                        species.weights[0].len()
                    )));
                }
                if !row.iter().all(|v| (0.0..=1.0).contains(v)) {
                    return Err(invalid(format!(
                        "attractor selectivity for '{}' must lie in [0, 1]",
                        species.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn global_biology(&self) -> GlobalBiology {
        GlobalBiology::new(
            self.species
                .iter()
                .enumerate()
                .map(|(index, s)| Species::new(index, s.name.clone(), s.weights.clone()))
                .collect(),
        )
    }

    pub fn capacity_initializer(&self) -> Result<CarryingCapacityInitializer, ConfigError> {
        let distributions = self
            .capacity
            .distributions
            .iter()
            .map(DistributionConfig::build)
            .collect::<Result<Vec<_>, _>>()?;
        let initializer = if self.capacity.per_species {
            CarryingCapacityInitializer::per_species(distributions)
        } else {
            match distributions.into_iter().next() {
                Some(distribution) => CarryingCapacityInitializer::global(distribution),
                None => return Err(invalid("a global capacity needs a distribution")),
            }
        };
        Ok(initializer.with_dud_probability(self.capacity.dud_probability))
    }

    pub fn attractor(&self) -> Result<FishAttractor, ConfigError> {
        self.attractor.build(self.species.len())
    }

    /// Kind of store FADs need for the configured attractor.
    pub fn store_kind(&self) -> Result<StoreKind, ConfigError> {
        if let Some(last_moment) = &self.fads.last_moment {
            return Ok(StoreKind::LastMoment(LastMomentCatchability::new(
                last_moment.days_before_attraction,
                last_moment.days_to_fill,
                last_moment.max_catchability.clone(),
            )?));
        }
        Ok(if self.attractor.model.works_on_abundance() {
            StoreKind::Abundance
        } else {
            StoreKind::Biomass
        })
    }

    pub fn regulations(&self) -> RegulationSet {
        let rules = &self.regulations;
        let mut set = RegulationSet::new();
        if !rules.active_fad_limits.is_empty() {
            set = set.with(
                ActiveFadLimit::new(to_hash_map(&rules.active_fad_limits))
                    .in_years(rules.active_fad_limit_first_year, None),
            );
        }
        if !rules.yearly_deployment_limits.is_empty() {
            set = set.with(YearlyActionLimit::new(
                ActionClass::FadDeployment,
                to_hash_map(&rules.yearly_deployment_limits),
            ));
        }
        if !rules.yearly_set_limits.is_empty() {
            set = set.with(YearlyActionLimit::new(
                ActionClass::FadSet,
                to_hash_map(&rules.yearly_set_limits),
            ));
        }
        for closure in &rules.closures {
            set = set.with(SeasonalClosure::new(
                closure.actions.clone(),
                closure.start_day,
                closure.end_day,
            ));
        }
        set
    }

    pub fn deactivation_strategy(&self, biology: &GlobalBiology) -> FadDeactivationStrategy {
        let ranking = match self.deactivation.ranking {
            RankingConfig::OldestFirst => FadRanking::oldest_first(),
            RankingConfig::NewestFirst => FadRanking::newest_first(),
            RankingConfig::LeastBiomassFirst { noise } => {
                FadRanking::least_biomass_first(biology.clone(), noise)
            }
        };
        FadDeactivationStrategy::new(ranking)
    }

    /// Initial sea grid, in the representation the attractor works on.
    pub fn sea_grid(&self, biology: &GlobalBiology) -> SeaGrid {
        let abundance: Vec<StructuredAbundance> = self
            .sea
            .initial_abundance
            .iter()
            .zip(biology.species())
            .map(|(bins, species)| {
                let mut tile = StructuredAbundance::zeros_for(species);
                for sub in 0..species.num_subdivisions() {
                    for (bin, count) in bins.iter().enumerate() {
                        tile.set(sub, bin, *count);
                    }
                }
                tile
            })
            .collect();
        let local = LocalBiology::Abundance(abundance);
        let tile = if self.attractor.model.works_on_abundance() {
            local
        } else {
            LocalBiology::Biomass(local.biomass_per_species(biology))
        };
        SeaGrid::filled(self.sea.width, self.sea.height, tile)
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn to_hash_map(limits: &BTreeMap<String, usize>) -> HashMap<String, usize> {
    limits.iter().map(|(class, limit)| (class.clone(), *limit)).collect()
}

/// Timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub steps_per_day: u32,
    /// Days to simulate
    pub days: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps_per_day: 1,
            days: 730,
        }
    }
}

/// One species and its weight (kg) per subdivision × bin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub name: String,
    pub weights: Vec<Vec<f64>>,
}

fn default_species() -> Vec<SpeciesConfig> {
    vec![
        SpeciesConfig {
            name: "Skipjack tuna".to_string(),
            weights: vec![vec![1.0, 3.0, 7.0]],
        },
        SpeciesConfig {
            name: "Bigeye tuna".to_string(),
            weights: vec![vec![2.0, 10.0, 40.0]],
        },
        SpeciesConfig {
            name: "Yellowfin tuna".to_string(),
            weights: vec![vec![2.0, 12.0, 45.0]],
        },
    ]
}

/// The simulated sea.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeaConfig {
    pub width: i32,
    pub height: i32,
    /// Fish per bin on each tile at the start, per species
    pub initial_abundance: Vec<Vec<f64>>,
}

impl Default for SeaConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            initial_abundance: vec![
                vec![5000.0, 3000.0, 1000.0],
                vec![800.0, 400.0, 100.0],
                vec![1500.0, 800.0, 200.0],
            ],
        }
    }
}

/// The purse-seine fleet driving the scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub vessels: u32,
    /// Regulatory class shared by every vessel
    pub vessel_class: String,
    pub fads_in_stock: usize,
    /// Most FADs a vessel deploys per day
    pub deployments_per_day: usize,
    /// Days between sets
    pub set_every_days: u32,
    /// Share of a FAD's fish kept when setting on it
    pub retained_proportion: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            vessels: 4,
            vessel_class: "class_6b".to_string(),
            fads_in_stock: 150,
            deployments_per_day: 1,
            set_every_days: 3,
            retained_proportion: 0.9,
        }
    }
}

/// Carrying capacity of new FADs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// One capacity per species rather than a shared one
    pub per_species: bool,
    pub dud_probability: f64,
    /// One per species, or a single one for a shared capacity
    pub distributions: Vec<DistributionConfig>,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            per_species: true,
            dud_probability: 0.1,
            distributions: vec![
                DistributionConfig::Weibull {
                    shape: 1.2,
                    scale: 9000.0,
                },
                DistributionConfig::Weibull {
                    shape: 1.2,
                    scale: 3000.0,
                },
                DistributionConfig::Weibull {
                    shape: 1.2,
                    scale: 4000.0,
                },
            ],
        }
    }
}

/// Capacity distribution in kg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionConfig {
    Fixed { value: f64 },
    Weibull { shape: f64, scale: f64 },
    Uniform { min: f64, max: f64 },
}

impl DistributionConfig {
    pub fn build(&self) -> Result<CapacityDistribution, FadError> {
        match *self {
            DistributionConfig::Fixed { value } => CapacityDistribution::fixed(value),
            DistributionConfig::Weibull { shape, scale } => CapacityDistribution::weibull(shape, scale),
            DistributionConfig::Uniform { min, max } => CapacityDistribution::uniform(min, max),
        }
    }
}

/// The attractor shared by every FAD.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractorConfig {
    pub min_soak_days: u32,
    pub model: AttractorModel,
}

impl Default for AttractorConfig {
    fn default() -> Self {
        Self {
            min_soak_days: 0,
            model: AttractorModel::SelectivityAbundance {
                selectivity: vec![
                    vec![0.2, 0.8, 1.0],
                    vec![0.1, 0.6, 1.0],
                    vec![0.1, 0.5, 1.0],
                ],
                days_to_fill: 30,
                min_abundance_threshold: Some(1.0),
                catchability: None,
            },
        }
    }
}

impl AttractorConfig {
    pub fn build(&self, num_species: usize) -> Result<FishAttractor, ConfigError> {
        let gates = AttractionGates::new(self.min_soak_days);
        let check_len = |what: &str, len: usize| {
            if len == num_species {
                Ok(())
            } else {
                Err(invalid(format!(
                    "attractor {} lists {} species, expected {}",
                    what, len, num_species
                )))
            }
        };
        let attractor = match &self.model {
            AttractorModel::LinearBiomass { rates } => {
                check_len("rates", rates.len())?;
                FishAttractor::LinearBiomass(LinearBiomassAttractor::new(rates.clone(), gates)?)
            }
            AttractorModel::LogisticBiomass { rates } => {
                check_len("rates", rates.len())?;
                FishAttractor::LogisticBiomass(LogisticBiomassAttractor::new(rates.clone(), gates)?)
            }
            AttractorModel::ProbabilisticAbundance {
                probability,
                rates,
                selectivity,
            } => {
                check_len("selectivity", selectivity.len())?;
                let curves = selectivity.iter().cloned().map(SelectivityCurve::from_bins).collect();
                FishAttractor::ProbabilisticAbundance(ProbabilisticAbundanceAttractor::new(
                    probability.clone(),
                    rates.clone(),
                    curves,
                    gates,
                )?)
            }
            AttractorModel::SelectivityAbundance {
                selectivity,
                days_to_fill,
                min_abundance_threshold,
                catchability,
            } => {
                check_len("selectivity", selectivity.len())?;
                let curves = selectivity.iter().cloned().map(SelectivityCurve::from_bins).collect();
                let mut attractor = SelectivityAbundanceAttractor::new(curves, *days_to_fill, gates)?;
                if let Some(threshold) = min_abundance_threshold {
                    attractor = attractor.with_min_abundance_threshold(*threshold)?;
                }
                if let Some(catchability) = catchability {
                    check_len("catchability", catchability.len())?;
                    attractor = attractor.with_catchability(CatchabilityPenalty::new(catchability.clone()));
                }
                FishAttractor::SelectivityAbundance(attractor)
            }
        };
        Ok(attractor)
    }
}

/// Attraction model and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttractorModel {
    LinearBiomass {
        rates: Vec<f64>,
    },
    LogisticBiomass {
        rates: Vec<f64>,
    },
    ProbabilisticAbundance {
        probability: AttractionProbability,
        rates: Vec<f64>,
        /// Selectivity per bin, per species
        selectivity: Vec<Vec<f64>>,
    },
    SelectivityAbundance {
        /// Selectivity per bin, per species
        selectivity: Vec<Vec<f64>>,
        days_to_fill: u32,
        min_abundance_threshold: Option<f64>,
        catchability: Option<Vec<f64>>,
    },
}

impl AttractorModel {
    /// Per-species selectivity rows, for the abundance models.
    pub fn selectivity(&self) -> Option<&[Vec<f64>]> {
        match self {
            AttractorModel::ProbabilisticAbundance { selectivity, .. }
            | AttractorModel::SelectivityAbundance { selectivity, .. } => Some(selectivity),
            _ => None,
        }
    }

    pub fn works_on_abundance(&self) -> bool {
        matches!(
            self,
            AttractorModel::ProbabilisticAbundance { .. } | AttractorModel::SelectivityAbundance { .. }
        )
    }
}

/// FAD lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FadsConfig {
    /// Chance each species goes back to the tile after a set
    pub release_probabilities: Vec<f64>,
    pub days_before_turning_off: Option<u32>,
    /// Use last-moment FADs instead of aggregating ones
    pub last_moment: Option<LastMomentConfig>,
}

impl Default for FadsConfig {
    fn default() -> Self {
        Self {
            release_probabilities: vec![0.5, 0.5, 0.5],
            days_before_turning_off: Some(365),
            last_moment: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMomentConfig {
    pub days_before_attraction: u32,
    pub days_to_fill: u32,
    pub max_catchability: Vec<f64>,
}

/// Regulations in force.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulationsConfig {
    /// Active-FAD cap per vessel class
    pub active_fad_limits: BTreeMap<String, usize>,
    /// First year the active-FAD caps apply
    pub active_fad_limit_first_year: Option<u32>,
    pub yearly_deployment_limits: BTreeMap<String, usize>,
    pub yearly_set_limits: BTreeMap<String, usize>,
    pub closures: Vec<ClosureConfig>,
}

impl Default for RegulationsConfig {
    fn default() -> Self {
        Self {
            active_fad_limits: BTreeMap::from([("class_6b".to_string(), 300)]),
            active_fad_limit_first_year: None,
            yearly_deployment_limits: BTreeMap::new(),
            yearly_set_limits: BTreeMap::new(),
            closures: vec![ClosureConfig {
                actions: vec![ActionClass::FadDeployment, ActionClass::FadSet],
                start_day: 209,
                end_day: 280,
            }],
        }
    }
}

/// Days of the year (zero-based, inclusive) when actions are forbidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureConfig {
    pub actions: Vec<ActionClass>,
    pub start_day: u32,
    pub end_day: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeactivationConfig {
    pub ranking: RankingConfig,
}

/// Which FADs go first when a vessel is over its limit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RankingConfig {
    #[default]
    OldestFirst,
    NewestFirst,
    LeastBiomassFirst { noise: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = FadConfig::default();
        config.validate().unwrap();
        assert_eq!(config.global_biology().size(), 3);
        assert!(config.capacity_initializer().unwrap().is_per_species());
        assert!(config.attractor().unwrap().uses_daily_snapshot());
        assert_eq!(config.store_kind().unwrap(), StoreKind::Abundance);
        assert_eq!(config.regulations().len(), 2);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            [simulation]
            seed = 7
            days = 30

            [[species]]
            name = "Skipjack tuna"
            weights = [[1.0]]

            [sea]
            initial_abundance = [[500.0]]

            [capacity]
            per_species = false
            dud_probability = 0.0
            distributions = [{ type = "fixed", value = 1000.0 }]

            [attractor]
            min_soak_days = 2
            model = { type = "linear_biomass", rates = [0.1] }

            [fads]
            release_probabilities = [1.0]
        "#;
        let config = FadConfig::from_str(toml).unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.steps_per_day, 1);
        assert_eq!(config.fleet.vessels, 4);
        assert_eq!(config.attractor.min_soak_days, 2);
        assert_eq!(config.store_kind().unwrap(), StoreKind::Biomass);

        let biology = config.global_biology();
        let sea = config.sea_grid(&biology);
        let tile = sea.biology(fad_events::TilePos::new(0, 0)).unwrap();
        assert_eq!(tile, &LocalBiology::Biomass(vec![500.0]));
    }

    #[test]
    fn test_mismatched_species_is_rejected() {
        let toml = r#"
            [fads]
            release_probabilities = [0.5]
        "#;
        let err = FadConfig::from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_distribution_is_rejected() {
        let mut config = FadConfig::default();
        config.capacity.distributions[0] = DistributionConfig::Weibull { shape: 0.0, scale: 10.0 };
        assert!(matches!(config.capacity_initializer(), Err(ConfigError::Fad(_))));
    }

    #[test]
    fn test_selectivity_bins_must_match_species() {
        let mut config = FadConfig::default();
        config.attractor.model = AttractorModel::SelectivityAbundance {
            selectivity: vec![vec![0.2, 0.8], vec![0.1, 0.6], vec![0.1, 0.5]],
            days_to_fill: 30,
            min_abundance_threshold: None,
            catchability: None,
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_selectivity_above_one_is_rejected() {
        let mut config = FadConfig::default();
        config.attractor.model = AttractorModel::ProbabilisticAbundance {
            probability: AttractionProbability::constant(vec![1.0, 1.0, 1.0]),
            rates: vec![1.0, 1.0, 1.0],
            selectivity: vec![vec![0.2, 0.8, 1.0], vec![0.1, 2.0, 1.0], vec![0.1, 0.5, 1.0]],
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Bigeye"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = FadConfig::default();
        let toml = config.to_toml().unwrap();
        let parsed = FadConfig::from_str(&toml).unwrap();
        assert_eq!(parsed.simulation.days, config.simulation.days);
        assert_eq!(parsed.attractor.model, config.attractor.model);
        assert_eq!(parsed.regulations.active_fad_limits, config.regulations.active_fad_limits);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\nseed = 99").unwrap();
        let config = FadConfig::load(file.path()).unwrap();
        assert_eq!(config.simulation.seed, 99);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = FadConfig::load_or_default("definitely/not/here.toml");
        assert_eq!(config.simulation.seed, 42);
    }
}
