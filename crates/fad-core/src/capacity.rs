//! Carrying Capacity
//!
//! How much fish a FAD can hold, and how a fresh FAD's capacity is drawn.
//! A capacity totalling zero marks a dud that never attracts anything.

use rand::Rng;
use rand_distr::{Distribution, Weibull};
use serde::{Deserialize, Serialize};

use crate::biology::EPSILON;
use crate::error::{FadError, FadResult};

/// Attempts at a per-species draw before an all-zero result is accepted.
pub const MAX_CAPACITY_ATTEMPTS: u32 = 10;

/// Capacity in kg, either shared by all species or split per species index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryingCapacity {
    Global(f64),
    PerSpecies(Vec<f64>),
}

impl CarryingCapacity {
    pub fn global(capacity: f64) -> Self {
        assert!(capacity >= 0.0, "carrying capacity cannot be negative");
        CarryingCapacity::Global(capacity)
    }

    pub fn per_species(capacities: Vec<f64>) -> Self {
        assert!(
            capacities.iter().all(|c| *c >= 0.0),
            "carrying capacity cannot be negative"
        );
        CarryingCapacity::PerSpecies(capacities)
    }

    /// A zero capacity with the same shape.
    pub fn dud_like(&self) -> Self {
        match self {
            CarryingCapacity::Global(_) => CarryingCapacity::Global(0.0),
            CarryingCapacity::PerSpecies(c) => CarryingCapacity::PerSpecies(vec![0.0; c.len()]),
        }
    }

    pub fn total(&self) -> f64 {
        match self {
            CarryingCapacity::Global(c) => *c,
            CarryingCapacity::PerSpecies(c) => c.iter().sum(),
        }
    }

    pub fn is_dud(&self) -> bool {
        self.total() == 0.0
    }

    /// Capacity reserved for one species, if capacities are split.
    pub fn for_species(&self, species_index: usize) -> Option<f64> {
        match self {
            CarryingCapacity::Global(_) => None,
            CarryingCapacity::PerSpecies(c) => Some(c[species_index]),
        }
    }

    /// True when the FAD cannot take any more fish.
    ///
    /// With split capacities one full species blocks the whole FAD. Species
    /// with no capacity never count as full here.
    pub fn is_full(&self, held: &[f64]) -> bool {
        match self {
            CarryingCapacity::Global(c) => held.iter().sum::<f64>() >= *c,
            CarryingCapacity::PerSpecies(c) => c
                .iter()
                .zip(held)
                .any(|(cap, h)| *cap > 0.0 && *h >= *cap),
        }
    }

    /// Total room left given the biomass currently held per species.
    pub fn room(&self, held: &[f64]) -> f64 {
        (self.total() - held.iter().sum::<f64>()).max(0.0)
    }
}

/// Distribution a capacity is drawn from.
#[derive(Debug, Clone, Copy)]
pub enum CapacityDistribution {
    Fixed(f64),
    Weibull(Weibull<f64>),
    Uniform { min: f64, max: f64 },
}

impl CapacityDistribution {
    pub fn fixed(value: f64) -> FadResult<Self> {
        if value.is_nan() || value < 0.0 {
            return Err(FadError::InvalidDistribution(format!(
                "fixed capacity must be non-negative, got {}",
                value
            )));
        }
        Ok(CapacityDistribution::Fixed(value))
    }

    pub fn weibull(shape: f64, scale: f64) -> FadResult<Self> {
        Weibull::new(scale, shape)
            .map(CapacityDistribution::Weibull)
            .map_err(|e| {
                FadError::InvalidDistribution(format!(
                    "weibull(shape={}, scale={}): {}",
                    shape, scale, e
                ))
            })
    }

    pub fn uniform(min: f64, max: f64) -> FadResult<Self> {
        if min.is_nan() || min < 0.0 || max < min || !max.is_finite() {
            return Err(FadError::InvalidDistribution(format!(
                "uniform range [{}, {}] is not a valid capacity range",
                min, max
            )));
        }
        Ok(CapacityDistribution::Uniform { min, max })
    }

    /// Draws one non-negative capacity.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let value = match self {
            CapacityDistribution::Fixed(v) => *v,
            CapacityDistribution::Weibull(w) => w.sample(rng),
            CapacityDistribution::Uniform { min, max } => {
                if min == max {
                    *min
                } else {
                    rng.gen_range(*min..=*max)
                }
            }
        };
        value.max(0.0)
    }
}

#[derive(Debug, Clone)]
enum CapacityShape {
    Global(CapacityDistribution),
    PerSpecies(Vec<CapacityDistribution>),
}

/// Draws the carrying capacity of each newly deployed FAD.
#[derive(Debug, Clone)]
pub struct CarryingCapacityInitializer {
    dud_probability: f64,
    shape: CapacityShape,
}

impl CarryingCapacityInitializer {
    pub fn global(distribution: CapacityDistribution) -> Self {
        Self {
            dud_probability: 0.0,
            shape: CapacityShape::Global(distribution),
        }
    }

    pub fn per_species(distributions: Vec<CapacityDistribution>) -> Self {
        assert!(!distributions.is_empty(), "need one distribution per species");
        Self {
            dud_probability: 0.0,
            shape: CapacityShape::PerSpecies(distributions),
        }
    }

    /// Builder: chance in [0, 1] that a FAD is a dud
    pub fn with_dud_probability(mut self, probability: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "dud probability must lie in [0, 1]"
        );
        self.dud_probability = probability;
        self
    }

    pub fn dud_probability(&self) -> f64 {
        self.dud_probability
    }

    pub fn is_per_species(&self) -> bool {
        matches!(self.shape, CapacityShape::PerSpecies(_))
    }

    pub fn initialize<R: Rng + ?Sized>(&self, rng: &mut R) -> CarryingCapacity {
        let roll: f64 = rng.gen();
        // Rolls can be exactly 0; a zero probability never yields a dud
        let dud = self.dud_probability > 0.0 && roll <= self.dud_probability;
        match &self.shape {
            CapacityShape::Global(distribution) => {
                if dud {
                    CarryingCapacity::Global(0.0)
                } else {
                    CarryingCapacity::Global(distribution.sample(rng))
                }
            }
            CapacityShape::PerSpecies(distributions) => {
                if dud {
                    return CarryingCapacity::PerSpecies(vec![0.0; distributions.len()]);
                }
                let mut draw = Vec::with_capacity(distributions.len());
                for _ in 0..MAX_CAPACITY_ATTEMPTS {
                    draw = distributions.iter().map(|d| d.sample(rng)).collect();
                    if draw.iter().any(|c| *c > 0.0) {
                        return CarryingCapacity::PerSpecies(draw);
                    }
                }
                tracing::warn!(
                    "Capacity draw was zero for every species after {} attempts, accepting a dud",
                    MAX_CAPACITY_ATTEMPTS
                );
                CarryingCapacity::PerSpecies(draw)
            }
        }
    }
}

/// Scales `attracted` (kg per species) so it fits the remaining room.
///
/// Split capacities first clamp every species to its own room, which keeps
/// zero-capacity species empty forever. The total is then scaled by
/// `min(1, (capacity - held) / attracted)`. Returns the per-species factors.
pub fn fit_factors(capacity: &CarryingCapacity, held: &[f64], attracted: &[f64]) -> Vec<f64> {
    let mut factors = vec![1.0; attracted.len()];
    if let CarryingCapacity::PerSpecies(caps) = capacity {
        for (s, amount) in attracted.iter().enumerate() {
            let room = (caps[s] - held[s]).max(0.0);
            if *amount > room {
                factors[s] = if *amount > 0.0 { room / amount } else { 0.0 };
            }
        }
    }
    let clamped: f64 = attracted.iter().zip(&factors).map(|(a, f)| a * f).sum();
    let room = capacity.room(held);
    if clamped > room && clamped > EPSILON {
        let scale = room / clamped;
        factors.iter_mut().for_each(|f| *f *= scale);
    }
    factors
}
