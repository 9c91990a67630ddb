//! Biology
//!
//! Species definitions and the two local biology representations: aggregate
//! biomass per species, or abundance structured by subdivision × bin.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Amounts smaller than this are treated as floating-point noise.
pub const EPSILON: f64 = 1e-6;

/// A species with its weight-at-(subdivision, bin) lookup in kg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    index: usize,
    name: String,
    weights: Vec<Vec<f64>>,
}

impl Species {
    /// Creates a species with a full subdivision × bin weight table.
    pub fn new(index: usize, name: impl Into<String>, weights: Vec<Vec<f64>>) -> Self {
        assert!(!weights.is_empty(), "species needs at least one subdivision");
        let bins = weights[0].len();
        assert!(bins > 0, "species needs at least one bin");
        assert!(
            weights.iter().all(|row| row.len() == bins),
            "weight table must be rectangular"
        );
        Self {
            index,
            name: name.into(),
            weights,
        }
    }

    /// Creates a species with a single subdivision.
    pub fn with_bin_weights(index: usize, name: impl Into<String>, weights: Vec<f64>) -> Self {
        Self::new(index, name, vec![weights])
    }

    /// Creates a species tracked only as biomass (one bin weighing 1kg).
    pub fn biomass_only(index: usize, name: impl Into<String>) -> Self {
        Self::with_bin_weights(index, name, vec![1.0])
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_subdivisions(&self) -> usize {
        self.weights.len()
    }

    pub fn num_bins(&self) -> usize {
        self.weights[0].len()
    }

    /// Weight in kg of one fish in the given subdivision and bin
    pub fn weight(&self, subdivision: usize, bin: usize) -> f64 {
        self.weights[subdivision][bin]
    }
}

/// Resource: every species in the simulation, ordered by index
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalBiology {
    species: Vec<Species>,
}

impl GlobalBiology {
    pub fn new(species: Vec<Species>) -> Self {
        for (position, s) in species.iter().enumerate() {
            assert_eq!(
                s.index(),
                position,
                "species '{}' has index {} but sits at position {}",
                s.name(),
                s.index(),
                position
            );
        }
        Self { species }
    }

    pub fn size(&self) -> usize {
        self.species.len()
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn get(&self, index: usize) -> Option<&Species> {
        self.species.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&Species> {
        self.species.iter().find(|s| s.name() == name)
    }
}

/// Fish counts for one species, subdivision × bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAbundance {
    matrix: Vec<Vec<f64>>,
}

impl StructuredAbundance {
    pub fn zeros(subdivisions: usize, bins: usize) -> Self {
        Self {
            matrix: vec![vec![0.0; bins]; subdivisions],
        }
    }

    /// Zero abundance shaped like the species' weight table.
    pub fn zeros_for(species: &Species) -> Self {
        Self::zeros(species.num_subdivisions(), species.num_bins())
    }

    /// Single-subdivision abundance.
    pub fn from_bins(bins: Vec<f64>) -> Self {
        Self { matrix: vec![bins] }
    }

    pub fn from_matrix(matrix: Vec<Vec<f64>>) -> Self {
        Self { matrix }
    }

    pub fn num_subdivisions(&self) -> usize {
        self.matrix.len()
    }

    pub fn num_bins(&self) -> usize {
        self.matrix.first().map_or(0, |row| row.len())
    }

    pub fn get(&self, subdivision: usize, bin: usize) -> f64 {
        self.matrix[subdivision][bin]
    }

    pub fn set(&mut self, subdivision: usize, bin: usize, value: f64) {
        self.matrix[subdivision][bin] = value;
    }

    pub fn as_matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    /// Total number of fish.
    pub fn count(&self) -> f64 {
        self.matrix.iter().flatten().sum()
    }

    /// Biomass in kg using the species' weights.
    pub fn biomass(&self, species: &Species) -> f64 {
        let mut total = 0.0;
        for (sub, row) in self.matrix.iter().enumerate() {
            for (bin, n) in row.iter().enumerate() {
                total += n * species.weight(sub, bin);
            }
        }
        total
    }

    pub fn scale(&mut self, factor: f64) {
        for value in self.matrix.iter_mut().flatten() {
            *value *= factor;
        }
    }

    pub fn add(&mut self, other: &StructuredAbundance) {
        self.assert_same_shape(other);
        for (mine, theirs) in self.matrix.iter_mut().flatten().zip(other.matrix.iter().flatten()) {
            *mine += theirs;
        }
    }

    /// Removes `other` bin by bin. Shortfalls within [`EPSILON`] clamp to zero.
    pub fn subtract(&mut self, other: &StructuredAbundance) {
        self.assert_same_shape(other);
        for (mine, theirs) in self.matrix.iter_mut().flatten().zip(other.matrix.iter().flatten()) {
            *mine = settle(*mine - theirs);
        }
    }

    fn assert_same_shape(&self, other: &StructuredAbundance) {
        assert!(
            self.num_subdivisions() == other.num_subdivisions()
                && self.num_bins() == other.num_bins(),
            "abundance shapes differ: {}x{} vs {}x{}",
            self.num_subdivisions(),
            self.num_bins(),
            other.num_subdivisions(),
            other.num_bins()
        );
    }
}

fn settle(value: f64) -> f64 {
    if value < 0.0 {
        assert!(
            value > -EPSILON,
            "removed more fish than were present (shortfall {})",
            -value
        );
        0.0
    } else {
        value
    }
}

/// Fish held by a tile or a FAD.
///
/// Both variants are indexed by species index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalBiology {
    /// Biomass in kg per species
    Biomass(Vec<f64>),
    /// Structured abundance per species
    Abundance(Vec<StructuredAbundance>),
}

impl LocalBiology {
    pub fn empty_biomass(num_species: usize) -> Self {
        LocalBiology::Biomass(vec![0.0; num_species])
    }

    pub fn empty_abundance(biology: &GlobalBiology) -> Self {
        LocalBiology::Abundance(
            biology
                .species()
                .iter()
                .map(StructuredAbundance::zeros_for)
                .collect(),
        )
    }

    /// An empty biology with the same representation and shape.
    pub fn empty_like(&self) -> Self {
        match self {
            LocalBiology::Biomass(b) => LocalBiology::Biomass(vec![0.0; b.len()]),
            LocalBiology::Abundance(a) => LocalBiology::Abundance(
                a.iter()
                    .map(|s| StructuredAbundance::zeros(s.num_subdivisions(), s.num_bins()))
                    .collect(),
            ),
        }
    }

    pub fn is_abundance(&self) -> bool {
        matches!(self, LocalBiology::Abundance(_))
    }

    pub fn as_biomass(&self) -> Option<&[f64]> {
        match self {
            LocalBiology::Biomass(b) => Some(b),
            LocalBiology::Abundance(_) => None,
        }
    }

    pub fn as_abundance(&self) -> Option<&[StructuredAbundance]> {
        match self {
            LocalBiology::Abundance(a) => Some(a),
            LocalBiology::Biomass(_) => None,
        }
    }

    pub fn num_species(&self) -> usize {
        match self {
            LocalBiology::Biomass(b) => b.len(),
            LocalBiology::Abundance(a) => a.len(),
        }
    }

    /// Biomass in kg held for one species.
    pub fn biomass_of(&self, species: &Species) -> f64 {
        match self {
            LocalBiology::Biomass(b) => b[species.index()],
            LocalBiology::Abundance(a) => a[species.index()].biomass(species),
        }
    }

    /// Biomass in kg per species index.
    pub fn biomass_per_species(&self, biology: &GlobalBiology) -> Vec<f64> {
        match self {
            LocalBiology::Biomass(b) => b.clone(),
            LocalBiology::Abundance(a) => biology
                .species()
                .iter()
                .map(|s| a[s.index()].biomass(s))
                .collect(),
        }
    }

    pub fn total_biomass(&self, biology: &GlobalBiology) -> f64 {
        self.biomass_per_species(biology).iter().sum()
    }

    /// True when no species holds any fish.
    pub fn is_empty(&self) -> bool {
        match self {
            LocalBiology::Biomass(b) => b.iter().all(|v| *v <= 0.0),
            LocalBiology::Abundance(a) => a.iter().flat_map(|s| s.matrix.iter().flatten()).all(|v| *v <= 0.0),
        }
    }

    pub fn scale(&mut self, factor: f64) {
        match self {
            LocalBiology::Biomass(b) => b.iter_mut().for_each(|v| *v *= factor),
            LocalBiology::Abundance(a) => a.iter_mut().for_each(|s| s.scale(factor)),
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let mut copy = self.clone();
        copy.scale(factor);
        copy
    }

    pub fn scale_species(&mut self, species_index: usize, factor: f64) {
        match self {
            LocalBiology::Biomass(b) => b[species_index] *= factor,
            LocalBiology::Abundance(a) => a[species_index].scale(factor),
        }
    }

    /// Adds `other` into this biology.
    ///
    /// Panics if the representations differ.
    pub fn add(&mut self, other: &LocalBiology) {
        match (self, other) {
            (LocalBiology::Biomass(mine), LocalBiology::Biomass(theirs)) => {
                assert_eq!(mine.len(), theirs.len(), "species counts differ");
                for (m, t) in mine.iter_mut().zip(theirs) {
                    *m += t;
                }
            }
            (LocalBiology::Abundance(mine), LocalBiology::Abundance(theirs)) => {
                assert_eq!(mine.len(), theirs.len(), "species counts differ");
                for (m, t) in mine.iter_mut().zip(theirs) {
                    m.add(t);
                }
            }
            _ => panic!("cannot mix biomass and abundance biologies"),
        }
    }

    /// Removes `other` from this biology.
    ///
    /// Panics if the representations differ or if more fish are removed than present.
    pub fn remove(&mut self, other: &LocalBiology) {
        match (self, other) {
            (LocalBiology::Biomass(mine), LocalBiology::Biomass(theirs)) => {
                assert_eq!(mine.len(), theirs.len(), "species counts differ");
                for (m, t) in mine.iter_mut().zip(theirs) {
                    *m = settle(*m - t);
                }
            }
            (LocalBiology::Abundance(mine), LocalBiology::Abundance(theirs)) => {
                assert_eq!(mine.len(), theirs.len(), "species counts differ");
                for (m, t) in mine.iter_mut().zip(theirs) {
                    m.subtract(t);
                }
            }
            _ => panic!("cannot mix biomass and abundance biologies"),
        }
    }

    /// Moves one species out, leaving it empty here.
    pub fn take_species(&mut self, species_index: usize) -> LocalBiology {
        let mut taken = self.empty_like();
        match (&mut *self, &mut taken) {
            (LocalBiology::Biomass(mine), LocalBiology::Biomass(out)) => {
                out[species_index] = std::mem::take(&mut mine[species_index]);
            }
            (LocalBiology::Abundance(mine), LocalBiology::Abundance(out)) => {
                std::mem::swap(&mut mine[species_index], &mut out[species_index]);
            }
            _ => unreachable!("empty_like keeps the representation"),
        }
        taken
    }

    /// Moves everything out, leaving this biology empty.
    pub fn drain(&mut self) -> LocalBiology {
        let empty = self.empty_like();
        std::mem::replace(self, empty)
    }

    /// Per-species abundance matrices, species × subdivision × bin.
    pub fn abundance_matrices(&self) -> Option<Vec<Vec<Vec<f64>>>> {
        self.as_abundance()
            .map(|a| a.iter().map(|s| s.matrix.clone()).collect())
    }
}
