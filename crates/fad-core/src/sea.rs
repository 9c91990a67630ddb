//! Sea Grid
//!
//! Local biology per sea tile. Tiles missing from the grid are land or lie
//! outside the simulated domain.

use std::collections::BTreeMap;

use bevy_ecs::prelude::*;
use fad_events::TilePos;

use crate::biology::{GlobalBiology, LocalBiology, StructuredAbundance};

/// Resource: the biology of every sea tile
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SeaGrid {
    tiles: BTreeMap<TilePos, LocalBiology>,
}

impl SeaGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `width` × `height` grid where every tile starts with `biology`.
    pub fn filled(width: i32, height: i32, biology: LocalBiology) -> Self {
        let mut grid = Self::new();
        for x in 0..width {
            for y in 0..height {
                grid.insert(TilePos::new(x, y), biology.clone());
            }
        }
        grid
    }

    pub fn insert(&mut self, tile: TilePos, biology: LocalBiology) {
        self.tiles.insert(tile, biology);
    }

    pub fn contains(&self, tile: TilePos) -> bool {
        self.tiles.contains_key(&tile)
    }

    pub fn biology(&self, tile: TilePos) -> Option<&LocalBiology> {
        self.tiles.get(&tile)
    }

    pub fn biology_mut(&mut self, tile: TilePos) -> Option<&mut LocalBiology> {
        self.tiles.get_mut(&tile)
    }

    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.tiles.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Abundance summed over every abundance tile, per species.
    pub fn total_abundance(&self, biology: &GlobalBiology) -> Vec<StructuredAbundance> {
        let mut totals: Vec<StructuredAbundance> = biology
            .species()
            .iter()
            .map(StructuredAbundance::zeros_for)
            .collect();
        for local in self.tiles.values() {
            if let Some(abundance) = local.as_abundance() {
                for (total, tile) in totals.iter_mut().zip(abundance) {
                    total.add(tile);
                }
            }
        }
        totals
    }

    /// Biomass summed over all tiles, per species.
    pub fn total_biomass(&self, biology: &GlobalBiology) -> Vec<f64> {
        let mut totals = vec![0.0; biology.size()];
        for local in self.tiles.values() {
            for (total, amount) in totals.iter_mut().zip(local.biomass_per_species(biology)) {
                *total += amount;
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biology::Species;

    #[test]
    fn test_totals() {
        let biology = GlobalBiology::new(vec![Species::with_bin_weights(0, "Skipjack tuna", vec![1.0, 2.0])]);
        let grid = SeaGrid::filled(
            2,
            3,
            LocalBiology::Abundance(vec![StructuredAbundance::from_bins(vec![10.0, 1.0])]),
        );
        assert_eq!(grid.len(), 6);
        assert!(grid.contains(TilePos::new(1, 2)));
        assert!(!grid.contains(TilePos::new(2, 0)));

        let abundance = grid.total_abundance(&biology);
        assert_eq!(abundance[0].as_matrix(), &[vec![60.0, 6.0]]);
        assert_eq!(grid.total_biomass(&biology), vec![72.0]);
    }
}
