//! FAD Initializer
//!
//! Builds freshly deployed FADs: draws the carrying capacity and sets up
//! the store matching the attractor.

use fad_events::{FadId, SimTime, TilePos, VesselId};
use rand::Rng;

use crate::attractor::AttractorId;
use crate::biology::{GlobalBiology, LocalBiology};
use crate::capacity::CarryingCapacityInitializer;
use crate::fad::{Fad, FadStore, LastMomentCatchability};

/// Kind of store new FADs get.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreKind {
    Biomass,
    Abundance,
    LastMoment(LastMomentCatchability),
}

#[derive(Debug, Clone)]
pub struct FadInitializer {
    capacity: CarryingCapacityInitializer,
    attractor: AttractorId,
    store: StoreKind,
    release_probabilities: Vec<f64>,
    days_before_turning_off: Option<u32>,
}

impl FadInitializer {
    pub fn new(
        capacity: CarryingCapacityInitializer,
        attractor: AttractorId,
        store: StoreKind,
        release_probabilities: Vec<f64>,
    ) -> Self {
        assert!(
            release_probabilities.iter().all(|p| (0.0..=1.0).contains(p)),
            "release probabilities must lie in [0, 1]"
        );
        Self {
            capacity,
            attractor,
            store,
            release_probabilities,
            days_before_turning_off: None,
        }
    }

    /// Builder: FADs turn off after this many days at sea
    pub fn with_days_before_turning_off(mut self, days: Option<u32>) -> Self {
        self.days_before_turning_off = days;
        self
    }

    pub fn attractor(&self) -> AttractorId {
        self.attractor
    }

    pub fn make_fad<R: Rng + ?Sized>(
        &self,
        id: FadId,
        owner: VesselId,
        tile: TilePos,
        time: SimTime,
        biology: &GlobalBiology,
        rng: &mut R,
    ) -> Fad {
        let capacity = self.capacity.initialize(rng);
        let store = match &self.store {
            StoreKind::Biomass => FadStore::Aggregating(LocalBiology::empty_biomass(biology.size())),
            StoreKind::Abundance => FadStore::Aggregating(LocalBiology::empty_abundance(biology)),
            StoreKind::LastMoment(catchability) => FadStore::LastMoment(catchability.clone()),
        };
        let fad = Fad::new(
            id,
            owner,
            self.attractor,
            time.step,
            tile,
            capacity,
            store,
            self.release_probabilities.clone(),
        );
        match self.days_before_turning_off {
            Some(days) => fad.with_days_before_turning_off(days),
            None => fad,
        }
    }
}
