//! FAD Entity
//!
//! A drifting fish aggregating device: where it is, what it holds and
//! whether it can still attract fish.

use fad_events::{FadId, SimTime, TilePos, VesselId};
use rand::Rng;

use crate::attractor::{fit_to_capacity, Attraction, AttractionContext, AttractorId, AttractorRegistry};
use crate::biology::{GlobalBiology, LocalBiology};
use crate::capacity::CarryingCapacity;
use crate::error::{FadError, FadResult};

/// Catchability of a FAD that holds nothing until it is fished.
///
/// Zero before `days_before_attraction` days of soak time, then ramps
/// linearly to the species maximum over `days_to_fill` days.
#[derive(Debug, Clone, PartialEq)]
pub struct LastMomentCatchability {
    days_before_attraction: u32,
    days_to_fill: u32,
    max_catchability: Vec<f64>,
}

impl LastMomentCatchability {
    pub fn new(
        days_before_attraction: u32,
        days_to_fill: u32,
        max_catchability: Vec<f64>,
    ) -> FadResult<Self> {
        if days_to_fill == 0 {
            return Err(FadError::InvalidAttractor(
                "last-moment days_to_fill must be positive".to_string(),
            ));
        }
        if let Some(bad) = max_catchability.iter().find(|c| !(0.0..=1.0).contains(*c)) {
            return Err(FadError::InvalidAttractor(format!(
                "catchability {} is outside [0, 1]",
                bad
            )));
        }
        Ok(Self {
            days_before_attraction,
            days_to_fill,
            max_catchability,
        })
    }

    /// Fraction of the tile's fish of `species_index` caught after `soak_days`.
    pub fn catchability(&self, species_index: usize, soak_days: u32) -> f64 {
        if soak_days < self.days_before_attraction {
            return 0.0;
        }
        let ramp = (soak_days - self.days_before_attraction) as f64 / self.days_to_fill as f64;
        self.max_catchability[species_index] * ramp.min(1.0)
    }
}

/// What a FAD keeps between sets.
#[derive(Debug, Clone, PartialEq)]
pub enum FadStore {
    /// Fish accumulate on the FAD day after day
    Aggregating(LocalBiology),
    /// Nothing is held; the tile is sampled when the FAD is fished
    LastMoment(LastMomentCatchability),
}

/// Where the fish left on a FAD after a set ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct FishRelease {
    pub released: LocalBiology,
    pub destroyed: LocalBiology,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fad {
    id: FadId,
    owner: VesselId,
    attractor: AttractorId,
    step_deployed: u64,
    location_deployed: TilePos,
    location: TilePos,
    release_probabilities: Vec<f64>,
    carrying_capacity: CarryingCapacity,
    active: bool,
    lost: bool,
    days_before_turning_off: Option<u32>,
    step_of_first_attraction: Option<u64>,
    store: FadStore,
}

impl Fad {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: FadId,
        owner: VesselId,
        attractor: AttractorId,
        step_deployed: u64,
        location: TilePos,
        carrying_capacity: CarryingCapacity,
        store: FadStore,
        release_probabilities: Vec<f64>,
    ) -> Self {
        Self {
            id,
            owner,
            attractor,
            step_deployed,
            location_deployed: location,
            location,
            release_probabilities,
            carrying_capacity,
            active: true,
            lost: false,
            days_before_turning_off: None,
            step_of_first_attraction: None,
            store,
        }
    }

    /// Builder: stop attracting after this many days at sea
    pub fn with_days_before_turning_off(mut self, days: u32) -> Self {
        self.days_before_turning_off = Some(days);
        self
    }

    pub fn id(&self) -> FadId {
        self.id
    }

    pub fn owner(&self) -> VesselId {
        self.owner
    }

    pub fn attractor(&self) -> AttractorId {
        self.attractor
    }

    pub fn step_deployed(&self) -> u64 {
        self.step_deployed
    }

    pub fn location_deployed(&self) -> TilePos {
        self.location_deployed
    }

    pub fn location(&self) -> TilePos {
        self.location
    }

    pub fn release_probabilities(&self) -> &[f64] {
        &self.release_probabilities
    }

    pub fn carrying_capacity(&self) -> &CarryingCapacity {
        &self.carrying_capacity
    }

    pub fn days_before_turning_off(&self) -> Option<u32> {
        self.days_before_turning_off
    }

    pub fn store(&self) -> &FadStore {
        &self.store
    }

    /// Fish held on the FAD, for aggregating FADs.
    pub fn biology(&self) -> Option<&LocalBiology> {
        match &self.store {
            FadStore::Aggregating(biology) => Some(biology),
            FadStore::LastMoment(_) => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn is_dud(&self) -> bool {
        self.carrying_capacity.is_dud()
    }

    pub fn can_attract_fish(&self) -> bool {
        self.active && !self.lost
    }

    /// Marks the FAD lost for good.
    pub fn lose(&mut self) {
        self.lost = true;
        self.active = false;
    }

    /// Daily aging. Returns true if the FAD turned off today.
    pub fn react_to_day(&mut self, time: SimTime) -> bool {
        let Some(limit) = self.days_before_turning_off else {
            return false;
        };
        if self.active && self.soak_time_days(time) > limit {
            self.active = false;
            tracing::debug!("{} turned off after {} days at sea", self.id, limit);
            return true;
        }
        false
    }

    /// Whole days since deployment.
    pub fn soak_time_days(&self, time: SimTime) -> u32 {
        time.days_since(self.step_deployed)
    }

    /// Biomass in kg held per species. Always zero for last-moment FADs.
    pub fn held_biomass(&self, biology: &GlobalBiology) -> Vec<f64> {
        match &self.store {
            FadStore::Aggregating(held) => held.biomass_per_species(biology),
            FadStore::LastMoment(_) => vec![0.0; biology.size()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.biology().map_or(true, LocalBiology::is_empty)
    }

    pub fn step_of_first_attraction(&self) -> Option<u64> {
        self.step_of_first_attraction
    }

    /// Panics if the step was already set.
    pub fn set_step_of_first_attraction(&mut self, step: u64) {
        assert!(
            self.step_of_first_attraction.is_none(),
            "step of first attraction of {} can only be set once",
            self.id
        );
        self.step_of_first_attraction = Some(step);
    }

    /// Steps between deployment and the first fish arriving.
    pub fn steps_before_first_attraction(&self) -> Option<u64> {
        self.step_of_first_attraction
            .map(|step| step.saturating_sub(self.step_deployed))
    }

    pub fn drift_to(&mut self, tile: TilePos) {
        self.location = tile;
    }

    /// Pulls fish from the tile onto the FAD.
    ///
    /// Last-moment FADs never aggregate and always return `None`.
    pub fn aggregate_fish<R: Rng + ?Sized>(
        &mut self,
        tile: &mut LocalBiology,
        registry: &AttractorRegistry,
        ctx: &AttractionContext<'_>,
        rng: &mut R,
    ) -> Option<Attraction> {
        if !matches!(self.store, FadStore::Aggregating(_)) {
            return None;
        }
        let attraction = registry.attract(tile, self, ctx, rng)?;
        let FadStore::Aggregating(store) = &mut self.store else {
            return None;
        };
        assert_eq!(
            store.is_abundance(),
            attraction.biology.is_abundance(),
            "{} cannot store the biology its attractor produces",
            self.id
        );
        tile.remove(&attraction.biology);
        store.add(&attraction.biology);
        if self.step_of_first_attraction.is_none() {
            self.set_step_of_first_attraction(ctx.time.step);
        }
        Some(attraction)
    }

    /// Takes the catch of a set made on this FAD.
    ///
    /// Aggregating FADs give up `retained_proportion` of what they hold.
    /// Last-moment FADs sample the tile with their soak-time catchability.
    pub fn take_catch(
        &mut self,
        tile: &mut LocalBiology,
        retained_proportion: f64,
        ctx: &AttractionContext<'_>,
    ) -> LocalBiology {
        let proportion = retained_proportion.clamp(0.0, 1.0);
        match &mut self.store {
            FadStore::Aggregating(store) => {
                let catch = store.scaled(proportion);
                store.remove(&catch);
                catch
            }
            FadStore::LastMoment(catchability) => {
                let mut sample = tile.clone();
                if self.carrying_capacity.is_dud() {
                    sample.scale(0.0);
                    return sample;
                }
                let soak = ctx.time.days_since(self.step_deployed);
                for species in ctx.biology.species() {
                    let q = catchability.catchability(species.index(), soak);
                    sample.scale_species(species.index(), q * proportion);
                }
                let nothing_held = vec![0.0; ctx.biology.size()];
                match fit_to_capacity(sample, &self.carrying_capacity, &nothing_held, ctx.biology) {
                    Some(attraction) => {
                        tile.remove(&attraction.biology);
                        attraction.biology
                    }
                    None => tile.empty_like(),
                }
            }
        }
    }

    /// Decides, species by species, what happens to the fish left on the FAD.
    ///
    /// Each species goes back to the tile with its release probability and is
    /// destroyed otherwise. Without a tile everything is destroyed. Returns
    /// `None` for last-moment FADs, which hold nothing.
    pub fn release_remaining<R: Rng + ?Sized>(
        &mut self,
        mut tile: Option<&mut LocalBiology>,
        rng: &mut R,
    ) -> Option<FishRelease> {
        let FadStore::Aggregating(store) = &mut self.store else {
            return None;
        };
        let mut released = store.empty_like();
        let mut destroyed = store.empty_like();
        for species_index in 0..store.num_species() {
            let roll: f64 = rng.gen();
            let probability = self
                .release_probabilities
                .get(species_index)
                .copied()
                .unwrap_or(0.0);
            let fish = store.take_species(species_index);
            if roll < probability && tile.is_some() {
                released.add(&fish);
            } else {
                destroyed.add(&fish);
            }
        }
        if let Some(tile) = tile.as_deref_mut() {
            tile.add(&released);
        }
        Some(FishRelease {
            released,
            destroyed,
        })
    }

    /// Destroys everything held. Returns the destroyed fish, if any.
    pub fn release_into_void(&mut self) -> Option<LocalBiology> {
        match &mut self.store {
            FadStore::Aggregating(store) if !store.is_empty() => Some(store.drain()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attractor::{AttractionGates, FishAttractor, LinearBiomassAttractor};
    use crate::biology::Species;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn biology() -> GlobalBiology {
        GlobalBiology::new(vec![
            Species::biomass_only(0, "Skipjack tuna"),
            Species::biomass_only(1, "Bigeye tuna"),
        ])
    }

    fn fad_holding(held: Vec<f64>, release: Vec<f64>) -> Fad {
        Fad::new(
            FadId(1),
            VesselId(1),
            AttractorId(0),
            10,
            TilePos::new(1, 1),
            CarryingCapacity::global(1000.0),
            FadStore::Aggregating(LocalBiology::Biomass(held)),
            release,
        )
    }

    #[test]
    fn test_ages_out() {
        let mut fad = fad_holding(vec![0.0, 0.0], vec![0.0, 0.0]).with_days_before_turning_off(5);
        assert!(!fad.react_to_day(SimTime::new(15, 1)));
        assert!(fad.is_active());
        assert!(fad.react_to_day(SimTime::new(16, 1)));
        assert!(!fad.is_active());
        assert!(!fad.is_lost());
        assert!(!fad.react_to_day(SimTime::new(17, 1)));
    }

    #[test]
    fn test_lose_is_terminal() {
        let mut fad = fad_holding(vec![0.0, 0.0], vec![0.0, 0.0]);
        fad.lose();
        assert!(fad.is_lost());
        assert!(!fad.is_active());
        assert!(!fad.can_attract_fish());
    }

    #[test]
    #[should_panic(expected = "can only be set once")]
    fn test_first_attraction_set_twice_panics() {
        let mut fad = fad_holding(vec![0.0, 0.0], vec![0.0, 0.0]);
        fad.set_step_of_first_attraction(12);
        fad.set_step_of_first_attraction(13);
    }

    #[test]
    fn test_aggregation_moves_fish_and_records_first_attraction() {
        let biology = biology();
        let mut registry = AttractorRegistry::new();
        registry.register(FishAttractor::LinearBiomass(
            LinearBiomassAttractor::new(vec![0.1, 0.1], AttractionGates::default()).unwrap(),
        ));
        let mut fad = fad_holding(vec![0.0, 0.0], vec![0.0, 0.0]);
        let mut tile = LocalBiology::Biomass(vec![100.0, 200.0]);
        let ctx = AttractionContext { time: SimTime::new(14, 1), biology: &biology };
        let mut rng = SmallRng::seed_from_u64(3);

        let attraction = fad.aggregate_fish(&mut tile, &registry, &ctx, &mut rng).unwrap();
        assert!((attraction.total_weight - 30.0).abs() < 1e-9);
        assert_eq!(tile, LocalBiology::Biomass(vec![90.0, 180.0]));
        assert_eq!(fad.biology(), Some(&LocalBiology::Biomass(vec![10.0, 20.0])));
        assert_eq!(fad.step_of_first_attraction(), Some(14));
        assert_eq!(fad.steps_before_first_attraction(), Some(4));

        let later = AttractionContext { time: SimTime::new(15, 1), biology: &biology };
        fad.aggregate_fish(&mut tile, &registry, &later, &mut rng).unwrap();
        assert_eq!(fad.step_of_first_attraction(), Some(14));
    }

    #[test]
    fn test_release_independence() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..50 {
            let mut fad = fad_holding(vec![30.0, 70.0], vec![0.0, 1.0]);
            let mut tile = LocalBiology::Biomass(vec![0.0, 0.0]);
            let release = fad.release_remaining(Some(&mut tile), &mut rng).unwrap();
            assert_eq!(release.released, LocalBiology::Biomass(vec![0.0, 70.0]));
            assert_eq!(release.destroyed, LocalBiology::Biomass(vec![30.0, 0.0]));
            assert_eq!(tile, LocalBiology::Biomass(vec![0.0, 70.0]));
            assert!(fad.is_empty());
        }
    }

    #[test]
    fn test_release_without_tile_destroys_everything() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut fad = fad_holding(vec![30.0, 70.0], vec![1.0, 1.0]);
        let release = fad.release_remaining(None, &mut rng).unwrap();
        assert_eq!(release.destroyed, LocalBiology::Biomass(vec![30.0, 70.0]));
    }

    #[test]
    fn test_take_catch_from_aggregating_store() {
        let biology = biology();
        let ctx = AttractionContext { time: SimTime::new(20, 1), biology: &biology };
        let mut fad = fad_holding(vec![40.0, 60.0], vec![0.0, 0.0]);
        let mut tile = LocalBiology::Biomass(vec![0.0, 0.0]);
        let catch = fad.take_catch(&mut tile, 0.75, &ctx);
        assert_eq!(catch, LocalBiology::Biomass(vec![30.0, 45.0]));
        assert_eq!(fad.biology(), Some(&LocalBiology::Biomass(vec![10.0, 15.0])));
    }

    #[test]
    fn test_last_moment_catchability_ramp() {
        let q = LastMomentCatchability::new(5, 10, vec![0.4]).unwrap();
        assert_eq!(q.catchability(0, 4), 0.0);
        assert_eq!(q.catchability(0, 5), 0.0);
        assert!((q.catchability(0, 10) - 0.2).abs() < 1e-12);
        assert!((q.catchability(0, 40) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_last_moment_samples_tile() {
        let biology = biology();
        let mut fad = Fad::new(
            FadId(2),
            VesselId(1),
            AttractorId(0),
            0,
            TilePos::new(0, 0),
            CarryingCapacity::global(1000.0),
            FadStore::LastMoment(LastMomentCatchability::new(0, 10, vec![0.5, 0.5]).unwrap()),
            vec![0.0, 0.0],
        );
        let mut tile = LocalBiology::Biomass(vec![100.0, 300.0]);
        let ctx = AttractionContext { time: SimTime::new(10, 1), biology: &biology };
        let catch = fad.take_catch(&mut tile, 1.0, &ctx);
        assert_eq!(catch, LocalBiology::Biomass(vec![50.0, 150.0]));
        assert_eq!(tile, LocalBiology::Biomass(vec![50.0, 150.0]));
        assert!(fad.is_empty());
        assert!(fad.release_remaining(Some(&mut tile), &mut SmallRng::seed_from_u64(1)).is_none());
    }
}
