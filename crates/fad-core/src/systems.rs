//! Simulation Systems
//!
//! Daily FAD bookkeeping as `bevy_ecs` systems. Order within a step:
//! refresh the daily attraction snapshots, age FADs, let the fleet act,
//! attract fish, run the yearly deactivation sweep, advance the clock.

use bevy_ecs::prelude::*;
use fad_events::SimTime;

use crate::attractor::{AttractionContext, AttractorRegistry};
use crate::biology::GlobalBiology;
use crate::deactivation::FadDeactivationStrategy;
use crate::fleet::run_fleet;
use crate::manager::FadManager;
use crate::regulation::Regulation;
use crate::sea::SeaGrid;
use crate::SimRng;

/// Resource: the current simulation time
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimClock(pub SimTime);

/// Resource: regulations every vessel must follow
#[derive(Resource)]
pub struct ActiveRegulations(pub Box<dyn Regulation>);

impl ActiveRegulations {
    pub fn new(regulation: impl Regulation + 'static) -> Self {
        Self(Box::new(regulation))
    }

    pub fn get(&self) -> &dyn Regulation {
        self.0.as_ref()
    }
}

/// Managers in vessel order, so iteration never depends on entity layout.
fn managers_in_order<'a>(query: &'a mut Query<&mut FadManager>) -> Vec<Mut<'a, FadManager>> {
    let mut managers: Vec<Mut<FadManager>> = query.iter_mut().collect();
    managers.sort_by_key(|manager| manager.vessel_id());
    managers
}

/// Publishes today's attraction snapshots from the ocean-wide abundance.
pub fn refresh_daily_attraction(
    clock: Res<SimClock>,
    biology: Res<GlobalBiology>,
    sea: Res<SeaGrid>,
    mut registry: ResMut<AttractorRegistry>,
) {
    if !clock.0.is_start_of_day() {
        return;
    }
    let ocean = sea.total_abundance(&biology);
    registry.refresh_daily(clock.0, &ocean, &biology);
}

/// Turns off FADs that have been at sea too long.
pub fn age_fads(clock: Res<SimClock>, mut query: Query<&mut FadManager>) {
    if !clock.0.is_start_of_day() {
        return;
    }
    for mut manager in managers_in_order(&mut query) {
        let turned_off = manager.react_to_day(clock.0);
        if turned_off > 0 {
            tracing::debug!("{} had {} FAD(s) turn off", manager.vessel_id(), turned_off);
        }
    }
}

/// Brings every vessel within its active-FAD limits once a year.
pub fn run_yearly_deactivation(
    clock: Res<SimClock>,
    biology: Res<GlobalBiology>,
    regulations: Res<ActiveRegulations>,
    mut strategy: ResMut<FadDeactivationStrategy>,
    mut rng: ResMut<SimRng>,
    mut query: Query<&mut FadManager>,
) {
    let time = clock.0;
    if !time.is_start_of_day() || !strategy.tracker.should_sweep(time.day()) {
        return;
    }
    let mut total = 0;
    for mut manager in managers_in_order(&mut query) {
        total += strategy
            .deactivate_excess(&mut manager, regulations.get(), time, &biology, &mut rng.0)
            .len();
    }
    strategy.tracker.mark_swept(time.day());
    tracing::info!("Deactivation sweep on day {} removed {} FAD(s)", time.day(), total);
}

/// Lets every deployed FAD pull fish from the tile it floats over.
pub fn attract_fish(
    clock: Res<SimClock>,
    biology: Res<GlobalBiology>,
    registry: Res<AttractorRegistry>,
    mut sea: ResMut<SeaGrid>,
    mut rng: ResMut<SimRng>,
    mut query: Query<&mut FadManager>,
) {
    if !clock.0.is_start_of_day() {
        return;
    }
    let ctx = AttractionContext {
        time: clock.0,
        biology: &biology,
    };
    for mut manager in managers_in_order(&mut query) {
        for id in manager.deployed_ids() {
            let Some(location) = manager.get(id).map(|fad| fad.location()) else {
                continue;
            };
            // FADs over land or outside the grid attract nothing
            if let Some(tile) = sea.biology_mut(location) {
                manager.aggregate_fish(id, tile, &registry, &ctx, &mut rng.0);
            }
        }
    }
}

pub fn advance_clock(mut clock: ResMut<SimClock>) {
    clock.0.advance_step();
}

/// The full per-step schedule.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            refresh_daily_attraction,
            age_fads,
            run_fleet,
            attract_fish,
            run_yearly_deactivation,
            advance_clock,
        )
            .chain(),
    );
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attractor::{AttractionGates, FishAttractor, LinearBiomassAttractor};
    use crate::biology::{LocalBiology, Species};
    use crate::capacity::{CapacityDistribution, CarryingCapacityInitializer};
    use crate::deactivation::FadRanking;
    use crate::initializer::{FadInitializer, StoreKind};
    use crate::regulation::{ActiveFadLimit, RegulationSet, VesselProfile};
    use fad_events::{TilePos, VesselId};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn world_with_manager(limit: usize) -> World {
        let biology = GlobalBiology::new(vec![Species::biomass_only(0, "Skipjack tuna")]);
        let mut registry = AttractorRegistry::new();
        let id = registry.register(FishAttractor::LinearBiomass(
            LinearBiomassAttractor::new(vec![0.1], AttractionGates::default()).unwrap(),
        ));
        let initializer = FadInitializer::new(
            CarryingCapacityInitializer::global(CapacityDistribution::fixed(1000.0).unwrap()),
            id,
            StoreKind::Biomass,
            vec![0.0],
        );
        let mut manager = FadManager::new(VesselProfile::new(VesselId(1), "class_6b"), initializer, 10);
        let mut rng = SmallRng::seed_from_u64(5);
        for x in 0..3 {
            manager
                .deploy(TilePos::new(x, 0), SimTime::default(), &biology, &mut rng)
                .unwrap();
        }

        let mut world = World::new();
        world.insert_resource(SimClock::default());
        world.insert_resource(SimRng(rng));
        world.insert_resource(SeaGrid::filled(2, 1, LocalBiology::Biomass(vec![500.0])));
        world.insert_resource(biology);
        world.insert_resource(registry);
        world.insert_resource(ActiveRegulations::new(RegulationSet::new().with(
            ActiveFadLimit::new(HashMap::from([("class_6b".to_string(), limit)])),
        )));
        world.insert_resource(FadDeactivationStrategy::new(FadRanking::newest_first()));
        world.spawn(manager);
        world
    }

    #[test]
    fn test_schedule_attracts_and_advances_clock() {
        let mut world = world_with_manager(10);
        let mut schedule = build_schedule();
        schedule.run(&mut world);

        assert_eq!(world.resource::<SimClock>().0.step, 1);
        let biology = world.resource::<GlobalBiology>().clone();
        let mut query = world.query::<&FadManager>();
        let manager = query.single(&world);
        let held: Vec<f64> = manager
            .deployed_fads()
            .map(|fad| fad.held_biomass(&biology)[0])
            .collect();
        // The third FAD floats off the grid
        assert_eq!(held, vec![50.0, 50.0, 0.0]);
        let sea = world.resource::<SeaGrid>();
        assert_eq!(sea.total_biomass(&biology), vec![900.0]);
    }

    #[test]
    fn test_deactivation_runs_on_day_one() {
        let mut world = world_with_manager(1);
        let mut schedule = build_schedule();

        schedule.run(&mut world);
        let mut query = world.query::<&FadManager>();
        assert_eq!(query.single(&world).num_deployed_fads(), 3);

        schedule.run(&mut world);
        let mut query = world.query::<&FadManager>();
        let manager = query.single(&world);
        assert_eq!(manager.num_deployed_fads(), 1);
        assert_eq!(manager.deployed_ids()[0].serial(), 1);
    }
}
