//! World Setup
//!
//! Turns a [`FadConfig`] into a ready-to-run ECS world: biology, sea grid,
//! attractor registry, regulations and one [`FadManager`] per vessel.

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::*;
use fad_events::{SimTime, VesselId};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::attractor::AttractorRegistry;
use crate::config::{ConfigError, FadConfig};
use crate::fleet::{FleetLandings, FleetScript};
use crate::initializer::FadInitializer;
use crate::manager::FadManager;
use crate::observers::Observer;
use crate::regulation::VesselProfile;
use crate::systems::{ActiveRegulations, SimClock};
use crate::SimRng;

/// Builds the world described by `config`.
pub fn setup_world(config: &FadConfig) -> Result<World, ConfigError> {
    config.validate()?;
    let biology = config.global_biology();

    let mut registry = AttractorRegistry::new();
    let attractor = registry.register(config.attractor()?);
    let initializer = FadInitializer::new(
        config.capacity_initializer()?,
        attractor,
        config.store_kind()?,
        config.fads.release_probabilities.clone(),
    )
    .with_days_before_turning_off(config.fads.days_before_turning_off);

    let mut world = World::new();
    world.insert_resource(SimClock(SimTime::start(config.simulation.steps_per_day)));
    world.insert_resource(SimRng(SmallRng::seed_from_u64(config.simulation.seed)));
    world.insert_resource(config.sea_grid(&biology));
    world.insert_resource(config.deactivation_strategy(&biology));
    world.insert_resource(ActiveRegulations::new(config.regulations()));
    world.insert_resource(registry);
    world.insert_resource(FleetScript::from(&config.fleet));
    world.insert_resource(FleetLandings {
        caught: vec![0.0; biology.size()],
        ..FleetLandings::default()
    });
    world.insert_resource(biology);

    for index in 0..config.fleet.vessels {
        let vessel = VesselProfile::new(VesselId(index), config.fleet.vessel_class.clone());
        world.spawn(FadManager::new(
            vessel,
            initializer.clone(),
            config.fleet.fads_in_stock,
        ));
    }
    tracing::info!(
        "World ready: {} vessel(s), {} species, {} sea tiles",
        config.fleet.vessels,
        config.species.len(),
        config.sea.width * config.sea.height
    );
    Ok(world)
}

/// Subscribes one shared observer to every event of every vessel.
pub fn attach_observer<O: Observer + 'static>(world: &mut World, observer: Arc<Mutex<O>>) {
    let mut query = world.query::<&mut FadManager>();
    for mut manager in query.iter_mut(world) {
        manager.observers_mut().register_all(observer.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biology::GlobalBiology;
    use crate::observers::EventBuffer;
    use crate::sea::SeaGrid;

    #[test]
    fn test_setup_from_defaults() {
        let config = FadConfig::default();
        let mut world = setup_world(&config).unwrap();

        assert_eq!(world.resource::<GlobalBiology>().size(), 3);
        assert_eq!(world.resource::<SeaGrid>().len(), 100);
        assert_eq!(world.resource::<AttractorRegistry>().len(), 1);

        let mut query = world.query::<&FadManager>();
        let mut stocks: Vec<(VesselId, usize)> = query
            .iter(&world)
            .map(|m| (m.vessel_id(), m.num_fads_in_stock()))
            .collect();
        stocks.sort();
        assert_eq!(stocks.len(), 4);
        assert!(stocks.iter().all(|(_, stock)| *stock == 150));
    }

    #[test]
    fn test_attach_observer_reaches_every_vessel() {
        let mut world = setup_world(&FadConfig::default()).unwrap();
        let buffer = Arc::new(Mutex::new(EventBuffer::new()));
        attach_observer(&mut world, buffer.clone());

        let mut query = world.query::<&FadManager>();
        for manager in query.iter(&world) {
            assert_eq!(manager.observers().count(fad_events::EventKind::FadDeployed), 1);
        }
    }
}
