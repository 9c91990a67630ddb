//! FAD Dynamics Engine Library
//!
//! Fish aggregating devices deployed by purse-seine vessels: carrying
//! capacity, fish attraction, per-vessel FAD bookkeeping under regulations,
//! and the yearly deactivation sweep.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod attractor;
pub mod biology;
pub mod capacity;
pub mod config;
pub mod deactivation;
pub mod error;
pub mod fad;
pub mod fleet;
pub mod initializer;
pub mod manager;
pub mod observers;
pub mod regulation;
pub mod sea;
pub mod setup;
pub mod systems;

pub use attractor::{AttractionContext, AttractorId, AttractorRegistry, FishAttractor};
pub use biology::{GlobalBiology, LocalBiology, Species, StructuredAbundance};
pub use capacity::{CapacityDistribution, CarryingCapacity, CarryingCapacityInitializer};
pub use config::{ConfigError, FadConfig};
pub use deactivation::{FadDeactivationStrategy, FadRanking};
pub use error::{FadError, FadResult};
pub use fad::Fad;
pub use initializer::{FadInitializer, StoreKind};
pub use manager::{FadManager, SetOutcome};
pub use regulation::{Regulation, RegulationSet, VesselProfile};
pub use sea::SeaGrid;
pub use setup::{attach_observer, setup_world};
pub use systems::{build_schedule, ActiveRegulations, SimClock};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
