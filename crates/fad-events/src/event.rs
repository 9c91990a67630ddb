//! Event Types
//!
//! Identifiers and the domain events published by FAD managers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SimTime;

/// Unique identifier for a FAD.
///
/// The owning vessel sits in the high 32 bits and a per-vessel serial in the
/// low 32 bits, so ids stay unique without shared state between vessels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FadId(pub u64);

impl FadId {
    pub fn new(vessel: VesselId, serial: u32) -> Self {
        Self(((vessel.0 as u64) << 32) | serial as u64)
    }

    pub fn serial(&self) -> u32 {
        (self.0 & 0xffff_ffff) as u32
    }
}

impl fmt::Display for FadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fad_{:04}_{:06}", self.0 >> 32, self.serial())
    }
}

/// Unique identifier for a vessel (the owner of a FAD manager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesselId(pub u32);

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vessel_{:04}", self.0)
    }
}

/// Grid coordinates of a sea tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Regulated vessel actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    FadDeployment,
    FadSet,
    OpportunisticFadSet,
    NonAssociatedSet,
    DolphinSet,
}

impl ActionClass {
    /// Returns all action classes.
    pub fn all() -> &'static [ActionClass] {
        &[
            ActionClass::FadDeployment,
            ActionClass::FadSet,
            ActionClass::OpportunisticFadSet,
            ActionClass::NonAssociatedSet,
            ActionClass::DolphinSet,
        ]
    }

    /// True for every kind of set (fishing action).
    pub fn is_set(&self) -> bool {
        !matches!(self, ActionClass::FadDeployment)
    }

    /// True for sets made on a FAD, owned or not.
    pub fn is_fad_set(&self) -> bool {
        matches!(self, ActionClass::FadSet | ActionClass::OpportunisticFadSet)
    }
}

/// Why a FAD was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossCause {
    /// Explicitly removed by its owner
    Zapped,
    /// Deactivated to comply with an active-FAD limit
    Regulation,
    /// Drifted out of the simulated domain
    DriftedOut,
}

/// Event categories observers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    FadDeployed,
    FishAttracted,
    FadFished,
    BiomassLost,
    AbundanceLost,
    FadLost,
    FadPickedUp,
}

impl EventKind {
    /// Returns all event kinds.
    pub fn all() -> &'static [EventKind] {
        &[
            EventKind::FadDeployed,
            EventKind::FishAttracted,
            EventKind::FadFished,
            EventKind::BiomassLost,
            EventKind::AbundanceLost,
            EventKind::FadLost,
            EventKind::FadPickedUp,
        ]
    }

    /// Kinds that report fish destroyed into the void.
    pub fn is_fish_lost(&self) -> bool {
        matches!(self, EventKind::BiomassLost | EventKind::AbundanceLost)
    }
}

/// A domain event published by a FAD manager.
///
/// Per-species vectors are indexed by species index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FadEvent {
    FadDeployed {
        time: SimTime,
        vessel: VesselId,
        fad: FadId,
        tile: TilePos,
        dud: bool,
    },
    FishAttracted {
        time: SimTime,
        vessel: VesselId,
        fad: FadId,
        tile: TilePos,
        /// Biomass (kg) attracted per species
        biomass: Vec<f64>,
    },
    FadFished {
        time: SimTime,
        vessel: VesselId,
        fad: FadId,
        tile: TilePos,
        /// Biomass (kg) caught per species
        caught: Vec<f64>,
        /// Biomass (kg) released back into the tile per species
        released: Vec<f64>,
    },
    BiomassLost {
        time: SimTime,
        vessel: VesselId,
        fad: FadId,
        /// Biomass (kg) destroyed per species
        lost: Vec<f64>,
    },
    AbundanceLost {
        time: SimTime,
        vessel: VesselId,
        fad: FadId,
        /// Biomass (kg) destroyed per species
        lost: Vec<f64>,
        /// Abundance destroyed, species × subdivision × bin
        abundance: Vec<Vec<Vec<f64>>>,
    },
    FadLost {
        time: SimTime,
        vessel: VesselId,
        fad: FadId,
        cause: LossCause,
    },
    FadPickedUp {
        time: SimTime,
        vessel: VesselId,
        fad: FadId,
    },
}

impl FadEvent {
    /// The category observers subscribe to.
    pub fn kind(&self) -> EventKind {
        match self {
            FadEvent::FadDeployed { .. } => EventKind::FadDeployed,
            FadEvent::FishAttracted { .. } => EventKind::FishAttracted,
            FadEvent::FadFished { .. } => EventKind::FadFished,
            FadEvent::BiomassLost { .. } => EventKind::BiomassLost,
            FadEvent::AbundanceLost { .. } => EventKind::AbundanceLost,
            FadEvent::FadLost { .. } => EventKind::FadLost,
            FadEvent::FadPickedUp { .. } => EventKind::FadPickedUp,
        }
    }

    pub fn time(&self) -> SimTime {
        match self {
            FadEvent::FadDeployed { time, .. }
            | FadEvent::FishAttracted { time, .. }
            | FadEvent::FadFished { time, .. }
            | FadEvent::BiomassLost { time, .. }
            | FadEvent::AbundanceLost { time, .. }
            | FadEvent::FadLost { time, .. }
            | FadEvent::FadPickedUp { time, .. } => *time,
        }
    }

    pub fn vessel(&self) -> VesselId {
        match self {
            FadEvent::FadDeployed { vessel, .. }
            | FadEvent::FishAttracted { vessel, .. }
            | FadEvent::FadFished { vessel, .. }
            | FadEvent::BiomassLost { vessel, .. }
            | FadEvent::AbundanceLost { vessel, .. }
            | FadEvent::FadLost { vessel, .. }
            | FadEvent::FadPickedUp { vessel, .. } => *vessel,
        }
    }

    pub fn fad(&self) -> FadId {
        match self {
            FadEvent::FadDeployed { fad, .. }
            | FadEvent::FishAttracted { fad, .. }
            | FadEvent::FadFished { fad, .. }
            | FadEvent::BiomassLost { fad, .. }
            | FadEvent::AbundanceLost { fad, .. }
            | FadEvent::FadLost { fad, .. }
            | FadEvent::FadPickedUp { fad, .. } => *fad,
        }
    }

    /// Per-species biomass destroyed, for the two fish-lost kinds.
    pub fn lost_biomass(&self) -> Option<&[f64]> {
        match self {
            FadEvent::BiomassLost { lost, .. } | FadEvent::AbundanceLost { lost, .. } => {
                Some(lost.as_slice())
            }
            _ => None,
        }
    }

    /// Serializes the event to a JSON line (for JSONL format).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lost() -> FadEvent {
        FadEvent::BiomassLost {
            time: SimTime::new(12, 1),
            vessel: VesselId(3),
            fad: FadId(7),
            lost: vec![10.0, 0.0, 2.5],
        }
    }

    #[test]
    fn test_action_class_serialization() {
        assert_eq!(
            serde_json::to_string(&ActionClass::FadDeployment).unwrap(),
            r#""fad_deployment""#
        );
        assert_eq!(
            serde_json::from_str::<ActionClass>(r#""dolphin_set""#).unwrap(),
            ActionClass::DolphinSet
        );
    }

    #[test]
    fn test_action_class_predicates() {
        assert!(!ActionClass::FadDeployment.is_set());
        assert!(ActionClass::NonAssociatedSet.is_set());
        assert!(ActionClass::OpportunisticFadSet.is_fad_set());
        assert!(!ActionClass::DolphinSet.is_fad_set());
        assert_eq!(ActionClass::all().len(), 5);
    }

    #[test]
    fn test_event_accessors() {
        let event = sample_lost();
        assert_eq!(event.kind(), EventKind::BiomassLost);
        assert_eq!(event.vessel(), VesselId(3));
        assert_eq!(event.fad(), FadId(7));
        assert_eq!(event.time().step, 12);
        assert_eq!(event.lost_biomass(), Some(&[10.0, 0.0, 2.5][..]));
        assert!(event.kind().is_fish_lost());
    }

    #[test]
    fn test_event_jsonl_is_tagged() {
        let line = sample_lost().to_jsonl().unwrap();
        assert!(line.contains(r#""kind":"biomass_lost""#));
        let parsed = FadEvent::from_jsonl(&line).unwrap();
        assert_eq!(parsed, sample_lost());
    }

    #[test]
    fn test_display_ids() {
        assert_eq!(FadId(42).to_string(), "fad_0000_000042");
        assert_eq!(FadId::new(VesselId(3), 7).to_string(), "fad_0003_000007");
        assert_eq!(FadId::new(VesselId(3), 7).serial(), 7);
        assert_eq!(VesselId(5).to_string(), "vessel_0005");
        assert_eq!(TilePos::new(-1, 4).to_string(), "(-1, 4)");
    }
}
