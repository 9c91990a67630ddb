//! Errors
//!
//! Recoverable failures of FAD operations. Contract violations panic instead.

use fad_events::{FadId, VesselId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FadError {
    #[error("{vessel} has no FADs in stock")]
    NoFadsInStock { vessel: VesselId },

    #[error("{fad} is not deployed by {vessel}")]
    UnknownFad { vessel: VesselId, fad: FadId },

    #[error("expected {expected} biology")]
    WrongBiology { expected: &'static str },

    #[error("invalid capacity distribution: {0}")]
    InvalidDistribution(String),

    #[error("invalid attractor parameters: {0}")]
    InvalidAttractor(String),
}

pub type FadResult<T> = Result<T, FadError>;
