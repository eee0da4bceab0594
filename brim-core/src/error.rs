use brim_mechanics::MechanicsError;
use thiserror::Error;

/// Errors raised while composing and realizing models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrimError {
    #[error("The name of an object should be a valid identifier, got {0:?}.")]
    InvalidName(String),

    #[error("{requirement} of {owner} has not been specified.")]
    Unspecified {
        owner: String,
        requirement: &'static str,
    },

    #[error("{owner} has no symbol named {symbol:?}.")]
    UnknownSymbol { owner: String, symbol: String },

    #[error("{stage} of {node} requires define_objects to have run first.")]
    StageOrder { node: String, stage: &'static str },

    #[error("Parent of {group} should be a {expected}, but {parent} is a {actual}.")]
    InvalidParent {
        group: String,
        expected: &'static str,
        parent: String,
        actual: &'static str,
    },

    #[error("Load group {group} is already used by {parent}.")]
    AlreadyParented { group: String, parent: String },

    #[error("{property} of {owner} is invalid: {reason}")]
    InvalidGeometry {
        owner: String,
        property: &'static str,
        reason: String,
    },

    #[error("Rotation axis must be 'x', 'y' or 'z', got {0:?}.")]
    InvalidAxis(String),

    #[error("{0} has no auxiliary data handler; run define_objects on the root first.")]
    HandlerMissing(String),

    #[error("Auxiliary speeds have already been applied.")]
    AuxiliaryAlreadyApplied,

    #[error("Auxiliary velocities have not been computed yet.")]
    AuxiliaryNotComputed,

    #[error("Auxiliary velocity of point {0} has not been computed.")]
    AuxiliaryUnknownPoint(String),

    #[error("The point {point} of a noncontributing force is not connected to {root}.")]
    NotConnected { point: String, root: String },

    #[error("Graph contains a cycle.")]
    GraphCycle,

    #[error("Graph is invalid.")]
    GraphInvalid,

    #[error("{0}")]
    Unsupported(String),

    #[error("At least one system is needed to merge.")]
    NoSystems,

    #[error("No model found for convention {convention:?} of type {role}.")]
    NoConvention {
        role: &'static str,
        convention: String,
    },

    #[error("Multiple models found for convention {convention:?} of type {role}: {candidates:?}.")]
    MultipleConventions {
        role: &'static str,
        convention: String,
        candidates: Vec<&'static str>,
    },

    #[error("No default convention has been set for {0}.")]
    NoDefaultConvention(&'static str),

    #[error("{0} has already been registered.")]
    AlreadyRegistered(&'static str),

    #[error(transparent)]
    Mechanics(#[from] MechanicsError),
}
