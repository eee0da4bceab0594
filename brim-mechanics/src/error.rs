use thiserror::Error;

/// Errors raised by the symbolic mechanics layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MechanicsError {
    #[error("no value was supplied for {symbol}")]
    MissingValue { symbol: String },

    #[error("reference frame {from} is not connected to reference frame {to}")]
    FramesNotConnected { from: String, to: String },

    #[error("point {from} is not connected to point {to}")]
    PointsNotConnected { from: String, to: String },

    #[error("velocity of point {point} has not been defined in reference frame {frame}")]
    VelocityUndefined { point: String, frame: String },

    #[error("reference frame {frame} has no orientation relative to {other}")]
    NotOriented { frame: String, other: String },

    #[error("invalid rotation order {0:?}")]
    InvalidRotationOrder(String),

    #[error("cannot normalize a zero vector")]
    ZeroVector,

    #[error("{kind} {name} has already been added")]
    Duplicate { kind: &'static str, name: String },

    #[error("invalid kinematic differential equation {equation}: {reason}")]
    InvalidKinematics { equation: String, reason: &'static str },

    #[error(
        "number of velocity constraints ({constraints}) does not match the number of dependent speeds ({dependent})"
    )]
    ConstraintMismatch { constraints: usize, dependent: usize },

    #[error("matrix is singular while {0}")]
    Singular(&'static str),

    #[error("joint {joint}: {reason}")]
    InvalidJoint { joint: String, reason: String },
}
