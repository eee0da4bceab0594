//! Bicycle components and the Whipple bicycle assembled from them.

mod front_frames;
mod grounds;
mod load_groups;
mod rear_frames;
mod tires;
mod wheels;
mod whipple_bicycle;

pub use front_frames::{FrontFrame, RigidFrontFrameMoore};
pub use grounds::{FlatGround, Ground};
pub use load_groups::SteerTorque;
pub use rear_frames::{RearFrame, RigidRearFrameMoore};
pub use tires::{InContactTire, NonHolonomicTire, Tire};
pub use wheels::{KnifeEdgeWheel, ToroidalWheel, Wheel};
pub use whipple_bicycle::{WhippleBicycle, WhippleBicycleMoore};
