//! Rider models: body segments, the joints between them and the rider
//! assembled from them.
//!
//! Segment frames follow the convention of the bicycle: x forward, y to the
//! right and z downward.

mod arms;
mod assembly;
mod hips;
mod legs;
mod pelvis;
mod rider_lean;
mod sacrums;
mod shoulders;
mod torso;

use std::collections::HashMap;

use brim_core::{BrimError, Descriptions, NodeBase};
use brim_mechanics::{Expr, Point, ReferenceFrame, Vector};

pub use arms::{Arm, LeftArm, PinElbowStickArmTorque, PinElbowStickLeftArm, PinElbowStickRightArm, RightArm};
pub use assembly::Rider;
pub use hips::{LeftHip, PinLeftHip, PinRightHip, RightHip, SphericalLeftHip, SphericalRightHip};
pub use legs::{LeftLeg, Leg, RightLeg, TwoPinLegTorque, TwoPinStickLeftLeg, TwoPinStickRightLeg};
pub use pelvis::{Pelvis, PlanarPelvis};
pub use rider_lean::{RiderLean, RiderLeanConnection};
pub use sacrums::{FixedSacrum, Sacrum};
pub use shoulders::{LeftShoulder, RightShoulder, SphericalLeftShoulder, SphericalRightShoulder};
pub use torso::{PlanarTorso, Torso};

/// Frames and points joined by a spherical joint.
struct SphericalGeometry<'a> {
    parent_frame: &'a ReferenceFrame,
    child_frame: &'a ReferenceFrame,
    parent_point: &'a Point,
    child_point: &'a Point,
}

const SPHERICAL_ANGLES: [&str; 3] = ["Flexion", "Adduction", "Rotation"];

/// Coordinates and speeds of a spherical joint, in the order flexion,
/// adduction, rotation.
fn define_spherical_objects(node: &mut NodeBase) {
    node.q = node.prefixed_dynamicsymbols("q_flexion, q_adduction, q_rotation");
    node.u = node.prefixed_dynamicsymbols("u_flexion, u_adduction, u_rotation");
}

fn spherical_descriptions(node: &NodeBase, joint: &str) -> Descriptions {
    let mut descriptions = Descriptions::new();
    for ((q, u), angle) in node.q.iter().zip(&node.u).zip(SPHERICAL_ANGLES) {
        descriptions.insert(q.clone(), format!("{angle} angle of the {joint}."));
        descriptions.insert(u.clone(), format!("{angle} angular velocity of the {joint}."));
    }
    descriptions
}

/// Joins two frames with body-fixed `yxz` rotations and adds the
/// coordinates, speeds and kinematic differential equations to the system
/// of `node`.
///
/// The adduction angle is negated on the left side, so that positive
/// adduction moves both limbs towards the body.
fn spherical_joint(
    node: &NodeBase,
    geometry: SphericalGeometry<'_>,
    left: bool,
) -> Result<(), BrimError> {
    let (q, u) = (&node.q, &node.u);
    let adduction = if left { -&q[1] } else { q[1].clone() };
    let child = geometry.child_frame;
    child.orient_body_fixed(geometry.parent_frame, [q[0].clone(), adduction, q[2].clone()], "yxz")?;
    let rates: HashMap<Expr, Expr> = q.iter().zip(u).map(|(qi, ui)| (qi.dt(), ui.clone())).collect();
    child.set_ang_vel(
        geometry.parent_frame,
        &child.ang_vel_in(geometry.parent_frame)?.subs(&rates),
    )?;

    geometry.child_point.set_pos(geometry.parent_point, Vector::zero());
    geometry.parent_point.set_vel(geometry.parent_frame, Vector::zero());
    geometry.child_point.set_vel(child, Vector::zero());

    let kdes: Vec<Expr> = q.iter().zip(u).map(|(qi, ui)| qi.dt() - ui).collect();
    let mut system = node.system_mut()?;
    system.add_coordinates(q, true)?;
    system.add_speeds(u, true)?;
    system.add_kdes(&kdes)?;
    Ok(())
}

/// Fixes `child` to `parent` with an identity orientation.
fn weld(child: &ReferenceFrame, parent: &ReferenceFrame) {
    child.orient_explicit(
        parent,
        std::array::from_fn(|i| {
            std::array::from_fn(|j| if i == j { Expr::one() } else { Expr::zero() })
        }),
    );
}
