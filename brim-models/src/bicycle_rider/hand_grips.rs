use brim_core::{BrimError, Connection, ConnectionBase, Descriptions, Node, Shared, Slot};
use brim_mechanics::{Expr, Point, System, check_zero};
use tracing::debug;

use crate::{FrontFrame, LeftArm, RightArm};

/// A connection between the hand grips of the front frame and the arms.
pub trait HandGrips: Connection {
    fn set_front_frame(&mut self, front_frame: Shared<dyn FrontFrame>);
    fn set_left_arm(&mut self, arm: Shared<dyn LeftArm>);
    fn set_right_arm(&mut self, arm: Shared<dyn RightArm>);
}

/// Holds the hands on the hand grips with holonomic constraints.
///
/// Every direction of the front frame in which a hand is not already fixed
/// to its grip yields one constraint. Such a constraint has to depend on
/// time; a constant one means the geometry leaves the loop no freedom in
/// that direction, which makes the system inconsistent.
#[derive(Debug, brim_core::Connection)]
pub struct HolonomicHandGrips {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Front frame model."))]
    front_frame: Slot<dyn FrontFrame>,
    #[brim(submodel(description = "Left arm model.", optional))]
    left_arm: Slot<dyn LeftArm>,
    #[brim(submodel(description = "Right arm model.", optional))]
    right_arm: Slot<dyn RightArm>,
}

impl HolonomicHandGrips {
    fn hand_constraints(
        &self,
        hand: &Point,
        grip: &Point,
        constraints: &mut Vec<Expr>,
    ) -> Result<(), BrimError> {
        let frame = self.require_front_frame()?.borrow().frame()?;
        let offset = hand.pos_from(grip)?;
        for (direction, axis) in [frame.x(), frame.y(), frame.z()].iter().zip(["x", "y", "z"]) {
            let constraint = offset.dot(direction)?;
            if check_zero(&constraint) {
                continue;
            }
            if check_zero(&constraint.dt()) {
                return Err(BrimError::InvalidGeometry {
                    owner: self.name().to_string(),
                    property: "hand grip",
                    reason: format!(
                        "the constraint of {} along the front frame {axis} axis does not \
                         depend on time: {constraint}",
                        hand.name()
                    ),
                });
            }
            constraints.push(constraint);
        }
        Ok(())
    }
}

impl Connection for HolonomicHandGrips {
    fn descriptions(&self) -> Descriptions {
        Descriptions::new()
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let front = self.require_front_frame()?.borrow().body()?;
        self.base.node.set_system(System::from_newtonian(&front));
        Ok(())
    }

    fn define_constraints_hook(&mut self) -> Result<(), BrimError> {
        let front_frame = self.require_front_frame()?;
        let (left_grip, right_grip) = {
            let front_frame = front_frame.borrow();
            (front_frame.left_hand_grip()?, front_frame.right_hand_grip()?)
        };
        let mut constraints = Vec::new();
        if let Some(arm) = self.left_arm() {
            let hand = arm.borrow().hand_interpoint()?;
            self.hand_constraints(&hand, left_grip.point(), &mut constraints)?;
        }
        if let Some(arm) = self.right_arm() {
            let hand = arm.borrow().hand_interpoint()?;
            self.hand_constraints(&hand, right_grip.point(), &mut constraints)?;
        }
        debug!(
            connection = self.name(),
            count = constraints.len(),
            "constrained the hands to the grips"
        );
        self.node().system_mut()?.add_holonomic_constraints(&constraints)?;
        Ok(())
    }
}

impl HandGrips for HolonomicHandGrips {
    fn set_front_frame(&mut self, front_frame: Shared<dyn FrontFrame>) {
        self.front_frame.set(front_frame);
    }

    fn set_left_arm(&mut self, arm: Shared<dyn LeftArm>) {
        self.left_arm.set(arm);
    }

    fn set_right_arm(&mut self, arm: Shared<dyn RightArm>) {
        self.right_arm.set(arm);
    }
}
