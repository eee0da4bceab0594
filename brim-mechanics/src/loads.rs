//! Forces, torques and actuators.

use std::fmt;

use crate::{Expr, Point, ReferenceFrame, Vector};

/// A load applied to a system.
#[derive(Clone, PartialEq)]
pub enum Load {
    /// A force acting at a point.
    Force { point: Point, vector: Vector },
    /// A torque acting on a frame.
    Torque { frame: ReferenceFrame, vector: Vector },
}

impl Load {
    pub fn force(point: &Point, vector: Vector) -> Self {
        Load::Force {
            point: point.clone(),
            vector,
        }
    }

    pub fn torque(frame: &ReferenceFrame, vector: Vector) -> Self {
        Load::Torque {
            frame: frame.clone(),
            vector,
        }
    }

    pub fn vector(&self) -> &Vector {
        match self {
            Load::Force { vector, .. } | Load::Torque { vector, .. } => vector,
        }
    }
}

impl fmt::Debug for Load {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Load::Force { point, vector } => write!(f, "Force({point}, {vector})"),
            Load::Torque { frame, vector } => write!(f, "Torque({frame}, {vector})"),
        }
    }
}

/// A torque of magnitude `torque` about `axis`, acting on `target` and, if
/// given, reacting on `reaction`.
#[derive(Clone, Debug, PartialEq)]
pub struct TorqueActuator {
    torque: Expr,
    axis: Vector,
    target: ReferenceFrame,
    reaction: Option<ReferenceFrame>,
}

impl TorqueActuator {
    pub fn new(
        torque: impl Into<Expr>,
        axis: Vector,
        target: &ReferenceFrame,
        reaction: Option<&ReferenceFrame>,
    ) -> Self {
        Self {
            torque: torque.into(),
            axis,
            target: target.clone(),
            reaction: reaction.cloned(),
        }
    }

    pub fn torque(&self) -> &Expr {
        &self.torque
    }

    /// The loads equivalent to this actuator.
    pub fn to_loads(&self) -> Vec<Load> {
        let vector = &self.axis * &self.torque;
        let mut loads = vec![Load::torque(&self.target, vector.clone())];
        if let Some(reaction) = &self.reaction {
            loads.push(Load::torque(reaction, -vector));
        }
        loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_produces_action_and_reaction() {
        let n = ReferenceFrame::new("N");
        let b = ReferenceFrame::new("B");
        let t = Expr::symbol("T");
        let actuator = TorqueActuator::new(t.clone(), n.z(), &b, Some(&n));
        let loads = actuator.to_loads();
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0], Load::torque(&b, n.z() * t.clone()));
        assert_eq!(loads[1], Load::torque(&n, n.z() * -t));
    }
}
