use brim_core::{BrimError, Descriptions, LoadGroup, LoadGroupBase, Node, downcast_parent};
use brim_mechanics::{Expr, TorqueActuator};

use crate::{FrontFrame, RearFrame, WhippleBicycleMoore};

/// Torque about the steer axis, applied to the front frame and reacted on
/// the rear frame.
#[derive(Debug, brim_core::LoadGroup)]
#[brim(parent(WhippleBicycleMoore))]
pub struct SteerTorque {
    #[brim(base)]
    base: LoadGroupBase,
}

impl LoadGroup for SteerTorque {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = Descriptions::new();
        if let Ok(torque) = self.node().symbol("T") {
            descriptions.insert(torque, "Steer torque.".to_string());
        }
        descriptions
    }

    fn define_objects_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        node.set_symbol("T", Expr::dynamic(&format!("{}_T", node.name())));
        Ok(())
    }

    fn define_loads_hook(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        let bicycle = downcast_parent::<WhippleBicycleMoore>(&*self, parent)?;
        let rear = bicycle.require_rear_frame()?;
        let front = bicycle.require_front_frame()?;
        let (rear, front) = (rear.borrow(), front.borrow());
        let actuator = TorqueActuator::new(
            self.node().symbol("T")?,
            rear.steer_hub()?.axis().clone(),
            &front.frame()?,
            Some(&rear.frame()?),
        );
        self.node().system_mut()?.add_actuators(&[actuator])?;
        Ok(())
    }
}
