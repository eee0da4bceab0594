use brim_core::{BrimError, Connection, ConnectionBase, Descriptions, Node, Shared, Slot};
use brim_mechanics::System;

use super::{Pelvis, Torso, weld};

/// A connection between the pelvis and the torso.
pub trait Sacrum: Connection {
    fn set_pelvis(&mut self, pelvis: Shared<dyn Pelvis>);
    fn set_torso(&mut self, torso: Shared<dyn Torso>);
}

/// Torso fixed to the pelvis, its center of mass a distance `d_p_t` above
/// that of the pelvis.
#[derive(Debug, brim_core::Connection)]
pub struct FixedSacrum {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Pelvis model."))]
    pelvis: Slot<dyn Pelvis>,
    #[brim(submodel(description = "Torso model."))]
    torso: Slot<dyn Torso>,
}

impl Connection for FixedSacrum {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = Descriptions::new();
        if let Ok(distance) = self.node().symbol("d_p_t") {
            descriptions.insert(
                distance,
                "Distance from the torso center of mass to the pelvis.".to_string(),
            );
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let pelvis = self.require_pelvis()?.borrow().body()?;
        let node = &mut self.base.node;
        node.set_symbol("d_p_t", node.prefixed_symbol("d_p_t"));
        node.set_system(System::from_newtonian(&pelvis));
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let pelvis = self.require_pelvis()?.borrow().body()?;
        let torso = self.require_torso()?.borrow().body()?;
        weld(torso.frame(), pelvis.frame());
        torso.masscenter().set_pos(
            pelvis.masscenter(),
            -pelvis.z() * self.node().symbol("d_p_t")?,
        );
        Ok(())
    }
}

impl Sacrum for FixedSacrum {
    fn set_pelvis(&mut self, pelvis: Shared<dyn Pelvis>) {
        self.pelvis.set(pelvis);
    }

    fn set_torso(&mut self, torso: Shared<dyn Torso>) {
        self.torso.set(torso);
    }
}
