//! The bicycle-rider: a bicycle and a rider joined at the saddle and the
//! hand grips.

mod hand_grips;
mod seats;

use brim_core::{BrimError, Descriptions, Model, ModelBase, Node, Slot};
use brim_mechanics::System;
use tracing::info;

pub use hand_grips::{HandGrips, HolonomicHandGrips};
pub use seats::{FixedSeat, Seat, SideLeanSeat, SideLeanSeatTorque};

use crate::{Rider, WhippleBicycle};

/// A bicycle with a rider on it.
///
/// Without a seat the rider floats freely next to the bicycle; without hand
/// grips the arms hang loose.
#[derive(Debug, brim_core::Model)]
pub struct BicycleRider {
    #[brim(base)]
    base: ModelBase,
    #[brim(submodel(description = "Bicycle model."))]
    bicycle: Slot<dyn WhippleBicycle>,
    #[brim(submodel(description = "Rider model."))]
    rider: Slot<Rider>,
    #[brim(connection(description = "Connection between the pelvis and the rear frame.", optional))]
    seat: Slot<dyn Seat>,
    #[brim(connection(description = "Connection between the steer and the arms.", optional))]
    hand_grips: Slot<dyn HandGrips>,
}

impl Model for BicycleRider {
    fn descriptions(&self) -> Descriptions {
        Descriptions::new()
    }

    fn define_connections_hook(&mut self) -> Result<(), BrimError> {
        let bicycle = self.require_bicycle()?;
        let rider = self.require_rider()?;
        let (bicycle, rider) = (bicycle.borrow(), rider.borrow());
        if let Some(seat) = self.seat() {
            let mut seat = seat.borrow_mut();
            seat.set_rear_frame(bicycle.rear_frame_submodel()?);
            seat.set_pelvis(rider.require_pelvis()?);
        }
        if let Some(grips) = self.hand_grips() {
            let mut grips = grips.borrow_mut();
            grips.set_front_frame(bicycle.front_frame_submodel()?);
            if let Some(arm) = rider.left_arm() {
                grips.set_left_arm(arm);
            }
            if let Some(arm) = rider.right_arm() {
                grips.set_right_arm(arm);
            }
        }
        Ok(())
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let system = {
            let bicycle = self.require_bicycle()?;
            let bicycle = bicycle.borrow();
            let bicycle_system = bicycle.node().system()?;
            System::new(bicycle_system.frame(), bicycle_system.fixed_point())
        };
        self.base.node.set_system(system);
        for connection in self.connections() {
            connection.borrow_mut().define_objects()?;
        }
        info!(model = self.name(), "placed the rider on the bicycle");
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        for connection in self.connections() {
            connection.borrow_mut().define_kinematics()?;
        }
        Ok(())
    }

    fn define_loads_hook(&mut self) -> Result<(), BrimError> {
        for connection in self.connections() {
            connection.borrow_mut().define_loads()?;
        }
        Ok(())
    }

    fn define_constraints_hook(&mut self) -> Result<(), BrimError> {
        for connection in self.connections() {
            connection.borrow_mut().define_constraints()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use brim_core::{Shared, shared};

    use super::*;
    use crate::{PlanarPelvis, WhippleBicycleMoore};

    #[test]
    fn bicycle_and_rider_are_required() {
        let model = BicycleRider::new("bicycle_rider").unwrap();
        assert_eq!(model.get_unspecified_paths(false), ["bicycle", "rider"]);
        assert_eq!(
            model.get_unspecified_paths(true),
            ["bicycle", "rider", "seat", "hand_grips"]
        );
    }

    #[test]
    fn seat_is_given_the_rear_frame_and_pelvis() {
        let bicycle: Shared<WhippleBicycleMoore> =
            shared(WhippleBicycleMoore::new("bicycle").unwrap());
        let mut rider = Rider::new("rider").unwrap();
        rider.set_pelvis(shared(PlanarPelvis::new("pelvis").unwrap()));
        let seat = shared(FixedSeat::new("seat").unwrap());

        let mut model = BicycleRider::new("bicycle_rider").unwrap();
        model.set_bicycle(bicycle);
        model.set_rider(shared(rider));
        model.set_seat(seat.clone());
        // The bicycle has no rear frame yet.
        assert!(matches!(
            model.define_connections(),
            Err(BrimError::Unspecified { requirement: "Rear frame", .. })
        ));
        assert!(seat.borrow().pelvis().is_none());
    }
}
