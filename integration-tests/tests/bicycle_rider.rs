//! A full rider on the Whipple bicycle.

use brim_core::{Model, Node, shared};
use brim_mechanics::check_zero;
use brim_models::{BicycleRider, FixedSeat, Pelvis, RearFrame, WhippleBicycle};
use integration_tests::{bicycle_rider, rider, whipple_bicycle};

#[test]
fn rider_holds_the_handlebar() {
    let model = bicycle_rider("bicycle_rider").unwrap();
    model.borrow_mut().define_all().unwrap();
    let model = model.borrow();
    let system = model.to_system().unwrap();

    // Eight bicycle coordinates; elbows, knees and ankles, two spherical
    // shoulders and two pin hips for the rider.
    assert_eq!(system.q().len(), 8 + 2 + 4 + 6 + 2);
    assert_eq!(system.bodies().len(), 4 + 12);
    // The front tire keeps its contact point on the ground; each hand is
    // held in three directions.
    assert_eq!(system.holonomic_constraints().len(), 1 + 6);
    assert_eq!(system.frame(), model.node().system().unwrap().frame());
}

#[test]
fn seated_pelvis_moves_with_the_rear_frame() {
    let mut model = BicycleRider::new("bicycle_rider").unwrap();
    let bicycle = whipple_bicycle("bicycle").unwrap();
    let rider = rider("rider").unwrap();
    model.set_bicycle(bicycle.clone());
    model.set_rider(rider.clone());
    model.set_seat(shared(FixedSeat::new("seat").unwrap()));
    let model = shared(model);
    model.borrow_mut().define_all().unwrap();

    let rear = bicycle.borrow().rear_frame_submodel().unwrap();
    let rear = rear.borrow();
    let pelvis = rider.borrow().require_pelvis().unwrap();
    let pelvis = pelvis.borrow();
    let rear_frame = rear.frame().unwrap();
    let pelvis_frame = pelvis.frame().unwrap();
    assert!(pelvis_frame.ang_vel_in(&rear_frame).unwrap().is_zero());

    // The saddle point and the hip midpoint coincide and share a velocity.
    let saddle = rear.saddle().unwrap();
    let ground = model.borrow().node().system().unwrap().frame().clone();
    let offset = pelvis.left_hip_point().unwrap().pos_from(saddle.point()).unwrap()
        + pelvis.right_hip_point().unwrap().pos_from(saddle.point()).unwrap();
    assert!(offset.is_zero());
    let slip = pelvis.body().unwrap().masscenter().vel(&ground).unwrap()
        - saddle.point().vel(&ground).unwrap();
    assert!(slip.to_matrix(&ground).unwrap().iter().all(check_zero));
}
