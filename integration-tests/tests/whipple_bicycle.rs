use brim_core::{LoadGroupHandle, Model, ParameterSet, shared};
use brim_mechanics::Expr;
use brim_models::{InContactTire, SteerTorque, TireConfig, WhippleBicycle};
use integration_tests::whipple_bicycle;

const MOORE_PARAMETERS: &str = r#"
rear_frame_d1 = 0.9534570696121849
rear_frame_l1 = 0.4707271515135145
rear_frame_l2 = -0.47792881146460797
rear_frame_d4 = 0.35
rear_frame_d5 = -0.6
rear_frame_l_bbx = 0.4
rear_frame_l_bbz = 0.18
rear_frame_mass = 85.0
rear_frame_ixx = 7.178169776497895
rear_frame_iyy = 11.0
rear_frame_izz = 4.821830223502103
rear_frame_izx = 3.822553593835788

front_frame_d2 = 0.2676445084476887
front_frame_d3 = 0.03207142672761929
front_frame_l3 = -0.01
front_frame_l4 = -0.1
front_frame_d6 = -0.1
front_frame_d7 = 0.3
front_frame_d8 = -0.5
front_frame_mass = 4.0
front_frame_ixx = 0.0476
front_frame_iyy = 0.06
front_frame_izz = 0.0124
front_frame_izx = 0.0085

rear_wheel_r = 0.3
rear_wheel_mass = 2.0
rear_wheel_ixx = 0.0603
rear_wheel_iyy = 0.12

front_wheel_r = 0.35
front_wheel_mass = 3.0
front_wheel_ixx = 0.1405
front_wheel_iyy = 0.28
"#;

#[test]
fn benchmark_parameters_cover_every_constant() {
    let bicycle = whipple_bicycle("bicycle").unwrap();
    bicycle.borrow_mut().define_all().unwrap();
    let bicycle = bicycle.borrow();

    let params: ParameterSet = toml::from_str(MOORE_PARAMETERS).unwrap();
    let values = bicycle.get_param_values(&params);
    let constants: Vec<Expr> = bicycle
        .get_all_symbols()
        .into_iter()
        .filter(|s| !s.is_dynamic())
        .collect();
    assert_eq!(constants.len(), params.len());
    for constant in &constants {
        assert!(values.contains_key(constant), "no value for {constant}");
    }
}

#[test]
fn coordinates_and_parameters_are_described_through_the_tree() {
    let bicycle = whipple_bicycle("bicycle").unwrap();
    bicycle.borrow_mut().define_all().unwrap();
    let bicycle = bicycle.borrow();

    let q = bicycle.coordinates();
    assert_eq!(q.len(), 8);
    assert_eq!(
        bicycle.get_description(&q[3]).as_deref(),
        Some("Roll angle of the rear frame of bicycle.")
    );
    assert_eq!(
        bicycle
            .get_description(&Expr::symbol("front_wheel_r"))
            .as_deref(),
        Some("Radius of the wheel.")
    );
    assert!(bicycle.get_description(&Expr::symbol("unknown")).is_none());
}

#[test]
fn steer_torque_is_reacted_on_the_rear_frame() {
    let bicycle = whipple_bicycle("bicycle").unwrap();
    let steer = shared(SteerTorque::new("steer").unwrap());
    bicycle
        .borrow_mut()
        .add_load_groups(&[LoadGroupHandle::new(steer)])
        .unwrap();
    bicycle.borrow_mut().define_all().unwrap();

    let system = bicycle.borrow().to_system().unwrap();
    let loads = system.actuators()[0].to_loads();
    assert_eq!(loads.len(), 2);
    assert!((loads[0].vector().clone() + loads[1].vector().clone()).is_zero());
}

#[test]
fn rear_normal_force_adds_an_auxiliary_speed() {
    let bicycle = whipple_bicycle("bicycle").unwrap();
    let config = TireConfig {
        compute_normal_force: true,
        ..TireConfig::NON_HOLONOMIC
    };
    bicycle
        .borrow_mut()
        .set_rear_tire(shared(InContactTire::with_config("rear_tire", config).unwrap()));
    bicycle.borrow_mut().define_all().unwrap();

    let bicycle = bicycle.borrow();
    let system = bicycle.to_system().unwrap();
    assert_eq!(system.u_aux(), &[Expr::dynamic("rear_tire_uaux_z")]);
    assert_eq!(system.nonholonomic_constraints().len(), 4);
    assert_eq!(bicycle.is_root(), Some(true));
    let rear_frame = bicycle.require_rear_frame().unwrap();
    assert_eq!(rear_frame.borrow().is_root(), Some(false));
}
