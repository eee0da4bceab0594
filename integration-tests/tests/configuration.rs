use brim_core::{Model, ParameterSet, ParameterSource, shared};
use brim_mechanics::Expr;
use brim_models::{FlatGround, GroundNormal, InContactTire, KnifeEdgeWheel, RollingDisc, TireConfig};
use serde::Deserialize;

/// Options for assembling a rolling disc, as a user would write them.
#[derive(Debug, Deserialize)]
struct DiscSetup {
    normal: GroundNormal,
    tire: TireConfig,
    parameters: ParameterSet,
}

impl DiscSetup {
    fn build(&self) -> RollingDisc {
        let mut model = RollingDisc::new("rolling_disc").unwrap();
        let ground = FlatGround::with_normal("ground", self.normal).unwrap();
        model.set_ground(shared(ground));
        model.set_disc(shared(KnifeEdgeWheel::new("disc").unwrap()));
        let tire = InContactTire::with_config("tire", self.tire).unwrap();
        model.set_tire(shared(tire));
        model
    }
}

#[test]
fn tire_config_fills_missing_flags_with_defaults() {
    let config: TireConfig = serde_json::from_str(r#"{"no_lateral_slip": true}"#).unwrap();
    assert_eq!(
        config,
        TireConfig {
            compute_normal_force: true,
            no_longitudinal_slip: false,
            no_lateral_slip: true,
        }
    );

    let config: TireConfig = toml::from_str("compute_normal_force = false").unwrap();
    assert!(!config.compute_normal_force);

    let json = serde_json::to_string(&TireConfig::NON_HOLONOMIC).unwrap();
    assert_eq!(
        serde_json::from_str::<TireConfig>(&json).unwrap(),
        TireConfig::NON_HOLONOMIC
    );
}

#[test]
fn ground_normals_use_signed_axis_names() {
    let normals: Vec<GroundNormal> = serde_json::from_str(r#"["+x", "-y", "-z"]"#).unwrap();
    assert_eq!(
        normals,
        [GroundNormal::PosX, GroundNormal::NegY, GroundNormal::NegZ]
    );
    assert_eq!(serde_json::to_string(&GroundNormal::PosZ).unwrap(), r#""+z""#);
    assert!(serde_json::from_str::<GroundNormal>(r#""up""#).is_err());
}

#[test]
fn parameter_sets_are_plain_maps() {
    let params: ParameterSet =
        serde_json::from_str(r#"{"disc_r": 0.3, "disc_mass": 2.5}"#).unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params.get("disc_r"), Some(0.3));
    assert_eq!(params.get("disc_ixx"), None);
}

#[test]
fn disc_is_assembled_from_a_toml_setup() {
    let setup: DiscSetup = toml::from_str(
        r#"
        normal = "+z"

        [tire]
        compute_normal_force = false
        no_longitudinal_slip = true
        no_lateral_slip = true

        [parameters]
        disc_r = 0.45
        disc_mass = 1.23
        "#,
    )
    .unwrap();
    assert_eq!(setup.normal, GroundNormal::PosZ);
    assert_eq!(setup.tire, TireConfig::NON_HOLONOMIC);

    let mut model = setup.build();
    model.define_all().unwrap();
    let system = model.to_system().unwrap();
    assert!(system.u_aux().is_empty());
    assert_eq!(system.nonholonomic_constraints().len(), 2);

    let values = model.get_param_values(&setup.parameters);
    assert_eq!(values.len(), 2);
    assert_eq!(values[&Expr::symbol("disc_r")], 0.45);
}
