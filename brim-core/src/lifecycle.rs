//! Staged realization of a model tree.
//!
//! Models run their submodels first, then their own hook, then their load
//! groups. The root additionally owns the auxiliary data handler: it is
//! created after the root's objects exist, applied after all kinematics
//! and turned into loads after all other loads.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::{
    AuxiliaryDataHandler, BrimError, Connection, LoadGroup, LoadGroupHandle, Model, Node,
    Shared, shared,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Objects,
    Kinematics,
    Loads,
    Constraints,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Objects => "define_objects",
            Stage::Kinematics => "define_kinematics",
            Stage::Loads => "define_loads",
            Stage::Constraints => "define_constraints",
        }
    }
}

fn require_system(node: &dyn Node, stage: Stage) -> Result<(), BrimError> {
    if stage != Stage::Objects && !node.node().has_system() {
        return Err(BrimError::StageOrder {
            node: node.name().to_string(),
            stage: stage.name(),
        });
    }
    Ok(())
}

fn run_model_hook(model: &mut dyn Model, stage: Stage) -> Result<(), BrimError> {
    debug!(model = model.name(), stage = stage.name(), "running stage");
    match stage {
        Stage::Objects => model.define_objects_hook(),
        Stage::Kinematics => model.define_kinematics_hook(),
        Stage::Loads => model.define_loads_hook(),
        Stage::Constraints => model.define_constraints_hook(),
    }
}

fn run_load_groups(
    groups: &[LoadGroupHandle],
    parent: &dyn Node,
    stage: Stage,
) -> Result<(), BrimError> {
    for group in groups {
        load_group_stage(&mut *group.borrow_mut(), parent, stage)?;
    }
    Ok(())
}

/// Runs `stage` on every submodel, then on the model itself and its load
/// groups.
fn post_order(
    model: &mut dyn Model,
    stage: Stage,
    recurse: fn(&mut dyn Model) -> Result<(), BrimError>,
) -> Result<(), BrimError> {
    require_system(model.as_node(), stage)?;
    for submodel in model.submodels() {
        recurse(&mut *submodel.borrow_mut())?;
    }
    run_model_hook(model, stage)?;
    run_load_groups(&model.load_groups(), model.as_node(), stage)
}

pub(crate) fn define_connections(model: &mut dyn Model) -> Result<(), BrimError> {
    debug!(model = model.name(), stage = "define_connections", "running stage");
    model.define_connections_hook()?;
    for submodel in model.submodels() {
        define_connections(&mut *submodel.borrow_mut())?;
    }
    Ok(())
}

pub(crate) fn define_objects(model: &mut dyn Model) -> Result<(), BrimError> {
    if model.is_root().is_none() {
        mark_root(model);
    }
    for submodel in model.submodels() {
        define_objects(&mut *submodel.borrow_mut())?;
    }
    run_model_hook(model, Stage::Objects)?;

    if model.is_root() == Some(true) && model.node().auxiliary_handler().is_none() {
        let handler = shared(AuxiliaryDataHandler::from_system(&*model.node().system()?));
        info!(root = model.name(), "created auxiliary data handler");
        propagate_handler(model, &handler);
    }

    run_load_groups(&model.load_groups(), model.as_node(), Stage::Objects)
}

pub(crate) fn define_kinematics(model: &mut dyn Model) -> Result<(), BrimError> {
    post_order(model, Stage::Kinematics, define_kinematics)?;
    if model.is_root() == Some(true) {
        let handler = model.node().require_auxiliary_handler()?;
        handler.borrow_mut().apply_speeds()?;
        let speeds = handler.borrow().auxiliary_speeds();
        debug!(root = model.name(), count = speeds.len(), "applied auxiliary speeds");
        model.node().system_mut()?.add_auxiliary_speeds(&speeds)?;
    }
    Ok(())
}

pub(crate) fn define_loads(model: &mut dyn Model) -> Result<(), BrimError> {
    post_order(model, Stage::Loads, define_loads)?;
    if model.is_root() == Some(true) {
        let handler = model.node().require_auxiliary_handler()?;
        let loads = handler.borrow().create_loads();
        model.node().system_mut()?.add_loads(&loads)?;
    }
    Ok(())
}

pub(crate) fn define_constraints(model: &mut dyn Model) -> Result<(), BrimError> {
    post_order(model, Stage::Constraints, define_constraints)
}

pub(crate) fn define_all(model: &mut dyn Model) -> Result<(), BrimError> {
    define_connections(model)?;
    define_objects(model)?;
    define_kinematics(model)?;
    define_loads(model)?;
    define_constraints(model)
}

pub(crate) fn connection_stage(
    connection: &mut dyn Connection,
    stage: Stage,
) -> Result<(), BrimError> {
    require_system(connection.as_node(), stage)?;
    debug!(
        connection = connection.name(),
        stage = stage.name(),
        "running stage"
    );
    match stage {
        Stage::Objects => connection.define_objects_hook()?,
        Stage::Kinematics => connection.define_kinematics_hook()?,
        Stage::Loads => connection.define_loads_hook()?,
        Stage::Constraints => connection.define_constraints_hook()?,
    }
    run_load_groups(&connection.load_groups(), connection.as_node(), stage)
}

pub(crate) fn load_group_stage(
    group: &mut dyn LoadGroup,
    parent: &dyn Node,
    stage: Stage,
) -> Result<(), BrimError> {
    debug!(
        load_group = group.name(),
        parent = parent.name(),
        stage = stage.name(),
        "running stage"
    );
    match stage {
        Stage::Objects => group.define_objects_hook(parent),
        Stage::Kinematics => group.define_kinematics_hook(parent),
        Stage::Loads => group.define_loads_hook(parent),
        Stage::Constraints => group.define_constraints_hook(parent),
    }
}

/// Marks `model` as root and every model reachable from it as non-root.
fn mark_root(model: &mut dyn Model) {
    info!(root = model.name(), "selected root model");
    model.model_base_mut().set_is_root(true);
    let mut queue: VecDeque<_> = model.submodels().into();
    while let Some(submodel) = queue.pop_front() {
        let mut submodel = submodel.borrow_mut();
        submodel.model_base_mut().set_is_root(false);
        queue.extend(submodel.submodels());
    }
}

fn propagate_handler(model: &mut dyn Model, handler: &Shared<AuxiliaryDataHandler>) {
    model.node_mut().set_auxiliary_handler(handler.clone());
    for connection in model.connections() {
        let mut connection = connection.borrow_mut();
        connection.node_mut().set_auxiliary_handler(handler.clone());
        for group in connection.load_groups() {
            group.borrow_mut().node_mut().set_auxiliary_handler(handler.clone());
        }
    }
    for group in model.load_groups() {
        group.borrow_mut().node_mut().set_auxiliary_handler(handler.clone());
    }
    for submodel in model.submodels() {
        propagate_handler(&mut *submodel.borrow_mut(), handler);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use approx::assert_relative_eq;
    use brim_mechanics::{Expr, Values};

    use crate::{
        AnyNode, LoadGroupHandle, ModelComposite, ModelHandle, ParameterSet, Slot,
        test_models::{Cart, Contact, Push, Scene, Track},
        testing::check_descriptions,
    };

    use super::*;

    struct Fixture {
        scene: Shared<Scene>,
        track: Shared<Track>,
        cart: Shared<Cart>,
        contact: Shared<Contact>,
    }

    fn fixture(with_contact: bool) -> Fixture {
        let scene = shared(Scene::new("scene").unwrap());
        let track = shared(Track::new("track").unwrap());
        let cart = shared(Cart::new("cart").unwrap());
        let contact = shared(Contact::new("contact").unwrap());
        {
            let mut scene = scene.borrow_mut();
            scene.set_track(track.clone());
            scene.set_cart(cart.clone());
            if with_contact {
                scene.set_contact(contact.clone());
            }
        }
        Fixture {
            scene,
            track,
            cart,
            contact,
        }
    }

    fn push() -> LoadGroupHandle {
        LoadGroupHandle::new(shared(Push::new("push").unwrap()))
    }

    #[test]
    fn kinematics_before_objects_fails() {
        let f = fixture(false);
        let mut scene = f.scene.borrow_mut();
        scene.define_connections().unwrap();
        assert_eq!(
            scene.define_kinematics().unwrap_err(),
            BrimError::StageOrder {
                node: "scene".to_string(),
                stage: "define_kinematics",
            }
        );
    }

    #[test]
    fn first_defined_model_becomes_the_only_root() {
        let f = fixture(true);
        assert_eq!(f.scene.borrow().is_root(), None);
        f.scene.borrow_mut().define_connections().unwrap();
        f.scene.borrow_mut().define_objects().unwrap();

        assert_eq!(f.scene.borrow().is_root(), Some(true));
        assert_eq!(f.track.borrow().is_root(), Some(false));
        assert_eq!(f.cart.borrow().is_root(), Some(false));

        let handler = f.scene.borrow().node().require_auxiliary_handler().unwrap();
        for node in [
            f.track.borrow().node().auxiliary_handler().cloned(),
            f.cart.borrow().node().auxiliary_handler().cloned(),
            f.contact.borrow().node().auxiliary_handler().cloned(),
        ] {
            assert!(Rc::ptr_eq(&handler, &node.unwrap()));
        }

        f.scene.borrow_mut().define_objects().unwrap();
        let again = f.scene.borrow().node().require_auxiliary_handler().unwrap();
        assert!(Rc::ptr_eq(&handler, &again));
    }

    #[test]
    fn submodel_defined_first_keeps_its_own_root() {
        let f = fixture(false);
        f.cart.borrow_mut().define_objects().unwrap();
        assert_eq!(f.cart.borrow().is_root(), Some(true));
        assert!(f.cart.borrow().node().auxiliary_handler().is_some());
        assert_eq!(f.scene.borrow().is_root(), None);
    }

    #[test]
    fn auxiliary_velocity_is_added_to_the_cart() {
        let f = fixture(true);
        f.scene.borrow_mut().define_all().unwrap();

        let frame = f.track.borrow().frame().unwrap();
        let point = f.cart.borrow().particle().unwrap().point().clone();
        let uaux = f.contact.borrow().node().u_aux[0].clone();
        let u = f.cart.borrow().node().u[0].clone();

        let handler = f.scene.borrow().node().require_auxiliary_handler().unwrap();
        let handler = handler.borrow();
        assert_eq!(
            handler.get_auxiliary_velocity(&point).unwrap(),
            frame.z() * uaux.clone()
        );
        assert!(
            handler
                .get_auxiliary_velocity(&f.track.borrow().origin().unwrap())
                .unwrap()
                .is_zero()
        );
        assert_eq!(
            point.vel(&frame).unwrap(),
            frame.x() * u + frame.z() * uaux.clone()
        );

        let system = f.scene.borrow().to_system().unwrap();
        assert_eq!(system.u_aux(), &[uaux]);
        assert_eq!(system.loads().len(), 2);
    }

    #[test]
    fn normal_force_balances_the_weight() {
        let f = fixture(true);
        f.scene.borrow_mut().add_load_groups(&[push()]).unwrap();
        f.scene.borrow_mut().define_all().unwrap();

        let system = f.scene.borrow().to_system().unwrap();
        assert_eq!(system.loads().len(), 3);
        let eoms = system.form_eoms().unwrap();

        let params: ParameterSet = [("cart_m", 2.0), ("scene_g", 9.81), ("push_F", 3.0)]
            .into_iter()
            .collect();
        let mut values: Values = f.scene.borrow().get_param_values(&params);
        assert_eq!(values.len(), 3);
        values.insert(Expr::dynamic("cart_q"), 0.4);
        values.insert(Expr::dynamic("cart_u"), -1.2);
        values.insert(Expr::dynamic("contact_uaux"), 0.0);
        values.insert(Expr::symbol("contact_Fz"), 0.0);

        let derivative = eoms.solve(&values).unwrap();
        assert_relative_eq!(derivative[0], -1.2, epsilon = 1e-12);
        assert_relative_eq!(derivative[1], 1.5, epsilon = 1e-12);

        let normal = eoms
            .solve_auxiliary(&values, &[Expr::symbol("contact_Fz")])
            .unwrap();
        assert_relative_eq!(normal[0], 2.0 * 9.81, epsilon = 1e-9);
    }

    #[test]
    fn missing_components_are_reported() {
        let scene = Scene::new("scene").unwrap();
        let hard: Vec<_> = scene
            .get_unspecified_components(false)
            .iter()
            .map(|c| c.attribute())
            .collect();
        assert_eq!(hard, ["track", "cart"]);
        let all: Vec<_> = scene
            .get_unspecified_components(true)
            .iter()
            .map(|c| c.full_name())
            .collect();
        assert_eq!(all, ["Track", "Cart", "Contact"]);
        assert_eq!(scene.get_unspecified_paths(true), ["track", "cart", "contact"]);

        let scene = shared(scene);
        scene.borrow_mut().set_track(shared(Track::new("track").unwrap()));
        assert_eq!(
            scene.borrow_mut().define_all().unwrap_err(),
            BrimError::Unspecified {
                owner: "scene".to_string(),
                requirement: "Cart",
            }
        );
    }

    #[test]
    fn requirements_describe_the_slots() {
        let scene = Scene::new("scene").unwrap();
        let track = &scene.required_models()[0];
        assert_eq!(track.attribute(), "track");
        assert_eq!(track.type_name(), "Track");
        assert_eq!(track.description(), "Track the cart moves on.");
        assert!(track.is_hard());
        assert!(!scene.required_connections()[0].is_hard());
        assert!(std::ptr::eq(
            scene.required_models(),
            Scene::new("other").unwrap().required_models()
        ));
    }

    #[test]
    fn load_groups_have_a_single_valid_parent() {
        let f = fixture(false);
        let group = push();
        f.scene.borrow_mut().add_load_groups(&[group.clone()]).unwrap();
        assert_eq!(group.borrow().parent_name(), Some("scene"));
        assert!(
            group
                .borrow()
                .node()
                .system_slot()
                .ptr_eq(f.scene.borrow().node().system_slot())
        );

        let other = fixture(false);
        assert_eq!(
            other
                .scene
                .borrow_mut()
                .add_load_groups(&[group])
                .unwrap_err(),
            BrimError::AlreadyParented {
                group: "push".to_string(),
                parent: "scene".to_string(),
            }
        );

        assert!(matches!(
            f.track.borrow_mut().add_load_groups(&[push()]),
            Err(BrimError::InvalidParent {
                expected: "Scene",
                actual: "Track",
                ..
            })
        ));
    }

    #[test]
    fn descriptions_cover_the_tree() {
        let f = fixture(true);
        f.scene.borrow_mut().add_load_groups(&[push()]).unwrap();
        let node = AnyNode::Model(ModelHandle::new(f.scene.clone()));
        assert_eq!(check_descriptions(&node).unwrap(), Vec::<Expr>::new());

        let scene = f.scene.borrow();
        assert_eq!(
            scene.get_description(&Expr::symbol("push_F")).as_deref(),
            Some("Force pushing the cart.")
        );
        assert_eq!(
            scene.get_description(&Expr::dynamic("contact_uaux")).as_deref(),
            Some("Auxiliary speed along the normal.")
        );
        assert_eq!(scene.get_description(&Expr::symbol("unknown")), None);

        let symbols = scene.get_all_symbols();
        for expected in [
            Expr::symbol("scene_g"),
            Expr::symbol("cart_m"),
            Expr::symbol("contact_Fz"),
            Expr::symbol("push_F"),
        ] {
            assert!(symbols.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn slots_hand_out_shared_handles() {
        let f = fixture(false);
        let mut slot: Slot<Track> = Slot::empty();
        assert!(!slot.is_set());
        slot.set(f.track.clone());
        assert_eq!(slot.model_handle(), Some(ModelHandle::new(f.track.clone())));
        assert_eq!(
            f.scene.borrow().submodel("track"),
            Some(ModelHandle::new(f.track.clone()))
        );
        assert_eq!(f.scene.borrow().submodel("wheel"), None);
    }
}
