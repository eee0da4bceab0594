//! Rigid bodies owned by a model.

use brim_core::{Descriptions, NodeBase};
use brim_mechanics::{Inertia, Point, ReferenceFrame, RigidBody};

/// Which entries of the central inertia tensor are free parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InertiaLayout {
    /// Rotationally symmetric about the body y axis, `izz == ixx`.
    Axisymmetric,
    /// Symmetric about the body xz plane, `ixy == iyz == 0`.
    Sagittal,
    /// A slender segment along the body z axis, `izz == 0`.
    StickZ,
    /// A slender segment along the body x axis, `ixx == 0`.
    StickX,
}

impl InertiaLayout {
    fn keys(self) -> &'static [&'static str] {
        match self {
            InertiaLayout::Axisymmetric => &["ixx", "iyy"],
            InertiaLayout::Sagittal => &["ixx", "iyy", "izz", "izx"],
            InertiaLayout::StickZ | InertiaLayout::StickX => &["i"],
        }
    }
}

fn part_key(part: &str, key: &str) -> String {
    if part.is_empty() {
        key.to_string()
    } else {
        format!("{part}_{key}")
    }
}

fn part_name(node: &NodeBase, part: &str) -> String {
    if part.is_empty() {
        node.name().to_string()
    } else {
        format!("{}_{part}", node.name())
    }
}

/// Creates the body of a model, named after the model, and stores its mass
/// and inertia symbols in the node.
pub(crate) fn define_body(node: &mut NodeBase, layout: InertiaLayout) -> RigidBody {
    define_part(node, "", layout)
}

/// Creates one of several bodies of a model, named `{model}_{part}`.
///
/// The symbols are stored under `{part}_mass`, `{part}_ixx` and so on.
pub(crate) fn define_part(node: &mut NodeBase, part: &str, layout: InertiaLayout) -> RigidBody {
    let name = part_name(node, part);
    let frame = ReferenceFrame::new(&format!("{name}_frame"));
    let masscenter = Point::new(&format!("{name}_masscenter"));
    for key in ["mass"].iter().chain(layout.keys()) {
        let key = part_key(part, key);
        node.set_symbol(&key, node.prefixed_symbol(&key));
    }

    let s = |key: &str| node.prefixed_symbol(&part_key(part, key));
    let inertia = match layout {
        InertiaLayout::Axisymmetric => {
            Inertia::new(&frame, s("ixx"), s("iyy"), s("ixx"), 0.0, 0.0, 0.0)
        }
        InertiaLayout::Sagittal => {
            Inertia::new(&frame, s("ixx"), s("iyy"), s("izz"), 0.0, 0.0, s("izx"))
        }
        InertiaLayout::StickZ => Inertia::new(&frame, s("i"), s("i"), 0.0, 0.0, 0.0, 0.0),
        InertiaLayout::StickX => Inertia::new(&frame, 0.0, s("i"), s("i"), 0.0, 0.0, 0.0),
    };
    RigidBody::with_parts(&name, masscenter, frame, s("mass"), inertia)
}

/// Describes the mass and inertia symbols stored by [`define_body`].
pub(crate) fn body_descriptions(node: &NodeBase, descriptions: &mut Descriptions) {
    part_descriptions(node, "", descriptions);
}

/// Describes the mass and inertia symbols stored by [`define_part`].
pub(crate) fn part_descriptions(node: &NodeBase, part: &str, descriptions: &mut Descriptions) {
    let name = part_name(node, part);
    let mut describe = |key: &str, text: String| {
        if let Ok(symbol) = node.symbol(&part_key(part, key)) {
            descriptions.insert(symbol, text);
        }
    };
    describe("mass", format!("Mass of body: '{name}'."));
    for (key, axes) in [("ixx", "xx"), ("iyy", "yy"), ("izz", "zz"), ("izx", "zx")] {
        describe(key, format!("Inertia scalar {axes} of body: '{name}'."));
    }
    describe("i", format!("Transverse moment of inertia of body: '{name}'."));
}

#[cfg(test)]
mod tests {
    use brim_mechanics::Expr;

    use super::*;

    #[test]
    fn axisymmetric_bodies_share_the_in_plane_inertia() {
        let mut node = NodeBase::new("wheel").unwrap();
        let body = define_body(&mut node, InertiaLayout::Axisymmetric);
        let inertia = body.central_inertia();
        assert_eq!(inertia.component(0, 0), inertia.component(2, 2));
        assert_eq!(body.mass(), Expr::symbol("wheel_mass"));
        assert!(!node.has_symbol("izz"));

        let mut descriptions = Descriptions::new();
        body_descriptions(&node, &mut descriptions);
        assert_eq!(descriptions.len(), 3);
    }

    #[test]
    fn sagittal_bodies_have_a_product_of_inertia() {
        let mut node = NodeBase::new("frame").unwrap();
        let body = define_body(&mut node, InertiaLayout::Sagittal);
        assert_eq!(
            *body.central_inertia().component(0, 2),
            Expr::symbol("frame_izx")
        );
        assert!(body.central_inertia().component(0, 1).is_zero());
        assert!(!node.has_symbol("ixy"));
    }

    #[test]
    fn parts_are_named_after_the_model() {
        let mut node = NodeBase::new("leg").unwrap();
        let thigh = define_part(&mut node, "thigh", InertiaLayout::StickZ);
        let foot = define_part(&mut node, "foot", InertiaLayout::StickX);
        assert_eq!(thigh.name(), "leg_thigh");
        assert_eq!(thigh.mass(), Expr::symbol("leg_thigh_mass"));
        assert_eq!(node.symbol("foot_i").unwrap(), Expr::symbol("leg_foot_i"));
        assert!(thigh.central_inertia().component(2, 2).is_zero());
        assert!(foot.central_inertia().component(0, 0).is_zero());

        let mut descriptions = Descriptions::new();
        part_descriptions(&node, "thigh", &mut descriptions);
        part_descriptions(&node, "foot", &mut descriptions);
        assert_eq!(descriptions.len(), 4);
        assert_eq!(
            descriptions[&Expr::symbol("leg_foot_i")],
            "Transverse moment of inertia of body: 'leg_foot'."
        );
    }
}
