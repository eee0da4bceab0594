//! A cart on a straight track, used to exercise the lifecycle.
//!
//! The cart slides along the x axis of the track. The optional contact
//! connection registers the normal force as a noncontributing force and
//! the push load group drives the cart along the track.

use brim_mechanics::{Load, Particle, Point, ReferenceFrame, System};

use crate::{
    BrimError, Connection, ConnectionBase, Descriptions, LoadGroup, LoadGroupBase, Model,
    ModelBase, Node, Slot, downcast_parent,
};

fn not_defined(node: &dyn Node) -> BrimError {
    BrimError::StageOrder {
        node: node.name().to_string(),
        stage: "define_objects",
    }
}

#[derive(Debug, crate::Model)]
pub(crate) struct Track {
    #[brim(base)]
    base: ModelBase,
    frame: Option<ReferenceFrame>,
    origin: Option<Point>,
}

impl Track {
    pub(crate) fn frame(&self) -> Result<ReferenceFrame, BrimError> {
        self.frame.clone().ok_or_else(|| not_defined(self))
    }

    pub(crate) fn origin(&self) -> Result<Point, BrimError> {
        self.origin.clone().ok_or_else(|| not_defined(self))
    }
}

impl Model for Track {
    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let frame = ReferenceFrame::new(&format!("{}_frame", self.name()));
        let origin = Point::new(&format!("{}_origin", self.name()));
        self.base.node.set_system(System::new(&frame, &origin));
        self.frame = Some(frame);
        self.origin = Some(origin);
        Ok(())
    }
}

#[derive(Debug, crate::Model)]
pub(crate) struct Cart {
    #[brim(base)]
    base: ModelBase,
    particle: Option<Particle>,
}

impl Cart {
    pub(crate) fn particle(&self) -> Result<Particle, BrimError> {
        self.particle.clone().ok_or_else(|| not_defined(self))
    }
}

impl Model for Cart {
    fn descriptions(&self) -> Descriptions {
        let node = self.node();
        let mut descriptions = Descriptions::new();
        if let Ok(mass) = node.symbol("m") {
            descriptions.insert(mass, format!("Mass of {}.", node.name()));
        }
        for q in &node.q {
            descriptions.insert(q.clone(), "Position along the track.".to_string());
        }
        for u in &node.u {
            descriptions.insert(u.clone(), "Speed along the track.".to_string());
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        let mass = node.prefixed_symbol("m");
        node.set_symbol("m", mass.clone());
        node.q = node.prefixed_dynamicsymbols("q");
        node.u = node.prefixed_dynamicsymbols("u");

        let point = Point::new(&format!("{}_point", node.name()));
        let frame = ReferenceFrame::new(&format!("{}_frame", node.name()));
        let particle = Particle::new(node.name(), point.clone(), mass);
        let mut system = System::new(&frame, &point);
        system.add_bodies(&[particle.clone().into()])?;
        system.add_coordinates(&node.q, true)?;
        system.add_speeds(&node.u, true)?;
        system.add_kdes(&[node.q[0].dt() - &node.u[0]])?;
        node.set_system(system);
        self.particle = Some(particle);
        Ok(())
    }
}

#[derive(Debug, crate::Connection)]
pub(crate) struct Contact {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel)]
    track: Slot<Track>,
    #[brim(submodel)]
    cart: Slot<Cart>,
}

impl Connection for Contact {
    fn descriptions(&self) -> Descriptions {
        let node = self.node();
        let mut descriptions = Descriptions::new();
        if let Ok(force) = node.symbol("Fz") {
            descriptions.insert(force, "Normal force on the cart.".to_string());
        }
        for u in &node.u_aux {
            descriptions.insert(u.clone(), "Auxiliary speed along the normal.".to_string());
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let track = self.require_track()?;
        let track = track.borrow();
        let node = &mut self.base.node;
        node.set_symbol("Fz", node.prefixed_symbol("Fz"));
        node.u_aux = node.prefixed_dynamicsymbols("uaux");
        node.set_system(System::new(&track.frame()?, &track.origin()?));
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let frame = self.require_track()?.borrow().frame()?;
        let point = self.require_cart()?.borrow().particle()?.point().clone();
        let node = self.node();
        node.require_auxiliary_handler()?
            .borrow_mut()
            .add_noncontributing_force(&point, frame.z(), node.u_aux[0].clone(), node.symbol("Fz")?)?;
        Ok(())
    }
}

#[derive(Debug, crate::Model)]
pub(crate) struct Scene {
    #[brim(base)]
    base: ModelBase,
    #[brim(submodel(description = "Track the cart moves on."))]
    track: Slot<Track>,
    #[brim(submodel)]
    cart: Slot<Cart>,
    #[brim(connection(optional))]
    contact: Slot<Contact>,
}

impl Model for Scene {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = Descriptions::new();
        if let Ok(g) = self.node().symbol("g") {
            descriptions.insert(g, "Gravitational acceleration.".to_string());
        }
        descriptions
    }

    fn define_connections_hook(&mut self) -> Result<(), BrimError> {
        if let Some(contact) = self.contact() {
            let mut contact = contact.borrow_mut();
            contact.set_track(self.require_track()?);
            contact.set_cart(self.require_cart()?);
        }
        Ok(())
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let track = self.require_track()?;
        let track = track.borrow();
        let node = &mut self.base.node;
        node.set_symbol("g", node.prefixed_symbol("g"));
        node.set_system(System::new(&track.frame()?, &track.origin()?));
        if let Some(contact) = self.contact() {
            contact.borrow_mut().define_objects()?;
        }
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let track = self.require_track()?;
        let cart = self.require_cart()?;
        let (track, cart) = (track.borrow(), cart.borrow());
        let frame = track.frame()?;
        let particle = cart.particle()?;
        let (q, u) = (&cart.node().q[0], &cart.node().u[0]);
        particle.point().set_pos(&track.origin()?, frame.x() * q.clone());
        particle.point().set_vel(&frame, frame.x() * u.clone());
        if let Some(contact) = self.contact() {
            contact.borrow_mut().define_kinematics()?;
        }
        Ok(())
    }

    fn define_loads_hook(&mut self) -> Result<(), BrimError> {
        let frame = self.require_track()?.borrow().frame()?;
        let particle = self.require_cart()?.borrow().particle()?;
        let weight = -(particle.mass() * self.node().symbol("g")?);
        self.node()
            .system_mut()?
            .add_loads(&[Load::force(particle.point(), frame.z() * weight)])?;
        if let Some(contact) = self.contact() {
            contact.borrow_mut().define_loads()?;
        }
        Ok(())
    }

    fn define_constraints_hook(&mut self) -> Result<(), BrimError> {
        if let Some(contact) = self.contact() {
            contact.borrow_mut().define_constraints()?;
        }
        Ok(())
    }
}

#[derive(Debug, crate::LoadGroup)]
#[brim(parent(Scene))]
pub(crate) struct Push {
    #[brim(base)]
    base: LoadGroupBase,
}

impl LoadGroup for Push {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = Descriptions::new();
        if let Ok(force) = self.node().symbol("F") {
            descriptions.insert(force, "Force pushing the cart.".to_string());
        }
        descriptions
    }

    fn define_objects_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        node.set_symbol("F", node.prefixed_symbol("F"));
        Ok(())
    }

    fn define_loads_hook(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        let scene = downcast_parent::<Scene>(&*self, parent)?;
        let frame = scene.require_track()?.borrow().frame()?;
        let particle = scene.require_cart()?.borrow().particle()?;
        let force = frame.x() * self.node().symbol("F")?;
        self.node()
            .system_mut()?
            .add_loads(&[Load::force(particle.point(), force)])?;
        Ok(())
    }
}
