//! Frame and point pairs used as joint attachments.

use brim_mechanics::{Point, ReferenceFrame, Vector};

use crate::{BrimError, node::is_identifier};

/// A reference frame together with a point fixed in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    frame: ReferenceFrame,
    point: Point,
}

impl Attachment {
    /// Pairs `frame` and `point`, fixing the point in the frame.
    pub fn new(frame: ReferenceFrame, point: Point) -> Self {
        point.set_vel(&frame, Vector::zero());
        Self { frame, point }
    }

    /// Creates a fresh frame `{name}_frame` and point `{name}_point`.
    ///
    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier.
    pub fn from_name(name: &str) -> Result<Self, BrimError> {
        if !is_identifier(name) {
            return Err(BrimError::InvalidName(name.to_string()));
        }
        Ok(Self::new(
            ReferenceFrame::new(&format!("{name}_frame")),
            Point::new(&format!("{name}_point")),
        ))
    }

    pub fn frame(&self) -> &ReferenceFrame {
        &self.frame
    }

    pub fn point(&self) -> &Point {
        &self.point
    }
}

/// Rotation axis of a [`Hub`].
#[derive(Debug, Clone)]
pub enum Axis<'a> {
    /// `"x"`, `"-y"`, `"+z"`, ... relative to the hub frame.
    Named(&'a str),
    Vector(Vector),
}

impl<'a> From<&'a str> for Axis<'a> {
    fn from(value: &'a str) -> Self {
        Axis::Named(value)
    }
}

impl From<Vector> for Axis<'_> {
    fn from(value: Vector) -> Self {
        Axis::Vector(value)
    }
}

/// An attachment for pin joints, carrying a rotation axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Hub {
    attachment: Attachment,
    axis: Vector,
}

impl Hub {
    /// # Errors
    ///
    /// Fails if a named axis is not one of `x`, `y`, `z` with an optional
    /// sign.
    pub fn new<'a>(
        frame: ReferenceFrame,
        point: Point,
        axis: impl Into<Axis<'a>>,
    ) -> Result<Self, BrimError> {
        let axis = match axis.into() {
            Axis::Named(name) => parse_axis(&frame, name)?,
            Axis::Vector(vector) => vector,
        };
        Ok(Self {
            attachment: Attachment::new(frame, point),
            axis,
        })
    }

    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier or `axis` is invalid.
    pub fn from_name<'a>(name: &str, axis: impl Into<Axis<'a>>) -> Result<Self, BrimError> {
        if !is_identifier(name) {
            return Err(BrimError::InvalidName(name.to_string()));
        }
        Self::new(
            ReferenceFrame::new(&format!("{name}_frame")),
            Point::new(&format!("{name}_point")),
            axis,
        )
    }

    pub fn frame(&self) -> &ReferenceFrame {
        self.attachment.frame()
    }

    pub fn point(&self) -> &Point {
        self.attachment.point()
    }

    pub fn axis(&self) -> &Vector {
        &self.axis
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }
}

fn parse_axis(frame: &ReferenceFrame, axis: &str) -> Result<Vector, BrimError> {
    let (sign, name) = match axis.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, axis.strip_prefix('+').unwrap_or(axis)),
    };
    let unit = match name {
        "x" => frame.x(),
        "y" => frame.y(),
        "z" => frame.z(),
        _ => return Err(BrimError::InvalidAxis(axis.to_string())),
    };
    Ok(unit * sign)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_fixes_point_in_frame() {
        let attachment = Attachment::from_name("hub").unwrap();
        assert_eq!(attachment.frame().name(), "hub_frame");
        assert_eq!(attachment.point().name(), "hub_point");
        assert!(
            attachment
                .point()
                .vel(attachment.frame())
                .unwrap()
                .is_zero()
        );
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert_eq!(
            Attachment::from_name("a b").unwrap_err(),
            BrimError::InvalidName("a b".to_string())
        );
        assert!(matches!(
            Hub::from_name("1hub", "x"),
            Err(BrimError::InvalidName(_))
        ));
    }

    #[test]
    fn hub_axes_accept_signs() {
        let hub = Hub::from_name("steer", "-y").unwrap();
        assert_eq!(hub.axis(), &(hub.frame().y() * -1.0));
        let hub = Hub::from_name("steer", "+z").unwrap();
        assert_eq!(hub.axis(), &hub.frame().z());
        let frame = ReferenceFrame::new("N");
        let hub = Hub::new(frame.clone(), Point::new("P"), frame.x()).unwrap();
        assert_eq!(hub.axis(), &frame.x());
    }

    #[test]
    fn unknown_axes_are_rejected() {
        assert_eq!(
            Hub::from_name("steer", "w").unwrap_err(),
            BrimError::InvalidAxis("w".to_string())
        );
    }
}
