//! Sweep results and query shapes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Physical surface properties attached to a piece of geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    /// Coulomb-style friction coefficient of the surface (1.0 is "normal").
    pub friction: f32,
}

impl SurfaceMaterial {
    pub const fn new(friction: f32) -> Self {
        Self { friction }
    }
}

/// Result of sweeping a shape through the world.
///
/// A sweep moves a shape from a start to an end position and reports the
/// first blocking contact along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionHit {
    /// Whether the sweep was stopped by something.
    pub blocking: bool,

    /// Whether the shape was already overlapping geometry at the start.
    ///
    /// When set, `normal` is the direction to push out and
    /// `penetration_depth` how far.
    pub start_penetrating: bool,

    /// Where the shape's origin ended up.
    ///
    /// Slightly backed off from the contact so the next sweep does not start
    /// inside the surface.
    pub location: Vec3,

    /// Normal of the swept shape at the contact, pointing away from the surface.
    pub normal: Vec3,

    /// Contact point on the surface.
    pub impact_point: Vec3,

    /// Normal of the surface itself at `impact_point`.
    pub impact_normal: Vec3,

    /// Fraction of the sweep travelled.
    ///
    /// - `1.0` = full distance (no collision)
    /// - `0.0` = blocked immediately
    pub time: f32,

    /// Depth of the initial overlap, valid only when `start_penetrating`.
    pub penetration_depth: f32,

    /// Surface material, when the query asked for one and the surface has one.
    pub material: Option<SurfaceMaterial>,
}

impl Default for CollisionHit {
    fn default() -> Self {
        Self::no_hit(Vec3::ZERO)
    }
}

impl CollisionHit {
    /// A sweep that travelled its full length.
    pub fn no_hit(end_location: Vec3) -> Self {
        Self {
            blocking: false,
            start_penetrating: false,
            location: end_location,
            normal: Vec3::ZERO,
            impact_point: end_location,
            impact_normal: Vec3::ZERO,
            time: 1.0,
            penetration_depth: 0.0,
            material: None,
        }
    }

    /// A blocking hit where the shape and surface normals agree.
    pub fn blocking(time: f32, location: Vec3, impact_point: Vec3, normal: Vec3) -> Self {
        Self {
            blocking: true,
            start_penetrating: false,
            location,
            normal,
            impact_point,
            impact_normal: normal,
            time,
            penetration_depth: 0.0,
            material: None,
        }
    }

    /// A blocking hit that is not an initial overlap.
    #[inline]
    pub fn is_valid_blocking_hit(&self) -> bool {
        self.blocking && !self.start_penetrating
    }
}

/// Shape swept through the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionShape {
    /// An upright capsule centred on its origin.
    Capsule {
        /// Radius of the cylinder and end caps.
        radius: f32,
        /// Distance from the centre to the tip of either cap.
        half_height: f32,
    },

    /// An axis-aligned box centred on its origin.
    Box {
        half_extents: Vec3,
    },

    /// A single point, for ray-like queries.
    Point,
}

impl CollisionShape {
    /// Create an upright capsule. `half_height` is raised to `radius` if smaller.
    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Self::Capsule {
            radius,
            half_height: half_height.max(radius),
        }
    }

    /// Horizontal radius of the shape's footprint.
    pub fn radius(&self) -> f32 {
        match self {
            Self::Capsule { radius, .. } => *radius,
            Self::Box { half_extents } => half_extents.x.max(half_extents.y),
            Self::Point => 0.0,
        }
    }

    /// Distance from the origin to the bottom of the shape.
    pub fn half_height(&self) -> f32 {
        match self {
            Self::Capsule { half_height, .. } => *half_height,
            Self::Box { half_extents } => half_extents.z,
            Self::Point => 0.0,
        }
    }

    /// Distance from the origin to the farthest point of the shape along `-direction`.
    ///
    /// `direction` must be a unit vector.
    pub fn support_extent(&self, direction: Vec3) -> f32 {
        match self {
            Self::Capsule { radius, half_height } => {
                let segment = (half_height - radius).max(0.0);
                radius + segment * direction.z.abs()
            }
            Self::Box { half_extents } => {
                direction.x.abs() * half_extents.x
                    + direction.y.abs() * half_extents.y
                    + direction.z.abs() * half_extents.z
            }
            Self::Point => 0.0,
        }
    }

    /// The point of the shape (at `origin`) touching a plane facing `normal`.
    pub fn support_point(&self, origin: Vec3, normal: Vec3) -> Vec3 {
        match self {
            Self::Capsule { radius, half_height } => {
                let segment = (half_height - radius).max(0.0);
                let cap_offset = if normal.z > 0.0 {
                    -segment
                } else if normal.z < 0.0 {
                    segment
                } else {
                    0.0
                };
                origin - normal * *radius + Vec3::Z * cap_offset
            }
            Self::Box { half_extents } => {
                let corner = |n: f32, e: f32| if n == 0.0 { 0.0 } else { e.copysign(n) };
                origin
                    - Vec3::new(
                        corner(normal.x, half_extents.x),
                        corner(normal.y, half_extents.y),
                        corner(normal.z, half_extents.z),
                    )
            }
            Self::Point => origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hit() {
        let hit = CollisionHit::no_hit(Vec3::new(10.0, 0.0, 0.0));
        assert!(!hit.blocking);
        assert_eq!(hit.time, 1.0);
        assert!(!hit.is_valid_blocking_hit());
    }

    #[test]
    fn test_capsule_support() {
        let capsule = CollisionShape::capsule(42.0, 96.0);

        // Straight down onto a floor: the whole half height
        assert!((capsule.support_extent(Vec3::Z) - 96.0).abs() < 1e-4);
        let foot = capsule.support_point(Vec3::new(0.0, 0.0, 100.0), Vec3::Z);
        assert!((foot - Vec3::new(0.0, 0.0, 4.0)).length() < 1e-4);

        // Against a wall: only the radius
        assert!((capsule.support_extent(Vec3::X) - 42.0).abs() < 1e-4);
        let side = capsule.support_point(Vec3::ZERO, -Vec3::X);
        assert!((side - Vec3::new(42.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_capsule_half_height_never_below_radius() {
        let capsule = CollisionShape::capsule(50.0, 10.0);
        assert_eq!(capsule.half_height(), 50.0);
    }
}
