//! Analytic collision world made of half-spaces.
//!
//! Each [`CollisionPlane`] is the boundary of a solid half-space: everything
//! behind the plane (against its normal) is solid. A plane can optionally be
//! limited to an axis-aligned region, which turns an infinite floor into a
//! ledge or a platform. Sweeps are solved in closed form, so results are
//! exact and reproducible, which makes this world suitable for tests and
//! headless runs.
//!
//! Shapes are treated as upright; the rotation passed to a sweep is ignored.

use glam::{Quat, Vec3};

use super::channel::CollisionChannel;
use super::hit::{CollisionHit, CollisionShape, SurfaceMaterial};
use super::query::{AgentId, CollisionQueryService, QueryParams};

/// Distance a blocked sweep stops short of the surface.
pub const SWEEP_SKIN: f32 = 0.01;

/// Overlap shallower than this is treated as touching, not penetrating.
const PENETRATION_TOLERANCE: f32 = 1.0e-3;

/// Slack when testing an impact point against a plane's bounds.
const BOUNDS_TOLERANCE: f32 = 1.0e-3;

/// One solid half-space.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionPlane {
    /// Unit normal pointing out of the solid.
    pub normal: Vec3,
    /// Plane offset: points with `normal · p == distance` lie on the surface.
    pub distance: f32,
    /// Optional region (min, max) the contact point must fall inside.
    pub bounds: Option<(Vec3, Vec3)>,
    pub material: Option<SurfaceMaterial>,
    pub channel: CollisionChannel,
    /// Agent this geometry belongs to, for ignore-self filtering.
    pub owner: Option<AgentId>,
}

impl CollisionPlane {
    /// Plane through `point` facing `normal` (normalised here).
    pub fn new(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: normal.dot(point),
            bounds: None,
            material: None,
            channel: CollisionChannel::WORLD_STATIC,
            owner: None,
        }
    }

    pub fn with_bounds(mut self, min: Vec3, max: Vec3) -> Self {
        self.bounds = Some((min.min(max), min.max(max)));
        self
    }

    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_channel(mut self, channel: CollisionChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_owner(mut self, owner: AgentId) -> Self {
        self.owner = Some(owner);
        self
    }

    fn contains(&self, point: Vec3) -> bool {
        match self.bounds {
            Some((min, max)) => {
                let slack = Vec3::splat(BOUNDS_TOLERANCE);
                point.cmpge(min - slack).all() && point.cmple(max + slack).all()
            }
            None => true,
        }
    }

    /// Signed gap between the shape at `origin` and the surface.
    #[inline]
    fn gap(&self, shape: &CollisionShape, origin: Vec3) -> f32 {
        self.normal.dot(origin) - self.distance - shape.support_extent(self.normal)
    }

    /// Sweep a shape against this plane alone.
    fn sweep(&self, shape: &CollisionShape, start: Vec3, end: Vec3) -> Option<CollisionHit> {
        let g0 = self.gap(shape, start);

        if g0 < -PENETRATION_TOLERANCE {
            let support = shape.support_point(start, self.normal);
            let impact_point = support - self.normal * g0;
            if !self.contains(impact_point) {
                return None;
            }

            let mut hit = CollisionHit::blocking(0.0, start, impact_point, self.normal);
            hit.start_penetrating = true;
            hit.penetration_depth = -g0;
            return Some(hit);
        }

        let g1 = self.gap(shape, end);
        if g1 >= 0.0 || g1 >= g0 {
            return None;
        }

        let travel = g0 - g1;
        let contact_time = (g0 / travel).clamp(0.0, 1.0);
        let time = ((g0 - SWEEP_SKIN) / travel).clamp(0.0, 1.0);

        let contact_origin = start.lerp(end, contact_time);
        let impact_point = shape.support_point(contact_origin, self.normal);
        if !self.contains(impact_point) {
            return None;
        }

        Some(CollisionHit::blocking(
            time,
            start.lerp(end, time),
            impact_point,
            self.normal,
        ))
    }
}

/// A world made of [`CollisionPlane`]s.
#[derive(Debug, Clone, Default)]
pub struct PlaneWorld {
    planes: Vec<CollisionPlane>,
}

impl PlaneWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plane, returning its index.
    pub fn add_plane(&mut self, plane: CollisionPlane) -> usize {
        self.planes.push(plane);
        self.planes.len() - 1
    }

    /// Add an infinite horizontal floor at height `z`.
    pub fn add_floor(&mut self, z: f32) -> usize {
        self.add_plane(CollisionPlane::new(Vec3::Z, Vec3::new(0.0, 0.0, z)))
    }

    /// Add a wall through `point` facing `normal` (flattened to the ground plane).
    pub fn add_wall(&mut self, point: Vec3, normal: Vec3) -> usize {
        let flat = Vec3::new(normal.x, normal.y, 0.0);
        self.add_plane(CollisionPlane::new(flat, point))
    }

    /// Builder form of [`add_plane`](Self::add_plane).
    pub fn with_plane(mut self, plane: CollisionPlane) -> Self {
        self.add_plane(plane);
        self
    }

    pub fn with_floor(mut self, z: f32) -> Self {
        self.add_floor(z);
        self
    }

    pub fn planes(&self) -> &[CollisionPlane] {
        &self.planes
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn clear(&mut self) {
        self.planes.clear();
    }
}

impl CollisionQueryService for PlaneWorld {
    fn sweep(
        &self,
        shape: &CollisionShape,
        start: Vec3,
        end: Vec3,
        _rotation: Quat,
        channel: CollisionChannel,
        params: &QueryParams,
    ) -> Option<CollisionHit> {
        let mut best: Option<CollisionHit> = None;

        for plane in &self.planes {
            if !plane.channel.intersects(channel) {
                continue;
            }
            if params.ignore_agent.is_some() && plane.owner == params.ignore_agent {
                continue;
            }

            let Some(mut hit) = plane.sweep(shape, start, end) else {
                continue;
            };

            // Earliest contact wins; an initial overlap beats a touch at time zero
            let better = match &best {
                None => true,
                Some(current) => {
                    hit.time < current.time
                        || (hit.time == current.time
                            && hit.start_penetrating
                            && !current.start_penetrating)
                }
            };

            if better {
                if params.return_material {
                    hit.material = plane.material;
                }
                best = Some(hit);
            }
        }

        best
    }
}
