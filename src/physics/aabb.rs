//! Axis-aligned bounding box math, in the donor's data-oriented style:
//! plain struct plus free functions operating on it, with a thin
//! `#[deprecated]` method-call facade kept for call sites that read more
//! naturally as `a.intersects(b)`.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

pub fn create_aabb(min: Vec3, max: Vec3) -> Aabb {
    Aabb { min, max }
}

pub fn aabb_from_center_half_extents(center: Vec3, half_extents: Vec3) -> Aabb {
    Aabb {
        min: center - half_extents,
        max: center + half_extents,
    }
}

pub fn aabb_center(a: Aabb) -> Vec3 {
    (a.min + a.max) * 0.5
}

pub fn aabb_half_extents(a: Aabb) -> Vec3 {
    (a.max - a.min) * 0.5
}

pub fn aabb_intersects(a: Aabb, b: Aabb) -> bool {
    a.min.x <= b.max.x
        && a.max.x >= b.min.x
        && a.min.y <= b.max.y
        && a.max.y >= b.min.y
        && a.min.z <= b.max.z
        && a.max.z >= b.min.z
}

pub fn aabb_contains_point(a: Aabb, point: Vec3) -> bool {
    point.x >= a.min.x
        && point.x <= a.max.x
        && point.y >= a.min.y
        && point.y <= a.max.y
        && point.z >= a.min.z
        && point.z <= a.max.z
}

pub fn aabb_translate(a: &mut Aabb, delta: Vec3) {
    a.min += delta;
    a.max += delta;
}

pub fn aabb_translated(a: Aabb, delta: Vec3) -> Aabb {
    Aabb {
        min: a.min + delta,
        max: a.max + delta,
    }
}

/// Minimum-overlap-axis separation vector to push `a` out of `b`.
pub fn aabb_penetration_vector(a: Aabb, b: Aabb) -> Option<Vec3> {
    if !aabb_intersects(a, b) {
        return None;
    }
    let overlap_x = (a.max.x.min(b.max.x)) - (a.min.x.max(b.min.x));
    let overlap_y = (a.max.y.min(b.max.y)) - (a.min.y.max(b.min.y));
    let overlap_z = (a.max.z.min(b.max.z)) - (a.min.z.max(b.min.z));

    let center_a = aabb_center(a);
    let center_b = aabb_center(b);

    if overlap_x <= overlap_y && overlap_x <= overlap_z {
        let sign = if center_a.x < center_b.x { -1.0 } else { 1.0 };
        Some(Vec3::new(overlap_x * sign, 0.0, 0.0))
    } else if overlap_y <= overlap_z {
        let sign = if center_a.y < center_b.y { -1.0 } else { 1.0 };
        Some(Vec3::new(0.0, overlap_y * sign, 0.0))
    } else {
        let sign = if center_a.z < center_b.z { -1.0 } else { 1.0 };
        Some(Vec3::new(0.0, 0.0, overlap_z * sign))
    }
}

/// Ray-casts `a`'s center against `b` expanded by `a`'s half-extents
/// (the Minkowski-sum trick), returning the time-of-impact `t ∈ [0,1]`
/// along `velocity * dt`, or `None` if no collision occurs within the
/// step.
pub fn aabb_swept_collision(a: Aabb, velocity: Vec3, b: Aabb, dt: f32) -> Option<f32> {
    let half = aabb_half_extents(a);
    let expanded = Aabb {
        min: b.min - half,
        max: b.max + half,
    };
    let origin = aabb_center(a);
    let dir = velocity * dt;

    let mut t_min = 0.0f32;
    let mut t_max = 1.0f32;

    for axis in 0..3 {
        let (o, d, lo, hi) = match axis {
            0 => (origin.x, dir.x, expanded.min.x, expanded.max.x),
            1 => (origin.y, dir.y, expanded.min.y, expanded.max.y),
            _ => (origin.z, dir.z, expanded.min.z, expanded.max.z),
        };

        if d.abs() < 1e-8 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv_d = 1.0 / d;
        let mut t0 = (lo - o) * inv_d;
        let mut t1 = (hi - o) * inv_d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    Some(t_min.clamp(0.0, 1.0))
}

#[deprecated(note = "use the free aabb_* functions directly")]
impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        create_aabb(min, max)
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        aabb_from_center_half_extents(center, half_extents)
    }

    pub fn center(&self) -> Vec3 {
        aabb_center(*self)
    }

    pub fn half_extents(&self) -> Vec3 {
        aabb_half_extents(*self)
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        aabb_intersects(*self, *other)
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        aabb_contains_point(*self, point)
    }

    pub fn translate(&mut self, delta: Vec3) {
        aabb_translate(self, delta);
    }

    pub fn translated(&self, delta: Vec3) -> Aabb {
        aabb_translated(*self, delta)
    }

    pub fn penetration_vector(&self, other: &Aabb) -> Option<Vec3> {
        aabb_penetration_vector(*self, *other)
    }

    pub fn swept_collision(&self, velocity: Vec3, other: &Aabb, dt: f32) -> Option<f32> {
        aabb_swept_collision(*self, velocity, *other, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_boxes_intersect() {
        let a = create_aabb(Vec3::ZERO, Vec3::ONE);
        let b = create_aabb(Vec3::splat(0.5), Vec3::splat(1.5));
        assert!(aabb_intersects(a, b));
    }

    #[test]
    fn disjoint_boxes_do_not_intersect() {
        let a = create_aabb(Vec3::ZERO, Vec3::ONE);
        let b = create_aabb(Vec3::splat(5.0), Vec3::splat(6.0));
        assert!(!aabb_intersects(a, b));
    }

    #[test]
    fn swept_collision_detects_approach_along_x() {
        let a = aabb_from_center_half_extents(Vec3::new(-5.0, 0.0, 0.0), Vec3::splat(0.5));
        let b = create_aabb(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let t = aabb_swept_collision(a, Vec3::new(10.0, 0.0, 0.0), b, 1.0);
        assert!(t.is_some());
        assert!(t.unwrap() < 1.0);
    }

    #[test]
    fn swept_collision_none_when_moving_away() {
        let a = aabb_from_center_half_extents(Vec3::new(-5.0, 0.0, 0.0), Vec3::splat(0.5));
        let b = create_aabb(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let t = aabb_swept_collision(a, Vec3::new(-10.0, 0.0, 0.0), b, 1.0);
        assert!(t.is_none());
    }
}
