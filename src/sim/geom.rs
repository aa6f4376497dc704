//! Small geometric helpers shared by the tick loop
//!
//! Everything here is pure. Overlap tests use a strict `<` so two circles
//! whose surfaces exactly touch do not count as colliding.

use glam::Vec2;

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH};

/// Circle-circle overlap test (strict inequality)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) < (ra + rb) * (ra + rb)
}

/// Unit vector from `from` toward `to`, or `None` when the points coincide
///
/// Callers treat `None` as "stand still this tick" so a zero-length
/// direction can never be normalized into NaN.
#[inline]
pub fn dir_towards(from: Vec2, to: Vec2) -> Option<Vec2> {
    let delta = to - from;
    if delta.length_squared() == 0.0 {
        None
    } else {
        Some(delta.normalize())
    }
}

/// Point on a ring of `radius` around `center` at `angle` radians
#[inline]
pub fn ring_point(center: Vec2, radius: f32, angle: f32) -> Vec2 {
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Clamp a position to the arena bounds (no wrap, no bounce)
#[inline]
pub fn clamp_to_arena(pos: Vec2) -> Vec2 {
    pos.clamp(Vec2::ZERO, Vec2::new(ARENA_WIDTH, ARENA_HEIGHT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_strict_boundary() {
        // Radii 22 + 5 = 27; centers exactly 27 apart touch but do not overlap
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(27.0, 0.0);
        assert!(!circles_overlap(a, 22.0, b, 5.0));

        // A hair closer and they overlap
        let c = Vec2::new(26.9, 0.0);
        assert!(circles_overlap(a, 22.0, c, 5.0));
    }

    #[test]
    fn test_dir_towards_zero_distance() {
        let p = Vec2::new(100.0, 100.0);
        assert!(dir_towards(p, p).is_none());

        let d = dir_towards(p, Vec2::new(100.0, 200.0)).unwrap();
        assert!((d - Vec2::new(0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_ring_point_distance() {
        let center = Vec2::new(960.0, 540.0);
        for i in 0..8 {
            let angle = i as f32 * std::f32::consts::TAU / 8.0;
            let p = ring_point(center, 1400.0, angle);
            assert!((p.distance(center) - 1400.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_clamp_to_arena() {
        assert_eq!(
            clamp_to_arena(Vec2::new(-50.0, 2000.0)),
            Vec2::new(0.0, ARENA_HEIGHT)
        );
        let inside = Vec2::new(960.0, 540.0);
        assert_eq!(clamp_to_arena(inside), inside);
    }
}
