//! Collision detection and response for projectiles
//!
//! Projectiles are small circles; terrain is axis-aligned rectangles plus the
//! ground plane. Results carry the surface normal for reflection.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Closest point on the surface
    pub point: Vec2,
    /// Surface normal at the contact, pointing toward the circle centre
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

/// Circle against an axis-aligned rectangle `[min, max]`
pub fn circle_rect_collision(center: Vec2, radius: f32, min: Vec2, max: Vec2) -> Option<CollisionResult> {
    let closest = center.clamp(min, max);
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > radius * radius {
        return None;
    }

    if dist_sq > 1e-8 {
        let dist = dist_sq.sqrt();
        return Some(CollisionResult {
            point: closest,
            normal: delta / dist,
            penetration: radius - dist,
        });
    }

    // Centre inside the rectangle (tunneling): push out through the nearest face
    let faces = [
        (center.x - min.x, Vec2::NEG_X, Vec2::new(min.x, center.y)),
        (max.x - center.x, Vec2::X, Vec2::new(max.x, center.y)),
        (center.y - min.y, Vec2::NEG_Y, Vec2::new(center.x, min.y)),
        (max.y - center.y, Vec2::Y, Vec2::new(center.x, max.y)),
    ];
    let (depth, normal, point) = faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or((0.0, Vec2::NEG_Y, center));
    Some(CollisionResult {
        point,
        normal,
        penetration: depth + radius,
    })
}

/// Circle against the ground plane (solid below `ground_y`)
pub fn circle_ground_collision(center: Vec2, radius: f32, ground_y: f32) -> Option<CollisionResult> {
    let depth = center.y + radius - ground_y;
    (depth > 0.0).then(|| CollisionResult {
        point: Vec2::new(center.x, ground_y),
        normal: Vec2::NEG_Y,
        penetration: depth,
    })
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
