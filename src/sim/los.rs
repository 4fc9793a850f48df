//! Line-of-sight and cover by ray marching
//!
//! Both queries are coarse on purpose: they sample points along the segment
//! and test them against platform boxes. Only platforms the segment actually
//! touches are sampled. The ground plane never blocks.

use glam::Vec2;

use super::terrain::{Platform, Terrain};

/// Sample spacing for bullet line-of-sight
pub const LOS_SAMPLE_SPACING: f32 = 5.0;
/// Sample spacing for explosion cover
pub const COVER_SAMPLE_SPACING: f32 = 10.0;

/// Walk from `from` toward `to` every `spacing` units (endpoints excluded)
/// and report whether any sample lands inside a platform.
fn ray_march_blocked(terrain: &Terrain, from: Vec2, to: Vec2, spacing: f32) -> bool {
    let candidates: Vec<&Platform> = terrain.platforms_on_segment(from, to).collect();
    if candidates.is_empty() {
        return false;
    }

    let delta = to - from;
    let length = delta.length();
    if !length.is_finite() || length <= spacing {
        return false;
    }
    let dir = delta / length;

    let mut travelled = spacing;
    while travelled < length {
        let sample = from + dir * travelled;
        if candidates.iter().any(|p| p.contains_point(sample)) {
            return true;
        }
        travelled += spacing;
    }
    false
}

/// False the instant a 5-unit sample falls inside a platform
pub fn has_line_of_sight(terrain: &Terrain, from: Vec2, to: Vec2) -> bool {
    !ray_march_blocked(terrain, from, to, LOS_SAMPLE_SPACING)
}

/// True if the path from the attacker (or blast centre) to the target
/// crosses a platform, sampled every 10 units
pub fn is_in_cover(terrain: &Terrain, target: Vec2, attacker: Vec2) -> bool {
    ray_march_blocked(terrain, attacker, target, COVER_SAMPLE_SPACING)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> Terrain {
        Terrain::with_platforms(vec![Platform::new(1, 200.0, 100.0, 20.0, 200.0)])
    }

    #[test]
    fn test_open_field_has_sight() {
        let terrain = Terrain::flat();
        assert!(has_line_of_sight(&terrain, Vec2::new(0.0, 100.0), Vec2::new(500.0, 100.0)));
        assert!(!is_in_cover(&terrain, Vec2::new(500.0, 100.0), Vec2::new(0.0, 100.0)));
    }

    #[test]
    fn test_wall_blocks_sight_and_grants_cover() {
        let terrain = wall();
        let left = Vec2::new(100.0, 200.0);
        let right = Vec2::new(300.0, 200.0);
        assert!(!has_line_of_sight(&terrain, left, right));
        assert!(is_in_cover(&terrain, right, left));
    }

    #[test]
    fn test_path_over_the_wall_is_clear() {
        let terrain = wall();
        assert!(has_line_of_sight(&terrain, Vec2::new(100.0, 50.0), Vec2::new(300.0, 50.0)));
    }

    #[test]
    fn test_destroyed_platform_no_longer_blocks() {
        let mut terrain = wall();
        terrain.platforms[0].destroyed = true;
        assert!(has_line_of_sight(&terrain, Vec2::new(100.0, 200.0), Vec2::new(300.0, 200.0)));
    }

    #[test]
    fn test_cover_is_coarser_than_sight() {
        // A thin sliver at x=104..107 catches the sample at 105 but slips between 110 and 120
        let terrain = Terrain::with_platforms(vec![Platform::new(1, 104.0, 0.0, 3.0, 400.0)]);
        let from = Vec2::new(100.0, 200.0);
        let to = Vec2::new(300.0, 200.0);
        assert!(!has_line_of_sight(&terrain, from, to));
        assert!(!is_in_cover(&terrain, to, from));
    }
}
