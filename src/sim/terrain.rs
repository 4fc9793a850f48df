//! Destructible terrain: rectangular platforms over an indestructible ground plane
//!
//! Layouts are fixed per map variant. Platforms are one-way for units
//! (they can be jumped through from below) but solid for projectiles and sight.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionResult, circle_ground_collision, circle_rect_collision};
use super::units::TeamId;
use crate::consts::*;
use crate::{MapVariant, falloff_damage};

pub const PLATFORM_MAX_HEALTH: u32 = 100;

/// A destructible rectangular platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub health: u32,
    pub destroyed: bool,
}

impl Platform {
    pub fn new(id: u32, x: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            pos: Vec2::new(x, top),
            size: Vec2::new(width, height),
            health: PLATFORM_MAX_HEALTH,
            destroyed: false,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.pos.x && x <= self.pos.x + self.size.x
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.pos.x && p.x <= max.x && p.y >= self.pos.y && p.y <= max.y
    }

    /// Distance from `p` to the nearest point of the rectangle (0 inside)
    pub fn distance_to(&self, p: Vec2) -> f32 {
        p.distance(p.clamp(self.min(), self.max()))
    }

    /// Exact segment/rectangle test (slab method)
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        let d = b - a;
        let (min, max) = (self.min(), self.max());
        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;

        for (origin, delta, lo, hi) in [(a.x, d.x, min.x, max.x), (a.y, d.y, min.y, max.y)] {
            if delta.abs() < 1e-9 {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let t1 = (lo - origin) / delta;
            let t2 = (hi - origin) / delta;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }
}

/// What a unit is standing on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Support {
    Ground,
    Platform { id: u32, min_x: f32, max_x: f32 },
}

impl Support {
    pub fn span(&self) -> (f32, f32) {
        match *self {
            Support::Ground => (0.0, WORLD_WIDTH),
            Support::Platform { min_x, max_x, .. } => (min_x, max_x),
        }
    }
}

/// Terrain state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    pub variant: MapVariant,
    pub platforms: Vec<Platform>,
}

impl Terrain {
    /// Deterministic layout for a map variant; right half mirrors the left
    pub fn generate(variant: MapVariant) -> Self {
        // (x, top, width, height) for the left half and the centre
        let (left, centre): (&[(f32, f32, f32, f32)], &[(f32, f32, f32, f32)]) = match variant {
            MapVariant::Plains => (
                &[(120.0, 530.0, 180.0, 20.0), (360.0, 480.0, 180.0, 20.0)],
                &[(520.0, 400.0, 160.0, 20.0)],
            ),
            MapVariant::Fortress => (
                &[
                    (130.0, 480.0, 170.0, 16.0),
                    (300.0, 500.0, 24.0, 120.0),
                    (460.0, 530.0, 90.0, 16.0),
                ],
                &[(540.0, 430.0, 120.0, 20.0)],
            ),
            MapVariant::Canyon => (
                &[(0.0, 500.0, 330.0, 120.0), (330.0, 560.0, 60.0, 16.0)],
                &[(500.0, 560.0, 200.0, 16.0)],
            ),
        };

        let mut platforms = Vec::new();
        let mut next_id = 1;
        let mut push = |x: f32, top: f32, w: f32, h: f32| {
            platforms.push(Platform::new(next_id, x, top, w, h));
            next_id += 1;
        };
        for &(x, top, w, h) in left {
            push(x, top, w, h);
        }
        for &(x, top, w, h) in centre {
            push(x, top, w, h);
        }
        for &(x, top, w, h) in left.iter().rev() {
            push(WORLD_WIDTH - x - w, top, w, h);
        }

        log::debug!("{} terrain: {} platforms", variant.as_str(), platforms.len());
        Self { variant, platforms }
    }

    /// Ground plane only
    pub fn flat() -> Self {
        Self::with_platforms(Vec::new())
    }

    pub fn with_platforms(platforms: Vec<Platform>) -> Self {
        Self {
            variant: MapVariant::Plains,
            platforms,
        }
    }

    /// Spawn x positions for a team, in unit-index order
    pub fn spawn_xs(variant: MapVariant, team: TeamId) -> Vec<f32> {
        let left: &[f32] = match variant {
            MapVariant::Plains => &[40.0, 80.0, 330.0, 100.0],
            MapVariant::Fortress => &[40.0, 200.0, 90.0, 250.0],
            MapVariant::Canyon => &[60.0, 150.0, 240.0],
        };
        match team {
            TeamId::A => left.to_vec(),
            TeamId::B => left.iter().map(|x| WORLD_WIDTH - x).collect(),
        }
    }

    pub fn intact(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.iter().filter(|p| !p.destroyed)
    }

    pub fn get(&self, id: u32) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    /// Point-in-platform test (ground excluded)
    pub fn point_in_platform(&self, p: Vec2) -> bool {
        self.intact().any(|platform| platform.contains_point(p))
    }

    /// Is `p` inside any solid (platform or ground)?
    pub fn is_solid(&self, p: Vec2) -> bool {
        p.y >= GROUND_Y || self.point_in_platform(p)
    }

    /// Intact platforms whose rectangle the segment touches
    pub fn platforms_on_segment(&self, a: Vec2, b: Vec2) -> impl Iterator<Item = &Platform> {
        self.intact().filter(move |p| p.intersects_segment(a, b))
    }

    /// Highest walkable surface at `x` whose top is at or below `y`
    pub fn surface_below(&self, x: f32, y: f32) -> f32 {
        self.intact()
            .filter(|p| p.spans_x(x) && p.top() >= y)
            .map(Platform::top)
            .fold(GROUND_Y, f32::min)
    }

    /// Lowest ledge above `feet` at `x` within `reach`
    pub fn ledge_above(&self, x: f32, feet: f32, reach: f32) -> Option<f32> {
        self.intact()
            .filter(|p| p.spans_x(x) && p.top() < feet - 1.0 && feet - p.top() <= reach)
            .map(Platform::top)
            .max_by(f32::total_cmp)
    }

    pub fn support_at(&self, x: f32, feet: f32) -> Support {
        self.intact()
            .filter(|p| p.spans_x(x) && (p.top() - feet).abs() <= 1.0)
            .map(|p| Support::Platform {
                id: p.id,
                min_x: p.pos.x,
                max_x: p.max().x,
            })
            .next()
            .unwrap_or(Support::Ground)
    }

    /// Highest platform climbable in one hop from the current support.
    /// Returns the platform and the x to climb from.
    pub fn climb_target(&self, x: f32, feet: f32) -> Option<(&Platform, f32)> {
        let (lo, hi) = self.support_at(x, feet).span();
        self.intact()
            .filter(|p| p.top() < feet - 1.0 && feet - p.top() <= CLIMB_REACH)
            .filter_map(|p| {
                let from = lo.max(p.pos.x);
                let to = hi.min(p.max().x);
                (from <= to).then_some((p, (from + to) * 0.5))
            })
            .min_by(|a, b| {
                a.0.top()
                    .total_cmp(&b.0.top())
                    .then((a.1 - x).abs().total_cmp(&(b.1 - x).abs()))
            })
    }

    /// Nearest intact platform by horizontal distance
    pub fn nearest_platform(&self, x: f32) -> Option<&Platform> {
        self.intact()
            .min_by(|a, b| (a.center().x - x).abs().total_cmp(&(b.center().x - x).abs()))
    }

    /// Deepest contact between a circle and any solid
    pub fn collide_circle(&self, center: Vec2, radius: f32) -> Option<CollisionResult> {
        self.intact()
            .filter_map(|p| circle_rect_collision(center, radius, p.min(), p.max()))
            .chain(circle_ground_collision(center, radius, GROUND_Y))
            .max_by(|a, b| a.penetration.total_cmp(&b.penetration))
    }

    /// Area damage: `round((1 - dist/radius) * peak)` per platform, distance
    /// measured to the nearest point of the platform. Returns ids of platforms
    /// destroyed by this blast.
    pub fn apply_area_damage(&mut self, center: Vec2, radius: f32, peak: f32) -> Vec<u32> {
        let mut destroyed = Vec::new();
        for platform in self.platforms.iter_mut().filter(|p| !p.destroyed) {
            let damage = falloff_damage(platform.distance_to(center), radius, peak);
            if damage == 0 {
                continue;
            }
            platform.health = platform.health.saturating_sub(damage);
            if platform.health == 0 {
                platform.destroyed = true;
                destroyed.push(platform.id);
                log::debug!("platform {} destroyed", platform.id);
            }
        }
        destroyed
    }

    /// Drop destroyed platforms
    pub fn sweep_destroyed(&mut self) {
        self.platforms.retain(|p| !p.destroyed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_are_deterministic_and_mirrored() {
        for variant in [MapVariant::Plains, MapVariant::Fortress, MapVariant::Canyon] {
            let a = Terrain::generate(variant);
            let b = Terrain::generate(variant);
            assert_eq!(a.platforms, b.platforms);

            let n = a.platforms.len();
            let first = &a.platforms[0];
            let last = &a.platforms[n - 1];
            assert!((first.pos.x - (WORLD_WIDTH - last.max().x)).abs() < 1e-3);
            assert_eq!(first.top(), last.top());
        }
    }

    #[test]
    fn test_area_damage_falloff_and_destruction() {
        let mut terrain = Terrain::with_platforms(vec![Platform::new(1, 100.0, 300.0, 100.0, 20.0)]);
        // 10 units above the top face, radius 60, peak 40 -> round(5/6 * 40) = 33
        let destroyed = terrain.apply_area_damage(Vec2::new(150.0, 290.0), 60.0, 40.0);
        assert!(destroyed.is_empty());
        assert_eq!(terrain.platforms[0].health, 67);

        terrain.apply_area_damage(Vec2::new(150.0, 300.0), 80.0, 60.0);
        let destroyed = terrain.apply_area_damage(Vec2::new(150.0, 300.0), 80.0, 60.0);
        assert_eq!(destroyed, vec![1]);
        assert!(terrain.platforms[0].destroyed);
        assert!(!terrain.point_in_platform(Vec2::new(150.0, 310.0)));

        terrain.sweep_destroyed();
        assert!(terrain.platforms.is_empty());
    }

    #[test]
    fn test_out_of_radius_platform_untouched() {
        let mut terrain = Terrain::with_platforms(vec![Platform::new(1, 100.0, 300.0, 100.0, 20.0)]);
        terrain.apply_area_damage(Vec2::new(150.0, 200.0), 60.0, 40.0);
        assert_eq!(terrain.platforms[0].health, PLATFORM_MAX_HEALTH);
    }

    #[test]
    fn test_segment_intersection() {
        let platform = Platform::new(1, 100.0, 300.0, 100.0, 20.0);
        assert!(platform.intersects_segment(Vec2::new(50.0, 310.0), Vec2::new(250.0, 310.0)));
        assert!(platform.intersects_segment(Vec2::new(150.0, 200.0), Vec2::new(150.0, 400.0)));
        assert!(!platform.intersects_segment(Vec2::new(50.0, 250.0), Vec2::new(250.0, 250.0)));
        assert!(!platform.intersects_segment(Vec2::new(50.0, 310.0), Vec2::new(90.0, 310.0)));
    }

    #[test]
    fn test_surfaces_and_ledges() {
        let terrain = Terrain::generate(MapVariant::Plains);
        // Under the low left platform
        assert_eq!(terrain.surface_below(200.0, -100.0), 530.0);
        assert_eq!(terrain.surface_below(200.0, 600.0), GROUND_Y);
        assert_eq!(terrain.ledge_above(200.0, GROUND_Y, CLIMB_REACH), Some(530.0));
        // Centre perch is out of reach from the ground
        assert_eq!(terrain.ledge_above(600.0, GROUND_Y, CLIMB_REACH), None);
    }

    #[test]
    fn test_climb_target_prefers_highest_reachable() {
        let terrain = Terrain::generate(MapVariant::Plains);
        let (platform, _) = terrain.climb_target(50.0, GROUND_Y).unwrap();
        assert_eq!(platform.top(), 480.0);

        // From the mid platform the centre perch is one hop away
        let (platform, from_x) = terrain.climb_target(400.0, 480.0).unwrap();
        assert_eq!(platform.top(), 400.0);
        assert!(from_x >= 520.0 && from_x <= 540.0);
    }

    #[test]
    fn test_collide_circle_prefers_deepest() {
        let terrain = Terrain::flat();
        let hit = terrain.collide_circle(Vec2::new(10.0, GROUND_Y + 1.0), 4.0).unwrap();
        assert_eq!(hit.normal, Vec2::NEG_Y);
        assert!((hit.penetration - 5.0).abs() < 1e-4);
        assert!(terrain.collide_circle(Vec2::new(10.0, 100.0), 4.0).is_none());
    }
}
