//! Entity records and per-archetype behavior
//!
//! Entities are plain data owned by `World`. Behavior that differs per
//! enemy kind is dispatched through `Archetype` rather than a type
//! hierarchy; everything that moves shares the `Body` record.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::geom;
use crate::consts::*;
use crate::palette;

/// A boss stops approaching once it is this close to the player
pub const BOSS_HOLD_RANGE: f32 = 400.0;

/// Common movable record: position, velocity, collision radius
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
        }
    }

    /// Integrate one tick (velocities are in units per tick)
    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    pub fn overlaps(&self, other: &Body) -> bool {
        geom::circles_overlap(self.pos, self.radius, other.pos, other.radius)
    }
}

/// Enemy kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    /// Direct pursuit, the baseline threat
    Hollow,
    /// Pursues with a sinusoidal perpendicular weave
    Bat,
    /// Small, fast, fragile skirmisher
    Fragment,
    /// Large; holds position at range and emits radial projectiles
    Boss,
}

impl Archetype {
    pub fn radius(self) -> f32 {
        match self {
            Archetype::Fragment => 14.0,
            Archetype::Boss => 80.0,
            _ => 22.0,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Archetype::Hollow => palette::ENEMY_HOLLOW,
            Archetype::Bat => palette::ENEMY_BAT,
            Archetype::Fragment => palette::ENEMY_FRAGMENT,
            Archetype::Boss => palette::BOSS,
        }
    }

    pub fn is_boss(self) -> bool {
        self == Archetype::Boss
    }
}

/// An enemy entity
#[derive(Debug, Clone)]
pub struct Enemy {
    pub body: Body,
    pub archetype: Archetype,
    pub hp: f32,
    pub max_hp: f32,
    /// Pursuit speed in units per tick
    pub speed: f32,
    /// Visual spin, advanced each tick
    pub rotation: f32,
    /// Ticks of white flash remaining after taking a hit
    pub hit_flash: f32,
    /// Cosmetic jitter magnitude (random spikes, multiplicative decay)
    pub glitch: f32,
    /// Phase offset for the bat weave
    pub weave_offset: f32,
    pub dead: bool,
}

impl Enemy {
    /// Spawn a minion of the given archetype, scaled by breach level
    pub fn minion(archetype: Archetype, pos: Vec2, breach: u32, rng: &mut Pcg32) -> Self {
        let base_speed = 3.0 + breach as f32 * 0.2;
        let base_hp = 50.0 + breach as f32 * 10.0;
        let (speed, hp) = match archetype {
            Archetype::Fragment => (base_speed * 1.5, base_hp * 0.5),
            _ => (base_speed, base_hp),
        };
        Self {
            body: Body::new(pos, archetype.radius()),
            archetype,
            hp,
            max_hp: hp,
            speed,
            rotation: 0.0,
            hit_flash: 0.0,
            glitch: 0.0,
            weave_offset: rng.random_range(0.0..std::f32::consts::TAU),
            dead: false,
        }
    }

    /// Spawn a boss above the arena; health scales with breach level
    pub fn boss(breach: u32, rng: &mut Pcg32) -> Self {
        let hp = 2000.0 * (breach as f32 / 5.0);
        Self {
            body: Body::new(Vec2::new(ARENA_WIDTH / 2.0, -100.0), Archetype::Boss.radius()),
            archetype: Archetype::Boss,
            hp,
            max_hp: hp,
            speed: 2.0,
            rotation: 0.0,
            hit_flash: 0.0,
            glitch: 0.0,
            weave_offset: rng.random_range(0.0..std::f32::consts::TAU),
            dead: false,
        }
    }

    /// Velocity toward `target` for this tick
    ///
    /// Zero when the enemy sits exactly on the target (no direction exists)
    /// or when a boss is inside its hold range.
    pub fn tracking_velocity(&self, target: Vec2, elapsed_ms: f32) -> Vec2 {
        let Some(dir) = geom::dir_towards(self.body.pos, target) else {
            return Vec2::ZERO;
        };
        match self.archetype {
            Archetype::Boss => {
                if self.body.pos.distance_squared(target) < BOSS_HOLD_RANGE * BOSS_HOLD_RANGE {
                    Vec2::ZERO
                } else {
                    dir * self.speed
                }
            }
            Archetype::Bat => {
                let pursuit = dir * self.speed;
                let phase = elapsed_ms / 120.0 + self.weave_offset;
                pursuit + pursuit.perp() * 0.8 * phase.sin()
            }
            _ => dir * self.speed,
        }
    }

    /// Apply projectile damage; returns true when this hit was lethal
    pub fn take_hit(&mut self, damage: f32) -> bool {
        self.hp -= damage;
        self.hit_flash = 7.0;
        if self.hp <= 0.0 && !self.dead {
            self.dead = true;
            return true;
        }
        false
    }
}

/// A projectile fired by a weapon (or emitted by a boss)
#[derive(Debug, Clone)]
pub struct Projectile {
    pub body: Body,
    pub damage: f32,
    pub age_ms: f32,
    pub color: &'static str,
    pub dead: bool,
}

impl Projectile {
    pub fn new(pos: Vec2, vel: Vec2, damage: f32, color: &'static str) -> Self {
        Self {
            body: Body {
                pos,
                vel,
                radius: PROJECTILE_RADIUS,
            },
            damage,
            age_ms: 0.0,
            color,
            dead: false,
        }
    }

    pub fn expired(&self) -> bool {
        self.age_ms > PROJECTILE_LIFETIME_MS
    }
}

/// An experience shard left behind by a dead enemy
#[derive(Debug, Clone)]
pub struct Shard {
    pub pos: Vec2,
    pub exp: u32,
    pub dead: bool,
}

impl Shard {
    pub fn new(pos: Vec2, exp: u32) -> Self {
        Self {
            pos,
            exp,
            dead: false,
        }
    }
}

/// Pickup kinds dropped by dead enemies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    /// Heals on contact
    Health,
    /// Arms a timed power-up on contact
    Ammo,
}

impl PickupKind {
    pub fn color(self) -> &'static str {
        match self {
            PickupKind::Health => palette::HEALTH_DROP,
            PickupKind::Ammo => palette::AMMO_DROP,
        }
    }
}

/// A pickup waiting on the ground
#[derive(Debug, Clone)]
pub struct Pickup {
    pub pos: Vec2,
    pub kind: PickupKind,
    pub dead: bool,
}

impl Pickup {
    pub fn new(pos: Vec2, kind: PickupKind) -> Self {
        Self {
            pos,
            kind,
            dead: false,
        }
    }
}

/// Particle draw styles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Pixel,
    Line,
    Square,
}

/// A short-lived cosmetic particle (never gameplay-affecting)
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: ParticleKind,
    pub life: f32,
    pub max_life: f32,
    pub color: &'static str,
    pub size: f32,
}

impl Particle {
    /// Spawn with a random direction, speed 2..8 and life 20..60 ticks
    pub fn spray(
        pos: Vec2,
        color: &'static str,
        size: f32,
        kind: ParticleKind,
        rng: &mut Pcg32,
    ) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = rng.random::<f32>() * 6.0 + 2.0;
        let life = rng.random::<f32>() * 40.0 + 20.0;
        Self {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            kind,
            life,
            max_life: life,
            color,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn test_hollow_pursues_directly() {
        // Enemy straight above the player closes straight down at full speed
        let player = Vec2::new(960.0, 540.0);
        let mut e = Enemy::minion(Archetype::Hollow, Vec2::new(960.0, 340.0), 1, &mut rng());
        e.speed = 3.2;
        e.hp = 60.0;

        let vel = e.tracking_velocity(player, 0.0);
        assert!((vel.x).abs() < 1e-5);
        assert!((vel.y - 3.2).abs() < 1e-5);

        e.body.vel = vel;
        e.body.advance();
        assert!((e.body.pos.y - 343.2).abs() < 1e-3);
    }

    #[test]
    fn test_enemy_on_player_stands_still() {
        let player = Vec2::new(960.0, 540.0);
        let e = Enemy::minion(Archetype::Hollow, player, 3, &mut rng());
        assert_eq!(e.tracking_velocity(player, 0.0), Vec2::ZERO);
    }

    #[test]
    fn test_boss_holds_at_range() {
        let player = Vec2::new(960.0, 540.0);
        let mut boss = Enemy::boss(5, &mut rng());
        assert_eq!(boss.hp, 2000.0);

        boss.body.pos = player + Vec2::new(399.0, 0.0);
        assert_eq!(boss.tracking_velocity(player, 0.0), Vec2::ZERO);

        boss.body.pos = player + Vec2::new(500.0, 0.0);
        let vel = boss.tracking_velocity(player, 0.0);
        assert!((vel.length() - 2.0).abs() < 1e-4);
        assert!(vel.x < 0.0);
    }

    #[test]
    fn test_boss_health_scales_with_breach() {
        assert_eq!(Enemy::boss(10, &mut rng()).hp, 4000.0);
    }

    #[test]
    fn test_fragment_is_fast_and_fragile() {
        // Breach 2 base is speed 3.4 / hp 70; fragments run x1.5 at half hp
        let e = Enemy::minion(Archetype::Fragment, Vec2::ZERO, 2, &mut rng());
        assert!((e.speed - 5.1).abs() < 1e-4);
        assert_eq!(e.hp, 35.0);
        assert_eq!(e.body.radius, 14.0);
    }

    #[test]
    fn test_bat_weave_stays_bounded() {
        let player = Vec2::new(960.0, 540.0);
        let e = Enemy::minion(Archetype::Bat, Vec2::new(200.0, 200.0), 2, &mut rng());
        // Pursuit plus a perpendicular component of at most 0.8x pursuit
        for t in 0..200 {
            let vel = e.tracking_velocity(player, t as f32 * 16.0);
            assert!(vel.length() <= e.speed * (1.0 + 0.8) + 1e-4);
            assert!(vel.length() > 0.0);
        }
    }

    #[test]
    fn test_take_hit_lethal_only_once() {
        let mut e = Enemy::minion(Archetype::Hollow, Vec2::ZERO, 1, &mut rng());
        e.hp = 10.0;
        assert!(!e.take_hit(5.0));
        assert!(e.take_hit(5.0));
        assert!(e.dead);
        assert!(!e.take_hit(5.0));
    }

    #[test]
    fn test_projectile_expiry_boundary() {
        let mut p = Projectile::new(Vec2::ZERO, Vec2::ZERO, 15.0, "#fff");
        p.age_ms = PROJECTILE_LIFETIME_MS;
        assert!(!p.expired());
        p.age_ms += 16.0;
        assert!(p.expired());
    }
}
