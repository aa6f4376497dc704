//! Run state and the world that owns it
//!
//! `World` exclusively owns every entity collection, the weapon list and the
//! RNG; the tick loop mutates it in place and the driver reads snapshots.
//! Nothing here touches the platform, so the whole state machine runs (and
//! is tested) natively.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Enemy, Particle, ParticleKind, Pickup, Projectile, Shard};
use crate::consts::*;
use crate::palette;

/// Weapon kinds (serde: patches name them on the wire as SCREAMING_SNAKE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponKind {
    DataStream,
    FirewallRing,
    LogicBomb,
    NeuralSpike,
}

impl WeaponKind {
    pub fn color(self) -> &'static str {
        match self {
            WeaponKind::DataStream => palette::DATA_STREAM,
            WeaponKind::FirewallRing => palette::FIREWALL,
            WeaponKind::LogicBomb => palette::LOGIC_BOMB,
            WeaponKind::NeuralSpike => palette::NEURAL_SPIKE,
        }
    }
}

/// An owned weapon with its firing state
#[derive(Debug, Clone)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub level: u32,
    /// Sim-clock timestamp of the last shot; starts one cooldown in the
    /// past so a fresh weapon may fire as soon as a target exists
    pub last_fired_ms: f32,
    pub cooldown_ms: f32,
    pub damage: f32,
}

impl Weapon {
    /// The starting loadout weapon
    pub fn starting() -> Self {
        Self {
            kind: WeaponKind::DataStream,
            level: 1,
            last_fired_ms: -600.0,
            cooldown_ms: 600.0,
            damage: 15.0,
        }
    }

    /// A weapon freshly unlocked by a patch
    pub fn unlocked(kind: WeaponKind) -> Self {
        Self {
            kind,
            level: 1,
            last_fired_ms: -1000.0,
            cooldown_ms: 1000.0,
            damage: 20.0,
        }
    }

    /// One patch level: stronger and faster
    pub fn upgrade(&mut self) {
        self.level += 1;
        self.damage *= 1.4;
        self.cooldown_ms *= 0.8;
    }

    /// Cooldown check against the sim clock (strictly greater than)
    pub fn ready(&self, elapsed_ms: f32, fire_rate_boost: bool) -> bool {
        let cooldown = if fire_rate_boost {
            self.cooldown_ms * 0.5
        } else {
            self.cooldown_ms
        };
        elapsed_ms - self.last_fired_ms > cooldown
    }
}

/// Player stats mutable by upgrades
#[derive(Debug, Clone, Copy)]
pub struct PlayerStats {
    pub speed: f32,
    pub magnet_radius: f32,
    pub projectile_speed: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            speed: PLAYER_SPEED,
            magnet_radius: PLAYER_MAGNET_RADIUS,
            projectile_speed: PROJECTILE_SPEED,
        }
    }
}

/// Timed boost kinds armed by ammo pickups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUp {
    /// Halves weapon cooldowns
    FireRate,
    /// Doubles projectile damage
    Damage,
}

/// A running power-up and its remaining time
#[derive(Debug, Clone, Copy)]
pub struct ActivePowerUp {
    pub kind: PowerUp,
    pub remaining_ms: f32,
}

/// Per-run scoreboard, reported to the UI every frame
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    pub score: u64,
    pub kills: u32,
    pub elapsed_ms: f32,
    pub game_over: bool,
    pub level: u32,
    /// Thresholds grow by x1.4 and go fractional; overshoot carries over
    pub experience: f32,
    pub next_level_exp: f32,
    pub health: f32,
    pub max_health: f32,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            score: 0,
            kills: 0,
            elapsed_ms: 0.0,
            game_over: false,
            level: 1,
            experience: 0.0,
            next_level_exp: FIRST_LEVEL_EXP as f32,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
        }
    }
}

/// Events accumulated during a tick, drained once per frame by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A weapon fired a projectile
    Fired,
    /// A projectile connected with an enemy
    Hit,
    /// A shard or pickup was collected
    Collected,
    /// The player reached this level; the driver should pause and offer patches
    LevelUp(u32),
    /// Health reached zero; emitted exactly once per run
    GameOver,
}

/// Cap on live cosmetic particles; bursts are clipped, never reordered
pub const MAX_PARTICLES: usize = 512;

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed, kept for logging and restarts
    pub seed: u64,
    pub rng: Pcg32,
    pub player: Body,
    pub player_stats: PlayerStats,
    pub weapons: Vec<Weapon>,
    pub stats: RunStats,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub shards: Vec<Shard>,
    pub pickups: Vec<Pickup>,
    pub particles: Vec<Particle>,
    /// Difficulty tier, rises every 45 s, capped at 10
    pub breach_level: u32,
    pub boss_active: bool,
    /// While set, `advance` is a no-op; `draw` keeps running
    pub paused: bool,
    pub screen_shake: f32,
    pub damage_flash: f32,
    pub power_up: Option<ActivePowerUp>,
    pub events: Vec<GameEvent>,
}

impl World {
    /// Fresh run with the player centered and the starting weapon equipped
    pub fn new(seed: u64) -> Self {
        log::info!("new run, seed {seed}");
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: Body::new(
                Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0),
                PLAYER_RADIUS,
            ),
            player_stats: PlayerStats::default(),
            weapons: vec![Weapon::starting()],
            stats: RunStats::default(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            shards: Vec::new(),
            pickups: Vec::new(),
            particles: Vec::new(),
            breach_level: 1,
            boss_active: false,
            paused: false,
            screen_shake: 0.0,
            damage_flash: 0.0,
            power_up: None,
            events: Vec::new(),
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Drain the events accumulated since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn fire_rate_active(&self) -> bool {
        matches!(
            self.power_up,
            Some(ActivePowerUp {
                kind: PowerUp::FireRate,
                ..
            })
        )
    }

    pub fn damage_active(&self) -> bool {
        matches!(
            self.power_up,
            Some(ActivePowerUp {
                kind: PowerUp::Damage,
                ..
            })
        )
    }

    pub fn arm_power_up(&mut self, kind: PowerUp) {
        self.power_up = Some(ActivePowerUp {
            kind,
            remaining_ms: POWER_UP_MS,
        });
    }

    /// Heal, clamped to max health
    pub fn heal(&mut self, amount: f32) {
        self.stats.health = (self.stats.health + amount).min(self.stats.max_health);
    }

    /// Add experience from one collected shard; at most one level per call
    pub fn grant_experience(&mut self, exp: u32) {
        self.stats.experience += exp as f32;
        if self.stats.experience >= self.stats.next_level_exp {
            self.stats.level += 1;
            self.stats.experience -= self.stats.next_level_exp;
            self.stats.next_level_exp *= LEVEL_EXP_GROWTH;
            log::info!("level up to {}", self.stats.level);
            self.spawn_burst(self.player.pos, palette::PLAYER_CORE, 2.0, ParticleKind::Line, 30);
            self.events.push(GameEvent::LevelUp(self.stats.level));
        }
    }

    /// Spray `count` particles at `pos`, clipped to the particle cap
    pub fn spawn_burst(
        &mut self,
        pos: Vec2,
        color: &'static str,
        size: f32,
        kind: ParticleKind,
        count: usize,
    ) {
        for _ in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                break;
            }
            self.particles
                .push(Particle::spray(pos, color, size, kind, &mut self.rng));
        }
    }
}
