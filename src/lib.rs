//! Neon Breach - a neon arena survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, difficulty, progression)
//! - `render`: Canvas2D render pass with glitch post-processing (wasm32)
//! - `audio`: Oscillator-synthesized sound cues (wasm32)
//! - `settings`: Audio/visual preferences persisted to LocalStorage

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod render;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Arena dimensions (world units == canvas pixels, no camera)
    pub const ARENA_WIDTH: f32 = 1920.0;
    pub const ARENA_HEIGHT: f32 = 1080.0;

    /// Nominal frame timestep fed to `advance` (clocks only; velocities
    /// are in units per tick)
    pub const TICK_DT_MS: f32 = 16.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 22.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const PLAYER_SPEED: f32 = 6.0;
    pub const PLAYER_MAGNET_RADIUS: f32 = 150.0;
    pub const PROJECTILE_SPEED: f32 = 20.0;

    /// Difficulty: breach level rises every 45 s, capped at 10
    pub const BREACH_INTERVAL_MS: f32 = 45_000.0;
    pub const MAX_BREACH_LEVEL: u32 = 10;

    /// Enemies spawn on a ring this far from the player (off-screen)
    pub const SPAWN_RING_RADIUS: f32 = 1400.0;

    /// Contact damage per overlapping enemy per tick
    pub const CONTACT_DAMAGE: f32 = 1.2;

    /// Projectile lifetime and radius
    pub const PROJECTILE_LIFETIME_MS: f32 = 2000.0;
    pub const PROJECTILE_RADIUS: f32 = 5.0;

    /// Experience thresholds grow geometrically
    pub const FIRST_LEVEL_EXP: u32 = 80;
    pub const LEVEL_EXP_GROWTH: f32 = 1.4;

    /// Shard magnetism step per tick while inside the magnet radius
    pub const MAGNET_STEP: f32 = 22.0;

    /// Power-up duration granted by an ammo drop
    pub const POWER_UP_MS: f32 = 5000.0;
}

/// Entity and UI colors (CSS color strings, fed straight to the canvas)
pub mod palette {
    pub const BACKGROUND: &str = "#050505";
    pub const PLAYER_CORE: &str = "#00f2ff";
    pub const PLAYER_RING: &str = "#006677";
    pub const ENEMY_HOLLOW: &str = "#ff0055";
    pub const ENEMY_FRAGMENT: &str = "#00ffaa";
    pub const ENEMY_BAT: &str = "#ffaa00";
    pub const BOSS: &str = "#ff00ff";
    pub const SHARD: &str = "#00ffaa";
    pub const HEALTH_DROP: &str = "#00ff44";
    pub const AMMO_DROP: &str = "#ffcc00";
    pub const DATA_STREAM: &str = "#00f2ff";
    pub const FIREWALL: &str = "#ffcc00";
    pub const LOGIC_BOMB: &str = "#ff4400";
    pub const NEURAL_SPIKE: &str = "#ffffff";
    pub const HIT_FLASH: &str = "#ffffff";
    pub const HEALTH_BAR_BACK: &str = "rgba(0, 0, 0, 0.6)";
    pub const DAMAGE_FLASH: &str = "255, 0, 85";
}
