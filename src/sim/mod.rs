//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One `advance` per animation frame, velocities in units per tick
//! - Seeded RNG only; the render pass keeps its own cosmetic stream
//! - No rendering or platform dependencies, so everything tests natively

pub mod entity;
pub mod geom;
pub mod patch;
pub mod state;
pub mod tick;

pub use entity::{
    Archetype, Body, Enemy, Particle, ParticleKind, Pickup, PickupKind, Projectile, Shard,
};
pub use patch::{KernelPatch, PatchKind, StatBoost, fallback_patches};
pub use state::{
    ActivePowerUp, GameEvent, MAX_PARTICLES, PlayerStats, PowerUp, RunStats, Weapon, WeaponKind,
    World,
};
pub use tick::{InputState, advance};
