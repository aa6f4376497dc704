//! The per-frame world update
//!
//! `advance` runs one frame in a fixed order: clocks and difficulty,
//! transient decay, player movement, spawning, weapons, particles, enemies,
//! projectiles, pickups, shards, pruning. Velocities are in units per tick;
//! `dt_ms` feeds only the clocks. A paused or finished world is left
//! untouched.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{Archetype, Enemy, ParticleKind, Pickup, PickupKind, Projectile, Shard};
use super::geom;
use super::state::{GameEvent, PowerUp, World};
use crate::consts::*;
use crate::palette;

/// Shards are consumed within this distance of the player's surface
const SHARD_COLLECT_RADIUS: f32 = 18.0;
/// Pickups are consumed within this distance of the player's surface
const PICKUP_COLLECT_RADIUS: f32 = 15.0;

/// Input sampled by the driver and handed to `advance` each tick
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Virtual joystick vector; used only when no key is held
    pub joystick: Vec2,
}

impl InputState {
    /// Movement direction: keys win over the joystick, result is unit or zero
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        if dir != Vec2::ZERO {
            return dir.normalize();
        }
        if self.joystick.length_squared() > 0.0 {
            return self.joystick.normalize();
        }
        Vec2::ZERO
    }
}

/// Advance the world by one frame
pub fn advance(world: &mut World, input: &InputState, dt_ms: f32) {
    if world.paused || world.stats.game_over {
        return;
    }

    // 1. Clocks and difficulty
    world.stats.elapsed_ms += dt_ms;
    update_breach(world);

    // 2. Transient decay
    world.screen_shake *= 0.9;
    if world.screen_shake < 0.01 {
        world.screen_shake = 0.0;
    }
    world.damage_flash *= 0.85;
    if world.damage_flash < 0.01 {
        world.damage_flash = 0.0;
    }
    if let Some(active) = &mut world.power_up {
        active.remaining_ms -= dt_ms;
        if active.remaining_ms <= 0.0 {
            world.power_up = None;
        }
    }

    // 3. Player movement
    let dir = input.direction();
    if dir != Vec2::ZERO {
        world.player.vel = dir * world.player_stats.speed;
    } else {
        world.player.vel *= 0.85;
    }
    world.player.advance();
    world.player.pos = geom::clamp_to_arena(world.player.pos);

    // 4. Enemy spawning
    spawn_enemies(world);

    // 5. Weapon firing
    fire_weapons(world);

    // 6. Particles
    for p in &mut world.particles {
        p.pos += p.vel;
        p.life -= 1.0;
    }
    world.particles.retain(|p| p.life > 0.0);

    // 7. Enemies: tracking, cosmetics, player contact, boss emission
    update_enemies(world);

    // 8. Projectiles: integrate, expire, collide with enemies
    update_projectiles(world, dt_ms);

    // 9. Pickups
    collect_pickups(world);

    // 10. Shards: magnetism and collection
    collect_shards(world);

    // 11. Prune everything that died this tick
    world.enemies.retain(|e| !e.dead);
    world.projectiles.retain(|p| !p.dead);
    world.shards.retain(|s| !s.dead);
    world.pickups.retain(|p| !p.dead);
}

/// Breach level from the run clock; spawns a boss on reaching 5 or 10
fn update_breach(world: &mut World) {
    let next = ((world.stats.elapsed_ms / BREACH_INTERVAL_MS) as u32 + 1).min(MAX_BREACH_LEVEL);
    if next != world.breach_level {
        world.breach_level = next;
        log::info!("breach level {next}");
        if next == 5 || next == 10 {
            world.boss_active = true;
            let boss = Enemy::boss(next, &mut world.rng);
            world.enemies.push(boss);
            log::info!("boss spawned at breach {next}");
        }
    }
}

/// Per-tick spawn probability; bosses choke the stream to a trickle
fn spawn_probability(breach: u32, boss_active: bool) -> f32 {
    if boss_active {
        0.01
    } else {
        (0.03 + breach as f32 * 0.015).min(0.25)
    }
}

/// Minion mix: hollows always, bats from breach 2, fragments from breach 3
fn roll_archetype(breach: u32, rng: &mut Pcg32) -> Archetype {
    let roll: f32 = rng.random();
    if breach >= 2 && roll < 0.25 {
        Archetype::Bat
    } else if breach >= 3 && roll < 0.45 {
        Archetype::Fragment
    } else {
        Archetype::Hollow
    }
}

fn spawn_enemies(world: &mut World) {
    let p = spawn_probability(world.breach_level, world.boss_active);
    if world.rng.random::<f32>() < p {
        let angle = world.rng.random_range(0.0..std::f32::consts::TAU);
        let pos = geom::ring_point(world.player.pos, SPAWN_RING_RADIUS, angle);
        let archetype = roll_archetype(world.breach_level, &mut world.rng);
        let enemy = Enemy::minion(archetype, pos, world.breach_level, &mut world.rng);
        world.enemies.push(enemy);
    }
}

/// Index of the closest live enemy (squared distance, first found wins ties)
fn nearest_enemy(enemies: &[Enemy], from: Vec2) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, e) in enemies.iter().enumerate() {
        if e.dead {
            continue;
        }
        let d = e.body.pos.distance_squared(from);
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Every ready weapon fires at the nearest enemy; no target, no shot
fn fire_weapons(world: &mut World) {
    let Some(target) = nearest_enemy(&world.enemies, world.player.pos) else {
        return;
    };
    let target_pos = world.enemies[target].body.pos;
    let Some(dir) = geom::dir_towards(world.player.pos, target_pos) else {
        return;
    };

    let elapsed = world.stats.elapsed_ms;
    let fire_rate = world.fire_rate_active();
    let damage_boost = if world.damage_active() { 2.0 } else { 1.0 };
    let origin = world.player.pos;
    let speed = world.player_stats.projectile_speed;

    for weapon in &mut world.weapons {
        if !weapon.ready(elapsed, fire_rate) {
            continue;
        }
        weapon.last_fired_ms = elapsed;
        world.projectiles.push(Projectile::new(
            origin,
            dir * speed,
            weapon.damage * damage_boost,
            weapon.kind.color(),
        ));
        world.events.push(GameEvent::Fired);
    }
}

fn update_enemies(world: &mut World) {
    let player_pos = world.player.pos;
    let elapsed = world.stats.elapsed_ms;

    for enemy in &mut world.enemies {
        enemy.body.vel = enemy.tracking_velocity(player_pos, elapsed);
        enemy.body.advance();

        enemy.rotation += 0.06;
        if enemy.hit_flash > 0.0 {
            enemy.hit_flash -= 1.0;
        }
        // Rare jitter spike, multiplicative decay in between
        if world.rng.random::<f32>() > 0.97 {
            enemy.glitch = world.rng.random::<f32>() * 12.0;
        } else {
            enemy.glitch *= 0.85;
        }

        // Bosses sling a radial bullet now and then; spawned on the rim so
        // it cannot overlap its emitter on the tick it appears
        if enemy.archetype.is_boss() && world.rng.random::<f32>() < 0.05 {
            let angle = world.rng.random_range(0.0..std::f32::consts::TAU);
            let dir = Vec2::new(angle.cos(), angle.sin());
            let spawn = enemy.body.pos + dir * (enemy.body.radius + PROJECTILE_RADIUS + 1.0);
            world
                .projectiles
                .push(Projectile::new(spawn, dir * 10.0, 10.0, palette::BOSS));
        }

        if enemy.body.overlaps(&world.player) {
            world.stats.health -= CONTACT_DAMAGE;
            world.screen_shake = 15.0;
            world.damage_flash = 1.0;
            if world.stats.health <= 0.0 && !world.stats.game_over {
                world.stats.game_over = true;
                log::info!(
                    "run over: score {} kills {} level {}",
                    world.stats.score,
                    world.stats.kills,
                    world.stats.level
                );
                world.events.push(GameEvent::GameOver);
            }
        }
    }
}

fn update_projectiles(world: &mut World, dt_ms: f32) {
    // Kill rewards are deferred so the hit scan never aliases the enemy list
    let mut kills: Vec<(Vec2, Archetype)> = Vec::new();

    for projectile in &mut world.projectiles {
        projectile.body.advance();
        projectile.age_ms += dt_ms;
        if projectile.expired() {
            projectile.dead = true;
            continue;
        }
        for enemy in &mut world.enemies {
            if enemy.dead {
                continue;
            }
            if projectile.body.overlaps(&enemy.body) {
                projectile.dead = true;
                world.events.push(GameEvent::Hit);
                if enemy.take_hit(projectile.damage) {
                    kills.push((enemy.body.pos, enemy.archetype));
                }
                break;
            }
        }
    }

    for (pos, archetype) in kills {
        award_kill(world, pos, archetype);
    }
}

/// Score, shard, drop rolls and particles for one dead enemy
fn award_kill(world: &mut World, pos: Vec2, archetype: Archetype) {
    let boss = archetype.is_boss();
    world.stats.score += if boss { 5000 } else { 100 };
    world.stats.kills += 1;
    world.shards.push(Shard::new(pos, if boss { 500 } else { 25 }));

    if world.rng.random::<f32>() < 0.10 {
        world.pickups.push(Pickup::new(pos, PickupKind::Health));
    } else if world.rng.random::<f32>() < 0.05 {
        world.pickups.push(Pickup::new(pos, PickupKind::Ammo));
    }

    world.spawn_burst(pos, archetype.color(), 3.0, ParticleKind::Pixel, 8);
    if boss {
        world.boss_active = false;
        log::info!("boss down at breach {}", world.breach_level);
        world.spawn_burst(pos, palette::BOSS, 10.0, ParticleKind::Square, 100);
    }
}

fn collect_pickups(world: &mut World) {
    let player = world.player;
    let mut collected: Vec<PickupKind> = Vec::new();

    for pickup in &mut world.pickups {
        if pickup.dead {
            continue;
        }
        if geom::circles_overlap(player.pos, player.radius, pickup.pos, PICKUP_COLLECT_RADIUS) {
            pickup.dead = true;
            collected.push(pickup.kind);
        }
    }

    for kind in collected {
        world.events.push(GameEvent::Collected);
        match kind {
            PickupKind::Health => world.heal(20.0),
            PickupKind::Ammo => {
                let power = if world.rng.random::<f32>() < 0.5 {
                    PowerUp::FireRate
                } else {
                    PowerUp::Damage
                };
                world.arm_power_up(power);
            }
        }
    }
}

fn collect_shards(world: &mut World) {
    let player = world.player;
    let magnet = world.player_stats.magnet_radius;
    let mut collected: Vec<u32> = Vec::new();

    for shard in &mut world.shards {
        if shard.dead {
            continue;
        }
        // Distance is measured once; a magnet step lands next tick
        if geom::circles_overlap(player.pos, player.radius, shard.pos, SHARD_COLLECT_RADIUS) {
            shard.dead = true;
            collected.push(shard.exp);
            continue;
        }
        if shard.pos.distance_squared(player.pos) < magnet * magnet {
            if let Some(dir) = geom::dir_towards(shard.pos, player.pos) {
                shard.pos += dir * MAGNET_STEP;
            }
        }
    }

    for exp in collected {
        world.events.push(GameEvent::Collected);
        world.grant_experience(exp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    const DT: f32 = TICK_DT_MS;

    #[test]
    fn test_paused_world_is_untouched() {
        let mut world = World::new(1);
        world.set_paused(true);
        let before_pos = world.player.pos;
        advance(&mut world, &InputState::default(), DT);
        assert_eq!(world.stats.elapsed_ms, 0.0);
        assert_eq!(world.player.pos, before_pos);
        assert!(world.enemies.is_empty());
    }

    #[test]
    fn test_finished_world_is_untouched() {
        let mut world = World::new(2);
        world.stats.game_over = true;
        advance(&mut world, &InputState::default(), DT);
        assert_eq!(world.stats.elapsed_ms, 0.0);
    }

    #[test]
    fn test_direction_keys_win_over_joystick() {
        let input = InputState {
            right: true,
            joystick: Vec2::new(-1.0, 0.0),
            ..Default::default()
        };
        assert_eq!(input.direction(), Vec2::new(1.0, 0.0));

        let diagonal = InputState {
            up: true,
            right: true,
            ..Default::default()
        };
        assert!((diagonal.direction().length() - 1.0).abs() < 1e-6);

        let stick_only = InputState {
            joystick: Vec2::new(0.0, 0.3),
            ..Default::default()
        };
        assert_eq!(stick_only.direction(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_player_moves_and_damps() {
        let mut world = World::new(3);
        let input = InputState {
            right: true,
            ..Default::default()
        };
        advance(&mut world, &input, DT);
        assert_eq!(world.player.vel, Vec2::new(6.0, 0.0));
        assert_eq!(world.player.pos.x, 966.0);

        advance(&mut world, &InputState::default(), DT);
        assert!((world.player.vel.x - 5.1).abs() < 1e-4);
    }

    #[test]
    fn test_player_clamped_to_arena() {
        let mut world = World::new(4);
        world.player.pos = Vec2::new(5.0, 540.0);
        let input = InputState {
            left: true,
            ..Default::default()
        };
        for _ in 0..10 {
            advance(&mut world, &input, DT);
        }
        assert_eq!(world.player.pos.x, 0.0);
    }

    #[test]
    fn test_breach_rises_caps_and_spawns_bosses() {
        let mut world = World::new(5);
        let input = InputState::default();

        for step in 1..=12u32 {
            advance(&mut world, &input, BREACH_INTERVAL_MS);
            let expected = (step + 1).min(10);
            assert_eq!(world.breach_level, expected, "after jump {step}");
        }

        let bosses = world
            .enemies
            .iter()
            .filter(|e| e.archetype == Archetype::Boss)
            .count();
        assert_eq!(bosses, 2);
        assert!(world.boss_active);
    }

    #[test]
    fn test_spawn_probability_formula() {
        assert!((spawn_probability(1, false) - 0.045).abs() < 1e-6);
        assert!((spawn_probability(10, false) - 0.18).abs() < 1e-6);
        assert_eq!(spawn_probability(7, true), 0.01);
    }

    #[test]
    fn test_archetype_mix_per_breach() {
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..500 {
            assert_eq!(roll_archetype(1, &mut rng), Archetype::Hollow);
        }
        let mut saw_bat = false;
        for _ in 0..500 {
            let a = roll_archetype(2, &mut rng);
            assert_ne!(a, Archetype::Fragment);
            saw_bat |= a == Archetype::Bat;
        }
        assert!(saw_bat);
        let mut saw_fragment = false;
        for _ in 0..500 {
            saw_fragment |= roll_archetype(3, &mut rng) == Archetype::Fragment;
        }
        assert!(saw_fragment);
    }

    #[test]
    fn test_weapon_fires_after_cooldown_not_before() {
        let mut world = World::new(6);
        world
            .enemies
            .push(Enemy::minion(Archetype::Hollow, Vec2::new(960.0, 200.0), 1, &mut world.rng));
        world.weapons[0].last_fired_ms = 0.0;

        // t = 500: inside the 600 ms cooldown, nothing fires
        advance(&mut world, &InputState::default(), 500.0);
        assert_eq!(world.projectiles.len(), 0);
        assert_eq!(world.weapons[0].last_fired_ms, 0.0);

        // t = 601: strictly past the cooldown, exactly one shot
        advance(&mut world, &InputState::default(), 101.0);
        assert_eq!(world.projectiles.len(), 1);
        assert_eq!(world.weapons[0].last_fired_ms, 601.0);
        assert!(world.take_events().contains(&GameEvent::Fired));

        // Aimed straight up at the nearest enemy
        let vel = world.projectiles[0].body.vel;
        assert!(vel.y < 0.0 && vel.x.abs() < 1.0);
        assert!((vel.length() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_no_target_no_shot() {
        let mut world = World::new(7);
        world.weapons[0].last_fired_ms = 0.0;
        world.stats.elapsed_ms = 2000.0;
        fire_weapons(&mut world);
        assert!(world.projectiles.is_empty());
        assert_eq!(world.weapons[0].last_fired_ms, 0.0);
    }

    #[test]
    fn test_contact_damage_and_single_game_over() {
        let mut world = World::new(8);
        world.weapons.clear();
        world.stats.health = 1.0;
        // Enemy exactly on the player: overlap and a zero-length direction
        world
            .enemies
            .push(Enemy::minion(Archetype::Hollow, world.player.pos, 1, &mut world.rng));

        advance(&mut world, &InputState::default(), DT);
        assert!(world.stats.game_over);
        assert!(world.stats.health <= 0.0);
        assert!(world.player.pos.is_finite());
        let overs = world
            .take_events()
            .iter()
            .filter(|e| **e == GameEvent::GameOver)
            .count();
        assert_eq!(overs, 1);

        // Finished worlds no longer tick, so the event cannot repeat
        advance(&mut world, &InputState::default(), DT);
        assert!(world.take_events().is_empty());
    }

    #[test]
    fn test_contact_transients_decay() {
        let mut world = World::new(9);
        world.weapons.clear();
        world
            .enemies
            .push(Enemy::minion(Archetype::Hollow, world.player.pos, 1, &mut world.rng));
        advance(&mut world, &InputState::default(), DT);
        assert_eq!(world.screen_shake, 15.0);
        assert_eq!(world.damage_flash, 1.0);

        world.enemies.clear();
        advance(&mut world, &InputState::default(), DT);
        assert!((world.screen_shake - 13.5).abs() < 1e-4);
        assert!((world.damage_flash - 0.85).abs() < 1e-4);

        world.screen_shake = 0.005;
        world.damage_flash = 0.005;
        advance(&mut world, &InputState::default(), DT);
        assert_eq!(world.screen_shake, 0.0);
        assert_eq!(world.damage_flash, 0.0);
    }

    #[test]
    fn test_projectile_kill_awards() {
        let mut world = World::new(10);
        world.weapons.clear();
        let pos = Vec2::new(1400.0, 540.0);
        let mut enemy = Enemy::minion(Archetype::Hollow, pos, 1, &mut world.rng);
        enemy.hp = 10.0;
        world.enemies.push(enemy);
        world
            .projectiles
            .push(Projectile::new(pos, Vec2::ZERO, 15.0, "#00f2ff"));

        advance(&mut world, &InputState::default(), DT);

        assert_eq!(world.stats.score, 100);
        assert_eq!(world.stats.kills, 1);
        assert_eq!(world.shards.len(), 1);
        assert_eq!(world.shards[0].exp, 25);
        assert!(world.pickups.len() <= 1);
        assert!(world.particles.len() >= 8);
        assert!(world.take_events().contains(&GameEvent::Hit));
        // Both the dead enemy and the spent projectile were pruned
        assert!(world.enemies.iter().all(|e| !e.dead));
        assert!(world.projectiles.iter().all(|p| !p.dead));
    }

    #[test]
    fn test_boss_kill_clears_flag_and_bursts() {
        let mut world = World::new(11);
        world.weapons.clear();
        world.boss_active = true;
        let mut boss = Enemy::boss(5, &mut world.rng);
        boss.body.pos = Vec2::new(960.0, 100.0);
        boss.hp = 5.0;
        world.enemies.push(boss);
        world
            .projectiles
            .push(Projectile::new(Vec2::new(960.0, 100.0), Vec2::ZERO, 10.0, "#00f2ff"));

        advance(&mut world, &InputState::default(), DT);

        assert!(!world.boss_active);
        assert_eq!(world.stats.score, 5000);
        assert_eq!(world.shards[0].exp, 500);
        assert!(world.particles.len() >= 100);
        assert!(world.enemies.iter().all(|e| e.archetype != Archetype::Boss));
    }

    #[test]
    fn test_health_pickup_heals_with_cap() {
        let mut world = World::new(12);
        world.stats.health = 95.0;
        world
            .pickups
            .push(Pickup::new(world.player.pos, PickupKind::Health));

        advance(&mut world, &InputState::default(), DT);

        assert_eq!(world.stats.health, 100.0);
        assert!(world.pickups.iter().all(|p| !p.dead));
        assert!(world.take_events().contains(&GameEvent::Collected));
    }

    #[test]
    fn test_ammo_pickup_arms_then_expires() {
        let mut world = World::new(13);
        world
            .pickups
            .push(Pickup::new(world.player.pos, PickupKind::Ammo));

        advance(&mut world, &InputState::default(), DT);
        assert!(world.power_up.is_some());

        advance(&mut world, &InputState::default(), 3000.0);
        assert!(world.power_up.is_some());
        advance(&mut world, &InputState::default(), 3000.0);
        assert!(world.power_up.is_none());
    }

    #[test]
    fn test_shard_magnet_steps_then_collects() {
        let mut world = World::new(14);
        world
            .shards
            .push(Shard::new(world.player.pos + Vec2::new(100.0, 0.0), 25));

        // 100 -> 78 -> 56 -> 34 (inside 22 + 18), collected on the 4th tick
        for _ in 0..3 {
            advance(&mut world, &InputState::default(), DT);
            assert_eq!(world.shards.len(), 1);
        }
        advance(&mut world, &InputState::default(), DT);
        assert!(world.shards.is_empty());
        assert_eq!(world.stats.experience, 25.0);
    }

    #[test]
    fn test_shard_outside_magnet_stays_put() {
        let mut world = World::new(15);
        let pos = world.player.pos + Vec2::new(200.0, 0.0);
        world.shards.push(Shard::new(pos, 25));
        for _ in 0..4 {
            advance(&mut world, &InputState::default(), DT);
        }
        assert_eq!(world.shards.len(), 1);
        assert_eq!(world.shards[0].pos, pos);
        assert_eq!(world.stats.experience, 0.0);
    }

    #[test]
    fn test_determinism_same_seed_same_run() {
        let mut a = World::new(777);
        let mut b = World::new(777);
        let input = InputState {
            right: true,
            up: true,
            ..Default::default()
        };
        for _ in 0..240 {
            advance(&mut a, &input, DT);
            advance(&mut b, &input, DT);
        }
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.stats.score, b.stats.score);
        assert_eq!(a.stats.elapsed_ms, b.stats.elapsed_ms);
        assert_eq!(a.take_events(), b.take_events());
    }

    #[test]
    fn test_long_run_leaves_no_dead_entities() {
        let mut world = World::new(4242);
        let input = InputState::default();
        for _ in 0..400 {
            advance(&mut world, &input, DT);
            assert!(world.enemies.iter().all(|e| !e.dead));
            assert!(world.projectiles.iter().all(|p| !p.dead));
            assert!(world.shards.iter().all(|s| !s.dead));
            assert!(world.pickups.iter().all(|p| !p.dead));
            assert!(world.particles.iter().all(|p| p.life > 0.0));
        }
    }

    proptest! {
        #[test]
        fn prop_spawn_probability_bounded(breach in 0u32..1000, boss in proptest::bool::ANY) {
            let p = spawn_probability(breach, boss);
            prop_assert!(p > 0.0);
            prop_assert!(p <= 0.25);
        }

        #[test]
        fn prop_runs_stay_sane(seed in 0u64..u64::MAX, ticks in 50usize..150) {
            let mut world = World::new(seed);
            let input = InputState { down: true, ..Default::default() };
            for _ in 0..ticks {
                advance(&mut world, &input, TICK_DT_MS);
            }
            prop_assert!(world.player.pos.is_finite());
            prop_assert!(world.stats.health <= world.stats.max_health);
            prop_assert!(world.breach_level <= MAX_BREACH_LEVEL);
            prop_assert!(world.enemies.iter().all(|e| e.body.pos.is_finite()));
            prop_assert!(world.enemies.iter().all(|e| !e.dead));
        }
    }
}
