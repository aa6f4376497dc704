//! Canvas2D render pass
//!
//! Draws the world back-to-front each frame, then applies the glitch
//! post-process: a displaced scanline band whose probability scales with
//! missing health and breach level, plus the red damage flash. The pass is
//! read-only with respect to the sim; cosmetic randomness (shake jitter,
//! scanline placement) comes from a dedicated stream so draw can never
//! perturb gameplay.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::palette;
use crate::settings::Settings;
use crate::sim::{Archetype, ParticleKind, World};

pub struct Renderer {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
    rng: Pcg32,
}

impl Renderer {
    /// Wrap a canvas; fails when no 2d context is available
    pub fn new(canvas: &HtmlCanvasElement, seed: u64) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self {
            ctx,
            width: canvas.width() as f64,
            height: canvas.height() as f64,
            rng: Pcg32::seed_from_u64(seed),
        })
    }

    /// Draw one frame
    pub fn draw(&mut self, world: &World, settings: &Settings) {
        self.ctx.save();

        if settings.effective_screen_shake() && world.screen_shake > 0.5 {
            let s = world.screen_shake as f64;
            let dx = (self.rng.random::<f64>() - 0.5) * s;
            let dy = (self.rng.random::<f64>() - 0.5) * s;
            self.ctx.translate(dx, dy).ok();
        }

        self.ctx.set_fill_style_str(palette::BACKGROUND);
        self.ctx.fill_rect(0.0, 0.0, self.width, self.height);

        self.draw_particles(world);
        self.draw_shards(world);
        self.draw_enemies(world);
        self.draw_projectiles(world);
        self.draw_pickups(world);
        self.draw_player(world);

        self.ctx.restore();

        if settings.effective_glitch() {
            self.apply_glitch(world);
        }
        if world.damage_flash > 0.1 {
            let alpha = (world.damage_flash * 0.2) as f64;
            self.ctx
                .set_fill_style_str(&format!("rgba({}, {alpha:.3})", palette::DAMAGE_FLASH));
            self.ctx.fill_rect(0.0, 0.0, self.width, self.height);
        }
    }

    fn draw_particles(&self, world: &World) {
        let ctx = &self.ctx;
        for p in &world.particles {
            ctx.set_global_alpha((p.life / p.max_life) as f64);
            let (x, y, size) = (p.pos.x as f64, p.pos.y as f64, p.size as f64);
            match p.kind {
                ParticleKind::Pixel => {
                    ctx.set_fill_style_str(p.color);
                    ctx.fill_rect(x, y, size, size);
                }
                ParticleKind::Square => {
                    ctx.set_stroke_style_str(p.color);
                    ctx.set_line_width(2.0);
                    ctx.stroke_rect(x, y, size, size);
                }
                ParticleKind::Line => {
                    ctx.set_stroke_style_str(p.color);
                    ctx.set_line_width(1.0);
                    ctx.begin_path();
                    ctx.move_to(x, y);
                    ctx.line_to(x - p.vel.x as f64 * 2.0, y - p.vel.y as f64 * 2.0);
                    ctx.stroke();
                }
            }
        }
        ctx.set_global_alpha(1.0);
    }

    fn draw_shards(&self, world: &World) {
        let ctx = &self.ctx;
        ctx.set_fill_style_str(palette::SHARD);
        for s in &world.shards {
            ctx.fill_rect(s.pos.x as f64 - 4.0, s.pos.y as f64 - 4.0, 8.0, 8.0);
        }
    }

    fn draw_enemies(&mut self, world: &World) {
        for e in &world.enemies {
            let ctx = &self.ctx;
            let flashing = e.hit_flash > 0.0;
            let color = if flashing {
                palette::HIT_FLASH
            } else {
                e.archetype.color()
            };
            let r = e.body.radius as f64;

            ctx.save();
            // Glitch jitter shifts the sprite, never the collision body
            let jx = (self.rng.random::<f64>() - 0.5) * e.glitch as f64;
            let jy = (self.rng.random::<f64>() - 0.5) * e.glitch as f64;
            ctx.translate(e.body.pos.x as f64 + jx, e.body.pos.y as f64 + jy)
                .ok();

            ctx.set_stroke_style_str(color);
            ctx.set_line_width(if e.archetype.is_boss() { 8.0 } else { 3.0 });
            ctx.set_shadow_blur(if flashing { 45.0 } else { 25.0 });
            ctx.set_shadow_color(color);

            match e.archetype {
                Archetype::Boss => {
                    ctx.rotate(e.rotation as f64 * 0.2).ok();
                    for _ in 0..4 {
                        ctx.rotate(std::f64::consts::FRAC_PI_2).ok();
                        ctx.stroke_rect(-r, -r, r * 2.0, r * 2.0);
                        ctx.stroke_rect(-r * 0.7, -r * 0.7, r * 1.4, r * 1.4);
                    }
                    ctx.set_fill_style_str(color);
                    ctx.set_global_alpha(0.2);
                    ctx.fill_rect(-r, -r, r * 2.0, r * 2.0);
                    ctx.set_global_alpha(1.0);
                }
                Archetype::Hollow => {
                    ctx.rotate(e.rotation as f64).ok();
                    ctx.stroke_rect(-r, -r, r * 2.0, r * 2.0);
                }
                _ => {
                    ctx.begin_path();
                    ctx.arc(0.0, 0.0, r, 0.0, std::f64::consts::TAU).ok();
                    ctx.stroke();
                }
            }
            ctx.restore();

            self.draw_health_bar(e, color);
        }
    }

    fn draw_health_bar(&self, e: &crate::sim::Enemy, color: &str) {
        let ctx = &self.ctx;
        let width = if e.archetype.is_boss() { 200.0 } else { 48.0 };
        let x = e.body.pos.x as f64 - width / 2.0;
        let y = (e.body.pos.y - e.body.radius - 20.0) as f64;
        let frac = (e.hp / e.max_hp).clamp(0.0, 1.0) as f64;

        ctx.set_shadow_blur(0.0);
        ctx.set_fill_style_str(palette::HEALTH_BAR_BACK);
        ctx.fill_rect(x, y, width, 6.0);
        ctx.set_fill_style_str(color);
        ctx.fill_rect(x, y, width * frac, 6.0);
    }

    fn draw_projectiles(&self, world: &World) {
        let ctx = &self.ctx;
        for p in &world.projectiles {
            ctx.save();
            ctx.translate(p.body.pos.x as f64, p.body.pos.y as f64).ok();
            ctx.rotate(p.body.vel.y.atan2(p.body.vel.x) as f64).ok();
            ctx.set_fill_style_str(p.color);
            ctx.set_shadow_blur(10.0);
            ctx.set_shadow_color(p.color);
            ctx.fill_rect(-10.0, -2.0, 20.0, 4.0);
            ctx.restore();
        }
    }

    fn draw_pickups(&self, world: &World) {
        let ctx = &self.ctx;
        let spin = (world.stats.elapsed_ms / 500.0) as f64;
        for pickup in &world.pickups {
            let color = pickup.kind.color();
            ctx.save();
            ctx.translate(pickup.pos.x as f64, pickup.pos.y as f64).ok();
            ctx.rotate(spin).ok();
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(2.0);
            ctx.stroke_rect(-8.0, -8.0, 16.0, 16.0);
            ctx.restore();
        }
    }

    fn draw_player(&self, world: &World) {
        let ctx = &self.ctx;
        let (x, y) = (world.player.pos.x as f64, world.player.pos.y as f64);
        let r = world.player.radius as f64;

        ctx.set_shadow_blur(10.0);
        ctx.set_shadow_color(palette::PLAYER_CORE);
        ctx.set_fill_style_str(palette::PLAYER_CORE);
        ctx.begin_path();
        ctx.arc(x, y, r, 0.0, std::f64::consts::TAU).ok();
        ctx.fill();

        ctx.set_stroke_style_str(palette::PLAYER_RING);
        ctx.set_line_width(2.0);
        ctx.begin_path();
        ctx.arc(x, y, r + 6.0, 0.0, std::f64::consts::TAU).ok();
        ctx.stroke();
        ctx.set_shadow_blur(0.0);
    }

    /// Displace a horizontal band of pixels; worse health, worse signal
    fn apply_glitch(&mut self, world: &World) {
        let missing = ((world.stats.max_health - world.stats.health)
            / world.stats.max_health)
            .clamp(0.0, 1.0);
        let intensity = (missing + world.breach_level as f32 * 0.05) as f64;

        if self.rng.random::<f64>() < intensity * 0.2 {
            let band_h = self.rng.random::<f64>() * 20.0 + 5.0;
            let y = self.rng.random::<f64>() * (self.height - band_h);
            let shift = (self.rng.random::<f64>() - 0.5) * 50.0 * intensity;
            if let Ok(band) = self.ctx.get_image_data(0.0, y, self.width, band_h) {
                self.ctx.put_image_data(&band, shift, y).ok();
            }
        }
    }
}
