//! Audio cues using the Web Audio API
//!
//! Procedurally generated oscillator blips - no external files needed.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

/// Sound cue types, mapped from game events by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// A weapon fired
    Shoot,
    /// A projectile connected
    Hit,
    /// Shard or pickup collected
    Collect,
    /// Level-up fanfare
    LevelUp,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    effects_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context; the game plays on silently
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.3,
            effects_volume: 1.0,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set effects volume (0.0 - 1.0)
    pub fn set_effects_volume(&mut self, vol: f32) {
        self.effects_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.effects_volume
        }
    }

    /// Play a sound cue
    pub fn play(&self, cue: SoundCue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match cue {
            SoundCue::Shoot => self.play_shoot(ctx, vol),
            SoundCue::Hit => self.play_hit(ctx, vol),
            SoundCue::Collect => self.play_collect(ctx, vol),
            SoundCue::LevelUp => self.play_level_up(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Shoot - short square zap falling 800 -> 100 Hz
    fn play_shoot(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 800.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.1, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.1)
            .ok();
        osc.frequency().set_value_at_time(800.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(100.0, t + 0.1)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.12).ok();
    }

    /// Hit - sawtooth crunch falling 150 -> 40 Hz
    fn play_hit(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 150.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(150.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(40.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.22).ok();
    }

    /// Collect - bright sine chirp rising 1200 -> 2400 Hz
    fn play_collect(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 1200.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.1, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.05)
            .ok();
        osc.frequency().set_value_at_time(1200.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(2400.0, t + 0.05)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.08).ok();
    }

    /// Level up - ascending A-major arpeggio
    fn play_level_up(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [440.0, 554.37, 659.25, 880.0].iter().enumerate() {
            let delay = i as f64 * 0.1;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(0.01, t).ok();
                gain.gain()
                    .linear_ramp_to_value_at_time(vol * 0.3, t + 0.05)
                    .ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.35).ok();
            }
        }
    }
}
