//! Player preferences
//!
//! Persisted in LocalStorage; never part of run state.

use serde::{Deserialize, Serialize};

/// Audio/visual preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Effects volume (0.0 - 1.0)
    pub effects_volume: f32,
    /// Hard mute toggle
    pub muted: bool,
    /// Mute when the window loses focus
    pub mute_on_blur: bool,

    // === Visual effects ===
    /// Screen shake on damage
    pub screen_shake: bool,
    /// Scanline glitch post-processing
    pub glitch_fx: bool,

    // === Accessibility ===
    /// Reduced motion (minimize shake and flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.3,
            effects_volume: 1.0,
            muted: false,
            mute_on_blur: true,
            screen_shake: true,
            glitch_fx: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective glitch post-processing (respects reduced_motion)
    pub fn effective_glitch(&self) -> bool {
        self.glitch_fx && !self.reduced_motion
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "neon_breach_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
