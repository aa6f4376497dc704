//! Kernel patches: the level-up upgrade model
//!
//! Patches arrive from an external generator as JSON; the serde shapes here
//! mirror that wire format. Application happens between ticks while the
//! world is paused, so nothing here touches the frame loop.

use serde::{Deserialize, Serialize};

use super::state::{Weapon, WeaponKind, World};

/// Optional stat payload carried on the wire
///
/// Only present for documentation and forward compatibility: application
/// is deliberately narrow (see `World::apply_patch`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBoost {
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub health: Option<f32>,
    #[serde(default)]
    pub magnet: Option<f32>,
    #[serde(default)]
    pub crit: Option<f32>,
}

/// What a patch does, tagged `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PatchKind {
    #[serde(rename = "WEAPON")]
    Weapon {
        #[serde(rename = "weaponType")]
        weapon: WeaponKind,
    },
    #[serde(rename = "STAT")]
    Stat {
        #[serde(rename = "statBoost", default)]
        boost: StatBoost,
    },
}

/// One selectable upgrade option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelPatch {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: PatchKind,
}

/// The fixed option set used when no generator response is available
pub fn fallback_patches() -> Vec<KernelPatch> {
    vec![
        KernelPatch {
            id: "f1".into(),
            name: "Buffer Overflow".into(),
            description: "Overclocks your movement systems.".into(),
            kind: PatchKind::Stat {
                boost: StatBoost {
                    speed: Some(0.1),
                    ..Default::default()
                },
            },
        },
        KernelPatch {
            id: "f2".into(),
            name: "Firewall Expansion".into(),
            description: "Upgrades the perimeter shields.".into(),
            kind: PatchKind::Weapon {
                weapon: WeaponKind::FirewallRing,
            },
        },
        KernelPatch {
            id: "f3".into(),
            name: "Logic Recursion".into(),
            description: "Increases collection range.".into(),
            kind: PatchKind::Stat {
                boost: StatBoost {
                    magnet: Some(20.0),
                    ..Default::default()
                },
            },
        },
    ]
}

impl World {
    /// Apply the player's chosen patch
    ///
    /// Weapon patches level an owned weapon (x1.4 damage, x0.8 cooldown) or
    /// unlock the kind at baseline. Stat patches grant a flat +0.5 speed;
    /// the `StatBoost` payload is wire-only and not interpreted.
    pub fn apply_patch(&mut self, patch: &KernelPatch) {
        log::info!("applying patch {} ({})", patch.id, patch.name);
        match &patch.kind {
            PatchKind::Weapon { weapon } => {
                if let Some(owned) = self.weapons.iter_mut().find(|w| w.kind == *weapon) {
                    owned.upgrade();
                } else {
                    self.weapons.push(Weapon::unlocked(*weapon));
                }
            }
            PatchKind::Stat { .. } => {
                self.player_stats.speed += 0.5;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapon_patch(weapon: WeaponKind) -> KernelPatch {
        KernelPatch {
            id: "t1".into(),
            name: "test".into(),
            description: String::new(),
            kind: PatchKind::Weapon { weapon },
        }
    }

    #[test]
    fn test_weapon_patch_levels_owned_weapon() {
        let mut world = World::new(1);
        world.apply_patch(&weapon_patch(WeaponKind::DataStream));
        let w = &world.weapons[0];
        assert_eq!(w.level, 2);
        assert!((w.damage - 21.0).abs() < 1e-4);
        assert!((w.cooldown_ms - 480.0).abs() < 1e-4);
        assert_eq!(world.weapons.len(), 1);
    }

    #[test]
    fn test_weapon_patch_unlocks_new_kind() {
        let mut world = World::new(2);
        world.apply_patch(&weapon_patch(WeaponKind::FirewallRing));
        assert_eq!(world.weapons.len(), 2);
        let w = &world.weapons[1];
        assert_eq!(w.kind, WeaponKind::FirewallRing);
        assert_eq!(w.level, 1);
        assert_eq!(w.cooldown_ms, 1000.0);
        assert_eq!(w.damage, 20.0);
    }

    #[test]
    fn test_stat_patch_grants_flat_speed() {
        let mut world = World::new(3);
        // Even a magnet-flavored payload applies the fixed speed bump
        world.apply_patch(&fallback_patches()[2]);
        assert_eq!(world.player_stats.speed, 6.5);
        assert_eq!(world.player_stats.magnet_radius, 150.0);
    }

    #[test]
    fn test_fallback_set_shape() {
        let patches = fallback_patches();
        assert_eq!(patches.len(), 3);
        let mut ids: Vec<&str> = patches.iter().map(|p| p.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert!(matches!(
            patches[1].kind,
            PatchKind::Weapon {
                weapon: WeaponKind::FirewallRing
            }
        ));
    }

    #[test]
    fn test_wire_format_weapon() {
        let json = r#"{
            "id": "p7",
            "name": "Neural Lance",
            "description": "Pierces the noise floor.",
            "type": "WEAPON",
            "weaponType": "NEURAL_SPIKE"
        }"#;
        let patch: KernelPatch = serde_json::from_str(json).unwrap();
        assert_eq!(
            patch.kind,
            PatchKind::Weapon {
                weapon: WeaponKind::NeuralSpike
            }
        );
    }

    #[test]
    fn test_wire_format_stat_with_and_without_payload() {
        let with: KernelPatch = serde_json::from_str(
            r#"{"id":"s1","name":"x","description":"y","type":"STAT","statBoost":{"speed":0.1}}"#,
        )
        .unwrap();
        assert_eq!(
            with.kind,
            PatchKind::Stat {
                boost: StatBoost {
                    speed: Some(0.1),
                    ..Default::default()
                }
            }
        );

        let without: KernelPatch = serde_json::from_str(
            r#"{"id":"s2","name":"x","description":"y","type":"STAT"}"#,
        )
        .unwrap();
        assert_eq!(
            without.kind,
            PatchKind::Stat {
                boost: StatBoost::default()
            }
        );
    }
}
