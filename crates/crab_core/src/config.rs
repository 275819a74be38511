//! Author-time configuration for the AI and the entity layer.
//!
//! Both structs deserialize from RON. Values are whole units, whole
//! seconds or milliseconds; accessors convert them to [`Fixed`] so no float
//! ever reaches the simulation.
//!
//! # Example RON
//!
//! ```ron
//! AiConfig(
//!     stage: Start,
//!     build_order: [Armoury, House, Tower],
//!     costs: {
//!         Armoury: (wood: 30, stone: 20),
//!         House: (wood: 30, stone: 10),
//!         Tower: (wood: 20, stone: 40),
//!     },
//!     default_ratio: (wood: 2, stone: 1),
//!     zones: (danger_distance: 10, warning_distance: 25, classify_warning_band: false),
//!     squad_size: 4,
//!     defense_squads: 1,
//!     slot_distance: 6,
//!     slot_clearance: 2,
//!     weapon_cycle: [Spear, Hammer, Bow, Shield],
//!     weapon_interval_ms: 5000,
//!     siege_interval_ms: 20000,
//!     arm_workers: true,
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{BuildingKind, Cost, CraftItem, WeaponKind};
use crate::math::Fixed;

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Values parsed but do not make sense together.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Coarse game phase. Stored for reference, not consulted by any manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStage {
    /// Opening.
    #[default]
    Start,
    /// Middle game.
    Mid,
    /// End game.
    End,
}

/// Wood:stone worker ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    /// Wood share.
    pub wood: u32,
    /// Stone share.
    pub stone: u32,
}

impl Ratio {
    /// The ratio as a single fixed-point number (wood / stone).
    #[must_use]
    pub fn as_fixed(&self) -> Fixed {
        if self.stone == 0 {
            return Fixed::from_num(self.wood.max(1));
        }
        Fixed::from_num(self.wood) / Fixed::from_num(self.stone)
    }
}

/// Distance bands around an owned base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Enemies closer than this are in the danger zone.
    pub danger_distance: i32,
    /// Outer edge of the warning zone.
    pub warning_distance: i32,
    /// Classify enemies between the two thresholds as warning.
    ///
    /// Off by default: the classic check chain never reaches the warning
    /// band, so enemies there stay in neither set.
    #[serde(default)]
    pub classify_warning_band: bool,
}

impl ZoneConfig {
    /// Danger threshold in world units.
    #[must_use]
    pub fn danger(&self) -> Fixed {
        Fixed::from_num(self.danger_distance)
    }

    /// Warning threshold in world units.
    #[must_use]
    pub fn warning(&self) -> Fixed {
        Fixed::from_num(self.warning_distance)
    }
}

/// Everything the AI reads once at start-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Game stage label.
    #[serde(default)]
    pub stage: GameStage,
    /// Buildings to construct, in order.
    pub build_order: Vec<BuildingKind>,
    /// Price of each building kind.
    pub costs: BTreeMap<BuildingKind, Cost>,
    /// Worker ratio used when the current goal does not imply one.
    pub default_ratio: Ratio,
    /// Danger/warning thresholds.
    pub zones: ZoneConfig,
    /// Members per squad.
    pub squad_size: usize,
    /// Squads sent against the first danger-zone enemy.
    pub defense_squads: usize,
    /// Distance from the base to each of the eight build slots.
    pub slot_distance: i32,
    /// A slot is occupied if a building or site stands within this distance.
    pub slot_clearance: i32,
    /// Weapon types produced, in cycle order.
    pub weapon_cycle: Vec<WeaponKind>,
    /// Stock of each weapon type the AI aims to keep in the armoury.
    #[serde(default = "default_weapon_capacity")]
    pub weapon_capacity: u32,
    /// Milliseconds between weapon requests.
    pub weapon_interval_ms: u32,
    /// Milliseconds between siege weapon requests.
    pub siege_interval_ms: u32,
    /// Hand stocked weapons to spare workers.
    #[serde(default = "default_true")]
    pub arm_workers: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_weapon_capacity() -> u32 {
    3
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            stage: GameStage::Start,
            build_order: vec![
                BuildingKind::Armoury,
                BuildingKind::House,
                BuildingKind::Workshop,
                BuildingKind::Tower,
                BuildingKind::Tower,
                BuildingKind::Wall,
            ],
            costs: default_costs(),
            default_ratio: Ratio { wood: 2, stone: 1 },
            zones: ZoneConfig {
                danger_distance: 10,
                warning_distance: 25,
                classify_warning_band: false,
            },
            squad_size: 4,
            defense_squads: 1,
            slot_distance: 6,
            slot_clearance: 2,
            weapon_cycle: WeaponKind::CYCLE.to_vec(),
            weapon_capacity: default_weapon_capacity(),
            weapon_interval_ms: 5000,
            siege_interval_ms: 20000,
            arm_workers: true,
        }
    }
}

fn default_costs() -> BTreeMap<BuildingKind, Cost> {
    [
        (BuildingKind::Castle, Cost::new(100, 100)),
        (BuildingKind::Armoury, Cost::new(30, 20)),
        (BuildingKind::Workshop, Cost::new(40, 30)),
        (BuildingKind::Tower, Cost::new(20, 40)),
        (BuildingKind::Wall, Cost::new(0, 20)),
        (BuildingKind::House, Cost::new(30, 10)),
    ]
    .into_iter()
    .collect()
}

impl AiConfig {
    /// Load a config from a RON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a config from a RON string and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values are usable together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zones.danger_distance < 0 || self.zones.danger_distance >= self.zones.warning_distance {
            return Err(ConfigError::Invalid(format!(
                "danger distance {} must be non-negative and below warning distance {}",
                self.zones.danger_distance, self.zones.warning_distance
            )));
        }
        if self.squad_size == 0 {
            return Err(ConfigError::Invalid("squad size must be positive".into()));
        }
        if self.default_ratio.wood == 0 || self.default_ratio.stone == 0 {
            return Err(ConfigError::Invalid("ratio shares must be positive".into()));
        }
        if self.weapon_cycle.is_empty() {
            return Err(ConfigError::Invalid("weapon cycle is empty".into()));
        }
        if self.slot_distance <= 0 || self.slot_clearance <= 0 {
            return Err(ConfigError::Invalid(
                "slot distance and clearance must be positive".into(),
            ));
        }
        if let Some(kind) = self
            .build_order
            .iter()
            .find(|kind| !self.costs.contains_key(kind))
        {
            return Err(ConfigError::Invalid(format!("no cost for {kind:?}")));
        }
        Ok(())
    }

    /// Price of `kind`. Unlisted kinds are free.
    #[must_use]
    pub fn cost_of(&self, kind: BuildingKind) -> Cost {
        self.costs.get(&kind).copied().unwrap_or_default()
    }

    /// Weapon request interval in seconds.
    #[must_use]
    pub fn weapon_interval(&self) -> Fixed {
        millis(self.weapon_interval_ms)
    }

    /// Siege request interval in seconds.
    #[must_use]
    pub fn siege_interval(&self) -> Fixed {
        millis(self.siege_interval_ms)
    }
}

fn millis(ms: u32) -> Fixed {
    Fixed::from_num(ms) / Fixed::from_num(1000)
}

/// Tuning for the entity layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldRules {
    /// Crab speed in units per second.
    pub crab_speed: i32,
    /// Hit points of a new crab.
    pub crab_health: i32,
    /// Hit points of a finished building.
    pub building_health: i32,
    /// Hit points of a construction site.
    pub ghost_health: i32,
    /// Distance at which crabs can gather, build, enter or pick up.
    pub interaction_range: i32,
    /// Distance at which crabs can hit a target.
    pub attack_range: i32,
    /// Units gathered per second.
    pub gather_per_second: i32,
    /// Damage per second of an armed crab.
    pub armed_damage_per_second: i32,
    /// Damage per second of an unarmed crab.
    pub unarmed_damage_per_second: i32,
    /// Seconds of work to finish each building kind.
    pub build_seconds: BTreeMap<BuildingKind, u32>,
    /// Build time for kinds missing from `build_seconds`.
    pub default_build_seconds: u32,
    /// Seconds to craft one hand weapon.
    pub weapon_craft_seconds: u32,
    /// Seconds to craft one siege weapon.
    pub siege_craft_seconds: u32,
    /// Maximum stock of each weapon type per armoury.
    pub armoury_capacity: u32,
}

impl Default for WorldRules {
    fn default() -> Self {
        Self {
            crab_speed: 4,
            crab_health: 20,
            building_health: 200,
            ghost_health: 50,
            interaction_range: 2,
            attack_range: 2,
            gather_per_second: 2,
            armed_damage_per_second: 5,
            unarmed_damage_per_second: 1,
            build_seconds: [(BuildingKind::Castle, 30), (BuildingKind::Wall, 4)]
                .into_iter()
                .collect(),
            default_build_seconds: 8,
            weapon_craft_seconds: 4,
            siege_craft_seconds: 12,
            armoury_capacity: 3,
        }
    }
}

impl WorldRules {
    /// Seconds of construction needed for `kind`.
    #[must_use]
    pub fn build_time(&self, kind: BuildingKind) -> Fixed {
        Fixed::from_num(
            self.build_seconds
                .get(&kind)
                .copied()
                .unwrap_or(self.default_build_seconds),
        )
    }

    /// Seconds to craft `item`.
    #[must_use]
    pub fn craft_time(&self, item: CraftItem) -> Fixed {
        match item {
            CraftItem::Weapon(_) => Fixed::from_num(self.weapon_craft_seconds),
            CraftItem::SiegeWeapon => Fixed::from_num(self.siege_craft_seconds),
        }
    }
}
