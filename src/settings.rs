use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    default_monster_start, DEFAULT_MAX_TICKS, DEFAULT_PAC_START, DEFAULT_SEED, TICK_MS,
};
use crate::types::{GameVersion, MonsterKind, Vec2};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tick_ms must be at least 1")]
    ZeroTick,
}

/// Which items the auto-pilot considers when looking for the closest one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosestItemMode {
    /// Uneaten pills and gold, reached by breadth-first steps.
    #[default]
    SkipConsumed,
    /// Every item ever placed, eaten or not, approached by compass heading.
    IncludeConsumed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub seed: u32,
    pub version: GameVersion,
    pub auto: bool,
    pub player_moves: Option<String>,
    pub targeting: ClosestItemMode,
    pub pac_start: Vec2,
    pub monster_starts: HashMap<MonsterKind, Vec2>,
    pub pill_locations: Option<Vec<Vec2>>,
    pub gold_locations: Option<Vec<Vec2>>,
    pub tick_ms: u64,
    pub max_ticks: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            version: GameVersion::default(),
            auto: false,
            player_moves: None,
            targeting: ClosestItemMode::default(),
            pac_start: DEFAULT_PAC_START,
            monster_starts: HashMap::new(),
            pill_locations: None,
            gold_locations: None,
            tick_ms: TICK_MS,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl GameSettings {
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw)?;
        if settings.tick_ms == 0 {
            return Err(SettingsError::ZeroTick);
        }
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Start cell of an archetype in the fixed maze.
    pub fn monster_start(&self, kind: MonsterKind) -> Vec2 {
        self.monster_starts
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_monster_start(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = GameSettings::from_json("{}").expect("defaults");
        assert_eq!(settings, GameSettings::default());
        assert_eq!(settings.tick_ms, TICK_MS);
        assert_eq!(
            settings.monster_start(MonsterKind::Troll),
            default_monster_start(MonsterKind::Troll)
        );
    }

    #[test]
    fn fields_override_individually() {
        let settings = GameSettings::from_json(
            r#"{
                "seed": 7,
                "version": "simple",
                "auto": true,
                "player_moves": "R,M,M,L",
                "targeting": "include_consumed",
                "monster_starts": { "tx5": { "x": 3, "y": 4 } },
                "gold_locations": [{ "x": 1, "y": 1 }]
            }"#,
        )
        .expect("valid settings");
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.version, GameVersion::Simple);
        assert!(settings.auto);
        assert_eq!(settings.targeting, ClosestItemMode::IncludeConsumed);
        assert_eq!(settings.monster_start(MonsterKind::Tx5), Vec2::new(3, 4));
        assert_eq!(settings.gold_locations, Some(vec![Vec2::new(1, 1)]));
        assert_eq!(settings.pill_locations, None);
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(matches!(
            GameSettings::from_json(r#"{ "seed": "abc" }"#),
            Err(SettingsError::Json(_))
        ));
        assert!(matches!(
            GameSettings::load(Path::new("/definitely/not/here.json")),
            Err(SettingsError::Io { .. })
        ));
    }

    #[test]
    fn zero_tick_period_is_rejected() {
        assert!(matches!(
            GameSettings::from_json(r#"{ "tick_ms": 0 }"#),
            Err(SettingsError::ZeroTick)
        ));
        let path = std::env::temp_dir().join(format!(
            "torusverse-settings-zero-tick-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "tick_ms": 0 }"#).expect("write settings");
        let loaded = GameSettings::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(loaded, Err(SettingsError::ZeroTick)));
        assert_eq!(
            GameSettings::from_json(r#"{ "tick_ms": 1 }"#)
                .expect("one millisecond is fine")
                .tick_ms,
            1
        );
    }
}
