use crate::types::{MonsterKind, Vec2};

/// Simulation period of one tick.
pub const TICK_MS: u64 = 100;

pub const FURIOUS_DURATION_MS: u64 = 3_000;
pub const FROZEN_DURATION_MS: u64 = 3_000;
pub const TX5_START_IDLE_MS: u64 = 5_000;

pub const VISITED_HISTORY_LEN: usize = 10;

/// Largest board a level may declare.
pub const MAX_GRID_CELLS: usize = 1 << 20;

pub const PILL_SCORE: i32 = 1;
pub const GOLD_SCORE: i32 = 5;
pub const MIN_COLLECTIBLES: usize = 2;

pub const DEFAULT_SEED: u32 = 30_006;
pub const DEFAULT_MAX_TICKS: u64 = 20_000;

/// Fixed maze of the original build, in standard tile characters.
pub const DEFAULT_MAZE: [&str; 11] = [
    "####################",
    "#oooo#oooogooo#oooo#",
    "#g##o#o######o#o##o#",
    "#o#oooooooiogoooo#o#",
    "#o#o##o##..##o##o#o#",
    "#oooooo#....#oooooo#",
    "#o#o##o######o##o#o#",
    "#o#oooooogioooooo#o#",
    "#i##o#o######o#o##o#",
    "#ooog#oooogooo#oooo#",
    "####################",
];

pub const DEFAULT_PAC_START: Vec2 = Vec2::new(10, 5);

pub fn default_monster_start(kind: MonsterKind) -> Vec2 {
    match kind {
        MonsterKind::Troll => Vec2::new(18, 1),
        MonsterKind::Tx5 => Vec2::new(1, 9),
        MonsterKind::Alien => Vec2::new(18, 9),
        MonsterKind::Orion => Vec2::new(1, 1),
        MonsterKind::Wizard => Vec2::new(18, 5),
    }
}
