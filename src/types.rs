use serde::{Deserialize, Serialize};

/// Grid coordinate. `y` grows downward, so NORTH is `y - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn neighbor(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// The eight compass points, clockwise from NORTH.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Fixed expansion order for every breadth-first search.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    fn index(self) -> i32 {
        match self {
            Direction::North => 0,
            Direction::NorthEast => 1,
            Direction::East => 2,
            Direction::SouthEast => 3,
            Direction::South => 4,
            Direction::SouthWest => 5,
            Direction::West => 6,
            Direction::NorthWest => 7,
        }
    }

    /// Rotates clockwise by `steps` eighths of a turn (negative is counter-clockwise).
    pub fn rotate(self, steps: i32) -> Self {
        Self::ALL[(self.index() + steps).rem_euclid(8) as usize]
    }

    pub fn turn_right(self) -> Self {
        self.rotate(2)
    }

    pub fn turn_left(self) -> Self {
        self.rotate(-2)
    }

    pub fn reverse(self) -> Self {
        self.rotate(4)
    }

    /// Eight-point direction from `from` to `to`, by the sign of each axis.
    pub fn toward(from: Vec2, to: Vec2) -> Option<Self> {
        let dx = (to.x - from.x).signum();
        let dy = (to.y - from.y).signum();
        Self::ALL.into_iter().find(|dir| dir.offset() == (dx, dy))
    }

    /// Four-point direction from `from` to `to`; the dominant axis wins and
    /// an exact diagonal resolves horizontally.
    pub fn toward_cardinal(from: Vec2, to: Vec2) -> Option<Self> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx == 0 && dy == 0 {
            return None;
        }
        if dx.abs() >= dy.abs() {
            Some(if dx > 0 { Direction::East } else { Direction::West })
        } else {
            Some(if dy > 0 {
                Direction::South
            } else {
                Direction::North
            })
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" | "north" => Some(Self::North),
            "down" | "south" => Some(Self::South),
            "left" | "west" => Some(Self::West),
            "right" | "east" => Some(Self::East),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Pill,
    Gold,
    Ice,
}

impl ItemKind {
    pub fn score(self) -> i32 {
        match self {
            ItemKind::Pill => crate::constants::PILL_SCORE,
            ItemKind::Gold => crate::constants::GOLD_SCORE,
            ItemKind::Ice => 0,
        }
    }

    /// Whether eating it counts toward clearing the level.
    pub fn is_collectible(self) -> bool {
        matches!(self, ItemKind::Pill | ItemKind::Gold)
    }

    pub fn log_label(self) -> &'static str {
        match self {
            ItemKind::Pill => "pills",
            ItemKind::Gold => "gold",
            ItemKind::Ice => "ice",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterKind {
    Troll,
    Tx5,
    Alien,
    Orion,
    Wizard,
}

impl MonsterKind {
    pub const SIMPLE_ROSTER: [MonsterKind; 2] = [MonsterKind::Troll, MonsterKind::Tx5];
    pub const MULTIVERSE_ROSTER: [MonsterKind; 5] = [
        MonsterKind::Troll,
        MonsterKind::Tx5,
        MonsterKind::Alien,
        MonsterKind::Orion,
        MonsterKind::Wizard,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MonsterKind::Troll => "Troll",
            MonsterKind::Tx5 => "TX5",
            MonsterKind::Alien => "Alien",
            MonsterKind::Orion => "Orion",
            MonsterKind::Wizard => "Wizard",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalColor {
    White,
    Yellow,
    DarkGold,
    DarkGray,
}

impl PortalColor {
    pub const ALL: [PortalColor; 4] = [
        PortalColor::White,
        PortalColor::Yellow,
        PortalColor::DarkGold,
        PortalColor::DarkGray,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PortalColor::White => "White",
            PortalColor::Yellow => "Yellow",
            PortalColor::DarkGold => "DarkGold",
            PortalColor::DarkGray => "DarkGray",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameVersion {
    Simple,
    #[default]
    Multiverse,
}

impl GameVersion {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "multiverse" => Some(Self::Multiverse),
            _ => None,
        }
    }

    pub fn items_affect_monsters(self) -> bool {
        self == GameVersion::Multiverse
    }

    pub fn roster(self) -> &'static [MonsterKind] {
        match self {
            GameVersion::Simple => &MonsterKind::SIMPLE_ROSTER,
            GameVersion::Multiverse => &MonsterKind::MULTIVERSE_ROSTER,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Win,
    Lose,
}

impl GameOutcome {
    pub fn title(self) -> &'static str {
        match self {
            GameOutcome::Win => "YOU WIN",
            GameOutcome::Lose => "GAME OVER",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterMode {
    Normal,
    Frozen,
    Furious,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub score: i32,
    #[serde(rename = "pillsEaten")]
    pub pills_eaten: usize,
    pub alive: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct MonsterView {
    pub id: String,
    pub kind: MonsterKind,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub mode: MonsterMode,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    ItemConsumed {
        kind: ItemKind,
        x: i32,
        y: i32,
    },
    Teleported {
        agent: String,
        x: i32,
        y: i32,
    },
    MonsterFurious {
        #[serde(rename = "monsterId")]
        monster_id: String,
    },
    MonsterFrozen {
        #[serde(rename = "monsterId")]
        monster_id: String,
    },
    PlayerCaught {
        #[serde(rename = "monsterId")]
        monster_id: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub player: PlayerView,
    pub monsters: Vec<MonsterView>,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: usize,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub outcome: Option<GameOutcome>,
    pub ticks: u64,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub score: i32,
    #[serde(rename = "pillsEaten")]
    pub pills_eaten: usize,
    #[serde(rename = "totalCollectibles")]
    pub total_collectibles: usize,
}
