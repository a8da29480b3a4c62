use std::collections::BTreeMap;

use crate::constants::MIN_COLLECTIBLES;
use crate::items::ItemRegistry;
use crate::pathfinding::reachable_cells;
use crate::tiles::{RawTileGrid, TileKind};
use crate::types::{ItemKind, MonsterKind, PortalColor, Vec2};
use crate::world::{GameMap, GridTopology};

/// Cells as the editor shows them: 1-based, `(x,y)`, joined by `; `.
pub fn format_cells(cells: &[Vec2]) -> String {
    cells
        .iter()
        .map(|cell| format!("({},{})", cell.x + 1, cell.y + 1))
        .collect::<Vec<_>>()
        .join("; ")
}

/// One broken rule of a map, with every offending cell.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapDiagnostic {
    #[error("no start for PacMan")]
    NoPacStart,
    #[error("more than one start for Pacman: {}", format_cells(.0))]
    MultiplePacStarts(Vec<Vec2>),
    #[error("portal {} count is not 2: {}", .color.name(), format_cells(.cells))]
    PortalCount {
        color: PortalColor,
        cells: Vec<Vec2>,
    },
    #[error("less than 2 Gold or Pill")]
    TooFewCollectibles { found: usize },
    #[error("Gold not accessible: {}", format_cells(.0))]
    GoldUnreachable(Vec<Vec2>),
    #[error("Pill not accessible: {}", format_cells(.0))]
    PillUnreachable(Vec<Vec2>),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("level {level} is not playable ({} problem(s))", .diagnostics.len())]
pub struct ValidationReport {
    pub level: String,
    pub diagnostics: Vec<MapDiagnostic>,
}

impl ValidationReport {
    /// `Level <name> - <problem>` per diagnostic.
    pub fn lines(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|diagnostic| format!("Level {} - {}", self.level, diagnostic))
            .collect()
    }
}

/// Certifies a raw grid as playable and builds the map from it.
#[derive(Clone, Debug)]
pub struct MapValidator {
    level: String,
}

impl MapValidator {
    /// `level` names the map in diagnostics, usually its file name.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
        }
    }

    pub fn validate(&self, grid: &RawTileGrid) -> Result<GameMap, ValidationReport> {
        let mut topology = GridTopology::from_grid(grid);
        let mut pills = ItemRegistry::new(ItemKind::Pill);
        let mut gold = ItemRegistry::new(ItemKind::Gold);
        let mut ice = ItemRegistry::new(ItemKind::Ice);
        let mut pac_starts = Vec::new();
        let mut monster_starts: Vec<(MonsterKind, Vec2)> = Vec::new();
        let mut portals: BTreeMap<PortalColor, Vec<Vec2>> = BTreeMap::new();

        for (pos, tile) in grid.cells() {
            match tile {
                TileKind::Path | TileKind::Wall => {}
                TileKind::Pill => {
                    pills.place(pos);
                }
                TileKind::Gold => {
                    gold.place(pos);
                }
                TileKind::Ice => {
                    ice.place(pos);
                }
                TileKind::PacStart => pac_starts.push(pos),
                TileKind::MonsterStart(kind) => monster_starts.push((kind, pos)),
                TileKind::Portal(color) => portals.entry(color).or_default().push(pos),
            }
        }

        let mut diagnostics = Vec::new();

        let pac_start = match pac_starts.as_slice() {
            [] => {
                diagnostics.push(MapDiagnostic::NoPacStart);
                None
            }
            [single] => Some(*single),
            _ => {
                diagnostics.push(MapDiagnostic::MultiplePacStarts(pac_starts.clone()));
                None
            }
        };

        for color in PortalColor::ALL {
            let cells = portals.remove(&color).unwrap_or_default();
            match cells.as_slice() {
                [] => {}
                [a, b] => {
                    topology.link_portals(*a, *b);
                }
                _ => diagnostics.push(MapDiagnostic::PortalCount { color, cells }),
            }
        }

        let found = pills.len() + gold.len();
        if found < MIN_COLLECTIBLES {
            diagnostics.push(MapDiagnostic::TooFewCollectibles { found });
        }

        if let Some(start) = pac_start {
            let reachable = reachable_cells(&topology, start);
            let stranded = |registry: &ItemRegistry| -> Vec<Vec2> {
                registry
                    .locations()
                    .into_iter()
                    .filter(|cell| !reachable.contains(cell))
                    .collect()
            };
            let gold_cut_off = stranded(&gold);
            if !gold_cut_off.is_empty() {
                diagnostics.push(MapDiagnostic::GoldUnreachable(gold_cut_off));
            }
            let pills_cut_off = stranded(&pills);
            if !pills_cut_off.is_empty() {
                diagnostics.push(MapDiagnostic::PillUnreachable(pills_cut_off));
            }
        }

        match pac_start {
            Some(start) if diagnostics.is_empty() => Ok(GameMap::from_parts(
                topology,
                pills,
                gold,
                ice,
                start,
                monster_starts,
            )),
            _ => Err(ValidationReport {
                level: self.level.clone(),
                diagnostics,
            }),
        }
    }
}
