use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::MAX_GRID_CELLS;
use crate::types::{MonsterKind, PortalColor, Vec2};

#[derive(Debug, thiserror::Error)]
pub enum MapLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed level document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map has no tiles")]
    Empty,
    #[error("invalid map size {width}x{height}")]
    InvalidSize { width: i64, height: i64 },
    #[error("row {row} has {actual} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile character {ch:?} at ({x},{y})")]
    UnknownTileChar { ch: char, x: i32, y: i32 },
    #[error("unknown tile name {name:?} at ({x},{y})")]
    UnknownTileName { name: String, x: i32, y: i32 },
    #[error("cell ({x},{y}) lies outside the declared level size")]
    CellOutOfBounds { x: i32, y: i32 },
    #[error("catalog key {0:?} must be exactly one character")]
    BadCatalogKey(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    Path,
    Wall,
    Pill,
    Gold,
    Ice,
    PacStart,
    MonsterStart(MonsterKind),
    Portal(PortalColor),
}

impl TileKind {
    pub const ALL: [TileKind; 15] = [
        TileKind::Path,
        TileKind::Wall,
        TileKind::Pill,
        TileKind::Gold,
        TileKind::Ice,
        TileKind::PacStart,
        TileKind::MonsterStart(MonsterKind::Troll),
        TileKind::MonsterStart(MonsterKind::Tx5),
        TileKind::MonsterStart(MonsterKind::Alien),
        TileKind::MonsterStart(MonsterKind::Orion),
        TileKind::MonsterStart(MonsterKind::Wizard),
        TileKind::Portal(PortalColor::White),
        TileKind::Portal(PortalColor::Yellow),
        TileKind::Portal(PortalColor::DarkGold),
        TileKind::Portal(PortalColor::DarkGray),
    ];

    /// Name used by editor-authored level documents.
    pub fn tile_name(self) -> &'static str {
        match self {
            TileKind::Path => "PathTile",
            TileKind::Wall => "WallTile",
            TileKind::Pill => "PillTile",
            TileKind::Gold => "GoldTile",
            TileKind::Ice => "IceTile",
            TileKind::PacStart => "PacTile",
            TileKind::MonsterStart(MonsterKind::Troll) => "TrollTile",
            TileKind::MonsterStart(MonsterKind::Tx5) => "Tx5Tile",
            TileKind::MonsterStart(MonsterKind::Alien) => "AlienTile",
            TileKind::MonsterStart(MonsterKind::Orion) => "OrionTile",
            TileKind::MonsterStart(MonsterKind::Wizard) => "WizardTile",
            TileKind::Portal(PortalColor::White) => "PortalWhiteTile",
            TileKind::Portal(PortalColor::Yellow) => "PortalYellowTile",
            TileKind::Portal(PortalColor::DarkGold) => "PortalDarkGoldTile",
            TileKind::Portal(PortalColor::DarkGray) => "PortalDarkGrayTile",
        }
    }

    pub fn from_tile_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.tile_name().eq_ignore_ascii_case(trimmed))
    }

    pub fn is_walkable(self) -> bool {
        self != TileKind::Wall
    }
}

/// Character encoding of tiles, built once at startup and handed to loaders.
#[derive(Clone, Debug)]
pub struct TileCatalog {
    by_char: BTreeMap<char, TileKind>,
    by_kind: HashMap<TileKind, char>,
    default_tile: TileKind,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(rename = "defaultTile", default)]
    default_tile: Option<String>,
    tiles: BTreeMap<String, String>,
}

impl TileCatalog {
    pub fn standard() -> Self {
        let pairs = [
            ('.', TileKind::Path),
            ('#', TileKind::Wall),
            ('o', TileKind::Pill),
            ('g', TileKind::Gold),
            ('i', TileKind::Ice),
            ('P', TileKind::PacStart),
            ('T', TileKind::MonsterStart(MonsterKind::Troll)),
            ('X', TileKind::MonsterStart(MonsterKind::Tx5)),
            ('A', TileKind::MonsterStart(MonsterKind::Alien)),
            ('O', TileKind::MonsterStart(MonsterKind::Orion)),
            ('W', TileKind::MonsterStart(MonsterKind::Wizard)),
            ('1', TileKind::Portal(PortalColor::White)),
            ('2', TileKind::Portal(PortalColor::Yellow)),
            ('3', TileKind::Portal(PortalColor::DarkGold)),
            ('4', TileKind::Portal(PortalColor::DarkGray)),
        ];
        let mut catalog = Self {
            by_char: BTreeMap::new(),
            by_kind: HashMap::new(),
            default_tile: TileKind::Path,
        };
        for (ch, kind) in pairs {
            catalog.insert(ch, kind);
        }
        catalog
    }

    /// `{"defaultTile": "PathTile", "tiles": {"#": "WallTile", ...}}`
    pub fn from_json(raw: &str) -> Result<Self, MapLoadError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        let mut catalog = Self {
            by_char: BTreeMap::new(),
            by_kind: HashMap::new(),
            default_tile: TileKind::Path,
        };
        for (key, name) in &document.tiles {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                return Err(MapLoadError::BadCatalogKey(key.clone()));
            };
            let kind = TileKind::from_tile_name(name).ok_or_else(|| {
                MapLoadError::UnknownTileName {
                    name: name.clone(),
                    x: -1,
                    y: -1,
                }
            })?;
            catalog.insert(ch, kind);
        }
        if let Some(name) = document.default_tile.as_deref() {
            catalog.default_tile =
                TileKind::from_tile_name(name).ok_or_else(|| MapLoadError::UnknownTileName {
                    name: name.to_string(),
                    x: -1,
                    y: -1,
                })?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, ch: char, kind: TileKind) {
        self.by_char.insert(ch, kind);
        self.by_kind.entry(kind).or_insert(ch);
    }

    pub fn tile_for(&self, ch: char) -> Option<TileKind> {
        self.by_char.get(&ch).copied()
    }

    pub fn char_for(&self, kind: TileKind) -> Option<char> {
        self.by_kind.get(&kind).copied()
    }

    pub fn default_tile(&self) -> TileKind {
        self.default_tile
    }
}

#[derive(Debug, Deserialize)]
struct LevelSize {
    width: i64,
    height: i64,
}

#[derive(Debug, Deserialize)]
struct LevelDocument {
    size: LevelSize,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

/// Rectangular tile grid as authored, before any validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTileGrid {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
}

/// Cell count of a `width` x `height` board, if it is positive and within
/// `MAX_GRID_CELLS`.
fn checked_area(width: i64, height: i64) -> Option<usize> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let width = usize::try_from(width).ok()?;
    let height = usize::try_from(height).ok()?;
    width
        .checked_mul(height)
        .filter(|cells| *cells <= MAX_GRID_CELLS)
}

impl RawTileGrid {
    pub fn filled(width: i32, height: i32, fill: TileKind) -> Result<Self, MapLoadError> {
        let (width64, height64) = (i64::from(width), i64::from(height));
        let cells = checked_area(width64, height64).ok_or(MapLoadError::InvalidSize {
            width: width64,
            height: height64,
        })?;
        Ok(Self {
            width,
            height,
            tiles: vec![fill; cells],
        })
    }

    pub fn from_rows<S: AsRef<str>>(rows: &[S], catalog: &TileCatalog) -> Result<Self, MapLoadError> {
        let Some(first) = rows.first() else {
            return Err(MapLoadError::Empty);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(MapLoadError::Empty);
        }
        let (width64, height64) = (width as i64, rows.len() as i64);
        let cells = checked_area(width64, height64).ok_or(MapLoadError::InvalidSize {
            width: width64,
            height: height64,
        })?;
        let mut tiles = Vec::with_capacity(cells);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let actual = row.chars().count();
            if actual != width {
                return Err(MapLoadError::RaggedRow {
                    row: y,
                    expected: width,
                    actual,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let kind = catalog
                    .tile_for(ch)
                    .ok_or(MapLoadError::UnknownTileChar {
                        ch,
                        x: x as i32,
                        y: y as i32,
                    })?;
                tiles.push(kind);
            }
        }
        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            tiles,
        })
    }

    pub fn from_text(text: &str, catalog: &TileCatalog) -> Result<Self, MapLoadError> {
        let mut rows: Vec<&str> = text.lines().map(|line| line.trim_end_matches('\r')).collect();
        while rows.last().is_some_and(|row| row.trim().is_empty()) {
            rows.pop();
        }
        Self::from_rows(&rows, catalog)
    }

    /// Parses the editor's level document; absent rows and cells keep the
    /// catalog's default tile.
    pub fn from_level_json(text: &str, catalog: &TileCatalog) -> Result<Self, MapLoadError> {
        let document: LevelDocument = serde_json::from_str(text)?;
        let (width, height) = (document.size.width, document.size.height);
        if checked_area(width, height).is_none() {
            return Err(MapLoadError::InvalidSize { width, height });
        }
        let mut grid = Self::filled(width as i32, height as i32, catalog.default_tile())?;
        for (y, row) in document.rows.iter().enumerate() {
            for (x, name) in row.iter().enumerate() {
                let pos = Vec2::new(x as i32, y as i32);
                if !grid.in_bounds(pos) {
                    return Err(MapLoadError::CellOutOfBounds { x: pos.x, y: pos.y });
                }
                let kind =
                    TileKind::from_tile_name(name).ok_or_else(|| MapLoadError::UnknownTileName {
                        name: name.clone(),
                        x: pos.x,
                        y: pos.y,
                    })?;
                grid.set(pos, kind);
            }
        }
        Ok(grid)
    }

    pub fn load(path: &Path, catalog: &TileCatalog) -> Result<Self, MapLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| MapLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_level_json(&text, catalog)
        } else {
            Self::from_text(&text, catalog)
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn tile_at(&self, pos: Vec2) -> Option<TileKind> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.tiles.get((pos.y * self.width + pos.x) as usize).copied()
    }

    pub fn set(&mut self, pos: Vec2, kind: TileKind) {
        if self.in_bounds(pos) {
            let idx = (pos.y * self.width + pos.x) as usize;
            self.tiles[idx] = kind;
        }
    }

    /// Row-major `(cell, tile)` pairs.
    pub fn cells(&self) -> impl Iterator<Item = (Vec2, TileKind)> + '_ {
        self.tiles.iter().enumerate().map(move |(idx, kind)| {
            let idx = idx as i32;
            (Vec2::new(idx % self.width, idx / self.width), *kind)
        })
    }

    /// Text rows in the catalog's encoding; tiles without a character fall
    /// back to the default tile's character.
    pub fn to_rows(&self, catalog: &TileCatalog) -> Vec<String> {
        let fallback = catalog.char_for(catalog.default_tile()).unwrap_or('.');
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        self.tile_at(Vec2::new(x, y))
                            .and_then(|kind| catalog.char_for(kind))
                            .unwrap_or(fallback)
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rows_map_through_the_catalog() {
        let catalog = TileCatalog::standard();
        let grid = RawTileGrid::from_text("#P1\n.o1\n\n", &catalog).expect("valid map");
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.tile_at(Vec2::new(1, 0)), Some(TileKind::PacStart));
        assert_eq!(
            grid.tile_at(Vec2::new(2, 1)),
            Some(TileKind::Portal(PortalColor::White))
        );
        assert_eq!(grid.tile_at(Vec2::new(3, 0)), None);
        assert_eq!(grid.to_rows(&catalog), vec!["#P1", ".o1"]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let catalog = TileCatalog::standard();
        let err = RawTileGrid::from_text("###\n##\n", &catalog).unwrap_err();
        assert!(matches!(
            err,
            MapLoadError::RaggedRow {
                row: 1,
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn unknown_characters_report_their_cell() {
        let catalog = TileCatalog::standard();
        let err = RawTileGrid::from_text("..\n.?\n", &catalog).unwrap_err();
        assert!(matches!(
            err,
            MapLoadError::UnknownTileChar { ch: '?', x: 1, y: 1 }
        ));
    }

    #[test]
    fn level_document_fills_missing_cells_with_default_tile() {
        let catalog = TileCatalog::standard();
        let raw = r#"{
            "size": { "width": 3, "height": 2 },
            "rows": [["wallTile", "PacTile"], ["PortalDarkGrayTile"]]
        }"#;
        let grid = RawTileGrid::from_level_json(raw, &catalog).expect("valid document");
        assert_eq!(grid.tile_at(Vec2::new(0, 0)), Some(TileKind::Wall));
        assert_eq!(grid.tile_at(Vec2::new(1, 0)), Some(TileKind::PacStart));
        assert_eq!(grid.tile_at(Vec2::new(2, 0)), Some(TileKind::Path));
        assert_eq!(
            grid.tile_at(Vec2::new(0, 1)),
            Some(TileKind::Portal(PortalColor::DarkGray))
        );
    }

    #[test]
    fn level_document_rejects_cells_outside_size() {
        let catalog = TileCatalog::standard();
        let raw = r#"{ "size": { "width": 1, "height": 1 }, "rows": [["PathTile", "PathTile"]] }"#;
        let err = RawTileGrid::from_level_json(raw, &catalog).unwrap_err();
        assert!(matches!(err, MapLoadError::CellOutOfBounds { x: 1, y: 0 }));
    }

    #[test]
    fn oversized_level_document_is_a_load_error() {
        let catalog = TileCatalog::standard();
        let raw = r#"{ "size": { "width": 70000, "height": 70000 }, "rows": [] }"#;
        let err = RawTileGrid::from_level_json(raw, &catalog).unwrap_err();
        assert!(matches!(
            err,
            MapLoadError::InvalidSize {
                width: 70000,
                height: 70000
            }
        ));
        let raw = r#"{ "size": { "width": 4294967296, "height": 1 }, "rows": [] }"#;
        assert!(matches!(
            RawTileGrid::from_level_json(raw, &catalog),
            Err(MapLoadError::InvalidSize { .. })
        ));
        let raw = r#"{ "size": { "width": 0, "height": 3 }, "rows": [] }"#;
        assert!(matches!(
            RawTileGrid::from_level_json(raw, &catalog),
            Err(MapLoadError::InvalidSize { .. })
        ));
        assert!(RawTileGrid::filled(1024, 1024, TileKind::Path).is_ok());
        assert!(RawTileGrid::filled(1025, 1024, TileKind::Path).is_err());
    }

    #[test]
    fn custom_catalog_loads_from_json() {
        let catalog = TileCatalog::from_json(
            r#"{ "defaultTile": "WallTile", "tiles": { "x": "WallTile", " ": "PathTile", "p": "PacTile" } }"#,
        )
        .expect("valid catalog");
        assert_eq!(catalog.tile_for('x'), Some(TileKind::Wall));
        assert_eq!(catalog.tile_for(' '), Some(TileKind::Path));
        assert_eq!(catalog.default_tile(), TileKind::Wall);
        assert!(matches!(
            TileCatalog::from_json(r#"{ "tiles": { "ab": "WallTile" } }"#),
            Err(MapLoadError::BadCatalogKey(_))
        ));
    }
}
