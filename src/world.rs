use std::collections::BTreeMap;

use crate::constants::{DEFAULT_MAZE, DEFAULT_PAC_START};
use crate::items::{Item, ItemEvent, ItemRegistry};
use crate::settings::GameSettings;
use crate::tiles::{RawTileGrid, TileCatalog, TileKind};
use crate::types::{Direction, ItemKind, MonsterKind, PortalColor, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PortalCell {
    color: PortalColor,
    partner: Option<Vec2>,
}

/// Walkability and neighbour structure of the board. Fixed after
/// construction apart from portal linking done by the map builder.
#[derive(Clone, Debug)]
pub struct GridTopology {
    width: i32,
    height: i32,
    walkable: Vec<bool>,
    portals: BTreeMap<Vec2, PortalCell>,
}

impl GridTopology {
    /// Every cell walkable, no portals.
    pub fn open(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let cells = (width as usize).saturating_mul(height as usize);
        Self {
            width,
            height,
            walkable: vec![true; cells],
            portals: BTreeMap::new(),
        }
    }

    /// Walls become unwalkable, portal tiles are registered unlinked.
    pub fn from_grid(grid: &RawTileGrid) -> Self {
        let mut topology = Self::open(grid.width(), grid.height());
        for (pos, tile) in grid.cells() {
            match tile {
                TileKind::Wall => topology.set_wall(pos),
                TileKind::Portal(color) => topology.add_portal(pos, color),
                _ => {}
            }
        }
        topology
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Vec2) -> Option<usize> {
        self.is_in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    pub fn is_walkable(&self, pos: Vec2) -> bool {
        self.index(pos).is_some_and(|idx| self.walkable[idx])
    }

    pub fn set_wall(&mut self, pos: Vec2) {
        if let Some(idx) = self.index(pos) {
            self.walkable[idx] = false;
        }
    }

    pub fn add_portal(&mut self, pos: Vec2, color: PortalColor) {
        if self.is_in_bounds(pos) {
            self.portals.insert(
                pos,
                PortalCell {
                    color,
                    partner: None,
                },
            );
        }
    }

    /// Links two registered portals both ways. Returns false when either
    /// cell is not a portal.
    pub fn link_portals(&mut self, a: Vec2, b: Vec2) -> bool {
        if a == b || !self.portals.contains_key(&a) || !self.portals.contains_key(&b) {
            return false;
        }
        if let Some(cell) = self.portals.get_mut(&a) {
            cell.partner = Some(b);
        }
        if let Some(cell) = self.portals.get_mut(&b) {
            cell.partner = Some(a);
        }
        true
    }

    pub fn portal_color(&self, pos: Vec2) -> Option<PortalColor> {
        self.portals.get(&pos).map(|cell| cell.color)
    }

    pub fn portal_partner(&self, pos: Vec2) -> Option<Vec2> {
        self.portals.get(&pos).and_then(|cell| cell.partner)
    }

    /// Portal cells in coordinate order.
    pub fn portals(&self) -> impl Iterator<Item = (Vec2, PortalColor)> + '_ {
        self.portals.iter().map(|(pos, cell)| (*pos, cell.color))
    }

    /// In-bounds cardinal neighbours in NORTH, EAST, SOUTH, WEST order.
    pub fn geometric_neighbors(&self, pos: Vec2) -> Vec<Vec2> {
        Direction::CARDINALS
            .iter()
            .map(|dir| pos.neighbor(*dir))
            .filter(|next| self.is_in_bounds(*next))
            .collect()
    }

    /// Leaving a cell is ordinary movement, portal or not.
    pub fn neighbors_on_exit(&self, pos: Vec2) -> Vec<Vec2> {
        self.geometric_neighbors(pos)
    }

    /// Arriving on a linked portal places you on its partner, so the cells
    /// reachable next are the partner's neighbours.
    pub fn neighbors_on_enter(&self, pos: Vec2) -> Vec<Vec2> {
        match self.portal_partner(pos) {
            Some(partner) => self.geometric_neighbors(partner),
            None => self.geometric_neighbors(pos),
        }
    }
}

/// A play-ready board: topology, items and start cells.
#[derive(Clone, Debug)]
pub struct GameMap {
    topology: GridTopology,
    pills: ItemRegistry,
    gold: ItemRegistry,
    ice: ItemRegistry,
    pac_start: Vec2,
    monster_starts: Vec<(MonsterKind, Vec2)>,
}

impl GameMap {
    /// Assembles a map from parts that are already known to be sound.
    /// Nothing is checked here; untrusted grids go through `MapValidator`.
    pub fn from_parts(
        topology: GridTopology,
        pills: ItemRegistry,
        gold: ItemRegistry,
        ice: ItemRegistry,
        pac_start: Vec2,
        monster_starts: Vec<(MonsterKind, Vec2)>,
    ) -> Self {
        Self {
            topology,
            pills,
            gold,
            ice,
            pac_start,
            monster_starts,
        }
    }

    /// The built-in 20x11 maze. Settings may move the starts and replace
    /// the maze's pills and gold; cells outside the grid are skipped.
    pub fn fixed_maze(settings: &GameSettings) -> Self {
        let catalog = TileCatalog::standard();
        let height = DEFAULT_MAZE.len() as i32;
        let width = DEFAULT_MAZE
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0) as i32;
        let mut topology = GridTopology::open(width, height);
        let mut pills = ItemRegistry::new(ItemKind::Pill);
        let mut gold = ItemRegistry::new(ItemKind::Gold);
        let mut ice = ItemRegistry::new(ItemKind::Ice);

        for (y, row) in DEFAULT_MAZE.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let pos = Vec2::new(x as i32, y as i32);
                match catalog.tile_for(ch).unwrap_or(TileKind::Path) {
                    TileKind::Wall => topology.set_wall(pos),
                    TileKind::Pill if settings.pill_locations.is_none() => {
                        pills.place(pos);
                    }
                    TileKind::Gold if settings.gold_locations.is_none() => {
                        gold.place(pos);
                    }
                    TileKind::Ice => {
                        ice.place(pos);
                    }
                    _ => {}
                }
            }
        }

        for pos in settings.pill_locations.iter().flatten() {
            if topology.is_in_bounds(*pos) {
                pills.place(*pos);
            }
        }
        for pos in settings.gold_locations.iter().flatten() {
            if topology.is_in_bounds(*pos) {
                gold.place(*pos);
            }
        }

        let pac_start = if topology.is_in_bounds(settings.pac_start) {
            settings.pac_start
        } else {
            DEFAULT_PAC_START
        };
        let monster_starts = settings
            .version
            .roster()
            .iter()
            .map(|kind| (*kind, settings.monster_start(*kind)))
            .filter(|(_, pos)| topology.is_in_bounds(*pos))
            .collect();

        Self::from_parts(topology, pills, gold, ice, pac_start, monster_starts)
    }

    pub fn topology(&self) -> &GridTopology {
        &self.topology
    }

    pub fn width(&self) -> i32 {
        self.topology.width()
    }

    pub fn height(&self) -> i32 {
        self.topology.height()
    }

    pub fn is_walkable(&self, pos: Vec2) -> bool {
        self.topology.is_walkable(pos)
    }

    pub fn neighbors_on_enter(&self, pos: Vec2) -> Vec<Vec2> {
        self.topology.neighbors_on_enter(pos)
    }

    pub fn neighbors_on_exit(&self, pos: Vec2) -> Vec<Vec2> {
        self.topology.neighbors_on_exit(pos)
    }

    pub fn pac_start(&self) -> Vec2 {
        self.pac_start
    }

    /// Monster starts in instantiation order.
    pub fn monster_starts(&self) -> &[(MonsterKind, Vec2)] {
        &self.monster_starts
    }

    pub fn get_pills(&self) -> &ItemRegistry {
        &self.pills
    }

    pub fn get_gold(&self) -> &ItemRegistry {
        &self.gold
    }

    pub fn get_ice(&self) -> &ItemRegistry {
        &self.ice
    }

    pub fn registry(&self, kind: ItemKind) -> &ItemRegistry {
        match kind {
            ItemKind::Pill => &self.pills,
            ItemKind::Gold => &self.gold,
            ItemKind::Ice => &self.ice,
        }
    }

    pub fn registry_mut(&mut self, kind: ItemKind) -> &mut ItemRegistry {
        match kind {
            ItemKind::Pill => &mut self.pills,
            ItemKind::Gold => &mut self.gold,
            ItemKind::Ice => &mut self.ice,
        }
    }

    /// Pills, then gold, then ice, consumed ones included.
    pub fn get_all_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.pills
            .items()
            .iter()
            .chain(self.gold.items())
            .chain(self.ice.items())
    }

    /// The uneaten item on a cell, if any.
    pub fn item_at(&self, pos: Vec2) -> Option<&Item> {
        [&self.pills, &self.gold, &self.ice]
            .into_iter()
            .filter_map(|registry| registry.get(pos))
            .find(|item| !item.is_consumed())
    }

    pub fn consume_at(&mut self, pos: Vec2) -> Option<ItemEvent> {
        let kind = self.item_at(pos)?.kind;
        self.registry_mut(kind).consume_at(pos)
    }

    pub fn total_collectibles(&self) -> usize {
        self.pills.len() + self.gold.len()
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.pills.remaining() + self.gold.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameVersion;

    fn topology(rows: &[&str]) -> GridTopology {
        let grid = RawTileGrid::from_rows(rows, &TileCatalog::standard()).expect("valid rows");
        GridTopology::from_grid(&grid)
    }

    #[test]
    fn out_of_bounds_is_never_walkable() {
        let topo = topology(&[".#", ".."]);
        assert!(topo.is_walkable(Vec2::new(0, 0)));
        assert!(!topo.is_walkable(Vec2::new(1, 0)));
        assert!(!topo.is_walkable(Vec2::new(-1, 0)));
        assert!(!topo.is_walkable(Vec2::new(0, 2)));
    }

    #[test]
    fn geometric_neighbors_are_bounded_and_ordered() {
        let topo = topology(&["...", "...", "..."]);
        assert_eq!(
            topo.geometric_neighbors(Vec2::new(1, 1)),
            vec![
                Vec2::new(1, 0),
                Vec2::new(2, 1),
                Vec2::new(1, 2),
                Vec2::new(0, 1)
            ]
        );
        assert_eq!(
            topo.geometric_neighbors(Vec2::new(0, 0)),
            vec![Vec2::new(1, 0), Vec2::new(0, 1)]
        );
    }

    #[test]
    fn linked_portal_enters_at_partner_but_exits_locally() {
        let mut topo = topology(&["1...", "....", "...1"]);
        let a = Vec2::new(0, 0);
        let b = Vec2::new(3, 2);
        assert_eq!(topo.portal_partner(a), None);
        assert!(topo.link_portals(a, b));
        assert_eq!(topo.portal_partner(b), Some(a));
        assert_eq!(topo.neighbors_on_enter(a), topo.geometric_neighbors(b));
        assert_eq!(topo.neighbors_on_exit(a), topo.geometric_neighbors(a));
        assert!(!topo.link_portals(a, Vec2::new(1, 1)));
    }

    #[test]
    fn fixed_maze_uses_default_layout() {
        let map = GameMap::fixed_maze(&GameSettings::default());
        assert_eq!(map.width(), 20);
        assert_eq!(map.height(), 11);
        assert!(!map.is_walkable(Vec2::new(0, 0)));
        assert_eq!(map.pac_start(), DEFAULT_PAC_START);
        assert_eq!(map.monster_starts().len(), 5);
        assert!(map.get_gold().has_uneaten_at(Vec2::new(10, 1)));
        assert!(map.get_ice().has_uneaten_at(Vec2::new(1, 8)));
        assert_eq!(
            map.total_collectibles(),
            map.get_pills().len() + map.get_gold().len()
        );
    }

    #[test]
    fn fixed_maze_overrides_replace_collectibles() {
        let settings = GameSettings {
            version: GameVersion::Simple,
            pill_locations: Some(vec![Vec2::new(1, 1), Vec2::new(40, 40)]),
            gold_locations: Some(vec![Vec2::new(2, 1)]),
            ..GameSettings::default()
        };
        let map = GameMap::fixed_maze(&settings);
        assert_eq!(map.get_pills().locations(), vec![Vec2::new(1, 1)]);
        assert_eq!(map.get_gold().locations(), vec![Vec2::new(2, 1)]);
        assert!(!map.get_ice().is_empty());
        let kinds: Vec<MonsterKind> = map.monster_starts().iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![MonsterKind::Troll, MonsterKind::Tx5]);
    }

    #[test]
    fn consuming_clears_the_cell() {
        let mut map = GameMap::fixed_maze(&GameSettings::default());
        let cell = Vec2::new(1, 1);
        assert_eq!(map.item_at(cell).map(|item| item.kind), Some(ItemKind::Pill));
        let before = map.remaining_collectibles();
        let event = map.consume_at(cell).expect("pill eaten");
        assert_eq!(event.kind, ItemKind::Pill);
        assert!(map.item_at(cell).is_none());
        assert_eq!(map.remaining_collectibles(), before - 1);
        assert_eq!(map.consume_at(cell), None);
    }
}
