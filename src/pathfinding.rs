use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::Vec2;
use crate::world::GridTopology;

/// Breadth-first search over a topology, answering one step at a time.
///
/// The start cell expands through its exit neighbours and every later cell,
/// the start itself when stepped back onto, through its enter neighbours, so
/// a route may step onto a portal and carry on from its partner. Cells in the avoid-set count as walls for the query.
#[derive(Clone, Copy, Debug)]
pub struct PathFinder<'a> {
    topology: &'a GridTopology,
}

impl<'a> PathFinder<'a> {
    pub fn new(topology: &'a GridTopology) -> Self {
        Self { topology }
    }

    pub fn next_step(&self, start: Vec2, goal: Vec2) -> Vec2 {
        self.next_step_avoiding(start, goal, &HashSet::new())
    }

    /// First hop of a shortest route, or `start` when the goal is the start
    /// or cannot be reached.
    pub fn next_step_avoiding(&self, start: Vec2, goal: Vec2, avoid: &HashSet<Vec2>) -> Vec2 {
        self.route(start, goal, avoid)
            .and_then(|route| route.first().copied())
            .unwrap_or(start)
    }

    /// Cells stepped on after `start`, ending at `goal`. Empty when already
    /// there, `None` when unreachable.
    pub fn route(&self, start: Vec2, goal: Vec2, avoid: &HashSet<Vec2>) -> Option<Vec<Vec2>> {
        if start == goal {
            return Some(Vec::new());
        }

        let open = |cell: &Vec2| self.topology.is_walkable(*cell) && !avoid.contains(cell);
        let mut parent: HashMap<Vec2, Vec2> = HashMap::new();
        let mut visited: HashSet<Vec2> = HashSet::new();
        let mut queue = VecDeque::new();

        // `start` stays unvisited: a walker on a portal may step off and
        // back on to ride it.
        for next in self.topology.neighbors_on_exit(start) {
            if !open(&next) || !visited.insert(next) {
                continue;
            }
            if next == goal {
                return Some(vec![goal]);
            }
            queue.push_back(next);
        }

        while let Some(current) = queue.pop_front() {
            for next in self.topology.neighbors_on_enter(current) {
                if !open(&next) || !visited.insert(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == goal {
                    return Some(trace_back(&parent, goal));
                }
                queue.push_back(next);
            }
        }
        None
    }
}

/// Walks parents back to a first hop, which has none.
fn trace_back(parent: &HashMap<Vec2, Vec2>, goal: Vec2) -> Vec<Vec2> {
    let mut route = vec![goal];
    let mut cursor = goal;
    while let Some(&prev) = parent.get(&cursor) {
        route.push(prev);
        cursor = prev;
    }
    route.reverse();
    route
}

/// Walkable cells reachable from `start`, portal shortcuts included.
pub fn reachable_cells(topology: &GridTopology, start: Vec2) -> HashSet<Vec2> {
    let mut seen = HashSet::new();
    if !topology.is_walkable(start) {
        return seen;
    }
    seen.insert(start);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for next in topology.neighbors_on_enter(current) {
            if topology.is_walkable(next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}
