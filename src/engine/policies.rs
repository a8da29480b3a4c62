use std::collections::VecDeque;

use crate::constants::VISITED_HISTORY_LEN;
use crate::pathfinding::PathFinder;
use crate::rng::Rng;
use crate::types::{Direction, MonsterKind, Vec2};
use crate::world::GameMap;

use super::utils::{random_sign, straight_line_distance};

/// The last few cells an agent stood on.
#[derive(Clone, Debug, Default)]
pub struct VisitedHistory {
    cells: VecDeque<Vec2>,
}

impl VisitedHistory {
    pub fn record(&mut self, cell: Vec2) {
        if self.cells.len() == VISITED_HISTORY_LEN {
            self.cells.pop_front();
        }
        self.cells.push_back(cell);
    }

    pub fn contains(&self, cell: Vec2) -> bool {
        self.cells.contains(&cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Position, facing and short-term memory of anything that walks the board.
#[derive(Clone, Debug)]
pub struct AgentBody {
    pub position: Vec2,
    pub facing: Direction,
    pub history: VisitedHistory,
}

impl AgentBody {
    pub fn new(position: Vec2, facing: Direction) -> Self {
        Self {
            position,
            facing,
            history: VisitedHistory::default(),
        }
    }

    pub fn ahead(&self) -> Vec2 {
        self.position.neighbor(self.facing)
    }

    /// Steps onto `next`, turning toward it; staying keeps the facing.
    /// The destination is remembered either way.
    pub fn move_to(&mut self, next: Vec2) {
        if next != self.position {
            if let Some(dir) = Direction::toward(self.position, next) {
                self.facing = dir;
            }
            self.position = next;
        }
        self.history.record(next);
    }
}

/// What a policy may look at besides its own body.
#[derive(Clone, Copy, Debug)]
pub struct PolicyView<'a> {
    pub map: &'a GameMap,
    pub player: Vec2,
}

/// Turn one way, go straight, turn the other way, go back; first walkable
/// wins, otherwise stay.
pub fn random_walk(map: &GameMap, body: &AgentBody, rng: &mut Rng) -> Vec2 {
    let sign = random_sign(rng);
    let candidates = [
        body.facing.rotate(2 * sign),
        body.facing,
        body.facing.rotate(-2 * sign),
        body.facing.reverse(),
    ];
    candidates
        .into_iter()
        .map(|dir| body.position.neighbor(dir))
        .find(|next| map.is_walkable(*next))
        .unwrap_or(body.position)
}

/// Heads along the four-point compass toward `target` unless that cell is
/// blocked or was visited recently.
pub fn direct_chase(map: &GameMap, body: &AgentBody, target: Vec2, rng: &mut Rng) -> Vec2 {
    if let Some(dir) = Direction::toward_cardinal(body.position, target) {
        let next = body.position.neighbor(dir);
        if !body.history.contains(next) && map.is_walkable(next) {
            return next;
        }
    }
    random_walk(map, body, rng)
}

/// Among the walkable eight neighbours, one of those closest to `target`.
pub fn omni_nearest(map: &GameMap, body: &AgentBody, target: Vec2, rng: &mut Rng) -> Vec2 {
    let mut best = i32::MAX;
    let mut choices: Vec<Vec2> = Vec::new();
    for dir in Direction::ALL {
        let next = body.position.neighbor(dir);
        if !map.is_walkable(next) {
            continue;
        }
        let distance = straight_line_distance(next, target);
        if distance < best {
            best = distance;
            choices.clear();
            choices.push(next);
        } else if distance == best {
            choices.push(next);
        }
    }
    if choices.is_empty() {
        return body.position;
    }
    choices[rng.pick_index(choices.len())]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallJump {
    pub next: Vec2,
    pub jumped: bool,
}

/// Tries the eight directions in random order: the neighbour if walkable,
/// else the cell beyond it.
pub fn wall_jump(map: &GameMap, body: &AgentBody, rng: &mut Rng) -> WallJump {
    let mut dirs = Direction::ALL;
    rng.shuffle(&mut dirs);
    for dir in dirs {
        let next = body.position.neighbor(dir);
        if map.is_walkable(next) {
            return WallJump {
                next,
                jumped: false,
            };
        }
        let beyond = next.neighbor(dir);
        if map.is_walkable(beyond) {
            return WallJump {
                next: beyond,
                jumped: true,
            };
        }
    }
    WallJump {
        next: body.position,
        jumped: false,
    }
}

/// Decision procedure of a monster archetype, with its private memory.
#[derive(Clone, Debug)]
pub enum MonsterBrain {
    RandomWalker,
    DirectChaser,
    OmniNearest,
    GoldSeeker {
        remaining: Vec<Vec2>,
        target: Option<Vec2>,
    },
    WallJumper {
        wall_jumped: bool,
    },
}

impl MonsterBrain {
    pub fn for_kind(kind: MonsterKind) -> Self {
        match kind {
            MonsterKind::Troll => MonsterBrain::RandomWalker,
            MonsterKind::Tx5 => MonsterBrain::DirectChaser,
            MonsterKind::Alien => MonsterBrain::OmniNearest,
            MonsterKind::Orion => MonsterBrain::GoldSeeker {
                remaining: Vec::new(),
                target: None,
            },
            MonsterKind::Wizard => MonsterBrain::WallJumper { wall_jumped: false },
        }
    }

    /// The primary move of a tick.
    pub fn decide(&mut self, view: &PolicyView<'_>, body: &AgentBody, rng: &mut Rng) -> Vec2 {
        match self {
            MonsterBrain::RandomWalker => random_walk(view.map, body, rng),
            MonsterBrain::DirectChaser => direct_chase(view.map, body, view.player, rng),
            MonsterBrain::OmniNearest => omni_nearest(view.map, body, view.player, rng),
            MonsterBrain::GoldSeeker { remaining, target } => {
                seek_gold(view.map, body, remaining, target, rng)
            }
            MonsterBrain::WallJumper { wall_jumped } => {
                let jump = wall_jump(view.map, body, rng);
                *wall_jumped = jump.jumped;
                jump.next
            }
        }
    }

    /// The extra move a furious monster makes after its primary one.
    pub fn decide_furious(
        &mut self,
        view: &PolicyView<'_>,
        body: &AgentBody,
        rng: &mut Rng,
    ) -> Vec2 {
        if let MonsterBrain::WallJumper { wall_jumped } = self {
            if *wall_jumped {
                *wall_jumped = false;
                return body.position;
            }
            let ahead = body.ahead();
            if view.map.is_walkable(ahead) {
                return ahead;
            }
            let beyond = ahead.neighbor(body.facing);
            if view.map.is_walkable(beyond) {
                return beyond;
            }
            return self.decide(view, body, rng);
        }

        let ahead = body.ahead();
        if view.map.is_walkable(ahead) {
            ahead
        } else {
            self.decide(view, body, rng)
        }
    }
}

fn seek_gold(
    map: &GameMap,
    body: &AgentBody,
    remaining: &mut Vec<Vec2>,
    target: &mut Option<Vec2>,
    rng: &mut Rng,
) -> Vec2 {
    let gold = map.get_gold();
    if remaining.is_empty() {
        remaining.extend(gold.locations());
    }
    if target.is_none() {
        let (fresh, eaten): (Vec<Vec2>, Vec<Vec2>) = remaining
            .iter()
            .copied()
            .partition(|cell| gold.has_uneaten_at(*cell));
        let pool = if fresh.is_empty() { eaten } else { fresh };
        if !pool.is_empty() {
            *target = Some(pool[rng.pick_index(pool.len())]);
        }
    }
    let Some(goal) = *target else {
        return body.position;
    };

    let next = PathFinder::new(map.topology()).next_step(body.position, goal);
    if next == goal {
        remaining.retain(|cell| *cell != goal);
        *target = None;
    }
    next
}
