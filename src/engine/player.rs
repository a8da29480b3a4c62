use crate::pathfinding::PathFinder;
use crate::rng::Rng;
use crate::settings::{ClosestItemMode, GameSettings};
use crate::types::{Direction, Vec2};
use crate::world::GameMap;

use super::policies::{random_walk, AgentBody};
use super::utils::{first_min_by_key, straight_line_distance};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptMove {
    TurnLeft,
    TurnRight,
    Forward,
    Stay,
}

/// `L`, `R`, `M`, `S`; commas and whitespace are skipped and anything else
/// spends a tick standing still.
pub fn parse_script(raw: &str) -> Vec<ScriptMove> {
    raw.chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .map(|ch| match ch.to_ascii_uppercase() {
            'L' => ScriptMove::TurnLeft,
            'R' => ScriptMove::TurnRight,
            'M' => ScriptMove::Forward,
            _ => ScriptMove::Stay,
        })
        .collect()
}

/// How the player's next cell is chosen.
#[derive(Clone, Debug)]
pub enum PlayerController {
    Manual {
        input: Option<Direction>,
    },
    AutoPilot {
        mode: ClosestItemMode,
    },
    Scripted {
        moves: Vec<ScriptMove>,
        cursor: usize,
        mode: ClosestItemMode,
    },
}

impl PlayerController {
    pub fn from_settings(settings: &GameSettings) -> Self {
        if !settings.auto {
            return PlayerController::Manual { input: None };
        }
        let moves = settings
            .player_moves
            .as_deref()
            .map(parse_script)
            .unwrap_or_default();
        if moves.is_empty() {
            PlayerController::AutoPilot {
                mode: settings.targeting,
            }
        } else {
            PlayerController::Scripted {
                moves,
                cursor: 0,
                mode: settings.targeting,
            }
        }
    }

    /// Held direction for manual play; ignored by the other controllers.
    pub fn set_input(&mut self, dir: Direction) {
        if let PlayerController::Manual { input } = self {
            *input = Some(dir);
        }
    }

    /// Picks the next cell. Turning in place is applied to `body` directly.
    pub fn decide(&mut self, map: &GameMap, body: &mut AgentBody, rng: &mut Rng) -> Vec2 {
        match self {
            PlayerController::Manual { input } => {
                let Some(dir) = *input else {
                    return body.position;
                };
                body.facing = dir;
                let next = body.position.neighbor(dir);
                if map.is_walkable(next) {
                    next
                } else {
                    body.position
                }
            }
            PlayerController::AutoPilot { mode } => auto_pilot(*mode, map, body, rng),
            PlayerController::Scripted {
                moves,
                cursor,
                mode,
            } => {
                let Some(step) = moves.get(*cursor).copied() else {
                    return auto_pilot(*mode, map, body, rng);
                };
                *cursor += 1;
                match step {
                    ScriptMove::TurnLeft => {
                        body.facing = body.facing.turn_left();
                        body.position
                    }
                    ScriptMove::TurnRight => {
                        body.facing = body.facing.turn_right();
                        body.position
                    }
                    ScriptMove::Forward if map.is_walkable(body.ahead()) => body.ahead(),
                    ScriptMove::Forward | ScriptMove::Stay => body.position,
                }
            }
        }
    }
}

fn auto_pilot(mode: ClosestItemMode, map: &GameMap, body: &AgentBody, rng: &mut Rng) -> Vec2 {
    match mode {
        ClosestItemMode::SkipConsumed => toward_closest_uneaten(map, body),
        ClosestItemMode::IncludeConsumed => toward_closest_any(map, body, rng),
    }
}

/// Nearest uneaten pill or gold, approached by breadth-first steps over the
/// live topology.
fn toward_closest_uneaten(map: &GameMap, body: &AgentBody) -> Vec2 {
    let candidates: Vec<Vec2> = map
        .get_pills()
        .items()
        .iter()
        .chain(map.get_gold().items())
        .filter(|item| !item.is_consumed())
        .map(|item| item.location)
        .collect();
    let Some(idx) = first_min_by_key(&candidates, |cell| {
        straight_line_distance(body.position, *cell)
    }) else {
        return body.position;
    };
    PathFinder::new(map.topology()).next_step(body.position, candidates[idx])
}

/// Nearest item of any kind, eaten or not, approached by compass heading
/// with a random walk when that is blocked or recently visited.
fn toward_closest_any(map: &GameMap, body: &AgentBody, rng: &mut Rng) -> Vec2 {
    let candidates: Vec<Vec2> = map.get_all_items().map(|item| item.location).collect();
    let Some(idx) = first_min_by_key(&candidates, |cell| {
        straight_line_distance(body.position, *cell)
    }) else {
        return body.position;
    };
    if let Some(dir) = Direction::toward_cardinal(body.position, candidates[idx]) {
        let next = body.position.neighbor(dir);
        if !body.history.contains(next) && map.is_walkable(next) {
            return next;
        }
    }
    random_walk(map, body, rng)
}
