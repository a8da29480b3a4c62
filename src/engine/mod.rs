use crate::callbacks::{GameCallback, NullCallback};
use crate::constants::TX5_START_IDLE_MS;
use crate::items::{ItemEvent, ItemEventListener, Subscriber};
use crate::monster_state::MonsterStateMachine;
use crate::rng::Rng;
use crate::settings::GameSettings;
use crate::types::{
    Direction, GameOutcome, GameSummary, ItemKind, MonsterKind, MonsterMode, MonsterView,
    PlayerView, RuntimeEvent, Snapshot, Vec2,
};
use crate::world::GameMap;

pub mod player;
pub mod policies;
mod utils;

use self::player::PlayerController;
use self::policies::{AgentBody, MonsterBrain, PolicyView};

const PLAYER_ID: &str = "pacman";

struct PlayerAgent {
    body: AgentBody,
    controller: PlayerController,
    score: i32,
    pills_eaten: usize,
    alive: bool,
}

impl ItemEventListener for PlayerAgent {
    fn on_item_consumed(&mut self, event: &ItemEvent, _now_ms: u64) {
        self.score += event.kind.score();
        if event.kind.is_collectible() {
            self.pills_eaten += 1;
        }
    }
}

struct MonsterAgent {
    id: String,
    kind: MonsterKind,
    body: AgentBody,
    brain: MonsterBrain,
    state: MonsterStateMachine,
}

impl ItemEventListener for MonsterAgent {
    fn on_item_consumed(&mut self, event: &ItemEvent, now_ms: u64) {
        match event.kind {
            ItemKind::Gold => {
                self.state.on_gold(now_ms);
            }
            ItemKind::Ice => {
                self.state.on_ice(now_ms);
            }
            ItemKind::Pill => {}
        }
    }
}

/// One game on one map: a player, its monsters and a virtual clock that
/// only moves when `step` is called.
pub struct GameEngine {
    map: GameMap,
    rng: Rng,
    player: PlayerAgent,
    monsters: Vec<MonsterAgent>,
    callback: Box<dyn GameCallback + Send>,
    events: Vec<RuntimeEvent>,
    tick_ms: u64,

    elapsed_ms: u64,
    ended: bool,
    outcome: Option<GameOutcome>,
    tick_counter: u64,
    next_id_counter: u64,
}

impl GameEngine {
    pub fn new(map: GameMap, settings: &GameSettings) -> Self {
        let reactive = settings.version.items_affect_monsters();
        let player = PlayerAgent {
            body: AgentBody::new(map.pac_start(), Direction::East),
            controller: PlayerController::from_settings(settings),
            score: 0,
            pills_eaten: 0,
            alive: true,
        };
        let starts = map.monster_starts().to_vec();

        let mut engine = Self {
            map,
            rng: Rng::new(settings.seed),
            player,
            monsters: Vec::with_capacity(starts.len()),
            callback: Box::new(NullCallback),
            events: Vec::new(),
            tick_ms: settings.tick_ms,
            elapsed_ms: 0,
            ended: false,
            outcome: None,
            tick_counter: 0,
            next_id_counter: 1,
        };

        for kind in [ItemKind::Pill, ItemKind::Gold, ItemKind::Ice] {
            engine.map.registry_mut(kind).subscribe(Subscriber::Player);
        }
        for (kind, start) in starts {
            let idx = engine.monsters.len();
            let mut state = MonsterStateMachine::new(reactive);
            if kind == MonsterKind::Tx5 {
                state.freeze_for(0, TX5_START_IDLE_MS);
            }
            let id = engine.make_id("monster");
            engine.monsters.push(MonsterAgent {
                id,
                kind,
                body: AgentBody::new(start, Direction::East),
                brain: MonsterBrain::for_kind(kind),
                state,
            });
            engine
                .map
                .registry_mut(ItemKind::Gold)
                .subscribe(Subscriber::Monster(idx));
            engine
                .map
                .registry_mut(ItemKind::Ice)
                .subscribe(Subscriber::Monster(idx));
        }
        engine
    }

    pub fn with_callback(mut self, callback: Box<dyn GameCallback + Send>) -> Self {
        self.callback = callback;
        self
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn player_position(&self) -> Vec2 {
        self.player.body.position
    }

    pub fn score(&self) -> i32 {
        self.player.score
    }

    /// Direction for manual play; the player keeps walking that way each
    /// tick until told otherwise.
    pub fn set_player_input(&mut self, dir: Direction) {
        self.player.controller.set_input(dir);
    }

    pub fn step(&mut self, dt_ms: u64) {
        if self.ended {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.elapsed_ms;

        // Modes are fixed for the whole tick; anything eaten now shows next tick.
        let modes: Vec<MonsterMode> = self
            .monsters
            .iter_mut()
            .map(|monster| {
                monster.state.expire(now_ms);
                monster.state.mode(now_ms)
            })
            .collect();

        self.update_player(now_ms);
        self.update_monsters(&modes);
        self.check_game_over();
    }

    /// Steps at the configured period until the game ends or `max_ticks`
    /// ticks have run.
    pub fn run(&mut self, max_ticks: u64) -> Option<GameOutcome> {
        while !self.ended && self.tick_counter < max_ticks {
            self.step(self.tick_ms);
        }
        self.outcome
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let now_ms = self.elapsed_ms;
        Snapshot {
            tick: self.tick_counter,
            now_ms,
            player: PlayerView {
                x: self.player.body.position.x,
                y: self.player.body.position.y,
                dir: self.player.body.facing,
                score: self.player.score,
                pills_eaten: self.player.pills_eaten,
                alive: self.player.alive,
            },
            monsters: self
                .monsters
                .iter()
                .map(|monster| MonsterView {
                    id: monster.id.clone(),
                    kind: monster.kind,
                    x: monster.body.position.x,
                    y: monster.body.position.y,
                    dir: monster.body.facing,
                    mode: monster.state.mode(now_ms),
                })
                .collect(),
            remaining_collectibles: self.map.remaining_collectibles(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            outcome: self.outcome,
            ticks: self.tick_counter,
            duration_ms: self.elapsed_ms,
            score: self.player.score,
            pills_eaten: self.player.pills_eaten,
            total_collectibles: self.map.total_collectibles(),
        }
    }

    fn update_player(&mut self, now_ms: u64) {
        if !self.player.alive {
            return;
        }
        let next = self
            .player
            .controller
            .decide(&self.map, &mut self.player.body, &mut self.rng);
        let moved = next != self.player.body.position;
        self.player.body.move_to(next);
        if moved {
            if let Some(partner) = take_portal(&self.map, &mut self.player.body) {
                self.events.push(RuntimeEvent::Teleported {
                    agent: PLAYER_ID.to_string(),
                    x: partner.x,
                    y: partner.y,
                });
            }
        }

        let landed = self.player.body.position;
        if let Some(event) = self.map.consume_at(landed) {
            self.dispatch_item_event(event, now_ms);
        }
        self.callback
            .pac_man_location_changed(landed, self.player.score, self.player.pills_eaten);
    }

    fn dispatch_item_event(&mut self, event: ItemEvent, now_ms: u64) {
        self.events.push(RuntimeEvent::ItemConsumed {
            kind: event.kind,
            x: event.location.x,
            y: event.location.y,
        });
        let subscribers = self.map.registry(event.kind).subscribers().to_vec();
        for subscriber in subscribers {
            match subscriber {
                Subscriber::Player => {
                    self.player.on_item_consumed(&event, now_ms);
                    self.callback.pac_man_ate(event.location, event.kind);
                }
                Subscriber::Monster(idx) => {
                    let Some(monster) = self.monsters.get_mut(idx) else {
                        continue;
                    };
                    let before = monster.state.mode(now_ms);
                    monster.on_item_consumed(&event, now_ms);
                    let after = monster.state.mode(now_ms);
                    if after == before {
                        continue;
                    }
                    let monster_id = monster.id.clone();
                    match after {
                        MonsterMode::Furious => {
                            self.events.push(RuntimeEvent::MonsterFurious { monster_id })
                        }
                        MonsterMode::Frozen => {
                            self.events.push(RuntimeEvent::MonsterFrozen { monster_id })
                        }
                        MonsterMode::Normal => {}
                    }
                }
            }
        }
    }

    fn update_monsters(&mut self, modes: &[MonsterMode]) {
        let view = PolicyView {
            map: &self.map,
            player: self.player.body.position,
        };
        for (monster, mode) in self.monsters.iter_mut().zip(modes.iter().copied()) {
            if mode == MonsterMode::Frozen {
                continue;
            }

            let next = monster.brain.decide(&view, &monster.body, &mut self.rng);
            let moved = next != monster.body.position;
            monster.body.move_to(next);
            if moved {
                if let Some(partner) = take_portal(view.map, &mut monster.body) {
                    self.events.push(RuntimeEvent::Teleported {
                        agent: monster.id.clone(),
                        x: partner.x,
                        y: partner.y,
                    });
                }
            }

            if mode == MonsterMode::Furious {
                let next = monster
                    .brain
                    .decide_furious(&view, &monster.body, &mut self.rng);
                if next != monster.body.position {
                    monster.body.move_to(next);
                    if let Some(partner) = take_portal(view.map, &mut monster.body) {
                        self.events.push(RuntimeEvent::Teleported {
                            agent: monster.id.clone(),
                            x: partner.x,
                            y: partner.y,
                        });
                    }
                }
            }

            self.callback
                .monster_location_changed(monster.kind, monster.body.position);
        }
    }

    fn check_game_over(&mut self) {
        if self.player.pills_eaten >= self.map.total_collectibles() {
            self.finish(GameOutcome::Win);
            return;
        }
        let position = self.player.body.position;
        if let Some(monster) = self
            .monsters
            .iter()
            .find(|monster| monster.body.position == position)
        {
            self.events.push(RuntimeEvent::PlayerCaught {
                monster_id: monster.id.clone(),
            });
            self.player.alive = false;
            self.finish(GameOutcome::Lose);
        }
    }

    fn finish(&mut self, outcome: GameOutcome) {
        self.ended = true;
        self.outcome = Some(outcome);
        for monster in &mut self.monsters {
            monster.state.pause();
        }
        self.callback.game_result(outcome);
    }

    fn make_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id_counter);
        self.next_id_counter = self.next_id_counter.saturating_add(1);
        id
    }
}

/// Moves a body that just arrived on a linked portal to its partner.
fn take_portal(map: &GameMap, body: &mut AgentBody) -> Option<Vec2> {
    let partner = map.topology().portal_partner(body.position)?;
    body.position = partner;
    Some(partner)
}
