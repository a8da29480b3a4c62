use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use torusverse_pacman::callbacks::{EditorErrorCallback, EditorErrorLog, RecordingCallback};
use torusverse_pacman::constants::TICK_MS;
use torusverse_pacman::engine::GameEngine;
use torusverse_pacman::items::ItemRegistry;
use torusverse_pacman::levels::discover_levels;
use torusverse_pacman::settings::GameSettings;
use torusverse_pacman::tiles::{RawTileGrid, TileCatalog};
use torusverse_pacman::types::{GameOutcome, ItemKind, Vec2};
use torusverse_pacman::validator::MapValidator;
use torusverse_pacman::world::{GameMap, GridTopology};

fn auto_settings() -> GameSettings {
    GameSettings {
        auto: true,
        ..GameSettings::default()
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!(
        "torusverse-e2e-{tag}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write level");
}

#[test]
fn auto_pilot_reaches_gold_on_open_grid() {
    let mut gold = ItemRegistry::new(ItemKind::Gold);
    gold.place(Vec2::new(4, 4));
    let map = GameMap::from_parts(
        GridTopology::open(5, 5),
        ItemRegistry::new(ItemKind::Pill),
        gold,
        ItemRegistry::new(ItemKind::Ice),
        Vec2::new(0, 0),
        Vec::new(),
    );
    let mut engine = GameEngine::new(map, &auto_settings());

    let mut ticks = 0;
    while engine.player_position() != Vec2::new(4, 4) && ticks < 8 {
        engine.step(TICK_MS);
        ticks += 1;
    }

    assert_eq!(engine.player_position(), Vec2::new(4, 4));
    assert!(ticks <= 8);
    assert_eq!(engine.score(), 5);
    assert_eq!(engine.outcome(), Some(GameOutcome::Win));
}

#[test]
fn level_folder_plays_every_level_in_order() {
    let dir = scratch_dir("folder");
    write(&dir, "1_corridor.txt", "P.o.g\n");
    write(
        &dir,
        "2_editor.json",
        r#"{"size":{"width":3,"height":2},"rows":[["PacTile","PillTile"],["GoldTile"]]}"#,
    );
    write(&dir, "readme.md", "not a level");

    let levels = discover_levels(&dir).expect("valid folder");
    assert_eq!(levels.len(), 2);

    let catalog = TileCatalog::standard();
    let mut outcomes = Vec::new();
    let mut first_log = Vec::new();
    for level in &levels {
        let grid = RawTileGrid::load(&level.path, &catalog).expect("loadable level");
        let map = MapValidator::new(level.name.clone())
            .validate(&grid)
            .expect("playable level");
        let recording = RecordingCallback::new();
        let mut engine =
            GameEngine::new(map, &auto_settings()).with_callback(Box::new(recording.clone()));
        outcomes.push(engine.run(200));
        if first_log.is_empty() {
            first_log = recording.lines();
        }
    }

    assert_eq!(outcomes, vec![Some(GameOutcome::Win), Some(GameOutcome::Win)]);
    assert_eq!(
        first_log,
        vec![
            "[PacMan] Location: 1-0. Score: 0. Pills: 0",
            "[PacMan] Location: 2-0. Eat Pill/Item: pills",
            "[PacMan] Location: 2-0. Score: 1. Pills: 1",
            "[PacMan] Location: 3-0. Score: 1. Pills: 1",
            "[PacMan] Location: 4-0. Eat Pill/Item: gold",
            "[PacMan] Location: 4-0. Score: 6. Pills: 2",
            "YOU WIN",
        ]
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn broken_levels_are_reported_to_the_editor_log() {
    let dir = scratch_dir("broken");
    write(&dir, "1_ok.txt", "P.o.g\n");
    write(&dir, "2_broken.txt", "P.#o\n..#g\n");

    let levels = discover_levels(&dir).expect("valid folder");
    let catalog = TileCatalog::standard();
    let mut editor_log = EditorErrorLog::new(Vec::new());
    let mut played = 0;
    for level in &levels {
        let grid = RawTileGrid::load(&level.path, &catalog).expect("loadable level");
        match MapValidator::new(level.name.clone()).validate(&grid) {
            Ok(map) => {
                let mut engine = GameEngine::new(map, &auto_settings());
                assert_eq!(engine.run(200), Some(GameOutcome::Win));
                played += 1;
            }
            Err(report) => {
                editor_log.level_invalid(&report);
                break;
            }
        }
    }

    assert_eq!(played, 1);
    let text = String::from_utf8(editor_log.into_inner()).expect("utf8");
    assert_eq!(
        text,
        "Level 2_broken.txt - Gold not accessible: (4,2)\n\
         Level 2_broken.txt - Pill not accessible: (4,1)\n"
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn duplicate_level_numbers_stop_the_folder() {
    let dir = scratch_dir("dupes");
    write(&dir, "1_a.txt", "P.o.g\n");
    write(&dir, "1_b.map", "P.o.g\n");

    let diagnostics = discover_levels(&dir).unwrap_err();
    let mut editor_log = EditorErrorLog::new(Vec::new());
    for diagnostic in &diagnostics {
        editor_log.folder_invalid(diagnostic);
    }
    let text = String::from_utf8(editor_log.into_inner()).expect("utf8");
    assert!(text.ends_with(" - multiple maps at the same level: 1_a.txt; 1_b.map\n"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn fixed_maze_game_keeps_log_and_summary_consistent() {
    let settings = auto_settings();
    let recording = RecordingCallback::new();
    let mut engine = GameEngine::new(GameMap::fixed_maze(&settings), &settings)
        .with_callback(Box::new(recording.clone()));
    let outcome = engine.run(2_000);

    let summary = engine.build_summary();
    assert_eq!(summary.outcome, outcome);
    assert!(summary.ticks > 0 && summary.ticks <= 2_000);
    assert!(summary.pills_eaten <= summary.total_collectibles);

    let lines = recording.lines();
    assert!(lines[0].starts_with("[PacMan] Location: "));
    match outcome {
        Some(GameOutcome::Win) => {
            assert_eq!(summary.pills_eaten, summary.total_collectibles);
            assert_eq!(lines.last().map(String::as_str), Some("YOU WIN"));
        }
        Some(GameOutcome::Lose) => {
            assert_eq!(lines.last().map(String::as_str), Some("GAME OVER"));
        }
        None => assert!(!engine.is_ended()),
    }
}
