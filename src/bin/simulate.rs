use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use torusverse_pacman::callbacks::{
    EditorErrorCallback, EditorErrorLog, GameCallback, LogWriterCallback, NullCallback,
};
use torusverse_pacman::engine::GameEngine;
use torusverse_pacman::levels::discover_levels;
use torusverse_pacman::log::{emit_log, now_ms};
use torusverse_pacman::settings::GameSettings;
use torusverse_pacman::tiles::{RawTileGrid, TileCatalog};
use torusverse_pacman::types::{GameOutcome, GameVersion};
use torusverse_pacman::validator::MapValidator;
use torusverse_pacman::world::GameMap;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Folder of numbered level maps, played in order.
    #[arg(long, conflicts_with = "map")]
    levels: Option<PathBuf>,
    /// A single text or JSON map.
    #[arg(long)]
    map: Option<PathBuf>,
    #[arg(long)]
    settings: Option<PathBuf>,
    /// JSON tile catalog replacing the standard characters.
    #[arg(long)]
    tiles: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u32>,
    /// `simple` or `multiverse`.
    #[arg(long)]
    game_version: Option<String>,
    #[arg(long)]
    moves: Option<String>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    /// Game log text lines (`[PacMan] Location: ...`).
    #[arg(long)]
    log_out: Option<PathBuf>,
    /// Map-authoring diagnostics, one line each.
    #[arg(long)]
    editor_log_out: Option<PathBuf>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

enum LevelSource {
    File(PathBuf),
    FixedMaze,
}

struct PlannedLevel {
    name: String,
    number: Option<u64>,
    source: LevelSource,
}

#[derive(Clone, Debug, Serialize)]
struct LevelResultLine {
    level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<u64>,
    outcome: Option<GameOutcome>,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: i32,
    #[serde(rename = "pillsEaten")]
    pills_eaten: usize,
    #[serde(rename = "totalCollectibles")]
    total_collectibles: usize,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "levelCount")]
    level_count: usize,
    wins: usize,
    losses: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "invalidLevel", skip_serializing_if = "Option::is_none")]
    invalid_level: Option<String>,
    levels: Vec<LevelResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();

    let settings = match resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(message) => {
            let run_id = cli
                .run_id
                .clone()
                .unwrap_or_else(|| default_run_id(cli.seed.unwrap_or(0), run_started_at_ms));
            fail_config(&run_id, "settings_invalid", json!({ "error": message }));
        }
    };
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(settings.seed, run_started_at_ms));

    let catalog = match cli.tiles.as_ref() {
        None => TileCatalog::standard(),
        Some(path) => match std::fs::read_to_string(path)
            .map_err(|error| error.to_string())
            .and_then(|raw| TileCatalog::from_json(&raw).map_err(|error| error.to_string()))
        {
            Ok(catalog) => catalog,
            Err(error) => fail_config(
                &run_id,
                "tile_catalog_invalid",
                json!({ "path": path.to_string_lossy(), "error": error }),
            ),
        },
    };

    let mut editor_log: Box<dyn EditorErrorCallback> = match cli.editor_log_out.as_ref() {
        None => Box::new(EditorErrorLog::new(io::stderr())),
        Some(path) => match EditorErrorLog::create(path) {
            Ok(log) => Box::new(log),
            Err(error) => fail_config(
                &run_id,
                "editor_log_open_failed",
                json!({ "path": path.to_string_lossy(), "error": error.to_string() }),
            ),
        },
    };
    let game_log: Option<File> = match cli.log_out.as_ref() {
        None => None,
        Some(path) => match File::create(path) {
            Ok(file) => Some(file),
            Err(error) => fail_config(
                &run_id,
                "game_log_open_failed",
                json!({ "path": path.to_string_lossy(), "error": error.to_string() }),
            ),
        },
    };

    let plan = if let Some(dir) = cli.levels.as_ref() {
        match discover_levels(dir) {
            Ok(levels) => levels
                .into_iter()
                .map(|level| PlannedLevel {
                    name: level.name,
                    number: Some(level.number),
                    source: LevelSource::File(level.path),
                })
                .collect(),
            Err(diagnostics) => {
                for diagnostic in &diagnostics {
                    editor_log.folder_invalid(diagnostic);
                    emit_log(
                        "warn",
                        "level_folder_invalid",
                        &run_id,
                        None,
                        None,
                        json!({ "message": diagnostic.to_string() }),
                    );
                }
                std::process::exit(1);
            }
        }
    } else if let Some(path) = cli.map.as_ref() {
        vec![PlannedLevel {
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            number: None,
            source: LevelSource::File(path.clone()),
        }]
    } else {
        vec![PlannedLevel {
            name: "fixed-maze".to_string(),
            number: None,
            source: LevelSource::FixedMaze,
        }]
    };

    emit_log(
        "info",
        "run_started",
        &run_id,
        None,
        None,
        json!({
            "seed": settings.seed,
            "version": settings.version,
            "auto": settings.auto,
            "levelCount": plan.len(),
        }),
    );

    let mut results = Vec::new();
    let mut invalid_level = None;
    let mut has_anomaly = false;

    for level in plan {
        let map = match &level.source {
            LevelSource::FixedMaze => GameMap::fixed_maze(&settings),
            LevelSource::File(path) => {
                let grid = match RawTileGrid::load(path, &catalog) {
                    Ok(grid) => grid,
                    Err(error) => fail_config(
                        &run_id,
                        "map_load_failed",
                        json!({ "path": path.to_string_lossy(), "error": error.to_string() }),
                    ),
                };
                match MapValidator::new(level.name.clone()).validate(&grid) {
                    Ok(map) => map,
                    Err(report) => {
                        editor_log.level_invalid(&report);
                        emit_log(
                            "warn",
                            "level_invalid",
                            &run_id,
                            Some(&level.name),
                            None,
                            json!({ "problems": report.lines() }),
                        );
                        invalid_level = Some(level.name.clone());
                        has_anomaly = true;
                        break;
                    }
                }
            }
        };

        let callback: Box<dyn GameCallback + Send> = match game_log.as_ref() {
            None => Box::new(NullCallback),
            Some(file) => match file.try_clone() {
                Ok(file) => Box::new(LogWriterCallback::new(file)),
                Err(error) => fail_config(
                    &run_id,
                    "game_log_open_failed",
                    json!({ "error": error.to_string() }),
                ),
            },
        };

        emit_log(
            "info",
            "level_started",
            &run_id,
            Some(&level.name),
            None,
            json!({
                "totalCollectibles": map.total_collectibles(),
                "monsters": map.monster_starts().len(),
            }),
        );
        let mut engine = GameEngine::new(map, &settings).with_callback(callback);
        let outcome = engine.run(settings.max_ticks);
        let summary = engine.build_summary();
        let result = LevelResultLine {
            level: level.name.clone(),
            number: level.number,
            outcome,
            ticks: summary.ticks,
            duration_ms: summary.duration_ms,
            score: summary.score,
            pills_eaten: summary.pills_eaten,
            total_collectibles: summary.total_collectibles,
        };

        if outcome.is_none() {
            has_anomaly = true;
            emit_log(
                "warn",
                "tick_limit_reached",
                &run_id,
                Some(&level.name),
                Some(summary.ticks),
                json!({ "maxTicks": settings.max_ticks, "pillsEaten": summary.pills_eaten }),
            );
        }
        emit_log(
            "info",
            "level_finished",
            &run_id,
            Some(&level.name),
            Some(summary.ticks),
            json!({
                "outcome": outcome,
                "score": summary.score,
                "durationMs": summary.duration_ms,
            }),
        );
        println!(
            "{}",
            serde_json::to_string(&result).expect("level result should serialize")
        );
        results.push(result);

        if outcome != Some(GameOutcome::Win) {
            break;
        }
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        now_ms(),
        results,
        invalid_level,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        json!({
            "levelCount": summary.level_count,
            "wins": summary.wins,
            "losses": summary.losses,
            "averageDurationMs": summary.average_duration_ms,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

/// Settings file first, then individual flags on top.
fn resolve_settings(cli: &Cli) -> Result<GameSettings, String> {
    let mut settings = match cli.settings.as_ref() {
        Some(path) => GameSettings::load(path).map_err(|error| error.to_string())?,
        None => GameSettings::default(),
    };
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    if let Some(raw) = cli.game_version.as_deref() {
        settings.version =
            GameVersion::parse(raw).ok_or_else(|| format!("unknown game version: {raw}"))?;
    }
    if let Some(moves) = cli.moves.as_ref() {
        settings.player_moves = Some(moves.clone());
    }
    if let Some(max_ticks) = cli.max_ticks {
        settings.max_ticks = max_ticks;
    }
    // Nobody steers a headless run.
    settings.auto = true;
    Ok(settings)
}

fn fail_config(run_id: &str, event: &'static str, details: Value) -> ! {
    emit_log("error", event, run_id, None, None, details);
    std::process::exit(2);
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    levels: Vec<LevelResultLine>,
    invalid_level: Option<String>,
) -> RunSummary {
    let level_count = levels.len();
    let average_duration_ms = if level_count == 0 {
        0
    } else {
        levels.iter().map(|level| level.duration_ms).sum::<u64>() / level_count as u64
    };
    let wins = levels
        .iter()
        .filter(|level| level.outcome == Some(GameOutcome::Win))
        .count();
    let losses = levels
        .iter()
        .filter(|level| level.outcome == Some(GameOutcome::Lose))
        .count();
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        level_count,
        wins,
        losses,
        average_duration_ms,
        invalid_level,
        levels,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
