use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::levels::FolderDiagnostic;
use crate::log::emit_log;
use crate::types::{GameOutcome, ItemKind, MonsterKind, Vec2};
use crate::validator::ValidationReport;

/// Game telemetry sink, fed by the engine as agents move and eat.
pub trait GameCallback {
    fn pac_man_location_changed(&mut self, location: Vec2, score: i32, pills_eaten: usize);
    fn monster_location_changed(&mut self, kind: MonsterKind, location: Vec2);
    fn pac_man_ate(&mut self, location: Vec2, kind: ItemKind);
    fn game_result(&mut self, outcome: GameOutcome);
}

/// Map-authoring diagnostics sink.
pub trait EditorErrorCallback {
    fn level_invalid(&mut self, report: &ValidationReport);
    fn folder_invalid(&mut self, diagnostic: &FolderDiagnostic);
}

pub fn pac_man_location_line(location: Vec2, score: i32, pills_eaten: usize) -> String {
    format!(
        "[PacMan] Location: {}-{}. Score: {}. Pills: {}",
        location.x, location.y, score, pills_eaten
    )
}

pub fn monster_location_line(kind: MonsterKind, location: Vec2) -> String {
    format!("[{}] Location: {}-{}", kind.label(), location.x, location.y)
}

pub fn pac_man_ate_line(location: Vec2, kind: ItemKind) -> String {
    format!(
        "[PacMan] Location: {}-{}. Eat Pill/Item: {}",
        location.x,
        location.y,
        kind.log_label()
    )
}

/// Line-oriented writer that flushes every line. The first failed write is
/// reported once; later lines are still attempted.
#[derive(Debug)]
struct LineSink<W: Write> {
    out: W,
    name: &'static str,
    warned: bool,
}

impl<W: Write> LineSink<W> {
    fn new(out: W, name: &'static str) -> Self {
        Self {
            out,
            name,
            warned: false,
        }
    }

    fn write_line(&mut self, line: &str) {
        let result = writeln!(self.out, "{line}").and_then(|_| self.out.flush());
        if let Err(error) = result {
            if !self.warned {
                self.warned = true;
                emit_log(
                    "warn",
                    "log_write_failed",
                    self.name,
                    None,
                    None,
                    json!({ "error": error.to_string() }),
                );
            }
        }
    }
}

/// Writes the classic game log text lines.
#[derive(Debug)]
pub struct LogWriterCallback<W: Write> {
    sink: LineSink<W>,
}

impl<W: Write> LogWriterCallback<W> {
    pub fn new(out: W) -> Self {
        Self {
            sink: LineSink::new(out, "game-log"),
        }
    }

    pub fn into_inner(self) -> W {
        self.sink.out
    }
}

impl LogWriterCallback<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> GameCallback for LogWriterCallback<W> {
    fn pac_man_location_changed(&mut self, location: Vec2, score: i32, pills_eaten: usize) {
        self.sink
            .write_line(&pac_man_location_line(location, score, pills_eaten));
    }

    fn monster_location_changed(&mut self, kind: MonsterKind, location: Vec2) {
        self.sink.write_line(&monster_location_line(kind, location));
    }

    fn pac_man_ate(&mut self, location: Vec2, kind: ItemKind) {
        self.sink.write_line(&pac_man_ate_line(location, kind));
    }

    fn game_result(&mut self, outcome: GameOutcome) {
        self.sink.write_line(outcome.title());
    }
}

/// Keeps the text lines in memory. Clones share the same buffer, so a copy
/// kept outside the engine sees everything the engine reported.
#[derive(Clone, Debug, Default)]
pub struct RecordingCallback {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(mut lines) => std::mem::take(&mut *lines),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn push(&self, line: String) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

impl GameCallback for RecordingCallback {
    fn pac_man_location_changed(&mut self, location: Vec2, score: i32, pills_eaten: usize) {
        self.push(pac_man_location_line(location, score, pills_eaten));
    }

    fn monster_location_changed(&mut self, kind: MonsterKind, location: Vec2) {
        self.push(monster_location_line(kind, location));
    }

    fn pac_man_ate(&mut self, location: Vec2, kind: ItemKind) {
        self.push(pac_man_ate_line(location, kind));
    }

    fn game_result(&mut self, outcome: GameOutcome) {
        self.push(outcome.title().to_string());
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullCallback;

impl GameCallback for NullCallback {
    fn pac_man_location_changed(&mut self, _location: Vec2, _score: i32, _pills_eaten: usize) {}
    fn monster_location_changed(&mut self, _kind: MonsterKind, _location: Vec2) {}
    fn pac_man_ate(&mut self, _location: Vec2, _kind: ItemKind) {}
    fn game_result(&mut self, _outcome: GameOutcome) {}
}

/// Writes `Level <file> - <problem>` and folder lines, one per diagnostic.
#[derive(Debug)]
pub struct EditorErrorLog<W: Write> {
    sink: LineSink<W>,
}

impl<W: Write> EditorErrorLog<W> {
    pub fn new(out: W) -> Self {
        Self {
            sink: LineSink::new(out, "editor-log"),
        }
    }

    pub fn into_inner(self) -> W {
        self.sink.out
    }
}

impl EditorErrorLog<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> EditorErrorCallback for EditorErrorLog<W> {
    fn level_invalid(&mut self, report: &ValidationReport) {
        for line in report.lines() {
            self.sink.write_line(&line);
        }
    }

    fn folder_invalid(&mut self, diagnostic: &FolderDiagnostic) {
        self.sink.write_line(&diagnostic.to_string());
    }
}
