use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const MAP_EXTENSIONS: [&str; 3] = ["map", "txt", "json"];

/// Folder-level problems that stop a level folder from being played.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FolderDiagnostic {
    #[error("{folder} - no maps found")]
    NoMapsFound { folder: String },
    #[error("{folder} - multiple maps at the same level: {}", .files.join("; "))]
    DuplicateLevel {
        folder: String,
        number: u64,
        files: Vec<String>,
    },
}

/// A map file of a level folder and the level number its name starts with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelFile {
    pub number: u64,
    pub name: String,
    pub path: PathBuf,
}

/// Leading digits of a candidate file name, or `None` when the name does not
/// qualify as a level map.
pub fn level_number(file_name: &str) -> Option<u64> {
    let (_, extension) = file_name.split_once('.')?;
    if !MAP_EXTENSIONS.contains(&extension) {
        return None;
    }
    let digits: String = file_name
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Lists the playable maps of `dir` in level order. An unreadable folder is
/// treated like an empty one.
pub fn discover_levels(dir: &Path) -> Result<Vec<LevelFile>, Vec<FolderDiagnostic>> {
    let folder = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());

    let mut by_number: BTreeMap<u64, Vec<LevelFile>> = BTreeMap::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(number) = level_number(&name) {
                by_number
                    .entry(number)
                    .or_default()
                    .push(LevelFile { number, name, path });
            }
        }
    }

    if by_number.is_empty() {
        return Err(vec![FolderDiagnostic::NoMapsFound { folder }]);
    }

    let mut diagnostics = Vec::new();
    let mut levels = Vec::new();
    for (number, mut files) in by_number {
        if files.len() > 1 {
            files.sort_by(|a, b| a.name.cmp(&b.name));
            diagnostics.push(FolderDiagnostic::DuplicateLevel {
                folder: folder.clone(),
                number,
                files: files.into_iter().map(|file| file.name).collect(),
            });
        } else {
            levels.extend(files);
        }
    }

    if diagnostics.is_empty() {
        Ok(levels)
    } else {
        Err(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!(
            "torusverse-levels-{tag}-{}-{nanos}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "P.o\n..g\n").expect("write map");
    }

    #[test]
    fn names_must_start_with_a_digit_and_use_a_map_extension() {
        assert_eq!(level_number("12_castle.txt"), Some(12));
        assert_eq!(level_number("3.map"), Some(3));
        assert_eq!(level_number("04maze.json"), Some(4));
        assert_eq!(level_number("castle_1.txt"), None);
        assert_eq!(level_number("1_castle.xml"), None);
        assert_eq!(level_number("1_castle.backup.txt"), None);
        assert_eq!(level_number("7"), None);
    }

    #[test]
    fn levels_come_back_in_numeric_order() {
        let dir = scratch_dir("order");
        touch(&dir, "10_end.txt");
        touch(&dir, "2_middle.map");
        touch(&dir, "1_start.json");
        touch(&dir, "notes.txt");
        fs::create_dir_all(dir.join("5_folder.txt")).expect("nested dir");

        let levels = discover_levels(&dir).expect("valid folder");
        let names: Vec<&str> = levels.iter().map(|level| level.name.as_str()).collect();
        assert_eq!(names, vec!["1_start.json", "2_middle.map", "10_end.txt"]);
        assert_eq!(levels[2].number, 10);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn duplicate_numbers_are_reported_per_level() {
        let dir = scratch_dir("dupes");
        touch(&dir, "1_a.txt");
        touch(&dir, "01_b.txt");
        touch(&dir, "2_c.txt");

        let diagnostics = discover_levels(&dir).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        let folder = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert_eq!(
            diagnostics[0].to_string(),
            format!("{folder} - multiple maps at the same level: 01_b.txt; 1_a.txt")
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_or_missing_folder_has_no_maps() {
        let dir = scratch_dir("empty");
        touch(&dir, "readme.md");
        let diagnostics = discover_levels(&dir).unwrap_err();
        assert!(matches!(
            diagnostics.as_slice(),
            [FolderDiagnostic::NoMapsFound { .. }]
        ));
        fs::remove_dir_all(&dir).ok();

        let missing = std::env::temp_dir().join("torusverse-levels-does-not-exist");
        assert_eq!(
            discover_levels(&missing).unwrap_err(),
            vec![FolderDiagnostic::NoMapsFound {
                folder: "torusverse-levels-does-not-exist".to_string()
            }]
        );
    }
}
