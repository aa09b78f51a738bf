//! Saved-game discovery for the load menu.

use chrono::{DateTime, Local};
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files whose name contains this are save games.
const SAVE_MARKER: &str = ".save";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedGame {
    /// File name, passed to the engine as-is.
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<DateTime<Local>>,
}

/// Where the engine writes saves for `game_dir`.
pub fn default_saves_dir(game_dir: &str) -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| {
        warn!("Could not determine data directory, using current directory");
        PathBuf::from(".")
    });
    path.push("dhewm3");
    path.push(game_dir);
    path.push("savegames");
    path
}

/// Lists the save files in `dir`, sorted by name.
///
/// A missing directory means no saves yet and yields an empty list.
pub async fn list_saved_games(dir: &Path) -> Result<Vec<SavedGame>> {
    if !tokio::fs::try_exists(dir)
        .await
        .map_err(|e| eyre!("Failed to check saves directory {}: {}", dir.display(), e))?
    {
        debug!("Saves directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| eyre!("Failed to read saves directory {}: {}", dir.display(), e))?;

    let mut saves = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| eyre!("Failed to read directory entry: {}", e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.contains(SAVE_MARKER) {
            continue;
        }

        let path = entry.path();
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| eyre!("Failed to get metadata for {}: {}", path.display(), e))?;
        if !metadata.is_file() {
            continue;
        }

        let modified = metadata.modified().ok().map(DateTime::<Local>::from);
        debug!("Found save: {}", name);
        saves.push(SavedGame {
            name,
            path,
            modified,
        });
    }

    saves.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(saves)
}
