//! Engine launch: command-line construction, the launch sequence and the
//! saved-game listing that feeds it.

pub mod launcher;
pub mod saves;

pub use launcher::{EngineEntry, GameLauncher, LaunchError, ProcessEngine};
pub use saves::{default_saves_dir, list_saved_games, SavedGame};

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::path::PathBuf;

/// Map loaded for a new campaign.
pub const NEW_GAME_MAP: &str = "game/mars_city1";

/// Game directory of the mission pack.
pub const MISSION_PACK_DIR: &str = "d3xp";

/// Skill level passed to the engine as `g_skill`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const fn skill(self) -> u8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
        }
    }

    pub const fn from_skill(skill: u8) -> Option<Self> {
        match skill {
            0 => Some(Difficulty::Easy),
            1 => Some(Difficulty::Normal),
            2 => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Normal => write!(f, "Normal"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// Everything the menus decide before the engine starts
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaunchOptions {
    /// Engine binary; becomes `argv[0]`.
    pub executable: PathBuf,
    pub difficulty: Option<Difficulty>,
    /// Start the campaign from its first map.
    pub new_game: bool,
    pub mission_pack: bool,
    /// Save file name as listed in the saves directory.
    pub saved_game: Option<String>,
}

impl LaunchOptions {
    /// Engine arguments, program name first.
    pub fn build_args(&self) -> Vec<String> {
        let mut argv = vec![self.executable.to_string_lossy().into_owned()];

        if let Some(difficulty) = self.difficulty {
            argv.push("+set".to_string());
            argv.push("g_skill".to_string());
            argv.push(difficulty.skill().to_string());
        }

        if self.new_game {
            argv.push("+map".to_string());
            argv.push(NEW_GAME_MAP.to_string());
        }

        if self.mission_pack {
            argv.push("+set".to_string());
            argv.push("fs_game".to_string());
            argv.push(MISSION_PACK_DIR.to_string());
        }

        if let Some(save) = self.saved_game.as_deref().filter(|s| !s.is_empty()) {
            argv.push("+loadGame".to_string());
            argv.push(save.to_string());
        }

        argv
    }
}

/// Arguments joined the way the engine logs its command line.
pub fn command_line(argv: &[String]) -> String {
    argv.iter().map(|arg| format!(" {arg}")).collect()
}
