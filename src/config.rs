//! Application settings persisted as TOML.
//!
//! Every section has sensible defaults, and a missing or unreadable file
//! degrades to them so the shell always starts.

use crate::controller::joystick::{JoystickSettings, Tint};
use crate::geometry::{Rect, Size};
use crate::launch::{default_saves_dir, Difficulty, GameLauncher, LaunchOptions};
use crate::launch::launcher::Configuring;
use crate::mapping::engine_bridge::DEFAULT_AXIS_SCALE;
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "touchshell";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub screen: ScreenConfig,
    pub joystick: JoystickConfig,
    pub controls: ControlsConfig,
    pub engine: EngineConfig,
}

/// Host surface size in points.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

impl ScreenConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct JoystickConfig {
    /// Side length of the square control.
    pub size: f64,
    pub movable: bool,
    pub movable_bounds: Option<Rect>,
    pub alpha: f64,
    /// Lets the game show through the base.
    pub base_alpha: f64,
    pub handle_tint: Tint,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            size: 100.0,
            movable: false,
            movable_bounds: None,
            alpha: 0.5,
            base_alpha: 0.5,
            handle_tint: Tint::DARK_GRAY,
        }
    }
}

impl JoystickConfig {
    pub fn settings(&self) -> JoystickSettings {
        JoystickSettings {
            movable: self.movable,
            movable_bounds: self.movable_bounds,
            alpha: self.alpha,
            base_alpha: self.base_alpha,
            handle_tint: self.handle_tint,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Joystick axis ratio to engine axis units.
    pub axis_scale: f64,
    /// Aim by tilting the device.
    pub tilt_aiming: bool,
    /// Capacity of the touch and engine event channels.
    pub event_buffer: usize,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            axis_scale: DEFAULT_AXIS_SCALE,
            tilt_aiming: false,
            event_buffer: 256,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub executable: PathBuf,
    pub game_dir: String,
    pub mission_pack: bool,
    pub difficulty: Difficulty,
    /// Save to resume instead of starting a new campaign.
    pub load_game: Option<String>,
    /// Overrides the engine's default save location.
    pub saves_dir: Option<PathBuf>,
    /// Pause between showing the loading screen and starting the engine.
    pub launch_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::new(),
            game_dir: "base".to_string(),
            mission_pack: false,
            difficulty: Difficulty::Normal,
            load_game: None,
            saves_dir: None,
            launch_delay_ms: 1000,
        }
    }
}

impl EngineConfig {
    pub fn saves_dir(&self) -> PathBuf {
        self.saves_dir
            .clone()
            .unwrap_or_else(|| default_saves_dir(&self.game_dir))
    }

    /// Launch options before any menu choice.
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            executable: self.executable.clone(),
            mission_pack: self.mission_pack,
            ..Default::default()
        }
    }

    /// Launcher for the configured start: the named save, or a new game.
    pub fn launcher(&self) -> GameLauncher<Configuring> {
        let launcher = GameLauncher::create(self.launch_options());
        match self.load_game.as_deref() {
            Some(save) if !save.is_empty() => launcher.load_game(save),
            _ => launcher.new_game(self.difficulty),
        }
    }
}

impl AppConfig {
    /// `<config dir>/touchshell/config.toml`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| {
                warn!("Could not determine config directory, using current directory");
                PathBuf::from(".")
            });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when it is missing or invalid.
    pub async fn load_or_default(path: &Path) -> Self {
        match tokio::fs::try_exists(path).await {
            Ok(true) => {}
            Ok(false) => {
                info!("No config at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("Unable to check config {}: {}", path.display(), e);
                return Self::default();
            }
        }

        match Self::load(path).await {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn set_tilt_aiming(&mut self, enabled: bool) {
        self.controls.tilt_aiming = enabled;
    }
}
