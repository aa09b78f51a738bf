//! Launch sequence with statum state machine
//!
//! ```text
//! Configuring ──prepare──► Prepared ──launch──► Launched
//! ```
//!
//! Options can only be changed while configuring; the argument vector is
//! frozen by `prepare` and handed unchanged to the engine entry point.

use super::{command_line, Difficulty, LaunchOptions};
use statum::{machine, state};
use std::process::Command;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("No engine executable configured")]
    MissingExecutable,

    #[error("Conflicting launch options: {0}")]
    ConflictingOptions(String),

    #[error("Failed to start engine: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Engine exited with status {0}")]
    EngineExit(i32),
}

/// The engine's entry point
///
/// Receives the full argument vector, program name first, and blocks until
/// the engine returns its exit code.
pub trait EngineEntry {
    fn startup(&mut self, argv: &[String]) -> Result<i32, LaunchError>;
}

/// Runs the engine as a child process and waits for it.
#[derive(Debug, Default, Clone)]
pub struct ProcessEngine;

impl EngineEntry for ProcessEngine {
    fn startup(&mut self, argv: &[String]) -> Result<i32, LaunchError> {
        let (program, args) = argv.split_first().ok_or(LaunchError::MissingExecutable)?;
        info!("Spawning engine process {}", program);

        let status = Command::new(program).args(args).status()?;
        // Killed by a signal: no exit code.
        Ok(status.code().unwrap_or(-1))
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum LaunchState {
    Configuring,
    Prepared,
    Launched,
}

#[machine]
pub struct GameLauncher<S: LaunchState> {
    options: LaunchOptions,
    argv: Vec<String>,
}

impl<S: LaunchState> GameLauncher<S> {
    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }
}

impl GameLauncher<Configuring> {
    pub fn create(options: LaunchOptions) -> Self {
        debug!("Creating launcher with options: {:?}", options);
        Self::new(options, Vec::new())
    }

    /// Starts a new campaign at the given skill.
    pub fn new_game(mut self, difficulty: Difficulty) -> Self {
        self.options.difficulty = Some(difficulty);
        self.options.new_game = true;
        self
    }

    pub fn load_game(mut self, save: impl Into<String>) -> Self {
        self.options.saved_game = Some(save.into());
        self
    }

    pub fn mission_pack(mut self, enabled: bool) -> Self {
        self.options.mission_pack = enabled;
        self
    }

    /// Validates the options and freezes the argument vector.
    pub fn prepare(mut self) -> Result<GameLauncher<Prepared>, LaunchError> {
        if self.options.executable.as_os_str().is_empty() {
            return Err(LaunchError::MissingExecutable);
        }

        let loading = self
            .options
            .saved_game
            .as_deref()
            .is_some_and(|s| !s.is_empty());
        if self.options.new_game && loading {
            return Err(LaunchError::ConflictingOptions(
                "a new game cannot also load a saved game".to_string(),
            ));
        }

        self.argv = self.options.build_args();
        info!("Prepared engine command line:{}", command_line(&self.argv));
        Ok(self.transition())
    }
}

impl GameLauncher<Prepared> {
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn command_line(&self) -> String {
        command_line(&self.argv)
    }

    /// Hands the arguments to the engine and waits for it to return.
    pub fn launch<E: EngineEntry>(
        self,
        engine: &mut E,
    ) -> Result<GameLauncher<Launched>, LaunchError> {
        info!("Launching engine with {} arguments", self.argv.len());

        let code = engine.startup(&self.argv)?;
        if code != 0 {
            error!("Engine exited with status {}", code);
            return Err(LaunchError::EngineExit(code));
        }

        info!("Engine exited cleanly");
        Ok(self.transition())
    }
}

impl GameLauncher<Launched> {
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}
