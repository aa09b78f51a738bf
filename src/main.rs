use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use touchshell::config::AppConfig;
use touchshell::controller::{ControllerHandle, TouchControls};
use touchshell::launch::{list_saved_games, ProcessEngine};
use touchshell::mapping::{EngineBridge, EngineEvent};
use touchshell::touch_script;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load_or_default(&config_path).await;
    info!("Using config {}", config_path.display());

    let saves_dir = config.engine.saves_dir();
    match list_saved_games(&saves_dir).await {
        Ok(saves) => {
            info!("{} saved games in {}", saves.len(), saves_dir.display());
            for save in saves {
                debug!("Save {} modified {:?}", save.name, save.modified);
            }
        }
        Err(e) => warn!("Unable to list saved games: {}", e),
    }

    let buffer = config.controls.event_buffer.max(1);
    let (engine_tx, engine_rx) = mpsc::channel(buffer);
    let forwarder = tokio::spawn(forward_engine_events(engine_rx));

    info!("Building touch controls for {:?}", config.screen.size());
    let bridge = EngineBridge::new(engine_tx, config.controls.axis_scale);
    let controls = TouchControls::new(
        config.screen.size(),
        config.joystick.size,
        config.joystick.settings(),
        bridge,
    )
    .map_err(|e| eyre!("Failed to build touch controls: {}", e))?;

    let controller = ControllerHandle::spawn(controls, buffer);
    replay_touch_script(&controller).await?;

    let controls = controller
        .shutdown()
        .await
        .map_err(|e| eyre!("Controller did not shut down cleanly: {}", e))?;
    info!(
        "Touch input finished, {} touches still down",
        controls.active_touches()
    );
    // Drops the last engine senders so the forwarder drains and exits.
    drop(controls);

    let forwarded = forwarder.await?;
    info!("Forwarded {} engine events", forwarded);

    launch_engine(&config).await
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

/// Feeds touch commands from stdin into the controller until EOF.
async fn replay_touch_script(controller: &ControllerHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let events = match touch_script::parse_line(&line) {
            Ok(events) => events,
            Err(e) => {
                warn!("Skipping script line {}: {}", line_number, e);
                continue;
            }
        };

        for event in events {
            controller
                .send(event)
                .await
                .map_err(|e| eyre!("Controller stopped accepting touches: {}", e))?;
        }
    }

    info!("Touch script finished after {} lines", line_number);
    Ok(())
}

/// Stand-in for the engine's input queue: logs every event it receives.
async fn forward_engine_events(mut receiver: mpsc::Receiver<EngineEvent>) -> usize {
    let mut count = 0;
    while let Some(event) = receiver.recv().await {
        match event {
            EngineEvent::Key { key, pressed } => {
                info!("Engine key {} ({}) pressed={}", key, key.keycode(), pressed)
            }
            EngineEvent::Axis { axis, value } => {
                info!("Engine axis {} = {}", axis.index(), value)
            }
            EngineEvent::MouseWheel { y } => info!("Engine wheel {}", y),
        }
        count += 1;
    }
    count
}

async fn launch_engine(config: &AppConfig) -> Result<()> {
    let executable = &config.engine.executable;
    if executable.as_os_str().is_empty() || !tokio::fs::try_exists(executable).await? {
        info!("No engine executable found, not launching");
        return Ok(());
    }

    // Leave the loading screen up before the engine takes over.
    tokio::time::sleep(Duration::from_millis(config.engine.launch_delay_ms)).await;

    let launcher = config.engine.launcher();
    let result = tokio::task::spawn_blocking(move || {
        let prepared = launcher.prepare()?;
        info!("Starting engine:{}", prepared.command_line());
        prepared.launch(&mut ProcessEngine)
    })
    .await?;

    match result {
        Ok(launched) => {
            info!("Engine run with {} arguments completed", launched.argv().len());
            Ok(())
        }
        Err(e) => {
            error!("Engine launch failed: {}", e);
            Err(eyre!("Engine launch failed: {}", e))
        }
    }
}
