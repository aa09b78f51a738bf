//! Controller Handle - owns the touch controls on a dedicated task
//!
//! The platform layer delivers touches from wherever it receives them; the
//! handle funnels them through a channel into one task that holds the
//! [`TouchControls`]. That task is the only place control state is touched,
//! which keeps every handler synchronous and lock-free.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub use super::touch_controls::{TouchControls, TouchEvent};

/// Errors from the controller task
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The controller task is no longer receiving touches
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// The controller task panicked or was aborted
    #[error("Controller task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

/// Handle for the task that owns the touch controls
///
/// Dropping every sender (including the handle's own, via
/// [`shutdown`](Self::shutdown)) ends the task.
pub struct ControllerHandle {
    sender: mpsc::Sender<TouchEvent>,
    task: JoinHandle<TouchControls>,
}

impl ControllerHandle {
    /// Moves `controls` into a new task fed by a channel of `capacity` touches.
    pub fn spawn(controls: TouchControls, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        debug!("Created touch channel with buffer capacity {}", capacity.max(1));

        let task = tokio::spawn(run_controller_loop(controls, receiver));
        info!("Controller task spawned");

        Self { sender, task }
    }

    /// A sender for touch events.
    pub fn sender(&self) -> mpsc::Sender<TouchEvent> {
        self.sender.clone()
    }

    /// Queues one touch event, waiting for room in the channel.
    pub async fn send(&self, event: TouchEvent) -> Result<(), ControllerError> {
        self.sender.send(event).await.map_err(|e| {
            error!("Failed to queue touch event: {}", e);
            ControllerError::ChannelError(format!("Failed to send touch event: {}", e))
        })
    }

    /// Closes this handle's sender and waits for the task to drain.
    ///
    /// Returns the controls once every other sender has been dropped too.
    pub async fn shutdown(self) -> Result<TouchControls, ControllerError> {
        info!("Shutting down controller task");
        drop(self.sender);
        Ok(self.task.await?)
    }
}

async fn run_controller_loop(
    mut controls: TouchControls,
    mut receiver: mpsc::Receiver<TouchEvent>,
) -> TouchControls {
    info!("Controller loop started");
    let mut handled: u64 = 0;

    while let Some(event) = receiver.recv().await {
        debug!("Touch event: {:?}", event);
        controls.handle(event);
        handled += 1;
    }

    info!("Controller loop finished after {} touch events", handled);
    controls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::joystick::JoystickSettings;
    use crate::geometry::{Point, Size};
    use crate::mapping::engine_bridge::DEFAULT_AXIS_SCALE;
    use crate::mapping::{EngineBridge, EngineEvent, EngineKey};

    fn controls() -> (TouchControls, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(32);
        let controls = TouchControls::new(
            Size::new(1000.0, 600.0),
            100.0,
            JoystickSettings::default(),
            EngineBridge::new(tx, DEFAULT_AXIS_SCALE),
        )
        .unwrap();
        (controls, rx)
    }

    #[tokio::test]
    async fn events_are_handled_in_order() {
        let (controls, mut engine_rx) = controls();
        let handle = ControllerHandle::spawn(controls, 8);

        let fire = Point::new(850.0, 520.0);
        handle
            .send(TouchEvent::Began { id: 1, point: fire })
            .await
            .unwrap();
        handle
            .send(TouchEvent::Ended { id: 1, point: fire })
            .await
            .unwrap();

        let controls = handle.shutdown().await.unwrap();
        assert_eq!(controls.active_touches(), 0);

        assert_eq!(
            engine_rx.recv().await,
            Some(EngineEvent::Key {
                key: EngineKey::RightCtrl,
                pressed: true
            })
        );
        assert_eq!(
            engine_rx.recv().await,
            Some(EngineEvent::Key {
                key: EngineKey::RightCtrl,
                pressed: false
            })
        );
    }

    #[tokio::test]
    async fn extra_senders_feed_the_same_task() {
        let (controls, _engine_rx) = controls();
        let handle = ControllerHandle::spawn(controls, 0);
        let sender = handle.sender();

        sender
            .send(TouchEvent::Began {
                id: 9,
                point: Point::new(130.0, 500.0),
            })
            .await
            .unwrap();
        drop(sender);

        let controls = handle.shutdown().await.unwrap();
        assert_eq!(controls.active_touches(), 1);
        assert!((controls.joystick().displacement() - 0.6).abs() < 1e-9);
    }
}
