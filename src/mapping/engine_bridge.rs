//! Engine bridge - pushes button and joystick input to the engine channel
//!
//! Runs on the thread that owns the touch controls, so sends never wait:
//! events go out with `try_send` and a full or closed channel is logged and
//! reported instead of blocking the event handler.
//!
//! Axis values are absolute, so an axis pair that finds the channel full is
//! kept and resent by the next [`flush_pending_axes`](EngineBridge::flush_pending_axes).
//! A newer pair replaces it.

use crate::controller::joystick::JoystickListener;
use crate::controller::touch_controls::ButtonKind;
use crate::mapping::keys::{action_for, ButtonAction, ControllerAxis, EngineKey};
use crate::mapping::{EngineEvent, MappingError};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default multiplier from joystick axis ratio to engine axis units.
pub const DEFAULT_AXIS_SCALE: f64 = 10.0;

#[derive(Clone, Debug)]
pub struct EngineBridge {
    sender: mpsc::Sender<EngineEvent>,
    axis_scale: f64,
    /// Latest axis pair the channel had no room for, shared by all clones.
    pending_axes: Arc<Mutex<Option<[EngineEvent; 2]>>>,
}

impl EngineBridge {
    pub fn new(sender: mpsc::Sender<EngineEvent>, axis_scale: f64) -> Self {
        Self {
            sender,
            axis_scale,
            pending_axes: Arc::new(Mutex::new(None)),
        }
    }

    pub fn axis_scale(&self) -> f64 {
        self.axis_scale
    }

    pub fn send(&self, event: EngineEvent) -> Result<(), MappingError> {
        match self.sender.try_send(event) {
            Ok(()) => {
                debug!("Forwarded {:?}", event);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                Err(MappingError::ChannelFull(format!("{event:?}")))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(MappingError::ChannelClosed),
        }
    }

    pub fn key_event(&self, key: EngineKey, pressed: bool) -> Result<(), MappingError> {
        self.send(EngineEvent::Key { key, pressed })
    }

    /// Emits whatever a touch down on `kind` maps to.
    pub fn button_pressed(&self, kind: ButtonKind) -> Result<(), MappingError> {
        match action_for(kind) {
            ButtonAction::Key(key) => {
                info!("{:?} pressed -> {}", kind, key);
                self.key_event(key, true)
            }
            ButtonAction::Wheel(y) => {
                info!("{:?} pressed -> wheel {}", kind, y);
                self.send(EngineEvent::MouseWheel { y })
            }
            ButtonAction::ToggleStack => Ok(()),
        }
    }

    /// Emits whatever a touch up on `kind` maps to.
    pub fn button_released(&self, kind: ButtonKind) -> Result<(), MappingError> {
        match action_for(kind) {
            ButtonAction::Key(key) => {
                debug!("{:?} released -> {}", kind, key);
                self.key_event(key, false)
            }
            ButtonAction::Wheel(_) | ButtonAction::ToggleStack => Ok(()),
        }
    }

    pub fn has_pending_axes(&self) -> bool {
        self.pending_axes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Resends an axis pair that earlier found the channel full.
    pub fn flush_pending_axes(&self) -> Result<(), MappingError> {
        let pending = self
            .pending_axes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(events) => {
                debug!("Resending pending joystick axes");
                self.send_axes(events)
            }
            None => Ok(()),
        }
    }

    /// Sends both events of an axis pair, keeping the pair if the channel is full.
    fn send_axes(&self, events: [EngineEvent; 2]) -> Result<(), MappingError> {
        for event in events {
            if let Err(e) = self.send(event) {
                if matches!(e, MappingError::ChannelFull(_)) {
                    *self
                        .pending_axes
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) = Some(events);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Engine axis events for a joystick axis pair, forward axis first.
    ///
    /// `y` is positive upward; the engine's forward axis is positive
    /// downward, hence the sign flip. Fractions truncate toward zero.
    pub fn axis_events(&self, x: f64, y: f64) -> [EngineEvent; 2] {
        let forward = ((y * self.axis_scale) as i16).saturating_neg();
        let turn = (x * self.axis_scale) as i16;
        [
            EngineEvent::Axis {
                axis: ControllerAxis::LeftY,
                value: forward,
            },
            EngineEvent::Axis {
                axis: ControllerAxis::RightX,
                value: turn,
            },
        ]
    }
}

impl JoystickListener for EngineBridge {
    fn on_joystick(&mut self, angle: f64, displacement: f64) {
        debug!("Joystick angle {:.1} displacement {:.2}", angle, displacement);
    }

    fn on_joystick_axes(&mut self, x: f64, y: f64) {
        // A newer pair supersedes anything still waiting.
        self.pending_axes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Err(e) = self.send_axes(self.axis_events(x, y)) {
            warn!("Failed to forward joystick axes: {}", e);
        }
    }
}
