//! In-game touch controls: one joystick plus a set of buttons.
//!
//! [`TouchControls`] owns every on-screen control for the game screen. It is
//! built once when the screen is set up and receives raw [`TouchEvent`]s,
//! routing each touch to the control it started on until that touch ends.
//!
//! Default layout for a `w`×`h` screen:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ [>][ESC][QS][QL]                       [F1] │
//! │                                             │
//! │                ┌─────────────┐              │
//! │                │ prev weapon │       [JUMP] │
//! │  (joystick)    ├─────────────┤    [FIRE]    │
//! │ [PDA]          │ next weapon │              │
//! └─────────────────────────────────────────────┘
//! ```

use crate::controller::joystick::{radius_for_size, JoystickError, JoystickSettings, JoystickView};
use crate::geometry::{Point, Rect, Size};
use crate::mapping::keys::{action_for, ButtonAction};
use crate::mapping::EngineBridge;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const JOYSTICK_MARGIN: f64 = 50.0;
const STACK_ORIGIN: Point = Point::new(50.0, 50.0);
const STACK_SPACING: f64 = 8.0;
const STACK_HEIGHT: f64 = 30.0;
const EXPAND_WIDTH: f64 = 50.0;
const STACK_BUTTON_WIDTH: f64 = 60.0;
const IDLE_ALPHA: f64 = 0.5;

/// Identifier the platform assigns to a finger for the duration of a touch.
pub type TouchId = u64;

/// Raw touch input in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Began { id: TouchId, point: Point },
    Moved { id: TouchId, point: Point },
    Ended { id: TouchId, point: Point },
    Cancelled { id: TouchId },
    DoubleTap { point: Point },
}

/// Every button on the game screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonKind {
    Fire,
    Jump,
    Expand,
    Escape,
    QuickSave,
    QuickLoad,
    Flashlight,
    Pda,
    PrevWeapon,
    NextWeapon,
}

/// Buttons shown in the collapsible stack, left to right.
const STACK: [ButtonKind; 4] = [
    ButtonKind::Expand,
    ButtonKind::Escape,
    ButtonKind::QuickSave,
    ButtonKind::QuickLoad,
];

#[derive(Clone, Debug, PartialEq)]
pub struct TouchButton {
    pub kind: ButtonKind,
    pub title: &'static str,
    pub frame: Rect,
    pub alpha: f64,
    pub hidden: bool,
    pub pressed: bool,
}

impl TouchButton {
    fn new(kind: ButtonKind, title: &'static str, frame: Rect, alpha: f64) -> Self {
        Self {
            kind,
            title,
            frame,
            alpha,
            hidden: false,
            pressed: false,
        }
    }

    fn hit(&self, point: Point) -> bool {
        !self.hidden && self.frame.contains(point)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TouchTarget {
    Joystick,
    Button(ButtonKind),
}

pub struct TouchControls {
    screen: Rect,
    joystick: JoystickView,
    /// Hit-test order: earlier entries sit on top.
    buttons: Vec<TouchButton>,
    stack_expanded: bool,
    bridge: EngineBridge,
    active_touches: HashMap<TouchId, TouchTarget>,
}

impl TouchControls {
    /// Lays out the controls for a screen of `screen` points.
    ///
    /// The joystick is a `joystick_size` square in the lower left corner and
    /// reports to `bridge`. A size that is not positive and finite is
    /// rejected with [`JoystickError::InvalidRadius`].
    pub fn new(
        screen: Size,
        joystick_size: f64,
        joystick_settings: JoystickSettings,
        bridge: EngineBridge,
    ) -> Result<Self, JoystickError> {
        radius_for_size(joystick_size)?;
        let screen = Rect::from_origin_size(Point::ZERO, screen);
        let joystick_frame = joystick_home(screen.size(), joystick_size);

        let mut joystick = JoystickView::new(joystick_frame, screen, joystick_settings)?;
        joystick.set_listener(Box::new(bridge.clone()));

        let mut controls = Self {
            screen,
            joystick,
            buttons: layout_buttons(screen.size()),
            stack_expanded: false,
            bridge,
            active_touches: HashMap::new(),
        };
        controls.apply_stack_state();

        info!(
            "Touch controls ready for {}x{} screen with {} buttons",
            screen.width(),
            screen.height(),
            controls.buttons.len()
        );
        Ok(controls)
    }

    pub fn handle(&mut self, event: TouchEvent) {
        if let Err(e) = self.bridge.flush_pending_axes() {
            debug!("Joystick axes still pending: {}", e);
        }

        match event {
            TouchEvent::Began { id, point } => self.touch_began(id, point),
            TouchEvent::Moved { id, point } => self.touch_moved(id, point),
            TouchEvent::Ended { id, point } => self.touch_ended(id, Some(point)),
            TouchEvent::Cancelled { id } => self.touch_ended(id, None),
            TouchEvent::DoubleTap { point } => {
                if self.joystick.contains(point) {
                    self.joystick.reset_frame();
                }
            }
        }
    }

    pub fn joystick(&self) -> &JoystickView {
        &self.joystick
    }

    pub fn joystick_mut(&mut self) -> &mut JoystickView {
        &mut self.joystick
    }

    pub fn buttons(&self) -> &[TouchButton] {
        &self.buttons
    }

    pub fn button(&self, kind: ButtonKind) -> Option<&TouchButton> {
        self.buttons.iter().find(|b| b.kind == kind)
    }

    pub fn is_stack_expanded(&self) -> bool {
        self.stack_expanded
    }

    pub fn screen(&self) -> Rect {
        self.screen
    }

    /// Number of fingers currently tracked.
    pub fn active_touches(&self) -> usize {
        self.active_touches.len()
    }

    /// Re-lays out every control after the host surface changed size.
    ///
    /// The joystick returns to its corner of the new screen. A touch holding
    /// it is cancelled first so the engine sees the axes centre.
    pub fn resize(&mut self, screen: Size) {
        let holding = self.active_touches.len();
        self.active_touches
            .retain(|_, target| *target != TouchTarget::Joystick);
        if self.active_touches.len() != holding {
            self.joystick.on_pointer_cancelled();
        }

        self.screen = Rect::from_origin_size(Point::ZERO, screen);
        self.buttons = layout_buttons(screen);
        self.apply_stack_state();
        self.joystick.set_parent_bounds(self.screen);
        let home = joystick_home(screen, self.joystick.frame().width());
        self.joystick.place_at(home.mid());
        info!("Touch controls resized to {}x{}", screen.width, screen.height);
    }

    /// Shows or hides the secondary buttons.
    pub fn toggle_stack(&mut self) {
        self.stack_expanded = !self.stack_expanded;
        debug!("Button stack expanded: {}", self.stack_expanded);
        self.apply_stack_state();
    }

    fn touch_began(&mut self, id: TouchId, point: Point) {
        if let Some(kind) = self.buttons.iter().find(|b| b.hit(point)).map(|b| b.kind) {
            self.set_pressed(kind, true);
            if let Err(e) = self.bridge.button_pressed(kind) {
                warn!("Failed to forward {:?} press: {}", kind, e);
            }
            self.active_touches.insert(id, TouchTarget::Button(kind));
            return;
        }

        if self.joystick.contains(point) {
            if self.active_touches.values().any(|t| *t == TouchTarget::Joystick) {
                debug!("Joystick already tracking a touch, ignoring touch {}", id);
                return;
            }
            self.joystick.on_pointer_down(point);
            self.active_touches.insert(id, TouchTarget::Joystick);
            return;
        }

        debug!("Touch {} at {:?} hit no control", id, point);
    }

    fn touch_moved(&mut self, id: TouchId, point: Point) {
        // Buttons don't track drags; the joystick keeps its touch even off its frame.
        if let Some(TouchTarget::Joystick) = self.active_touches.get(&id) {
            self.joystick.on_pointer_move(point);
        }
    }

    /// `point` is `None` when the touch was cancelled.
    fn touch_ended(&mut self, id: TouchId, point: Option<Point>) {
        match self.active_touches.remove(&id) {
            Some(TouchTarget::Joystick) => match point {
                Some(_) => self.joystick.on_pointer_up(),
                None => self.joystick.on_pointer_cancelled(),
            },
            Some(TouchTarget::Button(kind)) => {
                self.set_pressed(kind, false);

                if action_for(kind) == ButtonAction::ToggleStack {
                    let inside = match (point, self.button(kind)) {
                        (Some(p), Some(button)) => button.frame.contains(p),
                        _ => false,
                    };
                    if inside {
                        self.toggle_stack();
                    }
                    return;
                }

                if let Err(e) = self.bridge.button_released(kind) {
                    warn!("Failed to forward {:?} release: {}", kind, e);
                }
            }
            None => debug!("End of untracked touch {}", id),
        }
    }

    fn set_pressed(&mut self, kind: ButtonKind, pressed: bool) {
        if let Some(button) = self.buttons.iter_mut().find(|b| b.kind == kind) {
            button.pressed = pressed;
        }
    }

    /// Updates visibility, titles and frames of the stack buttons.
    fn apply_stack_state(&mut self) {
        let expanded = self.stack_expanded;
        let mut x = STACK_ORIGIN.x;

        for kind in STACK {
            let Some(button) = self.buttons.iter_mut().find(|b| b.kind == kind) else {
                continue;
            };

            if kind == ButtonKind::Expand {
                button.title = if expanded { " < " } else { " > " };
                button.alpha = if expanded { 1.0 } else { IDLE_ALPHA };
            } else {
                button.hidden = !expanded;
                button.alpha = if expanded { 1.0 } else { 0.0 };
            }

            if button.hidden {
                continue;
            }
            let width = if kind == ButtonKind::Expand {
                EXPAND_WIDTH
            } else {
                STACK_BUTTON_WIDTH
            };
            button.frame = Rect::from_xywh(x, STACK_ORIGIN.y, width, STACK_HEIGHT);
            x += width + STACK_SPACING;
        }
    }
}

/// Joystick frame in the lower left corner of a `screen`-sized surface.
fn joystick_home(screen: Size, size: f64) -> Rect {
    Rect::from_xywh(
        JOYSTICK_MARGIN,
        screen.height - size - JOYSTICK_MARGIN,
        size,
        size,
    )
}

fn layout_buttons(screen: Size) -> Vec<TouchButton> {
    let (w, h) = (screen.width, screen.height);
    let stack = Rect::from_xywh(STACK_ORIGIN.x, STACK_ORIGIN.y, 0.0, STACK_HEIGHT);

    vec![
        TouchButton::new(ButtonKind::Expand, " > ", stack, IDLE_ALPHA),
        TouchButton::new(ButtonKind::Escape, " ESC ", stack, 0.0),
        TouchButton::new(ButtonKind::QuickSave, " QS ", stack, 0.0),
        TouchButton::new(ButtonKind::QuickLoad, " QL ", stack, 0.0),
        TouchButton::new(
            ButtonKind::Flashlight,
            " F1 ",
            Rect::from_xywh(w - 40.0, 10.0, 30.0, 30.0),
            IDLE_ALPHA,
        ),
        TouchButton::new(
            ButtonKind::Pda,
            " PDA ",
            Rect::from_xywh(10.0, h - 40.0, 30.0, 30.0),
            IDLE_ALPHA,
        ),
        TouchButton::new(
            ButtonKind::Fire,
            "FIRE",
            Rect::from_xywh(w - 155.0, h - 90.0, 75.0, 75.0),
            IDLE_ALPHA,
        ),
        TouchButton::new(
            ButtonKind::Jump,
            "JUMP",
            Rect::from_xywh(w - 90.0, h - 135.0, 75.0, 75.0),
            IDLE_ALPHA,
        ),
        // Invisible weapon zones; next sits on top of the lower half of prev.
        TouchButton::new(
            ButtonKind::NextWeapon,
            "",
            Rect::from_xywh(w / 3.0, h - h / 4.0, w / 3.0, h / 4.0),
            1.0,
        ),
        TouchButton::new(
            ButtonKind::PrevWeapon,
            "",
            Rect::from_xywh(w / 3.0, h / 2.0, w / 3.0, h / 2.0),
            1.0,
        ),
    ]
}

impl std::fmt::Debug for TouchControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TouchControls")
            .field("screen", &self.screen)
            .field("joystick", &self.joystick)
            .field("stack_expanded", &self.stack_expanded)
            .field("active_touches", &self.active_touches)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::engine_bridge::DEFAULT_AXIS_SCALE;
    use crate::mapping::{ControllerAxis, EngineEvent, EngineKey};
    use tokio::sync::mpsc;

    fn controls(settings: JoystickSettings) -> (TouchControls, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let bridge = EngineBridge::new(tx, DEFAULT_AXIS_SCALE);
        let controls =
            TouchControls::new(Size::new(1000.0, 600.0), 100.0, settings, bridge).unwrap();
        (controls, rx)
    }

    fn fixed() -> JoystickSettings {
        JoystickSettings {
            movable: false,
            ..Default::default()
        }
    }

    fn drain(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn axes(forward: i16, turn: i16) -> Vec<EngineEvent> {
        vec![
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

    #[test]
    fn default_layout() {
        let (controls, _) = controls(fixed());
        assert_eq!(
            controls.button(ButtonKind::Fire).unwrap().frame,
            Rect::from_xywh(845.0, 510.0, 75.0, 75.0)
        );
        assert_eq!(
            controls.button(ButtonKind::Jump).unwrap().frame,
            Rect::from_xywh(910.0, 465.0, 75.0, 75.0)
        );
        assert_eq!(
            controls.button(ButtonKind::Flashlight).unwrap().frame,
            Rect::from_xywh(960.0, 10.0, 30.0, 30.0)
        );
        assert_eq!(
            controls.button(ButtonKind::Pda).unwrap().frame,
            Rect::from_xywh(10.0, 560.0, 30.0, 30.0)
        );
        assert_eq!(
            controls.joystick().frame(),
            Rect::from_xywh(50.0, 450.0, 100.0, 100.0)
        );
        assert_eq!(
            controls.button(ButtonKind::Expand).unwrap().frame,
            Rect::from_xywh(50.0, 50.0, 50.0, 30.0)
        );
        assert!(controls.button(ButtonKind::Escape).unwrap().hidden);
    }

    #[test]
    fn fire_press_and_release() {
        let (mut controls, mut rx) = controls(fixed());
        let point = Point::new(850.0, 520.0);
        controls.handle(TouchEvent::Began { id: 1, point });
        assert!(controls.button(ButtonKind::Fire).unwrap().pressed);
        controls.handle(TouchEvent::Ended { id: 1, point });
        assert!(!controls.button(ButtonKind::Fire).unwrap().pressed);

        assert_eq!(
            drain(&mut rx),
            vec![
                EngineEvent::Key {
                    key: EngineKey::RightCtrl,
                    pressed: true
                },
                EngineEvent::Key {
                    key: EngineKey::RightCtrl,
                    pressed: false
                },
            ]
        );
        assert_eq!(controls.active_touches(), 0);
    }

    #[test]
    fn cancelled_button_is_released() {
        let (mut controls, mut rx) = controls(fixed());
        controls.handle(TouchEvent::Began {
            id: 4,
            point: Point::new(20.0, 570.0),
        });
        controls.handle(TouchEvent::Cancelled { id: 4 });

        let events = drain(&mut rx);
        assert_eq!(
            events.last(),
            Some(&EngineEvent::Key {
                key: EngineKey::Tab,
                pressed: false
            })
        );
    }

    #[test]
    fn joystick_keeps_its_touch_off_frame() {
        let (mut controls, mut rx) = controls(fixed());
        controls.handle(TouchEvent::Began {
            id: 7,
            point: Point::new(130.0, 500.0),
        });
        assert_eq!(drain(&mut rx), axes(0, 3));

        // Drags over the weapon zone still drive the joystick.
        controls.handle(TouchEvent::Moved {
            id: 7,
            point: Point::new(400.0, 500.0),
        });
        assert_eq!(drain(&mut rx), axes(0, 30));
        assert_eq!(controls.joystick().displacement(), 1.0);

        controls.handle(TouchEvent::Ended {
            id: 7,
            point: Point::new(400.0, 500.0),
        });
        assert_eq!(drain(&mut rx), axes(0, 0));
        assert_eq!(controls.joystick().displacement(), 0.0);
    }

    #[test]
    fn forward_push_maps_to_negative_forward_axis() {
        let (mut controls, mut rx) = controls(fixed());
        controls.handle(TouchEvent::Began {
            id: 1,
            point: Point::new(100.0, 460.0),
        });
        // 40 points up on a 100 point base: y = 0.4 -> forward -4.
        assert_eq!(drain(&mut rx), axes(-4, 0));
        assert!(controls.joystick().angle().abs() < 1e-9);
    }

    #[test]
    fn second_finger_on_joystick_is_ignored() {
        let (mut controls, mut rx) = controls(fixed());
        controls.handle(TouchEvent::Began {
            id: 1,
            point: Point::new(130.0, 500.0),
        });
        drain(&mut rx);
        controls.handle(TouchEvent::Began {
            id: 2,
            point: Point::new(70.0, 500.0),
        });
        assert!(drain(&mut rx).is_empty());
        assert_eq!(controls.active_touches(), 1);
    }

    #[test]
    fn stack_expands_on_release_inside() {
        let (mut controls, mut rx) = controls(fixed());
        let escape_point = Point::new(120.0, 60.0);

        controls.handle(TouchEvent::Began {
            id: 1,
            point: escape_point,
        });
        assert!(drain(&mut rx).is_empty());

        let expand_point = Point::new(60.0, 60.0);
        controls.handle(TouchEvent::Began {
            id: 2,
            point: expand_point,
        });
        controls.handle(TouchEvent::Ended {
            id: 2,
            point: expand_point,
        });
        assert!(controls.is_stack_expanded());
        assert_eq!(controls.button(ButtonKind::Expand).unwrap().title, " < ");
        assert_eq!(
            controls.button(ButtonKind::Escape).unwrap().frame,
            Rect::from_xywh(108.0, 50.0, 60.0, 30.0)
        );

        controls.handle(TouchEvent::Began {
            id: 3,
            point: escape_point,
        });
        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::Key {
                key: EngineKey::Escape,
                pressed: true
            }]
        );
    }

    #[test]
    fn expand_released_outside_does_not_toggle() {
        let (mut controls, _) = controls(fixed());
        controls.handle(TouchEvent::Began {
            id: 1,
            point: Point::new(60.0, 60.0),
        });
        controls.handle(TouchEvent::Ended {
            id: 1,
            point: Point::new(500.0, 60.0),
        });
        assert!(!controls.is_stack_expanded());
    }

    #[test]
    fn next_weapon_zone_sits_on_top() {
        let (mut controls, mut rx) = controls(fixed());
        controls.handle(TouchEvent::Began {
            id: 1,
            point: Point::new(500.0, 550.0),
        });
        controls.handle(TouchEvent::Began {
            id: 2,
            point: Point::new(500.0, 350.0),
        });

        assert_eq!(
            drain(&mut rx),
            vec![
                EngineEvent::MouseWheel { y: 1 },
                EngineEvent::Key {
                    key: EngineKey::LeftBracket,
                    pressed: true
                },
            ]
        );
    }

    #[test]
    fn double_tap_recentres_movable_joystick() {
        let (mut controls, _) = controls(JoystickSettings::default());
        controls.handle(TouchEvent::Began {
            id: 1,
            point: Point::new(100.0, 500.0),
        });
        controls.handle(TouchEvent::Moved {
            id: 1,
            point: Point::new(400.0, 500.0),
        });
        let moved = controls.joystick().center();
        assert!((moved.x - 350.0).abs() < 1e-9);

        controls.handle(TouchEvent::Ended {
            id: 1,
            point: Point::new(400.0, 500.0),
        });
        controls.handle(TouchEvent::DoubleTap { point: moved });

        assert_eq!(controls.joystick().center(), Point::new(100.0, 500.0));
    }

    #[test]
    fn resize_moves_edge_buttons() {
        let (mut controls, mut rx) = controls(fixed());
        controls.resize(Size::new(800.0, 400.0));
        assert_eq!(
            controls.button(ButtonKind::Fire).unwrap().frame,
            Rect::from_xywh(645.0, 310.0, 75.0, 75.0)
        );
        assert_eq!(controls.screen(), Rect::from_xywh(0.0, 0.0, 800.0, 400.0));
        assert_eq!(
            controls.joystick().frame(),
            Rect::from_xywh(50.0, 250.0, 100.0, 100.0)
        );

        // 30 points right of the new centre (100, 300).
        controls.handle(TouchEvent::Began {
            id: 1,
            point: Point::new(130.0, 300.0),
        });
        assert_eq!(drain(&mut rx), axes(0, 3));
        assert!((controls.joystick().displacement() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn resize_releases_held_joystick() {
        let (mut controls, mut rx) = controls(JoystickSettings::default());
        controls.handle(TouchEvent::Began {
            id: 1,
            point: Point::new(100.0, 500.0),
        });
        controls.handle(TouchEvent::Moved {
            id: 1,
            point: Point::new(400.0, 500.0),
        });
        drain(&mut rx);

        controls.resize(Size::new(800.0, 400.0));
        assert_eq!(controls.active_touches(), 0);
        assert_eq!(controls.joystick().displacement(), 0.0);
        assert_eq!(controls.joystick().original_center(), None);
        assert_eq!(controls.joystick().center(), Point::new(100.0, 300.0));
        assert_eq!(drain(&mut rx), axes(0, 0));

        // The old touch no longer drives the joystick.
        controls.handle(TouchEvent::Moved {
            id: 1,
            point: Point::new(130.0, 300.0),
        });
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn invalid_joystick_size_is_rejected() {
        for size in [0.0, -100.0, f64::NAN] {
            let (tx, _rx) = mpsc::channel(1);
            let result = TouchControls::new(
                Size::new(1000.0, 600.0),
                size,
                fixed(),
                EngineBridge::new(tx, DEFAULT_AXIS_SCALE),
            );
            assert!(
                matches!(result, Err(JoystickError::InvalidRadius(_))),
                "size {size} accepted"
            );
        }
    }

    #[test]
    fn dropped_centre_axes_go_out_with_next_touch() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut controls = TouchControls::new(
            Size::new(1000.0, 600.0),
            100.0,
            fixed(),
            EngineBridge::new(tx, DEFAULT_AXIS_SCALE),
        )
        .unwrap();

        controls.handle(TouchEvent::Began {
            id: 1,
            point: Point::new(130.0, 500.0),
        });
        controls.handle(TouchEvent::Moved {
            id: 1,
            point: Point::new(140.0, 500.0),
        });
        // Channel is full, so the centring pair has to wait.
        controls.handle(TouchEvent::Ended {
            id: 1,
            point: Point::new(140.0, 500.0),
        });
        let mut expected = axes(0, 3);
        expected.extend(axes(0, 4));
        assert_eq!(drain(&mut rx), expected);

        controls.handle(TouchEvent::Began {
            id: 2,
            point: Point::new(850.0, 520.0),
        });
        let mut expected = axes(0, 0);
        expected.push(EngineEvent::Key {
            key: EngineKey::RightCtrl,
            pressed: true,
        });
        assert_eq!(drain(&mut rx), expected);
    }
}
