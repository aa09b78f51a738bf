//! Virtual joystick - converts touch positions into direction and magnitude
//!
//! The control owns its frame in the parent's coordinate space. Every pointer
//! event is turned into a displacement from the frame centre, normalised by
//! the base radius, and reported through a [`JoystickListener`] when either
//! the clamped displacement or the pointing angle changed.
//!
//! # Angle convention
//!
//! ```text
//!              0°
//!              │
//!     270° ────┼──── 90°
//!              │
//!             180°
//! ```
//!
//! Screen y grows downward, so "up" is a negative y delta. The raw angle is
//! `atan2(dx, dy)` (x first), which puts 0 rad straight down and grows
//! counter-clockwise on screen; the reported value `180 - deg` turns that
//! into a compass bearing.
//!
//! # Movable controls
//!
//! A movable joystick follows the finger once it is dragged past the rim of
//! the base: the frame is shifted so the touch point sits on the base
//! circumference, optionally kept inside a bounds rectangle. A double tap
//! while the handle is near the centre puts it back where it started.

use crate::geometry::{Point, Rect, Vector};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Fraction of the control size trimmed from each side to get the handle frame.
const HANDLE_INSET: f64 = 0.15;

/// Displacement below which a double tap restores a relocated control.
const RESET_DISPLACEMENT: f64 = 0.5;

/// Receiver for joystick updates
///
/// Exactly one listener is registered per control. Both methods are called
/// synchronously from the event handler that caused the change, and only
/// when the reported values changed.
pub trait JoystickListener: Send {
    /// Compass bearing in degrees `[0, 360)` and displacement ratio `[0, 1]`.
    fn on_joystick(&mut self, angle: f64, displacement: f64);

    /// Axis pair normalised by the base diameter; y is positive upward.
    fn on_joystick_axes(&mut self, x: f64, y: f64);
}

/// Handle colour as RGBA bytes
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Tint {
    pub const DARK_GRAY: Tint = Tint::rgb(85, 85, 85);
    pub const SYSTEM_BLUE: Tint = Tint::rgb(0, 122, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::SYSTEM_BLUE
    }
}

/// Behaviour and appearance of a joystick control
#[derive(Clone, Debug)]
pub struct JoystickSettings {
    /// Follow the finger past the rim instead of pinning the handle to it.
    pub movable: bool,

    /// Region the frame must stay inside while relocating. `None` moves freely.
    pub movable_bounds: Option<Rect>,

    /// Opacity of the whole control.
    pub alpha: f64,

    /// Opacity of the base image, multiplied with `alpha` when drawn.
    pub base_alpha: f64,

    pub handle_tint: Tint,
}

impl Default for JoystickSettings {
    fn default() -> Self {
        Self {
            movable: true,
            movable_bounds: None,
            alpha: 1.0,
            base_alpha: 1.0,
            handle_tint: Tint::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JoystickError {
    #[error("Joystick radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    #[error("Joystick frame must have positive width and height: {0:?}")]
    EmptyFrame(Rect),

    #[error("Non-finite geometry: {0}")]
    NonFinite(String),
}

/// On-screen joystick state
///
/// Created once per control and mutated only by the pointer handlers,
/// [`reset_frame`](Self::reset_frame) and the appearance setters.
pub struct JoystickView {
    /// Control frame in parent coordinates.
    frame: Rect,

    /// Bounds of the parent container; touches outside are ignored.
    parent_bounds: Rect,

    /// Base radius, fixed at construction.
    radius: f64,

    movable: bool,
    movable_bounds: Option<Rect>,

    /// Centre before the first relocation, cleared by a frame reset.
    original_center: Option<Point>,

    /// Last reported bearing in degrees.
    angle: f64,

    /// Last reported clamped displacement.
    displacement: f64,

    last_angle_radians: f64,

    /// Handle centre in the control's local coordinates.
    handle_center: Point,

    alpha: f64,
    base_alpha: f64,
    handle_tint: Tint,

    /// Bumped whenever the handle image has to be regenerated.
    handle_generation: u64,

    listener: Option<Box<dyn JoystickListener>>,
}

impl JoystickView {
    /// Creates a control at `frame`, inside a parent with bounds `parent_bounds`.
    ///
    /// The base radius is half the frame width.
    ///
    /// # Errors
    ///
    /// * [`JoystickError::NonFinite`] - frame or parent bounds contain NaN/inf
    /// * [`JoystickError::EmptyFrame`] - frame has no area
    pub fn new(
        frame: Rect,
        parent_bounds: Rect,
        settings: JoystickSettings,
    ) -> Result<Self, JoystickError> {
        for (label, rect) in [("frame", frame), ("parent bounds", parent_bounds)] {
            if !rect.min.is_finite() || !rect.max.is_finite() {
                return Err(JoystickError::NonFinite(format!("{label}: {rect:?}")));
            }
        }
        let radius = frame.width() / 2.0;
        if radius <= 0.0 || frame.height() <= 0.0 {
            return Err(JoystickError::EmptyFrame(frame));
        }

        info!(
            "Creating joystick at {:?} (radius {:.1}, movable {})",
            frame.origin(),
            radius,
            settings.movable
        );

        Ok(Self {
            frame,
            parent_bounds,
            radius,
            movable: settings.movable,
            movable_bounds: settings.movable_bounds,
            original_center: None,
            angle: 0.0,
            displacement: 0.0,
            last_angle_radians: 0.0,
            handle_center: frame.local_bounds().mid(),
            alpha: settings.alpha,
            base_alpha: settings.base_alpha,
            handle_tint: settings.handle_tint,
            handle_generation: 0,
            listener: None,
        })
    }

    /// Registers the listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: Box<dyn JoystickListener>) {
        if self.listener.is_some() {
            debug!("Replacing joystick listener");
        }
        self.listener = Some(listener);
    }

    pub fn take_listener(&mut self) -> Option<Box<dyn JoystickListener>> {
        self.listener.take()
    }

    pub fn on_pointer_down(&mut self, point: Point) {
        self.update_location(point);
    }

    pub fn on_pointer_move(&mut self, point: Point) {
        self.update_location(point);
    }

    pub fn on_pointer_up(&mut self) {
        self.reset_position();
    }

    pub fn on_pointer_cancelled(&mut self) {
        self.reset_position();
    }

    /// Moves a relocated control back to where it started.
    ///
    /// Only acts while the handle is near the centre. Returns whether the
    /// frame moved.
    pub fn reset_frame(&mut self) -> bool {
        if self.displacement >= RESET_DISPLACEMENT {
            return false;
        }
        match self.original_center.take() {
            Some(center) => {
                info!("Restoring joystick to original centre {:?}", center);
                self.frame = self.frame.with_center(center);
                true
            }
            None => false,
        }
    }

    /// Changes the handle colour and schedules a new handle image.
    pub fn set_tint_color(&mut self, tint: Tint) {
        self.handle_tint = tint;
        self.handle_generation += 1;
        debug!(
            "Handle tint set to {:?} (image generation {})",
            tint, self.handle_generation
        );
    }

    /// Moves the control so its centre sits at `center`.
    ///
    /// Any relocation is forgotten and the handle returns to the middle.
    pub fn place_at(&mut self, center: Point) {
        self.frame = self.frame.with_center(center);
        self.original_center = None;
        self.handle_center = self.frame.local_bounds().mid();
        debug!("Joystick placed at {:?}", center);
    }

    pub fn set_movable(&mut self, movable: bool) {
        self.movable = movable;
    }

    pub fn set_movable_bounds(&mut self, bounds: Option<Rect>) {
        self.movable_bounds = bounds;
    }

    /// Updates the parent's bounds after the host surface changed size.
    pub fn set_parent_bounds(&mut self, bounds: Rect) {
        self.parent_bounds = bounds;
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    pub fn set_base_alpha(&mut self, base_alpha: f64) {
        self.base_alpha = base_alpha;
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn displacement(&self) -> f64 {
        self.displacement
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn center(&self) -> Point {
        self.frame.mid()
    }

    pub fn original_center(&self) -> Option<Point> {
        self.original_center
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    pub fn movable_bounds(&self) -> Option<Rect> {
        self.movable_bounds
    }

    pub fn handle_center(&self) -> Point {
        self.handle_center
    }

    /// Handle frame in local coordinates.
    pub fn handle_frame(&self) -> Rect {
        let bounds = self.frame.local_bounds();
        bounds
            .inset_by(HANDLE_INSET * bounds.width(), HANDLE_INSET * bounds.height())
            .with_center(self.handle_center)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn base_alpha(&self) -> f64 {
        self.base_alpha
    }

    pub fn handle_tint(&self) -> Tint {
        self.handle_tint
    }

    pub fn handle_generation(&self) -> u64 {
        self.handle_generation
    }

    /// Whether a point in parent coordinates hits the control.
    pub fn contains(&self, point: Point) -> bool {
        self.frame.contains(point)
    }

    fn reset_position(&mut self) {
        self.update_location(self.frame.mid());
    }

    /// Offset from the base centre to its rim in the pointing direction.
    fn circumference_offset(&self, angle_radians: f64) -> Vector {
        Vector::new(
            angle_radians.sin() * self.radius,
            angle_radians.cos() * self.radius,
        )
    }

    /// Core update for a location in parent coordinates.
    fn update_location(&mut self, location: Point) {
        if !self.parent_bounds.contains(location) {
            debug!("Ignoring touch outside parent bounds: {:?}", location);
            return;
        }

        let delta = location - self.frame.mid();
        let new_displacement = delta.magnitude() / self.radius;
        // x before y: 0 rad points along +y and the angle grows towards +x.
        let new_angle_radians = delta.dx.atan2(delta.dy);
        let local_mid = self.frame.local_bounds().mid();

        if self.movable {
            if new_displacement > 1.0 {
                self.relocate(location, new_angle_radians);
            }
            self.handle_center = local_mid + delta;
        } else if new_displacement > 1.0 {
            self.handle_center = local_mid + self.circumference_offset(new_angle_radians);
        } else {
            self.handle_center = local_mid + delta;
        }

        let clamped = new_displacement.min(1.0);
        if clamped != self.displacement || new_angle_radians != self.last_angle_radians {
            self.displacement = clamped;
            self.last_angle_radians = new_angle_radians;
            self.angle = compass_degrees(clamped, new_angle_radians);

            let diameter = self.radius * 2.0;
            let x = delta.dx / diameter;
            let y = -delta.dy / diameter;

            debug!(
                "Joystick angle {:.1} displacement {:.3} axes ({:.3}, {:.3})",
                self.angle, self.displacement, x, y
            );

            if let Some(listener) = self.listener.as_mut() {
                listener.on_joystick(self.angle, self.displacement);
                listener.on_joystick_axes(x, y);
            }
        }
    }

    /// Shifts the frame so `location` lies on the base circumference.
    fn relocate(&mut self, location: Point, angle_radians: f64) {
        if self.original_center.is_none() {
            info!("Joystick leaving its original centre {:?}", self.frame.mid());
            self.original_center = Some(self.frame.mid());
        }

        let end = self.circumference_offset(angle_radians);
        let size = self.frame.size();
        let origin = location - end - size / 2.0;

        let origin = match self.movable_bounds {
            Some(bounds) => {
                if bounds.width() < size.width || bounds.height() < size.height {
                    warn!(
                        "Movable bounds {:?} smaller than joystick frame {:?}",
                        bounds, size
                    );
                }
                Point::new(
                    origin.x.max(bounds.min_x()).min(bounds.max_x() - size.width),
                    origin.y.max(bounds.min_y()).min(bounds.max_y() - size.height),
                )
            }
            None => origin,
        };

        self.frame = self.frame.with_origin(origin);
    }
}

impl fmt::Debug for JoystickView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoystickView")
            .field("frame", &self.frame)
            .field("radius", &self.radius)
            .field("movable", &self.movable)
            .field("movable_bounds", &self.movable_bounds)
            .field("original_center", &self.original_center)
            .field("angle", &self.angle)
            .field("displacement", &self.displacement)
            .field("has_listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

/// Base radius for a control `size` points wide.
///
/// Sizes are checked before a frame is built from them, since a negative
/// size would otherwise describe a valid mirrored rectangle.
pub fn radius_for_size(size: f64) -> Result<f64, JoystickError> {
    let radius = size / 2.0;
    if !radius.is_finite() || radius <= 0.0 {
        return Err(JoystickError::InvalidRadius(radius));
    }
    Ok(radius)
}

/// Converts the raw `atan2(dx, dy)` angle to a bearing in `[0, 360)`.
///
/// A centred handle always reports 0.
fn compass_degrees(displacement: f64, angle_radians: f64) -> f64 {
    if displacement == 0.0 {
        return 0.0;
    }
    let degrees = (180.0 - angle_radians.to_degrees()).rem_euclid(360.0);
    // rem_euclid can round tiny negatives up to exactly 360.
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}
