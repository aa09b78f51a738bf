//! Line-based touch scripts for driving the controls without a touch screen.
//!
//! One command per line, coordinates in screen points:
//!
//! ```text
//! down <id> <x> <y>
//! move <id> <x> <y>
//! up <id> <x> <y>
//! cancel <id>
//! tap <id> <x> <y>       # down and up at the same point
//! doubletap <x> <y>
//! ```
//!
//! Blank lines and lines starting with `#` produce no events.

use crate::controller::{TouchEvent, TouchId};
use crate::geometry::Point;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("Unknown touch command: {0}")]
    UnknownCommand(String),

    #[error("Missing {field} for '{command}'")]
    MissingField {
        command: String,
        field: &'static str,
    },

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unexpected trailing input: {0}")]
    TrailingInput(String),
}

/// Parses one script line into the touch events it stands for.
pub fn parse_line(line: &str) -> Result<Vec<TouchEvent>, ScriptError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Vec::new());
    }

    let mut fields = line.split_whitespace();
    let command = fields.next().unwrap_or_default();

    let events = match command {
        "down" => {
            let (id, point) = next_touch(command, &mut fields)?;
            vec![TouchEvent::Began { id, point }]
        }
        "move" => {
            let (id, point) = next_touch(command, &mut fields)?;
            vec![TouchEvent::Moved { id, point }]
        }
        "up" => {
            let (id, point) = next_touch(command, &mut fields)?;
            vec![TouchEvent::Ended { id, point }]
        }
        "cancel" => {
            let id = next_id(command, &mut fields)?;
            vec![TouchEvent::Cancelled { id }]
        }
        "tap" => {
            let (id, point) = next_touch(command, &mut fields)?;
            vec![
                TouchEvent::Began { id, point },
                TouchEvent::Ended { id, point },
            ]
        }
        "doubletap" => {
            let point = next_point(command, &mut fields)?;
            vec![TouchEvent::DoubleTap { point }]
        }
        other => return Err(ScriptError::UnknownCommand(other.to_string())),
    };

    if let Some(extra) = fields.next() {
        return Err(ScriptError::TrailingInput(extra.to_string()));
    }
    Ok(events)
}

fn next_field<'a>(
    command: &str,
    field: &'static str,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<&'a str, ScriptError> {
    fields.next().ok_or_else(|| ScriptError::MissingField {
        command: command.to_string(),
        field,
    })
}

fn next_id<'a>(
    command: &str,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<TouchId, ScriptError> {
    let raw = next_field(command, "touch id", fields)?;
    raw.parse()
        .map_err(|_| ScriptError::InvalidNumber(raw.to_string()))
}

fn next_coordinate<'a>(
    command: &str,
    field: &'static str,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<f64, ScriptError> {
    let raw = next_field(command, field, fields)?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ScriptError::InvalidNumber(raw.to_string())),
    }
}

fn next_point<'a>(
    command: &str,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<Point, ScriptError> {
    let x = next_coordinate(command, "x", fields)?;
    let y = next_coordinate(command, "y", fields)?;
    Ok(Point::new(x, y))
}

fn next_touch<'a>(
    command: &str,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<(TouchId, Point), ScriptError> {
    let id = next_id(command, fields)?;
    let point = next_point(command, fields)?;
    Ok((id, point))
}
