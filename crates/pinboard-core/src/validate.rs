use chrono::{DateTime, Utc};

use crate::error::{KanbanError, Result};

pub(crate) const BOARD_TITLE_MAX: usize = 255;
pub(crate) const BOARD_DESCRIPTION_MAX: usize = 1000;
pub(crate) const LIST_TITLE_MAX: usize = 100;
pub(crate) const LIST_DESCRIPTION_MAX: usize = 500;
pub(crate) const CARD_TITLE_MAX: usize = 255;
pub(crate) const CARD_DESCRIPTION_MAX: usize = 1000;

/// Trimmed, non-empty, at most `max` characters.
pub(crate) fn title(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(KanbanError::validation(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(KanbanError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

pub(crate) fn description(field: &str, value: Option<&str>, max: usize) -> Result<String> {
    let value = value.unwrap_or_default();
    if value.chars().count() > max {
        return Err(KanbanError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// A window with both ends set must not end before it starts.
pub(crate) fn window(
    field: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(KanbanError::validation(format!(
            "{} ends before it starts",
            field
        ))),
        _ => Ok(()),
    }
}
