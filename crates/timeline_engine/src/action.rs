// SPDX-License-Identifier: MIT OR Apache-2.0
//! Actions and rows: the data the engine schedules.

use std::borrow::Borrow;
use std::fmt;

use crate::effect::EffectId;

/// Identifier of an action, unique within one dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub String);

impl ActionId {
    /// Create an action ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ActionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for ActionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ActionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A time-ranged unit of work bound to an effect.
///
/// The action is active for times in `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineAction {
    /// Unique action ID
    pub id: ActionId,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (exclusive)
    pub end: f64,
    /// Effect that handles this action's lifecycle
    pub effect_id: EffectId,
    /// Whether the action is selected in the editor
    pub selected: bool,
    /// Whether the action can be resized
    pub flexible: bool,
    /// Whether the action can be moved
    pub movable: bool,
    /// Whether the action is excluded from playback
    pub disable: bool,
    /// Earliest start allowed when editing
    pub min_start: Option<f64>,
    /// Latest end allowed when editing
    pub max_end: Option<f64>,
}

impl TimelineAction {
    /// Create an action covering `[start, end)`
    pub fn new(
        id: impl Into<ActionId>,
        start: f64,
        end: f64,
        effect_id: impl Into<EffectId>,
    ) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            effect_id: effect_id.into(),
            selected: false,
            flexible: true,
            movable: true,
            disable: false,
            min_start: None,
            max_end: None,
        }
    }

    /// Exclude the action from playback
    pub fn disabled(mut self) -> Self {
        self.disable = true;
        self
    }

    /// Set editing bounds
    pub fn with_bounds(mut self, min_start: f64, max_end: f64) -> Self {
        self.min_start = Some(min_start);
        self.max_end = Some(max_end);
        self
    }

    /// Set whether the action can be moved
    pub fn movable(mut self, movable: bool) -> Self {
        self.movable = movable;
        self
    }

    /// Set whether the action can be resized
    pub fn flexible(mut self, flexible: bool) -> Self {
        self.flexible = flexible;
        self
    }

    /// Whether `time` falls in `[start, end)`
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Whether the action takes part in playback at `time`
    pub fn is_active_at(&self, time: f64) -> bool {
        !self.disable && self.contains(time)
    }

    /// Length of the action
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// A group of actions. Rows only organize actions for the editor; the
/// engine flattens them.
#[derive(Debug, Clone, Default)]
pub struct TimelineRow {
    /// Row ID
    pub id: String,
    /// Actions in this row
    pub actions: Vec<TimelineAction>,
    /// Custom row height
    pub row_height: Option<f32>,
    /// Whether the row is selected
    pub selected: bool,
    /// Extra style class names
    pub class_names: Vec<String>,
}

impl TimelineRow {
    /// Create an empty row
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add an action
    pub fn with_action(mut self, action: TimelineAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions
    pub fn with_actions(mut self, actions: impl IntoIterator<Item = TimelineAction>) -> Self {
        self.actions.extend(actions);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_range_is_half_open() {
        let action = TimelineAction::new("a", 1.0, 3.0, "fx");
        assert!(!action.contains(0.5));
        assert!(action.contains(1.0));
        assert!(action.contains(2.99));
        assert!(!action.contains(3.0));
        assert_eq!(action.duration(), 2.0);
    }

    #[test]
    fn test_disabled_action_is_never_active() {
        let action = TimelineAction::new("a", 0.0, 5.0, "fx").disabled();
        assert!(action.contains(1.0));
        assert!(!action.is_active_at(1.0));
    }

    #[test]
    fn test_builders() {
        let action = TimelineAction::new("a", 2.0, 4.0, "fx")
            .with_bounds(1.0, 6.0)
            .movable(false)
            .flexible(false);
        assert_eq!(action.min_start, Some(1.0));
        assert_eq!(action.max_end, Some(6.0));
        assert!(!action.movable);
        assert!(!action.flexible);

        let row = TimelineRow::new("row")
            .with_action(action)
            .with_actions([TimelineAction::new("b", 0.0, 1.0, "fx")]);
        assert_eq!(row.actions.len(), 2);
        assert_eq!(row.actions[1].id, "b");
    }
}
