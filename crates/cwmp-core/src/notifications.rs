//! Pending value-change notifications
//!
//! The queue is keyed by parameter name and keeps first-insertion order, so
//! repeated changes of one parameter collapse into a single entry that is
//! reported at the position where the parameter first changed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One pending value change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub parameter: String,
    pub value: String,
}

impl NotificationEntry {
    pub fn new(parameter: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            value: value.into(),
        }
    }
}

/// Result of offering a value change to the session core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationDisposition {
    /// The parameter has no notification level; nothing changed
    Ignored,
    /// Queued for the next Inform (passive notification)
    Queued,
    /// Queued and an Inform was attempted immediately (active notification)
    Informed,
}

/// Whether a notification level string requests an immediate session
///
/// Active notification levels start with `2`; any other present level is
/// passive and only batches the change.
pub fn is_active_level(level: &str) -> bool {
    level.starts_with('2')
}

/// Ordered, de-duplicated set of pending notifications
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    entries: IndexMap<String, String>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a change or update it in place
    ///
    /// Returns `true` when the parameter was not queued before.
    pub fn add_or_update(&mut self, parameter: &str, value: &str) -> bool {
        match self.entries.get_mut(parameter) {
            Some(existing) => {
                *existing = value.to_string();
                false
            }
            None => {
                self.entries.insert(parameter.to_string(), value.to_string());
                true
            }
        }
    }

    /// Ordered copy of the pending entries for message encoding
    pub fn snapshot(&self) -> Vec<NotificationEntry> {
        self.entries
            .iter()
            .map(|(parameter, value)| NotificationEntry::new(parameter.as_str(), value.as_str()))
            .collect()
    }

    /// Drop every pending entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.entries.get(parameter).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_keeps_original_position() {
        let mut queue = NotificationQueue::new();
        assert!(queue.add_or_update("Device.A", "1"));
        assert!(queue.add_or_update("Device.B", "1"));
        assert!(!queue.add_or_update("Device.A", "2"));

        assert_eq!(
            queue.snapshot(),
            vec![
                NotificationEntry::new("Device.A", "2"),
                NotificationEntry::new("Device.B", "1"),
            ]
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_snapshot_is_detached_from_queue() {
        let mut queue = NotificationQueue::new();
        queue.add_or_update("Device.A", "1");

        let snapshot = queue.snapshot();
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(snapshot, vec![NotificationEntry::new("Device.A", "1")]);
    }

    #[test]
    fn test_active_levels() {
        assert!(is_active_level("2"));
        assert!(is_active_level("2-forced"));
        assert!(!is_active_level("1"));
        assert!(!is_active_level("0"));
        assert!(!is_active_level(""));
    }
}
