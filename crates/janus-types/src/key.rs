//! View keys - routing addresses for command output.
//!
//! Every command owns one live output destination, addressed by a
//! [`ViewKey`]: the optional group it belongs to plus its name. Routing
//! by key (rather than by "whatever is on screen") is what lets a
//! background command keep appending to its own view after the user has
//! switched away.

use serde::{Deserialize, Serialize};

/// Routing key for a command's output destination.
///
/// Keys are cheap to clone and hashable; the registry uses them as map
/// keys and every execution mode carries one (explicitly or via
/// task/thread-local storage) so late emissions land on the view that
/// originated them.
///
/// # Qualified names
///
/// The textual form is `group:command` for grouped commands and plain
/// `command` for root commands, mirroring the qualified-name lookup of
/// the application layer.
///
/// # Example
///
/// ```
/// use janus_types::ViewKey;
///
/// let root = ViewKey::root("status");
/// assert_eq!(root.qualified(), "status");
///
/// let grouped = ViewKey::grouped("users", "create");
/// assert_eq!(grouped.qualified(), "users:create");
/// assert_ne!(root, grouped);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewKey {
    /// Group identifier, or `None` for root commands.
    pub group: Option<String>,
    /// Command name within the group.
    pub command: String,
}

impl ViewKey {
    /// Creates a key for a root (ungrouped) command.
    #[must_use]
    pub fn root(command: impl Into<String>) -> Self {
        Self {
            group: None,
            command: command.into(),
        }
    }

    /// Creates a key for a command inside a group.
    #[must_use]
    pub fn grouped(group: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            command: command.into(),
        }
    }

    /// Parses a qualified name: `"group:command"` or `"command"`.
    #[must_use]
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once(':') {
            Some((group, command)) => Self::grouped(group, command),
            None => Self::root(qualified),
        }
    }

    /// Returns the qualified textual form.
    #[must_use]
    pub fn qualified(&self) -> String {
        match &self.group {
            Some(group) => format!("{}:{}", group, self.command),
            None => self.command.clone(),
        }
    }
}

impl std::fmt::Display for ViewKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}:{}", group, self.command),
            None => write!(f, "{}", self.command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_qualified_names() {
        let key = ViewKey::parse("users:create");
        assert_eq!(key, ViewKey::grouped("users", "create"));
        assert_eq!(key.qualified(), "users:create");

        let root = ViewKey::parse("status");
        assert_eq!(root, ViewKey::root("status"));
        assert_eq!(root.qualified(), "status");
    }

    #[test]
    fn grouped_and_root_keys_are_distinct() {
        assert_ne!(ViewKey::root("run"), ViewKey::grouped("jobs", "run"));
    }
}
