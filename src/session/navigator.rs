//! Page navigation seam used by logout and the route guard.

use std::sync::{Mutex, MutexGuard};

/// Entry point unauthenticated viewers are sent to.
pub const LOGIN_PATH: &str = "/login";

pub trait Navigator: Send + Sync {
    /// Full navigation that leaves the current page and pushes a history entry.
    fn assign(&self, location: &str);
    /// Replace the current history entry without pushing.
    fn replace(&self, location: &str);
}

/// In-memory history stack.
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: Mutex::new(vec![initial.to_string()]),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> String {
        self.entries().last().cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries().clone()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for History {
    fn assign(&self, location: &str) {
        tracing::info!("Navigating to {}", location);
        self.entries().push(location.to_string());
    }

    fn replace(&self, location: &str) {
        tracing::debug!("Replacing location with {}", location);
        let mut entries = self.entries();
        entries.pop();
        entries.push(location.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_pushes_replace_swaps() {
        let history = History::new("/profile");
        history.assign("/login");
        assert_eq!(history.snapshot(), vec!["/profile", "/login"]);

        history.replace("/register");
        assert_eq!(history.snapshot(), vec!["/profile", "/register"]);
        assert_eq!(history.current(), "/register");
        assert_eq!(history.len(), 2);
    }
}
