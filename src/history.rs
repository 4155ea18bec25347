use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Where the console writes what the operator sees.
pub trait Tracer: Send + Sync {
    fn add(&self, severity: Severity, line: &str);
    fn clear(&self);

    fn debug(&self, line: &str) {
        self.add(Severity::Debug, line);
    }

    fn info(&self, line: &str) {
        self.add(Severity::Info, line);
    }

    fn warn(&self, line: &str) {
        self.add(Severity::Warn, line);
    }

    fn error(&self, line: &str) {
        self.add(Severity::Error, line);
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    pub severity: Severity,
    pub line: String,
}

/// Bounded line buffer backing the log pane. The oldest lines fall off first.
pub struct LogHistory {
    capacity: usize,
    entries: Mutex<VecDeque<Entry>>,
    revision: AtomicU64,
}

impl LogHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            revision: AtomicU64::new(0),
        }
    }

    /// Runs `f` over the current lines while holding the lock.
    pub fn access<T>(&self, f: impl FnOnce(&VecDeque<Entry>) -> T) -> T {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        f(&entries)
    }

    /// Bumped on every change; lets the UI skip redraws.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    fn touch(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

impl Tracer for LogHistory {
    fn add(&self, severity: Severity, line: &str) {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.push_back(Entry {
                severity,
                line: line.to_string(),
            });

            while entries.len() > self.capacity {
                entries.pop_front();
            }
        }

        self.touch();
    }

    fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.touch();
    }
}

#[cfg(test)]
impl LogHistory {
    pub fn capture() -> Self {
        Self::new(usize::MAX)
    }

    pub fn lines(&self) -> Vec<String> {
        self.access(|entries| entries.iter().map(|e| e.line.clone()).collect())
    }

    pub fn errors(&self) -> Vec<String> {
        self.access(|entries| {
            entries
                .iter()
                .filter(|e| e.severity == Severity::Error)
                .map(|e| e.line.clone())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_lines() {
        let history = LogHistory::new(2);

        history.info("one");
        history.warn("two");
        history.error("three");

        assert_eq!(history.lines(), ["two", "three"]);
        assert_eq!(history.errors(), ["three"]);
    }

    #[test]
    fn clear_bumps_revision() {
        let history = LogHistory::new(10);
        history.debug("x");
        let rev = history.revision();

        history.clear();

        assert!(history.lines().is_empty());
        assert!(history.revision() > rev);
    }
}
