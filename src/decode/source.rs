//! Worker sources
//!
//! Where the decode engine runs. The list is ordered by preference and
//! always ends with [`WorkerSource::CallingThread`], which needs no
//! separate runtime and therefore cannot fail to load.

use std::fmt;

use serde::Serialize;

/// Default name of the dedicated decode thread
pub const DEFAULT_WORKER_NAME: &str = "pdf-decode";

/// Stack size of the dedicated decode thread; MuPDF recursion on deep
/// content streams overflows the 2 MiB default
pub const DEFAULT_WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// One candidate runtime location for the decode engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerSource {
    /// A named OS thread that owns the open document
    DedicatedThread {
        name: String,
        stack_size: Option<usize>,
    },
    /// The tokio blocking pool
    BlockingPool,
    /// No worker at all: decode on the calling task
    CallingThread,
}

impl WorkerSource {
    pub fn dedicated(name: impl Into<String>) -> Self {
        WorkerSource::DedicatedThread {
            name: name.into(),
            stack_size: Some(DEFAULT_WORKER_STACK_SIZE),
        }
    }

    /// Parse `thread[:name]`, `blocking` or `inline`
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        match s.split_once(':') {
            Some(("thread", name)) if !name.trim().is_empty() => Ok(Self::dedicated(name.trim())),
            None if s == "thread" => Ok(Self::dedicated(DEFAULT_WORKER_NAME)),
            None if s == "blocking" => Ok(WorkerSource::BlockingPool),
            None if s == "inline" => Ok(WorkerSource::CallingThread),
            _ => Err(format!("unknown worker source '{}'", s)),
        }
    }

    /// Parse a comma separated list, skipping empty entries
    pub fn parse_list(s: &str) -> Result<Vec<Self>, String> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Whether this is the final "no separate runtime" fallback
    pub fn is_sentinel(&self) -> bool {
        matches!(self, WorkerSource::CallingThread)
    }
}

impl fmt::Display for WorkerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerSource::DedicatedThread { name, .. } => write!(f, "thread:{}", name),
            WorkerSource::BlockingPool => write!(f, "blocking"),
            WorkerSource::CallingThread => write!(f, "inline"),
        }
    }
}

/// Ordered worker sources with one active pointer
#[derive(Debug, Clone)]
pub struct WorkerSourceList {
    sources: Vec<WorkerSource>,
    active: Option<usize>,
}

impl WorkerSourceList {
    /// Build the list; anything after the sentinel is dropped and the
    /// sentinel is appended when missing
    pub fn new(sources: Vec<WorkerSource>) -> Self {
        let mut sources: Vec<WorkerSource> = match sources.iter().position(WorkerSource::is_sentinel) {
            Some(idx) => sources.into_iter().take(idx + 1).collect(),
            None => sources,
        };
        if !sources.last().is_some_and(WorkerSource::is_sentinel) {
            sources.push(WorkerSource::CallingThread);
        }

        Self {
            sources,
            active: None,
        }
    }

    /// Point at the first source unless a source is already active
    pub fn configure_initial(&mut self) -> &WorkerSource {
        let idx = *self.active.get_or_insert(0);
        &self.sources[idx]
    }

    /// Move to the next source; `false` once the sentinel has been tried
    pub fn advance(&mut self) -> bool {
        let current = *self.active.get_or_insert(0);
        if current + 1 < self.sources.len() {
            self.active = Some(current + 1);
            true
        } else {
            false
        }
    }

    /// Move past `failed` if it is still the active source
    ///
    /// Returns `true` when there is a source after `failed` to try: either
    /// this call moved to it, or the pointer had already left `failed`.
    pub fn advance_from(&mut self, failed: &WorkerSource) -> bool {
        let current = *self.active.get_or_insert(0);
        if &self.sources[current] == failed {
            self.advance()
        } else {
            true
        }
    }

    pub fn active(&self) -> Option<&WorkerSource> {
        self.active.map(|idx| &self.sources[idx])
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn sources(&self) -> &[WorkerSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            WorkerSource::parse("thread:decoder").unwrap(),
            WorkerSource::dedicated("decoder")
        );
        assert_eq!(
            WorkerSource::parse("thread").unwrap(),
            WorkerSource::dedicated(DEFAULT_WORKER_NAME)
        );
        assert_eq!(WorkerSource::parse(" blocking ").unwrap(), WorkerSource::BlockingPool);
        assert_eq!(WorkerSource::parse("inline").unwrap(), WorkerSource::CallingThread);
        assert!(WorkerSource::parse("cdn:https://x").is_err());
        assert!(WorkerSource::parse("thread:").is_err());
    }

    #[test]
    fn test_parse_list_skips_empty_entries() {
        let list = WorkerSource::parse_list("thread:a,,blocking,").unwrap();
        assert_eq!(list, vec![WorkerSource::dedicated("a"), WorkerSource::BlockingPool]);
    }

    #[test]
    fn test_sentinel_is_appended() {
        let list = WorkerSourceList::new(vec![WorkerSource::BlockingPool]);
        assert_eq!(
            list.sources(),
            &[WorkerSource::BlockingPool, WorkerSource::CallingThread]
        );
    }

    #[test]
    fn test_sources_after_sentinel_are_dropped() {
        let list = WorkerSourceList::new(vec![
            WorkerSource::CallingThread,
            WorkerSource::BlockingPool,
        ]);
        assert_eq!(list.sources(), &[WorkerSource::CallingThread]);
    }

    #[test]
    fn test_configure_initial_is_idempotent() {
        let mut list = WorkerSourceList::new(vec![
            WorkerSource::dedicated("a"),
            WorkerSource::BlockingPool,
        ]);
        assert_eq!(list.active(), None);

        assert_eq!(list.configure_initial(), &WorkerSource::dedicated("a"));
        assert!(list.advance());
        assert_eq!(list.configure_initial(), &WorkerSource::BlockingPool);
    }

    #[test]
    fn test_advance_until_exhausted() {
        let mut list = WorkerSourceList::new(vec![
            WorkerSource::dedicated("a"),
            WorkerSource::BlockingPool,
        ]);
        list.configure_initial();

        assert!(list.advance());
        assert!(list.advance());
        assert_eq!(list.active(), Some(&WorkerSource::CallingThread));
        assert!(!list.advance());
        assert_eq!(list.active_index(), Some(2));
    }

    #[test]
    fn test_advance_from_stale_source_keeps_pointer() {
        let mut list = WorkerSourceList::new(vec![
            WorkerSource::dedicated("a"),
            WorkerSource::BlockingPool,
        ]);
        list.configure_initial();

        // Two callers fail on "a"; only the first moves the pointer
        assert!(list.advance_from(&WorkerSource::dedicated("a")));
        assert!(list.advance_from(&WorkerSource::dedicated("a")));
        assert_eq!(list.active(), Some(&WorkerSource::BlockingPool));

        assert!(list.advance_from(&WorkerSource::BlockingPool));
        assert_eq!(list.active(), Some(&WorkerSource::CallingThread));
        assert!(!list.advance_from(&WorkerSource::CallingThread));
    }
}
