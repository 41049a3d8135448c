//! Synthetic names for anonymous expression columns.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default prefix of synthetic names
pub const DEFAULT_PREFIX: &str = "ANON";

/// Hands out `<prefix>_<n>` names with a monotonically increasing `n`.
///
/// Uniqueness holds per allocator and per process run only; numbering
/// restarts with every new allocator and every restart.
#[derive(Debug)]
pub struct NameAllocator {
    prefix: String,
    issued: AtomicU64,
}

impl NameAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            issued: AtomicU64::new(0),
        }
    }

    pub fn next_name(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let name = format!("{}_{}", self.prefix, n);
        log::trace!("Allocated anonymous column name {}", name);
        name
    }

    /// Number of names handed out so far
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

static PROCESS_NAMES: Lazy<NameAllocator> = Lazy::new(NameAllocator::default);

/// Process-wide allocator used when no session allocator is supplied
pub fn process_names() -> &'static NameAllocator {
    &PROCESS_NAMES
}
