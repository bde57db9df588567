//! Type definitions for the queue system
//!
//! This module contains the declarative queue model shared between init
//! specs, the registry, and read-only introspection.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Backend selection for a declared queue.
///
/// Spec files carry the kind as a snake_case string (`"locking"`,
/// `"lock_free"`); anything unrecognised parses to `Unknown` and is
/// rejected when the registry is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "snake_case")]
pub enum QueueKind {
    /// Placeholder for strings no backend matches.
    Unknown,
    /// Mutex plus two condition variables over a deque.
    Locking,
    /// Bounded lock-free MPMC ring.
    LockFree,
}

impl From<String> for QueueKind {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(QueueKind::Unknown)
    }
}

impl From<QueueKind> for String {
    fn from(kind: QueueKind) -> Self {
        kind.to_string()
    }
}

/// Declarative description of one queue, consumed once at init time.
///
/// The element type is not part of the spec; it is bound on first typed
/// access through the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSpec {
    pub name: String,
    pub kind: QueueKind,
    pub capacity: usize,
}

/// Read-only introspection row for one live queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub name: String,
    pub kind: QueueKind,
    pub capacity: usize,
    /// Occupancy sampled at snapshot time; advisory under concurrent use.
    pub occupancy: usize,
    /// Element type bound at first typed access.
    pub element_type: &'static str,
}
