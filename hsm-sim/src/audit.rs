//! Audit journal
//!
//! Every host command leaves one audit event. The [`AuditLogger`] trait is
//! the seam; [`LogAuditLogger`] forwards events to the `log` facade and
//! [`MemoryAuditLogger`] keeps a bounded in-memory journal that can be
//! queried afterwards.
//!
//! Audit data must never carry the LMK or clear key material.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

/// Target used for security events forwarded to `log`
pub const SECURITY_TARGET: &str = "hsm_sim::security";

/// Audit event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
    Error,
    Security,
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Security => "SECURITY",
        };
        f.write_str(name)
    }
}

/// Sink for audit events
///
/// Fire-and-forget: implementations must not fail and must not block the
/// caller for long.
pub trait AuditLogger: Send + Sync {
    /// Record an event
    fn log(&self, event: &str, data: Value, level: AuditLevel);

    fn info(&self, event: &str, data: Value) {
        self.log(event, data, AuditLevel::Info);
    }

    fn warn(&self, event: &str, data: Value) {
        self.log(event, data, AuditLevel::Warn);
    }

    fn security(&self, event: &str, data: Value) {
        self.log(event, data, AuditLevel::Security);
    }
}

/// Forwards audit events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditLogger;

impl AuditLogger for LogAuditLogger {
    fn log(&self, event: &str, data: Value, level: AuditLevel) {
        match level {
            AuditLevel::Debug => debug!("[{}] {}", event, data),
            AuditLevel::Info => info!("[{}] {}", event, data),
            AuditLevel::Warn => warn!("[{}] {}", event, data),
            AuditLevel::Error => error!("[{}] {}", event, data),
            AuditLevel::Security => warn!(target: SECURITY_TARGET, "[{}] {}", event, data),
        }
    }
}

/// A recorded audit event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub level: AuditLevel,
    pub event: String,
    pub data: Value,
}

/// Bounded in-memory audit journal
///
/// Holds at most `capacity` entries; the oldest entry is dropped first.
pub struct MemoryAuditLogger {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl MemoryAuditLogger {
    /// Default journal size
    pub const DEFAULT_CAPACITY: usize = 10_000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// The most recent `limit` entries, optionally filtered by level, oldest
    /// first
    pub fn entries(&self, level: Option<AuditLevel>, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock();
        let mut selected: Vec<AuditEntry> = entries
            .iter()
            .rev()
            .filter(|e| level.map_or(true, |l| e.level == l))
            .take(limit)
            .cloned()
            .collect();
        selected.reverse();
        selected
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for MemoryAuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogger for MemoryAuditLogger {
    fn log(&self, event: &str, data: Value, level: AuditLevel) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            level,
            event: event.to_string(),
            data,
        };

        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }
}
