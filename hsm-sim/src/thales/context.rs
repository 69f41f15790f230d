//! Execution context shared by every handler
//!
//! Holds the LMK, the key store and audit collaborators, and the identity
//! reported by the diagnostic commands. The LMK is read-only after
//! construction; the only mutable state is the key store (which does its own
//! locking) and two atomic counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;

use crate::audit::{AuditLogger, LogAuditLogger};
use crate::config::{ConfigError, HsmConfig};
use crate::keys::{InMemoryKeyStore, KeyStore, Lmk};

/// Process start, for uptime reporting
pub static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Identity reported by `NC` and `NO`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HsmIdentity {
    pub lmk_id: String,
    pub firmware_version: String,
    pub serial_number: String,
    pub mode: String,
}

impl Default for HsmIdentity {
    fn default() -> Self {
        Self::from(&HsmConfig::default())
    }
}

impl From<&HsmConfig> for HsmIdentity {
    fn from(config: &HsmConfig) -> Self {
        Self {
            lmk_id: config.lmk_id.clone(),
            firmware_version: config.firmware_version.clone(),
            serial_number: config.serial_number.clone(),
            mode: config.mode.clone(),
        }
    }
}

pub struct HsmContext {
    lmk: Lmk,
    key_store: Arc<dyn KeyStore>,
    audit: Arc<dyn AuditLogger>,
    identity: HsmIdentity,
    error_count: AtomicU64,
    last_key_stamp: AtomicU64,
}

impl HsmContext {
    pub fn new(lmk: Lmk, key_store: Arc<dyn KeyStore>, audit: Arc<dyn AuditLogger>) -> Self {
        Lazy::force(&PROCESS_START);
        Self {
            lmk,
            key_store,
            audit,
            identity: HsmIdentity::default(),
            error_count: AtomicU64::new(0),
            last_key_stamp: AtomicU64::new(0),
        }
    }

    /// Build a context from configuration, with an in-memory key store and
    /// audit events forwarded to `log`
    pub fn from_config(config: &HsmConfig) -> Result<Self, ConfigError> {
        let lmk = config.lmk()?;
        let store = Arc::new(InMemoryKeyStore::new(config.max_keys));
        Ok(Self::new(lmk, store, Arc::new(LogAuditLogger)).with_identity(HsmIdentity::from(config)))
    }

    pub fn with_identity(mut self, identity: HsmIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn lmk(&self) -> &Lmk {
        &self.lmk
    }

    pub fn key_store(&self) -> &dyn KeyStore {
        self.key_store.as_ref()
    }

    pub fn audit(&self) -> &dyn AuditLogger {
        self.audit.as_ref()
    }

    pub fn identity(&self) -> &HsmIdentity {
        &self.identity
    }

    /// Count one error response
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Error responses produced so far
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Time since process start
    pub fn uptime(&self) -> Duration {
        PROCESS_START.elapsed()
    }

    /// Generate a `KEY_<timestamp>` id for an imported key
    ///
    /// The timestamp is in nanoseconds since the Unix epoch and strictly
    /// increasing across calls, so concurrent imports never share an id.
    pub fn next_key_id(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let next = |last: u64| now.max(last + 1);
        let stamp = match self
            .last_key_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(next(last)))
        {
            Ok(last) | Err(last) => next(last),
        };
        format!("KEY_{}", stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::audit::MemoryAuditLogger;

    fn context() -> HsmContext {
        HsmContext::new(
            Lmk::new(&[0x11; 16]).unwrap(),
            Arc::new(InMemoryKeyStore::default()),
            Arc::new(MemoryAuditLogger::new()),
        )
    }

    #[test]
    fn test_error_counter() {
        let ctx = context();
        assert_eq!(ctx.error_count(), 0);
        ctx.record_error();
        ctx.record_error();
        assert_eq!(ctx.error_count(), 2);
    }

    #[test]
    fn test_key_ids_unique() {
        let ctx = context();
        let ids: HashSet<String> = (0..1000).map(|_| ctx.next_key_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.starts_with("KEY_")));
    }

    #[test]
    fn test_key_ids_strictly_increase() {
        let ctx = context();
        let stamps: Vec<u64> = (0..100)
            .map(|_| ctx.next_key_id()["KEY_".len()..].parse().unwrap())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ctx.last_key_stamp.load(Ordering::SeqCst), stamps[99]);
    }

    #[test]
    fn test_from_config() {
        let mut config = HsmConfig::default();
        assert!(HsmContext::from_config(&config).is_err());

        config.lmk = Some("00112233445566778899AABBCCDDEEFF".to_string());
        config.serial_number = "UNIT0001".to_string();
        let ctx = HsmContext::from_config(&config).unwrap();
        assert_eq!(ctx.identity().serial_number, "UNIT0001");
        assert_eq!(ctx.key_store().key_count(), 0);
    }
}
