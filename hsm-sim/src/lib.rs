//! Payment HSM simulator
//!
//! A Thales-style host command processor: raw command frames come in, raw
//! response frames go out. Commands cover key generation and import, PIN
//! block translation and IBM 3624 PIN verification, CVV generation and
//! verification, retail MACs, random numbers, diagnostics and status.
//!
//! All working keys are wrapped under a Local Master Key supplied at start-up
//! through [`config::HsmConfig`].
//!
//! ```ignore
//! use hsm_sim::HsmProcessor;
//!
//! let processor = HsmProcessor::from_config(&hsm_sim::config::HsmConfig::load(None)?)?;
//! let response = processor.process(b"0001JA0008")?;
//! assert_eq!(&response[4..6], b"JB");
//! ```

pub mod audit;
pub mod card;
pub mod command;
pub mod config;
pub mod crypto;
pub mod keys;
pub mod pin;
pub mod thales;

use log::{debug, warn};

use command::{parse_command, Command, CommandError, ErrorCode, Response, HEADER_LEN};
use config::{ConfigError, HsmConfig};
use thales::{Dispatcher, HsmContext};

/// Bytes-in, bytes-out front end over the dispatcher
pub struct HsmProcessor {
    context: HsmContext,
    dispatcher: Dispatcher,
}

impl HsmProcessor {
    /// Create a processor with the standard command set
    pub fn new(context: HsmContext) -> Self {
        Self::with_dispatcher(context, Dispatcher::standard())
    }

    /// Create a processor with a custom command table
    pub fn with_dispatcher(context: HsmContext, dispatcher: Dispatcher) -> Self {
        Self {
            context,
            dispatcher,
        }
    }

    /// Create a processor from configuration
    pub fn from_config(config: &HsmConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(HsmContext::from_config(config)?))
    }

    pub fn context(&self) -> &HsmContext {
        &self.context
    }

    /// Execute a parsed command
    pub fn execute(&self, cmd: &Command) -> Response {
        self.dispatcher.execute(&self.context, cmd)
    }

    /// Process a raw frame
    ///
    /// Fails only when the frame is too short to hold a header and command
    /// code; every other problem is reported inside the response.
    pub fn process(&self, frame: &[u8]) -> Result<Vec<u8>, CommandError> {
        let cmd = parse_command(frame)?;
        let response = self.execute(&cmd);
        debug!(
            "{} -> {}{}",
            cmd.opcode_str(),
            response.status_str(),
            response.error_code_str().unwrap_or_default()
        );
        Ok(response.to_bytes())
    }

    /// Process a raw frame, answering short frames with `ER`/`90`
    ///
    /// The header of a short frame is echoed when present, else `0000`.
    pub fn respond(&self, frame: &[u8]) -> Vec<u8> {
        match self.process(frame) {
            Ok(response) => response,
            Err(e) => {
                warn!("Rejected frame: {}", e);
                self.context.record_error();
                let mut header = *b"0000";
                if frame.len() >= HEADER_LEN {
                    header.copy_from_slice(&frame[..HEADER_LEN]);
                }
                Response::error_for_header(header, ErrorCode::INTERNAL_ERROR, &e.to_string())
                    .to_bytes()
            }
        }
    }
}
