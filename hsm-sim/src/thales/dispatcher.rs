//! Command dispatcher
//!
//! Routes a parsed command to its handler through an opcode table and turns
//! every outcome into a wire response. `execute` never fails and never
//! unwinds: unknown opcodes become `ER`/`68`, handler errors and panics
//! become `ER`/`90` with the error text as payload.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, warn};
use serde_json::json;

use crate::audit::AuditLevel;
use crate::command::{opcode, Command, ErrorCode, Response};

use super::handlers;
use super::{HsmContext, HsmError};

/// Audit event emitted once per executed command
pub const EXECUTE_EVENT: &str = "THALES_EXECUTE";

/// A command handler
pub type Handler =
    Box<dyn Fn(&HsmContext, &Command) -> Result<Response, HsmError> + Send + Sync>;

/// Opcode to handler table
pub struct Dispatcher {
    handlers: HashMap<[u8; 2], Handler>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a dispatcher with every built-in command registered
    pub fn standard() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(opcode::GENERATE_KEY, handlers::keys::generate_key);
        dispatcher.register(opcode::IMPORT_KEY, handlers::keys::import_key);
        dispatcher.register(opcode::TRANSLATE_PIN_BLOCK, handlers::pin::translate_pin_block);
        dispatcher.register(opcode::VERIFY_PIN, handlers::pin::verify_pin);
        dispatcher.register(opcode::GENERATE_CVV, handlers::card::generate_cvv);
        dispatcher.register(opcode::VERIFY_CVV, handlers::card::verify_cvv);
        dispatcher.register(opcode::GENERATE_MAC, handlers::mac::generate_mac);
        dispatcher.register(opcode::VERIFY_MAC, handlers::mac::verify_mac);
        dispatcher.register(opcode::GENERATE_RANDOM, handlers::admin::generate_random);
        dispatcher.register(opcode::DIAGNOSTIC, handlers::admin::diagnostic);
        dispatcher.register(opcode::STATUS, handlers::admin::status);
        dispatcher
    }

    /// Register a handler, replacing any existing one for `code`
    pub fn register<F>(&mut self, code: [u8; 2], handler: F)
    where
        F: Fn(&HsmContext, &Command) -> Result<Response, HsmError> + Send + Sync + 'static,
    {
        self.handlers.insert(code, Box::new(handler));
    }

    /// Check if an opcode has a handler
    pub fn supports(&self, code: &[u8; 2]) -> bool {
        self.handlers.contains_key(code)
    }

    /// Registered opcodes, sorted
    pub fn opcodes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .handlers
            .keys()
            .map(|code| String::from_utf8_lossy(code).into_owned())
            .collect();
        codes.sort();
        codes
    }

    /// Execute a command
    pub fn execute(&self, ctx: &HsmContext, cmd: &Command) -> Response {
        debug!("Executing {} ({} payload bytes)", cmd.opcode_str(), cmd.payload.len());

        let (response, outcome) = match self.handlers.get(&cmd.opcode) {
            None => {
                warn!("Unknown command code {:?}", cmd.opcode_str());
                (
                    Response::error(cmd, ErrorCode::COMMAND_DISABLED),
                    "unknown_command",
                )
            }
            Some(handler) => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| handler(ctx, cmd)))
                    .unwrap_or_else(|payload| Err(HsmError::Panic(panic_message(payload))));

                match result {
                    Ok(response) if response.is_verification_failure() => {
                        (response, "verification_failure")
                    }
                    Ok(response) if response.is_okay() => (response, "success"),
                    Ok(response) => (response, "error"),
                    Err(err) => {
                        error!("Command {} failed: {}", cmd.opcode_str(), err);
                        (
                            Response::error_with_message(
                                cmd,
                                ErrorCode::INTERNAL_ERROR,
                                &err.to_string(),
                            ),
                            "error",
                        )
                    }
                }
            }
        };

        if !response.is_okay() {
            ctx.record_error();
        }

        let level = match outcome {
            "success" => AuditLevel::Info,
            "error" => AuditLevel::Error,
            _ => AuditLevel::Warn,
        };
        ctx.audit().log(
            EXECUTE_EVENT,
            json!({
                "opcode": cmd.opcode_str(),
                "outcome": outcome,
                "responseCode": response.status_str(),
                "errorCode": response.error_code_str(),
            }),
            level,
        );

        response
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::standard()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
