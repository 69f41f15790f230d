//! hsm-sim - line-oriented driver for the HSM simulator
//!
//! Reads one hex-encoded command frame per line on stdin and writes the
//! hex-encoded response frame on stdout. Blank lines and lines starting with
//! `#` are ignored.
//!
//! Usage: hsm-sim [config.json]
//!
//! The LMK comes from the config file or `HSM_LMK`. Set `RUST_LOG=debug` for
//! per-command logging on stderr.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use log::info;

use hsm_sim::config::HsmConfig;
use hsm_sim::HsmProcessor;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match HsmConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let processor = match HsmProcessor::from_config(&config) {
        Ok(processor) => processor,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    info!(
        "HSM simulator ready (serial {}, firmware {})",
        config.serial_number, config.firmware_version
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                process::exit(1);
            }
        };

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let frame = match hex::decode(line) {
            Ok(frame) => frame,
            Err(e) => {
                eprintln!("Skipping line, not hex: {}", e);
                continue;
            }
        };

        let response = processor.respond(&frame);
        if let Err(e) = writeln!(out, "{}", hex::encode_upper(response)).and_then(|_| out.flush()) {
            eprintln!("Error writing output: {}", e);
            process::exit(1);
        }
    }
}
