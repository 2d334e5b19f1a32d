//! Dispense exchange with the controller.
//!
//! ```text
//! host                          controller
//!  │── clear input                   │
//!  │── MED:A0B2C0D0E1\n ───────────> │
//!  │ <───────────────────── DONE\n ──│   dispensed
//!  │── END\n ──────────────────────> │
//!  │ <────────────────── STK:..... ──│   stock report
//! ```
//!
//! The exchange ends once both `DONE` and the stock report have arrived.
//! `ERR` fails it immediately. When the response timeout elapses, the
//! exchange fails only if `DONE` never arrived; a missing stock report is
//! logged and tolerated.

use std::time::Duration;

use bytes::BytesMut;
use medispense_core::constants::DISPENSE_TIMEOUT_MS;
use medispense_hardware::{SerialTransport, SharedTransport, TransportGuard};
use medispense_protocol::{DeviceLine, DispenseCommand, DispenserCodec, HostCommand, StockReport};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::codec::Decoder;
use tracing::{debug, info, warn};

use crate::error::{KioskError, KioskResult};

/// Bytes requested per transport read.
const READ_CHUNK_SIZE: usize = 128;

/// Dispense exchange settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispenseConfig {
    /// Overall time allowed for `DONE` and the stock report, in milliseconds.
    pub response_timeout_ms: u64,
}

impl DispenseConfig {
    /// Response timeout as a [`Duration`].
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl Default for DispenseConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: DISPENSE_TIMEOUT_MS,
        }
    }
}

/// Result of a confirmed dispense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispenseOutcome {
    /// Command that was sent.
    pub command: DispenseCommand,

    /// Stock report, if it arrived in time.
    pub stock: Option<StockReport>,
}

/// Runs dispense exchanges over the controller link.
#[derive(Debug)]
pub struct Dispenser<T> {
    transport: SharedTransport<T>,
    config: DispenseConfig,
}

impl<T> Clone for Dispenser<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T: SerialTransport> Dispenser<T> {
    /// Create a dispenser over a shared transport.
    pub fn new(transport: SharedTransport<T>, config: DispenseConfig) -> Self {
        Self { transport, config }
    }

    /// Exchange settings.
    pub fn config(&self) -> &DispenseConfig {
        &self.config
    }

    /// Send a dispense command and wait for confirmation.
    ///
    /// # Errors
    ///
    /// - [`KioskError::Hardware`] if the link is busy, cannot be opened or fails
    /// - [`KioskError::Rejected`] if the controller answers `ERR`
    /// - [`KioskError::DispenseTimeout`] if `DONE` never arrives
    pub async fn dispense(&self, command: DispenseCommand) -> KioskResult<DispenseOutcome> {
        let mut guard = self.transport.try_acquire()?;
        guard.ensure_open().await?;

        info!(command = %command, port = %self.transport.name(), "Dispensing");
        let outcome = Exchange::new(&mut guard, self.config.response_timeout_ms)
            .run(command)
            .await;

        match &outcome {
            Ok(outcome) => info!(
                command = %command,
                stock = ?outcome.stock.as_ref().map(ToString::to_string),
                "Dispense confirmed"
            ),
            Err(err) => warn!(command = %command, error = %err, "Dispense failed"),
        }
        outcome
    }
}

/// State of one exchange.
struct Exchange<'a, T> {
    guard: &'a mut TransportGuard<T>,
    codec: DispenserCodec,
    buffer: BytesMut,
    timeout_ms: u64,
    done: bool,
    stock: Option<StockReport>,
}

impl<'a, T: SerialTransport> Exchange<'a, T> {
    fn new(guard: &'a mut TransportGuard<T>, timeout_ms: u64) -> Self {
        Self {
            guard,
            codec: DispenserCodec::new(),
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            timeout_ms,
            done: false,
            stock: None,
        }
    }

    async fn run(mut self, command: DispenseCommand) -> KioskResult<DispenseOutcome> {
        self.guard.clear_input().await?;
        self.send(HostCommand::Dispense(command)).await?;

        // No deadline if the configured timeout overflows the clock.
        let deadline = Instant::now().checked_add(Duration::from_millis(self.timeout_ms));
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while !(self.done && self.stock.is_some()) {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                if !self.done {
                    return Err(KioskError::DispenseTimeout {
                        timeout_ms: self.timeout_ms,
                    });
                }
                warn!("Stock report not received");
                break;
            }

            let n = self.guard.read(&mut chunk).await?;
            if n == 0 {
                continue;
            }
            self.buffer.extend_from_slice(&chunk[..n]);
            self.drain_lines().await?;
        }

        Ok(DispenseOutcome {
            command,
            stock: self.stock,
        })
    }

    async fn drain_lines(&mut self) -> KioskResult<()> {
        loop {
            let line = match self.codec.decode(&mut self.buffer) {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(()),
                Err(err) => {
                    warn!(error = %err, "Discarding controller output");
                    continue;
                }
            };

            match line {
                DeviceLine::Rejected(line) => return Err(KioskError::Rejected(line)),
                DeviceLine::Done if !self.done => {
                    self.done = true;
                    debug!("Dispense done, requesting stock report");
                    self.send(HostCommand::End).await?;
                }
                DeviceLine::Done => {}
                DeviceLine::Stock(report) => {
                    debug!(stock = %report, "Stock report received");
                    self.stock = Some(report);
                }
                DeviceLine::Unrecognized(line) => debug!(line = %line, "Controller output"),
            }
        }
    }

    async fn send(&mut self, command: HostCommand) -> KioskResult<()> {
        self.guard.write_all(&command.to_wire()).await?;
        Ok(())
    }
}
