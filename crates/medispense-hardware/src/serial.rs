//! Serial port transport backed by the `serialport` crate.
//!
//! `serialport` exposes a blocking API, so every operation runs on Tokio's
//! blocking pool. The port is opened with a short read timeout, which keeps
//! each blocking read bounded and lets callers observe cancellation between
//! reads.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use serialport::{ClearBuffer, SerialPort, SerialPortType};
use tracing::{debug, info, trace, warn};

use crate::error::{HardwareError, Result};
use crate::traits::SerialTransport;
use crate::types::{PortInfo, SerialConfig};

type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

/// Transport over a physical serial port.
///
/// # Example
///
/// ```no_run
/// use medispense_hardware::{SerialConfig, SerialPortTransport, SerialTransport};
///
/// # async fn example() -> medispense_hardware::Result<()> {
/// let config = SerialConfig::new("/dev/ttyUSB0");
/// let mut transport = SerialPortTransport::new(&config.port);
/// transport.open(&config).await?;
/// transport.write_all(b"S").await?;
/// # Ok(())
/// # }
/// ```
pub struct SerialPortTransport {
    /// Device path
    name: String,

    /// Open port handle (None while closed)
    port: Option<SharedPort>,
}

impl SerialPortTransport {
    /// Create a transport for the given device path. The port is not opened.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: path.into(),
            port: None,
        }
    }

    /// List serial ports present on the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform enumeration fails.
    pub fn available_ports() -> Result<Vec<PortInfo>> {
        let ports =
            serialport::available_ports().map_err(|e| HardwareError::from_serial("host", e))?;

        Ok(ports
            .into_iter()
            .map(|p| {
                let (kind, product) = match p.port_type {
                    SerialPortType::UsbPort(usb) => ("usb", usb.product),
                    SerialPortType::PciPort => ("pci", None),
                    SerialPortType::BluetoothPort => ("bluetooth", None),
                    SerialPortType::Unknown => ("unknown", None),
                };
                PortInfo {
                    name: p.port_name,
                    kind: kind.to_string(),
                    product,
                }
            })
            .collect())
    }

    /// Drop the port handle if `result` reports a lost link.
    fn check_link<R>(&mut self, result: Result<R>) -> Result<R> {
        if let Err(err) = &result
            && err.is_link_failure()
            && self.port.take().is_some()
        {
            warn!(port = %self.name, error = %err, "Serial link lost, port closed");
        }
        result
    }

    fn port(&self) -> Result<SharedPort> {
        self.port
            .clone()
            .ok_or_else(|| HardwareError::not_open(&self.name))
    }
}

impl std::fmt::Debug for SerialPortTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortTransport")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

/// Run a blocking port operation on the blocking pool.
async fn run_blocking<F, R>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HardwareError::other(format!("serial task failed: {e}")))?
}

fn lock(port: &SharedPort) -> Result<std::sync::MutexGuard<'_, Box<dyn SerialPort>>> {
    port.lock()
        .map_err(|_| HardwareError::communication("serial port lock poisoned"))
}

impl SerialTransport for SerialPortTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    async fn open(&mut self, config: &SerialConfig) -> Result<()> {
        if self.port.is_some() {
            trace!(port = %self.name, "Serial port already open");
            return Ok(());
        }

        info!(port = %self.name, baud_rate = config.baud_rate, "Opening serial port");

        let name = self.name.clone();
        let builder = serialport::new(&self.name, config.baud_rate).timeout(config.read_timeout());
        let port = run_blocking(move || {
            builder
                .open()
                .map_err(|e| HardwareError::from_serial(&name, e))
        })
        .await
        .inspect_err(|e| warn!(port = %self.name, "Failed to open serial port: {}", e))?;

        self.port = Some(Arc::new(Mutex::new(port)));
        debug!(port = %self.name, "Serial port open");
        Ok(())
    }

    async fn clear_input(&mut self) -> Result<()> {
        let port = self.port()?;
        let name = self.name.clone();
        let result = run_blocking(move || {
            lock(&port)?
                .clear(ClearBuffer::Input)
                .map_err(|e| HardwareError::from_serial(&name, e))
        })
        .await;
        self.check_link(result)
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        trace!(port = %self.name, len = bytes.len(), "Serial write");

        let port = self.port()?;
        let bytes = bytes.to_vec();
        let result = run_blocking(move || {
            let mut port = lock(&port)?;
            port.write_all(&bytes)?;
            port.flush()?;
            Ok(())
        })
        .await;
        self.check_link(result)
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let port = self.port()?;
        let name = self.name.clone();
        let capacity = buf.len();

        let result = run_blocking(move || {
            let mut port = lock(&port)?;
            let mut chunk = vec![0u8; capacity];
            match port.read(&mut chunk) {
                Ok(0) => Err(HardwareError::disconnected(name)),
                Ok(n) => {
                    chunk.truncate(n);
                    Ok(chunk)
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                    Ok(Vec::new())
                }
                Err(e) => Err(e.into()),
            }
        })
        .await;
        let chunk = self.check_link(result)?;

        buf[..chunk.len()].copy_from_slice(&chunk);
        if !chunk.is_empty() {
            trace!(port = %self.name, len = chunk.len(), "Serial read");
        }
        Ok(chunk.len())
    }

    async fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            info!(port = %self.name, "Serial port closed");
        }
        Ok(())
    }
}
