//! `medispense` command-line tool.
//!
//! Drives the card reader and the dispenser controller over a serial link:
//!
//! ```text
//! medispense scan --profile kiosk --port /dev/serial0
//! medispense dispense --patient ACC0176D --visit 2025-12-01 --seed store.json
//! medispense ports
//! ```
//!
//! Log output goes to stderr and is filtered with `RUST_LOG` (default `info`).

mod cli;
mod settings;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use medispense_core::DispensingLogEntry;
use medispense_hardware::mock::MockTransport;
use medispense_hardware::{AnyTransport, SerialPortTransport, SharedTransport};
use medispense_kiosk::{InMemoryStore, KioskService};
use medispense_protocol::{DispenseResponse, PrescriptionResponse, VisitRequest};
use medispense_rfid::{ScanResult, Scanner};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ScanArgs, StatusArgs, VisitArgs};
use crate::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref())?.with_overrides(&cli);
    debug!(port = %settings.serial.port, baud = settings.serial.baud_rate, "Settings loaded");

    match cli.command {
        Command::Scan(args) => scan(&settings, args).await,
        Command::Dispense(args) => dispense(&settings, args).await,
        Command::Details(args) => details(&settings, args).await,
        Command::Status(args) => status(&settings, args).await,
        Command::Ports => ports(),
    }
}

/// Link to the configured serial device.
fn transport(settings: &Settings) -> SharedTransport<AnyTransport> {
    let port = AnyTransport::Serial(SerialPortTransport::new(&settings.serial.port));
    SharedTransport::new(port, settings.serial.clone())
}

/// Link for commands that only touch the document store. Never opened.
fn offline_transport(settings: &Settings) -> SharedTransport<AnyTransport> {
    let (mock, _device) = MockTransport::with_name("offline");
    SharedTransport::new(AnyTransport::Mock(mock), settings.serial.clone())
}

fn service(
    settings: &Settings,
    transport: SharedTransport<AnyTransport>,
    seed: Option<&std::path::Path>,
) -> anyhow::Result<KioskService<InMemoryStore, AnyTransport>> {
    let store = match seed {
        Some(path) => InMemoryStore::from_json_file(path)
            .with_context(|| format!("loading store seed {}", path.display()))?,
        None => InMemoryStore::new(),
    };
    Ok(KioskService::new(store, transport, settings.kiosk.clone()))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn scan(settings: &Settings, args: ScanArgs) -> anyhow::Result<ExitCode> {
    let mut profile = args.profile.profile();
    if let Some(timeout_ms) = args.timeout_ms {
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        profile = profile.with_frame_timeout(timeout);
    }

    let scanner = Scanner::new(transport(settings), profile);
    let handle = scanner.start().await?;
    let canceller = handle.canceller();
    info!(session_id = %handle.id(), "Present a card (Ctrl-C to cancel)");

    let wait = handle.wait();
    tokio::pin!(wait);
    let result = tokio::select! {
        result = &mut wait => result,
        _ = tokio::signal::ctrl_c() => {
            canceller.cancel();
            wait.await
        }
    };

    println!("{}", result.message());
    Ok(match result {
        ScanResult::Identifier(_) => ExitCode::SUCCESS,
        ScanResult::Cancelled | ScanResult::Error(_) => ExitCode::FAILURE,
    })
}

async fn dispense(settings: &Settings, args: VisitArgs) -> anyhow::Result<ExitCode> {
    let service = service(settings, transport(settings), args.seed.as_deref())?;
    let response = service
        .dispense(&VisitRequest::new(args.patient, args.visit))
        .await;

    print_json(&response)?;
    Ok(match response {
        DispenseResponse::DispenseSuccess { .. } => ExitCode::SUCCESS,
        DispenseResponse::Error { .. } => ExitCode::FAILURE,
    })
}

async fn details(settings: &Settings, args: VisitArgs) -> anyhow::Result<ExitCode> {
    let service = service(settings, offline_transport(settings), args.seed.as_deref())?;
    let response = service
        .prescription_details(&VisitRequest::new(args.patient, args.visit))
        .await;

    print_json(&response)?;
    Ok(match response {
        PrescriptionResponse::Success { .. } => ExitCode::SUCCESS,
        PrescriptionResponse::Error { .. } => ExitCode::FAILURE,
    })
}

async fn status(settings: &Settings, args: StatusArgs) -> anyhow::Result<ExitCode> {
    let service = service(settings, offline_transport(settings), args.seed.as_deref())?;
    let date = args
        .date
        .unwrap_or_else(|| DispensingLogEntry::log_date(Local::now()));

    let overview = service.machine_overview(&date).await?;
    print_json(&overview)?;
    Ok(ExitCode::SUCCESS)
}

fn ports() -> anyhow::Result<ExitCode> {
    let ports = SerialPortTransport::available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match port.product {
            Some(product) => println!("{}\t{}\t{}", port.name, port.kind, product),
            None => println!("{}\t{}", port.name, port.kind),
        }
    }
    Ok(ExitCode::SUCCESS)
}
