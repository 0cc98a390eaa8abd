// src/bin/recover_client_id.rs

use anyhow::{Context, Result, bail};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use tracing::{error, info, warn};

use mira_lib::identity::{DeviceIdentity, MacAddress};
use mira_lib::recovery::{Observation, recover_from_observations};
use mira_rs::ShowerConfig;

/// Recovers the client id of a paired controller from sniffed command packets.
///
/// Each observation is a pair of `--data` (the packet without its checksum)
/// and `--packet` (the same bytes with the two checksum bytes the device
/// accepted). Give two or more observations to confirm the result.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command bytes without the checksum, in hex.
    #[arg(long, required = true)]
    data: Vec<String>,
    /// Complete command packet including the checksum, in hex.
    #[arg(long, required = true)]
    packet: Vec<String>,
    /// Write a configuration file when the client id is unique.
    #[arg(long, requires = "mac")]
    save: Option<PathBuf>,
    /// Shower MAC address to store with --save.
    #[arg(long)]
    mac: Option<MacAddress>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbose.tracing_level_filter())
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    if cli.data.len() != cli.packet.len() {
        bail!(
            "Got {} --data and {} --packet values; give them in pairs",
            cli.data.len(),
            cli.packet.len()
        );
    }

    let mut observations = Vec::with_capacity(cli.data.len());
    for (data_hex, packet_hex) in cli.data.iter().zip(&cli.packet) {
        let data = hex::decode(data_hex.trim()).with_context(|| format!("--data {data_hex} is not valid hex"))?;
        let packet =
            hex::decode(packet_hex.trim()).with_context(|| format!("--packet {packet_hex} is not valid hex"))?;
        let observation = Observation::new(&data, &packet).with_context(|| format!("Observation {packet_hex}"))?;
        observations.push(observation);
    }

    info!(observations = observations.len(), "Scanning client id space...");
    let candidates = recover_from_observations(&observations)?;

    let Some(client_id) = candidates.unique() else {
        println!("Ambiguous: {} candidates {}", candidates.len(), candidates);
        println!("Capture another command from the same controller and run again with both.");
        return Ok(());
    };

    println!("Client id: {client_id}");
    if observations.len() == 1 {
        warn!("Recovered from a single observation; confirm it with a second capture");
    }

    if let (Some(path), Some(mac)) = (cli.save, cli.mac) {
        let device_id = observations[0].data[0];
        let config = ShowerConfig::new(DeviceIdentity::new(device_id, client_id, mac));
        config
            .save(&path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        println!("Wrote {} (device id {device_id})", path.display());
    }

    Ok(())
}
