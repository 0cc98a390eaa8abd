use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mira_lib::command::{Action, ControlState};
use mira_lib::identity::{ClientId, DeviceIdentity, MacAddress};
use mira_lib::status::{DeviceStatus, Mode, Notification, decode_notification, decode_status};
use mira_lib::Shower;
use mira_rs::ShowerConfig;
use mira_rs::device::{self, BleTransport};

/// Control a Mira Mode digital shower over Bluetooth LE.
#[derive(Parser, Debug)]
#[command(name = "mira", author, version, about, long_about = None)]
struct Cli {
    /// Configuration file holding the device identity.
    #[arg(short, long, default_value = "mira.json")]
    config: PathBuf,
    /// How long to scan for the shower before giving up, in seconds.
    #[arg(long, default_value_t = 10)]
    scan_timeout: u64,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a configuration file for one shower.
    Init {
        #[arg(long)]
        mac: MacAddress,
        #[arg(long)]
        device_id: u8,
        /// Decimal or 0x-prefixed hex
        #[arg(long)]
        client_id: ClientId,
    },
    /// List nearby showers.
    Scan {
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
    /// Show the Device Information Service strings.
    Info,
    #[command(flatten)]
    Control(ControlCommand),
    /// Print the packet an action would send, without connecting.
    Encode {
        /// Status notification (hex) to apply the action to.
        #[arg(long)]
        state: Option<String>,
        #[command(subcommand)]
        action: ControlCommand,
    },
    /// Decode a status notification given in hex.
    Decode { notification: String },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum ControlCommand {
    /// Read the current status.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Turn an outlet on or off.
    Outlet {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        outlet: u8,
        state: Switch,
    },
    /// Set the target temperature in °C.
    Temperature { celsius: f64 },
    /// Set an outlet's flow, 0 to 100.
    Flow {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        outlet: u8,
        percent: u8,
    },
    /// Start or pause the shower.
    Mode { mode: ModeArg },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Switch {
    On,
    Off,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Running,
    Paused,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Running => Mode::Running,
            ModeArg::Paused => Mode::Paused,
        }
    }
}

impl ControlCommand {
    fn action(self) -> Action {
        match self {
            ControlCommand::Status { .. } => Action::RequestStatus,
            ControlCommand::Outlet { outlet, state } => Action::SetOutlet {
                outlet: usize::from(outlet - 1),
                on: matches!(state, Switch::On),
            },
            ControlCommand::Temperature { celsius } => Action::SetTemperature(celsius),
            ControlCommand::Flow { outlet, percent } => Action::SetFlow {
                outlet: usize::from(outlet - 1),
                percent,
            },
            ControlCommand::Mode { mode } => Action::SetMode(mode.into()),
        }
    }

    fn json(self) -> bool {
        matches!(self, ControlCommand::Status { json: true })
    }
}

fn setup_logging(log_file_path: Option<PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time();

    let (file_layer, guard) = if let Some(ref path) = log_file_path {
        let log_file = File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // INFO by default, DEBUG with -v, TRACE with -vv; RUST_LOG overrides.
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_file_path {
        info!("Logging to file: {:?}", path);
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let scan_timeout = Duration::from_secs(cli.scan_timeout);

    match cli.command {
        Command::Init {
            mac,
            device_id,
            client_id,
        } => {
            let config = ShowerConfig::new(DeviceIdentity::new(device_id, client_id, mac));
            config
                .save(&cli.config)
                .with_context(|| format!("Failed to write {:?}", cli.config))?;
            println!("Wrote {}", cli.config.display());
        }
        Command::Scan { seconds } => {
            let showers = device::scan(Duration::from_secs(seconds)).await?;
            if showers.is_empty() {
                println!("No showers found.");
            }
            for shower in showers {
                let rssi = shower.rssi.map_or_else(|| "?".to_string(), |rssi| rssi.to_string());
                println!("{}  {:<24} RSSI {} dBm", shower.address, shower.name, rssi);
            }
        }
        Command::Info => {
            let config = load_config(&cli.config)?;
            let transport = BleTransport::connect(&config, scan_timeout).await?;
            let info = transport.read_device_info().await;
            transport.disconnect().await;
            print!("{}", info?);
        }
        Command::Control(command) => {
            let config = load_config(&cli.config)?;
            let transport = BleTransport::connect(&config, scan_timeout).await?;
            let mut shower = Shower::new(transport, config.identity);
            let result = shower.apply(command.action()).await;
            shower.into_inner().disconnect().await;
            print_status(&result?, command.json())?;
        }
        Command::Encode { state, action } => {
            let config = load_config(&cli.config)?;
            let current = match state {
                Some(hex_state) => {
                    let raw = hex::decode(hex_state.trim()).context("State is not valid hex")?;
                    ControlState::from(&decode_status(&raw)?)
                }
                None => ControlState::default(),
            };
            let packet = action.action().build(&config.identity, &current)?;
            println!("{packet}");
        }
        Command::Decode { notification } => {
            let raw = hex::decode(notification.trim()).context("Notification is not valid hex")?;
            match decode_notification(&raw)? {
                Notification::Status(status) => print_status(&status, false)?,
                Notification::Auxiliary(bytes) => println!("Auxiliary notification: {}", hex::encode(bytes)),
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<ShowerConfig> {
    ShowerConfig::load(path).with_context(|| {
        format!(
            "Failed to load {:?}; create it with `mira init` or `recover_client_id --save`",
            path
        )
    })
}

fn print_status(status: &DeviceStatus, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
    } else {
        println!("{status}");
    }
    Ok(())
}
