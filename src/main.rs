use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use intergas_rs::config::BridgeConfig;
use intergas_rs::util::hex::decode_hex;
use intergas_rs::{
    init_logger, log_info, BoilerBridge, BoilerDecoder, BoilerSerialHandle, Command,
    JsonLinesSink, LogSink, RecordingSink, SysfsOneWireBus, TelemetrySink,
};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intergas-cli")]
#[command(about = "CLI tool for the Intergas boiler service port")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll a boiler and print changed values as JSON lines
    Poll {
        #[arg(short, long)]
        port: String,
        #[arg(short, long)]
        baudrate: Option<u32>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Run a single poll cycle and exit
        #[arg(long)]
        once: bool,
        /// Log changed values instead of printing JSON lines
        #[arg(long)]
        log_only: bool,
    },
    /// Decode a captured response given as hex
    Decode {
        #[arg(short, long)]
        command: Command,
        hex: String,
    },
    /// Print or write the default configuration
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

async fn poll<S: TelemetrySink>(
    handle: BoilerSerialHandle,
    sink: S,
    config: &BridgeConfig,
    once: bool,
) -> anyhow::Result<()> {
    let mut bridge = BoilerBridge::new(handle, sink, config);

    if config.sensors.enabled {
        let bus = SysfsOneWireBus::scan(&config.sensors.w1_path)?;
        bridge.attach_probes(Box::new(bus), config.sensors.expected_count);
    }

    if once {
        let report = bridge.poll_once().await;
        if !report.is_success() {
            bail!("poll failed: {}", report.diagnostics.join("; "));
        }
    } else {
        tokio::select! {
            _ = bridge.run() => {}
            _ = tokio::signal::ctrl_c() => log_info("Interrupted, stopping"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Poll {
            port,
            baudrate,
            config,
            once,
            log_only,
        } => {
            let mut config = match config {
                Some(path) => BridgeConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => BridgeConfig::default(),
            };
            config.serial.port = port;
            if let Some(baudrate) = baudrate {
                config.serial.baudrate = baudrate;
            }
            config.validate()?;

            let handle = BoilerSerialHandle::connect(&config.serial).await?;
            if log_only {
                poll(handle, LogSink, &config, once).await?;
            } else {
                poll(handle, JsonLinesSink::new(std::io::stdout()), &config, once).await?;
            }
        }
        Commands::Decode { command, hex } => {
            let data = decode_hex(&hex)?;
            let mut decoder = BoilerDecoder::default();
            let mut sink = RecordingSink::new();
            let outcome = decoder.decode(command, &data, &mut sink)?;

            let report = json!({
                "command": command.mnemonic(),
                "success": outcome.is_success(),
                "frame": outcome.frame,
                "state": outcome.state,
                "rejected": outcome.rejected,
                "updates": sink.updates,
                "flags": sink.flags,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config { output } => {
            let config = BridgeConfig::default();
            match output {
                Some(path) => {
                    config.save(&path)?;
                    log_info(&format!("Wrote {}", path.display()));
                }
                None => println!("{}", config.to_json()?),
            }
        }
    }

    Ok(())
}
