use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use greentic_lease_core::BrokerConfig;
use greentic_lease_spec::{AcceptedLease, LeaseDescriptor, RenewalRequest};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

mod telemetry;

#[derive(Parser)]
#[command(name = "greentic-lease", version, about = "Greentic secret lease tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode and validate a lease document.
    Validate(ValidateCmd),
    /// Print the timeline of an accepted lease.
    Inspect(InspectCmd),
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(Args)]
struct ValidateCmd {
    /// JSON document to read, `-` for stdin.
    #[arg(short = 'f', long)]
    file: PathBuf,
    #[arg(long, value_enum, default_value_t = DocKind::Descriptor)]
    kind: DocKind,
}

#[derive(Clone, Copy, ValueEnum)]
enum DocKind {
    Descriptor,
    Renewal,
    Accepted,
}

#[derive(Args)]
struct InspectCmd {
    #[arg(short = 'f', long)]
    file: PathBuf,
}

#[derive(Subcommand)]
enum ConfigCmd {
    /// Print the resolved broker limits as JSON.
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    telemetry::init()?;
    let cli = Cli::parse();
    match cli.command {
        Command::Validate(cmd) => run_validate(cmd),
        Command::Inspect(cmd) => run_inspect(cmd),
        Command::Config(ConfigCmd::Show { config }) => run_config_show(config.as_deref()),
    }
}

fn run_validate(cmd: ValidateCmd) -> Result<()> {
    let summary = match cmd.kind {
        DocKind::Descriptor => {
            let descriptor: LeaseDescriptor = read_document(&cmd.file)?;
            descriptor.validate()?;
            format!("valid descriptor: {}", describe(&descriptor))
        }
        DocKind::Renewal => {
            let request: RenewalRequest = read_document(&cmd.file)?;
            request.current().validate()?;
            match request.requested_increment() {
                Some(increment) => format!(
                    "valid renewal request: {} increment={increment}",
                    describe(request.current())
                ),
                None => format!("valid renewal request: {}", describe(request.current())),
            }
        }
        DocKind::Accepted => {
            let lease: AcceptedLease = read_document(&cmd.file)?;
            format!(
                "valid accepted lease {}: {}",
                lease.lease_id(),
                describe(lease.descriptor())
            )
        }
    };
    println!("{summary}");
    Ok(())
}

fn run_inspect(cmd: InspectCmd) -> Result<()> {
    let lease: AcceptedLease = read_document(&cmd.file)?;
    let now = OffsetDateTime::now_utc();
    println!("lease_id={}", lease.lease_id());
    println!("issued_at={}", rfc3339(lease.issued_at())?);
    println!("expires_at={}", rfc3339(lease.expires_at())?);
    println!("revoke_after={}", rfc3339(lease.revoke_after())?);
    println!("renewable={}", lease.renewable());
    println!("expired={}", lease.is_expired(now));
    Ok(())
}

fn run_config_show(path: Option<&Path>) -> Result<()> {
    let mut config = BrokerConfig::from_env();
    if let Some(path) = path {
        config = config.merge(BrokerConfig::load_from_file(path)?);
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };
    debug!(path = %path.display(), bytes = data.len(), "decoding lease document");
    serde_json::from_str(&data).with_context(|| format!("invalid lease document {}", path.display()))
}

fn describe(descriptor: &LeaseDescriptor) -> String {
    format!(
        "lease={} grace={} renewable={} internal_data_keys={}",
        descriptor.lease,
        descriptor.lease_grace_period,
        descriptor.renewable,
        descriptor.internal_data.len()
    )
}

fn rfc3339(at: OffsetDateTime) -> Result<String> {
    at.format(&Rfc3339)
        .with_context(|| format!("timestamp {at} cannot be rendered as RFC 3339"))
}
