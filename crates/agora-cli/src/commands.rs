//! CLI command implementations.

use agora_crypto::Keypair;
use agora_governance::{attestation_digest, Attestation, Weight};
use agora_types::{Address, Hash};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{AgoraConfig, OutputFormat};
use crate::output::*;
use crate::scenario::{self, Scenario};

/// Main CLI.
#[derive(Parser)]
#[command(name = "agora")]
#[command(about = "Agora governance tooling: attestations and round simulation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, env = "AGORA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Attestation domain separator
    #[arg(long, global = true)]
    pub domain: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// File (or default) configuration with command-line overrides applied.
    pub fn resolve_config(&self) -> anyhow::Result<AgoraConfig> {
        let mut config = match &self.config {
            Some(path) => AgoraConfig::from_file(path)?,
            None => AgoraConfig::default(),
        };
        if let Some(domain) = &self.domain {
            config.domain_separator = domain.clone();
        }
        if let Some(format) = self.output {
            config.output.format = format;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.format = "json".to_string();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate an ed25519 keypair
    Keygen {
        /// Derive from a 32-byte hex seed instead of the OS RNG
        #[arg(long)]
        seed: Option<String>,
    },

    /// Hash an identity (email) the way the ledger stores it
    EmailHash {
        email: String,
    },

    /// Compute the digest an admin signs to attest a balance
    Digest {
        /// Attested address (agora1... or 0x...)
        #[arg(long)]
        subject: String,
        #[arg(long)]
        balance: Weight,
        #[arg(long)]
        email: String,
    },

    /// Sign an attestation with an admin seed
    Sign {
        /// Admin seed (hex)
        #[arg(long, env = "AGORA_ADMIN_SEED", hide_env_values = true)]
        seed: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        balance: Weight,
        #[arg(long)]
        email: String,
    },

    /// Replay a scenario file against fresh contracts
    Simulate {
        scenario: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Serialize)]
struct SignedAttestation {
    subject: Address,
    balance: Weight,
    email_hash: Hash,
    digest: Hash,
    #[serde(flatten)]
    attestation: Attestation,
}

pub fn email_hash(email: &str) -> Hash {
    Hash::compute(email.trim().as_bytes())
}

fn parse_address(s: &str) -> anyhow::Result<Address> {
    s.parse::<Address>()
        .map_err(|e| anyhow::anyhow!("Invalid address '{}': {}", s, e))
}

/// Execute a command.
pub fn execute(command: Commands, config: &AgoraConfig) -> anyhow::Result<()> {
    let format = config.output.format;
    let domain = config.domain_separator.as_str();

    match command {
        Commands::Keygen { seed } => {
            let keypair = match seed {
                Some(seed) => Keypair::from_seed_hex(&seed)?,
                None => Keypair::generate(),
            };
            print_fields(
                format,
                &[
                    ("address", keypair.address().to_string()),
                    ("public_key", format!("0x{}", hex::encode(keypair.public_key().as_bytes()))),
                    ("seed", format!("0x{}", hex::encode(*keypair.seed()))),
                ],
            )?;
            if format == OutputFormat::Table {
                print_warning("Keep the seed secret; it controls the address");
            }
        }

        Commands::EmailHash { email } => {
            print_fields(format, &[("email_hash", format_hash(&email_hash(&email)))])?;
        }

        Commands::Digest { subject, balance, email } => {
            let subject = parse_address(&subject)?;
            let email_hash = email_hash(&email);
            let digest = attestation_digest(domain, &subject, balance, &email_hash);
            print_fields(
                format,
                &[
                    ("domain", domain.to_string()),
                    ("subject", subject.to_string()),
                    ("balance", balance.to_string()),
                    ("email_hash", format_hash(&email_hash)),
                    ("digest", format_hash(&digest)),
                ],
            )?;
        }

        Commands::Sign { seed, subject, balance, email } => {
            let admin = Keypair::from_seed_hex(&seed)?;
            let subject = parse_address(&subject)?;
            let email_hash = email_hash(&email);
            let digest = attestation_digest(domain, &subject, balance, &email_hash);
            let signed = SignedAttestation {
                subject,
                balance,
                email_hash,
                digest,
                attestation: Attestation::sign(&admin, &digest),
            };
            debug!(signer = %admin.address(), subject = %subject, "Attestation signed");
            match format {
                OutputFormat::Json => print_json(&signed)?,
                OutputFormat::Table => print_fields(
                    format,
                    &[
                        ("signer", admin.address().to_string()),
                        ("digest", format_hash(&signed.digest)),
                        ("public_key", format!("0x{}", hex::encode(signed.attestation.signer.as_bytes()))),
                        ("signature", format!("0x{}", hex::encode(signed.attestation.signature.as_bytes()))),
                    ],
                )?,
            }
        }

        Commands::Simulate { scenario: path } => {
            let scenario = Scenario::from_file(&path)?;
            let report = scenario::run(&scenario, domain)?;
            print_report(format, &report)?;
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
