// veriseal CLI - notarize and verify artifacts against the ledger

mod output;
mod store;

use std::io::Write;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use output::Format;
use veriseal_core::registry::TrackingEvent;
use veriseal_core::{
    Address, Artifact, Config, EvmLedger, HttpRegistry, Notarizer, Registry, Resolver, Stage,
    Status, VerifyReport, Visibility,
};

/// veriseal - ledger-backed artifact notarization
#[derive(Parser)]
#[command(name = "veriseal")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the registry and store a session token
    Login {
        /// Publisher e-mail (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Notarize an artifact on the ledger
    Sign {
        /// Path to the file to notarize
        path: Option<String>,

        /// Notarize a raw hash instead of a file
        #[arg(long, conflicts_with = "path")]
        hash: Option<String>,

        /// Display name recorded for a --hash artifact
        #[arg(long, requires = "hash")]
        name: Option<String>,

        /// Signer key address (defaults to the first key in the keychain)
        #[arg(short, long)]
        key: Option<String>,

        /// Trust status to assert: trusted, untrusted or unsupported
        #[arg(long, default_value = "trusted")]
        status: String,

        /// Metadata visibility: public or private
        #[arg(long, default_value = "public")]
        visibility: String,

        /// Output format (json)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Verify artifacts against the ledger
    Verify {
        /// Files to verify
        args: Vec<String>,

        /// Verify a raw hash instead of files
        #[arg(long, conflicts_with = "args")]
        hash: Option<String>,

        /// Accept only verifications matching the passed key(s)
        #[arg(short, long, conflicts_with = "org")]
        key: Vec<String>,

        /// Accept only verifications matching the passed organisation
        #[arg(long)]
        org: Option<String>,

        /// Output format (json)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Error marker for failures already reported through a structured output;
/// the generic error printer stays silent for these.
#[derive(Debug)]
struct Silent;

impl std::fmt::Display for Silent {
    fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

impl std::error::Error for Silent {}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login { email } => handle_login(email).await,
        Commands::Sign {
            path,
            hash,
            name,
            key,
            status,
            visibility,
            output,
        } => handle_sign(path, hash, name, key, status, visibility, output).await,
        Commands::Verify {
            args,
            hash,
            key,
            org,
            output,
        } => handle_verify(args, hash, key, org, output).await,
    };

    if let Err(e) = result {
        if e.downcast_ref::<Silent>().is_none() {
            eprintln!("{} {e:#}", "Error:".red().bold());
        }
        std::process::exit(1);
    }
}

fn gateways() -> anyhow::Result<(Arc<Config>, Arc<EvmLedger>, Arc<HttpRegistry>)> {
    let config = Arc::new(Config::for_stage(Stage::from_env())?);
    let ledger = Arc::new(EvmLedger::new(config.clone()));
    let registry = Arc::new(HttpRegistry::new(&config));
    Ok((config, ledger, registry))
}

async fn handle_login(email: Option<String>) -> anyhow::Result<()> {
    let email = match email {
        Some(e) => e,
        None => {
            print!("E-mail: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line
        }
    };
    let email = email.trim().to_string();
    if email.is_empty() {
        bail!("e-mail is required");
    }
    let password = rpassword::prompt_password("Password: ")?;

    let (_, _, registry) = gateways()?;
    let token = registry.authenticate(&email, &password).await?;
    store::save_token(&token)?;

    let _ = registry
        .track(Some(&token), &TrackingEvent::named("VERISEAL_LOGIN"))
        .await;

    println!("{} Logged in as {email}", "✓".green().bold());
    println!("Session token stored in {}", store::config_dir()?.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_sign(
    path: Option<String>,
    hash: Option<String>,
    name: Option<String>,
    key: Option<String>,
    status: String,
    visibility: String,
    output: Option<String>,
) -> anyhow::Result<()> {
    let format = parse_format(output.as_deref())?;
    let status: Status = status.parse()?;
    let visibility: Visibility = visibility.parse()?;

    let artifact = match (hash, path) {
        (Some(hash), None) => {
            let mut artifact = Artifact::from_hash(hash);
            if let Some(name) = name {
                artifact.name = name;
            }
            artifact
        }
        (None, Some(path)) => Artifact::from_file(&path)?,
        _ => bail!("provide a file to notarize, or --hash"),
    };

    let (identity, keychain) = store::load_identity()?;
    if !identity.is_authenticated() {
        bail!("no session token found, run `veriseal login` first");
    }
    let (config, ledger, registry) = gateways()?;
    if let Some(token) = identity.token() {
        if !registry.check_token(token).await? {
            bail!("session expired, run `veriseal login` again");
        }
    }
    let signer: Address = match key {
        Some(k) => k
            .parse()
            .map_err(|_| anyhow!("invalid signer key address: {k}"))?,
        None => *identity
            .keys
            .first()
            .with_context(|| format!("no keys found in {}", keychain.dir().display()))?,
    };

    let passphrase = rpassword::prompt_password("Keystore passphrase: ")?;

    let engine = Notarizer::new(config, ledger, registry, identity, keychain);
    let record = engine
        .sign(&artifact, signer, &passphrase, status, visibility)
        .await?;

    output::print_signed(
        format,
        &VerifyReport {
            artifact,
            record,
            metadata: None,
        },
    )
}

async fn handle_verify(
    args: Vec<String>,
    hash: Option<String>,
    key: Vec<String>,
    org: Option<String>,
    output: Option<String>,
) -> anyhow::Result<()> {
    validate_verify(hash.as_deref(), &args, &key, org.as_deref()).map_err(|e| anyhow!(e))?;
    let format = parse_format(output.as_deref())?;

    let keys: Vec<Address> = key
        .iter()
        .map(|k| {
            k.parse()
                .map_err(|_| anyhow!("invalid key address: {k}"))
        })
        .collect::<anyhow::Result<_>>()?;

    let artifacts = match hash {
        Some(hash) => vec![Artifact::from_hash(hash)],
        None => args
            .iter()
            .map(Artifact::from_file)
            .collect::<veriseal_core::Result<Vec<_>>>()?,
    };

    let (identity, _) = store::load_identity()?;
    let (_, ledger, registry) = gateways()?;
    let resolver = Resolver::new(ledger, registry.clone());

    for artifact in artifacts {
        let report = resolver
            .verify(&artifact, &keys, org.as_deref(), &identity)
            .await?;
        output::print_report(format, &report)?;

        let _ = registry
            .track(
                identity.token(),
                &TrackingEvent::verify(&artifact.hash, &artifact.name),
            )
            .await;

        if !report.is_trusted() {
            let message =
                output::rejection_message(&report.record, &artifact.hash, &key, org.as_deref());
            // A structured output already carries the result; do not print
            // the same failure twice.
            if format.is_structured() {
                return Err(Silent.into());
            }
            return Err(anyhow!(message));
        }
    }

    Ok(())
}

fn parse_format(output: Option<&str>) -> anyhow::Result<Format> {
    match output {
        Some(s) => s.parse(),
        None => Ok(Format::Human),
    }
}

/// Flag validation for `verify`, applied before the resolver is invoked.
fn validate_verify(
    hash: Option<&str>,
    args: &[String],
    keys: &[String],
    org: Option<&str>,
) -> Result<(), String> {
    if org.is_some() && !keys.is_empty() {
        return Err("cannot use both --org and --key".into());
    }
    if let Some(hash) = hash {
        if hash.is_empty() {
            return Err("--hash requires a value".into());
        }
        if !args.is_empty() {
            return Err("cannot use arg(s) with --hash".into());
        }
        return Ok(());
    }
    if args.is_empty() {
        return Err("at least one artifact, or --hash, is required".into());
    }
    Ok(())
}
