// Result rendering for the CLI - human-readable by default, structured when
// an --output format was requested.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use colored::Colorize;
use veriseal_core::{Verification, VerifyReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Human,
    Json,
}

impl Format {
    pub fn is_structured(self) -> bool {
        self != Format::Human
    }
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Format::Json),
            other => Err(anyhow!("unsupported output format '{other}', expected json")),
        }
    }
}

/// Prints a verification report.
pub fn print_report(format: Format, report: &VerifyReport) -> Result<()> {
    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        Format::Human => {
            if report.is_trusted() {
                println!(
                    "{} {} {}",
                    "✓".green().bold(),
                    report.artifact.hash,
                    "is trusted".green()
                );
            } else {
                println!(
                    "{} {} {}",
                    "✗".red().bold(),
                    report.artifact.hash,
                    report.record.status().label().red()
                );
            }
            if let Some(signer) = report.record.signer() {
                println!("  Signer: {signer:#x}");
                println!("  Level:  {}", report.record.level());
            }
            if let Some(metadata) = &report.metadata {
                println!("  Name:   {}", metadata.name);
                println!("  Size:   {} bytes", metadata.size);
            }
        }
    }
    Ok(())
}

/// Prints the record returned by a successful notarization.
pub fn print_signed(format: Format, report: &VerifyReport) -> Result<()> {
    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        Format::Human => {
            println!(
                "{} {} notarized as {}",
                "✓".green().bold(),
                report.artifact.name,
                report.record.status().to_string().green()
            );
            println!("  Hash:   {}", report.artifact.hash);
            if let Some(signer) = report.record.signer() {
                println!("  Signer: {signer:#x}");
            }
        }
    }
    Ok(())
}

/// Error message for a non-trusted verification, naming the hash and the
/// rejecting label: the organisation, the key(s), or nothing when the
/// default resolution was used.
pub fn rejection_message(
    record: &Verification,
    hash: &str,
    keys: &[String],
    org: Option<&str>,
) -> String {
    let label = record.status().label();
    match (org, keys.len()) {
        (Some(org), _) => format!("{hash} {label} by \"{org}\""),
        (None, 1) => format!("{hash} {label} by {}", keys[0]),
        (None, n) if n > 1 => format!("{hash} {label} by any of {}", keys.join(", ")),
        _ => format!("{hash} {label}"),
    }
}
