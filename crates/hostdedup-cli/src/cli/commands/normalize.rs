//! `hostdedup normalize` - Try the field normalizers on a single value.

use anyhow::Result;
use colored::Colorize;
use hostdedup_core::normalize::{normalize_hostname, normalize_ip, normalize_mac};
use serde::Serialize;

use super::Context;
use crate::cli::args::{NormalizeArgs, NormalizeCommands};
use crate::education::Explain;
use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize)]
struct Normalized<'a> {
    kind: &'a str,
    input: &'a str,
    /// Empty when the input was discarded
    normalized: String,
}

pub fn execute(ctx: &Context, args: NormalizeArgs) -> Result<()> {
    let (kind, input, normalized) = match &args.command {
        NormalizeCommands::Hostname { value } => ("hostname", value, normalize_hostname(value)),
        NormalizeCommands::Ip { value } => ("ip", value, normalize_ip(value)),
        NormalizeCommands::Mac { value } => ("mac", value, normalize_mac(value)),
    };

    if ctx.explain {
        Explain::normalize(kind).print();
    }

    let result = Normalized {
        kind,
        input: input.as_str(),
        normalized,
    };

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&result)?,
        OutputFormat::Yaml => output::print_yaml(&result)?,
        OutputFormat::Csv => output::write_csv(&[result])?,
        OutputFormat::Pretty => {
            if result.normalized.is_empty() {
                println!("{} {} is not a valid {}", "Discarded:".yellow().bold(), input, kind);
            } else {
                println!("{}", result.normalized);
            }
        }
    }

    Ok(())
}
