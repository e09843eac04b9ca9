//! Output formatting for different formats.

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

/// Available output formats.
///
/// Parsing (flags, config file, `config set`) is case-insensitive and accepts
/// the aliases `table` and `yml`.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed tables with colors
    #[default]
    #[value(alias = "table")]
    #[serde(alias = "table")]
    Pretty,
    /// Upsert documents as a JSON array
    Json,
    /// One flat row per host
    Csv,
    /// YAML output
    #[value(alias = "yml")]
    #[serde(alias = "yml")]
    Yaml,
}

impl OutputFormat {
    fn names() -> String {
        Self::value_variants()
            .iter()
            .filter_map(ValueEnum::to_possible_value)
            .map(|value| value.get_name().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| anyhow::anyhow!("unknown output format `{s}` (valid: {})", Self::names()))
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value()
            .map_or(Ok(()), |value| f.write_str(value.get_name()))
    }
}

/// Write `rows` as CSV with a header row to stdout.
pub fn write_csv<R: Serialize>(rows: &[R]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Print a serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Print a serializable value as YAML.
pub fn print_yaml<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    print!("{}", serde_yaml::to_string(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Pretty);
        assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn unknown_format_lists_valid_names() {
        let err = "xml".parse::<OutputFormat>().unwrap_err().to_string();
        assert!(err.contains("pretty, json, csv, yaml"), "{err}");
    }

    #[test]
    fn config_file_accepts_aliases() {
        let format: OutputFormat = serde_json::from_str("\"yml\"").unwrap();
        assert_eq!(format, OutputFormat::Yaml);
        assert_eq!(serde_json::to_string(&OutputFormat::Pretty).unwrap(), "\"pretty\"");
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for format in [OutputFormat::Pretty, OutputFormat::Json, OutputFormat::Csv, OutputFormat::Yaml] {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }
}
