//! Log output format selection.
//!
//! The format is chosen through `log_format` in the configuration file,
//! `INVOKER_LOG_FORMAT` or `--log-format`. Parsing from text ignores ASCII
//! case.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shape of the executor's stderr log lines.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON, one event per line, for the platform's log collector.
    #[default]
    Json,
    /// Human-readable single line output for local runs.
    Compact,
}

/// Error returned when a log format name is not recognised.
pub type LogFormatParseError = strum::ParseError;
