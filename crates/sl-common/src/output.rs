//! Payload formats selectable with `--format`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a command writes its result to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON envelope.
    #[default]
    Json,

    /// Markdown with a percentage table.
    Md,

    /// A single `[run_id] command: ...` line.
    Summary,

    /// Nothing on stdout; read the exit status.
    Exitcode,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OutputFormat::Json => "json",
            OutputFormat::Md => "md",
            OutputFormat::Summary => "summary",
            OutputFormat::Exitcode => "exitcode",
        })
    }
}
