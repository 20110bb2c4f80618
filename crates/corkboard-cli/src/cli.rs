use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "corkboard")]
#[command(about = "Shared boards of notes, stickers and images that expire after 24 hours")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional JSON configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the time left on a board
    Countdown {
        /// Board creation time (RFC 3339)
        #[arg(long, value_name = "TIMESTAMP")]
        created_at: String,
        /// Keep printing every second until the board expires
        #[arg(long)]
        watch: bool,
    },
    /// List the reminders still due for a board
    Reminders {
        /// Board share code
        #[arg(long)]
        code: String,
        /// Board title, used as the notification title
        #[arg(long, default_value = "Corkboard")]
        title: String,
        /// Board creation time (RFC 3339)
        #[arg(long, value_name = "TIMESTAMP")]
        created_at: String,
    },
    /// Generate board share codes
    Code {
        /// Number of codes to print
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
    /// Show or change the onboarding flag
    Onboarding {
        #[arg(value_enum, default_value_t = OnboardingAction::Status)]
        action: OnboardingAction,
        /// Directory holding preferences.json
        #[arg(long, value_name = "DIR")]
        prefs_dir: Option<PathBuf>,
    },
    /// Run a board session against an in-memory store and export it
    Demo {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Write to a generated file name in this directory instead
        #[arg(long, value_name = "DIR", conflicts_with = "output")]
        output_dir: Option<PathBuf>,
        /// Directory image blobs are written to (system temp dir when omitted)
        #[arg(long, value_name = "DIR")]
        assets_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for corkboard_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OnboardingAction {
    Status,
    Complete,
    Reset,
}
