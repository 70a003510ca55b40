use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tempo_core::{
    domain::{Money, SplitDimension},
    import::ImportFormat,
    rounding::{RoundingDirection, RoundingPolicy},
};
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Parser)]
#[command(name = "tempo")]
#[command(about = "Import time records and build reports from them")]
pub struct Cli {
    /// Use this data file instead of the configured one
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import frames exported by another time tracker
    Import {
        /// mac, fanurio or watson
        format: ImportFormat,
        file: PathBuf,
    },
    /// Write an HTML report
    Report(ReportArgs),
    /// Show tracked time per project for today, this week, ...
    Status,
    /// List projects by full name
    Projects,
    /// Set the hourly rate of a project, or clear it when no rate is given
    Rate {
        /// Project name or full name
        project: String,
        /// Amount and currency code, e.g. "10.50 USD"
        rate: Option<Money>,
    },
    /// Mark the finished frames of a project as archived
    Archive {
        /// Project name or full name
        project: String,
        /// Also archive frames of subprojects
        #[arg(long)]
        subprojects: bool,
    },
    /// Print config path and create default file if missing
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Only report this project (name or full name, e.g. "Acme/Website")
    #[arg(long)]
    pub project: Option<String>,
    /// Include subprojects of --project
    #[arg(long)]
    pub subprojects: bool,
    /// First day of the report (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, requires = "to")]
    pub from: Option<Date>,
    /// Last day of the report, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, requires = "from")]
    pub to: Option<Date>,
    /// Split dimensions, outermost first
    #[arg(long, value_delimiter = ',', default_value = "project")]
    pub split: Vec<SplitDimension>,
    /// Rounding as DIRECTION:MINUTES, e.g. nearest:15
    #[arg(long, value_parser = parse_rounding)]
    pub round: Option<RoundingPolicy>,
    /// Template id, falls back to the configured one
    #[arg(long)]
    pub template: Option<String>,
    /// Lay out two split dimensions as a matrix
    #[arg(long)]
    pub matrix: bool,
    /// Also list groups without frames
    #[arg(long)]
    pub show_empty: bool,
    /// Print the summary block
    #[arg(long)]
    pub summary: bool,
    /// Show sales columns
    #[arg(long)]
    pub sales: bool,
    /// Show tracked and untracked averages in the summary
    #[arg(long)]
    pub averages: bool,
    /// Include archived frames
    #[arg(long)]
    pub archived: bool,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value, DATE_FORMAT).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_rounding(value: &str) -> Result<RoundingPolicy, String> {
    let (direction, minutes) = value
        .split_once(':')
        .ok_or_else(|| "expected DIRECTION:MINUTES".to_string())?;
    let direction: RoundingDirection = direction
        .parse()
        .map_err(|_| format!("unknown rounding direction '{direction}'"))?;
    let minutes: i64 = minutes
        .parse()
        .map_err(|_| format!("invalid minutes '{minutes}'"))?;
    RoundingPolicy::new(direction, minutes).map_err(|e| e.to_string())
}
