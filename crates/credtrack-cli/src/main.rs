//! credtrack CLI: student credit summaries from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use credtrack_core::model::{AcademicYearId, StudentId};

mod commands;

#[derive(Parser)]
#[command(
    name = "credtrack",
    version,
    about = "Credit aggregation and grading for school records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where records come from; shared by every command that reads credits.
#[derive(Args, Clone)]
pub struct SourceArgs {
    /// Read records from a JSON or TOML fixture instead of the configured store
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Credit summary and grade for one student
    Student {
        /// Student id
        #[arg(long)]
        student: StudentId,

        /// Academic year used to scope portfolio records
        #[arg(long)]
        year: AcademicYearId,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Credit summaries for many students, processed in batches
    Bulk {
        /// Student ids (comma-separated)
        #[arg(long, value_delimiter = ',', required_unless_present = "all")]
        students: Vec<StudentId>,

        /// Every student found in the fixture
        #[arg(long, conflicts_with = "students")]
        all: bool,

        /// Academic year used to scope portfolio records
        #[arg(long)]
        year: AcademicYearId,

        /// Students processed concurrently per batch (overrides config)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Directory to write the JSON batch report to (overrides `output_dir` in config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Exit code 1 if any student failed
        #[arg(long)]
        fail_on_error: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Term-by-term credit breakdown for one student
    Terms {
        /// Student id
        #[arg(long)]
        student: StudentId,

        /// Academic year used to scope portfolio records
        #[arg(long)]
        year: AcademicYearId,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Check a fixture for records the engine would ignore
    Validate {
        /// Path to the fixture file
        #[arg(long)]
        fixture: PathBuf,
    },

    /// Create starter config and example fixture
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "credtrack=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Student {
            student,
            year,
            format,
            source,
        } => commands::student::execute(student, year, format, source).await,
        Commands::Bulk {
            students,
            all,
            year,
            batch_size,
            output,
            format,
            fail_on_error,
            source,
        } => {
            commands::bulk::execute(
                students,
                all,
                year,
                batch_size,
                output,
                format,
                fail_on_error,
                source,
            )
            .await
        }
        Commands::Terms {
            student,
            year,
            format,
            source,
        } => commands::terms::execute(student, year, format, source).await,
        Commands::Validate { fixture } => commands::validate::execute(fixture),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
