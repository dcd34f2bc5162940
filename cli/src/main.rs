use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use fkorder_core::diagnostics::{WarningDestination, report_warnings};
use fkorder_core::ir::TableRef;
use fkorder_core::monitor::{CancelToken, ProgressListener};
use fkorder_core::{OrderOptions, OrderResult, order_tables_from_ddl_with};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "fkorder",
    about = "Compute FK-safe INSERT/DELETE table orderings from PostgreSQL DDL"
)]
#[command(version)]
struct Cli {
    /// PostgreSQL DDL input file (UTF-8)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Filter by schema name (default: "public")
    #[arg(short, long, default_value = "public")]
    schema: String,

    /// Include all schemas (bypass schema filtering)
    #[arg(long)]
    include_all_schemas: bool,

    /// Restrict the sorted batch to this table (repeatable; default: all)
    #[arg(short, long = "table", value_name = "TABLE")]
    tables: Vec<String>,

    /// Which ordering(s) to emit
    #[arg(short, long, value_enum, default_value = "both")]
    direction: Direction,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Flag self-referencing tables for row-level cleanup before deletes
    #[arg(long)]
    single_table_cleanup: bool,

    /// Fail on ordering hazards (cycles, retrieval failures) instead of warning
    #[arg(long)]
    strict: bool,

    /// Warning output destination: file path or "stderr" (default: stderr)
    #[arg(long)]
    emit_warnings: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Direction {
    Insert,
    Delete,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Forwards sort progress to the log.
struct TraceProgress;

impl ProgressListener for TraceProgress {
    fn table_processed(&mut self, current: usize, total: usize, table: &TableRef) {
        debug!("processing table {current}/{total}: {table}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Read input file
    let input = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read input file: {}", cli.input.display()))?;

    // Build options
    let opts = OrderOptions {
        schema: if cli.include_all_schemas {
            None
        } else {
            Some(cli.schema)
        },
        include_all_schemas: cli.include_all_schemas,
        tables: if cli.tables.is_empty() {
            None
        } else {
            Some(cli.tables)
        },
        single_table_cleanup: cli.single_table_cleanup,
        strict: cli.strict,
        emit_warnings: cli.emit_warnings.as_ref().map(PathBuf::from),
    };

    // Order
    let mut progress = TraceProgress;
    let result = order_tables_from_ddl_with(&input, &opts, &CancelToken::new(), Some(&mut progress))
        .context("Ordering failed")?;

    // Output warnings
    let warn_dest = WarningDestination::from_option(opts.emit_warnings.as_deref());
    report_warnings(&result.warnings, &warn_dest).context("Failed to write warnings")?;
    summarize(&result);

    // Render and write output
    let rendered = match cli.format {
        Format::Text => render_text(&result, cli.direction),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&result)
                .context("Failed to serialize result")?;
            json.push('\n');
            json
        }
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        }
        None => {
            print!("{rendered}");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn render_text(result: &OrderResult, direction: Direction) -> String {
    let mut out = String::new();

    if direction != Direction::Delete {
        out.push_str("-- insert order\n");
        for table in &result.insert_order {
            let _ = writeln!(out, "{}", table.to_sql());
        }
    }

    if direction == Direction::Both {
        out.push('\n');
    }

    if direction != Direction::Insert {
        out.push_str("-- delete order\n");
        for table in &result.delete_order {
            let _ = writeln!(out, "{}", table.to_sql());
        }
        for table in &result.single_table_cleanup {
            let _ = writeln!(out, "-- requires row-level cleanup: {}", table.to_sql());
        }
    }

    out
}

fn summarize(result: &OrderResult) {
    if result.cancelled {
        eprintln!("{}", "sort cancelled; ordering is partial".yellow());
    }
    for cycle in &result.cycles {
        eprintln!(
            "{} {}",
            "cycle:".red().bold(),
            cycle.describe().red()
        );
    }
    if !result.cycles.is_empty() {
        eprintln!(
            "{}",
            format!(
                "{} cycle(s) detected; relative order inside each loop is best-effort",
                result.cycles.len()
            )
            .yellow()
        );
    }
}
