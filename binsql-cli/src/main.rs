use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use binsql_common::Config;
use binsql_core::{
    export_csv, export_json, histogram, print_bins, write_csv, write_json, write_table, Bin,
    Dataset, Field, HistogramOptions, PgConnection, PostgresDialect, QueryBuilder, RawQuery, Table,
};

fn parse_bins(s: &str) -> Result<i64, String> { // reject non-positive counts at parse time
    let v: i64 = s.parse().map_err(|_| format!("not an integer: {s}"))?;
    if v >= 1 { Ok(v) } else { Err(format!("bins must be >= 1, got {v}")) }
}

#[derive(Parser)]
#[command(name = "binsql", version, about = "Equal-width histograms computed by PostgreSQL")]
struct Cli {
    /// -v for info, -vv for debug (RUST_LOG takes precedence)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Request {
    /// Table to bin; `schema.table` is allowed
    #[arg(long, conflicts_with = "query", required_unless_present = "query")]
    table: Option<String>,
    /// Arbitrary SELECT used as the dataset instead of a table
    #[arg(long)]
    query: Option<String>,
    /// Extra condition on --table, repeatable, AND-ed
    #[arg(long = "where", requires = "table")]
    conditions: Vec<String>,
    /// Column name, or SQL expression with --expr
    #[arg(long)]
    field: String,
    #[arg(long)]
    expr: bool,
    #[arg(long, value_parser = parse_bins)]
    bins: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    min: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    max: Option<f64>,
}

impl Request {
    fn dataset(&self) -> anyhow::Result<Box<dyn Dataset>> {
        match (&self.table, &self.query) {
            (Some(table), _) => {
                let t = self
                    .conditions
                    .iter()
                    .fold(Table::new(table), |t, c| t.filter(c.as_str()));
                Ok(Box::new(t))
            }
            (None, Some(query)) => Ok(Box::new(RawQuery::new(query.as_str()))),
            (None, None) => anyhow::bail!("either --table or --query is required"),
        }
    }

    fn field(&self) -> Field {
        if self.expr {
            Field::expression(self.field.as_str())
        } else {
            Field::column(self.field.as_str())
        }
    }

    fn options(&self) -> HistogramOptions {
        HistogramOptions { min: self.min, max: self.max }
    }

    fn bins_count(&self, config: &Config) -> i64 {
        self.bins.unwrap_or(config.histogram.default_bins)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the histogram query and print the non-empty bins
    Bins {
        #[command(flatten)]
        request: Request,
        /// Connection URL; falls back to $BINSQL_DATABASE_URL, $DATABASE_URL, then the config file
        #[arg(long)]
        url: Option<String>,
        /// Declared adapter, e.g. postgis
        #[arg(long)]
        adapter: Option<String>,
        #[arg(long, value_parser = ["table", "json", "csv"])]
        format: Option<String>,
        #[arg(long)]
        output: Option<String>,
    },
    /// Print the generated SQL without connecting
    Sql {
        #[command(flatten)]
        request: Request,
    },
    /// Show the config path and effective settings
    Config {
        /// Write the effective settings to the config path
        #[arg(long)]
        init: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("ignoring unreadable config: {e}");
        Config::default()
    });
    match cli.command {
        Commands::Bins { request, url, adapter, format, output } => {
            run_bins(&request, url, adapter, format, output, &config)?
        }
        Commands::Sql { request } => run_sql(&request, &config)?,
        Commands::Config { init } => run_config(init, &config)?,
    }
    Ok(())
}

fn run_bins(
    request: &Request,
    url: Option<String>,
    adapter: Option<String>,
    format: Option<String>,
    output: Option<String>,
    config: &Config,
) -> anyhow::Result<()> {
    let url = url
        .or_else(|| config.database_url())
        .context("no database URL: pass --url, set BINSQL_DATABASE_URL or database.url")?;
    let adapter = adapter.unwrap_or_else(|| config.database.adapter.clone());
    let mut conn = PgConnection::connect(&url)
        .context("connecting to database")?
        .with_adapter_name(&adapter);
    let dataset = request.dataset()?;
    let bins_count = request.bins_count(config);
    let bins = histogram(&mut conn, &*dataset, &request.field(), bins_count, request.options())?;
    let format = format.unwrap_or_else(|| config.export.format.clone());
    let output = output.map(|o| resolve_output(&o, config));
    write_bins(&bins, &format, output.as_deref(), config.export.bar_width)?;
    if let Some(path) = output {
        println!("Exported to {}", path.display());
    }
    Ok(())
}

/// Relative output paths land under `export.output_dir`.
fn resolve_output(output: &str, config: &Config) -> PathBuf {
    let path = PathBuf::from(output);
    if path.is_absolute() { path } else { Path::new(&config.export.output_dir).join(path) }
}

fn write_bins(
    bins: &[Bin],
    format: &str,
    output: Option<&Path>,
    bar_width: usize,
) -> anyhow::Result<()> {
    if let Some(parent) = output.and_then(Path::parent) {
        if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
    }
    match (format, output) {
        ("table", None) => print_bins(bins, bar_width)?,
        ("json", None) => write_json(&mut std::io::stdout().lock(), bins)?,
        ("csv", None) => write_csv(&mut std::io::stdout().lock(), bins)?,
        ("table", Some(path)) => {
            let mut file = std::fs::File::create(path)?;
            write_table(&mut file, bins, bar_width)?;
            file.flush()?;
        }
        ("json", Some(path)) => export_json(path, bins)?,
        ("csv", Some(path)) => export_csv(path, bins)?,
        (other, _) => anyhow::bail!("Unknown format: {other} (use table, json or csv)"),
    }
    Ok(())
}

fn run_sql(request: &Request, config: &Config) -> anyhow::Result<()> {
    let dataset = request.dataset()?;
    let bins_count = request.bins_count(config);
    let options = request.options();
    let field = request.field();
    let query = QueryBuilder::new(&PostgresDialect, &*dataset, &field, bins_count, &options)?;
    println!("{}", query.build());
    Ok(())
}

fn run_config(init: bool, config: &Config) -> anyhow::Result<()> {
    let path = Config::config_path();
    println!("{:<16} {}", "config:", path.display());
    println!("{:<16} {}", "adapter:", config.database.adapter);
    println!("{:<16} {}", "url set:", config.database_url().is_some());
    println!("{:<16} {}", "default bins:", config.histogram.default_bins);
    println!("{:<16} {}", "format:", config.export.format);
    if init {
        config.save()?;
        println!("Config written to {}", path.display());
    }
    Ok(())
}
