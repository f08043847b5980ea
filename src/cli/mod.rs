use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};

use crate::application::{ComparisonReport, DashboardService};
use crate::config::{
    parse_money_format, parse_on_invalid_period, parse_zero_baseline, Config, ENV_DATABASE,
    ENV_LOCALE, ENV_ON_INVALID_PERIOD, ENV_ZERO_BASELINE,
};
use crate::domain::{
    default_periods, format_cents, format_percent, scan_records, CategoryFilter,
    ComparisonRequest, MoneyFormat, OnInvalidPeriod, PeriodSelector, Settings, VariationResult,
    ZeroBaselinePolicy,
};
use crate::io::{Exporter, ImportOptions, Importer};

/// Receita - receipt variation reports
#[derive(Parser)]
#[command(name = "receita")]
#[command(about = "Compare received amounts between two months, by category and by product")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = ENV_DATABASE, default_value = "receita.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do when the previous period is not before the current one: halt, auto-correct
    #[arg(long, global = true, env = ENV_ON_INVALID_PERIOD, default_value = "halt", value_parser = parse_on_invalid_period)]
    pub on_invalid_period: OnInvalidPeriod,

    /// How to report a change against a zero previous total: undefined, zero
    #[arg(long, global = true, env = ENV_ZERO_BASELINE, default_value = "undefined", value_parser = parse_zero_baseline)]
    pub zero_baseline: ZeroBaselinePolicy,

    /// Money display format: plain, pt-br
    #[arg(long, global = true, env = ENV_LOCALE, default_value = "plain", value_parser = parse_money_format)]
    pub locale: MoneyFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a single receipt
    Record {
        /// Amount received (e.g., "50.00", "50" or "1.234,56")
        amount: String,

        /// Category of the receipt
        #[arg(short, long)]
        category: String,

        /// Product or line item
        #[arg(short, long)]
        item: String,

        /// Date received (YYYY-MM-DD or DD/MM/YYYY, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Import receipts from CSV (header: date,category,item,amount)
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate and count without storing
        #[arg(long)]
        dry_run: bool,

        /// Store rows with unreadable dates or amounts instead of rejecting them
        #[arg(long)]
        keep_unreadable: bool,
    },

    /// List categories available for filtering
    Categories {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show years with data and the default periods
    Periods {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Compare the current period to the previous one
    Compare {
        #[command(flatten)]
        selection: PeriodArgs,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,

        /// Reload receipts from the store before comparing
        #[arg(long)]
        refresh: bool,
    },

    /// Export the summary (current total, previous total, percent change)
    Export {
        #[command(flatten)]
        selection: PeriodArgs,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json, report (full report as JSON)
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// List records left out of comparisons because of unreadable data
    Check,
}

#[derive(clap::Args)]
pub struct PeriodArgs {
    /// Current period (YYYY-MM, defaults to last month)
    #[arg(long)]
    pub current: Option<String>,

    /// Previous period (YYYY-MM, defaults to the month before current)
    #[arg(long)]
    pub previous: Option<String>,

    /// Category filter (omit or "all" for every category)
    #[arg(short, long)]
    pub category: Option<String>,
}

impl PeriodArgs {
    /// Fill in defaults relative to `today` and build a request.
    pub fn to_request(&self, today: NaiveDate) -> Result<ComparisonRequest> {
        let current = match &self.current {
            Some(s) => parse_period(s)?,
            None => default_periods(today).current,
        };
        let previous = match &self.previous {
            Some(s) => parse_period(s)?,
            None => current.prior_month(),
        };

        Ok(ComparisonRequest {
            current,
            previous,
            category: CategoryFilter::from_input(self.category.as_deref()),
        })
    }
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            database: self.database.clone(),
            settings: Settings {
                on_invalid_period: self.on_invalid_period,
                zero_baseline: self.zero_baseline,
            },
            money_format: self.locale.clone(),
        }
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config();
        let today = Local::now().date_naive();

        match self.command {
            Commands::Init => {
                let service = DashboardService::init(&config.database, config.settings).await?;
                let count = service.count_receipts().await?;
                println!("Database initialized: {} ({} receipts)", config.database, count);
            }

            Commands::Record {
                amount,
                category,
                item,
                date,
            } => {
                let service = DashboardService::connect(&config.database, config.settings).await?;
                let date = date.unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
                let id = service
                    .record_receipt_input(&date, &category, &item, &amount)
                    .await?;
                println!("Recorded receipt: {} {} / {} on {} ({})", amount, category, item, date, id);
            }

            Commands::Import {
                input,
                dry_run,
                keep_unreadable,
            } => {
                let service = DashboardService::connect(&config.database, config.settings).await?;
                run_import_command(&service, input.as_deref(), dry_run, keep_unreadable).await?;
            }

            Commands::Categories { format } => {
                let service = DashboardService::connect(&config.database, config.settings).await?;
                let categories = service.list_categories().await?;

                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&categories)?),
                    _ => {
                        println!("{:<30} {}", "CATEGORY", "SPELLINGS");
                        println!("{}", "-".repeat(60));
                        for option in &categories {
                            println!(
                                "{:<30} {}",
                                truncate(&option.category, 30),
                                option.spellings.join(", ")
                            );
                        }
                    }
                }
            }

            Commands::Periods { format } => {
                let service = DashboardService::connect(&config.database, config.settings).await?;
                let options = service.period_options(today).await?;

                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&options)?),
                    _ => {
                        let years: Vec<String> =
                            options.years.iter().map(|y| y.to_string()).collect();
                        println!("Years with data: {}", years.join(", "));
                        println!("Default current period:  {}", options.default_current);
                        println!("Default previous period: {}", options.default_previous);
                    }
                }
            }

            Commands::Compare {
                selection,
                format,
                refresh,
            } => {
                let service = DashboardService::connect(&config.database, config.settings).await?;
                if refresh {
                    let loaded = service.refresh().await?;
                    eprintln!("Reloaded {} receipt(s)", loaded);
                }
                let request = selection.to_request(today)?;
                let report = service.compare(&request).await?;
                print_report(&report, &format, &config.money_format)?;
            }

            Commands::Export {
                selection,
                output,
                format,
            } => {
                let service = DashboardService::connect(&config.database, config.settings).await?;
                let request = selection.to_request(today)?;
                let report = service.compare(&request).await?;
                run_export_command(&report, config.money_format, output.as_deref(), &format)?;
            }

            Commands::Check => {
                let service = DashboardService::connect(&config.database, config.settings).await?;
                run_check_command(&service).await?;
            }
        }

        Ok(())
    }
}

fn parse_period(s: &str) -> Result<PeriodSelector> {
    s.parse::<PeriodSelector>()
        .with_context(|| format!("Invalid period '{}'. Use YYYY-MM", s))
}

async fn run_import_command(
    service: &DashboardService,
    input: Option<&str>,
    dry_run: bool,
    keep_unreadable: bool,
) -> Result<()> {
    let reader: Box<dyn Read> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
        None => Box::new(io::stdin()),
    };

    let options = ImportOptions {
        dry_run,
        keep_unreadable,
    };
    let result = Importer::new(service)
        .import_receipts_csv(reader, options)
        .await?;

    if dry_run {
        println!("Dry run: {} receipt(s) would be imported", result.imported);
    } else {
        println!("Imported {} receipt(s)", result.imported);
    }
    if result.skipped > 0 {
        println!("Skipped {} empty line(s)", result.skipped);
    }
    if !result.errors.is_empty() {
        println!("{} line(s) rejected:", result.errors.len());
        for error in &result.errors {
            match &error.field {
                Some(field) => println!("  line {} [{}]: {}", error.line, field, error.error),
                None => println!("  line {}: {}", error.line, error.error),
            }
        }
    }

    Ok(())
}

fn print_report(report: &ComparisonReport, format: &str, money: &MoneyFormat) -> Result<()> {
    let c = &report.comparison;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        "csv" => {
            Exporter::new(report, MoneyFormat::plain()).export_comparison_csv(io::stdout())?;
        }
        _ => {
            // Table format
            println!("Receipt Variation Report");
            println!("Category: {}", c.category_filter);
            if let Some(requested) = c.corrected_previous {
                println!(
                    "Note: previous period {} was not before {}; using {} instead",
                    requested, c.current, c.previous
                );
            }
            println!();

            println!(
                "  Received in {}: {:>18}",
                c.previous,
                format_cents(c.previous_total(), money)
            );
            println!(
                "  Received in {}: {:>18}",
                c.current,
                format_cents(c.current_total(), money)
            );
            println!(
                "  Percent change:      {:>18}",
                format_percent(c.total.percent_change)
            );
            println!();

            print_breakdown("By category", &c.by_category, money);
            println!();
            print_breakdown("By product", &c.by_item, money);

            if !report.data_quality.is_clean() {
                println!();
                println!(
                    "Warning: {} record(s) with unreadable dates and {} with unreadable amounts were left out. Run `receita check` for details.",
                    report.data_quality.unreadable_dates, report.data_quality.unreadable_amounts
                );
            }
        }
    }

    Ok(())
}

fn print_breakdown(title: &str, results: &[VariationResult], money: &MoneyFormat) {
    println!("{}", title);
    println!(
        "{:<30} {:>16} {:>16} {:>10}",
        "KEY", "PREVIOUS", "CURRENT", "CHANGE"
    );
    println!("{}", "-".repeat(75));

    if results.is_empty() {
        println!("(no receipts in either period)");
        return;
    }

    for r in results {
        let marker = if r.regressed { "v" } else { " " };
        println!(
            "{:<30} {:>16} {:>16} {:>10} {}",
            truncate(&r.key, 30),
            format_cents(r.previous_total, money),
            format_cents(r.current_total, money),
            format_percent(r.percent_change),
            marker
        );
    }
}

fn run_export_command(
    report: &ComparisonReport,
    money: MoneyFormat,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => {
            Box::new(File::create(path).with_context(|| format!("Failed to create {}", path))?)
        }
        None => Box::new(io::stdout()),
    };

    let exporter = Exporter::new(report, money);
    match format {
        "csv" => {
            exporter.export_summary_csv(&mut writer)?;
        }
        "json" => {
            exporter.export_summary_json(&mut writer)?;
            writeln!(writer)?;
        }
        "report" => {
            exporter.export_report_json(&mut writer)?;
            writeln!(writer)?;
        }
        other => anyhow::bail!("Unknown export format '{}'. Valid: csv, json, report", other),
    }

    if let Some(path) = output {
        eprintln!("Exported summary to {}", path);
    }
    Ok(())
}

async fn run_check_command(service: &DashboardService) -> Result<()> {
    let snapshot = service.snapshot().await?;
    let warnings = scan_records(&snapshot.records);

    println!("Data Quality Check");
    println!("Records: {}", snapshot.records.len());

    if warnings.is_empty() {
        println!("All records have readable dates and amounts.");
    } else {
        println!("{} issue(s) found:", warnings.len());
        for warning in &warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
