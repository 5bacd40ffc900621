use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::{LedgerService, Summary, YearReport};
use crate::domain::{Delivery, DeliveryId, YearMonth, format_amount};

/// Bottlebook - Delivery Ledger
#[derive(Parser)]
#[command(name = "bottlebook")]
#[command(about = "A local-first ledger of deliveries and their payments")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BOTTLEBOOK_DB", default_value = "bottlebook.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a delivery
    Add {
        /// Number of units delivered
        #[arg(allow_negative_numbers = true)]
        quantity: i64,

        /// Date of the delivery (YYYY-MM-DD or RFC 3339, defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Mark the delivery as already paid
        #[arg(long)]
        paid: bool,
    },

    /// List deliveries, most recent first
    List {
        /// Only deliveries in this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },

    /// Mark a delivery as paid
    Pay {
        /// Delivery ID
        id: DeliveryId,
    },

    /// Mark a delivery as unpaid
    Unpay {
        /// Delivery ID
        id: DeliveryId,
    },

    /// Flip the payment status of a delivery
    Toggle {
        /// Delivery ID
        id: DeliveryId,
    },

    /// Delete a delivery
    Delete {
        /// Delivery ID
        id: DeliveryId,
    },

    /// Monthly totals, cost and outstanding payments
    Summary {
        /// Month to summarize (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Months to move from --month (e.g. -1 for the previous month)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Month-by-month breakdown of a year
    Year {
        /// Year (defaults to the current year)
        year: Option<i32>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show the unit rate, or set it when a value is given
    Rate {
        /// New cost per unit
        #[arg(allow_negative_numbers = true)]
        value: Option<f64>,
    },

    /// Export deliveries
    Export {
        /// Only deliveries in this month (YYYY-MM); ignored for JSON
        #[arg(long)]
        month: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,

        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Add {
                quantity,
                date,
                paid,
            } => {
                let service = connect(&self.database).await?;
                let date = match date {
                    Some(date_str) => parse_date(&date_str)?,
                    None => Utc::now(),
                };
                let delivery = service.record_delivery(date, quantity, paid).await?;
                println!(
                    "Recorded delivery {}: {} unit(s) on {}{}",
                    delivery.id,
                    delivery.quantity,
                    delivery.date.format("%Y-%m-%d"),
                    if delivery.paid { " (paid)" } else { "" }
                );
            }

            Commands::List { month } => {
                let service = connect(&self.database).await?;
                let deliveries = match month {
                    Some(month_str) => {
                        let month = parse_month(&month_str)?;
                        service.deliveries_for_month(month).await?
                    }
                    None => service.list_deliveries().await?,
                };
                print_deliveries(&deliveries);
            }

            Commands::Pay { id } => {
                let service = connect(&self.database).await?;
                let delivery = service.set_paid(id, true).await?;
                println!("Delivery {} marked as paid", delivery.id);
            }

            Commands::Unpay { id } => {
                let service = connect(&self.database).await?;
                let delivery = service.set_paid(id, false).await?;
                println!("Delivery {} marked as unpaid", delivery.id);
            }

            Commands::Toggle { id } => {
                let service = connect(&self.database).await?;
                let delivery = service.toggle_paid(id).await?;
                println!(
                    "Delivery {} is now {}",
                    delivery.id,
                    if delivery.paid { "paid" } else { "unpaid" }
                );
            }

            Commands::Delete { id } => {
                let service = connect(&self.database).await?;
                service.delete_delivery(id).await?;
                println!("Deleted delivery {}", id);
            }

            Commands::Summary {
                month,
                offset,
                format,
            } => {
                let service = connect(&self.database).await?;
                let month = LedgerService::shift_month(resolve_month(month)?, offset)?;
                let summary = service.summarize_month(month).await?;
                print_summary(&month, &summary, format)?;
            }

            Commands::Year { year, format } => {
                let service = connect(&self.database).await?;
                let year = match year {
                    Some(year) => year,
                    None => current_month()?.year(),
                };
                let report = service.yearly_breakdown(year).await?;
                print_year_report(&report, format)?;
            }

            Commands::Rate { value } => {
                let service = connect(&self.database).await?;
                match value {
                    Some(value) => {
                        let rate = service.set_rate(value).await?;
                        println!("Rate set to {}", rate);
                    }
                    None => {
                        let rate = service.current_rate().await?;
                        println!("Rate: {}", rate);
                    }
                }
            }

            Commands::Export {
                month,
                output,
                format,
            } => {
                let service = connect(&self.database).await?;
                run_export_command(&service, month, output.as_deref(), format).await?;
            }
        }

        Ok(())
    }
}

async fn connect(database: &str) -> Result<LedgerService> {
    LedgerService::connect(database)
        .await
        .with_context(|| format!("Run `bottlebook init` to create {}", database))
}

async fn run_export_command(
    service: &LedgerService,
    month: Option<String>,
    output: Option<&str>,
    format: ExportFormat,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match format {
        ExportFormat::Csv => {
            let range = month
                .map(|month_str| parse_month(&month_str).map(|m| m.range()))
                .transpose()?;
            let count = exporter.export_deliveries_csv(writer, range).await?;
            if output.is_some() {
                eprintln!("Exported {} deliveries", count);
            }
        }
        ExportFormat::Json => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported {} deliveries at rate {}",
                    snapshot.deliveries.len(),
                    format_amount(snapshot.rate)
                );
            }
        }
    }

    Ok(())
}

fn print_deliveries(deliveries: &[Delivery]) {
    if deliveries.is_empty() {
        println!("No deliveries found.");
        return;
    }

    println!("{:>6}  {:<12} {:>8}  {}", "ID", "DATE", "QUANTITY", "PAID");
    println!("{}", "-".repeat(36));
    for delivery in deliveries {
        println!(
            "{:>6}  {:<12} {:>8}  {}",
            delivery.id,
            delivery.date.format("%Y-%m-%d"),
            delivery.quantity,
            if delivery.paid { "yes" } else { "no" }
        );
    }
}

fn print_summary(month: &YearMonth, summary: &Summary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Csv => {
            println!(
                "month,deliveries,quantity,rate,total_cost,paid,unpaid,outstanding_cost"
            );
            println!("{}", summary_csv_row(&month.to_string(), summary));
        }
        OutputFormat::Table => {
            println!(
                "Summary for {} ({} to {})",
                month,
                summary.period_start.format("%Y-%m-%d"),
                summary.period_end.format("%Y-%m-%d")
            );
            println!();
            println!("  Deliveries:   {:>10}", summary.delivery_count);
            println!("  Quantity:     {:>10}", summary.total_quantity);
            println!("  Rate:         {:>10}", format_amount(summary.rate));
            println!("  Total cost:   {:>10}", format_amount(summary.total_cost));
            println!();
            println!("  Paid:         {:>10}", summary.paid_count);
            println!("  Unpaid:       {:>10}", summary.unpaid_count);
            println!(
                "  Outstanding:  {:>10}",
                format_amount(summary.outstanding_cost)
            );
        }
    }
    Ok(())
}

fn print_year_report(report: &YearReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Csv => {
            println!(
                "month,deliveries,quantity,rate,total_cost,paid,unpaid,outstanding_cost"
            );
            for line in &report.months {
                println!("{}", summary_csv_row(&line.month, &line.summary));
            }
            println!("{}", summary_csv_row("total", &report.total));
        }
        OutputFormat::Table => {
            println!("Deliveries in {}", report.year);
            println!();
            println!(
                "{:<8} {:>10} {:>10} {:>12} {:>8} {:>12}",
                "MONTH", "DELIVERIES", "QUANTITY", "COST", "UNPAID", "OUTSTANDING"
            );
            println!("{}", "-".repeat(65));
            for line in &report.months {
                print_year_row(&line.month, &line.summary);
            }
            println!("{}", "-".repeat(65));
            print_year_row("TOTAL", &report.total);
        }
    }
    Ok(())
}

fn print_year_row(label: &str, summary: &Summary) {
    println!(
        "{:<8} {:>10} {:>10} {:>12} {:>8} {:>12}",
        label,
        summary.delivery_count,
        summary.total_quantity,
        format_amount(summary.total_cost),
        summary.unpaid_count,
        format_amount(summary.outstanding_cost)
    );
}

fn summary_csv_row(label: &str, summary: &Summary) -> String {
    format!(
        "{},{},{},{},{},{},{},{}",
        label,
        summary.delivery_count,
        summary.total_quantity,
        summary.rate,
        summary.total_cost,
        summary.paid_count,
        summary.unpaid_count,
        summary.outstanding_cost
    )
}

fn current_month() -> Result<YearMonth> {
    YearMonth::containing(Utc::now())
        .ok_or_else(|| anyhow::anyhow!("Current date is outside the supported calendar"))
}

fn resolve_month(month: Option<String>) -> Result<YearMonth> {
    match month {
        Some(month_str) => parse_month(&month_str),
        None => current_month(),
    }
}

fn parse_month(month_str: &str) -> Result<YearMonth> {
    Ok(month_str.parse::<YearMonth>()?)
}

/// Parse `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .context("Date must be in YYYY-MM-DD or RFC 3339 format")?;
    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;

    Ok(naive_datetime.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let midnight = parse_date("2024-03-05").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-03-05T00:00:00+00:00");

        let offset = parse_date("2024-03-05T10:30:00+02:00").unwrap();
        assert_eq!(offset.to_rfc3339(), "2024-03-05T08:30:00+00:00");

        assert!(parse_date("05/03/2024").is_err());
    }

    #[test]
    fn test_cli_parses_summary_offset() {
        let cli = Cli::try_parse_from([
            "bottlebook",
            "--database",
            "test.db",
            "summary",
            "--month",
            "2024-01",
            "--offset",
            "-1",
        ])
        .unwrap();

        match cli.command {
            Commands::Summary { month, offset, .. } => {
                let month = parse_month(&month.unwrap()).unwrap();
                let shifted = LedgerService::shift_month(month, offset).unwrap();
                assert_eq!(shifted.to_string(), "2023-12");
            }
            _ => panic!("expected summary command"),
        }
    }

    #[test]
    fn test_summary_csv_row() {
        let month = YearMonth::new(2024, 3).unwrap();
        let summary = Summary {
            period_start: month.start(),
            period_end: month.end(),
            rate: 20.0,
            total_quantity: 3,
            total_cost: 60.0,
            delivery_count: 2,
            paid_count: 1,
            unpaid_count: 1,
            unpaid_quantity: 2,
            outstanding_cost: 40.0,
        };
        assert_eq!(summary_csv_row("2024-03", &summary), "2024-03,2,3,20,60,1,1,40");
    }
}
