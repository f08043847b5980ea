use anyhow::{Context, Result};
use std::io::Read;

use crate::application::DashboardService;
use crate::domain::{parse_cents, parse_record_date};
use crate::storage::NewReceipt;

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    /// 1-based line in the input where the record starts; 0 if unknown.
    pub line: u64,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate and count, but store nothing.
    pub dry_run: bool,
    /// Store rows whose date or amount cannot be read, as-is. They are left
    /// out of comparisons and show up as data-quality warnings.
    pub keep_unreadable: bool,
}

/// Column positions resolved from the CSV header.
struct Columns {
    date: usize,
    category: usize,
    item: usize,
    amount: usize,
}

impl Columns {
    const DATE: &'static [&'static str] = &["date", "data", "received_on"];
    const CATEGORY: &'static [&'static str] = &["category", "categoria"];
    const ITEM: &'static [&'static str] = &["item", "item_pcg", "product", "produto"];
    const AMOUNT: &'static [&'static str] = &["amount", "total_recebido", "total", "valor"];

    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
                .ok_or_else(|| anyhow::anyhow!("Missing column: {}", names[0]))
        };

        Ok(Self {
            date: find(Self::DATE)?,
            category: find(Self::CATEGORY)?,
            item: find(Self::ITEM)?,
            amount: find(Self::AMOUNT)?,
        })
    }
}

/// Importer for loading receipts into the store
pub struct Importer<'a> {
    service: &'a DashboardService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a DashboardService) -> Self {
        Self { service }
    }

    /// Import receipts from CSV with a `date,category,item,amount` header
    /// (column order is free; extra columns are ignored).
    pub async fn import_receipts_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv_reader.headers().context("Failed to read CSV header")?.clone();
        let columns = Columns::from_headers(&headers)?;

        let mut receipts = Vec::new();
        let mut skipped = 0;
        let mut errors = Vec::new();

        for result in csv_reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line: e.position().map_or(0, source_line),
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };
            // Blank lines are skipped by the reader, so count from its position.
            let line = record.position().map_or(0, source_line);

            let date = record.get(columns.date).unwrap_or("").trim();
            let category = record.get(columns.category).unwrap_or("").trim();
            let item = record.get(columns.item).unwrap_or("").trim();
            let amount = record.get(columns.amount).unwrap_or("").trim();

            if date.is_empty() && category.is_empty() && item.is_empty() && amount.is_empty() {
                skipped += 1;
                continue;
            }

            if !options.keep_unreadable {
                if parse_record_date(date).is_none() {
                    errors.push(ImportError {
                        line,
                        field: Some("date".to_string()),
                        error: format!("Invalid date: '{}'", date),
                    });
                    continue;
                }
                if !amount.is_empty() {
                    if let Err(e) = parse_cents(amount) {
                        errors.push(ImportError {
                            line,
                            field: Some("amount".to_string()),
                            error: format!("Invalid amount '{}': {}", amount, e),
                        });
                        continue;
                    }
                }
            }

            receipts.push(NewReceipt {
                received_on: non_empty(date),
                category: category.to_string(),
                item: item.to_string(),
                amount: non_empty(amount),
            });
        }

        for error in &errors {
            tracing::warn!(line = error.line, field = ?error.field, "{}", error.error);
        }

        let imported = if options.dry_run {
            receipts.len()
        } else {
            self.service.store_receipts(&receipts).await?
        };

        tracing::info!(imported, skipped, errors = errors.len(), dry_run = options.dry_run, "import finished");

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }
}

fn source_line(position: &csv::Position) -> u64 {
    position.line()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
