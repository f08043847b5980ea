use anyhow::Result;
use std::io::Write;

use crate::application::ComparisonReport;
use crate::domain::{format_cents, format_percent, MoneyFormat, VariationResult};

/// Writes comparison results for presentation and document tools.
pub struct Exporter<'a> {
    report: &'a ComparisonReport,
    format: MoneyFormat,
}

impl<'a> Exporter<'a> {
    pub fn new(report: &'a ComparisonReport, format: MoneyFormat) -> Self {
        Self { report, format }
    }

    /// Export the summary document fields as `field,value` CSV rows.
    pub fn export_summary_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let summary = self.report.summary(&self.format);
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["field", "value"])?;
        let rows = [
            ("current_period", summary.current_period.to_string()),
            ("previous_period", summary.previous_period.to_string()),
            ("current_total", summary.current_total),
            ("previous_total", summary.previous_total),
            ("percent_change", summary.percent_change),
        ];
        for (field, value) in &rows {
            csv_writer.write_record([*field, value.as_str()])?;
        }

        csv_writer.flush()?;
        Ok(rows.len())
    }

    /// Export the summary document fields as a JSON object.
    pub fn export_summary_json<W: Write>(&self, writer: W) -> Result<()> {
        let summary = self.report.summary(&self.format);
        serde_json::to_writer_pretty(writer, &summary)?;
        Ok(())
    }

    /// Export the whole report as JSON.
    pub fn export_report_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self.report)?;
        Ok(())
    }

    /// Export the overall total and both breakdowns as CSV, one row per key.
    /// The `breakdown` column is `total`, `category` or `item`.
    pub fn export_comparison_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let c = &self.report.comparison;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "breakdown",
            "key",
            "previous_total",
            "current_total",
            "percent_change",
            "regressed",
        ])?;

        let rows = std::iter::once(("total", &c.total))
            .chain(c.by_category.iter().map(|r| ("category", r)))
            .chain(c.by_item.iter().map(|r| ("item", r)));

        let mut count = 0;
        for (breakdown, result) in rows {
            self.write_variation(&mut csv_writer, breakdown, result)?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    fn write_variation<W: Write>(
        &self,
        csv_writer: &mut csv::Writer<W>,
        breakdown: &str,
        result: &VariationResult,
    ) -> Result<()> {
        csv_writer.write_record(&[
            breakdown.to_string(),
            result.key.clone(),
            format_cents(result.previous_total, &self.format),
            format_cents(result.current_total, &self.format),
            format_percent(result.percent_change),
            result.regressed.to_string(),
        ])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::domain::{
        run_comparison, summarize, CategoryFilter, ComparisonRequest, PeriodSelector, Settings,
        TransactionRecord,
    };

    fn report() -> ComparisonReport {
        let date = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let records = vec![
            TransactionRecord::new(date("2024-02-10"), "A", "x", 10000),
            TransactionRecord::new(date("2024-03-05"), "A", "x", 15000),
            TransactionRecord::new(date("2024-03-20"), "B", "y", 2000),
        ];
        let request = ComparisonRequest {
            current: PeriodSelector::new(2024, 3).unwrap(),
            previous: PeriodSelector::new(2024, 2).unwrap(),
            category: CategoryFilter::All,
        };
        ComparisonReport {
            comparison: run_comparison(&records, &request, Settings::default()).unwrap(),
            settings: Settings::default(),
            data_quality: summarize(&records),
            data_loaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_export_summary_csv() {
        let report = report();
        let mut out = Vec::new();
        let rows = Exporter::new(&report, MoneyFormat::plain())
            .export_summary_csv(&mut out)
            .unwrap();

        assert_eq!(rows, 5);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "field,value\n\
             current_period,2024-03\n\
             previous_period,2024-02\n\
             current_total,170.00\n\
             previous_total,100.00\n\
             percent_change,70.00%\n"
        );
    }

    #[test]
    fn test_export_summary_json_pt_br() {
        let report = report();
        let mut out = Vec::new();
        Exporter::new(&report, MoneyFormat::pt_br())
            .export_summary_json(&mut out)
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["current_total"], "R$ 170,00");
        assert_eq!(value["previous_total"], "R$ 100,00");
        assert_eq!(value["percent_change"], "70.00%");
    }

    #[test]
    fn test_export_comparison_csv() {
        let report = report();
        let mut out = Vec::new();
        let rows = Exporter::new(&report, MoneyFormat::plain())
            .export_comparison_csv(&mut out)
            .unwrap();

        assert_eq!(rows, 5);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "breakdown,key,previous_total,current_total,percent_change,regressed"
        );
        assert_eq!(lines[1], "total,total,100.00,170.00,70.00%,false");
        assert_eq!(lines[2], "category,A,100.00,150.00,50.00%,false");
        assert_eq!(lines[3], "category,B,0.00,20.00,n/a,false");
        assert_eq!(lines[4], "item,x,100.00,150.00,50.00%,false");
        assert_eq!(lines[5], "item,y,0.00,20.00,n/a,false");
    }

    #[test]
    fn test_export_comparison_csv_quotes_keys() {
        let mut report = report();
        report.comparison.by_item[0].key = "Plano, anual\r\nfamília".to_string();
        let mut out = Vec::new();
        Exporter::new(&report, MoneyFormat::plain())
            .export_comparison_csv(&mut out)
            .unwrap();

        let mut reader = csv::Reader::from_reader(out.as_slice());
        let keys: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[1].to_string())
            .collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(keys[3], "Plano, anual\r\nfamília");
    }
}
