use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use super::record::{DemandRecord, RawRecord};
use crate::{Error, ErrorContext, Result};

/// Rows kept and skipped while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Aggregate view of one product's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub stock_code: String,
    pub description: String,
    /// Sum of positive quantities.
    pub total_units: i64,
    /// Sum of returned units (absolute value of negative quantities).
    pub returned_units: i64,
    pub order_lines: usize,
    pub active_days: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Calendar days from first to last sale, inclusive.
    pub span_days: i64,
    pub avg_daily_demand: f64,
    pub peak_daily_units: i64,
    pub avg_unit_price: f64,
}

/// In-memory demand history.
#[derive(Debug, Clone, Default)]
pub struct DemandDataset {
    records: Vec<DemandRecord>,
    report: LoadReport,
}

impl DemandDataset {
    pub fn from_records(records: Vec<DemandRecord>) -> Self {
        let report = LoadReport {
            loaded: records.len(),
            skipped: 0,
        };
        Self { records, report }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot open demand data: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("demand_loader"),
            )
        })?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            loaded = dataset.report.loaded,
            skipped = dataset.report.skipped,
            "demand data loaded"
        );
        Ok(dataset)
    }

    /// Read every row; rows that fail to parse are skipped and counted.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = decode_record(rdr.byte_headers()?);
        let has = |names: &[&str]| headers.iter().any(|h| names.contains(&h));
        for (column, aliases) in [
            ("StockCode", &["StockCode", "stock_code", "product_id", "ProductID"][..]),
            ("Quantity", &["Quantity", "quantity"][..]),
            ("InvoiceDate", &["InvoiceDate", "invoice_date", "date", "Date"][..]),
        ] {
            if !has(aliases) {
                return Err(Error::validation_with_context(
                    "demand data is missing a required column",
                    ErrorContext::new()
                        .with_field_path(column)
                        .with_source("demand_loader"),
                ));
            }
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        let mut raw = csv::ByteRecord::new();
        loop {
            let row = match rdr.read_byte_record(&mut raw) {
                Ok(true) => decode_record(&raw)
                    .deserialize::<RawRecord>(Some(&headers))
                    .map_err(Error::from)
                    .and_then(RawRecord::into_record),
                Ok(false) => break,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => Err(e.into()),
            };
            match row {
                Ok(r) => records.push(r),
                Err(e) => {
                    skipped += 1;
                    let line = raw.position().map(|p| p.line()).unwrap_or_default();
                    warn!(line, error = %e, "skipping demand row");
                }
            }
        }

        Ok(Self {
            report: LoadReport {
                loaded: records.len(),
                skipped,
            },
            records,
        })
    }

    pub fn records(&self) -> &[DemandRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn load_report(&self) -> LoadReport {
        self.report
    }

    /// Rows for one stock code (trimmed, case-insensitive).
    pub fn for_product(&self, stock_code: &str) -> Vec<&DemandRecord> {
        let code = normalize_code(stock_code);
        self.records
            .iter()
            .filter(|r| r.stock_code == code)
            .collect()
    }

    pub fn contains_product(&self, stock_code: &str) -> bool {
        let code = normalize_code(stock_code);
        self.records.iter().any(|r| r.stock_code == code)
    }

    /// Distinct stock codes, sorted.
    pub fn product_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.stock_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.records.iter().map(|r| r.invoice_date).min()?;
        let last = self.records.iter().map(|r| r.invoice_date).max()?;
        Some((first, last))
    }

    /// Stock codes ranked by units sold, ties broken by code.
    pub fn top_products(&self, n: usize) -> Vec<(String, i64)> {
        let mut totals: HashMap<&str, i64> = HashMap::new();
        for r in self.records.iter().filter(|r| r.quantity > 0) {
            *totals.entry(r.stock_code.as_str()).or_default() += r.quantity;
        }
        let mut ranked: Vec<(String, i64)> = totals
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    pub fn summarize(&self, stock_code: &str) -> Option<ProductSummary> {
        let rows = self.for_product(stock_code);
        let first = rows.first()?;

        let mut daily: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        let mut total_units = 0i64;
        let mut returned_units = 0i64;
        let mut price_sum = 0.0;
        let mut description = first.description.clone();
        let mut latest = first.invoice_date;

        for r in &rows {
            if r.quantity > 0 {
                total_units += r.quantity;
                *daily.entry(r.date()).or_default() += r.quantity;
            } else {
                returned_units += r.quantity.abs();
            }
            price_sum += r.unit_price;
            if r.invoice_date >= latest && !r.description.is_empty() {
                latest = r.invoice_date;
                description = r.description.clone();
            }
        }

        let first_date = rows.iter().map(|r| r.date()).min()?;
        let last_date = rows.iter().map(|r| r.date()).max()?;
        let span_days = (last_date - first_date).num_days() + 1;

        Some(ProductSummary {
            stock_code: first.stock_code.clone(),
            description,
            total_units,
            returned_units,
            order_lines: rows.len(),
            active_days: daily.len(),
            first_date,
            last_date,
            span_days,
            avg_daily_demand: total_units as f64 / span_days as f64,
            peak_daily_units: daily.values().copied().max().unwrap_or(0),
            avg_unit_price: price_sum / rows.len() as f64,
        })
    }

    /// Deterministic one-paragraph summary of a product, fed to prompts and cache keys.
    pub fn snapshot(&self, stock_code: &str) -> Option<String> {
        self.summarize(stock_code).map(|s| {
            format!(
                "product={} description=\"{}\" total_units={} returned_units={} order_lines={} \
                 active_days={} first_date={} last_date={} span_days={} avg_daily_demand={:.2} \
                 peak_daily_units={} avg_unit_price={:.2}",
                s.stock_code,
                s.description,
                s.total_units,
                s.returned_units,
                s.order_lines,
                s.active_days,
                s.first_date,
                s.last_date,
                s.span_days,
                s.avg_daily_demand,
                s.peak_daily_units,
                s.avg_unit_price
            )
        })
    }

    /// Short dataset description for open-ended questions.
    pub fn overview(&self, top_n: usize) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "{} records across {} products",
            self.len(),
            self.product_ids().len()
        );
        if let Some((first, last)) = self.date_range() {
            let _ = write!(out, " from {} to {}", first.date(), last.date());
        }
        let top = self.top_products(top_n);
        if !top.is_empty() {
            out.push_str(". Top sellers by units: ");
            let parts: Vec<String> = top.iter().map(|(c, u)| format!("{c} ({u})")).collect();
            out.push_str(&parts.join(", "));
        }
        out.push('.');
        out
    }
}

/// Canonical stock code: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Decode each field as UTF-8, falling back to ISO-8859-1 for legacy exports.
fn decode_record(raw: &csv::ByteRecord) -> csv::StringRecord {
    let mut record: csv::StringRecord = raw.iter().map(decode_field).collect();
    record.trim();
    record
}

fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        // Latin-1 maps each byte to the code point of the same value.
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,12/1/2010 8:26,2.55,17850,United Kingdom
536365,71053,WHITE METAL LANTERN,6,12/1/2010 8:26,3.39,17850,United Kingdom
536366,85123A,WHITE HANGING HEART T-LIGHT HOLDER,10,12/3/2010 9:00,2.55,17851,United Kingdom
C536367,85123A,WHITE HANGING HEART T-LIGHT HOLDER,-2,12/4/2010 10:00,2.55,17851,United Kingdom
536368,84406B,CREAM CUPID HEARTS COAT HANGER,not-a-number,12/4/2010 10:00,2.75,,France
536369,84406B,CREAM CUPID HEARTS COAT HANGER,8,sometime,2.75,,France
536370,84406B,CREAM CUPID HEARTS COAT HANGER,8,2010-12-05 11:00:00,2.75,,France
";

    fn sample() -> DemandDataset {
        DemandDataset::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_skips_malformed_rows() {
        let ds = sample();
        assert_eq!(ds.len(), 5);
        assert_eq!(
            ds.load_report(),
            LoadReport {
                loaded: 5,
                skipped: 2
            }
        );
    }

    #[test]
    fn test_latin1_rows_are_kept() {
        let mut bytes = b"StockCode,Description,Quantity,InvoiceDate\n\
85123A,HEART HOLDER,6,12/1/2010 8:26\n\
85123A,HEART HOLDER "
            .to_vec();
        bytes.push(0xA3);
        bytes.extend_from_slice(b" DEAL,10,12/3/2010 9:00\n");

        let ds = DemandDataset::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(ds.load_report(), LoadReport { loaded: 2, skipped: 0 });
        assert_eq!(ds.summarize("85123A").unwrap().total_units, 16);
        assert_eq!(ds.records()[1].description, "HEART HOLDER \u{a3} DEAL");
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "StockCode,Description\n85123A,HEART\n";
        let err = DemandDataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let ds = sample();
        assert_eq!(ds.for_product(" 85123a ").len(), 3);
        assert!(ds.contains_product("71053"));
        assert!(!ds.contains_product("00000"));
    }

    #[test]
    fn test_product_ids_sorted_distinct() {
        assert_eq!(sample().product_ids(), vec!["71053", "84406B", "85123A"]);
    }

    #[test]
    fn test_top_products() {
        let top = sample().top_products(2);
        assert_eq!(top, vec![("85123A".to_string(), 16), ("84406B".to_string(), 8)]);
    }

    #[test]
    fn test_summarize() {
        let s = sample().summarize("85123A").unwrap();
        assert_eq!(s.total_units, 16);
        assert_eq!(s.returned_units, 2);
        assert_eq!(s.order_lines, 3);
        assert_eq!(s.active_days, 2);
        assert_eq!(s.span_days, 4);
        assert!((s.avg_daily_demand - 4.0).abs() < 1e-9);
        assert_eq!(s.peak_daily_units, 10);
        assert!(sample().summarize("nope").is_none());
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let ds = sample();
        let a = ds.snapshot("85123A").unwrap();
        assert_eq!(a, ds.snapshot("85123a").unwrap());
        assert!(a.contains("total_units=16"));
        assert!(a.contains("avg_daily_demand=4.00"));
    }

    #[test]
    fn test_overview() {
        let text = sample().overview(2);
        assert!(text.starts_with("5 records across 3 products from 2010-12-01 to 2010-12-05"));
        assert!(text.contains("85123A (16)"));
    }
}
