use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Error, ErrorContext, Result};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// One row of sales/stock history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub invoice_no: String,
    pub stock_code: String,
    pub description: String,
    /// Negative for returns and cancellations.
    pub quantity: i64,
    pub invoice_date: NaiveDateTime,
    pub unit_price: f64,
    pub customer_id: Option<String>,
    pub country: String,
}

impl DemandRecord {
    pub fn date(&self) -> NaiveDate {
        self.invoice_date.date()
    }

    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Lenient row shape; only product code, quantity and date are required.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
    #[serde(rename = "InvoiceNo", alias = "invoice_no", alias = "Invoice", default)]
    invoice_no: Option<String>,
    #[serde(rename = "StockCode", alias = "stock_code", alias = "product_id", alias = "ProductID", default)]
    stock_code: Option<String>,
    #[serde(rename = "Description", alias = "description", default)]
    description: Option<String>,
    #[serde(rename = "Quantity", alias = "quantity", default)]
    quantity: Option<String>,
    #[serde(rename = "InvoiceDate", alias = "invoice_date", alias = "date", alias = "Date", default)]
    invoice_date: Option<String>,
    #[serde(rename = "UnitPrice", alias = "unit_price", alias = "Price", default)]
    unit_price: Option<String>,
    #[serde(rename = "CustomerID", alias = "customer_id", alias = "Customer ID", default)]
    customer_id: Option<String>,
    #[serde(rename = "Country", alias = "country", default)]
    country: Option<String>,
}

impl RawRecord {
    pub(crate) fn into_record(self) -> Result<DemandRecord> {
        let stock_code = non_empty(self.stock_code).ok_or_else(|| missing("StockCode"))?;
        let quantity_text = non_empty(self.quantity).ok_or_else(|| missing("Quantity"))?;
        let quantity = parse_quantity(&quantity_text)?;
        let date_text = non_empty(self.invoice_date).ok_or_else(|| missing("InvoiceDate"))?;
        let invoice_date = parse_timestamp(&date_text)?;
        let unit_price = non_empty(self.unit_price)
            .and_then(|p| p.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(DemandRecord {
            invoice_no: self.invoice_no.unwrap_or_default(),
            stock_code: stock_code.to_uppercase(),
            description: self.description.unwrap_or_default(),
            quantity,
            invoice_date,
            unit_price,
            customer_id: non_empty(self.customer_id),
            country: self.country.unwrap_or_default(),
        })
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn missing(column: &str) -> Error {
    Error::validation_with_context(
        "missing required column value",
        ErrorContext::new()
            .with_field_path(column)
            .with_source("demand_loader"),
    )
}

// Some exports write integer quantities as "12.0".
fn parse_quantity(text: &str) -> Result<i64> {
    if let Ok(q) = text.parse::<i64>() {
        return Ok(q);
    }
    match text.parse::<f64>() {
        // Range-checked against 2^63, so the cast is exact.
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.223_372_036_854_776e18 => {
            Ok(f as i64)
        }
        _ => Err(Error::validation_with_context(
            "quantity is not an integer",
            ErrorContext::new()
                .with_field_path("Quantity")
                .with_details(text.to_string())
                .with_source("demand_loader"),
        )),
    }
}

/// Parse the timestamp layouts seen in retail exports; bare dates become midnight.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }
    Err(Error::validation_with_context(
        "unrecognized date format",
        ErrorContext::new()
            .with_field_path("InvoiceDate")
            .with_details(text.to_string())
            .with_source("demand_loader"),
    ))
}
