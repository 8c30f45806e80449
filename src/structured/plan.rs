use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::extract::extract_json;
use crate::{Error, ErrorContext, Result};

/// Replenishment recommendation for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReorderPlan {
    /// Stock code the plan is for.
    pub product_id: String,
    /// Inventory level, in units, that triggers a new order.
    pub reorder_point: u32,
    /// Units to order each time.
    pub reorder_quantity: u32,
    /// Buffer stock held against demand and lead-time variability.
    pub safety_stock: u32,
    /// Expected supplier lead time in days.
    pub lead_time_days: u32,
    /// Model's confidence in the plan, between 0 and 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Short explanation of how the numbers were derived.
    pub rationale: String,
}

const INTEGER_FIELDS: [&str; 4] = [
    "reorder_point",
    "reorder_quantity",
    "safety_stock",
    "lead_time_days",
];

/// JSON Schema derived from [`ReorderPlan`].
pub fn reorder_plan_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(ReorderPlan)).unwrap_or_else(|_| json!({}))
}

static PLAN_VALIDATOR: Lazy<std::result::Result<JSONSchema, String>> = Lazy::new(|| {
    let schema = reorder_plan_schema();
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .map_err(|e| format!("Failed to compile reorder plan schema: {}", e))
});

/// Parse a model reply into a validated [`ReorderPlan`] for `requested_id`.
///
/// Whole-number floats (`120.0`) are accepted for integer fields. A missing or
/// different `product_id` is replaced by `requested_id`.
pub fn parse_reorder_plan(text: &str, requested_id: &str) -> Result<ReorderPlan> {
    let mut value = extract_json(text)?;
    let obj = value.as_object_mut().ok_or_else(|| {
        Error::validation_with_context(
            "reorder plan must be a JSON object",
            ErrorContext::new()
                .with_field_path("plan")
                .with_source("plan_parser"),
        )
    })?;

    for field in INTEGER_FIELDS {
        let Some(Value::Number(n)) = obj.get(field) else {
            continue;
        };
        let too_large = match n.as_u64() {
            Some(u) => u > u64::from(u32::MAX),
            None => n.as_f64().is_some_and(|f| f > f64::from(u32::MAX)),
        };
        if too_large {
            return Err(Error::validation_with_context(
                format!("{} exceeds {}", field, u32::MAX),
                ErrorContext::new()
                    .with_field_path(format!("plan.{}", field))
                    .with_details(n.to_string())
                    .with_source("plan_parser"),
            ));
        }
        if n.is_f64() {
            if let Some(whole) = n.as_f64().and_then(whole_number) {
                obj.insert(field.to_string(), Value::from(whole));
            }
        }
    }

    match obj.get("product_id").and_then(Value::as_str) {
        Some(id) if id.trim().eq_ignore_ascii_case(requested_id.trim()) => {}
        other => {
            warn!(
                requested = requested_id,
                returned = other.unwrap_or("<missing>"),
                "reorder plan product_id mismatch, using requested id"
            );
            obj.insert(
                "product_id".to_string(),
                Value::String(requested_id.trim().to_string()),
            );
        }
    }

    validate(&value)?;

    let plan: ReorderPlan = serde_json::from_value(value).map_err(|e| {
        Error::validation_with_context(
            format!("reorder plan has the wrong shape: {}", e),
            ErrorContext::new()
                .with_field_path("plan")
                .with_source("plan_parser"),
        )
    })?;
    if let Some(c) = plan.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(Error::validation_with_context(
                "confidence must be between 0 and 1",
                ErrorContext::new()
                    .with_field_path("plan.confidence")
                    .with_details(c.to_string())
                    .with_source("plan_parser"),
            ));
        }
    }
    Ok(plan)
}

/// Integer value of a finite whole float that fits in `i64`.
fn whole_number(f: f64) -> Option<i64> {
    // 2^63, exact in f64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn validate(value: &Value) -> Result<()> {
    let schema = PLAN_VALIDATOR
        .as_ref()
        .map_err(|e| Error::runtime(e.clone()))?;

    let errors: Vec<(String, String)> = match schema.validate(value) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|e| {
                let path = match &e.kind {
                    ValidationErrorKind::Required { property } => property
                        .as_str()
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| property.to_string()),
                    _ => e
                        .instance_path
                        .to_string()
                        .trim_start_matches('/')
                        .replace('/', "."),
                };
                (path, e.to_string())
            })
            .collect(),
    };

    let (path, first) = errors
        .first()
        .cloned()
        .unwrap_or_else(|| (String::new(), "schema violation".to_string()));
    let field_path = if path.is_empty() {
        "plan".to_string()
    } else {
        format!("plan.{}", path)
    };
    Err(Error::validation_with_context(
        format!("reorder plan failed schema validation: {}", first),
        ErrorContext::new()
            .with_field_path(field_path)
            .with_details(
                errors
                    .iter()
                    .map(|(_, m)| m.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
            .with_source("plan_parser"),
    ))
}
