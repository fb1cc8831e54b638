use serde::Deserialize;
use serde_json::{Map, Value};

use portfolio_core::{ApplicationData, Criticality, IntegrationData};

use crate::error::BatchError;
use crate::sanitize;

/// Fields the model tends to return as arrays; stored comma-joined.
const LIST_FIELDS: [&str; 3] = ["programming_languages", "capabilities", "technical_dependencies"];

#[derive(Deserialize)]
struct AppRecord {
    name: String,
    #[serde(default)]
    domain: String,
    criticality: Criticality,
    #[serde(default)]
    lifecycle: String,
    #[serde(default)]
    business_owner: String,
    #[serde(default)]
    it_owner: String,
    #[serde(default)]
    vendor: Option<String>,
    #[serde(default)]
    programming_languages: String,
    #[serde(default)]
    database: String,
    #[serde(default)]
    hosting_environment: String,
    #[serde(default)]
    capabilities: String,
    #[serde(default)]
    technical_dependencies: String,
    #[serde(default)]
    tech_debt_score: i32,
}

impl From<AppRecord> for ApplicationData {
    fn from(r: AppRecord) -> Self {
        Self {
            name: r.name,
            domain: r.domain,
            criticality: r.criticality,
            lifecycle: r.lifecycle,
            business_owner: r.business_owner,
            it_owner: r.it_owner,
            vendor: r.vendor.filter(|v| !v.trim().is_empty()),
            programming_languages: r.programming_languages,
            database: r.database,
            hosting_environment: r.hosting_environment,
            capabilities: r.capabilities,
            technical_dependencies: r.technical_dependencies,
            tech_debt_score: r.tech_debt_score,
        }
    }
}

/// An integration as the model describes it: endpoints by application name.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IntegrationRecord {
    pub source_app_name: String,
    pub target_app_name: String,
    pub integration_type: String,
    pub direction: String,
    #[serde(default)]
    pub data_volume: String,
    #[serde(default)]
    pub data_sensitivity: String,
}

impl IntegrationRecord {
    pub fn data(&self) -> IntegrationData {
        IntegrationData {
            integration_type: self.integration_type.clone(),
            direction: self.direction.clone(),
            data_volume: self.data_volume.clone(),
            data_sensitivity: self.data_sensitivity.clone(),
        }
    }
}

/// Decode a batch response into its records. Fences are stripped first; if
/// the model wrapped the array in prose, the outermost `[...]` is tried.
pub fn parse_batch(raw: &str) -> Result<Vec<Value>, BatchError> {
    let cleaned = sanitize::clean(raw);
    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        Err(e) => match extract_json_array(&cleaned) {
            Some(slice) => serde_json::from_str(slice).map_err(|_| e)?,
            None => return Err(e.into()),
        },
    };
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(BatchError::NotAnArray),
    }
}

fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Convert one loosely-typed application record.
pub fn application_record(record: Value) -> Result<ApplicationData, serde_json::Error> {
    let mut record = record;
    if let Value::Object(obj) = &mut record {
        flatten_lists(obj);
        coerce_score(obj);
        stringify_scalars(obj, &["tech_debt_score", "criticality"]);
    }
    let app: AppRecord = serde_json::from_value(record)?;
    Ok(app.into())
}

pub fn integration_record(record: Value) -> Result<IntegrationRecord, serde_json::Error> {
    let mut record = record;
    if let Value::Object(obj) = &mut record {
        stringify_scalars(obj, &[]);
    }
    serde_json::from_value(record)
}

fn flatten_lists(obj: &mut Map<String, Value>) {
    for field in LIST_FIELDS {
        if let Some(Value::Array(items)) = obj.get(field) {
            let joined = items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            obj.insert(field.to_string(), Value::String(joined));
        }
    }
}

/// `"7"` and `7.5` both become integers, clamped to the `i32` range;
/// anything unparsable or non-finite is dropped so the default applies.
fn coerce_score(obj: &mut Map<String, Value>) {
    let coerced = match obj.get("tech_debt_score") {
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => return,
    };
    match coerced.filter(|f| f.is_finite()) {
        Some(f) => {
            let score = f.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
            obj.insert("tech_debt_score".into(), Value::from(score));
        }
        None => {
            obj.remove("tech_debt_score");
        }
    }
}

/// Numbers and booleans in text fields become strings; nulls fall back to
/// the field default.
fn stringify_scalars(obj: &mut Map<String, Value>, skip: &[&str]) {
    let keys: Vec<String> = obj.keys().cloned().collect();
    for key in keys {
        if skip.contains(&key.as_str()) {
            continue;
        }
        match obj.get(&key) {
            Some(Value::Null) => {
                obj.remove(&key);
            }
            Some(v @ (Value::Number(_) | Value::Bool(_))) => {
                let s = v.to_string();
                obj.insert(key, Value::String(s));
            }
            _ => {}
        }
    }
}
