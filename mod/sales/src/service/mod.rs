pub mod currency;
pub mod report;
pub mod sale;
pub mod schema;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use centro_core::{EventSink, ServiceError};
use centro_sql::{SQLStore, Value};

/// Cache key for a resolved rate: (org, from, to).
type RateKey = (String, String, String);

/// Sales service — sale records, revenue reports, and currency
/// conversion over stored exchange rates.
pub struct SalesService {
    pub(crate) db: Arc<dyn SQLStore>,
    pub(crate) events: Arc<dyn EventSink>,
    /// Resolved conversion rates. Unbounded and never expired; entries
    /// only leave through explicit invalidation or a rate upsert.
    pub(crate) rate_cache: Mutex<HashMap<RateKey, f64>>,
}

impl SalesService {
    pub fn new(db: Arc<dyn SQLStore>, events: Arc<dyn EventSink>) -> Result<Self, ServiceError> {
        schema::init_schema(db.as_ref())?;
        Ok(Self {
            db,
            events,
            rate_cache: Mutex::new(HashMap::new()),
        })
    }

    /// The organization's base currency, `USD` when the org record is
    /// missing or carries none.
    pub(crate) fn base_currency(&self, org: &str) -> Result<String, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM organizations WHERE id = ?1",
                &[Value::Text(org.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let Some(row) = rows.first() else {
            return Ok("USD".to_string());
        };
        let data = row
            .get_str("data")
            .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(value["baseCurrency"].as_str().unwrap_or("USD").to_string())
    }
}
