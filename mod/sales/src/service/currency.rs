use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;
use tracing::debug;

use super::SalesService;
use crate::model::{Conversion, ExchangeRate, UpsertRateRequest};

impl SalesService {
    /// Convert an amount between currencies. Equal source and target
    /// return the amount unchanged without touching storage or cache.
    pub fn convert(
        &self,
        org: &str,
        amount: f64,
        from: &str,
        to: &str,
    ) -> Result<Conversion, ServiceError> {
        let from = normalize_currency(from)?;
        let to = normalize_currency(to)?;

        let rate = if from == to { 1.0 } else { self.resolve_rate(org, &from, &to)? };

        Ok(Conversion {
            amount,
            converted: amount * rate,
            from,
            to,
            rate,
        })
    }

    /// Store (or replace) a rate and drop the cached pair in both
    /// directions.
    pub fn upsert_rate(
        &self,
        org: &str,
        req: UpsertRateRequest,
    ) -> Result<ExchangeRate, ServiceError> {
        let base = normalize_currency(&req.base)?;
        let quote = normalize_currency(&req.quote)?;
        if base == quote {
            return Err(ServiceError::Validation("base and quote must differ".into()));
        }
        if req.rate <= 0.0 {
            return Err(ServiceError::Validation("rate must be positive".into()));
        }

        let now = now_rfc3339();
        let existing = self
            .db
            .query(
                "SELECT id FROM exchange_rates WHERE org_id = ?1 AND base = ?2 AND quote = ?3",
                &[
                    Value::Text(org.to_string()),
                    Value::Text(base.clone()),
                    Value::Text(quote.clone()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let record = if let Some(row) = existing.first() {
            let id = row
                .get_str("id")
                .ok_or_else(|| ServiceError::Internal("missing id column".into()))?
                .to_string();
            let record = ExchangeRate {
                id: id.clone(),
                org_id: org.to_string(),
                base: base.clone(),
                quote: quote.clone(),
                rate: req.rate,
                fetched_at: now,
            };
            store::update_record(
                self.db.as_ref(),
                "exchange_rates",
                org,
                &id,
                &record,
                &rate_indexes(&record),
            )?;
            record
        } else {
            let id = new_id();
            let record = ExchangeRate {
                id: id.clone(),
                org_id: org.to_string(),
                base: base.clone(),
                quote: quote.clone(),
                rate: req.rate,
                fetched_at: now,
            };
            store::insert_record(
                self.db.as_ref(),
                "exchange_rates",
                org,
                &id,
                &record,
                &rate_indexes(&record),
            )?;
            record
        };

        if let Ok(mut cache) = self.rate_cache.lock() {
            cache.remove(&(org.to_string(), base.clone(), quote.clone()));
            cache.remove(&(org.to_string(), quote.clone(), base.clone()));
        }
        debug!("rate {base}/{quote} upserted for org {org}, cached pair dropped");

        Ok(record)
    }

    pub fn list_rates(
        &self,
        org: &str,
        params: &ListParams,
    ) -> Result<ListResult<ExchangeRate>, ServiceError> {
        store::list_records(
            self.db.as_ref(),
            "exchange_rates",
            org,
            &[],
            None,
            params.limit.min(500),
            params.offset,
        )
    }

    /// Drop every cached rate for the organization. Stored rows are kept.
    pub fn invalidate_rates(&self, org: &str) -> usize {
        let mut dropped = 0;
        if let Ok(mut cache) = self.rate_cache.lock() {
            let before = cache.len();
            cache.retain(|(o, _, _), _| o != org);
            dropped = before - cache.len();
        }
        debug!("rate cache invalidated for org {org} ({dropped} entries)");
        dropped
    }

    fn resolve_rate(&self, org: &str, from: &str, to: &str) -> Result<f64, ServiceError> {
        let key = (org.to_string(), from.to_string(), to.to_string());
        if let Ok(cache) = self.rate_cache.lock() {
            if let Some(rate) = cache.get(&key) {
                return Ok(*rate);
            }
        }

        let rate = match self.stored_rate(org, from, to)? {
            Some(rate) => rate,
            None => match self.stored_rate(org, to, from)? {
                // An inverse row satisfies the lookup.
                Some(inverse) if inverse != 0.0 => 1.0 / inverse,
                _ => {
                    return Err(ServiceError::Validation(format!(
                        "no exchange rate for {} to {}",
                        from, to
                    )));
                }
            },
        };

        if let Ok(mut cache) = self.rate_cache.lock() {
            cache.insert(key, rate);
        }
        Ok(rate)
    }

    fn stored_rate(&self, org: &str, base: &str, quote: &str) -> Result<Option<f64>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT rate FROM exchange_rates WHERE org_id = ?1 AND base = ?2 AND quote = ?3",
                &[
                    Value::Text(org.to_string()),
                    Value::Text(base.to_string()),
                    Value::Text(quote.to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_f64("rate")))
    }
}

fn normalize_currency(code: &str) -> Result<String, ServiceError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ServiceError::Validation(format!(
            "invalid currency code '{}'",
            code
        )));
    }
    Ok(code)
}

fn rate_indexes(r: &ExchangeRate) -> Vec<(&'static str, Value)> {
    vec![
        ("base", Value::Text(r.base.clone())),
        ("quote", Value::Text(r.quote.clone())),
        ("rate", Value::Real(r.rate)),
        ("created_at", Value::Text(r.fetched_at.clone())),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use centro_core::NullSink;
    use centro_sql::SqliteStore;

    use super::*;

    fn svc() -> SalesService {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        SalesService::new(db, Arc::new(NullSink)).unwrap()
    }

    fn put_rate(svc: &SalesService, org: &str, base: &str, quote: &str, rate: f64) {
        svc.upsert_rate(
            org,
            UpsertRateRequest { base: base.into(), quote: quote.into(), rate },
        )
        .unwrap();
    }

    #[test]
    fn same_currency_is_identity_without_storage() {
        // No rates stored at all; identity conversion must still work.
        let svc = svc();
        let c = svc.convert("org1", 250.0, "pen", "PEN").unwrap();
        assert_eq!(c.converted, 250.0);
        assert_eq!(c.rate, 1.0);
        assert_eq!(c.from, "PEN");
        assert_eq!(c.to, "PEN");
    }

    #[test]
    fn direct_rate_applies() {
        let svc = svc();
        put_rate(&svc, "org1", "USD", "PEN", 3.8);
        let c = svc.convert("org1", 10.0, "USD", "PEN").unwrap();
        assert_eq!(c.converted, 38.0);
        assert_eq!(c.rate, 3.8);
    }

    #[test]
    fn inverse_rate_satisfies_lookup() {
        let svc = svc();
        put_rate(&svc, "org1", "USD", "PEN", 4.0);
        let c = svc.convert("org1", 20.0, "PEN", "USD").unwrap();
        assert_eq!(c.rate, 0.25);
        assert_eq!(c.converted, 5.0);
    }

    #[test]
    fn unknown_pair_is_validation_error() {
        let svc = svc();
        put_rate(&svc, "org1", "USD", "PEN", 4.0);
        let err = svc.convert("org1", 5.0, "EUR", "PEN").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        // Rates are org-scoped: another org can not use them.
        let err = svc.convert("org2", 5.0, "USD", "PEN").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn cache_survives_stored_row_changes_until_invalidated() {
        let svc = svc();
        put_rate(&svc, "org1", "USD", "PEN", 4.0);
        assert_eq!(svc.convert("org1", 1.0, "USD", "PEN").unwrap().rate, 4.0);

        // Mutate the stored row behind the cache's back.
        svc.db
            .exec(
                "UPDATE exchange_rates SET rate = 99.0 WHERE org_id = 'org1'",
                &[],
            )
            .unwrap();

        // Cached value still served; no TTL.
        assert_eq!(svc.convert("org1", 1.0, "USD", "PEN").unwrap().rate, 4.0);

        // Explicit invalidation drops it; the next lookup re-reads the row.
        assert_eq!(svc.invalidate_rates("org1"), 1);
        assert_eq!(svc.convert("org1", 1.0, "USD", "PEN").unwrap().rate, 99.0);
    }

    #[test]
    fn upsert_replaces_and_drops_cached_pair() {
        let svc = svc();
        put_rate(&svc, "org1", "USD", "PEN", 4.0);
        // Warm the cache in both directions.
        svc.convert("org1", 1.0, "USD", "PEN").unwrap();
        svc.convert("org1", 1.0, "PEN", "USD").unwrap();

        put_rate(&svc, "org1", "USD", "PEN", 5.0);
        assert_eq!(svc.convert("org1", 1.0, "USD", "PEN").unwrap().rate, 5.0);
        assert_eq!(svc.convert("org1", 1.0, "PEN", "USD").unwrap().rate, 0.2);

        // Still a single stored row.
        let rates = svc.list_rates("org1", &ListParams::default()).unwrap();
        assert_eq!(rates.total, 1);
        assert_eq!(rates.items[0].rate, 5.0);
    }

    #[test]
    fn bad_rate_input_rejected() {
        let svc = svc();
        let err = svc
            .upsert_rate("org1", UpsertRateRequest { base: "USD".into(), quote: "USD".into(), rate: 1.0 })
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let err = svc
            .upsert_rate("org1", UpsertRateRequest { base: "USD".into(), quote: "PEN".into(), rate: 0.0 })
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let err = svc.convert("org1", 1.0, "DOLLARS", "PEN").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }
}
