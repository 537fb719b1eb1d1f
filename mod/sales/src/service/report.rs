use std::collections::BTreeMap;

use centro_core::ServiceError;
use centro_sql::Value;
use chrono::NaiveDate;

use super::SalesService;
use super::sale::{parse_day, sold_day_of};
use crate::model::{DailyRevenue, ForecastReport, ProjectedDay, Sale, SummaryReport, TopProduct};

const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Default, serde::Deserialize)]
pub struct ReportQuery {
    /// First day included. Defaults to 30 days before `to`.
    pub from: Option<String>,
    /// Last day included. Defaults to today.
    pub to: Option<String>,
    /// Report currency. Defaults to the organization's base currency.
    pub currency: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ForecastQuery {
    /// Trailing days fed into the average. Defaults to 30.
    pub window: Option<i64>,
    /// Days projected forward. Defaults to 7.
    pub horizon: Option<i64>,
    pub currency: Option<String>,
}

impl SalesService {
    /// Revenue summary over a day range: totals, a zero-filled per-day
    /// series, and the top products by revenue, all converted into one
    /// currency.
    pub fn summary_report(
        &self,
        org: &str,
        query: &ReportQuery,
    ) -> Result<SummaryReport, ServiceError> {
        let to = match query.to {
            Some(ref d) => parse_day(d)?,
            None => today_date(),
        };
        let from = match query.from {
            Some(ref d) => parse_day(d)?,
            None => to - chrono::Duration::days(30),
        };
        if to < from {
            return Err(ServiceError::Validation("report range ends before it starts".into()));
        }
        let currency = match query.currency {
            Some(ref c) => c.to_ascii_uppercase(),
            None => self.base_currency(org)?,
        };

        let sales = self.sales_between(org, from, to)?;

        let mut revenue = 0.0;
        let mut daily: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        let mut day = from;
        while day <= to {
            daily.insert(day.to_string(), (0.0, 0));
            day += chrono::Duration::days(1);
        }
        let mut tops: BTreeMap<String, TopProduct> = BTreeMap::new();

        for sale in &sales {
            let converted = self.convert(org, sale.total, &sale.currency, &currency)?.converted;
            revenue += converted;

            let day = sold_day_of(&sale.sold_at)?;
            if let Some(slot) = daily.get_mut(&day) {
                slot.0 += converted;
                slot.1 += 1;
            }

            let key = sale.product_id.clone().unwrap_or_else(|| sale.description.clone());
            let entry = tops.entry(key).or_insert_with(|| TopProduct {
                product_id: sale.product_id.clone(),
                description: sale.description.clone(),
                revenue: 0.0,
                quantity: 0.0,
            });
            entry.revenue += converted;
            entry.quantity += sale.quantity;
        }

        let sale_count = sales.len();
        let mut top_products: Vec<TopProduct> = tops.into_values().collect();
        top_products.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
        top_products.truncate(TOP_PRODUCTS);

        Ok(SummaryReport {
            from: from.to_string(),
            to: to.to_string(),
            currency,
            sale_count,
            revenue,
            average_sale: if sale_count == 0 { 0.0 } else { revenue / sale_count as f64 },
            daily: daily
                .into_iter()
                .map(|(day, (revenue, count))| DailyRevenue { day, revenue, count })
                .collect(),
            top_products,
        })
    }

    /// Project revenue forward at the trailing daily average: the window
    /// ends today, empty days count as zero, and every projected day
    /// carries the same average.
    pub fn forecast(
        &self,
        org: &str,
        query: &ForecastQuery,
    ) -> Result<ForecastReport, ServiceError> {
        let window = query.window.unwrap_or(30);
        let horizon = query.horizon.unwrap_or(7);
        if !(1..=365).contains(&window) {
            return Err(ServiceError::Validation("window must be between 1 and 365 days".into()));
        }
        if !(1..=365).contains(&horizon) {
            return Err(ServiceError::Validation("horizon must be between 1 and 365 days".into()));
        }
        let currency = match query.currency {
            Some(ref c) => c.to_ascii_uppercase(),
            None => self.base_currency(org)?,
        };

        let today = today_date();
        let from = today - chrono::Duration::days(window - 1);
        let sales = self.sales_between(org, from, today)?;

        let mut total = 0.0;
        for sale in &sales {
            total += self.convert(org, sale.total, &sale.currency, &currency)?.converted;
        }
        let daily_average = total / window as f64;

        let mut projected = Vec::with_capacity(horizon as usize);
        for i in 1..=horizon {
            projected.push(ProjectedDay {
                day: (today + chrono::Duration::days(i)).to_string(),
                revenue: daily_average,
            });
        }

        Ok(ForecastReport {
            currency,
            window_days: window,
            horizon_days: horizon,
            daily_average,
            projected_total: daily_average * horizon as f64,
            projected,
        })
    }

    fn sales_between(
        &self,
        org: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Sale>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM sales
                 WHERE org_id = ?1 AND sold_day >= ?2 AND sold_day <= ?3",
                &[
                    Value::Text(org.to_string()),
                    Value::Text(from.to_string()),
                    Value::Text(to.to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let sale: Sale =
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
            sales.push(sale);
        }
        Ok(sales)
    }
}

fn today_date() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
