//! Metrics response models

use serde::{Deserialize, Serialize};

/// One day of `GET /metrics/daily-receipt-in-period`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReceipt {
    /// Local calendar day, `DD/MM`
    pub date: String,
    /// Sum of order totals in cents
    pub receipt: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOrdersAmount {
    pub amount: i64,
    pub diff_from_yesterday: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthReceipt {
    pub receipt: i64,
    pub diff_from_last_month: f64,
}

/// Shared by `month-orders-amount` and `month-canceled-orders-amount`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthOrdersAmount {
    pub amount: i64,
    pub diff_from_last_month: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularProduct {
    pub product: String,
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_fields() {
        let json = serde_json::to_value(DayOrdersAmount {
            amount: 15,
            diff_from_yesterday: 50.0,
        })
        .unwrap();
        assert_eq!(json["amount"], 15);
        assert_eq!(json["diffFromYesterday"], 50.0);

        let json = serde_json::to_value(MonthReceipt {
            receipt: 1200,
            diff_from_last_month: -12.5,
        })
        .unwrap();
        assert_eq!(json["diffFromLastMonth"], -12.5);
    }
}
