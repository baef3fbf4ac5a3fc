//! Order Model

use serde::{Deserialize, Serialize};

/// Order status
///
/// ```text
/// pending --approve--> processing --dispatch--> delivering --deliver--> delivered
/// pending --cancel--> canceled
/// processing --cancel--> canceled
/// ```
///
/// `delivered` and `canceled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Delivering,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Delivering,
        Self::Delivered,
        Self::Canceled,
    ];

    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "delivering" => Some(Self::Delivering),
            "delivered" => Some(Self::Delivered),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }

    /// Sort rank used by order listings: open work first, canceled last
    pub fn list_priority(&self) -> i32 {
        match self {
            Self::Pending => 1,
            Self::Processing => 2,
            Self::Delivering => 3,
            Self::Delivered => 4,
            Self::Canceled => 99,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Row of `GET /orders`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: String,
    /// Unix millis
    pub created_at: i64,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    /// Total in cents
    pub total: i64,
}

/// Pagination metadata of `GET /orders`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page_index: i64,
    pub per_page: i64,
    pub total_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderSummary>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetail {
    pub id: String,
    pub price_in_cents: i64,
    pub quantity: i32,
    pub product_name: Option<String>,
}

/// Response of `GET /orders/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub id: String,
    pub created_at: i64,
    pub status: OrderStatus,
    pub total_in_cents: i64,
    pub customer: Option<OrderCustomer>,
    pub order_items: Vec<OrderItemDetail>,
}
