//! Data models shared between the server and its clients

pub mod metrics;
pub mod order;
pub mod user;

pub use metrics::{DailyReceipt, DayOrdersAmount, MonthOrdersAmount, MonthReceipt, PopularProduct};
pub use order::{
    OrderCustomer, OrderDetails, OrderItemDetail, OrderListResponse, OrderStatus, OrderSummary,
    PageMeta,
};
pub use user::{Restaurant, UserProfile, UserRole};
