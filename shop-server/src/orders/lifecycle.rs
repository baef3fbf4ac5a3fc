//! Order status transitions
//!
//! ```text
//! pending --approve--> processing --dispatch--> delivering --deliver--> delivered
//! pending | processing --cancel--> canceled
//! ```

use async_trait::async_trait;
use shared::error::AppError;
use shared::models::OrderStatus;

use crate::error::ServiceResult;

/// A lifecycle operation requested by a restaurant manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    Approve,
    Dispatch,
    Deliver,
    Cancel,
}

impl OrderTransition {
    /// Statuses this transition may start from
    pub fn allowed_from(self) -> &'static [OrderStatus] {
        match self {
            Self::Approve => &[OrderStatus::Pending],
            Self::Dispatch => &[OrderStatus::Processing],
            Self::Deliver => &[OrderStatus::Delivering],
            Self::Cancel => &[OrderStatus::Pending, OrderStatus::Processing],
        }
    }

    /// Status after a successful transition
    pub fn target(self) -> OrderStatus {
        match self {
            Self::Approve => OrderStatus::Processing,
            Self::Dispatch => OrderStatus::Delivering,
            Self::Deliver => OrderStatus::Delivered,
            Self::Cancel => OrderStatus::Canceled,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Dispatch => "dispatch",
            Self::Deliver => "deliver",
            Self::Cancel => "cancel",
        }
    }

    /// Error reported when the order sits in `current` and cannot move
    fn rejection(self, current: OrderStatus) -> AppError {
        let message = match self {
            Self::Approve => "Order was already approved before.",
            Self::Dispatch => "You cannot dispatch orders that are not in \"processing\" status.",
            Self::Deliver => "You cannot deliver orders that are not in \"delivering\" status.",
            Self::Cancel if current == OrderStatus::Canceled => "Order was already canceled.",
            Self::Cancel => "You cannot cancel orders after dispatch.",
        };
        AppError::invalid_state(message).with_detail("status", current.as_db())
    }
}

/// Persistence seam for the lifecycle engine
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Set `target` iff the order belongs to `restaurant_id` and its status is
    /// one of `allowed`, as one atomic statement. Returns whether a row changed.
    async fn update_status_if(
        &self,
        order_id: &str,
        restaurant_id: &str,
        allowed: &[OrderStatus],
        target: OrderStatus,
    ) -> ServiceResult<bool>;

    /// Current status of the order, scoped to `restaurant_id`
    async fn find_status(
        &self,
        order_id: &str,
        restaurant_id: &str,
    ) -> ServiceResult<Option<OrderStatus>>;
}

/// Run a lifecycle transition for an order owned by `restaurant_id`.
///
/// The write goes first. Only when it changes nothing is the order re-read,
/// and only to pick the error: no row in this restaurant is `Unauthorized`,
/// anything else is `ORDER_INVALID_STATE`.
pub async fn apply_transition<S: OrderStore + ?Sized>(
    store: &S,
    order_id: &str,
    restaurant_id: &str,
    transition: OrderTransition,
) -> ServiceResult<()> {
    let changed = store
        .update_status_if(
            order_id,
            restaurant_id,
            transition.allowed_from(),
            transition.target(),
        )
        .await?;

    if changed {
        tracing::info!(
            order_id = %order_id,
            restaurant_id = %restaurant_id,
            transition = transition.name(),
            status = %transition.target(),
            "Order status changed"
        );
        return Ok(());
    }

    match store.find_status(order_id, restaurant_id).await? {
        None => {
            tracing::debug!(
                order_id = %order_id,
                restaurant_id = %restaurant_id,
                "Transition on order outside restaurant scope"
            );
            Err(AppError::unauthorized().into())
        }
        Some(current) => Err(transition.rejection(current).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use shared::error::ErrorCode;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct StoredOrder {
        restaurant_id: String,
        status: OrderStatus,
        total_in_cents: i64,
        created_at: i64,
    }

    #[derive(Default)]
    struct MemoryOrderStore {
        orders: Mutex<HashMap<String, StoredOrder>>,
    }

    impl MemoryOrderStore {
        async fn insert(&self, id: &str, restaurant_id: &str, status: OrderStatus) {
            self.orders.lock().await.insert(
                id.to_string(),
                StoredOrder {
                    restaurant_id: restaurant_id.to_string(),
                    status,
                    total_in_cents: 4_250,
                    created_at: 1_704_067_200_000,
                },
            );
        }

        async fn get(&self, id: &str) -> StoredOrder {
            self.orders.lock().await[id].clone()
        }
    }

    #[async_trait]
    impl OrderStore for MemoryOrderStore {
        async fn update_status_if(
            &self,
            order_id: &str,
            restaurant_id: &str,
            allowed: &[OrderStatus],
            target: OrderStatus,
        ) -> ServiceResult<bool> {
            let mut orders = self.orders.lock().await;
            match orders.get_mut(order_id) {
                Some(order)
                    if order.restaurant_id == restaurant_id && allowed.contains(&order.status) =>
                {
                    order.status = target;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn find_status(
            &self,
            order_id: &str,
            restaurant_id: &str,
        ) -> ServiceResult<Option<OrderStatus>> {
            let orders = self.orders.lock().await;
            Ok(orders
                .get(order_id)
                .filter(|o| o.restaurant_id == restaurant_id)
                .map(|o| o.status))
        }
    }

    const ALL_TRANSITIONS: [OrderTransition; 4] = [
        OrderTransition::Approve,
        OrderTransition::Dispatch,
        OrderTransition::Deliver,
        OrderTransition::Cancel,
    ];

    fn app_error(err: ServiceError) -> AppError {
        match err {
            ServiceError::App(e) => e,
            ServiceError::Db(e) => panic!("unexpected db error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_approve_pending_order() {
        let store = MemoryOrderStore::default();
        store.insert("order-1", "rest-1", OrderStatus::Pending).await;
        let before = store.get("order-1").await;

        apply_transition(&store, "order-1", "rest-1", OrderTransition::Approve)
            .await
            .unwrap();

        let after = store.get("order-1").await;
        assert_eq!(after.status, OrderStatus::Processing);
        // Nothing but the status moves
        assert_eq!(after.total_in_cents, before.total_in_cents);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.restaurant_id, before.restaurant_id);
    }

    #[tokio::test]
    async fn test_full_happy_path() {
        let store = MemoryOrderStore::default();
        store.insert("order-1", "rest-1", OrderStatus::Pending).await;

        for t in [
            OrderTransition::Approve,
            OrderTransition::Dispatch,
            OrderTransition::Deliver,
        ] {
            apply_transition(&store, "order-1", "rest-1", t).await.unwrap();
            assert_eq!(store.get("order-1").await.status, t.target());
        }
    }

    #[tokio::test]
    async fn test_approve_twice_reports_already_approved() {
        let store = MemoryOrderStore::default();
        store.insert("order-1", "rest-1", OrderStatus::Pending).await;

        apply_transition(&store, "order-1", "rest-1", OrderTransition::Approve)
            .await
            .unwrap();
        let err = app_error(
            apply_transition(&store, "order-1", "rest-1", OrderTransition::Approve)
                .await
                .unwrap_err(),
        );

        assert_eq!(err.code, ErrorCode::OrderInvalidState);
        assert_eq!(err.message, "Order was already approved before.");
        assert_eq!(err.details.unwrap()["status"], "processing");
    }

    #[tokio::test]
    async fn test_out_of_turn_never_mutates() {
        for start in OrderStatus::ALL {
            for t in ALL_TRANSITIONS {
                if t.allowed_from().contains(&start) {
                    continue;
                }
                let store = MemoryOrderStore::default();
                store.insert("order-1", "rest-1", start).await;

                let err = app_error(
                    apply_transition(&store, "order-1", "rest-1", t)
                        .await
                        .unwrap_err(),
                );

                assert_eq!(err.code, ErrorCode::OrderInvalidState, "{start} {t:?}");
                assert_eq!(store.get("order-1").await.status, start);
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_exit() {
        for start in [OrderStatus::Delivered, OrderStatus::Canceled] {
            for t in ALL_TRANSITIONS {
                assert!(!t.allowed_from().contains(&start));
            }
        }
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let store = MemoryOrderStore::default();
        store.insert("pending", "rest-1", OrderStatus::Pending).await;
        store.insert("processing", "rest-1", OrderStatus::Processing).await;
        store.insert("delivering", "rest-1", OrderStatus::Delivering).await;
        store.insert("canceled", "rest-1", OrderStatus::Canceled).await;

        apply_transition(&store, "pending", "rest-1", OrderTransition::Cancel)
            .await
            .unwrap();
        apply_transition(&store, "processing", "rest-1", OrderTransition::Cancel)
            .await
            .unwrap();

        let err = app_error(
            apply_transition(&store, "delivering", "rest-1", OrderTransition::Cancel)
                .await
                .unwrap_err(),
        );
        assert_eq!(err.message, "You cannot cancel orders after dispatch.");

        let err = app_error(
            apply_transition(&store, "canceled", "rest-1", OrderTransition::Cancel)
                .await
                .unwrap_err(),
        );
        assert_eq!(err.message, "Order was already canceled.");
    }

    #[tokio::test]
    async fn test_foreign_restaurant_never_succeeds() {
        for start in OrderStatus::ALL {
            for t in ALL_TRANSITIONS {
                let store = MemoryOrderStore::default();
                store.insert("order-1", "rest-1", start).await;

                let err = app_error(
                    apply_transition(&store, "order-1", "rest-2", t)
                        .await
                        .unwrap_err(),
                );

                assert_eq!(err.code, ErrorCode::NotAuthenticated);
                assert_eq!(store.get("order-1").await.status, start);
            }
        }
    }

    #[tokio::test]
    async fn test_missing_order_is_unauthorized() {
        let store = MemoryOrderStore::default();
        let err = app_error(
            apply_transition(&store, "nope", "rest-1", OrderTransition::Dispatch)
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_only_one_wins() {
        let store = Arc::new(MemoryOrderStore::default());
        store.insert("order-1", "rest-1", OrderStatus::Pending).await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    apply_transition(store.as_ref(), "order-1", "rest-1", OrderTransition::Approve)
                        .await
                })
            })
            .collect();

        let mut ok = 0;
        let mut invalid = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(()) => ok += 1,
                Err(e) => {
                    assert_eq!(app_error(e).code, ErrorCode::OrderInvalidState);
                    invalid += 1;
                }
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(invalid, 15);
        assert_eq!(store.get("order-1").await.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        struct BrokenStore;

        #[async_trait]
        impl OrderStore for BrokenStore {
            async fn update_status_if(
                &self,
                _: &str,
                _: &str,
                _: &[OrderStatus],
                _: OrderStatus,
            ) -> ServiceResult<bool> {
                Err(ServiceError::Db("pool timed out".into()))
            }

            async fn find_status(&self, _: &str, _: &str) -> ServiceResult<Option<OrderStatus>> {
                unreachable!()
            }
        }

        let err = apply_transition(&BrokenStore, "order-1", "rest-1", OrderTransition::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Db(_)));
    }
}
