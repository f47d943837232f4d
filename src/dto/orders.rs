use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};

use crate::models::Order;

/// Raw ids as received; parsing failures surface as validation errors.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub product_ids: Vec<String>,
    pub order_date: Option<DateTime<Utc>>,
}

#[derive(Debug, SimpleObject)]
pub struct CreateOrderPayload {
    pub order: Option<Order>,
    pub errors: Vec<String>,
}
