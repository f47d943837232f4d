use async_graphql::{Context, ErrorExtensions, ID, Object, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    dto::{
        customers::{BulkCreateCustomersPayload, CreateCustomerPayload, CustomerInput},
        orders::{CreateOrderPayload, CreateOrderRequest},
        products::{CreateProductPayload, CreateProductRequest, UpdateLowStockPayload},
    },
    graphql::database,
    services::{customer_service, order_service, product_service},
};

/// Validation failures come back in each payload's `errors` list; only
/// unexpected failures become GraphQL errors.
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_customer(
        &self,
        ctx: &Context<'_>,
        name: String,
        email: String,
        phone: Option<String>,
    ) -> Result<CreateCustomerPayload> {
        let db = database(ctx)?;
        customer_service::create_customer(db, CustomerInput { name, email, phone })
            .await
            .map_err(|e| e.extend())
    }

    async fn bulk_create_customers(
        &self,
        ctx: &Context<'_>,
        input: Vec<CustomerInput>,
    ) -> Result<BulkCreateCustomersPayload> {
        let db = database(ctx)?;
        customer_service::bulk_create_customers(db, input)
            .await
            .map_err(|e| e.extend())
    }

    async fn create_product(
        &self,
        ctx: &Context<'_>,
        name: String,
        price: Decimal,
        #[graphql(default = 0)] stock: i32,
    ) -> Result<CreateProductPayload> {
        let db = database(ctx)?;
        product_service::create_product(db, CreateProductRequest { name, price, stock })
            .await
            .map_err(|e| e.extend())
    }

    async fn create_order(
        &self,
        ctx: &Context<'_>,
        customer_id: ID,
        product_ids: Vec<ID>,
        order_date: Option<DateTime<Utc>>,
    ) -> Result<CreateOrderPayload> {
        let db = database(ctx)?;
        let payload = CreateOrderRequest {
            customer_id: customer_id.0,
            product_ids: product_ids.into_iter().map(|id| id.0).collect(),
            order_date,
        };
        order_service::create_order(db, payload)
            .await
            .map_err(|e| e.extend())
    }

    /// Restocks every product below the low-stock threshold.
    async fn update_low_stock_products(
        &self,
        ctx: &Context<'_>,
    ) -> Result<UpdateLowStockPayload> {
        let db = database(ctx)?;
        product_service::restock_low_stock(db)
            .await
            .map_err(|e| e.extend())
    }
}
