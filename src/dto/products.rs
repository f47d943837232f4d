use async_graphql::SimpleObject;
use rust_decimal::Decimal;

use crate::models::Product;

#[derive(Debug, Clone)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, SimpleObject)]
pub struct CreateProductPayload {
    pub product: Option<Product>,
    pub errors: Vec<String>,
}

#[derive(Debug, SimpleObject)]
pub struct UpdateLowStockPayload {
    pub updated_products: Vec<Product>,
    pub message: String,
}
