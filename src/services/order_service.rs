use anyhow::anyhow;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    LoaderTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderPayload, CreateOrderRequest},
    entity::{
        customers::{Column as CustomerCol, Entity as Customers, Model as CustomerModel},
        order_products::{
            ActiveModel as OrderProductActive, Column as OrderProductCol,
            Entity as OrderProducts,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    graphql::params::{OrderFilter, Page, PageRequest, contains_pattern, parse_ordering},
    models::{Customer, Order, Product},
    validation::{EMPTY_PRODUCTS, INVALID_CUSTOMER, INVALID_PRODUCTS, order_total},
};

const ORDERING_FIELDS: [(&str, OrderCol); 5] = [
    ("id", OrderCol::Id),
    ("order_date", OrderCol::OrderDate),
    ("orderDate", OrderCol::OrderDate),
    ("total_amount", OrderCol::TotalAmount),
    ("totalAmount", OrderCol::TotalAmount),
];

pub async fn create_order(
    db: &DatabaseConnection,
    payload: CreateOrderRequest,
) -> AppResult<CreateOrderPayload> {
    let customer = match Uuid::parse_str(payload.customer_id.trim()) {
        Ok(id) => Customers::find_by_id(id).one(db).await?,
        Err(_) => None,
    };
    let customer = match customer {
        Some(c) => c,
        None => return Ok(order_failed(vec![INVALID_CUSTOMER.into()])),
    };

    let mut errors: Vec<String> = Vec::new();
    if payload.product_ids.is_empty() {
        errors.push(EMPTY_PRODUCTS.into());
    }

    // Any unparsable id already makes the set invalid, so skip the lookup.
    let parsed: Option<Vec<Uuid>> = payload
        .product_ids
        .iter()
        .map(|id| Uuid::parse_str(id.trim()).ok())
        .collect();
    let products = match parsed {
        Some(ids) if !ids.is_empty() => {
            Products::find()
                .filter(ProdCol::Id.is_in(ids))
                .all(db)
                .await?
        }
        _ => Vec::new(),
    };
    if products.len() != payload.product_ids.len() {
        errors.push(INVALID_PRODUCTS.into());
    }

    if !errors.is_empty() {
        return Ok(order_failed(errors));
    }

    let total_amount = order_total(products.iter().map(|p| &p.price));
    let order_date = payload.order_date.unwrap_or_else(Utc::now);

    let txn = db.begin().await?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.id),
        order_date: Set(order_date.into()),
        total_amount: Set(total_amount),
    }
    .insert(&txn)
    .await?;

    OrderProducts::insert_many(products.iter().map(|p| OrderProductActive {
        order_id: Set(order.id),
        product_id: Set(p.id),
    }))
    .exec_without_returning(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        customer_id = %customer.id,
        products = products.len(),
        total_amount = %order.total_amount,
        "order created"
    );

    Ok(CreateOrderPayload {
        order: Some(order_from_entity(order, customer, products)),
        errors: Vec::new(),
    })
}

/// Flat listing; orders come back with customer and products attached.
pub async fn all_orders(
    db: &DatabaseConnection,
    filter: Option<OrderFilter>,
) -> AppResult<Vec<Order>> {
    let orders = Orders::find()
        .filter(order_condition(&filter.unwrap_or_default()))
        .order_by_desc(OrderCol::OrderDate)
        .order_by_asc(OrderCol::Id)
        .all(db)
        .await?;
    load_orders(db, orders).await
}

pub async fn list_orders(
    db: &DatabaseConnection,
    filter: Option<OrderFilter>,
    order_by: Option<&str>,
    page: PageRequest,
) -> AppResult<Page<Order>> {
    let mut finder = Orders::find().filter(order_condition(&filter.unwrap_or_default()));
    finder = match order_by.filter(|s| !s.trim().is_empty()) {
        Some(raw) => {
            let (column, order) = parse_ordering(raw, &ORDERING_FIELDS)?;
            finder.order_by(column, order)
        }
        None => finder.order_by_desc(OrderCol::OrderDate),
    };
    finder = finder.order_by_asc(OrderCol::Id);

    let total = finder.clone().count(db).await? as usize;
    let window = page.window(total);

    let orders = finder
        .offset(window.offset as u64)
        .limit(window.limit as u64)
        .all(db)
        .await?;

    let items = load_orders(db, orders)
        .await?
        .into_iter()
        .enumerate()
        .map(|(i, order)| (window.offset + i, order))
        .collect();

    Ok(Page {
        items,
        has_previous: window.has_previous,
        has_next: window.has_next,
    })
}

/// Attaches customers and products with one query per relation.
async fn load_orders<C: ConnectionTrait>(conn: &C, orders: Vec<OrderModel>) -> AppResult<Vec<Order>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let customers = orders.load_one(Customers, conn).await?;
    let products = orders
        .load_many_to_many(Products, OrderProducts, conn)
        .await?;

    orders
        .into_iter()
        .zip(customers)
        .zip(products)
        .map(|((order, customer), products)| {
            let customer = customer
                .ok_or_else(|| AppError::Internal(anyhow!("order {} has no customer", order.id)))?;
            Ok(order_from_entity(order, customer, products))
        })
        .collect()
}

fn order_condition(filter: &OrderFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(min) = filter.total_amount_gte {
        condition = condition.add(OrderCol::TotalAmount.gte(min));
    }
    if let Some(max) = filter.total_amount_lte {
        condition = condition.add(OrderCol::TotalAmount.lte(max));
    }
    if let Some(from) = filter.order_date_gte {
        condition = condition.add(OrderCol::OrderDate.gte(from));
    }
    if let Some(to) = filter.order_date_lte {
        condition = condition.add(OrderCol::OrderDate.lte(to));
    }
    if let Some(name) = filter.customer_name_icontains.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            OrderCol::CustomerId.in_subquery(
                Query::select()
                    .column(CustomerCol::Id)
                    .from(Customers)
                    .and_where(Expr::col(CustomerCol::Name).ilike(contains_pattern(name)))
                    .to_owned(),
            ),
        );
    }
    if let Some(name) = filter.product_name_icontains.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            OrderCol::Id.in_subquery(
                Query::select()
                    .column((OrderProducts, OrderProductCol::OrderId))
                    .from(OrderProducts)
                    .inner_join(
                        Products,
                        Expr::col((Products, ProdCol::Id))
                            .equals((OrderProducts, OrderProductCol::ProductId)),
                    )
                    .and_where(Expr::col((Products, ProdCol::Name)).ilike(contains_pattern(name)))
                    .to_owned(),
            ),
        );
    }
    if let Some(product_id) = filter.product_id {
        condition = condition.add(
            OrderCol::Id.in_subquery(
                Query::select()
                    .column(OrderProductCol::OrderId)
                    .from(OrderProducts)
                    .and_where(OrderProductCol::ProductId.eq(product_id))
                    .to_owned(),
            ),
        );
    }

    condition
}

fn order_from_entity(
    model: OrderModel,
    customer: CustomerModel,
    products: Vec<ProductModel>,
) -> Order {
    let mut products: Vec<Product> = products.into_iter().map(Product::from).collect();
    products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    Order {
        id: model.id,
        customer: Customer::from(customer),
        products,
        order_date: model.order_date.with_timezone(&Utc),
        total_amount: model.total_amount,
    }
}

fn order_failed(errors: Vec<String>) -> CreateOrderPayload {
    CreateOrderPayload {
        order: None,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("decimal")
    }

    fn customer() -> CustomerModel {
        CustomerModel {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            phone: None,
            created_at: Utc::now().into(),
        }
    }

    fn product(name: &str, price: &str) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            name: name.into(),
            price: dec(price),
            stock: 3,
            created_at: Utc::now().into(),
        }
    }

    fn request(customer_id: String, product_ids: Vec<String>) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id,
            product_ids,
            order_date: None,
        }
    }

    #[tokio::test]
    async fn unknown_customer_is_rejected_first() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<CustomerModel>::new()])
            .into_connection();

        let payload = create_order(&db, request(Uuid::new_v4().to_string(), Vec::new()))
            .await
            .expect("create order");

        assert!(payload.order.is_none());
        assert_eq!(payload.errors, vec![INVALID_CUSTOMER.to_string()]);
    }

    #[tokio::test]
    async fn malformed_customer_id_skips_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let payload = create_order(&db, request("not-a-uuid".into(), vec!["x".into()]))
            .await
            .expect("create order");

        assert_eq!(payload.errors, vec![INVALID_CUSTOMER.to_string()]);
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn empty_product_list_is_rejected() {
        let alice = customer();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![alice.clone()]])
            .into_connection();

        let payload = create_order(&db, request(alice.id.to_string(), Vec::new()))
            .await
            .expect("create order");

        assert!(payload.order.is_none());
        assert_eq!(payload.errors, vec![EMPTY_PRODUCTS.to_string()]);
    }

    #[tokio::test]
    async fn unresolved_product_is_rejected() {
        let alice = customer();
        let known = product("Laptop", "10.00");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![alice.clone()]])
            .append_query_results([vec![known.clone()]])
            .into_connection();

        let payload = create_order(
            &db,
            request(
                alice.id.to_string(),
                vec![known.id.to_string(), Uuid::new_v4().to_string()],
            ),
        )
        .await
        .expect("create order");

        assert_eq!(payload.errors, vec![INVALID_PRODUCTS.to_string()]);
    }

    #[tokio::test]
    async fn total_is_sum_of_current_prices() {
        let alice = customer();
        let mouse = product("Mouse", "10.00");
        let keyboard = product("Keyboard", "15.00");
        let stored = OrderModel {
            id: Uuid::new_v4(),
            customer_id: alice.id,
            order_date: Utc::now().into(),
            total_amount: dec("25.00"),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![alice.clone()]])
            .append_query_results([vec![mouse.clone(), keyboard.clone()]])
            .append_query_results([vec![stored.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();

        let payload = create_order(
            &db,
            request(
                alice.id.to_string(),
                vec![mouse.id.to_string(), keyboard.id.to_string()],
            ),
        )
        .await
        .expect("create order");

        assert!(payload.errors.is_empty());
        let order = payload.order.expect("order returned");
        assert_eq!(order.total_amount, dec("25.00"));
        assert_eq!(order.customer.email, "alice@example.com");
        let names: Vec<&str> = order.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Keyboard", "Mouse"]);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("25.00"), "insert should carry the computed total");
    }
}
