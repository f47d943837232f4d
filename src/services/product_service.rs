use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductPayload, CreateProductRequest, UpdateLowStockPayload},
    entity::products::{ActiveModel, Column, Entity as Products},
    error::AppResult,
    graphql::params::{Page, PageRequest, ProductFilter, contains_pattern, parse_ordering},
    models::Product,
    validation::{
        LOW_STOCK_THRESHOLD, RESTOCK_AMOUNT, normalize_price, validate_name, validate_product,
    },
};

const ORDERING_FIELDS: [(&str, Column); 6] = [
    ("id", Column::Id),
    ("name", Column::Name),
    ("price", Column::Price),
    ("stock", Column::Stock),
    ("created_at", Column::CreatedAt),
    ("createdAt", Column::CreatedAt),
];

pub async fn create_product(
    db: &DatabaseConnection,
    payload: CreateProductRequest,
) -> AppResult<CreateProductPayload> {
    let price = normalize_price(payload.price);
    let mut errors = validate_product(price, payload.stock);
    if let Err(msg) = validate_name(&payload.name) {
        errors.push(msg.into());
    }

    if !errors.is_empty() {
        return Ok(CreateProductPayload {
            product: None,
            errors,
        });
    }

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        price: Set(price),
        stock: Set(payload.stock),
        created_at: NotSet,
    }
    .insert(db)
    .await?;

    tracing::info!(product_id = %product.id, price = %product.price, "product created");

    Ok(CreateProductPayload {
        product: Some(product.into()),
        errors: Vec::new(),
    })
}

/// Adds a fixed amount of stock to every product under the threshold.
pub async fn restock_low_stock(db: &DatabaseConnection) -> AppResult<UpdateLowStockPayload> {
    let txn = db.begin().await?;

    let low = Products::find()
        .filter(Column::Stock.lt(LOW_STOCK_THRESHOLD))
        .order_by_asc(Column::Name)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    let mut updated_products = Vec::with_capacity(low.len());
    for product in low {
        let new_stock = product.stock + RESTOCK_AMOUNT;
        let mut active: ActiveModel = product.into();
        active.stock = Set(new_stock);
        let updated = active.update(&txn).await?;
        updated_products.push(Product::from(updated));
    }

    txn.commit().await?;

    tracing::info!(restocked = updated_products.len(), "low-stock products restocked");

    let message = format!("Restocked {} low-stock products.", updated_products.len());
    Ok(UpdateLowStockPayload {
        updated_products,
        message,
    })
}

pub async fn all_products(db: &DatabaseConnection) -> AppResult<Vec<Product>> {
    let products = Products::find()
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(products)
}

pub async fn list_products(
    db: &DatabaseConnection,
    filter: Option<ProductFilter>,
    order_by: Option<&str>,
    page: PageRequest,
) -> AppResult<Page<Product>> {
    let mut finder = Products::find().filter(product_condition(&filter.unwrap_or_default()));
    finder = match order_by.filter(|s| !s.trim().is_empty()) {
        Some(raw) => {
            let (column, order) = parse_ordering(raw, &ORDERING_FIELDS)?;
            finder.order_by(column, order)
        }
        None => finder.order_by_asc(Column::CreatedAt),
    };
    finder = finder.order_by_asc(Column::Id);

    let total = finder.clone().count(db).await? as usize;
    let window = page.window(total);

    let items = finder
        .offset(window.offset as u64)
        .limit(window.limit as u64)
        .all(db)
        .await?
        .into_iter()
        .enumerate()
        .map(|(i, model)| (window.offset + i, Product::from(model)))
        .collect();

    Ok(Page {
        items,
        has_previous: window.has_previous,
        has_next: window.has_next,
    })
}

fn product_condition(filter: &ProductFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(name) = filter.name_icontains.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Name).ilike(contains_pattern(name)));
    }
    if let Some(min_price) = filter.price_gte {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = filter.price_lte {
        condition = condition.add(Column::Price.lte(max_price));
    }
    if let Some(min_stock) = filter.stock_gte {
        condition = condition.add(Column::Stock.gte(min_stock));
    }
    if let Some(max_stock) = filter.stock_lte {
        condition = condition.add(Column::Stock.lte(max_stock));
    }
    if filter.low_stock == Some(true) {
        condition = condition.add(Column::Stock.lt(LOW_STOCK_THRESHOLD));
    }

    condition
}
