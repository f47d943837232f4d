use std::str::FromStr;

use crm_graphql::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    entity::{customers, products},
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

const CUSTOMERS: [(&str, &str, &str); 2] = [
    ("Alice", "alice@example.com", "+1234567890"),
    ("Bob", "bob@example.com", "123-456-7890"),
];

const PRODUCTS: [(&str, &str, i32); 2] = [("Laptop", "999.99", 5), ("Phone", "499.99", 10)];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let orm = orm_from_pool(pool);

    for (name, email, phone) in CUSTOMERS {
        ensure_customer(&orm, name, email, phone).await?;
    }
    for (name, price, stock) in PRODUCTS {
        ensure_product(&orm, name, Decimal::from_str(price)?, stock).await?;
    }

    println!("Database seeded successfully!");
    Ok(())
}

async fn ensure_customer(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    phone: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = customers::Entity::find()
        .filter(customers::Column::Email.eq(email))
        .one(db)
        .await?
    {
        return Ok(existing.id);
    }

    let created = customers::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set(Some(phone.to_string())),
        created_at: NotSet,
    }
    .insert(db)
    .await?;

    println!("Created customer {email}");
    Ok(created.id)
}

async fn ensure_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    stock: i32,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = products::Entity::find()
        .filter(products::Column::Name.eq(name))
        .one(db)
        .await?
    {
        return Ok(existing.id);
    }

    let created = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        price: Set(price),
        stock: Set(stock),
        created_at: NotSet,
    }
    .insert(db)
    .await?;

    println!("Created product {name} ({price}, stock {stock})");
    Ok(created.id)
}
