use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::customers::{BulkCreateCustomersPayload, CreateCustomerPayload, CustomerInput},
    entity::customers::{ActiveModel, Column, Entity as Customers, Model as CustomerModel},
    error::AppResult,
    graphql::params::{CustomerFilter, Page, PageRequest, contains_pattern, parse_ordering},
    models::Customer,
    validation::{
        EMAIL_EXISTS, normalize_phone, validate_email, validate_name, validate_phone,
    },
};

const ORDERING_FIELDS: [(&str, Column); 6] = [
    ("id", Column::Id),
    ("name", Column::Name),
    ("email", Column::Email),
    ("phone", Column::Phone),
    ("created_at", Column::CreatedAt),
    ("createdAt", Column::CreatedAt),
];

pub async fn create_customer(
    db: &DatabaseConnection,
    input: CustomerInput,
) -> AppResult<CreateCustomerPayload> {
    let phone = normalize_phone(input.phone);
    let mut errors: Vec<String> = Vec::new();

    if let Err(msg) = validate_name(&input.name) {
        errors.push(msg.into());
    }
    match validate_email(&input.email) {
        Ok(()) => {
            if email_exists(db, &input.email).await? {
                errors.push(EMAIL_EXISTS.into());
            }
        }
        Err(msg) => errors.push(msg.into()),
    }
    if let Err(msg) = validate_phone(phone.as_deref()) {
        errors.push(msg.into());
    }

    if !errors.is_empty() {
        return Ok(creation_failed(errors));
    }

    match insert_customer(db, input.name, input.email, phone).await {
        Ok(model) => {
            tracing::info!(customer_id = %model.id, "customer created");
            Ok(CreateCustomerPayload {
                customer: Some(model.into()),
                message: "Customer created successfully!".into(),
                errors: Vec::new(),
            })
        }
        Err(err) if is_unique_violation(&err) => Ok(creation_failed(vec![EMAIL_EXISTS.into()])),
        Err(err) => Err(err.into()),
    }
}

/// Creates every valid entry inside one transaction. Invalid entries are
/// reported and skipped; each insert runs in its own savepoint so a late
/// constraint failure does not poison the rest of the batch.
pub async fn bulk_create_customers(
    db: &DatabaseConnection,
    inputs: Vec<CustomerInput>,
) -> AppResult<BulkCreateCustomersPayload> {
    let txn = db.begin().await?;
    let mut customers = Vec::new();
    let mut errors = Vec::new();
    let mut batch_emails = HashSet::new();

    for input in inputs {
        let phone = normalize_phone(input.phone);

        if batch_emails.contains(&input.email) || email_exists(&txn, &input.email).await? {
            errors.push(format!("Email already exists: {}", input.email));
            continue;
        }
        if validate_email(&input.email).is_err() {
            errors.push(format!("Invalid email for {}: {}", input.name, input.email));
            continue;
        }
        if let Some(p) = phone.as_deref() {
            if validate_phone(Some(p)).is_err() {
                errors.push(format!("Invalid phone for {}: {}", input.name, p));
                continue;
            }
        }
        if validate_name(&input.name).is_err() {
            errors.push(format!(
                "Invalid name for {}: must be at most 100 characters",
                input.email
            ));
            continue;
        }

        let email = input.email.clone();
        match insert_in_savepoint(&txn, input.name, input.email, phone, is_unique_violation).await? {
            Some(model) => {
                batch_emails.insert(email);
                customers.push(Customer::from(model));
            }
            None => errors.push(format!("Email already exists: {email}")),
        }
    }

    txn.commit().await?;
    tracing::info!(
        created = customers.len(),
        rejected = errors.len(),
        "bulk customer creation finished"
    );

    Ok(BulkCreateCustomersPayload { customers, errors })
}

pub async fn all_customers(db: &DatabaseConnection) -> AppResult<Vec<Customer>> {
    let customers = Customers::find()
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Customer::from)
        .collect();
    Ok(customers)
}

pub async fn list_customers(
    db: &DatabaseConnection,
    filter: Option<CustomerFilter>,
    order_by: Option<&str>,
    page: PageRequest,
) -> AppResult<Page<Customer>> {
    let mut finder = Customers::find().filter(customer_condition(&filter.unwrap_or_default()));
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
        .map(|(i, model)| (window.offset + i, Customer::from(model)))
        .collect();

    Ok(Page {
        items,
        has_previous: window.has_previous,
        has_next: window.has_next,
    })
}

fn customer_condition(filter: &CustomerFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(name) = filter.name_icontains.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Name).ilike(contains_pattern(name)));
    }
    if let Some(email) = filter.email_icontains.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Email).ilike(contains_pattern(email)));
    }
    if let Some(prefix) = filter.phone_pattern.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Phone.starts_with(prefix));
    }
    condition
}

async fn email_exists<C: ConnectionTrait>(conn: &C, email: &str) -> Result<bool, DbErr> {
    let existing = Customers::find()
        .filter(Column::Email.eq(email))
        .one(conn)
        .await?;
    Ok(existing.is_some())
}

async fn insert_customer<C: ConnectionTrait>(
    conn: &C,
    name: String,
    email: String,
    phone: Option<String>,
) -> Result<CustomerModel, DbErr> {
    ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        phone: Set(phone),
        created_at: NotSet,
    }
    .insert(conn)
    .await
}

/// Inserts inside a savepoint. A failure matching `is_duplicate` rolls back
/// only this row and yields `None`; any other failure is returned.
async fn insert_in_savepoint(
    txn: &DatabaseTransaction,
    name: String,
    email: String,
    phone: Option<String>,
    is_duplicate: fn(&DbErr) -> bool,
) -> Result<Option<CustomerModel>, DbErr> {
    let savepoint = txn.begin().await?;
    match insert_customer(&savepoint, name, email, phone).await {
        Ok(model) => {
            savepoint.commit().await?;
            Ok(Some(model))
        }
        Err(err) if is_duplicate(&err) => {
            savepoint.rollback().await?;
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn creation_failed(errors: Vec<String>) -> CreateCustomerPayload {
    CreateCustomerPayload {
        customer: None,
        message: "Customer creation failed.".into(),
        errors,
    }
}
