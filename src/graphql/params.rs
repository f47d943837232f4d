use async_graphql::InputObject;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::Order;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Clone, InputObject)]
pub struct CustomerFilter {
    pub name_icontains: Option<String>,
    pub email_icontains: Option<String>,
    /// Matches phones starting with this prefix, e.g. `+1`.
    pub phone_pattern: Option<String>,
}

#[derive(Debug, Default, Clone, InputObject)]
pub struct ProductFilter {
    pub name_icontains: Option<String>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub stock_gte: Option<i32>,
    pub stock_lte: Option<i32>,
    /// Only products whose stock is below the restock threshold.
    pub low_stock: Option<bool>,
}

#[derive(Debug, Default, Clone, InputObject)]
pub struct OrderFilter {
    pub total_amount_gte: Option<Decimal>,
    pub total_amount_lte: Option<Decimal>,
    pub order_date_gte: Option<DateTime<Utc>>,
    pub order_date_lte: Option<DateTime<Utc>>,
    pub customer_name_icontains: Option<String>,
    pub product_name_icontains: Option<String>,
    pub product_id: Option<Uuid>,
}

/// Resolves an `orderBy` argument such as `name` or `-price` against the
/// fields a listing allows. Both snake_case and camelCase names are accepted.
pub fn parse_ordering<C: Copy>(raw: &str, allowed: &[(&str, C)]) -> AppResult<(C, Order)> {
    let raw = raw.trim();
    let (field, order) = match raw.strip_prefix('-') {
        Some(field) => (field, Order::Desc),
        None => (raw, Order::Asc),
    };

    allowed
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| (*column, order))
        .ok_or_else(|| AppError::BadRequest(format!("Unknown ordering field: {raw}")))
}

/// Escapes `LIKE` metacharacters and wraps the term for a substring match.
pub fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Relay cursor arguments decoded to row offsets.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageRequest {
    pub after: Option<usize>,
    pub before: Option<usize>,
    pub first: Option<usize>,
    pub last: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageRequest {
    pub fn window(&self, total: usize) -> PageWindow {
        // Cursors come from clients; saturate so `usize::MAX` lands past the end.
        let mut start = self
            .after
            .map(|after| after.saturating_add(1))
            .unwrap_or(0)
            .min(total);
        let mut end = self.before.unwrap_or(total).min(total).max(start);

        if let Some(first) = self.first {
            end = end.min(start.saturating_add(first));
        }
        if let Some(last) = self.last {
            start = start.max(end.saturating_sub(last));
        }

        PageWindow {
            offset: start,
            limit: end - start,
            has_previous: start > 0,
            has_next: end < total,
        }
    }
}

/// A window of rows tagged with their absolute offsets.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<(usize, T)>,
    pub has_previous: bool,
    pub has_next: bool,
}
