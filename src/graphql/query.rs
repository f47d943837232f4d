use async_graphql::connection::{Connection, Edge, query};
use async_graphql::{Context, ErrorExtensions, Object, OutputType, Result};

use crate::{
    graphql::database,
    graphql::params::{CustomerFilter, OrderFilter, Page, PageRequest, ProductFilter},
    models::{Customer, Order, Product},
    services::{customer_service, order_service, product_service},
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Liveness probe used by the heartbeat job.
    async fn hello(&self) -> &'static str {
        "Hello, GraphQL!"
    }

    async fn customers(&self, ctx: &Context<'_>) -> Result<Vec<Customer>> {
        let db = database(ctx)?;
        customer_service::all_customers(db)
            .await
            .map_err(|e| e.extend())
    }

    async fn products(&self, ctx: &Context<'_>) -> Result<Vec<Product>> {
        let db = database(ctx)?;
        product_service::all_products(db)
            .await
            .map_err(|e| e.extend())
    }

    async fn orders(&self, ctx: &Context<'_>, filter: Option<OrderFilter>) -> Result<Vec<Order>> {
        let db = database(ctx)?;
        order_service::all_orders(db, filter)
            .await
            .map_err(|e| e.extend())
    }

    #[allow(clippy::too_many_arguments)]
    async fn all_customers(
        &self,
        ctx: &Context<'_>,
        filter: Option<CustomerFilter>,
        order_by: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<Connection<usize, Customer>> {
        let db = database(ctx)?;
        query(after, before, first, last, |after, before, first, last| async move {
            let page = PageRequest {
                after,
                before,
                first,
                last,
            };
            let page = customer_service::list_customers(db, filter, order_by.as_deref(), page)
                .await
                .map_err(|e| e.extend())?;
            Ok::<_, async_graphql::Error>(into_connection(page))
        })
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn all_products(
        &self,
        ctx: &Context<'_>,
        filter: Option<ProductFilter>,
        order_by: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<Connection<usize, Product>> {
        let db = database(ctx)?;
        query(after, before, first, last, |after, before, first, last| async move {
            let page = PageRequest {
                after,
                before,
                first,
                last,
            };
            let page = product_service::list_products(db, filter, order_by.as_deref(), page)
                .await
                .map_err(|e| e.extend())?;
            Ok::<_, async_graphql::Error>(into_connection(page))
        })
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn all_orders(
        &self,
        ctx: &Context<'_>,
        filter: Option<OrderFilter>,
        order_by: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<Connection<usize, Order>> {
        let db = database(ctx)?;
        query(after, before, first, last, |after, before, first, last| async move {
            let page = PageRequest {
                after,
                before,
                first,
                last,
            };
            let page = order_service::list_orders(db, filter, order_by.as_deref(), page)
                .await
                .map_err(|e| e.extend())?;
            Ok::<_, async_graphql::Error>(into_connection(page))
        })
        .await
    }
}

fn into_connection<T: OutputType>(page: Page<T>) -> Connection<usize, T> {
    let mut connection = Connection::new(page.has_previous, page.has_next);
    connection.edges.extend(
        page.items
            .into_iter()
            .map(|(cursor, node)| Edge::new(cursor, node)),
    );
    connection
}
