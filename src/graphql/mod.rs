use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, Schema};
use sea_orm::DatabaseConnection;

pub mod mutation;
pub mod params;
pub mod query;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type CrmSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

const MAX_QUERY_DEPTH: usize = 12;

/// Builds the executable schema; resolvers read the connection from context data.
pub fn build_schema(db: Arc<DatabaseConnection>) -> CrmSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .limit_depth(MAX_QUERY_DEPTH)
        .finish()
}

pub(crate) fn database<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a DatabaseConnection> {
    Ok(ctx.data::<Arc<DatabaseConnection>>()?.as_ref())
}
