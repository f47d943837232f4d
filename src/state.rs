use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::graphql::{CrmSchema, build_schema};

#[derive(Clone)]
pub struct AppState {
    pub orm: Arc<DatabaseConnection>,
    pub schema: CrmSchema,
}

impl AppState {
    pub fn new(orm: DatabaseConnection) -> Self {
        let orm = Arc::new(orm);
        let schema = build_schema(orm.clone());
        Self { orm, schema }
    }
}
