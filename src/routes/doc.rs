use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    response::ApiResponse,
    routes::{graphql, health},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        graphql::graphql_handler,
        graphql::graphiql
    ),
    components(
        schemas(
            health::HealthData,
            graphql::GraphqlRequestBody,
            ApiResponse<health::HealthData>
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness endpoints"),
        (name = "GraphQL", description = "CRM GraphQL endpoint; see the GraphiQL playground for the schema"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
