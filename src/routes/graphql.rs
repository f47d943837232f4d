use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{extract::State, response::Html};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Shape of a GraphQL-over-HTTP request body, for the API docs.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequestBody {
    pub query: String,
    pub operation_name: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub variables: Option<serde_json::Value>,
}

#[utoipa::path(
    post,
    path = "/graphql",
    request_body = GraphqlRequestBody,
    responses(
        (status = 200, description = "GraphQL response with `data` and `errors`"),
    ),
    tag = "GraphQL"
)]
pub async fn graphql_handler(State(state): State<AppState>, req: GraphQLRequest) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

#[utoipa::path(
    get,
    path = "/graphql",
    responses(
        (status = 200, description = "GraphiQL playground", content_type = "text/html"),
    ),
    tag = "GraphQL"
)]
pub async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
