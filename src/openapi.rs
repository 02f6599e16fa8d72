use crate::models::{HealthResponse, NewAccountRequest, NewComment, NewReport, OkResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::create_comment,
        crate::routes::create_account_request,
        crate::routes::create_report,
    ),
    components(schemas(NewComment, NewAccountRequest, NewReport, OkResponse, HealthResponse)),
    tags(
        (name = "dense", description = "Dense comment layer persistence"),
    )
)]
pub struct ApiDoc;
