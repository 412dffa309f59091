//! OpenAPI document for the status API.

use utoipa::OpenApi;

use crate::api::dto::{StatusResponse, SubscriberSummary};
use crate::api::handlers::system::HealthResponse;
use crate::domain::FeedCategory;
use crate::error::{ErrorBody, ErrorResponse};
use crate::service::CycleReport;

/// Generated OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "worldstate-notifier status API",
        description = "Read-only view of the poll loop and subscriber counts"
    ),
    paths(
        crate::api::handlers::system::health_handler,
        crate::api::handlers::status::status_handler,
        crate::api::handlers::status::subscriber_summary_handler,
    ),
    components(schemas(
        HealthResponse,
        StatusResponse,
        CycleReport,
        FeedCategory,
        SubscriberSummary,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Status", description = "Poll loop and subscribers"),
    )
)]
pub struct ApiDoc;
