use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::subscription::create_subscription,
        handlers::subscription::read_subscription,
        handlers::subscription::update_subscription,
        handlers::subscription::delete_subscription,
        handlers::subscription::list_subscriptions,
        handlers::subscription::sum_subscriptions,
    ),
    components(
        schemas(
            CreateSubscriptionRequest,
            UpdateSubscriptionRequest,
            SubscriptionResponse,
            IdResponse,
            ListSubscriptionsResponse,
            SumSubscriptionsResponse,
            MessageResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "subscription", description = "Subscription records and cost totals"),
    ),
    info(
        title = "Subscription Tracker API",
        version = "1.0.0",
        description = "Track user subscriptions and sum their cost over a period",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
