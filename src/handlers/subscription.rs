use crate::error::AppError;
use crate::models::*;
use crate::services::SubscriptionService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/create",
    tag = "subscription",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription created", body = IdResponse),
        (status = 400, description = "Malformed JSON body", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn create_subscription(
    subscription_service: web::Data<SubscriptionService>,
    request: web::Json<CreateSubscriptionRequest>,
) -> Result<HttpResponse> {
    match subscription_service.create(request.into_inner()).await {
        Ok(id) => Ok(HttpResponse::Ok().json(IdResponse { id: id.to_string() })),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/read/{id}",
    tag = "subscription",
    params(("id" = String, Path, description = "Subscription id")),
    responses(
        (status = 200, description = "Subscription found", body = SubscriptionResponse),
        (status = 404, description = "Subscription id not found", body = ErrorResponse)
    )
)]
pub async fn read_subscription(
    subscription_service: web::Data<SubscriptionService>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    match subscription_service.read(&id).await {
        Ok(sub) => Ok(HttpResponse::Ok().json(sub)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/update/{id}",
    tag = "subscription",
    params(("id" = String, Path, description = "Subscription id")),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = MessageResponse),
        (status = 400, description = "Malformed JSON body", body = ErrorResponse),
        (status = 404, description = "Subscription id not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn update_subscription(
    subscription_service: web::Data<SubscriptionService>,
    id: web::Path<String>,
    request: web::Json<UpdateSubscriptionRequest>,
) -> Result<HttpResponse> {
    match subscription_service.update(&id, request.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(MessageResponse::new("Updated"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    tag = "subscription",
    params(("id" = String, Path, description = "Subscription id")),
    responses(
        (status = 200, description = "Subscription deleted", body = MessageResponse),
        (status = 404, description = "Subscription id not found", body = ErrorResponse)
    )
)]
pub async fn delete_subscription(
    subscription_service: web::Data<SubscriptionService>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    match subscription_service.delete(&id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(MessageResponse::new("Deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/list/{user_id}",
    tag = "subscription",
    params(("user_id" = String, Path, description = "Owning user")),
    responses(
        (status = 200, description = "Subscriptions of the user", body = ListSubscriptionsResponse),
        (status = 404, description = "User id not found", body = ErrorResponse)
    )
)]
pub async fn list_subscriptions(
    subscription_service: web::Data<SubscriptionService>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    match subscription_service.list_by_user(&user_id).await {
        Ok(subscriptions) => {
            Ok(HttpResponse::Ok().json(ListSubscriptionsResponse { subscriptions }))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/sum",
    tag = "subscription",
    params(SumQuery),
    responses(
        (status = 200, description = "Total cost in the window", body = SumSubscriptionsResponse),
        (status = 404, description = "User id not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn sum_subscriptions(
    subscription_service: web::Data<SubscriptionService>,
    query: web::Query<SumQuery>,
) -> Result<HttpResponse> {
    match subscription_service.sum_costs(query.into_inner()).await {
        Ok(sum) => Ok(HttpResponse::Ok().json(SumSubscriptionsResponse { sum })),
        Err(e) => Ok(e.error_response()),
    }
}

async fn method_not_allowed() -> HttpResponse {
    AppError::MethodNotAllowed.error_response()
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::resource("/create")
                .route(web::post().to(create_subscription))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/read/{id}")
                .route(web::get().to(read_subscription))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/update/{id}")
                .route(web::put().to(update_subscription))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/delete/{id}")
                .route(web::delete().to(delete_subscription))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/list/{user_id}")
                .route(web::get().to(list_subscriptions))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/sum")
                .route(web::get().to(sum_subscriptions))
                .default_service(web::to(method_not_allowed)),
        );
}
