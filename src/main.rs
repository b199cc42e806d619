use actix_web::{App, HttpServer, middleware::Logger, web};
use std::sync::Arc;

use subscription_tracker::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    logging::{self, ComponentLogger},
    middlewares::{RecoverPanic, create_cors},
    repositories::PgSubscriptionRepository,
    services::SubscriptionService,
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_toml().expect("Failed to load configuration file");

    let logger = logging::init(&config.logging);
    let app_log = ComponentLogger::new(logger.clone(), "subscription_tracker");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let repository = Arc::new(PgSubscriptionRepository::new(pool));
    let subscription_service = SubscriptionService::new(repository, logger.clone());

    app_log.info(format_args!(
        "Starting HTTP server at {}",
        config.bind_address()
    ));

    HttpServer::new(move || {
        App::new()
            .wrap(RecoverPanic::new(logger.clone()))
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(web::Data::new(subscription_service.clone()))
            .configure(swagger_config)
            .service(web::scope("/api/v1").configure(handlers::subscription_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
