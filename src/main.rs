mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use crate::db::db::DBClient;
use service::{
    carryover_service::CarryOverService,
    clock::{Clock, SystemClock},
    media_service::{FileStore, HttpFileStore, MediaService},
    notification_service::NotificationService,
    pause_service::PauseService,
    performance_service::PerformanceService,
    rating_service::RatingService,
    review_service::ReviewService,
    tracking_service::TrackingService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub clock: Arc<dyn Clock>,
    // Services
    pub tracking_service: Arc<TrackingService>,
    pub pause_service: Arc<PauseService>,
    pub carryover_service: Arc<CarryOverService>,
    pub rating_service: Arc<RatingService>,
    pub review_service: Arc<ReviewService>,
    pub performance_service: Arc<PerformanceService>,
    pub notification_service: Arc<NotificationService>,
    pub media_service: Arc<MediaService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let file_store: Arc<dyn FileStore> =
            Arc::new(HttpFileStore::new(config.file_service_url.clone()));

        let notification_service = Arc::new(NotificationService::new(
            db_client_arc.clone(),
            config.notify_push_url.clone(),
        ));

        let tracking_service = Arc::new(TrackingService::new(
            db_client_arc.clone(),
            notification_service.clone(),
            file_store.clone(),
            clock.clone(),
        ));

        let pause_service = Arc::new(PauseService::new(
            db_client_arc.clone(),
            notification_service.clone(),
            clock.clone(),
        ));

        let carryover_service = Arc::new(CarryOverService::new(
            db_client_arc.clone(),
            notification_service.clone(),
            file_store.clone(),
            clock.clone(),
            config.carry_over_limit,
        ));

        let rating_service = Arc::new(RatingService::new(
            db_client_arc.clone(),
            notification_service.clone(),
            file_store,
        ));

        let review_service = Arc::new(ReviewService::new(db_client_arc.clone(), clock.clone()));
        let performance_service = Arc::new(PerformanceService::new(db_client_arc.clone()));
        let media_service = Arc::new(MediaService::new(db_client_arc.clone()));

        Self {
            env: config,
            db_client: db_client_arc,
            clock,
            tracking_service,
            pause_service,
            carryover_service,
            rating_service,
            review_service,
            performance_service,
            notification_service,
            media_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connection to the database is successful");

            // Background task to keep an eye on pool saturation.
            let pool_for_monitoring = pool.clone();
            tokio::spawn(async move {
                let max_connections = 20;
                let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
                loop {
                    interval.tick().await;
                    let size = pool_for_monitoring.size();
                    let idle = pool_for_monitoring.num_idle();
                    tracing::debug!(
                        "Pool status - active: {}, idle: {}, total: {}",
                        size - idle as u32,
                        idle,
                        size
                    );
                    if size >= max_connections * 8 / 10 {
                        tracing::warn!("Connection pool at 80% capacity");
                    }
                }
            });

            pool
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST]);

    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    let app = create_router(app_state.clone()).layer(cors);

    tracing::info!("Server is running on http://localhost:{}", config.port);

    // Background jobs
    let app_state_clone = app_state.clone();
    tokio::spawn(async move {
        service::background_jobs::start_auto_flag_sweep(app_state_clone).await;
    });

    let app_state_clone = app_state.clone();
    tokio::spawn(async move {
        service::background_jobs::start_performance_aggregation(app_state_clone).await;
    });

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {:?}", err);
        std::process::exit(1);
    }
}
