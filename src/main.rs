use localserve_api::config::{init_db, Config};
use localserve_api::services::google::GoogleAuthClient;
use localserve_api::services::jwt::JwtService;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "localserve_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url).await;
    tracing::info!("Connected to MySQL");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(config.jwt_secret.clone());

    let google_verifier = config.google_client_id.clone().map(|client_id| {
        Arc::new(GoogleAuthClient::new(client_id))
            as Arc<dyn localserve_api::services::google::GoogleTokenVerifier>
    });
    if google_verifier.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID not set; Google sign-in disabled");
    }

    let app =
        localserve_api::create_app(db, jwt_service, config.app_env, google_verifier).await;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!("Server running on http://localhost:{}", config.port);
    axum::serve(listener, app).await.unwrap();
}
