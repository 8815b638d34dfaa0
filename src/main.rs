use quiz_engine::{
    build_router,
    config::{get_config, init_config},
    database::pool::create_pool,
    services::{
        catalog_provider::{CatalogProvider, StaticCatalogProvider},
        generation_client::{OllamaClient, TextGenerator},
        question_sink::{InMemoryQuestionSink, PgQuestionSink, QuestionSink},
        session_store::InMemorySessionStore,
    },
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    init_config()?;
    let config = get_config();

    let sink: Arc<dyn QuestionSink> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Persisting questions to PostgreSQL");
            Arc::new(PgQuestionSink::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, served questions are kept in memory only");
            Arc::new(InMemoryQuestionSink::new())
        }
    };

    let catalog: Arc<dyn CatalogProvider> = match &config.catalog_path {
        Some(path) => Arc::new(StaticCatalogProvider::from_file(path).await?),
        None => Arc::new(StaticCatalogProvider::builtin()?),
    };

    let generator: Arc<dyn TextGenerator> =
        Arc::new(OllamaClient::from_settings(config.client_settings())?);
    info!(
        url = %config.ollama_url,
        model = %config.ollama_model,
        "Using generation backend"
    );

    let app_state = AppState::from_config(
        config,
        generator,
        catalog,
        sink,
        Arc::new(InMemorySessionStore::new()),
    );

    let app = build_router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
