use augur::api;
use augur::config::Config;
use augur::services::{
    Collaborators, CycleStatus, NarrativeAnalyzer, RemoteNarrativeAnalyzer, SignalOrchestrator,
    Trigger,
};
use augur::sources::{MarketFeed, OrderBookSentiment, PriceFeed, SentimentFeed};
use augur::AppState;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "augur=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!(
        "Starting Augur for {} on {}:{}",
        config.symbol.to_uppercase(),
        config.host,
        config.port
    );

    let price_feed: Arc<dyn PriceFeed> = Arc::new(MarketFeed::from_config(&config.feed));
    let sentiment_feed: Arc<dyn SentimentFeed> =
        Arc::new(OrderBookSentiment::from_config(&config.feed));

    let narrative = RemoteNarrativeAnalyzer::from_config(&config.narrative).map(|analyzer| {
        info!("Narrative API key found, using {}", config.narrative.model);
        Arc::new(analyzer) as Arc<dyn NarrativeAnalyzer>
    });
    if narrative.is_none() {
        info!("No narrative API key, using local analysis only");
    }

    let orchestrator = SignalOrchestrator::new(
        Collaborators {
            price_feed,
            sentiment_feed: Some(sentiment_feed),
            narrative,
        },
        &config.cycle,
    );

    // Periodic analysis; the first tick fires immediately
    {
        let orchestrator = orchestrator.clone();
        let period = config.cycle.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match orchestrator.trigger(Trigger::Periodic).await {
                    Ok(CycleStatus::Completed) => {}
                    Ok(CycleStatus::Skipped(reason)) => {
                        debug!("Periodic cycle skipped: {:?}", reason)
                    }
                    Err(e) => warn!("Periodic cycle failed: {}", e),
                }
            }
        });
    }

    let state = AppState {
        config: config.clone(),
        orchestrator,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Augur server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
