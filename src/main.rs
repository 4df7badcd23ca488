use std::sync::Arc;

use board_api::{
    config::Config,
    db,
    middleware::rate_limit::SignInLimiter,
    router,
    services::{
        attempts::{AttemptCounter, MemoryAttemptCounter, RedisAttemptCounter},
        cache::{MemorySessionCache, RedisSessionCache, SessionCache},
        session::SessionManager,
        users::PgUserStore,
    },
    AppState,
};
use redis::Client as RedisClient;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let (cache, attempts): (Arc<dyn SessionCache>, Arc<dyn AttemptCounter>) =
        if config.uses_memory_cache() {
            warn!("REDIS_URL=memory://, sessions are kept in process memory");
            (
                Arc::new(MemorySessionCache::new()),
                Arc::new(MemoryAttemptCounter::new()),
            )
        } else {
            let redis_client = RedisClient::open(config.redis_url.as_str())?;
            let redis_conn = redis_client.get_multiplexed_async_connection().await?;
            info!("Redis connected");
            (
                Arc::new(RedisSessionCache::new(
                    redis_conn.clone(),
                    config.session_key_prefix.clone(),
                )),
                Arc::new(RedisAttemptCounter::new(
                    redis_conn,
                    config.rate_limit_key_prefix.clone(),
                )),
            )
        };

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let sessions = Arc::new(SessionManager::new(cache, users, &config.session_settings()));

    let state = AppState {
        db: pool,
        sessions,
        signin_limiter: Arc::new(SignInLimiter::new(
            attempts,
            config.signin_max_attempts,
            config.signin_window(),
            config.cache_timeout(),
        )),
        config: config.clone(),
    };
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("board API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
