use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};
use std::sync::Arc;

use grantflow::auth::rate_limit::LoginRateLimiter;
use grantflow::config::AppConfig;
use grantflow::store::PgStore;
use grantflow::workflow::Workflow;
use grantflow::{accounts, db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    // Initialize database
    let pool = db::init_pool(&config).await.map_err(std::io::Error::other)?;
    db::run_migrations(&pool).await.map_err(std::io::Error::other)?;

    let store = Arc::new(PgStore::new(pool));
    accounts::seed_users(store.as_ref(), &config.admin_password, config.seed_demo_users)
        .await
        .map_err(std::io::Error::other)?;

    let workflow = Workflow::new(store, Arc::new(mockable::DefaultClock));
    let limiter = LoginRateLimiter::new();

    // Session encryption key; a generated key loses sessions on restart
    let secret_key = match &config.session_key {
        Some(val) => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        None => Key::generate(),
    };

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(workflow.clone()))
            .app_data(web::Data::new(limiter.clone()))
            .configure(handlers::configure)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
