use actix_web::{App, HttpServer, middleware, web};

use surveyor::config::AppConfig;
use surveyor::store::PgSurveyStore;
use surveyor::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let pool = db::init_pool(&config)
        .await
        .expect("Failed to create DB pool");
    db::run_migrations(&pool, &config.table_prefix)
        .await
        .expect("Failed to run migrations");

    if config.seed_demo {
        if let Err(e) = db::seed_demo(&pool, &config.table_prefix).await {
            log::error!("Demo seed failed: {e}");
        }
    }

    let store = web::Data::new(PgSurveyStore::new(pool, config.table_prefix.clone()));

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(store.clone())
            .configure(handlers::configure::<PgSurveyStore>)
            .default_service(web::to(handlers::not_found))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
