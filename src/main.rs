use actix_files as fs;
use actix_web::{middleware, web, App, HttpServer};
use clap::{Parser, Subcommand};
use log::info;
use std::sync::Arc;
use std::time::Duration;

mod auth;
mod chat;
mod cities;
mod config;
mod db;
mod error;
mod handlers;
mod insights;
mod llm;
mod models;
mod pipeline;
mod store;
mod weather;

#[cfg(test)]
mod test_support;

use crate::auth::AuthService;
use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::llm::{GroqClient, LanguageModel};
use crate::store::Store;
use crate::weather::{WeatherClient, WeatherProvider};

const DB_CONNECT_RETRIES: u32 = 5;
const DB_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(author, version, about = "Weather Dashboard - cities, insights and AI analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Serve {
        /// Overrides PORT from the environment
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Initialize database schema
    InitDb,
}

/// Shared, reused clients handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub weather: Arc<dyn WeatherProvider>,
    pub model: Arc<dyn LanguageModel>,
    pub auth: AuthService,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let config = Config::from_env()?;

    info!("🚀 Weather Dashboard Starting...");

    let db = Database::connect_lazy(&config.database_url)?;

    match cli.command {
        Some(Commands::InitDb) => {
            db.wait_until_reachable(DB_CONNECT_RETRIES, DB_RETRY_DELAY).await;
            info!("🗄️  Initializing database schema...");
            db.init_schema().await?;
            info!("✅ Database schema created!");
        }
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(config.port);
            start_server(port, db, config).await?;
        }
        None => {
            let port = config.port;
            start_server(port, db, config).await?;
        }
    }

    Ok(())
}

async fn start_server(port: u16, db: Database, config: Config) -> Result<(), AppError> {
    // Storage comes up in the background; the server listens right away.
    actix_web::rt::spawn({
        let db = db.clone();
        async move {
            db.wait_until_reachable(DB_CONNECT_RETRIES, DB_RETRY_DELAY).await;
        }
    });

    let model = GroqClient::new(
        config.llm_api_key.clone(),
        config.llm_api_url.clone(),
        config.llm_model.clone(),
    )?;
    info!("🧠 Language model client ready ({})", config.llm_model);

    let app_state = AppState {
        store: Arc::new(db),
        weather: Arc::new(WeatherClient::new(
            config.weather_api_key.clone(),
            config.weather_api_url.clone(),
        )),
        model: Arc::new(model),
        auth: AuthService::new(config.jwt_secret.clone(), config.jwt_expiry_hours),
    };

    let static_dir = config.static_dir.clone();
    info!("🌐 Starting server on http://0.0.0.0:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(handlers::configure_routes)
            .service(fs::Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
