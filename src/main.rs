use fieldverify::api;
use fieldverify::config::Config;
use fieldverify::database::sqlite::SqliteDatabase;
use fieldverify::services::seed;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().flatten_event(true))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("seed") => {
            let database = match SqliteDatabase::new(&config.database_path).await {
                Ok(db) => Arc::new(db),
                Err(e) => {
                    eprintln!("Failed to open database: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = seed::run(&database).await {
                eprintln!("Seeding failed: {}", e);
                std::process::exit(1);
            }
            println!("Seed data created.");
        }
        Some("serve") | None => {
            if let Err(e) = api::serve(config).await {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Some(other) => {
            eprintln!("Unknown command '{}'. Use 'serve' or 'seed'.", other);
            std::process::exit(2);
        }
    }
}
