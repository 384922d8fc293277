use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use std::{env, process};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vton_mock::config::{port_arg, LoggingSection, Settings};
use vton_mock::server::{self, AppState};

const USAGE: &str = "usage: ./vton-mock [port]";

/// Optional port override from the command line
fn get_args() -> Option<u16> {
    match port_arg(env::args().skip(1)) {
        Ok(port) => port,
        Err(err) => {
            println!("{err}\n{USAGE}");
            process::exit(1);
        }
    }
}

fn init_tracing(logging: &LoggingSection) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let mut settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings.logging);

    if let Some(port) = get_args() {
        settings.server.port = port;
    }
    let addr = settings.bind_addr();

    let state = web::Data::new(AppState::new(settings).context("failed to build app state")?);
    info!("starting test VTON server on {addr}; every result is a dummy image");
    info!("{:?}", &*state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .wrap(server::cors())
            .configure(server::configure)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind to {addr}"))?
    .run()
    .await?;

    Ok(())
}
