// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

//! Mindflow server entrypoint.
//!
//! Binds an HTTP listener and serves the JSON API until interrupted. All
//! settings can be given as flags or environment variables; flags win.

use std::error::Error;

use tracing_subscriber::EnvFilter;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE_URL: &str = "sqlite://mindflow.db";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--bind <addr>] [--port <port>] [--database <url>]\n\nDefaults: --bind {DEFAULT_BIND_ADDR}, --port {DEFAULT_PORT}, --database {DEFAULT_DATABASE_URL}.\nEnvironment fallbacks: BIND_ADDR, PORT, DATABASE_URL.\nThe database file is created on first start."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    bind: Option<String>,
    port: Option<u16>,
    database: Option<String>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                if options.bind.is_some() {
                    return Err(());
                }
                let addr = args.next().ok_or(())?;
                options.bind = Some(addr);
            }
            "--port" => {
                if options.port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.port = Some(port);
            }
            "--database" => {
                if options.database.is_some() {
                    return Err(());
                }
                let url = args.next().ok_or(())?;
                options.database = Some(url);
            }
            _ => return Err(()),
        }
    }

    Ok(options)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "mindflow".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("mindflow=debug,tower_http=debug")),
            )
            .init();

        let bind = options
            .bind
            .or_else(|| env_var("BIND_ADDR"))
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let port = match options.port {
            Some(port) => port,
            None => match env_var("PORT") {
                Some(raw) => raw.parse()?,
                None => DEFAULT_PORT,
            },
        };
        let database_url = options
            .database
            .or_else(|| env_var("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

        runtime.block_on(async move {
            let db = mindflow::store::Database::connect(&database_url).await?;
            db.migrate().await?;
            tracing::info!(database = %database_url, "database ready");

            let state = mindflow::api::AppState { db };
            let router = mindflow::api::router(state);

            let listener = tokio::net::TcpListener::bind((bind.as_str(), port)).await?;
            tracing::info!(addr = %listener.local_addr()?, "listening");

            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %err, "shutdown signal listener failed");
                    }
                })
                .await?;
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("mindflow: {err}");
        std::process::exit(1);
    }
}
