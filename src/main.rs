use clap::Parser;
use skyportal::cli::{Args, build_config, init_logging, load_jwt_secret, validate_api_host};
use skyportal::{create_app, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(api_host) = validate_api_host(&args.api_host) else {
        std::process::exit(1);
    };

    let config = build_config(
        api_host,
        args.environment,
        jwt_secret,
        args.protected,
        args.upstream_timeout_secs,
    );

    let app = match create_app(&config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "Failed to create auth service client");
            std::process::exit(1);
        }
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    match listener.local_addr() {
        Ok(local_addr) => info!(
            address = %local_addr,
            api_host = %config.api_host,
            environment = ?config.environment,
            "Listening"
        ),
        Err(e) => error!(error = %e, "Failed to read local address"),
    }

    if let Err(e) = run_server(app, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
