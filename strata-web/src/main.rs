//! Strata Web Server
//!
//! Serves tiered application configuration over a permission-gated REST API.

use clap::Parser;
use strata_web::server::StrataServerBuilder;
use strata_web::init_logging;

/// Strata configuration server
#[derive(Parser)]
#[command(name = "strata-web")]
#[command(about = "Tiered configuration service with hierarchical access control")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Base directory for project and user storage
    #[arg(long)]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var(
            "RUST_LOG",
            format!("strata_web={},tower_http=info", args.log_level),
        );
    }
    init_logging();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut builder = StrataServerBuilder::new().host(args.host).port(args.port);
    if let Some(data_dir) = args.data_dir {
        builder = builder.data_dir(data_dir);
    }

    let server = match builder.build() {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if server.config().audience.is_empty() || server.config().issuer.is_empty() {
        eprintln!("Warning: STRATA_AUDIENCE / STRATA_ISSUER are not set; token validation will reject all callers.");
    }

    if let Err(e) = server.start().await {
        eprintln!("Server failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["strata-web"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);

        let args = Args::parse_from(["strata-web", "--host", "0.0.0.0", "--port", "3000"]);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 3000);
    }
}
