//! apiguard demo server.
//!
//! Serves [`handler::DemoHandler`] behind Hawk authentication with content
//! negotiation between JSON and XML.
//!
//! # Usage
//!
//! ```text
//! HAWK_CLIENT_ID=Alice HAWK_CLIENT_KEY=secret GATEWAY_LISTEN=0.0.0.0:8080 apiguard-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `STRUCTURED_ERRORS` | `true` | Negotiated `{"code", "message"}` error bodies |
//! | `DEFAULT_MIMETYPE` | `application/json` | Representation for `*/*` and no `Accept` |
//! | `JSONIFY_PRETTYPRINT_REGULAR` | `false` | Indent JSON for non-XHR requests |
//! | `NEGOTIATION_POLICY` | `first-listed` | `first-listed` or `weighted` |
//! | `HAWK_ENABLED` | `true` | Authenticate requests |
//! | `HAWK_SIGN_RESPONSE` | `false` | Attach `Server-Authorization` |
//! | `HAWK_ALLOW_COOKIE_AUTH` | `false` | Accept session cookies instead of a signature |
//! | `HAWK_ALGORITHM` | `sha256` | `sha1` or `sha256` |
//! | `HAWK_ACCEPT_UNTRUSTED_CONTENT` | `false` | Allow requests without payload hash |
//! | `HAWK_LOCALTIME_OFFSET_IN_SECONDS` | `0` | Server clock offset |
//! | `HAWK_TIMESTAMP_SKEW_IN_SECONDS` | `60` | Accepted clock skew |
//! | `HAWK_DEFAULT_SCHEME` | `http` | Scheme for the default port when the URI has none |
//! | `HAWK_CLIENT_ID` / `HAWK_CLIENT_KEY` | *(unset)* | Demo client credentials |

mod handler;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use apiguard_core::ApiConfig;
use apiguard_hawk::{AuthEngine, HawkOptions, StaticKeyLoader};
use apiguard_http::{ApiHttpConfig, ApiHttpService};
use apiguard_negotiation::{FormatterRegistry, NegotiationOptions, XmlFormatter};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::handler::DemoHandler;

/// Server version reported at start-up.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directives appended to the configured level so connection-level noise
/// from the HTTP stack stays out of request logs.
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn";

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins when it parses; otherwise `log_level` is used with the HTTP
/// stack quieted.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("{log_level},{QUIET_DEPENDENCIES}"))
            .with_context(|| format!("invalid log level filter: {log_level}"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

/// Build a key loader from `HAWK_CLIENT_ID` / `HAWK_CLIENT_KEY`.
fn build_key_loader() -> Option<StaticKeyLoader> {
    let client_id = std::env::var("HAWK_CLIENT_ID").ok()?;
    let client_key = std::env::var("HAWK_CLIENT_KEY").ok()?;

    info!(client_id = %client_id, "configured Hawk client from environment");
    Some(StaticKeyLoader::new([(client_id, client_key)]))
}

/// Build the authentication engine, refusing to start when it cannot verify anything.
fn build_auth_engine(options: HawkOptions) -> Result<AuthEngine> {
    let mut builder = AuthEngine::builder(options);
    if let Some(loader) = build_key_loader() {
        builder = builder.key_loader(loader);
    }
    let engine = builder.build();
    engine
        .ensure_configured()
        .context("set HAWK_CLIENT_ID and HAWK_CLIENT_KEY, or HAWK_ENABLED=false")?;
    Ok(engine)
}

/// Build the formatter registry: JSON (default) and XML.
fn build_registry(options: &NegotiationOptions) -> Result<FormatterRegistry> {
    FormatterRegistry::builder_from_options(options)
        .register("application/xml", XmlFormatter::default())
        .build()
        .context("invalid formatter registry")
}

/// How long in-flight connections may take to finish after shutdown begins.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve on Ctrl-C, or on SIGTERM where supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Accept connections until `shutdown` resolves, then drain them.
async fn serve(
    listener: TcpListener,
    service: ApiHttpService<DemoHandler>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());
    tokio::pin!(shutdown);

    loop {
        let (stream, peer_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            },
            () = &mut shutdown => break,
        };

        let conn = graceful.watch(
            http.serve_connection(TokioIo::new(stream), service.clone())
                .into_owned(),
        );
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(%peer_addr, error = %e, "connection closed with error");
            }
        });
    }

    info!(timeout = ?DRAIN_TIMEOUT, "shutdown requested, draining connections");
    if tokio::time::timeout(DRAIN_TIMEOUT, graceful.shutdown())
        .await
        .is_err()
    {
        warn!("drain timed out, dropping remaining connections");
    }
    info!("apiguard server stopped");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ApiConfig::from_env();
    init_tracing(&config.log_level)?;

    let negotiation = NegotiationOptions::from_env();
    let hawk = HawkOptions::from_env();
    info!(
        version = VERSION,
        default_media_type = %negotiation.default_media_type,
        policy = %negotiation.policy,
        hawk_enabled = hawk.enabled,
        sign_responses = hawk.sign_responses,
        "starting apiguard server",
    );

    let registry = build_registry(&negotiation)?;
    let engine = build_auth_engine(hawk)?;

    let service = ApiHttpService::new(
        Arc::new(DemoHandler),
        ApiHttpConfig {
            registry: Arc::new(registry),
            structured_errors: config.structured_errors,
            auth: Some(Arc::new(engine)),
        },
    );

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid listen address: {}", config.listen))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind to {addr}"))?;
    info!(%addr, "listening");

    serve(listener, service, shutdown_signal()).await
}
