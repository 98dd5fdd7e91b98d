//! Server initialization and startup logic for the chat demo.

use std::sync::Arc;

use axum::response::Html;
use axum::routing::get;
use handlebars::Handlebars;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use wsgate_axum::create_router;
use wsgate_config::{Config, ConfigValidator, LoggingConfig};
use wsgate_session::{Gateway, GatewayConfig};

use crate::room::Room;

/// Initialize tracing with console and file output.
///
/// Log files are written to the configured directory with daily rotation.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = logging.resolved_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("wsgate")
        .filename_suffix("log")
        .max_log_files(7)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes buffered lines on exit; must outlive the subscriber.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Run the chat server until it fails.
pub(crate) async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let warnings = ConfigValidator::validate(&config)?.into_result()?;
    for warning in warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    let room = Arc::new(Room::new());
    let gateway = Arc::new(Gateway::new(
        GatewayConfig::from(&config.session),
        room.clone(),
    ));
    let timeouts = gateway.timeouts();
    info!(
        ping_interval = ?timeouts.ping_interval,
        write_timeout = ?timeouts.write_timeout,
        read_timeout = ?timeouts.read_timeout,
        "Session timing"
    );

    let ws_url = format!("ws://{}{}", config.server.address(), config.server.ws_path);
    let index = Html(render_index(&ws_url)?);
    let router = create_router(gateway, &config.server.ws_path)
        .route(
            "/",
            get(move || {
                let index = index.clone();
                async move { index }
            }),
        );

    let address = config.server.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Starting wsgate chat v{}", env!("CARGO_PKG_VERSION"));
    info!("Serving at http://{}", address);

    axum::serve(listener, router).await?;
    Ok(())
}

/// Render the chat page for a socket at `ws_url`. The value is HTML-escaped.
fn render_index(ws_url: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_template_string("index", INDEX_TEMPLATE)?;
    Ok(registry.render("index", &json!({ "ws_url": ws_url }))?)
}

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>wsgate chat</title>
    <style>
    .line {
        margin: 1em;
    }
    .chatroom {
        padding: 1em;
        height: 20em;
        width: 15em;
        overflow-y: auto;
        background-color: #f1f1f1;
    }
    </style>
</head>
<body>
    <div class="chatroom"></div>
    <input class="line" type="text">
    <script>
    (function () {
        var ws = new WebSocket("{{ws_url}}");
        var line = document.getElementsByClassName("line")[0];
        var chatroom = document.getElementsByClassName("chatroom")[0];

        line.addEventListener("keypress", function (event) {
            if (event.key !== "Enter") {
                return;
            }
            ws.send(line.value);
            line.value = "";
        });

        ws.onmessage = function (event) {
            chatroom.innerHTML += event.data;
        };
    })();
    </script>
</body>
</html>"#;
