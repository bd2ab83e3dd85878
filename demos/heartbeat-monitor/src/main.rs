//! Keeps a view session alive against a running server.
//!
//! Run with: cargo run -p heartbeat-monitor-demo -- <base-url> <view-name> [session-id]
//!
//! Timing can be overridden with `VIEW_SESSION_*` variables, e.g.
//! `VIEW_SESSION_NORMAL_INTERVAL_MS=2000`. Stops on Ctrl-C or lost contact.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use view_session_client::{RequestSettings, SessionClient};
use view_session_core::{SessionConfig, ViewIdentity, notifier::LOST_CONTACT_MESSAGE};
use view_session_transport::{HttpTransport, HttpTransportConfig};

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,view_session_client=debug".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(base_url), Some(view_name)) = (args.next(), args.next()) else {
        bail!("usage: heartbeat-monitor <base-url> <view-name> [session-id]");
    };
    let session_id = args.next().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let config = SessionConfig::from_env().context("reading VIEW_SESSION_* settings")?;
    let transport = HttpTransport::new(HttpTransportConfig {
        base_url,
        ..HttpTransportConfig::default()
    })
    .context("building HTTP transport")?;

    tracing::info!(%view_name, %session_id, "Starting session");
    let client = SessionClient::builder(view_name)
        .session_id(session_id)
        .config(config)
        .notifier(|identity: &ViewIdentity| {
            eprintln!("*** {LOST_CONTACT_MESSAGE} ({}) ***", identity.view_name);
        })
        .build(Arc::new(transport));

    if let Ok(method) = std::env::var("VIEW_SESSION_CALL") {
        match client.call(&method, RequestSettings::new()).await {
            Ok(response) => tracing::info!(%method, response = %response.as_value(), "Call completed"),
            Err(e) => tracing::warn!(%method, "Call failed: {e}"),
        }
    }

    let mut status = tokio::time::interval(STATUS_INTERVAL);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = status.tick() => {
                let liveness = client.liveness();
                tracing::info!(?liveness, "Session status");
                if liveness.is_lost_contact() {
                    break;
                }
            }
        }
    }

    Ok(())
}
