//! Web server for the CWMP bridge.
//!
//! Exposes one POST route per supported CWMP method plus health probes.

pub mod router;
pub mod types;

pub use router::create_router_with_state;
pub use types::{ServerState, MAX_REQUEST_BODY_SIZE};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use cwmp_devices::InteractionBridge;

/// Serve `state` on `bind` until `shutdown` resolves.
pub async fn serve<F>(bind: SocketAddr, state: ServerState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router_with_state(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Run the web server with an existing bridge until Ctrl+C or SIGTERM.
pub async fn run(bind: SocketAddr, bridge: Arc<InteractionBridge>) -> anyhow::Result<()> {
    serve(
        bind,
        ServerState::new(bridge),
        crate::shutdown::shutdown_signal(),
    )
    .await?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Connect to the broker, build the bridge and serve until shutdown.
///
/// The MQTT client is disconnected after the HTTP server has drained.
#[cfg(feature = "mqtt")]
pub async fn start_server(
    server: &cwmp_core::config::ServerConfig,
    broker: &cwmp_core::config::BrokerConfig,
    bridge_config: &cwmp_core::config::BridgeConfig,
) -> anyhow::Result<()> {
    use cwmp_devices::{MqttTransport, TopicScheme};

    bridge_config.validate()?;
    let bind = server.bind_addr()?;

    tracing::info!("Connecting to MQTT broker {}", broker.url);
    let transport = Arc::new(MqttTransport::connect(broker).await?);

    let bridge = Arc::new(InteractionBridge::new(
        transport.clone(),
        TopicScheme::from_config(bridge_config),
    ));
    tracing::info!(
        "Forwarding CWMP requests to {}<serial>.api",
        bridge.topics().prefix()
    );

    let result = run(bind, bridge).await;
    transport.close().await;
    result
}
