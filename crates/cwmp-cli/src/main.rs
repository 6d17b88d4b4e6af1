//! Command-line interface for the CWMP bridge.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use cwmp_core::config::{
    defaults, env_vars, BridgeConfig, BrokerConfig, ServerConfig, TlsConfig, LOCAL_ENV_FILE,
};
use cwmp_devices::{InteractionBridge, MqttTransport, RpcMethod, TopicScheme};

/// CWMP bridge - forward HTTP requests to CWMP devices over MQTT.
#[derive(Parser, Debug)]
#[command(name = "cwmp-bridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve {
        #[command(flatten)]
        server: ServerArgs,
        #[command(flatten)]
        broker: BrokerArgs,
        #[command(flatten)]
        bridge: BridgeArgs,
    },
    /// Send one CWMP request to a device and print the decoded reply.
    Request {
        /// Device serial number.
        serial: String,
        /// CWMP method, e.g. GetParameterValues or getParameterValues.
        method: RpcMethod,
        /// Request body file (reads stdin when omitted).
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Print the reply bytes instead of the decoded JSON.
        #[arg(long)]
        raw: bool,
        #[command(flatten)]
        broker: BrokerArgs,
        #[command(flatten)]
        bridge: BridgeArgs,
    },
}

/// HTTP listener options.
#[derive(clap::Args, Debug, Clone)]
struct ServerArgs {
    /// Host to bind to.
    #[arg(long, env = env_vars::HTTP_HOST, default_value = defaults::HTTP_HOST)]
    host: String,
    /// Port to bind to.
    #[arg(short, long, env = env_vars::HTTP_PORT, default_value_t = defaults::HTTP_PORT)]
    port: u16,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        ServerConfig::new(args.host, args.port)
    }
}

/// Broker connection options.
#[derive(clap::Args, Debug, Clone)]
struct BrokerArgs {
    /// Broker URL (tcp://, mqtt://, ssl:// or mqtts://).
    #[arg(long, env = env_vars::MQTT_URL, default_value = defaults::MQTT_URL)]
    mqtt_url: String,
    /// MQTT client id prefix.
    #[arg(long, env = env_vars::MQTT_CLIENT_ID, default_value = defaults::MQTT_CLIENT_ID)]
    mqtt_client_id: String,
    #[arg(long, env = env_vars::MQTT_USERNAME)]
    mqtt_username: Option<String>,
    #[arg(long, env = env_vars::MQTT_PASSWORD, hide_env_values = true)]
    mqtt_password: Option<String>,
    /// QoS for requests and replies.
    #[arg(
        long,
        env = env_vars::MQTT_QOS,
        default_value_t = defaults::MQTT_QOS,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    mqtt_qos: u8,
    /// Connect with TLS using the client certificate options below.
    #[arg(long, env = env_vars::MQTT_ENABLE_TLS)]
    mqtt_enable_tls: bool,
    #[arg(long, env = env_vars::CLIENT_CRT, default_value = defaults::CLIENT_CRT)]
    client_crt: PathBuf,
    #[arg(long, env = env_vars::CLIENT_KEY, default_value = defaults::CLIENT_KEY)]
    client_key: PathBuf,
    #[arg(long, env = env_vars::SERVER_CA, default_value = defaults::SERVER_CA)]
    server_ca: PathBuf,
    /// Seconds to wait for a device reply.
    #[arg(
        long,
        env = env_vars::REQUEST_TIMEOUT_SECS,
        default_value_t = defaults::REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,
}

impl From<BrokerArgs> for BrokerConfig {
    fn from(args: BrokerArgs) -> Self {
        let mut config = BrokerConfig::new(args.mqtt_url)
            .with_client_id(args.mqtt_client_id)
            .with_qos(args.mqtt_qos);
        config.request_timeout_secs = args.request_timeout_secs;
        config.username = args.mqtt_username;
        config.password = args.mqtt_password;

        let secure_scheme = config.endpoint().map(|e| e.secure).unwrap_or(false);
        if args.mqtt_enable_tls || secure_scheme {
            config = config.with_tls(TlsConfig {
                cert_file: args.client_crt,
                key_file: args.client_key,
                ca_file: args.server_ca,
            });
        }
        config
    }
}

/// Device addressing options.
#[derive(clap::Args, Debug, Clone)]
struct BridgeArgs {
    /// Topic namespace prepended to every device serial.
    #[arg(long, env = env_vars::TOPIC_PREFIX, default_value = defaults::TOPIC_PREFIX)]
    topic_prefix: String,
}

impl From<BridgeArgs> for BridgeConfig {
    fn from(args: BridgeArgs) -> Self {
        BridgeConfig::with_topic_prefix(args.topic_prefix)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` first, then `.env.local` overriding it. Real environment
    // variables set before launch win over `.env` but not `.env.local`.
    dotenvy::dotenv().ok();
    dotenvy::from_filename_override(LOCAL_ENV_FILE).ok();

    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Serve {
            server,
            broker,
            bridge,
        } => {
            cwmp_api::start_server(&server.into(), &broker.into(), &bridge.into()).await
        }
        Command::Request {
            serial,
            method,
            file,
            raw,
            broker,
            bridge,
        } => run_request(serial, method, file, raw, broker.into(), bridge.into()).await,
    }
}

fn init_logging(verbose: bool) {
    // Check if JSON logging is requested (for production/container environments)
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_directives = if verbose {
        "cwmp=debug,tower_http=debug"
    } else {
        "cwmp=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directives));

    // Logs go to stderr so `request` output on stdout stays machine-readable.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run_request(
    serial: String,
    method: RpcMethod,
    file: Option<PathBuf>,
    raw: bool,
    broker: BrokerConfig,
    bridge_config: BridgeConfig,
) -> Result<()> {
    let payload = read_payload(file.as_ref()).await?;
    bridge_config.validate()?;

    let transport = Arc::new(MqttTransport::connect(&broker).await?);
    let bridge = InteractionBridge::new(transport.clone(), TopicScheme::from_config(&bridge_config));

    let result = bridge.interact_method(method, &serial, payload).await;
    transport.close().await;
    let interaction = result?;

    if raw {
        println!("{}", String::from_utf8_lossy(&interaction.raw));
    } else {
        // {"method": ..., "response": ..., "encoding": ...}
        let mut output = serde_json::to_value(&interaction.response)?;
        if let Some(fields) = output.as_object_mut() {
            fields.insert(
                "encoding".to_string(),
                serde_json::to_value(interaction.encoding)?,
            );
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

async fn read_payload(file: Option<&PathBuf>) -> Result<Bytes> {
    match file {
        Some(path) => {
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read request body from {}", path.display()))?;
            Ok(Bytes::from(data))
        }
        None => {
            let data = tokio::task::spawn_blocking(|| {
                let mut buf = Vec::new();
                std::io::stdin().read_to_end(&mut buf).map(|_| buf)
            })
            .await?
            .context("failed to read request body from stdin")?;
            Ok(Bytes::from(data))
        }
    }
}
