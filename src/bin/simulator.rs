use satguard::agent::SatelliteAgent;
use satguard::protocol::{self, ProtocolHandler};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio::time;
use tracing::{error, info, warn};

const TCP_PORT: u16 = 8080;
const TICK_PERIOD_MS: u64 = 1000;
const TELEMETRY_BROADCAST_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("🛰️  SatGuard CubeSat Autonomy Simulator");
    println!("=======================================");

    let agent = Arc::new(Mutex::new(SatelliteAgent::with_tick_period(TICK_PERIOD_MS)));

    let (telemetry_tx, _) = broadcast::channel(TELEMETRY_BROADCAST_BUFFER_SIZE);

    let tcp_agent = Arc::clone(&agent);
    let tcp_telemetry_tx = telemetry_tx.clone();
    let _tcp_server = tokio::spawn(async move {
        if let Err(e) = start_tcp_server(tcp_agent, tcp_telemetry_tx).await {
            error!("TCP server error: {}", e);
        }
    });

    // One tick per interval; the agent lock is the atomic tick boundary, so
    // concurrent ground queries see pre-tick or post-tick state only.
    let mut interval = time::interval(Duration::from_millis(TICK_PERIOD_MS));

    loop {
        interval.tick().await;

        let tick_report = {
            let mut agent_guard = agent.lock().await;
            agent_guard.tick()
        };

        if tick_report.anomaly_count > 0 || tick_report.recovery_count > 0 {
            info!(
                anomalies = tick_report.anomaly_count,
                recovery_actions = tick_report.recovery_count,
                "autonomy events this tick"
            );
        }

        match serde_json::to_string(&tick_report.reading) {
            Ok(frame) => {
                // Errors only mean no subscribers are listening right now.
                let _ = telemetry_tx.send(frame);
            }
            Err(e) => warn!("telemetry serialization failed: {}", e),
        }
    }
}

async fn start_tcp_server(
    agent: Arc<Mutex<SatelliteAgent>>,
    telemetry_tx: broadcast::Sender<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(format!("127.0.0.1:{TCP_PORT}")).await?;
    info!("🌐 ground interface listening on port {}", TCP_PORT);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("🔗 ground client connected: {}", addr);
                let client_agent = Arc::clone(&agent);
                let client_telemetry_rx = telemetry_tx.subscribe();

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, client_agent, client_telemetry_rx).await {
                        warn!("client {} error: {}", addr, e);
                    }
                    info!("🔌 ground client disconnected: {}", addr);
                });
            }
            Err(e) => {
                error!("failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    agent: Arc<Mutex<SatelliteAgent>>,
    mut telemetry_rx: broadcast::Receiver<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);
    let writer = Arc::new(Mutex::new(writer));

    // Stream every tick's reading to the client as one JSON line.
    let telemetry_writer = Arc::clone(&writer);
    let telemetry_task = tokio::spawn(async move {
        while let Ok(frame) = telemetry_rx.recv().await {
            let mut writer_guard = telemetry_writer.lock().await;
            if writer_guard.write_all(frame.as_bytes()).await.is_err()
                || writer_guard.write_all(b"\n").await.is_err()
            {
                break;
            }
        }
    });

    let mut handler = ProtocolHandler::new();
    let mut line = String::new();
    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let response = match handler.parse_command(trimmed) {
                    Ok(command) => {
                        info!(id = command.id, "📨 ground command: {:?}", command.command);
                        let mut agent_guard = agent.lock().await;
                        protocol::execute(&mut agent_guard, &command)
                    }
                    Err(e) => {
                        warn!("rejected command line: {}", e);
                        protocol::GroundResponse {
                            id: 0,
                            timestamp_ms: 0,
                            status: protocol::ResponseStatus::InvalidCommand,
                            payload: None,
                            message: Some(e.to_string()),
                        }
                    }
                };

                let response_json = handler.serialize_response(&response)?;
                {
                    let mut writer_guard = writer.lock().await;
                    writer_guard.write_all(response_json.as_bytes()).await?;
                    writer_guard.write_all(b"\n").await?;
                }
            }
            Err(e) => {
                error!("error reading from client: {}", e);
                break;
            }
        }
    }

    telemetry_task.abort();
    Ok(())
}
