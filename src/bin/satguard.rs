use clap::{App, Arg, ArgMatches, SubCommand};
use colored::*;
use satguard::protocol::{CommandKind, GroundCommand};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8080";
const RESPONSE_TIMEOUT_S: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("satguard")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🛰️  SatGuard ground console - query and command the autonomy simulator")
        .arg(
            Arg::with_name("host")
                .long("host")
                .value_name("HOST")
                .help("Simulator host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Simulator port")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
                .global(true),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Print the raw JSON response")
                .global(true),
        )
        .subcommand(SubCommand::with_name("ping").about("🏓 Check that the simulator is responsive"))
        .subcommand(SubCommand::with_name("telemetry").about("📡 Latest full telemetry reading"))
        .subcommand(
            SubCommand::with_name("downlink")
                .about("🔽 Mode-prioritized downlink view (restricted while SAFE)"),
        )
        .subcommand(SubCommand::with_name("mode").about("🚦 Current satellite mode"))
        .subcommand(
            SubCommand::with_name("timeline")
                .about("🗒️  Mission event timeline (anomalies, recoveries, warnings, faults)")
                .arg(
                    Arg::with_name("limit")
                        .short("n")
                        .long("limit")
                        .value_name("COUNT")
                        .help("Only the most recent COUNT entries")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("recovery")
                .about("🛟 Recovery engine state")
                .subcommand(SubCommand::with_name("status").about("Mode and active strategy"))
                .subcommand(SubCommand::with_name("history").about("Applied corrective actions")),
        )
        .subcommand(
            SubCommand::with_name("preventive")
                .about("⚠️  Early-warning trend actions")
                .arg(
                    Arg::with_name("limit")
                        .short("n")
                        .long("limit")
                        .value_name("COUNT")
                        .help("Only the most recent COUNT actions")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("inject")
                .about("💉 Inject a fault override")
                .arg(
                    Arg::with_name("type")
                        .help("Fault type")
                        .required(true)
                        .possible_values(&[
                            "LOW_VOLTAGE",
                            "HIGH_TEMP",
                            "RADIATION_SPIKE",
                            "POWER_FAILURE",
                        ]),
                )
                .arg(
                    Arg::with_name("duration")
                        .help("Duration in seconds (1-3600)")
                        .required(true),
                ),
        )
        .get_matches();

    let command = match build_command(&matches) {
        Some(command) => command,
        None => {
            eprintln!("{}", "No subcommand given; try --help".yellow());
            std::process::exit(2);
        }
    };

    let host = matches.value_of("host").unwrap_or(DEFAULT_HOST);
    let port = matches.value_of("port").unwrap_or(DEFAULT_PORT);

    let response = send_command(host, port, &command).await?;
    render_response(&response, matches.is_present("json"));

    Ok(())
}

fn build_command(matches: &ArgMatches<'_>) -> Option<GroundCommand> {
    let parse_limit = |sub: &ArgMatches<'_>| sub.value_of("limit").and_then(|v| v.parse().ok());

    let kind = match matches.subcommand() {
        ("ping", Some(_)) => CommandKind::Ping,
        ("telemetry", Some(_)) => CommandKind::GetTelemetry,
        ("downlink", Some(_)) => CommandKind::GetDownlink,
        ("mode", Some(_)) => CommandKind::GetMode,
        ("timeline", Some(sub)) => CommandKind::GetTimeline {
            limit: parse_limit(sub),
        },
        ("preventive", Some(sub)) => CommandKind::GetPreventiveActions {
            limit: parse_limit(sub),
        },
        ("recovery", Some(sub)) => match sub.subcommand_name() {
            Some("history") => CommandKind::GetRecoveryHistory,
            _ => CommandKind::GetRecoveryStatus,
        },
        ("inject", Some(sub)) => CommandKind::InjectFault {
            fault_type: sub.value_of("type")?.to_string(),
            duration_s: sub.value_of("duration")?.parse().unwrap_or(0),
        },
        _ => return None,
    };

    Some(GroundCommand { id: 1, command: kind })
}

async fn send_command(
    host: &str,
    port: &str,
    command: &GroundCommand,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let stream = TcpStream::connect(format!("{host}:{port}")).await?;
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);

    let request = serde_json::to_string(command)?;
    writer.write_all(request.as_bytes()).await?;
    writer.write_all(b"\n").await?;

    // The simulator interleaves telemetry frames with responses on the same
    // connection; skip lines until one carries a response status.
    let deadline = Duration::from_secs(RESPONSE_TIMEOUT_S);
    match tokio::time::timeout(deadline, read_response(&mut buf_reader)).await {
        Ok(result) => result,
        Err(_) => Err(format!("no response within {RESPONSE_TIMEOUT_S} s").into()),
    }
}

async fn read_response(
    buf_reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = buf_reader.read_line(&mut line).await?;
        if read == 0 {
            return Err("connection closed before a response arrived".into());
        }
        let value: serde_json::Value = match serde_json::from_str(line.trim()) {
            Ok(value) => value,
            Err(_) => continue,
        };
        if value.get("status").is_some() {
            return Ok(value);
        }
    }
}

fn render_response(response: &serde_json::Value, raw_json: bool) {
    if raw_json {
        println!("{}", serde_json::to_string_pretty(response).unwrap_or_default());
        return;
    }

    let status = response
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or("Unknown");

    match status {
        "Success" => println!("{}", "OK".green().bold()),
        other => {
            let message = response
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("request failed");
            eprintln!("{} {}", other.red().bold(), message.red());
            std::process::exit(1);
        }
    }

    let Some(payload) = response.get("payload") else {
        return;
    };

    match payload {
        serde_json::Value::Array(entries) => {
            for entry in entries {
                println!("{}", render_line(entry));
            }
            println!("{}", format!("{} entries", entries.len()).dimmed());
        }
        other => println!("{}", serde_json::to_string_pretty(other).unwrap_or_default()),
    }
}

fn render_line(entry: &serde_json::Value) -> String {
    let stamp = entry
        .get("timestamp_ms")
        .and_then(serde_json::Value::as_u64)
        .map(|ms| format!("T+{:>6}s", ms / 1000))
        .unwrap_or_else(|| "T+     ?".to_string());

    let tag = entry.get("type").and_then(|t| t.as_str()).unwrap_or("");
    let colored_tag = match tag {
        "ANOMALY" => tag.red().bold(),
        "RECOVERY" => tag.cyan().bold(),
        "PREVENTIVE" => tag.yellow(),
        "FAULT_INJECTED" => tag.magenta(),
        _ => tag.normal(),
    };

    let detail = entry
        .get("description")
        .or_else(|| entry.get("trigger"))
        .and_then(|d| d.as_str())
        .map(str::to_string)
        .or_else(|| {
            // Anomaly entries carry structured fields instead of prose.
            let parameter = entry.get("parameter")?.as_str()?;
            let severity = entry.get("severity")?.as_str()?;
            let observed = entry.get("observed")?.as_f64()?;
            Some(format!("{severity} {parameter} = {observed:.2}"))
        })
        .unwrap_or_else(|| serde_json::to_string(entry).unwrap_or_default());

    format!("{} {:>14} {}", stamp.dimmed(), colored_tag, detail)
}
