use std::time::Instant;

use brokerlink_session::{BrokerConfig, Session};
use serde::Serialize;

use crate::cipher::PassthroughCipher;
use crate::cmd::ProbeArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct ProbeOutput {
    host: String,
    port: u16,
    context: String,
    user_id: String,
    handshake_ms: f64,
    connected: bool,
}

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = BrokerConfig::from_json_file(&args.profile)
        .map_err(|err| session_error("profile rejected", err))?;

    let start = Instant::now();
    let mut session = Session::connect(config, &PassthroughCipher)
        .map_err(|err| session_error("probe failed", err))?;
    let handshake_ms = (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0;

    let out = ProbeOutput {
        host: session.config().host.clone(),
        port: session.config().port,
        context: session.config().context.clone(),
        user_id: session.user_id().to_string(),
        handshake_ms,
        connected: true,
    };
    session.close();

    print_probe(&out, format);
    Ok(SUCCESS)
}

fn print_probe(out: &ProbeOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Broker Probe:");
            println!("  Server:     {}:{}", out.host, out.port);
            println!("  Context:    {}", out.context);
            println!("  User ID:    {}", out.user_id);
            println!("  Handshake:  {:.2}ms", out.handshake_ms);
            println!("  Connected:  {}", out.connected);
        }
        OutputFormat::Raw => {
            println!("{}", out.user_id);
        }
    }
}
