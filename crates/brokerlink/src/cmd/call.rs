use std::fs;
use std::sync::Arc;
use std::time::Duration;

use brokerlink_pool::SessionPool;
use brokerlink_session::{BrokerConfig, ParameterValue};

use crate::cipher::PassthroughCipher;
use crate::cmd::CallArgs;
use crate::exit::{pool_error, session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let config = BrokerConfig::from_json_file(&args.profile)
        .map_err(|err| session_error("profile rejected", err))?;

    let params = args
        .params
        .iter()
        .map(|raw| parse_param(raw))
        .collect::<CliResult<Vec<_>>>()?;

    let pool = SessionPool::new(config, Arc::new(PassthroughCipher))
        .map_err(|err| pool_error("pool setup failed", err))?;
    let mut lease = pool
        .checkout(wait_timeout)
        .map_err(|err| pool_error("connect failed", err))?;

    let reply = lease
        .invoke(&args.procedure, &params)
        .map_err(|err| session_error("call failed", err))?;

    print_reply(&args.procedure, lease.user_id(), &reply, format);
    drop(lease);
    pool.shutdown();

    Ok(SUCCESS)
}

/// Parse one positional parameter using the prefix grammar documented on
/// [`CallArgs::params`].
fn parse_param(raw: &str) -> CliResult<ParameterValue> {
    if let Some(value) = raw.strip_prefix("lit:") {
        return Ok(ParameterValue::Literal(value.to_string()));
    }
    if let Some(items) = raw.strip_prefix("list:") {
        return Ok(ParameterValue::List(
            items.split(',').map(str::to_string).collect(),
        ));
    }
    if let Some(name) = raw.strip_prefix("ref:") {
        if name.is_empty() {
            return Err(CliError::new(USAGE, "ref: requires a variable name"));
        }
        return Ok(ParameterValue::Reference(name.to_string()));
    }
    if let Some(rest) = raw.strip_prefix("wp:") {
        let Some(path) = rest.strip_prefix('@') else {
            return Err(CliError::new(USAGE, "wp: takes a file reference, e.g. wp:@notes.txt"));
        };
        let text = fs::read_to_string(path)
            .map_err(|err| crate::exit::io_error(&format!("failed reading {path}"), err))?;
        return Ok(ParameterValue::WordProcessing(
            text.lines().map(str::to_string).collect(),
        ));
    }
    Ok(ParameterValue::Literal(raw.to_string()))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
