//! The multi-step connection handshake.
//!
//! Order is fixed: sign-on identifies the peer as a broker client, context
//! creation selects the permission scope, and credential validation runs
//! last. Each step is one strict request/reply exchange; any unexpected
//! reply shape fails the whole handshake.

use std::io::{Read, Write};

use brokerlink_frame::{
    encode_literal_item, encode_params, encode_request, ParameterValue, ReplyReader, RequestKind,
    RequestWriter,
};
use bytes::BytesMut;
use tracing::debug;

use crate::cipher::Cipher;
use crate::config::BrokerConfig;
use crate::error::{Result, SessionError};

const SIGN_ON_COMMAND: &str = "TCPConnect";
const SIGN_ON_SETUP: &str = "XUS SIGNON SETUP";
const CREATE_CONTEXT: &str = "XWB CREATE CONTEXT";
const VALIDATE_CREDENTIALS: &str = "XUS AV CODE";

/// Reply text confirming the sign-on command was understood.
const SIGN_ON_ACCEPTED: &str = "accept";

/// The handshake as an explicit linear state machine. Each step maps to
/// one failure mode: sign-on to `Protocol`, context to `ContextRejected`,
/// credentials to `Auth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    SignOn,
    Context,
    Credentials,
    Complete,
}

impl HandshakeStep {
    fn next(self) -> Self {
        match self {
            HandshakeStep::SignOn => HandshakeStep::Context,
            HandshakeStep::Context => HandshakeStep::Credentials,
            HandshakeStep::Credentials | HandshakeStep::Complete => HandshakeStep::Complete,
        }
    }
}

/// Drive the handshake from sign-on to completion, returning the
/// authenticated user id.
pub fn run<R: Read, W: Write>(
    reader: &mut ReplyReader<R>,
    writer: &mut RequestWriter<W>,
    config: &BrokerConfig,
    cipher: &dyn Cipher,
    local_addr: &str,
) -> Result<String> {
    let mut step = HandshakeStep::SignOn;
    let mut user_id = None;
    while step != HandshakeStep::Complete {
        match step {
            HandshakeStep::SignOn => sign_on(reader, writer, config, local_addr)?,
            HandshakeStep::Context => create_context(reader, writer, config, cipher)?,
            HandshakeStep::Credentials => {
                user_id = Some(authenticate(reader, writer, config, cipher)?);
            }
            HandshakeStep::Complete => unreachable!(),
        }
        step = step.next();
    }
    Ok(user_id.expect("credentials step always runs"))
}

/// Run one strict request/reply exchange and decode the reply as text.
///
/// Encoding failures surface before any byte is written. Read failures are
/// classified against the profile's reply deadline.
pub(crate) fn exchange<R: Read, W: Write>(
    reader: &mut ReplyReader<R>,
    writer: &mut RequestWriter<W>,
    config: &BrokerConfig,
    name: &str,
    kind: RequestKind,
    params: &[ParameterValue],
) -> Result<String> {
    let mut block = BytesMut::new();
    encode_params(params, config.max_lines_per_chunk, &mut block)?;
    let mut request = BytesMut::new();
    encode_request(name, kind, &block, config.end_mark, &mut request)?;

    writer.write_request(&request).map_err(SessionError::Frame)?;
    let reply = reader
        .read_reply()
        .map_err(|err| SessionError::from_read_error(err, config.reply_timeout()))?;

    debug!(procedure = name, reply_len = reply.len(), "exchange complete");

    String::from_utf8(reply.to_vec())
        .map_err(|_| SessionError::Protocol(format!("reply to {name} is not valid UTF-8")))
}

/// Step one: identify this peer as a broker-protocol client.
///
/// The server echoes an acceptance token, then expects the sign-on setup
/// procedure before anything else; its reply carries server identity we do
/// not interpret.
pub fn sign_on<R: Read, W: Write>(
    reader: &mut ReplyReader<R>,
    writer: &mut RequestWriter<W>,
    config: &BrokerConfig,
    local_addr: &str,
) -> Result<()> {
    let reply = exchange(
        reader,
        writer,
        config,
        SIGN_ON_COMMAND,
        RequestKind::Command,
        &[
            ParameterValue::literal(local_addr),
            ParameterValue::literal("0"),
            ParameterValue::Literal(config.client_name.clone()),
        ],
    )?;
    if !reply.starts_with(SIGN_ON_ACCEPTED) {
        return Err(SessionError::Protocol(format!(
            "sign-on not accepted: {reply:?}"
        )));
    }

    exchange(
        reader,
        writer,
        config,
        SIGN_ON_SETUP,
        RequestKind::Procedure,
        &[],
    )?;
    debug!(client_name = %config.client_name, "sign-on complete");
    Ok(())
}

/// Step two: select the application context governing which procedures this
/// session may invoke. The context name travels obscured.
pub fn create_context<R: Read, W: Write>(
    reader: &mut ReplyReader<R>,
    writer: &mut RequestWriter<W>,
    config: &BrokerConfig,
    cipher: &dyn Cipher,
) -> Result<()> {
    let obscured = encode_literal_item(&cipher.encode(config.context.as_bytes()))?;
    let reply = exchange(
        reader,
        writer,
        config,
        CREATE_CONTEXT,
        RequestKind::Procedure,
        &[ParameterValue::Encoded(obscured)],
    )?;

    if reply.trim_end() != "1" {
        // Server reason text is carried verbatim.
        return Err(SessionError::ContextRejected(reply));
    }
    debug!(context = %config.context, "application context established");
    Ok(())
}

/// Step three: validate the access/verify pair. Returns the server-assigned
/// user identifier (the first caret piece of the reply).
pub fn authenticate<R: Read, W: Write>(
    reader: &mut ReplyReader<R>,
    writer: &mut RequestWriter<W>,
    config: &BrokerConfig,
    cipher: &dyn Cipher,
) -> Result<String> {
    let pair = format!("{};{}", config.access, config.verify);
    let obscured = encode_literal_item(&cipher.encode(pair.as_bytes()))?;
    let reply = exchange(
        reader,
        writer,
        config,
        VALIDATE_CREDENTIALS,
        RequestKind::Procedure,
        &[ParameterValue::Encoded(obscured)],
    )?;

    let (user_id, rest) = match reply.split_once('^') {
        Some((first, rest)) => (first, rest),
        None => (reply.as_str(), ""),
    };
    if user_id.is_empty() {
        return Err(SessionError::Protocol(format!(
            "credential reply carries no user id: {reply:?}"
        )));
    }
    if user_id == "0" {
        let reason = if rest.is_empty() { reply.as_str() } else { rest };
        return Err(SessionError::Auth(reason.to_string()));
    }

    debug!(user_id = %user_id, "credentials accepted");
    Ok(user_id.to_string())
}
