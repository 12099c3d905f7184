use std::net::{TcpStream, ToSocketAddrs};

use tracing::debug;

use crate::config::BrokerConfig;
use crate::error::{Result, SessionError};

/// Open the TCP connection for one session, applying the profile's connect
/// deadline and the per-invoke read deadline.
pub(crate) fn connect(config: &BrokerConfig) -> Result<TcpStream> {
    let connect_err = |source: std::io::Error| SessionError::Connect {
        host: config.host.clone(),
        port: config.port,
        source,
    };

    let addrs = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(connect_err)?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
            Ok(stream) => {
                stream.set_nodelay(true).map_err(connect_err)?;
                stream
                    .set_read_timeout(Some(config.reply_timeout()))
                    .map_err(connect_err)?;
                stream
                    .set_write_timeout(Some(config.reply_timeout()))
                    .map_err(connect_err)?;
                debug!(host = %config.host, port = config.port, %addr, "connected to broker");
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }

    Err(connect_err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "host resolved to no addresses",
        )
    })))
}
