use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use crate::config::DaemonConfig;
use crate::error::CpMigrateError;

/// Signals the panel daemon that it has work to pick up.
pub trait DaemonNotifier {
    fn notify(&self) -> Result<(), CpMigrateError>;
}

/// Talks to the panel daemon over its line protocol:
///
/// ```text
/// <- 250 greeting
/// -> helo <client>
/// <- 250 ...
/// -> execute query
/// <- 250 ...
/// -> bye
/// <- 250 ...
/// ```
///
/// A reply whose code is `999` is an error.
pub struct TcpDaemonNotifier {
    host: String,
    port: u16,
    client_name: String,
    timeout: Duration,
}

impl TcpDaemonNotifier {
    const ERROR_CODE: &'static str = "999";

    pub fn new(host: impl Into<String>, port: u16, client_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            client_name: client_name.into(),
            timeout,
        }
    }

    pub fn from_config(daemon: &DaemonConfig) -> Self {
        Self::new(
            daemon.host.clone(),
            daemon.port,
            daemon.client_name.clone(),
            Duration::from_secs(daemon.timeout_secs),
        )
    }

    fn connect(&self) -> Result<TcpStream, CpMigrateError> {
        let addrs = (self.host.as_str(), self.port).to_socket_addrs()?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => e.into(),
            None => CpMigrateError::Daemon(format!(
                "No address found for {}:{}",
                self.host, self.port
            )),
        })
    }

    fn read_reply(reader: &mut impl BufRead) -> Result<String, CpMigrateError> {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(CpMigrateError::Daemon(
                "Connection closed by daemon".to_string(),
            ));
        }

        let line = line.trim_end().to_string();
        debug!("Daemon replied: {}", line);

        let code = line.split_whitespace().next().unwrap_or("");
        if code == Self::ERROR_CODE {
            return Err(CpMigrateError::Daemon(line));
        }

        Ok(line)
    }
}

impl DaemonNotifier for TcpDaemonNotifier {
    fn notify(&self) -> Result<(), CpMigrateError> {
        let stream = self.connect()?;
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(stream);

        Self::read_reply(&mut reader)?;

        for command in [format!("helo {}", self.client_name), "execute query".to_string(), "bye".to_string()] {
            debug!("Sending to daemon: {}", command);
            writer.write_all(command.as_bytes())?;
            writer.write_all(b"\r\n")?;
            writer.flush()?;
            Self::read_reply(&mut reader)?;
        }

        Ok(())
    }
}
