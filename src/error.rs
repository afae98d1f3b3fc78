//! Error type shared by the helpers and the connection wrapper.

use suppaftp::FtpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The FTP server or client library reported a failure
    #[error("ftp: {0}")]
    Ftp(#[from] FtpError),

    #[error("failed to create TLS connector: {0}")]
    Tls(String),

    #[error("invalid transfer mode {0:?}, expected 'A' or 'I'")]
    InvalidMode(char),

    /// The progress callback asked to stop the transfer
    #[error("transfer aborted by callback after {xfered} bytes")]
    Aborted { xfered: u64 },

    #[error("{0} is not supported in this build")]
    Unsupported(&'static str),
}
