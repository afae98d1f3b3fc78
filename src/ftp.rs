//! FTP Connection Module
//!
//! Handles FTP connections and operations using the suppaftp crate, and
//! defines the [`FtpHandle`] interface the helpers are written against.

use std::io::Write;

use log::{debug, info};
use suppaftp::native_tls::TlsConnector;
use suppaftp::types::{FileType, FormatControl, Mode};
use suppaftp::{FtpError, FtpStream, NativeTlsConnector, NativeTlsFtpStream};

use crate::debug::ftp_trace;
use crate::error::{Error, Result};
use crate::transfer::{copy_with_progress, CallbackOptions, Progress};

/// Size type returned by [`FtpHandle::size_long`]
#[cfg(feature = "wide-size")]
pub type FileSize = u64;
#[cfg(not(feature = "wide-size"))]
pub type FileSize = u32;

pub const DEFAULT_PORT: u16 = 21;

/// Data representation used for a transfer or a SIZE query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Ascii,
    Binary,
}

impl TransferMode {
    pub fn as_char(self) -> char {
        match self {
            TransferMode::Ascii => 'A',
            TransferMode::Binary => 'I',
        }
    }

    fn file_type(self) -> FileType {
        match self {
            TransferMode::Ascii => FileType::Ascii(FormatControl::Default),
            TransferMode::Binary => FileType::Binary,
        }
    }
}

impl TryFrom<char> for TransferMode {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        match c {
            'A' => Ok(TransferMode::Ascii),
            'I' => Ok(TransferMode::Binary),
            other => Err(Error::InvalidMode(other)),
        }
    }
}

/// A live FTP session as seen by the helper functions.
///
/// Implementors own the protocol. Callers keep ownership of the handle and
/// lend it out per call.
pub trait FtpHandle {
    /// Register a progress callback. Implementations copy what they need out
    /// of `opts`; the record does not outlive the call.
    fn set_callback(&mut self, opts: &CallbackOptions) -> Result<()>;

    fn clear_callback(&mut self);

    /// Size of `path` on the server as reported by SIZE under `mode`.
    fn size_long(&mut self, path: &str, mode: TransferMode) -> Result<FileSize>;
}

/// Where and how to connect
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub use_tls: bool,
    /// Skip certificate validation for FTPS
    pub accept_invalid_certs: bool,
}

impl ConnectOptions {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

/// FTP Connection wrapper supporting both plain FTP and FTPS
pub struct FtpConnection {
    stream: FtpStreamVariant,
    callback: Option<CallbackOptions>,
}

/// Enum to handle both plain and TLS FTP streams
enum FtpStreamVariant {
    Plain(FtpStream),
    Tls(NativeTlsFtpStream),
}

impl FtpConnection {
    /// Connect, log in and switch to binary passive mode
    pub fn connect(opts: &ConnectOptions) -> Result<Self> {
        let addr = opts.addr();
        info!("Connecting to FTP server at {}", addr);

        let stream = if opts.use_tls {
            let connector = TlsConnector::builder()
                .danger_accept_invalid_certs(opts.accept_invalid_certs)
                .build()
                .map_err(|e| Error::Tls(e.to_string()))?;
            let native_connector = NativeTlsConnector::from(connector);

            let ftp_stream = NativeTlsFtpStream::connect(&addr)?;
            let mut ftp_stream = ftp_stream.into_secure(native_connector, &opts.server)?;
            ftp_stream.login(&opts.username, &opts.password)?;

            FtpStreamVariant::Tls(ftp_stream)
        } else {
            let mut ftp_stream = FtpStream::connect(&addr)?;
            ftp_stream.login(&opts.username, &opts.password)?;

            FtpStreamVariant::Plain(ftp_stream)
        };

        info!("Logged in as {}", opts.username);

        let mut conn = FtpConnection {
            stream,
            callback: None,
        };
        conn.set_transfer_type(TransferMode::Binary)?;
        conn.set_mode(Mode::Passive);

        Ok(conn)
    }

    fn set_mode(&mut self, mode: Mode) {
        ftp_trace!("ftp: data connection mode {:?}", mode);
        match &mut self.stream {
            FtpStreamVariant::Plain(stream) => stream.set_mode(mode),
            FtpStreamVariant::Tls(stream) => stream.set_mode(mode),
        }
    }

    fn set_transfer_type(&mut self, mode: TransferMode) -> Result<()> {
        ftp_trace!("ftp: -> TYPE {}", mode.as_char());
        match &mut self.stream {
            FtpStreamVariant::Plain(stream) => stream.transfer_type(mode.file_type())?,
            FtpStreamVariant::Tls(stream) => stream.transfer_type(mode.file_type())?,
        }
        Ok(())
    }

    /// Download `path` into `writer`, driving the registered callback.
    /// Returns the number of bytes written.
    ///
    /// With an idle callback registered, the data socket gets a read timeout
    /// of `idle_time` and every expiry invokes the callback.
    pub fn retrieve_to<W: Write + ?Sized>(
        &mut self,
        path: &str,
        writer: &mut W,
        mode: TransferMode,
    ) -> Result<u64> {
        debug!("Retrieving file: {}", path);
        self.set_transfer_type(mode)?;

        let mut progress = Progress::new(self.callback.as_ref());
        let idle = progress.idle_timeout();
        ftp_trace!("ftp: -> RETR {} (idle timeout {:?})", path, idle);

        let result = match &mut self.stream {
            FtpStreamVariant::Plain(stream) => {
                let mut data = stream.retr_as_stream(path)?;
                data.get_ref()
                    .set_read_timeout(idle)
                    .map_err(FtpError::ConnectionError)?;
                let copied = copy_with_progress(&mut data, &mut *writer, &mut progress);
                let finalized = stream.finalize_retr_stream(data);
                copied
                    .map_err(FtpError::ConnectionError)
                    .and_then(|n| finalized.map(|_| n))
            }
            FtpStreamVariant::Tls(stream) => {
                let mut data = stream.retr_as_stream(path)?;
                data.get_ref()
                    .set_read_timeout(idle)
                    .map_err(FtpError::ConnectionError)?;
                let copied = copy_with_progress(&mut data, &mut *writer, &mut progress);
                let finalized = stream.finalize_retr_stream(data);
                copied
                    .map_err(FtpError::ConnectionError)
                    .and_then(|n| finalized.map(|_| n))
            }
        };

        let xfered = finish_transfer(result, &progress)?;
        debug!("Retrieved {} bytes from {}", xfered, path);
        Ok(xfered)
    }

    /// Log out and close the control connection
    pub fn quit(mut self) -> Result<()> {
        ftp_trace!("ftp: -> QUIT");
        match &mut self.stream {
            FtpStreamVariant::Plain(stream) => stream.quit()?,
            FtpStreamVariant::Tls(stream) => stream.quit()?,
        }
        Ok(())
    }
}

impl FtpHandle for FtpConnection {
    fn set_callback(&mut self, opts: &CallbackOptions) -> Result<()> {
        debug!("Registering transfer callback: {:?}", opts);
        self.callback = Some(opts.clone());
        Ok(())
    }

    fn clear_callback(&mut self) {
        self.callback = None;
    }

    fn size_long(&mut self, path: &str, mode: TransferMode) -> Result<FileSize> {
        self.set_transfer_type(mode)?;

        ftp_trace!("ftp: -> SIZE {}", path);
        let size = match &mut self.stream {
            FtpStreamVariant::Plain(stream) => stream.size(path)?,
            FtpStreamVariant::Tls(stream) => stream.size(path)?,
        };
        ftp_trace!("ftp: <- {} bytes", size);

        FileSize::try_from(size).map_err(|_| Error::Unsupported("file sizes wider than FileSize"))
    }
}

/// Map a data-channel result, turning a callback abort into [`Error::Aborted`].
fn finish_transfer(
    result: std::result::Result<u64, FtpError>,
    progress: &Progress<'_>,
) -> Result<u64> {
    match result {
        Ok(n) => Ok(n),
        Err(_) if progress.aborted() => Err(Error::Aborted {
            xfered: progress.xfered(),
        }),
        Err(e) => Err(e.into()),
    }
}
