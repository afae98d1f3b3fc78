//! Progress callbacks for data transfers.
//!
//! A callback registered on a connection is invoked while a file moves over
//! the data channel. It fires once more than `bytes_xferred` bytes have moved
//! since the previous byte-triggered call. It also fires each time the data
//! socket stays silent for `idle_time` milliseconds. A zero threshold
//! disables that trigger. Returning `false` from the callback aborts the
//! transfer.
//!
//! The idle trigger relies on the reader timing out: the connection sets the
//! data socket's read timeout from [`Progress::idle_timeout`] and a timed out
//! read counts as one idle tick.

use std::any::Any;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use log::debug;

/// Opaque user data handed back to the callback untouched.
pub type CallbackArg = Arc<dyn Any + Send + Sync>;

/// Progress callback: receives the running byte total and the user argument.
pub type FtpCallback = fn(xfered: u64, arg: Option<&CallbackArg>) -> bool;

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Callback registration record
#[derive(Clone, Default)]
pub struct CallbackOptions {
    pub cb_func: Option<FtpCallback>,
    pub cb_arg: Option<CallbackArg>,
    pub bytes_xferred: u32,
    /// Milliseconds
    pub idle_time: u32,
}

impl fmt::Debug for CallbackOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackOptions")
            .field("cb_func", &self.cb_func.map(|cb| cb as *const ()))
            .field("cb_arg", &self.cb_arg.as_ref().map(Arc::as_ptr))
            .field("bytes_xferred", &self.bytes_xferred)
            .field("idle_time", &self.idle_time)
            .finish()
    }
}

impl CallbackOptions {
    /// True when a callback is set and at least one trigger is active.
    pub fn is_active(&self) -> bool {
        self.cb_func.is_some() && (self.bytes_xferred > 0 || self.idle_time > 0)
    }

    fn idle(&self) -> Option<Duration> {
        (self.idle_time > 0).then(|| Duration::from_millis(u64::from(self.idle_time)))
    }
}

/// Running state of one transfer.
pub struct Progress<'a> {
    options: Option<&'a CallbackOptions>,
    xfered: u64,
    since_callback: u64,
    aborted: bool,
}

impl<'a> Progress<'a> {
    pub fn new(options: Option<&'a CallbackOptions>) -> Self {
        Progress {
            options: options.filter(|o| o.is_active()),
            xfered: 0,
            since_callback: 0,
            aborted: false,
        }
    }

    pub fn xfered(&self) -> u64 {
        self.xfered
    }

    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// Read timeout to put on the data socket, if an idle callback is wanted.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.options.and_then(CallbackOptions::idle)
    }

    /// Account for `n` more bytes, invoking the callback once the byte
    /// threshold is exceeded. Returns `false` once the callback has asked to
    /// stop.
    pub fn advance(&mut self, n: usize) -> bool {
        self.xfered += n as u64;

        let Some(opts) = self.options else {
            return true;
        };
        if opts.bytes_xferred == 0 {
            return true;
        }

        self.since_callback += n as u64;
        if self.since_callback <= u64::from(opts.bytes_xferred) {
            return true;
        }
        self.since_callback = 0;
        self.invoke(opts)
    }

    /// The data socket stayed silent for the idle timeout.
    pub fn idle_tick(&mut self) -> bool {
        match self.options {
            Some(opts) if opts.idle_time > 0 => self.invoke(opts),
            _ => true,
        }
    }

    fn invoke(&mut self, opts: &CallbackOptions) -> bool {
        let Some(cb) = opts.cb_func else {
            return true;
        };
        if !cb(self.xfered, opts.cb_arg.as_ref()) {
            debug!("Transfer aborted by callback at {} bytes", self.xfered);
            self.aborted = true;
        }
        !self.aborted
    }
}

fn aborted_error() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "transfer aborted by callback")
}

/// Copy `reader` into `writer`, feeding every chunk through `progress`.
///
/// A read that fails with `WouldBlock` or `TimedOut` is an idle tick when the
/// progress has an idle timeout, and a plain error otherwise. An abort
/// requested by the callback surfaces as `io::ErrorKind::Interrupted`; check
/// [`Progress::aborted`] to tell it apart from a real I/O failure.
pub fn copy_with_progress<R, W>(
    reader: &mut R,
    writer: &mut W,
    progress: &mut Progress<'_>,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let idle = progress.idle_timeout().is_some();
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e)
                if idle
                    && matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
            {
                if !progress.idle_tick() {
                    return Err(aborted_error());
                }
                continue;
            }
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        if !progress.advance(n) {
            return Err(aborted_error());
        }
    }
    writer.flush()?;
    Ok(progress.xfered())
}
