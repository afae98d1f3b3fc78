//! Process-wide debug switch for the FTP layer.
//!
//! The flag is a plain integer, 0 = off and anything else = on. Reads and
//! writes are single relaxed atomic operations: concurrent writers race and
//! the last store wins, there is no further synchronization.

use std::sync::atomic::{AtomicI32, Ordering};

static FTPLIB_DEBUG: AtomicI32 = AtomicI32::new(0);

/// Store a raw debug level.
pub fn set_debug_level(level: i32) {
    FTPLIB_DEBUG.store(level, Ordering::Relaxed);
}

/// Current raw debug level.
pub fn debug_level() -> i32 {
    FTPLIB_DEBUG.load(Ordering::Relaxed)
}

pub fn enabled() -> bool {
    debug_level() != 0
}

/// `log::debug!` that only fires while the FTP debug flag is set.
macro_rules! ftp_trace {
    ($($arg:tt)+) => {
        if $crate::debug::enabled() {
            log::debug!($($arg)+);
        }
    };
}

pub(crate) use ftp_trace;
