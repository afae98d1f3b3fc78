//! ftplibhelp - small conveniences over an FTP client
//!
//! This crate wraps a suppaftp connection behind the [`FtpHandle`] trait and
//! offers a handful of helpers on top: a global debug switch, progress
//! callbacks during transfers, and 64-bit remote file sizes.

pub mod debug;
pub mod error;
pub mod ftp;
pub mod help;
pub mod transfer;

pub use error::{Error, Result};
pub use ftp::{ConnectOptions, FileSize, FtpConnection, FtpHandle, TransferMode};
pub use help::{has_wide_size_support, set_callback, set_debug, size_extended};
pub use transfer::{CallbackArg, CallbackOptions, FtpCallback};
