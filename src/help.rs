//! Convenience wrappers over an [`FtpHandle`].
//!
//! Each helper forwards to exactly one handle call and hands its result back
//! unchanged. The handle is only borrowed for the duration of the call.

use crate::debug;
#[cfg(not(feature = "wide-size"))]
use crate::error::Error;
use crate::error::Result;
use crate::ftp::{FtpHandle, TransferMode};
use crate::transfer::{CallbackArg, CallbackOptions, FtpCallback};

/// Turn the FTP layer's debug output on or off.
pub fn set_debug(flag: bool) {
    debug::set_debug_level(if flag { 1 } else { 0 });
}

/// Register `cb` on `handle`, to be called once more than `bytes_xferred`
/// bytes have moved and whenever the data connection is silent for
/// `idle_time` milliseconds.
pub fn set_callback<H: FtpHandle + ?Sized>(
    cb: Option<FtpCallback>,
    arg: Option<CallbackArg>,
    bytes_xferred: u32,
    idle_time: u32,
    handle: &mut H,
) -> Result<()> {
    let opts = CallbackOptions {
        cb_func: cb,
        cb_arg: arg,
        bytes_xferred,
        idle_time,
    };
    handle.set_callback(&opts)
}

/// Size of a remote file as a 64-bit value.
#[cfg(feature = "wide-size")]
pub fn size_extended<H: FtpHandle + ?Sized>(
    path: &str,
    mode: TransferMode,
    handle: &mut H,
) -> Result<u64> {
    let size = handle.size_long(path, mode)?;
    Ok(u64::from(size))
}

/// Size of a remote file as a 64-bit value.
///
/// This build has no wide-size support, so the handle is never asked.
#[cfg(not(feature = "wide-size"))]
pub fn size_extended<H: FtpHandle + ?Sized>(
    _path: &str,
    _mode: TransferMode,
    _handle: &mut H,
) -> Result<u64> {
    Err(Error::Unsupported("64-bit file sizes"))
}

/// Whether [`size_extended`] can return sizes in this build.
pub const fn has_wide_size_support() -> bool {
    cfg!(feature = "wide-size")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ftp::FileSize;
    use std::collections::HashMap;
    use std::sync::Arc;
    use suppaftp::FtpError;

    /// In-memory handle that records what the helpers hand it.
    #[derive(Default)]
    struct FakeHandle {
        seen: Option<CallbackOptions>,
        reject_callbacks: bool,
        files: HashMap<String, FileSize>,
        size_queries: Vec<(String, TransferMode)>,
    }

    impl FtpHandle for FakeHandle {
        fn set_callback(&mut self, opts: &CallbackOptions) -> Result<()> {
            if self.reject_callbacks {
                return Err(Error::Ftp(FtpError::BadResponse));
            }
            self.seen = Some(opts.clone());
            Ok(())
        }

        fn clear_callback(&mut self) {
            self.seen = None;
        }

        fn size_long(&mut self, path: &str, mode: TransferMode) -> Result<FileSize> {
            self.size_queries.push((path.to_string(), mode));
            self.files
                .get(path)
                .copied()
                .ok_or(Error::Ftp(FtpError::BadResponse))
        }
    }

    fn tick(_xfered: u64, _arg: Option<&CallbackArg>) -> bool {
        true
    }

    #[test]
    fn test_set_debug_last_write_wins() {
        set_debug(true);
        assert_eq!(debug::debug_level(), 1);
        set_debug(true);
        assert_eq!(debug::debug_level(), 1);
        set_debug(false);
        assert_eq!(debug::debug_level(), 0);

        debug::set_debug_level(7);
        set_debug(false);
        assert_eq!(debug::debug_level(), 0);
        assert!(!debug::enabled());
    }

    #[test]
    fn test_set_callback_forwards_fields() {
        let mut handle = FakeHandle::default();
        let arg: CallbackArg = Arc::new(42u32);

        set_callback(Some(tick), Some(arg.clone()), 4096, 250, &mut handle).unwrap();

        let seen = handle.seen.take().unwrap();
        assert_eq!(
            seen.cb_func.map(|f| f as usize),
            Some(tick as FtpCallback as usize)
        );
        assert!(Arc::ptr_eq(seen.cb_arg.as_ref().unwrap(), &arg));
        assert_eq!(seen.bytes_xferred, 4096);
        assert_eq!(seen.idle_time, 250);
    }

    #[test]
    fn test_set_callback_forwards_empty_values() {
        let mut handle = FakeHandle::default();

        set_callback(None, None, 0, 0, &mut handle).unwrap();

        let seen = handle.seen.unwrap();
        assert!(seen.cb_func.is_none());
        assert!(seen.cb_arg.is_none());
        assert_eq!(seen.bytes_xferred, 0);
        assert_eq!(seen.idle_time, 0);
    }

    #[test]
    fn test_set_callback_returns_handle_error() {
        let mut handle = FakeHandle {
            reject_callbacks: true,
            ..Default::default()
        };

        let err = set_callback(Some(tick), None, 1, 1, &mut handle).unwrap_err();
        assert!(matches!(err, Error::Ftp(FtpError::BadResponse)));
        assert!(handle.seen.is_none());
    }

    #[test]
    fn test_has_wide_size_support_is_constant() {
        let first = has_wide_size_support();
        for _ in 0..3 {
            assert_eq!(has_wide_size_support(), first);
        }
        assert_eq!(first, cfg!(feature = "wide-size"));
    }

    #[cfg(feature = "wide-size")]
    #[test]
    fn test_size_extended_returns_handle_size() {
        let mut handle = FakeHandle::default();
        handle.files.insert("/pub/big.iso".to_string(), 6_000_000_000);
        handle.files.insert("/pub/readme.txt".to_string(), 812);

        assert_eq!(
            size_extended("/pub/big.iso", TransferMode::Binary, &mut handle).unwrap(),
            6_000_000_000
        );
        assert_eq!(
            size_extended("/pub/readme.txt", TransferMode::Ascii, &mut handle).unwrap(),
            812
        );
        assert_eq!(
            handle.size_queries,
            vec![
                ("/pub/big.iso".to_string(), TransferMode::Binary),
                ("/pub/readme.txt".to_string(), TransferMode::Ascii),
            ]
        );
    }

    #[cfg(feature = "wide-size")]
    #[test]
    fn test_size_extended_missing_path_keeps_prior_size() {
        let mut handle = FakeHandle::default();
        let mut size = 99u64;

        match size_extended("/nope", TransferMode::Binary, &mut handle) {
            Ok(s) => size = s,
            Err(err) => assert!(matches!(err, Error::Ftp(FtpError::BadResponse))),
        }
        assert_eq!(size, 99);
        assert_eq!(handle.size_queries.len(), 1);
    }

    #[cfg(not(feature = "wide-size"))]
    #[test]
    fn test_size_extended_unsupported_without_wide_size() {
        let mut handle = FakeHandle::default();
        handle.files.insert("/pub/readme.txt".to_string(), 812);

        let err =
            size_extended("/pub/readme.txt", TransferMode::Binary, &mut handle).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert!(handle.size_queries.is_empty());
        assert!(!has_wide_size_support());
    }
}
