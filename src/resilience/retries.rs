//! Retry classification for the accept loop.

use std::io;

// errno values for per-process and system-wide fd exhaustion.
const EMFILE: i32 = 24;
const ENFILE: i32 = 23;

/// Whether an accept error is worth retrying after a short pause.
///
/// Aborted handshakes only affect the one peer. Fd exhaustion clears once
/// other connections close. Anything else ends the accept loop.
pub fn is_transient_accept_error(err: &io::Error) -> bool {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::TimedOut => true,
        _ => matches!(err.raw_os_error(), Some(EMFILE) | Some(ENFILE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_accept_errors() {
        assert!(is_transient_accept_error(&io::Error::from(io::ErrorKind::ConnectionAborted)));
        assert!(is_transient_accept_error(&io::Error::from_raw_os_error(EMFILE)));
        assert!(!is_transient_accept_error(&io::Error::from(io::ErrorKind::InvalidInput)));
        assert!(!is_transient_accept_error(&io::Error::other("listener gone")));
    }
}
