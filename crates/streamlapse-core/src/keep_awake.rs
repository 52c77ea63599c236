//! OS idle/sleep prevention.
//!
//! Capture attempts reassert "system required" before running the tool so an
//! unattended machine does not sleep between schedules. Callers treat every
//! failure as non-fatal.

use std::io;

/// Keeps the host awake.
pub trait KeepAwake: Send + Sync {
    /// Tell the OS the system is busy.
    fn assert_awake(&self) -> io::Result<()>;
}

/// Platform implementation: `SetThreadExecutionState` on Windows, no-op elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemKeepAwake;

impl KeepAwake for SystemKeepAwake {
    #[cfg(target_os = "windows")]
    fn assert_awake(&self) -> io::Result<()> {
        use windows::Win32::System::Power::{
            SetThreadExecutionState, ES_AWAYMODE_REQUIRED, ES_CONTINUOUS, ES_SYSTEM_REQUIRED,
        };

        // SAFETY: plain Win32 call with constant flags, no pointers involved.
        let previous = unsafe {
            SetThreadExecutionState(ES_CONTINUOUS | ES_SYSTEM_REQUIRED | ES_AWAYMODE_REQUIRED)
        };
        if previous.0 == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    fn assert_awake(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Does nothing. Used by one-shot commands and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopKeepAwake;

impl KeepAwake for NoopKeepAwake {
    fn assert_awake(&self) -> io::Result<()> {
        Ok(())
    }
}
