//! Port Interfaces
//!
//! Contracts the application layer needs from the outside world. The only
//! external input the command flow needs besides the message itself is the
//! current time.
//!
//! ## Driven Ports (Outbound)
//!
//! - `Clock`: wall-clock source for command timestamps

/// Wall-clock time source.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}
