/// Emits a DEBUG trace line for one handshake component unless the session
/// is inside a timing-critical section.
///
/// Usage:
/// ```rust,ignore
/// ec_trace!(session, "pio", "PortRead(0x{:02X}) = 0x{:02X}", port, value);
/// ```
/// Logs with target `ecreader::pio`, so the fern formatter prints
/// `[..][DEBUG][ecreader::pio][pid=..][tid=..] PortRead(0x66) = 0x00`.
#[macro_export]
macro_rules! ec_trace {
    ($session:expr, $component:literal, $fmt:literal $(, $($arg:tt)+)?) => {
        if $session.tracing() {
            log::debug!(target: concat!("ecreader::", $component), $fmt $(, $($arg)+)?);
        }
    };
}
