//! Elapsed-lifetime display formatting for the terminal overlay.

/// Format a millisecond span as `"{H}H {M}M {S}S {mmm}MS"`. Hours are
/// unbounded; milliseconds are zero-padded to three digits.
pub fn format_elapsed(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1000;
    let msecs = ms % 1000;
    format!("{hours}H {mins}M {secs}S {msecs:03}MS")
}
