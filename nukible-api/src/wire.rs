//! Rendering helpers for the bridge HTTP wire format.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Second-precision ISO timestamp without offset, as used by state objects.
pub const SECOND_PRECISION: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

pub fn timestamp(value: OffsetDateTime) -> String {
    value
        .format(SECOND_PRECISION)
        .expect("valid format description")
}

/// UTC timestamp with trailing `Z`, as used by the `currentTime` field.
pub fn timestamp_utc(value: OffsetDateTime) -> String {
    let mut rendered = timestamp(value.to_offset(UtcOffset::UTC));
    rendered.push('Z');
    rendered
}

/// Device ids travel as lowercase hex without a `0x` prefix.
pub fn hex_id(id: u32) -> String {
    format!("{id:x}")
}

/// Accepts the id formats clients are known to send: bare hex digits in
/// either case, optionally with a `0x` prefix.
pub fn parse_hex_id(value: &str) -> Option<u32> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(digits, 16).ok()
}
