//! Display formatting helpers.

use rust_decimal::Decimal;

/// Truncates an identifier for log output.
///
/// Shows only the first 8 characters followed by ".." for longer ids.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((cut, _)) => format!("{}..", &id[..cut]),
		None => id.to_string(),
	}
}

/// Formats a monetary amount the way statements print it, e.g. "C$ 12.50".
pub fn format_amount(amount: Decimal) -> String {
	format!("C$ {:.2}", amount.round_dp(2))
}

/// Current unix timestamp in seconds, or 0 if the clock is before the epoch.
pub fn current_timestamp() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("abc"), "abc");
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(truncate_id("123456789"), "12345678..");
	}

	#[test]
	fn test_format_amount() {
		assert_eq!(format_amount(Decimal::new(125, 1)), "C$ 12.50");
		assert_eq!(format_amount(Decimal::ZERO), "C$ 0.00");
	}
}
