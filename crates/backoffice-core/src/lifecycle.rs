//! Due-date rules for orders.
//!
//! Everything here is a pure function of `(status, due_date, now)`. Urgency
//! and the overdue check count calendar days between the two local midnights,
//! while the countdown text counts raw 24-hour periods. The two can disagree
//! near midnight and both behaviours are kept as they are.

use backoffice_types::{Badge, StatusBucket, Urgency};
use chrono::{DateTime, TimeZone};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Number of days after which an upcoming due date stops being highlighted.
const WARNING_WINDOW_DAYS: i64 = 2;

/// Everything derived from an order on one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
	pub badge: Badge,
	pub urgency: Urgency,
	/// `None` when the order has no due date.
	pub countdown: Option<String>,
	/// Whether the caller must write the pending status now.
	pub should_force: bool,
}

/// Integer division rounding towards positive infinity. `divisor` must be positive.
fn ceil_div(dividend: i64, divisor: i64) -> i64 {
	let quotient = dividend / divisor;
	if dividend % divisor > 0 {
		quotient + 1
	} else {
		quotient
	}
}

fn local_midnight<Tz: TimeZone>(value: &DateTime<Tz>) -> Option<DateTime<Tz>> {
	let midnight = value.date_naive().and_hms_opt(0, 0, 0)?;
	value.timezone().from_local_datetime(&midnight).earliest()
}

/// Calendar days from `now` to `due`, each taken at its own local midnight.
///
/// Negative when the due date lies on an earlier calendar day.
pub fn calendar_days_until<Tz: TimeZone>(due: &DateTime<Tz>, now: &DateTime<Tz>) -> i64 {
	match (local_midnight(due), local_midnight(now)) {
		(Some(due_midnight), Some(now_midnight)) => {
			let diff = due_midnight.signed_duration_since(now_midnight);
			ceil_div(diff.num_milliseconds(), DAY_MS)
		},
		// Midnight skipped by a DST jump; fall back to plain date arithmetic.
		_ => due
			.date_naive()
			.signed_duration_since(now.date_naive())
			.num_days(),
	}
}

/// Urgency tier shown next to an order's due date.
pub fn classify_urgency<Tz: TimeZone>(
	status: &str,
	due_date: Option<&DateTime<Tz>>,
	now: &DateTime<Tz>,
) -> Urgency {
	let Some(due) = due_date else {
		return Urgency::None;
	};
	if StatusBucket::classify(status).is_delivered() {
		return Urgency::Success;
	}

	match calendar_days_until(due, now) {
		days if days < 0 => Urgency::Danger,
		days if days <= WARNING_WINDOW_DAYS => Urgency::Warning,
		_ => Urgency::None,
	}
}

/// Remaining or overdue days as displayed to staff.
///
/// Whole remaining periods are rounded up, so a due time equal to `now`
/// reads "0 días restantes" and is not clamped to one.
pub fn countdown_text<Tz: TimeZone>(due_date: &DateTime<Tz>, now: &DateTime<Tz>) -> String {
	let diff_ms = due_date
		.clone()
		.signed_duration_since(now.clone())
		.num_milliseconds();
	let days = ceil_div(diff_ms.abs(), DAY_MS);

	match (diff_ms >= 0, days == 1) {
		(true, true) => "1 día restante".to_string(),
		(true, false) => format!("{} días restantes", days),
		(false, true) => "Vencido: 1 día".to_string(),
		(false, false) => format!("Vencido: {} días", days),
	}
}

/// Whether an order must be moved to the pending status.
///
/// Only orders whose due date is on an earlier calendar day and that are
/// neither delivered nor already pending qualify, and only once per
/// tracking session.
pub fn evaluate_auto_force<Tz: TimeZone>(
	status: &str,
	due_date: Option<&DateTime<Tz>>,
	now: &DateTime<Tz>,
	already_forced: bool,
) -> bool {
	if already_forced {
		return false;
	}
	let Some(due) = due_date else {
		return false;
	};

	let bucket = StatusBucket::classify(status);
	if bucket.is_delivered() || bucket.is_pending() {
		return false;
	}

	calendar_days_until(due, now) < 0
}

/// Runs every rule for one order.
pub fn evaluate<Tz: TimeZone>(
	status: &str,
	due_date: Option<&DateTime<Tz>>,
	now: &DateTime<Tz>,
	already_forced: bool,
) -> Evaluation {
	Evaluation {
		badge: Badge::for_status(status),
		urgency: classify_urgency(status, due_date, now),
		countdown: due_date.map(|due| countdown_text(due, now)),
		should_force: evaluate_auto_force(status, due_date, now, already_forced),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, FixedOffset, Utc};

	fn at(value: &str) -> DateTime<FixedOffset> {
		DateTime::parse_from_rfc3339(value).unwrap()
	}

	#[test]
	fn test_ceil_div_signs() {
		assert_eq!(ceil_div(0, DAY_MS), 0);
		assert_eq!(ceil_div(1, DAY_MS), 1);
		assert_eq!(ceil_div(DAY_MS, DAY_MS), 1);
		assert_eq!(ceil_div(-1, DAY_MS), 0);
		assert_eq!(ceil_div(-DAY_MS - 1, DAY_MS), -1);
	}

	#[test]
	fn test_no_due_date_has_no_urgency() {
		let now = at("2024-03-10T12:00:00-06:00");
		assert_eq!(classify_urgency("en proceso", None, &now), Urgency::None);
		assert_eq!(classify_urgency("entregado", None, &now), Urgency::None);
		assert!(!evaluate_auto_force("en proceso", None, &now, false));

		let evaluation = evaluate("en proceso", None, &now, false);
		assert_eq!(evaluation.countdown, None);
		assert!(!evaluation.should_force);
	}

	#[test]
	fn test_delivered_is_always_success() {
		let now = at("2024-03-10T12:00:00-06:00");
		let long_ago = at("2020-01-01T00:00:00-06:00");
		let next_week = now + Duration::days(7);

		assert_eq!(classify_urgency("Entregado", Some(&long_ago), &now), Urgency::Success);
		assert_eq!(classify_urgency("entregado", Some(&next_week), &now), Urgency::Success);
		assert!(!evaluate_auto_force("entregado", Some(&long_ago), &now, false));
	}

	#[test]
	fn test_warning_window_boundaries() {
		let now = at("2024-03-10T18:00:00-06:00");

		let today = at("2024-03-10T08:00:00-06:00");
		let in_two_days = at("2024-03-12T23:00:00-06:00");
		let in_three_days = at("2024-03-13T00:30:00-06:00");
		let yesterday = at("2024-03-09T23:59:00-06:00");

		assert_eq!(classify_urgency("en proceso", Some(&today), &now), Urgency::Warning);
		assert_eq!(classify_urgency("en proceso", Some(&in_two_days), &now), Urgency::Warning);
		assert_eq!(classify_urgency("en proceso", Some(&in_three_days), &now), Urgency::None);
		assert_eq!(classify_urgency("en proceso", Some(&yesterday), &now), Urgency::Danger);
	}

	#[test]
	fn test_calendar_days_ignore_time_of_day() {
		let now = at("2024-03-10T23:59:00-06:00");
		let tomorrow_early = at("2024-03-11T00:01:00-06:00");
		assert_eq!(calendar_days_until(&tomorrow_early, &now), 1);
		assert_eq!(calendar_days_until(&now, &tomorrow_early), -1);
	}

	#[test]
	fn test_countdown_singular_and_plural() {
		let now = at("2024-03-10T12:00:00-06:00");

		assert_eq!(countdown_text(&(now + Duration::days(1)), &now), "1 día restante");
		assert_eq!(countdown_text(&(now + Duration::hours(3)), &now), "1 día restante");
		assert_eq!(countdown_text(&(now + Duration::days(2)), &now), "2 días restantes");
		assert_eq!(
			countdown_text(&(now + Duration::days(2) + Duration::minutes(1)), &now),
			"3 días restantes"
		);
		assert_eq!(countdown_text(&now, &now), "0 días restantes");
	}

	#[test]
	fn test_countdown_overdue() {
		let now = at("2024-03-10T12:00:00-06:00");

		assert_eq!(countdown_text(&(now - Duration::hours(1)), &now), "Vencido: 1 día");
		assert_eq!(countdown_text(&(now - Duration::days(1)), &now), "Vencido: 1 día");
		assert_eq!(countdown_text(&(now - Duration::days(3)), &now), "Vencido: 3 días");
	}

	#[test]
	fn test_countdown_uses_raw_difference() {
		// Due tomorrow on the calendar but only two hours away.
		let now = at("2024-03-10T23:00:00-06:00");
		let due = at("2024-03-11T01:00:00-06:00");

		assert_eq!(calendar_days_until(&due, &now), 1);
		assert_eq!(countdown_text(&due, &now), "1 día restante");

		// Overdue by calendar day while the raw difference is under an hour.
		let due = at("2024-03-10T23:50:00-06:00");
		let now = at("2024-03-11T00:10:00-06:00");
		assert_eq!(classify_urgency("en proceso", Some(&due), &now), Urgency::Danger);
		assert_eq!(countdown_text(&due, &now), "Vencido: 1 día");
	}

	#[test]
	fn test_in_process_overdue_is_forced_once() {
		let now = at("2024-03-10T12:00:00-06:00");
		let due = now - Duration::days(3);

		assert!(evaluate_auto_force("en proceso", Some(&due), &now, false));
		assert!(!evaluate_auto_force("en proceso", Some(&due), &now, true));
	}

	#[test]
	fn test_force_rules_by_status() {
		let now = at("2024-03-10T12:00:00-06:00");
		let due = now - Duration::days(1);

		assert!(evaluate_auto_force("Listo para retirar", Some(&due), &now, false));
		assert!(evaluate_auto_force("", Some(&due), &now, false));
		assert!(!evaluate_auto_force("Pendiente", Some(&due), &now, false));
		assert!(!evaluate_auto_force("pendiente de pago", Some(&due), &now, false));
		assert!(!evaluate_auto_force("ENTREGADO", Some(&due), &now, false));
	}

	#[test]
	fn test_pending_and_in_process_label() {
		let now = at("2024-03-10T12:00:00-06:00");
		let due = now - Duration::days(2);

		let evaluation = evaluate("pendiente, en proceso", Some(&due), &now, false);
		assert_eq!(evaluation.badge, Badge::Warning);
		assert_eq!(evaluation.urgency, Urgency::Danger);
		assert!(!evaluation.should_force);
	}

	#[test]
	fn test_same_day_is_not_forced() {
		let now = at("2024-03-10T18:00:00-06:00");
		let earlier_today = at("2024-03-10T09:00:00-06:00");

		assert!(!evaluate_auto_force("en proceso", Some(&earlier_today), &now, false));
		assert_eq!(countdown_text(&earlier_today, &now), "Vencido: 1 día");
	}

	#[test]
	fn test_evaluate_combines_rules() {
		let now = Utc::now();
		let due = now - Duration::days(5);

		let evaluation = evaluate("en proceso", Some(&due), &now, false);
		assert_eq!(evaluation.badge, Badge::Warning);
		assert_eq!(evaluation.urgency, Urgency::Danger);
		assert_eq!(evaluation.countdown.as_deref(), Some("Vencido: 5 días"));
		assert!(evaluation.should_force);
	}
}
