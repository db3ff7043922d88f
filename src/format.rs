//! Display formatting for amounts, counts and timestamps.

use chrono::{DateTime, NaiveDate, Utc};

/// `"KES 150,000"`. Fractions are rounded away.
pub fn format_currency(amount: f64, currency: &str) -> String {
  let rounded = amount.round();
  let sign = if rounded < 0.0 { "-" } else { "" };
  format!("{}{} {}", sign, currency, group_thousands(rounded.abs() as u64))
}

/// Compact count: `1.5M`, `2.3K`, `999`.
pub fn format_number(n: f64) -> String {
  if n >= 1_000_000.0 {
    format!("{:.1}M", n / 1_000_000.0)
  } else if n >= 1_000.0 {
    format!("{:.1}K", n / 1_000.0)
  } else if n.fract() == 0.0 {
    format!("{}", n as i64)
  } else {
    format!("{}", n)
  }
}

/// `"Mar 5, 2024"`. Input that is not a date comes back unchanged.
pub fn format_date(value: &str) -> String {
  match parse_date(value) {
    Some(date) => date.format("%b %-d, %Y").to_string(),
    None => value.to_string(),
  }
}

/// Days elapsed between `value` and `now` in words.
pub fn format_relative_time(value: &str, now: DateTime<Utc>) -> String {
  let Some(date) = parse_date(value) else {
    return value.to_string();
  };

  let days = (now.date_naive() - date).num_days();
  match days {
    d if d <= 0 => "Today".to_string(),
    1 => "Yesterday".to_string(),
    d if d < 7 => format!("{} days ago", d),
    d if d < 30 => format!("{} weeks ago", d / 7),
    d => format!("{} months ago", d / 30),
  }
}

pub fn format_salary(min: Option<f64>, max: Option<f64>, currency: &str) -> String {
  match (min, max) {
    (Some(min), Some(max)) if max != min => format!(
      "{} - {}",
      format_currency(min, currency),
      format_currency(max, currency)
    ),
    (Some(amount), _) | (None, Some(amount)) => format_currency(amount, currency),
    (None, None) => "Not disclosed".to_string(),
  }
}

/// `"full_time"` -> `"full time"`
pub fn humanize_enum(value: &str) -> String {
  value.replace('_', " ")
}

fn parse_date(value: &str) -> Option<NaiveDate> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
    return Some(dt.with_timezone(&Utc).date_naive());
  }
  NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn group_thousands(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}
