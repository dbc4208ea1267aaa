//! Pure pricing arithmetic shared by the quote services.
//!
//! None of these functions touch storage; services feed them snapshots.

use crate::config::WorkSchedule;

/// Machine operating rate in currency per minute.
///
/// `total_price / (years × work_days × hours × 60)`. A zero horizon or an
/// empty calendar yields `0.0` instead of dividing by zero.
#[must_use]
pub fn cost_per_minute(total_price: u64, depreciation_years: u32, schedule: &WorkSchedule) -> f64 {
    let minutes = u64::from(depreciation_years) * schedule.minutes_per_year();
    if minutes == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = total_price as f64 / minutes as f64;
    rate
}

/// Throughput over a set of prints: total grams over total minutes.
///
/// Returns `None` when no usable time was recorded.
#[must_use]
pub fn weighted_efficiency(total_weight_g: f64, total_time_min: f64) -> Option<f64> {
    if total_time_min > 0.0 && total_time_min.is_finite() && total_weight_g.is_finite() {
        Some(total_weight_g / total_time_min)
    } else {
        None
    }
}

/// Expected machine occupancy in minutes; zero when the rate is unusable.
#[must_use]
pub fn predicted_minutes(weight_g: f64, efficiency: f64) -> f64 {
    if efficiency > 0.0 {
        weight_g / efficiency
    } else {
        0.0
    }
}

/// Multiplier applied to the machine-time cost: `difficulty × (1 + risk)`.
#[must_use]
pub fn coefficient(difficulty_factor: f64, risk: f64) -> f64 {
    difficulty_factor * (1.0 + risk)
}

/// Renders minutes as `"{h}h {m}min"` from one hour up, otherwise `"{m}min"`.
/// Fractions of a minute are dropped.
#[must_use]
pub fn format_duration(minutes: f64) -> String {
    let whole = if minutes.is_finite() && minutes > 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = minutes.floor() as u64;
        whole
    } else {
        0
    };
    let hours = whole / 60;
    let mins = whole % 60;
    if hours > 0 {
        format!("{hours}h {mins}min")
    } else {
        format!("{mins}min")
    }
}

/// Currency-prefixed, thousands-separated amount with two decimals,
/// e.g. `¥12,345.00`.
#[must_use]
pub fn format_money(amount: f64, currency_symbol: &str) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };

    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{currency_symbol}{grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> WorkSchedule {
        WorkSchedule {
            work_days_per_year: 330,
            hours_per_day: 8,
        }
    }

    #[test]
    fn reference_machine_rate() {
        let rate = cost_per_minute(1_500_000, 3, &schedule());
        assert!((rate - 1_500_000.0 / 475_200.0).abs() < 1e-12);
        assert!((rate - 3.156).abs() < 1e-3);
    }

    #[test]
    fn rate_decreases_with_years_and_scales_with_price() {
        let s = schedule();
        for price in [1_u64, 1_500_000, 3_000_000] {
            let one = cost_per_minute(price, 1, &s);
            let two = cost_per_minute(price, 2, &s);
            let three = cost_per_minute(price, 3, &s);
            assert!(one > two && two > three);
        }
        let single = cost_per_minute(1_000_000, 2, &s);
        let double = cost_per_minute(2_000_000, 2, &s);
        assert!((double - 2.0 * single).abs() < 1e-12);
    }

    #[test]
    fn zero_years_is_guarded() {
        assert!(cost_per_minute(1_500_000, 0, &schedule()).abs() < f64::EPSILON);
    }

    #[test]
    fn weighted_efficiency_is_ratio_of_sums() {
        let eff = weighted_efficiency(100.0 + 10.0, 100.0 + 1.0).unwrap();
        assert!((eff - 110.0 / 101.0).abs() < 1e-12);
        assert!((eff - 5.5).abs() > 1.0);
        assert_eq!(weighted_efficiency(10.0, 0.0), None);
    }

    #[test]
    fn predicted_minutes_guards_zero_rate() {
        assert!(predicted_minutes(100.0, 0.0).abs() < f64::EPSILON);
        assert!((predicted_minutes(100.0, 0.05) - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn coefficient_combines_difficulty_and_risk() {
        assert!((coefficient(1.0, 0.0) - 1.0).abs() < f64::EPSILON);
        assert!((coefficient(1.5, 0.5) - 2.25).abs() < f64::EPSILON);
        assert!((coefficient(2.0, 2.0) - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(59.9), "59min");
        assert_eq!(format_duration(60.0), "1h 0min");
        assert_eq!(format_duration(2000.0), "33h 20min");
        assert_eq!(format_duration(0.0), "0min");
        assert_eq!(format_duration(f64::NAN), "0min");
    }

    #[test]
    fn money() {
        assert_eq!(format_money(12_345.0, "¥"), "¥12,345.00");
        assert_eq!(format_money(0.0, "¥"), "¥0.00");
        assert_eq!(format_money(999.996, "$"), "$1,000.00");
        assert_eq!(format_money(1_234_567.891, "¥"), "¥1,234,567.89");
        assert_eq!(format_money(-5.5, "€"), "-€5.50");
        assert_eq!(format_money(123.4, ""), "123.40");
    }
}
