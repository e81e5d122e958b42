use super::types::{PartialWindows, WeekendPolicy, WeekendWindow};
use chrono::{Datelike, Duration, NaiveDate};

/// Fenêtres de week-end touchant l'horizon `[start, start + days)`.
///
/// Un horizon qui sort du calendrier représentable ne produit aucune fenêtre.
pub fn weekend_windows(
    start: NaiveDate,
    days: u32,
    policy: &WeekendPolicy,
) -> Vec<WeekendWindow> {
    if days == 0 || policy.length == 0 {
        return Vec::new();
    }
    let Some(end) = start.checked_add_signed(Duration::days(i64::from(days) - 1)) else {
        return Vec::new();
    };
    let len = i64::from(policy.length.min(7));

    // premier jour de fenêtre <= start
    let back = (start.weekday().num_days_from_monday() + 7
        - policy.first_day.num_days_from_monday())
        % 7;
    let Some(mut cursor) = start.checked_sub_signed(Duration::days(i64::from(back))) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    while cursor <= end {
        let full_end = cursor
            .checked_add_signed(Duration::days(len - 1))
            .unwrap_or(NaiveDate::MAX);
        let clipped = WeekendWindow {
            start: cursor.max(start),
            end: full_end.min(end),
        };
        let partial = clipped.start != cursor || clipped.end != full_end;
        if clipped.start <= clipped.end && !(partial && policy.partial == PartialWindows::Skip) {
            out.push(clipped);
        }
        match cursor.checked_add_signed(Duration::days(7)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    out
}

/// Décalage en jours depuis le début de l'horizon, si la date y appartient.
pub(super) fn day_offset(start: NaiveDate, days: u32, date: NaiveDate) -> Option<usize> {
    let k = date.signed_duration_since(start).num_days();
    (0..i64::from(days)).contains(&k).then_some(k as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn default_windows_are_fri_to_sun() {
        // lundi 2 juin 2025, deux semaines
        let w = weekend_windows(d(2025, 6, 2), 14, &WeekendPolicy::default());
        assert_eq!(
            w,
            vec![
                WeekendWindow {
                    start: d(2025, 6, 6),
                    end: d(2025, 6, 8),
                },
                WeekendWindow {
                    start: d(2025, 6, 13),
                    end: d(2025, 6, 15),
                },
            ]
        );
    }

    #[test]
    fn windows_are_truncated_at_both_ends() {
        // dimanche 8 juin 2025 -> samedi 14 juin
        let w = weekend_windows(d(2025, 6, 8), 7, &WeekendPolicy::default());
        assert_eq!(
            w,
            vec![
                WeekendWindow {
                    start: d(2025, 6, 8),
                    end: d(2025, 6, 8),
                },
                WeekendWindow {
                    start: d(2025, 6, 13),
                    end: d(2025, 6, 14),
                },
            ]
        );
    }

    #[test]
    fn skip_policy_drops_partial_windows() {
        let policy = WeekendPolicy {
            partial: PartialWindows::Skip,
            ..WeekendPolicy::default()
        };
        assert!(weekend_windows(d(2025, 6, 8), 7, &policy).is_empty());

        let policy = WeekendPolicy {
            first_day: Weekday::Sat,
            length: 2,
            partial: PartialWindows::Skip,
        };
        assert!(weekend_windows(d(2025, 6, 8), 7, &policy).is_empty());
        assert_eq!(
            weekend_windows(d(2025, 6, 2), 7, &policy),
            vec![WeekendWindow {
                start: d(2025, 6, 7),
                end: d(2025, 6, 8),
            }]
        );
    }

    #[test]
    fn horizon_past_the_calendar_yields_no_window() {
        let near_end = NaiveDate::MAX - Duration::days(3);
        assert!(weekend_windows(near_end, 14, &WeekendPolicy::default()).is_empty());
    }

    #[test]
    fn day_offset_is_bounded_by_horizon() {
        let start = d(2025, 6, 2);
        assert_eq!(day_offset(start, 7, d(2025, 6, 2)), Some(0));
        assert_eq!(day_offset(start, 7, d(2025, 6, 8)), Some(6));
        assert_eq!(day_offset(start, 7, d(2025, 6, 9)), None);
        assert_eq!(day_offset(start, 7, d(2025, 6, 1)), None);
    }
}
