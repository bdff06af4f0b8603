//! Disclosure precedence.
//!
//! The provider can return several rows for one security and reporting
//! period: the original filing, corrections, restatements, consolidated and
//! parent-only variants. Exactly one survives, chosen by these keys in order:
//!
//! 1. report type rank, higher wins ([`report_type_rank`])
//! 2. update flag, `"1"` beats anything else
//! 3. announcement date, later wins; taken from `f_ann_date`, else
//!    `ann_date`, else the period end itself
//!
//! Rows that still tie are ordered by their content so the same row wins
//! for any input order.

use crate::period::parse_yyyymmdd;
use crate::record::Record;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Priority of a statement report type code. Unknown or absent codes rank 0.
///
/// Categories run from annual down to single quarter; each Tushare code is
/// placed in the category its statement serves.
///
/// | rank | category | codes |
/// |------|----------|-------|
/// | 5 | annual | 1 (consolidated) |
/// | 4 | first three quarters, consolidated | 4 (consolidated, adjusted) |
/// | 3 | semiannual | 5, 11 (consolidated, before adjustment) |
/// | 2 | other adjusted / combined | 6, 9, 10, 12 (parent company) |
/// | 1 | single quarter | 2, 3, 7, 8 (single-quarter statements) |
pub fn report_type_rank(report_type: Option<&str>) -> u8 {
    match report_type.map(str::trim) {
        Some("1") => 5,
        Some("4") => 4,
        Some("5" | "11") => 3,
        Some("6" | "9" | "10" | "12") => 2,
        Some("2" | "3" | "7" | "8") => 1,
        _ => 0,
    }
}

/// Priority of an update flag.
pub fn update_flag_rank(update_flag: Option<&str>) -> u8 {
    u8::from(update_flag.map(str::trim) == Some("1"))
}

/// Effective announcement date of a record.
pub fn announcement_date(record: &Record) -> NaiveDate {
    record
        .f_ann_date
        .as_deref()
        .and_then(parse_yyyymmdd)
        .or_else(|| record.ann_date.as_deref().and_then(parse_yyyymmdd))
        .unwrap_or(record.end_date)
}

/// Total order on candidates for the same period. The greatest wins.
pub fn precedence(a: &Record, b: &Record) -> Ordering {
    report_type_rank(a.report_type.as_deref())
        .cmp(&report_type_rank(b.report_type.as_deref()))
        .then_with(|| {
            update_flag_rank(a.update_flag.as_deref())
                .cmp(&update_flag_rank(b.update_flag.as_deref()))
        })
        .then_with(|| announcement_date(a).cmp(&announcement_date(b)))
        .then_with(|| content_order(a, b))
}

fn content_order(a: &Record, b: &Record) -> Ordering {
    a.ann_date
        .cmp(&b.ann_date)
        .then_with(|| a.f_ann_date.cmp(&b.f_ann_date))
        .then_with(|| a.report_type.cmp(&b.report_type))
        .then_with(|| a.update_flag.cmp(&b.update_flag))
        .then_with(|| {
            a.values
                .iter()
                .zip(&b.values)
                .map(|(x, y)| value_order(*x, *y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}

fn value_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

/// Keep one record per `(ts_code, end_date)`, sorted by that key.
pub fn deduplicate(records: Vec<Record>) -> Vec<Record> {
    let mut winners: BTreeMap<(String, NaiveDate), Record> = BTreeMap::new();
    for record in records {
        let key = (record.ts_code.clone(), record.end_date);
        match winners.get_mut(&key) {
            Some(current) => {
                if precedence(&record, current).is_gt() {
                    *current = record;
                }
            }
            None => {
                winners.insert(key, record);
            }
        }
    }
    winners.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(
        report_type: Option<&str>,
        update_flag: Option<&str>,
        f_ann: Option<&str>,
        value: f64,
    ) -> Record {
        Record {
            ts_code: "A".to_string(),
            end_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            ann_date: Some("20240320".to_string()),
            f_ann_date: f_ann.map(str::to_string),
            report_type: report_type.map(str::to_string),
            update_flag: update_flag.map(str::to_string),
            values: vec![Some(value)],
        }
    }

    fn permutations(items: &[Record]) -> Vec<Vec<Record>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for idx in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(idx);
            for mut tail in permutations(&rest) {
                tail.insert(0, head.clone());
                out.push(tail);
            }
        }
        out
    }

    #[rstest]
    #[case(Some("1"), 5)]
    #[case(Some("4"), 4)]
    #[case(Some("11"), 3)]
    #[case(Some("6"), 2)]
    #[case(Some("2"), 1)]
    #[case(Some("99"), 0)]
    #[case(None, 0)]
    fn test_report_type_rank(#[case] code: Option<&str>, #[case] rank: u8) {
        assert_eq!(report_type_rank(code), rank);
    }

    #[test]
    fn test_single_quarter_codes_rank_below_other_categories() {
        let single_quarter = ["2", "3", "7", "8"];
        let others = ["1", "4", "5", "11", "6", "9", "10", "12"];
        for sq in single_quarter {
            assert_eq!(report_type_rank(Some(sq)), 1);
            for other in others {
                assert!(report_type_rank(Some(other)) > report_type_rank(Some(sq)));
            }
        }
    }

    #[test]
    fn test_higher_report_type_wins_either_order() {
        let consolidated = record(Some("1"), None, None, 1.0);
        let parent = record(Some("6"), Some("1"), Some("20250101"), 2.0);

        let kept = deduplicate(vec![consolidated.clone(), parent.clone()]);
        assert_eq!(kept, vec![consolidated.clone()]);
        let kept = deduplicate(vec![parent, consolidated.clone()]);
        assert_eq!(kept, vec![consolidated]);
    }

    #[test]
    fn test_update_flag_breaks_report_type_tie() {
        let original = record(Some("1"), Some("0"), Some("20250101"), 1.0);
        let updated = record(Some("1"), Some("1"), None, 2.0);
        let kept = deduplicate(vec![updated.clone(), original]);
        assert_eq!(kept[0].values, vec![Some(2.0)]);
    }

    #[test]
    fn test_latest_announcement_wins() {
        let first = record(Some("1"), Some("1"), Some("20240320"), 1.0);
        let restated = record(Some("1"), Some("1"), Some("20240830"), 2.0);
        let kept = deduplicate(vec![restated, first]);
        assert_eq!(kept[0].values, vec![Some(2.0)]);
    }

    #[test]
    fn test_announcement_date_fallbacks() {
        let mut r = record(None, None, Some("bad"), 1.0);
        assert_eq!(announcement_date(&r), NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        r.ann_date = None;
        assert_eq!(announcement_date(&r), r.end_date);
    }

    #[test]
    fn test_same_winner_for_every_permutation() {
        let candidates = vec![
            record(Some("1"), Some("0"), Some("20240320"), 1.0),
            record(Some("1"), Some("0"), Some("20240320"), 3.0),
            record(None, None, None, 4.0),
            record(Some("1"), Some("0"), Some("20240320"), 2.0),
        ];
        let expected = deduplicate(candidates.clone());
        assert_eq!(expected.len(), 1);
        assert_eq!(expected[0].values, vec![Some(3.0)]);
        for permutation in permutations(&candidates) {
            assert_eq!(deduplicate(permutation), expected);
        }
    }

    #[test]
    fn test_output_sorted_and_unique_per_key() {
        let mut b = record(Some("1"), None, None, 1.0);
        b.ts_code = "B".to_string();
        let mut a_q3 = record(Some("1"), None, None, 2.0);
        a_q3.end_date = NaiveDate::from_ymd_opt(2023, 9, 30).unwrap();
        let a_q4 = record(Some("1"), None, None, 3.0);

        let kept = deduplicate(vec![b, a_q4.clone(), a_q3.clone(), a_q4]);
        let keys: Vec<(&str, NaiveDate)> = kept
            .iter()
            .map(|r| (r.ts_code.as_str(), r.end_date))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A", a_q3.end_date),
                ("A", NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()),
                ("B", NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()),
            ]
        );
    }
}
