use std::cmp::Reverse;

use serde_json::{json, Value};

/// Accumulated duration and entry count for one project or activity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupTotals {
    pub seconds: i64,
    pub count: usize,
}

/// Aggregated statistics over one fetched page of timesheet records.
///
/// Groupings keep discovery order; sorting happens only when rendering.
/// All accumulation is in whole seconds, hours are derived on read so
/// rounding never compounds across groups.
#[derive(Debug, Default)]
pub struct Summary {
    pub total_entries: usize,
    pub total_seconds: i64,
    pub billable_seconds: i64,
    pub by_project: Vec<(Option<i64>, GroupTotals)>,
    pub by_activity: Vec<(Option<i64>, GroupTotals)>,
}

impl Summary {
    /// Reduces a list of timesheet records in a single pass.
    ///
    /// Records are loosely typed documents; the fields read here are
    /// coerced with explicit defaults (`duration` 0, `billable` false)
    /// and entries without a project or activity are grouped under the
    /// distinguished `None` key rather than dropped.
    pub fn from_entries(entries: &[Value]) -> Self {
        let mut summary = Self {
            total_entries: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            let duration = entry.get("duration").and_then(Value::as_i64).unwrap_or(0);
            let billable = entry
                .get("billable")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let project = entry.get("project").and_then(Value::as_i64);
            let activity = entry.get("activity").and_then(Value::as_i64);

            summary.total_seconds += duration;
            if billable {
                summary.billable_seconds += duration;
            }
            bump(&mut summary.by_project, project, duration);
            bump(&mut summary.by_activity, activity, duration);
        }

        summary
    }

    pub fn total_hours(&self) -> f64 {
        self.total_seconds as f64 / 3600.0
    }

    pub fn billable_hours(&self) -> f64 {
        self.billable_seconds as f64 / 3600.0
    }

    /// Derived by subtraction so billable + non-billable always equals total.
    pub fn non_billable_hours(&self) -> f64 {
        self.total_hours() - self.billable_hours()
    }

    pub fn billable_percent(&self) -> f64 {
        percent_of_total(self.billable_hours(), self.total_hours())
    }

    pub fn non_billable_percent(&self) -> f64 {
        percent_of_total(self.non_billable_hours(), self.total_hours())
    }

    /// Structured form of the summary, hours rounded to 2 decimals.
    pub fn to_json(&self) -> Value {
        json!({
            "total_entries": self.total_entries,
            "total_seconds": self.total_seconds,
            "total_hours": round2(self.total_hours()),
            "billable_seconds": self.billable_seconds,
            "billable_hours": round2(self.billable_hours()),
            "non_billable_hours": round2(self.non_billable_hours()),
            "by_project": groups_json(&self.by_project),
            "by_activity": groups_json(&self.by_activity),
        })
    }
}

/// Adds one entry's duration to the group for `key`, creating the group
/// on first sight so discovery order is preserved.
fn bump(groups: &mut Vec<(Option<i64>, GroupTotals)>, key: Option<i64>, seconds: i64) {
    match groups.iter_mut().find(|(group_key, _)| *group_key == key) {
        Some((_, totals)) => {
            totals.seconds += seconds;
            totals.count += 1;
        }
        None => groups.push((key, GroupTotals { seconds, count: 1 })),
    }
}

/// Groups ordered descending by summed seconds.
///
/// The sort is stable and keys only on seconds, so ties keep their
/// discovery order.
pub fn ranked(groups: &[(Option<i64>, GroupTotals)]) -> Vec<&(Option<i64>, GroupTotals)> {
    let mut sorted: Vec<_> = groups.iter().collect();
    sorted.sort_by_key(|(_, totals)| Reverse(totals.seconds));
    sorted
}

/// Display key for a grouping: the numeric id, or "none" for entries
/// without a project/activity.
pub fn group_label(key: &Option<i64>) -> String {
    match key {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}

/// Rounds hours for presentation only.
pub fn round2(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

fn percent_of_total(part_hours: f64, total_hours: f64) -> f64 {
    if total_hours > 0.0 {
        part_hours / total_hours * 100.0
    } else {
        0.0
    }
}

fn groups_json(groups: &[(Option<i64>, GroupTotals)]) -> Value {
    let mut map = serde_json::Map::new();
    for (key, totals) in groups {
        map.insert(
            group_label(key),
            json!({
                "seconds": totals.seconds,
                "hours": round2(totals.seconds as f64 / 3600.0),
                "count": totals.count,
            }),
        );
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::{json, Value};

    use super::{group_label, ranked, GroupTotals, Summary};

    fn entry(duration: i64, billable: bool, project: Option<i64>, activity: Option<i64>) -> Value {
        json!({
            "duration": duration,
            "billable": billable,
            "project": project,
            "activity": activity,
        })
    }

    #[test]
    fn test_empty_list() {
        let summary = Summary::from_entries(&[]);

        assert_eq!(summary.total_entries, 0);
        assert_eq!(summary.total_hours(), 0.0);
        assert_eq!(summary.billable_hours(), 0.0);
        assert_eq!(summary.non_billable_hours(), 0.0);
        assert_eq!(summary.billable_percent(), 0.0);
        assert_eq!(summary.non_billable_percent(), 0.0);
        assert!(summary.by_project.is_empty());
        assert!(summary.by_activity.is_empty());
    }

    /// The worked reporting scenario: three entries across two projects
    /// and two activities.
    #[test]
    fn test_three_entry_scenario() {
        let entries = vec![
            entry(3600, true, Some(1), Some(10)),
            entry(1800, false, Some(1), Some(11)),
            entry(7200, true, Some(2), Some(10)),
        ];

        let summary = Summary::from_entries(&entries);

        assert_eq!(summary.total_entries, 3);
        assert_eq!(summary.total_hours(), 3.5);
        assert_eq!(summary.billable_hours(), 2.5);
        assert_eq!(summary.non_billable_hours(), 1.0);
        assert_eq!(
            summary.by_project,
            vec![
                (Some(1), GroupTotals { seconds: 5400, count: 2 }),
                (Some(2), GroupTotals { seconds: 7200, count: 1 }),
            ]
        );
        assert_eq!(
            summary.by_activity,
            vec![
                (Some(10), GroupTotals { seconds: 10800, count: 2 }),
                (Some(11), GroupTotals { seconds: 1800, count: 1 }),
            ]
        );
    }

    /// Per-group sums must add back up to the totals for any input.
    #[rstest]
    #[case::single(vec![entry(60, true, Some(1), None)])]
    #[case::mixed(vec![
        entry(3600, true, Some(1), Some(10)),
        entry(1800, false, None, Some(10)),
        entry(0, false, Some(2), None),
        entry(7200, true, Some(1), Some(12)),
    ])]
    fn test_grouping_invariants(#[case] entries: Vec<Value>) {
        let summary = Summary::from_entries(&entries);

        for groups in [&summary.by_project, &summary.by_activity] {
            let seconds: i64 = groups.iter().map(|(_, totals)| totals.seconds).sum();
            let count: usize = groups.iter().map(|(_, totals)| totals.count).sum();
            assert_eq!(seconds, summary.total_seconds);
            assert_eq!(count, summary.total_entries);
        }
        assert_eq!(
            summary.billable_hours() + summary.non_billable_hours(),
            summary.total_hours()
        );
    }

    /// Missing fields fall back to duration 0 / billable false instead of
    /// failing the whole aggregation.
    #[test]
    fn test_missing_fields_default() {
        let entries = vec![json!({}), entry(3600, true, Some(1), Some(10))];

        let summary = Summary::from_entries(&entries);

        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.total_seconds, 3600);
        assert_eq!(summary.billable_seconds, 3600);
    }

    /// Entries without a project all land in one distinguished group.
    #[test]
    fn test_missing_project_single_group() {
        let entries = vec![
            entry(100, false, None, Some(1)),
            entry(200, false, None, Some(2)),
            entry(300, false, Some(7), None),
        ];

        let summary = Summary::from_entries(&entries);

        let none_groups: Vec<_> = summary
            .by_project
            .iter()
            .filter(|(key, _)| key.is_none())
            .collect();
        assert_eq!(none_groups.len(), 1);
        assert_eq!(none_groups[0].1, GroupTotals { seconds: 300, count: 2 });
    }

    /// Ranking is descending by seconds with ties kept in discovery order.
    #[test]
    fn test_ranked_stable_on_ties() {
        let entries = vec![
            entry(100, false, Some(1), None),
            entry(500, false, Some(2), None),
            entry(100, false, Some(3), None),
        ];

        let summary = Summary::from_entries(&entries);
        let order: Vec<Option<i64>> = ranked(&summary.by_project)
            .iter()
            .map(|(key, _)| *key)
            .collect();

        assert_eq!(order, vec![Some(2), Some(1), Some(3)]);
    }

    #[test]
    fn test_group_label() {
        assert_eq!(group_label(&Some(42)), "42");
        assert_eq!(group_label(&None), "none");
    }

    #[test]
    fn test_to_json_rounds_hours() {
        let entries = vec![entry(5400, true, Some(1), Some(10))];

        let value = Summary::from_entries(&entries).to_json();

        assert_eq!(value["total_hours"], json!(1.5));
        assert_eq!(value["billable_hours"], json!(1.5));
        assert_eq!(value["non_billable_hours"], json!(0.0));
        assert_eq!(value["by_project"]["1"]["count"], json!(1));
        assert_eq!(value["by_project"]["1"]["seconds"], json!(5400));
    }
}
