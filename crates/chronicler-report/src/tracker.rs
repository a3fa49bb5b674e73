//! The priority-bucket pipeline for issue-tracker activity.
//!
//! Each low-level field change classifies into one semantic bucket through
//! an ordered first-match-wins cascade; each work item then lands in exactly
//! one output bucket by fixed priority, and buckets render as counted
//! markdown sections with int-sorted item links.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chronicler_core::{prune, Diagnostics, ReportWindow, TrackerEvent};

/// Semantic category of one interaction with a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bucket {
    Reported,
    Attachments,
    NeedInfo,
    Discussed,
    StatusChanged,
    Tagged,
    Metadata,
    Triaged,
    Other,
}

/// Result of classifying one field change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Classified(Bucket),
    /// Field carries no reportable signal (CC churn and the like).
    Skipped,
    /// No rule matched; the caller warns and defaults to [`Bucket::Other`].
    Unhandled,
}

/// Immutable classification configuration.
///
/// Passed into the pipeline so tests can substitute markers, field sets,
/// and the bucket priority order.
#[derive(Debug, Clone)]
pub struct TrackerRules {
    pub ignore_fields: BTreeSet<String>,
    pub metadata_fields: BTreeSet<String>,
    pub needinfo_marker: String,
    pub advocacy_tag: String,
    pub triage_marker: String,
    /// Most significant first. [`Bucket::Triaged`] never appears here; it is
    /// tallied, not listed.
    pub priority: Vec<Bucket>,
}

impl Default for TrackerRules {
    fn default() -> Self {
        let ignore = [
            "CC",
            "Hardware",
            "Version",
            "OS",
            "Last Resolved",
            "Ever confirmed",
        ];
        let metadata = [
            "Whiteboard",
            "See Also",
            "Blocks",
            "Depends on",
            "Keywords",
            "Summary",
        ];
        Self {
            ignore_fields: ignore.iter().map(|s| s.to_string()).collect(),
            metadata_fields: metadata.iter().map(|s| s.to_string()).collect(),
            needinfo_marker: "needinfo".to_string(),
            advocacy_tag: "DevAdvocacy".to_string(),
            triage_marker: "DevRel:P".to_string(),
            priority: vec![
                Bucket::Reported,
                Bucket::Attachments,
                Bucket::NeedInfo,
                Bucket::Discussed,
                Bucket::StatusChanged,
                Bucket::Tagged,
                Bucket::Metadata,
                Bucket::Other,
            ],
        }
    }
}

impl TrackerRules {
    /// Classify one field change. First matching rule wins; total over its
    /// input, never an error.
    pub fn classify(&self, field: &str, old: &str, new: &str) -> Outcome {
        if self.ignore_fields.contains(field) {
            Outcome::Skipped
        } else if field == "Bug ID" && old == "(new bug)" {
            Outcome::Classified(Bucket::Reported)
        } else if field.starts_with("Attachment ") {
            Outcome::Classified(Bucket::Attachments)
        } else if field == "Flags"
            && (new.contains(&self.needinfo_marker) || old.contains(&self.needinfo_marker))
        {
            Outcome::Classified(Bucket::NeedInfo)
        } else if field.starts_with("Comment ") {
            Outcome::Classified(Bucket::Discussed)
        } else if field == "Status" || field == "Resolution" {
            Outcome::Classified(Bucket::StatusChanged)
        } else if field == "Keywords" && new.contains(&self.advocacy_tag) {
            Outcome::Classified(Bucket::Tagged)
        } else if field == "Whiteboard"
            && (new.contains(&self.triage_marker) != old.contains(&self.triage_marker))
        {
            // Triage marker appearing or disappearing; a change that keeps
            // the marker in place is plain metadata.
            Outcome::Classified(Bucket::Triaged)
        } else if self.metadata_fields.contains(field) {
            Outcome::Classified(Bucket::Metadata)
        } else {
            Outcome::Unhandled
        }
    }

    fn describe(&self, bucket: Bucket, count: usize) -> String {
        match bucket {
            Bucket::Reported => format!("Reported {count} Bugs"),
            Bucket::Attachments => format!("Added or Modified Attachments on {count} Bugs"),
            Bucket::NeedInfo => format!("Set or Cleared Needinfo? Flag on {count} Bugs"),
            Bucket::Discussed => format!("Discussed {count} Bugs"),
            Bucket::StatusChanged => format!("Changed Status on {count} Bugs"),
            Bucket::Tagged => format!("Tagged {count} Bugs as {}", self.advocacy_tag),
            Bucket::Metadata => format!("Updated Metadata on {count} Bugs"),
            Bucket::Other => format!("Interacted with {count} Other Bugs"),
            Bucket::Triaged => format!("Triaged {count} {} Bugs", self.advocacy_tag),
        }
    }
}

/// Listing order of the itemized sections (reading order, not priority).
const SECTION_ORDER: [Bucket; 8] = [
    Bucket::Reported,
    Bucket::Attachments,
    Bucket::NeedInfo,
    Bucket::Discussed,
    Bucket::StatusChanged,
    Bucket::Metadata,
    Bucket::Tagged,
    Bucket::Other,
];

/// Ids are numeric text; sort them as integers, lexicographically as a
/// fallback for anything non-numeric.
fn id_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Generate the tracker report block for one subject over one window.
///
/// `base_url` is the tracker root used for item links. Always returns a
/// best-effort report plus the collected diagnostics.
pub fn report(
    history: &[TrackerEvent],
    window: &ReportWindow,
    rules: &TrackerRules,
    base_url: &str,
) -> (String, Diagnostics) {
    let mut diags = Diagnostics::new();
    let events = prune(history, window, &mut diags);

    // Which buckets each item was touched by, and its last seen title.
    let mut touched: BTreeMap<String, BTreeSet<Bucket>> = BTreeMap::new();
    let mut titles: BTreeMap<String, String> = BTreeMap::new();
    for event in &events {
        let outcome = rules.classify(&event.field, &event.old, &event.new);
        let bucket = match outcome {
            Outcome::Skipped => continue,
            Outcome::Classified(bucket) => bucket,
            Outcome::Unhandled => {
                diags.warn(
                    format!(
                        "unhandled interaction: {} ({} -> {})",
                        event.field, event.old, event.new
                    ),
                    format!("bug {}", event.item),
                );
                Bucket::Other
            }
        };
        touched.entry(event.item.clone()).or_default().insert(bucket);
        titles
            .entry(event.item.clone())
            .or_insert_with(|| event.title.clone());
    }

    // Partition items into their most significant bucket.
    let mut listed: BTreeMap<Bucket, Vec<String>> = BTreeMap::new();
    let mut triaged_tally = 0usize;
    for (item, buckets) in &touched {
        if buckets.contains(&Bucket::Triaged) {
            triaged_tally += 1;
            if buckets.len() == 1 {
                // Pure triage passes are noise in the itemized sections.
                continue;
            }
        }
        let selected = rules
            .priority
            .iter()
            .copied()
            .find(|bucket| buckets.contains(bucket));
        let bucket = match selected {
            Some(bucket) => bucket,
            None => {
                diags.warn(
                    format!("no bucket claims logged actions: {buckets:?}"),
                    format!("bug {item}"),
                );
                Bucket::Other
            }
        };
        listed.entry(bucket).or_default().push(item.clone());
    }

    let mut blocks: Vec<String> = Vec::new();
    for bucket in SECTION_ORDER {
        let Some(items) = listed.get(&bucket) else {
            continue;
        };
        let mut items = items.clone();
        items.sort_by(|a, b| id_order(a, b));
        let lines: Vec<String> = items
            .iter()
            .map(|item| {
                let title = titles.get(item).map(String::as_str).unwrap_or("");
                format!("* [Bug {item}]({base_url}/show_bug.cgi?id={item}) - {title}")
            })
            .collect();
        blocks.push(format!(
            "#### {}:\n\n{}",
            rules.describe(bucket, items.len()),
            lines.join("\n")
        ));
    }

    if triaged_tally > 0 {
        blocks.push(format!(
            "#### {}\n\n* _not listed_",
            rules.describe(Bucket::Triaged, triaged_tally)
        ));
    }

    let text = if blocks.is_empty() {
        String::new()
    } else {
        format!("{}\n", blocks.join("\n\n"))
    };
    (text, diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::OffsetDateTime;

    const BASE: &str = "https://tracker.example.org";

    fn window() -> ReportWindow {
        ReportWindow::new(datetime!(2016-04-01 0:00 UTC), datetime!(2016-07-01 0:00 UTC)).unwrap()
    }

    fn change(item: &str, ts: OffsetDateTime, field: &str, old: &str, new: &str) -> TrackerEvent {
        TrackerEvent {
            item: item.to_string(),
            ts,
            title: format!("Bug {item} title"),
            field: field.to_string(),
            old: old.to_string(),
            new: new.to_string(),
        }
    }

    /// Pre-window change on an ignored field, so the completeness check
    /// stays quiet.
    fn sentinel() -> TrackerEvent {
        change("1", datetime!(2016-03-01 0:00 UTC), "CC", "", "someone")
    }

    #[test]
    fn cascade_first_match_wins() {
        let rules = TrackerRules::default();
        assert_eq!(rules.classify("CC", "", "x"), Outcome::Skipped);
        assert_eq!(
            rules.classify("Bug ID", "(new bug)", "1234"),
            Outcome::Classified(Bucket::Reported)
        );
        assert_eq!(
            rules.classify("Attachment 8675309 Flags", "", "review?"),
            Outcome::Classified(Bucket::Attachments)
        );
        assert_eq!(
            rules.classify("Flags", "needinfo?(dev)", ""),
            Outcome::Classified(Bucket::NeedInfo)
        );
        assert_eq!(
            rules.classify("Comment 3", "", "text"),
            Outcome::Classified(Bucket::Discussed)
        );
        assert_eq!(
            rules.classify("Resolution", "", "FIXED"),
            Outcome::Classified(Bucket::StatusChanged)
        );
        assert_eq!(
            rules.classify("Keywords", "", "perf, DevAdvocacy"),
            Outcome::Classified(Bucket::Tagged)
        );
        assert_eq!(
            rules.classify("Whiteboard", "", "[DevRel:P1]"),
            Outcome::Classified(Bucket::Triaged)
        );
        // Marker present on both sides: no triage transition, plain metadata.
        assert_eq!(
            rules.classify("Whiteboard", "[DevRel:P2]", "[DevRel:P1] note"),
            Outcome::Classified(Bucket::Metadata)
        );
        assert_eq!(rules.classify("Lorem Ipsum", "a", "b"), Outcome::Unhandled);
    }

    #[test]
    fn item_lands_in_most_significant_bucket_only() {
        let events = vec![
            sentinel(),
            change("99", datetime!(2016-04-10 0:00 UTC), "Attachment 1", "", "patch"),
            change("99", datetime!(2016-04-11 0:00 UTC), "Comment 3", "", "text"),
        ];
        let (text, _) = report(&events, &window(), &TrackerRules::default(), BASE);
        assert!(
            text.contains("#### Added or Modified Attachments on 1 Bugs:"),
            "{text}"
        );
        assert!(!text.contains("#### Discussed"), "{text}");
        assert!(
            text.contains("* [Bug 99](https://tracker.example.org/show_bug.cgi?id=99) - Bug 99 title"),
            "{text}"
        );
    }

    #[test]
    fn reported_beats_everything() {
        let events = vec![
            sentinel(),
            change("7", datetime!(2016-04-10 0:00 UTC), "Blocks", "", "8"),
            change("7", datetime!(2016-04-11 0:00 UTC), "Bug ID", "(new bug)", "7"),
        ];
        let (text, _) = report(&events, &window(), &TrackerRules::default(), BASE);
        assert!(text.contains("#### Reported 1 Bugs:"), "{text}");
        assert!(!text.contains("Updated Metadata"), "{text}");
    }

    #[test]
    fn triaged_only_item_is_tallied_not_listed() {
        let events = vec![
            sentinel(),
            change("42", datetime!(2016-04-10 0:00 UTC), "Whiteboard", "", "[DevRel:P1]"),
        ];
        let (text, diags) = report(&events, &window(), &TrackerRules::default(), BASE);
        assert!(text.contains("#### Triaged 1 DevAdvocacy Bugs"), "{text}");
        assert!(text.contains("* _not listed_"), "{text}");
        assert!(!text.contains("Bug 42"), "{text}");
        assert!(diags.is_empty());
    }

    #[test]
    fn triaged_with_other_activity_lists_and_tallies() {
        let events = vec![
            sentinel(),
            change("42", datetime!(2016-04-10 0:00 UTC), "Whiteboard", "", "[DevRel:P1]"),
            change("42", datetime!(2016-04-11 0:00 UTC), "Comment 1", "", "text"),
        ];
        let (text, _) = report(&events, &window(), &TrackerRules::default(), BASE);
        assert!(text.contains("#### Discussed 1 Bugs:"), "{text}");
        assert!(text.contains("Bug 42"), "{text}");
        assert!(text.contains("#### Triaged 1 DevAdvocacy Bugs"), "{text}");
    }

    #[test]
    fn items_sort_by_id_as_integer() {
        let mk = |item: &str, day: u8| {
            change(
                item,
                datetime!(2016-04-01 0:00 UTC).replace_day(day).unwrap(),
                "Comment 1",
                "",
                "text",
            )
        };
        let events = vec![sentinel(), mk("110", 2), mk("9", 3), mk("25", 4)];
        let (text, _) = report(&events, &window(), &TrackerRules::default(), BASE);
        let p9 = text.find("[Bug 9]").unwrap();
        let p25 = text.find("[Bug 25]").unwrap();
        let p110 = text.find("[Bug 110]").unwrap();
        assert!(p9 < p25 && p25 < p110, "{text}");
    }

    #[test]
    fn unhandled_field_warns_and_defaults_to_other() {
        let events = vec![
            sentinel(),
            change("5", datetime!(2016-04-10 0:00 UTC), "Lorem Ipsum", "a", "b"),
        ];
        let (text, diags) = report(&events, &window(), &TrackerRules::default(), BASE);
        assert!(text.contains("#### Interacted with 1 Other Bugs:"), "{text}");
        assert_eq!(diags.len(), 1);
        let warning = diags.iter().next().unwrap();
        assert!(warning.message.contains("Lorem Ipsum"), "{warning}");
        assert!(warning.context.contains("bug 5"), "{warning}");
    }

    #[test]
    fn ignored_fields_produce_no_output_at_all() {
        let events = vec![
            sentinel(),
            change("5", datetime!(2016-04-10 0:00 UTC), "CC", "", "someone"),
            change("5", datetime!(2016-04-11 0:00 UTC), "OS", "All", "Linux"),
        ];
        let (text, diags) = report(&events, &window(), &TrackerRules::default(), BASE);
        assert_eq!(text, "");
        assert!(diags.is_empty());
    }

    #[test]
    fn out_of_window_changes_are_pruned() {
        let events = vec![
            sentinel(),
            change("5", datetime!(2016-08-10 0:00 UTC), "Comment 1", "", "text"),
        ];
        let (text, diags) = report(&events, &window(), &TrackerRules::default(), BASE);
        assert_eq!(text, "");
        assert!(diags.is_empty());
    }

    #[test]
    fn substituted_priority_order_is_honored() {
        let rules = TrackerRules {
            priority: vec![
                Bucket::Discussed,
                Bucket::Reported,
                Bucket::Attachments,
                Bucket::NeedInfo,
                Bucket::StatusChanged,
                Bucket::Tagged,
                Bucket::Metadata,
                Bucket::Other,
            ],
            ..TrackerRules::default()
        };
        let events = vec![
            sentinel(),
            change("7", datetime!(2016-04-10 0:00 UTC), "Bug ID", "(new bug)", "7"),
            change("7", datetime!(2016-04-11 0:00 UTC), "Comment 1", "", "text"),
        ];
        let (text, _) = report(&events, &window(), &rules, BASE);
        assert!(text.contains("#### Discussed 1 Bugs:"), "{text}");
        assert!(!text.contains("#### Reported"), "{text}");
    }
}
