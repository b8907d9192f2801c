//! Pure reducers that turn fresh results and the previous document into the
//! next document. Nothing here does I/O.

use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

use crate::storage::{ContentDocument, ContentItem, LatestContent, PersistedContent, Slot};

/// Picks the more recent of two candidate articles.
///
/// The secondary wins only when its date is strictly later; ties and
/// incomparable dates favour the primary. Dates are compared as calendar
/// dates, falling back to plain string order when either does not parse.
pub fn freshest(
    primary: Option<ContentItem>,
    secondary: Option<ContentItem>,
) -> Option<ContentItem> {
    match (primary, secondary) {
        (Some(primary), Some(secondary)) => {
            if compare_dates(&secondary.date, &primary.date) == Ordering::Greater {
                Some(secondary)
            } else {
                Some(primary)
            }
        }
        (primary, secondary) => primary.or(secondary),
    }
}

/// Fresh result, else the previously persisted value untouched, else empty.
pub fn merge_slot(fresh: Option<ContentItem>, previous: Option<Slot>) -> Option<Slot> {
    fresh.map(Slot::Fresh).or(previous)
}

/// Builds the document to persist, slot by slot.
pub fn build_document(
    fresh: LatestContent,
    previous: Option<&PersistedContent>,
    now: DateTime<Utc>,
) -> ContentDocument {
    let previous = previous.cloned().unwrap_or_default();

    ContentDocument {
        latest_content: PersistedContent {
            video: merge_slot(fresh.video, previous.video),
            podcast: merge_slot(fresh.podcast, previous.podcast),
            blog: merge_slot(fresh.blog, previous.blog),
        },
        last_updated: now,
    }
}

fn compare_dates(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn item(title: &str, date: &str) -> ContentItem {
        ContentItem {
            title: title.to_string(),
            description: format!("{title} description"),
            url: format!("https://example.com/{title}"),
            date: date.to_string(),
            image: String::new(),
        }
    }

    /// A slot as it comes back from a previous document on disk.
    fn kept(item: &ContentItem) -> Slot {
        match serde_json::to_value(item).unwrap() {
            serde_json::Value::Object(map) => Slot::Kept(map),
            other => panic!("item serialized as {other}"),
        }
    }

    #[test]
    fn test_freshest_picks_later_date() {
        let older = item("devto", "2024-01-10");
        let newer = item("medium", "2024-01-20");
        assert_eq!(
            freshest(Some(older.clone()), Some(newer.clone())),
            Some(newer.clone())
        );
        assert_eq!(freshest(Some(newer.clone()), Some(older)), Some(newer));
    }

    #[test]
    fn test_freshest_tie_keeps_primary() {
        let primary = item("devto", "2024-01-20");
        let secondary = item("medium", "2024-01-20");
        assert_eq!(freshest(Some(primary.clone()), Some(secondary)), Some(primary));
    }

    #[test]
    fn test_freshest_single_candidate() {
        let only = item("medium", "2024-01-20");
        assert_eq!(freshest(None, Some(only.clone())), Some(only.clone()));
        assert_eq!(freshest(Some(only.clone()), None), Some(only));
        assert_eq!(freshest(None, None), None);
    }

    #[test]
    fn test_freshest_mixed_date_formats() {
        let primary = item("devto", "2024-01-20");
        let secondary = item("medium", "2024-01-21T00:30:00Z");
        assert_eq!(
            freshest(Some(primary), Some(secondary.clone())),
            Some(secondary)
        );
    }

    #[test]
    fn test_freshest_unparseable_dates_use_string_order() {
        let primary = item("devto", "");
        let secondary = item("medium", "soon");
        assert_eq!(
            freshest(Some(primary), Some(secondary.clone())),
            Some(secondary)
        );
    }

    #[test]
    fn test_build_document_slot_rules() {
        let previous = PersistedContent {
            video: Some(kept(&item("old-video", "2023-12-01"))),
            podcast: Some(kept(&item("old-episode", "2023-12-02"))),
            blog: None,
        };
        let fresh = LatestContent {
            video: Some(item("new-video", "2024-01-20")),
            podcast: None,
            blog: None,
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 21, 6, 0, 0).unwrap();

        let doc = build_document(fresh, Some(&previous), now);
        assert_eq!(
            doc.latest_content.video,
            Some(Slot::Fresh(item("new-video", "2024-01-20")))
        );
        assert_eq!(
            doc.latest_content.podcast,
            Some(kept(&item("old-episode", "2023-12-02")))
        );
        assert_eq!(doc.latest_content.blog, None);
        assert_eq!(doc.last_updated, now);
    }

    #[test]
    fn test_build_document_without_previous() {
        let now = Utc::now();
        let doc = build_document(LatestContent::default(), None, now);
        assert_eq!(doc.latest_content, PersistedContent::default());
        assert_eq!(doc.last_updated, now);
    }

    #[test]
    fn test_kept_slot_is_not_rewritten() {
        let mut map = serde_json::Map::new();
        map.insert("title".into(), serde_json::json!("Old"));
        map.insert("views".into(), serde_json::json!(10));
        map.insert("date".into(), serde_json::json!(20240101));
        let previous = PersistedContent {
            video: Some(Slot::Kept(map.clone())),
            ..Default::default()
        };

        let doc = build_document(LatestContent::default(), Some(&previous), Utc::now());
        assert_eq!(doc.latest_content.video, Some(Slot::Kept(map)));
    }

    fn arb_item() -> impl Strategy<Value = ContentItem> {
        (
            "[a-zA-Z ]{0,20}",
            "[a-zA-Z ]{0,40}",
            "[a-z]{1,10}",
            (2000i32..2030, 1u32..=12, 1u32..=28),
            "[a-z]{0,10}",
        )
            .prop_map(|(title, description, slug, (y, m, d), image)| ContentItem {
                title,
                description,
                url: format!("https://example.com/{slug}"),
                date: format!("{y:04}-{m:02}-{d:02}"),
                image,
            })
    }

    proptest! {
        #[test]
        fn prop_fresh_item_survives_verbatim(
            fresh in arb_item(),
            previous in proptest::option::of(arb_item()),
        ) {
            let previous = previous.as_ref().map(kept);
            prop_assert_eq!(merge_slot(Some(fresh.clone()), previous), Some(Slot::Fresh(fresh)));
        }

        #[test]
        fn prop_previous_kept_when_fresh_missing(previous in arb_item()) {
            prop_assert_eq!(merge_slot(None, Some(kept(&previous))), Some(kept(&previous)));
        }

        #[test]
        fn prop_freshest_never_older_than_either(a in arb_item(), b in arb_item()) {
            let chosen = freshest(Some(a.clone()), Some(b.clone())).unwrap();
            prop_assert!(chosen.date >= a.date);
            prop_assert!(chosen.date >= b.date);
            prop_assert!(chosen == a || chosen == b);
        }

        #[test]
        fn prop_document_slots_follow_merge(
            fresh_video in proptest::option::of(arb_item()),
            fresh_blog in proptest::option::of(arb_item()),
            previous_video in proptest::option::of(arb_item()),
            previous_podcast in proptest::option::of(arb_item()),
        ) {
            let fresh = LatestContent { video: fresh_video.clone(), podcast: None, blog: fresh_blog.clone() };
            let previous = PersistedContent {
                video: previous_video.as_ref().map(kept),
                podcast: previous_podcast.as_ref().map(kept),
                blog: None,
            };
            let doc = build_document(fresh, Some(&previous), Utc::now());

            prop_assert_eq!(
                doc.latest_content.video,
                fresh_video.map(Slot::Fresh).or(previous_video.as_ref().map(kept))
            );
            prop_assert_eq!(doc.latest_content.podcast, previous_podcast.as_ref().map(kept));
            prop_assert_eq!(doc.latest_content.blog, fresh_blog.map(Slot::Fresh));
        }
    }
}
