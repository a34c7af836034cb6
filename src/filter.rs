//! Derived view of a collection for a search query and a tag filter.

use crate::Note;

/// Query and tag predicate applied to a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Case-insensitive substring of `title + " " + content`
    pub query: String,
    /// Case-insensitive substring of `"#" + tag`, for any tag
    pub tag: String,
}

impl NoteFilter {
    pub fn new(query: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tag: tag.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.tag.is_empty()
    }

    /// Whether `note` belongs to the derived view.
    ///
    /// A leading `#` on the tag filter is kept as typed. Since every tag is
    /// compared in its `#tag` form, `#wor` only matches tags starting with
    /// `wor`, while `wor` matches them anywhere.
    pub fn matches(&self, note: &Note) -> bool {
        self.matches_text(note) && self.matches_tag(note)
    }

    fn matches_text(&self, note: &Note) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let haystack = format!("{} {}", note.title, note.content).to_lowercase();
        haystack.contains(&self.query.to_lowercase())
    }

    fn matches_tag(&self, note: &Note) -> bool {
        if self.tag.is_empty() {
            return true;
        }
        let needle = self.tag.to_lowercase();
        note.tags
            .iter()
            .any(|t| format!("#{}", t).to_lowercase().contains(&needle))
    }
}

/// Notes matching `filter`, in collection order.
pub fn filter_notes<'a>(notes: &'a [Note], filter: &NoteFilter) -> Vec<&'a Note> {
    notes.iter().filter(|n| filter.matches(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteDraft;
    use chrono::DateTime;

    fn note(id: &str, title: &str, content: &str, tags: &[&str]) -> Note {
        Note::from_draft(
            id.to_string(),
            NoteDraft::new()
                .title(title)
                .content(content)
                .tags(tags.iter().copied()),
            DateTime::from_timestamp(0, 0).unwrap(),
        )
    }

    fn ids(view: &[&Note]) -> Vec<String> {
        view.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let notes = vec![
            note("c", "third", "", &[]),
            note("a", "first", "", &["x"]),
            note("b", "second", "", &[]),
        ];
        let view = filter_notes(&notes, &NoteFilter::default());
        assert_eq!(ids(&view), vec!["c", "a", "b"]);
    }

    #[test]
    fn query_is_case_insensitive_over_title_and_content() {
        let notes = vec![note("1", "Morning Run", "felt great", &["fitness"])];

        assert_eq!(filter_notes(&notes, &NoteFilter::new("run", "")).len(), 1);
        assert_eq!(filter_notes(&notes, &NoteFilter::new("FELT", "")).len(), 1);
        assert!(filter_notes(&notes, &NoteFilter::new("xyz", "")).is_empty());
    }

    #[test]
    fn query_sees_title_and_content_joined_by_a_space() {
        let notes = vec![note("1", "Morning Run", "felt great", &[])];
        assert_eq!(
            filter_notes(&notes, &NoteFilter::new("run felt", "")).len(),
            1
        );
    }

    #[test]
    fn query_matches_inside_raw_html() {
        let notes = vec![note("1", "Day", "<p><strong>sunny</strong></p>", &[])];
        assert_eq!(filter_notes(&notes, &NoteFilter::new("sunny", "")).len(), 1);
        assert_eq!(filter_notes(&notes, &NoteFilter::new("strong", "")).len(), 1);
    }

    #[test]
    fn tag_filter_without_hash_matches_anywhere_in_tag() {
        let notes = vec![note("1", "t", "", &["happy"])];

        assert!(NoteFilter::new("", "happy").matches(&notes[0]));
        assert!(NoteFilter::new("", "app").matches(&notes[0]));
        assert!(NoteFilter::new("", "HAPPY").matches(&notes[0]));
        assert!(!NoteFilter::new("", "sad").matches(&notes[0]));
    }

    #[test]
    fn tag_filter_with_hash_anchors_at_tag_start() {
        let notes = vec![note("1", "t", "", &["happy"])];

        assert!(NoteFilter::new("", "#happy").matches(&notes[0]));
        assert!(NoteFilter::new("", "#hap").matches(&notes[0]));
        assert!(NoteFilter::new("", "#HAP").matches(&notes[0]));
        assert!(!NoteFilter::new("", "#appy").matches(&notes[0]));
        assert!(!NoteFilter::new("", "##happy").matches(&notes[0]));
    }

    #[test]
    fn tag_filter_needs_any_one_tag() {
        let notes = vec![
            note("1", "t", "", &["work", "travel"]),
            note("2", "t", "", &[]),
            note("3", "t", "", &["mood"]),
        ];
        let view = filter_notes(&notes, &NoteFilter::new("", "trav"));
        assert_eq!(ids(&view), vec!["1"]);
    }

    #[test]
    fn both_predicates_must_hold() {
        let notes = vec![
            note("1", "Morning Run", "", &["fitness"]),
            note("2", "Evening Run", "", &["mood"]),
            note("3", "Groceries", "", &["fitness"]),
        ];
        let view = filter_notes(&notes, &NoteFilter::new("run", "#fit"));
        assert_eq!(ids(&view), vec!["1"]);
    }
}
