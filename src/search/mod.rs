use regex::{Regex, RegexBuilder};

use crate::note::Note;

/// Case-insensitive substring match on the title. An empty query matches
/// everything.
pub fn title_matches(title: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    title.to_lowercase().contains(&query.to_lowercase())
}

/// Positions in `notes` whose title matches `query`, in collection order.
pub fn filter_indices(notes: &[Note], query: &str) -> Vec<usize> {
    notes
        .iter()
        .enumerate()
        .filter(|(_, note)| title_matches(&note.title, query))
        .map(|(idx, _)| idx)
        .collect()
}

/// Regex used by the list renderer to emphasise the active query inside
/// titles. The query is taken verbatim so it marks exactly what
/// [`title_matches`] accepted.
pub fn build_highlight_regex(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}
