//! change::replacement
//!
//! Content transformation strategies.
//!
//! A [`Replacement`] turns the full text of one file into its new text and
//! reports how many matches it rewrote. Strategies are pure: the same input
//! always produces the same output, and an input with no matches comes back
//! unchanged with a count of zero.

use std::fmt::Debug;

/// A pure text transformation with a search key.
///
/// New strategies implement this trait; the commit pipeline only ever sees
/// `dyn Replacement`.
pub trait Replacement: Debug + Send + Sync {
    /// The literal fragment this replacement looks for.
    ///
    /// Used for display and as the code search query when a change is
    /// search-driven.
    fn search_text(&self) -> &str;

    /// Transform `input`, returning the new text and the number of matches.
    fn replace(&self, input: &str) -> (String, usize);
}

/// Replace every literal occurrence of `find` with `replace`.
///
/// Occurrences are counted left to right without overlap, the same way
/// [`str::replace`] walks the input. An empty `find` matches nothing.
///
/// # Example
///
/// ```
/// use forgepatch::change::{LiteralReplace, Replacement};
///
/// let r = LiteralReplace::new("foo", "bar");
/// assert_eq!(r.replace("foo foo baz"), ("bar bar baz".to_string(), 2));
/// assert_eq!(r.replace("nothing here"), ("nothing here".to_string(), 0));
/// assert_eq!(r.search_text(), "foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralReplace {
    find: String,
    replace: String,
}

impl LiteralReplace {
    /// Create a literal replacement.
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// The replacement text.
    pub fn replacement(&self) -> &str {
        &self.replace
    }
}

impl Replacement for LiteralReplace {
    fn search_text(&self) -> &str {
        &self.find
    }

    fn replace(&self, input: &str) -> (String, usize) {
        if self.find.is_empty() {
            return (input.to_string(), 0);
        }

        let matches = input.matches(self.find.as_str()).count();
        if matches == 0 {
            return (input.to_string(), 0);
        }

        (input.replace(&self.find, &self.replace), matches)
    }
}

impl std::fmt::Display for LiteralReplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' -> '{}'", self.find, self.replace)
    }
}
