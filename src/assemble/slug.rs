//! Chapter anchor identifiers

use std::collections::{HashMap, HashSet};

/// Turns a title into an anchor slug
///
/// Lowercases the title, keeps ASCII letters, digits and CJK unified
/// ideographs (U+4E00 to U+9FA5), and collapses every other run of
/// characters into a single hyphen. Leading and trailing hyphens are
/// trimmed, so the result may be empty.
///
/// # Examples
///
/// ```
/// use docuprint::assemble::slugify;
///
/// assert_eq!(slugify("Getting Started!"), "getting-started");
/// assert_eq!(slugify("  --  "), "");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.trim().chars().flat_map(char::to_lowercase) {
        if is_slug_char(c) {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Hands out unique anchor ids in chapter order
///
/// The first chapter with a given slug gets it unchanged; later ones get
/// `-2`, `-3`, ... appended. A suffixed id that is already taken (say, by
/// a chapter literally titled "Intro 2") is skipped.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    occurrences: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the anchor for the chapter at `index` (0-based)
    pub fn assign(&mut self, title: &str, index: usize) -> String {
        let mut base = slugify(title);
        if base.is_empty() {
            base = format!("chapter-{}", index + 1);
        }

        let count = self.occurrences.entry(base.clone()).or_insert(0);
        *count += 1;
        let mut anchor = if *count == 1 {
            base.clone()
        } else {
            format!("{}-{}", base, count)
        };
        while self.taken.contains(&anchor) {
            *count += 1;
            anchor = format!("{}-{}", base, count);
        }

        self.taken.insert(anchor.clone());
        anchor
    }
}
