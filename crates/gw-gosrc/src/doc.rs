//! Doc-comment helpers: synopsis extraction, example naming, BUG notes.

/// First sentence of a doc comment, for directory listings.
///
/// A sentence ends at the first period followed by whitespace (or end of
/// text). Periods inside common abbreviations do not end the sentence.
#[must_use]
pub fn synopsis(text: &str) -> String {
    let text = text.trim().replace('\n', " ");
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'.' {
            continue;
        }
        let at_end = i + 1 == bytes.len();
        let before_space = bytes.get(i + 1).is_some_and(u8::is_ascii_whitespace);
        if (at_end || before_space) && !ends_in_abbreviation(&text[..i]) {
            return text[..=i].to_owned();
        }
    }
    text
}

/// True when the text before a period ends with a known abbreviation.
fn ends_in_abbreviation(prefix: &str) -> bool {
    const ABBREVIATIONS: &[&str] = &["e.g", "i.e", "etc", "vs"];
    let last_word = prefix
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("");
    ABBREVIATIONS
        .iter()
        .any(|a| last_word.eq_ignore_ascii_case(a))
}

/// Where an example function attaches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleName {
    /// The identifier the example documents; empty for package examples.
    pub attach_to: String,
    /// Suffix label shown next to the example; empty when unnamed.
    pub label: String,
}

/// Classify an `Example*` function name.
///
/// `ExampleFoo_bar` attaches to `Foo` when `bar` starts with a lowercase
/// letter; otherwise the full name after `Example` is the subject.
/// Returns `None` for names that are not examples at all.
#[must_use]
pub fn example_name(func_name: &str) -> Option<ExampleName> {
    let rest = func_name.strip_prefix("Example")?;
    if rest.is_empty() {
        return Some(ExampleName {
            attach_to: String::new(),
            label: String::new(),
        });
    }
    match rest.split_once('_') {
        Some((subject, suffix))
            if suffix.chars().next().is_some_and(char::is_lowercase) =>
        {
            Some(ExampleName {
                attach_to: subject.to_owned(),
                label: suffix.to_owned(),
            })
        }
        _ => Some(ExampleName {
            attach_to: rest.to_owned(),
            label: String::new(),
        }),
    }
}

/// Collect `BUG(who): …` notes from comment texts.
///
/// Each note keeps its full text, including the attribution.
#[must_use]
pub fn bug_notes<'a>(comments: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut notes = Vec::new();
    for text in comments {
        let trimmed = text.trim_start();
        if let Some(rest) = trimmed.strip_prefix("BUG(") {
            if rest.contains("):") {
                notes.push(trimmed.to_owned());
            }
        }
    }
    notes
}
