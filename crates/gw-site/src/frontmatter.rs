//! Front-matter extraction.
//!
//! Two forms are recognized, both only at byte 0 of the file:
//!
//! - JSON: `<!--{` … `}-->`, the braces delimiting a JSON object
//! - YAML: `---\n` … `\n---\n`
//!
//! The extracted prefix is replaced by an equal number of newlines so that
//! line numbers in template/render errors refer to the original file.
//! Malformed or truncated blocks never fail: the whole input comes back
//! with an empty metadata map.

use serde_json::{Map, Value};

/// JSON form delimiters.
const JSON_OPEN: &str = "<!--{";
const JSON_CLOSE: &str = "}-->";

/// YAML form delimiters.
const YAML_OPEN: &str = "---\n";
const YAML_CLOSE: &str = "\n---\n";

/// Extract front-matter from `input`.
///
/// Returns the metadata map (keys lowercased) and the body with the
/// consumed prefix rewritten as newlines. With no front-matter (or a
/// malformed block) the map is empty and the body is `input` unchanged.
#[must_use]
pub fn parse_frontmatter(input: &str) -> (Map<String, Value>, String) {
    if let Some(rest) = input.strip_prefix(JSON_OPEN) {
        let Some(close) = rest.find(JSON_CLOSE) else {
            return (Map::new(), input.to_owned());
        };
        // The object includes both braces.
        let block = &input[JSON_OPEN.len() - 1..JSON_OPEN.len() + close + 1];
        let consumed = JSON_OPEN.len() + close + JSON_CLOSE.len();
        return finish(input, consumed, parse_json(block));
    }

    if input.starts_with(YAML_OPEN) {
        let Some(close) = input[YAML_OPEN.len() - 1..].find(YAML_CLOSE) else {
            return (Map::new(), input.to_owned());
        };
        let close = YAML_OPEN.len() - 1 + close;
        // `---\n---\n` is an empty (but well-formed) block.
        let block = if close <= YAML_OPEN.len() {
            ""
        } else {
            &input[YAML_OPEN.len()..close]
        };
        let consumed = close + YAML_CLOSE.len();
        let meta = if block.trim().is_empty() {
            Some(Map::new())
        } else {
            parse_yaml(block)
        };
        return finish(input, consumed, meta);
    }

    (Map::new(), input.to_owned())
}

/// Assemble the result: on a decoded block, rewrite the prefix as newlines.
fn finish(
    input: &str,
    consumed: usize,
    meta: Option<Map<String, Value>>,
) -> (Map<String, Value>, String) {
    let Some(meta) = meta else {
        return (Map::new(), input.to_owned());
    };
    let newlines = input[..consumed].matches('\n').count();
    let mut body = String::with_capacity(newlines + input.len() - consumed);
    for _ in 0..newlines {
        body.push('\n');
    }
    body.push_str(&input[consumed..]);
    (meta, body)
}

/// Decode the JSON form; keys are lowercased.
fn parse_json(block: &str) -> Option<Map<String, Value>> {
    let value: Value = serde_json::from_str(block).ok()?;
    let obj = value.as_object()?;
    Some(lowercase_keys(obj))
}

/// Decode the YAML form; keys are lowercased for consistency with JSON.
fn parse_yaml(block: &str) -> Option<Map<String, Value>> {
    let value: Value = serde_yaml::from_str(block).ok()?;
    let obj = value.as_object()?;
    Some(lowercase_keys(obj))
}

fn lowercase_keys(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_no_frontmatter() {
        let (meta, body) = parse_frontmatter("# Title\n\nbody\n");
        assert!(meta.is_empty());
        assert_eq!(body, "# Title\n\nbody\n");
    }

    #[test]
    fn test_json_form() {
        let input = "<!--{\n  \"Title\": \"Install\",\n  \"Template\": true\n}-->\nbody\n";
        let (meta, body) = parse_frontmatter(input);
        assert_eq!(meta.get("title"), Some(&Value::from("Install")));
        assert_eq!(meta.get("template"), Some(&Value::from(true)));
        assert!(body.ends_with("body\n"));
    }

    #[test]
    fn test_yaml_form() {
        let input = "---\ntitle: Install\nlayout: article\n---\nbody\n";
        let (meta, body) = parse_frontmatter(input);
        assert_eq!(meta.get("title"), Some(&Value::from("Install")));
        assert_eq!(meta.get("layout"), Some(&Value::from("article")));
        assert!(body.ends_with("body\n"));
    }

    #[test]
    fn test_yaml_keys_lowercased() {
        let input = "---\nTitle: X\nRedirect: /y\n---\n";
        let (meta, _) = parse_frontmatter(input);
        assert!(meta.contains_key("title"));
        assert!(meta.contains_key("redirect"));
    }

    #[test]
    fn test_line_numbers_preserved() {
        let input = "---\ntitle: X\n---\nline five?\n";
        let (_, body) = parse_frontmatter(input);
        // Prefix newline count must match: the body line keeps its original
        // line number.
        let orig_line = input.lines().position(|l| l == "line five?").unwrap();
        let new_line = body.lines().position(|l| l == "line five?").unwrap();
        assert_eq!(orig_line, new_line);
        // Total newline count is unchanged.
        assert_eq!(
            input.matches('\n').count(),
            body.matches('\n').count()
        );
    }

    #[test]
    fn test_truncated_json_returns_input() {
        let input = "<!--{ \"title\": \"x\"\nbody with no close\n";
        let (meta, body) = parse_frontmatter(input);
        assert!(meta.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn test_truncated_yaml_returns_input() {
        let input = "---\ntitle: x\nno close\n";
        let (meta, body) = parse_frontmatter(input);
        assert!(meta.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn test_malformed_json_returns_input() {
        let input = "<!--{ not json }-->\nbody\n";
        let (meta, body) = parse_frontmatter(input);
        assert!(meta.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn test_empty_yaml_block() {
        let input = "---\n---\nbody\n";
        let (meta, body) = parse_frontmatter(input);
        assert!(meta.is_empty());
        assert!(body.ends_with("body\n"));
    }

    #[test]
    fn test_only_first_block_consumed() {
        let input = "---\ntitle: x\n---\n---\nnot: meta\n---\n";
        let (meta, body) = parse_frontmatter(input);
        assert_eq!(meta.get("title"), Some(&Value::from("x")));
        assert!(body.contains("not: meta"));
    }

    #[test]
    fn test_mid_file_markers_ignored() {
        let input = "body first\n<!--{ \"title\": \"x\" }-->\n";
        let (meta, body) = parse_frontmatter(input);
        assert!(meta.is_empty());
        assert_eq!(body, input);
    }
}
