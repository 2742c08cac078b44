//! Text, file name and HTML sanitization for imported content

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script\s*>|<style[^>]*>.*?</style\s*>")
        .expect("valid script/style regex")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Characters never allowed in a stored file name
const FILE_NAME_SPECIAL_CHARS: &[char] = &[
    '?', '[', ']', '/', '\\', '=', '<', '>', ':', ';', ',', '\'', '"', '&', '$', '#', '*', '(',
    ')', '|', '~', '`', '!', '{', '}', '%', '+', '\u{2019}', '\u{ab}', '\u{bb}', '\u{201d}',
    '\u{201c}', '\u{a0}',
];

/// Remove all markup, including the contents of `<script>` and `<style>`.
pub fn strip_all_tags(input: &str) -> String {
    let without_blocks = SCRIPT_STYLE_RE.replace_all(input, "");
    TAG_RE.replace_all(&without_blocks, "").into_owned()
}

/// Reduce arbitrary input to a single line of plain text.
///
/// Tags are stripped, control characters dropped, whitespace runs collapsed
/// to one space and the result trimmed.
pub fn sanitize_text_field(input: &str) -> String {
    let stripped = strip_all_tags(input);
    let printable: String = stripped
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    WHITESPACE_RE.replace_all(&printable, " ").trim().to_string()
}

/// Make an untrusted upload name safe to display and derive a title from.
///
/// Directory components are dropped, special characters removed, whitespace
/// replaced by dashes, repeated dashes/dots collapsed and leading/trailing
/// `.`, `-`, `_` trimmed.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_control() || FILE_NAME_SPECIAL_CHARS.contains(&c) {
            continue;
        }
        let c = if c.is_whitespace() { '-' } else { c };
        if (c == '-' || c == '.') && cleaned.ends_with(c) {
            continue;
        }
        cleaned.push(c);
    }

    cleaned.trim_matches(|c| c == '.' || c == '-' || c == '_').to_string()
}

/// Allowlist-sanitize an HTML fragment for storage as page content.
///
/// Scripts, styles, event handler attributes and `javascript:` URLs are
/// removed; ordinary formatting markup is kept.
pub fn sanitize_post_content(html: &str) -> String {
    ammonia::clean(html)
}

/// Lower-cased extension after the last `.`, empty when there is none.
pub fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// File name without its final extension.
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}
