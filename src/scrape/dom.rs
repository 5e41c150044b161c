//! Tolerant structural matcher over raw HTML.
//!
//! This is intentionally NOT an HTML5 parser. The target pages come from a
//! known, narrow set of server-rendered layouts; all this module does is
//! locate named container blocks and iterate row/cell sub-blocks by nesting
//! depth. Unknown shapes are reported by returning nothing so the caller can
//! fail explicitly instead of producing wrong data.

/// A hyperlink extracted from a fragment: its `href` attribute (possibly
/// empty) and its rendered inner text, tag-stripped and entity-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Raw `href` attribute value.
    pub href: String,
    /// Rendered link text.
    pub text: String,
}

/// Finds the first `tag` element carrying `class` as a whole class token and
/// returns its inner HTML.
pub fn find_block_by_class<'a>(html: &'a str, tag: &str, class: &str) -> Option<&'a str> {
    find_block(html, tag, |open_tag| has_class(open_tag, class))
}

/// Finds the first `tag` element whose `id` attribute equals `id` and
/// returns its inner HTML.
pub fn find_block_by_id<'a>(html: &'a str, tag: &str, id: &str) -> Option<&'a str> {
    find_block(html, tag, |open_tag| {
        attr_value(open_tag, "id").is_some_and(|v| v.eq_ignore_ascii_case(id))
    })
}

fn find_block<'a>(
    html: &'a str,
    tag: &str,
    mut matches: impl FnMut(&str) -> bool,
) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(open) = find_tag_open(html, search_from, tag) {
        let tag_end = open + html[open..].find('>')?;
        let open_tag = &html[open..=tag_end];
        if matches(open_tag) {
            let inner_start = tag_end + 1;
            let inner_end = find_matching_close(html, inner_start, tag)?;
            return Some(&html[inner_start..inner_end]);
        }
        search_from = tag_end + 1;
    }
    None
}

/// Splits a fragment into the inner HTML of each balanced `tag` block at the
/// fragment's own nesting level. Same-tag blocks nested deeper (for example
/// rows of an inner table) stay inside their parent block.
///
/// An unclosed trailing block is tolerated and yields the remainder of the
/// fragment.
pub fn child_blocks<'a>(fragment: &'a str, tag: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(open) = find_tag_open(fragment, pos, tag) {
        let Some(rel) = fragment[open..].find('>') else {
            break;
        };
        let tag_end = open + rel;
        if fragment[open..=tag_end].ends_with("/>") {
            pos = tag_end + 1;
            continue;
        }
        let inner_start = tag_end + 1;
        match find_matching_close(fragment, inner_start, tag) {
            Some(close) => {
                out.push(&fragment[inner_start..close]);
                pos = after_close(fragment, close);
            }
            None => {
                out.push(&fragment[inner_start..]);
                break;
            }
        }
    }
    out
}

/// Extracts every hyperlink in the fragment, in document order.
pub fn links(fragment: &str) -> Vec<Link> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(open) = find_tag_open(fragment, pos, "a") {
        let Some(rel) = fragment[open..].find('>') else {
            break;
        };
        let tag_end = open + rel;
        let open_tag = &fragment[open..=tag_end];
        let href = attr_value(open_tag, "href").unwrap_or_default().to_string();
        let inner_start = tag_end + 1;
        let (text, next) = match find_matching_close(fragment, inner_start, "a") {
            Some(close) => (
                strip_tags(&fragment[inner_start..close]),
                after_close(fragment, close),
            ),
            None => (strip_tags(&fragment[inner_start..]), fragment.len()),
        };
        out.push(Link { href, text });
        pos = next;
    }
    out
}

/// Returns the first hyperlink in the fragment, if any.
pub fn first_link(fragment: &str) -> Option<Link> {
    links(fragment).into_iter().next()
}

/// Removes markup tags, decodes the minimal entity set, and trims the result.
pub fn strip_tags(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    decode_entities(&text).trim().to_string()
}

/// Decodes exactly five entities: `&nbsp;` `&amp;` `&lt;` `&gt;` `&quot;`.
///
/// The set is intentionally minimal: it matches the entity usage of the
/// target pages. Do not generalize to a full entity table without verifying
/// that it does not change observable output.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        let (replacement, consumed) = if tail.starts_with("&nbsp;") {
            (" ", 6)
        } else if tail.starts_with("&amp;") {
            ("&", 5)
        } else if tail.starts_with("&lt;") {
            ("<", 4)
        } else if tail.starts_with("&gt;") {
            (">", 4)
        } else if tail.starts_with("&quot;") {
            ("\"", 6)
        } else {
            ("&", 1)
        };
        out.push_str(replacement);
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}

/// Extracts an attribute value from a single open tag.
///
/// Handles double-quoted, single-quoted, and bare values; attribute name
/// matching is ASCII case-insensitive.
pub fn attr_value<'a>(open_tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = open_tag.to_ascii_lowercase();
    let needle = name.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut from = 0;
    while let Some(rel) = lower[from..].find(&needle) {
        let at = from + rel;
        from = at + needle.len();
        // Name must stand alone: preceded by whitespace, followed by '='
        if at == 0 || !bytes[at - 1].is_ascii_whitespace() {
            continue;
        }
        let mut i = at + needle.len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        let quote = bytes[i];
        if quote == b'"' || quote == b'\'' {
            let start = i + 1;
            return lower[start..]
                .find(quote as char)
                .map(|len| &open_tag[start..start + len]);
        }
        let start = i;
        let end = lower[start..]
            .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
            .map_or(open_tag.len(), |len| start + len);
        return Some(&open_tag[start..end]);
    }
    None
}

/// Whole-token, case-insensitive class attribute check.
pub fn has_class(open_tag: &str, class: &str) -> bool {
    attr_value(open_tag, "class").is_some_and(|value| {
        value
            .split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case(class))
    })
}

/// Finds the next `<tag` open position at or after `from`.
fn find_tag_open(html: &str, from: usize, tag: &str) -> Option<usize> {
    let mut pos = from;
    while pos < html.len() {
        let at = pos + html[pos..].find('<')?;
        if tag_name_at(html, at + 1, tag) {
            return Some(at);
        }
        pos = at + 1;
    }
    None
}

/// Checks whether `tag` (followed by a delimiter) starts at `name_start`.
fn tag_name_at(html: &str, name_start: usize, tag: &str) -> bool {
    let end = name_start + tag.len();
    if end > html.len() || !html.is_char_boundary(name_start) || !html.is_char_boundary(end) {
        return false;
    }
    if !html[name_start..end].eq_ignore_ascii_case(tag) {
        return false;
    }
    match html.as_bytes().get(end) {
        Some(b) => b.is_ascii_whitespace() || *b == b'>' || *b == b'/',
        None => true,
    }
}

/// Finds the start of the `</tag>` matching the block opened just before
/// `from`, accounting for nested same-tag blocks.
fn find_matching_close(html: &str, from: usize, tag: &str) -> Option<usize> {
    let mut depth: usize = 1;
    let mut pos = from;
    while pos < html.len() {
        let at = pos + html[pos..].find('<')?;
        let bytes = html.as_bytes();
        if bytes.get(at + 1) == Some(&b'/') && tag_name_at(html, at + 2, tag) {
            depth -= 1;
            if depth == 0 {
                return Some(at);
            }
            pos = at + 2;
        } else if tag_name_at(html, at + 1, tag) {
            let tag_close = html[at..].find('>').map(|rel| at + rel);
            let self_closing = tag_close.is_some_and(|tc| html[at..=tc].ends_with("/>"));
            if !self_closing {
                depth += 1;
            }
            pos = tag_close.map_or(at + 1, |tc| tc + 1);
        } else {
            pos = at + 1;
        }
    }
    None
}

/// Position just past the `>` of the close tag starting at `close_at`.
fn after_close(html: &str, close_at: usize) -> usize {
    html[close_at..]
        .find('>')
        .map_or(html.len(), |rel| close_at + rel + 1)
}
