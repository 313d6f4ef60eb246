//! Minimal HTML slicing helpers.
//!
//! Enough to find elements by id, walk table rows and harvest form
//! fields from one known ASP.NET site. Not a parser; malformed input
//! just yields `None`, which callers treat as "element absent".

/// ASCII-lowercase without touching multibyte chars, so byte offsets
/// into the lowered copy stay valid in the original.
pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Case-insensitive find, returning a byte offset into `s`.
pub fn find_ci(s: &str, needle: &str, from: usize) -> Option<usize> {
    let lc = to_lower(s);
    let nl = to_lower(needle);
    lc.get(from..)?.find(&nl).map(|p| p + from)
}

fn id_marker(doc: &str, id: &str) -> Option<usize> {
    find_ci(doc, &format!("id=\"{id}\""), 0).or_else(|| find_ci(doc, &format!("id='{id}'"), 0))
}

/// Whether an element with the given id appears anywhere in the document.
pub fn has_id(doc: &str, id: &str) -> bool {
    id_marker(doc, id).is_some()
}

/// Inner content of the element carrying `id`, up to the given closing
/// tag. The close is matched textually, so this is only safe for
/// elements the site does not nest (labels, the one grid table).
pub fn id_block<'a>(doc: &'a str, id: &str, close_tag: &str) -> Option<&'a str> {
    let marker = id_marker(doc, id)?;
    let open_end = doc[marker..].find('>')? + marker + 1;
    let close = find_ci(doc, close_tag, open_end)?;
    Some(&doc[open_end..close])
}

/// Next `<open ...>...</close>` block at or after `from`, as byte
/// offsets into `s`. The returned end sits past the closing tag.
pub fn next_block(s: &str, open: &str, close: &str, from: usize) -> Option<(usize, usize)> {
    let mut at = from;
    loop {
        let start = find_ci(s, open, at)?;
        // The tag name must end right after `open`, otherwise `<a`
        // would also claim `<abbr>` and `<area>`.
        match s.as_bytes().get(start + open.len()) {
            Some(b'>') | Some(b'/') | None => {}
            Some(b) if b.is_ascii_whitespace() => {}
            _ => {
                at = start + open.len();
                continue;
            }
        }
        let open_end = s[start..].find('>')? + start + 1;
        let close_at = find_ci(s, close, open_end)?;
        return Some((start, close_at + close.len()));
    }
}

/// Visible text of a fragment: tags stripped, entities decoded,
/// whitespace collapsed.
pub fn text(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&decode_entities(&out))
}

/// Text of the first element whose id contains `fragment`, if any.
pub fn text_of_id_fragment(doc: &str, fragment: &str) -> Option<String> {
    let at = find_ci(doc, fragment, 0)?;
    let open_end = doc[at..].find('>')? + at + 1;
    let close = doc[open_end..].find('<')? + open_end;
    Some(text(&doc[open_end..close]))
}

/// The `<input ...>` (or other) tag slice carrying `id`, inclusive.
pub fn tag_by_id<'a>(doc: &'a str, id: &str) -> Option<&'a str> {
    let marker = id_marker(doc, id)?;
    let start = doc[..marker].rfind('<')?;
    let end = doc[marker..].find('>')? + marker + 1;
    Some(&doc[start..end])
}

/// Attribute value inside one tag slice, handling both quote styles.
pub fn attr(tag: &str, name: &str) -> Option<String> {
    let lc = to_lower(tag);
    let mut from = 0;
    loop {
        let at = lc[from..].find(&to_lower(name))? + from;
        // Must be a standalone attribute name followed by '='.
        let before_ok = at == 0 || {
            let b = lc.as_bytes()[at - 1];
            !(b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        };
        let rest = &tag[at + name.len()..];
        let rest_trim = rest.trim_start();
        if before_ok && rest_trim.starts_with('=') {
            let val = rest_trim[1..].trim_start();
            let quote = val.chars().next()?;
            if quote == '"' || quote == '\'' {
                let end = val[1..].find(quote)?;
                return Some(val[1..1 + end].to_string());
            }
            // Unquoted value: runs to whitespace or tag end.
            let end = val.find([' ', '\t', '\n', '>', '/']).unwrap_or(val.len());
            return Some(val[..end].to_string());
        }
        from = at + name.len();
    }
}

/// All hidden form fields in document order, as (name, value) pairs.
/// ASP.NET pages carry their round-trip state this way (__VIEWSTATE,
/// __EVENTVALIDATION and friends).
pub fn hidden_inputs(doc: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(at) = find_ci(doc, "<input", from) {
        let Some(end) = doc[at..].find('>') else { break };
        let tag = &doc[at..at + end + 1];
        from = at + end + 1;
        if attr(tag, "type").is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
            && let Some(name) = attr(tag, "name")
        {
            out.push((name, attr(tag, "value").unwrap_or_default()));
        }
    }
    out
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_block_slices_element_content() {
        let doc = r#"<div><span id="lbl" class="c">รอ 3 โครงการ</span></div>"#;
        assert_eq!(id_block(doc, "lbl", "</span>"), Some("รอ 3 โครงการ"));
        assert!(id_block(doc, "missing", "</span>").is_none());
    }

    #[test]
    fn next_block_walks_rows() {
        let doc = "<table><tr><td>a</td></tr><tr><td>b</td></tr></table>";
        let (s1, e1) = next_block(doc, "<tr", "</tr>", 0).unwrap();
        assert!(doc[s1..e1].contains(">a<"));
        let (s2, e2) = next_block(doc, "<tr", "</tr>", e1).unwrap();
        assert!(doc[s2..e2].contains(">b<"));
        assert!(next_block(doc, "<tr", "</tr>", e2).is_none());
    }

    #[test]
    fn next_block_skips_longer_tag_names() {
        let doc = r#"<abbr title="x">วช.</abbr><a href="u">ชื่อเรื่อง</a>"#;
        let (s, e) = next_block(doc, "<a", "</a>", 0).unwrap();
        assert_eq!(text(&doc[s..e]), "ชื่อเรื่อง");
    }

    #[test]
    fn text_strips_tags_and_entities() {
        assert_eq!(text("<b>a&nbsp;&amp;&nbsp;b</b>  c"), "a & b c");
    }

    #[test]
    fn attr_handles_quote_styles_and_lookalikes() {
        let tag = r#"<input data-name="x" type='hidden' name="__VIEWSTATE" value="AbC=="/>"#;
        assert_eq!(attr(tag, "name").as_deref(), Some("__VIEWSTATE"));
        assert_eq!(attr(tag, "type").as_deref(), Some("hidden"));
        assert_eq!(attr(tag, "value").as_deref(), Some("AbC=="));
        assert!(attr(tag, "checked").is_none());
    }

    #[test]
    fn hidden_inputs_keep_document_order() {
        let doc = r#"
            <input type="hidden" name="__VIEWSTATE" value="v1" />
            <input type="text" name="visible" value="nope" />
            <input type="HIDDEN" name="__EVENTVALIDATION" value="v2" />
        "#;
        let fields = hidden_inputs(doc);
        assert_eq!(
            fields,
            vec![
                ("__VIEWSTATE".to_string(), "v1".to_string()),
                ("__EVENTVALIDATION".to_string(), "v2".to_string()),
            ]
        );
    }

    #[test]
    fn tag_by_id_returns_whole_tag() {
        let doc = r#"<p><input id="tb_user" name="ctl00$tb_user" type="text"></p>"#;
        let tag = tag_by_id(doc, "tb_user").unwrap();
        assert!(tag.starts_with("<input"));
        assert_eq!(attr(tag, "name").as_deref(), Some("ctl00$tb_user"));
    }

    #[test]
    fn thai_text_survives_lowering() {
        let doc = r#"<span id="TH">นักวิจัย : สมชาย</span>"#;
        assert_eq!(id_block(doc, "th", "</span>"), Some("นักวิจัย : สมชาย"));
    }
}
