//! Media type parsing module
//!
//! Parses `Content-Type` values per RFC 2045/7231 media-type syntax so that
//! request bodies are only treated as JSON when declared as such.

/// Parsed `type/subtype` with parameters, names lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub essence: String,
    pub params: Vec<(String, String)>,
}

/// Parse a media type, returning `None` for malformed values
///
/// # Examples
/// ```
/// use http_exec::http::mime::parse_media_type;
/// let mt = parse_media_type("Application/JSON; charset=utf-8").unwrap();
/// assert_eq!(mt.essence, "application/json");
/// assert!(parse_media_type("application/").is_none());
/// ```
pub fn parse_media_type(value: &str) -> Option<MediaType> {
    let (essence, mut rest) = value.split_once(';').unwrap_or((value, ""));
    let (kind, subtype) = essence.trim().split_once('/')?;
    if !is_token(kind) || !is_token(subtype) {
        return None;
    }

    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches([' ', '\t']);
        if rest.is_empty() {
            break;
        }
        let (name, after_name) = rest.split_once('=')?;
        let name = name.trim();
        if !is_token(name) {
            return None;
        }
        let (param_value, after_value) = parse_param_value(after_name.trim_start())?;
        params.push((name.to_ascii_lowercase(), param_value));

        let after_value = after_value.trim_start_matches([' ', '\t']);
        rest = match after_value.strip_prefix(';') {
            Some(next) => next,
            None if after_value.is_empty() => "",
            None => return None,
        };
    }

    Some(MediaType {
        essence: format!(
            "{}/{}",
            kind.to_ascii_lowercase(),
            subtype.to_ascii_lowercase()
        ),
        params,
    })
}

/// Check whether a `Content-Type` header value declares exactly `application/json`
///
/// Parameters are ignored; suffixes such as `+json` do not count.
pub fn is_json_content_type(value: Option<&str>) -> bool {
    value
        .and_then(parse_media_type)
        .is_some_and(|mt| mt.essence == "application/json")
}

/// Parse a token or quoted-string, returning the value and the remaining input
fn parse_param_value(input: &str) -> Option<(String, &str)> {
    if let Some(quoted) = input.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = quoted.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => return Some((value, &quoted[i + 1..])),
                '\\' => value.push(chars.next()?.1),
                c => value.push(c),
            }
        }
        return None;
    }

    let end = input
        .find(|c: char| !is_token_char(c))
        .unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    Some((input[..end].to_string(), &input[end..]))
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

const fn is_token_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control() && !matches!(
        c,
        ' ' | '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '='
    )
}
