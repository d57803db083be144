//! Sanitisation of values that arrive on the query string.
//!
//! None of these functions fail. A value that cannot be reduced to something
//! plausible comes back as an empty string, and the caller decides whether an
//! empty field is worth a diagnostic.

/// Characters allowed in the local part of an address, besides ASCII alphanumerics.
const EMAIL_LOCAL_EXTRA: &str = "!#$%&'*+/=?^_`{|}~.-";

/// Shortest address worth looking at (`a@b.co`).
const EMAIL_MIN_LEN: usize = 6;

/// Characters trimmed from the ends of a domain.
const DOMAIN_TRIM: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B', '.'];

/// Characters trimmed from the ends of a domain label.
const LABEL_TRIM: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B', '-'];

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || EMAIL_LOCAL_EXTRA.contains(c)
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// Removes every run of two or more consecutive dots.
fn drop_dot_runs(domain: &str) -> String {
    let mut out = String::with_capacity(domain.len());
    let mut run = 0usize;
    for c in domain.chars() {
        if c == '.' {
            run += 1;
            continue;
        }
        if run == 1 {
            out.push('.');
        }
        run = 0;
        out.push(c);
    }
    if run == 1 {
        out.push('.');
    }
    out
}

/// Reduce `raw` to a syntactically plausible email address.
///
/// Characters that cannot appear in an address are dropped rather than
/// rejected. Returns an empty string when nothing usable is left, e.g. no `@`,
/// an empty local part, or fewer than two domain labels.
pub fn sanitize_email(raw: &str) -> String {
    let email = raw.trim();
    if email.len() < EMAIL_MIN_LEN {
        return String::new();
    }

    let Some((local, domain)) = email.split_once('@') else {
        return String::new();
    };

    let local: String = local.chars().filter(|c| is_local_char(*c)).collect();
    if local.is_empty() {
        return String::new();
    }

    let domain = drop_dot_runs(domain);
    let domain = domain.trim_matches(DOMAIN_TRIM);
    if domain.is_empty() {
        return String::new();
    }

    let labels: Vec<String> = domain
        .split('.')
        .map(|label| label.trim_matches(LABEL_TRIM).chars().filter(|c| is_label_char(*c)).collect::<String>())
        .filter(|label| !label.is_empty())
        .collect();
    if labels.len() < 2 {
        return String::new();
    }

    format!("{local}@{}", labels.join("."))
}

/// Strict syntax check used where an invalid address must be refused outright.
pub fn is_email(email: &str) -> bool {
    if email.len() < EMAIL_MIN_LEN {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || !local.chars().all(is_local_char) {
        return false;
    }

    if domain.contains("..") || domain.trim_matches(DOMAIN_TRIM) != domain {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels
        .iter()
        .all(|label| !label.is_empty() && label.trim_matches(LABEL_TRIM) == *label && label.chars().all(is_label_char))
}

/// Removes `<script>` and `<style>` elements together with their contents.
fn drop_elements(input: &str, name: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let open = format!("<{name}");
    let close = format!("</{name}");

    loop {
        let lower = rest.to_ascii_lowercase();
        let Some(start) = lower.find(&open) else {
            break;
        };
        let Some(close_at) = lower[start..].find(&close).map(|i| start + i) else {
            break;
        };
        let Some(end) = lower[close_at..].find('>').map(|i| close_at + i + 1) else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

/// Strips markup, leaving text.
///
/// A `<` that never closes is kept as `&lt;`; a `<` followed by whitespace is
/// treated as a literal less-than sign.
pub fn strip_tags(input: &str) -> String {
    let input = drop_elements(&drop_elements(input, "script"), "style");
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();

    while let Some((i, c)) = chars.next() {
        if c != '<' {
            out.push(c);
            continue;
        }

        let tail = &input[i + 1..];
        let closes_before_next_open = match (tail.find('>'), tail.find('<')) {
            (Some(gt), Some(lt)) => gt < lt,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if !closes_before_next_open {
            out.push_str("&lt;");
        } else if tail.starts_with(char::is_whitespace) {
            out.push('<');
        } else {
            for (_, skipped) in chars.by_ref() {
                if skipped == '>' {
                    break;
                }
            }
        }
    }

    out
}

/// The first `%XX` octet in `s`, if any.
fn find_octet(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    (0..bytes.len().saturating_sub(2))
        .find(|&i| bytes[i] == b'%' && bytes[i + 1].is_ascii_hexdigit() && bytes[i + 2].is_ascii_hexdigit())
        .map(|i| &s[i..i + 3])
}

fn collapse_whitespace(s: &str) -> String {
    s.split([' ', '\t', '\r', '\n']).filter(|part| !part.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Plain-text sanitisation for free-form fields (song, project, file-pass token).
///
/// Tags and control characters go, whitespace runs collapse to a single
/// space, and leftover percent-encoded octets are removed.
pub fn sanitize_text_field(raw: &str) -> String {
    let mut filtered = if raw.contains('<') { strip_tags(raw) } else { raw.to_string() };

    filtered.retain(|c| !c.is_control() || matches!(c, '\t' | '\r' | '\n'));
    let mut filtered = collapse_whitespace(&filtered);

    let mut found = false;
    loop {
        let Some(octet) = find_octet(&filtered).map(str::to_string) else {
            break;
        };
        filtered = filtered.replace(&octet, "");
        found = true;
    }
    if found {
        filtered = collapse_whitespace(&filtered);
    }

    filtered
}
