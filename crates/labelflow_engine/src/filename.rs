use std::borrow::Cow;

use percent_encoding::percent_decode_str;

const MAX_NAME_LEN: usize = 120;

/// Windows-safe filename for a downloaded archive.
///
/// Uses `candidate` when it sanitizes to something usable, otherwise `fallback`.
/// Directory components are stripped so a server cannot steer the write location.
pub fn safe_file_name(candidate: Option<&str>, fallback: &str) -> String {
    candidate
        .map(sanitize)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| {
            let name = sanitize(fallback);
            if name.is_empty() {
                "processed.zip".to_string()
            } else {
                name
            }
        })
}

/// Extracts the filename from a `Content-Disposition` header value.
///
/// Prefers the RFC 5987 `filename*=` form over plain `filename=`.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in header.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if key == "filename*" {
            // charset'language'percent-encoded
            let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
            extended = percent_decode_str(encoded)
                .decode_utf8()
                .ok()
                .map(Cow::into_owned);
        } else if key == "filename" {
            plain = Some(value.trim_matches('"').to_string());
        }
    }
    extended.or(plain).filter(|name| !name.is_empty())
}

fn sanitize(input: &str) -> String {
    let base = input
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(input);
    let mut cleaned: String = base
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.chars().count() > MAX_NAME_LEN {
        cleaned = truncate_keeping_extension(&cleaned);
    }
    let stem = cleaned.split('.').next().unwrap_or("");
    if is_reserved_windows_name(stem) {
        cleaned.insert(stem.len(), '_');
    }
    cleaned
}

/// Shortens the stem so the whole name fits, leaving a short extension intact.
fn truncate_keeping_extension(name: &str) -> String {
    let ext = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= 16 => &name[dot..],
        _ => "",
    };
    let stem = &name[..name.len() - ext.len()];
    let keep = MAX_NAME_LEN - ext.chars().count();
    let mut out: String = stem.chars().take(keep).collect();
    out.push_str(ext);
    out
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
