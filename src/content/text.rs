//! Cleanup of raw model output before it is stored or spoken.

use crate::content::types::Speaker;

const SCRIPT_PREAMBLES: &[&str] = &[
    "Here is a possible intro:",
    "Here's a possible intro:",
    "Here is an intro:",
    "Here's an intro:",
    "Here is the intro:",
    "Here's the intro:",
    "Intro script:",
    "Here is a possible outro:",
    "Here's a possible outro:",
    "Here is outro script:",
    "Here's outro script:",
    "Here is the outro:",
    "Here's the outro:",
    "Outro script:",
];

const TRANSLATION_PREAMBLES: &[&str] = &["Translated text:", "Translation:"];

/// Paragraphs starting with one of these are model commentary, not content.
const COMMENTARY_MARKERS: &[&str] = &["note:", "(note", "requirements:", "---", "translator's note"];

/// Strip "Here is the intro:"-style preambles and stray leading quotes.
pub fn clean_script_text(text: &str) -> String {
    let mut cleaned = text.trim();
    for prefix in SCRIPT_PREAMBLES {
        if let Some(rest) = strip_prefix_ignore_case(cleaned, prefix) {
            cleaned = rest.trim_start().trim_start_matches(['"', ':']);
            break;
        }
    }
    cleaned.trim().to_string()
}

/// Clean one generated dialogue line.
///
/// Removes script preambles, a leading speaker label such as `Guest:` or
/// `**Moderator:**`, and quotes wrapping the whole line.
pub fn clean_turn(text: &str) -> String {
    let cleaned = clean_script_text(text);
    let mut line = cleaned.as_str();

    let unbolded = line.trim_start_matches('*');
    for speaker in [Speaker::Moderator, Speaker::Host, Speaker::Guest] {
        if let Some(rest) = strip_prefix_ignore_case(unbolded, speaker.as_str()) {
            let rest = rest.trim_start_matches('*').trim_start();
            if let Some(rest) = rest.strip_prefix(':') {
                line = rest.trim_start_matches('*').trim();
                break;
            }
        }
    }

    strip_wrapping_quotes(line).to_string()
}

/// Clean translator output.
///
/// Drops "Translation:"-style preambles and trailing paragraphs of model
/// commentary; the translated paragraphs themselves are kept.
pub fn clean_translation(text: &str) -> String {
    let mut body = text.trim();

    if let Some(rest) = strip_here_is_translation(body) {
        body = rest;
    }
    for prefix in TRANSLATION_PREAMBLES {
        if let Some(rest) = strip_prefix_ignore_case(body, prefix) {
            body = rest.trim_start();
            break;
        }
    }

    let paragraphs: Vec<&str> = body
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take_while(|p| {
            let lower = p.to_lowercase();
            !COMMENTARY_MARKERS.iter().any(|m| lower.starts_with(m))
        })
        .collect();

    strip_wrapping_quotes(&paragraphs.join("\n\n")).to_string()
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn strip_here_is_translation(text: &str) -> Option<&str> {
    let first_line = text.lines().next()?;
    let lower = first_line.to_lowercase();
    if (lower.starts_with("here's") || lower.starts_with("here is"))
        && lower.trim_end().ends_with("translation:")
    {
        Some(text[first_line.len()..].trim_start())
    } else {
        None
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

fn strip_wrapping_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
            && !inner.contains(open)
        {
            return inner.trim();
        }
    }
    trimmed
}
