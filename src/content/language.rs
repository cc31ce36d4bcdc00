//! Language codes shared by the translator and the TTS backend.
//!
//! Codes follow the one-letter scheme used by Kokoro voices; a voice name
//! starts with the language letter followed by `f` (female) or `m` (male).

const LANGUAGES: &[(&str, &str, &[&str])] = &[
    ("a", "American English", &["af_", "am_"]),
    ("b", "British English", &["bf_", "bm_"]),
    ("j", "Japanese", &["jf_", "jm_"]),
    ("h", "Hindi", &["hf_", "hm_"]),
    ("p", "Portuguese", &["pf_", "pm_"]),
    ("z", "Chinese", &["zf_", "zm_"]),
    ("i", "Italian", &["if_", "im_"]),
    ("f", "French", &["ff_"]),
    ("e", "Spanish", &["ef_", "em_"]),
];

/// Human-readable name for a language code.
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, name, _)| *name)
}

/// All supported codes, for error messages.
pub fn supported_codes() -> Vec<&'static str> {
    LANGUAGES.iter().map(|(c, _, _)| *c).collect()
}

/// Whether the code names an English variant.
pub fn is_english(code: &str) -> bool {
    matches!(code, "a" | "b" | "en" | "en-us" | "en-gb")
}

/// Whether text written in `source` needs translating to be spoken in `target`.
pub fn needs_translation(source: &str, target: &str) -> bool {
    if source == target {
        return false;
    }
    !(is_english(source) && is_english(target))
}

/// Whether `voice` follows the naming scheme of `code`.
///
/// Unknown languages accept any voice.
pub fn voice_matches_language(voice: &str, code: &str) -> bool {
    match LANGUAGES.iter().find(|(c, _, _)| *c == code) {
        Some((_, _, prefixes)) => prefixes.iter().any(|p| voice.starts_with(p)),
        None => true,
    }
}
