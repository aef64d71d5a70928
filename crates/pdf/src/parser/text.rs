use unicode_normalization::UnicodeNormalization;

/// Normalize the text of a single token.
///
/// Applies NFC normalization, expands the common Latin ligatures and drops
/// replacement and control characters. Tabs are kept since they delimit
/// columns. Surrounding spaces are trimmed.
pub fn clean_token_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ];
    for (lig, replacement) in &ligatures {
        if result.contains(lig) {
            result = result.replace(lig, replacement);
        }
    }

    result.retain(|c| c == '\t' || !(c.is_control() || c == '\u{FFFD}'));
    result.trim_matches(' ').to_string()
}
