//! Text formatting helpers shared by notifications and command replies.
//!
//! Chat platforms cap message length, so anything that echoes external data
//! back to a channel goes through [`truncate_with_marker`].

/// Format a counter with `,` thousands separators.
///
/// # Examples
/// ```
/// use bftracker_types::formatting::format_thousands;
/// assert_eq!(format_thousands(0), "0");
/// assert_eq!(format_thousands(1_500), "1,500");
/// assert_eq!(format_thousands(1_500_000), "1,500,000");
/// ```
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Cut `text` to at most `max_chars` characters, appending `marker` when
/// anything was removed. Never splits a multi-byte character.
///
/// # Examples
/// ```
/// use bftracker_types::formatting::truncate_with_marker;
/// assert_eq!(truncate_with_marker("short", 10, "…"), "short");
/// assert_eq!(truncate_with_marker("abcdefgh", 3, "…"), "abc…");
/// ```
pub fn truncate_with_marker(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + marker.len());
            out.push_str(&text[..cut]);
            out.push_str(marker);
            out
        }
    }
}

/// Render items as a `• item` list, one per line.
pub fn bullet_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("• {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
