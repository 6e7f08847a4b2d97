/// Maximum length, in characters, of any submitted answer.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Remove `<...>` markup, trim, and cap at [`MAX_TEXT_LENGTH`] characters.
pub fn sanitize_text(input: &str) -> String {
    let stripped = strip_markup(input);
    stripped.trim().chars().take(MAX_TEXT_LENGTH).collect()
}

/// Remove every `<` ... `>` span. An unclosed `<` is kept as text.
pub fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('<') {
        match rest[start..].find('>') {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + end + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}
