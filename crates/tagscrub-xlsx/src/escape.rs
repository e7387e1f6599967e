//! Excel's `_xHHHH_` escapes for characters XML cannot carry
//!
//! - `_x000d_` = CR, `_x000a_` = LF, `_x0009_` = Tab
//! - `_x005f_` = a literal underscore that would otherwise start an escape

/// Decode `_xHHHH_` sequences; anything malformed is kept verbatim.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match parse_escape(candidate) {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// `_xHHHH_` at the start of `s`
fn parse_escape(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() < 7
        || !bytes.starts_with(b"_x")
        || bytes[6] != b'_'
        || !bytes[2..6].iter().all(u8::is_ascii_hexdigit)
    {
        return None;
    }
    u32::from_str_radix(&s[2..6], 16)
        .ok()
        .and_then(char::from_u32)
}

/// Make `s` safe to store in a `<t>` or `<v>` element.
///
/// Control characters other than tab/newline/CR are not legal XML 1.0 and are
/// written as escapes; an underscore that would be read back as the start of
/// an escape is itself escaped.
pub(crate) fn encode_excel_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '_' if parse_escape(&s[i..]).is_some() => out.push_str("_x005F_"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => out.push_str(&format!("_x{:04X}_", c as u32)),
            c => out.push(c),
        }
    }
    out
}
