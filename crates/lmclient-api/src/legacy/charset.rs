// Charset coercion for legacy XML bodies
//
// Older firmware declares `encoding="ISO-8859-1"` and emits Latin-1 bytes.
// Bodies are transcoded to UTF-8 before they reach the XML deserializer.
// encoding_rs follows the WHATWG label registry, which maps ISO-8859-1 to
// Windows-1252 (a superset).

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::error::Error;

/// The `encoding` pseudo-attribute of the XML declaration, if any.
pub(crate) fn declared_encoding(body: &[u8]) -> Option<&str> {
    let head = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let head = head.trim_ascii_start().strip_prefix(b"<?xml")?;
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;

    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|close| &value[..close])
}

/// Decode a legacy response body to UTF-8 text.
pub(crate) fn decode_body(body: &[u8]) -> Result<Cow<'_, str>, Error> {
    let encoding = match declared_encoding(body) {
        None => UTF_8,
        Some(label) => Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| Error::Charset(label.to_owned()))?,
    };

    if encoding == UTF_8 {
        let text = std::str::from_utf8(body).map_err(|e| {
            Error::deserialization(
                format!("invalid UTF-8 in XML body: {e}"),
                &String::from_utf8_lossy(body),
            )
        })?;
        return Ok(Cow::Borrowed(text.strip_prefix('\u{FEFF}').unwrap_or(text)));
    }

    let (text, _) = encoding.decode_without_bom_handling(body);
    Ok(text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn reads_double_and_single_quoted_labels() {
        assert_eq!(
            declared_encoding(br#"<?xml version="1.0" encoding="ISO-8859-1"?><Response/>"#),
            Some("ISO-8859-1")
        );
        assert_eq!(
            declared_encoding(b"<?xml version='1.0' encoding = 'utf-8' ?><a/>"),
            Some("utf-8")
        );
    }

    #[test]
    fn no_declaration_means_no_label() {
        assert_eq!(declared_encoding(b"<Response/>"), None);
        assert_eq!(declared_encoding(br#"<?xml version="1.0"?><a/>"#), None);
    }

    #[test]
    fn latin1_is_transcoded() {
        let mut body = br#"<?xml version="1.0" encoding="ISO-8859-1"?><N>caf"#.to_vec();
        body.push(0xE9);
        body.extend_from_slice(b"</N>");
        let text = decode_body(&body).unwrap();
        assert!(text.ends_with("<N>caf\u{e9}</N>"));
    }

    #[test]
    fn windows_1252_extras_survive() {
        // 0x80 is the euro sign in Windows-1252, a control code in strict Latin-1.
        let mut body = br#"<?xml version="1.0" encoding="ISO-8859-1"?><N>"#.to_vec();
        body.push(0x80);
        body.extend_from_slice(b"</N>");
        assert!(decode_body(&body).unwrap().contains('\u{20ac}'));
    }

    #[test]
    fn unknown_charset_is_rejected() {
        let body = br#"<?xml version="1.0" encoding="x-klingon"?><a/>"#;
        assert!(matches!(decode_body(body), Err(Error::Charset(label)) if label == "x-klingon"));
    }

    #[test]
    fn utf8_passes_through_borrowed() {
        let body = "<N>caf\u{e9}</N>".as_bytes();
        assert!(matches!(decode_body(body).unwrap(), Cow::Borrowed(_)));
    }
}
