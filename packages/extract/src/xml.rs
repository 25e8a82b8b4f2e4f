//! Structural selection of flat records from a SEWIK XML document.
//!
//! Every element with a given tag name (at any depth) becomes one record.
//! Its attributes and its leaf child elements become fields; container
//! children (elements that themselves hold elements, like the `POJAZD`
//! list under a `ZDARZENIE`) are not flattened into the parent.

use std::borrow::Cow;

use accident_map_relation::Record;
use encoding_rs::{Encoding, UTF_8};
use roxmltree::{Document, Node, ParsingOptions};

/// Errors that can occur while decoding a document's bytes to text.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The prolog declares an encoding with no known decoder.
    #[error("unsupported encoding {0:?}")]
    UnknownEncoding(String),

    /// The bytes are not valid in the detected encoding.
    #[error("content is not valid {0}")]
    Malformed(&'static str),
}

/// Decodes raw document bytes to text.
///
/// A byte-order mark wins over the prolog's `encoding` declaration; with
/// neither, the document is read as UTF-8.
///
/// # Errors
///
/// Returns an error if the declared encoding is unknown or the bytes are
/// invalid in the chosen encoding.
pub fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
    let (encoding, body) = if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        (encoding, &bytes[bom_len..])
    } else {
        let encoding = match declared_encoding(bytes) {
            // An ASCII prolog rules out UTF-16, which maps back to UTF-8 here.
            Some(label) => Encoding::for_label(label.as_bytes())
                .ok_or_else(|| DecodeError::UnknownEncoding(label.to_owned()))?
                .output_encoding(),
            None => UTF_8,
        };
        (encoding, bytes)
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or(DecodeError::Malformed(encoding.name()))
}

/// The `encoding` pseudo-attribute of a leading `<?xml ...?>` declaration.
fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let prolog = bytes.strip_prefix(b"<?xml")?;
    let end = prolog.windows(2).position(|w| w == b"?>")?;
    let prolog = std::str::from_utf8(&prolog[..end]).ok()?;

    let rest = &prolog[prolog.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|&c| matches!(c, '"' | '\''))?;
    let rest = &rest[1..];
    rest.find(quote).map(|end| &rest[..end])
}

/// Parses `text` as XML, tolerating a leading byte-order mark and an
/// inline DTD.
///
/// # Errors
///
/// Returns the parser error if the document is not well-formed.
pub fn parse_document(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
}

/// Returns one record per element named `tag`, in document order.
#[must_use]
pub fn select_records(doc: &Document<'_>, tag: &str) -> Vec<Record> {
    doc.descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == tag)
        .map(node_record)
        .collect()
}

fn node_record(node: Node<'_, '_>) -> Record {
    let mut record: Record = node
        .attributes()
        .map(|attr| (attr.name().to_owned(), attr.value().trim().to_owned()))
        .collect();

    for child in node.children().filter(Node::is_element) {
        if child.children().any(|c| c.is_element()) {
            continue;
        }
        let value = child.text().map(str::trim).unwrap_or_default();
        record.push((child.tag_name().name().to_owned(), value.to_owned()));
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ZDARZENIA>
  <ZDARZENIE>
    <ID>100</ID>
    <WOJ>WOJ. MAZOWIECKIE</WOJ>
    <DATA_ZDARZENIA>2019-05-01</DATA_ZDARZENIA>
    <POJAZDY>
      <POJAZD ZN="A">
        <ID>7</ID>
        <RODZAJ_POJAZDU>IS101</RODZAJ_POJAZDU>
        <OSOBA><ID>55</ID><STUC_KOD>ZM</STUC_KOD></OSOBA>
      </POJAZD>
    </POJAZDY>
  </ZDARZENIE>
</ZDARZENIA>"#;

    fn field<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
        record
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn selects_elements_at_any_depth() {
        let doc = parse_document(SAMPLE).unwrap();

        let events = select_records(&doc, "ZDARZENIE");
        let vehicles = select_records(&doc, "POJAZD");
        let people = select_records(&doc, "OSOBA");

        assert_eq!(events.len(), 1);
        assert_eq!(vehicles.len(), 1);
        assert_eq!(people.len(), 1);
        assert_eq!(field(&events[0], "WOJ"), Some("WOJ. MAZOWIECKIE"));
        assert_eq!(field(&vehicles[0], "RODZAJ_POJAZDU"), Some("IS101"));
        assert_eq!(field(&vehicles[0], "ZN"), Some("A"));
        assert_eq!(field(&people[0], "STUC_KOD"), Some("ZM"));
    }

    #[test]
    fn container_children_are_not_flattened() {
        let doc = parse_document(SAMPLE).unwrap();
        let events = select_records(&doc, "ZDARZENIE");
        assert_eq!(field(&events[0], "POJAZDY"), None);

        let vehicles = select_records(&doc, "POJAZD");
        assert_eq!(field(&vehicles[0], "OSOBA"), None);
    }

    #[test]
    fn empty_leaf_becomes_empty_value() {
        let doc = parse_document("<R><OSOBA><ID>1</ID><ZSPO_ID/></OSOBA></R>").unwrap();
        let people = select_records(&doc, "OSOBA");
        assert_eq!(field(&people[0], "ZSPO_ID"), Some(""));
    }

    #[test]
    fn byte_order_mark_is_accepted() {
        let doc = parse_document("\u{feff}<R><POJAZD><ID>1</ID></POJAZD></R>").unwrap();
        assert_eq!(select_records(&doc, "POJAZD").len(), 1);
    }

    #[test]
    fn declared_single_byte_encoding_is_honored() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"windows-1250\"?>\n\
            <R><ZDARZENIE><WOJ>WOJ. \xA3\xD3DZKIE</WOJ></ZDARZENIE></R>";

        let text = decode_document(bytes).unwrap();
        let doc = parse_document(&text).unwrap();

        let events = select_records(&doc, "ZDARZENIE");
        assert_eq!(field(&events[0], "WOJ"), Some("WOJ. ŁÓDZKIE"));
    }

    #[test]
    fn undeclared_encoding_defaults_to_utf8() {
        let text = decode_document("<R><WOJ>ŚLĄSKIE</WOJ></R>".as_bytes()).unwrap();
        assert_eq!(text, "<R><WOJ>ŚLĄSKIE</WOJ></R>");

        let text = decode_document(b"<?xml version='1.0' encoding='UTF-8'?><R/>").unwrap();
        assert_eq!(text, "<?xml version='1.0' encoding='UTF-8'?><R/>");
    }

    #[test]
    fn byte_order_mark_overrides_declaration() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("<?xml version=\"1.0\" encoding=\"windows-1250\"?><R>Ł</R>".as_bytes());

        let text = decode_document(&bytes).unwrap();
        assert!(text.ends_with("<R>Ł</R>"));
    }

    #[test]
    fn undecodable_bytes_name_the_encoding() {
        let err = decode_document(b"<R>\xFF\xFE\xFD</R>").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed("UTF-8")));

        let err = decode_document(b"<?xml version=\"1.0\" encoding=\"klingon-7\"?><R/>").unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEncoding(ref label) if label == "klingon-7"));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_document("<R><ZDARZENIE></R>").is_err());
    }
}
