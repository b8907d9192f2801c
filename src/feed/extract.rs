//! Best-effort extraction from RSS fragments.
//!
//! Both functions run a real XML tokenizer (`quick-xml`) over the input instead
//! of pattern matching, so CDATA sections, entities and nested elements of the
//! same name are handled. They are still lenient: mismatched end tags are
//! tolerated and a fragment does not have to be a complete document.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Returns the trimmed text content of the first element named `tag_name`.
///
/// - Names are compared ASCII case-insensitively on the full qualified name, so
///   `content:encoded` matches `<content:encoded>` literally.
/// - Text is entity-unescaped (unknown entities are kept verbatim), CDATA is
///   unwrapped, and the text of nested child elements is included.
/// - No match, or an empty/self-closing element, yields `""`.
/// - If the XML breaks inside the matched element, the text gathered so far is
///   returned.
///
/// # Examples
///
/// ```
/// use glean::feed::extract_tag;
///
/// assert_eq!(extract_tag("<title>Hello <![CDATA[World]]></title>", "title"), "Hello World");
/// assert_eq!(extract_tag("<foo></foo>", "title"), "");
/// ```
pub fn extract_tag(xml_fragment: &str, tag_name: &str) -> String {
    let mut reader = lenient_reader(xml_fragment);
    let wanted = tag_name.as_bytes();

    let mut text = String::new();
    // Depth inside the matched element; 0 means "not matched yet"
    let mut depth: usize = 0;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(tag = %tag_name, error = %e, "XML error while extracting tag");
                break;
            }
        };

        match event {
            Event::Start(e) if e.name().as_ref().eq_ignore_ascii_case(wanted) => {
                depth += 1;
            }
            Event::Empty(e) if depth == 0 && e.name().as_ref().eq_ignore_ascii_case(wanted) => {
                return String::new();
            }
            Event::End(e) if depth > 0 && e.name().as_ref().eq_ignore_ascii_case(wanted) => {
                depth -= 1;
                if depth == 0 {
                    return text.trim().to_string();
                }
            }
            Event::Text(t) if depth > 0 => match t.unescape() {
                Ok(unescaped) => text.push_str(&unescaped),
                // HTML entities such as &nbsp; are not XML entities; keep them as written
                Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
            },
            Event::CData(c) if depth > 0 => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    text.trim().to_string()
}

/// Returns the raw inner markup of the first `<item>` element.
///
/// The slice is taken from the input itself, so it can be fed back into
/// [`extract_tag`]. Returns `None` when the document has no complete item.
///
/// # Examples
///
/// ```
/// use glean::feed::{extract_tag, first_item};
///
/// let rss = "<rss><channel><title>Blog</title>\
///            <item><title>First</title></item>\
///            <item><title>Second</title></item></channel></rss>";
/// let item = first_item(rss).unwrap();
/// assert_eq!(extract_tag(item, "title"), "First");
/// ```
pub fn first_item(xml: &str) -> Option<&str> {
    let mut reader = lenient_reader(xml);
    let mut inner_start: Option<usize> = None;
    let mut depth: usize = 0;

    loop {
        let before = usize::try_from(reader.buffer_position()).ok()?;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(error = %e, "XML error while locating first item");
                return None;
            }
        };

        match event {
            Event::Start(e) if e.name().as_ref() == b"item" => {
                if inner_start.is_none() {
                    inner_start = Some(usize::try_from(reader.buffer_position()).ok()?);
                }
                depth += 1;
            }
            Event::End(e) if inner_start.is_some() && e.name().as_ref() == b"item" => {
                depth -= 1;
                if depth == 0 {
                    let start = inner_start?;
                    return xml.get(start..before);
                }
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

fn lenient_reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = false;
    reader
}
