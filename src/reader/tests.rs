use super::*;
use crate::error::AnalysisError;

fn read_all(xml: &str) -> Result<Vec<SpannedEvent>, AnalysisError> {
    EventReader::from_bytes(xml.as_bytes(), "test.xml").collect()
}

fn is_end(event: &SpannedEvent) -> bool {
    matches!(event.event, XmlEvent::EndElement { .. })
}

fn starts(events: &[SpannedEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match &e.event {
            XmlEvent::StartElement { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_simple_document() {
    let events = read_all("<root><a>hi</a><b/></root>").unwrap();
    assert_eq!(starts(&events), vec!["root", "a", "b"]);

    let ends = events.iter().filter(|e| is_end(e)).count();
    assert_eq!(ends, 3);
    assert!(events
        .iter()
        .any(|e| e.event == XmlEvent::Characters("hi".to_string())));
}

#[test]
fn test_empty_element_expands() {
    let events = read_all("<root><b x=\"1\"/></root>").unwrap();
    let b_start = events
        .iter()
        .position(|e| matches!(&e.event, XmlEvent::StartElement { name, empty: true, .. } if name == "b"))
        .expect("empty element start");
    assert_eq!(
        events[b_start + 1].event,
        XmlEvent::EndElement { name: "b".to_string() }
    );
    assert_eq!(events[b_start + 1].span.start, events[b_start + 1].span.end);
}

#[test]
fn test_spans_are_contiguous_and_match_markup() {
    let xml = "<?xml version=\"1.0\"?>\n<root>\n  <!-- note -->\n  <item id=\"1\">text</item>\n</root>\n";
    let events = read_all(xml).unwrap();

    let mut expected_start = 0;
    for event in &events {
        assert_eq!(event.span.start, expected_start, "gap before {:?}", event.event);
        expected_start = event.span.end;
    }

    let item = events
        .iter()
        .find(|e| matches!(&e.event, XmlEvent::StartElement { name, .. } if name == "item"))
        .unwrap();
    let slice = &xml[item.span.start as usize..item.span.end as usize];
    assert!(slice.ends_with("<item id=\"1\">"), "span was {:?}", slice);
    assert_eq!(item.line, 4);

    let root_end = events.iter().rev().find(|e| is_end(e)).unwrap();
    assert!(xml[..root_end.span.end as usize].ends_with("</root>"));
}

#[test]
fn test_namespace_resolution() {
    let xml = r#"<x:root xmlns:x="urn:x" xmlns="urn:default"><child/><x:leaf a:b="v" xmlns:a="urn:a"/></x:root>"#;
    let events = read_all(xml).unwrap();

    let namespaces: Vec<(Option<String>, String)> = events
        .iter()
        .filter_map(|e| match &e.event {
            XmlEvent::StartNamespace { prefix, uri } => Some((prefix.clone(), uri.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        namespaces,
        vec![
            (Some("x".to_string()), "urn:x".to_string()),
            (None, "urn:default".to_string()),
            (Some("a".to_string()), "urn:a".to_string()),
        ]
    );

    let resolved: Vec<(String, Option<String>)> = events
        .iter()
        .filter_map(|e| match &e.event {
            XmlEvent::StartElement { name, namespace_uri, .. } => {
                Some((name.clone(), namespace_uri.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        resolved,
        vec![
            ("root".to_string(), Some("urn:x".to_string())),
            ("child".to_string(), Some("urn:default".to_string())),
            ("leaf".to_string(), Some("urn:x".to_string())),
        ]
    );

    let leaf_attrs = events
        .iter()
        .find_map(|e| match &e.event {
            XmlEvent::StartElement { name, attributes, .. } if name == "leaf" => {
                Some(attributes.clone())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(leaf_attrs.len(), 1);
    assert_eq!(leaf_attrs[0].name, "b");
    assert_eq!(leaf_attrs[0].prefix.as_deref(), Some("a"));
}

#[test]
fn test_entities_and_cdata() {
    let events = read_all("<r>a &amp; b<![CDATA[<raw>]]></r>").unwrap();
    let text: String = events
        .iter()
        .filter_map(|e| match &e.event {
            XmlEvent::Characters(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "a & b<raw>");
}

#[test]
fn test_truncated_document_is_fatal() {
    let err = read_all("<root><a>text</a><b>").unwrap_err();
    match err {
        AnalysisError::Parse { message, .. } => assert!(message.contains("unclosed"), "{}", message),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_mismatched_end_tag_is_fatal() {
    let err = read_all("<root><a></b></root>").unwrap_err();
    assert!(matches!(err, AnalysisError::Parse { .. }));
}

#[test]
fn test_second_root_is_fatal() {
    let err = read_all("<a/><b/>").unwrap_err();
    assert!(matches!(err, AnalysisError::Parse { .. }));
}

#[test]
fn test_text_outside_root_is_fatal() {
    let err = read_all("<a/>trailing").unwrap_err();
    assert!(matches!(err, AnalysisError::Parse { .. }));
}

#[test]
fn test_empty_input_is_fatal() {
    let err = read_all("   \n").unwrap_err();
    match err {
        AnalysisError::Parse { message, .. } => assert!(message.contains("no root")),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_stream_ends_after_error() {
    let mut reader = EventReader::from_bytes(b"<a><b></a>", "bad.xml");
    let mut saw_error = false;
    for item in reader.by_ref() {
        if item.is_err() {
            saw_error = true;
        }
    }
    assert!(saw_error);
    assert!(reader.next().is_none());
}

#[test]
fn test_error_reports_line() {
    let err = read_all("<root>\n<a>\n</b>\n</root>").unwrap_err();
    match err {
        AnalysisError::Parse { line, offset, .. } => {
            assert!(line >= 3, "line was {}", line);
            assert!(offset > 0);
        }
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_split_qname() {
    assert_eq!(split_qname("a:b"), (Some("a"), "b"));
    assert_eq!(split_qname("b"), (None, "b"));
}
