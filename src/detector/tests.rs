use super::*;
use crate::config::SchemaConfig;
use crate::schema::SchemaAccumulator;

fn schema_of(xml: &str) -> DocumentSchema {
    SchemaAccumulator::analyze_bytes(xml.as_bytes(), "test.xml", &SchemaConfig::default()).unwrap()
}

#[test]
fn test_detects_xccdf() {
    let schema = schema_of(
        r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.2" id="b"><Rule id="r1"/></Benchmark>"#,
    );
    let detection = DocumentTypeDetector::new().detect(&schema);

    assert_eq!(detection.document_type, "XCCDF");
    assert!(detection.confidence > MIN_CONFIDENCE);
    assert!((detection.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn test_detects_rss_by_root() {
    let schema = schema_of("<rss version=\"2.0\"><channel><title>t</title></channel></rss>");
    let detection = DocumentTypeDetector::new().detect(&schema);

    assert_eq!(detection.document_type, "RSS");
    assert!((detection.confidence - ROOT_MATCH_WEIGHT).abs() < 1e-9);
}

#[test]
fn test_unknown_document_is_generic() {
    let schema = schema_of("<inventory xmlns=\"urn:example:inventory\"><item/></inventory>");
    let detection = DocumentTypeDetector::new().detect(&schema);

    assert_eq!(detection.document_type, "GENERIC_XML");
    assert!(detection.is_generic());
    assert_eq!(detection.confidence, BASELINE_CONFIDENCE);
}

#[test]
fn test_namespace_only_match() {
    let schema = schema_of(
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><url><loc>x</loc></url></urlset>"#,
    );
    let detection = DocumentTypeDetector::new().detect(&schema);
    assert_eq!(detection.document_type, "SITEMAP");
    assert!((detection.confidence - 0.9).abs() < 1e-9);

    let schema = schema_of(r#"<custom xmlns:s="http://www.w3.org/2000/svg"><s:svg/></custom>"#);
    let detection = DocumentTypeDetector::new().detect(&schema);
    assert_eq!(detection.document_type, "SVG");
    assert!((detection.confidence - NAMESPACE_MATCH_WEIGHT).abs() < 1e-9);
}

#[test]
fn test_namespace_weight_is_capped() {
    let schema = schema_of(
        r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.1"
                      xmlns:a="http://checklists.nist.gov/xccdf/1.2"
                      xmlns:b="http://checklists.nist.gov/xccdf-p/1.1"/>"#,
    );
    let xccdf = DocumentTypeDetector::new()
        .patterns()
        .iter()
        .find(|p| p.name == "XCCDF")
        .cloned()
        .unwrap();

    let score = DocumentTypeDetector::score(&xccdf, &schema);
    assert!((score - (ROOT_MATCH_WEIGHT + NAMESPACE_WEIGHT_CAP)).abs() < 1e-9);
}

#[test]
fn test_tie_goes_to_first_registered() {
    // Both SCAP and XCCDF list the xccdf namespace; neither matches the root
    let schema = schema_of(r#"<Profile xmlns="http://checklists.nist.gov/xccdf/1.2"/>"#);
    let detection = DocumentTypeDetector::new().detect(&schema);
    assert_eq!(detection.document_type, "SCAP");

    let mut detector = DocumentTypeDetector::empty();
    detector.register(DocumentPattern::new("FIRST", "first", &["root"], &[]));
    detector.register(DocumentPattern::new("SECOND", "second", &["root"], &[]));
    assert_eq!(detector.detect(&schema_of("<root/>")).document_type, "FIRST");

    let mut reversed = DocumentTypeDetector::empty();
    reversed.register(DocumentPattern::new("SECOND", "second", &["root"], &[]));
    reversed.register(DocumentPattern::new("FIRST", "first", &["root"], &[]));
    assert_eq!(reversed.detect(&schema_of("<root/>")).document_type, "SECOND");
}

#[test]
fn test_custom_pattern() {
    let mut detector = DocumentTypeDetector::new();
    detector.register(DocumentPattern::new(
        "INVENTORY",
        "Warehouse inventory",
        &["inventory"],
        &["urn:example:inventory"],
    ));

    let schema = schema_of("<inventory xmlns=\"urn:example:inventory\"><item/></inventory>");
    let detection = detector.detect(&schema);
    assert_eq!(detection.document_type, "INVENTORY");
    assert_eq!(detector.describe("INVENTORY"), Some("Warehouse inventory"));
}

#[test]
fn test_empty_detector_is_generic() {
    let schema = schema_of("<rss/>");
    assert!(DocumentTypeDetector::empty().detect(&schema).is_generic());
}

#[test]
fn test_classify_records_type() {
    let schema = schema_of("<rss><channel/></rss>");
    let (schema, detection) = DocumentTypeDetector::new().classify(schema);

    assert_eq!(schema.document_type, "RSS");
    assert_eq!(schema.confidence, detection.confidence);
}
