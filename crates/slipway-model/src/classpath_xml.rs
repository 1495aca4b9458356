//! Classpath entries are persisted as an Eclipse-style XML fragment, the
//! native serialization of the host Java model. Library entries use
//! `kind="lib"`; project references use `kind="src"` with a workspace path.

use thiserror::Error;

use crate::{AccessRule, AccessRuleKind, ClasspathAttribute, ClasspathEntry, ClasspathEntryKind};

#[derive(Debug, Error)]
pub enum ClasspathXmlError {
    #[error("invalid classpath XML: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("invalid classpath XML: {0}")]
    Malformed(String),
}

pub fn classpath_to_xml(entries: &[ClasspathEntry]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<classpath>\n");
    for entry in entries {
        let kind = match entry.kind {
            ClasspathEntryKind::Library => "lib",
            ClasspathEntryKind::Project => "src",
        };
        out.push_str(&format!(
            "\t<classpathentry kind=\"{kind}\" path=\"{}\"",
            escape(&entry.path)
        ));
        if let Some(source) = &entry.source_path {
            out.push_str(&format!(" sourcepath=\"{}\"", escape(source)));
        }
        if entry.exported {
            out.push_str(" exported=\"true\"");
        }

        if entry.access_rules.is_empty() && entry.attributes.is_empty() {
            out.push_str("/>\n");
            continue;
        }
        out.push_str(">\n");
        if !entry.access_rules.is_empty() {
            out.push_str("\t\t<accessrules>\n");
            for rule in &entry.access_rules {
                out.push_str(&format!(
                    "\t\t\t<accessrule kind=\"{}\" pattern=\"{}\"/>\n",
                    access_rule_kind_str(rule.kind),
                    escape(&rule.pattern)
                ));
            }
            out.push_str("\t\t</accessrules>\n");
        }
        if !entry.attributes.is_empty() {
            out.push_str("\t\t<attributes>\n");
            for attribute in &entry.attributes {
                out.push_str(&format!(
                    "\t\t\t<attribute name=\"{}\" value=\"{}\"/>\n",
                    escape(&attribute.name),
                    escape(&attribute.value)
                ));
            }
            out.push_str("\t\t</attributes>\n");
        }
        out.push_str("\t</classpathentry>\n");
    }
    out.push_str("</classpath>\n");
    out
}

pub fn classpath_from_xml(xml: &str) -> Result<Vec<ClasspathEntry>, ClasspathXmlError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "classpath" {
        return Err(ClasspathXmlError::Malformed(format!(
            "unexpected root element <{}>",
            root.tag_name().name()
        )));
    }

    let mut entries = Vec::new();
    for node in root.children().filter(|n| n.has_tag_name("classpathentry")) {
        let kind = match node.attribute("kind") {
            Some("lib") => ClasspathEntryKind::Library,
            Some("src") => ClasspathEntryKind::Project,
            Some(other) => {
                return Err(ClasspathXmlError::Malformed(format!(
                    "unsupported entry kind {other:?}"
                )))
            }
            None => {
                return Err(ClasspathXmlError::Malformed(
                    "classpathentry without kind".to_string(),
                ))
            }
        };
        let path = node
            .attribute("path")
            .ok_or_else(|| {
                ClasspathXmlError::Malformed("classpathentry without path".to_string())
            })?
            .to_string();

        let mut access_rules = Vec::new();
        let mut attributes = Vec::new();
        for child in node.children() {
            if child.has_tag_name("accessrules") {
                for rule in child.children().filter(|n| n.has_tag_name("accessrule")) {
                    access_rules.push(AccessRule {
                        kind: parse_access_rule_kind(rule.attribute("kind"))?,
                        pattern: rule.attribute("pattern").unwrap_or_default().to_string(),
                    });
                }
            } else if child.has_tag_name("attributes") {
                for attribute in child.children().filter(|n| n.has_tag_name("attribute")) {
                    attributes.push(ClasspathAttribute {
                        name: attribute.attribute("name").unwrap_or_default().to_string(),
                        value: attribute.attribute("value").unwrap_or_default().to_string(),
                    });
                }
            }
        }

        entries.push(ClasspathEntry {
            kind,
            path,
            source_path: node.attribute("sourcepath").map(str::to_string),
            exported: node.attribute("exported") == Some("true"),
            access_rules,
            attributes,
        });
    }
    Ok(entries)
}

fn access_rule_kind_str(kind: AccessRuleKind) -> &'static str {
    match kind {
        AccessRuleKind::Accessible => "accessible",
        AccessRuleKind::NonAccessible => "nonaccessible",
        AccessRuleKind::Discouraged => "discouraged",
    }
}

fn parse_access_rule_kind(value: Option<&str>) -> Result<AccessRuleKind, ClasspathXmlError> {
    match value {
        Some("accessible") => Ok(AccessRuleKind::Accessible),
        Some("nonaccessible") => Ok(AccessRuleKind::NonAccessible),
        Some("discouraged") => Ok(AccessRuleKind::Discouraged),
        other => Err(ClasspathXmlError::Malformed(format!(
            "unsupported access rule kind {other:?}"
        ))),
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
