/// Relationships between parts of an OPC package.
///
/// Every part (and the package itself) owns a set of relationships keyed by
/// rId. Slide XML refers to images, layouts and embedded objects only through
/// these ids, so copying content between documents means copying or
/// re-creating the relationships it refers to.
use crate::common::xml::{XmlElement, escape_xml};
use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use std::collections::HashMap;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    /// Part reference relative to the source directory, or an external URL
    target_ref: String,
    base_uri: String,
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Absolute partname of the target. Fails for external relationships.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no partname",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Collection of relationships from a single source.
#[derive(Debug, Clone)]
pub struct Relationships {
    base_uri: String,
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    /// Create an empty collection whose relative targets resolve against `base_uri`.
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: HashMap::new(),
        }
    }

    /// Parse the content of a `.rels` part.
    pub fn from_xml(base_uri: &str, xml: &[u8]) -> Result<Self> {
        let mut rels = Self::new(base_uri.to_string());
        let root = XmlElement::parse_bytes(xml)?;
        for el in root.elements().filter(|el| el.local_name() == "Relationship") {
            let (Some(r_id), Some(reltype), Some(target)) =
                (el.attr("Id"), el.attr("Type"), el.attr("Target"))
            else {
                continue;
            };
            let is_external = el.attr("TargetMode") == Some(target_mode::EXTERNAL);
            rels.add_relationship(
                reltype.to_string(),
                target.to_string(),
                r_id.to_string(),
                is_external,
            );
        }
        Ok(rels)
    }

    /// Insert a relationship with a caller-chosen rId, replacing any previous one.
    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        is_external: bool,
    ) -> &Relationship {
        let rel = Relationship::new(
            r_id.clone(),
            reltype,
            target_ref,
            self.base_uri.clone(),
            is_external,
        );
        self.rels.entry(r_id).insert_entry(rel).into_mut()
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Return the rId of an internal relationship of this type to `target_ref`,
    /// creating it with the next free rId if needed.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> String {
        let existing = self.rels.values().find(|rel| {
            !rel.is_external() && rel.reltype() == reltype && rel.target_ref() == target_ref
        });
        if let Some(rel) = existing {
            return rel.r_id().to_string();
        }
        let r_id = self.next_r_id();
        self.add_relationship(reltype.to_string(), target_ref.to_string(), r_id.clone(), false);
        r_id
    }

    /// Same as [`get_or_add`](Self::get_or_add) for an external target URL.
    pub fn get_or_add_ext_rel(&mut self, reltype: &str, target_ref: &str) -> String {
        let existing = self.rels.values().find(|rel| {
            rel.is_external() && rel.reltype() == reltype && rel.target_ref() == target_ref
        });
        if let Some(rel) = existing {
            return rel.r_id().to_string();
        }
        let r_id = self.next_r_id();
        self.add_relationship(reltype.to_string(), target_ref.to_string(), r_id.clone(), true);
        r_id
    }

    /// Next free `rIdN`, one past the highest number in use.
    ///
    /// Gaps are never reused so an id freed by removing a slide cannot be
    /// confused with a stale reference in not-yet-rewritten XML.
    pub fn next_r_id(&self) -> String {
        let highest = self
            .rels
            .keys()
            .filter_map(|r_id| {
                r_id.strip_prefix("rId")
                    .and_then(|digits| atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok())
            })
            .max()
            .unwrap_or(0);
        format!("rId{}", highest + 1)
    }

    /// The single relationship of a type. Fails when there is none or several.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let mut matching = self.rels.values().filter(|rel| rel.reltype() == reltype);
        match (matching.next(), matching.next()) {
            (Some(rel), None) => Ok(rel),
            (None, _) => Err(OpcError::RelationshipNotFound(format!(
                "No relationship of type '{}'",
                reltype
            ))),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "Multiple relationships of type '{}'",
                reltype
            ))),
        }
    }

    /// All relationships of a type, ordered by rId number.
    pub fn all_with_reltype(&self, reltype: &str) -> Vec<&Relationship> {
        let mut matching: Vec<&Relationship> =
            self.rels.values().filter(|rel| rel.reltype() == reltype).collect();
        matching.sort_by_key(|rel| r_id_sort_key(rel.r_id()));
        matching
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        self.rels.remove(r_id)
    }

    /// Serialize as the XML of a `.rels` part, ordered by rId number.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);
        xml.push_str(crate::common::xml::dom::XML_DECLARATION);
        xml.push_str("\r\n");
        xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);

        let mut rels: Vec<&Relationship> = self.rels.values().collect();
        rels.sort_by_key(|rel| r_id_sort_key(rel.r_id()));

        for rel in rels {
            xml.push_str(r#"<Relationship Id=""#);
            xml.push_str(&escape_xml(rel.r_id()));
            xml.push_str(r#"" Type=""#);
            xml.push_str(&escape_xml(rel.reltype()));
            xml.push_str(r#"" Target=""#);
            xml.push_str(&escape_xml(rel.target_ref()));
            xml.push('"');
            if rel.is_external() {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}

/// Orders `rId2` before `rId10`; ids that are not `rIdN` sort last by name.
fn r_id_sort_key(r_id: &str) -> (u32, String) {
    let n = r_id
        .strip_prefix("rId")
        .and_then(|digits| atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok())
        .unwrap_or(u32::MAX);
    (n, r_id.to_string())
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    #[test]
    fn test_next_r_id_skips_gaps() {
        let mut rels = Relationships::new("/ppt".to_string());
        assert_eq!(rels.next_r_id(), "rId1");
        rels.add_relationship("t".into(), "a.xml".into(), "rId1".into(), false);
        rels.add_relationship("t".into(), "b.xml".into(), "rId3".into(), false);
        assert_eq!(rels.next_r_id(), "rId4");
        rels.remove("rId3");
        assert_eq!(rels.next_r_id(), "rId2");
    }

    #[test]
    fn test_get_or_add_reuses() {
        let mut rels = Relationships::new("/ppt/slides".to_string());
        let first = rels.get_or_add(rt::IMAGE, "../media/image1.png");
        let again = rels.get_or_add(rt::IMAGE, "../media/image1.png");
        let other = rels.get_or_add(rt::IMAGE, "../media/image2.png");
        assert_eq!(first, "rId1");
        assert_eq!(again, "rId1");
        assert_eq!(other, "rId2");

        let link = rels.get_or_add_ext_rel(rt::HYPERLINK, "https://example.org");
        assert_eq!(link, "rId3");
        assert!(rels.get("rId3").unwrap().is_external());
    }

    #[test]
    fn test_target_partname() {
        let mut rels = Relationships::new("/ppt/slides".to_string());
        let r_id = rels.get_or_add(rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout7.xml");
        let rel = rels.get(&r_id).unwrap();
        assert_eq!(
            rel.target_partname().unwrap().as_str(),
            "/ppt/slideLayouts/slideLayout7.xml"
        );
    }

    #[test]
    fn test_xml_round_trip() {
        let mut rels = Relationships::new("/ppt".to_string());
        rels.get_or_add(rt::SLIDE_MASTER, "slideMasters/slideMaster1.xml");
        rels.get_or_add_ext_rel(rt::HYPERLINK, "https://example.org/?a=1&b=2");

        let xml = rels.to_xml();
        assert!(xml.contains(r#"TargetMode="External""#));
        assert!(xml.contains("a=1&amp;b=2"));

        let parsed = Relationships::from_xml("/ppt", xml.as_bytes()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed.get("rId2").unwrap().target_ref(),
            "https://example.org/?a=1&b=2"
        );
        assert_eq!(parsed.all_with_reltype(rt::SLIDE_MASTER).len(), 1);
    }
}
