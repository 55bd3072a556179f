/// Parts of an OPC package.
///
/// A part is one zip member with a partname, a content type and its own
/// relationships. XML parts are edited by parsing them into an
/// [`XmlElement`] tree and storing the serialized tree back.
use crate::common::xml::XmlElement;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;

/// Trait representing a part in an OPC package.
pub trait Part {
    fn partname(&self) -> &PackURI;

    fn content_type(&self) -> &str;

    /// Raw content of the part.
    fn blob(&self) -> &[u8];

    /// Replace the raw content of the part.
    fn set_blob(&mut self, blob: Vec<u8>);

    fn rels(&self) -> &Relationships;

    fn rels_mut(&mut self) -> &mut Relationships;

    /// Whether the content is XML and can be parsed with [`Part::element`].
    fn is_xml(&self) -> bool {
        false
    }

    /// Parse the content into an element tree.
    fn element(&self) -> Result<XmlElement> {
        if !self.is_xml() {
            return Err(OpcError::Xml(format!(
                "{} ({}) is not an XML part",
                self.partname(),
                self.content_type()
            )));
        }
        Ok(XmlElement::parse_bytes(self.blob())?)
    }

    /// Serialize `root` as the new content of the part.
    fn store_element(&mut self, root: &XmlElement) {
        self.set_blob(root.to_document());
    }

    /// rId of an internal relationship to `target`, created if missing.
    fn relate_to(&mut self, target: &PackURI, reltype: &str) -> String {
        let target_ref = target.relative_ref(self.partname().base_uri());
        self.rels_mut().get_or_add(reltype, &target_ref)
    }

    /// rId of an external relationship to `target_url`, created if missing.
    fn relate_to_ext(&mut self, target_url: &str, reltype: &str) -> String {
        self.rels_mut().get_or_add_ext_rel(reltype, target_url)
    }

    /// Absolute partname that an rId of this part points at.
    fn related_partname(&self, r_id: &str) -> Result<PackURI> {
        self.rels()
            .get(r_id)
            .ok_or_else(|| {
                OpcError::RelationshipNotFound(format!("{} in {}", r_id, self.partname()))
            })?
            .target_partname()
    }
}

/// A part with opaque binary content (images, embedded objects).
#[derive(Debug, Clone)]
pub struct BlobPart {
    partname: PackURI,
    content_type: String,
    blob: Vec<u8>,
    rels: Relationships,
}

impl BlobPart {
    pub fn new(partname: PackURI, content_type: String, blob: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            blob,
            rels,
        }
    }
}

impl Part for BlobPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> &[u8] {
        &self.blob
    }

    fn set_blob(&mut self, blob: Vec<u8>) {
        self.blob = blob;
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }
}

/// A part whose content is XML.
#[derive(Debug, Clone)]
pub struct XmlPart {
    partname: PackURI,
    content_type: String,
    xml_bytes: Vec<u8>,
    rels: Relationships,
}

impl XmlPart {
    pub fn new(partname: PackURI, content_type: String, xml_bytes: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            xml_bytes,
            rels,
        }
    }

    /// Create a part from an element tree.
    pub fn from_element(partname: PackURI, content_type: &str, root: &XmlElement) -> Self {
        Self::new(partname, content_type.to_string(), root.to_document())
    }
}

impl Part for XmlPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> &[u8] {
        &self.xml_bytes
    }

    fn set_blob(&mut self, blob: Vec<u8>) {
        self.xml_bytes = blob;
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn is_xml(&self) -> bool {
        true
    }
}

/// Chooses the part implementation for a content type.
pub struct PartFactory;

impl PartFactory {
    pub fn load(partname: PackURI, content_type: String, blob: Vec<u8>) -> Box<dyn Part> {
        if Self::is_xml_content_type(&content_type) {
            Box::new(XmlPart::new(partname, content_type, blob))
        } else {
            Box::new(BlobPart::new(partname, content_type, blob))
        }
    }

    #[inline]
    fn is_xml_content_type(content_type: &str) -> bool {
        content_type.ends_with("+xml") || content_type.ends_with("/xml")
    }
}
