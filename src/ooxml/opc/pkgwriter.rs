//! Package writer for OPC packages.
//!
//! Serializes `[Content_Types].xml`, the package relationships and every part
//! still reachable from them. Parts orphaned by edits (a removed slide and
//! the notes that hung off it) are left out of the archive.

use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use std::collections::BTreeMap;
use std::path::Path;

/// Serializes an [`OpcPackage`] to a ZIP archive.
pub struct PackageWriter;

impl PackageWriter {
    /// Write a package to a file.
    pub fn write<P: AsRef<Path>>(path: P, package: &OpcPackage) -> Result<()> {
        let bytes = Self::to_bytes(package)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize a package to bytes.
    pub fn to_bytes(package: &OpcPackage) -> Result<Vec<u8>> {
        let parts = package.reachable_parts();
        let mut phys = PhysPkgWriter::new();

        let cti = ContentTypesItem::from_parts(&parts);
        let ct_uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        phys.write(&ct_uri, cti.to_xml().as_bytes())?;

        let pkg_rels_uri = PackURI::new(PACKAGE_URI)
            .and_then(|uri| uri.rels_uri())
            .map_err(OpcError::InvalidPackUri)?;
        phys.write(&pkg_rels_uri, package.rels().to_xml().as_bytes())?;

        for part in parts {
            phys.write(part.partname(), part.blob())?;
            if !part.rels().is_empty() {
                let rels_uri = part.partname().rels_uri().map_err(OpcError::InvalidPackUri)?;
                phys.write(&rels_uri, part.rels().to_xml().as_bytes())?;
            }
        }

        phys.finish()
    }
}

/// Builds `[Content_Types].xml` content.
struct ContentTypesItem {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn from_parts(parts: &[&dyn Part]) -> Self {
        let mut cti = Self {
            defaults: BTreeMap::new(),
            overrides: BTreeMap::new(),
        };
        cti.defaults
            .insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        cti.defaults.insert("xml".to_string(), ct::XML.to_string());

        for part in parts {
            let ext = part.partname().ext().to_ascii_lowercase();
            if Self::is_default_content_type(&ext, part.content_type()) {
                cti.defaults.insert(ext, part.content_type().to_string());
            } else {
                cti.overrides.insert(
                    part.partname().to_string(),
                    part.content_type().to_string(),
                );
            }
        }

        cti
    }

    /// Media types are registered per extension, everything else per part.
    fn is_default_content_type(ext: &str, content_type: &str) -> bool {
        ct::for_image_ext(ext) == Some(content_type)
            || matches!((ext, content_type), ("rels", ct::OPC_RELATIONSHIPS) | ("xml", ct::XML))
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512 + self.overrides.len() * 160);
        xml.push_str(crate::common::xml::dom::XML_DECLARATION);
        xml.push_str("\r\n");
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);

        for (ext, content_type) in &self.defaults {
            xml.push_str(r#"<Default Extension=""#);
            xml.push_str(&escape_xml(ext));
            xml.push_str(r#"" ContentType=""#);
            xml.push_str(&escape_xml(content_type));
            xml.push_str(r#""/>"#);
        }

        for (partname, content_type) in &self.overrides {
            xml.push_str(r#"<Override PartName=""#);
            xml.push_str(&escape_xml(partname));
            xml.push_str(r#"" ContentType=""#);
            xml.push_str(&escape_xml(content_type));
            xml.push_str(r#""/>"#);
        }

        xml.push_str("</Types>");
        xml
    }
}
