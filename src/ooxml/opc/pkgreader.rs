//! Reads the serialized parts and relationships of an OPC package.
//!
//! Parts are discovered by walking the relationship graph from the package
//! relationships, the way consuming applications do, so stray zip members
//! that nothing relates to are never loaded.

use crate::common::xml::XmlElement;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::rel::Relationships;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

const OCTET_STREAM: &str = "application/octet-stream";

/// A part as loaded from the archive, before it becomes a [`Part`](super::Part).
#[derive(Debug)]
pub struct SerializedPart {
    pub partname: PackURI,
    pub content_type: String,
    pub blob: Vec<u8>,
    pub rels: Relationships,
}

/// Content type discovery from `[Content_Types].xml`.
struct ContentTypeMap {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    fn from_xml(xml: &[u8]) -> Result<Self> {
        let root = XmlElement::parse_bytes(xml)?;
        let mut map = Self {
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        };

        for el in root.elements() {
            match (el.local_name(), el.attr("ContentType")) {
                ("Default", Some(ct)) => {
                    if let Some(ext) = el.attr("Extension") {
                        map.defaults.insert(ext.to_ascii_lowercase(), ct.to_string());
                    }
                },
                ("Override", Some(ct)) => {
                    if let Some(partname) = el.attr("PartName") {
                        map.overrides
                            .insert(partname.to_ascii_lowercase(), ct.to_string());
                    }
                },
                _ => {},
            }
        }

        Ok(map)
    }

    /// Override first, then the default for the extension. Part names are
    /// compared case-insensitively as OPC requires.
    fn get(&self, pack_uri: &PackURI) -> Result<String> {
        if let Some(ct) = self.overrides.get(&pack_uri.as_str().to_ascii_lowercase()) {
            return Ok(ct.clone());
        }
        if let Some(ct) = self.defaults.get(&pack_uri.ext().to_ascii_lowercase()) {
            return Ok(ct.clone());
        }
        Err(OpcError::ContentTypeNotFound(pack_uri.to_string()))
    }
}

/// Parts and package relationships of a serialized package.
pub struct PackageReader {
    pkg_rels: Relationships,
    sparts: Vec<SerializedPart>,
}

impl PackageReader {
    pub fn from_phys_reader(mut phys: PhysPkgReader) -> Result<Self> {
        let ct_uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        let ct_xml = phys
            .blob_for(&ct_uri)
            .ok_or_else(|| OpcError::PartNotFound(ct_uri.to_string()))?;
        let content_types = ContentTypeMap::from_xml(ct_xml)?;

        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let pkg_rels = Self::load_rels(&phys, &package_uri)?;

        let mut sparts = Vec::with_capacity(phys.len() / 2);
        let mut visited: HashSet<PackURI> = HashSet::new();
        let mut queue: SmallVec<[PackURI; 16]> = SmallVec::new();

        for rel in pkg_rels.iter().filter(|rel| !rel.is_external()) {
            let partname = rel.target_partname()?;
            if visited.insert(partname.clone()) {
                queue.push(partname);
            }
        }

        while let Some(partname) = queue.pop() {
            let rels = Self::load_rels(&phys, &partname)?;
            for rel in rels.iter().filter(|rel| !rel.is_external()) {
                let child = rel.target_partname()?;
                if visited.insert(child.clone()) {
                    queue.push(child);
                }
            }

            // Dangling targets exist in real decks; skip them like PowerPoint does.
            let Some(blob) = phys.take_blob(&partname) else {
                tracing::debug!(part = %partname, "relationship target missing from archive");
                continue;
            };
            let content_type = content_types.get(&partname).unwrap_or_else(|_| {
                tracing::debug!(part = %partname, "no content type, treating as binary");
                OCTET_STREAM.to_string()
            });
            sparts.push(SerializedPart {
                partname,
                content_type,
                blob,
                rels,
            });
        }

        Ok(Self { pkg_rels, sparts })
    }

    fn load_rels(phys: &PhysPkgReader, source: &PackURI) -> Result<Relationships> {
        let rels_uri = source.rels_uri().map_err(OpcError::InvalidPackUri)?;
        match phys.blob_for(&rels_uri) {
            Some(xml) => Relationships::from_xml(source.base_uri(), xml),
            None => Ok(Relationships::new(source.base_uri().to_string())),
        }
    }

    /// Take the package relationships and parts out of the reader.
    pub fn into_parts(self) -> (Relationships, Vec<SerializedPart>) {
        (self.pkg_rels, self.sparts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_map() {
        let xml = br#"<?xml version="1.0"?>
            <Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                <Default Extension="xml" ContentType="application/xml"/>
                <Default Extension="PNG" ContentType="image/png"/>
                <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
            </Types>"#;

        let map = ContentTypeMap::from_xml(xml).unwrap();

        let uri = PackURI::new("/docProps/app.xml").unwrap();
        assert_eq!(map.get(&uri).unwrap(), "application/xml");

        let uri = PackURI::new("/ppt/media/image1.png").unwrap();
        assert_eq!(map.get(&uri).unwrap(), "image/png");

        let uri = PackURI::new("/ppt/presentation.xml").unwrap();
        assert!(map.get(&uri).unwrap().ends_with("presentation.main+xml"));

        let uri = PackURI::new("/ppt/media/clip.mp4").unwrap();
        assert!(matches!(map.get(&uri), Err(OpcError::ContentTypeNotFound(_))));
    }
}
