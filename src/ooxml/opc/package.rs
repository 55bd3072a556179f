/// In-memory OPC package.
///
/// OpcPackage owns the package relationships and every loaded part. Parts are
/// addressed by partname; edits replace part content or add and remove parts
/// and relationships, and [`PackageWriter`] serializes whatever is still
/// reachable.
use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub struct OpcPackage {
    rels: Relationships,
    parts: HashMap<PackURI, Box<dyn Part>>,
}

impl OpcPackage {
    /// Create a new empty OPC package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: HashMap::new(),
        }
    }

    /// Open a package file.
    ///
    /// # Example
    /// ```no_run
    /// use liturgy_deck::ooxml::opc::OpcPackage;
    ///
    /// let pkg = OpcPackage::open("Liederen/psalm-23.pptx")?;
    /// println!("{} parts", pkg.part_count());
    /// # Ok::<(), liturgy_deck::ooxml::opc::error::OpcError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::unmarshal(PackageReader::from_phys_reader(PhysPkgReader::open(path)?)?)
    }

    /// Load a package from the bytes of a zip archive.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::unmarshal(PackageReader::from_phys_reader(PhysPkgReader::from_bytes(data)?)?)
    }

    fn unmarshal(reader: PackageReader) -> Result<Self> {
        let (rels, sparts) = reader.into_parts();
        let mut parts: HashMap<PackURI, Box<dyn Part>> = HashMap::with_capacity(sparts.len());

        for spart in sparts {
            let mut part = PartFactory::load(spart.partname.clone(), spart.content_type, spart.blob);
            *part.rels_mut() = spart.rels;
            parts.insert(spart.partname, part);
        }

        Ok(Self { rels, parts })
    }

    /// Partname of the main document (`/ppt/presentation.xml` for decks).
    pub fn main_document_partname(&self) -> Result<PackURI> {
        self.rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname()
    }

    pub fn get_part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname)
            .map(|b| &**b as &dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    pub fn get_part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        match self.parts.get_mut(partname) {
            Some(part) => Ok(part.as_mut()),
            None => Err(OpcError::PartNotFound(partname.to_string())),
        }
    }

    /// Add a part, replacing any part with the same name.
    pub fn add_part(&mut self, part: Box<dyn Part>) {
        self.parts.insert(part.partname().clone(), part);
    }

    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Box<dyn Part>> {
        self.parts.remove(partname)
    }

    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname)
    }

    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        self.parts.values().map(|b| &**b as &dyn Part)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Relate the package itself to a part, returning the rId.
    pub fn relate_to(&mut self, partname: &PackURI, reltype: &str) -> String {
        let target_ref = partname.relative_ref(PACKAGE_URI);
        self.rels.get_or_add(reltype, &target_ref)
    }

    /// First free partname for a template with a `%d` placeholder.
    ///
    /// ```no_run
    /// # use liturgy_deck::ooxml::opc::OpcPackage;
    /// let pkg = OpcPackage::new();
    /// let next = pkg.next_partname("/ppt/media/image%d.png")?;
    /// assert_eq!(next.as_str(), "/ppt/media/image1.png");
    /// # Ok::<(), liturgy_deck::ooxml::opc::error::OpcError>(())
    /// ```
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        let used: HashSet<&str> = self.parts.keys().map(PackURI::as_str).collect();
        (1..=self.parts.len() + 1)
            .map(|n| template.replace("%d", &n.to_string()))
            .find(|candidate| !used.contains(candidate.as_str()))
            .ok_or_else(|| OpcError::InvalidPackUri(format!("no free partname for {}", template)))
            .and_then(|candidate| PackURI::new(candidate).map_err(OpcError::InvalidPackUri))
    }

    /// Parts reachable from the package relationships, in partname order.
    pub fn reachable_parts(&self) -> Vec<&dyn Part> {
        let mut seen: HashSet<PackURI> = HashSet::new();
        let mut stack: Vec<PackURI> = Vec::new();
        let mut push_targets = |rels: &Relationships, stack: &mut Vec<PackURI>| {
            for rel in rels.iter().filter(|rel| !rel.is_external()) {
                if let Ok(target) = rel.target_partname()
                    && seen.insert(target.clone())
                {
                    stack.push(target);
                }
            }
        };

        push_targets(&self.rels, &mut stack);
        let mut reachable: Vec<&dyn Part> = Vec::with_capacity(self.parts.len());
        while let Some(partname) = stack.pop() {
            if let Some(part) = self.parts.get(&partname) {
                push_targets(part.rels(), &mut stack);
                reachable.push(part.as_ref());
            }
        }
        reachable.sort_by(|a, b| a.partname().cmp(b.partname()));
        reachable
    }

    /// Serialize the package to zip bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self)
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        PackageWriter::write(path, self)
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;
    use crate::ooxml::opc::part::{BlobPart, XmlPart};

    fn sample_package() -> OpcPackage {
        let mut pkg = OpcPackage::new();
        let pres_uri = PackURI::new("/ppt/presentation.xml").unwrap();
        let mut pres = XmlPart::new(
            pres_uri.clone(),
            ct::PML_PRESENTATION_MAIN.to_string(),
            b"<p:presentation/>".to_vec(),
        );
        let image_uri = PackURI::new("/ppt/media/image1.png").unwrap();
        pres.relate_to(&image_uri, relationship_type::IMAGE);
        pkg.add_part(Box::new(pres));
        pkg.add_part(Box::new(BlobPart::new(image_uri, ct::PNG.to_string(), vec![1, 2, 3])));
        pkg.relate_to(&pres_uri, relationship_type::OFFICE_DOCUMENT);
        pkg
    }

    #[test]
    fn test_round_trip_through_zip() {
        let pkg = sample_package();
        let reopened = OpcPackage::from_bytes(pkg.to_bytes().unwrap()).unwrap();

        assert_eq!(reopened.part_count(), 2);
        let main = reopened.main_document_partname().unwrap();
        assert_eq!(main.as_str(), "/ppt/presentation.xml");
        let image = reopened
            .get_part(&PackURI::new("/ppt/media/image1.png").unwrap())
            .unwrap();
        assert_eq!(image.blob(), &[1, 2, 3]);
        assert_eq!(image.content_type(), ct::PNG);
    }

    #[test]
    fn test_orphans_are_not_written() {
        let mut pkg = sample_package();
        let orphan = PackURI::new("/ppt/slides/slide9.xml").unwrap();
        pkg.add_part(Box::new(XmlPart::new(
            orphan.clone(),
            ct::PML_SLIDE.to_string(),
            b"<p:sld/>".to_vec(),
        )));
        assert_eq!(pkg.part_count(), 3);
        assert_eq!(pkg.reachable_parts().len(), 2);

        let reopened = OpcPackage::from_bytes(pkg.to_bytes().unwrap()).unwrap();
        assert!(!reopened.contains_part(&orphan));
    }

    #[test]
    fn test_next_partname() {
        let pkg = sample_package();
        let next = pkg.next_partname("/ppt/media/image%d.png").unwrap();
        assert_eq!(next.as_str(), "/ppt/media/image2.png");
    }
}
