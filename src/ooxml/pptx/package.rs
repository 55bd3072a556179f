/// Package implementation for PowerPoint presentations.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::pptx::presentation::Presentation;
use std::path::Path;

/// Main part content types accepted as a presentation.
const PRESENTATION_CONTENT_TYPES: [&str; 3] = [
    ct::PML_PRESENTATION_MAIN,
    ct::PML_PRES_MACRO_MAIN,
    ct::PML_TEMPLATE_MAIN,
];

/// A PowerPoint (.pptx) package.
///
/// This is the entry point for reading presentations from disk. It wraps an
/// OPC package whose main part has been checked to be a presentation.
///
/// # Examples
///
/// ```rust,no_run
/// use liturgy_deck::ooxml::pptx::Package;
///
/// let pkg = Package::open("Liederen/psalm-23.pptx")?;
/// let pres = pkg.into_presentation();
/// println!("Song has {} slides", pres.slide_count()?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package {
    opc: OpcPackage,
    main: PackURI,
}

impl Package {
    /// Open a .pptx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    /// Load a .pptx package from the bytes of the file.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    /// Wrap an OPC package, verifying that its main part is a presentation.
    pub fn from_opc(opc: OpcPackage) -> Result<Self> {
        let main = opc
            .main_document_partname()
            .map_err(|e| OoxmlError::PartNotFound(format!("main presentation part: {}", e)))?;

        let content_type = opc.get_part(&main)?.content_type();
        // Regular, macro-enabled and template decks share one structure.
        if !PRESENTATION_CONTENT_TYPES.contains(&content_type) {
            return Err(OoxmlError::InvalidContentType {
                expected: PRESENTATION_CONTENT_TYPES.join(" or "),
                got: content_type.to_string(),
            });
        }

        Ok(Self { opc, main })
    }

    /// The presentation held by this package.
    #[inline]
    pub fn into_presentation(self) -> Presentation {
        Presentation::from_package(self)
    }

    /// Partname of `presentation.xml`.
    #[inline]
    pub fn main_partname(&self) -> &PackURI {
        &self.main
    }

    #[inline]
    pub fn opc(&self) -> &OpcPackage {
        &self.opc
    }

    #[inline]
    pub fn opc_mut(&mut self) -> &mut OpcPackage {
        &mut self.opc
    }

    /// Save the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Ok(self.opc.save(path)?)
    }

    /// Serialize the package to the bytes of a .pptx file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.opc.to_bytes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;
    use crate::ooxml::opc::XmlPart;
    use crate::ooxml::pptx::template;

    #[test]
    fn test_blank_template_is_a_presentation() {
        let pkg = Package::from_opc(template::blank_widescreen().unwrap()).unwrap();
        assert_eq!(pkg.main_partname().as_str(), "/ppt/presentation.xml");

        let reopened = Package::from_bytes(pkg.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.main_partname(), pkg.main_partname());
    }

    #[test]
    fn test_rejects_other_documents() {
        let mut opc = OpcPackage::new();
        let main = PackURI::new("/word/document.xml").unwrap();
        opc.add_part(Box::new(XmlPart::new(
            main.clone(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"
                .to_string(),
            b"<w:document/>".to_vec(),
        )));
        opc.relate_to(&main, rt::OFFICE_DOCUMENT);

        let err = Package::from_opc(opc).err().unwrap();
        assert!(matches!(err, OoxmlError::InvalidContentType { .. }));
    }

    #[test]
    fn test_missing_main_part() {
        let err = Package::from_opc(OpcPackage::new()).err().unwrap();
        assert!(matches!(err, OoxmlError::PartNotFound(_)));
    }
}
