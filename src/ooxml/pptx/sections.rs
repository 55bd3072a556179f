//! Presentation sections support for PPTX.
//!
//! Sections are stored in a PowerPoint 2010 extension of `presentation.xml`
//! (`p14:sectionLst`) and refer to slides by their `p:sldId/@id`, not by
//! position.

use crate::common::xml::{XmlElement, escape_xml};
use crate::ooxml::error::Result;
use std::fmt::Write as FmtWrite;

/// Extension URI of the section list.
pub const SECTION_LIST_EXT_URI: &str = "{521415D9-36F7-43E2-AB2F-B90AF26B5E84}";
pub const P14_NAMESPACE: &str = "http://schemas.microsoft.com/office/powerpoint/2010/main";

/// A section in a presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section name
    pub name: String,
    /// Section ID (GUID format)
    pub id: String,
    /// Slide IDs in this section
    pub slide_ids: Vec<u32>,
}

impl Section {
    /// Create a new section.
    ///
    /// # Arguments
    /// * `name` - Display name for the section
    /// * `id` - Unique ID (typically GUID format like `{12345678-1234-1234-1234-123456789012}`)
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            slide_ids: Vec::new(),
        }
    }

    /// Create a section with slide IDs.
    pub fn with_slides(mut self, slide_ids: impl IntoIterator<Item = u32>) -> Self {
        self.slide_ids.extend(slide_ids);
        self
    }

    /// Generate XML for this section.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(256);
        write!(
            xml,
            r#"<p14:section name="{}" id="{}">"#,
            escape_xml(&self.name),
            escape_xml(&self.id)
        )?;
        xml.push_str("<p14:sldIdLst>");
        for slide_id in &self.slide_ids {
            write!(xml, r#"<p14:sldId id="{}"/>"#, slide_id)?;
        }
        xml.push_str("</p14:sldIdLst>");
        xml.push_str("</p14:section>");
        Ok(xml)
    }
}

/// A collection of sections in a presentation.
#[derive(Debug, Clone, Default)]
pub struct SectionList {
    sections: Vec<Section>,
}

impl SectionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Read sections from a parsed `p:presentation` root.
    pub fn from_presentation(root: &XmlElement) -> Self {
        let Some(section_lst) = root
            .descendants()
            .find(|el| el.local_name() == "sectionLst")
        else {
            return Self::new();
        };

        let sections = section_lst
            .elements()
            .filter(|el| el.local_name() == "section")
            .map(|el| {
                let slide_ids = el
                    .elements()
                    .filter(|child| child.local_name() == "sldIdLst")
                    .flat_map(|lst| lst.elements())
                    .filter_map(|sld| sld.attr("id")?.parse().ok())
                    .collect();
                Section {
                    name: el.attr("name").unwrap_or("Untitled").to_string(),
                    id: el.attr("id").unwrap_or_default().to_string(),
                    slide_ids,
                }
            })
            .collect();
        Self { sections }
    }

    /// Parse sections from presentation XML.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        Ok(Self::from_presentation(&XmlElement::parse_bytes(xml)?))
    }

    /// The `p:extLst` fragment holding the section list, empty when there
    /// are no sections.
    pub fn to_xml(&self) -> Result<String> {
        if self.sections.is_empty() {
            return Ok(String::new());
        }

        let mut xml = String::with_capacity(1024);
        xml.push_str("<p:extLst>");
        write!(xml, r#"<p:ext uri="{}">"#, SECTION_LIST_EXT_URI)?;
        write!(xml, r#"<p14:sectionLst xmlns:p14="{}">"#, P14_NAMESPACE)?;
        for section in &self.sections {
            xml.push_str(&section.to_xml()?);
        }
        xml.push_str("</p14:sectionLst>");
        xml.push_str("</p:ext>");
        xml.push_str("</p:extLst>");
        Ok(xml)
    }
}
