/// Presentation: the main API for reading and assembling decks.
use crate::common::xml::XmlElement;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{BlobPart, PackURI, Part, PartFactory, Relationships, XmlPart};
use crate::ooxml::pptx::format::ImageFormat;
use crate::ooxml::pptx::package::Package;
use crate::ooxml::pptx::parts::theme::{ColorContext, ColorMap, Theme};
use crate::ooxml::pptx::sections::{SECTION_LIST_EXT_URI, Section as DeckSection, SectionList};
use crate::ooxml::pptx::shapes::{Geometry, PlaceholderRef, PlaceholderType};
use crate::ooxml::pptx::slide::Slide;
use crate::ooxml::pptx::template;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

/// Name reported for a deck without sections.
pub const ALL_SLIDES_SECTION: &str = "All Slides";

/// Slide ids in `p:sldIdLst` start here.
const MIN_SLIDE_ID: u32 = 256;

/// A slide layout and how many placeholders it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    pub partname: PackURI,
    pub name: String,
    pub placeholder_count: usize,
}

/// Relationship types that point back into the slide structure. Following
/// them while copying an embedded object would drag whole slides along.
fn is_structural_reltype(reltype: &str) -> bool {
    [rt::SLIDE, rt::SLIDE_LAYOUT, rt::SLIDE_MASTER, rt::NOTES_SLIDE, rt::NOTES_MASTER]
        .contains(&reltype)
}

/// Clean a slide title for display: control characters and line breaks
/// become spaces, whitespace runs collapse to one space.
pub fn clean_title(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A PowerPoint presentation.
///
/// Slides are addressed by 0-based position in `p:sldIdLst`. Reading a
/// slide gives an owned [`Slide`]; edits are stored back with
/// [`save_slide`](Self::save_slide).
///
/// # Examples
///
/// ```rust,no_run
/// use liturgy_deck::ooxml::pptx::Presentation;
///
/// let pres = Presentation::open("Liederen/psalm-23.pptx")?;
/// for i in 0..pres.slide_count()? {
///     println!("{}: {}", i + 1, pres.slide_title(i)?);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Presentation {
    package: Package,
    /// Image digest to media partname, built on first use
    media: Option<HashMap<Vec<u8>, PackURI>>,
}

impl Presentation {
    pub(crate) fn from_package(package: Package) -> Self {
        Self {
            package,
            media: None,
        }
    }

    /// Open a presentation file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Package::open(path)?.into_presentation())
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Ok(Package::from_bytes(data)?.into_presentation())
    }

    /// An empty 16:9 presentation with a "Title Slide" and a "Blank" layout.
    pub fn new_blank() -> Result<Self> {
        Ok(Package::from_opc(template::blank_widescreen()?)?.into_presentation())
    }

    #[inline]
    pub fn package(&self) -> &Package {
        &self.package
    }

    #[inline]
    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.package.save(path)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }

    fn part(&self, partname: &PackURI) -> Result<&dyn Part> {
        Ok(self.package.opc().get_part(partname)?)
    }

    fn part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        Ok(self.package.opc_mut().get_part_mut(partname)?)
    }

    /// Parse an XML part of the package.
    pub fn part_element(&self, partname: &PackURI) -> Result<XmlElement> {
        Ok(self.part(partname)?.element()?)
    }

    fn presentation_element(&self) -> Result<XmlElement> {
        self.part_element(self.package.main_partname())
    }

    fn store_presentation_element(&mut self, root: &XmlElement) -> Result<()> {
        let main = self.package.main_partname().clone();
        self.part_mut(&main)?.store_element(root);
        Ok(())
    }

    /// `(id, rId)` of every `p:sldId`, in slide order.
    fn slide_ids(root: &XmlElement) -> Vec<(u32, String)> {
        root.child("p:sldIdLst")
            .map(|lst| {
                lst.children_named("p:sldId")
                    .filter_map(|sld| {
                        let id = sld.attr("id")?.parse().ok()?;
                        Some((id, sld.attr("r:id")?.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Partnames of all slides, in slide order.
    pub fn slide_partnames(&self) -> Result<Vec<PackURI>> {
        let root = self.presentation_element()?;
        let main = self.part(self.package.main_partname())?;
        Self::slide_ids(&root)
            .into_iter()
            .map(|(_, r_id)| main.related_partname(&r_id).map_err(OoxmlError::from))
            .collect()
    }

    pub fn slide_count(&self) -> Result<usize> {
        Ok(Self::slide_ids(&self.presentation_element()?).len())
    }

    /// Slide width and height in EMUs.
    pub fn slide_size(&self) -> Result<Option<(i64, i64)>> {
        let root = self.presentation_element()?;
        Ok(root.child("p:sldSz").and_then(|sz| {
            let cx = sz.attr("cx")?.parse().ok()?;
            let cy = sz.attr("cy")?.parse().ok()?;
            Some((cx, cy))
        }))
    }

    /// Read the slide at `index`.
    pub fn slide(&self, index: usize) -> Result<Slide> {
        let partnames = self.slide_partnames()?;
        let partname = partnames
            .get(index)
            .ok_or(OoxmlError::SlideOutOfRange {
                index,
                count: partnames.len(),
            })?
            .clone();
        let root = self.part_element(&partname)?;
        Ok(Slide::new(partname, root))
    }

    /// Write an edited slide back to its part.
    pub fn save_slide(&mut self, slide: &Slide) -> Result<()> {
        self.part_mut(slide.partname())?.store_element(slide.root());
        Ok(())
    }

    /// Masters in `p:sldMasterIdLst` order.
    fn master_partnames(&self) -> Result<Vec<PackURI>> {
        let root = self.presentation_element()?;
        let main = self.part(self.package.main_partname())?;
        let Some(lst) = root.child("p:sldMasterIdLst") else {
            return Ok(Vec::new());
        };
        lst.children_named("p:sldMasterId")
            .filter_map(|el| el.attr("r:id"))
            .map(|r_id| main.related_partname(r_id).map_err(OoxmlError::from))
            .collect()
    }

    /// All layouts of all masters.
    pub fn layouts(&self) -> Result<Vec<LayoutInfo>> {
        let mut layouts = Vec::new();
        for master in self.master_partnames()? {
            let master_root = self.part_element(&master)?;
            let master_part = self.part(&master)?;
            let Some(lst) = master_root.child("p:sldLayoutIdLst") else {
                continue;
            };
            for r_id in lst.children_named("p:sldLayoutId").filter_map(|el| el.attr("r:id")) {
                let partname = master_part.related_partname(r_id)?;
                let root = self.part_element(&partname)?;
                let name = root
                    .child("p:cSld")
                    .and_then(|c_sld| c_sld.attr("name"))
                    .unwrap_or_default()
                    .to_string();
                let placeholder_count = root
                    .find(&["p:cSld", "p:spTree"])
                    .map(|tree| tree.descendants().filter(|el| el.is("p:ph")).count())
                    .unwrap_or(0);
                layouts.push(LayoutInfo {
                    partname,
                    name,
                    placeholder_count,
                });
            }
        }
        Ok(layouts)
    }

    /// The layout with the fewest placeholders, first one on a tie.
    pub fn blank_layout(&self) -> Result<PackURI> {
        self.layouts()?
            .into_iter()
            .min_by_key(|layout| layout.placeholder_count)
            .map(|layout| layout.partname)
            .ok_or_else(|| OoxmlError::InvalidFormat("presentation has no slide layouts".to_string()))
    }

    /// Append an empty slide using `layout`. Returns its index.
    pub fn add_slide(&mut self, layout: &PackURI) -> Result<usize> {
        let partname = self.package.opc().next_partname("/ppt/slides/slide%d.xml")?;
        let root = XmlElement::parse(&template::slide_xml())?;
        let mut part = XmlPart::from_element(partname.clone(), ct::PML_SLIDE, &root);
        part.relate_to(layout, rt::SLIDE_LAYOUT);
        self.package.opc_mut().add_part(Box::new(part));

        let main = self.package.main_partname().clone();
        let r_id = self.part_mut(&main)?.relate_to(&partname, rt::SLIDE);

        let mut pres = self.presentation_element()?;
        let next_id = Self::slide_ids(&pres)
            .iter()
            .map(|(id, _)| id + 1)
            .max()
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID);
        if pres.child("p:sldIdLst").is_none() {
            // CT_Presentation: the slide list comes right before sldSz
            pres.insert_before("p:sldSz", XmlElement::new("p:sldIdLst"));
        }
        let lst = pres.ensure_child("p:sldIdLst");
        lst.push(
            XmlElement::new("p:sldId")
                .with_attr("id", next_id.to_string())
                .with_attr("r:id", r_id),
        );
        let index = lst.children_named("p:sldId").count() - 1;
        sync_sections(&mut pres);
        self.store_presentation_element(&pres)?;

        debug!(slide = %partname, index, "added slide");
        Ok(index)
    }

    /// Remove the slide at `index` together with its relationship.
    pub fn remove_slide(&mut self, index: usize) -> Result<()> {
        let mut pres = self.presentation_element()?;
        let ids = Self::slide_ids(&pres);
        let (_, r_id) = ids.get(index).cloned().ok_or(OoxmlError::SlideOutOfRange {
            index,
            count: ids.len(),
        })?;

        if let Some(lst) = pres.child_mut("p:sldIdLst") {
            lst.remove_elements(|el| el.attr("r:id") == Some(r_id.as_str()));
        }
        sync_sections(&mut pres);
        self.store_presentation_element(&pres)?;

        let main = self.package.main_partname().clone();
        let main_part = self.part_mut(&main)?;
        let partname = main_part.related_partname(&r_id)?;
        main_part.rels_mut().remove(&r_id);
        self.package.opc_mut().remove_part(&partname);
        debug!(slide = %partname, index, "removed slide");
        Ok(())
    }

    /// Keep only the slides at `keep`, in their current order.
    pub fn retain_slides(&mut self, keep: &[usize]) -> Result<()> {
        let keep: HashSet<usize> = keep.iter().copied().collect();
        let count = self.slide_count()?;
        for index in (0..count).rev() {
            if !keep.contains(&index) {
                self.remove_slide(index)?;
            }
        }
        Ok(())
    }

    fn related_of_type(&self, partname: &PackURI, reltype: &str) -> Result<PackURI> {
        Ok(self
            .part(partname)?
            .rels()
            .part_with_reltype(reltype)?
            .target_partname()?)
    }

    pub fn slide_layout_partname(&self, slide: &PackURI) -> Result<PackURI> {
        self.related_of_type(slide, rt::SLIDE_LAYOUT)
    }

    pub fn master_partname(&self, layout: &PackURI) -> Result<PackURI> {
        self.related_of_type(layout, rt::SLIDE_MASTER)
    }

    pub fn theme_partname(&self, master: &PackURI) -> Result<PackURI> {
        self.related_of_type(master, rt::THEME)
    }

    /// Theme colors and color mapping in effect on `slide`.
    pub fn color_context(&self, slide: &Slide) -> Result<ColorContext> {
        let layout = self.slide_layout_partname(slide.partname())?;
        let master = self.master_partname(&layout)?;
        let theme = Theme::from_xml(self.part(&self.theme_partname(&master)?)?.blob())?;

        let map = match slide.root().find(&["p:clrMapOvr", "a:overrideClrMapping"]) {
            Some(ovr) => ColorMap::from_element(ovr),
            None => self
                .part_element(&master)?
                .child("p:clrMap")
                .map(ColorMap::from_element)
                .unwrap_or_default(),
        };
        Ok(ColorContext::new(theme.color_scheme, map))
    }

    /// Position and size a placeholder inherits when it has no transform
    /// of its own: the matching layout placeholder first, then the master
    /// placeholder of the corresponding type.
    pub fn placeholder_geometry(&self, slide: &Slide, ph: &PlaceholderRef) -> Result<Option<Geometry>> {
        let layout = self.slide_layout_partname(slide.partname())?;
        let layout_root = self.part_element(&layout)?;

        let mut wanted = ph.ph_type.unwrap_or(PlaceholderType::Object);
        if let Some((layout_ph, sp)) = placeholder_shapes(&layout_root).find(|(r, _)| ph.matches_layout(r)) {
            if let Some(xfrm) = sp.find(&["p:spPr", "a:xfrm"]) {
                return Ok(Some(Geometry::from_xfrm(xfrm)));
            }
            if let Some(layout_type) = layout_ph.ph_type {
                wanted = layout_type;
            }
        }

        let master_root = self.part_element(&self.master_partname(&layout)?)?;
        let wanted = wanted.master_type();
        Ok(placeholder_shapes(&master_root)
            .find(|(r, _)| r.ph_type.map(PlaceholderType::master_type) == Some(wanted))
            .and_then(|(_, sp)| sp.find(&["p:spPr", "a:xfrm"]))
            .map(Geometry::from_xfrm))
    }

    /// The background a slide is rendered with, and the part it is defined
    /// in: the slide's own, else its layout's, else its master's.
    pub fn effective_background(&self, slide: &Slide) -> Result<Option<(XmlElement, PackURI)>> {
        if let Some(bg) = slide.background() {
            return Ok(Some((bg.clone(), slide.partname().clone())));
        }
        let layout = self.slide_layout_partname(slide.partname())?;
        if let Some(bg) = self.part_element(&layout)?.find(&["p:cSld", "p:bg"]) {
            return Ok(Some((bg.clone(), layout)));
        }
        let master = self.master_partname(&layout)?;
        Ok(self
            .part_element(&master)?
            .find(&["p:cSld", "p:bg"])
            .cloned()
            .map(|bg| (bg, master)))
    }

    /// The part an rId of `owner` points at.
    pub fn related_part(&self, owner: &PackURI, r_id: &str) -> Result<&dyn Part> {
        let target = self.part(owner)?.related_partname(r_id)?;
        self.part(&target)
    }

    fn media_index(&mut self) -> &mut HashMap<Vec<u8>, PackURI> {
        let opc = self.package.opc();
        self.media.get_or_insert_with(|| {
            opc.iter_parts()
                .filter(|part| part.content_type().starts_with("image/"))
                .map(|part| (Sha256::digest(part.blob()).to_vec(), part.partname().clone()))
                .collect()
        })
    }

    /// Store image bytes as a media part, reusing an existing part with
    /// identical content.
    pub fn import_image(&mut self, blob: &[u8], content_type: &str, ext: &str) -> Result<PackURI> {
        let digest = Sha256::digest(blob).to_vec();
        if let Some(existing) = self.media_index().get(&digest) {
            return Ok(existing.clone());
        }

        let (content_type, ext) = if content_type.starts_with("image/") && !ext.is_empty() {
            (content_type.to_string(), ext.to_string())
        } else {
            let format = ImageFormat::detect_from_bytes(blob).ok_or_else(|| {
                OoxmlError::InvalidFormat(format!("unrecognized image data ({})", content_type))
            })?;
            (format.mime_type().to_string(), format.extension().to_string())
        };

        let partname = self
            .package
            .opc()
            .next_partname(&format!("/ppt/media/image%d.{}", ext))?;
        self.package.opc_mut().add_part(Box::new(BlobPart::new(
            partname.clone(),
            content_type,
            blob.to_vec(),
        )));
        self.media_index().insert(digest, partname.clone());
        Ok(partname)
    }

    /// Register an image for `slide` and return the rId to reference it by.
    pub fn add_image(&mut self, slide: &PackURI, blob: &[u8], content_type: &str, ext: &str) -> Result<String> {
        let media = self.import_image(blob, content_type, ext)?;
        Ok(self.part_mut(slide)?.relate_to(&media, rt::IMAGE))
    }

    /// Copy a part of `source` (a chart, a diagram, an embedded workbook)
    /// into this package along with everything it relates to.
    ///
    /// `memo` maps source partnames already copied to their new names, so
    /// shared parts are copied once and cycles end.
    pub fn copy_part_from(
        &mut self,
        source: &Presentation,
        partname: &PackURI,
        memo: &mut HashMap<PackURI, PackURI>,
    ) -> Result<PackURI> {
        if let Some(copied) = memo.get(partname) {
            return Ok(copied.clone());
        }
        let src = source.part(partname)?;
        if src.content_type().starts_with("image/") {
            let copied = self.import_image(src.blob(), src.content_type(), partname.ext())?;
            memo.insert(partname.clone(), copied.clone());
            return Ok(copied);
        }

        let new_name = self.package.opc().next_partname(&partname.tuple_template())?;
        memo.insert(partname.clone(), new_name.clone());
        // Reserve the name before recursing so nested copies pick others.
        self.package.opc_mut().add_part(Box::new(BlobPart::new(
            new_name.clone(),
            src.content_type().to_string(),
            Vec::new(),
        )));

        let mut rels = Relationships::new(new_name.base_uri().to_string());
        for rel in src.rels().iter() {
            if rel.is_external() {
                rels.add_relationship(
                    rel.reltype().to_string(),
                    rel.target_ref().to_string(),
                    rel.r_id().to_string(),
                    true,
                );
                continue;
            }
            if is_structural_reltype(rel.reltype()) {
                continue;
            }
            let target = rel.target_partname()?;
            let copied = self.copy_part_from(source, &target, memo)?;
            rels.add_relationship(
                rel.reltype().to_string(),
                copied.relative_ref(new_name.base_uri()),
                rel.r_id().to_string(),
                false,
            );
        }

        let mut part = PartFactory::load(new_name.clone(), src.content_type().to_string(), src.blob().to_vec());
        *part.rels_mut() = rels;
        self.package.opc_mut().add_part(part);
        debug!(from = %partname, to = %new_name, "copied part");
        Ok(new_name)
    }

    /// Recreate relationship `r_id` of `owner` in `source` on this
    /// package's `slide`, returning the rId to use there.
    pub fn import_relationship(
        &mut self,
        source: &Presentation,
        owner: &PackURI,
        r_id: &str,
        slide: &PackURI,
        memo: &mut HashMap<PackURI, PackURI>,
    ) -> Result<String> {
        let rel = source
            .part(owner)?
            .rels()
            .get(r_id)
            .ok_or_else(|| OoxmlError::PartNotFound(format!("{} in {}", r_id, owner)))?
            .clone();
        if rel.is_external() {
            return Ok(self.part_mut(slide)?.relate_to_ext(rel.target_ref(), rel.reltype()));
        }
        let target = rel.target_partname()?;
        let copied = self.copy_part_from(source, &target, memo)?;
        Ok(self.part_mut(slide)?.relate_to(&copied, rel.reltype()))
    }

    /// Sections with the 0-based indices of their slides.
    ///
    /// A deck without sections is one section, [`ALL_SLIDES_SECTION`].
    pub fn sections(&self) -> Result<Vec<(String, Vec<usize>)>> {
        let root = self.presentation_element()?;
        let positions: HashMap<u32, usize> = Self::slide_ids(&root)
            .into_iter()
            .enumerate()
            .map(|(index, (id, _))| (id, index))
            .collect();

        let list = SectionList::from_presentation(&root);
        if list.is_empty() {
            let mut all: Vec<usize> = positions.values().copied().collect();
            all.sort_unstable();
            return Ok(vec![(ALL_SLIDES_SECTION.to_string(), all)]);
        }

        Ok(list
            .sections()
            .iter()
            .map(|section| {
                let mut indices: Vec<usize> = section
                    .slide_ids
                    .iter()
                    .filter_map(|id| positions.get(id).copied())
                    .collect();
                indices.sort_unstable();
                (clean_title(&section.name), indices)
            })
            .collect())
    }

    /// Replace the deck's sections. Indices are 0-based slide positions;
    /// slides that no section lists join the last one. An empty list
    /// removes the sections.
    pub fn set_sections(&mut self, sections: &[(String, Vec<usize>)]) -> Result<()> {
        let mut root = self.presentation_element()?;
        let ids = Self::slide_ids(&root);

        if let Some(ext_lst) = root.child_mut("p:extLst") {
            ext_lst.remove_elements(|ext| ext.attr("uri") == Some(SECTION_LIST_EXT_URI));
        }
        if !sections.is_empty() {
            let mut list = SectionList::new();
            for (name, indices) in sections {
                let guid = format!("{{{}}}", Uuid::new_v4().to_string().to_uppercase());
                let slide_ids = indices.iter().filter_map(|&i| ids.get(i).map(|(id, _)| *id));
                list.add_section(DeckSection::new(name.clone(), guid).with_slides(slide_ids));
            }
            let mut fragment = XmlElement::parse(&list.to_xml()?)?;
            match root.child_mut("p:extLst") {
                Some(ext_lst) => {
                    for ext in fragment.take_elements() {
                        ext_lst.push(ext);
                    }
                },
                None => root.push(fragment),
            }
        }
        root.remove_elements(|el| el.is("p:extLst") && el.elements().next().is_none());
        sync_sections(&mut root);
        self.store_presentation_element(&root)?;
        debug!(sections = sections.len(), "stored sections");
        Ok(())
    }

    /// Cleaned title of a slide, `"Slide N"` when it has none.
    pub fn slide_title(&self, index: usize) -> Result<String> {
        let title = self.slide(index)?.title().map(|t| clean_title(&t)).unwrap_or_default();
        if title.is_empty() {
            return Ok(format!("Slide {}", index + 1));
        }
        Ok(title)
    }
}

/// Top-level placeholders of a slide, layout or master tree.
fn placeholder_shapes(root: &XmlElement) -> impl Iterator<Item = (PlaceholderRef, &XmlElement)> {
    root.find(&["p:cSld", "p:spTree"])
        .into_iter()
        .flat_map(|tree| tree.children_named("p:sp"))
        .filter_map(|sp| {
            let ph = sp.find(&["p:nvSpPr", "p:nvPr", "p:ph"])?;
            Some((PlaceholderRef::from_element(ph), sp))
        })
}

/// Keep a `p14:sectionLst` consistent with `p:sldIdLst`: drop ids of
/// slides that are gone and put slides no section lists into the last one.
fn sync_sections(pres: &mut XmlElement) {
    let ids: Vec<String> = pres
        .child("p:sldIdLst")
        .map(|lst| {
            lst.children_named("p:sldId")
                .filter_map(|el| el.attr("id").map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let Some(section_lst) = pres.find_descendant_mut(&|el| el.local_name() == "sectionLst") else {
        return;
    };

    let mut listed: HashSet<String> = HashSet::new();
    for section in section_lst.elements_mut() {
        if let Some(sld_lst) = section.elements_mut().find(|el| el.local_name() == "sldIdLst") {
            sld_lst.remove_elements(|el| !el.attr("id").is_some_and(|id| ids.iter().any(|known| known == id)));
            listed.extend(sld_lst.elements().filter_map(|el| el.attr("id").map(str::to_string)));
        }
    }

    let unlisted: Vec<&String> = ids.iter().filter(|id| !listed.contains(*id)).collect();
    if unlisted.is_empty() {
        return;
    }
    let Some(last) = section_lst.elements_mut().last() else {
        return;
    };
    let prefix = last.name().split_once(':').map(|(p, _)| p.to_string());
    let qualify = |local: &str| match &prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    };
    let sld_id_name = qualify("sldId");
    let sld_lst = last.ensure_child(&qualify("sldIdLst"));
    for id in unlisted {
        sld_lst.push(XmlElement::new(sld_id_name.clone()).with_attr("id", id.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::sections::{P14_NAMESPACE, SECTION_LIST_EXT_URI};

    fn deck(slides: usize) -> Presentation {
        let mut pres = Presentation::new_blank().unwrap();
        let layout = pres.blank_layout().unwrap();
        for _ in 0..slides {
            pres.add_slide(&layout).unwrap();
        }
        pres
    }

    #[test]
    fn test_blank_template() {
        let pres = Presentation::new_blank().unwrap();
        assert_eq!(pres.slide_count().unwrap(), 0);
        assert_eq!(pres.slide_size().unwrap(), Some((12_192_000, 6_858_000)));

        let layouts = pres.layouts().unwrap();
        let names: Vec<&str> = layouts.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Title Slide", "Blank"]);
        assert_eq!(pres.blank_layout().unwrap(), layouts[1].partname);
    }

    #[test]
    fn test_add_and_remove_slides() {
        let mut pres = deck(3);
        assert_eq!(pres.slide_count().unwrap(), 3);
        let names: Vec<String> = pres
            .slide_partnames()
            .unwrap()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["/ppt/slides/slide1.xml", "/ppt/slides/slide2.xml", "/ppt/slides/slide3.xml"]
        );

        pres.remove_slide(1).unwrap();
        assert_eq!(pres.slide_count().unwrap(), 2);
        assert!(pres.slide(2).is_err());

        // Survives a round trip through the zip container.
        let reopened = Presentation::from_bytes(pres.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.slide_count().unwrap(), 2);
        assert_eq!(reopened.slide(1).unwrap().partname().as_str(), "/ppt/slides/slide3.xml");
    }

    #[test]
    fn test_slide_ids_start_at_256() {
        let pres = deck(2);
        let root = pres.presentation_element().unwrap();
        let ids: Vec<u32> = Presentation::slide_ids(&root).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![256, 257]);
    }

    #[test]
    fn test_retain_slides() {
        let mut pres = deck(4);
        let keep = pres.slide_partnames().unwrap();
        pres.retain_slides(&[3, 1]).unwrap();
        assert_eq!(pres.slide_partnames().unwrap(), vec![keep[1].clone(), keep[3].clone()]);
    }

    #[test]
    fn test_image_dedup() {
        let mut pres = deck(2);
        let slides = pres.slide_partnames().unwrap();
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

        let r1 = pres.add_image(&slides[0], &png, ct::PNG, "png").unwrap();
        let r2 = pres.add_image(&slides[1], &png, "application/octet-stream", "").unwrap();
        let m1 = pres.part(&slides[0]).unwrap().related_partname(&r1).unwrap();
        let m2 = pres.part(&slides[1]).unwrap().related_partname(&r2).unwrap();
        assert_eq!(m1, m2);
        assert_eq!(m1.as_str(), "/ppt/media/image1.png");
    }

    #[test]
    fn test_sections_fallback_and_list() {
        let mut pres = deck(3);
        assert_eq!(
            pres.sections().unwrap(),
            vec![(ALL_SLIDES_SECTION.to_string(), vec![0, 1, 2])]
        );

        let mut root = pres.presentation_element().unwrap();
        let ext = XmlElement::parse(&format!(
            r#"<p:extLst><p:ext uri="{}"><p14:sectionLst xmlns:p14="{}">
              <p14:section name="Intocht&#10;lied" id="{{A}}"><p14:sldIdLst><p14:sldId id="257"/><p14:sldId id="256"/></p14:sldIdLst></p14:section>
              <p14:section name="Zegen" id="{{B}}"><p14:sldIdLst><p14:sldId id="258"/></p14:sldIdLst></p14:section>
            </p14:sectionLst></p:ext></p:extLst>"#,
            SECTION_LIST_EXT_URI, P14_NAMESPACE
        ))
        .unwrap();
        root.push(ext);
        pres.store_presentation_element(&root).unwrap();

        assert_eq!(
            pres.sections().unwrap(),
            vec![
                ("Intocht lied".to_string(), vec![0, 1]),
                ("Zegen".to_string(), vec![2])
            ]
        );

        // Removing a slide drops it from its section; new slides join the last.
        pres.remove_slide(0).unwrap();
        let layout = pres.blank_layout().unwrap();
        pres.add_slide(&layout).unwrap();
        assert_eq!(
            pres.sections().unwrap(),
            vec![
                ("Intocht lied".to_string(), vec![0]),
                ("Zegen".to_string(), vec![1, 2])
            ]
        );
    }

    #[test]
    fn test_set_sections() {
        let mut pres = deck(3);
        pres.set_sections(&[("Opening".to_string(), vec![0]), ("Lezingen".to_string(), vec![1])])
            .unwrap();
        assert_eq!(
            pres.sections().unwrap(),
            vec![
                ("Opening".to_string(), vec![0]),
                ("Lezingen".to_string(), vec![1, 2])
            ]
        );

        // replacing keeps a single section list
        pres.set_sections(&[("Alles".to_string(), vec![0, 1, 2])]).unwrap();
        assert_eq!(pres.sections().unwrap(), vec![("Alles".to_string(), vec![0, 1, 2])]);
        let reopened = Presentation::from_bytes(pres.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.sections().unwrap().len(), 1);

        pres.set_sections(&[]).unwrap();
        assert_eq!(pres.sections().unwrap()[0].0, ALL_SLIDES_SECTION);
    }

    #[test]
    fn test_placeholder_geometry_inherited() {
        let mut pres = Presentation::new_blank().unwrap();
        let title_layout = pres.layouts().unwrap()[0].partname.clone();
        pres.add_slide(&title_layout).unwrap();
        let slide = pres.slide(0).unwrap();

        // Subtitle idx 1 is on the layout.
        let subtitle = PlaceholderRef {
            ph_type: Some(PlaceholderType::Subtitle),
            idx: 1,
        };
        let geometry = pres.placeholder_geometry(&slide, &subtitle).unwrap().unwrap();
        assert!(geometry.cx > 0);

        // An idx the layout lacks goes to the master body.
        let body = PlaceholderRef {
            ph_type: Some(PlaceholderType::Body),
            idx: 7,
        };
        let geometry = pres.placeholder_geometry(&slide, &body).unwrap().unwrap();
        assert_eq!(geometry, Geometry::new(838200, 1825625, 10515600, 4351338));
    }

    #[test]
    fn test_effective_background_from_master() {
        let pres = deck(1);
        let slide = pres.slide(0).unwrap();
        let (bg, owner) = pres.effective_background(&slide).unwrap().unwrap();
        assert!(bg.child("p:bgRef").is_some());
        assert_eq!(owner.as_str(), "/ppt/slideMasters/slideMaster1.xml");

        let colors = pres.color_context(&slide).unwrap();
        assert_eq!(colors.scheme().get("lt1"), Some("FFFFFF"));
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  Psalm\n23\u{b}vers 1  "), "Psalm 23 vers 1");
        assert_eq!(clean_title("\t\r\n"), "");

        let pres = deck(1);
        assert_eq!(pres.slide_title(0).unwrap(), "Slide 1");
    }
}
