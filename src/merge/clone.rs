//! Copying a slide between two independent presentations.
//!
//! The target keeps its own masters and theme. The copied slide is built
//! on the target's emptiest layout and its content is re-created shape by
//! shape, so a copy never depends on layout inheritance being resolvable
//! in the target:
//!
//! - pictures get their image registered in the target and a fresh `p:pic`,
//! - tables are rebuilt from their grid and cell text,
//! - text shapes become text boxes with resolved run formatting,
//! - groups and anything else are deep-copied with their relationships
//!   recreated.
//!
//! A shape or background that cannot be copied is logged and left out.

use crate::common::xml::XmlElement;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::PackURI;
use crate::ooxml::pptx::parts::ColorContext;
use crate::ooxml::pptx::shapes::textframe;
use crate::ooxml::pptx::shapes::{Geometry, PictureSpec, Shape, ShapeKind, TableSpec};
use crate::ooxml::pptx::writer::{picture_xml, table_xml, text_box_xml};
use crate::ooxml::pptx::{Presentation, Slide, SlideBackground};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Outcome of one [`clone_slide`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClonedSlide {
    /// Index of the new slide in the target.
    pub index: usize,
    pub copied: usize,
    pub skipped: usize,
}

/// Copies slides of one source deck into a target.
///
/// Parts pulled in through relationships (charts, diagrams, embedded
/// workbooks) are copied once per cloner, however many slides use them.
///
/// # Examples
///
/// ```rust,no_run
/// use liturgy_deck::merge::SlideCloner;
/// use liturgy_deck::ooxml::pptx::Presentation;
///
/// let mut target = Presentation::open("Themas/Herfst.pptx")?;
/// let source = Presentation::open("Liederen/psalm-23.pptx")?;
/// let mut cloner = SlideCloner::new(&source);
/// for index in 0..source.slide_count()? {
///     cloner.clone_slide(&mut target, index)?;
/// }
/// target.save("viering.pptx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SlideCloner<'s> {
    source: &'s Presentation,
    memo: HashMap<PackURI, PackURI>,
}

/// Source-side state while one slide is copied.
struct SourceSlide<'s> {
    pres: &'s Presentation,
    slide: Slide,
    colors: ColorContext,
}

impl<'s> SlideCloner<'s> {
    pub fn new(source: &'s Presentation) -> Self {
        Self {
            source,
            memo: HashMap::new(),
        }
    }

    /// Copy source slide `index` to the end of `target`.
    ///
    /// Returns `Ok(None)` when `index` is past the source's last slide.
    /// Errors only come from the target itself; problems with the copied
    /// content are skipped.
    pub fn clone_slide(&mut self, target: &mut Presentation, index: usize) -> Result<Option<ClonedSlide>> {
        let count = self.source.slide_count()?;
        if index >= count {
            warn!(index, count, "source slide out of range, nothing copied");
            return Ok(None);
        }

        let slide = self.source.slide(index)?;
        let colors = self.source.color_context(&slide).unwrap_or_else(|e| {
            warn!(error = %e, "no theme colors for source slide, using defaults");
            ColorContext::default()
        });
        let src = SourceSlide {
            pres: self.source,
            slide,
            colors,
        };

        let layout = target.blank_layout()?;
        let new_index = target.add_slide(&layout)?;
        let mut dst = target.slide(new_index)?;

        let mut copied = 0;
        let mut skipped = 0;
        for shape in src.slide.shapes() {
            match self.clone_shape(target, &src, &mut dst, &shape) {
                Ok(()) => copied += 1,
                Err(e) => {
                    skipped += 1;
                    warn!(
                        shape = shape.name(),
                        kind = ?shape.kind(),
                        slide = index,
                        error = %e,
                        "shape not copied"
                    );
                },
            }
        }

        if let Err(e) = self.clone_background(target, &src, &mut dst) {
            warn!(slide = index, error = %e, "background not copied");
        }

        target.save_slide(&dst)?;
        debug!(from = index, to = new_index, copied, skipped, "cloned slide");
        Ok(Some(ClonedSlide {
            index: new_index,
            copied,
            skipped,
        }))
    }

    fn clone_shape(
        &mut self,
        target: &mut Presentation,
        src: &SourceSlide<'_>,
        dst: &mut Slide,
        shape: &Shape<'_>,
    ) -> Result<()> {
        match shape.kind() {
            ShapeKind::Picture => clone_picture(target, src, dst, shape),
            ShapeKind::Table => clone_table(dst, shape),
            ShapeKind::Text => clone_text(src, dst, shape),
            ShapeKind::Group | ShapeKind::Other => self.copy_raw(target, src, dst, shape),
        }
    }

    /// Deep-copy a shape element and recreate every relationship it
    /// references (`r:embed`, `r:link`, `r:id`, diagram parts, ...).
    fn copy_raw(
        &mut self,
        target: &mut Presentation,
        src: &SourceSlide<'_>,
        dst: &mut Slide,
        shape: &Shape<'_>,
    ) -> Result<()> {
        let mut el = shape.element().clone();

        let mut remap: HashMap<String, String> = HashMap::new();
        for r_id in relationship_refs(&el) {
            let new_id = target.import_relationship(
                src.pres,
                src.slide.partname(),
                &r_id,
                dst.partname(),
                &mut self.memo,
            )?;
            remap.insert(r_id, new_id);
        }
        if !remap.is_empty() {
            el.walk_mut(&mut |node| {
                for (key, value) in node.attrs().to_vec() {
                    if !key.starts_with("r:") {
                        continue;
                    }
                    if let Some(new_id) = remap.get(&value) {
                        node.set_attr(key, new_id.clone());
                    }
                }
            });
        }

        // A placeholder copied onto another layout no longer inherits its
        // position, so it gets the one it was shown at.
        if shape.xfrm().is_none()
            && let Some(ph) = shape.placeholder()
            && let Some(geometry) = src.pres.placeholder_geometry(&src.slide, &ph).ok().flatten()
            && let Some(sp_pr) = el.child_mut("p:spPr")
        {
            sp_pr.insert(0, geometry.to_xfrm("a:xfrm"));
        }

        dst.adopt_namespaces(src.slide.root(), &el);
        dst.insert_shape(el)?;
        Ok(())
    }

    fn clone_background(&mut self, target: &mut Presentation, src: &SourceSlide<'_>, dst: &mut Slide) -> Result<()> {
        let Some((bg, owner)) = src.pres.effective_background(&src.slide)? else {
            return Ok(());
        };
        let Some(background) = SlideBackground::from_bg(&bg, &src.colors) else {
            debug!(owner = %owner, "background fill not reproducible, left to the target layout");
            return Ok(());
        };

        let element = match background.image_r_id() {
            Some(r_id) => {
                let part = src.pres.related_part(&owner, r_id)?;
                let new_id = target.add_image(dst.partname(), part.blob(), part.content_type(), part.partname().ext())?;
                background.to_element(Some(&new_id))?
            },
            None => background.to_element(None)?,
        };
        dst.set_background(element)
    }
}

/// Geometry a shape is drawn with: its own, else what its placeholder
/// inherits.
fn rendered_geometry(src: &SourceSlide<'_>, shape: &Shape<'_>) -> Geometry {
    if let Some(geometry) = shape.geometry() {
        return geometry;
    }
    shape
        .placeholder()
        .and_then(|ph| src.pres.placeholder_geometry(&src.slide, &ph).ok().flatten())
        .unwrap_or_default()
}

fn clone_picture(target: &mut Presentation, src: &SourceSlide<'_>, dst: &mut Slide, shape: &Shape<'_>) -> Result<()> {
    let picture = PictureSpec::from_shape(shape)?;
    let part = src.pres.related_part(src.slide.partname(), &picture.embed_r_id)?;
    let r_id = target.add_image(dst.partname(), part.blob(), part.content_type(), part.partname().ext())?;
    let geometry = rendered_geometry(src, shape);
    let xml = picture_xml(dst.next_shape_id(), &picture, &r_id, &geometry)?;
    dst.insert_shape_xml(&xml)?;
    Ok(())
}

fn clone_table(dst: &mut Slide, shape: &Shape<'_>) -> Result<()> {
    let table = TableSpec::from_graphic_frame(shape.element())?;
    let geometry = shape
        .geometry()
        .ok_or_else(|| OoxmlError::InvalidFormat(format!("table {} has no position", shape.name())))?;
    let xml = table_xml(dst.next_shape_id(), shape.name(), &geometry, &table)?;
    dst.insert_shape_xml(&xml)?;
    Ok(())
}

fn clone_text(src: &SourceSlide<'_>, dst: &mut Slide, shape: &Shape<'_>) -> Result<()> {
    let tx_body = shape
        .text_body()
        .ok_or_else(|| OoxmlError::InvalidFormat(format!("{} has no text", shape.name())))?;
    let paragraphs = textframe::read_paragraphs(tx_body, &src.colors);
    let geometry = rendered_geometry(src, shape);
    let xml = text_box_xml(
        dst.next_shape_id(),
        shape.name(),
        &geometry,
        textframe::word_wrap(tx_body),
        &paragraphs,
    )?;
    dst.insert_shape_xml(&xml)?;
    Ok(())
}

/// Distinct relationship ids referenced from `el` and its descendants.
fn relationship_refs(el: &XmlElement) -> BTreeSet<String> {
    std::iter::once(el)
        .chain(el.descendants())
        .flat_map(|node| node.attrs().iter())
        .filter(|(key, value)| key.starts_with("r:") && !value.is_empty())
        .map(|(_, value)| value.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;
    use crate::ooxml::pptx::shapes::textframe::text;

    /// 1x1 transparent PNG.
    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
        0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
        0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
        0x42, 0x60, 0x82,
    ];

    const TEXT_BOX: &str = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="TextBox 1"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>
        <p:spPr><a:xfrm><a:off x="914400" y="914400"/><a:ext cx="4572000" cy="914400"/></a:xfrm></p:spPr>
        <p:txBody><a:bodyPr wrap="none"/><a:lstStyle/>
        <a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="nl-NL" sz="3200" b="1"><a:solidFill><a:schemeClr val="accent1"/></a:solidFill></a:rPr><a:t>De Heer is mijn herder</a:t></a:r></a:p>
        <a:p><a:r><a:rPr lang="nl-NL"/><a:t>niets zal mij </a:t></a:r><a:r><a:rPr lang="nl-NL" i="1"/><a:t>ontbreken</a:t></a:r></a:p>
        </p:txBody></p:sp>"#;

    fn deck_with(shapes: &[&str]) -> Presentation {
        let mut pres = Presentation::new_blank().unwrap();
        let layout = pres.blank_layout().unwrap();
        pres.add_slide(&layout).unwrap();
        let mut slide = pres.slide(0).unwrap();
        for xml in shapes {
            slide.insert_shape_xml(xml).unwrap();
        }
        pres.save_slide(&slide).unwrap();
        pres
    }

    fn texts(slide: &Slide) -> Vec<String> {
        slide
            .shapes()
            .iter()
            .filter_map(|s| s.text_body().map(text))
            .collect()
    }

    #[test]
    fn test_text_round_trips() {
        let source = deck_with(&[TEXT_BOX]);
        let mut target = Presentation::new_blank().unwrap();

        let cloned = SlideCloner::new(&source).clone_slide(&mut target, 0).unwrap().unwrap();
        assert_eq!(cloned.index, 0);
        assert_eq!((cloned.copied, cloned.skipped), (1, 0));

        let slide = target.slide(0).unwrap();
        assert_eq!(texts(&slide), texts(&source.slide(0).unwrap()));

        let shape = &slide.shapes()[0];
        assert_eq!(shape.geometry(), Some(Geometry::new(914_400, 914_400, 4_572_000, 914_400)));
        let xml = shape.element().to_xml();
        assert!(xml.contains(r#"wrap="none""#));
        assert!(xml.contains(r#"algn="ctr""#));
        assert!(xml.contains(r#"sz="3200" b="1""#));
        // accent1 of the Office theme, resolved
        assert!(xml.contains(r#"<a:srgbClr val="4472C4"/>"#));
        assert!(!xml.contains("schemeClr"));
    }

    #[test]
    fn test_out_of_range_is_none() {
        let source = deck_with(&[]);
        let mut target = Presentation::new_blank().unwrap();
        assert!(SlideCloner::new(&source).clone_slide(&mut target, 5).unwrap().is_none());
        assert_eq!(target.slide_count().unwrap(), 0);
    }

    #[test]
    fn test_picture_gets_target_media() {
        let mut source = deck_with(&[]);
        let partname = source.slide(0).unwrap().partname().clone();
        let r_id = source.add_image(&partname, PNG, "image/png", "png").unwrap();
        let mut slide = source.slide(0).unwrap();
        slide
            .insert_shape_xml(&format!(
                r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Kruis"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/></a:xfrm></p:spPr></p:pic>"#,
                r_id
            ))
            .unwrap();
        source.save_slide(&slide).unwrap();

        let mut target = Presentation::new_blank().unwrap();
        let mut cloner = SlideCloner::new(&source);
        cloner.clone_slide(&mut target, 0).unwrap();
        cloner.clone_slide(&mut target, 0).unwrap();

        let media: Vec<_> = target
            .package()
            .opc()
            .iter_parts()
            .filter(|p| p.content_type() == "image/png")
            .map(|p| p.partname().to_string())
            .collect();
        assert_eq!(media.len(), 1, "identical images share one part");

        let copy = target.slide(1).unwrap();
        let pic = copy.shapes()[0];
        assert_eq!(pic.kind(), ShapeKind::Picture);
        let new_r_id = crate::ooxml::pptx::shapes::picture::image_r_id(pic.element()).unwrap();
        assert!(target.related_part(copy.partname(), new_r_id).is_ok());
    }

    #[test]
    fn test_group_relationships_are_recreated() {
        let mut source = deck_with(&[]);
        let partname = source.slide(0).unwrap().partname().clone();
        let r_id = source.add_image(&partname, PNG, "image/png", "png").unwrap();
        let mut slide = source.slide(0).unwrap();
        slide
            .insert_shape_xml(&format!(
                r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Group 4"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
                <p:pic><p:nvPicPr><p:cNvPr id="6" name="Pic"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/></p:blipFill><p:spPr/></p:pic>
                <p:cxnSp><p:nvCxnSpPr><p:cNvPr id="7" name="Line"/><p:cNvCxnSpPr><a:stCxn id="6" idx="0"/></p:cNvCxnSpPr><p:nvPr/></p:nvCxnSpPr><p:spPr/></p:cxnSp>
                </p:grpSp>"#,
                r_id
            ))
            .unwrap();
        source.save_slide(&slide).unwrap();

        // The target slide already uses the source's rId for its layout.
        let mut target = Presentation::new_blank().unwrap();
        SlideCloner::new(&source).clone_slide(&mut target, 0).unwrap();

        let copy = target.slide(0).unwrap();
        let group = copy.shapes()[0];
        assert_eq!(group.kind(), ShapeKind::Group);
        let blip = group
            .element()
            .descendants()
            .find(|el| el.is("a:blip"))
            .unwrap();
        let part = target.related_part(copy.partname(), blip.attr("r:embed").unwrap()).unwrap();
        assert_eq!(part.content_type(), "image/png");

        // connector follows the renumbered picture
        let pic_id = group.group_members()[0].id().unwrap();
        let st = group.element().descendants().find(|el| el.is("a:stCxn")).unwrap();
        assert_eq!(st.attr("id"), Some(pic_id.to_string().as_str()));
    }

    #[test]
    fn test_table_text_survives() {
        let table = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Rooster"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>
            <p:xfrm><a:off x="10" y="20"/><a:ext cx="2000" cy="600"/></p:xfrm>
            <a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl>
            <a:tblGrid><a:gridCol w="1000"/><a:gridCol w="1000"/></a:tblGrid>
            <a:tr h="300"><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>Lezing</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:bodyPr/><a:p><a:pPr algn="r"/><a:r><a:t>Psalm 23</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
            </a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#;
        let source = deck_with(&[table]);
        let mut target = Presentation::new_blank().unwrap();
        SlideCloner::new(&source).clone_slide(&mut target, 0).unwrap();

        let copy = target.slide(0).unwrap();
        let frame = copy.shapes()[0];
        assert_eq!(frame.kind(), ShapeKind::Table);
        let spec = TableSpec::from_graphic_frame(frame.element()).unwrap();
        assert_eq!((spec.row_count(), spec.column_count()), (1, 2));
        assert_eq!(spec.col_widths, [1000, 1000]);
        assert_eq!(spec.rows[0].cells[1].text(), "Psalm 23");
        assert_eq!(frame.geometry(), Some(Geometry::new(10, 20, 2000, 600)));
    }

    #[test]
    fn test_broken_shape_is_skipped() {
        // picture whose image relationship does not exist
        let broken = r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Kapot"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId99"/></p:blipFill><p:spPr/></p:pic>"#;
        let source = deck_with(&[broken, TEXT_BOX]);
        let mut target = Presentation::new_blank().unwrap();
        let cloned = SlideCloner::new(&source).clone_slide(&mut target, 0).unwrap().unwrap();
        assert_eq!((cloned.copied, cloned.skipped), (1, 1));
        assert_eq!(target.slide(0).unwrap().shapes().len(), 1);
    }

    #[test]
    fn test_solid_background_resolved() {
        let mut source = deck_with(&[]);
        let mut slide = source.slide(0).unwrap();
        slide
            .set_background(
                XmlElement::parse(r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="1F3864"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#)
                    .unwrap(),
            )
            .unwrap();
        source.save_slide(&slide).unwrap();

        let mut target = Presentation::new_blank().unwrap();
        SlideCloner::new(&source).clone_slide(&mut target, 0).unwrap();
        let bg = target.slide(0).unwrap().background().cloned().unwrap();
        assert!(bg.to_xml().contains(r#"<a:srgbClr val="1F3864"/>"#));
    }

    #[test]
    fn test_picture_background_registers_image() {
        let mut source = deck_with(&[]);
        let partname = source.slide(0).unwrap().partname().clone();
        let r_id = source.add_image(&partname, PNG, ct::PNG, "png").unwrap();
        let mut slide = source.slide(0).unwrap();
        slide
            .set_background(
                XmlElement::parse(&format!(
                    r#"<p:bg><p:bgPr><a:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></a:blipFill><a:effectLst/></p:bgPr></p:bg>"#,
                    r_id
                ))
                .unwrap(),
            )
            .unwrap();
        source.save_slide(&slide).unwrap();

        let mut target = Presentation::new_blank().unwrap();
        SlideCloner::new(&source).clone_slide(&mut target, 0).unwrap();
        let copy = target.slide(0).unwrap();
        let blip = copy.background().unwrap().descendants().find(|el| el.is("a:blip")).unwrap();
        let part = target.related_part(copy.partname(), blip.attr("r:embed").unwrap()).unwrap();
        assert!(part.content_type().starts_with("image/"));
    }
}
