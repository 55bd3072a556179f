/// Slides as editable element trees.
use crate::common::xml::XmlElement;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::PackURI;
use crate::ooxml::pptx::shapes::textframe;
use crate::ooxml::pptx::shapes::{PlaceholderRef, Shape};
use std::collections::{HashMap, HashSet};

/// A slide in a presentation.
///
/// The slide owns its parsed `p:sld` tree. Changes are written back to the
/// package with `Presentation::save_slide`.
///
/// # Examples
///
/// ```rust,no_run
/// use liturgy_deck::ooxml::pptx::Presentation;
///
/// let pres = Presentation::open("Algemeen/Welkom.pptx")?;
/// let slide = pres.slide(0)?;
/// println!("{}: {} shapes", slide.partname(), slide.shapes().len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Slide {
    partname: PackURI,
    root: XmlElement,
}

impl Slide {
    pub(crate) fn new(partname: PackURI, root: XmlElement) -> Self {
        Self { partname, root }
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    /// The `p:sld` element.
    #[inline]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    pub fn sp_tree(&self) -> Option<&XmlElement> {
        self.root.find(&["p:cSld", "p:spTree"])
    }

    pub fn sp_tree_mut(&mut self) -> Option<&mut XmlElement> {
        self.root.find_mut(&["p:cSld", "p:spTree"])
    }

    fn sp_tree_or_err(&mut self) -> Result<&mut XmlElement> {
        let partname = self.partname.to_string();
        self.sp_tree_mut()
            .ok_or_else(|| OoxmlError::InvalidFormat(format!("{} has no shape tree", partname)))
    }

    /// Top-level shapes in document order.
    pub fn shapes(&self) -> Vec<Shape<'_>> {
        self.sp_tree()
            .map(|tree| tree.elements().filter_map(Shape::from_element).collect())
            .unwrap_or_default()
    }

    /// Top-level `p:sp` placeholders with their index among the shape
    /// tree's child elements.
    pub fn placeholders(&self) -> Vec<(usize, PlaceholderRef)> {
        let Some(tree) = self.sp_tree() else {
            return Vec::new();
        };
        tree.elements()
            .enumerate()
            .filter(|(_, el)| el.is("p:sp"))
            .filter_map(|(position, el)| {
                let ph = el.find(&["p:nvSpPr", "p:nvPr", "p:ph"])?;
                Some((position, PlaceholderRef::from_element(ph)))
            })
            .collect()
    }

    /// Text of the first title placeholder.
    pub fn title(&self) -> Option<String> {
        self.shapes().into_iter().find_map(|shape| {
            let ph_type = shape.placeholder()?.ph_type?;
            if !ph_type.is_title() {
                return None;
            }
            shape.text_body().map(textframe::text)
        })
    }

    /// The slide's own `p:bg`, if it has one.
    pub fn background(&self) -> Option<&XmlElement> {
        self.root.find(&["p:cSld", "p:bg"])
    }

    /// Replace the background. `p:bg` must be the first child of `p:cSld`.
    pub fn set_background(&mut self, bg: XmlElement) -> Result<()> {
        let partname = self.partname.to_string();
        let c_sld = self
            .root
            .child_mut("p:cSld")
            .ok_or_else(|| OoxmlError::InvalidFormat(format!("{} has no p:cSld", partname)))?;
        c_sld.remove_elements(|el| el.is("p:bg"));
        c_sld.insert(0, bg);
        Ok(())
    }

    /// One more than the highest shape id on the slide.
    pub fn next_shape_id(&self) -> u32 {
        self.sp_tree()
            .map(|tree| {
                tree.descendants()
                    .filter(|el| el.is("p:cNvPr"))
                    .filter_map(|el| el.attr("id")?.parse::<u32>().ok())
                    .max()
                    .unwrap_or(1)
            })
            .unwrap_or(1)
            + 1
    }

    /// Whether the slide has no shapes at all.
    pub fn is_empty(&self) -> bool {
        self.shapes().is_empty()
    }

    /// Append a shape element to the shape tree, renumbering every shape id
    /// inside it so ids stay unique on this slide. Returns the new id of
    /// the outermost shape.
    pub fn insert_shape(&mut self, mut shape: XmlElement) -> Result<u32> {
        let first = self.next_shape_id();
        let id = renumber_shape_ids(&mut shape, first);
        let tree = self.sp_tree_or_err()?;
        tree.insert_before("p:extLst", shape);
        Ok(id)
    }

    /// [`insert_shape`](Self::insert_shape) for shape XML text.
    pub fn insert_shape_xml(&mut self, xml: &str) -> Result<u32> {
        let shape = XmlElement::parse(xml)?;
        self.insert_shape(shape)
    }

    /// Copy the namespace declarations `fragment` depends on from the root
    /// of the slide it came from, when this slide does not declare them.
    ///
    /// Prefixes are collected from element names, attribute names and the
    /// markup-compatibility `Requires`/`Ignorable` lists.
    pub fn adopt_namespaces(&mut self, source_root: &XmlElement, fragment: &XmlElement) {
        let mut used: HashSet<String> = HashSet::new();
        collect_prefixes(fragment, &mut used);

        let declared_here: HashSet<&str> = fragment
            .descendants()
            .chain(std::iter::once(fragment))
            .flat_map(|el| el.attrs().iter())
            .filter_map(|(key, _)| key.strip_prefix("xmlns:"))
            .collect();

        let mut missing: Vec<(String, String)> = Vec::new();
        for prefix in &used {
            if prefix == "xml" || declared_here.contains(prefix.as_str()) {
                continue;
            }
            let key = format!("xmlns:{}", prefix);
            if self.root.attr(&key).is_some() {
                continue;
            }
            if let Some(uri) = source_root.attr(&key) {
                missing.push((key, uri.to_string()));
            }
        }
        missing.sort();
        for (key, uri) in missing {
            self.root.set_attr(key, uri);
        }
    }
}

/// Give every `p:cNvPr` in `shape` a fresh id starting at `first`, and
/// point connector ends inside it at the new ids. Returns the id given to
/// the outermost shape.
fn renumber_shape_ids(shape: &mut XmlElement, first: u32) -> u32 {
    let mut remap: HashMap<String, String> = HashMap::new();
    let mut next = first;
    let mut outer: Option<u32> = None;
    shape.walk_mut(&mut |el| {
        if el.is("p:cNvPr") {
            let new_id = next;
            next += 1;
            outer.get_or_insert(new_id);
            if let Some(old) = el.attr("id") {
                remap.insert(old.to_string(), new_id.to_string());
            }
            el.set_attr("id", new_id.to_string());
        }
    });
    shape.walk_mut(&mut |el| {
        if (el.is("a:stCxn") || el.is("a:endCxn"))
            && let Some(new_id) = el.attr("id").and_then(|old| remap.get(old))
        {
            el.set_attr("id", new_id.clone());
        }
    });
    outer.unwrap_or(first)
}

fn prefix_of(qname: &str) -> Option<&str> {
    qname.split_once(':').map(|(prefix, _)| prefix)
}

fn collect_prefixes(el: &XmlElement, used: &mut HashSet<String>) {
    if let Some(prefix) = prefix_of(el.name()) {
        used.insert(prefix.to_string());
    }
    for (key, value) in el.attrs() {
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        if let Some(prefix) = prefix_of(key) {
            used.insert(prefix.to_string());
        }
        if key == "Requires" || key.ends_with(":Ignorable") || key == "Ignorable" {
            used.extend(value.split_whitespace().map(str::to_string));
        }
    }
    for child in el.elements() {
        collect_prefixes(child, used);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::shapes::{PlaceholderType, ShapeKind};

    const SLIDE: &str = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:cSld><p:spTree>
        <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
        <p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/>
          <p:txBody><a:bodyPr/><a:p><a:r><a:t>Psalm 23</a:t></a:r></a:p></p:txBody></p:sp>
        <p:sp><p:nvSpPr><p:cNvPr id="3" name="Content 2"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>
        <p:extLst><p:ext uri="x"/></p:extLst>
        </p:spTree></p:cSld></p:sld>"#;

    fn slide() -> Slide {
        Slide::new(
            PackURI::new("/ppt/slides/slide1.xml").unwrap(),
            XmlElement::parse(SLIDE).unwrap(),
        )
    }

    #[test]
    fn test_shapes_and_placeholders() {
        let slide = slide();
        let kinds: Vec<ShapeKind> = slide.shapes().iter().map(Shape::kind).collect();
        assert_eq!(kinds, vec![ShapeKind::Text, ShapeKind::Other]);

        let placeholders = slide.placeholders();
        assert_eq!(placeholders.len(), 2);
        assert_eq!(placeholders[0].1.ph_type, Some(PlaceholderType::Title));
        assert_eq!(placeholders[1].1.ph_type, Some(PlaceholderType::Object));
        assert_eq!(placeholders[1].1.idx, 1);
        assert_eq!(slide.title().as_deref(), Some("Psalm 23"));
    }

    #[test]
    fn test_insert_shape_renumbers() {
        let mut slide = slide();
        assert_eq!(slide.next_shape_id(), 4);

        let group = r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="2" name="Group"/></p:nvGrpSpPr><p:grpSpPr/>
            <p:sp><p:nvSpPr><p:cNvPr id="3" name="A"/></p:nvSpPr></p:sp>
            <p:cxnSp><p:nvCxnSpPr><p:cNvPr id="5" name="Line"/><p:cNvCxnSpPr><a:stCxn id="3" idx="0"/></p:cNvCxnSpPr></p:nvCxnSpPr></p:cxnSp>
            </p:grpSp>"#;
        let id = slide.insert_shape_xml(group).unwrap();
        assert_eq!(id, 4);

        let tree = slide.sp_tree().unwrap();
        // Inserted before the extension list.
        let names: Vec<&str> = tree.elements().map(XmlElement::name).collect();
        assert_eq!(names[names.len() - 2], "p:grpSp");
        assert_eq!(names[names.len() - 1], "p:extLst");

        let ids: Vec<&str> = tree
            .descendants()
            .filter(|el| el.is("p:cNvPr"))
            .filter_map(|el| el.attr("id"))
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
        let st_cxn = tree.descendants().find(|el| el.is("a:stCxn")).unwrap();
        assert_eq!(st_cxn.attr("id"), Some("5"));
    }

    #[test]
    fn test_set_background_is_first() {
        let mut slide = slide();
        let bg = XmlElement::parse(r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="112233"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#).unwrap();
        slide.set_background(bg.clone()).unwrap();
        slide.set_background(bg).unwrap();
        let c_sld = slide.root().child("p:cSld").unwrap();
        assert_eq!(c_sld.elements().next().unwrap().name(), "p:bg");
        assert_eq!(c_sld.children_named("p:bg").count(), 1);
    }

    #[test]
    fn test_adopt_namespaces() {
        let mut slide = slide();
        let source = XmlElement::parse(
            r#"<p:sld xmlns:p="p-ns" xmlns:a14="a14-ns" xmlns:mc="mc-ns" xmlns:unused="u"/>"#,
        )
        .unwrap();
        let fragment = XmlElement::parse(
            r#"<mc:AlternateContent><mc:Choice Requires="a14"><p:sp/></mc:Choice></mc:AlternateContent>"#,
        )
        .unwrap();
        slide.adopt_namespaces(&source, &fragment);
        assert_eq!(slide.root().attr("xmlns:mc"), Some("mc-ns"));
        assert_eq!(slide.root().attr("xmlns:a14"), Some("a14-ns"));
        assert!(slide.root().attr("xmlns:unused").is_none());
        // Declared already, left alone.
        assert_eq!(
            slide.root().attr("xmlns:p"),
            Some("http://schemas.openxmlformats.org/presentationml/2006/main")
        );
    }
}
