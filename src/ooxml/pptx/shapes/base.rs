/// Base shape types for PowerPoint presentations.
use crate::common::xml::XmlElement;
use crate::ooxml::pptx::shapes::placeholder::PlaceholderRef;

/// What a shape tree element is, as far as slide copying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// A picture (p:pic)
    Picture,
    /// A group shape (p:grpSp)
    Group,
    /// A graphic frame holding an a:tbl
    Table,
    /// A p:sp that carries a text body
    Text,
    /// Charts, SmartArt, connectors, OLE frames and text-less p:sp
    Other,
}

/// Position and size in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Geometry {
    pub fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    /// Read an `a:xfrm` / `p:xfrm` element. Missing parts read as zero.
    pub fn from_xfrm(xfrm: &XmlElement) -> Self {
        let int = |el: Option<&XmlElement>, key: &str| -> i64 {
            el.and_then(|el| el.attr(key))
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        };
        let off = xfrm.child("a:off");
        let ext = xfrm.child("a:ext");
        Self {
            x: int(off, "x"),
            y: int(off, "y"),
            cx: int(ext, "cx"),
            cy: int(ext, "cy"),
        }
    }

    /// `off`/`ext` children for an xfrm element.
    pub fn to_xfrm(&self, name: &str) -> XmlElement {
        XmlElement::new(name)
            .with_child(
                XmlElement::new("a:off")
                    .with_attr("x", self.x.to_string())
                    .with_attr("y", self.y.to_string()),
            )
            .with_child(
                XmlElement::new("a:ext")
                    .with_attr("cx", self.cx.to_string())
                    .with_attr("cy", self.cy.to_string()),
            )
    }
}

/// Read-only view of one shape element in a shape tree.
///
/// # Examples
///
/// ```rust,ignore
/// for shape in slide.shapes() {
///     println!("{:?} {} at {:?}", shape.kind(), shape.name(), shape.geometry());
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Shape<'a> {
    el: &'a XmlElement,
    kind: ShapeKind,
}

impl<'a> Shape<'a> {
    /// Wrap a shape tree child. Tree bookkeeping elements (`p:nvGrpSpPr`,
    /// `p:grpSpPr`, `p:extLst`) are not shapes and give `None`.
    pub fn from_element(el: &'a XmlElement) -> Option<Self> {
        let kind = match el.local_name() {
            "pic" => ShapeKind::Picture,
            "grpSp" => ShapeKind::Group,
            "graphicFrame" => {
                if el
                    .find(&["a:graphic", "a:graphicData", "a:tbl"])
                    .is_some()
                {
                    ShapeKind::Table
                } else {
                    ShapeKind::Other
                }
            },
            "sp" => {
                if el.child("p:txBody").is_some() {
                    ShapeKind::Text
                } else {
                    ShapeKind::Other
                }
            },
            "cxnSp" | "contentPart" | "AlternateContent" => ShapeKind::Other,
            _ => return None,
        };
        Some(Self { el, kind })
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[inline]
    pub fn element(&self) -> &'a XmlElement {
        self.el
    }

    /// The `p:nvXxxPr` block of the shape.
    fn non_visual(&self) -> Option<&'a XmlElement> {
        self.el
            .elements()
            .find(|child| child.local_name().starts_with("nv"))
    }

    /// The `p:cNvPr` element holding id, name and descr.
    pub fn c_nv_pr(&self) -> Option<&'a XmlElement> {
        self.non_visual().and_then(|nv| nv.child("p:cNvPr"))
    }

    pub fn id(&self) -> Option<u32> {
        self.c_nv_pr()?.attr("id")?.parse().ok()
    }

    pub fn name(&self) -> &'a str {
        self.c_nv_pr().and_then(|c| c.attr("name")).unwrap_or("")
    }

    /// Alternative text.
    pub fn descr(&self) -> Option<&'a str> {
        self.c_nv_pr()?.attr("descr")
    }

    /// Placeholder reference, when the shape is a placeholder.
    pub fn placeholder(&self) -> Option<PlaceholderRef> {
        let ph = self.non_visual()?.find(&["p:nvPr", "p:ph"])?;
        Some(PlaceholderRef::from_element(ph))
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.placeholder().is_some()
    }

    /// The xfrm element, wherever this shape kind keeps it.
    pub fn xfrm(&self) -> Option<&'a XmlElement> {
        match self.el.local_name() {
            "graphicFrame" => self.el.child("p:xfrm"),
            "grpSp" => self.el.find(&["p:grpSpPr", "a:xfrm"]),
            _ => self.el.find(&["p:spPr", "a:xfrm"]),
        }
    }

    /// Own geometry. Placeholders often have none and inherit it from
    /// their layout.
    pub fn geometry(&self) -> Option<Geometry> {
        self.xfrm().map(Geometry::from_xfrm)
    }

    pub fn text_body(&self) -> Option<&'a XmlElement> {
        self.el.child("p:txBody")
    }

    /// Direct children of a group, as shapes.
    pub fn group_members(&self) -> Vec<Shape<'a>> {
        if self.kind != ShapeKind::Group {
            return Vec::new();
        }
        self.el.elements().filter_map(Shape::from_element).collect()
    }
}
