/// Picture (image) shape implementation.
use crate::common::xml::XmlElement;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::shapes::base::{Geometry, Shape};

/// What is needed to re-create a `p:pic` elsewhere.
///
/// # Examples
///
/// ```rust,ignore
/// let picture = PictureSpec::from_shape(&shape)?;
/// println!("Picture {} uses {}", picture.name, picture.embed_r_id);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PictureSpec {
    pub name: String,
    pub descr: Option<String>,
    /// rId of the image in the source part.
    pub embed_r_id: String,
    pub geometry: Option<Geometry>,
    /// Cropping (`a:srcRect`), kept as is.
    pub src_rect: Option<XmlElement>,
}

impl PictureSpec {
    pub fn from_shape(shape: &Shape<'_>) -> Result<Self> {
        let el = shape.element();
        let embed_r_id = image_r_id(el)
            .ok_or_else(|| OoxmlError::InvalidFormat(format!("picture {} has no image", shape.name())))?;
        Ok(Self {
            name: shape.name().to_string(),
            descr: shape.descr().map(str::to_string),
            embed_r_id: embed_r_id.to_string(),
            geometry: shape.geometry(),
            src_rect: el.find(&["p:blipFill", "a:srcRect"]).cloned(),
        })
    }
}

/// rId of the embedded image of a `p:pic`.
///
/// Linked-only pictures (`r:link` without `r:embed`) have none.
pub fn image_r_id(pic: &XmlElement) -> Option<&str> {
    pic.find(&["p:blipFill", "a:blip"])?
        .attr("r:embed")
        .filter(|r_id| !r_id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_spec() {
        let pic = XmlElement::parse(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture 3" descr="Kruis"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr>
            <p:blipFill><a:blip r:embed="rId2"/><a:srcRect l="10"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>
            <p:spPr><a:xfrm><a:off x="10" y="20"/><a:ext cx="30" cy="40"/></a:xfrm></p:spPr></p:pic>"#,
        )
        .unwrap();
        let shape = Shape::from_element(&pic).unwrap();
        let spec = PictureSpec::from_shape(&shape).unwrap();
        assert_eq!(spec.embed_r_id, "rId2");
        assert_eq!(spec.descr.as_deref(), Some("Kruis"));
        assert_eq!(spec.geometry, Some(Geometry::new(10, 20, 30, 40)));
        assert_eq!(spec.src_rect.unwrap().attr("l"), Some("10"));
    }

    #[test]
    fn test_linked_picture_has_no_embed() {
        let pic = XmlElement::parse(
            r#"<p:pic><p:blipFill><a:blip r:link="rId3"/></p:blipFill></p:pic>"#,
        )
        .unwrap();
        assert_eq!(image_r_id(&pic), None);
        assert!(PictureSpec::from_shape(&Shape::from_element(&pic).unwrap()).is_err());
    }
}
