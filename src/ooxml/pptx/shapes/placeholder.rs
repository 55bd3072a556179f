//! Placeholder references (`p:ph`) and their field names.

use crate::common::xml::XmlElement;
use phf::phf_map;
use std::borrow::Cow;

/// ST_PlaceholderType values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderType {
    Title,
    CenterTitle,
    Subtitle,
    Body,
    Object,
    Chart,
    Table,
    Picture,
    MediaClip,
    OrgChart,
    Date,
    Footer,
    SlideNumber,
    Header,
    ClipArt,
    SlideImage,
}

static PLACEHOLDER_TYPES: phf::Map<&'static str, PlaceholderType> = phf_map! {
    "title" => PlaceholderType::Title,
    "ctrTitle" => PlaceholderType::CenterTitle,
    "subTitle" => PlaceholderType::Subtitle,
    "body" => PlaceholderType::Body,
    "obj" => PlaceholderType::Object,
    "chart" => PlaceholderType::Chart,
    "tbl" => PlaceholderType::Table,
    "pic" => PlaceholderType::Picture,
    "media" => PlaceholderType::MediaClip,
    "dgm" => PlaceholderType::OrgChart,
    "dt" => PlaceholderType::Date,
    "ftr" => PlaceholderType::Footer,
    "sldNum" => PlaceholderType::SlideNumber,
    "hdr" => PlaceholderType::Header,
    "clipArt" => PlaceholderType::ClipArt,
    "sldImg" => PlaceholderType::SlideImage,
};

impl PlaceholderType {
    pub fn from_attr(value: &str) -> Option<Self> {
        PLACEHOLDER_TYPES.get(value).copied()
    }

    /// Friendly field name. Both title kinds share `TITLE`, and the generic
    /// content placeholder is `CONTENT`.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Title | Self::CenterTitle => "TITLE",
            Self::Subtitle => "SUBTITLE",
            Self::Body => "BODY",
            Self::Object => "CONTENT",
            Self::Chart => "CHART",
            Self::Table => "TABLE",
            Self::Picture => "PICTURE",
            Self::MediaClip => "MEDIA",
            Self::OrgChart => "ORG_CHART",
            Self::Date => "DATE",
            Self::Footer => "FOOTER",
            Self::SlideNumber => "SLIDE_NUMBER",
            Self::Header => "HEADER",
            Self::ClipArt => "CLIP_ART",
            Self::SlideImage => "SLIDE_IMAGE",
        }
    }

    #[inline]
    pub fn is_title(self) -> bool {
        matches!(self, Self::Title | Self::CenterTitle)
    }

    /// The master placeholder a layout placeholder of this type inherits
    /// from. Masters only carry title, body, date, footer and slide number.
    pub fn master_type(self) -> Self {
        match self {
            Self::Title | Self::CenterTitle => Self::Title,
            Self::Date | Self::Footer | Self::SlideNumber => self,
            _ => Self::Body,
        }
    }
}

/// A parsed `p:ph` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    /// `None` for a type value this crate does not know.
    pub ph_type: Option<PlaceholderType>,
    pub idx: u32,
}

impl PlaceholderRef {
    /// A missing `type` attribute means `obj`.
    pub fn from_element(ph: &XmlElement) -> Self {
        let ph_type = match ph.attr("type") {
            Some(value) => PlaceholderType::from_attr(value),
            None => Some(PlaceholderType::Object),
        };
        let idx = ph.attr("idx").and_then(|v| v.parse().ok()).unwrap_or(0);
        Self { ph_type, idx }
    }

    /// Field name before duplicate numbering.
    pub fn base_field_name(&self) -> Cow<'static, str> {
        match self.ph_type {
            Some(t) => Cow::Borrowed(t.field_name()),
            None => Cow::Owned(format!("PLACEHOLDER_{}", self.idx)),
        }
    }

    /// Whether `self` (on a slide) inherits from `other` (on its layout).
    ///
    /// Layout placeholders are found by idx; a type match is the fallback
    /// for decks whose slide placeholders lost their idx.
    pub fn matches_layout(&self, other: &PlaceholderRef) -> bool {
        if self.idx != 0 || other.idx != 0 {
            return self.idx == other.idx;
        }
        self.ph_type == other.ph_type
            || matches!((self.ph_type, other.ph_type), (Some(a), Some(b)) if a.is_title() && b.is_title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_type_is_content() {
        let ph = XmlElement::new("p:ph").with_attr("idx", "1");
        let ph = PlaceholderRef::from_element(&ph);
        assert_eq!(ph.ph_type, Some(PlaceholderType::Object));
        assert_eq!(ph.base_field_name(), "CONTENT");
    }

    #[test]
    fn test_field_names() {
        let name = |t: &str| {
            PlaceholderRef::from_element(&XmlElement::new("p:ph").with_attr("type", t).with_attr("idx", "7"))
                .base_field_name()
                .into_owned()
        };
        assert_eq!(name("ctrTitle"), "TITLE");
        assert_eq!(name("title"), "TITLE");
        assert_eq!(name("subTitle"), "SUBTITLE");
        assert_eq!(name("sldNum"), "SLIDE_NUMBER");
        assert_eq!(name("dgm"), "ORG_CHART");
        assert_eq!(name("media"), "MEDIA");
        assert_eq!(name("somethingNew"), "PLACEHOLDER_7");
    }

    #[test]
    fn test_layout_matching() {
        let ph = |t: Option<&str>, idx: &str| {
            let mut el = XmlElement::new("p:ph").with_attr("idx", idx);
            if let Some(t) = t {
                el.set_attr("type", t);
            }
            PlaceholderRef::from_element(&el)
        };
        assert!(ph(None, "1").matches_layout(&ph(Some("body"), "1")));
        assert!(!ph(None, "1").matches_layout(&ph(None, "2")));
        assert!(ph(Some("title"), "0").matches_layout(&ph(Some("ctrTitle"), "0")));
        assert!(!ph(Some("title"), "0").matches_layout(&ph(Some("dt"), "0")));
    }

    #[test]
    fn test_master_type() {
        assert_eq!(PlaceholderType::CenterTitle.master_type(), PlaceholderType::Title);
        assert_eq!(PlaceholderType::Subtitle.master_type(), PlaceholderType::Body);
        assert_eq!(PlaceholderType::Footer.master_type(), PlaceholderType::Footer);
    }
}
