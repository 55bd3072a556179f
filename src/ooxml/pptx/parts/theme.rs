/// Theme parts and theme color resolution.
///
/// A theme part carries the color scheme that `a:schemeClr` references point
/// into. Which scheme slot a reference lands on depends on the master's
/// `p:clrMap` (and any slide override), so resolution needs both; see
/// [`ColorContext`].
use crate::common::xml::{XmlElement, XmlNode, escape_xml};
use crate::ooxml::error::Result;
use std::fmt::Write as FmtWrite;

/// Scheme slots in the order they appear in `a:clrScheme`.
pub const SCHEME_SLOTS: [&str; 12] = [
    "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// The twelve theme colors, as `RRGGBB` hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    name: String,
    colors: [String; 12],
}

impl ColorScheme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colors: [
                "000000", "FFFFFF", "44546A", "E7E6E6", "4472C4", "ED7D31", "A5A5A5", "FFC000",
                "5B9BD5", "70AD47", "0563C1", "954F72",
            ]
            .map(str::to_string),
        }
    }

    /// The default Office color scheme.
    pub fn office() -> Self {
        Self::new("Office")
    }

    /// Read the scheme out of an `a:clrScheme` element.
    ///
    /// Slots missing from the element keep their Office default. System
    /// colors contribute their `lastClr`.
    pub fn from_element(clr_scheme: &XmlElement) -> Self {
        let mut scheme = Self::new(clr_scheme.attr("name").unwrap_or("Office"));
        for slot_el in clr_scheme.elements() {
            let Some(pos) = SCHEME_SLOTS.iter().position(|s| *s == slot_el.local_name()) else {
                continue;
            };
            if let Some(rgb) = slot_el.elements().find_map(literal_rgb) {
                scheme.colors[pos] = rgb;
            }
        }
        scheme
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hex value of a scheme slot such as `accent1` or `dk2`.
    pub fn get(&self, slot: &str) -> Option<&str> {
        SCHEME_SLOTS
            .iter()
            .position(|s| *s == slot)
            .map(|pos| self.colors[pos].as_str())
    }

    pub fn set(&mut self, slot: &str, rgb: impl Into<String>) {
        if let Some(pos) = SCHEME_SLOTS.iter().position(|s| *s == slot) {
            self.colors[pos] = rgb.into();
        }
    }

    fn write_xml(&self, xml: &mut String) -> Result<()> {
        write!(xml, r#"<a:clrScheme name="{}">"#, escape_xml(&self.name))?;
        for (slot, rgb) in SCHEME_SLOTS.iter().zip(&self.colors) {
            match *slot {
                "dk1" => write!(
                    xml,
                    r#"<a:dk1><a:sysClr val="windowText" lastClr="{}"/></a:dk1>"#,
                    rgb
                )?,
                "lt1" => write!(
                    xml,
                    r#"<a:lt1><a:sysClr val="window" lastClr="{}"/></a:lt1>"#,
                    rgb
                )?,
                _ => write!(xml, r#"<a:{0}><a:srgbClr val="{1}"/></a:{0}>"#, slot, rgb)?,
            }
        }
        xml.push_str("</a:clrScheme>");
        Ok(())
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::office()
    }
}

/// Theme name, fonts and colors.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub major_font: String,
    pub minor_font: String,
    pub color_scheme: ColorScheme,
}

impl Theme {
    pub fn office() -> Self {
        Self {
            name: "Office Theme".to_string(),
            major_font: "Calibri Light".to_string(),
            minor_font: "Calibri".to_string(),
            color_scheme: ColorScheme::office(),
        }
    }

    /// Parse a theme part.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let root = XmlElement::parse_bytes(xml)?;
        let mut theme = Self::office();
        if let Some(name) = root.attr("name") {
            theme.name = name.to_string();
        }
        if let Some(scheme) = root.find(&["a:themeElements", "a:clrScheme"]) {
            theme.color_scheme = ColorScheme::from_element(scheme);
        }
        let typeface = |font: &str| {
            root.find(&["a:themeElements", "a:fontScheme", font, "a:latin"])
                .and_then(|latin| latin.attr("typeface"))
                .map(str::to_string)
        };
        if let Some(major) = typeface("a:majorFont") {
            theme.major_font = major;
        }
        if let Some(minor) = typeface("a:minorFont") {
            theme.minor_font = minor;
        }
        Ok(theme)
    }

    /// Serialize as a complete `theme1.xml` document.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str("\r\n");
        xml.push_str(r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#);
        write!(xml, r#"name="{}">"#, escape_xml(&self.name))?;
        xml.push_str("<a:themeElements>");

        self.color_scheme.write_xml(&mut xml)?;

        xml.push_str(r#"<a:fontScheme name="Office">"#);
        for (tag, typeface) in [("a:majorFont", &self.major_font), ("a:minorFont", &self.minor_font)] {
            write!(
                xml,
                r#"<{0}><a:latin typeface="{1}"/><a:ea typeface=""/><a:cs typeface=""/></{0}>"#,
                tag,
                escape_xml(typeface)
            )?;
        }
        xml.push_str("</a:fontScheme>");

        xml.push_str(r#"<a:fmtScheme name="Office">"#);
        xml.push_str("<a:fillStyleLst>");
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
        xml.push_str(r#"<a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:lumMod val="110000"/><a:satMod val="105000"/><a:tint val="67000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:lumMod val="105000"/><a:satMod val="109000"/><a:tint val="81000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="5400000" scaled="0"/></a:gradFill>"#);
        xml.push_str(r#"<a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:satMod val="103000"/><a:lumMod val="102000"/><a:tint val="94000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:lumMod val="99000"/><a:satMod val="120000"/><a:shade val="78000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="5400000" scaled="0"/></a:gradFill>"#);
        xml.push_str("</a:fillStyleLst>");
        xml.push_str("<a:lnStyleLst>");
        for width in [6350, 12700, 19050] {
            write!(
                xml,
                r#"<a:ln w="{}" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/><a:miter lim="800000"/></a:ln>"#,
                width
            )?;
        }
        xml.push_str("</a:lnStyleLst>");
        xml.push_str("<a:effectStyleLst>");
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
        xml.push_str(r#"<a:effectStyle><a:effectLst><a:outerShdw blurRad="57150" dist="19050" dir="5400000" algn="ctr" rotWithShape="0"><a:srgbClr val="000000"><a:alpha val="63000"/></a:srgbClr></a:outerShdw></a:effectLst></a:effectStyle>"#);
        xml.push_str("</a:effectStyleLst>");
        xml.push_str("<a:bgFillStyleLst>");
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"><a:tint val="95000"/><a:satMod val="170000"/></a:schemeClr></a:solidFill>"#);
        xml.push_str(r#"<a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="93000"/><a:satMod val="150000"/><a:shade val="98000"/><a:lumMod val="102000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="63000"/><a:satMod val="120000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="5400000" scaled="0"/></a:gradFill>"#);
        xml.push_str("</a:bgFillStyleLst>");
        xml.push_str("</a:fmtScheme>");

        xml.push_str("</a:themeElements>");
        xml.push_str("<a:objectDefaults/>");
        xml.push_str("<a:extraClrSchemeLst/>");
        xml.push_str("</a:theme>");

        Ok(xml)
    }
}

/// Mapping from logical color names (`bg1`, `tx1`, ...) to scheme slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
    entries: Vec<(String, String)>,
}

impl ColorMap {
    /// Read a `p:clrMap` or `a:overrideClrMapping` element.
    pub fn from_element(clr_map: &XmlElement) -> Self {
        let mut map = Self::default();
        for (key, value) in clr_map.attrs() {
            map.set(key, value);
        }
        map
    }

    fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    /// Scheme slot for a logical name. Names that are already slots map to
    /// themselves.
    pub fn slot<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or(name)
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        let mut map = Self {
            entries: Vec::with_capacity(12),
        };
        for (key, value) in [("bg1", "lt1"), ("tx1", "dk1"), ("bg2", "lt2"), ("tx2", "dk2")] {
            map.set(key, value);
        }
        map
    }
}

/// Everything needed to turn a DrawingML color reference into RGB.
#[derive(Debug, Clone, Default)]
pub struct ColorContext {
    scheme: ColorScheme,
    map: ColorMap,
}

impl ColorContext {
    pub fn new(scheme: ColorScheme, map: ColorMap) -> Self {
        Self { scheme, map }
    }

    pub fn scheme(&self) -> &ColorScheme {
        &self.scheme
    }

    /// RGB hex of one color element (`a:srgbClr`, `a:schemeClr`, ...).
    ///
    /// Transforms such as `lumMod` are not applied; `phClr` and `hslClr`
    /// do not resolve.
    pub fn resolve_rgb(&self, color: &XmlElement) -> Option<String> {
        if color.local_name() == "schemeClr" {
            let name = color.attr("val")?;
            return self.scheme.get(self.map.slot(name)).map(str::to_string);
        }
        literal_rgb(color)
    }

    /// Rewrite a fill (`a:solidFill`, a gradient stop, ...) so its color is
    /// an explicit `a:srgbClr`.
    ///
    /// Color transforms on the original element are carried over. A color
    /// that cannot be resolved is kept in its original form, so the result
    /// always carries a color.
    pub fn resolve_fill(&self, fill: &XmlElement) -> XmlElement {
        let mut resolved = fill.clone();
        for node in resolved.children_mut().iter_mut() {
            let XmlNode::Element(color) = node else {
                continue;
            };
            if color.local_name() == "srgbClr" {
                continue;
            }
            if let Some(rgb) = self.resolve_rgb(color) {
                let mut srgb = XmlElement::new("a:srgbClr").with_attr("val", rgb);
                for transform in color.elements() {
                    srgb.push(transform.clone());
                }
                *color = srgb;
            }
        }
        resolved
    }
}

/// RGB of a color element that does not depend on the theme.
fn literal_rgb(color: &XmlElement) -> Option<String> {
    match color.local_name() {
        "srgbClr" => color.attr("val").map(|v| v.to_ascii_uppercase()),
        "sysClr" => color.attr("lastClr").map(|v| v.to_ascii_uppercase()),
        "prstClr" => preset_rgb(color.attr("val")?).map(str::to_string),
        "scrgbClr" => {
            let channel = |key: &str| -> Option<u8> {
                let pct: f64 = color.attr(key)?.trim_end_matches('%').parse().ok()?;
                let pct = if pct > 100.0 { pct / 1000.0 } else { pct };
                Some((pct.clamp(0.0, 100.0) * 2.55).round() as u8)
            };
            Some(format!("{:02X}{:02X}{:02X}", channel("r")?, channel("g")?, channel("b")?))
        },
        _ => None,
    }
}

fn preset_rgb(name: &str) -> Option<&'static str> {
    Some(match name {
        "black" => "000000",
        "white" => "FFFFFF",
        "red" => "FF0000",
        "green" => "008000",
        "blue" => "0000FF",
        "yellow" => "FFFF00",
        "gray" | "grey" => "808080",
        "darkGray" => "A9A9A9",
        "lightGray" => "D3D3D3",
        "navy" => "000080",
        "orange" => "FFA500",
        "purple" => "800080",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const THEME: &str = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Kerk">
        <a:themeElements>
            <a:clrScheme name="Kerk">
                <a:dk1><a:sysClr val="windowText" lastClr="111111"/></a:dk1>
                <a:lt1><a:srgbClr val="fafafa"/></a:lt1>
                <a:accent1><a:srgbClr val="8B0000"/></a:accent1>
            </a:clrScheme>
            <a:fontScheme name="Kerk">
                <a:majorFont><a:latin typeface="Georgia"/></a:majorFont>
                <a:minorFont><a:latin typeface="Verdana"/></a:minorFont>
            </a:fontScheme>
        </a:themeElements>
    </a:theme>"#;

    #[test]
    fn test_parse_theme() {
        let theme = Theme::from_xml(THEME.as_bytes()).unwrap();
        assert_eq!(theme.name, "Kerk");
        assert_eq!(theme.major_font, "Georgia");
        assert_eq!(theme.minor_font, "Verdana");
        assert_eq!(theme.color_scheme.get("dk1"), Some("111111"));
        assert_eq!(theme.color_scheme.get("lt1"), Some("FAFAFA"));
        assert_eq!(theme.color_scheme.get("accent1"), Some("8B0000"));
        // Missing slots fall back to Office
        assert_eq!(theme.color_scheme.get("accent2"), Some("ED7D31"));
    }

    #[test]
    fn test_theme_xml_round_trip() {
        let mut theme = Theme::office();
        theme.color_scheme.set("accent3", "123456");
        let xml = theme.to_xml().unwrap();
        assert!(xml.contains("a:fmtScheme"));

        let parsed = Theme::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(parsed.color_scheme, theme.color_scheme);
        assert_eq!(parsed.major_font, "Calibri Light");
    }

    #[test]
    fn test_scheme_color_goes_through_map() {
        let ctx = ColorContext::new(
            Theme::from_xml(THEME.as_bytes()).unwrap().color_scheme,
            ColorMap::default(),
        );
        let tx1 = XmlElement::new("a:schemeClr").with_attr("val", "tx1");
        assert_eq!(ctx.resolve_rgb(&tx1).as_deref(), Some("111111"));

        let inverted = ColorMap::from_element(
            &XmlElement::new("p:clrMap")
                .with_attr("bg1", "dk1")
                .with_attr("tx1", "lt1"),
        );
        let ctx = ColorContext::new(ctx.scheme().clone(), inverted);
        assert_eq!(ctx.resolve_rgb(&tx1).as_deref(), Some("FAFAFA"));
    }

    #[test]
    fn test_resolve_fill_keeps_transforms() {
        let ctx = ColorContext::default();
        let fill = XmlElement::parse(
            r#"<a:solidFill><a:schemeClr val="accent1"><a:lumMod val="75000"/></a:schemeClr></a:solidFill>"#,
        )
        .unwrap();
        let resolved = ctx.resolve_fill(&fill);
        let srgb = resolved.child("a:srgbClr").unwrap();
        assert_eq!(srgb.attr("val"), Some("4472C4"));
        assert!(srgb.child("a:lumMod").is_some());
    }

    #[test]
    fn test_unresolvable_fill_is_kept() {
        let ctx = ColorContext::default();
        let fill = XmlElement::parse(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#).unwrap();
        let resolved = ctx.resolve_fill(&fill);
        assert_eq!(resolved.child("a:schemeClr").unwrap().attr("val"), Some("phClr"));
    }

    #[test]
    fn test_literal_colors() {
        let sys = XmlElement::new("a:sysClr").with_attr("val", "window").with_attr("lastClr", "ffffff");
        assert_eq!(literal_rgb(&sys).as_deref(), Some("FFFFFF"));
        let prst = XmlElement::new("a:prstClr").with_attr("val", "black");
        assert_eq!(literal_rgb(&prst).as_deref(), Some("000000"));
        let hsl = XmlElement::new("a:hslClr");
        assert_eq!(literal_rgb(&hsl), None);
    }
}
