//! Slide background support for PowerPoint presentations.
//!
//! This module reads `p:bg` elements into concrete fills (solid colors,
//! gradients, images and patterns) with theme colors resolved, and writes
//! them back out for another slide.

use crate::common::xml::{XmlElement, escape_xml};
use crate::ooxml::error::Result;
use crate::ooxml::pptx::parts::theme::ColorContext;
use std::fmt::Write as FmtWrite;

/// Slide background configuration.
///
/// Represents the background fill for a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideBackground {
    /// No background (transparent)
    None,
    /// Solid color background
    Solid {
        /// RGB color in hexadecimal format (e.g., "FFFFFF" for white)
        color: String,
    },
    /// Gradient background
    Gradient {
        /// Gradient type (linear or radial)
        gradient_type: GradientType,
        /// Gradient angle in degrees (0-360, for linear gradients)
        angle: Option<f64>,
        /// Gradient stops (position 0.0-1.0, color pairs)
        stops: Vec<GradientStop>,
    },
    /// Picture/image background
    Picture {
        /// rId of the image in the part the background was read from
        r_id: String,
        /// How the image should be displayed
        style: PictureStyle,
    },
    /// Pattern background
    Pattern {
        /// Preset name (`pct50`, `dkHorz`, ...)
        preset: String,
        /// Foreground color
        fg_color: String,
        /// Background color
        bg_color: String,
    },
}

/// Gradient type for gradient backgrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientType {
    /// Linear gradient
    Linear,
    /// Radial gradient (from center)
    Radial,
    /// Rectangular gradient
    Rectangular,
    /// Path gradient
    Path,
}

impl GradientType {
    fn path_attr(self) -> Option<&'static str> {
        match self {
            GradientType::Linear => None,
            GradientType::Radial => Some("circle"),
            GradientType::Rectangular => Some("rect"),
            GradientType::Path => Some("shape"),
        }
    }
}

/// A gradient stop (position and color).
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// Position from 0.0 to 1.0
    pub position: f64,
    /// RGB color in hex format
    pub color: String,
}

/// Picture display style for picture backgrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureStyle {
    /// Stretch to fill the slide
    Stretch,
    /// Tile the image
    Tile,
}

/// First color element (`a:srgbClr`, `a:schemeClr`, ...) among the children.
fn color_child(el: &XmlElement) -> Option<&XmlElement> {
    el.elements().find(|child| child.local_name().ends_with("Clr"))
}

impl SlideBackground {
    /// Read a `p:bg` element.
    ///
    /// Theme colors are resolved through `colors`. A fill whose color
    /// cannot be resolved gives `None`, as does a background that is
    /// neither `p:bgPr` nor `p:bgRef`.
    pub fn from_bg(bg: &XmlElement, colors: &ColorContext) -> Option<Self> {
        if let Some(bg_ref) = bg.child("p:bgRef") {
            // A style reference; the theme's background fills are almost
            // always a solid tinted by the reference color.
            let color = colors.resolve_rgb(color_child(bg_ref)?)?;
            return Some(SlideBackground::Solid { color });
        }

        let bg_pr = bg.child("p:bgPr")?;
        let fill = bg_pr.elements().next()?;
        match fill.local_name() {
            "noFill" => Some(SlideBackground::None),
            "solidFill" => {
                let color = colors.resolve_rgb(color_child(fill)?)?;
                Some(SlideBackground::Solid { color })
            },
            "gradFill" => Self::parse_gradient(fill, colors),
            "blipFill" => Self::parse_picture(fill),
            "pattFill" => Self::parse_pattern(fill, colors),
            _ => None,
        }
    }

    fn parse_gradient(grad_fill: &XmlElement, colors: &ColorContext) -> Option<Self> {
        let stops: Vec<GradientStop> = grad_fill
            .child("a:gsLst")
            .map(|lst| {
                lst.children_named("a:gs")
                    .filter_map(|gs| {
                        // Position is in percentage * 1000
                        let position = gs
                            .attr("pos")
                            .and_then(|pos| pos.parse::<f64>().ok())
                            .map(|pos| pos / 100000.0)
                            .unwrap_or(0.0);
                        let color = colors.resolve_rgb(color_child(gs)?)?;
                        Some(GradientStop { position, color })
                    })
                    .collect()
            })
            .unwrap_or_default();
        if stops.is_empty() {
            return None;
        }

        let mut gradient_type = GradientType::Linear;
        let mut angle = None;
        if let Some(lin) = grad_fill.child("a:lin") {
            // Angle is in 60,000ths of a degree
            angle = lin
                .attr("ang")
                .and_then(|ang| ang.parse::<f64>().ok())
                .map(|ang| ang / 60000.0);
        } else if let Some(path) = grad_fill.child("a:path") {
            gradient_type = match path.attr("path") {
                Some("circle") => GradientType::Radial,
                Some("rect") => GradientType::Rectangular,
                Some("shape") => GradientType::Path,
                _ => GradientType::Linear,
            };
        }

        Some(SlideBackground::Gradient {
            gradient_type,
            angle,
            stops,
        })
    }

    fn parse_picture(blip_fill: &XmlElement) -> Option<Self> {
        let r_id = blip_fill.child("a:blip")?.attr("r:embed")?;
        let style = if blip_fill.child("a:tile").is_some() {
            PictureStyle::Tile
        } else {
            PictureStyle::Stretch
        };
        Some(SlideBackground::Picture {
            r_id: r_id.to_string(),
            style,
        })
    }

    fn parse_pattern(patt_fill: &XmlElement, colors: &ColorContext) -> Option<Self> {
        let resolve = |name: &str, default: &str| {
            patt_fill
                .child(name)
                .and_then(color_child)
                .and_then(|color| colors.resolve_rgb(color))
                .unwrap_or_else(|| default.to_string())
        };
        Some(SlideBackground::Pattern {
            preset: patt_fill.attr("prst").unwrap_or("pct50").to_string(),
            fg_color: resolve("a:fgClr", "000000"),
            bg_color: resolve("a:bgClr", "FFFFFF"),
        })
    }

    /// The image rId a picture background depends on.
    pub fn image_r_id(&self) -> Option<&str> {
        match self {
            SlideBackground::Picture { r_id, .. } => Some(r_id),
            _ => None,
        }
    }

    /// Generate the `p:bg` element XML.
    ///
    /// `rel_id` replaces the image rId of a picture background, since the
    /// image is usually registered under a different id on the target.
    pub fn to_xml(&self, rel_id: Option<&str>) -> Result<String> {
        let mut xml = String::with_capacity(512);
        xml.push_str("<p:bg><p:bgPr>");

        match self {
            SlideBackground::None => {
                xml.push_str("<a:noFill/>");
            },
            SlideBackground::Solid { color } => {
                write!(
                    xml,
                    r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
                    escape_xml(color)
                )?;
            },
            SlideBackground::Gradient {
                gradient_type,
                angle,
                stops,
            } => {
                xml.push_str(r#"<a:gradFill rotWithShape="1"><a:gsLst>"#);
                for stop in stops {
                    write!(
                        xml,
                        r#"<a:gs pos="{}"><a:srgbClr val="{}"/></a:gs>"#,
                        (stop.position * 100000.0).round() as i64,
                        escape_xml(&stop.color)
                    )?;
                }
                xml.push_str("</a:gsLst>");
                match gradient_type.path_attr() {
                    None => write!(
                        xml,
                        r#"<a:lin ang="{}" scaled="0"/>"#,
                        (angle.unwrap_or(0.0) * 60000.0).round() as i64
                    )?,
                    Some(path) => write!(
                        xml,
                        r#"<a:path path="{}"><a:fillToRect l="50000" t="50000" r="50000" b="50000"/></a:path>"#,
                        path
                    )?,
                }
                xml.push_str("</a:gradFill>");
            },
            SlideBackground::Picture { r_id, style } => {
                let r_id = rel_id.unwrap_or(r_id);
                write!(
                    xml,
                    r#"<a:blipFill dpi="0" rotWithShape="1"><a:blip r:embed="{}"/><a:srcRect/>"#,
                    escape_xml(r_id)
                )?;
                match style {
                    PictureStyle::Stretch => xml.push_str("<a:stretch><a:fillRect/></a:stretch>"),
                    PictureStyle::Tile => xml.push_str(
                        r#"<a:tile tx="0" ty="0" sx="100000" sy="100000" flip="none" algn="tl"/>"#,
                    ),
                }
                xml.push_str("</a:blipFill>");
            },
            SlideBackground::Pattern {
                preset,
                fg_color,
                bg_color,
            } => {
                write!(
                    xml,
                    r#"<a:pattFill prst="{}"><a:fgClr><a:srgbClr val="{}"/></a:fgClr><a:bgClr><a:srgbClr val="{}"/></a:bgClr></a:pattFill>"#,
                    escape_xml(preset),
                    escape_xml(fg_color),
                    escape_xml(bg_color)
                )?;
            },
        }

        xml.push_str("<a:effectLst/></p:bgPr></p:bg>");
        Ok(xml)
    }

    /// [`to_xml`](Self::to_xml) parsed into an element.
    pub fn to_element(&self, rel_id: Option<&str>) -> Result<XmlElement> {
        Ok(XmlElement::parse(&self.to_xml(rel_id)?)?)
    }
}
