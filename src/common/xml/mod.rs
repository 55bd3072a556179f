//! XML helpers shared by the package and presentation layers.

pub mod dom;
mod escape;

pub use dom::{DomError, XmlElement, XmlNode};
pub use escape::escape_xml;
