//! Shape XML written onto slides.

pub mod shape;

pub use shape::{picture_xml, table_xml, text_box_xml};
