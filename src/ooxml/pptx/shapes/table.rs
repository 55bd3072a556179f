/// Table shape implementation for PowerPoint presentations.
///
/// Tables are DrawingML tables (`a:tbl`) inside a `p:graphicFrame`. For
/// copying, a table is read down to its grid, cell text, alignment and
/// merges; run formatting inside cells is not kept.
use crate::common::xml::XmlElement;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::shapes::textframe;

/// One cell of a [`TableSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellSpec {
    /// One entry per paragraph: its `algn` and its text.
    pub paragraphs: Vec<(Option<String>, String)>,
    /// Vertical anchoring (`t`, `ctr`, `b`).
    pub anchor: Option<String>,
    pub grid_span: Option<u32>,
    pub row_span: Option<u32>,
    pub h_merge: bool,
    pub v_merge: bool,
}

impl CellSpec {
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSpec {
    pub height: i64,
    pub cells: Vec<CellSpec>,
}

/// Grid and content of a table.
///
/// # Examples
///
/// ```rust,ignore
/// let table = TableSpec::from_graphic_frame(shape.element())?;
/// println!("Table: {}x{}", table.row_count(), table.column_count());
/// for row in &table.rows {
///     for cell in &row.cells {
///         println!("{}", cell.text());
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSpec {
    pub col_widths: Vec<i64>,
    pub rows: Vec<RowSpec>,
    /// `a:tableStyleId` of the source, if any.
    pub style_id: Option<String>,
}

impl TableSpec {
    /// Read the table inside a graphic frame.
    pub fn from_graphic_frame(frame: &XmlElement) -> Result<Self> {
        let tbl = frame
            .find(&["a:graphic", "a:graphicData", "a:tbl"])
            .ok_or_else(|| OoxmlError::InvalidFormat("graphic frame holds no table".to_string()))?;
        Ok(Self::from_tbl(tbl))
    }

    pub fn from_tbl(tbl: &XmlElement) -> Self {
        let int = |el: &XmlElement, key: &str| -> i64 {
            el.attr(key).and_then(|v| v.parse().ok()).unwrap_or(0)
        };
        let col_widths = tbl
            .child("a:tblGrid")
            .map(|grid| grid.children_named("a:gridCol").map(|col| int(col, "w")).collect())
            .unwrap_or_default();

        let rows = tbl
            .children_named("a:tr")
            .map(|tr| RowSpec {
                height: int(tr, "h"),
                cells: tr.children_named("a:tc").map(read_cell).collect(),
            })
            .collect();

        let style_id = tbl
            .find(&["a:tblPr", "a:tableStyleId"])
            .map(XmlElement::text)
            .filter(|id| !id.is_empty());

        Self {
            col_widths,
            rows,
            style_id,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.col_widths.len()
    }
}

fn read_cell(tc: &XmlElement) -> CellSpec {
    let flag = |key: &str| matches!(tc.attr(key), Some("1") | Some("true"));
    let span = |key: &str| tc.attr(key).and_then(|v| v.parse().ok());
    let paragraphs = tc
        .child("a:txBody")
        .map(|body| {
            body.children_named("a:p")
                .map(|p| {
                    let align = p
                        .child("a:pPr")
                        .and_then(|ppr| ppr.attr("algn"))
                        .map(str::to_string);
                    (align, textframe::paragraph_text(p))
                })
                .collect()
        })
        .unwrap_or_default();

    CellSpec {
        paragraphs,
        anchor: tc
            .child("a:tcPr")
            .and_then(|pr| pr.attr("anchor"))
            .map(str::to_string),
        grid_span: span("gridSpan"),
        row_span: span("rowSpan"),
        h_merge: flag("hMerge"),
        v_merge: flag("vMerge"),
    }
}
