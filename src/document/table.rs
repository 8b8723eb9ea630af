//! Table elements (w:tbl, w:tr, w:tc)

use crate::codec::{BlockLevel, ChildOrder, Decoder, Element, Registry, SchemaField, Slot};
use crate::document::{blocks_text, BlockContent, Paragraph};
use crate::error::Result;
use crate::xml::{
    attrs_within, get_attr, get_w_val, parse_attr, read_attributes, sole_w_val, write_val, RawXml,
    XmlWriter,
};
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// Register the table module for `w:tbl`
pub(crate) fn register(registry: &Registry) {
    registry.register_block(|name| {
        (name == "w:tbl").then(|| Box::new(Table::default()) as Box<dyn BlockLevel>)
    });
}

/// Table element (w:tbl)
#[derive(Debug, Default)]
pub struct Table {
    /// Table properties (w:tblPr), kept as-is
    pub properties: Option<RawXml>,
    /// Grid column definitions
    pub grid: Option<TableGrid>,
    /// Rows, and row-level elements such as custom XML wrappers
    pub content: Vec<TableContent>,
}

/// Child of w:tbl after properties and grid
#[derive(Debug)]
pub enum TableContent {
    Row(TableRow),
    Raw(RawXml),
}

/// Table grid (w:tblGrid)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableGrid {
    pub columns: Vec<GridColumn>,
    /// Revision info (w:tblGridChange)
    pub extras: Vec<RawXml>,
}

/// Grid column definition
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridColumn {
    /// Width in twips
    pub width: Option<i32>,
    /// Source element, when its attributes do not fit `width`; written instead
    pub raw: Option<RawXml>,
}

/// Table row (w:tr)
#[derive(Debug, Default)]
pub struct TableRow {
    /// Attributes (rsid*, w14:paraId), kept for round-trip
    pub attributes: Vec<(String, String)>,
    /// Property exceptions (w:tblPrEx)
    pub exceptions: Option<RawXml>,
    /// Row properties (w:trPr)
    pub properties: Option<RawXml>,
    pub content: Vec<RowContent>,
}

/// Child of w:tr after its properties
#[derive(Debug)]
pub enum RowContent {
    Cell(TableCell),
    Raw(RawXml),
}

/// Table cell (w:tc)
#[derive(Debug, Default)]
pub struct TableCell {
    /// Cell properties
    pub properties: Option<TableCellProperties>,
    /// Block content (paragraphs, nested tables)
    pub content: Vec<BlockContent>,
}

/// Vertical merge type
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VMerge {
    Restart,
    Continue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellField {
    Width,
    GridSpan,
    VMerge,
    VAlign,
}

impl SchemaField for CellField {
    fn rank(self) -> u16 {
        match self {
            CellField::Width => 1,
            CellField::GridSpan => 2,
            CellField::VMerge => 4,
            CellField::VAlign => 11,
        }
    }
}

/// Cell properties (w:tcPr)
#[derive(Clone, Debug, Default)]
pub struct TableCellProperties {
    /// Cell width
    pub width: Option<i32>,
    /// Width unit, "dxa" when not given
    pub width_type: Option<String>,
    /// Grid span (horizontal merge)
    pub grid_span: Option<u32>,
    /// Vertical merge
    pub v_merge: Option<VMerge>,
    /// Vertical alignment
    pub v_align: Option<String>,
    pub extras: Vec<RawXml>,
    order: ChildOrder<CellField>,
}

impl Table {
    /// Create a new table with the specified number of rows and columns
    pub fn new(rows: usize, cols: usize) -> Self {
        let content = (0..rows)
            .map(|_| TableContent::Row(TableRow::new((0..cols).map(|_| TableCell::new("")))))
            .collect();
        Table {
            grid: Some(TableGrid::with_columns(cols)),
            content,
            ..Default::default()
        }
    }

    /// Create a table from a 2D array of strings
    pub fn from_data<S: Into<String> + Clone>(data: &[&[S]]) -> Self {
        let content = data
            .iter()
            .map(|row| {
                TableContent::Row(TableRow::new(row.iter().map(|t| TableCell::new(t.clone()))))
            })
            .collect();
        let cols = data.first().map(|r| r.len()).unwrap_or(0);
        Table {
            grid: Some(TableGrid::with_columns(cols)),
            content,
            ..Default::default()
        }
    }

    /// Get all rows
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.content.iter().filter_map(|c| match c {
            TableContent::Row(row) => Some(row),
            TableContent::Raw(_) => None,
        })
    }

    fn rows_mut(&mut self) -> impl Iterator<Item = &mut TableRow> {
        self.content.iter_mut().filter_map(|c| match c {
            TableContent::Row(row) => Some(row),
            TableContent::Raw(_) => None,
        })
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    /// Number of columns (grid width, or widest row without a grid)
    pub fn column_count(&self) -> usize {
        match &self.grid {
            Some(grid) if !grid.columns.is_empty() => grid.columns.len(),
            _ => self.rows().map(TableRow::cell_count).max().unwrap_or(0),
        }
    }

    /// Get a cell
    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows().nth(row)?.cells().nth(col)
    }

    /// Get a mutable cell
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows_mut().nth(row)?.cell_mut(col)
    }

    /// Add a row
    pub fn add_row(&mut self, row: TableRow) {
        self.content.push(TableContent::Row(row));
    }

    /// Set the text of a cell, if it exists
    pub fn set_cell_text(&mut self, row: usize, col: usize, text: impl Into<String>) {
        if let Some(cell) = self.cell_mut(row, col) {
            cell.set_text(text);
        }
    }

    /// Text of the table: cells separated by tabs, rows by newlines
    pub fn text(&self) -> String {
        self.rows()
            .map(|row| row.cells().map(TableCell::text).collect::<Vec<_>>().join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Element for Table {
    fn decode(
        &mut self,
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()> {
        if empty {
            return Ok(());
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            match child.name().local_name().as_ref() {
                b"tblPr" if self.properties.is_none() => {
                    self.properties = Some(decoder.capture(&child, child_empty)?);
                }
                b"tblGrid" if self.grid.is_none() => {
                    self.grid = Some(TableGrid::decode(decoder, &child, child_empty)?);
                }
                b"tr" => {
                    let row = TableRow::decode(decoder, &child, child_empty)?;
                    self.content.push(TableContent::Row(row));
                }
                _ => {
                    self.content
                        .push(TableContent::Raw(decoder.capture(&child, child_empty)?));
                }
            }
        }

        Ok(())
    }

    fn encode(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("w:tbl")))?;

        // tblPr and tblGrid are mandatory in the schema
        match &self.properties {
            Some(props) => props.write_to(writer)?,
            None => writer.write_event(Event::Empty(BytesStart::new("w:tblPr")))?,
        }
        match &self.grid {
            Some(grid) => grid.write_to(writer)?,
            None => TableGrid::with_columns(self.column_count()).write_to(writer)?,
        }

        for content in &self.content {
            match content {
                TableContent::Row(row) => row.write_to(writer)?,
                TableContent::Raw(raw) => raw.write_to(writer)?,
            }
        }

        writer.write_event(Event::End(BytesEnd::new("w:tbl")))?;
        Ok(())
    }

    crate::element_any!();
}

impl BlockLevel for Table {}

impl TableGrid {
    /// Grid with `cols` columns of unspecified width
    pub fn with_columns(cols: usize) -> Self {
        TableGrid {
            columns: vec![GridColumn::default(); cols],
            extras: Vec::new(),
        }
    }

    fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut grid = TableGrid::default();
        if empty {
            return Ok(grid);
        }
        while let Some((child, child_empty)) = decoder.next_child(start)? {
            if child.name().local_name().as_ref() == b"gridCol" {
                let width = attrs_within(&child, &["w:w"])
                    .then(|| parse_attr(&child, "w:w"))
                    .flatten();
                let column = match width {
                    Some(width) => {
                        decoder.skip(&child, child_empty)?;
                        GridColumn { width, raw: None }
                    }
                    None => GridColumn {
                        width: None,
                        raw: Some(decoder.capture(&child, child_empty)?),
                    },
                };
                grid.columns.push(column);
            } else {
                grid.extras.push(decoder.capture(&child, child_empty)?);
            }
        }
        Ok(grid)
    }

    fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        if self.columns.is_empty() && self.extras.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("w:tblGrid")))?;
            return Ok(());
        }
        writer.write_event(Event::Start(BytesStart::new("w:tblGrid")))?;
        for col in &self.columns {
            if let Some(raw) = &col.raw {
                raw.write_to(writer)?;
                continue;
            }
            let mut elem = BytesStart::new("w:gridCol");
            if let Some(width) = col.width {
                elem.push_attribute(("w:w", width.to_string().as_str()));
            }
            writer.write_event(Event::Empty(elem))?;
        }
        for extra in &self.extras {
            extra.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:tblGrid")))?;
        Ok(())
    }
}

impl TableRow {
    /// Row with the given cells
    pub fn new(cells: impl IntoIterator<Item = TableCell>) -> Self {
        TableRow {
            content: cells.into_iter().map(RowContent::Cell).collect(),
            ..Default::default()
        }
    }

    /// Row with one text cell per entry
    pub fn from_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::new(texts.into_iter().map(TableCell::new))
    }

    /// Get all cells
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.content.iter().filter_map(|c| match c {
            RowContent::Cell(cell) => Some(cell),
            RowContent::Raw(_) => None,
        })
    }

    /// Number of cells
    pub fn cell_count(&self) -> usize {
        self.cells().count()
    }

    /// Get a mutable cell
    pub fn cell_mut(&mut self, index: usize) -> Option<&mut TableCell> {
        self.content
            .iter_mut()
            .filter_map(|c| match c {
                RowContent::Cell(cell) => Some(cell),
                RowContent::Raw(_) => None,
            })
            .nth(index)
    }

    /// Add a cell
    pub fn add_cell(&mut self, cell: TableCell) {
        self.content.push(RowContent::Cell(cell));
    }

    fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut row = TableRow {
            attributes: read_attributes(start)?,
            ..Default::default()
        };
        if empty {
            return Ok(row);
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            match child.name().local_name().as_ref() {
                b"tblPrEx" if row.exceptions.is_none() => {
                    row.exceptions = Some(decoder.capture(&child, child_empty)?);
                }
                b"trPr" if row.properties.is_none() => {
                    row.properties = Some(decoder.capture(&child, child_empty)?);
                }
                b"tc" => {
                    let cell = TableCell::decode(decoder, &child, child_empty)?;
                    row.content.push(RowContent::Cell(cell));
                }
                _ => {
                    row.content
                        .push(RowContent::Raw(decoder.capture(&child, child_empty)?));
                }
            }
        }

        Ok(row)
    }

    fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut start = BytesStart::new("w:tr");
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;

        if let Some(exceptions) = &self.exceptions {
            exceptions.write_to(writer)?;
        }
        if let Some(props) = &self.properties {
            props.write_to(writer)?;
        }
        for content in &self.content {
            match content {
                RowContent::Cell(cell) => cell.write_to(writer)?,
                RowContent::Raw(raw) => raw.write_to(writer)?,
            }
        }

        writer.write_event(Event::End(BytesEnd::new("w:tr")))?;
        Ok(())
    }
}

impl TableCell {
    /// Create a new cell with text
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let para = if text.is_empty() {
            Paragraph::default()
        } else {
            Paragraph::new(text)
        };
        TableCell {
            content: vec![BlockContent::Paragraph(para)],
            ..Default::default()
        }
    }

    /// Set the cell text (replaces all content with a single paragraph)
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content.clear();
        self.content.push(BlockContent::Paragraph(Paragraph::new(text)));
    }

    /// Add a paragraph to the cell
    pub fn add_paragraph(&mut self, para: Paragraph) {
        self.content.push(BlockContent::Paragraph(para));
    }

    /// Paragraphs directly in the cell
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(BlockContent::as_paragraph)
    }

    /// Text of the cell
    pub fn text(&self) -> String {
        blocks_text(&self.content)
    }

    /// Set cell width (in twips)
    pub fn set_width(&mut self, width: i32) {
        self.properties.get_or_insert_with(Default::default).width = Some(width);
    }

    /// Set horizontal merge (grid span)
    pub fn set_grid_span(&mut self, span: u32) {
        self.properties
            .get_or_insert_with(Default::default)
            .grid_span = Some(span);
    }

    /// Set vertical merge
    pub fn set_v_merge(&mut self, v_merge: VMerge) {
        self.properties.get_or_insert_with(Default::default).v_merge = Some(v_merge);
    }

    /// Set vertical alignment
    pub fn set_v_align(&mut self, align: impl Into<String>) {
        self.properties.get_or_insert_with(Default::default).v_align = Some(align.into());
    }

    fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut cell = TableCell::default();
        if empty {
            return Ok(cell);
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            if child.name().local_name().as_ref() == b"tcPr" && cell.properties.is_none() {
                cell.properties = Some(TableCellProperties::decode(decoder, &child, child_empty)?);
            } else {
                cell.content
                    .push(BlockContent::decode(decoder, &child, child_empty)?);
            }
        }

        Ok(cell)
    }

    fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("w:tc")))?;
        if let Some(props) = &self.properties {
            props.write_to(writer)?;
        }
        for block in &self.content {
            block.write_to(writer)?;
        }
        // A cell must end in a paragraph
        if self.content.is_empty() {
            Paragraph::default().write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:tc")))?;
        Ok(())
    }
}

impl TableCellProperties {
    fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut props = TableCellProperties::default();
        if empty {
            return Ok(props);
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            let field = match child.name().local_name().as_ref() {
                b"tcW" => decode_width(&child).map(|(width, width_type)| {
                    props.width = Some(width);
                    props.width_type = width_type;
                    CellField::Width
                }),
                b"gridSpan" => sole_w_val(&child)
                    .and_then(|v| v.parse().ok())
                    .map(|span| {
                        props.grid_span = Some(span);
                        CellField::GridSpan
                    }),
                b"vMerge" => decode_v_merge(&child).map(|merge| {
                    props.v_merge = Some(merge);
                    CellField::VMerge
                }),
                b"vAlign" => sole_w_val(&child).map(|align| {
                    props.v_align = Some(align);
                    CellField::VAlign
                }),
                _ => None,
            };

            match field {
                Some(field) => {
                    decoder.skip(&child, child_empty)?;
                    props.order.push_field(field);
                }
                None => {
                    props.order.push_extra(props.extras.len());
                    props.extras.push(decoder.capture(&child, child_empty)?);
                }
            }
        }

        Ok(props)
    }

    fn present(&self) -> Vec<CellField> {
        [
            (self.width.is_some(), CellField::Width),
            (self.grid_span.is_some(), CellField::GridSpan),
            (self.v_merge.is_some(), CellField::VMerge),
            (self.v_align.is_some(), CellField::VAlign),
        ]
        .into_iter()
        .filter_map(|(set, field)| set.then_some(field))
        .collect()
    }

    fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let present = self.present();
        if present.is_empty() && self.extras.is_empty() {
            return Ok(());
        }

        writer.write_event(Event::Start(BytesStart::new("w:tcPr")))?;
        for slot in self.order.resolve(&present, self.extras.len()) {
            match slot {
                Slot::Field(CellField::Width) => {
                    if let Some(width) = self.width {
                        let mut elem = BytesStart::new("w:tcW");
                        elem.push_attribute(("w:w", width.to_string().as_str()));
                        let width_type = self.width_type.as_deref().unwrap_or("dxa");
                        elem.push_attribute(("w:type", width_type));
                        writer.write_event(Event::Empty(elem))?;
                    }
                }
                Slot::Field(CellField::GridSpan) => {
                    if let Some(span) = self.grid_span {
                        write_val(writer, "w:gridSpan", &span.to_string())?;
                    }
                }
                Slot::Field(CellField::VMerge) => {
                    let mut elem = BytesStart::new("w:vMerge");
                    if self.v_merge == Some(VMerge::Restart) {
                        elem.push_attribute(("w:val", "restart"));
                    }
                    writer.write_event(Event::Empty(elem))?;
                }
                Slot::Field(CellField::VAlign) => {
                    if let Some(align) = &self.v_align {
                        write_val(writer, "w:vAlign", align)?;
                    }
                }
                Slot::Extra(i) => self.extras[i].write_to(writer)?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new("w:tcPr")))?;
        Ok(())
    }
}

/// Numeric `w:w` and optional `w:type` of a width element
fn decode_width(start: &BytesStart<'_>) -> Option<(i32, Option<String>)> {
    if !attrs_within(start, &["w:w", "w:type"]) {
        return None;
    }
    let width = get_attr(start, "w:w")?.parse().ok()?;
    Some((width, get_attr(start, "w:type")))
}

fn decode_v_merge(start: &BytesStart<'_>) -> Option<VMerge> {
    if !attrs_within(start, &["w:val"]) {
        return None;
    }
    match get_w_val(start).as_deref() {
        None => Some(VMerge::Continue),
        Some("restart") => Some(VMerge::Restart),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode_table(xml: &str) -> Table {
        let registry = Registry::with_builtins();
        let mut decoder = Decoder::new(xml.as_bytes(), &registry);
        let (start, empty) = decoder.root().unwrap();
        let mut table = Table::default();
        table.decode(&mut decoder, &start, empty).unwrap();
        table
    }

    fn encode(table: &Table) -> String {
        let mut writer = quick_xml::Writer::new(Vec::new());
        table.encode(&mut writer).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_table_from_data() {
        let table = Table::from_data(&[&["A", "B"][..], &["C", "D"][..]]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.cell(1, 0).unwrap().text(), "C");
        assert_eq!(table.text(), "A\tB\nC\tD");
    }

    #[test]
    fn test_build_rows_and_cells() {
        let mut table = Table::new(1, 2);
        table.set_cell_text(0, 1, "B");
        table.set_cell_text(5, 5, "ignored");
        let mut row = TableRow::from_texts(["C"]);
        let mut cell = TableCell::new("D");
        cell.set_width(1440);
        row.add_cell(cell);
        table.add_row(row);

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.text(), "\tB\nC\tD");

        let out = encode(&table);
        assert!(out.contains(r#"<w:tcPr><w:tcW w:w="1440" w:type="dxa"/></w:tcPr>"#));
    }

    #[test]
    fn test_nested_table_and_cell_properties() {
        let xml = concat!(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="Grid"/></w:tblPr><w:tblGrid><w:gridCol w:w="2000"/></w:tblGrid>"#,
            r#"<w:tr w:rsidR="00A1"><w:trPr><w:cantSplit/></w:trPr><w:tc><w:tcPr><w:tcW w:w="2000" w:type="pct"/><w:shd w:fill="EEEEEE"/><w:vAlign w:val="center"/></w:tcPr>"#,
            r#"<w:tbl><w:tblPr/><w:tblGrid/><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p/></w:tc></w:tr></w:tbl>"#
        );
        let table = decode_table(xml);

        let cell = table.cell(0, 0).unwrap();
        let props = cell.properties.as_ref().unwrap();
        assert_eq!(props.width, Some(2000));
        assert_eq!(props.v_align.as_deref(), Some("center"));
        let nested = cell.content[0].as_table().unwrap();
        assert_eq!(nested.cell(0, 0).unwrap().text(), "inner");

        assert_eq!(encode(&table), xml);
    }

    #[test]
    fn test_non_numeric_widths_stay_verbatim() {
        let xml = concat!(
            r#"<w:tbl><w:tblPr/><w:tblGrid><w:gridCol w:w="1in"/><w:gridCol w:w="3000"/></w:tblGrid>"#,
            r#"<w:tr><w:tc><w:tcPr><w:tcW w:w="50%" w:type="pct"/><w:gridSpan w:val="two"/>"#,
            r#"<w:vMerge w:val="continue"/><w:vAlign w:val="center"/></w:tcPr><w:p/></w:tc></w:tr></w:tbl>"#
        );
        let table = decode_table(xml);

        let grid = table.grid.as_ref().unwrap();
        assert_eq!(grid.columns.len(), 2);
        assert_eq!(grid.columns[0].width, None);
        assert!(grid.columns[0].raw.is_some());
        assert_eq!(grid.columns[1].width, Some(3000));

        let props = table.cell(0, 0).unwrap().properties.as_ref().unwrap();
        assert_eq!(props.width, None);
        assert_eq!(props.grid_span, None);
        assert_eq!(props.v_merge, None);
        assert_eq!(props.v_align.as_deref(), Some("center"));
        assert_eq!(props.extras.len(), 3);

        assert_eq!(encode(&table), xml);
    }

    #[test]
    fn test_merge_setters_write_in_schema_order() {
        let mut table = Table::new(1, 1);
        let cell = table.cell_mut(0, 0).unwrap();
        cell.set_v_align("bottom");
        cell.set_v_merge(VMerge::Restart);
        cell.set_grid_span(2);

        let out = encode(&table);
        assert!(out.contains(
            r#"<w:tcPr><w:gridSpan w:val="2"/><w:vMerge w:val="restart"/><w:vAlign w:val="bottom"/></w:tcPr>"#
        ));
    }
}
