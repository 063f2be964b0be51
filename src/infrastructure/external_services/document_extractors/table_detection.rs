use csv::{Terminator, WriterBuilder};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Encoding, Object, ObjectId};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::application::ports::document_extractor::DocumentExtractionError;
use crate::domain::entities::Chunk;

/// Fragments whose baselines differ by at most this much share a row.
const ROW_TOLERANCE: f32 = 2.0;
/// Cells of consecutive rows must start within this distance to form a column.
const COLUMN_TOLERANCE: f32 = 10.0;
const MIN_COLUMNS: usize = 2;
const MIN_ROWS: usize = 2;
/// A `TJ` adjustment at or beyond this (thousandths of an em) is read as a word gap.
const WORD_GAP: f32 = 200.0;

pub type Table = Vec<Vec<String>>;

/// Page font resources by name, as selected with `Tf`.
pub type FontEncodings<'a> = BTreeMap<Vec<u8>, Encoding<'a>>;

/// A run of shown text and the device-space position it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values = numbers(operands)?;
        let values: [f32; 6] = values.get(..6)?.try_into().ok()?;
        Some(Matrix(values))
    }

    /// `self × other`, in PDF row-vector convention.
    fn multiply(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    fn origin(&self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }
}

struct GraphicsState<'a> {
    ctm: Matrix,
    font: Option<&'a Encoding<'a>>,
}

struct TextState<'a> {
    encodings: &'a FontEncodings<'a>,
    font: Option<&'a Encoding<'a>>,
    ctm: Matrix,
    saved: Vec<GraphicsState<'a>>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
    continues_run: bool,
    fragments: Vec<TextFragment>,
}

impl<'a> TextState<'a> {
    fn new(encodings: &'a FontEncodings<'a>) -> Self {
        Self {
            encodings,
            font: None,
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            leading: 0.0,
            continues_run: false,
            fragments: Vec::new(),
        }
    }

    fn apply(&mut self, operation: &Operation) {
        let operands = operation.operands.as_slice();

        match operation.operator.as_str() {
            "q" => self.saved.push(GraphicsState {
                ctm: self.ctm,
                font: self.font,
            }),
            "Q" => {
                if let Some(state) = self.saved.pop() {
                    self.ctm = state.ctm;
                    self.font = state.font;
                }
            }
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.ctm = matrix.multiply(&self.ctm);
                }
            }
            "Tf" => {
                let encodings = self.encodings;
                self.font = operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .and_then(|name| encodings.get(name));
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
                self.continues_run = false;
            }
            "Td" => {
                if let Some(&[tx, ty]) = numbers(operands).as_deref() {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some(&[tx, ty]) = numbers(operands).as_deref() {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.text_matrix = matrix;
                    self.line_matrix = matrix;
                    self.continues_run = false;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(|o| o.as_float().ok()) {
                    self.leading = leading;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let text = self.text_array(items);
                    self.show(text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            _ => {}
        }
    }

    /// Decodes with the current font's encoding, falling back to the string's
    /// own byte order mark or Latin-1 when the font has none lopdf can apply.
    fn decode(&self, bytes: &[u8]) -> String {
        let decoded = self
            .font
            .and_then(|encoding| Document::decode_text(encoding, bytes).ok())
            .unwrap_or_else(|| decode_pdf_string(bytes));

        decoded.chars().filter(|c| !c.is_control()).collect()
    }

    fn text_array(&self, items: &[Object]) -> String {
        let mut text = String::new();

        for item in items {
            match item {
                Object::String(bytes, _) => text.push_str(&self.decode(bytes)),
                other => {
                    if let Ok(adjustment) = other.as_float() {
                        if adjustment <= -WORD_GAP && !text.is_empty() && !text.ends_with(' ') {
                            text.push(' ');
                        }
                    }
                }
            }
        }

        text
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
        self.continues_run = false;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: String) {
        if text.is_empty() {
            return;
        }

        // Glyph widths are not tracked, so text shown without repositioning
        // belongs to the previous fragment.
        if self.continues_run {
            if let Some(last) = self.fragments.last_mut() {
                last.text.push_str(&text);
                return;
            }
        }

        let (x, y) = self.text_matrix.multiply(&self.ctm).origin();
        self.fragments.push(TextFragment { x, y, text });
        self.continues_run = true;
    }
}

fn numbers(operands: &[Object]) -> Option<Vec<f32>> {
    operands.iter().map(|o| o.as_float().ok()).collect()
}

/// UTF-16BE when the string carries a byte order mark, Latin-1 otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Positions every text-showing operator of a decoded content stream.
pub fn text_fragments(operations: &[Operation], encodings: &FontEncodings) -> Vec<TextFragment> {
    let mut state = TextState::new(encodings);
    for operation in operations {
        state.apply(operation);
    }
    state.fragments
}

struct Row<'a> {
    y: f32,
    cells: Vec<&'a TextFragment>,
}

fn group_rows(fragments: &[TextFragment]) -> Vec<Row<'_>> {
    let mut sorted: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .collect();
    sorted.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut rows: Vec<Row> = Vec::new();
    for fragment in sorted {
        match rows.last_mut() {
            Some(row) if (row.y - fragment.y).abs() <= ROW_TOLERANCE => row.cells.push(fragment),
            _ => rows.push(Row {
                y: fragment.y,
                cells: vec![fragment],
            }),
        }
    }

    for row in &mut rows {
        row.cells
            .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }

    rows
}

fn columns_align(first: &Row, row: &Row) -> bool {
    first.cells.len() == row.cells.len()
        && first
            .cells
            .iter()
            .zip(&row.cells)
            .all(|(a, b)| (a.x - b.x).abs() <= COLUMN_TOLERANCE)
}

fn flush_run(run: &mut Vec<&Row>, tables: &mut Vec<Table>) {
    if run.len() >= MIN_ROWS {
        tables.push(
            run.iter()
                .map(|row| {
                    row.cells
                        .iter()
                        .map(|cell| cell.text.trim().to_string())
                        .collect()
                })
                .collect(),
        );
    }
    run.clear();
}

/// Finds runs of consecutive rows that share a column layout. The first row
/// of each table is its header.
pub fn detect_tables(fragments: &[TextFragment]) -> Vec<Table> {
    let rows = group_rows(fragments);
    let mut tables = Vec::new();
    let mut run: Vec<&Row> = Vec::new();

    for row in &rows {
        if row.cells.len() < MIN_COLUMNS {
            flush_run(&mut run, &mut tables);
            continue;
        }

        let extends = run.first().is_some_and(|first| columns_align(first, row));
        if !extends {
            flush_run(&mut run, &mut tables);
        }
        run.push(row);
    }
    flush_run(&mut run, &mut tables);

    tables
}

pub fn table_to_csv(table: &[Vec<String>]) -> Result<String, DocumentExtractionError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in table {
        writer
            .write_record(row)
            .map_err(|e| DocumentExtractionError::ExtractionFailed(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DocumentExtractionError::IoError(e.error().to_string()))?;

    String::from_utf8(bytes).map_err(|e| DocumentExtractionError::ExtractionFailed(e.to_string()))
}

/// Encodings of the page's fonts. Fonts lopdf cannot resolve are left out and
/// their strings go through the fallback decoder.
fn page_encodings(doc: &Document, page_number: u32, page_id: ObjectId) -> FontEncodings<'_> {
    let fonts = match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts,
        Err(e) => {
            debug!("No font resources on page {}: {}", page_number, e);
            return FontEncodings::new();
        }
    };

    fonts
        .into_iter()
        .filter_map(|(name, font)| match font.get_font_encoding(doc) {
            Ok(encoding) => Some((name, encoding)),
            Err(e) => {
                debug!(
                    "Font {} on page {} has no usable encoding: {}",
                    String::from_utf8_lossy(&name),
                    page_number,
                    e
                );
                None
            }
        })
        .collect()
}

fn page_tables(
    doc: &Document,
    page_number: u32,
    page_id: ObjectId,
) -> Result<Vec<Chunk>, DocumentExtractionError> {
    let data = doc.get_page_content(page_id).map_err(|e| {
        DocumentExtractionError::ExtractionFailed(format!(
            "Failed to read content of page {}: {}",
            page_number, e
        ))
    })?;
    let content = Content::decode(&data).map_err(|e| {
        DocumentExtractionError::ExtractionFailed(format!(
            "Failed to decode content of page {}: {}",
            page_number, e
        ))
    })?;

    let encodings = page_encodings(doc, page_number, page_id);

    detect_tables(&text_fragments(&content.operations, &encodings))
        .iter()
        .map(|table| table_to_csv(table).map(|csv| Chunk::table(page_number, csv)))
        .collect()
}

/// One table chunk per detected table, in page order.
pub fn extract_document_tables(doc: &Document) -> Result<Vec<Chunk>, DocumentExtractionError> {
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();

    let per_page: Vec<Result<Vec<Chunk>, DocumentExtractionError>> = pages
        .into_par_iter()
        .map(|(page_number, page_id)| page_tables(doc, page_number, page_id))
        .collect();

    let mut chunks = Vec::new();
    for result in per_page {
        chunks.extend(result?);
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pdf_document, pdf_document_with_font, table_page_operations};
    use lopdf::{StringFormat, dictionary};

    fn fragment(x: f32, y: f32, text: &str) -> TextFragment {
        TextFragment {
            x,
            y,
            text: text.to_string(),
        }
    }

    fn literal(text: &str) -> Object {
        Object::string_literal(text)
    }

    #[test]
    fn test_td_positions_are_relative_to_line_start() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![literal("Name")]),
            Operation::new("Td", vec![100.into(), 0.into()]),
            Operation::new("Tj", vec![literal("Age")]),
            Operation::new("ET", vec![]),
        ];

        let fragments = text_fragments(&operations, &FontEncodings::new());

        assert_eq!(
            fragments,
            vec![fragment(72.0, 700.0, "Name"), fragment(172.0, 700.0, "Age")]
        );
    }

    #[test]
    fn test_leading_and_next_line_operators() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 500.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Tj", vec![literal("first")]),
            Operation::new("T*", vec![]),
            Operation::new("Tj", vec![literal("second")]),
            Operation::new("'", vec![literal("third")]),
            Operation::new("ET", vec![]),
        ];

        let fragments = text_fragments(&operations, &FontEncodings::new());

        let positions: Vec<(f32, f32)> = fragments.iter().map(|f| (f.x, f.y)).collect();
        assert_eq!(positions, vec![(50.0, 500.0), (50.0, 486.0), (50.0, 472.0)]);
    }

    #[test]
    fn test_td_uppercase_sets_leading() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("TD", vec![10.into(), (-12).into()]),
            Operation::new("Tj", vec![literal("a")]),
            Operation::new("T*", vec![]),
            Operation::new("Tj", vec![literal("b")]),
            Operation::new("ET", vec![]),
        ];

        let fragments = text_fragments(&operations, &FontEncodings::new());

        assert_eq!(fragments[1], fragment(10.0, -24.0, "b"));
    }

    #[test]
    fn test_ctm_is_applied_and_restored() {
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![1.into(), 0.into(), 0.into(), 1.into(), 100.into(), 100.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![5.into(), 5.into()]),
            Operation::new("Tj", vec![literal("shifted")]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![5.into(), 5.into()]),
            Operation::new("Tj", vec![literal("plain")]),
            Operation::new("ET", vec![]),
        ];

        let fragments = text_fragments(&operations, &FontEncodings::new());

        assert_eq!(
            fragments,
            vec![fragment(105.0, 105.0, "shifted"), fragment(5.0, 5.0, "plain")]
        );
    }

    #[test]
    fn test_tj_array_gaps_become_spaces() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    literal("Total"),
                    (-250).into(),
                    literal("cost"),
                    (-30).into(),
                    literal("s"),
                ])],
            ),
            Operation::new("ET", vec![]),
        ];

        let fragments = text_fragments(&operations, &FontEncodings::new());

        assert_eq!(fragments[0].text, "Total costs");
    }

    #[test]
    fn test_consecutive_shows_join_one_fragment() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![1.into(), 2.into()]),
            Operation::new("Tj", vec![literal("Hel")]),
            Operation::new("Tj", vec![literal("lo")]),
            Operation::new("ET", vec![]),
        ];

        assert_eq!(
            text_fragments(&operations, &FontEncodings::new()),
            vec![fragment(1.0, 2.0, "Hello")]
        );
    }

    #[test]
    fn test_utf16_strings_are_decoded() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x43, 0x00, 0xE9];
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tj", vec![Object::String(bytes, StringFormat::Hexadecimal)]),
            Operation::new("ET", vec![]),
        ];

        assert_eq!(text_fragments(&operations, &FontEncodings::new())[0].text, "Cé");
    }

    #[test]
    fn test_detects_aligned_rows_as_table() {
        let fragments = vec![
            fragment(72.0, 700.0, "Name"),
            fragment(200.0, 700.0, "Age"),
            fragment(72.0, 680.0, "Alice"),
            fragment(201.5, 680.5, "30"),
            fragment(73.0, 660.0, "Bob"),
            fragment(199.0, 660.0, "25"),
        ];

        let tables = detect_tables(&fragments);

        assert_eq!(
            tables,
            vec![vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Alice".to_string(), "30".to_string()],
                vec!["Bob".to_string(), "25".to_string()],
            ]]
        );
    }

    #[test]
    fn test_fragment_order_does_not_matter() {
        let fragments = vec![
            fragment(200.0, 680.0, "2"),
            fragment(72.0, 700.0, "a"),
            fragment(72.0, 680.0, "1"),
            fragment(200.0, 700.0, "b"),
        ];

        let tables = detect_tables(&fragments);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][0], vec!["a", "b"]);
        assert_eq!(tables[0][1], vec!["1", "2"]);
    }

    #[test]
    fn test_prose_lines_are_not_tables() {
        let fragments = vec![
            fragment(72.0, 700.0, "A paragraph of running text."),
            fragment(72.0, 686.0, "It continues on the next line."),
            fragment(72.0, 672.0, "And ends here."),
        ];

        assert!(detect_tables(&fragments).is_empty());
    }

    #[test]
    fn test_single_aligned_row_is_not_a_table() {
        let fragments = vec![
            fragment(72.0, 700.0, "left"),
            fragment(300.0, 700.0, "right"),
            fragment(72.0, 680.0, "just prose"),
        ];

        assert!(detect_tables(&fragments).is_empty());
    }

    #[test]
    fn test_misaligned_columns_split_tables() {
        let fragments = vec![
            fragment(72.0, 700.0, "h1"),
            fragment(200.0, 700.0, "h2"),
            fragment(72.0, 680.0, "v1"),
            fragment(200.0, 680.0, "v2"),
            fragment(72.0, 600.0, "x"),
            fragment(400.0, 600.0, "y"),
            fragment(72.0, 580.0, "1"),
            fragment(400.0, 580.0, "2"),
        ];

        let tables = detect_tables(&fragments);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1][0], vec!["x", "y"]);
    }

    #[test]
    fn test_csv_quotes_and_uses_newlines() {
        let table = vec![
            vec!["item".to_string(), "note".to_string()],
            vec!["a".to_string(), "one, two".to_string()],
        ];

        let csv = table_to_csv(&table).unwrap();

        assert_eq!(csv, "item,note\na,\"one, two\"\n");
    }

    #[test]
    fn test_extracts_tables_from_generated_pdf() {
        let doc = pdf_document(vec![
            table_page_operations(&[&["City", "Population"], &["Oslo", "700000"]]),
            table_page_operations(&[&["Only one cell"]]),
            table_page_operations(&[&["k", "v"], &["a", "1"], &["b", "2"]]),
        ]);

        let chunks = extract_document_tables(&doc).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page(), 1);
        assert_eq!(chunks[0].content(), "City,Population\nOslo,700000\n");
        assert_eq!(chunks[1].page(), 3);
        assert_eq!(chunks[1].content(), "k,v\na,1\nb,2\n");
    }

    #[test]
    fn test_cells_are_decoded_with_the_font_encoding() {
        let cells: [[&[u8]; 2]; 2] = [[b"Item", b"Price"], [b"Caf\x8E", b"3\xA4"]];
        let mut operations = vec![Operation::new("Tf", vec!["F1".into(), 10.into()])];
        for (row_index, row) in cells.iter().enumerate() {
            for (column_index, cell) in row.iter().enumerate() {
                let x = 72 + 150 * column_index as i64;
                let y = 700 - 20 * row_index as i64;
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Td", vec![x.into(), y.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(cell.to_vec(), StringFormat::Literal)],
                    ),
                    Operation::new("ET", vec![]),
                ]);
            }
        }
        let doc = pdf_document_with_font(
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "MacRomanEncoding",
            },
            vec![operations],
        );

        let chunks = extract_document_tables(&doc).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content(), "Item,Price\nCafé,3§\n");
        assert!(doc.extract_text(&[1]).unwrap().contains("Café"));
    }

    #[test]
    fn test_unknown_font_falls_back_to_latin1() {
        let encodings = FontEncodings::new();
        let operations = vec![
            Operation::new("Tf", vec!["F9".into(), 10.into()]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tj",
                vec![Object::String(b"Caf\xE9".to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ];

        assert_eq!(text_fragments(&operations, &encodings)[0].text, "Café");
    }
}
