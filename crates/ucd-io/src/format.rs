//! Format constants and the section counts shared by reader and writer.

use std::fmt::{Display, Formatter};
use std::mem::size_of;

use serde::{Deserialize, Serialize};

use crate::cell_type::CellType;
use crate::error::{Result, UcdError};

/// First byte of every binary UCD file.
pub const MAGIC: u8 = 0x07;

/// Size of the packed label and unit fields of a binary data section.
pub const TEXT_FIELD_SIZE: usize = 1024;

/// Separator between packed component names.
pub const NAME_SEPARATOR: u8 = b'.';

/// Filler for the unused tail of a packed name field.
pub const FIELD_FILLER: u8 = b'0';

/// Row stride of the in-memory connectivity table, sized for the hexahedron.
pub const NLIST_STRIDE: usize = CellType::MAX_NODES;

const INT: u64 = size_of::<i32>() as u64;
const FLOAT: u64 = size_of::<f32>() as u64;

/// On-disk representation of a UCD file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UcdFormat {
    Text,
    Binary,
}

impl UcdFormat {
    pub fn is_binary(self) -> bool {
        self == UcdFormat::Binary
    }

    pub fn opposite(self) -> Self {
        match self {
            UcdFormat::Text => UcdFormat::Binary,
            UcdFormat::Binary => UcdFormat::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UcdFormat::Text => "text",
            UcdFormat::Binary => "binary",
        }
    }
}

impl Display for UcdFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which data section a cursor call addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSection {
    Node,
    Cell,
}

impl Display for DataSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSection::Node => f.write_str("node data"),
            DataSection::Cell => f.write_str("cell data"),
        }
    }
}

/// Section counts from the first record of a UCD file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UcdHeader {
    pub num_nodes: usize,
    pub num_cells: usize,
    /// Scalar columns of the node data section (0 when absent).
    pub num_node_data: usize,
    /// Scalar columns of the cell data section (0 when absent).
    pub num_cell_data: usize,
    /// Total connectivity entries. Stored only by the binary format; the text reader fills
    /// it in while parsing cells.
    pub num_nlist: usize,
}

impl UcdHeader {
    pub fn rows(&self, section: DataSection) -> usize {
        match section {
            DataSection::Node => self.num_nodes,
            DataSection::Cell => self.num_cells,
        }
    }

    pub fn columns(&self, section: DataSection) -> usize {
        match section {
            DataSection::Node => self.num_node_data,
            DataSection::Cell => self.num_cell_data,
        }
    }

    /// Exact size in bytes of the binary file described by these counts, or `None` when the
    /// counts are too large to describe any file.
    pub fn binary_file_size(&self) -> Option<u64> {
        let count = |n: usize| u64::try_from(n).ok();
        let geometry = [
            count(self.num_cells)?.checked_mul(4 * INT)?,
            count(self.num_nlist)?.checked_mul(INT)?,
            count(self.num_nodes)?.checked_mul(3 * FLOAT)?,
        ];
        let mut size = geometry
            .into_iter()
            .try_fold(1 + 6 * INT, u64::checked_add)?;

        for section in [DataSection::Node, DataSection::Cell] {
            let columns = count(self.columns(section))?;
            if columns == 0 {
                continue;
            }
            let rows = count(self.rows(section))?;
            let fixed = 2 * TEXT_FIELD_SIZE as u64 + INT;
            // widths, min, max, body and active list
            let per_column = INT + 2 * FLOAT + rows.checked_mul(FLOAT)?.checked_add(INT)?;
            size = size
                .checked_add(fixed)?
                .checked_add(columns.checked_mul(per_column)?)?;
        }

        Some(size)
    }

    /// Smallest text file body (after the header line) that can hold these counts: every
    /// node and cell line has at least four tokens, every data row `1 + columns`, and a token
    /// takes at least one character plus a separator.
    pub fn min_text_size(&self) -> Option<u64> {
        const GEOMETRY_LINE: u64 = 8;
        let count = |n: usize| u64::try_from(n).ok();
        let lines = count(self.num_nodes)?.checked_add(count(self.num_cells)?)?;
        let mut size = lines.checked_mul(GEOMETRY_LINE)?;

        for section in [DataSection::Node, DataSection::Cell] {
            let columns = count(self.columns(section))?;
            if columns == 0 {
                continue;
            }
            let row = columns.checked_add(1)?.checked_mul(2)?;
            size = size.checked_add(count(self.rows(section))?.checked_mul(row)?)?;
        }

        // the last line may lack its newline
        Some(size.saturating_sub(1))
    }
}

/// One cell-info record: the four integers stored per cell by the binary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellInfo {
    pub id: i32,
    pub material_id: i32,
    pub cell_type: CellType,
    /// Connectivity entries of this cell.
    pub node_count: usize,
}

impl CellInfo {
    pub fn new(id: i32, material_id: i32, cell_type: CellType) -> Self {
        Self {
            id,
            material_id,
            cell_type,
            node_count: cell_type.node_count(),
        }
    }
}

/// A named sub-field of a data section spanning `width` contiguous columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub label: String,
    pub unit: String,
    pub width: usize,
}

impl Component {
    pub fn new(label: impl Into<String>, unit: impl Into<String>, width: usize) -> Self {
        Self {
            label: label.into(),
            unit: unit.into(),
            width,
        }
    }
}

/// Result of a data section header read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataHeader {
    pub section: DataSection,
    pub components: Vec<Component>,
}

impl DataHeader {
    pub fn num_comp(&self) -> usize {
        self.components.len()
    }

    pub fn num_data(&self) -> usize {
        self.components.iter().map(|c| c.width).sum()
    }
}

/// Observed per-column range of a data matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRange {
    pub minima: Vec<f32>,
    pub maxima: Vec<f32>,
}

impl ColumnRange {
    /// Empty range: every minimum at +inf and every maximum at -inf.
    pub fn new(columns: usize) -> Self {
        Self {
            minima: vec![f32::INFINITY; columns],
            maxima: vec![f32::NEG_INFINITY; columns],
        }
    }

    /// Range of a row-major matrix with `columns` columns.
    pub fn of_rows(data: &[f32], columns: usize) -> Self {
        let mut range = Self::new(columns);
        if columns > 0 {
            for row in data.chunks_exact(columns) {
                for (col, &value) in row.iter().enumerate() {
                    range.include(col, value);
                }
            }
        }
        range
    }

    pub fn include(&mut self, column: usize, value: f32) {
        if value < self.minima[column] {
            self.minima[column] = value;
        }
        if value > self.maxima[column] {
            self.maxima[column] = value;
        }
    }
}

/// Checks that component widths are positive and cover exactly `columns` columns.
pub(crate) fn check_widths(widths: &[usize], columns: usize) -> Result<()> {
    if widths.iter().any(|&w| w == 0) {
        return Err(UcdError::invalid("component widths must be positive"));
    }
    let total: usize = widths.iter().sum();
    if total != columns {
        return Err(UcdError::invalid(format!(
            "component widths sum to {total} but the section has {columns} columns"
        )));
    }
    Ok(())
}

/// Packs names into a fixed binary field: `a.b.c.` followed by filler.
pub(crate) fn pack_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
    field: &'static str,
) -> Result<[u8; TEXT_FIELD_SIZE]> {
    let mut buffer = [FIELD_FILLER; TEXT_FIELD_SIZE];
    let mut pos = 0usize;
    for name in names {
        if name.as_bytes().contains(&NAME_SEPARATOR) {
            return Err(UcdError::invalid(format!(
                "{field} entry `{name}` contains the separator '.'"
            )));
        }
        let end = pos + name.len();
        // the last byte of the field is never used
        if end + 1 > TEXT_FIELD_SIZE - 1 {
            return Err(UcdError::FieldOverflow {
                field,
                needed: end + 1,
                capacity: TEXT_FIELD_SIZE - 1,
            });
        }
        buffer[pos..end].copy_from_slice(name.as_bytes());
        buffer[end] = NAME_SEPARATOR;
        pos = end + 1;
    }
    Ok(buffer)
}

/// Splits a packed binary field back into `count` names.
pub(crate) fn unpack_names(buffer: &[u8], count: usize, field: &'static str) -> Result<Vec<String>> {
    let separators = buffer.iter().filter(|&&b| b == NAME_SEPARATOR).count();
    if separators < count {
        return Err(UcdError::invalid(format!(
            "{field} field holds {separators} names, expected {count}"
        )));
    }
    buffer
        .split(|&b| b == NAME_SEPARATOR)
        .take(count)
        .map(|piece| {
            String::from_utf8(piece.to_vec())
                .map_err(|_| UcdError::invalid(format!("{field} field holds a name that is not UTF-8")))
        })
        .collect()
}
