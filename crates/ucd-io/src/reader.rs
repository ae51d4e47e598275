//! UCD file reader
//!
//! Reads text and binary UCD files section by section. The format is detected from the first
//! byte: the binary magic `0x07`, anything else is text.
//!
//! ## Call order
//!
//! 1. [`UcdReader::open`] consumes the header.
//! 2. [`UcdReader::read_nodes_and_cells`].
//! 3. For the node data section (if present), then the cell data section (if present):
//!    - [`UcdReader::read_data_header`]
//!    - binary: [`UcdReader::read_data_minmax`], one [`UcdReader::read_data_component`] per
//!      component, [`UcdReader::read_active_list`]
//!    - text: [`UcdReader::read_data_text`] (or [`UcdReader::skip_data_text`])
//!
//! Every output buffer is optional; a `None` skips that part of the file without
//! materialising it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ucd_io::{MeshBuffers, UcdReader};
//!
//! let mut reader = UcdReader::open("mesh.inp")?;
//! let header = *reader.header();
//! println!("{} nodes, {} cells ({})", header.num_nodes, header.num_cells, reader.format());
//! reader.read_nodes_and_cells(MeshBuffers::default())?;
//! # Ok::<(), ucd_io::UcdError>(())
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::str::FromStr;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace, warn};

use crate::cell_type::CellType;
use crate::cursor::{Phase, SectionCursor, Step};
use crate::error::{Result, UcdError, alloc_buffer, check_len, checked_count};
use crate::format::{
    CellInfo, ColumnRange, Component, DataHeader, MAGIC, TEXT_FIELD_SIZE, UcdFormat, UcdHeader,
    check_widths, unpack_names,
};

const INT: u64 = 4;
const FLOAT: u64 = 4;

/// Node output buffers, each of length `num_nodes`.
#[derive(Debug)]
pub struct NodeBuffers<'a> {
    pub id: &'a mut [i32],
    pub x: &'a mut [f32],
    pub y: &'a mut [f32],
    pub z: &'a mut [f32],
}

/// Row-major connectivity table with `stride` slots per cell.
///
/// Slots past a cell's node count are left untouched.
#[derive(Debug)]
pub struct Connectivity<'a> {
    pub table: &'a mut [i32],
    pub stride: usize,
}

/// Outputs of [`UcdReader::read_nodes_and_cells`]. Parts left `None` are skipped.
#[derive(Debug, Default)]
pub struct MeshBuffers<'a> {
    pub nodes: Option<NodeBuffers<'a>>,
    pub cells: Option<&'a mut [CellInfo]>,
    pub connectivity: Option<Connectivity<'a>>,
}

/// Outputs of [`UcdReader::read_data_text`]: `num_rows` ids and a row-major
/// `num_rows * num_data` matrix.
#[derive(Debug)]
pub struct RowBuffers<'a> {
    pub row_id: &'a mut [i32],
    pub data: &'a mut [f32],
}

/// Sequential reader over one UCD file.
pub struct UcdReader<R> {
    input: R,
    cursor: SectionCursor,
    line: String,
    line_no: usize,
}

impl UcdReader<BufReader<File>> {
    /// Open a UCD file and read its header
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| UcdError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("reading UCD file {}", path.display());
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: BufRead + Seek> UcdReader<R> {
    /// Detect the format and read the header from a buffered reader
    pub fn from_reader(mut input: R) -> Result<Self> {
        let format = match input.fill_buf()?.first() {
            Some(&MAGIC) => UcdFormat::Binary,
            _ => UcdFormat::Text,
        };

        let mut reader = UcdReader {
            input,
            cursor: SectionCursor::new(format, UcdHeader::default()),
            line: String::new(),
            line_no: 0,
        };

        let header = match format {
            UcdFormat::Binary => reader.read_binary_header()?,
            UcdFormat::Text => reader.read_text_header()?,
        };
        debug!(
            "{format} UCD header: {} nodes, {} cells, {} node data columns, {} cell data columns",
            header.num_nodes, header.num_cells, header.num_node_data, header.num_cell_data
        );
        reader.cursor.header = header;
        Ok(reader)
    }

    pub fn format(&self) -> UcdFormat {
        self.cursor.format()
    }

    pub fn is_binary(&self) -> bool {
        self.format().is_binary()
    }

    /// Section counts. For text files `num_nlist` is known only after the cells are read.
    pub fn header(&self) -> &UcdHeader {
        &self.cursor.header
    }

    pub fn phase(&self) -> Phase {
        self.cursor.phase()
    }

    /// Read node coordinates, cell records and connectivity.
    pub fn read_nodes_and_cells(&mut self, buffers: MeshBuffers<'_>) -> Result<()> {
        let header = self.cursor.header;
        if let Some(nodes) = &buffers.nodes {
            check_len("node ids", header.num_nodes, nodes.id.len())?;
            check_len("x coordinates", header.num_nodes, nodes.x.len())?;
            check_len("y coordinates", header.num_nodes, nodes.y.len())?;
            check_len("z coordinates", header.num_nodes, nodes.z.len())?;
        }
        if let Some(cells) = &buffers.cells {
            check_len("cell records", header.num_cells, cells.len())?;
        }
        if let Some(connectivity) = &buffers.connectivity {
            check_len(
                "connectivity table",
                checked_count("connectivity table", connectivity.stride, header.num_cells)?,
                connectivity.table.len(),
            )?;
        }
        self.cursor.finish_geometry()?;

        match self.format() {
            UcdFormat::Binary => self.read_binary_geometry(buffers),
            UcdFormat::Text => self.read_text_geometry(buffers),
        }
    }

    /// Read the header of the next data section, advancing the phase marker.
    pub fn read_data_header(&mut self) -> Result<DataHeader> {
        if self.cursor.active_list_pending() {
            trace!("skipping unread active list");
            self.read_active_list(None)?;
        }
        let section = self.cursor.begin_section()?;
        let columns = self.cursor.columns(section);

        let components = match self.format() {
            UcdFormat::Binary => self.read_binary_data_header(columns)?,
            UcdFormat::Text => self.read_text_data_header()?,
        };
        let widths: Vec<usize> = components.iter().map(|c| c.width).collect();
        check_widths(&widths, columns)?;
        self.cursor.set_widths(widths);

        Ok(DataHeader {
            section,
            components,
        })
    }

    /// Read the stored per-column minima and maxima (binary only).
    pub fn read_data_minmax(
        &mut self,
        minima: Option<&mut [f32]>,
        maxima: Option<&mut [f32]>,
    ) -> Result<()> {
        const OP: &str = "reading min/max";
        self.cursor.require_format(UcdFormat::Binary, OP)?;
        let section = self.cursor.expect(Step::MinMax, OP)?;
        let columns = self.cursor.columns(section);
        if let Some(minima) = &minima {
            check_len("minima", columns, minima.len())?;
        }
        if let Some(maxima) = &maxima {
            check_len("maxima", columns, maxima.len())?;
        }

        self.read_floats_or_skip(minima, columns)?;
        self.read_floats_or_skip(maxima, columns)?;
        self.cursor.complete_min_max();
        Ok(())
    }

    /// Read the next component of a binary data body and return its width.
    ///
    /// The output holds `width * num_rows` values, row-major within the component.
    pub fn read_data_component(&mut self, out: Option<&mut [f32]>) -> Result<usize> {
        const OP: &str = "reading a binary data component";
        self.cursor.require_format(UcdFormat::Binary, OP)?;
        let section = self.cursor.expect(Step::Body, OP)?;
        let width = self.cursor.component_width()?;
        let count = checked_count("component values", width, self.cursor.rows(section))?;
        if let Some(out) = &out {
            check_len("component values", count, out.len())?;
        }

        self.read_floats_or_skip(out, count)?;
        self.cursor.advance_component();
        Ok(width)
    }

    /// Read a text data body into the unified matrix and return its per-column range.
    pub fn read_data_text(&mut self, rows: RowBuffers<'_>) -> Result<ColumnRange> {
        const OP: &str = "reading text data rows";
        self.cursor.require_format(UcdFormat::Text, OP)?;
        let section = self.cursor.expect(Step::Body, OP)?;
        let num_rows = self.cursor.rows(section);
        let columns = self.cursor.columns(section);
        check_len("row ids", num_rows, rows.row_id.len())?;
        check_len(
            "data values",
            checked_count("data values", num_rows, columns)?,
            rows.data.len(),
        )?;

        let mut range = ColumnRange::new(columns);
        for row in 0..num_rows {
            self.expect_line("data row")?;
            let line = self.line_no;
            let mut tokens = self.line.split_whitespace();
            rows.row_id[row] = parse_token(tokens.next(), "row id", line)?;
            for col in 0..columns {
                let value: f32 = parse_token(tokens.next(), "data value", line)?;
                rows.data[row * columns + col] = value;
                range.include(col, value);
            }
        }

        self.cursor.complete_rows(section, num_rows);
        Ok(range)
    }

    /// Discard a text data body.
    pub fn skip_data_text(&mut self) -> Result<()> {
        const OP: &str = "skipping text data rows";
        self.cursor.require_format(UcdFormat::Text, OP)?;
        let section = self.cursor.expect(Step::Body, OP)?;
        let num_rows = self.cursor.rows_remaining(section);
        self.discard_lines(num_rows, "data row")?;
        self.cursor.complete_rows(section, num_rows);
        Ok(())
    }

    /// Read the active-list flags that close a binary data section.
    pub fn read_active_list(&mut self, out: Option<&mut [i32]>) -> Result<()> {
        const OP: &str = "reading the active list";
        self.cursor.require_format(UcdFormat::Binary, OP)?;
        let section = self.cursor.expect(Step::ActiveList, OP)?;
        let columns = self.cursor.columns(section);
        match out {
            Some(out) => {
                check_len("active list", columns, out.len())?;
                self.input.read_i32_into::<LittleEndian>(out)?;
            }
            None => self.skip(columns as u64 * INT)?,
        }
        self.cursor.complete_active_list();
        Ok(())
    }

    /// Release the file.
    pub fn close(self) {
        if !self.cursor.finished() {
            debug!("closing UCD reader before the end of the file");
        }
    }

    fn read_binary_header(&mut self) -> Result<UcdHeader> {
        self.input.read_u8()?;
        let num_nodes = read_count(&mut self.input, "node count")?;
        let num_cells = read_count(&mut self.input, "cell count")?;
        let num_node_data = read_count(&mut self.input, "node data column count")?;
        let num_cell_data = read_count(&mut self.input, "cell data column count")?;
        let _reserved = self.input.read_i32::<LittleEndian>()?;
        let num_nlist = read_count(&mut self.input, "connectivity length")?;

        let header = UcdHeader {
            num_nodes,
            num_cells,
            num_node_data,
            num_cell_data,
            num_nlist,
        };
        self.check_binary_size(&header)?;
        Ok(header)
    }

    fn check_binary_size(&mut self, header: &UcdHeader) -> Result<()> {
        let position = self.input.stream_position()?;
        let actual = self.input.seek(SeekFrom::End(0))?;
        self.input.seek(SeekFrom::Start(position))?;

        let expected = header.binary_file_size().ok_or_else(|| {
            UcdError::invalid("header counts describe a file larger than any supported size")
        })?;
        if actual < expected {
            return Err(UcdError::invalid(format!(
                "binary file is {actual} bytes but its header describes {expected} \
                 (truncated file or byte order issue?)"
            )));
        }
        if actual > expected {
            warn!("binary file has {} trailing bytes", actual - expected);
        }
        Ok(())
    }

    fn read_text_header(&mut self) -> Result<UcdHeader> {
        self.expect_line("header")?;
        let line = self.line_no;
        let mut tokens = self.line.split_whitespace();
        let header = UcdHeader {
            num_nodes: parse_count(tokens.next(), "node count", line)?,
            num_cells: parse_count(tokens.next(), "cell count", line)?,
            num_node_data: parse_count(tokens.next(), "node data column count", line)?,
            num_cell_data: parse_count(tokens.next(), "cell data column count", line)?,
            num_nlist: 0,
        };
        self.check_text_size(&header)?;
        Ok(header)
    }

    /// Rejects headers declaring more lines than the rest of the stream can hold.
    fn check_text_size(&mut self, header: &UcdHeader) -> Result<()> {
        let position = self.input.stream_position()?;
        let end = self.input.seek(SeekFrom::End(0))?;
        self.input.seek(SeekFrom::Start(position))?;

        let needed = header.min_text_size().ok_or_else(|| {
            UcdError::invalid("header counts describe a file larger than any supported size")
        })?;
        let available = end.saturating_sub(position);
        if available < needed {
            return Err(UcdError::invalid(format!(
                "header declares {} nodes and {} cells but only {available} bytes follow",
                header.num_nodes, header.num_cells
            )));
        }
        Ok(())
    }

    fn read_binary_geometry(&mut self, buffers: MeshBuffers<'_>) -> Result<()> {
        let header = self.cursor.header;
        let MeshBuffers {
            nodes,
            cells,
            connectivity,
        } = buffers;

        if cells.is_some() || connectivity.is_some() {
            let fields = checked_count("cell record fields", 4, header.num_cells)?;
            let mut raw: Vec<i32> = alloc_buffer("cell record fields", fields)?;
            self.input.read_i32_into::<LittleEndian>(&mut raw)?;
            let records = raw
                .chunks_exact(4)
                .map(decode_cell_record)
                .collect::<Result<Vec<_>>>()?;

            let total: usize = records.iter().map(|c| c.node_count).sum();
            if total != header.num_nlist {
                return Err(UcdError::invalid(format!(
                    "cell node counts sum to {total} but the header declares {} connectivity entries",
                    header.num_nlist
                )));
            }

            match connectivity {
                Some(connectivity) => {
                    let mut stream: Vec<i32> = alloc_buffer("connectivity entries", header.num_nlist)?;
                    self.input.read_i32_into::<LittleEndian>(&mut stream)?;
                    scatter_connectivity(&records, &stream, connectivity)?;
                }
                None => self.skip(header.num_nlist as u64 * INT)?,
            }

            if let Some(cells) = cells {
                cells.copy_from_slice(&records);
            }
        } else {
            self.skip((4 * header.num_cells as u64 + header.num_nlist as u64) * INT)?;
        }

        match nodes {
            Some(nodes) => {
                // the binary format does not store node ids
                for (id, value) in nodes.id.iter_mut().zip(1..) {
                    *id = value;
                }
                self.input.read_f32_into::<LittleEndian>(nodes.x)?;
                self.input.read_f32_into::<LittleEndian>(nodes.y)?;
                self.input.read_f32_into::<LittleEndian>(nodes.z)?;
            }
            None => self.skip(3 * header.num_nodes as u64 * FLOAT)?,
        }

        trace!(
            "read {} cells, {} connectivity entries, {} nodes",
            header.num_cells, header.num_nlist, header.num_nodes
        );
        Ok(())
    }

    fn read_text_geometry(&mut self, buffers: MeshBuffers<'_>) -> Result<()> {
        let header = self.cursor.header;
        let MeshBuffers {
            nodes,
            mut cells,
            mut connectivity,
        } = buffers;

        match nodes {
            Some(nodes) => {
                for i in 0..header.num_nodes {
                    self.expect_line("node")?;
                    let line = self.line_no;
                    let mut tokens = self.line.split_whitespace();
                    nodes.id[i] = parse_token(tokens.next(), "node id", line)?;
                    nodes.x[i] = parse_token(tokens.next(), "x coordinate", line)?;
                    nodes.y[i] = parse_token(tokens.next(), "y coordinate", line)?;
                    nodes.z[i] = parse_token(tokens.next(), "z coordinate", line)?;
                }
            }
            None => self.discard_lines(header.num_nodes, "node")?,
        }

        if cells.is_none() && connectivity.is_none() {
            return self.discard_lines(header.num_cells, "cell");
        }

        let mut total = 0usize;
        for i in 0..header.num_cells {
            self.expect_line("cell")?;
            let line = self.line_no;
            let mut tokens = self.line.split_whitespace();
            let id: i32 = parse_token(tokens.next(), "cell id", line)?;
            let material_id: i32 = parse_token(tokens.next(), "material id", line)?;
            let name = tokens.next().ok_or_else(|| UcdError::Parse {
                line,
                message: "missing cell type".to_string(),
            })?;
            let cell_type = CellType::from_name(name).map_err(|_| {
                UcdError::InvalidCellType(format!("line {line}: unknown type name `{name}`"))
            })?;
            let record = CellInfo::new(id, material_id, cell_type);
            total += record.node_count;

            if let Some(connectivity) = connectivity.as_mut() {
                if record.node_count > connectivity.stride {
                    return Err(stride_error(record.node_count, connectivity.stride));
                }
                let row = &mut connectivity.table[i * connectivity.stride..];
                for slot in row.iter_mut().take(record.node_count) {
                    *slot = parse_token(tokens.next(), "connectivity entry", line)?;
                }
            }
            if let Some(cells) = cells.as_deref_mut() {
                cells[i] = record;
            }
        }

        self.cursor.header.num_nlist = total;
        Ok(())
    }

    fn read_binary_data_header(&mut self, columns: usize) -> Result<Vec<Component>> {
        let mut labels = [0u8; TEXT_FIELD_SIZE];
        let mut units = [0u8; TEXT_FIELD_SIZE];
        self.input.read_exact(&mut labels)?;
        self.input.read_exact(&mut units)?;

        let num_comp = read_count(&mut self.input, "component count")?;
        if num_comp > columns {
            return Err(UcdError::invalid(format!(
                "{num_comp} components declared for {columns} columns"
            )));
        }
        let mut raw_widths: Vec<i32> = alloc_buffer("component widths", columns)?;
        self.input.read_i32_into::<LittleEndian>(&mut raw_widths)?;

        let labels = unpack_names(&labels, num_comp, "labels")?;
        let units = unpack_names(&units, num_comp, "units")?;
        raw_widths[..num_comp]
            .iter()
            .zip(labels.into_iter().zip(units))
            .map(|(&width, (label, unit))| {
                let width = usize::try_from(width)
                    .map_err(|_| UcdError::invalid(format!("negative component width {width}")))?;
                Ok::<_, UcdError>(Component { label, unit, width })
            })
            .collect()
    }

    fn read_text_data_header(&mut self) -> Result<Vec<Component>> {
        self.expect_line("data section header")?;
        let line = self.line_no;
        let mut tokens = self.line.split_whitespace();
        let num_comp: usize = parse_token(tokens.next(), "component count", line)?;
        let widths = (0..num_comp)
            .map(|_| parse_token(tokens.next(), "component width", line))
            .collect::<Result<Vec<usize>>>()?;

        let mut components = Vec::with_capacity(widths.len());
        for width in widths {
            self.expect_line("component label")?;
            // Names are kept byte for byte; only the line terminator is dropped.
            let name_line = self.line.trim_end_matches(['\n', '\r']);
            let (label, unit) = name_line.split_once(',').ok_or_else(|| UcdError::Parse {
                line: self.line_no,
                message: "expected `label,unit`".to_string(),
            })?;
            components.push(Component::new(label, unit, width));
        }
        Ok(components)
    }

    fn read_floats_or_skip(&mut self, out: Option<&mut [f32]>, count: usize) -> Result<()> {
        match out {
            Some(out) => self.input.read_f32_into::<LittleEndian>(out)?,
            None => self.skip(count as u64 * FLOAT)?,
        }
        Ok(())
    }

    fn skip(&mut self, bytes: u64) -> Result<()> {
        if bytes > 0 {
            self.input.seek(SeekFrom::Current(bytes as i64))?;
        }
        Ok(())
    }

    /// Loads the next non-blank line into `self.line`; false at end of file.
    fn next_line(&mut self) -> Result<bool> {
        loop {
            self.line.clear();
            if self.input.read_line(&mut self.line)? == 0 {
                return Ok(false);
            }
            self.line_no += 1;
            if !self.line.trim().is_empty() {
                return Ok(true);
            }
        }
    }

    fn expect_line(&mut self, what: &str) -> Result<()> {
        if !self.next_line()? {
            return Err(UcdError::Parse {
                line: self.line_no + 1,
                message: format!("unexpected end of file while reading {what}"),
            });
        }
        Ok(())
    }

    fn discard_lines(&mut self, count: usize, what: &str) -> Result<()> {
        for _ in 0..count {
            self.expect_line(what)?;
        }
        Ok(())
    }
}

fn read_count<R: Read>(input: &mut R, what: &str) -> Result<usize> {
    let value = input.read_i32::<LittleEndian>()?;
    usize::try_from(value).map_err(|_| UcdError::invalid(format!("negative {what}: {value}")))
}

fn parse_token<T: FromStr>(token: Option<&str>, what: &str, line: usize) -> Result<T> {
    let token = token.ok_or_else(|| UcdError::Parse {
        line,
        message: format!("missing {what}"),
    })?;
    token.parse().map_err(|_| UcdError::Parse {
        line,
        message: format!("invalid {what} `{token}`"),
    })
}

/// Header count of a text file, limited to what the binary header can store.
fn parse_count(token: Option<&str>, what: &str, line: usize) -> Result<usize> {
    let value: i64 = parse_token(token, what, line)?;
    if !(0..=i64::from(i32::MAX)).contains(&value) {
        return Err(UcdError::invalid(format!(
            "line {line}: {what} {value} is outside 0..={}",
            i32::MAX
        )));
    }
    Ok(value as usize)
}

fn decode_cell_record(raw: &[i32]) -> Result<CellInfo> {
    let cell_type = CellType::from_code(raw[2])?;
    let node_count = usize::try_from(raw[3])
        .map_err(|_| UcdError::invalid(format!("cell {} has negative node count", raw[0])))?;
    if node_count != cell_type.node_count() {
        warn!(
            "cell {} of type {cell_type} stores {node_count} nodes (expected {})",
            raw[0],
            cell_type.node_count()
        );
    }
    Ok(CellInfo {
        id: raw[0],
        material_id: raw[1],
        cell_type,
        node_count,
    })
}

fn scatter_connectivity(
    records: &[CellInfo],
    stream: &[i32],
    connectivity: Connectivity<'_>,
) -> Result<()> {
    let stride = connectivity.stride;
    let mut offset = 0usize;
    for (row, record) in records.iter().enumerate() {
        let count = record.node_count;
        if count > stride {
            return Err(stride_error(count, stride));
        }
        let start = row * stride;
        connectivity.table[start..start + count].copy_from_slice(&stream[offset..offset + count]);
        offset += count;
    }
    Ok(())
}

fn stride_error(count: usize, stride: usize) -> UcdError {
    UcdError::invalid(format!(
        "cell with {count} nodes does not fit a connectivity stride of {stride}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEXT_MESH: &str = "\
2 1 3 1 0
1 0.0 0.0 0.0
2 1.0 0.5 -2.0
7 3 line 1 2
2 1 2
temperature,K
velocity,m/s
1 10.0 1.0 2.0
2 -5.0 3.0 -4.0
1 1
pressure,Pa
7 101.5
";

    fn text_reader(src: &str) -> UcdReader<Cursor<Vec<u8>>> {
        UcdReader::from_reader(Cursor::new(src.as_bytes().to_vec())).expect("valid header")
    }

    #[test]
    fn detects_text_header() {
        let reader = text_reader(TEXT_MESH);
        assert_eq!(reader.format(), UcdFormat::Text);
        assert_eq!(reader.header().num_nodes, 2);
        assert_eq!(reader.header().num_cells, 1);
        assert_eq!(reader.header().num_node_data, 3);
        assert_eq!(reader.header().num_cell_data, 1);
        assert_eq!(reader.phase(), Phase::NotStarted);
    }

    #[test]
    fn reads_text_geometry() {
        let mut reader = text_reader(TEXT_MESH);
        let (mut id, mut x, mut y, mut z) = (vec![0; 2], vec![0.0; 2], vec![0.0; 2], vec![0.0; 2]);
        let mut cells = vec![CellInfo::default(); 1];
        let mut table = vec![0; 8];
        reader
            .read_nodes_and_cells(MeshBuffers {
                nodes: Some(NodeBuffers {
                    id: &mut id,
                    x: &mut x,
                    y: &mut y,
                    z: &mut z,
                }),
                cells: Some(&mut cells[..]),
                connectivity: Some(Connectivity {
                    table: &mut table,
                    stride: 8,
                }),
            })
            .expect("geometry");

        assert_eq!(id, vec![1, 2]);
        assert_eq!(y, vec![0.0, 0.5]);
        assert_eq!(z, vec![0.0, -2.0]);
        assert_eq!(cells[0], CellInfo::new(7, 3, CellType::Line));
        assert_eq!(&table[..2], &[1, 2]);
        assert_eq!(reader.header().num_nlist, 2);
    }

    #[test]
    fn text_names_keep_surrounding_spaces() {
        let mut reader = text_reader("1 0 1 0 0\n1 0.0 0.0 0.0\n1 1\n wall temp , K \r\n1 2.0\n");
        reader
            .read_nodes_and_cells(MeshBuffers::default())
            .expect("skip geometry");
        let header = reader.read_data_header().expect("node header");
        assert_eq!(header.components, vec![Component::new(" wall temp ", " K ", 1)]);
    }

    #[test]
    fn reads_text_sections_and_derives_ranges() {
        let mut reader = text_reader(TEXT_MESH);
        reader
            .read_nodes_and_cells(MeshBuffers::default())
            .expect("skip geometry");

        let header = reader.read_data_header().expect("node header");
        assert_eq!(header.section, crate::DataSection::Node);
        assert_eq!(header.components[1], Component::new("velocity", "m/s", 2));
        assert_eq!(reader.phase(), Phase::NodeData);

        let mut ids = vec![0; 2];
        let mut data = vec![0.0; 6];
        let range = reader
            .read_data_text(RowBuffers {
                row_id: &mut ids,
                data: &mut data,
            })
            .expect("rows");
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(data, vec![10.0, 1.0, 2.0, -5.0, 3.0, -4.0]);
        assert_eq!(range.minima, vec![-5.0, 1.0, -4.0]);
        assert_eq!(range.maxima, vec![10.0, 3.0, 2.0]);

        let header = reader.read_data_header().expect("cell header");
        assert_eq!(header.section, crate::DataSection::Cell);
        reader.skip_data_text().expect("skip cell rows");
        assert!(matches!(
            reader.read_data_header(),
            Err(UcdError::Protocol(_))
        ));
    }

    #[test]
    fn binary_only_calls_fail_on_text() {
        let mut reader = text_reader(TEXT_MESH);
        reader.read_nodes_and_cells(MeshBuffers::default()).unwrap();
        reader.read_data_header().unwrap();
        assert!(matches!(
            reader.read_data_minmax(None, None),
            Err(UcdError::FormatMismatch { .. })
        ));
        assert!(matches!(
            reader.read_data_component(None),
            Err(UcdError::FormatMismatch { .. })
        ));
        assert!(matches!(
            reader.read_active_list(None),
            Err(UcdError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn data_header_before_geometry_is_a_protocol_error() {
        let mut reader = text_reader(TEXT_MESH);
        assert!(matches!(
            reader.read_data_header(),
            Err(UcdError::Protocol(_))
        ));
    }

    #[test]
    fn body_before_header_is_a_protocol_error() {
        let mut reader = text_reader(TEXT_MESH);
        reader.read_nodes_and_cells(MeshBuffers::default()).unwrap();
        assert!(matches!(
            reader.skip_data_text(),
            Err(UcdError::Protocol(_))
        ));
    }

    #[test]
    fn unknown_cell_type_is_reported() {
        let src = "1 1 0 0 0\n1 0 0 0\n1 1 wedge 1\n";
        let mut reader = text_reader(src);
        let mut cells = vec![CellInfo::default(); 1];
        let err = reader
            .read_nodes_and_cells(MeshBuffers {
                cells: Some(&mut cells[..]),
                ..MeshBuffers::default()
            })
            .expect_err("wedge is not a UCD type");
        assert!(matches!(err, UcdError::InvalidCellType(_)));
    }

    #[test]
    fn wrong_buffer_length_is_rejected_before_reading() {
        let mut reader = text_reader(TEXT_MESH);
        let mut cells = vec![CellInfo::default(); 3];
        let err = reader
            .read_nodes_and_cells(MeshBuffers {
                cells: Some(&mut cells[..]),
                ..MeshBuffers::default()
            })
            .expect_err("three records for one cell");
        assert!(matches!(
            err,
            UcdError::BufferSize {
                expected: 1,
                found: 3,
                ..
            }
        ));
        reader
            .read_nodes_and_cells(MeshBuffers::default())
            .expect("cursor still usable");
    }

    #[test]
    fn truncated_text_reports_line() {
        let src = "3 0 0 0 0\n1 0.000000 0.000000 0.000000\n";
        let mut reader = text_reader(src);
        let (mut id, mut x, mut y, mut z) = (vec![0; 3], vec![0.0; 3], vec![0.0; 3], vec![0.0; 3]);
        let err = reader
            .read_nodes_and_cells(MeshBuffers {
                nodes: Some(NodeBuffers {
                    id: &mut id,
                    x: &mut x,
                    y: &mut y,
                    z: &mut z,
                }),
                ..MeshBuffers::default()
            })
            .expect_err("missing node lines");
        assert!(matches!(err, UcdError::Parse { line: 3, .. }));
    }

    #[test]
    fn short_binary_file_is_rejected() {
        let mut bytes = vec![MAGIC];
        for value in [4i32, 1, 0, 0, 0, 4] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        let err = UcdReader::from_reader(Cursor::new(bytes))
            .err()
            .expect("no body behind the header");
        assert!(matches!(err, UcdError::InvalidData(_)));
    }

    #[test]
    fn text_header_larger_than_the_stream_is_rejected() {
        let src = "3 0 0 0 0\n1 0 0 0\n";
        let err = UcdReader::from_reader(Cursor::new(src.as_bytes()))
            .err()
            .expect("three nodes cannot fit in eight bytes");
        assert!(matches!(err, UcdError::InvalidData(_)));
    }

    #[test]
    fn text_counts_beyond_the_binary_range_are_rejected() {
        for src in ["0 2305843009213693952 0 0 0\n", "0 100000000000 0 0 0\n", "-1 0 0 0 0\n"] {
            let err = UcdReader::from_reader(Cursor::new(src.as_bytes()))
                .err()
                .expect("count out of range");
            assert!(matches!(err, UcdError::InvalidData(_)), "{src:?}: {err}");
        }
        let src = format!("0 {} 0 0 0\n", i32::MAX);
        let err = UcdReader::from_reader(Cursor::new(src.into_bytes()))
            .err()
            .expect("no cell lines follow");
        assert!(matches!(err, UcdError::InvalidData(_)));
    }

    #[test]
    fn overflowing_binary_header_is_rejected() {
        let mut bytes = vec![MAGIC];
        for value in [i32::MAX, i32::MAX, i32::MAX, i32::MAX, 0, 0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        assert_eq!(bytes.len(), 25);
        let err = UcdReader::from_reader(Cursor::new(bytes))
            .err()
            .expect("sizes overflow");
        assert!(matches!(err, UcdError::InvalidData(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = UcdReader::open("/nonexistent/dir/mesh.inp")
            .err()
            .expect("missing file");
        assert!(matches!(err, UcdError::Open { .. }));
        assert!(err.to_string().contains("mesh.inp"));
    }
}
