//! Whole-file load and store
//!
//! [`MeshContent`] owns every buffer of a UCD file and drives [`UcdReader`] / [`UcdWriter`]
//! through the full call sequence. Binary data bodies are stored per component on disk; the
//! content always holds the unified row-major matrix.

use std::fs::File;
use std::io::{BufRead, BufWriter, Seek, Write};
use std::path::Path;

use log::debug;

use crate::cell_type::CellType;
use crate::error::{Result, UcdError, alloc_buffer, checked_count};
use crate::format::{
    CellInfo, ColumnRange, Component, DataSection, NLIST_STRIDE, UcdFormat, UcdHeader,
    check_widths,
};
use crate::reader::{Connectivity, MeshBuffers, NodeBuffers, RowBuffers, UcdReader};
use crate::writer::{MeshView, UcdWriter};

/// Field data attached to every node or every cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataBlock {
    pub num_rows: usize,
    pub components: Vec<Component>,
    pub minima: Vec<f32>,
    pub maxima: Vec<f32>,
    pub row_id: Vec<i32>,
    /// Row-major `num_rows * num_data` matrix.
    pub data: Vec<f32>,
}

impl DataBlock {
    /// Builds a block from its rows and derives the column ranges.
    pub fn new(components: Vec<Component>, row_id: Vec<i32>, data: Vec<f32>) -> Self {
        let mut block = Self {
            num_rows: row_id.len(),
            components,
            minima: Vec::new(),
            maxima: Vec::new(),
            row_id,
            data,
        };
        block.recompute_ranges();
        block
    }

    pub fn num_data(&self) -> usize {
        self.components.iter().map(|c| c.width).sum()
    }

    pub fn num_comp(&self) -> usize {
        self.components.len()
    }

    pub fn row(&self, i: usize) -> &[f32] {
        let n = self.num_data();
        &self.data[i * n..(i + 1) * n]
    }

    pub fn recompute_ranges(&mut self) {
        let range = ColumnRange::of_rows(&self.data, self.num_data());
        self.minima = range.minima;
        self.maxima = range.maxima;
    }

    fn validate(&self, section: DataSection, expected_rows: usize) -> Result<()> {
        let num_data = self.num_data();
        let widths: Vec<usize> = self.components.iter().map(|c| c.width).collect();
        check_widths(&widths, num_data)?;
        if num_data == 0 {
            return Err(UcdError::invalid(format!("{section} block has no components")));
        }
        let checks = [
            ("row count", self.num_rows, expected_rows),
            ("row ids", self.row_id.len(), expected_rows),
            ("minima", self.minima.len(), num_data),
            ("maxima", self.maxima.len(), num_data),
            ("values", self.data.len(), expected_rows * num_data),
        ];
        for (what, found, expected) in checks {
            if found != expected {
                return Err(UcdError::invalid(format!(
                    "{section} block {what}: expected {expected}, found {found}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything stored in one UCD file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshContent {
    pub node_id: Vec<i32>,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub cell_id: Vec<i32>,
    pub cell_mat_id: Vec<i32>,
    pub cell_type: Vec<CellType>,
    /// Row-major connectivity, [`NLIST_STRIDE`] slots per cell.
    pub cell_nlist: Vec<i32>,
    pub node_data: Option<DataBlock>,
    pub cell_data: Option<DataBlock>,
}

impl MeshContent {
    /// Load a UCD file of either format
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, UcdFormat)> {
        Self::read_all(UcdReader::open(path)?)
    }

    /// Load from a seekable buffered stream
    pub fn read_from<R: BufRead + Seek>(input: R) -> Result<(Self, UcdFormat)> {
        Self::read_all(UcdReader::from_reader(input)?)
    }

    /// Store to `path` in the given format
    pub fn store(&self, path: impl AsRef<Path>, format: UcdFormat) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        let file = File::create(path).map_err(|source| UcdError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("storing {format} UCD file {}", path.display());
        self.write_to(BufWriter::new(file), format)
    }

    /// Write to any output in the given format
    pub fn write_to<W: Write>(&self, output: W, format: UcdFormat) -> Result<()> {
        self.validate()?;
        let header = self.header();
        let mut writer = UcdWriter::new(output, format, header)?;

        let cells = self.cell_infos();
        writer.write_nodes_and_cells(MeshView {
            node_id: Some(&self.node_id),
            x: &self.x,
            y: &self.y,
            z: &self.z,
            cells: &cells,
            connectivity: &self.cell_nlist,
            stride: NLIST_STRIDE,
        })?;

        for block in [&self.node_data, &self.cell_data].into_iter().flatten() {
            write_block(&mut writer, block)?;
        }
        writer.close()
    }

    /// Header a store of this content writes.
    pub fn header(&self) -> UcdHeader {
        UcdHeader {
            num_nodes: self.num_nodes(),
            num_cells: self.num_cells(),
            num_node_data: self.node_data.as_ref().map_or(0, DataBlock::num_data),
            num_cell_data: self.cell_data.as_ref().map_or(0, DataBlock::num_data),
            num_nlist: self.cell_type.iter().map(|t| t.node_count()).sum(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.x.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cell_id.len()
    }

    /// Node ids of cell `i`.
    pub fn cell_nodes(&self, i: usize) -> &[i32] {
        let start = i * NLIST_STRIDE;
        &self.cell_nlist[start..start + self.cell_type[i].node_count()]
    }

    /// Checks that every buffer length agrees with the node and cell counts.
    pub fn validate(&self) -> Result<()> {
        let nodes = self.num_nodes();
        let cells = self.num_cells();
        let checks = [
            ("node ids", self.node_id.len(), nodes),
            ("y coordinates", self.y.len(), nodes),
            ("z coordinates", self.z.len(), nodes),
            ("cell material ids", self.cell_mat_id.len(), cells),
            ("cell types", self.cell_type.len(), cells),
            ("connectivity table", self.cell_nlist.len(), NLIST_STRIDE * cells),
        ];
        for (what, found, expected) in checks {
            if found != expected {
                return Err(UcdError::invalid(format!(
                    "{what}: expected {expected} entries, found {found}"
                )));
            }
        }
        if let Some(block) = &self.node_data {
            block.validate(DataSection::Node, nodes)?;
        }
        if let Some(block) = &self.cell_data {
            block.validate(DataSection::Cell, cells)?;
        }
        Ok(())
    }

    fn cell_infos(&self) -> Vec<CellInfo> {
        self.cell_id
            .iter()
            .zip(&self.cell_mat_id)
            .zip(&self.cell_type)
            .map(|((&id, &mat), &cell_type)| CellInfo::new(id, mat, cell_type))
            .collect()
    }

    fn read_all<R: BufRead + Seek>(mut reader: UcdReader<R>) -> Result<(Self, UcdFormat)> {
        let format = reader.format();
        let header = *reader.header();
        let (nodes, cells) = (header.num_nodes, header.num_cells);

        let mut content = MeshContent {
            node_id: alloc_buffer("node ids", nodes)?,
            x: alloc_buffer("x coordinates", nodes)?,
            y: alloc_buffer("y coordinates", nodes)?,
            z: alloc_buffer("z coordinates", nodes)?,
            cell_nlist: alloc_buffer(
                "connectivity entries",
                checked_count("connectivity table", NLIST_STRIDE, cells)?,
            )?,
            ..MeshContent::default()
        };
        let mut records: Vec<CellInfo> = alloc_buffer("cell records", cells)?;
        reader.read_nodes_and_cells(MeshBuffers {
            nodes: Some(NodeBuffers {
                id: &mut content.node_id,
                x: &mut content.x,
                y: &mut content.y,
                z: &mut content.z,
            }),
            cells: Some(&mut records[..]),
            connectivity: Some(Connectivity {
                table: &mut content.cell_nlist,
                stride: NLIST_STRIDE,
            }),
        })?;
        content.cell_id = records.iter().map(|c| c.id).collect();
        content.cell_mat_id = records.iter().map(|c| c.material_id).collect();
        content.cell_type = records.iter().map(|c| c.cell_type).collect();

        if header.num_node_data > 0 {
            content.node_data = Some(read_block(&mut reader)?);
        }
        if header.num_cell_data > 0 {
            content.cell_data = Some(read_block(&mut reader)?);
        }
        reader.close();

        debug!(
            "loaded {format} content: {} nodes, {} cells",
            content.num_nodes(),
            content.num_cells()
        );
        Ok((content, format))
    }
}

fn read_block<R: BufRead + Seek>(reader: &mut UcdReader<R>) -> Result<DataBlock> {
    let header = reader.read_data_header()?;
    let rows = reader.header().rows(header.section);
    let num_data = header.num_data();

    let mut block = DataBlock {
        num_rows: rows,
        minima: alloc_buffer("minima", num_data)?,
        maxima: alloc_buffer("maxima", num_data)?,
        row_id: alloc_buffer("row ids", rows)?,
        data: alloc_buffer("data values", checked_count("data values", rows, num_data)?)?,
        components: header.components,
    };

    if reader.is_binary() {
        reader.read_data_minmax(Some(&mut block.minima[..]), Some(&mut block.maxima[..]))?;
        let mut offset = 0;
        for component in &block.components {
            let mut values: Vec<f32> = alloc_buffer(
                "component values",
                checked_count("component values", component.width, rows)?,
            )?;
            reader.read_data_component(Some(&mut values[..]))?;
            interleave_component(&values, component.width, offset, &mut block.data, num_data);
            offset += component.width;
        }
        reader.read_active_list(None)?;
        for (id, value) in block.row_id.iter_mut().zip(1..) {
            *id = value;
        }
    } else {
        let range = reader.read_data_text(RowBuffers {
            row_id: &mut block.row_id,
            data: &mut block.data,
        })?;
        block.minima = range.minima;
        block.maxima = range.maxima;
    }
    Ok(block)
}

fn write_block<W: Write>(writer: &mut UcdWriter<W>, block: &DataBlock) -> Result<()> {
    writer.write_data_header(&block.components)?;
    match writer.format() {
        UcdFormat::Binary => {
            writer.write_data_minmax(&block.minima, &block.maxima)?;
            let num_data = block.num_data();
            let mut offset = 0;
            for component in &block.components {
                let values = extract_component(
                    &block.data,
                    num_data,
                    offset,
                    component.width,
                    block.num_rows,
                );
                writer.write_data_component(&values)?;
                offset += component.width;
            }
            writer.write_active_list(None)
        }
        UcdFormat::Text => writer.write_data_rows(&block.row_id, &block.data),
    }
}

/// Copies a component (`width` columns, row-major) into columns `offset..offset + width` of
/// the unified matrix.
fn interleave_component(
    component: &[f32],
    width: usize,
    offset: usize,
    data: &mut [f32],
    num_data: usize,
) {
    if width == 0 {
        return;
    }
    for (row, values) in component.chunks_exact(width).enumerate() {
        let start = row * num_data + offset;
        data[start..start + width].copy_from_slice(values);
    }
}

fn extract_component(
    data: &[f32],
    num_data: usize,
    offset: usize,
    width: usize,
    rows: usize,
) -> Vec<f32> {
    let mut values = Vec::with_capacity(width * rows);
    for row in 0..rows {
        let start = row * num_data + offset;
        values.extend_from_slice(&data[start..start + width]);
    }
    values
}
