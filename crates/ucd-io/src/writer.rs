//! UCD file writer
//!
//! Mirror of [`UcdReader`](crate::UcdReader): the header is written on creation, then nodes and
//! cells, then each declared data section in order. Binary output is little-endian.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, trace};

use crate::cursor::{Phase, SectionCursor, Step};
use crate::error::{Result, UcdError, check_len, checked_count};
use crate::format::{
    CellInfo, Component, DataSection, MAGIC, UcdFormat, UcdHeader, check_widths, pack_names,
};

/// Geometry handed to [`UcdWriter::write_nodes_and_cells`].
#[derive(Debug, Clone, Copy)]
pub struct MeshView<'a> {
    /// External node ids; `None` numbers the nodes `1..=num_nodes`. Ignored by the binary format.
    pub node_id: Option<&'a [i32]>,
    pub x: &'a [f32],
    pub y: &'a [f32],
    pub z: &'a [f32],
    pub cells: &'a [CellInfo],
    /// Row-major connectivity with `stride` slots per cell.
    pub connectivity: &'a [i32],
    pub stride: usize,
}

/// Sequential writer producing one UCD file.
pub struct UcdWriter<W: Write> {
    output: W,
    cursor: SectionCursor,
}

impl UcdWriter<BufWriter<File>> {
    /// Create `path` and write the header
    pub fn create(path: impl AsRef<Path>, format: UcdFormat, header: UcdHeader) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| UcdError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("writing {format} UCD file {}", path.display());
        Self::new(BufWriter::new(file), format, header)
    }
}

impl<W: Write> UcdWriter<W> {
    /// Write the header to `output`
    pub fn new(mut output: W, format: UcdFormat, header: UcdHeader) -> Result<Self> {
        match format {
            UcdFormat::Binary => {
                output.write_u8(MAGIC)?;
                for count in [
                    header.num_nodes,
                    header.num_cells,
                    header.num_node_data,
                    header.num_cell_data,
                    0,
                    header.num_nlist,
                ] {
                    output.write_i32::<LittleEndian>(to_i32(count, "header count")?)?;
                }
            }
            UcdFormat::Text => writeln!(
                output,
                "{} {} {} {} 0",
                header.num_nodes, header.num_cells, header.num_node_data, header.num_cell_data
            )?,
        }

        Ok(Self {
            output,
            cursor: SectionCursor::new(format, header),
        })
    }

    pub fn format(&self) -> UcdFormat {
        self.cursor.format()
    }

    pub fn header(&self) -> &UcdHeader {
        &self.cursor.header
    }

    pub fn phase(&self) -> Phase {
        self.cursor.phase()
    }

    /// Write node coordinates, cell records and connectivity.
    pub fn write_nodes_and_cells(&mut self, mesh: MeshView<'_>) -> Result<()> {
        let header = self.cursor.header;
        if let Some(ids) = mesh.node_id {
            check_len("node ids", header.num_nodes, ids.len())?;
        }
        check_len("x coordinates", header.num_nodes, mesh.x.len())?;
        check_len("y coordinates", header.num_nodes, mesh.y.len())?;
        check_len("z coordinates", header.num_nodes, mesh.z.len())?;
        check_len("cell records", header.num_cells, mesh.cells.len())?;
        check_len(
            "connectivity table",
            checked_count("connectivity table", mesh.stride, header.num_cells)?,
            mesh.connectivity.len(),
        )?;
        if let Some(cell) = mesh.cells.iter().find(|c| c.node_count > mesh.stride) {
            return Err(UcdError::invalid(format!(
                "cell {} has {} nodes, more than the connectivity stride {}",
                cell.id, cell.node_count, mesh.stride
            )));
        }
        match self.format() {
            UcdFormat::Binary => {
                let total: usize = mesh.cells.iter().map(|c| c.node_count).sum();
                if total != header.num_nlist {
                    return Err(UcdError::invalid(format!(
                        "cell node counts sum to {total} but the header declares {} connectivity entries",
                        header.num_nlist
                    )));
                }
            }
            // The text form stores no count; readers take it from the cell type.
            UcdFormat::Text => {
                let mismatch = mesh.cells.iter().find(|c| c.node_count != c.cell_type.node_count());
                if let Some(cell) = mismatch {
                    return Err(UcdError::invalid(format!(
                        "cell {} of type {} has {} nodes but text output requires {}",
                        cell.id,
                        cell.cell_type,
                        cell.node_count,
                        cell.cell_type.node_count()
                    )));
                }
            }
        }
        self.cursor.finish_geometry()?;

        match self.format() {
            UcdFormat::Binary => self.write_binary_geometry(&mesh),
            UcdFormat::Text => self.write_text_geometry(&mesh),
        }
    }

    /// Write the header of the next data section and return which section it opens.
    ///
    /// A binary active list left unwritten in the previous section is written as zeros first.
    pub fn write_data_header(&mut self, components: &[Component]) -> Result<DataSection> {
        if self.cursor.active_list_pending() {
            trace!("writing default active list");
            self.write_active_list(None)?;
        }

        let widths: Vec<usize> = components.iter().map(|c| c.width).collect();
        let columns = self
            .cursor
            .phase()
            .advance(&self.cursor.header)
            .ok()
            .and_then(|phase| phase.section())
            .map(|section| self.cursor.columns(section));
        if let Some(columns) = columns {
            check_widths(&widths, columns)?;
        }
        match self.format() {
            UcdFormat::Binary => {
                pack_names(components.iter().map(|c| c.label.as_str()), "labels")?;
                pack_names(components.iter().map(|c| c.unit.as_str()), "units")?;
            }
            UcdFormat::Text => check_text_names(components)?,
        }

        let section = self.cursor.begin_section()?;
        match self.format() {
            UcdFormat::Binary => self.write_binary_data_header(components, section)?,
            UcdFormat::Text => {
                write!(self.output, "{}", components.len())?;
                for width in &widths {
                    write!(self.output, " {width}")?;
                }
                writeln!(self.output)?;
                for component in components {
                    writeln!(self.output, "{},{}", component.label, component.unit)?;
                }
            }
        }
        self.cursor.set_widths(widths);
        Ok(section)
    }

    /// Write per-column minima and maxima (binary only).
    pub fn write_data_minmax(&mut self, minima: &[f32], maxima: &[f32]) -> Result<()> {
        const OP: &str = "writing min/max";
        self.cursor.require_format(UcdFormat::Binary, OP)?;
        let section = self.cursor.expect(Step::MinMax, OP)?;
        let columns = self.cursor.columns(section);
        check_len("minima", columns, minima.len())?;
        check_len("maxima", columns, maxima.len())?;

        write_f32s(&mut self.output, minima)?;
        write_f32s(&mut self.output, maxima)?;
        self.cursor.complete_min_max();
        Ok(())
    }

    /// Write the next binary component, `width * num_rows` values row-major within it.
    pub fn write_data_component(&mut self, values: &[f32]) -> Result<()> {
        let (width, rows) = self.begin_component(values.len())?;
        trace!("writing component of width {width} over {rows} rows");
        write_f32s(&mut self.output, values)?;
        self.cursor.advance_component();
        Ok(())
    }

    /// Write the next binary component from column-major input (`values[k * num_rows + i]` is
    /// column `k` of row `i`).
    pub fn write_data_component_column_major(&mut self, values: &[f32]) -> Result<()> {
        let (width, rows) = self.begin_component(values.len())?;
        for row in 0..rows {
            for col in 0..width {
                self.output
                    .write_f32::<LittleEndian>(values[col * rows + row])?;
            }
        }
        self.cursor.advance_component();
        Ok(())
    }

    /// Write one text data row.
    pub fn write_data_row(&mut self, id: i32, values: &[f32]) -> Result<()> {
        let section = self.begin_rows(1)?;
        check_len("row values", self.cursor.columns(section), values.len())?;
        write_text_row(&mut self.output, id, values)?;
        self.cursor.complete_rows(section, 1);
        Ok(())
    }

    /// Write text data rows from a row-major `ids.len() * num_data` matrix.
    pub fn write_data_rows(&mut self, ids: &[i32], data: &[f32]) -> Result<()> {
        let section = self.begin_rows(ids.len())?;
        let columns = self.cursor.columns(section);
        check_len("data values", ids.len() * columns, data.len())?;

        for (row, &id) in ids.iter().enumerate() {
            write_text_row(&mut self.output, id, &data[row * columns..(row + 1) * columns])?;
        }
        self.cursor.complete_rows(section, ids.len());
        Ok(())
    }

    /// Write the active-list flags closing a binary data section; `None` writes zeros.
    pub fn write_active_list(&mut self, flags: Option<&[i32]>) -> Result<()> {
        const OP: &str = "writing the active list";
        self.cursor.require_format(UcdFormat::Binary, OP)?;
        let section = self.cursor.expect(Step::ActiveList, OP)?;
        let columns = self.cursor.columns(section);
        match flags {
            Some(flags) => {
                check_len("active list", columns, flags.len())?;
                write_i32s(&mut self.output, flags.iter().copied())?;
            }
            None => write_i32s(&mut self.output, std::iter::repeat_n(0, columns))?,
        }
        self.cursor.complete_active_list();
        Ok(())
    }

    /// Flush the output and check that every declared section was written.
    pub fn close(mut self) -> Result<()> {
        if self.cursor.active_list_pending() {
            self.write_active_list(None)?;
        }
        self.output.flush()?;
        if !self.cursor.finished() {
            return Err(UcdError::protocol(format!(
                "writer closed before the file was complete (phase {:?})",
                self.cursor.phase()
            )));
        }
        Ok(())
    }

    /// Hands back the underlying output.
    pub fn into_inner(self) -> W {
        self.output
    }

    fn write_binary_geometry(&mut self, mesh: &MeshView<'_>) -> Result<()> {
        for cell in mesh.cells {
            self.output.write_i32::<LittleEndian>(cell.id)?;
            self.output.write_i32::<LittleEndian>(cell.material_id)?;
            self.output.write_i32::<LittleEndian>(cell.cell_type.code())?;
            self.output
                .write_i32::<LittleEndian>(to_i32(cell.node_count, "node count")?)?;
        }
        for (row, cell) in mesh.cells.iter().enumerate() {
            let start = row * mesh.stride;
            write_i32s(
                &mut self.output,
                mesh.connectivity[start..start + cell.node_count].iter().copied(),
            )?;
        }
        write_f32s(&mut self.output, mesh.x)?;
        write_f32s(&mut self.output, mesh.y)?;
        write_f32s(&mut self.output, mesh.z)?;
        Ok(())
    }

    fn write_text_geometry(&mut self, mesh: &MeshView<'_>) -> Result<()> {
        for i in 0..mesh.x.len() {
            let id = match mesh.node_id {
                Some(ids) => ids[i],
                None => to_i32(i + 1, "node id")?,
            };
            writeln!(
                self.output,
                "{id} {} {} {}",
                format_sci(mesh.x[i]),
                format_sci(mesh.y[i]),
                format_sci(mesh.z[i])
            )?;
        }

        for (row, cell) in mesh.cells.iter().enumerate() {
            write!(
                self.output,
                "{} {} {}",
                cell.id, cell.material_id, cell.cell_type
            )?;
            let start = row * mesh.stride;
            for node in &mesh.connectivity[start..start + cell.node_count] {
                write!(self.output, " {node}")?;
            }
            writeln!(self.output)?;
        }
        Ok(())
    }

    fn write_binary_data_header(
        &mut self,
        components: &[Component],
        section: DataSection,
    ) -> Result<()> {
        let labels = pack_names(components.iter().map(|c| c.label.as_str()), "labels")?;
        let units = pack_names(components.iter().map(|c| c.unit.as_str()), "units")?;
        self.output.write_all(&labels)?;
        self.output.write_all(&units)?;

        self.output
            .write_i32::<LittleEndian>(to_i32(components.len(), "component count")?)?;
        let columns = self.cursor.columns(section);
        let mut widths = vec![0i32; columns];
        for (slot, component) in widths.iter_mut().zip(components) {
            *slot = to_i32(component.width, "component width")?;
        }
        write_i32s(&mut self.output, widths)
    }

    /// Validates the next binary component against `len`; returns its width and row count.
    fn begin_component(&self, len: usize) -> Result<(usize, usize)> {
        const OP: &str = "writing a binary data component";
        self.cursor.require_format(UcdFormat::Binary, OP)?;
        let section = self.cursor.expect(Step::Body, OP)?;
        let width = self.cursor.component_width()?;
        let rows = self.cursor.rows(section);
        check_len("component values", width * rows, len)?;
        Ok((width, rows))
    }

    fn begin_rows(&self, count: usize) -> Result<DataSection> {
        const OP: &str = "writing text data rows";
        self.cursor.require_format(UcdFormat::Text, OP)?;
        let section = self.cursor.expect(Step::Body, OP)?;
        let remaining = self.cursor.rows_remaining(section);
        if count > remaining {
            return Err(UcdError::protocol(format!(
                "{count} rows written but only {remaining} remain in the {section} section"
            )));
        }
        Ok(section)
    }
}

/// Formats a value the way C's `%e` does: `-1.234560e+02`.
pub fn format_sci(value: f32) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let formatted = format!("{:.6e}", f64::from(value));
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => formatted,
    }
}

fn check_text_names(components: &[Component]) -> Result<()> {
    for component in components {
        if component.label.contains([',', '\n', '\r']) {
            return Err(UcdError::invalid(format!(
                "label `{}` cannot contain a comma or line break",
                component.label
            )));
        }
        if component.unit.contains(['\n', '\r']) {
            return Err(UcdError::invalid(format!(
                "unit of `{}` cannot contain a line break",
                component.label
            )));
        }
    }
    Ok(())
}

fn write_text_row<W: Write>(output: &mut W, id: i32, values: &[f32]) -> Result<()> {
    write!(output, "{id}")?;
    for &value in values {
        write!(output, " {}", format_sci(value))?;
    }
    writeln!(output)?;
    Ok(())
}

fn write_f32s<W: Write>(output: &mut W, values: &[f32]) -> Result<()> {
    for &value in values {
        output.write_f32::<LittleEndian>(value)?;
    }
    Ok(())
}

fn write_i32s<W: Write>(output: &mut W, values: impl IntoIterator<Item = i32>) -> Result<()> {
    for value in values {
        output.write_i32::<LittleEndian>(value)?;
    }
    Ok(())
}

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| UcdError::invalid(format!("{what} {value} does not fit a 32-bit field")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_type::CellType;
    use crate::format::FIELD_FILLER;

    fn header(ndata: usize, cdata: usize) -> UcdHeader {
        UcdHeader {
            num_nodes: 2,
            num_cells: 1,
            num_node_data: ndata,
            num_cell_data: cdata,
            num_nlist: 2,
        }
    }

    fn line_mesh<'a>(cells: &'a [CellInfo], connectivity: &'a [i32]) -> MeshView<'a> {
        MeshView {
            node_id: None,
            x: &[0.0, 1.0],
            y: &[0.0, 0.0],
            z: &[0.0, -0.25],
            cells,
            connectivity,
            stride: 8,
        }
    }

    #[test]
    fn sci_matches_c_printf() {
        assert_eq!(format_sci(1.0), "1.000000e+00");
        assert_eq!(format_sci(0.0), "0.000000e+00");
        assert_eq!(format_sci(-0.25), "-2.500000e-01");
        assert_eq!(format_sci(12345.0), "1.234500e+04");
        assert_eq!(format_sci(1.0e-20), "1.000000e-20");
        assert_eq!(format_sci(f32::NEG_INFINITY), "-inf");
    }

    #[test]
    fn text_geometry_lines() {
        let cells = [CellInfo::new(5, 2, CellType::Line)];
        let mut connectivity = [0; 8];
        connectivity[..2].copy_from_slice(&[1, 2]);

        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Text, header(0, 0)).unwrap();
        writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2 1 0 0 0");
        assert_eq!(lines[1], "1 0.000000e+00 0.000000e+00 0.000000e+00");
        assert_eq!(lines[2], "2 1.000000e+00 0.000000e+00 -2.500000e-01");
        assert_eq!(lines[3], "5 2 line 1 2");
    }

    #[test]
    fn text_rejects_counts_that_disagree_with_the_type() {
        let mut cell = CellInfo::new(5, 2, CellType::Line);
        cell.node_count = 1;
        let connectivity = [1, 0, 0, 0, 0, 0, 0, 0];

        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Text, header(0, 0)).unwrap();
        let result = writer.write_nodes_and_cells(line_mesh(&[cell], &connectivity));
        assert!(matches!(result, Err(UcdError::InvalidData(_))));
        assert_eq!(writer.phase(), Phase::NotStarted);
        assert_eq!(writer.into_inner(), b"2 1 0 0 0\n");
    }

    #[test]
    fn binary_header_and_cell_record_order() {
        let cells = [CellInfo::new(5, 2, CellType::Line)];
        let mut connectivity = [0; 8];
        connectivity[..2].copy_from_slice(&[1, 2]);

        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Binary, header(0, 0)).unwrap();
        writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .unwrap();
        let bytes = writer.into_inner();
        assert_eq!(Some(bytes.len() as u64), header(0, 0).binary_file_size());
        assert_eq!(bytes[0], MAGIC);

        let ints: Vec<i32> = bytes[1..]
            .chunks_exact(4)
            .take(12)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(&ints[..6], &[2, 1, 0, 0, 0, 2]);
        // id, material, type code, node count
        assert_eq!(&ints[6..10], &[5, 2, 1, 2]);
        assert_eq!(&ints[10..12], &[1, 2]);
    }

    #[test]
    fn binary_rejects_inconsistent_connectivity_length() {
        let cells = [CellInfo::new(5, 2, CellType::Triangle)];
        let connectivity = [1, 2, 3, 0, 0, 0, 0, 0];
        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Binary, header(0, 0)).unwrap();
        let err = writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .expect_err("3 nodes against a declared 2");
        assert!(matches!(err, UcdError::InvalidData(_)));
    }

    #[test]
    fn binary_data_header_packs_names_and_pads_widths() {
        let cells = [CellInfo::new(1, 0, CellType::Line)];
        let connectivity = [1, 2, 0, 0, 0, 0, 0, 0];
        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Binary, header(3, 0)).unwrap();
        writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .unwrap();
        let before = header(0, 0).binary_file_size().unwrap() as usize;

        let section = writer
            .write_data_header(&[Component::new("p", "Pa", 1), Component::new("u", "m/s", 2)])
            .unwrap();
        assert_eq!(section, DataSection::Node);
        let bytes = writer.into_inner();
        let labels = &bytes[before..before + 1024];
        assert_eq!(&labels[..4], b"p.u.");
        assert_eq!(labels[4], FIELD_FILLER);
        let units = &bytes[before + 1024..before + 2048];
        assert_eq!(&units[..8], b"Pa.m/s.0");

        let ints: Vec<i32> = bytes[before + 2048..]
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(ints, vec![2, 1, 2, 0]);
    }

    #[test]
    fn widths_must_match_section_columns() {
        let cells = [CellInfo::new(1, 0, CellType::Line)];
        let connectivity = [1, 2, 0, 0, 0, 0, 0, 0];
        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Text, header(3, 0)).unwrap();
        writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .unwrap();
        assert!(matches!(
            writer.write_data_header(&[Component::new("p", "Pa", 2)]),
            Err(UcdError::InvalidData(_))
        ));
        assert_eq!(writer.phase(), Phase::NotStarted);
    }

    #[test]
    fn column_major_component_is_transposed() {
        let cells = [CellInfo::new(1, 0, CellType::Line)];
        let connectivity = [1, 2, 0, 0, 0, 0, 0, 0];
        let mut row_major = UcdWriter::new(Vec::new(), UcdFormat::Binary, header(2, 0)).unwrap();
        let mut col_major = UcdWriter::new(Vec::new(), UcdFormat::Binary, header(2, 0)).unwrap();
        for writer in [&mut row_major, &mut col_major] {
            writer
                .write_nodes_and_cells(line_mesh(&cells, &connectivity))
                .unwrap();
            writer
                .write_data_header(&[Component::new("v", "", 2)])
                .unwrap();
            writer.write_data_minmax(&[1.0, 2.0], &[3.0, 4.0]).unwrap();
        }
        // rows (1, 2) and (3, 4)
        row_major.write_data_component(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        col_major
            .write_data_component_column_major(&[1.0, 3.0, 2.0, 4.0])
            .unwrap();
        assert_eq!(row_major.into_inner(), col_major.into_inner());
    }

    #[test]
    fn text_rows_one_at_a_time() {
        let cells = [CellInfo::new(1, 0, CellType::Line)];
        let connectivity = [1, 2, 0, 0, 0, 0, 0, 0];
        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Text, header(1, 0)).unwrap();
        writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .unwrap();
        writer
            .write_data_header(&[Component::new("t", "K", 1)])
            .unwrap();
        writer.write_data_row(1, &[300.0]).unwrap();
        writer.write_data_row(2, &[310.5]).unwrap();
        assert!(matches!(
            writer.write_data_row(3, &[0.0]),
            Err(UcdError::Protocol(_))
        ));

        let mut buffer = Vec::new();
        std::mem::swap(&mut buffer, &mut writer.output);
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with("1 1\nt,K\n1 3.000000e+02\n2 3.105000e+02\n"));
        writer.close().expect("complete file");
    }

    #[test]
    fn text_labels_with_commas_are_rejected() {
        let cells = [CellInfo::new(1, 0, CellType::Line)];
        let connectivity = [1, 2, 0, 0, 0, 0, 0, 0];
        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Text, header(1, 0)).unwrap();
        writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .unwrap();
        assert!(matches!(
            writer.write_data_header(&[Component::new("a,b", "K", 1)]),
            Err(UcdError::InvalidData(_))
        ));
    }

    #[test]
    fn close_fills_in_a_pending_active_list() {
        let cells = [CellInfo::new(1, 0, CellType::Line)];
        let connectivity = [1, 2, 0, 0, 0, 0, 0, 0];
        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Binary, header(0, 1)).unwrap();
        writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .unwrap();
        writer
            .write_data_header(&[Component::new("m", "", 1)])
            .unwrap();
        writer.write_data_minmax(&[0.0], &[0.0]).unwrap();
        writer.write_data_component(&[0.0]).unwrap();
        writer.close().expect("active list defaulted to zeros");
    }

    #[test]
    fn close_before_data_is_a_protocol_error() {
        let cells = [CellInfo::new(1, 0, CellType::Line)];
        let connectivity = [1, 2, 0, 0, 0, 0, 0, 0];
        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Text, header(1, 0)).unwrap();
        writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .unwrap();
        assert!(matches!(writer.close(), Err(UcdError::Protocol(_))));
    }

    #[test]
    fn text_only_rows_fail_on_binary() {
        let cells = [CellInfo::new(1, 0, CellType::Line)];
        let connectivity = [1, 2, 0, 0, 0, 0, 0, 0];
        let mut writer = UcdWriter::new(Vec::new(), UcdFormat::Binary, header(1, 0)).unwrap();
        writer
            .write_nodes_and_cells(line_mesh(&cells, &connectivity))
            .unwrap();
        writer
            .write_data_header(&[Component::new("t", "K", 1)])
            .unwrap();
        assert!(matches!(
            writer.write_data_row(1, &[0.0]),
            Err(UcdError::FormatMismatch { .. })
        ));
    }
}
