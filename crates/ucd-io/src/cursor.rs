//! Sequential call protocol shared by [`UcdReader`](crate::UcdReader) and
//! [`UcdWriter`](crate::UcdWriter).
//!
//! A UCD file is consumed front to back: header, nodes and cells, then the node data section
//! if present, then the cell data section if present. Each data section is a header, then
//! (binary only) min/max, the body, and (binary only) the active list.

use crate::error::{Result, UcdError};
use crate::format::{DataSection, UcdFormat, UcdHeader};

/// Which data section the cursor is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    NodeData,
    CellData,
}

impl Phase {
    pub fn section(self) -> Option<DataSection> {
        match self {
            Phase::NotStarted => None,
            Phase::NodeData => Some(DataSection::Node),
            Phase::CellData => Some(DataSection::Cell),
        }
    }

    /// Phase entered by the next data section header call.
    ///
    /// Absent sections are skipped, so a file without node data goes straight to cell data.
    pub fn advance(self, header: &UcdHeader) -> Result<Phase> {
        match self {
            Phase::NotStarted if header.num_node_data > 0 => Ok(Phase::NodeData),
            Phase::NotStarted | Phase::NodeData if header.num_cell_data > 0 => Ok(Phase::CellData),
            _ => Err(UcdError::protocol(format!(
                "no data section follows {} (node data columns: {}, cell data columns: {})",
                self.describe(),
                header.num_node_data,
                header.num_cell_data
            ))),
        }
    }

    /// Last phase the file reaches once every declared section is processed.
    pub fn last(header: &UcdHeader) -> Phase {
        if header.num_cell_data > 0 {
            Phase::CellData
        } else if header.num_node_data > 0 {
            Phase::NodeData
        } else {
            Phase::NotStarted
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Phase::NotStarted => "the mesh",
            Phase::NodeData => "the node data section",
            Phase::CellData => "the cell data section",
        }
    }
}

/// Position inside the current data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    MinMax,
    Body,
    ActiveList,
    Done,
}

#[derive(Debug, Clone)]
pub(crate) struct SectionCursor {
    format: UcdFormat,
    pub(crate) header: UcdHeader,
    geometry_done: bool,
    phase: Phase,
    step: Step,
    widths: Vec<usize>,
    next_component: usize,
    rows_done: usize,
}

impl SectionCursor {
    pub(crate) fn new(format: UcdFormat, header: UcdHeader) -> Self {
        Self {
            format,
            header,
            geometry_done: false,
            phase: Phase::NotStarted,
            step: Step::Done,
            widths: Vec::new(),
            next_component: 0,
            rows_done: 0,
        }
    }

    pub(crate) fn format(&self) -> UcdFormat {
        self.format
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn require_format(&self, format: UcdFormat, operation: &'static str) -> Result<()> {
        if self.format != format {
            return Err(UcdError::FormatMismatch {
                operation,
                format: self.format,
            });
        }
        Ok(())
    }

    pub(crate) fn finish_geometry(&mut self) -> Result<()> {
        if self.geometry_done {
            return Err(UcdError::protocol("nodes and cells were already processed"));
        }
        self.geometry_done = true;
        Ok(())
    }

    /// True when the binary active list of the current section has not been handled yet.
    pub(crate) fn active_list_pending(&self) -> bool {
        self.phase != Phase::NotStarted && self.step == Step::ActiveList
    }

    /// Moves to the next data section. The caller deals with a pending active list first.
    pub(crate) fn begin_section(&mut self) -> Result<DataSection> {
        if !self.geometry_done {
            return Err(UcdError::protocol(
                "nodes and cells must be processed before any data section",
            ));
        }
        if let Some(section) = self.phase.section()
            && self.step != Step::Done
        {
            return Err(UcdError::protocol(format!(
                "{section} section is not finished (next step: {:?})",
                self.step
            )));
        }

        self.phase = self.phase.advance(&self.header)?;
        self.step = if self.format.is_binary() {
            Step::MinMax
        } else {
            Step::Body
        };
        self.widths.clear();
        self.next_component = 0;
        self.rows_done = 0;

        let section = self.current()?;
        log::debug!(
            "entering {section} section: {} rows x {} columns",
            self.header.rows(section),
            self.header.columns(section)
        );
        Ok(section)
    }

    pub(crate) fn set_widths(&mut self, widths: Vec<usize>) {
        self.widths = widths;
    }

    pub(crate) fn widths(&self) -> &[usize] {
        &self.widths
    }

    fn current(&self) -> Result<DataSection> {
        self.phase
            .section()
            .ok_or_else(|| UcdError::protocol("no data section header has been processed"))
    }

    /// Section of the current phase, provided the cursor sits at `step`.
    pub(crate) fn expect(&self, step: Step, operation: &str) -> Result<DataSection> {
        let section = self.phase.section().ok_or_else(|| {
            UcdError::protocol(format!("{operation} called before any data section header"))
        })?;
        if self.step != step {
            return Err(UcdError::protocol(format!(
                "{operation} called out of order in the {section} section (next step: {:?})",
                self.step
            )));
        }
        Ok(section)
    }

    pub(crate) fn rows(&self, section: DataSection) -> usize {
        self.header.rows(section)
    }

    pub(crate) fn columns(&self, section: DataSection) -> usize {
        self.header.columns(section)
    }

    pub(crate) fn complete_min_max(&mut self) {
        self.step = Step::Body;
    }

    /// Width of the next binary component of the current section.
    pub(crate) fn component_width(&self) -> Result<usize> {
        self.widths.get(self.next_component).copied().ok_or_else(|| {
            UcdError::protocol("every component of this section was already processed")
        })
    }

    /// Moves past one component; after the last one the active list is next.
    pub(crate) fn advance_component(&mut self) {
        self.next_component += 1;
        if self.next_component >= self.widths.len() {
            self.step = Step::ActiveList;
        }
    }

    pub(crate) fn rows_remaining(&self, section: DataSection) -> usize {
        self.rows(section) - self.rows_done
    }

    pub(crate) fn complete_rows(&mut self, section: DataSection, count: usize) {
        self.rows_done += count;
        if self.rows_done == self.rows(section) {
            self.step = Step::Done;
        }
    }

    pub(crate) fn complete_active_list(&mut self) {
        self.step = Step::Done;
    }

    /// True once nodes, cells and every declared data section have been processed.
    pub(crate) fn finished(&self) -> bool {
        self.geometry_done
            && self.phase == Phase::last(&self.header)
            && (self.phase == Phase::NotStarted || self.step == Step::Done)
    }
}
