//! Printable and JSON summary of a loaded mesh

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::content::{DataBlock, MeshContent};
use crate::error::Result;
use crate::format::{Component, UcdFormat};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub num_data: usize,
    pub components: Vec<Component>,
}

impl From<&DataBlock> for BlockSummary {
    fn from(block: &DataBlock) -> Self {
        Self {
            num_data: block.num_data(),
            components: block.components.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub format: UcdFormat,
    pub num_nodes: usize,
    pub num_cells: usize,
    pub node_data: Option<BlockSummary>,
    pub cell_data: Option<BlockSummary>,
}

impl ContentSummary {
    pub fn new(content: &MeshContent, format: UcdFormat) -> Self {
        Self {
            format,
            num_nodes: content.num_nodes(),
            num_cells: content.num_cells(),
            node_data: content.node_data.as_ref().map(BlockSummary::from),
            cell_data: content.cell_data.as_ref().map(BlockSummary::from),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn write_block(f: &mut Formatter<'_>, kind: &str, block: Option<&BlockSummary>) -> std::fmt::Result {
    let Some(block) = block else {
        return writeln!(f, "Number of {kind} data: (none)");
    };
    writeln!(f, "Number of {kind} data: {}", block.num_data)?;
    writeln!(f, "  Number of components: {}", block.components.len())?;
    for (i, component) in block.components.iter().enumerate() {
        writeln!(
            f,
            "  Comp. {i}: {} ({}) [{}]",
            component.label, component.unit, component.width
        )?;
    }
    Ok(())
}

impl Display for ContentSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of nodes: {}", self.num_nodes)?;
        writeln!(f, "Number of cells: {}", self.num_cells)?;
        write_block(f, "node", self.node_data.as_ref())?;
        write_block(f, "cell", self.cell_data.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_type::CellType;

    fn sample() -> MeshContent {
        let mut cell_nlist = vec![0; 8];
        cell_nlist[0] = 1;
        MeshContent {
            node_id: vec![1],
            x: vec![0.0],
            y: vec![0.0],
            z: vec![0.0],
            cell_id: vec![1],
            cell_mat_id: vec![0],
            cell_type: vec![CellType::Point],
            cell_nlist,
            node_data: Some(DataBlock::new(
                vec![Component::new("temperature", "K", 1)],
                vec![1],
                vec![293.0],
            )),
            cell_data: None,
        }
    }

    #[test]
    fn text_report_lists_components() {
        let summary = ContentSummary::new(&sample(), UcdFormat::Text);
        let report = summary.to_string();
        assert!(report.starts_with("Number of nodes: 1\nNumber of cells: 1\n"));
        assert!(report.contains("Number of node data: 1\n  Number of components: 1\n"));
        assert!(report.contains("  Comp. 0: temperature (K) [1]\n"));
        assert!(report.ends_with("Number of cell data: (none)\n"));
    }

    #[test]
    fn json_roundtrip() {
        let summary = ContentSummary::new(&sample(), UcdFormat::Binary);
        let json = summary.to_json().expect("serialize");
        assert!(json.contains("\"format\": \"binary\""));
        let back: ContentSummary = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, summary);
    }
}
