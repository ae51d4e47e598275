//! Cell topology table
//!
//! ```text
//! code  name    topology        nodes
//!  0    pt      point             1
//!  1    line    line              2
//!  2    tri     triangle          3
//!  3    quad    quadrilateral     4
//!  4    tet     tetrahedron       4
//!  5    pyr     pyramid           5
//!  6    prism   prism             6
//!  7    hex     hexahedron        8
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{Result, UcdError};

/// UCD cell types, numbered by their binary type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellType {
    #[default]
    Point = 0,
    Line = 1,
    Triangle = 2,
    Quadrilateral = 3,
    Tetrahedron = 4,
    Pyramid = 5,
    Prism = 6,
    Hexahedron = 7,
}

impl CellType {
    pub const ALL: [CellType; 8] = [
        CellType::Point,
        CellType::Line,
        CellType::Triangle,
        CellType::Quadrilateral,
        CellType::Tetrahedron,
        CellType::Pyramid,
        CellType::Prism,
        CellType::Hexahedron,
    ];

    /// Largest node count of any cell type (the hexahedron).
    pub const MAX_NODES: usize = 8;

    pub fn from_code(code: i32) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or_else(|| UcdError::InvalidCellType(format!("type code {code} is out of range")))
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "pt" => Ok(CellType::Point),
            "line" => Ok(CellType::Line),
            "tri" => Ok(CellType::Triangle),
            "quad" => Ok(CellType::Quadrilateral),
            "tet" => Ok(CellType::Tetrahedron),
            "pyr" => Ok(CellType::Pyramid),
            "prism" => Ok(CellType::Prism),
            "hex" => Ok(CellType::Hexahedron),
            other => Err(UcdError::InvalidCellType(format!(
                "unknown type name `{other}`"
            ))),
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            CellType::Point => "pt",
            CellType::Line => "line",
            CellType::Triangle => "tri",
            CellType::Quadrilateral => "quad",
            CellType::Tetrahedron => "tet",
            CellType::Pyramid => "pyr",
            CellType::Prism => "prism",
            CellType::Hexahedron => "hex",
        }
    }

    /// Number of nodes in one cell of this type.
    ///
    /// Equal to the type code, except that point and the types below the tetrahedron, and
    /// the hexahedron, have one more.
    pub fn node_count(self) -> usize {
        let code = self as usize;
        if code < 4 || code == 7 { code + 1 } else { code }
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CellType {
    type Err = UcdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}
