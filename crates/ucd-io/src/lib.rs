//! Reader and writer for the UCD unstructured mesh format.
//!
//! This crate provides:
//! - **Cell topology table** for the eight UCD cell types
//! - **Sequential reader/writer** for the text and binary forms, with optional outputs so
//!   unrequested sections are skipped
//! - **Whole-file facade** ([`MeshContent`]) that loads and stores everything in one call
//! - **Summary** of a loaded mesh, printable or as JSON
//!
//! Binary files start with the magic byte `0x07` and store little-endian 32-bit integers and
//! floats; text files are whitespace separated lines.

pub mod cell_type;
pub mod content;
mod cursor;
pub mod error;
pub mod format;
pub mod reader;
pub mod summary;
pub mod writer;

pub use cell_type::CellType;
pub use content::{DataBlock, MeshContent};
pub use cursor::Phase;
pub use error::{Result, UcdError};
pub use format::{
    CellInfo, ColumnRange, Component, DataHeader, DataSection, NLIST_STRIDE, UcdFormat, UcdHeader,
};
pub use reader::{Connectivity, MeshBuffers, NodeBuffers, RowBuffers, UcdReader};
pub use summary::{BlockSummary, ContentSummary};
pub use writer::{MeshView, UcdWriter, format_sci};
