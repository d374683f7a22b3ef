mod accumulator;
mod profile;
mod tree;


pub use accumulator::{truncate_chars, SchemaAccumulator};
pub use profile::{
    DocumentSchema, ElementProfile, SchemaStatistics, GENERIC_DOCUMENT_TYPE,
};
pub use tree::{build_structure_tree, StructureNode};
