//! Typed ReScript query modules from analyzed codec trees.
//!
//! The core is [`walk`] (codec tree → type references and record
//! definitions) and [`emit`] (one query → one ReScript module). Everything
//! else feeds it: [`extract`] finds embedded queries, [`discover`] finds
//! sources, [`analysis`] supplies analyzer output and [`generate`] drives a
//! whole project.
pub mod analysis;
pub mod cli;
pub mod codec;
pub mod discover;
pub mod emit;
pub mod error;
pub mod extract;
pub mod generate;
pub mod path_de;
pub mod walk;

pub use codec::{Cardinality, Codec, QueryDescriptor, QueryTypes};
pub use emit::{EmittedModule, emit, emit_file};
pub use error::GenError;
pub use walk::{DistinctTypes, GenerationOptions, Walker};
