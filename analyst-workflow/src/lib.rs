pub mod acquisition;
pub mod analysis;
pub mod assembler;
pub mod config;
pub mod interpreter;
pub mod pipeline;
pub mod render;
pub mod resilience;

pub use acquisition::{DataAcquisition, DatasetCatalog};
pub use analysis::AnalysisEngine;
pub use assembler::ResponseAssembler;
pub use config::*;
pub use interpreter::TaskInterpreter;
pub use pipeline::*;
pub use render::ScatterRenderer;
