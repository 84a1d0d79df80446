pub mod accumulate;
pub mod catalogue;
pub mod compiler;
pub mod config;
pub mod document;
pub mod model;
pub mod persist;
pub mod registry;

pub use compiler::{CompiledProgram, CompilerError, Previews, ProgramResult, compile, compile_with_config};
pub use config::ProgramConfig;
pub use document::Document;
pub use persist::PersistedModel;
