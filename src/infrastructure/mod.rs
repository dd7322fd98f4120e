// Infrastructure implementations for ctorprops.

pub mod concurrency;
pub mod exporters;
pub mod parser;
pub mod project_loader;

pub use exporters::{JsonExporter, TextExporter, TextTarget};
pub use parser::CSharpParser;
pub use project_loader::ProjectLoader;
