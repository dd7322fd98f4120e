// Domain layer: syntax trees and the constructor fix engine.

pub mod analyzers;
pub mod ast;
pub mod diagnostics;
pub mod fix;
pub mod make;
pub mod matcher;
pub mod model;
pub mod rewrite;
pub mod synth;
pub mod syntax;
pub mod tree;
