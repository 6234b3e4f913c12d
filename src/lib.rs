/// The lexer and parser take the source input, mapping it into an AST.
pub mod parsing;

/// The lowerer takes the AST, resolves names and maps the tree into the
/// flat, id-addressed HIR.
pub mod lowering;

/// The type checker assigns a concrete type to every HIR expression and
/// enforces the implicit cast rules.
pub mod type_checking;

/// Code generation maps the typed HIR into the instruction-level IR.
pub mod codegen;

pub mod hir;
pub mod ir;

mod common;

pub use common::{Span, Type};

pub use codegen::generate;
pub use lowering::lower;
pub use parsing::parse;
pub use type_checking::type_check;
