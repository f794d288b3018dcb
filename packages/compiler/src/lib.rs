//! Compiler for application source files.
//!
//! `compile` turns the text of one file into an [`ExecutableUnit`]: platform
//! imports become binds from the platform scope, type syntax is dropped,
//! markup becomes `createElement` calls and the exports are tabulated.
//! Compilation is a pure function of the source text.

pub mod ast;
pub mod cache;
pub mod error;
mod lower;
mod markup;
pub mod parser;
pub mod tokenizer;
mod types;
pub mod unit;
pub mod visitor;

#[cfg(test)]
mod tests_markup;
#[cfg(test)]
mod tests_modules;
#[cfg(test)]
mod tests_syntax;

pub use cache::{CacheStats, CompileCache, CompileOutcome};
pub use error::{CompileError, CompileErrorKind, CompileResult};
pub use unit::{CompileReport, ExecutableUnit, ExportTable, ImportKind, ImportRecord, DEFAULT_BINDING};

use pagewright_common::content_hash;
use parser::Parser;
use tracing::{debug, instrument};

/// Compile the source text of one file
#[instrument(skip(source), fields(bytes = source.len()))]
pub fn compile(source: &str) -> CompileResult<ExecutableUnit> {
    let program = Parser::new(source).parse_program()?;
    let lowered = lower::lower(program, source)?;
    debug!(
        statements = lowered.body.len(),
        imports = lowered.imports.len(),
        "compiled unit"
    );
    Ok(ExecutableUnit::new(
        lowered.body,
        lowered.exports,
        lowered.imports,
        content_hash(source),
    ))
}

/// Compile and summarize the outcome for API consumers
pub fn compile_report(source: &str) -> CompileReport {
    let result = compile(source);
    CompileReport::from_result(result.as_ref())
}
