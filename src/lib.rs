/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

pub mod assembler;
pub mod ast;
pub mod errors;
pub mod parser;

pub use assembler::Options;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Assemble one source text into a flat binary image. Fail-fast: the first
/// error aborts the pipeline and no bytes are produced.
pub fn assemble(source: &str, options: &Options) -> Result<Vec<u8>> {
    let mut lines = parser::parse_source(source).context("Failed during parsing stage")?;

    parser::local_labels::rewrite(&mut lines)
        .context("Failed during local label resolution")?;

    let mut env =
        assembler::build_symbol_env(&lines).context("Failed during symbol collection")?;

    assembler::run_layout(&lines, &mut env, options).context("Failed during layout pass")?;

    let text = assembler::generate_text(&lines, &env, options)
        .context("Failed during code generation")?;

    let image = if options.vectors {
        let mut image = assembler::vector_table::emit(&env, options)
            .context("Failed during vector table emission")?;
        image.extend(text);
        image
    } else {
        text
    };

    Ok(image)
}

/// Convenience entry point for the driver: read, assemble, hand back bytes.
pub fn assemble_file(path: &Path, options: &Options) -> Result<Vec<u8>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    assemble(&source, options)
}
