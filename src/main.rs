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

use anyhow::{Context, Result};
use clap::Parser as clap_parser;
use rasm::{Options, assemble_file};
use std::fs;
use std::path::PathBuf;

#[derive(clap_parser)]
#[clap(version = "0.1.0", about = "AVR assembler producing flat binaries")]
struct Opts {
    /// Input assembly source file
    input: PathBuf,

    /// Output binary path
    #[clap(short, long)]
    output: PathBuf,

    /// Emit the interrupt vector table before .text (default)
    #[clap(long, conflicts_with = "no_vectors")]
    vectors: bool,

    /// Emit only the .text image, no vector table
    #[clap(long)]
    no_vectors: bool,

    /// Number of interrupt vector slots
    #[clap(long, default_value_t = rasm::assembler::vector_table::DEFAULT_VECTOR_COUNT)]
    vector_count: usize,
}

fn main() -> Result<()> {
    let opts: Opts = Opts::parse();
    // Vectors are on by default; the flags are mutually exclusive.
    let options = Options {
        vectors: opts.vectors || !opts.no_vectors,
        vector_count: opts.vector_count,
    };

    let image = assemble_file(&opts.input, &options)?;

    fs::write(&opts.output, &image)
        .with_context(|| format!("Failed to write output file: {}", opts.output.display()))?;
    println!(
        "Successfully assembled {} to {}",
        opts.input.display(),
        opts.output.display()
    );

    Ok(())
}
