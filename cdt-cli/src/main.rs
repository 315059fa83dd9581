//! Headless JSON adapter over `cdt`: host-platform scheduling, logging
//! and serialization are explicitly the caller's concern, and this
//! binary is exactly that caller-supplied glue, stdin-JSON-in,
//! stdout-JSON-out.
//!
//! Reads an [`Input`] JSON document from stdin, builds a [`Settings`]
//! from the CLI flags (overriding [`Settings::default`]), runs
//! [`cdt::triangulate`], and writes the resulting mesh as JSON to
//! stdout.

mod core;

use std::io::{self, Read};

use cdt::{Preprocessor, Settings};
use clap::Parser;

/// Mirrors [`cdt::Settings`]'s fields one flag per field.
#[derive(Parser, Debug)]
#[command(name = "cdt-cli", about = "Constrained Delaunay triangulation over a JSON point set")]
struct Args {
    #[arg(long, value_enum, default_value_t = PreprocessorArg::None)]
    preprocessor: PreprocessorArg,

    #[arg(long)]
    auto_holes_and_boundary: bool,

    #[arg(long)]
    refine_mesh: bool,

    #[arg(long)]
    restore_boundary: bool,

    #[arg(long)]
    no_validate: bool,

    #[arg(long, default_value_t = 1_000_000)]
    sloan_max_iters: u64,

    #[arg(long, default_value_t = 1.0)]
    refinement_area: f64,

    /// Minimum refinement angle, in degrees (converted to radians).
    #[arg(long, default_value_t = 5.0)]
    refinement_angle_deg: f64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PreprocessorArg {
    None,
    Com,
    Pca,
}

impl From<PreprocessorArg> for Preprocessor {
    fn from(p: PreprocessorArg) -> Self {
        match p {
            PreprocessorArg::None => Preprocessor::None,
            PreprocessorArg::Com => Preprocessor::Com,
            PreprocessorArg::Pca => Preprocessor::Pca,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let settings = Settings::builder()
        .preprocessor(args.preprocessor.into())
        .auto_holes_and_boundary(args.auto_holes_and_boundary)
        .refine_mesh(args.refine_mesh)
        .restore_boundary(args.restore_boundary)
        .validate_input(!args.no_validate)
        .sloan_max_iters(args.sloan_max_iters)
        .refinement(args.refinement_area, args.refinement_angle_deg.to_radians())
        .build();

    let mut input_str = String::new();
    io::stdin().read_to_string(&mut input_str)?;
    let input: core::Input = serde_json::from_str(&input_str)?;

    log::debug!("read {} positions, {} constraint edges", input.positions.len(), input.constraint_edges.len() / 2);

    let output = core::run(input, &settings);
    println!("{}", serde_json::to_string(&output)?);

    Ok(())
}
