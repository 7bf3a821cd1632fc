//! CLI tool for xlmerge - merges a computed workbook into a template
//!
//! Usage:
//!   xlmerge_cli <source.xlsx> <template.xlsx|xlsm> <config.json>
//!   xlmerge_cli <source.xlsx> <template.xlsx|xlsm> <config.json> -o out.xlsx

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;

use xlmerge::parser::parse;
use xlmerge::{merge, writer, MergeConfig};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        eprintln!(
            "Usage: xlmerge_cli <source.xlsx> <template.xlsx|xlsm> <config.json> [-o output]"
        );
        std::process::exit(1);
    }

    let source_path = &args[1];
    let template_path = &args[2];
    let config_path = &args[3];
    let output_arg = if args.len() > 5 && args[4] == "-o" {
        Some(args[5].clone())
    } else {
        None
    };

    // Read and decode the configuration
    let config_json = match fs::read_to_string(config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", config_path, e);
            std::process::exit(1);
        }
    };
    let config = match MergeConfig::from_json(&config_json) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error in {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    // Read and parse both workbooks
    let source_bytes = match fs::read(source_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {}: {}", source_path, e);
            std::process::exit(1);
        }
    };
    let template_bytes = match fs::read(template_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {}: {}", template_path, e);
            std::process::exit(1);
        }
    };
    let source = match parse(&source_bytes) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("Error parsing {}: {}", source_path, e);
            std::process::exit(1);
        }
    };
    let mut target = match parse(&template_bytes) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("Error parsing {}: {}", template_path, e);
            std::process::exit(1);
        }
    };

    // Merge and patch the template
    if let Err(e) = merge(&source, &mut target, &config) {
        eprintln!("Merge failed: {}", e);
        std::process::exit(1);
    }
    let out_bytes = match writer::write(&template_bytes, &target) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error writing output: {}", e);
            std::process::exit(1);
        }
    };

    // Keep the template's macro-ness in the default output name
    let output_path = output_arg.unwrap_or_else(|| {
        if target.has_vba {
            "merged.xlsm".to_string()
        } else {
            "merged.xlsx".to_string()
        }
    });

    if let Err(e) = fs::write(&output_path, &out_bytes) {
        eprintln!("Error writing {}: {}", output_path, e);
        std::process::exit(1);
    }
    eprintln!("Written: {}", output_path);
}
