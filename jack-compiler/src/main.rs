//! Jack Compiler - Main Entry Point
//!
//! Compiles Nand2Tetris Jack source into VM intermediate code.
//!
//! # Usage
//! ```bash
//! cargo run <input.jack | input-directory>
//! ```
//!
//! A single `.jack` file compiles to a same-named `.vm` file. A
//! directory compiles every `.jack` file under it (non-recursive), one
//! `.vm` output per input, mirroring the VM translator's directory mode
//! but with a separate output per unit rather than one shared file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use jack_compiler::CompilationEngine;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.jack | input-directory>", args[0]);
        process::exit(1);
    }

    let input_path = Path::new(&args[1]);

    match collect_jack_files(input_path) {
        Ok(files) if files.is_empty() => {
            eprintln!("Error: no .jack files found under {}", input_path.display());
            process::exit(1);
        }
        Ok(files) => {
            for jack_file in &files {
                if let Err(e) = compile_file(jack_file) {
                    eprintln!("Error compiling {}: {e}", jack_file.display());
                    process::exit(1);
                }
                println!(
                    "Compiled {} -> {}",
                    jack_file.display(),
                    jack_file.with_extension("vm").display()
                );
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Collects the `.jack` files to compile for a given input path: the
/// file itself, or every `.jack` file in a directory, sorted by name
/// for deterministic output order.
fn collect_jack_files(input_path: &Path) -> Result<Vec<PathBuf>> {
    if input_path.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(input_path)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "jack"))
            .collect();
        files.sort();
        Ok(files)
    } else {
        Ok(vec![input_path.to_path_buf()])
    }
}

fn compile_file(jack_path: &Path) -> Result<()> {
    let source = fs::read_to_string(jack_path)?;
    let output_path = jack_path.with_extension("vm");
    let engine = CompilationEngine::new(&source, output_path.to_str().unwrap())?;
    engine.compile()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_compiles_to_same_stem_vm() {
        let dir = tempfile::tempdir().unwrap();
        let jack_path = dir.path().join("Main.jack");
        fs::write(&jack_path, "class Main { function void run() { return; } }").unwrap();

        compile_file(&jack_path).unwrap();

        let vm_path = jack_path.with_extension("vm");
        assert!(vm_path.exists());
        let contents = fs::read_to_string(&vm_path).unwrap();
        assert!(contents.contains("function Main.run 0"));
    }

    #[test]
    fn test_directory_input_collects_jack_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Zeta.jack"),
            "class Zeta { function void run() { return; } }",
        )
        .unwrap();
        fs::write(
            dir.path().join("Alpha.jack"),
            "class Alpha { function void run() { return; } }",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = collect_jack_files(dir.path()).unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Alpha.jack", "Zeta.jack"]);
    }
}
