//! VM Translator - Main Entry Point
//!
//! Translates Nand2Tetris VM intermediate code into Hack assembly.
//!
//! # Usage
//! ```bash
//! cargo run <input.vm | input-directory>
//! ```
//!
//! A single `.vm` file translates to a same-named `.asm` file. A
//! directory of `.vm` files translates to one `.asm` file named after
//! the directory, sharing a single bootstrap and stack across all of the
//! directory's files (each still gets its own static-variable scope via
//! `set_filename`).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use vm_translator::{CodeWriter, CommandType, Parser};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.vm | input-directory>", args[0]);
        process::exit(1);
    }

    let input_path = Path::new(&args[1]);
    let output_path = get_output_path(input_path);

    if let Err(e) = translate(input_path, &output_path) {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    println!(
        "Translation complete: {} -> {}",
        input_path.display(),
        output_path.display()
    );
}

/// Collects the `.vm` files to translate for a given input path: the
/// file itself, or every `.vm` file in a directory, sorted by name for
/// deterministic output.
fn collect_vm_files(input_path: &Path) -> Result<Vec<PathBuf>> {
    if input_path.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(input_path)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "vm"))
            .collect();
        files.sort();
        Ok(files)
    } else {
        Ok(vec![input_path.to_path_buf()])
    }
}

fn translate(input_path: &Path, output_path: &Path) -> Result<()> {
    let vm_files = collect_vm_files(input_path)?;
    let mut code_writer = CodeWriter::new(output_path.to_str().unwrap())?;

    for vm_file in &vm_files {
        let mut parser = Parser::new(vm_file.to_str().unwrap())?;
        code_writer.set_filename(vm_file.to_str().unwrap());

        while parser.has_more_commands() {
            parser.advance();
            translate_command(&mut parser, &mut code_writer)?;
        }
    }

    code_writer.close()?;
    Ok(())
}

fn translate_command(parser: &mut Parser, code_writer: &mut CodeWriter) -> Result<()> {
    match parser.command_type() {
        CommandType::Arithmetic => {
            code_writer.write_arithmetic(parser.arg1())?;
        }
        CommandType::Push => {
            code_writer.write_push_pop("push", parser.arg1(), parser.arg2())?;
        }
        CommandType::Pop => {
            code_writer.write_push_pop("pop", parser.arg1(), parser.arg2())?;
        }
        CommandType::Label => {
            code_writer.write_label(parser.arg1())?;
        }
        CommandType::Goto => {
            code_writer.write_goto(parser.arg1())?;
        }
        CommandType::If => {
            code_writer.write_if(parser.arg1())?;
        }
        CommandType::Function => {
            code_writer.write_function(parser.arg1(), parser.arg2())?;
        }
        CommandType::Call => {
            code_writer.write_call(parser.arg1(), parser.arg2())?;
        }
        CommandType::Return => {
            code_writer.write_return()?;
        }
    }
    Ok(())
}

/// Determines the output `.asm` path: a file translates to a same-named
/// `.asm` file; a directory translates to `<dir>/<dir-name>.asm`.
fn get_output_path(input_path: &Path) -> PathBuf {
    if input_path.is_dir() {
        let dir_name = input_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("Output");
        input_path.join(format!("{dir_name}.asm"))
    } else {
        input_path.with_extension("asm")
    }
}
