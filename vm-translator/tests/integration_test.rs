//! End-to-end tests that drive the library directly against inline VM
//! source, writing scratch `.vm`/`.asm` files via `tempfile` rather than
//! depending on checked-in fixtures.

use std::fs;
use std::io::Read;

use vm_translator::{CodeWriter, CommandType, Parser};

fn translate_source(dir: &std::path::Path, filename: &str, source: &str) -> String {
    let vm_path = dir.join(filename);
    fs::write(&vm_path, source).unwrap();

    let asm_path = vm_path.with_extension("asm");
    let mut writer = CodeWriter::new(asm_path.to_str().unwrap()).unwrap();
    let mut parser = Parser::new(vm_path.to_str().unwrap()).unwrap();
    writer.set_filename(vm_path.to_str().unwrap());

    while parser.has_more_commands() {
        parser.advance();
        match parser.command_type() {
            CommandType::Arithmetic => writer.write_arithmetic(parser.arg1()).unwrap(),
            CommandType::Push => writer
                .write_push_pop("push", parser.arg1(), parser.arg2())
                .unwrap(),
            CommandType::Pop => writer
                .write_push_pop("pop", parser.arg1(), parser.arg2())
                .unwrap(),
            CommandType::Label => writer.write_label(parser.arg1()).unwrap(),
            CommandType::Goto => writer.write_goto(parser.arg1()).unwrap(),
            CommandType::If => writer.write_if(parser.arg1()).unwrap(),
            CommandType::Function => writer
                .write_function(parser.arg1(), parser.arg2())
                .unwrap(),
            CommandType::Call => writer.write_call(parser.arg1(), parser.arg2()).unwrap(),
            CommandType::Return => writer.write_return().unwrap(),
        }
    }
    writer.close().unwrap();

    let mut contents = String::new();
    fs::File::open(&asm_path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    contents
}

/// `push constant 7; push constant 8; add` should push a single 15 onto
/// the stack (modulo the scratch registers the code writer uses
/// internally to compute the sum).
#[test]
fn test_push_constants_and_add() {
    let dir = tempfile::tempdir().unwrap();
    let asm = translate_source(&dir, "Add.vm", "push constant 7\npush constant 8\nadd\n");

    assert!(asm.contains("@7"));
    assert!(asm.contains("@8"));
    assert!(asm.contains("D+M")); // the add operation body
}

/// A directory of `.vm` files shares one bootstrap and one stack across
/// all of them; static variables stay scoped per source file via
/// `set_filename`.
#[test]
fn test_static_segment_is_scoped_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let asm_a = translate_source(&dir, "Foo.vm", "push constant 1\npop static 0\n");
    let asm_b = translate_source(&dir, "Bar.vm", "push constant 2\npop static 0\n");

    assert!(asm_a.contains("Foo.0"));
    assert!(asm_b.contains("Bar.0"));
}

/// Function/call/return round trip: a function with two locals, called
/// with zero arguments, returns to a `ret.0`-qualified label and its
/// locals are zero-initialized at entry.
#[test]
fn test_function_call_return_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let asm = translate_source(
        &dir,
        "Sys.vm",
        "function Foo.bar 2\n\
         push constant 5\n\
         return\n\
         function Main.main 0\n\
         call Foo.bar 0\n\
         return\n",
    );

    assert!(asm.contains("(Foo.bar)"));
    assert!(asm.contains("(Main.main)"));
    assert!(asm.contains("Main.main$ret.0"));
    assert!(asm.contains("@Foo.bar\n0;JMP"));
}

/// Branching commands are qualified by the enclosing function, so two
/// functions may each define a label named `LOOP` without collision.
#[test]
fn test_labels_are_function_qualified() {
    let dir = tempfile::tempdir().unwrap();
    let asm = translate_source(
        &dir,
        "Loops.vm",
        "function A.run 0\n\
         label LOOP\n\
         goto LOOP\n\
         return\n\
         function B.run 0\n\
         label LOOP\n\
         if-goto LOOP\n\
         return\n",
    );

    assert!(asm.contains("(A.run$LOOP)"));
    assert!(asm.contains("(B.run$LOOP)"));
}

/// The bootstrap prologue sets `SP=256` and calls `Sys.init` before any
/// translated file's own commands appear.
#[test]
fn test_bootstrap_precedes_translated_code() {
    let dir = tempfile::tempdir().unwrap();
    let asm = translate_source(&dir, "Main.vm", "function Main.main 0\nreturn\n");

    let bootstrap_pos = asm.find("@256").unwrap();
    let main_pos = asm.find("(Main.main)").unwrap();
    assert!(bootstrap_pos < main_pos);
}

/// Command keywords are case-insensitive.
#[test]
fn test_command_keywords_are_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let asm = translate_source(&dir, "Case.vm", "PUSH constant 1\nPUSH constant 2\nADD\n");
    assert!(asm.contains("@1"));
    assert!(asm.contains("@2"));
}
