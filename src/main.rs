mod analyser;
mod ast;
mod bytecode;
mod lexer;
mod parser;
mod parser_error;
mod runtime_error;
mod token;
mod token_dumper;
mod vm;

use std::{env, fs, path::Path, process};

use crate::analyser::Analyser;
use crate::bytecode::compile::Translator;
use crate::bytecode::disasm::print_pcode;
use crate::bytecode::Pcode;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::token_dumper::TokenDumper;
use crate::vm::{StdinSource, StdoutSink, Vm, VmConfig};

fn main() {
    let args: Vec<String> = env::args().collect();

    let tokens_only = args.contains(&"--tokens".to_string());
    let ast_only = args.contains(&"--ast".to_string());
    let disasm = args.contains(&"--disasm".to_string());
    let emit = args.contains(&"--emit".to_string());
    let binary = args.contains(&"--binary".to_string());
    let exec = args.contains(&"--exec".to_string());
    let no_color = args.contains(&"--no-color".to_string());
    let verbose = args.contains(&"-v".to_string()) || args.contains(&"--verbose".to_string());

    // first non-flag argument is the filename
    let filename = args.iter().skip(1).find(|a| !a.starts_with('-'));

    let Some(filename) = filename else {
        print_usage();
        return;
    };

    if exec {
        exec_pcode_file(filename, verbose);
        return;
    }

    ensure_extension(filename);
    let source = match fs::read_to_string(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", filename, e);
            process::exit(1);
        }
    };

    if tokens_only {
        dump_tokens(&source, no_color);
        return;
    }

    compile_and_dispatch(&source, ast_only, disasm, emit, binary, verbose);
}

fn print_usage() {
    println!("CINDER - a small imperative language on a pcode stack machine");
    println!();
    println!("Usage:");
    println!("  cinder <file.cin>              Compile and run");
    println!("  cinder --tokens <file.cin>     Show tokens only (--no-color)");
    println!("  cinder --ast <file.cin>        Show the parsed AST");
    println!("  cinder --disasm <file.cin>     Show the compiled pcode listing");
    println!("  cinder --emit <file.cin>       Write <program>.pcode (--binary: .pcb)");
    println!("  cinder --exec <file.pcode>     Run persisted pcode (.pcode or .pcb)");
    println!("  cinder -v, --verbose           Trace each instruction while running");
}

fn ensure_extension(filename: &str) {
    let path = Path::new(filename);
    if path.extension().and_then(|e| e.to_str()) != Some("cin") {
        eprintln!("Error: expected a .cin file, got {}", filename);
        process::exit(1);
    }
}

fn dump_tokens(source: &str, no_color: bool) {
    let mut lexer = Lexer::new(source);

    match lexer.tokenize() {
        Ok(tokens) => {
            let mut dumper = TokenDumper::new();
            if no_color {
                dumper = dumper.no_color();
            }
            dumper.dump(&tokens);
        }
        Err(e) => {
            eprintln!("Lex error: {}", e);
            process::exit(1);
        }
    }
}

fn compile_and_dispatch(
    source: &str,
    ast_only: bool,
    disasm: bool,
    emit: bool,
    binary: bool,
    verbose: bool,
) {
    let mut lexer = Lexer::new(source);
    let tokens = match lexer.tokenize() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Lex error: {}", e);
            process::exit(1);
        }
    };

    let mut parser = Parser::new(tokens);
    let program = match parser.parse() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            process::exit(1);
        }
    };

    if ast_only {
        println!("{:#?}", program);
        return;
    }

    let table = match Analyser::analyse(&program) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if disasm {
        for symbol in table.symbols() {
            println!("; var {} @ {}", symbol.name, symbol.address);
        }
    }

    let pcode = match Translator::with_symbols(table).translate(&program) {
        Ok(pcode) => pcode,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if disasm {
        print_pcode(&pcode);
        return;
    }

    if emit {
        emit_pcode(&program.name, &pcode, binary);
        return;
    }

    run_pcode(&pcode, verbose);
}

fn emit_pcode(program_name: &str, pcode: &Pcode, binary: bool) {
    let (path, bytes) = if binary {
        let bytes = match pcode.to_binary() {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        };
        (format!("{}.pcb", program_name), bytes)
    } else {
        (
            format!("{}.pcode", program_name),
            pcode.to_text().into_bytes(),
        )
    };

    if let Err(e) = fs::write(&path, bytes) {
        eprintln!("Failed to write '{}': {}", path, e);
        process::exit(1);
    }
    println!("Pcode saved to file: {}", path);
}

fn exec_pcode_file(filename: &str, verbose: bool) {
    let path = Path::new(filename);
    let is_binary = path.extension().and_then(|e| e.to_str()) == Some("pcb");

    let pcode = if is_binary {
        let bytes = match fs::read(filename) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Failed to read '{}': {}", filename, e);
                process::exit(1);
            }
        };
        Pcode::from_binary(&bytes)
    } else {
        match fs::read_to_string(filename) {
            Ok(text) => Pcode::parse_text(&text),
            Err(e) => {
                eprintln!("Failed to read '{}': {}", filename, e);
                process::exit(1);
            }
        }
    };

    let pcode = match pcode {
        Ok(pcode) => pcode,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    run_pcode(&pcode, verbose);
}

fn run_pcode(pcode: &Pcode, verbose: bool) {
    let mut vm = Vm::with_config(VmConfig {
        trace: verbose,
        ..VmConfig::default()
    });

    let mut input = StdinSource;
    let mut output = StdoutSink;

    if let Err(e) = vm.run(pcode, &mut input, &mut output) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
