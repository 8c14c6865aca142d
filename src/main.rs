mod bytecode;
mod frontend;
mod runtime;

use std::io::{self, Write};
use std::{env, fs, path::Path};

use crate::bytecode::Chunk;
use crate::bytecode::compile::compile;
use crate::bytecode::disasm::print_chunk;
use crate::frontend::token_dumper::TokenDumper;
use crate::runtime::Vm;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        print_usage();
        return;
    }

    let tokens_only = args.contains(&"--tokens".to_string());
    let disasm = args.contains(&"--disasm".to_string());
    let trace = args.contains(&"--trace".to_string());
    let compile_only = args.contains(&"--compile".to_string());
    let no_color = args.contains(&"--no-color".to_string());

    // non-flag arguments are filenames; at most one is accepted
    let files: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with('-')).collect();
    if files.len() > 1 {
        print_usage();
        std::process::exit(64);
    }

    match files.first() {
        Some(filename) => {
            run_file(filename, tokens_only, disasm, trace, compile_only, no_color);
        }
        None => {
            if tokens_only || disasm || compile_only {
                print_usage();
                std::process::exit(64);
            }
            repl(trace);
        }
    }
}

fn print_usage() {
    println!("FLINT - Expression Compiler and Stack Machine");
    println!();
    println!("Usage:");
    println!("  flint                     Start an interactive session (:q quits)");
    println!("  flint <file.fl>           Compile and run a source file");
    println!("  flint <file.flc>          Run an already compiled chunk");
    println!("  flint --compile <file>    Compile to a .flc file next to the source");
    println!("  flint --disasm <file>     List the compiled chunk, then run it");
    println!("  flint --tokens <file>     Show tokens only");
    println!("  flint --trace <file>      Echo each instruction while running");
    println!("  flint --help, -h          Show this help");
}

fn run_file(
    filename: &str,
    tokens_only: bool,
    disasm: bool,
    trace: bool,
    compile_only: bool,
    no_color: bool,
) {
    if is_compiled(filename) {
        run_compiled_file(filename, disasm, trace);
        return;
    }

    let source = match fs::read_to_string(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", filename, e);
            std::process::exit(74);
        }
    };

    if !source.is_ascii() {
        eprintln!("Error: '{}' contains non-ASCII bytes", filename);
        std::process::exit(1);
    }

    if tokens_only {
        dump_tokens(&source, no_color);
        return;
    }

    let mut chunk = Chunk::new();
    let report = compile(&source, &mut chunk);
    if report.had_error {
        for error in &report.errors {
            eprintln!("{}", error);
        }
        std::process::exit(1);
    }

    if compile_only {
        write_compiled(filename, &chunk);
        return;
    }

    if disasm {
        print_chunk(&chunk, filename);
    }

    run_chunk(&chunk, trace);
}

fn is_compiled(filename: &str) -> bool {
    Path::new(filename).extension().and_then(|e| e.to_str()) == Some("flc")
}

fn run_compiled_file(filename: &str, disasm: bool, trace: bool) {
    let bytes = match fs::read(filename) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", filename, e);
            std::process::exit(74);
        }
    };

    let chunk = match Chunk::from_bytes(&bytes) {
        Ok(chunk) => chunk,
        Err(e) => {
            eprintln!("Failed to load '{}': {}", filename, e);
            std::process::exit(1);
        }
    };

    if disasm {
        print_chunk(&chunk, filename);
    }

    run_chunk(&chunk, trace);
}

fn write_compiled(filename: &str, chunk: &Chunk) {
    let out = Path::new(filename).with_extension("flc");

    let bytes = match chunk.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to encode '{}': {}", filename, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = fs::write(&out, bytes) {
        eprintln!("Failed to write '{}': {}", out.display(), e);
        std::process::exit(1);
    }

    println!("Wrote {}", out.display());
}

fn dump_tokens(source: &str, no_color: bool) {
    let mut dumper = TokenDumper::new();

    if no_color {
        dumper = dumper.no_color();
    }

    if dumper.dump(source) {
        std::process::exit(1);
    }
}

fn run_chunk(chunk: &Chunk, trace: bool) {
    let mut vm = Vm::new().with_trace(trace);

    match vm.interpret(chunk) {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn repl(trace: bool) {
    let mut vm = Vm::new().with_trace(trace);
    let mut line = String::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return;
        }

        line.clear();
        match io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }

        let input = line.trim();
        if input == ":q" {
            return;
        }
        if input.is_empty() {
            continue;
        }
        if !input.is_ascii() {
            eprintln!("Input error: non-ASCII input");
            continue;
        }

        let mut chunk = Chunk::new();
        let report = compile(input, &mut chunk);
        if report.had_error {
            for error in &report.errors {
                eprintln!("{}", error);
            }
            continue;
        }

        match vm.interpret(&chunk) {
            Ok(value) => println!("{}", value),
            Err(e) => eprintln!("{}", e),
        }
    }
}
