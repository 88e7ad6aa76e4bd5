use std::fs;
use std::path::Path;
use std::process;

use clap::Parser as ClapParser;
use colored::Colorize;

use hashc::analyzer::SemanticAnalyzer;
use hashc::diagnostics::Reporter;
use hashc::ir;
use hashc::lexer::Lexer;
use hashc::parser::Parser;

#[derive(ClapParser)]
#[command(name = "hashc", about = "The Hash language compiler")]
struct Cli {
    /// Source file to compile
    input: String,

    /// Output path
    #[arg(short = 'o')]
    output: Option<String>,

    /// Emit textual IR to the output path
    #[arg(long)]
    emit_llvm: bool,

    /// Save textual IR to <stem>.ll alongside the normal output
    #[arg(long)]
    emit_ir: bool,

    /// Print the AST and exit
    #[arg(long)]
    ast: bool,

    /// Print tokens and exit
    #[arg(long)]
    tokens: bool,
}

fn default_output() -> &'static str {
    if cfg!(windows) {
        "a.exe"
    } else {
        "a.out"
    }
}

fn stage(message: &str) {
    println!("{}", message);
}

fn stage_done(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

fn fail(message: &str) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), message);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    let output = cli.output.clone().unwrap_or_else(|| default_output().to_string());

    let source = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => fail(&format!("Cannot open file '{}': {}", cli.input, e)),
    };

    let module_name = Path::new(&cli.input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("module")
        .to_string();

    println!("Compiling {}...\n", cli.input.bold());

    // Lexical analysis
    stage("Lexical analysis...");
    let tokens = Lexer::new(&source).tokenize();

    if cli.tokens {
        println!("\nTokens:");
        for token in &tokens {
            println!(
                "  {}: '{}' (line {})",
                token.kind, token.value, token.line
            );
        }
        return;
    }
    stage_done("Lexical analysis completed");

    // Parsing
    stage("Parsing...");
    let (mut program, parse_errors) = Parser::new(tokens).parse();

    if !parse_errors.is_empty() {
        eprintln!("\n{}", "Parsing errors:".red().bold());
        for error in &parse_errors {
            eprintln!("{} {}: {}", "Error:".red().bold(), cli.input, error);
        }
        process::exit(1);
    }
    stage_done("Parsing completed");

    if cli.ast {
        println!("\n{}", program.dump());
        return;
    }

    // Semantic analysis
    stage("Semantic analysis...");
    let mut analyzer = SemanticAnalyzer::new();
    let clean = analyzer.analyze(&mut program);

    if !analyzer.errors().is_empty() || !analyzer.warnings().is_empty() {
        eprintln!();
        let reporter = Reporter::new(&source, &cli.input);
        let mut diagnostics = analyzer.warnings().to_vec();
        diagnostics.extend_from_slice(analyzer.errors());
        reporter.print_all(&diagnostics);
        if !clean {
            process::exit(1);
        }
    } else {
        stage_done("Semantic analysis completed");
    }

    // Lowering and verification
    stage("Code generation...");
    let module = match ir::lower_program(&program, &module_name) {
        Ok(module) => module,
        Err(errors) => {
            eprintln!("{}", "Module verification failed:".red().bold());
            for error in &errors {
                eprintln!("  {}", error);
            }
            fail("Code generation failed");
        }
    };
    stage_done("Code generation completed");

    if cli.emit_llvm || cli.emit_ir {
        let ir_path = if cli.emit_llvm {
            output.clone()
        } else {
            format!("{}.ll", module_name)
        };

        println!("Emitting IR to {}...", ir_path);
        if let Err(e) = fs::write(&ir_path, module.to_string()) {
            fail(&format!("Could not write '{}': {}", ir_path, e));
        }
        stage_done("IR emitted successfully");
    } else {
        // The object-file writer and linker are downstream consumers of the
        // verified module.
        println!(
            "Object emission and linking of {} are handled by the back-end driver.",
            output
        );
    }

    println!("\n{}", "Compilation successful!".green().bold());
}
