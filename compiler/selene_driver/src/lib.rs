use std::fs::read_to_string;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser as ClapParser};
use thiserror::Error;

use codegen::gen_assm;
use emission::{write_program, Target};
use lexer::{Lexer, Token, TokenValue};
use mir::{debug_tacky, gen_tacky};
use parser::Parser;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = "Runs the Selene C compiler")]
struct Arguments {
    /// Path to a preprocessed C source file
    path: String,

    /// "Stops after the named pass and dumps its IR, only one(1) option can be specified at a time"
    #[command(flatten)]
    print_options: PrintOptions,
}

/// Dump an intermediate representation instead of assembly
#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct PrintOptions {
    /// Dump the token stream after lexing
    #[arg(long)]
    print_tokens: bool,

    /// Dump the AST after parsing
    #[arg(long)]
    print_ast: bool,

    /// Dump the three-address IR after lowering
    #[arg(long)]
    print_tacky: bool,

    /// Dump the assembly IR before emission
    #[arg(long)]
    print_asm_ast: bool,
}

/// Which pass the compiler should stop after
enum StopStage {
    Tokens,
    Ast,
    Tacky,
    AsmAst,
}

impl StopStage {
    fn from_args(options: &PrintOptions) -> Option<StopStage> {
        if options.print_tokens {
            Some(StopStage::Tokens)
        } else if options.print_ast {
            Some(StopStage::Ast)
        } else if options.print_tacky {
            Some(StopStage::Tacky)
        } else if options.print_asm_ast {
            Some(StopStage::AsmAst)
        } else {
            None
        }
    }
}

#[derive(Error, Debug)]
enum CompileErr {
    #[error("Lexer Error: {0}")]
    Lexer(String),
    #[error("Parser Error: {0}")]
    Parser(parser::ParseError),
    #[error("Semantic Error: {0}")]
    Semantic(mir::SemErr),
}

pub fn main() -> ExitCode {
    let args = Arguments::parse();

    match run_driver(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_driver(args: &Arguments) -> Result<()> {
    let source = read_to_string(&args.path)
        .with_context(|| format!("Unable to read source file: {}", args.path))?;

    let stop_stage = StopStage::from_args(&args.print_options);

    compile(&source, &stop_stage)
}

/// Runs the compiler stages in order: lexer, parser, TACKY generation,
/// assembly generation, emission. The finished assembly goes to stdout;
/// a stop stage dumps its IR there instead.
fn compile(source: &str, stop_stage: &Option<StopStage>) -> Result<()> {
    let mut lexer = Lexer::new(source);
    let tokens: Vec<Token> = lexer.tokenize().collect();

    if let Some(bad) = tokens
        .iter()
        .find(|t| matches!(t.value, TokenValue::Error(_)))
    {
        return Err(CompileErr::Lexer(format!(
            "unrecognized token '{}'",
            &source[bad.start..bad.end]
        ))
        .into());
    }

    if let Some(StopStage::Tokens) = stop_stage {
        for token in &tokens {
            println!("{}", token);
        }
        return Ok(());
    }

    let mut parser = Parser::new(tokens);
    let ast = parser.parse().map_err(CompileErr::Parser)?;

    if let Some(StopStage::Ast) = stop_stage {
        println!("{:#?}", ast);
        return Ok(());
    }

    let tacky = gen_tacky(&ast).map_err(CompileErr::Semantic)?;

    if let Some(StopStage::Tacky) = stop_stage {
        let stdout = std::io::stdout();
        debug_tacky(&mut stdout.lock(), &tacky).context("Unable to write TACKY to stdout")?;
        return Ok(());
    }

    let (assm, symbols) = gen_assm(&tacky);

    if let Some(StopStage::AsmAst) = stop_stage {
        println!("{:#?}", assm);
        return Ok(());
    }

    let stdout = std::io::stdout();
    write_program(&mut stdout.lock(), &assm, &symbols, Target::host())
        .context("Unable to write assembly to stdout")?;

    Ok(())
}
