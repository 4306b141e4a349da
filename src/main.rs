use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use serde::Serialize;

use lazy_fstring as lf;

use lf::ast_printer::AstPrinter;
use lf::frame::{Activation, CallChain, LexicalPath};
use lf::parser::{Expr, Parser};
use lf::scanner::{tokenize, Scanner};
use lf::scope::Bindings;
use lf::template::{split, Segment};
use lf::token::Token;
use lf::value::Value;
use lf::{LazyError, LazyString};

#[derive(ClapParser, Debug)]
#[command(version, about = "Deferred template renderer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes every expression span of a template file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Splits a template file and parses its spans, printing one line per segment
    Parse {
        filename: Option<PathBuf>,

        /// Print the segments and syntax trees as JSON
        #[arg(long)]
        json: bool,
    },

    /// Renders a template file against bindings given on the command line
    Render {
        filename: Option<PathBuf>,

        /// Global bindings as a JSON object, e.g. '{"site": "example"}'
        #[arg(long, value_parser = parse_bindings)]
        globals: Option<Bindings>,

        /// A call frame as PATH=JSON_OBJECT, outermost first; PATH is a dotted
        /// function path such as Outer.inner, or <module>
        #[arg(long = "frame", value_parser = parse_frame)]
        frames: Vec<Activation>,
    },
}

/// One segment of `lazyfmt parse --json` output.
#[derive(Serialize)]
struct ParsedSegment<'a> {
    segment: &'a Segment<'a>,
    expr: Option<Expr<'a>>,
}

/// Template text of `filename`.
fn read_template(filename: &PathBuf) -> Result<String> {
    info!("Reading template {:?}", filename);

    let file = File::open(filename).with_context(|| format!("Cannot open {:?}", filename))?;

    let mut raw: Vec<u8> = Vec::new();
    let bytes: usize = BufReader::new(file)
        .read_to_end(&mut raw)
        .with_context(|| format!("Cannot read {:?}", filename))?;

    debug!("Read {} bytes", bytes);

    String::from_utf8(raw).with_context(|| format!("{:?} is not valid UTF-8", filename))
}

fn parse_bindings(raw: &str) -> Result<Bindings> {
    let json: serde_json::Value = serde_json::from_str(raw).context("bindings must be JSON")?;

    let serde_json::Value::Object(map) = json else {
        return Err(anyhow!("bindings must be a JSON object"));
    };

    Ok(map.iter().map(|(k, v)| (k.as_str(), Value::from(v))).collect())
}

fn parse_frame(raw: &str) -> Result<Activation> {
    let (path, bindings) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected PATH=JSON_OBJECT"))?;

    let locals: Bindings = parse_bindings(bindings)?;

    if path == "<module>" {
        return Ok(Activation::module(locals));
    }

    let path: LexicalPath = path.parse()?;

    Ok(Activation::function(path, locals))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // `lazy_fstring::resolver` → `resolver`
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("lazy_fstring::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Exit code for a failed render: 65 for malformed templates, 70 otherwise.
fn exit_code(e: &LazyError) -> i32 {
    if e.is_syntax() {
        65
    } else {
        70
    }
}

/// Print every token of every span; lexical errors go to stderr and the
/// remaining tokens are still printed.
fn tokenize_command(segments: &[Segment<'_>]) {
    let mut failed: bool = false;

    let spans = segments.iter().filter_map(|segment| match segment {
        Segment::Expr { source, offset } => Some((*source, *offset)),
        Segment::Literal(_) => None,
    });

    for (span, offset) in spans {
        for token in Scanner::new(span, offset) {
            match token {
                Ok(token) => println!("{}", token),
                Err(e) => {
                    failed = true;
                    eprintln!("{}", e);
                }
            }
        }
    }

    if failed {
        debug!("Tokenize found lexical errors");
        std::process::exit(65);
    }
}

fn parse_command(segments: &[Segment<'_>], json: bool) -> Result<()> {
    let token_lists: Vec<Option<Vec<Token<'_>>>> = segments
        .iter()
        .map(|segment| match segment {
            Segment::Expr { source, offset } => tokenize(source, *offset).map(Some),
            Segment::Literal(_) => Ok(None),
        })
        .collect::<lf::Result<_>>()
        .unwrap_or_else(|e| fail(e));

    let parsed: Vec<ParsedSegment<'_>> = segments
        .iter()
        .zip(&token_lists)
        .map(|(segment, tokens)| {
            let expr: Option<Expr<'_>> = tokens
                .as_ref()
                .map(|tokens| Parser::new(tokens).parse())
                .transpose()
                .unwrap_or_else(|e| fail(e));

            ParsedSegment { segment, expr }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    for item in &parsed {
        println!("{}", AstPrinter::print_segment(item.segment, item.expr.as_ref()));
    }

    Ok(())
}

fn render_command(source: &str, globals: Option<Bindings>, frames: Vec<Activation>) {
    let mut chain = CallChain::new(globals.unwrap_or_default());
    for frame in frames {
        chain.push(frame);
    }

    let text = LazyString::new(source, &chain);

    // The value owns its snapshot; the chain can go before it is observed.
    drop(chain);

    match text.force() {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => fail(e),
    }
}

/// Report `e` on stderr and exit with its code.
fn fail(e: LazyError) -> ! {
    debug!("Failing with {:?}", e);
    eprintln!("{}", e);
    std::process::exit(exit_code(&e));
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    }

    info!("CLI arguments: {:?}", args);

    let filename: &Option<PathBuf> = match &args.commands {
        Commands::Tokenize { filename }
        | Commands::Parse { filename, .. }
        | Commands::Render { filename, .. } => filename,
    };

    let Some(filename) = filename else {
        println!("No input filepath was provided. Exiting...");
        return Ok(());
    };

    let source: String = read_template(filename)?;

    let segments: Vec<Segment<'_>> = split(&source).unwrap_or_else(|e| fail(e));

    match args.commands {
        Commands::Tokenize { .. } => tokenize_command(&segments),

        Commands::Parse { json, .. } => parse_command(&segments, json)?,

        Commands::Render {
            globals, frames, ..
        } => render_command(&source, globals, frames),
    }

    info!("Done");

    Ok(())
}
