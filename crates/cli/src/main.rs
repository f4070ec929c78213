mod config;
mod index_file;
mod symbols;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use js_ast::{module_scopes, parse_module, JsFile, ParseError, RootDatabase};
use js_infer::InferCtx;
use miette::{IntoDiagnostic, NamedSource, Report};

use crate::config::{load_project, Project};

#[derive(Parser, Debug)]
#[command(author, version, about = "Static type inference for JavaScript")]
struct Cli {
    /// Path to jsinfer.toml (default: search upward from the file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Extra TOML index files
    #[arg(long = "index", value_name = "PATH", global = true)]
    indexes: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every scope with its symbols' types
    Symbols {
        file: PathBuf,

        /// Also list the object types generated while inferring
        #[arg(long)]
        generated: bool,
    },
    /// Print the types of the innermost node at a byte offset
    At { file: PathBuf, offset: u32 },
}

impl Command {
    fn file(&self) -> &Path {
        match self {
            Command::Symbols { file, .. } | Command::At { file, .. } => file,
        }
    }
}

fn main() -> miette::Result<()> {
    env_logger::init();

    let args = Cli::parse();

    let db = RootDatabase::default();
    let file = db.read_file(args.command.file().to_path_buf()).into_diagnostic()?;
    let path = file.path(&db);

    let project = load_project(args.config.as_deref(), &args.indexes, &path)?;

    let module = parse_module(&db, file).map_err(|err| parse_report(&db, file, err))?;
    let scopes = module_scopes(&db, file).map_err(|err| parse_report(&db, file, err))?;

    let Project { index, type_map } = project;
    let mut ctx = InferCtx::new(&module, &scopes, &index, &path).with_type_map(type_map);

    match args.command {
        Command::Symbols { generated, .. } => {
            print!("{}", symbols::render_scopes(&mut ctx));
            if generated {
                print!("{}", symbols::render_generated(&ctx));
            }
        }
        Command::At { offset, .. } => {
            for ty in ctx.infer_at_offset(offset) {
                println!("{ty}");
            }
        }
    }

    Ok(())
}

fn parse_report(db: &RootDatabase, file: JsFile, err: ParseError) -> Report {
    let name = file.path(db).display().to_string();
    Report::new(err).with_source_code(NamedSource::new(name, file.contents(db).clone()))
}
