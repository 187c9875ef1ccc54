use clap::Parser as ClapParser;
use jsonata_fmt::cli::{self, CliError, FormatRequest, FormatResult};
use jsonata_fmt::FormatOptions;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "jsonata-fmt")]
#[command(about = "jsonata-fmt - Format JSONata expressions, keeping their comments")]
#[command(version)]
struct Cli {
    /// Files to format (reads stdin if none are given, or for `-`)
    files: Vec<PathBuf>,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Fail if the output does not parse back to the same expression
    #[arg(long)]
    verify: bool,

    /// Report documents that would change instead of printing them
    #[arg(long, conflicts_with = "write")]
    check: bool,

    /// Rewrite files in place
    #[arg(short, long)]
    write: bool,
}

enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn name(&self) -> String {
        match self {
            Input::Stdin => "<stdin>".to_string(),
            Input::File(path) => path.display().to_string(),
        }
    }

    fn read(&self) -> Result<String, CliError> {
        match self {
            Input::Stdin if atty::is(atty::Stream::Stdin) => Err(CliError::NoInput),
            Input::Stdin => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
                Ok(buffer)
            }
            Input::File(path) => fs::read_to_string(path).map_err(CliError::Io),
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    }
}

fn inputs(files: &[PathBuf]) -> Vec<Input> {
    if files.is_empty() {
        return vec![Input::Stdin];
    }
    files
        .iter()
        .map(|path| {
            if path.as_os_str() == "-" {
                Input::Stdin
            } else {
                Input::File(path.clone())
            }
        })
        .collect()
}

fn emit(text: &str) -> Result<(), CliError> {
    io::stdout().write_all(text.as_bytes()).map_err(CliError::Io)
}

/// Formats every input; `Ok(false)` means some document failed or would change.
fn run(cli: &Cli) -> Result<bool, CliError> {
    let options = FormatOptions {
        indent: cli.indent,
        verify: cli.verify,
    };
    let print = !cli.check && !cli.write;
    let mut clean = true;

    for input in inputs(&cli.files) {
        let request = FormatRequest {
            source: input.read()?,
            options,
        };

        match cli::execute_format(&request) {
            Ok(FormatResult::Unchanged) => {
                if print {
                    emit(&request.source)?;
                }
            }
            Ok(FormatResult::Reformatted(text)) => match &input {
                _ if cli.check => {
                    eprintln!("{}: would reformat", input.name());
                    clean = false;
                }
                Input::File(path) if cli.write => fs::write(path, &text)?,
                _ => emit(&text)?,
            },
            Err(CliError::Format(e)) => {
                eprintln!("{}: {}", input.name(), e);
                clean = false;
                // Pass the document through untouched
                if print {
                    emit(&request.source)?;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(clean)
}
