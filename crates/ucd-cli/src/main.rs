use std::io::Write;
use std::process::ExitCode;

use chrono::Local;
use log::LevelFilter;
use ucd_io::{ContentSummary, MeshContent, UcdFormat};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// Text becomes binary and binary becomes text.
    Opposite,
    Keep,
    Format(UcdFormat),
}

#[derive(Debug, PartialEq, Eq)]
struct Options {
    input: String,
    output: String,
    target: Target,
    json: bool,
    verbose: bool,
}

impl Target {
    fn resolve(self, input: UcdFormat) -> UcdFormat {
        match self {
            Target::Opposite => input.opposite(),
            Target::Keep => input,
            Target::Format(format) => format,
        }
    }
}

fn usage() {
    eprintln!("usage: ucdconv [options] <input.inp> <output.inp>");
    eprintln!();
    eprintln!("options:");
    eprintln!("  --keep-format       write the output in the input's format");
    eprintln!("  --to <binary|text>  write the output in the given format");
    eprintln!("  --json              print the summary as JSON");
    eprintln!("  -v, --verbose       debug logging");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut target = Target::Opposite;
    let mut json = false;
    let mut verbose = false;
    let mut files = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--keep-format" => target = Target::Keep,
            "--to" => {
                let value = iter.next().ok_or("--to needs a format")?;
                target = match value.as_str() {
                    "binary" => Target::Format(UcdFormat::Binary),
                    "text" => Target::Format(UcdFormat::Text),
                    other => return Err(format!("unknown format `{other}`")),
                };
            }
            "--json" => json = true,
            "-v" | "--verbose" => verbose = true,
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown option `{flag}`"));
            }
            _ => files.push(arg.clone()),
        }
    }

    let [input, output]: [String; 2] = files
        .try_into()
        .map_err(|_| "expected an input and an output file".to_string())?;
    Ok(Options {
        input,
        output,
        target,
        json,
        verbose,
    })
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        std::env::var("RUST_LOG")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LevelFilter::Warn)
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5}] {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("ucdconv: {message}");
            usage();
            return ExitCode::from(2);
        }
    };
    init_logging(options.verbose);

    let (content, input_format) = match MeshContent::load(&options.input) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("read error: {err}");
            return ExitCode::from(1);
        }
    };
    log::info!("{} is {input_format}", options.input);

    let summary = ContentSummary::new(&content, input_format);
    if options.json {
        match summary.to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("summary error: {err}");
                return ExitCode::from(1);
            }
        }
    } else {
        print!("{summary}");
    }

    let output_format = options.target.resolve(input_format);
    if let Err(err) = content.store(&options.output, output_format) {
        eprintln!("write error: {err}");
        return ExitCode::from(1);
    }
    log::info!("wrote {} as {output_format}", options.output);
    ExitCode::SUCCESS
}
