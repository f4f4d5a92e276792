use luars_pattern::strlib::Values;
use luars_pattern::{CaptureValue, Match, MatchOption, PatternError, PatternLib, Replacement};
use serde::Serialize;
use std::borrow::Cow;
use std::env;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!("lpat ", env!("CARGO_PKG_VERSION"), " (Lua patterns)");

fn print_usage() {
    eprintln!("usage: lpat [options] command subject pattern [repl]");
    eprintln!("Commands are:");
    eprintln!("  find      print start, end and captures of the first match");
    eprintln!("  match     print the captures of the first match");
    eprintln!("  gmatch    print the captures of every match, one per line");
    eprintln!("  gsub      replace matches with 'repl', print result and count");
    eprintln!("Available options are:");
    eprintln!("  --init N    start the search at position N");
    eprintln!("  --plain     find: treat the pattern as a plain string");
    eprintln!("  -n N        gsub: replace at most N matches");
    eprintln!("  --budget N  fail when one search takes more than N steps");
    eprintln!("  --json      print results as JSON");
    eprintln!("  -v          show version information");
    eprintln!("  -h          show this help");
    eprintln!("  --          stop handling options");
    eprintln!("A subject of '-' is read from stdin.");
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Command {
    Find,
    Match,
    GMatch,
    GSub,
}

impl Command {
    fn parse(name: &str) -> Result<Self, String> {
        match name {
            "find" => Ok(Command::Find),
            "match" => Ok(Command::Match),
            "gmatch" => Ok(Command::GMatch),
            "gsub" => Ok(Command::GSub),
            _ => Err(format!("unknown command '{}'", name)),
        }
    }
}

#[derive(Default)]
struct Options {
    init: Option<i64>,
    plain: bool,
    max_count: Option<i64>,
    budget: Option<usize>,
    json: bool,
    show_version: bool,
    show_help: bool,
    positional: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options::default();
    let mut i = 0;
    let mut stop_options = false;

    while i < args.len() {
        let arg = &args[i];
        if !stop_options && arg.starts_with('-') && arg != "-" {
            match arg.as_str() {
                "--init" => {
                    i += 1;
                    opts.init = Some(number_arg(args.get(i), "--init")?);
                }
                "-n" => {
                    i += 1;
                    opts.max_count = Some(number_arg(args.get(i), "-n")?);
                }
                "--budget" => {
                    i += 1;
                    opts.budget = Some(number_arg(args.get(i), "--budget")?);
                }
                "--plain" => opts.plain = true,
                "--json" => opts.json = true,
                "-v" => opts.show_version = true,
                "-h" | "--help" => opts.show_help = true,
                "--" => stop_options = true,
                _ => return Err(format!("unrecognized option '{}'", arg)),
            }
        } else {
            opts.positional.push(arg.clone());
        }
        i += 1;
    }

    Ok(opts)
}

fn number_arg<T: std::str::FromStr>(arg: Option<&String>, name: &str) -> Result<T, String> {
    let arg = arg.ok_or_else(|| format!("'{}' needs argument", name))?;
    arg.parse()
        .map_err(|_| format!("'{}' expects a number, got '{}'", name, arg))
}

fn read_subject(arg: &str) -> Result<Vec<u8>, String> {
    if arg != "-" {
        return Ok(arg.as_bytes().to_vec());
    }
    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .map_err(|e| format!("cannot read stdin: {}", e))?;
    // drop the line terminator of the last line
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(buf)
}

fn setup_logging() {
    let filter = EnvFilter::try_from_env("LPAT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Output sink: tab-separated text lines, or one JSON document per line.
struct Printer {
    out: io::StdoutLock<'static>,
    json: bool,
}

impl Printer {
    fn line(&mut self, prefix: &[usize], values: &[CaptureValue<'_>]) -> io::Result<()> {
        let mut line = Vec::new();
        let mut buf = itoa::Buffer::new();
        for n in prefix {
            if !line.is_empty() {
                line.push(b'\t');
            }
            line.extend_from_slice(buf.format(*n).as_bytes());
        }
        for v in values {
            if !line.is_empty() {
                line.push(b'\t');
            }
            v.write_to(&mut line);
        }
        line.push(b'\n');
        self.out.write_all(&line)
    }

    fn json<T: Serialize + ?Sized>(&mut self, doc: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, doc).map_err(io::Error::other)?;
        self.out.write_all(b"\n")
    }

    fn nil(&mut self) -> io::Result<()> {
        if self.json {
            writeln!(self.out, "null")
        } else {
            writeln!(self.out, "nil")
        }
    }
}

#[derive(Serialize)]
struct GMatchRecord<'a> {
    #[serde(rename = "match")]
    span: &'a Match,
    values: Values<'a>,
}

#[derive(Serialize)]
struct GSubRecord<'a> {
    result: Cow<'a, str>,
    count: usize,
}

#[derive(Debug)]
enum RunError {
    Usage(String),
    Pattern(PatternError),
    Io(io::Error),
}

impl From<PatternError> for RunError {
    fn from(e: PatternError) -> Self {
        RunError::Pattern(e)
    }
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        RunError::Io(e)
    }
}

fn run(opts: &Options) -> Result<(), RunError> {
    let [command, subject, pattern, rest @ ..] = opts.positional.as_slice() else {
        return Err(RunError::Usage("missing command, subject or pattern".to_string()));
    };
    let command = Command::parse(command).map_err(RunError::Usage)?;
    let repl = match (command, rest) {
        (Command::GSub, [repl]) => Some(repl.as_bytes()),
        (Command::GSub, _) => return Err(RunError::Usage("gsub needs exactly one replacement".to_string())),
        (_, []) => None,
        (_, _) => return Err(RunError::Usage("too many arguments".to_string())),
    };

    let subject = read_subject(subject).map_err(RunError::Usage)?;
    let pattern = pattern.as_bytes();
    let mut option = MatchOption::default();
    if let Some(limit) = opts.budget {
        option = option.with_step_limit(limit);
    }
    let lib = PatternLib::new(option);
    let mut printer = Printer {
        out: io::stdout().lock(),
        json: opts.json,
    };
    tracing::debug!(len = subject.len(), "running {}", opts.positional[0]);

    match command {
        Command::Find => match lib.str_find(&subject, pattern, opts.init, opts.plain)? {
            Some(found) if opts.json => printer.json(&found)?,
            Some(found) => printer.line(&[found.start, found.end], &found.captures)?,
            None => printer.nil()?,
        },
        Command::Match => match lib.str_match(&subject, pattern, opts.init)? {
            Some(values) if opts.json => printer.json(values.as_slice())?,
            Some(values) => printer.line(&[], &values)?,
            None => printer.nil()?,
        },
        Command::GMatch => {
            for m in lib.gmatch(&subject, pattern, opts.init)? {
                let m = m?;
                let values = m.values(&subject);
                if opts.json {
                    printer.json(&GMatchRecord { span: &m, values })?;
                } else {
                    printer.line(&[], &values)?;
                }
            }
        }
        Command::GSub => {
            let repl = repl.unwrap_or_default();
            let (out, count) = lib.str_gsub(&subject, pattern, Replacement::Template(repl), opts.max_count)?;
            if opts.json {
                printer.json(&GSubRecord {
                    result: String::from_utf8_lossy(&out),
                    count,
                })?;
            } else {
                printer.out.write_all(&out)?;
                printer.out.write_all(b"\n")?;
                printer.line(&[count], &[])?;
            }
        }
    }
    printer.out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("lpat: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if opts.show_version {
        println!("{}", VERSION);
        return ExitCode::SUCCESS;
    }
    if opts.show_help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    setup_logging();

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(RunError::Usage(msg)) => {
            eprintln!("lpat: {}", msg);
            print_usage();
            ExitCode::FAILURE
        }
        Err(RunError::Pattern(e)) => {
            eprintln!("lpat: {}", e);
            ExitCode::FAILURE
        }
        // closed pipe on stdout and the like
        Err(RunError::Io(e)) => {
            eprintln!("lpat: {}", e);
            ExitCode::FAILURE
        }
    }
}
