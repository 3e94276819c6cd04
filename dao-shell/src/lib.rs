pub mod providers;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use dao_bytecode::{disasm, split_inline_input, Encoder, Program, FILE_COMPILED, FILE_SYMBOLIC};
use dao_vm::EngineConfig;
use is_terminal::IsTerminal;
use providers::{InterpretationResult, InterpreterProvider};
use rustyline_async::{Readline, ReadlineEvent};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Symbols per line when a compiled image is rendered back to source
const SYMBOLS_PER_LINE: usize = 64;

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "Run and explore Dao programs", long_about = None)]
pub struct Args {
    /// Program to run: `.dao` source or a compiled `.wuwei` image
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Load code from file into the buffer at startup (interactive mode)
    #[arg(short = 'l', long = "load", value_name = "FILE")]
    pub load: Option<PathBuf>,

    /// Execute the provided code and exit; text after `@` is fed as input
    #[arg(short = 'e', long = "exec", value_name = "CODE")]
    pub exec: Option<String>,

    /// Input bytes for the program
    #[arg(short = 'i', long = "input", value_name = "TEXT")]
    pub input: Option<String>,

    /// Write a `.wuwei` image next to a `.dao` source instead of running it
    #[arg(short = 'c', long = "compile-only")]
    pub compile_only: bool,

    /// Run files whose extension is neither `.dao` nor `.wuwei`
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Show disassembly instead of executing (use with -e or FILE)
    #[arg(short = 'd', long = "disassemble")]
    pub disassemble: bool,

    /// Show both disassembly and execution result (use with -e or FILE)
    #[arg(short = 'b', long = "both")]
    pub both: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv per-step trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Leave memory contents out of step traces
    #[arg(long = "hide-data")]
    pub hide_data: bool,

    /// Treat allocation past the memory ceiling as a no-op
    #[arg(long = "ignore-overflow")]
    pub ignore_overflow: bool,

    /// Largest memory a single floor may allocate, in bits
    #[arg(long = "max-bits", value_name = "N")]
    pub max_bits: Option<usize>,

    /// Abort a run after this many instructions
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    /// JSON engine configuration; command-line flags override it
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Build the engine configuration from `--config` and the override flags
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                EngineConfig::from_json(&json)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => EngineConfig::default(),
        };

        if self.hide_data {
            config.hide_data = true;
        }
        if self.ignore_overflow {
            config.ignore_overflow = true;
        }
        if let Some(bits) = self.max_bits {
            config.max_capacity_bits = bits;
        }
        if let Some(steps) = self.max_steps {
            config.max_steps = Some(steps);
        }
        Ok(config)
    }

    /// Default tracing filter for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

pub fn help_message() -> String {
    "Available commands:".to_string()
        + "\n  .help, - Show this help message"
        + "\n  .list - List all edited lines"
        + "\n  .delete or .del - Remove the last edited line"
        + "\n  .reset or Ctrl+C - Interrupt current input (clear buffer)"
        + "\n  .load <file> - Load code from file into the buffer"
        + "\n  .dia - Disassemble the code in the buffer"
        + "\n  .input <text> - Feed text to the next run as program input"
        + "\n  .state - Show the machine state after the last run"
        + "\n  .mem - Show the root floor memory after the last run"
        + "\n  .quit - Exit daosh"
        + "\n\nAn empty line runs the buffer."
        + "\n\nNon-interactive CLI:"
        + "\n  daosh FILE            Run a .dao source or .wuwei image"
        + "\n  --exec, -e <CODE>     Execute the provided code (CODE@INPUT) and exit"
        + "\n  --input, -i <TEXT>    Input bytes for the program"
        + "\n  --compile-only, -c    Write FILE.wuwei instead of running FILE.dao"
        + "\n  --disassemble, -d     Show disassembly instead of executing"
        + "\n  --both, -b            Show both disassembly and execution result"
        + "\n  If stdin is piped (non-TTY), the shell reads the program from it and runs it"
}

const DEFAULT_PROMPT: &str = ">>> ";

// ANSI color helpers (enabled only when writing to a TTY)
fn is_tty_stdout() -> bool {
    std::io::stdout().is_terminal()
}

fn colorize(s: &str, code: &str, enable: bool) -> String {
    if enable {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    } else {
        s.to_string()
    }
}

fn label_info(s: &str) -> String {
    colorize(s, "36", is_tty_stdout())
} // cyan
fn label_ok(s: &str) -> String {
    colorize(s, "32", is_tty_stdout())
} // green
fn label_err_out(s: &str) -> String {
    colorize(s, "31", is_tty_stdout())
} // red

fn load_file_into_buffer<W: Write>(
    path: &str,
    buffer: &mut Vec<String>,
    stdout: &mut W,
    update_prompt: impl FnOnce(&str) -> Result<()>,
) -> Result<()> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let trimmed = contents.trim_end_matches(['\n', '\r']);
            buffer.clear();
            if trimmed.is_empty() {
                update_prompt(DEFAULT_PROMPT)?;
                writeln!(stdout, "Loaded 0 lines (file is empty): {}", path)?;
            } else {
                buffer.extend(trimmed.split('\n').map(|s| s.to_string()));
                update_prompt("... ")?;
                writeln!(stdout, "Loaded {} lines from: {}", buffer.len(), path)?;
                writeln!(stdout, "Press Enter on an empty line to run it.")?;
            }
        }
        Err(e) => {
            writeln!(stdout, "Error loading file '{}': {}", path, e)?;
        }
    }
    Ok(())
}

/// Process a special command (starting with '.')
/// Returns true if the shell should exit, false otherwise
pub fn process_special_command<W: Write, I: InterpreterProvider>(
    command: &str,
    buffer: &mut Vec<String>,
    stdout: &mut W,
    update_prompt: impl FnOnce(&str) -> Result<()>,
    interpreter: &I,
) -> Result<bool> {
    let trimmed = command.trim();
    if !trimmed.starts_with('.') {
        return Ok(false);
    }

    let (cmd, arg) = trimmed
        .split_once(' ')
        .map_or((trimmed, ""), |(c, a)| (c, a.trim()));

    match cmd {
        ".help" => {
            writeln!(stdout, "{}", help_message())?;
        }
        ".quit" => {
            writeln!(stdout, "Exiting daosh...")?;
            return Ok(true);
        }
        ".list" => {
            writeln!(stdout, "Edited lines:")?;
            for line in buffer.iter() {
                writeln!(stdout, "{line}")?;
            }
        }
        ".delete" | ".del" => {
            if let Some(removed) = buffer.pop() {
                writeln!(stdout, "Removed last line: {removed}")?;
            } else {
                writeln!(stdout, "Buffer is empty, nothing to delete")?;
            }
        }
        ".reset" => {
            buffer.clear();
            update_prompt(DEFAULT_PROMPT)?;
            writeln!(stdout, "Buffer reset")?;
        }
        ".load" => {
            if arg.is_empty() {
                writeln!(stdout, "Usage: .load <file>")?;
            } else {
                load_file_into_buffer(arg, buffer, stdout, update_prompt)?;
            }
        }
        ".dia" => {
            let code = buffer.join("\n");
            if code.trim().is_empty() {
                writeln!(stdout, "Buffer is empty, nothing to disassemble")?;
            } else {
                match interpreter.disassemble(&code) {
                    Ok(output) => writeln!(stdout, "{}", output)?,
                    Err(e) => writeln!(stdout, "{} {}", label_err_out("Disassembly error:"), e)?,
                }
            }
        }
        ".input" => match interpreter.set_input(arg) {
            Ok(()) => writeln!(stdout, "Queued {} input bytes for the next run", arg.len())?,
            Err(e) => writeln!(stdout, "{} {}", label_err_out("Input error:"), e)?,
        },
        ".state" => match interpreter.state() {
            Ok(state) => writeln!(stdout, "{}", state)?,
            Err(e) => writeln!(stdout, "{} {}", label_err_out("State error:"), e)?,
        },
        ".mem" => match interpreter.memory() {
            Ok(memory) => writeln!(stdout, "{}", memory)?,
            Err(e) => writeln!(stdout, "{} {}", label_err_out("Memory error:"), e)?,
        },
        _ => {
            writeln!(stdout, "Unknown command: {command}")?;
        }
    }
    Ok(false)
}

/// Process a line of input in multiline mode
/// Returns Some(command) if a command is ready to be executed, None otherwise
pub fn process_multiline_input(
    line: String,
    buffer: &mut Vec<String>,
    update_prompt: impl FnOnce(&str) -> Result<()>,
) -> Result<Option<String>> {
    // If buffer is empty, ignore a leading empty line
    if buffer.is_empty() {
        if line.is_empty() {
            return Ok(None);
        }
        *buffer = vec![line];
        update_prompt("... ")?;
        return Ok(None);
    }

    if !line.is_empty() {
        buffer.push(line);
        return Ok(None);
    }

    // Empty line with non-empty buffer: run it. The buffer stays for .dia/.list
    let command = buffer.join("\n");
    update_prompt(DEFAULT_PROMPT)?;
    Ok(Some(command))
}

/// Handle an interrupt event (Ctrl+C)
pub fn handle_interrupt<W: Write>(
    buffer: &mut Vec<String>,
    stdout: &mut W,
    update_prompt: impl FnOnce(&str) -> Result<()>,
) -> Result<()> {
    buffer.clear();
    update_prompt(DEFAULT_PROMPT)?;
    writeln!(stdout, "Input interrupted with Ctrl+C")?;
    Ok(())
}

/// Run code in non-interactive mode with optional disassembly
pub async fn run_non_interactive<I: InterpreterProvider>(
    code: &str,
    args: &Args,
    interpreter: &I,
) -> Result<()> {
    let show_disasm = args.disassemble || args.both;
    let show_exec = !args.disassemble || args.both;

    if show_disasm {
        match interpreter.disassemble(code) {
            Ok(disasm) => {
                if args.both {
                    println!("=== Disassembly ===");
                }
                println!("{}", disasm);
            }
            Err(e) => {
                eprintln!("Disassembly error: {}", e);
            }
        }
    }

    if show_exec {
        if args.both {
            println!("\n=== Execution ===");
        }
        let mut stdout = std::io::stdout();
        match interpreter.interpret(code).await {
            InterpretationResult::Success(output) => {
                // program output is raw bytes, no trailing newline
                write!(stdout, "{}", output)?;
                stdout.flush()?;
            }
            InterpretationResult::Error(e) => {
                if let Some(output) = e.output.as_deref() {
                    write!(stdout, "{}", output)?;
                    stdout.flush()?;
                }
                bail!("{}", e.message);
            }
        }
    }

    Ok(())
}

/// Run a program file: `.dao` source, `.wuwei` image, or anything with `--force`
pub async fn run_file<I: InterpreterProvider>(
    path: &Path,
    args: &Args,
    interpreter: &I,
) -> Result<()> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let source = if extension == FILE_SYMBOLIC {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        if args.compile_only {
            let target = path.with_extension(FILE_COMPILED);
            let mut file = std::fs::File::create(&target)
                .with_context(|| format!("creating {}", target.display()))?;
            let program = Encoder::new().compile(&source, &mut file)?;
            info!(nybbles = program.len(), image = %target.display(), "compiled");
            println!("Compiled {} into {}", path.display(), target.display());
            return Ok(());
        }
        source
    } else if extension == FILE_COMPILED {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        disasm::to_symbols(&Program::from_compiled(bytes), SYMBOLS_PER_LINE)
    } else if args.force {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    } else {
        bail!(
            "{} is neither a .{} nor a .{} file (use --force to run it anyway)",
            path.display(),
            FILE_SYMBOLIC,
            FILE_COMPILED
        );
    };

    run_non_interactive(&source, args, interpreter).await
}

/// Run daosh with the provided interpreter provider
pub async fn run_shell<I: InterpreterProvider>(args: Args, interpreter: I) -> Result<()> {
    if let Some(input) = args.input.as_deref() {
        interpreter.set_input(input)?;
    }

    // Highest-priority non-interactive: explicit --exec, then a program file
    if let Some(text) = args.exec.as_ref() {
        let (code, inline_input) = split_inline_input(text);
        if let Some(input) = inline_input {
            interpreter.set_input(input)?;
        }
        return run_non_interactive(code, &args, &interpreter).await;
    }

    if let Some(file_path) = args.file.as_ref() {
        return run_file(file_path, &args, &interpreter).await;
    }

    // If stdin is not a TTY, run in non-interactive (batch) mode and read from stdin
    if !std::io::stdin().is_terminal() {
        use std::io::Read;
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        if source.trim().is_empty() {
            return Ok(());
        }
        return run_non_interactive(&source, &args, &interpreter).await;
    }

    writeln!(std::io::stdout(), "{}", help_message())?;

    let (mut rl, mut stdout) = Readline::new(DEFAULT_PROMPT.to_string())?;
    let mut buffer: Vec<String> = Vec::new();

    rl.should_print_line_on(true, false);

    if let Some(path) = args.load.as_ref() {
        let path_str = path.to_string_lossy().to_string();
        load_file_into_buffer(&path_str, &mut buffer, &mut stdout, |prompt| {
            Ok(rl.update_prompt(prompt)?)
        })?;
    }

    loop {
        tokio::select! {
            cmd = rl.readline() => match cmd {
                Ok(ReadlineEvent::Line(line)) => {
                    let line = line.trim().to_string();

                    let should_exit = process_special_command(
                        &line,
                        &mut buffer,
                        &mut stdout,
                        |prompt| Ok(rl.update_prompt(prompt)?),
                        &interpreter,
                    )?;

                    if should_exit {
                        break;
                    }

                    if line.starts_with('.') {
                        continue;
                    }

                    rl.add_history_entry(line.clone());

                    let command_option = process_multiline_input(
                        line,
                        &mut buffer,
                        |prompt| Ok(rl.update_prompt(prompt)?),
                    )?;

                    if let Some(command) = command_option {
                        writeln!(stdout, "{} {command}", label_info("Executing code:"))?;
                        match interpreter.interpret(&command).await {
                            InterpretationResult::Success(output) => {
                                writeln!(stdout, "{} {}", label_ok("Output:"), output)?
                            }
                            InterpretationResult::Error(e) => {
                                writeln!(stdout, "{} {e}", label_err_out("Error running program:"))?
                            }
                        }
                    }
                }
                Ok(ReadlineEvent::Eof) => {
                    break;
                }
                Ok(ReadlineEvent::Interrupted) => {
                    handle_interrupt(
                        &mut buffer,
                        &mut stdout,
                        |prompt| Ok(rl.update_prompt(prompt)?),
                    )?;
                    continue;
                }
                Err(e) => {
                    writeln!(stdout, "{} {e:?}", label_err_out("Error:"))?;
                    break;
                }
            }
        }
    }
    rl.flush()?;
    Ok(())
}
