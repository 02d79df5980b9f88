//! rltc: the Relish text compiler.
//!
//! Compiles RTR documents to Relish binary (the default), renders binary
//! back to RTR with `--decode`, and offers validation and TLV summary
//! modes.

use std::fs;
use std::io::{self, Read, Write};

use anyhow::Context;
use clap::Parser;
use relish::Value;

#[derive(Parser)]
#[command(name = "rltc", version, about = "Relish text compiler")]
struct Args {
    /// Input file, or - for stdin.
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output file, or - for stdout.
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Write hex-encoded Relish bytes instead of binary.
    #[arg(long)]
    hex: bool,

    /// Parse and encode without writing any output.
    #[arg(long, conflicts_with_all = ["hex", "info", "decode"])]
    validate: bool,

    /// Print a brief TLV summary instead of the encoded bytes.
    #[arg(long, conflicts_with_all = ["hex", "decode"])]
    info: bool,

    /// Treat the input as Relish binary and render it as RTR text.
    #[arg(long)]
    decode: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let data = read_input(&args.input)?;

    if args.decode {
        let text = relish_text::render(&data).context("failed to render binary input")?;
        return write_output(&args.output, format!("{text}\n").as_bytes());
    }

    let src = String::from_utf8(data).context("input is not valid UTF-8")?;
    let bytes = relish_text::compile(&src).context("failed to compile document")?;

    if args.info {
        return print_info(&bytes);
    }
    if args.validate {
        return Ok(());
    }

    if args.hex {
        let mut hex = String::with_capacity(bytes.len() * 2 + 1);
        for b in &bytes {
            hex.push_str(&format!("{b:02x}"));
        }
        hex.push('\n');
        return write_output(&args.output, hex.as_bytes());
    }
    write_output(&args.output, &bytes)
}

fn read_input(path: &str) -> anyhow::Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("failed to read {path}"))
    }
}

fn write_output(path: &str, data: &[u8]) -> anyhow::Result<()> {
    if path == "-" {
        io::stdout()
            .write_all(data)
            .context("failed to write stdout")
    } else {
        fs::write(path, data).with_context(|| format!("failed to write {path}"))
    }
}

fn print_info(bytes: &[u8]) -> anyhow::Result<()> {
    let value = Value::from_slice(bytes).context("encoded output did not parse back")?;
    println!("Type: {:#04x}", value.type_id() as u8);
    println!("Size: {} bytes", bytes.len());
    if let Value::Struct { fields } = &value {
        let ids: Vec<String> = fields.iter().map(|(id, _)| id.to_string()).collect();
        println!("Fields: {}", ids.join(","));
    }
    Ok(())
}
