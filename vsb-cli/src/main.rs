use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vsb_core::framing::{BLOCK_SYMBOLS, TS_PACKET_LEN};
use vsb_core::{StreamDecoder, StreamEncoder, VsbConfig};

#[derive(Parser)]
#[command(name = "vsb", about = "ATSC 8-VSB symbol encoder and decoder", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode an MPEG transport stream into 8-VSB symbols
    Encode {
        /// Input transport stream (188-byte packets)
        #[arg(short, long)]
        input: PathBuf,

        /// Output symbol file (little-endian f32)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        fec: FecArgs,
    },
    /// Decode 8-VSB symbols back into a transport stream
    Decode {
        /// Input symbol file (little-endian f32)
        #[arg(short, long)]
        input: PathBuf,

        /// Output transport stream
        #[arg(short, long)]
        output: PathBuf,

        /// Symbols handed to the decoder per call
        #[arg(long, default_value = "4096")]
        chunk_size: usize,

        #[command(flatten)]
        fec: FecArgs,
    },
}

#[derive(Args)]
struct FecArgs {
    /// Viterbi traceback depth in symbols (0 = immediate decision)
    #[arg(long, default_value = "0")]
    traceback_depth: usize,

    /// Convolutional interleaver branches (1 disables interleaving)
    #[arg(long, default_value = "52")]
    interleave_branches: usize,

    /// Interleaver delay increment per branch in bytes
    #[arg(long, default_value = "4")]
    interleave_unit: usize,
}

impl FecArgs {
    fn config(&self) -> VsbConfig {
        VsbConfig {
            traceback_depth: self.traceback_depth,
            interleave_branches: self.interleave_branches,
            interleave_unit: self.interleave_unit,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Encode { input, output, fec } => encode(&input, &output, &fec.config()),
        Command::Decode {
            input,
            output,
            chunk_size,
            fec,
        } => {
            if chunk_size == 0 {
                return Err("chunk_size must be at least 1".into());
            }
            decode(&input, &output, chunk_size, &fec.config())
        }
    }
}

fn encode(
    input: &Path,
    output: &Path,
    config: &VsbConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let ts = std::fs::read(input)?;
    if ts.len() % TS_PACKET_LEN != 0 {
        warn!(
            bytes = ts.len(),
            "input is not a whole number of 188-byte packets"
        );
    }
    info!(
        input = %input.display(),
        packets = ts.len() / TS_PACKET_LEN,
        "encoding transport stream"
    );

    let mut encoder = StreamEncoder::new(config)?;
    let mut writer = BufWriter::new(File::create(output)?);
    let mut written = 0usize;

    for chunk in ts.chunks(TS_PACKET_LEN * 64) {
        written += write_symbols(&mut writer, &encoder.process(chunk))?;
    }
    written += write_symbols(&mut writer, &encoder.flush())?;
    writer.flush()?;

    info!(
        output = %output.display(),
        symbols = written,
        blocks = written / BLOCK_SYMBOLS,
        codewords = encoder.codewords_encoded(),
        "symbols written"
    );
    Ok(())
}

fn decode(
    input: &Path,
    output: &Path,
    chunk_size: usize,
    config: &VsbConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(input = %input.display(), chunk_size, "decoding symbols");

    let mut reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    let mut decoder = StreamDecoder::new(config)?;

    let mut bytes = Vec::with_capacity(chunk_size * 4);
    let mut symbols = vec![0.0f32; chunk_size];
    loop {
        bytes.clear();
        (&mut reader)
            .take((chunk_size * 4) as u64)
            .read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            break;
        }
        let count = bytes.len() / 4;
        if bytes.len() % 4 != 0 {
            warn!(
                trailing = bytes.len() % 4,
                "ignoring partial symbol at end of input"
            );
        }
        LittleEndian::read_f32_into(&bytes[..count * 4], &mut symbols[..count]);
        writer.write_all(&decoder.process_symbols(&symbols[..count]))?;
        if bytes.len() < chunk_size * 4 {
            break;
        }
    }
    writer.flush()?;

    let stats = decoder.stats();
    if decoder.buffered_symbols() > 0 {
        warn!(
            symbols = decoder.buffered_symbols(),
            "trailing symbols do not fill a block"
        );
    }
    if !stats.synchronized {
        warn!("no transport stream packets recovered");
    }

    println!("Symbols:          {}", stats.symbols_processed);
    println!("Blocks:           {}", stats.blocks_decoded);
    println!("Codewords:        {}", stats.codewords_decoded);
    println!("Bytes corrected:  {}", stats.bytes_corrected);
    println!("RS failures:      {}", stats.rs_errors);
    println!("Packets:          {}", stats.packets_emitted);
    println!("Sync losses:      {}", stats.sync_losses);
    println!("Synchronized:     {}", stats.synchronized);
    Ok(())
}

fn write_symbols<W: Write>(writer: &mut W, symbols: &[f32]) -> std::io::Result<usize> {
    for &s in symbols {
        writer.write_f32::<LittleEndian>(s)?;
    }
    Ok(symbols.len())
}
