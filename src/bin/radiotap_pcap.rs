//! Radiotap Pcap Reader - Decode radiotap headers from pcap files
//!
//! Decodes every frame of a link-type-127 capture and prints a summary
//! line (or JSON) per frame, followed by drop statistics.
//!
//! Run with: cargo run --bin radiotap_pcap --release -- -f capture.pcap

use anyhow::{bail, Context, Result};
use clap::Parser;
use pcap_file::pcap::PcapReader;
use pcap_file::DataLink;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use radiotap_codec::{Config, DecodedRadiotap, ErrorKind, RadiotapDecoder, RadiotapError};

/// Frames handed to the decoder per batch
const BATCH_SIZE: usize = 1024;

#[derive(Parser)]
#[command(name = "radiotap_pcap")]
#[command(version, about = "Decode radiotap headers from a pcap capture")]
struct Cli {
    /// Input pcap file
    #[arg(short, long, required_unless_present = "print_config")]
    file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print one JSON object per frame
    #[arg(long)]
    json: bool,

    /// Show statistics only, suppress per-frame output
    #[arg(short, long)]
    stats: bool,

    /// Decoder threads (0 = one per CPU)
    #[arg(long, default_value = "0")]
    threads: usize,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Default)]
struct Stats {
    frames: usize,
    decoded: usize,
    bytes: usize,
    fixed_fields: usize,
    tlv_records: usize,
    vendor_blocks: usize,
    dropped: BTreeMap<ErrorKind, usize>,
}

impl Stats {
    fn record(&mut self, result: &Result<DecodedRadiotap, RadiotapError>) {
        self.frames += 1;
        match result {
            Ok(decoded) => {
                self.decoded += 1;
                self.fixed_fields += decoded.fixed_fields.len();
                self.tlv_records += decoded.tlv_records.len();
                self.vendor_blocks += decoded.vendor_blocks.len();
            }
            Err(e) => *self.dropped.entry(e.kind()).or_default() += 1,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            let mut config = Config::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}

fn init_logging(config: &Config, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(config.logging.with_target).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[cfg(feature = "parallel")]
fn init_threads(threads: usize) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("building decoder thread pool")
}

#[cfg(not(feature = "parallel"))]
fn init_threads(threads: usize) -> Result<()> {
    if threads > 1 {
        warn!("built without the parallel feature, decoding on one thread");
    }
    Ok(())
}

fn print_frame(
    number: usize,
    frame: &[u8],
    result: &Result<DecodedRadiotap, RadiotapError>,
    json: bool,
) -> Result<()> {
    match result {
        Ok(decoded) if json => println!("{}", serde_json::to_string(decoded)?),
        Ok(decoded) => {
            let info = decoded.info();
            let mut line = format!("#{:<6} hdr={:<3}", number, decoded.payload_offset);
            if let (Some(freq), Some(channel)) = (info.channel_freq, info.channel()) {
                line.push_str(&format!(" {}MHz ch{:<3}", freq, channel));
            }
            if let Some(signal) = info.signal_dbm {
                line.push_str(&format!(" {}dBm", signal));
            }
            if let Some(rate) = info.rate_mbps() {
                line.push_str(&format!(" {:.1}Mb/s", rate));
            }
            if let Some(mcs) = info.mcs_index {
                line.push_str(&format!(" MCS{}", mcs));
            }
            if !decoded.tlv_records.is_empty() {
                line.push_str(&format!(" tlvs={}", decoded.tlv_records.len()));
            }
            let fcs = if decoded.has_fcs() { 4 } else { 0 };
            let body = decoded.payload(frame).len().saturating_sub(fcs);
            line.push_str(&format!(" body={}", body));
            println!("{}", line);
        }
        Err(e) if json => println!(
            "{}",
            serde_json::json!({ "frame": number, "error": e.kind().to_string(), "detail": e.to_string() })
        ),
        Err(e) => println!("#{:<6} dropped: {}", number, e),
    }
    Ok(())
}

fn process_batch(
    decoder: &RadiotapDecoder,
    batch: &[Vec<u8>],
    first: usize,
    cli: &Cli,
    stats: &mut Stats,
) -> Result<()> {
    let frames: Vec<&[u8]> = batch.iter().map(Vec::as_slice).collect();
    let results = decoder.decode_batch(&frames);

    for (i, (frame, result)) in frames.iter().zip(&results).enumerate() {
        stats.record(result);
        if let Err(e) = result {
            debug!("frame {} dropped: {}", first + i, e);
        }
        if !cli.stats {
            print_frame(first + i, frame, result, cli.json)?;
        }
    }
    Ok(())
}

fn print_stats(stats: &Stats, elapsed: std::time::Duration) {
    println!("\n{}", "=".repeat(60));
    println!("DECODE STATISTICS");
    println!("{}", "=".repeat(60));
    println!("Frames read:       {}", stats.frames);
    println!("Decoded:           {}", stats.decoded);
    println!("Bytes read:        {} ({:.2} MB)", stats.bytes, stats.bytes as f64 / 1_000_000.0);
    println!("Processing time:   {:.2?}", elapsed);
    if elapsed.as_secs_f64() > 0.0 {
        println!("Throughput:        {:.0} frames/sec", stats.frames as f64 / elapsed.as_secs_f64());
    }
    println!("Fixed fields:      {}", stats.fixed_fields);
    println!("TLV records:       {}", stats.tlv_records);
    println!("Vendor blocks:     {}", stats.vendor_blocks);

    let dropped: usize = stats.dropped.values().sum();
    println!("Dropped:           {}", dropped);
    for (kind, count) in &stats.dropped {
        println!("  {:<18} {}", kind, count);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", Config::default_with_comments());
        return Ok(());
    }

    let config = load_config(cli.config.as_ref())?;
    init_logging(&config, cli.debug);
    init_threads(cli.threads)?;

    let Some(path) = cli.file.as_ref() else {
        bail!("input file required, use -f <file>");
    };

    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut pcap_reader = PcapReader::new(BufReader::new(file))
        .with_context(|| format!("reading pcap header of {}", path.display()))?;

    let datalink = pcap_reader.header().datalink;
    if datalink != DataLink::IEEE802_11_RADIOTAP {
        bail!("{} has link type {:?}, expected IEEE802_11_RADIOTAP", path.display(), datalink);
    }
    info!(
        "decoding {} (max {} presence words, TLV policy {:?})",
        path.display(),
        config.decoder.max_presence_words,
        config.decoder.tlv_policy
    );

    let decoder = RadiotapDecoder::new(config.decoder.clone());
    let mut stats = Stats::default();
    let mut batch: Vec<Vec<u8>> = Vec::with_capacity(BATCH_SIZE);
    let mut next_frame = 0usize;
    let start_time = Instant::now();

    while let Some(packet) = pcap_reader.next_packet() {
        let packet = packet?;
        stats.bytes += packet.data.len();
        batch.push(packet.data.into_owned());

        if batch.len() == BATCH_SIZE {
            process_batch(&decoder, &batch, next_frame, &cli, &mut stats)?;
            next_frame += batch.len();
            batch.clear();
        }
    }
    if !batch.is_empty() {
        process_batch(&decoder, &batch, next_frame, &cli, &mut stats)?;
    }

    if stats.frames == 0 {
        warn!("{} contains no frames", path.display());
    }
    if cli.stats || !cli.json {
        print_stats(&stats, start_time.elapsed());
    }

    Ok(())
}
