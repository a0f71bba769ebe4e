//! Offline rendering of a test tone through a configured chain.

use std::f64::consts::TAU;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tandem_chain::ProcessorChain;
use tandem_config::{ChainConfig, UnitConfig, build_chain};
use tandem_core::{AudioBuffer, EventBuffer, Sample};

use super::common::{ParamArg, SchemeArg, parse_param, parse_unit, unit_source};

#[derive(Args)]
pub struct RenderArgs {
    /// Chain configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Unit to append (repeatable); prefix with `!` to load it bypassed
    #[arg(short, long = "unit", value_name = "ID")]
    units: Vec<String>,

    /// Parameter override, e.g. "1:time_ms=300" (repeatable)
    #[arg(short, long = "param", value_parser = parse_param, value_name = "UNIT:KEY=VALUE")]
    params: Vec<ParamArg>,

    /// Sample rate in Hz (overrides the config)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Block size in samples (overrides the config)
    #[arg(long)]
    block_size: Option<usize>,

    /// Number of blocks to render
    #[arg(long, default_value = "100")]
    blocks: usize,

    /// Test tone frequency in Hz
    #[arg(long, default_value = "440")]
    frequency: f64,

    /// Render at double precision
    #[arg(long)]
    double: bool,

    /// Id scheme for unit lookup (overrides the config)
    #[arg(long, value_enum)]
    id_scheme: Option<SchemeArg>,

    /// Instantiate units on a dedicated loader thread
    #[arg(long)]
    loader_thread: bool,
}

/// Merge the config file and command-line overrides.
fn resolve_config(args: &RenderArgs) -> anyhow::Result<ChainConfig> {
    let mut config = match &args.config {
        Some(path) => ChainConfig::load(path)?,
        None => ChainConfig::default(),
    };
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    if let Some(block_size) = args.block_size {
        config.block_size = block_size;
    }
    if let Some(scheme) = args.id_scheme {
        config.id_scheme = scheme.into();
    }
    config.double_precision |= args.double;

    for spec in &args.units {
        let (id, bypassed) = parse_unit(spec);
        config.units.push(UnitConfig::new(id).with_bypass(bypassed));
    }
    for p in &args.params {
        let unit = config.units.get_mut(p.unit).ok_or_else(|| {
            anyhow::anyhow!("--param {}:{}: no unit at index {}", p.unit, p.key, p.unit)
        })?;
        unit.params.insert(p.key.clone(), p.value);
    }

    if config.units.is_empty() {
        anyhow::bail!("No units given. Use --config or --unit (see 'tandem units').");
    }
    config.validate()?;
    Ok(config)
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let source = unit_source(args.loader_thread)?;
    let chain = build_chain(&config, source)?;

    println!("Chain:     {chain}");
    println!(
        "Rendering {} block(s) of {} samples at {} Hz ({})",
        args.blocks,
        config.block_size,
        config.sample_rate,
        if config.double_precision { "f64" } else { "f32" }
    );

    let start = Instant::now();
    let peak = if config.double_precision {
        render::<f64>(&chain, &config, &args)
    } else {
        render::<f32>(&chain, &config, &args)
    };
    let elapsed = start.elapsed();

    let rendered = (args.blocks * config.block_size) as f64 / f64::from(config.sample_rate);
    println!(
        "Rendered {rendered:.3} s in {:.3} ms ({:.1}x realtime), output peak {peak:.4}",
        elapsed.as_secs_f64() * 1000.0,
        rendered / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!();
    print!("{}", chain.snapshot());
    Ok(())
}

/// Render `args.blocks` blocks of a sine at -12 dBFS on every channel and
/// return the output peak on the main outputs.
fn render<T: Sample>(chain: &ProcessorChain, config: &ChainConfig, args: &RenderArgs) -> f64 {
    let channels = chain.buffer_channels().max(1);
    let main_out = chain.layout().main_output_channels().min(channels);
    let frames = config.block_size;
    let mut buffer = AudioBuffer::<T>::new(channels, frames);
    let mut events = EventBuffer::new();
    let step = TAU * args.frequency / f64::from(config.sample_rate);
    let amplitude = 10f64.powf(-12.0 / 20.0);
    let mut phase = 0.0_f64;
    let mut peak = 0.0_f64;

    for _ in 0..args.blocks {
        for i in 0..frames {
            let s = T::from_f64((phase + step * i as f64).sin() * amplitude);
            for ch in 0..channels {
                buffer.channel_mut(ch)[i] = s;
            }
        }
        phase = (phase + step * frames as f64) % TAU;

        chain.process_block(&mut buffer, &mut events);
        events.clear();

        for ch in 0..main_out {
            for s in buffer.channel(ch) {
                peak = peak.max(s.to_f64().abs());
            }
        }
    }
    peak
}
