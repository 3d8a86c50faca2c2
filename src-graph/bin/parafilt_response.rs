use clap::Parser;
use parafilt_graph::{BandPreset, FilterGraph, GraphPreset, log_grid};
use parafilt_params::NUM_BANDS;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Print the summed frequency response of a 4-band parametric EQ.
#[derive(Parser, Debug)]
#[command(name = "parafilt_response")]
#[command(about = "Evaluate a parametric EQ curve on a log frequency grid")]
struct Args {
    /// Sample rate for the filters, in Hz.
    #[arg(short, long, default_value_t = 48000.0)]
    sample_rate: f64,

    /// Band as "freq,bandwidth,gain_db"; repeat for up to 4 bands.
    #[arg(short, long = "band")]
    bands: Vec<String>,

    /// Master gain in dB, added to the summed curve.
    #[arg(short, long, default_value_t = 0.0)]
    master_gain: f64,

    /// JSON preset file; overrides --sample-rate, --band and --master-gain.
    #[arg(short, long)]
    preset: Option<PathBuf>,

    /// Number of grid points.
    #[arg(long, default_value_t = 30)]
    points: usize,

    /// Lower grid bound in Hz.
    #[arg(long, default_value_t = 20.0)]
    fmin: f64,

    /// Upper grid bound in Hz.
    #[arg(long, default_value_t = 20000.0)]
    fmax: f64,
}

fn parse_band(spec: &str) -> Result<BandPreset, String> {
    let parts: Vec<&str> = spec.split(',').collect();
    if parts.len() != 3 {
        return Err(format!(
            "band spec '{}' must be freq,bandwidth,gain_db",
            spec
        ));
    }
    let field = |i: usize, name: &str| -> Result<f64, String> {
        parts[i]
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("band spec '{}': bad {}", spec, name))
    };
    Ok(BandPreset {
        freq: field(0, "frequency")?,
        bandwidth: field(1, "bandwidth")?,
        gain_db: field(2, "gain")?,
        enabled: true,
    })
}

fn load_graph(args: &Args) -> Result<FilterGraph, Box<dyn Error>> {
    if let Some(path) = &args.preset {
        let text = fs::read_to_string(path)?;
        let preset: GraphPreset = serde_json::from_str(&text)?;
        return Ok(FilterGraph::from_preset(&preset)?);
    }

    let bands: Result<Vec<BandPreset>, String> =
        args.bands.iter().map(|s| parse_band(s)).collect();
    let preset = GraphPreset {
        sample_rate: args.sample_rate,
        master_gain: args.master_gain,
        master_enabled: true,
        bands: bands?,
    };
    Ok(FilterGraph::from_preset(&preset)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    if args.bands.len() > NUM_BANDS {
        return Err(format!("at most {} bands", NUM_BANDS).into());
    }

    let graph = load_graph(&args)?;
    let grid = log_grid(args.fmin, args.fmax, args.points);

    for band in graph.bands() {
        if band.enabled() {
            println!("# band {}: {}", band.id(), band.filter());
        }
    }
    println!("# master gain: {:+.2} dB", graph.master_gain());

    println!("+-Freq (Hz)--|-Response (dB)-+");
    for &f in grid.iter() {
        let db = graph.response_db(f);
        println!("| {:<10.1} | {:<+13.3} |", f, db);
    }
    println!("+------------|---------------+");

    Ok(())
}
