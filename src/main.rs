use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use entrainment_stimuli::config::{load_config, save_config, Config};
use entrainment_stimuli::display::{FrameBuffer, NoEvents};
use entrainment_stimuli::error::{Result, StimulusError};
use entrainment_stimuli::glass::{generate, generate_batch, GlassImageConfig, Handedness};
use entrainment_stimuli::timing::frame_clock::DEFAULT_REFRESH_RATES;
use entrainment_stimuli::timing::{possible_flicker_rates, MonotonicClock, PulseScheduler, TimingSummary};
use entrainment_stimuli::utils::log::{log_with_header, print_error, print_summary, TimingLog};
use entrainment_stimuli::visualization::window::{FlickerWindow, GlassViewer};

#[derive(Parser)]
#[command(name = "stimuli", version, about = "Flicker entrainment and Glass pattern stimuli")]
struct Cli {
    /// YAML session config; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flicker the central square. Expects a monitor with a variable refresh rate.
    Flicker(FlickerArgs),
    /// Render Glass pattern PNGs
    Glass {
        #[command(flatten)]
        glass: GlassArgs,
        /// Output file for a single image
        #[arg(long, default_value = "glass.png")]
        out: PathBuf,
        /// Render this many images with consecutive seeds into --out-dir
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, default_value = "glass_images")]
        out_dir: PathBuf,
    },
    /// Interactive Glass pattern window
    ViewGlass {
        #[command(flatten)]
        glass: GlassArgs,
    },
    /// List "1 on, k off" flicker rates reachable at the given refresh rates
    Rates {
        refresh_rates: Vec<u32>,
        #[arg(long, default_value_t = 6.0)]
        min_hz: f64,
        #[arg(long, default_value_t = 14.0)]
        max_hz: f64,
    },
    /// Write the default config to a YAML file
    InitConfig { path: PathBuf },
}

#[derive(Args)]
struct FlickerArgs {
    #[arg(long)]
    frequency: Option<f64>,
    /// ≥20–25% higher than your min monitor refresh to allow draw jitter
    #[arg(long)]
    min_refresh: Option<f64>,
    /// 20–25% lower than your max monitor refresh to allow draw jitter
    #[arg(long)]
    max_refresh: Option<f64>,
    /// Number of flashes to present (run until Escape when omitted)
    #[arg(long)]
    cycles: Option<usize>,
    /// Draw a fixation cross on blank frames
    #[arg(long)]
    fixation: bool,
    /// Run against an in-memory buffer instead of a window (needs --cycles)
    #[arg(long)]
    headless: bool,
    /// Per-frame timing CSV
    #[arg(long)]
    timing_csv: Option<PathBuf>,
    /// Write the final timing summary as YAML
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    verbose: bool,
}

#[derive(Args)]
struct GlassArgs {
    /// Spiral angle in degrees (0..90). 0=radial, 90=concentric.
    #[arg(long)]
    angle: Option<f64>,
    /// Signal fraction (0..1)
    #[arg(long)]
    snr: Option<f64>,
    /// Approx. dot area density (0..1)
    #[arg(long)]
    density: Option<f64>,
    /// Glass shift (pixels) between dots in a dipole
    #[arg(long)]
    shift: Option<f64>,
    /// Dot radius in pixels
    #[arg(long)]
    dot_radius: Option<u32>,
    /// Square canvas side in pixels
    #[arg(long)]
    size: Option<u32>,
    /// Spiral handedness, cw or ccw
    #[arg(long)]
    handed: Option<Handedness>,
    #[arg(long)]
    seed: Option<u64>,
}

impl GlassArgs {
    fn apply(&self, mut config: GlassImageConfig) -> GlassImageConfig {
        if let Some(v) = self.angle {
            config.angle_deg = v;
        }
        if let Some(v) = self.snr {
            config.snr = v;
        }
        if let Some(v) = self.density {
            config.density = v;
        }
        if let Some(v) = self.shift {
            config.shift_px = v;
        }
        if let Some(v) = self.dot_radius {
            config.dot_radius_px = v;
        }
        if let Some(v) = self.size {
            config.size_px = v;
        }
        if let Some(v) = self.handed {
            config.handedness = v;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Flicker(args) => run_flicker_command(config, args),
        Commands::Glass {
            glass,
            out,
            count,
            out_dir,
        } => {
            let glass_config = glass.apply(config.glass);
            match count {
                Some(count) => export_batch(&glass_config, count, &out_dir),
                None => {
                    let pattern = generate(&glass_config)?;
                    pattern.image.save_png(&out)?;
                    println!(
                        "Saved: {} (seed {}, {} of {} dipoles drawn)",
                        out.display(),
                        pattern.seed,
                        pattern.rendered.len(),
                        pattern.dipoles.len()
                    );
                    Ok(())
                }
            }
        }
        Commands::ViewGlass { glass } => GlassViewer::run(glass.apply(config.glass)),
        Commands::Rates {
            refresh_rates,
            min_hz,
            max_hz,
        } => {
            let refresh_rates = if refresh_rates.is_empty() {
                DEFAULT_REFRESH_RATES.to_vec()
            } else {
                refresh_rates
            };
            print_rates(&refresh_rates, min_hz, max_hz);
            Ok(())
        }
        Commands::InitConfig { path } => {
            save_config(&Config::default(), &path)?;
            println!("Written → {}", path.display());
            Ok(())
        }
    }
}

fn run_flicker_command(mut config: Config, args: FlickerArgs) -> Result<()> {
    if let Some(v) = args.frequency {
        config.flicker.frequency_hz = v;
    }
    if let Some(v) = args.min_refresh {
        config.flicker.min_refresh_hz = v;
    }
    if let Some(v) = args.max_refresh {
        config.flicker.max_refresh_hz = v;
    }
    if args.cycles.is_some() {
        config.flicker.max_pulses = args.cycles;
    }
    if args.fixation {
        config.flicker.fixation = true;
    }
    if args.verbose {
        config.logging.verbose = true;
    }
    if args.timing_csv.is_some() {
        config.logging.timing_csv = args.timing_csv.clone();
    }
    if args.headless && config.flicker.max_pulses.is_none() {
        return Err(StimulusError::Config(
            "--headless needs --cycles, there is no way to stop it otherwise".to_string(),
        ));
    }

    let mut scheduler = PulseScheduler::new(
        &config.flicker.flicker_config(),
        config.scheduler_options()?,
        MonotonicClock::new(),
    )?;
    if let Some(cross) = config.fixation_cross() {
        scheduler = scheduler.with_overlay(Box::new(cross));
    }
    if let Some(path) = &config.logging.timing_csv {
        scheduler = scheduler.with_timing_log(TimingLog::create(path)?);
    }

    let cadence = *scheduler.cadence();
    println!(
        "Flicker {:.3} Hz at {:.3} Hz frame rate: 1 on, {} off",
        cadence.effective_flicker_hz(),
        cadence.frame_rate_hz,
        cadence.off_frames_per_on
    );

    let summary = if args.headless {
        let mut surface = FrameBuffer::new(config.display.width, config.display.height);
        Some(scheduler.run(&mut surface, &mut NoEvents))
    } else {
        FlickerWindow::run(scheduler, &config.display)?
    };

    if let Some(summary) = summary {
        print_summary(&summary);
        if let Some(path) = &args.summary_out {
            write_summary(&summary, path)?;
        }
        if config.logging.verbose {
            match serde_yaml::to_string(&summary) {
                Ok(body) => {
                    if let Err(e) = log_with_header(&config.logging.log_dir, "flicker_sessions.log", "Flicker session", &body) {
                        print_error(&format!("Failed to write to log file: {}", e));
                    }
                }
                Err(e) => print_error(&format!("Failed to serialize summary: {}", e)),
            }
        }
    }
    Ok(())
}

fn write_summary(summary: &TimingSummary, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(summary)
        .map_err(|e| StimulusError::Config(format!("Failed to serialize summary: {}", e)))?;
    std::fs::write(path, yaml)?;
    Ok(())
}

fn export_batch(config: &GlassImageConfig, count: usize, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;
    let first = config.seed.unwrap_or_else(|| rand::random::<u32>() as u64);
    let seeds: Vec<u64> = (0..count as u64).map(|i| first + i).collect();

    for result in generate_batch(config, &seeds) {
        let pattern = result?;
        let path = out_dir.join(format!(
            "glass_{}_{}_{}.png",
            config.angle_deg.round() as i64,
            config.handedness,
            pattern.seed
        ));
        pattern.image.save_png(&path)?;
        println!("Saved: {}", path.display());
    }
    Ok(())
}

fn print_rates(refresh_rates: &[u32], min_hz: f64, max_hz: f64) {
    println!(
        "Flicker rates between {} and {} Hz, sorted in decreasing order:",
        min_hz, max_hz
    );
    let mut previous: Option<f64> = None;
    for rate in possible_flicker_rates(refresh_rates, min_hz, max_hz) {
        match previous {
            None => println!(
                "{:.2} @ {} Hz with 1 on and {} off",
                rate.flicker_hz, rate.refresh_hz, rate.off_frames
            ),
            Some(prev) => println!(
                "{:.2} @ {} Hz Δ{:.2} with 1 on and {} off",
                rate.flicker_hz,
                rate.refresh_hz,
                prev - rate.flicker_hz,
                rate.off_frames
            ),
        }
        previous = Some(rate.flicker_hz);
    }
}
