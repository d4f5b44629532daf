use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hw2d_core::{Field2D, Grid2D, HwConfig, Precision, RealField, HW};
use log::{info, LevelFilter};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

#[derive(Parser, Debug)]
#[command(name = "hw2d", about = "Hasegawa-Wakatani spectral core: precision check")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the precision label ("double" or "single")
    #[arg(short, long)]
    precision: Option<String>,
    /// Override the number of points per side of the grid
    #[arg(long)]
    grid_size: Option<usize>,
    /// Seed for the random vorticity field
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Solve in both precisions and report their relative difference
    #[arg(long)]
    compare: bool,
    /// Only print warnings and errors
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,
    /// Enable debug mode and debug-level logs
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut config = match &cli.config {
        Some(path) => {
            info!("[cli] loading config {}", path.display());
            HwConfig::from_path(path)?
        }
        None => HwConfig::default(),
    };
    if let Some(label) = &cli.precision {
        config.precision = label.clone();
    }
    if let Some(grid_size) = cli.grid_size {
        config.grid_size = grid_size;
    }
    if cli.verbose {
        config.debug = true;
    }
    config.validate()?;

    let omega = random_field(config.grid_size, cli.seed);
    let density = random_field(config.grid_size, cli.seed.wrapping_add(1));
    let metrics = config.metrics.build_recorder()?.map(Arc::new);

    let mut hw = HW::new(&config)?;
    if let Some(recorder) = &metrics {
        hw = hw.with_metrics(Arc::clone(recorder));
    }
    let phi = report(&hw, &density, &omega)?;

    if cli.compare {
        let other_label = match hw.precision() {
            Precision::Double => "single",
            Precision::Single => "double",
        };
        let mut other = HW::new(&config.clone().with_precision(other_label))?;
        if let Some(recorder) = &metrics {
            other = other.with_metrics(Arc::clone(recorder));
        }
        let other_phi = report(&other, &density, &omega)?;
        let error = relative_difference(&phi, &other_phi);
        println!(
            "relative difference ({} vs {}): {error:.3e}",
            hw.precision(),
            other.precision()
        );
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Warn
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn random_field(grid_size: usize, seed: u64) -> RealField {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Field2D::<f64>::from_fn(Grid2D::square(grid_size), |_, _| {
        StandardNormal.sample(&mut rng)
    })
    .into()
}

fn report(
    hw: &HW,
    density: &RealField,
    omega: &RealField,
) -> Result<RealField, Box<dyn std::error::Error>> {
    let phi = hw.get_phi(omega, hw.dx())?;
    let diagnostics = hw.diagnostics(density, omega, &phi, hw.dx())?;
    let (rows, cols) = phi.shape();

    println!("=== {} precision ===", hw.precision());
    println!("float type:     {}", hw.float_type());
    println!("complex type:   {}", hw.complex_type());
    println!("poisson solver: {}", hw.poisson_solver());
    println!("omega:          {rows}x{cols} {}", omega.real_type());
    println!("phi:            {rows}x{cols} {}", phi.real_type());
    println!("phi mean:       {:.3e}", phi.mean());
    println!("energy:         {:.6e}", diagnostics.energy);
    println!("enstrophy:      {:.6e}", diagnostics.enstrophy);
    println!("gamma_n:        {:.6e}", diagnostics.gamma_n);
    Ok(phi)
}

fn relative_difference(a: &RealField, b: &RealField) -> f64 {
    let a = a.to_f64_vec();
    let b = b.to_f64_vec();
    let diff: f64 = a.iter().zip(&b).map(|(x, y)| (x - y) * (x - y)).sum();
    let norm: f64 = a.iter().map(|x| x * x).sum();
    if norm == 0.0 {
        diff.sqrt()
    } else {
        (diff / norm).sqrt()
    }
}
