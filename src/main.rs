use anyhow::{Context, Result};
use csvsnake::{convert_file, ConvertConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config_path = ConvertConfig::discover()?;
    tracing::debug!("Using config {}", config_path.display());
    let config = ConvertConfig::load(&config_path)?;

    let summary = convert_file(&config).with_context(|| {
        format!(
            "Failed to convert {} into {}",
            config.input_path.display(),
            config.output_path.display()
        )
    })?;

    println!(
        "Converted {} rows: {}",
        summary.data_rows,
        config.output_path.display()
    );
    Ok(())
}
