//! Command-line interface definitions using clap

use clap::Parser;

use crate::config::StaticConfig;
use crate::errors::Result;

/// Snaplink - an in-memory URL shortener with expiring links
#[derive(Parser, Debug)]
#[command(name = "snaplink")]
#[command(version)]
#[command(about = "An in-memory URL shortener with expiring links", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Write the sample configuration to PATH instead of stdout
    #[arg(long, short = 'o', value_name = "PATH", requires = "generate_config")]
    pub output: Option<String>,
}

/// `--generate-config`：写入文件或打印到 stdout
pub fn generate_config(output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            StaticConfig::default().save_to_file(path)?;
            println!("Configuration file written to {}", path);
        }
        None => println!("{}", StaticConfig::generate_sample_config()),
    }
    Ok(())
}
