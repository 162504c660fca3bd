//! StreetTiles CLI - Command-line interface
//!
//! Serves street-network vector tiles over HTTP, or generates single tiles
//! from the command line.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::quantize::QuantizeArgs;
use commands::serve::ServeArgs;
use commands::tile::TileArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "streettiles")]
#[command(version = streettiles::VERSION)]
#[command(about = "Street-network vector tiles from OpenStreetMap", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP tile server
    Serve {
        /// Config file (default: ~/.streettiles/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to bind (overrides [server] bind)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides [server] port and PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate one tile and write it to a file
    Tile {
        /// Zoom level
        zoom: u8,
        /// Tile column
        x: u32,
        /// Tile row
        y: u32,

        /// Output file (default: {zoom}_{x}_{y}.mvt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (default: ~/.streettiles/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the tile containing a tile at a coarser zoom
    Quantize {
        /// Zoom level
        zoom: u8,
        /// Tile column
        x: u32,
        /// Tile row
        y: u32,

        /// Target zoom level
        #[arg(long)]
        to: u8,
    },

    /// Write the default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Serve { config, bind, port } => {
            commands::serve::run(ServeArgs { config, bind, port })
        }
        Commands::Tile {
            zoom,
            x,
            y,
            output,
            config,
        } => commands::tile::run(TileArgs {
            zoom,
            x,
            y,
            output,
            config,
        }),
        Commands::Quantize { zoom, x, y, to } => {
            commands::quantize::run(QuantizeArgs { zoom, x, y, to })
        }
        Commands::Init { force } => commands::init::run(force),
    };

    if let Err(e) = result {
        e.exit();
    }
}
