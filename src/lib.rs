pub mod cli;
pub mod colormaps;
pub mod dims;
pub mod error;
pub mod events;
pub mod interaction;
pub mod layers;
pub mod scene;
pub mod viewer;

pub fn run_cli() -> Result<(), String> {
    cli::run_cli()
}
