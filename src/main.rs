//! spiota - SPI flash programmer for register-programmed USB-to-SPI bridges
//!
//! The bridge exposes its SPI controller as a block of ten registers; every
//! flash command is one register write (plus payload), an optional data
//! fetch and a register readback. All of that lives in `spiota-core`; this
//! binary picks a programmer, builds the flash profile and runs a command.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use spiota_core::flash::SpiFlash;
use spiota_core::profile::FlashProfile;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger at the level picked by -v/-vv
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Commands that don't talk to a flash
    match cli.command {
        Commands::ListProgrammers => {
            commands::list_programmers();
            return Ok(());
        }
        Commands::ListDevices => return commands::list_devices(),
        _ => {}
    }

    let mut profile = load_profile(&cli)?;
    let opened = programmers::open_programmer(&cli.programmer)?;
    if let Some(timeout) = opened.timeout {
        profile = profile.with_timeout(timeout);
    }
    let mut flash = SpiFlash::with_profile(opened.transport, profile)?;

    match cli.command {
        Commands::Probe => commands::probe::run_probe(&mut flash),
        Commands::Status => commands::status::run_status(&mut flash),
        Commands::Read {
            output,
            start,
            length,
        } => commands::read::run_read(&mut flash, &output, start, length as usize),
        Commands::Erase { start, length } => {
            commands::erase::run_erase(&mut flash, start, length as usize)
        }
        Commands::Write {
            input,
            start,
            no_erase,
            no_verify,
        } => commands::write::run_write(&mut flash, &input, start, !no_erase, !no_verify),
        Commands::Verify { input, start } => {
            commands::verify::run_verify(&mut flash, &input, start)
        }
        Commands::ListProgrammers | Commands::ListDevices => Ok(()),
    }
}

/// Build the flash profile from `--profile` and the command-line overrides
fn load_profile(cli: &Cli) -> Result<FlashProfile, Box<dyn std::error::Error>> {
    let mut profile = match &cli.profile {
        Some(path) => {
            log::debug!("Loading flash profile from {}", path.display());
            FlashProfile::load(path)?
        }
        None => FlashProfile::default(),
    };

    if let Some(page_size) = cli.page_size {
        profile = profile.with_page_size(page_size as usize);
    }
    if let Some(read_chunk) = cli.read_chunk {
        profile = profile.with_read_chunk(read_chunk as usize);
    }

    profile.validate()?;
    Ok(profile)
}
