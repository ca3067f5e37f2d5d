//! Writes the spiota(1) man page from the clap definition
//!
//! Run as `gen-manpage [DIR]`; the page lands in DIR (`man` if omitted).

use clap::CommandFactory;
use std::path::PathBuf;

#[allow(dead_code)]
#[path = "../cli.rs"]
mod cli;
#[allow(dead_code)]
#[path = "../programmers.rs"]
mod programmers;

fn main() -> std::io::Result<()> {
    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    std::fs::create_dir_all(&dir)?;

    let mut page = Vec::new();
    clap_mangen::Man::new(cli::Cli::command()).render(&mut page)?;

    let path = dir.join("spiota.1");
    std::fs::write(&path, page)?;
    println!("Wrote {} (view with `man -l {}`)", path.display(), path.display());

    Ok(())
}
