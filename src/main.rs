use std::{
    env,
    io::{self, Write},
};

use epoch_trainer::SPEC_VAR;
use log::info;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = epoch_trainer::spec_path(env::args_os().nth(1), env::var_os(SPEC_VAR))?;

    let spec = epoch_trainer::load_spec(&path)?;
    info!("loaded training spec from {}", path.display());

    let mut out = io::stdout().lock();
    epoch_trainer::run(&spec, |report| {
        serde_json::to_writer(&mut out, report)?;
        writeln!(out)?;
        Ok(())
    })
}
