use crate::cli::ResolveArgs;
use crate::config::{CliOverrides, build_config};
use crate::error::Result;
use plapt::{engine::progress::ProgressReporter, workflows};
use std::io::{self, Write};
use tracing::info;

pub async fn run(args: ResolveArgs) -> Result<()> {
    let app = build_config(&args.config, CliOverrides::default())?;

    let pairs = tokio::task::block_in_place(|| {
        workflows::resolve::run(
            &args.inputs.proteins,
            &args.inputs.molecules,
            &app.run.input,
            &ProgressReporter::new(),
        )
    })?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (protein, molecule) in pairs.iter() {
        writeln!(out, "{}\t{}", protein, molecule)?;
    }
    out.flush()?;

    info!("Printed {} resolved pair(s).", pairs.len());
    Ok(())
}
