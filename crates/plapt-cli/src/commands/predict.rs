use crate::cli::PredictArgs;
use crate::config::{CliOverrides, build_config};
use crate::error::Result;
use crate::predictor::HttpPredictor;
use crate::utils::progress::CliProgressHandler;
use plapt::{engine::progress::ProgressReporter, workflows};
use tokio::runtime::Handle;
use tracing::{debug, info};

pub async fn run(args: PredictArgs, show_progress: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(
        &args.config,
        CliOverrides {
            endpoint: args.endpoint.as_deref(),
            batch_size: args.batch_size,
            output: Some(args.output.as_str()),
        },
    )?;
    debug!("Final configuration: {:?}", &app);

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let predictor = HttpPredictor::new(
        app.predictor.clone(),
        Handle::current(),
        ProgressReporter::with_callback(progress_handler.get_callback()),
    )?;

    info!("Invoking the core prediction workflow...");
    let results = tokio::task::block_in_place(|| {
        let stdout = std::io::stdout();
        let mut console = stdout.lock();
        workflows::predict::run(
            &args.inputs.proteins,
            &args.inputs.molecules,
            &app.run,
            &predictor,
            &reporter,
            &mut console,
        )
    })?;

    info!(
        "Workflow finished with {} prediction(s) written to {}.",
        results.len(),
        app.run.output.target
    );
    Ok(())
}
