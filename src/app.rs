//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the Ctrl-C handler,
//! opens the record store and relocates every requested url.

use anyhow::{Context, Result, bail};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use dl_relocate::cli::Args;
use dl_relocate::config::{LoadResult, load_or_init};
use dl_relocate::output as out;
use dl_relocate::{
    CallbackContext, Dispatch, DispatchMode, DownloadRecord, FailReason, JsonStore,
    RelocationListener, default_config_path, relocate_all, shutdown,
};

use crate::logging::init_tracing;

/// Exit status when Ctrl-C left urls unprocessed.
const EXIT_INTERRUPTED: u8 = 130;

/// Prints one line per relocation event.
struct ConsoleListener;

impl RelocationListener for ConsoleListener {
    fn on_prepared(&self, record: &DownloadRecord) {
        debug!(url = %record.url, status = %record.status, "relocation prepared");
    }

    fn on_success(&self, record: &DownloadRecord) {
        out::print_user(&format!("Moved {} -> {}", record.url, record.file_dir));
    }

    fn on_failed(&self, record: Option<&DownloadRecord>, reason: &FailReason) {
        let url = record.map(|r| r.url.as_str()).unwrap_or("<unknown record>");
        out::print_error(&format!("{url}: {reason}"));
    }
}

fn print_config_location() {
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("dl_relocate config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a config path: {e}")),
    }
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<ExitCode> {
    if args.print_config {
        print_config_location();
        return Ok(ExitCode::SUCCESS);
    }

    let mut cfg = match load_or_init()? {
        LoadResult::Loaded(cfg) => cfg,
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!(
                "A template dl_relocate config was written to: {}",
                path.display()
            ));
            out::print_info("Edit `store_path` (and optionally `log_level`, `log_file`, `callback_mode`), then re-run. To use a different file set DL_RELOCATE_CONFIG.");
            return Ok(ExitCode::SUCCESS);
        }
    };
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json)
        .context("initialize logging")?;

    // The guard is dropped on SIGINT as well so buffered file logs are flushed.
    let guard_slot = Arc::new(Mutex::new(guard));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; finishing running relocations...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .context("install signal handler")?;
    }

    debug!(?args, "starting dl_relocate");

    let result = relocate(&args, &cfg);

    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}

fn relocate(args: &Args, cfg: &dl_relocate::Config) -> Result<ExitCode> {
    cfg.validate()?;
    let Some(destination) = args.resolved_destination() else {
        bail!("a destination directory is required");
    };
    if args.urls.is_empty() {
        bail!("at least one url is required");
    }

    let store = Arc::new(
        JsonStore::open(&cfg.store_path)
            .with_context(|| format!("open record store '{}'", cfg.store_path.display()))?,
    );
    let listener: Arc<dyn RelocationListener> = Arc::new(ConsoleListener);

    let (dispatch, callbacks) = match cfg.dispatch_mode {
        DispatchMode::Inline => (Dispatch::Inline, None),
        DispatchMode::Marshaled => {
            let ctx = CallbackContext::new();
            let poster = ctx.poster();
            let worker = ctx
                .spawn("dl-relocate-callbacks")
                .context("spawn callback thread")?;
            (Dispatch::Marshaled(poster), Some(worker))
        }
    };

    // relocate_all consumes the last poster, so the callback thread drains and exits.
    let report = relocate_all(store, args.urls.as_slice(), &destination, Some(listener), dispatch);
    if let Some(worker) = callbacks {
        let ran = worker.join();
        debug!(ran, "callback thread finished");
    }

    for url in &report.skipped {
        out::print_warn(&format!("{url}: skipped (interrupted)"));
    }
    if let Some((url, reason)) = report.failed.first() {
        error!(
            code = reason.kind.code(),
            kind = %reason.kind,
            url = %url,
            failed = report.failed.len(),
            "Relocation failed"
        );
        return Ok(ExitCode::from(reason.kind.code() as u8));
    }
    if !report.skipped.is_empty() {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}
