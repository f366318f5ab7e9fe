//! dupsweep CLI: scan a directory for duplicate files and folders by content.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dupsweep::cli::Cli;
use dupsweep::{CancelToken, NoopSink, ProgressSink, TerminalSink};

fn main() -> ExitCode {
    let cli = Cli::parse();
    dupsweep::utils::setup_logging(cli.verbose);

    let config = match cli.resolve_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            log::warn!("failed to install Ctrl+C handler: {e}");
        }
    }

    let sink: Arc<dyn ProgressSink> = if cli.json || cli.no_progress {
        Arc::new(NoopSink)
    } else {
        Arc::new(TerminalSink::new())
    };

    match dupsweep::run_with_cancel(&cli.root, &config, sink.as_ref(), cancel) {
        Ok(report) => {
            if cli.json {
                match dupsweep::format::to_json_string(&report, true) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        log::error!("{e:#}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print!("{}", dupsweep::format::format_text(&report));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let message = e.to_string();
            if message.contains("cancelled by user") {
                log::warn!("{message}");
                ExitCode::from(130)
            } else {
                log::error!("{e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
