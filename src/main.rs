use memento::app::{App, INTERRUPTED_FAREWELL, SessionEnd};
use memento::cli::{CliInterface, InterruptFlag, install_interrupt_handler, parse_cli};
use memento::config::Config;
use memento::stats::StatsLedger;
use memento::store::WordStore;
use memento::tui::TuiInterface;
use memento::{info_log, logging};
use std::io::{self, IsTerminal};
use std::process::{self, ExitCode};

fn main() -> ExitCode {
    let cli = parse_cli();
    let config = Config::from_cli(&cli);
    logging::init(&config);
    info_log!("data directory: {}", config.data_dir.display());

    let store = match WordStore::load(config.words_path()) {
        Ok(store) => store,
        Err(e) => {
            log::error!("failed to load word list: {e}");
            eprintln!("Failed to load word list: {e}");
            return ExitCode::FAILURE;
        }
    };
    let ledger = match StatsLedger::load(config.stats_path()) {
        Ok(ledger) => ledger,
        Err(e) => {
            log::error!("failed to load statistics: {e}");
            eprintln!("Failed to load statistics: {e}");
            return ExitCode::FAILURE;
        }
    };

    let interactive = io::stdin().is_terminal() && io::stdout().is_terminal();
    let use_tui = interactive && !config.plain;
    let mut app = App::new(store, ledger, rand::thread_rng(), config);

    let end = if use_tui {
        match TuiInterface::new() {
            Ok(mut tui) => app.run(&mut tui),
            Err(e) => {
                log::warn!("falling back to the line interface: {e}");
                run_plain(&mut app, interactive)
            }
        }
    } else {
        run_plain(&mut app, interactive)
    };
    info_log!("session ended: {end:?}");
    ExitCode::SUCCESS
}

fn run_plain<R: rand::Rng>(app: &mut App<R>, styled: bool) -> SessionEnd {
    let interrupt = InterruptFlag::new();
    let installed = install_interrupt_handler(interrupt.clone(), || {
        println!("\n{INTERRUPTED_FAREWELL}");
        process::exit(0);
    });
    if let Err(e) = installed {
        log::warn!("cannot handle Ctrl-C: {e}");
    }

    // stdout stays unlocked between writes so the handler thread can print
    let stdin = io::stdin().lock();
    if styled {
        let mut console = CliInterface::new(stdin, io::stdout()).with_interrupt(interrupt);
        app.run(&mut console)
    } else {
        let mut console = CliInterface::plain(stdin, io::stdout()).with_interrupt(interrupt);
        app.run(&mut console)
    }
}
