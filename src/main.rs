use anyhow::{Context, Result};
use std::process::ExitCode;
use wordle_client::cli::{Cli, display_history, parse_cli};
use wordle_client::logging::init_logger;
use wordle_client::wordbank::{load_wordbank_from_file, resolve_wordbank_path};
use wordle_client::{SessionError, session};

const EXIT_EXHAUSTED: u8 = 2;

fn play(cli: &Cli) -> Result<String> {
    let path = resolve_wordbank_path(cli.wordbank_path.as_deref())?;
    let dictionary = load_wordbank_from_file(&path)?;
    let config = cli.client_config();
    let report = session::run(&config, &dictionary)
        .with_context(|| format!("game with {}:{} failed", config.host, config.port))?;
    if cli.show_guesses {
        display_history(&report.history);
    }
    Ok(report.flag)
}

fn main() -> ExitCode {
    let cli = parse_cli();
    init_logger(cli.verbose);

    match play(&cli) {
        Ok(flag) => {
            println!("{flag}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            let exhausted = matches!(
                e.downcast_ref::<SessionError>(),
                Some(SessionError::DictionaryExhausted { .. })
            );
            if exhausted {
                ExitCode::from(EXIT_EXHAUSTED)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
