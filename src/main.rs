mod book;
mod chapter;
mod config;
mod engine;
mod progress;
mod session;

use anyhow::Result;
use clap::{Arg, Command};
use crossterm::{
    cursor::{self, MoveTo},
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    terminal::{self, Clear, ClearType},
};
use session::{ReadingSession, RestoreMode, SessionError, SessionEvent};
use std::io::{Write, stdout};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const READY_PROMPT: &str = "press space to start";
const WPM_STEP: u32 = 50;
const MIN_WPM: u32 = 50;
// Poll cadence while paused, so keys stay responsive without busy-looping.
const PAUSED_POLL: Duration = Duration::from_millis(200);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("espritz=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("espritz")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reads an EPUB one word at a time in the terminal")
        .arg(
            Arg::new("book")
                .num_args(1)
                .help("Path to an .epub file; omit to resume the last book"),
        )
        .arg(
            Arg::new("wpm")
                .short('w')
                .long("wpm")
                .num_args(1)
                .help("Words per minute (overrides the saved speed)"),
        )
        .get_matches();

    let data_dir = progress::default_dir();
    let config_path = data_dir.join("config.toml");
    let config = config::load_config(&config_path);
    let store = progress::ProgressStore::at(&data_dir);

    let mut session = ReadingSession::new(store, config.wpm);
    match matches.get_one::<String>("book") {
        Some(path) => {
            if let Err(err) = session.set_source(path) {
                match err {
                    SessionError::UnsupportedSource(_) => anyhow::bail!("{err}"),
                    SessionError::Open(err) => return Err(err),
                }
            }
        }
        None => {
            session.restore(RestoreMode::ColdStart);
            if !session.is_open() {
                anyhow::bail!("nothing to resume; pass a path to an .epub file");
            }
        }
    }

    if let Some(wpm) = matches.get_one::<String>("wpm") {
        match wpm.parse::<u32>() {
            Ok(wpm) => session.set_wpm(wpm.max(MIN_WPM)),
            Err(_) => anyhow::bail!("--wpm expects a number, got {wpm:?}"),
        }
    }

    run_player(&mut session)?;

    config::save_config(
        &config_path,
        &config::AppConfig {
            wpm: session.wpm(),
        },
    );
    Ok(())
}

fn run_player(session: &mut ReadingSession) -> Result<()> {
    let mut out = stdout();
    terminal::enable_raw_mode()?;
    execute!(out, cursor::Hide)?;
    let result = player_loop(session, &mut out);
    execute!(out, cursor::Show)?;
    terminal::disable_raw_mode()?;
    println!();
    result
}

fn player_loop(session: &mut ReadingSession, out: &mut impl Write) -> Result<()> {
    let mut word = READY_PROMPT.to_string();

    loop {
        draw(out, session, &word)?;

        let timeout = if session.is_playing() {
            session.word_interval()
        } else {
            PAUSED_POLL
        };
        if event::poll(timeout)? {
            if let Event::Key(KeyEvent { code, .. }) = event::read()? {
                match code {
                    KeyCode::Char(' ') => {
                        if session.is_playing() {
                            session.pause();
                        } else {
                            session.play();
                        }
                    }
                    KeyCode::Up => session.set_wpm(session.wpm() + WPM_STEP),
                    KeyCode::Down => {
                        session.set_wpm(session.wpm().saturating_sub(WPM_STEP).max(MIN_WPM))
                    }
                    KeyCode::Right => {
                        if session.chapter() + 1 < session.max_chapter() {
                            session.print_chapter(session.chapter() + 1);
                            word = READY_PROMPT.to_string();
                        }
                    }
                    KeyCode::Left => {
                        if session.chapter() > 0 {
                            session.print_chapter(session.chapter() - 1);
                            word = READY_PROMPT.to_string();
                        }
                    }
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    _ => {}
                }
            }
        } else if let Some(next) = session.tick() {
            word = next;
        }

        for event in session.drain_events() {
            let SessionEvent::ChapterAdvanced(chapter) = event;
            debug!(chapter, "Chapter counter updated");
        }

        if session.is_finished() {
            info!("Reached the end of the book");
            word = "the end".to_string();
            draw(out, session, &word)?;
            break;
        }
    }

    session.save_progress();
    Ok(())
}

fn draw(out: &mut impl Write, session: &ReadingSession, word: &str) -> Result<()> {
    let (cols, rows) = terminal::size()?;
    execute!(out, Clear(ClearType::All))?;

    let x = (cols / 2).saturating_sub(word.len() as u16 / 2);
    execute!(out, MoveTo(x, rows / 2))?;
    write!(out, "{word}")?;

    let status = format!(
        "{} | chapter {}/{} | {} wpm | {}",
        session.title().filter(|t| !t.is_empty()).unwrap_or("untitled"),
        session.chapter() + 1,
        session.max_chapter().max(1),
        session.wpm(),
        if session.is_playing() { "playing" } else { "paused" },
    );
    let status_x = (cols / 2).saturating_sub(status.len() as u16 / 2);
    execute!(out, MoveTo(status_x, rows.saturating_sub(2)))?;
    write!(out, "{status}")?;

    let menu = "Space: Play/Pause | Up/Down: Speed | Left/Right: Chapter | Q: Quit";
    let menu_x = (cols / 2).saturating_sub(menu.len() as u16 / 2);
    execute!(out, MoveTo(menu_x, rows.saturating_sub(1)))?;
    write!(out, "{menu}")?;

    out.flush()?;
    Ok(())
}
