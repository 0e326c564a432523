use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, terminal,
};
use log::{debug, error, info, warn};

use dino_tui::audio::Audio;
use dino_tui::config::{self, Config};
use dino_tui::render::{self, PixelBuf};
use dino_tui::{Run, RunEvent};

// ── Setup ───────────────────────────────────────────────────────────────────

/// Logs go to a file since the terminal belongs to the game.
fn init_logging() {
    let Some(path) = config::log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn load_config() -> Config {
    let Some(path) = config::config_path() else {
        return Config::default();
    };
    match Config::load(&path) {
        Ok(config) => {
            info!("Using config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config: {:#}", anyhow::Error::from(e));
            Config::default()
        }
    }
}

fn open_audio(config: &Config) -> Option<Audio> {
    if !config.sound {
        return None;
    }
    match Audio::new(config.volume) {
        Ok(audio) => Some(audio),
        Err(e) => {
            warn!("Sound disabled: {:#}", anyhow::Error::from(e));
            None
        }
    }
}

fn restore(out: &mut io::Stdout) -> io::Result<()> {
    execute!(
        out,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()
}

// ── Main ────────────────────────────────────────────────────────────────────

fn dispatch(events: &[RunEvent], audio: Option<&Audio>) {
    for event in events {
        match event {
            RunEvent::Sound(sound) => {
                if let Some(audio) = audio {
                    audio.play(*sound);
                }
            }
            RunEvent::PaletteSwapped { dark } => debug!("Palette swapped (dark: {dark})"),
            _ => {}
        }
    }
}

fn game_loop(out: &mut io::Stdout, config: &Config, audio: Option<&Audio>) -> anyhow::Result<()> {
    let (cols, rows) = terminal::size()?;
    let mut buf = PixelBuf::for_terminal(cols, rows);
    let mut run = Run::from_config(config);

    let frame_dur = Duration::from_secs_f64(1.0 / f64::from(config.fps));
    info!(
        "Starting: {cols}x{rows} cells, {} fps, sound {}",
        config.fps,
        if audio.is_some() { "on" } else { "off" }
    );

    loop {
        let frame_start = Instant::now();

        // Input
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') | KeyCode::Up => {
                        if let Some(event) = run.jump() {
                            dispatch(&[event], audio);
                        }
                    }
                    KeyCode::Enter | KeyCode::Char('r') if run.prompt_visible() => run.restart(),
                    _ => {}
                },
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(MouseButton::Left),
                    column,
                    row,
                    ..
                }) => {
                    render::click(&mut run, &buf, column, row);
                }
                Event::Resize(c, r) => {
                    debug!("Resized to {c}x{r}");
                    buf.resize(c as usize, r as usize * 2);
                }
                _ => {}
            }
        }

        // Update
        let events = run.tick(frame_dur);
        dispatch(&events, audio);

        // Render
        render::draw(&run, &mut buf);
        buf.render(out)?;

        // Frame pacing
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = load_config();
    let audio = open_audio(&config);

    terminal::enable_raw_mode().context("Could not put the terminal in raw mode")?;
    let mut out = stdout();
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
    )
    .context("Could not set up the terminal")?;

    let result = game_loop(&mut out, &config, audio.as_ref());
    let restored = restore(&mut out).context("Could not restore the terminal");
    finish(result, restored)
}

/// The loop's own error wins; a restore failure on top of it only gets logged.
fn finish(result: anyhow::Result<()>, restored: anyhow::Result<()>) -> anyhow::Result<()> {
    match result {
        Err(e) => {
            if let Err(restore_err) = restored {
                error!("{restore_err:#}");
            }
            Err(e)
        }
        Ok(()) => restored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_error_wins_over_restore_error() {
        let err = finish(
            Err(anyhow::anyhow!("read failed")),
            Err(anyhow::anyhow!("restore failed")),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "read failed");
    }

    #[test]
    fn restore_error_surfaces_after_clean_exit() {
        let err = finish(Ok(()), Err(anyhow::anyhow!("restore failed"))).unwrap_err();
        assert_eq!(err.to_string(), "restore failed");
        assert!(finish(Ok(()), Ok(())).is_ok());
    }
}
