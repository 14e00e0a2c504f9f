// src/main.rs

use anyhow::Context;
use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use std::io::{stdout, Stdout, Write};
use std::path::Path;
use std::time::Duration;

use waveplay::audio::CpalOutput;
use waveplay::time::format_time;
use waveplay::waveform::terminal::canvas_to_ascii;
use waveplay::{EngineConfig, PixelCanvas, PlaybackController, PlaybackState};

// Character cells the canvas is projected onto.
const TERM_COLS: usize = 100;
const TERM_ROWS: usize = 20;

fn main() -> Result<(), anyhow::Error> {
    // RUST_LOG=debug for state transitions
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: player <audio-file> [config.json]");
        std::process::exit(2);
    };
    let config = match args.get(2) {
        Some(cfg) => EngineConfig::load_from_disk(cfg)?,
        None => EngineConfig::default(),
    };

    let bytes = std::fs::read(path).with_context(|| format!("reading {path}"))?;
    let output = CpalOutput::open_default(config.output)?;
    let mut player = PlaybackController::new(output, config.clone());

    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path.as_str());
    player.load_named(name, &bytes)?;

    println!("[SPACE] Play/Pause | [←/→] Seek | [↑/↓] Volume | [D] Delete | [Q] Quit");

    enable_raw_mode()?;
    let result = run(&mut player, &config);
    disable_raw_mode()?;

    println!("\r\nExiting player.");
    result
}

fn run(player: &mut PlaybackController<CpalOutput>, config: &EngineConfig) -> anyhow::Result<()> {
    let frame_interval = Duration::from_millis(config.playback.frame_interval_ms.max(1));
    let seek_step = config.playback.seek_step_secs;
    let volume_step = config.playback.volume_step;

    let mut canvas = PixelCanvas::new(config.canvas.width, config.canvas.height);
    let mut out = stdout();
    let mut message: Option<String> = None;

    loop {
        // poll() doubles as frame pacing
        if event::poll(frame_interval)? {
            if let Event::Key(ev) = event::read()? {
                if ev.kind == KeyEventKind::Press {
                    if ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL) {
                        break;
                    }
                    let outcome = match ev.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Char(' ') => player.toggle_playback(),
                        KeyCode::Left => player.seek_by(-seek_step),
                        KeyCode::Right => player.seek_by(seek_step),
                        KeyCode::Up => {
                            let v = player.volume() + volume_step;
                            player.set_volume(v);
                            Ok(())
                        }
                        KeyCode::Down => {
                            let v = player.volume() - volume_step;
                            player.set_volume(v);
                            Ok(())
                        }
                        KeyCode::Char('d') => {
                            player.unload();
                            Ok(())
                        }
                        _ => Ok(()),
                    };
                    message = outcome.err().map(|e| e.to_string());
                }
            }
        }

        if let Some(token) = player.next_frame() {
            if let Err(e) = player.run_frame(token, &mut canvas) {
                message = Some(e.to_string());
            }
            draw(&mut out, player, &canvas, config, message.as_deref())?;
        }
    }
    Ok(())
}

fn draw(
    out: &mut Stdout,
    player: &PlaybackController<CpalOutput>,
    canvas: &PixelCanvas,
    config: &EngineConfig,
    message: Option<&str>,
) -> anyhow::Result<()> {
    let lines = canvas_to_ascii(
        canvas,
        TERM_COLS,
        TERM_ROWS,
        config.canvas.background,
        config.canvas.playhead,
    );
    for (row, line) in lines.iter().enumerate() {
        queue!(out, MoveTo(0, row as u16), Print(line), Clear(ClearType::UntilNewLine))?;
    }

    let status = player.status();
    let state = match status.state {
        PlaybackState::Playing => "▶ Playing",
        PlaybackState::Paused => "⏸ Paused ",
        PlaybackState::Idle => "⏹ Idle   ",
    };
    let name = status.source_name.as_deref().unwrap_or("No file selected");
    queue!(
        out,
        MoveTo(0, TERM_ROWS as u16),
        Print(format!(
            "{state} | {} / {} | Vol: {:3.0}% | {name}",
            format_time(status.current_time),
            format_time(status.duration),
            status.volume * 100.0
        )),
        Clear(ClearType::UntilNewLine),
        MoveTo(0, TERM_ROWS as u16 + 1),
        Print(message.unwrap_or("")),
        Clear(ClearType::UntilNewLine)
    )?;
    out.flush()?;
    Ok(())
}
