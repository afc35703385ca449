/// Entry point and frame loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use error::GameResult;
use sim::game::{Game, Phase};
use ui::gamepad::{GamepadState, HoleCursor};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn main() {
    let config = GameConfig::load();
    init_logging(&config);

    let mut game = Game::new(&config);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let cues = SoundEngine::new()
        .map(|sfx| sound::attach(Rc::new(sfx), game.bus()))
        .unwrap_or_default();

    let result = game_loop(&mut game, &mut renderer, &config);
    sound::detach(game.bus(), cues);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("frame loop stopped: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Mole Garden!");
    println!("Final Score: {}", game.board().points);
}

/// Logs go to the configured file; stderr belongs to the terminal UI.
fn init_logging(config: &GameConfig) {
    let Some(path) = &config.general.log_file else { return };
    match File::create(path) {
        Ok(file) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
            log::info!("logging to {}", path.display());
        }
        Err(e) => eprintln!("Warning: could not open log file {}: {e}", path.display()),
    }
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> GameResult<()> {
    let mut kb = InputState::new();
    kb.honor_release(renderer.reports_key_releases());
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let rows = game.garden().rows();
    let cols = game.garden().cols();
    let mut cursor = HoleCursor::centered(rows, cols);

    let tick_rate = Duration::from_millis(config.general.tick_rate_ms);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
            break;
        }

        let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
        match game.phase() {
            Phase::Title | Phase::GameOver => {
                if confirm {
                    game.start();
                    cursor = HoleCursor::centered(rows, cols);
                    last_tick = Instant::now();
                }
            }
            Phase::Playing => {
                for step in gp.steps() {
                    cursor.step(step, rows, cols);
                }
                // Taps land between ticks, as soon as the key goes down
                for hole in kb.tapped_holes(rows, cols) {
                    game.tap(hole)?;
                }
                if gp.whack_pressed() {
                    game.tap(cursor.index(cols))?;
                }
            }
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            game.update(elapsed.as_secs_f64() * 1000.0)?;
            last_tick = Instant::now();
        }

        let shown_cursor = gp.connected.then(|| cursor.index(cols));
        renderer.render(game, shown_cursor)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
