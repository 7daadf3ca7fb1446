/// Entry point and real-time loop.
///
/// The loop only gathers input, hands wall-clock time to the session and
/// draws. Ticks, the run clock and respawn delays all live in the
/// session's scheduler.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use config::GameConfig;
use sim::level::{build_def, load_or_embedded};
use sim::session::Session;
use ui::gamepad::GamepadState;
use ui::hud::Hud;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::Speaker;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for warning in &config.warnings {
        log::warn!("{warning}");
    }

    let def = load_or_embedded(config.level_file.as_deref());
    let mut session = Session::new(build_def(&def), &config);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut hud = Hud::new();
    let mut speaker = Speaker::new();

    let result = game_loop(&mut session, &mut renderer, &mut hud, &mut speaker, &config);
    session.stop();

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
    }

    let run = &session.world().run;
    println!();
    println!("Thanks for playing Retro Dash!");
    println!("World {}  Final Score: {}  Coins: {}", run.world, run.score, run.coins);
}

/// `RUST_LOG` overrides the default `warn` filter. With `log_file` set,
/// records go there instead of the (raw-mode) terminal.
fn init_logging(config: &GameConfig) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    if let Some(path) = &config.log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("cannot open log file {}: {e}", path.display()),
        }
    }
    builder.init();
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    hud: &mut Hud,
    speaker: &mut Speaker,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.enable_key_release();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        log::info!("gamepad detected");
    }

    let quit = session.cancel_token();
    let mut last = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.quit_pressed() {
            quit.cancel();
            break;
        }
        if kb.mute_pressed() || gp.mute_pressed() {
            session.toggle_mute(hud);
        }
        if kb.respawn_pressed() || gp.respawn_pressed() {
            session.manual_respawn(hud);
        }

        // Whole milliseconds only; the remainder carries into the next frame.
        let elapsed_ms = last.elapsed().as_millis() as u64;
        last += Duration::from_millis(elapsed_ms);

        let input = kb.frame_input().merge(gp.frame_input());
        session.advance(elapsed_ms, &input, hud, speaker);

        renderer.render(session.world(), hud)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
