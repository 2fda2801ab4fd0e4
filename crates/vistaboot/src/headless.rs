use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use panorama::{HeadlessBackend, ThreadedTextureLoader, Viewport};
use scheduler::FramePacer;

use crate::bootstrap::{AppStore, Bootstrap};
use crate::cli::RunArgs;
use crate::session::{Control, Session, UiState};

const HEADLESS_FPS: f32 = 60.0;
const IDLE_WAIT: Duration = Duration::from_millis(50);

type HeadlessSession = Session<HeadlessBackend, Rc<AppStore>>;

/// Drives sessions without a window, printing progress to stdout. Returns
/// once a variant is mounted, or when the selector appears and no `--select`
/// was given.
pub fn run(bootstrap: &Bootstrap, store: Rc<AppStore>, args: &RunArgs) -> Result<()> {
    let loader = ThreadedTextureLoader::new(bootstrap.asset.clone());
    let (width, height) = bootstrap.surface_size;
    let viewport = Viewport::new(width as f32, height as f32, 1.0);
    let start = |now: Instant| -> HeadlessSession {
        Session::start(
            HeadlessBackend::new(),
            store.clone(),
            &bootstrap.settings,
            viewport,
            &loader,
            now,
        )
    };

    let mut pacer = FramePacer::new(HEADLESS_FPS);
    let mut session = start(Instant::now());
    let mut pending_switch = args.switch;
    let mut last_status = String::new();

    loop {
        let now = Instant::now();
        session.advance(now);
        if session.wants_frame() && pacer.ready_for_frame(now) {
            session.frame(now);
            pacer.mark_rendered(now);
        }

        let status = session.status_line();
        if status != last_status {
            println!("{status}");
            last_status = status;
        }

        match session.ui() {
            UiState::Booting => {}
            UiState::Selecting => match args.select {
                Some(variant) => {
                    session.choose(variant);
                    continue;
                }
                None => {
                    println!("no variant stored; rerun with --select <ID> to choose one");
                    return Ok(());
                }
            },
            UiState::Hosted(mounted) => {
                let rendered = mounted.render();
                println!("{}", rendered.title);
                for line in &rendered.lines {
                    println!("  {line}");
                }
                if let Some(target) = pending_switch.take() {
                    session.toggle_switcher();
                    if session.choose(target) == Control::Restart {
                        tracing::info!(variant = %target, "restarting experience");
                        drop(session);
                        pacer.reset();
                        last_status.clear();
                        session = start(Instant::now());
                        continue;
                    }
                    tracing::info!(variant = %target, "variant already active");
                }
                tracing::info!(frames = session.renderer().frames_drawn(), "experience ready");
                return Ok(());
            }
        }

        sleep_until_due(&session, &pacer);
    }
}

fn sleep_until_due(session: &HeadlessSession, pacer: &FramePacer) {
    let frame_deadline = if session.wants_frame() {
        pacer.next_deadline()
    } else {
        None
    };
    let wake = match (session.next_deadline(), frame_deadline) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    let now = Instant::now();
    let wait = wake
        .map(|deadline| deadline.saturating_duration_since(now))
        .unwrap_or(IDLE_WAIT);
    if !wait.is_zero() {
        thread::sleep(wait);
    }
}
