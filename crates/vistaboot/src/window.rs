use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use panorama::{ThreadedTextureLoader, Viewport, WgpuBackend};
use variants::Variant;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::bootstrap::{AppStore, Bootstrap};
use crate::session::{Control, Session};

const WINDOW_TITLE: &str = "vistaboot";

type WindowSession = Session<WgpuBackend, Rc<AppStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Choose(Variant),
    ToggleSwitcher,
    CloseSwitcher,
}

pub fn run(bootstrap: &Bootstrap, store: Rc<AppStore>) -> Result<()> {
    let event_loop = EventLoopBuilder::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = bootstrap.surface_size;
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);
    let loader = ThreadedTextureLoader::new(bootstrap.asset.clone());

    let start = |window: &Arc<Window>, now: Instant| -> WindowSession {
        let size = window.inner_size();
        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());
        Session::start(
            WgpuBackend::new(window.clone()),
            store.clone(),
            &bootstrap.settings,
            viewport,
            &loader,
            now,
        )
    };

    let mut session = Some(start(&window, Instant::now()));
    let mut title = String::new();

    let run_result = event_loop.run(move |event, elwt| {
        let Some(active) = session.as_mut() else {
            elwt.exit();
            return;
        };
        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    active.teardown();
                    session = None;
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    active.resize(Viewport::from_physical(
                        size.width,
                        size.height,
                        window.scale_factor(),
                    ));
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    let size = window.inner_size();
                    active.resize(Viewport::from_physical(size.width, size.height, scale_factor));
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed || event.repeat {
                        return;
                    }
                    let control = match key_action(&event.logical_key) {
                        Some(KeyAction::Choose(variant)) => active.choose(variant),
                        Some(KeyAction::ToggleSwitcher) => {
                            active.toggle_switcher();
                            Control::Continue
                        }
                        Some(KeyAction::CloseSwitcher) => {
                            active.close_switcher();
                            Control::Continue
                        }
                        None => Control::Continue,
                    };
                    if control == Control::Restart {
                        tracing::info!("restarting experience");
                        // The old session must release the window surface first.
                        session = None;
                        session = Some(start(&window, Instant::now()));
                    }
                }
                WindowEvent::RedrawRequested => {
                    active.frame(Instant::now());
                }
                _ => {}
            },
            Event::AboutToWait => {
                let now = Instant::now();
                active.advance(now);

                let status = active.status_line();
                if status != title {
                    tracing::debug!(status = %status, "updating window title");
                    window.set_title(&format!("{WINDOW_TITLE} · {status}"));
                    title = status;
                }

                if active.wants_frame() {
                    window.request_redraw();
                }
                match active.next_deadline() {
                    Some(deadline) => elwt.set_control_flow(ControlFlow::WaitUntil(deadline)),
                    None => elwt.set_control_flow(ControlFlow::Wait),
                }
            }
            _ => {}
        }
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

fn key_action(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Tab) => Some(KeyAction::ToggleSwitcher),
        Key::Named(NamedKey::Escape) => Some(KeyAction::CloseSwitcher),
        Key::Character(value) => {
            let index: usize = value.as_str().parse().ok()?;
            let variant = Variant::ALL.get(index.checked_sub(1)?)?;
            Some(KeyAction::Choose(*variant))
        }
        _ => None,
    }
}
