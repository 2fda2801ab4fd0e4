use std::time::{Duration, Instant};

use bootconfig::BootTimings;
use bootseq::{BootEvent, BootSequencer, BootState};
use panorama::{FrameReport, PanoramaConfig, PanoramaRenderer, RenderBackend, TextureLoader, Viewport};
use scheduler::Timeline;
use variants::{
    catalog, MountedVariant, Preference, PreferenceStore, SwitchOutcome, Variant, VariantHost,
    VariantSelector, VariantSwitcher,
};

/// What the host should do after feeding the session an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// Tear this session down and start a fresh one.
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
    Booting,
    Selecting,
    Hosted(MountedVariant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTimer {
    RevealSelector,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub panorama: PanoramaConfig,
    pub timings: BootTimings,
}

/// One run of the experience: backdrop renderer, boot sequence and the
/// variant UI on top of them.
pub struct Session<B: RenderBackend, S: PreferenceStore> {
    renderer: PanoramaRenderer<B>,
    sequencer: BootSequencer,
    timers: Timeline<SessionTimer>,
    store: S,
    ui: UiState,
    selector: VariantSelector,
    switcher: Option<VariantSwitcher>,
    selector_delay: Duration,
}

impl<B: RenderBackend, S: PreferenceStore> Session<B, S> {
    /// Mounts the renderer and starts the boot sequence. A renderer that
    /// fails to mount never reports ready; boot then finishes through the
    /// watchdog.
    pub fn start<L>(
        backend: B,
        store: S,
        settings: &SessionSettings,
        viewport: Viewport,
        loader: &L,
        now: Instant,
    ) -> Self
    where
        L: TextureLoader + ?Sized,
    {
        let mut renderer = PanoramaRenderer::new(backend, settings.panorama.clone());
        if let Err(err) = renderer.mount(viewport, loader) {
            tracing::warn!(error = %err, "panorama unavailable; continuing without backdrop");
        }

        let mut session = Self {
            renderer,
            sequencer: BootSequencer::new(settings.timings),
            timers: Timeline::new(),
            store,
            ui: UiState::Booting,
            selector: VariantSelector::new(),
            switcher: None,
            selector_delay: settings.timings.selector_delay,
        };
        let events = session.sequencer.start(now);
        session.handle_boot_events(events, now);
        session
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn boot_state(&self) -> BootState {
        self.sequencer.state()
    }

    pub fn renderer(&self) -> &PanoramaRenderer<B> {
        &self.renderer
    }

    pub fn switcher(&self) -> Option<&VariantSwitcher> {
        self.switcher.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mounted_variant(&self) -> Option<Variant> {
        match &self.ui {
            UiState::Hosted(mounted) => Some(mounted.variant()),
            _ => None,
        }
    }

    /// True while the renderer has a frame ticket outstanding.
    pub fn wants_frame(&self) -> bool {
        self.renderer.frame_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.sequencer.next_deadline(), self.timers.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Runs one display refresh.
    pub fn frame(&mut self, now: Instant) -> FrameReport {
        let report = self.renderer.frame();
        if report.ready {
            let events = self.sequencer.mark_renderer_ready(now);
            self.handle_boot_events(events, now);
        }
        report
    }

    /// Fires every timer due at `now`.
    pub fn advance(&mut self, now: Instant) {
        let events = self.sequencer.advance(now);
        self.handle_boot_events(events, now);
        while let Some((_, timer)) = self.timers.pop_due(now) {
            match timer {
                SessionTimer::RevealSelector => {
                    self.selector.show();
                    self.ui = UiState::Selecting;
                    tracing::info!("no stored variant; showing selector");
                }
            }
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.renderer.resize(viewport);
    }

    /// Picks a variant in whichever chooser is showing. Ignored when neither
    /// the selector nor an open switcher is on screen.
    pub fn choose(&mut self, variant: Variant) -> Control {
        match self.ui {
            UiState::Selecting => {
                let chosen = self.selector.choose(variant, &self.store);
                self.mount_variant(&Preference::Known(chosen));
                Control::Continue
            }
            UiState::Hosted(_) => match self.switcher.as_mut() {
                Some(switcher) if switcher.is_open() => {
                    match switcher.choose(variant, &self.store) {
                        SwitchOutcome::Unchanged => Control::Continue,
                        SwitchOutcome::Reinitialize(_) => Control::Restart,
                    }
                }
                _ => Control::Continue,
            },
            UiState::Booting => Control::Continue,
        }
    }

    pub fn toggle_switcher(&mut self) {
        if let Some(switcher) = self.switcher.as_mut() {
            switcher.toggle();
        }
    }

    pub fn close_switcher(&mut self) {
        if let Some(switcher) = self.switcher.as_mut() {
            switcher.close();
        }
    }

    /// Stops drawing and invalidates every pending timer. Idempotent.
    pub fn teardown(&mut self) {
        self.renderer.unmount();
        self.sequencer.teardown();
        self.timers.cancel_all();
    }

    /// One-line summary suitable for a window title or a terminal line.
    pub fn status_line(&self) -> String {
        match &self.ui {
            UiState::Booting => {
                let state = self.sequencer.state();
                format!("{:>3}% {}", state.progress, state.label)
            }
            UiState::Selecting => {
                let options: Vec<String> = catalog()
                    .iter()
                    .enumerate()
                    .map(|(index, info)| {
                        format!("[{}] {} {}", index + 1, info.glyph, info.display_name)
                    })
                    .collect();
                format!("Choose an experience: {}", options.join("  "))
            }
            UiState::Hosted(mounted) => {
                let variant = mounted.variant();
                match self.switcher.as_ref() {
                    Some(switcher) if switcher.is_open() => {
                        let options: Vec<String> = switcher
                            .options()
                            .iter()
                            .enumerate()
                            .map(|(index, option)| {
                                let marker = if option.disabled { " (active)" } else { "" };
                                format!(
                                    "[{}] {} {}{marker}",
                                    index + 1,
                                    option.info.glyph,
                                    option.info.display_name
                                )
                            })
                            .collect();
                        format!("Switch experience: {}", options.join("  "))
                    }
                    _ => format!("{} {}", variant.info().glyph, variant),
                }
            }
        }
    }

    fn handle_boot_events(&mut self, events: Vec<BootEvent>, now: Instant) {
        for event in events {
            if event != BootEvent::Completed {
                continue;
            }
            match self.store.get() {
                Some(preference) => self.mount_variant(&preference),
                None => {
                    self.timers.schedule_after(
                        now,
                        self.selector_delay,
                        SessionTimer::RevealSelector,
                    );
                }
            }
        }
    }

    fn mount_variant(&mut self, preference: &Preference) {
        let mounted = VariantHost::mount(preference);
        let switcher = match preference {
            Preference::Unrecognized(_) => VariantSwitcher::repairing(mounted.variant()),
            Preference::Known(_) => VariantSwitcher::new(mounted.variant()),
        };
        self.switcher = Some(switcher);
        self.ui = UiState::Hosted(mounted);
    }
}

impl<B: RenderBackend, S: PreferenceStore> Drop for Session<B, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
