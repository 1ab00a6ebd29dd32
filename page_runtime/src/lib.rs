//! # Page Runtime
//!
//! Composition root: builds the page out of the service crates and
//! wires them to the UI event source.
//!
//! ## Philosophy
//!
//! - **Services never see each other**: the runtime owns the surface
//!   host, script registry, session store, engine, and log, and passes
//!   exactly what each handler needs
//! - **Everything behind events**: nothing renders until the ready
//!   event fires; clicks flow through the same source
//! - **Navigation is an outcome, not a side effect**: handlers record
//!   the destination path; the host environment consumes it

use std::cell::RefCell;
use std::rc::Rc;

use clock::Instant;
use script_types::{Script, ScriptRegistry};
use services_logger::{LogBuffer, LogEntry};
use services_navbar::{intent_for, NavbarView};
use services_profile::{ProfileView, Rgba};
use services_surface_host::SurfaceHost;
use services_typewriter::{TypewriterEngine, TypewriterError};
use session::{SessionContext, SessionStore};
use surface_types::{SurfaceFrame, SurfaceId};
use ui_events::{ControlId, UiEvent, UiEventSource};

/// Label of the navigation bar surface
pub const NAV_SURFACE: &str = "nav";
/// Label of the profile card surface
pub const PROFILE_SURFACE: &str = "profileCard";

/// The scripts shipped with the landing page, in registry order
pub const HERO_SCRIPTS: [&str; 2] = [
    "Do you ever wish you could generate your Spotify Wrapped at any time of the year?\n<break:{1}>Well, guess what?",
    "<break:{6}><untype:{0.25}>You</untype><untype:{0.5}> can</untype>!",
];

/// Mutable page state shared by the event handlers
struct Page {
    surfaces: SurfaceHost,
    scripts: ScriptRegistry,
    session: SessionStore,
    typewriter: TypewriterEngine,
    log: LogBuffer,
    avatar_pixels: Option<Vec<Rgba>>,
    nav_surface: SurfaceId,
    profile_surface: SurfaceId,
    /// Time observed at the most recent event or tick
    now: Instant,
    /// Destination recorded by the latest navigation intent
    pending_navigation: Option<String>,
}

impl Page {
    fn inject_navbar(&mut self) {
        let view = NavbarView::assemble(self.session.current());
        let text = view.to_lines().join("\n");
        self.write_surface(self.nav_surface, text);
    }

    fn populate_profile(&mut self) {
        let Some(context) = self.session.current() else {
            return;
        };
        let view = ProfileView::populate(context, self.avatar_pixels.as_deref());

        let mut lines = view.to_lines();
        if let Some(gradient) = view.card_background {
            lines.push(format!("{}", gradient));
        }
        self.write_surface(self.profile_surface, lines.join("\n"));
    }

    /// Writes a runtime-owned surface; a miss is a diagnostic, never a
    /// panic
    fn write_surface(&mut self, surface: SurfaceId, text: String) {
        if let Err(error) = self.surfaces.set_text(surface, text) {
            self.log.log(
                LogEntry::error(format!("surface write failed: {}", error)).with_source("page"),
            );
        }
    }

    fn start_typewriters(&mut self) {
        let now = self.now;
        self.typewriter
            .bind_surfaces(&mut self.surfaces, &self.scripts, now, &mut self.log);
        // The first steps are due immediately; run them inside the
        // ready handler so the opening characters appear with the rest
        // of the page.
        if let Err(error) = self.typewriter.tick(now, &mut self.surfaces) {
            self.log.log(
                LogEntry::error(format!("typewriter tick failed: {}", error)).with_source("page"),
            );
        }
    }

    fn handle_click(&mut self, control: &ControlId) {
        if let Some(intent) = intent_for(control) {
            let path = intent.apply(&mut self.session);
            self.pending_navigation = Some(path);
        }
    }
}

/// One page: services, surfaces, and the event source wiring them
pub struct PageRuntime {
    page: Rc<RefCell<Page>>,
    events: UiEventSource,
}

impl PageRuntime {
    /// Builds the landing page
    ///
    /// Surfaces: the navbar, the profile card, and one typewriter
    /// surface per shipped script. The session and avatar buffer come
    /// from whatever login flow preceded this page.
    pub fn new(session: Option<SessionContext>, avatar_pixels: Option<Vec<Rgba>>) -> Self {
        let mut surfaces = SurfaceHost::new();
        let nav_surface = surfaces.register(NAV_SURFACE).expect("fresh host");
        let profile_surface = surfaces.register(PROFILE_SURFACE).expect("fresh host");

        let mut scripts = ScriptRegistry::new();
        for (index, raw) in HERO_SCRIPTS.iter().enumerate() {
            scripts.push(Script::parse(*raw));
            surfaces
                .register(format!("twtxt{}", index))
                .expect("fresh host");
        }

        let mut store = SessionStore::new();
        if let Some(context) = session {
            store.login(context);
        }

        let page = Rc::new(RefCell::new(Page {
            surfaces,
            scripts,
            session: store,
            typewriter: TypewriterEngine::new(),
            log: LogBuffer::new(),
            avatar_pixels,
            nav_surface,
            profile_surface,
            now: Instant::ZERO,
            pending_navigation: None,
        }));

        let mut events = UiEventSource::new();

        let ready_page = Rc::clone(&page);
        events.on_ready(move || {
            let mut page = ready_page.borrow_mut();
            page.inject_navbar();
            page.populate_profile();
            page.start_typewriters();
        });

        let click_page = Rc::clone(&page);
        events.on_click(move |control| {
            click_page.borrow_mut().handle_click(control);
        });

        Self { page, events }
    }

    /// Fires the ready event: navbar, profile, and typewriters come up
    pub fn ready(&mut self, now: Instant) {
        self.page.borrow_mut().now = now;
        self.events.dispatch(UiEvent::Ready);
    }

    /// Dispatches a click on a page control
    pub fn click(&mut self, control: ControlId, now: Instant) {
        self.page.borrow_mut().now = now;
        self.events.dispatch(UiEvent::Click(control));
    }

    /// Advances the typewriter engine to `now`
    pub fn tick(&mut self, now: Instant) -> Result<(), TypewriterError> {
        let mut page = self.page.borrow_mut();
        page.now = now;
        let page = &mut *page;
        page.typewriter.tick(now, &mut page.surfaces)
    }

    /// Returns true once every typewriter surface has finished
    pub fn is_idle(&self) -> bool {
        self.page.borrow().typewriter.is_idle()
    }

    /// Snapshot frames of all surfaces, sorted by label
    pub fn frames(&self) -> Vec<SurfaceFrame> {
        let page = self.page.borrow();
        let mut frames: Vec<SurfaceFrame> = page
            .surfaces
            .list()
            .into_iter()
            .filter_map(|(id, _)| page.surfaces.frame(id).ok())
            .collect();
        frames.sort_by(|a, b| a.label.cmp(&b.label));
        frames
    }

    /// Snapshot frame of one surface by label
    pub fn frame(&self, label: &str) -> Option<SurfaceFrame> {
        let page = self.page.borrow();
        let id = page.surfaces.resolve(label)?;
        page.surfaces.frame(id).ok()
    }

    /// Takes the pending navigation path, if a click produced one
    pub fn take_navigation(&mut self) -> Option<String> {
        self.page.borrow_mut().pending_navigation.take()
    }

    /// Returns true if a session is active
    pub fn is_logged_in(&self) -> bool {
        self.page.borrow().session.is_logged_in()
    }

    /// Copies out the diagnostic log entries
    pub fn log_entries(&self) -> Vec<services_logger::LogEntry> {
        self.page.borrow().log.entries().cloned().collect()
    }
}
