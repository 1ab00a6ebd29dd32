//! # Typewriter Service
//!
//! The timed markup renderer: reveals a script character by character
//! into a display surface, honoring embedded pauses and delayed
//! insertions, with a trailing cursor marker until the run completes.
//!
//! ## Philosophy
//!
//! - **Cooperative**: all progress happens inside explicit
//!   [`TypewriterEngine::tick`] calls; no hidden threads or timers
//! - **Deterministic**: step deadlines accumulate from prior deadlines,
//!   not from observation time, so coarse ticks cannot skew a timeline
//! - **One pending step**: each renderer has exactly one scheduled
//!   deadline from start to completion
//! - **Failures are diagnostics**: a surface label that resolves to no
//!   script is logged and skipped; other surfaces are unaffected
//!
//! ## Example
//!
//! ```ignore
//! use services_typewriter::TypewriterEngine;
//!
//! let mut engine = TypewriterEngine::new();
//! engine.bind_surfaces(&mut host, &registry, clock.now(), &mut log);
//!
//! while !engine.is_idle() {
//!     clock.advance(Duration::from_millis(40));
//!     engine.tick(clock.now(), &mut host)?;
//! }
//! ```

use clock::{Duration, Instant};
use script_types::{Script, ScriptRegistry, Segment};
use services_logger::{LogBuffer, LogEntry};
use services_surface_host::{SurfaceHost, SurfaceHostError};
use surface_types::SurfaceId;
use thiserror::Error;

/// Trailing glyph marking the current reveal position
pub const CURSOR_MARKER: char = '█';

/// Fixed delay between plain characters
pub const TYPE_CADENCE: Duration = Duration::from_millis(40);

/// Default label prefix for typewriter surfaces
pub const LABEL_PREFIX: &str = "twtxt";

/// Typewriter engine error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypewriterError {
    #[error("Surface already bound: {0}")]
    AlreadyBound(SurfaceId),

    #[error(transparent)]
    Surface(#[from] SurfaceHostError),
}

/// What the next scheduled step will do
#[derive(Debug, Clone, PartialEq, Eq)]
enum StepAction {
    /// Consume the next unit of the script
    Advance,
    /// Append a delayed insertion payload, then advance immediately
    ApplyInsert { payload: String },
}

/// Scheduling state of one renderer
#[derive(Debug, Clone, PartialEq, Eq)]
enum RenderPhase {
    Scheduled { due: Instant, action: StepAction },
    Completed,
}

/// A single renderer instance bound to one surface
///
/// Created by the engine, runs to completion, never reused.
#[derive(Debug)]
pub struct Renderer {
    surface_id: SurfaceId,
    script: Script,
    /// Index of the segment currently being consumed
    segment_index: usize,
    /// Characters already revealed within a text segment
    text_offset: usize,
    /// Raw script characters consumed so far; monotonically
    /// non-decreasing
    position: usize,
    /// Plain-text projection revealed so far, without the cursor
    revealed: String,
    phase: RenderPhase,
}

impl Renderer {
    fn new(surface_id: SurfaceId, script: Script, now: Instant) -> Self {
        Self {
            surface_id,
            script,
            segment_index: 0,
            text_offset: 0,
            position: 0,
            revealed: String::new(),
            phase: RenderPhase::Scheduled {
                due: now,
                action: StepAction::Advance,
            },
        }
    }

    /// The surface this renderer writes into
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Raw script characters consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns true once the run has completed and the cursor is gone
    pub fn is_complete(&self) -> bool {
        self.phase == RenderPhase::Completed
    }

    /// The deadline of the single pending step, if still running
    pub fn next_due(&self) -> Option<Instant> {
        match &self.phase {
            RenderPhase::Scheduled { due, .. } => Some(*due),
            RenderPhase::Completed => None,
        }
    }

    /// Runs scheduled steps whose deadline has passed
    fn run_due_steps(&mut self, now: Instant, host: &mut SurfaceHost) -> Result<(), SurfaceHostError> {
        loop {
            let (due, action) = match &self.phase {
                RenderPhase::Scheduled { due, action } if *due <= now => {
                    (*due, action.clone())
                }
                _ => return Ok(()),
            };
            self.run_step(due, action, host)?;
        }
    }

    /// Executes one step and schedules its successor
    fn run_step(
        &mut self,
        due: Instant,
        action: StepAction,
        host: &mut SurfaceHost,
    ) -> Result<(), SurfaceHostError> {
        // The surface starts hidden so no partial flash occurs before
        // the first step; reveal it on the very first one.
        if self.position == 0 && matches!(action, StepAction::Advance) {
            host.set_visible(self.surface_id, true)?;
        }

        if let StepAction::ApplyInsert { payload } = action {
            self.revealed.push_str(&payload);
            self.write_with_cursor(host)?;
            // The insertion chains straight into the next step.
        }

        match self.script.segments().get(self.segment_index).cloned() {
            None => {
                // End of script: strip the trailing cursor and stop.
                host.set_text(self.surface_id, self.revealed.clone())?;
                self.phase = RenderPhase::Completed;
            }
            Some(Segment::Pause { duration, consumed }) => {
                self.position += consumed;
                self.segment_index += 1;
                self.schedule(due + duration, StepAction::Advance);
            }
            Some(Segment::Insert {
                delay,
                payload,
                consumed,
            }) => {
                self.position += consumed;
                self.segment_index += 1;
                self.schedule(due + delay, StepAction::ApplyInsert { payload });
            }
            Some(Segment::SkipTag { consumed }) => {
                self.position += consumed;
                self.segment_index += 1;
                self.schedule(due, StepAction::Advance);
            }
            Some(Segment::Text(text)) => {
                let next_char = text
                    .chars()
                    .nth(self.text_offset)
                    .expect("text segment offset in bounds");
                self.revealed.push(next_char);
                self.position += 1;
                self.text_offset += 1;
                if self.text_offset == text.chars().count() {
                    self.segment_index += 1;
                    self.text_offset = 0;
                }
                self.write_with_cursor(host)?;
                self.schedule(due + TYPE_CADENCE, StepAction::Advance);
            }
        }

        Ok(())
    }

    fn write_with_cursor(&self, host: &mut SurfaceHost) -> Result<(), SurfaceHostError> {
        let mut text = self.revealed.clone();
        text.push(CURSOR_MARKER);
        host.set_text(self.surface_id, text)?;
        Ok(())
    }

    fn schedule(&mut self, due: Instant, action: StepAction) {
        self.phase = RenderPhase::Scheduled { due, action };
    }
}

/// Parses a surface label of the form `PREFIX` + decimal index
///
/// Returns the script index, or None if the label does not carry a
/// plain decimal number after the prefix.
pub fn parse_label_index(label: &str, prefix: &str) -> Option<usize> {
    let digits = label.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Typewriter engine
///
/// Owns one renderer per bound surface and drives them all from
/// [`TypewriterEngine::tick`]. Renderers never interact; no ordering
/// holds between different surfaces' steps.
pub struct TypewriterEngine {
    renderers: Vec<Renderer>,
    label_prefix: String,
}

impl TypewriterEngine {
    /// Creates an engine using the default label prefix
    pub fn new() -> Self {
        Self::with_prefix(LABEL_PREFIX)
    }

    /// Creates an engine with a custom label prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            renderers: Vec::new(),
            label_prefix: prefix.into(),
        }
    }

    /// Starts a renderer for one surface
    ///
    /// Clears and hides the surface, then schedules the first step at
    /// `now`. The sequence runs to completion; there is no stop.
    pub fn start(
        &mut self,
        surface_id: SurfaceId,
        script: Script,
        host: &mut SurfaceHost,
        now: Instant,
    ) -> Result<(), TypewriterError> {
        if self.renderers.iter().any(|r| r.surface_id == surface_id) {
            return Err(TypewriterError::AlreadyBound(surface_id));
        }

        host.set_text(surface_id, "")?;
        host.set_visible(surface_id, false)?;
        self.renderers.push(Renderer::new(surface_id, script, now));
        Ok(())
    }

    /// Binds every registered surface whose label carries the engine's
    /// prefix to its script by index
    ///
    /// A label whose index does not resolve to a registry entry is
    /// reported to the log and skipped; other surfaces are unaffected.
    /// Returns the number of renderers started.
    pub fn bind_surfaces(
        &mut self,
        host: &mut SurfaceHost,
        registry: &ScriptRegistry,
        now: Instant,
        log: &mut LogBuffer,
    ) -> usize {
        let mut surfaces: Vec<(SurfaceId, String)> = host
            .list()
            .into_iter()
            .filter(|(_, label)| label.starts_with(&self.label_prefix))
            .collect();
        surfaces.sort_by(|a, b| a.1.cmp(&b.1));

        let mut started = 0;
        for (surface_id, label) in surfaces {
            let script = parse_label_index(&label, &self.label_prefix)
                .and_then(|index| registry.get(index));

            match script {
                Some(script) => {
                    if self.start(surface_id, script.clone(), host, now).is_ok() {
                        started += 1;
                    }
                }
                None => {
                    log.log(
                        LogEntry::error("no script for surface label")
                            .with_source("typewriter")
                            .with_field("label", label),
                    );
                }
            }
        }
        started
    }

    /// Runs every due step on every renderer
    pub fn tick(&mut self, now: Instant, host: &mut SurfaceHost) -> Result<(), TypewriterError> {
        for renderer in &mut self.renderers {
            renderer.run_due_steps(now, host)?;
        }
        Ok(())
    }

    /// Returns true when every renderer has completed
    pub fn is_idle(&self) -> bool {
        self.renderers.iter().all(Renderer::is_complete)
    }

    /// Number of renderers still running
    pub fn active_count(&self) -> usize {
        self.renderers.iter().filter(|r| !r.is_complete()).count()
    }

    /// The bound renderers, for inspection
    pub fn renderers(&self) -> &[Renderer] {
        &self.renderers
    }

    /// The earliest pending deadline across all renderers
    pub fn next_due(&self) -> Option<Instant> {
        self.renderers.iter().filter_map(Renderer::next_due).min()
    }
}

impl Default for TypewriterEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock::{Clock, SimClock};

    fn setup(script: &str) -> (TypewriterEngine, SurfaceHost, SurfaceId, SimClock) {
        let mut host = SurfaceHost::new();
        let surface = host.register("twtxt0").unwrap();
        let mut engine = TypewriterEngine::new();
        let clock = SimClock::new();
        engine
            .start(surface, Script::parse(script), &mut host, clock.now())
            .unwrap();
        (engine, host, surface, clock)
    }

    fn run_to_completion(
        engine: &mut TypewriterEngine,
        host: &mut SurfaceHost,
        clock: &mut SimClock,
    ) {
        // Generous bound; every script under test finishes well within it.
        for _ in 0..10_000 {
            if engine.is_idle() {
                return;
            }
            clock.advance(Duration::from_millis(10));
            engine.tick(clock.now(), host).unwrap();
        }
        panic!("renderer did not complete");
    }

    #[test]
    fn test_surface_hidden_until_first_step() {
        let (mut engine, mut host, surface, clock) = setup("hi");
        assert!(!host.is_visible(surface).unwrap());

        engine.tick(clock.now(), &mut host).unwrap();
        assert!(host.is_visible(surface).unwrap());
    }

    #[test]
    fn test_types_one_character_per_cadence() {
        let (mut engine, mut host, surface, mut clock) = setup("abc");

        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.text(surface).unwrap(), "a█");

        clock.advance(TYPE_CADENCE);
        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.text(surface).unwrap(), "ab█");

        clock.advance(TYPE_CADENCE);
        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.text(surface).unwrap(), "abc█");
    }

    #[test]
    fn test_cursor_stripped_at_completion() {
        let (mut engine, mut host, surface, mut clock) = setup("ab");
        run_to_completion(&mut engine, &mut host, &mut clock);

        assert_eq!(host.text(surface).unwrap(), "ab");
        assert!(engine.is_idle());
    }

    #[test]
    fn test_pause_inserts_delay_without_output_change() {
        let (mut engine, mut host, surface, mut clock) = setup("a<break:{1}>b");

        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.text(surface).unwrap(), "a█");

        // The pause consumes its tag at the cadence boundary, then
        // holds output unchanged for a full second.
        clock.advance(TYPE_CADENCE);
        engine.tick(clock.now(), &mut host).unwrap();
        let frozen = host.frame(surface).unwrap();
        assert_eq!(frozen.text, "a█");

        clock.advance(Duration::from_millis(999));
        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.frame(surface).unwrap().revision, frozen.revision);

        clock.advance(Duration::from_millis(1));
        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.text(surface).unwrap(), "ab█");
    }

    #[test]
    fn test_insert_appends_payload_after_delay() {
        let (mut engine, mut host, surface, mut clock) = setup("<untype:{0.25}>You</untype>");

        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.text(surface).unwrap(), "");

        clock.advance(Duration::from_millis(249));
        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.text(surface).unwrap(), "");

        clock.advance(Duration::from_millis(1));
        engine.tick(clock.now(), &mut host).unwrap();
        // Payload applied, then the chained step hits end-of-script
        // and strips the cursor in the same tick.
        assert_eq!(host.text(surface).unwrap(), "You");
        assert!(engine.is_idle());
    }

    #[test]
    fn test_insert_payload_is_kept_not_erased() {
        let (mut engine, mut host, surface, mut clock) =
            setup("<untype:{0.25}>You</untype><untype:{0.5}> can</untype>!");
        run_to_completion(&mut engine, &mut host, &mut clock);

        assert_eq!(host.text(surface).unwrap(), "You can!");
    }

    #[test]
    fn test_generic_tag_skipped_with_zero_delay() {
        let (mut engine, mut host, surface, mut clock) = setup("a<em>b");

        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.text(surface).unwrap(), "a█");

        // Skip chains into the next character at the same deadline: one
        // cadence later 'b' lands, with no extra delay for the tag.
        clock.advance(TYPE_CADENCE);
        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.text(surface).unwrap(), "ab█");
    }

    #[test]
    fn test_unterminated_tag_typed_literally() {
        let (mut engine, mut host, surface, mut clock) = setup("a<b");
        run_to_completion(&mut engine, &mut host, &mut clock);

        assert_eq!(host.text(surface).unwrap(), "a<b");
    }

    #[test]
    fn test_final_text_equals_projection() {
        let raw = "Do you ever wish...<break:{1}>Well, guess what?";
        let (mut engine, mut host, surface, mut clock) = setup(raw);
        run_to_completion(&mut engine, &mut host, &mut clock);

        assert_eq!(host.text(surface).unwrap(), Script::parse(raw).projection());
    }

    #[test]
    fn test_position_is_monotonic_and_reaches_length() {
        let raw = "ab<break:{0.1}>c<untype:{0.1}>d</untype>";
        let (mut engine, mut host, _, mut clock) = setup(raw);
        let length = Script::parse(raw).char_len();

        let mut last = 0;
        for _ in 0..1_000 {
            clock.advance(Duration::from_millis(10));
            engine.tick(clock.now(), &mut host).unwrap();
            let position = engine.renderers()[0].position();
            assert!(position >= last);
            last = position;
            if engine.is_idle() {
                break;
            }
        }

        assert!(engine.is_idle());
        assert_eq!(engine.renderers()[0].position(), length);
    }

    #[test]
    fn test_exactly_one_pending_step_until_completion() {
        let (mut engine, mut host, _, mut clock) = setup("a<break:{0.2}>b");

        while !engine.is_idle() {
            let renderer = &engine.renderers()[0];
            assert!(renderer.next_due().is_some());
            clock.advance(Duration::from_millis(10));
            engine.tick(clock.now(), &mut host).unwrap();
        }
        assert!(engine.renderers()[0].next_due().is_none());
    }

    #[test]
    fn test_no_steps_after_completion() {
        let (mut engine, mut host, surface, mut clock) = setup("a");
        run_to_completion(&mut engine, &mut host, &mut clock);

        let revision = host.frame(surface).unwrap().revision;
        clock.advance(Duration::from_secs(10));
        engine.tick(clock.now(), &mut host).unwrap();
        assert_eq!(host.frame(surface).unwrap().revision, revision);
    }

    #[test]
    fn test_empty_script_completes_immediately() {
        let (mut engine, mut host, surface, clock) = setup("");

        engine.tick(clock.now(), &mut host).unwrap();
        assert!(engine.is_idle());
        assert_eq!(host.text(surface).unwrap(), "");
        assert!(host.is_visible(surface).unwrap());
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut host = SurfaceHost::new();
        let surface = host.register("twtxt0").unwrap();
        let mut engine = TypewriterEngine::new();
        let clock = SimClock::new();

        engine
            .start(surface, Script::parse("a"), &mut host, clock.now())
            .unwrap();
        let err = engine
            .start(surface, Script::parse("b"), &mut host, clock.now())
            .unwrap_err();
        assert_eq!(err, TypewriterError::AlreadyBound(surface));
    }

    #[test]
    fn test_parse_label_index() {
        assert_eq!(parse_label_index("twtxt0", "twtxt"), Some(0));
        assert_eq!(parse_label_index("twtxt12", "twtxt"), Some(12));
        assert_eq!(parse_label_index("twtxt", "twtxt"), None);
        assert_eq!(parse_label_index("twtxtabc", "twtxt"), None);
        assert_eq!(parse_label_index("twtxt-1", "twtxt"), None);
        assert_eq!(parse_label_index("nav", "twtxt"), None);
    }

    #[test]
    fn test_bind_surfaces_starts_matching_labels() {
        let mut host = SurfaceHost::new();
        host.register("nav").unwrap();
        host.register("twtxt0").unwrap();
        host.register("twtxt1").unwrap();

        let mut registry = ScriptRegistry::new();
        registry.push(Script::parse("first"));
        registry.push(Script::parse("second"));

        let mut engine = TypewriterEngine::new();
        let mut log = LogBuffer::new();
        let mut clock = SimClock::new();

        let started = engine.bind_surfaces(&mut host, &registry, clock.now(), &mut log);
        assert_eq!(started, 2);
        assert!(log.is_empty());

        run_to_completion(&mut engine, &mut host, &mut clock);
        let first = host.resolve("twtxt0").unwrap();
        let second = host.resolve("twtxt1").unwrap();
        assert_eq!(host.text(first).unwrap(), "first");
        assert_eq!(host.text(second).unwrap(), "second");
    }

    #[test]
    fn test_bind_surfaces_logs_out_of_range_index() {
        let mut host = SurfaceHost::new();
        host.register("twtxt7").unwrap();

        let mut registry = ScriptRegistry::new();
        registry.push(Script::parse("only"));

        let mut engine = TypewriterEngine::new();
        let mut log = LogBuffer::new();
        let clock = SimClock::new();

        let started = engine.bind_surfaces(&mut host, &registry, clock.now(), &mut log);
        assert_eq!(started, 0);
        assert_eq!(log.len(), 1);

        let entry = log.entries().next().unwrap();
        assert_eq!(entry.level, services_logger::LogLevel::Error);
        assert_eq!(entry.fields[0], ("label".to_string(), "twtxt7".to_string()));

        // The unbound surface is left untouched.
        let surface = host.resolve("twtxt7").unwrap();
        assert_eq!(host.frame(surface).unwrap().revision, 0);
    }

    #[test]
    fn test_bind_surfaces_logs_unparsable_label() {
        let mut host = SurfaceHost::new();
        host.register("twtxtzero").unwrap();

        let registry = ScriptRegistry::new();
        let mut engine = TypewriterEngine::new();
        let mut log = LogBuffer::new();
        let clock = SimClock::new();

        engine.bind_surfaces(&mut host, &registry, clock.now(), &mut log);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_independent_renderers_do_not_interact() {
        let mut host = SurfaceHost::new();
        let fast = host.register("twtxt0").unwrap();
        let slow = host.register("twtxt1").unwrap();

        let mut engine = TypewriterEngine::new();
        let mut clock = SimClock::new();
        engine
            .start(fast, Script::parse("hi"), &mut host, clock.now())
            .unwrap();
        engine
            .start(slow, Script::parse("<break:{5}>later"), &mut host, clock.now())
            .unwrap();

        clock.advance(Duration::from_secs(1));
        engine.tick(clock.now(), &mut host).unwrap();

        assert_eq!(host.text(fast).unwrap(), "hi");
        assert_eq!(host.text(slow).unwrap(), "");
        assert_eq!(engine.active_count(), 1);
    }

    #[test]
    fn test_coarse_tick_catches_up_whole_timeline() {
        let (mut engine, mut host, surface, mut clock) = setup("abc<break:{1}>d");

        // A single late tick runs every step whose accumulated
        // deadline has passed.
        clock.advance(Duration::from_secs(30));
        engine.tick(clock.now(), &mut host).unwrap();

        assert!(engine.is_idle());
        assert_eq!(host.text(surface).unwrap(), "abcd");
    }
}
