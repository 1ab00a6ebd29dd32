//! # Page Integration Tests
//!
//! End-to-end tests across the page services.
//!
//! ## Test Philosophy
//!
//! - **Projection property**: every finished surface equals its
//!   script's plain-text projection
//! - **Timing under simulation**: pauses and cadence verified against
//!   a stepped `SimClock`, never wall time
//! - **Failure isolation**: a bad surface binding is a diagnostic;
//!   the rest of the page is unaffected
//! - **Session round trips**: login state drives navbar and profile,
//!   logout clears it

#![cfg(test)]

use clock::{Clock, Duration, Instant, SimClock};
use page_runtime::{PageRuntime, HERO_SCRIPTS, NAV_SURFACE, PROFILE_SURFACE};
use script_types::{Script, ScriptRegistry};
use services_logger::{LogBuffer, LogLevel};
use services_navbar::LOGOUT_BUTTON;
use services_profile::Rgba;
use services_surface_host::SurfaceHost;
use services_typewriter::{TypewriterEngine, TYPE_CADENCE};
use session::{SessionContext, UserId};
use ui_events::ControlId;

fn demo_session() -> SessionContext {
    SessionContext::new(UserId::new(), "wrapped_fan", "Farhan")
        .with_avatar_url("https://images.example.com/avatar.png")
}

/// Steps a clock at the typing cadence until the engine settles.
fn settle(engine: &mut TypewriterEngine, host: &mut SurfaceHost, clock: &mut SimClock) {
    for _ in 0..100_000 {
        if engine.is_idle() {
            return;
        }
        clock.advance(Duration::from_millis(10));
        engine.tick(clock.now(), host).unwrap();
    }
    panic!("engine never settled");
}

#[test]
fn break_script_types_pauses_and_resumes_at_cadence() {
    let raw = "Do you ever wish...<break:{1}>Well, guess what?";
    let mut host = SurfaceHost::new();
    let surface = host.register("twtxt0").unwrap();
    let mut engine = TypewriterEngine::new();
    let mut clock = SimClock::new();

    engine
        .start(surface, Script::parse(raw), &mut host, clock.now())
        .unwrap();

    // 19 characters before the break tag, one per cadence step.
    let lead = "Do you ever wish...";
    for (index, _) in lead.chars().enumerate() {
        engine.tick(clock.now(), &mut host).unwrap();
        let expected: String = lead.chars().take(index + 1).collect();
        assert_eq!(host.text(surface).unwrap(), format!("{}█", expected));
        clock.advance(TYPE_CADENCE);
    }

    // The break consumes one cadence slot, then holds output frozen
    // for its full second.
    engine.tick(clock.now(), &mut host).unwrap();
    let frozen = host.frame(surface).unwrap();
    assert_eq!(frozen.text, "Do you ever wish...█");

    clock.advance(Duration::from_millis(999));
    engine.tick(clock.now(), &mut host).unwrap();
    assert_eq!(host.frame(surface).unwrap().revision, frozen.revision);

    clock.advance(Duration::from_millis(1));
    engine.tick(clock.now(), &mut host).unwrap();
    assert_eq!(host.text(surface).unwrap(), "Do you ever wish...W█");

    settle(&mut engine, &mut host, &mut clock);
    assert_eq!(
        host.text(surface).unwrap(),
        "Do you ever wish...Well, guess what?"
    );
}

#[test]
fn untype_script_inserts_payload_after_its_delay() {
    let mut host = SurfaceHost::new();
    let surface = host.register("twtxt0").unwrap();
    let mut engine = TypewriterEngine::new();
    let mut clock = SimClock::new();

    engine
        .start(
            surface,
            Script::parse("<untype:{0.25}>You</untype>"),
            &mut host,
            clock.now(),
        )
        .unwrap();

    engine.tick(clock.now(), &mut host).unwrap();
    assert_eq!(host.text(surface).unwrap(), "");

    clock.advance(Duration::from_millis(250));
    engine.tick(clock.now(), &mut host).unwrap();
    assert_eq!(host.text(surface).unwrap(), "You");
}

#[test]
fn every_hero_script_finishes_at_its_projection() {
    let mut host = SurfaceHost::new();
    let mut registry = ScriptRegistry::new();
    for (index, raw) in HERO_SCRIPTS.iter().enumerate() {
        registry.push(Script::parse(*raw));
        host.register(format!("twtxt{}", index)).unwrap();
    }

    let mut engine = TypewriterEngine::new();
    let mut log = LogBuffer::new();
    let mut clock = SimClock::new();
    engine.bind_surfaces(&mut host, &registry, clock.now(), &mut log);
    settle(&mut engine, &mut host, &mut clock);

    for (index, raw) in HERO_SCRIPTS.iter().enumerate() {
        let surface = host.resolve(&format!("twtxt{}", index)).unwrap();
        assert_eq!(
            host.text(surface).unwrap(),
            Script::parse(*raw).projection()
        );
    }
    assert!(log.is_empty());
}

#[test]
fn out_of_range_binding_is_isolated() {
    let mut host = SurfaceHost::new();
    host.register("twtxt0").unwrap();
    host.register("twtxt9").unwrap();

    let mut registry = ScriptRegistry::new();
    registry.push(Script::parse("fine"));

    let mut engine = TypewriterEngine::new();
    let mut log = LogBuffer::new();
    let mut clock = SimClock::new();

    let started = engine.bind_surfaces(&mut host, &registry, clock.now(), &mut log);
    assert_eq!(started, 1);
    settle(&mut engine, &mut host, &mut clock);

    // The good surface finished; the bad one was never touched.
    let good = host.resolve("twtxt0").unwrap();
    let bad = host.resolve("twtxt9").unwrap();
    assert_eq!(host.text(good).unwrap(), "fine");
    assert_eq!(host.frame(bad).unwrap().revision, 0);

    let errors = log.at_least(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].fields[0].1, "twtxt9");
}

#[test]
fn full_page_session_round_trip() {
    let mut runtime = PageRuntime::new(Some(demo_session()), None);
    let mut clock = SimClock::new();

    runtime.ready(clock.now());

    let nav = runtime.frame(NAV_SURFACE).unwrap();
    assert!(nav.text.contains("[Log Out]"));
    let profile = runtime.frame(PROFILE_SURFACE).unwrap();
    assert!(profile.text.contains("@Farhan"));

    while !runtime.is_idle() {
        clock.advance(Duration::from_millis(40));
        runtime.tick(clock.now()).unwrap();
    }

    for (index, raw) in HERO_SCRIPTS.iter().enumerate() {
        let frame = runtime.frame(&format!("twtxt{}", index)).unwrap();
        assert_eq!(frame.text, Script::parse(*raw).projection());
    }

    runtime.click(ControlId::new(LOGOUT_BUTTON), clock.now());
    assert!(!runtime.is_logged_in());
    assert_eq!(runtime.take_navigation().as_deref(), Some("/logout"));
}

#[test]
fn avatar_gradient_reaches_profile_card() {
    let avatar = vec![Rgba::opaque(100, 0, 200); 16];
    let mut runtime = PageRuntime::new(Some(demo_session()), Some(avatar));
    runtime.ready(Instant::ZERO);

    let profile = runtime.frame(PROFILE_SURFACE).unwrap();
    assert!(profile
        .text
        .contains("linear-gradient(to bottom, rgb(146, 76, 216) 60%, rgb(0, 0, 0))"));
}

#[test]
fn ready_event_is_one_shot_across_the_page() {
    let mut runtime = PageRuntime::new(None, None);
    runtime.ready(Instant::ZERO);
    let first = runtime.frame(NAV_SURFACE).unwrap();

    // A duplicate ready dispatch must not re-render anything.
    runtime.ready(Instant::ZERO);
    let second = runtime.frame(NAV_SURFACE).unwrap();
    assert_eq!(first.revision, second.revision);
}

#[test]
fn scripts_and_frames_survive_serialization() {
    let script = Script::parse(HERO_SCRIPTS[1]);
    let encoded = serde_json::to_string(&script).unwrap();
    let decoded: Script = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, script);
    assert_eq!(decoded.projection(), "You can!");

    let mut host = SurfaceHost::new();
    let surface = host.register("twtxt0").unwrap();
    host.set_text(surface, "hello█").unwrap();

    let frame = host.frame(surface).unwrap();
    let encoded = serde_json::to_string(&frame).unwrap();
    let decoded: surface_types::SurfaceFrame = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, frame);
}

#[test]
fn concurrent_surfaces_keep_independent_timelines() {
    let mut host = SurfaceHost::new();
    let quick = host.register("twtxt0").unwrap();
    let delayed = host.register("twtxt1").unwrap();

    let mut engine = TypewriterEngine::new();
    let mut clock = SimClock::new();
    engine
        .start(quick, Script::parse("abc"), &mut host, clock.now())
        .unwrap();
    engine
        .start(
            delayed,
            Script::parse("<break:{2}>xyz"),
            &mut host,
            clock.now(),
        )
        .unwrap();

    clock.advance(Duration::from_millis(200));
    engine.tick(clock.now(), &mut host).unwrap();
    assert_eq!(host.text(quick).unwrap(), "abc");
    assert_eq!(host.text(delayed).unwrap(), "");

    clock.advance(Duration::from_secs(3));
    engine.tick(clock.now(), &mut host).unwrap();
    assert_eq!(host.text(delayed).unwrap(), "xyz");
}
