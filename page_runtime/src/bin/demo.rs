//! # Landing Page Demo
//!
//! Drives the landing page under a simulated clock and prints each
//! surface as it changes:
//! - Navbar assembled from a demo session
//! - Profile card with a gradient derived from a synthetic avatar
//! - Both hero scripts revealed by the typewriter engine
//!
//! This is a HOST application, so it is allowed to print.
//! Services never print - they write surfaces that the host renders.

use clock::{Clock, Duration, SimClock};
use page_runtime::PageRuntime;
use services_profile::Rgba;
use session::{SessionContext, UserId};
use std::collections::HashMap;

fn main() {
    println!("=== Marquee Landing Page Demo ===\n");

    let session = SessionContext::new(UserId::new(), "wrapped_fan", "Farhan")
        .with_email("fan@example.com")
        .with_country("CA")
        .with_follower_count(42)
        .with_avatar_url("https://images.example.com/avatar.png")
        .with_plan("premium");

    // Synthetic avatar: a violet square.
    let avatar = vec![Rgba::opaque(100, 0, 200); 64];

    let mut runtime = PageRuntime::new(Some(session), Some(avatar));
    let mut clock = SimClock::new();

    println!("Firing ready event...\n");
    runtime.ready(clock.now());

    let mut last_seen: HashMap<String, u64> = HashMap::new();
    print_changed_frames(&runtime, &mut last_seen);

    // 40ms matches the typing cadence; the pauses in the scripts are
    // covered by simulated time, so the demo finishes instantly.
    while !runtime.is_idle() {
        clock.advance(Duration::from_millis(40));
        runtime
            .tick(clock.now())
            .expect("runtime-owned surfaces cannot miss");
        print_changed_frames(&runtime, &mut last_seen);
    }

    println!("\n{}", "=".repeat(60));
    println!("Demo complete at simulated t={}ms", clock.now().as_nanos() / 1_000_000);
    println!("{}", "=".repeat(60));

    for entry in runtime.log_entries() {
        println!("diagnostic: {:?}", entry);
    }
}

fn print_changed_frames(runtime: &PageRuntime, last_seen: &mut HashMap<String, u64>) {
    for frame in runtime.frames() {
        let seen = last_seen.get(&frame.label).copied().unwrap_or(0);
        if frame.revision > seen && frame.visible && !frame.text.is_empty() {
            println!("[{} r{}] {}", frame.label, frame.revision, frame.text);
            last_seen.insert(frame.label.clone(), frame.revision);
        }
    }
}
