//! uma-autopilot CLI - Testing and development entry point
//!
//! Prints the active configuration and classification policy. Wiring a
//! real frame source and input backend is left to the embedding
//! application.

use uma_autopilot::config::Settings;
use uma_autopilot::screen::RuleSet;

fn main() {
    println!("uma-autopilot - Umamusume screen automation");
    println!("===========================================");
    println!();
    println!("This is the CLI inspection interface.");
    println!("To automate, embed the library with a frame source and an input backend.");
    println!();

    let settings = Settings::default();
    println!("Current Configuration:");
    println!("  - Confidence Threshold: {}", settings.confidence_threshold);
    println!("  - Templates Directory: {}", settings.templates_dir.display());
    println!("  - Max Retries: {}", settings.max_retries);
    println!("  - Poll Interval: {:?}", settings.timings.poll_interval());
    println!("  - TP Auto-Recover: {}", settings.tp_recovery.auto_recover);
    println!();

    let rules = RuleSet::umamusume();
    println!("Classification Policy:");
    if let Some(blocking) = rules.blocking() {
        println!("  Blocking: {:?} <- {:?}", blocking.screen, blocking.templates);
    }
    println!("  Overlays (priority order):");
    for rule in rules.priority() {
        println!("    {:?} <- {:?}", rule.screen, rule.templates);
    }
    println!("  Backgrounds:");
    for rule in rules.background() {
        println!("    {:?} <- {:?}", rule.screen, rule.templates);
    }
}
