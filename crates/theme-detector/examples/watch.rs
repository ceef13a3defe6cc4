//! Prints the current OS theme and every change until you type `e`.
//!
//! Run with: cargo run -p theme-detector --example watch
//!
//! Set `RUST_LOG=theme_detector=debug,theme_detector_core=debug` to see
//! detector selection and monitor activity.

use std::io::BufRead;

use theme_detector::ThemeState;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let detector = theme_detector::detector();
    println!("Detector: {}", detector.kind());
    println!("OS is dark: {}", detector.is_dark());

    let _subscription = detector.subscribe(|state: ThemeState| println!("OS is dark: {}", state.is_dark()));

    println!("Listening to system ui theme change... (Press E for exit)");
    for line in std::io::stdin().lock().lines() {
        match line {
            Ok(line) if line.trim().to_lowercase().starts_with('e') => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("couldn't read stdin: {err}");
                break;
            }
        }
    }
}
