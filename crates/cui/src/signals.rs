use lixi_core::{DeviceSignals, ScreenInfo};

/// The terminal's stand-in for browser signals: program and terminal type for
/// the user agent, window size for the screen, and locale settings.
pub fn terminal_signals() -> DeviceSignals {
    let term = std::env::var("TERM").unwrap_or_default();
    let color_depth = match std::env::var("COLORTERM").as_deref() {
        Ok("truecolor") | Ok("24bit") => 24,
        _ => 8,
    };
    let screen = crossterm::terminal::size()
        .ok()
        .map(|(width, height)| ScreenInfo {
            width: u32::from(width),
            height: u32::from(height),
            color_depth,
        });
    DeviceSignals {
        user_agent: format!(
            "lixi-cui/{} ({}; {})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            term
        ),
        screen,
        time_zone: std::env::var("TZ").unwrap_or_default(),
        language: std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_default(),
        hardware_concurrency: std::thread::available_parallelism()
            .ok()
            .map(|count| count.get() as u32),
    }
}
