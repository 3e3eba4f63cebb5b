//! ASCII banner (CAL-SYNC) with a vertical blue-to-violet gradient.

use crossterm::style::{Color, Stylize};
use figlet_rs::FIGfont;

/// Sky blue (#38b6ff).
const TOP: (u8, u8, u8) = (0x38, 0xb6, 0xff);
/// Soft violet (#a06bff).
const BOTTOM: (u8, u8, u8) = (0xa0, 0x6b, 0xff);

/// Blend `TOP` into `BOTTOM`. `t` in [0.0, 1.0].
fn gradient_at(t: f64) -> Color {
    let mix = |a: u8, b: u8| (f64::from(a) * (1.0 - t) + f64::from(b) * t).round() as u8;
    Color::Rgb {
        r: mix(TOP.0, BOTTOM.0),
        g: mix(TOP.1, BOTTOM.1),
        b: mix(TOP.2, BOTTOM.2),
    }
}

/// Prints the welcome banner in figlet with a line-by-line gradient, then the
/// version. Falls back to plain text when the embedded font is unavailable.
pub fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");

    let art = FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("CAL-SYNC").map(|figure| figure.to_string()));
    let Some(art) = art else {
        println!("CAL-SYNC v{}", version);
        return;
    };

    let lines: Vec<&str> = art.lines().collect();
    let last = lines.len().saturating_sub(1).max(1);
    for (i, line) in lines.iter().enumerate() {
        let color = gradient_at(i as f64 / last as f64);
        println!("{}", line.with(color));
    }
    println!("{}", format!("v{}", version).with(gradient_at(1.0)));
    println!("{}", "Instructions in, events out".with(gradient_at(1.0)));
}
