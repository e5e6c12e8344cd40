//! Time formatting helpers.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render a span of seconds as its two most significant units, e.g. `"2h 1m"`.
pub fn format_duration(secs: u64) -> String {
    let Some(i) = UNITS.iter().position(|(size, _)| secs >= *size) else {
        return "0s".to_string();
    };
    let (major, major_suffix) = UNITS[i];
    let whole = secs / major;
    match UNITS.get(i + 1) {
        Some((minor, minor_suffix)) => {
            format!("{whole}{major_suffix} {}{minor_suffix}", (secs % major) / minor)
        }
        None => format!("{whole}{major_suffix}"),
    }
}
