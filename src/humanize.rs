const UNITS: [&str; 6] = ["K", "M", "G", "T", "P", "E"];

/// Format a byte count with a single-letter binary unit, e.g. `1.0K`.
///
/// Values are never rounded up into the next unit, so one byte short of a
/// gibibyte reads `1024.0M`.
pub fn humanize_iec(size: i64) -> String {
    const UNIT: i64 = 1024;
    if size < UNIT {
        return format!("{size}B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1}{}", size as f64 / div as f64, UNITS[exp])
}
