use std::time::Instant;

/// Print the time elapsed since `start` as hours, minutes and seconds.
pub fn print_hms(start: &Instant) {
    let elapsed = start.elapsed().as_secs();
    let (hours, minutes, seconds) = (elapsed / 3600, (elapsed % 3600) / 60, elapsed % 60);
    println!("Elapsed: {:02}:{:02}:{:02}", hours, minutes, seconds);
}
