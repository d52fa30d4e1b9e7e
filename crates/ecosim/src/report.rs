//! Text rendering of population histories.

/// Render one pair of bars for every `interval`-th recorded step.
///
/// Bars are scaled so the largest count across both histories spans
/// `width` characters.
pub fn render_history(
    prey: &[usize],
    predators: &[usize],
    interval: usize,
    width: usize,
) -> String {
    let mut out = String::from("Population History:\n");
    out.push_str(&"-".repeat(60));
    out.push('\n');

    let max_count = prey.iter().chain(predators).copied().max().unwrap_or(0);
    let steps = prey.len().min(predators.len());

    for i in (0..steps).step_by(interval.max(1)) {
        let prey_bar = bar_length(prey[i], max_count, width);
        let predator_bar = bar_length(predators[i], max_count, width);
        out.push_str(&format!(
            "Step {i:3} | Prey: {} ({})\n",
            "#".repeat(prey_bar),
            prey[i]
        ));
        out.push_str(&format!(
            "         | Pred: {} ({})\n\n",
            "*".repeat(predator_bar),
            predators[i]
        ));
    }

    out
}

pub fn bar_length(count: usize, max_count: usize, width: usize) -> usize {
    if max_count == 0 {
        return 0;
    }
    (count as f64 / max_count as f64 * width as f64).round() as usize
}

/// Render an ODE trajectory as a table, one row every `interval` samples
pub fn render_time_series(
    time: &[f64],
    prey: &[f64],
    predators: &[f64],
    interval: usize,
) -> String {
    let mut out = format!("{:>8} {:>12} {:>12}\n", "time", "prey", "predators");
    let samples = time.len().min(prey.len()).min(predators.len());

    for i in (0..samples).step_by(interval.max(1)) {
        out.push_str(&format!(
            "{:>8.1} {:>12.2} {:>12.2}\n",
            time[i], prey[i], predators[i]
        ));
    }

    out
}
