use gridconv::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK: Duration = Duration::from_millis(80);
const PHASE_TEMPLATE: &str = "{spinner:.green} {msg}";
const STAGE_TEMPLATE: &str =
    "{msg:<12} [{bar:40.cyan/blue}] {pos}/{len} @ {prefix:>8} ({elapsed_precise})";

/// Renders engine [`Progress`] events on one stderr bar.
///
/// Phases show as a spinner. Each stage becomes a bar over its candidates that is filled
/// when the stage stops, whether it converged early or ran out of candidates.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.finish_and_clear();
        Self {
            bar: Arc::new(Mutex::new(bar)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let bar = Arc::clone(&self.bar);
        Box::new(move |event: Progress| match bar.lock() {
            Ok(bar) => apply(&bar, event),
            Err(_) => warn!("Progress bar mutex was poisoned; dropping an update."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(bar: &ProgressBar, event: Progress) {
    match event {
        Progress::PhaseStart { name } => {
            bar.reset();
            bar.set_length(0);
            bar.set_style(style(PHASE_TEMPLATE, ProgressStyle::default_spinner));
            bar.set_message(name);
            bar.enable_steady_tick(SPINNER_TICK);
        }
        Progress::PhaseFinish => {
            bar.disable_steady_tick();
            bar.finish_with_message("✓ Done");
        }
        Progress::StageStart {
            parameter,
            total_candidates,
        } => {
            bar.disable_steady_tick();
            bar.reset();
            bar.set_style(style(STAGE_TEMPLATE, ProgressStyle::default_bar).progress_chars("##-"));
            bar.set_length(total_candidates);
            bar.set_message(parameter.keyword());
        }
        Progress::CandidateStart { value } => bar.set_prefix(value.to_string()),
        Progress::CandidateFinish { energy, mean_force } => {
            bar.println(format!(
                "  {:>8}  E = {:.8}  <|F|> = {:.6}",
                bar.prefix(),
                energy,
                mean_force
            ));
            bar.inc(1);
        }
        Progress::StageFinish { converged } => {
            if let Some(length) = bar.length() {
                bar.set_position(length);
            }
            let status = if converged { "converged" } else { "exhausted" };
            bar.finish_with_message(format!("{} {}", bar.message(), status));
        }
    }
}

fn style(template: &str, fallback: fn() -> ProgressStyle) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| fallback())
}
