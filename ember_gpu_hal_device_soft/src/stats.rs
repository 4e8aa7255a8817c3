/// Process-wide execution totals with a colored console report
///
/// Per-device counters live on each SoftDevice; these totals aggregate
/// across every device of the process, which is what firmware CI wants
/// in its end-of-run summary.

use colored::*;
use std::sync::atomic::{AtomicU64, Ordering};

use ember_gpu_hal::ember::command::RecordedCommand;

/// Snapshot of the process-wide execution totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecTotals {
    pub commands: u64,
    pub render_passes: u64,
    pub draws: u64,
    pub dispatches: u64,
    pub barriers: u64,
}

struct TotalsTracker {
    commands: AtomicU64,
    render_passes: AtomicU64,
    draws: AtomicU64,
    dispatches: AtomicU64,
    barriers: AtomicU64,
}

impl TotalsTracker {
    const fn new() -> Self {
        Self {
            commands: AtomicU64::new(0),
            render_passes: AtomicU64::new(0),
            draws: AtomicU64::new(0),
            dispatches: AtomicU64::new(0),
            barriers: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> ExecTotals {
        ExecTotals {
            commands: self.commands.load(Ordering::Relaxed),
            render_passes: self.render_passes.load(Ordering::Relaxed),
            draws: self.draws.load(Ordering::Relaxed),
            dispatches: self.dispatches.load(Ordering::Relaxed),
            barriers: self.barriers.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.commands.store(0, Ordering::Relaxed);
        self.render_passes.store(0, Ordering::Relaxed);
        self.draws.store(0, Ordering::Relaxed);
        self.dispatches.store(0, Ordering::Relaxed);
        self.barriers.store(0, Ordering::Relaxed);
    }
}

static TOTALS: TotalsTracker = TotalsTracker::new();

/// Fold one executed command stream into the totals
pub(crate) fn accumulate_commands(commands: &[RecordedCommand]) {
    TOTALS
        .commands
        .fetch_add(commands.len() as u64, Ordering::Relaxed);
    for command in commands {
        match command {
            RecordedCommand::BeginRenderPass(_) => {
                TOTALS.render_passes.fetch_add(1, Ordering::Relaxed);
            }
            RecordedCommand::Draw { .. } | RecordedCommand::DrawIndexed { .. } => {
                TOTALS.draws.fetch_add(1, Ordering::Relaxed);
            }
            RecordedCommand::Dispatch { .. } => {
                TOTALS.dispatches.fetch_add(1, Ordering::Relaxed);
            }
            RecordedCommand::Barrier => {
                TOTALS.barriers.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

/// Snapshot of the process-wide totals
pub fn exec_totals() -> ExecTotals {
    TOTALS.snapshot()
}

/// Reset the process-wide totals (between CI phases)
pub fn reset_exec_totals() {
    TOTALS.reset();
}

/// Print a colored summary of the process-wide totals
pub fn print_exec_report() {
    let totals = TOTALS.snapshot();
    println!("{}", "=== Soft Device Execution Report ===".bold());
    println!("  {:<14} {}", "commands".bright_blue(), totals.commands);
    println!(
        "  {:<14} {}",
        "render passes".bright_blue(),
        totals.render_passes
    );
    println!("  {:<14} {}", "draws".bright_blue(), totals.draws);
    println!("  {:<14} {}", "dispatches".bright_blue(), totals.dispatches);
    println!("  {:<14} {}", "barriers".bright_blue(), totals.barriers);
    if totals.commands == 0 {
        println!("  {}", "no work executed".yellow());
    }
}
