//! ランダムエージェントでカリキュラムを最後まで回すデモ
//!
//! usage: curriculum-cli [SEQUENCE] [STEPS_PER_TASK]
//!
//! `RUST_LOG=debug` でリセットやイベントの詳細が見える。

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use rand::Rng;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use curriculum_core::app::{HarnessConfig, Orchestrator, TaskFactory};
use curriculum_core::domain::{HarnessError, Sequence};
use curriculum_core::impls::{MemoryEventSink, ScriptedLauncher};

const DEFAULT_STEPS_PER_TASK: u64 = 500;
const SEED: u64 = 0;

#[derive(Debug, Default, Clone)]
struct TaskReport {
    name: String,
    reward: f64,
    episodes: u32,
    success: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let sequence: Sequence = match args.next() {
        Some(name) => name.parse().map_err(anyhow::Error::msg)?,
        None => Sequence::WorldProgression4,
    };
    let steps_per_task = match args.next() {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid steps per task '{raw}'"))?,
        None => DEFAULT_STEPS_PER_TASK,
    };

    let events = Arc::new(MemoryEventSink::new());
    let factory = TaskFactory::new(Arc::new(ScriptedLauncher::process()));
    let mut orch = Orchestrator::new(factory).with_event_sink(events.clone());

    let config = HarnessConfig {
        engine: json!({ "seed": SEED }).as_object().cloned().unwrap_or_default(),
        ..HarnessConfig::default()
    };
    orch.initialize(sequence.tasks(), steps_per_task, 0, config)
        .context("failed to initialize orchestrator")?;

    tracing::info!(%sequence, run_id = %orch.run_id(), budget = orch.budget(), "starting run");

    let mut reports = vec![TaskReport::default(); orch.num_tasks()];
    for (report, spec) in reports.iter_mut().zip(orch.tasks()) {
        report.name = spec.task_name.clone();
    }

    let mut rng = rand::thread_rng();
    orch.reset(Some(SEED), None)?;
    loop {
        let actions = orch
            .active_task()
            .map(|env| env.action_count())
            .context("no active task")?;
        let outcome = match orch.step(rng.gen_range(0..actions)) {
            Ok(outcome) => outcome,
            Err(HarnessError::StepBudgetExceeded { .. }) => break,
            Err(e) => return Err(e.into()),
        };

        let index = outcome.seq_idx().context("step info has no seq_idx")?;
        let report = &mut reports[index];
        report.reward += outcome.reward;

        // 境界のステップでは既に次のタスクへ切り替わっている
        if orch.task_id() == index {
            report.success = orch.success()?;
        }

        if outcome.is_terminal() {
            report.episodes += 1;
            if orch.global_step() >= orch.budget() {
                break;
            }
            orch.reset(None, None)?;
        }
    }
    orch.close();

    println!("{:<10} {:>12} {:>9} {:>8}", "task", "reward", "episodes", "success");
    for report in &reports {
        println!(
            "{:<10} {:>12.2} {:>9} {:>8.3}",
            report.name, report.reward, report.episodes, report.success
        );
    }
    println!();
    for event in events.events() {
        println!("{}", serde_json::to_string(&event)?);
    }

    if orch.global_step() != orch.budget() {
        bail!(
            "run stopped early at step {} of {}",
            orch.global_step(),
            orch.budget()
        );
    }
    Ok(())
}
