//! Async driver that feeds wall-clock time into a [`SimulationEngine`]

use std::future::Future;
use std::time::{Duration, Instant};

use crate::engine::command::EngineCommand;
use crate::engine::simulation::SimulationEngine;

/// Upper bound on one sleep, so a driver with no deadline still notices
/// external state changes
pub const IDLE_POLL: Duration = Duration::from_millis(250);

enum Wake {
    Shutdown,
    Command(Option<EngineCommand>),
    Deadline,
}

/// Poll the engine on its own deadlines until it stops or `shutdown`
/// resolves. Commands queued through [`SimulationEngine::commands`] are
/// applied as they arrive. A shutdown stops the engine before returning.
pub async fn run<F>(engine: &mut SimulationEngine, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    while engine.is_running() {
        let now = Instant::now();
        engine.poll(now);
        if !engine.is_running() {
            break;
        }

        let wake = engine
            .next_deadline()
            .map_or(now + IDLE_POLL, |deadline| deadline.min(now + IDLE_POLL));

        let reason = tokio::select! {
            _ = &mut shutdown => Wake::Shutdown,
            command = engine.next_command() => Wake::Command(command),
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(wake)) => Wake::Deadline,
        };

        match reason {
            Wake::Shutdown => {
                tracing::debug!("Runner received shutdown");
                engine.stop();
                break;
            }
            Wake::Command(Some(command)) => {
                engine.apply_command(command);
                engine.apply_pending_commands();
            }
            Wake::Command(None) | Wake::Deadline => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::country::default_roster;

    #[tokio::test]
    async fn test_run_returns_when_idle() {
        let mut engine = SimulationEngine::new(default_roster(), 5000u64).unwrap();
        run(&mut engine, std::future::pending()).await;
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn test_run_ticks_until_shutdown() {
        let config = EngineConfig {
            update_interval_ms: 10.0,
            seed: Some(8),
            ..EngineConfig::default()
        };
        let mut engine = SimulationEngine::new(default_roster(), config).unwrap();
        engine.start().unwrap();

        run(&mut engine, tokio::time::sleep(Duration::from_millis(120))).await;

        assert!(!engine.is_running());
        assert!(engine.get_performance_stats().ticks_processed >= 1);
    }

    #[tokio::test]
    async fn test_commands_from_another_task_reach_the_engine() {
        let mut engine = SimulationEngine::new(default_roster(), 60_000u64).unwrap();
        engine.start().unwrap();
        let commands = engine.commands();

        let remote = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            commands.submit_prediction(1, 6);
            commands.send(EngineCommand::SetSpeed(4.0));
            commands.send(EngineCommand::Stop);
        });

        run(&mut engine, std::future::pending()).await;
        remote.await.unwrap();

        assert!(!engine.is_running());
        assert_eq!(engine.speed(), 4.0);
        assert_eq!(engine.prediction_system().predictions().len(), 1);
    }
}
