//! Simulation engine integration tests

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use conflict_oracle::conflict::VictoryCondition;
use conflict_oracle::core::error::EngineError;
use conflict_oracle::country::default_roster;
use conflict_oracle::engine::{EngineCommand, EngineEvent, EventKind, SimulationEngine};
use conflict_oracle::prediction::{KeyValueStore, MemoryStore, LEDGER_KEY};
use conflict_oracle::EngineConfig;

fn quiet_engine(seed: u64) -> SimulationEngine {
    let config = EngineConfig {
        seed: Some(seed),
        event_probability: 0.0,
        ..EngineConfig::default()
    };
    SimulationEngine::new(default_roster(), config).unwrap()
}

/// Records a short label for every event of the given kinds
fn record(engine: &mut SimulationEngine, kinds: &[EventKind]) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for &kind in kinds {
        let log = Arc::clone(&log);
        engine.on(kind, move |event| {
            let label = match event {
                EngineEvent::ConflictEnded { victory, .. } => format!("conflict_ended:{}", victory.winner),
                EngineEvent::PredictionResolved { prediction_result, .. } => {
                    format!("prediction_resolved:{}", prediction_result.correct)
                }
                EngineEvent::Error { context, .. } => format!("error:{context}"),
                other => other.kind().to_string(),
            };
            log.lock().unwrap().push(label);
        });
    }
    log
}

#[test]
fn test_speed_halves_interval() {
    let mut engine = SimulationEngine::new(default_roster(), 5000u64).unwrap();
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    engine.on(EventKind::SpeedChanged, move |event| {
        if let EngineEvent::SpeedChanged { old_speed, new_speed, current_interval } = event {
            sink.lock().unwrap().push((*old_speed, *new_speed, *current_interval));
        }
    });

    engine.set_speed(2.0).unwrap();

    assert_eq!(engine.get_current_interval(), 2500.0);
    assert_eq!(engine.current_interval(), Duration::from_millis(2500));
    assert_eq!(*changes.lock().unwrap(), vec![(1.0, 2.0, Duration::from_millis(2500))]);
}

#[test]
fn test_speed_above_max_rejected() {
    let mut engine = SimulationEngine::new(default_roster(), 5000u64).unwrap();
    let err = engine.set_speed(10.0).unwrap_err();
    assert_eq!(err, EngineError::SpeedTooHigh);
    assert_eq!(err.to_string(), "Maximum speed is 8x");
    assert_eq!(engine.speed(), 1.0);
}

#[test]
fn test_tick_failure_reports_error_and_keeps_running() {
    let mut engine = quiet_engine(1);
    let log = record(&mut engine, &[EventKind::Error, EventKind::Update]);
    engine.start().unwrap();

    engine.current_conflict_mut().unwrap().territory_control = [f64::NAN, 50.0];
    engine.process_update();

    assert!(engine.is_running());
    assert_eq!(
        *log.lock().unwrap(),
        vec!["error:processUpdate".to_string(), "update".to_string()]
    );

    engine.current_conflict_mut().unwrap().territory_control = [50.0, 50.0];
    assert!(engine.process_update());
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[test]
fn test_victory_resolves_prediction_and_advances() {
    let mut engine = quiet_engine(2);
    let log = record(
        &mut engine,
        &[EventKind::ConflictCreated, EventKind::ConflictEnded, EventKind::PredictionResolved],
    );
    let t0 = Instant::now();
    engine.start_at(t0).unwrap();
    engine.submit_prediction(0, 7).unwrap();

    engine.current_conflict_mut().unwrap().territory_control = [80.0, 20.0];
    assert!(engine.process_update());

    let conflict = engine.current_conflict().unwrap();
    assert!(!conflict.is_ongoing());
    assert_eq!(conflict.winner, Some(0));
    assert_eq!(conflict.victory_condition, Some(VictoryCondition::TerritorialControl));
    assert_eq!(engine.completed_conflicts().count(), 1);

    let stats = engine.prediction_system().get_statistics();
    assert_eq!(stats.resolved_predictions, 1);
    assert_eq!(stats.correct_predictions, 1);
    assert_eq!(engine.prediction_system().current_streak(), 1);

    // ended conflicts no longer tick or accept predictions
    assert!(!engine.process_update());
    assert!(engine.submit_prediction(1, 5).is_err());

    let later = Instant::now() + Duration::from_millis(3500);
    engine.poll(later);
    engine.poll(later + Duration::from_millis(10));

    assert!(engine.current_conflict().unwrap().is_ongoing());
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "conflict_created".to_string(),
            "conflict_ended:0".to_string(),
            "prediction_resolved:true".to_string(),
            "conflict_created".to_string(),
        ]
    );
}

#[test]
fn test_no_auto_advance_waits_for_caller() {
    let config = EngineConfig {
        seed: Some(3),
        event_probability: 0.0,
        auto_advance: false,
        ..EngineConfig::default()
    };
    let mut engine = SimulationEngine::new(default_roster(), config).unwrap();
    engine.start().unwrap();
    engine.current_conflict_mut().unwrap().territory_control = [10.0, 90.0];
    engine.process_update();

    engine.poll(Instant::now() + Duration::from_secs(60));
    assert!(!engine.current_conflict().unwrap().is_ongoing());

    engine.next_conflict().unwrap();
    assert!(engine.current_conflict().unwrap().is_ongoing());
}

#[test]
fn test_off_without_id_removes_every_listener() {
    let mut engine = quiet_engine(4);
    let log = record(&mut engine, &[EventKind::Update]);
    let other = record(&mut engine, &[EventKind::Update]);

    engine.start().unwrap();
    engine.process_update();
    assert_eq!(engine.off(EventKind::Update, None), 2);
    engine.process_update();

    assert_eq!(log.lock().unwrap().len(), 1);
    assert_eq!(other.lock().unwrap().len(), 1);
}

#[test]
fn test_off_with_id_removes_one_listener() {
    let mut engine = quiet_engine(5);
    let hits = Arc::new(Mutex::new(0));
    let h = Arc::clone(&hits);
    let id = engine.on(EventKind::Update, move |_| *h.lock().unwrap() += 1);
    let kept = record(&mut engine, &[EventKind::Update]);

    engine.start().unwrap();
    engine.off(EventKind::Update, Some(id));
    engine.process_update();

    assert_eq!(*hits.lock().unwrap(), 0);
    assert_eq!(kept.lock().unwrap().len(), 1);
}

#[test]
fn test_poll_follows_schedule() {
    let config = EngineConfig {
        update_interval_ms: 1000.0,
        seed: Some(6),
        event_probability: 0.0,
        ..EngineConfig::default()
    };
    let mut engine = SimulationEngine::new(default_roster(), config).unwrap();
    let t0 = Instant::now();
    let ms = |n: u64| t0 + Duration::from_millis(n);

    assert!(!engine.poll(ms(1000)));
    engine.start_at(t0).unwrap();

    assert!(!engine.poll(ms(500)));
    assert!(engine.poll(ms(1000)));
    assert!(!engine.poll(ms(1000)));
    // a late driver gets one tick, not a backlog
    assert!(engine.poll(ms(5000)));
    assert!(!engine.poll(ms(5500)));
    assert_eq!(engine.current_conflict().unwrap().duration, 2);

    engine.pause();
    assert!(!engine.poll(ms(6000)));
    assert_eq!(engine.current_conflict().unwrap().duration, 2);
    engine.resume();
    assert!(engine.poll(ms(7000)));
    assert_eq!(engine.current_conflict().unwrap().duration, 3);
}

#[test]
fn test_speed_change_rearms_timer() {
    let mut engine = quiet_engine(7);
    let t0 = Instant::now();
    engine.start_at(t0).unwrap();
    engine.set_speed_at(2.0, t0 + Duration::from_millis(1000)).unwrap();

    assert_eq!(engine.next_deadline(), Some(t0 + Duration::from_millis(3500)));
    assert!(!engine.poll(t0 + Duration::from_millis(3000)));
    assert!(engine.poll(t0 + Duration::from_millis(3500)));
}

#[test]
fn test_stop_cancels_everything() {
    let mut engine = quiet_engine(8);
    let log = record(&mut engine, &[EventKind::Stopped, EventKind::Update]);
    let t0 = Instant::now();
    engine.start_at(t0).unwrap();
    engine.stop();

    assert!(!engine.is_running());
    assert!(engine.current_conflict().is_none());
    assert_eq!(engine.next_deadline(), None);
    assert!(!engine.poll(t0 + Duration::from_secs(60)));
    assert_eq!(*log.lock().unwrap(), vec!["stopped".to_string()]);
}

#[test]
fn test_engines_are_independent() {
    let mut first = quiet_engine(9);
    let mut second = quiet_engine(9);
    first.start().unwrap();

    for _ in 0..5 {
        first.process_update();
    }
    first.set_speed(4.0).unwrap();

    assert!(!second.is_running());
    assert_eq!(second.speed(), 1.0);
    second.start().unwrap();
    assert_eq!(second.current_conflict().unwrap().duration, 0);
    assert_ne!(first.current_conflict().unwrap().id, second.current_conflict().unwrap().id);
}

#[test]
fn test_predictions_persist_through_store() {
    let store = MemoryStore::new();
    let mut engine = quiet_engine(10).with_store(Box::new(store.clone()));
    engine.start().unwrap();
    engine.submit_prediction(1, 9).unwrap();

    assert!(store.get(LEDGER_KEY).unwrap().is_some());

    let reopened = quiet_engine(11).with_store(Box::new(store));
    assert_eq!(reopened.prediction_system().predictions().len(), 1);
}

#[test]
fn test_stats_snapshots() {
    let mut engine = quiet_engine(12);
    let idle = engine.get_simulation_stats();
    assert!(!idle.running);
    assert!(idle.current_conflict.is_none());

    engine.start().unwrap();
    for _ in 0..4 {
        engine.process_update();
    }

    let stats = engine.get_simulation_stats();
    assert!(stats.running);
    assert_eq!(stats.ticks_processed, 4);
    assert_eq!(stats.current_interval_ms, 5000.0);
    assert_eq!(stats.current_conflict.unwrap().duration, 4);

    let memory = engine.get_memory_usage();
    assert_eq!(memory.timeline_events, 5);
    assert!(memory.estimated_bytes > 0);

    assert_eq!(engine.get_performance_stats().ticks_processed, 4);
}

#[test]
fn test_listener_predicts_each_auto_advanced_conflict() {
    let mut engine = quiet_engine(13);
    let commands = engine.commands();
    engine.on(EventKind::ConflictCreated, move |_| {
        commands.submit_prediction(0, 6);
    });

    engine.start().unwrap();
    let first = engine.current_conflict().unwrap().country_refs();
    assert!(engine
        .prediction_system()
        .get_current_prediction(&first[0], &first[1])
        .is_some());

    engine.current_conflict_mut().unwrap().territory_control = [80.0, 20.0];
    assert!(engine.process_update());
    assert_eq!(engine.prediction_statistics().resolved_predictions, 1);

    // the engine stays borrowed by its driver; only the listener can act
    engine.poll(Instant::now() + Duration::from_millis(3500));

    let second = engine.current_conflict().unwrap();
    assert!(second.is_ongoing());
    assert_eq!(second.duration, 0);
    let refs = second.country_refs();
    let pending = engine
        .prediction_system()
        .get_current_prediction(&refs[0], &refs[1])
        .expect("listener prediction for the new conflict");
    assert_eq!(pending.winner, 0);
    assert_eq!(pending.confidence, 6);
    assert_eq!(engine.prediction_system().predictions().len(), 2);
}

#[test]
fn test_listener_can_pause_after_victory() {
    let mut engine = quiet_engine(14);
    let commands = engine.commands();
    engine.on(EventKind::ConflictEnded, move |_| {
        commands.send(EngineCommand::Pause);
        commands.send(EngineCommand::SetSpeed(2.0));
    });
    let paused = record(&mut engine, &[EventKind::Paused, EventKind::SpeedChanged]);

    engine.start().unwrap();
    engine.current_conflict_mut().unwrap().territory_control = [10.0, 90.0];
    engine.process_update();

    assert!(engine.is_paused());
    assert_eq!(engine.speed(), 2.0);
    assert_eq!(
        *paused.lock().unwrap(),
        vec!["paused".to_string(), "speed_changed".to_string()]
    );
}

#[test]
fn test_failed_command_reports_error() {
    let mut engine = quiet_engine(15);
    let log = record(&mut engine, &[EventKind::Error]);
    let commands = engine.commands();

    commands.submit_prediction(0, 5);
    commands.send(EngineCommand::SetSpeed(100.0));
    assert_eq!(engine.apply_pending_commands(), 2);

    assert_eq!(
        *log.lock().unwrap(),
        vec!["error:submitPrediction".to_string(), "error:setSpeed".to_string()]
    );
    assert_eq!(engine.speed(), 1.0);
}

#[test]
fn test_stop_command_ends_run_loop_state() {
    let mut engine = quiet_engine(16);
    engine.start().unwrap();
    engine.commands().send(EngineCommand::Stop);

    assert!(!engine.poll(Instant::now()));
    assert!(!engine.is_running());
    assert!(engine.current_conflict().is_none());
}
