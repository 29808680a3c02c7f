//! SimulationEngine - owns the live conflict and drives it tick by tick
//!
//! The engine is a plain owned value: every operation takes `&mut self`
//! and there is no global state, so several engines can run side by side.
//! Time enters only through [`SimulationEngine::poll`], which fires at most
//! one due tick per call. Stopping disarms every deadline at once.
//!
//! Listeners that need to act on the engine queue an [`EngineCommand`]
//! through [`SimulationEngine::commands`]. The queue is drained after every
//! entry point that dispatches events.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;

use crate::conflict::{Conflict, ConflictSummary};
use crate::core::config::{EngineConfig, MAX_SPEED};
use crate::core::error::{EngineError, PredictionError, SimError};
use crate::country::Country;
use crate::engine::bus::{EngineEvent, EventBus, EventKind, ListenerId};
use crate::engine::command::{CommandSender, EngineCommand};
use crate::engine::matchup::{MatchupProvider, RandomMatchup};
use crate::engine::runner;
use crate::engine::schedule::RepeatingTimer;
use crate::engine::stats::{MemoryUsage, PerformanceStats, SimulationStats, TickMetrics};
use crate::events::EventGenerator;
use crate::prediction::{KeyValueStore, PredictionStatistics, PredictionSystem, SubmitReceipt};

pub struct SimulationEngine {
    config: EngineConfig,
    countries: Vec<Country>,
    matchup: Box<dyn MatchupProvider>,
    event_generator: EventGenerator,
    predictions: PredictionSystem,
    bus: EventBus,
    commands_tx: mpsc::UnboundedSender<EngineCommand>,
    commands_rx: mpsc::UnboundedReceiver<EngineCommand>,
    rng: ChaCha8Rng,

    current_conflict: Option<Conflict>,
    completed: VecDeque<ConflictSummary>,

    running: bool,
    paused: bool,
    speed: f64,
    interval: Duration,
    tick_timer: RepeatingTimer,
    next_conflict_at: Option<Instant>,
    in_tick: bool,

    started_at: Option<Instant>,
    metrics: TickMetrics,
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("speed", &self.speed)
            .field("countries", &self.countries.len())
            .field("current_conflict", &self.current_conflict.as_ref().map(|c| c.id))
            .field("bus", &self.bus)
            .finish()
    }
}

impl SimulationEngine {
    /// Build an idle engine over a roster.
    ///
    /// `config` accepts a full [`EngineConfig`] or a bare interval in
    /// milliseconds.
    pub fn new(countries: Vec<Country>, config: impl Into<EngineConfig>) -> Result<Self, EngineError> {
        let config = config.into();
        if countries.len() < 2 {
            return Err(EngineError::NotEnoughCountries(countries.len()));
        }
        config.validate()?;
        let interval = config.tick_interval(1.0)?;
        let event_generator = EventGenerator::new(config.event_probability)?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        tracing::debug!(
            countries = countries.len(),
            interval_ms = config.update_interval_ms,
            "SimulationEngine created"
        );

        Ok(Self {
            config,
            countries,
            matchup: Box::new(RandomMatchup),
            event_generator,
            predictions: PredictionSystem::in_memory(),
            bus: EventBus::new(),
            commands_tx,
            commands_rx,
            rng,
            current_conflict: None,
            completed: VecDeque::new(),
            running: false,
            paused: false,
            speed: 1.0,
            interval,
            tick_timer: RepeatingTimer::new(),
            next_conflict_at: None,
            in_tick: false,
            started_at: None,
            metrics: TickMetrics::default(),
        })
    }

    /// Replace the pairing strategy
    pub fn with_matchup(mut self, matchup: Box<dyn MatchupProvider>) -> Self {
        self.matchup = matchup;
        self
    }

    /// Back the prediction ledger with a durable store
    pub fn with_store(mut self, store: Box<dyn KeyValueStore>) -> Self {
        self.predictions = PredictionSystem::new(store);
        self
    }

    // === LIFECYCLE ===

    /// Create a fresh conflict and begin ticking. No-op while running.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.start_at(Instant::now())
    }

    pub fn start_at(&mut self, now: Instant) -> Result<(), EngineError> {
        if self.running {
            tracing::debug!("start ignored: engine already running");
            return Ok(());
        }

        let conflict = self.spawn_conflict()?;
        self.event_generator.reset();
        self.current_conflict = Some(conflict);
        self.running = true;
        self.paused = false;
        self.started_at = Some(now);
        self.next_conflict_at = None;
        let interval = self.current_interval();
        self.tick_timer.arm(now, interval);

        if let Some(conflict) = self.current_conflict.as_ref() {
            tracing::info!("Simulation started: {}", conflict.matchup_label());
            self.bus.emit(&EngineEvent::Started {
                conflict,
                timestamp: Utc::now(),
            });
            self.bus.emit(&EngineEvent::ConflictCreated {
                conflict,
                countries: conflict.country_refs(),
            });
        }
        self.apply_pending_commands_at(now);
        Ok(())
    }

    /// Disarm all deadlines and drop the live conflict. Safe when stopped.
    pub fn stop(&mut self) {
        self.tick_timer.disarm();
        self.next_conflict_at = None;
        self.current_conflict = None;
        self.event_generator.reset();
        self.running = false;
        self.paused = false;
        self.started_at = None;

        tracing::info!("Simulation stopped");
        self.bus.emit(&EngineEvent::Stopped { timestamp: Utc::now() });
    }

    /// Suspend tick processing. The schedule keeps running, so ticks that
    /// fall due while paused are skipped rather than queued.
    pub fn pause(&mut self) {
        if !self.running || self.paused {
            return;
        }
        self.paused = true;
        tracing::info!("Simulation paused");
        self.bus.emit(&EngineEvent::Paused);
    }

    pub fn resume(&mut self) {
        if !self.running || !self.paused {
            return;
        }
        self.paused = false;
        tracing::info!("Simulation resumed");
        self.bus.emit(&EngineEvent::Resumed);
    }

    /// Change the speed multiplier in (0, 8]. Re-arms the tick timer when
    /// running.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<(), EngineError> {
        self.set_speed_at(multiplier, Instant::now())
    }

    pub fn set_speed_at(&mut self, multiplier: f64, now: Instant) -> Result<(), EngineError> {
        if !(multiplier > 0.0) {
            return Err(EngineError::SpeedNotPositive);
        }
        if multiplier > MAX_SPEED {
            return Err(EngineError::SpeedTooHigh);
        }

        let current_interval = self.config.tick_interval(multiplier)?;

        let old_speed = self.speed;
        self.speed = multiplier;
        self.interval = current_interval;
        if self.running {
            self.tick_timer.arm(now, current_interval);
        }

        tracing::info!("Speed changed {}x -> {}x ({:?} per tick)", old_speed, multiplier, current_interval);
        self.bus.emit(&EngineEvent::SpeedChanged {
            old_speed,
            new_speed: multiplier,
            current_interval,
        });
        Ok(())
    }

    /// Effective tick period at the current speed
    pub fn current_interval(&self) -> Duration {
        self.interval
    }

    /// Effective tick period in milliseconds
    pub fn get_current_interval(&self) -> f64 {
        self.config.update_interval_ms / self.speed
    }

    // === SCHEDULING ===

    /// Fire whatever is due at `now`: a pending auto-advance first, then at
    /// most one tick. Returns true if a tick was processed.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.apply_pending_commands_at(now);
        if !self.running {
            return false;
        }

        if let Some(at) = self.next_conflict_at {
            if now >= at {
                self.next_conflict_at = None;
                self.advance_to_next_conflict(now);
                self.apply_pending_commands_at(now);
                if !self.running {
                    return false;
                }
            }
        }

        if !self.tick_timer.fire(now) {
            return false;
        }
        if self.paused {
            tracing::trace!("tick skipped while paused");
            return false;
        }
        let ticked = self.process_update_at(now);
        self.apply_pending_commands_at(now);
        ticked
    }

    /// Drive the engine on wall-clock time until it stops or `shutdown`
    /// resolves
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: std::future::Future<Output = ()>,
    {
        runner::run(self, shutdown).await;
    }

    /// Earliest instant at which [`Self::poll`] has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.running {
            return None;
        }
        match (self.tick_timer.next_fire(), self.next_conflict_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Replace the live conflict with a fresh one immediately
    pub fn next_conflict(&mut self) -> Result<(), EngineError> {
        self.replace_conflict()?;
        self.apply_pending_commands();
        Ok(())
    }

    fn replace_conflict(&mut self) -> Result<(), EngineError> {
        let conflict = self.spawn_conflict()?;
        self.install_conflict(conflict);
        self.next_conflict_at = None;
        Ok(())
    }

    // === TICK ===

    /// Run one simulation step on the live conflict.
    ///
    /// Returns false when nothing ran: no conflict, conflict already
    /// ended, or a step already in progress.
    pub fn process_update(&mut self) -> bool {
        let now = Instant::now();
        let ticked = self.process_update_at(now);
        self.apply_pending_commands_at(now);
        ticked
    }

    fn process_update_at(&mut self, now: Instant) -> bool {
        if self.in_tick {
            tracing::debug!("tick skipped: previous tick still in progress");
            return false;
        }
        let Some(conflict) = self.current_conflict.as_mut() else {
            return false;
        };
        if !conflict.is_ongoing() {
            return false;
        }

        self.in_tick = true;
        let tick_started = Instant::now();

        // 1. territory
        if let Err(e) = conflict.update_territory_control(&mut self.rng) {
            tracing::error!("Territory update failed for {}: {}", conflict.matchup_label(), e);
            let error = SimError::from(e);
            self.bus.emit(&EngineEvent::Error {
                error: &error,
                context: "processUpdate",
            });
        }

        // 2. events
        self.event_generator.update_active_events(conflict);
        if let Some(event) = self.event_generator.generate_random_event(conflict, &mut self.rng) {
            self.event_generator.apply_event_effects(conflict, &event);
            tracing::debug!("Random event '{}' in {}", event.name, conflict.matchup_label());
            self.bus.emit(&EngineEvent::RandomEvent {
                event: &event,
                conflict: &*conflict,
            });
        }

        // 3. clock
        conflict.advance_tick();

        // 4. victory
        if let Some(victory) = conflict.check_victory_conditions(&mut self.rng) {
            conflict.end_conflict(victory.winner, victory.condition, victory.description.clone());
            self.bus.emit(&EngineEvent::ConflictEnded {
                conflict: &*conflict,
                victory: &victory,
            });

            let refs = conflict.country_refs();
            let pending = self
                .predictions
                .get_current_prediction(&refs[0], &refs[1])
                .map(|p| (p.id, p.country_a.code.clone()));
            if let Some((prediction_id, first_code)) = pending {
                let winner_code = &refs[victory.winner].code;
                let actual_winner = if *winner_code == first_code { 0 } else { 1 };
                match self
                    .predictions
                    .resolve_prediction(prediction_id, actual_winner, victory.condition)
                {
                    Ok(resolution) => self.bus.emit(&EngineEvent::PredictionResolved {
                        prediction_result: &resolution,
                        conflict: &*conflict,
                    }),
                    Err(e) => tracing::warn!("Could not resolve prediction {}: {}", prediction_id, e),
                }
            }

            self.completed.push_back(conflict.summary());
            while self.completed.len() > self.config.max_conflict_history {
                self.completed.pop_front();
            }
            self.metrics.conflicts_completed += 1;
            self.event_generator.reset();

            if self.config.auto_advance {
                self.next_conflict_at = Some(now + Duration::from_millis(self.config.next_conflict_delay_ms));
            }
        }

        // 5. notify
        self.bus.emit(&EngineEvent::Update {
            conflict: &*conflict,
            duration: conflict.duration,
            stats: conflict.get_stats(),
        });

        self.metrics.record(tick_started.elapsed());
        if self.metrics.ticks_processed % self.config.housekeeping_interval_ticks == 0 {
            self.housekeeping();
        }

        self.in_tick = false;
        true
    }

    /// Bound the live timeline and the finished-conflict history
    fn housekeeping(&mut self) {
        let mut trimmed = 0;
        if let Some(conflict) = self.current_conflict.as_mut() {
            trimmed = conflict.trim_timeline(self.config.max_timeline_events);
        }
        while self.completed.len() > self.config.max_conflict_history {
            self.completed.pop_front();
        }

        self.metrics.housekeeping_runs += 1;
        self.metrics.timeline_events_trimmed += trimmed;
        if trimmed > 0 {
            tracing::debug!(trimmed, "Housekeeping trimmed timeline");
        }
    }

    fn spawn_conflict(&mut self) -> Result<Conflict, EngineError> {
        let (first, second) = self.matchup.next_pair(&self.countries, &mut self.rng)?;
        Ok(Conflict::new(first, second)?)
    }

    fn install_conflict(&mut self, conflict: Conflict) {
        self.event_generator.reset();
        tracing::info!("New conflict: {}", conflict.matchup_label());
        let conflict = &*self.current_conflict.insert(conflict);
        self.bus.emit(&EngineEvent::ConflictCreated {
            conflict,
            countries: conflict.country_refs(),
        });
    }

    fn advance_to_next_conflict(&mut self, now: Instant) {
        match self.spawn_conflict() {
            Ok(conflict) => {
                self.install_conflict(conflict);
                let interval = self.current_interval();
                self.tick_timer.arm(now, interval);
            }
            Err(e) => {
                tracing::error!("Failed to create next conflict: {}", e);
                let error = SimError::from(e);
                self.bus.emit(&EngineEvent::Error {
                    error: &error,
                    context: "createNewConflict",
                });
            }
        }
    }

    // === COMMANDS ===

    /// Handle for queueing commands from listeners or other tasks
    pub fn commands(&self) -> CommandSender {
        CommandSender::new(self.commands_tx.clone())
    }

    /// Apply every queued command, including ones queued by listeners while
    /// the queue drains. Returns how many were applied.
    pub fn apply_pending_commands(&mut self) -> usize {
        self.apply_pending_commands_at(Instant::now())
    }

    fn apply_pending_commands_at(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands_rx.try_recv() {
            self.apply_command_at(command, now);
            applied += 1;
        }
        applied
    }

    /// Apply one command now. Failures are reported as `Error` events.
    pub fn apply_command(&mut self, command: EngineCommand) {
        self.apply_command_at(command, Instant::now());
    }

    fn apply_command_at(&mut self, command: EngineCommand, now: Instant) {
        tracing::debug!(?command, "Applying command");
        let (result, context) = match command {
            EngineCommand::SubmitPrediction { winner, confidence } => (
                self.submit_prediction(winner, confidence)
                    .map(|_| ())
                    .map_err(SimError::from),
                "submitPrediction",
            ),
            EngineCommand::Pause => {
                self.pause();
                (Ok(()), "pause")
            }
            EngineCommand::Resume => {
                self.resume();
                (Ok(()), "resume")
            }
            EngineCommand::SetSpeed(multiplier) => {
                (self.set_speed_at(multiplier, now).map_err(SimError::from), "setSpeed")
            }
            EngineCommand::NextConflict => (self.replace_conflict().map_err(SimError::from), "nextConflict"),
            EngineCommand::Stop => {
                self.stop();
                (Ok(()), "stop")
            }
        };

        if let Err(error) = result {
            tracing::warn!("Command {} failed: {}", context, error);
            self.bus.emit(&EngineEvent::Error { error: &error, context });
        }
    }

    /// Wait for the next queued command
    pub(crate) async fn next_command(&mut self) -> Option<EngineCommand> {
        self.commands_rx.recv().await
    }

    // === PREDICTIONS ===

    /// Predict the winner of the live conflict (0 or 1, in conflict order)
    pub fn submit_prediction(&mut self, winner: usize, confidence: u32) -> Result<SubmitReceipt, PredictionError> {
        let conflict = self
            .current_conflict
            .as_ref()
            .filter(|c| c.is_ongoing())
            .ok_or(PredictionError::NoActiveConflict)?;
        let [a, b] = conflict.country_refs();
        self.predictions.submit_prediction(&a, &b, winner, confidence)
    }

    pub fn prediction_statistics(&self) -> PredictionStatistics {
        self.predictions.get_statistics()
    }

    pub fn prediction_system(&self) -> &PredictionSystem {
        &self.predictions
    }

    pub fn prediction_system_mut(&mut self) -> &mut PredictionSystem {
        &mut self.predictions
    }

    // === EVENTS ===

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&EngineEvent<'_>) + Send + 'static,
    {
        self.bus.on(kind, listener)
    }

    /// Remove one listener, or all listeners of `kind` when `id` is `None`
    pub fn off(&mut self, kind: EventKind, id: Option<ListenerId>) -> usize {
        self.bus.off(kind, id)
    }

    /// Dispatch an event to listeners directly
    pub fn emit(&mut self, event: &EngineEvent<'_>) {
        self.bus.emit(event);
    }

    // === ACCESSORS ===

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn current_conflict(&self) -> Option<&Conflict> {
        self.current_conflict.as_ref()
    }

    pub fn current_conflict_mut(&mut self) -> Option<&mut Conflict> {
        self.current_conflict.as_mut()
    }

    /// Finished conflicts, oldest first
    pub fn completed_conflicts(&self) -> impl Iterator<Item = &ConflictSummary> {
        self.completed.iter()
    }

    pub fn event_generator(&self) -> &EventGenerator {
        &self.event_generator
    }

    // === STATS ===

    pub fn get_simulation_stats(&self) -> SimulationStats {
        SimulationStats {
            running: self.running,
            paused: self.paused,
            speed: self.speed,
            current_interval_ms: self.get_current_interval(),
            uptime: self.started_at.map(|t| t.elapsed()).unwrap_or_default(),
            ticks_processed: self.metrics.ticks_processed,
            conflicts_completed: self.metrics.conflicts_completed,
            active_events: self.event_generator.active_events().len(),
            current_conflict: self.current_conflict.as_ref().map(Conflict::get_stats),
        }
    }

    pub fn get_memory_usage(&self) -> MemoryUsage {
        let timeline = self.current_conflict.as_ref().map(|c| c.events.as_slice()).unwrap_or(&[]);
        MemoryUsage::estimate(
            timeline,
            self.completed.len(),
            self.event_generator.active_events(),
            self.predictions.predictions(),
        )
    }

    pub fn get_performance_stats(&self) -> PerformanceStats {
        self.metrics.snapshot()
    }
}
