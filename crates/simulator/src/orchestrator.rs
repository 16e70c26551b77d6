//! The behavior orchestrator: archetype-driven actor loops.
//!
//! Each run step asks the archetype registry what to do. A step either skips
//! (recorded, but the pacing delay still happens), bursts (several calls
//! back-to-back inside the one step), or waits and makes a single call
//! through the execution engine. Actors run as independent concurrent
//! futures; the per-key sequence coordinator inside the engine is the only
//! serialization between them.

use crate::collector::{MetricsCollector, MetricsSnapshot};
use crate::config::SimulatorConfig;
use crate::events::{EventBus, RunEvent};
use crate::provider::ActorProvider;
use crate::run::{RunReport, RunStatus, SimulationRun};
use crate::SimulatorError;
use futures::future::join_all;
use stampede_behavior::{
    ArchetypeProfile, ArchetypeRegistry, DelayOptions, TimingGenerator, TimingProfile,
};
use stampede_engine::{ExecutionOrchestrator, TargetClient};
use stampede_rng::DeterministicRng;
use stampede_safety::{BreakerState, BudgetStatus};
use stampede_sequencer::{ChainReader, SequenceSnapshot};
use stampede_types::{
    Actor, CallParams, ErrorKind, ExecutionResult, FunctionId, NetworkId, SequenceKey,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What every step of a run calls.
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    /// Contract entry point.
    pub function: FunctionId,
    /// Arguments sent with every call.
    pub args: serde_json::Value,
    /// Attach an archetype-drawn transaction size to each call.
    pub generate_size: bool,
}

impl SimulateOptions {
    pub fn call(function: impl Into<FunctionId>) -> Self {
        Self {
            function: function.into(),
            args: serde_json::Value::Null,
            generate_size: true,
        }
    }

    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = args;
        self
    }

    pub fn without_size(mut self) -> Self {
        self.generate_size = false;
        self
    }
}

/// Drives archetype-shaped traffic through an execution engine.
///
/// Every actor loop derives its own registry and timing generator from the
/// configured seed and the actor's id, so concurrent actors never share a
/// random stream and reruns with the same seed make the same decisions.
pub struct BehaviorOrchestrator<C, R> {
    engine: Arc<ExecutionOrchestrator<C, R>>,
    provider: Arc<dyn ActorProvider>,
    collector: Arc<MetricsCollector>,
    events: EventBus,
    config: SimulatorConfig,
    extra_archetypes: Vec<(String, ArchetypeProfile)>,
    extra_profiles: Vec<(String, TimingProfile)>,
    run_counter: AtomicU64,
}

impl<C: TargetClient, R: ChainReader> BehaviorOrchestrator<C, R> {
    pub fn new(
        engine: Arc<ExecutionOrchestrator<C, R>>,
        provider: Arc<dyn ActorProvider>,
        config: SimulatorConfig,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            engine,
            provider,
            collector: Arc::new(MetricsCollector::new()),
            events,
            config,
            extra_archetypes: Vec::new(),
            extra_profiles: Vec::new(),
            run_counter: AtomicU64::new(0),
        }
    }

    /// Add an archetype beyond the built-ins. Validated immediately; runs
    /// started afterwards can use it.
    pub fn register_archetype(
        &mut self,
        name: impl Into<String>,
        profile: ArchetypeProfile,
    ) -> Result<(), SimulatorError> {
        let name = name.into();
        let mut scratch = ArchetypeRegistry::new(DeterministicRng::new(0));
        scratch.register(name.clone(), profile.clone())?;
        self.extra_archetypes.push((name, profile));
        Ok(())
    }

    /// Add a timing profile beyond the built-ins.
    pub fn add_timing_profile(
        &mut self,
        name: impl Into<String>,
        profile: TimingProfile,
    ) -> Result<(), SimulatorError> {
        let name = name.into();
        let mut scratch = TimingGenerator::empty(DeterministicRng::new(0));
        scratch.add_profile(name.clone(), profile)?;
        self.extra_profiles.push((name, profile));
        Ok(())
    }

    /// Run one actor through `iterations` archetype-driven steps.
    pub async fn simulate_archetype(
        &self,
        archetype: &str,
        actor: &Actor,
        iterations: u32,
        options: &SimulateOptions,
    ) -> Result<SimulationRun, SimulatorError> {
        self.actor_run(
            archetype,
            actor,
            Some(iterations),
            &CancellationToken::new(),
            options,
        )
        .await
    }

    /// Run `actor_count` actors of one archetype until `duration` elapses.
    ///
    /// Each actor loops independently; there is no barrier between them, and
    /// the deadline is checked between steps, never mid-call.
    pub async fn run_continuous(
        &self,
        network: NetworkId,
        archetype: &str,
        actor_count: u32,
        duration: Duration,
        options: &SimulateOptions,
    ) -> Result<RunReport, SimulatorError> {
        let cancel = CancellationToken::new();
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            deadline.cancel();
        });
        self.run_continuous_until_cancelled(network, archetype, actor_count, cancel, options)
            .await
    }

    /// [`run_continuous`](Self::run_continuous) with an externally owned stop
    /// signal.
    pub async fn run_continuous_until_cancelled(
        &self,
        network: NetworkId,
        archetype: &str,
        actor_count: u32,
        cancel: CancellationToken,
        options: &SimulateOptions,
    ) -> Result<RunReport, SimulatorError> {
        let started = Instant::now();
        let mut actors = Vec::with_capacity(actor_count as usize);
        for index in 0..actor_count {
            actors.push(self.provider.actor(index, network).await?);
        }
        info!(archetype, actors = actor_count, "Starting continuous run");

        let futures: Vec<_> = actors
            .iter()
            .map(|actor| self.actor_run(archetype, actor, None, &cancel, options))
            .collect();
        let runs = join_all(futures)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RunReport::from_runs(started.elapsed(), runs))
    }

    /// Run a mixed population concurrently: `mix` pairs archetype names with
    /// actor counts, and actors are assigned provider indices in mix order.
    pub async fn run_mixed(
        &self,
        network: NetworkId,
        mix: &[(String, u32)],
        iterations: u32,
        options: &SimulateOptions,
    ) -> Result<RunReport, SimulatorError> {
        self.run_mixed_until_cancelled(network, mix, iterations, CancellationToken::new(), options)
            .await
    }

    /// [`run_mixed`](Self::run_mixed) with an externally owned stop signal.
    pub async fn run_mixed_until_cancelled(
        &self,
        network: NetworkId,
        mix: &[(String, u32)],
        iterations: u32,
        cancel: CancellationToken,
        options: &SimulateOptions,
    ) -> Result<RunReport, SimulatorError> {
        let started = Instant::now();
        let mut population = Vec::new();
        let mut index = 0u32;
        for (archetype, count) in mix {
            for _ in 0..*count {
                population.push((archetype.as_str(), self.provider.actor(index, network).await?));
                index += 1;
            }
        }
        info!(
            groups = mix.len(),
            actors = population.len(),
            iterations,
            "Starting mixed run"
        );

        let futures: Vec<_> = population
            .iter()
            .map(|(archetype, actor)| {
                self.actor_run(archetype, actor, Some(iterations), &cancel, options)
            })
            .collect();
        let runs = join_all(futures)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RunReport::from_runs(started.elapsed(), runs))
    }

    /// One actor's loop. `iterations: None` runs until cancellation, which
    /// for a deadline-bound run counts as normal completion.
    async fn actor_run(
        &self,
        archetype: &str,
        actor: &Actor,
        iterations: Option<u32>,
        cancel: &CancellationToken,
        options: &SimulateOptions,
    ) -> Result<SimulationRun, SimulatorError> {
        let run_id = self.run_counter.fetch_add(1, Ordering::SeqCst);
        let (mut registry, mut timing) = self.behavior_for(actor)?;

        // Unusable pairings fail here, before RunStarted goes out.
        let profile = registry.get(archetype)?.clone();
        timing.profile(&profile.timing_profile)?;

        self.events.emit(RunEvent::RunStarted {
            run_id,
            archetype: archetype.to_string(),
            actor: actor.id,
            iterations: iterations.unwrap_or(0),
        });
        info!(
            run_id,
            archetype,
            actor = %actor.id,
            iterations = iterations.unwrap_or(0),
            "Run started"
        );

        let mut run = SimulationRun::begin(archetype, actor.id, iterations.unwrap_or(0));
        let mut waits: Vec<u64> = Vec::new();
        let delay_options = DelayOptions::with_multiplier(self.config.delay_multiplier);
        let progress_every = self.config.progress_every.max(1);

        let status = loop {
            if cancel.is_cancelled() {
                break if iterations.is_none() {
                    RunStatus::Completed
                } else {
                    RunStatus::Cancelled
                };
            }
            if let Some(total) = iterations {
                if run.completed >= total {
                    break RunStatus::Completed;
                }
            }

            let step = self
                .step(
                    &mut registry,
                    &mut timing,
                    &profile,
                    archetype,
                    actor,
                    options,
                    delay_options,
                    &mut run,
                    &mut waits,
                )
                .await;
            if let Err(error) = step {
                warn!(run_id, archetype, error = %error, "Run aborted");
                self.events.emit(RunEvent::RunFailed {
                    run_id,
                    detail: error.to_string(),
                });
                run.finalize(&waits, RunStatus::Cancelled);
                return Err(error);
            }

            run.completed += 1;
            if run.completed % progress_every == 0 {
                self.events.emit(RunEvent::Progress {
                    run_id,
                    iteration: run.completed,
                    succeeded: run.succeeded,
                    failed: run.failed,
                    skipped: run.skipped,
                });
            }
        };

        run.finalize(&waits, status);
        self.events.emit(RunEvent::RunCompleted {
            run_id,
            status,
            succeeded: run.succeeded,
            failed: run.failed,
            skipped: run.skipped,
        });
        info!(
            run_id,
            archetype,
            completed = run.completed,
            succeeded = run.succeeded,
            failed = run.failed,
            skipped = run.skipped,
            "Run finished"
        );
        Ok(run)
    }

    /// One step: skip, burst, or delay-then-call.
    #[allow(clippy::too_many_arguments)]
    async fn step(
        &self,
        registry: &mut ArchetypeRegistry,
        timing: &mut TimingGenerator,
        profile: &ArchetypeProfile,
        archetype: &str,
        actor: &Actor,
        options: &SimulateOptions,
        delay_options: DelayOptions,
        run: &mut SimulationRun,
        waits: &mut Vec<u64>,
    ) -> Result<(), SimulatorError> {
        if registry.should_skip(archetype)? {
            // The skip keeps its pacing delay so inter-step timing stays
            // realistic even when nothing is called.
            run.skipped += 1;
            stampede_metrics::record_skip(archetype);
            self.collector.record_skip(archetype);
            waits.push(timing.delay(&profile.timing_profile, delay_options).await?);
            return Ok(());
        }

        let suitable = registry.is_function_suitable(archetype, &options.function)?;
        if suitable && registry.should_burst(archetype)? {
            let burst_size = profile.burst.size;
            stampede_metrics::record_burst(archetype, burst_size);
            let mut prepared = Vec::with_capacity(burst_size as usize);
            for _ in 0..burst_size {
                prepared.push(self.shape_params(registry, archetype, actor, options)?);
            }

            let results = Mutex::new(Vec::with_capacity(prepared.len()));
            let pauses = timing
                .burst_pattern(prepared.len(), self.config.burst_pause_ms, |call| {
                    let params = prepared[call].clone();
                    let results = &results;
                    async move {
                        let result = self.engine.execute(actor, &params).await;
                        results.lock().push(result);
                    }
                })
                .await;
            waits.extend(pauses);
            for result in results.into_inner() {
                self.record(archetype, result, run);
            }
            return Ok(());
        }

        waits.push(timing.delay(&profile.timing_profile, delay_options).await?);
        let result = if suitable {
            let params = self.shape_params(registry, archetype, actor, options)?;
            self.engine.execute(actor, &params).await
        } else {
            ExecutionResult::failed(
                ErrorKind::Validation,
                format!(
                    "function {} is out of character for {archetype}",
                    options.function
                ),
                None,
                0.0,
                0,
            )
        };
        self.record(archetype, result, run);
        Ok(())
    }

    fn shape_params(
        &self,
        registry: &mut ArchetypeRegistry,
        archetype: &str,
        actor: &Actor,
        options: &SimulateOptions,
    ) -> Result<CallParams, SimulatorError> {
        let mut params =
            CallParams::new(actor.network, options.function.clone()).with_args(options.args.clone());
        if options.generate_size {
            params = params.with_transaction_size(registry.generate_transaction_size(archetype)?);
        }
        Ok(params)
    }

    fn record(&self, archetype: &str, result: ExecutionResult, run: &mut SimulationRun) {
        if result.success {
            run.succeeded += 1;
        } else {
            run.failed += 1;
        }
        self.collector.record_result(archetype, &result);
        run.interactions.push(result);
    }

    /// Registry and timing generator for one actor, forked off the run seed
    /// so actors draw from disjoint deterministic streams.
    fn behavior_for(
        &self,
        actor: &Actor,
    ) -> Result<(ArchetypeRegistry, TimingGenerator), SimulatorError> {
        let base = DeterministicRng::new(self.config.seed);
        let offset = u64::from(actor.id.0) * 2;
        let mut registry = ArchetypeRegistry::with_defaults(base.fork(offset));
        let mut timing = TimingGenerator::new(base.fork(offset + 1));
        for (name, profile) in &self.extra_archetypes {
            registry.register(name.clone(), profile.clone())?;
        }
        for (name, profile) in &self.extra_profiles {
            timing.add_profile(name.clone(), *profile)?;
        }
        Ok((registry, timing))
    }

    /// Subscribe here for lifecycle events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Live aggregate view over everything this orchestrator has run.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.collector.snapshot()
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.engine.breaker().state()
    }

    pub fn budget_status(&self) -> BudgetStatus {
        self.engine.budget().status()
    }

    pub fn sequence_state(&self, key: SequenceKey) -> Option<SequenceSnapshot> {
        self.engine.sequences().sequence_state(key)
    }

    /// The underlying engine, for direct `execute`/`execute_batch`/`dry_run`
    /// access.
    pub fn engine(&self) -> &ExecutionOrchestrator<C, R> {
        &self.engine
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }
}
