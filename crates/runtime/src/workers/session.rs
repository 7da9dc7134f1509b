//! Session worker that owns the active [`RunSession`].
//!
//! On every snapshot tick it reads the device, keeps the session in step
//! with the loaded ROM, replays the schedule, and starts a drain when the
//! game can accept items. Commands from [`RuntimeHandle`](crate::RuntimeHandle)
//! are handled between ticks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use rip_content::Content;
use rip_core::{DeviceSnapshot, RomIdentity, RunRecord, RunSeed, WriteRecord};

use crate::api::{Result, RuntimeError};
use crate::delivery::{DeliveryError, DeliveryProtocol};
use crate::device::{Device, DeviceSlot};
use crate::events::{DeviceEvent, Event, EventBus, ScheduleEvent};
use crate::repository::{ConfigRepository, RunRepository};
use crate::session::{RunSession, SessionView};

/// Commands that can be sent to the session worker
pub enum Command {
    /// Start a run on the current ROM with the named configuration.
    StartRun {
        config: String,
        seeded: bool,
        reply: oneshot::Sender<Result<RunRecord>>,
    },
    /// Delete the current ROM's run and clear its queue and history.
    ResetRun { reply: oneshot::Sender<Result<()>> },
    /// Start a drain now. Replies once the drain has been started.
    Drain { reply: oneshot::Sender<Result<()>> },
    /// Deliver one item outside the schedule. Replies once it is written.
    SendItem {
        item: String,
        reply: oneshot::Sender<Result<WriteRecord>>,
    },
    /// Run a snapshot pass immediately.
    Refresh { reply: oneshot::Sender<Result<()>> },
    QuerySession {
        reply: oneshot::Sender<Option<SessionView>>,
    },
    QuerySnapshot {
        reply: oneshot::Sender<Option<DeviceSnapshot>>,
    },
}

/// Shared dependencies of the session worker.
pub struct SessionContext {
    pub content: Arc<Content>,
    pub runs: Arc<dyn RunRepository>,
    pub configs: Arc<dyn ConfigRepository>,
    pub devices: DeviceSlot,
    pub protocol: DeliveryProtocol,
    pub events: EventBus,
}

pub struct SessionWorker {
    ctx: SessionContext,
    snapshot_interval: Duration,
    command_rx: mpsc::Receiver<Command>,
    shutdown: watch::Receiver<bool>,
    session: Option<Arc<RunSession>>,
    last_snapshot: Option<DeviceSnapshot>,
    /// ROM last reported as incompatible or awaiting start.
    announced: Option<RomIdentity>,
    /// Drains and single sends in flight; aborted on shutdown.
    tasks: JoinSet<()>,
}

impl SessionWorker {
    pub fn new(
        ctx: SessionContext,
        snapshot_interval: Duration,
        command_rx: mpsc::Receiver<Command>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            ctx,
            snapshot_interval,
            command_rx,
            shutdown,
            session: None,
            last_snapshot: None,
            announced: None,
            tasks: JoinSet::new(),
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.snapshot_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd).await;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        debug!("Snapshot pass failed: {}", e);
                    }
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Delivery task failed: {}", e);
                    }
                }
                _ = self.shutdown.changed() => break,
            }
        }

        if !self.tasks.is_empty() {
            info!("Aborting {} delivery task(s) in flight", self.tasks.len());
        }
        // Aborted drains release their permit as they are dropped.
        self.tasks.shutdown().await;
        debug!("Session worker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::StartRun {
                config,
                seeded,
                reply,
            } => {
                let result = self.start_run(&config, seeded);
                if reply.send(result).is_err() {
                    debug!("StartRun reply channel closed (caller dropped)");
                }
            }
            Command::ResetRun { reply } => {
                let result = self.reset_run();
                if reply.send(result).is_err() {
                    debug!("ResetRun reply channel closed (caller dropped)");
                }
            }
            Command::Drain { reply } => {
                let result = self.start_drain().await;
                if reply.send(result).is_err() {
                    debug!("Drain reply channel closed (caller dropped)");
                }
            }
            Command::SendItem { item, reply } => self.send_item(item, reply).await,
            Command::Refresh { reply } => {
                let result = self.refresh().await;
                if reply.send(result).is_err() {
                    debug!("Refresh reply channel closed (caller dropped)");
                }
            }
            Command::QuerySession { reply } => {
                let view = self.session.as_ref().map(|session| session.view());
                if reply.send(view).is_err() {
                    debug!("QuerySession reply channel closed (caller dropped)");
                }
            }
            Command::QuerySnapshot { reply } => {
                if reply.send(self.last_snapshot.clone()).is_err() {
                    debug!("QuerySnapshot reply channel closed (caller dropped)");
                }
            }
        }
    }

    /// One snapshot tick: read, sync the session, schedule, maybe drain.
    async fn refresh(&mut self) -> Result<()> {
        let Some(device) = self.ctx.devices.get().await else {
            return Ok(());
        };

        let snapshot = match device.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.ctx
                    .events
                    .publish(Event::Device(DeviceEvent::ReadFailed {
                        reason: e.to_string(),
                    }));
                return Err(e.into());
            }
        };
        self.ctx
            .events
            .publish(Event::Device(DeviceEvent::Snapshot(snapshot.clone())));
        self.last_snapshot = Some(snapshot.clone());

        self.sync_session(&snapshot.rom)?;
        let Some(session) = self.session.clone() else {
            return Ok(());
        };

        let pass = session.compute_pass(&snapshot, &self.ctx.content.catalog);
        let history = pass.due.clone();
        let outcome = session.apply_pass(pass);
        if !outcome.enqueued.is_empty() {
            debug!("Enqueued {} item(s)", outcome.enqueued.len());
        }
        self.ctx
            .events
            .publish(Event::Schedule(ScheduleEvent::Updated {
                history,
                enqueued: outcome.enqueued,
                queued: session.queue_len(),
            }));

        if snapshot.in_delivery_mode() && session.queue_len() > 0 {
            match self.ctx.protocol.begin(&session) {
                Ok(permit) => self.spawn_drain(device, session, permit),
                Err(DeliveryError::Busy) => debug!("Drain already running"),
                Err(e) => debug!("Drain not started: {}", e),
            }
        }
        Ok(())
    }

    /// Keeps the session bound to the loaded ROM, rehydrating a stored run.
    fn sync_session(&mut self, rom: &RomIdentity) -> Result<()> {
        if let Some(session) = &self.session {
            if session.rom() == rom {
                return Ok(());
            }
            info!("ROM changed from {} to {}", session.rom(), rom);
            self.session = None;
        }

        if rom.is_empty() {
            return Ok(());
        }
        if !rom.is_compatible() {
            if self.announced.as_ref() != Some(rom) {
                warn!("ROM {} does not support deliveries", rom);
                self.ctx
                    .events
                    .publish(Event::Device(DeviceEvent::Incompatible { rom: rom.clone() }));
                self.announced = Some(rom.clone());
            }
            return Ok(());
        }

        match self.ctx.runs.load(rom)? {
            Some(record) => {
                let schedule = self.load_schedule(&record.schedule_ref)?;
                info!(
                    "Rehydrated run for {} (seed {}, config {})",
                    rom, record.seed, record.schedule_ref
                );
                self.ctx
                    .events
                    .publish(Event::Schedule(ScheduleEvent::RunRehydrated {
                        rom: rom.clone(),
                        seed: record.seed.clone(),
                        config: record.schedule_ref.clone(),
                    }));
                self.session = Some(Arc::new(RunSession::new(rom.clone(), record, schedule)));
                self.announced = None;
            }
            None => {
                if self.announced.as_ref() != Some(rom) {
                    info!("ROM {} has no run yet", rom);
                    self.ctx
                        .events
                        .publish(Event::Schedule(ScheduleEvent::AwaitingStart {
                            rom: rom.clone(),
                        }));
                    self.announced = Some(rom.clone());
                }
            }
        }
        Ok(())
    }

    fn load_schedule(&self, name: &str) -> Result<rip_core::Schedule> {
        let text = self
            .ctx
            .configs
            .load(name)?
            .ok_or_else(|| RuntimeError::ConfigNotFound {
                name: name.to_string(),
            })?;
        self.ctx
            .content
            .schedule(&text)
            .map_err(|e| RuntimeError::InvalidSchedule {
                name: name.to_string(),
                reason: format!("{e:#}"),
            })
    }

    fn start_run(&mut self, config: &str, seeded: bool) -> Result<RunRecord> {
        let rom = self
            .last_snapshot
            .as_ref()
            .map(|snapshot| snapshot.rom.clone())
            .filter(|rom| !rom.is_empty())
            .ok_or(RuntimeError::NoRom)?;
        if !rom.is_compatible() {
            return Err(RuntimeError::IncompatibleRom { rom });
        }
        if self.ctx.runs.exists(&rom)? {
            return Err(RuntimeError::RunAlreadyStarted { rom });
        }

        let schedule = self.load_schedule(config)?;
        let seed = if seeded {
            RunSeed::Rom(rom.to_string())
        } else {
            RunSeed::Random(rand::random())
        };
        let record = RunRecord::new(seed, config);
        self.ctx.runs.save(&rom, &record)?;

        info!("Started run for {} (seed {}, config {})", rom, record.seed, config);
        self.ctx
            .events
            .publish(Event::Schedule(ScheduleEvent::RunStarted {
                rom: rom.clone(),
                seed: record.seed.clone(),
                config: config.to_string(),
            }));
        self.session = Some(Arc::new(RunSession::new(rom, record.clone(), schedule)));
        self.announced = None;
        Ok(record)
    }

    fn reset_run(&mut self) -> Result<()> {
        let rom = match (&self.session, &self.last_snapshot) {
            (Some(session), _) => session.rom().clone(),
            (None, Some(snapshot)) if self.ctx.runs.exists(&snapshot.rom)? => snapshot.rom.clone(),
            _ => return Err(RuntimeError::NoActiveRun),
        };

        self.ctx.runs.delete(&rom)?;
        if let Some(session) = self.session.take() {
            session.clear();
        }
        self.announced = None;

        info!("Reset run for {}", rom);
        self.ctx
            .events
            .publish(Event::Schedule(ScheduleEvent::RunReset { rom }));
        Ok(())
    }

    async fn start_drain(&mut self) -> Result<()> {
        let session = self.session.clone().ok_or(RuntimeError::NoActiveRun)?;
        let device = self.ctx.devices.require().await?;
        let permit = self.ctx.protocol.begin(&session)?;
        self.spawn_drain(device, session, permit);
        Ok(())
    }

    fn spawn_drain(
        &mut self,
        device: Device,
        session: Arc<RunSession>,
        permit: crate::session::DrainPermit,
    ) {
        let protocol = self.ctx.protocol.clone();
        self.tasks.spawn(async move {
            // Outcome is logged and published by the protocol.
            let _ = protocol.drain(&device, &session, permit).await;
        });
    }

    async fn send_item(&mut self, item: String, reply: oneshot::Sender<Result<WriteRecord>>) {
        let device = match self.ctx.devices.require().await {
            Ok(device) => device,
            Err(e) => {
                let _ = reply.send(Err(e.into()));
                return;
            }
        };
        let protocol = self.ctx.protocol.clone();
        self.tasks.spawn(async move {
            let result = protocol
                .send_single(&device, &item)
                .await
                .map_err(RuntimeError::from);
            if reply.send(result).is_err() {
                debug!("SendItem reply channel closed (caller dropped)");
            }
        });
    }
}
