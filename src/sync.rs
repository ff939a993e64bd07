use crate::codec;
use crate::error::Result;
use crate::mask::Mask;
use crate::schema::FieldTable;
use crate::snapshot::ReplicatedState;
use bytes::Bytes;

/// Tracker settings.
///
/// The dirty flag lives on the entity and is shared by every tracker watching
/// it. With several observers leave `clear_dirty_on_send` off and clear the
/// flag once all trackers have run; otherwise the first tracker hides the
/// change from the rest when `skip_clean` is on.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Send a full state every N updates; `None` sends full state only on
    /// first contact and after a reset.
    pub full_sync_interval: Option<u32>,
    /// Skip the comparison entirely while the state is not dirty.
    pub skip_clean: bool,
    /// Clear the dirty flag once an update has been produced. Only safe with
    /// a single tracker per entity.
    pub clear_dirty_on_send: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            full_sync_interval: None,
            skip_clean: false,
            clear_dirty_on_send: false,
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_full_sync_interval(mut self, interval: u32) -> Self {
        self.full_sync_interval = Some(interval.max(1));
        self
    }

    pub fn with_skip_clean(mut self, enabled: bool) -> Self {
        self.skip_clean = enabled;
        self
    }

    pub fn with_clear_dirty_on_send(mut self, enabled: bool) -> Self {
        self.clear_dirty_on_send = enabled;
        self
    }
}

/// Encoded update for one observer. Both variants carry `[mask][payload]`.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Full(Bytes),
    Delta(Bytes),
}

impl StateUpdate {
    pub fn data(&self) -> &Bytes {
        match self {
            StateUpdate::Full(data) | StateUpdate::Delta(data) => data,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, StateUpdate::Full(_))
    }

    /// Receiver side: applies the update onto the local proxy state.
    pub fn apply<S: ReplicatedState>(&self, table: &FieldTable<S>, state: &mut S) -> Result<Mask> {
        codec::combine(table, state, self.data())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    pub full_count: u64,
    pub delta_count: u64,
    pub skipped_count: u64,
    pub bytes_sent: u64,
}

/// Remembers the last state sent to one observer and turns the current
/// state into full or delta updates against it. Changes are found by
/// comparing against this tracker's own baseline.
pub struct BaselineTracker<S> {
    baseline: Option<S>,
    config: SyncConfig,
    updates_since_full: u32,
    stats: SyncStats,
}

impl<S: ReplicatedState + Clone> BaselineTracker<S> {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            baseline: None,
            config,
            updates_since_full: 0,
            stats: SyncStats::default(),
        }
    }

    /// Produces the next update, or `None` when nothing changed.
    pub fn next_update(&mut self, table: &FieldTable<S>, current: &mut S) -> Result<Option<StateUpdate>> {
        let delta = match &self.baseline {
            Some(baseline) if !self.full_sync_due() => {
                if self.config.skip_clean && !current.snapshot().is_dirty() {
                    self.stats.skipped_count += 1;
                    return Ok(None);
                }

                let (data, changed) = codec::encode_delta(table, baseline, current)?;
                if !changed {
                    self.stats.skipped_count += 1;
                    self.clear_dirty(current);
                    return Ok(None);
                }
                Some(data)
            }
            _ => None,
        };

        let update = match delta {
            Some(data) => {
                self.updates_since_full += 1;
                self.stats.delta_count += 1;
                StateUpdate::Delta(data)
            }
            None => self.full_update(table, current)?,
        };

        self.stats.bytes_sent += update.data().len() as u64;
        self.baseline = Some(current.clone());
        self.clear_dirty(current);

        Ok(Some(update))
    }

    fn full_update(&mut self, table: &FieldTable<S>, current: &S) -> Result<StateUpdate> {
        let data = codec::encode_full(table, current)?;
        self.updates_since_full = 0;
        self.stats.full_count += 1;
        Ok(StateUpdate::Full(data))
    }

    fn full_sync_due(&self) -> bool {
        match self.config.full_sync_interval {
            Some(interval) => self.updates_since_full + 1 >= interval,
            None => false,
        }
    }

    fn clear_dirty(&self, current: &mut S) {
        if self.config.clear_dirty_on_send {
            current.snapshot_mut().set_dirty(false);
        }
    }

    /// Forgets the baseline so the next update is a full state, e.g. for a
    /// newly interested observer.
    pub fn reset(&mut self) {
        self.baseline = None;
        self.updates_since_full = 0;
    }

    pub fn baseline(&self) -> Option<&S> {
        self.baseline.as_ref()
    }

    pub fn get_stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn get_config(&self) -> &SyncConfig {
        &self.config
    }
}

impl<S: ReplicatedState + Clone> Default for BaselineTracker<S> {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}
