use crate::codec;
use crate::error::Result;
use crate::event::{self, Event};
use crate::mask::Mask;
use crate::schema::base_table;
use crate::serialization::{ArgSerializer, ArgValue};
use bytes::Bytes;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

// Parameter slots carry no type tag. Narrow writes occupy the low bits and
// clear the rest; both sides must agree on the interpretation per slot.

pub fn slot_from_u32(value: u32) -> u64 {
    value as u64
}

pub fn slot_to_u32(slot: u64) -> u32 {
    slot as u32
}

pub fn slot_from_f32(value: f32) -> u64 {
    value.to_bits() as u64
}

pub fn slot_to_f32(slot: u64) -> f32 {
    f32::from_bits(slot as u32)
}

pub fn slot_from_f64(value: f64) -> u64 {
    value.to_bits()
}

pub fn slot_to_f64(slot: u64) -> f64 {
    f64::from_bits(slot)
}

/// Replicated state of one entity.
///
/// Owned by a single update task; clone it to freeze a baseline for a later
/// [`Snapshot::delta`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(skip)]
    dirty: bool,
    #[serde(skip)]
    modify: bool,
    pub(crate) timestamp: u32,
    pub(crate) position: Vec3,
    pub(crate) rotation: Vec3,
    pub(crate) param1: u64,
    pub(crate) param2: u64,
    pub(crate) events: Vec<u8>,
}

/// Any entity type that embeds a [`Snapshot`] and can be driven by a
/// [`FieldTable`](crate::schema::FieldTable).
pub trait ReplicatedState {
    fn snapshot(&self) -> &Snapshot;
    fn snapshot_mut(&mut self) -> &mut Snapshot;
}

impl ReplicatedState for Snapshot {
    fn snapshot(&self) -> &Snapshot {
        self
    }

    fn snapshot_mut(&mut self) -> &mut Snapshot {
        self
    }
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.set_modify(true);
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.set_modify(true);
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: u32) {
        self.timestamp = timestamp;
        self.set_modify(true);
    }

    pub fn param1_u64(&self) -> u64 {
        self.param1
    }

    pub fn set_param1_u64(&mut self, value: u64) {
        self.param1 = value;
        self.set_modify(true);
    }

    pub fn param1_u32(&self) -> u32 {
        slot_to_u32(self.param1)
    }

    pub fn set_param1_u32(&mut self, value: u32) {
        self.set_param1_u64(slot_from_u32(value));
    }

    pub fn param1_f32(&self) -> f32 {
        slot_to_f32(self.param1)
    }

    pub fn set_param1_f32(&mut self, value: f32) {
        self.set_param1_u64(slot_from_f32(value));
    }

    pub fn param1_f64(&self) -> f64 {
        slot_to_f64(self.param1)
    }

    pub fn set_param1_f64(&mut self, value: f64) {
        self.set_param1_u64(slot_from_f64(value));
    }

    pub fn param2_u64(&self) -> u64 {
        self.param2
    }

    pub fn set_param2_u64(&mut self, value: u64) {
        self.param2 = value;
        self.set_modify(true);
    }

    pub fn param2_u32(&self) -> u32 {
        slot_to_u32(self.param2)
    }

    pub fn set_param2_u32(&mut self, value: u32) {
        self.set_param2_u64(slot_from_u32(value));
    }

    pub fn param2_f32(&self) -> f32 {
        slot_to_f32(self.param2)
    }

    pub fn set_param2_f32(&mut self, value: f32) {
        self.set_param2_u64(slot_from_f32(value));
    }

    pub fn param2_f64(&self) -> f64 {
        slot_to_f64(self.param2)
    }

    pub fn set_param2_f64(&mut self, value: f64) {
        self.set_param2_u64(slot_from_f64(value));
    }

    /// Raw event blob; empty when no event is pending.
    pub fn events(&self) -> &[u8] {
        &self.events
    }

    pub fn set_events(&mut self, events: Vec<u8>) {
        self.events = events;
        self.set_modify(true);
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn clear_events(&mut self) {
        self.set_events(Vec::new());
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Setting the modify flag also marks the state dirty. Clearing dirty
    /// afterwards leaves modify set.
    pub fn set_modify(&mut self, modify: bool) {
        self.modify = modify;
        if modify {
            self.dirty = true;
        }
    }

    pub fn is_modify(&self) -> bool {
        self.modify
    }

    /// Overwrites the replicated fields of `other`. Flags on `other` are kept.
    pub fn copy_to(&self, other: &mut Snapshot) {
        other.timestamp = self.timestamp;
        other.position = self.position;
        other.rotation = self.rotation;
        other.param1 = self.param1;
        other.param2 = self.param2;
        other.events.clone_from(&self.events);
    }

    /// Full-state message: `[mask][every base field]`.
    pub fn marshal(&self) -> Result<Bytes> {
        codec::encode_full(base_table(), self)
    }

    /// Compares `self` (old) against `new`, returning `[mask][payload]` and
    /// whether any field differed.
    pub fn delta(&self, new: &Snapshot) -> Result<(Bytes, bool)> {
        codec::encode_delta(base_table(), self, new)
    }

    /// Applies a `[mask][payload]` message produced by [`Snapshot::marshal`]
    /// or [`Snapshot::delta`].
    pub fn combine(&mut self, data: &[u8]) -> Result<Mask> {
        codec::combine(base_table(), self, data)
    }

    pub fn combine_masked(&mut self, mask: Mask, payload: &[u8]) -> Result<()> {
        codec::combine_masked(base_table(), self, mask, payload)
    }

    pub fn marshal_event(&mut self, name: &str, args: &[ArgValue]) -> Result<()> {
        self.marshal_event_with(&ArgSerializer::default(), name, args)
    }

    pub fn marshal_event_with(
        &mut self,
        serializer: &ArgSerializer,
        name: &str,
        args: &[ArgValue],
    ) -> Result<()> {
        let blob = event::encode_event(serializer, name, args)?;
        self.set_events(blob);
        Ok(())
    }

    pub fn unmarshal_event(&self) -> Result<Event> {
        self.unmarshal_event_with(&ArgSerializer::default())
    }

    pub fn unmarshal_event_with(&self, serializer: &ArgSerializer) -> Result<Event> {
        event::decode_event(serializer, &self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_snapshot_is_clean() {
        let state = Snapshot::new();
        assert!(!state.is_dirty());
        assert!(!state.is_modify());
        assert_eq!(state.position(), Vec3::ZERO);
        assert_eq!(state.param1_u64(), 0);
        assert!(!state.has_events());
    }

    #[test]
    fn test_modify_dirty_asymmetry() {
        let mut state = Snapshot::new();

        state.set_modify(true);
        assert!(state.is_dirty());

        state.set_dirty(false);
        assert!(state.is_modify());
        assert!(!state.is_dirty());

        state.set_modify(false);
        assert!(!state.is_modify());
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_setters_mark_modified() {
        let mut state = Snapshot::new();
        state.set_position(Vec3::new(1.0, 2.0, 3.0));

        assert!(state.is_modify());
        assert!(state.is_dirty());
        assert_eq!(state.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_param_reinterpretation() {
        let mut state = Snapshot::new();

        state.set_param1_u64(u64::MAX);
        state.set_param1_u32(0x1234_5678);
        assert_eq!(state.param1_u64(), 0x1234_5678);

        state.set_param1_f32(1.5);
        assert_eq!(state.param1_u64(), 1.5f32.to_bits() as u64);
        assert_eq!(state.param1_f32(), 1.5);

        state.set_param2_f64(-3.25);
        assert_eq!(state.param2_f64(), -3.25);
        assert_eq!(state.param2_u64(), (-3.25f64).to_bits());

        // Narrow reads only see the low 32 bits.
        state.set_param2_u64(0xFFFF_FFFF_0000_0001);
        assert_eq!(state.param2_u32(), 1);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut state = Snapshot::new();
        state.set_events(vec![1, 2, 3]);

        let mut baseline = state.clone();
        baseline.set_events(vec![9]);

        assert_eq!(state.events(), &[1, 2, 3]);
        assert_eq!(baseline.events(), &[9]);
    }

    #[test]
    fn test_copy_to_keeps_target_flags() {
        let mut source = Snapshot::new();
        source.set_position(Vec3::new(4.0, 5.0, 6.0));
        source.set_param2_u32(77);
        source.set_events(vec![42]);

        let mut target = Snapshot::new();
        source.copy_to(&mut target);

        assert_eq!(target.position(), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(target.param2_u32(), 77);
        assert_eq!(target.events(), &[42]);
        assert!(!target.is_dirty());
        assert!(!target.is_modify());
    }

    #[test]
    fn test_marshal_then_combine() {
        let mut state = Snapshot::new();
        state.set_position(Vec3::new(1.0, -2.0, 3.5));
        state.set_rotation(Vec3::new(0.0, 90.0, 0.0));
        state.set_param1_u64(0xAABB_CCDD_EEFF_0011);
        state.set_param2_f32(0.25);
        state.set_events(vec![7, 8, 9]);

        let data = state.marshal().unwrap();

        let mut remote = Snapshot::new();
        let mask = remote.combine(&data).unwrap();

        assert_eq!(mask.count(), 9);
        assert_eq!(remote.position(), state.position());
        assert_eq!(remote.rotation(), state.rotation());
        assert_eq!(remote.param1_u64(), state.param1_u64());
        assert_eq!(remote.param2_f32(), 0.25);
        assert_eq!(remote.events(), state.events());
        assert!(remote.is_dirty());
        assert!(!remote.is_modify());
    }

    #[test]
    fn test_delta_of_clone_is_empty() {
        let mut state = Snapshot::new();
        state.set_position(Vec3::new(10.0, 20.0, 30.0));
        state.set_events(vec![1]);

        let (data, changed) = state.delta(&state.clone()).unwrap();

        assert!(!changed);
        assert_eq!(&data[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_event_helpers() {
        let mut state = Snapshot::new();
        state
            .marshal_event("spawn", &[ArgValue::from(1), ArgValue::from("npc")])
            .unwrap();
        assert!(state.is_modify());

        let event = state.unmarshal_event().unwrap();
        assert_eq!(event.name, "spawn");
        assert_eq!(event.args, vec![ArgValue::Int(1), ArgValue::Str("npc".to_string())]);
    }
}
