//! In-process device used by tests and the demo client.
//!
//! Models the fixed memory fields, a frame counter that can follow the
//! wall clock, and the game consuming a delivered item some time after it is
//! written. All time is `tokio::time`, so paused-clock tests stay exact.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use rip_core::{AckRecord, AddressSpace, EventIndex, MemoryField, is_delivery_mode};

use super::{DeviceClient, DeviceError, DeviceInfo, ReadRequest, Result};

/// Simulated device reachable through [`DeviceClient`].
pub struct SimulatedDevice {
    uri: String,
    state: Mutex<SimState>,
}

struct SimState {
    memory: HashMap<u32, u8>,
    present: bool,
    unresponsive: bool,
    fail_next: usize,
    fps: Option<f64>,
    clock_origin: Instant,
    base_frames: u32,
    consume_delay: Duration,
    pending_since: Option<Instant>,
    scripted_acks: VecDeque<[u8; 3]>,
    reads: usize,
    writes: usize,
    overwrites: usize,
    write_log: Vec<[u8; 4]>,
    received: Vec<AckRecord>,
}

impl SimState {
    fn read_region(&self, address: u32, size: usize) -> Vec<u8> {
        (0..size as u32)
            .map(|offset| self.memory.get(&(address + offset)).copied().unwrap_or(0))
            .collect()
    }

    fn write_region(&mut self, address: u32, data: &[u8]) {
        for (offset, byte) in data.iter().enumerate() {
            self.memory.insert(address + offset as u32, *byte);
        }
    }

    fn byte(&self, field: MemoryField) -> u8 {
        self.memory.get(&field.address()).copied().unwrap_or(0)
    }

    fn ack(&self) -> AckRecord {
        let bytes = self.read_region(MemoryField::MultiInfo.address(), 4);
        AckRecord::decode(&bytes).unwrap_or_default()
    }

    /// Brings the clock and item consumption up to `now`.
    fn settle(&mut self, now: Instant) {
        if let Some(fps) = self.fps {
            let elapsed = now.duration_since(self.clock_origin).as_secs_f64();
            let frames = self.base_frames as f64 + elapsed * fps;
            self.set_frames(frames.min(f64::from(0x00FF_FFFF)) as u32);
        }

        if let Some(since) = self.pending_since
            && now.duration_since(since) >= self.consume_delay
            && is_delivery_mode(self.byte(MemoryField::GameMode))
        {
            self.received.push(self.ack());
            self.memory.insert(MemoryField::MultiInfo.address() + 2, 0);
            self.pending_since = None;
        }
    }

    fn set_frames(&mut self, frames: u32) {
        let bytes = frames.to_le_bytes();
        self.write_region(MemoryField::TotalTime.address(), &bytes[..3]);
    }

    fn check_link(&mut self, operation: &'static str) -> Result<()> {
        if self.unresponsive {
            return Err(DeviceError::NoResponse { operation });
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(DeviceError::NoResponse { operation });
        }
        Ok(())
    }

    fn read(&mut self, address: u32, size: usize) -> Vec<u8> {
        self.reads += 1;
        if address == MemoryField::MultiInfo.address()
            && let Some(scripted) = self.scripted_acks.pop_front()
        {
            let mut bytes = scripted.to_vec();
            bytes.resize(size, 0);
            bytes.truncate(size);
            return bytes;
        }
        self.read_region(address, size)
    }
}

impl SimulatedDevice {
    pub const DEFAULT_URI: &'static str = "sim://device/0";

    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            state: Mutex::new(SimState {
                memory: HashMap::new(),
                present: true,
                unresponsive: false,
                fail_next: 0,
                fps: None,
                clock_origin: Instant::now(),
                base_frames: 0,
                consume_delay: Duration::from_millis(100),
                pending_since: None,
                scripted_acks: VecDeque::new(),
                reads: 0,
                writes: 0,
                overwrites: 0,
                write_log: Vec::new(),
                received: Vec::new(),
            }),
        }
    }

    /// Device already in play with a compatible ROM loaded.
    pub fn in_game(rom: &str) -> Self {
        let device = Self::new(Self::DEFAULT_URI);
        device.set_rom(rom);
        device.set_game_mode(0x07);
        device
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn set_game_mode(&self, mode: u8) {
        self.state().memory.insert(MemoryField::GameMode.address(), mode);
    }

    pub fn set_rom(&self, name: &str) {
        let mut bytes = name.as_bytes().to_vec();
        bytes.resize(MemoryField::RomName.size(), 0);
        self.state()
            .write_region(MemoryField::RomName.address(), &bytes);
    }

    /// Sets the frame counter; with a frame rate set, counting resumes from here.
    pub fn set_elapsed_frames(&self, frames: u32) {
        let mut state = self.state();
        state.base_frames = frames;
        state.clock_origin = Instant::now();
        state.set_frames(frames);
    }

    /// Advances the frame counter to follow the clock at `fps` frames per second.
    pub fn set_fps(&self, fps: Option<f64>) {
        let mut state = self.state();
        let now = Instant::now();
        state.settle(now);
        let bytes = state.read_region(MemoryField::TotalTime.address(), 3);
        state.base_frames = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]);
        state.clock_origin = now;
        state.fps = fps;
    }

    /// Overwrites the ack record, as if left over from an earlier session.
    pub fn set_ack(&self, index: u16, item_id: u8) {
        let [hi, lo] = EventIndex(index).to_bytes();
        let mut state = self.state();
        state.write_region(MemoryField::MultiInfo.address(), &[hi, lo, item_id, 0]);
        state.pending_since = (item_id != 0).then(Instant::now);
    }

    /// Time the game takes to consume a delivered item.
    pub fn set_consume_delay(&self, delay: Duration) {
        self.state().consume_delay = delay;
    }

    /// Replies for the next ack polls, ahead of real memory.
    pub fn script_ack_reads(&self, replies: impl IntoIterator<Item = [u8; 3]>) {
        self.state().scripted_acks.extend(replies);
    }

    /// Whether the device shows up in `list_devices`.
    pub fn set_present(&self, present: bool) {
        self.state().present = present;
    }

    pub fn set_unresponsive(&self, unresponsive: bool) {
        self.state().unresponsive = unresponsive;
    }

    /// Fails the next `count` reads or writes with no response.
    pub fn fail_next(&self, count: usize) {
        self.state().fail_next = count;
    }

    pub fn game_mode(&self) -> u8 {
        self.state().byte(MemoryField::GameMode)
    }

    pub fn ack(&self) -> AckRecord {
        let mut state = self.state();
        state.settle(Instant::now());
        state.ack()
    }

    pub fn read_count(&self) -> usize {
        self.state().reads
    }

    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Reads and writes issued so far.
    pub fn access_count(&self) -> usize {
        let state = self.state();
        state.reads + state.writes
    }

    /// Ack-field writes that landed while an item was still unconsumed.
    pub fn overwrite_count(&self) -> usize {
        self.state().overwrites
    }

    /// Every record written to the ack field, in order.
    pub fn writes(&self) -> Vec<[u8; 4]> {
        self.state().write_log.clone()
    }

    /// Records the game has consumed, in order.
    pub fn received(&self) -> Vec<AckRecord> {
        let mut state = self.state();
        state.settle(Instant::now());
        state.received.clone()
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URI)
    }
}

#[async_trait]
impl DeviceClient for SimulatedDevice {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let state = self.state();
        if state.unresponsive {
            return Err(DeviceError::NoResponse {
                operation: "list_devices",
            });
        }
        if !state.present {
            return Ok(Vec::new());
        }
        Ok(vec![DeviceInfo {
            uri: self.uri.clone(),
            display_name: "Simulated device".to_string(),
            kind: "simulated".to_string(),
        }])
    }

    async fn read_one(
        &self,
        uri: &str,
        address: u32,
        _space: AddressSpace,
        size: usize,
    ) -> Result<Vec<u8>> {
        let mut state = self.state();
        if uri != self.uri || !state.present {
            return Err(DeviceError::Transport(format!("unknown device {uri}")));
        }
        state.check_link("read_one")?;
        state.settle(Instant::now());
        Ok(state.read(address, size))
    }

    async fn read_many(&self, uri: &str, requests: &[ReadRequest]) -> Result<Vec<Vec<u8>>> {
        let mut state = self.state();
        if uri != self.uri || !state.present {
            return Err(DeviceError::Transport(format!("unknown device {uri}")));
        }
        state.check_link("read_many")?;
        state.settle(Instant::now());
        Ok(requests
            .iter()
            .map(|request| state.read(request.address, request.size))
            .collect())
    }

    async fn write_one(
        &self,
        uri: &str,
        address: u32,
        _space: AddressSpace,
        data: &[u8],
    ) -> Result<()> {
        let mut state = self.state();
        if uri != self.uri || !state.present {
            return Err(DeviceError::Transport(format!("unknown device {uri}")));
        }
        state.check_link("write_one")?;
        let now = Instant::now();
        state.settle(now);
        state.writes += 1;

        if address == MemoryField::MultiInfo.address() && data.len() == 4 {
            if !state.ack().is_idle() {
                state.overwrites += 1;
            }
            state.write_log.push([data[0], data[1], data[2], data[3]]);
            state.pending_since = (data[2] != 0).then_some(now);
        }
        state.write_region(address, data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn written_item_is_consumed_after_delay() {
        let device = SimulatedDevice::in_game("ORtest");
        device.set_consume_delay(Duration::from_millis(500));
        device
            .write_one(
                SimulatedDevice::DEFAULT_URI,
                MemoryField::MultiInfo.address(),
                AddressSpace::FxPakPro,
                &[0, 1, 0x0B, 0],
            )
            .await
            .unwrap();

        assert_eq!(device.ack().item_id, 0x0B);
        tokio::time::sleep(Duration::from_millis(500)).await;
        let ack = device.ack();
        assert!(ack.is_idle());
        assert_eq!(ack.index, EventIndex(1));
        assert_eq!(device.received().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn frame_clock_follows_time() {
        let device = SimulatedDevice::in_game("ORtest");
        device.set_fps(Some(60.0));
        tokio::time::sleep(Duration::from_secs(2)).await;

        let frames = device
            .read_one(
                SimulatedDevice::DEFAULT_URI,
                MemoryField::TotalTime.address(),
                AddressSpace::FxPakPro,
                3,
            )
            .await
            .unwrap();
        assert_eq!(u32::from_le_bytes([frames[0], frames[1], frames[2], 0]), 120);
    }

    #[tokio::test]
    async fn unresponsive_device_reports_no_response() {
        let device = SimulatedDevice::in_game("ORtest");
        device.set_unresponsive(true);
        let result = device
            .read_one(
                SimulatedDevice::DEFAULT_URI,
                MemoryField::GameMode.address(),
                AddressSpace::FxPakPro,
                1,
            )
            .await;
        assert!(matches!(result, Err(DeviceError::NoResponse { .. })));
    }
}
