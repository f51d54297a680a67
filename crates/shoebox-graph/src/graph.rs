//! Source graph: sound sources multiplexed onto contiguous spatializer lanes.
//!
//! The spatializer's internal source table is lane-indexed, so after every
//! removal all survivors are rewired to lanes `0..N-1` in their original
//! relative order, even when the removed source was the last one.

use glam::Vec3;
use shoebox_core::{SourceId, Spatializer};
use tracing::{debug, info, warn};

use crate::bus::{InputBus, Lane};
use crate::error::{Error, Result};
use crate::source::{Placement, SoundSource, SourceSpec};

/// Delay between a start request and the synchronized start of all players.
pub const PLAYBACK_START_DELAY: f64 = 0.25;

/// Captures the rendered output while playing.
pub trait Recorder: Send {
    fn start(&mut self) -> Result<()>;

    fn stop(&mut self);
}

/// Audio route change reported by the host audio session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChange {
    NewDeviceAvailable,
    OldDeviceUnavailable,
    Other,
}

pub struct SourceGraph {
    bus: Box<dyn InputBus>,
    sources: Vec<SoundSource>,
    last_id: u32,
    playing: bool,
    clip: usize,
    start_delay: f64,
    recorder: Option<Box<dyn Recorder>>,
    recording_enabled: bool,
    recording: bool,
}

impl SourceGraph {
    /// Take ownership of the bus and connect the silent placeholder.
    pub fn new(mut bus: Box<dyn InputBus>) -> Self {
        bus.connect_placeholder();
        Self {
            bus,
            sources: Vec::new(),
            last_id: 0,
            playing: false,
            clip: 0,
            start_delay: PLAYBACK_START_DELAY,
            recorder: None,
            recording_enabled: true,
            recording: false,
        }
    }

    pub fn with_start_delay(mut self, seconds: f64) -> Self {
        self.start_delay = seconds.max(0.0);
        self
    }

    pub fn set_recorder(&mut self, recorder: Box<dyn Recorder>) {
        self.recorder = Some(recorder);
    }

    /// Hand the recorder over, e.g. to a graph replacing this one.
    pub fn take_recorder(&mut self) -> Option<Box<dyn Recorder>> {
        if self.recording {
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.stop();
            }
            self.recording = false;
        }
        self.recorder.take()
    }

    pub fn set_recording_enabled(&mut self, enabled: bool) {
        self.recording_enabled = enabled;
    }

    /// Wire a new source to the next free lane and register it.
    pub fn load(&mut self, spec: SourceSpec, spatializer: &mut dyn Spatializer) -> SourceId {
        let lane = self.sources.len();
        if lane == 0 {
            self.bus.disconnect_placeholder();
        }

        let node = spec.producer.node();
        self.bus.attach(node);
        self.bus.connect(node, lane);

        self.last_id += 1;
        let id = SourceId(self.last_id);
        spatializer.add_source(id, spec.position);
        spatializer.set_source_min_distance_gain(id, spec.min_distance_gain);

        debug!("Connected source {} '{}' ({}) to lane {}", id, spec.name, node, lane);

        self.sources.push(SoundSource {
            id,
            lane,
            name: spec.name,
            position: spec.position,
            min_distance_gain: spec.min_distance_gain,
            producer: spec.producer,
            placement: Placement::new(),
        });
        id
    }

    /// Unregister and unwire a source, then renumber the survivors.
    pub fn remove(&mut self, id: SourceId, spatializer: &mut dyn Spatializer) -> Result<()> {
        let index = self.index_of(id).inspect_err(|e| {
            warn!("Rejected source removal: {}", e);
        })?;

        spatializer.remove_source(id);
        self.bus.disconnect_all();

        let mut removed = self.sources.remove(index);
        if self.playing {
            removed.producer.stop();
        }
        self.bus.detach(removed.producer.node());
        debug!("Disconnected and detached source {} '{}'", id, removed.name);
        drop(removed);

        for (lane, source) in self.sources.iter_mut().enumerate() {
            source.lane = lane;
            self.bus.connect(source.producer.node(), lane);
            spatializer.set_source_position(source.id, source.position);
        }

        if self.sources.is_empty() {
            self.bus.connect_placeholder();
            self.stop_playing();
        }
        Ok(())
    }

    /// Remove every source. Returns how many were removed.
    pub fn remove_all(&mut self, spatializer: &mut dyn Spatializer) -> usize {
        let ids: Vec<SourceId> = self.sources.iter().map(|s| s.id).collect();
        let mut removed = 0;
        for id in ids {
            if self.remove(id, spatializer).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Push every source position. No-op while stopped.
    pub fn update_all_positions(&self, spatializer: &mut dyn Spatializer) -> usize {
        if !self.playing {
            return 0;
        }
        for source in &self.sources {
            spatializer.set_source_position(source.id, source.position);
        }
        self.sources.len()
    }

    /// Set a source's position directly.
    pub fn set_position(&mut self, id: SourceId, position: Vec3) -> Result<()> {
        let index = self.index_of(id)?;
        self.sources[index].position = position;
        Ok(())
    }

    /// Move a source toward `target` as seen from `camera`.
    ///
    /// The result is clamped to 10 m from the camera and, with `smooth`, its
    /// distance is averaged over the last ten requests.
    pub fn move_source(
        &mut self,
        id: SourceId,
        target: Vec3,
        camera: Vec3,
        smooth: bool,
    ) -> Result<Vec3> {
        let index = self.index_of(id)?;
        let source = &mut self.sources[index];
        source.position = source.placement.place(target, camera, smooth);
        Ok(source.position)
    }

    /// End a drag gesture: forget the smoothing history.
    pub fn finish_move(&mut self, id: SourceId) -> Result<()> {
        let index = self.index_of(id)?;
        self.sources[index].placement.reset();
        Ok(())
    }

    pub fn rotate_source(&mut self, id: SourceId, radians: f32) -> Result<f32> {
        let index = self.index_of(id)?;
        let placement = &mut self.sources[index].placement;
        placement.set_rotation(radians);
        Ok(placement.rotation())
    }

    /// Choose the clip every source plays on the next start.
    pub fn select_clip(&mut self, clip: usize) -> Result<()> {
        let available = self
            .sources
            .iter()
            .map(|s| s.producer.clip_count())
            .min()
            .unwrap_or(usize::MAX);
        if clip >= available {
            return Err(Error::ClipOutOfRange { clip, available });
        }
        self.clip = clip;
        Ok(())
    }

    pub fn clip(&self) -> usize {
        self.clip
    }

    /// Start every source, synchronized `start_delay` after `now` (seconds).
    ///
    /// A recorder failure is logged and playback starts anyway. Returns
    /// `false` when already playing.
    pub fn start_playing(&mut self, now: f64) -> bool {
        if self.playing {
            return false;
        }

        if self.recording_enabled && !self.recording {
            if let Some(recorder) = self.recorder.as_mut() {
                match recorder.start() {
                    Ok(()) => {
                        self.recording = true;
                        info!("Started recording");
                    }
                    Err(e) => warn!("Recording did not start: {}", e),
                }
            }
        }

        let start_at = now + self.start_delay;
        for source in &mut self.sources {
            let count = source.producer.clip_count();
            let clip = if self.clip < count { self.clip } else { 0 };
            source.producer.play(clip, start_at);
        }
        self.playing = true;
        info!("Started playing {} sources at t={:.3}", self.sources.len(), start_at);
        true
    }

    /// Stop every source and any recording. Returns `false` when not playing.
    pub fn stop_playing(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        for source in &mut self.sources {
            source.producer.stop();
        }
        if self.recording {
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.stop();
            }
            self.recording = false;
            info!("Stopped recording");
        }
        self.playing = false;
        info!("Stopped playing");
        true
    }

    /// Start when stopped, stop when playing. Returns the new state.
    pub fn toggle_play(&mut self, now: f64) -> bool {
        if self.playing {
            self.stop_playing();
        } else {
            self.start_playing(now);
        }
        self.playing
    }

    /// Log an audio route change. Playback is left as it is.
    pub fn handle_route_change(&self, change: RouteChange) {
        match change {
            RouteChange::NewDeviceAvailable => info!("Audio device connected"),
            RouteChange::OldDeviceUnavailable => info!("Audio device disconnected"),
            RouteChange::Other => debug!("Audio route changed"),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &SoundSource> {
        self.sources.iter()
    }

    pub fn source(&self, id: SourceId) -> Result<&SoundSource> {
        self.index_of(id).map(|index| &self.sources[index])
    }

    pub fn lane_of(&self, id: SourceId) -> Result<Lane> {
        self.source(id).map(SoundSource::lane)
    }

    /// Lanes in use, in source order.
    pub fn lanes(&self) -> Vec<Lane> {
        self.sources.iter().map(|s| s.lane).collect()
    }

    fn index_of(&self, id: SourceId) -> Result<usize> {
        self.sources
            .iter()
            .position(|s| s.id == id)
            .ok_or(Error::UnknownSource(id))
    }
}
