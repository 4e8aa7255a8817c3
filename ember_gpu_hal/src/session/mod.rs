/// Session - owns the driver, the active device and every subsystem
///
/// One Session spans one device-initialization lifetime. It owns the
/// heap allocator, the resource manager, the shader store, the pipeline
/// cache, the command buffers and the submission engine outright, so
/// every resource is released deterministically when the session shuts
/// a device down or is dropped.
///
/// Diagnostics follow a poll model instead of callbacks: every failing
/// operation records the raw status and message in the last-error slot
/// and appends an event to a bounded queue the caller drains with
/// `poll_event`.

// Module declarations (further impl blocks live in sibling files)
mod resources;
mod frame;

pub use frame::Screenshot;

use std::collections::VecDeque;

use slotmap::SlotMap;

use crate::command::{CommandBuffer, CommandBufferId};
use crate::device::{DeviceInfo, GpuDevice, GpuDriver};
use crate::error::{GpuError, RawStatus, Result};
use crate::memory::{Heap, HeapAllocator};
use crate::pipeline::PipelineCache;
use crate::resource::ResourceManager;
use crate::shader::ShaderStore;
use crate::submit::SubmissionEngine;
use crate::{hal_error, hal_info};

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Enable extra validation in backends that support it
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Log verbosity: 0 = silent, 1 = basic, 2 = verbose, 3 = detailed
    pub debug_level: u32,
    /// Bounded capacity of the event queue; the oldest event is dropped
    /// when a new one would exceed it
    pub event_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Ember Application".to_string(),
            app_version: (1, 0, 0),
            debug_level: 1,
            event_queue_capacity: 64,
        }
    }
}

/// Event emitted by the session; drained via `Session::poll_event`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A device finished initialization
    DeviceInitialized { index: usize },
    /// The active device was shut down
    DeviceShutdown,
    /// A session operation failed; mirrors the last-error slot
    ErrorRaised { status: RawStatus, message: String },
    /// Work up to this fence value was observed complete
    SubmissionRetired { fence: u64 },
}

/// Everything scoped to one initialized device
pub(crate) struct ActiveDevice {
    pub(crate) backend: Box<dyn GpuDevice>,
    pub(crate) index: usize,
    pub(crate) info: DeviceInfo,
    pub(crate) allocator: HeapAllocator,
    pub(crate) resources: ResourceManager,
    pub(crate) shaders: ShaderStore,
    pub(crate) pipelines: PipelineCache,
    pub(crate) submission: SubmissionEngine,
    pub(crate) command_buffers: SlotMap<CommandBufferId, CommandBuffer>,
    /// Set after a submission failure; only a full shutdown +
    /// re-initialization clears it
    pub(crate) faulted: bool,
}

/// The session: device manager plus owner of every GPU subsystem
pub struct Session {
    driver: Box<dyn GpuDriver>,
    config: SessionConfig,
    pub(crate) device: Option<ActiveDevice>,
    last_error: Option<(RawStatus, String)>,
    events: VecDeque<SessionEvent>,
}

impl Session {
    /// Create a session over a driver with the default configuration
    pub fn new(driver: Box<dyn GpuDriver>) -> Self {
        Self::with_config(driver, SessionConfig::default())
    }

    /// Create a session over a driver
    ///
    /// # Arguments
    ///
    /// * `driver` - Vendor driver selected for this session
    /// * `config` - Session configuration
    pub fn with_config(driver: Box<dyn GpuDriver>, config: SessionConfig) -> Self {
        Self {
            driver,
            config,
            device: None,
            last_error: None,
            events: VecDeque::new(),
        }
    }

    /// The session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ===== DEVICE MANAGER =====

    /// Probe for devices.
    ///
    /// An empty result is not an error; order is stable per driver.
    pub fn enumerate_devices(&self) -> Vec<DeviceInfo> {
        self.driver.enumerate()
    }

    /// Initialize the device at `index`.
    ///
    /// Succeeding invalidates any previously active device and all of
    /// its resources.
    ///
    /// # Errors
    ///
    /// `DeviceNotFound` when `index` is out of range, `DeviceInitFailed`
    /// when the firmware/driver handshake fails.
    pub fn initialize_device(&mut self, index: usize) -> Result<()> {
        let result = self.initialize_device_inner(index);
        self.finish(result)
    }

    /// Initialize the most capable enumerated device.
    ///
    /// Ranking is architecture class first, VRAM size second.
    ///
    /// # Errors
    ///
    /// `DeviceNotFound` when nothing enumerates.
    pub fn initialize_best_device(&mut self) -> Result<()> {
        let devices = self.enumerate_devices();
        let best = devices
            .iter()
            .enumerate()
            .max_by_key(|(_, info)| info.selection_score())
            .map(|(index, _)| index);
        match best {
            Some(index) => self.initialize_device(index),
            None => {
                let result = Err(GpuError::DeviceNotFound);
                self.finish(result)
            }
        }
    }

    /// Shut down the active device, releasing every resource.
    ///
    /// Idempotent: calling it twice, or before any device was
    /// initialized, is a no-op success.
    pub fn shutdown_device(&mut self) {
        let Some(mut device) = self.device.take() else {
            return;
        };
        // Drain outstanding work before tearing anything down
        let _ = device.backend.wait_idle();
        let retired = device.submission.retire_all();
        for command_buffer in retired {
            if let Some(cb) = device.command_buffers.get_mut(command_buffer) {
                cb.mark_completed();
            }
        }
        device.command_buffers.clear();
        device.pipelines.clear(device.backend.as_mut());
        device.shaders.clear(device.backend.as_mut());
        device
            .resources
            .clear(device.backend.as_mut(), &mut device.allocator);
        if self.config.debug_level >= 1 {
            hal_info!("ember::Session", "Device {} shut down", device.index);
        }
        self.push_event(SessionEvent::DeviceShutdown);
    }

    /// Heap list of the active device with live availability numbers.
    ///
    /// # Errors
    ///
    /// `NotSupported` before any device is initialized.
    pub fn memory_heaps(&mut self) -> Result<Vec<Heap>> {
        let result = match self.device.as_ref() {
            Some(device) => Ok(device.allocator.heaps().to_vec()),
            None => Err(GpuError::NotSupported("no device initialized".to_string())),
        };
        self.finish(result)
    }

    /// Info of the active device, if one is initialized
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device.as_ref().map(|device| &device.info)
    }

    /// Whether a device is initialized
    pub fn is_initialized(&self) -> bool {
        self.device.is_some()
    }

    /// Whether the active device is faulted and needs re-initialization
    pub fn is_faulted(&self) -> bool {
        self.device.as_ref().is_some_and(|device| device.faulted)
    }

    // ===== DIAGNOSTICS =====

    /// Status and message of the most recent failing operation
    pub fn last_error(&self) -> Option<(RawStatus, &str)> {
        self.last_error
            .as_ref()
            .map(|(status, message)| (*status, message.as_str()))
    }

    /// Pop the oldest pending session event
    pub fn poll_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    // ===== INTERNAL =====

    fn initialize_device_inner(&mut self, index: usize) -> Result<()> {
        let devices = self.driver.enumerate();
        if index >= devices.len() {
            return Err(GpuError::DeviceNotFound);
        }
        // Open first: a failed handshake leaves the current device alive
        let backend = self.driver.open(index)?;
        // Succeeding invalidates the previous device and its resources
        self.shutdown_device();

        let info = backend.info().clone();
        let heaps = backend.memory_heaps();
        let min_alignment = backend.min_alignment();
        if self.config.debug_level >= 1 {
            hal_info!(
                "ember::Session",
                "Initialized device {}: {} {} ({} heaps)",
                index,
                info.vendor,
                info.device_name,
                heaps.len()
            );
        }
        self.device = Some(ActiveDevice {
            backend,
            index,
            info,
            allocator: HeapAllocator::new(heaps, min_alignment),
            resources: ResourceManager::new(),
            shaders: ShaderStore::new(),
            pipelines: PipelineCache::new(),
            submission: SubmissionEngine::new(),
            command_buffers: SlotMap::with_key(),
            faulted: false,
        });
        self.push_event(SessionEvent::DeviceInitialized { index });
        Ok(())
    }

    /// Active device accessor for GPU operations.
    ///
    /// Fails `NotSupported` before initialization and `DeviceError`
    /// while the device is faulted.
    pub(crate) fn device_mut(&mut self) -> Result<&mut ActiveDevice> {
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| GpuError::NotSupported("no device initialized".to_string()))?;
        if device.faulted {
            return Err(GpuError::DeviceError(
                "device is faulted; shut down and re-initialize".to_string(),
            ));
        }
        Ok(device)
    }

    /// Record a failing result in the last-error slot and event queue.
    ///
    /// Pure observation: control flow and the returned error are
    /// untouched.
    pub(crate) fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            let status = err.status();
            let message = err.to_string();
            if self.config.debug_level >= 1 {
                hal_error!("ember::Session", "{}", message);
            }
            self.last_error = Some((status, message.clone()));
            self.push_event(SessionEvent::ErrorRaised { status, message });
        }
        result
    }

    pub(crate) fn push_event(&mut self, event: SessionEvent) {
        if self.config.event_queue_capacity == 0 {
            return;
        }
        while self.events.len() >= self.config.event_queue_capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown_device();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
