//! Synchronization configuration

/// Default maximum size of a single component message
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Tunables for change detection cost
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceParameters {
    /// Poll material property values for value-only changes
    pub check_material_properties: bool,
    /// Ticks between property polls (1 = every tick, 0 = never)
    pub property_poll_interval: u32,
    /// Float components closer than this are considered unchanged
    pub float_tolerance: f32,
}

impl Default for PerformanceParameters {
    fn default() -> Self {
        PerformanceParameters {
            check_material_properties: true,
            property_poll_interval: 1,
            float_tolerance: 0.0,
        }
    }
}

impl PerformanceParameters {
    pub fn with_material_properties(mut self, enabled: bool) -> Self {
        self.check_material_properties = enabled;
        self
    }

    pub fn with_property_poll_interval(mut self, ticks: u32) -> Self {
        self.property_poll_interval = ticks;
        self
    }

    pub fn with_float_tolerance(mut self, tolerance: f32) -> Self {
        self.float_tolerance = tolerance.max(0.0);
        self
    }

    /// Whether property values should be polled on the given poll count
    pub fn should_poll_properties(&self, poll: u64) -> bool {
        self.check_material_properties
            && self.property_poll_interval != 0
            && poll % self.property_poll_interval as u64 == 0
    }
}

/// Synchronization manager configuration
#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    pub performance: PerformanceParameters,
    /// Messages larger than this are rejected before sending
    pub max_message_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            performance: PerformanceParameters::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl SyncConfig {
    pub fn with_performance(mut self, performance: PerformanceParameters) -> Self {
        self.performance = performance;
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }
}
