use crate::classify::ExtensionSet;

/// 100 MB, counted in decimal megabytes.
pub const DEFAULT_SIZE_LIMIT: u64 = 100 * 1_000_000;
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 1 << 30;
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 256 << 20;

/// Rules applied to an upload before it touches the disk.
#[derive(Clone, Debug)]
pub struct IntakePolicy {
    pub size_limit: u64,
    pub allowed_extensions: ExtensionSet,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
            allowed_extensions: ExtensionSet::default(),
        }
    }
}

impl IntakePolicy {
    pub fn size_limit(mut self, bytes: u64) -> Self {
        self.size_limit = bytes;
        self
    }

    pub fn allowed_extensions(mut self, extensions: ExtensionSet) -> Self {
        self.allowed_extensions = extensions;
        self
    }
}

/// Decompression budget for extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractOptions {
    pub max_total_bytes: u64,
    pub max_entry_bytes: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }
}

impl ExtractOptions {
    pub fn max_total_bytes(mut self, bytes: u64) -> Self {
        self.max_total_bytes = bytes;
        self
    }

    pub fn max_entry_bytes(mut self, bytes: u64) -> Self {
        self.max_entry_bytes = bytes;
        self
    }
}
