use std::fmt;

/// Represents the device a buffer is bound to, and therefore which layer
/// entry point (`forward_cpu` or `forward_gpu`) the host dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Default)]
pub enum StorageDevice {
    /// Data is stored in main system memory (RAM).
    /// This is the default device.
    #[default]
    CPU,
    /// Data is requested on a GPU.
    ///
    /// **Note:** no accelerated kernels exist; layers run their CPU path for
    /// GPU-bound buffers and log a warning.
    GPU,
}

impl fmt::Display for StorageDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageDevice::CPU => write!(f, "cpu"),
            StorageDevice::GPU => write!(f, "gpu"),
        }
    }
}
