/// Runtime observations the address book needs from the host platform.
pub trait Platform {
    /// Whether the node currently believes it has network connectivity.
    ///
    /// Browser-hosted nodes read this from the runtime; native nodes are
    /// effectively always online.
    fn is_online(&self) -> bool;
}

/// Platform for environments without a connectivity signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOnline;

impl Platform for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}
