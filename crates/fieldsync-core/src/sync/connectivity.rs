//! Edge detection over connectivity signals

/// Change between two consecutive samples of a boolean signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    CameUp,
    WentDown,
}

/// Tracks device connectivity and remote availability as last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityMonitor {
    network_online: bool,
    server_available: bool,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl ConnectivityMonitor {
    pub const fn new(network_online: bool, server_available: bool) -> Self {
        Self {
            network_online,
            server_available,
        }
    }

    pub const fn is_online(&self) -> bool {
        self.network_online
    }

    pub const fn is_server_available(&self) -> bool {
        self.server_available
    }

    pub fn observe_network(&mut self, online: bool) -> Transition {
        Self::observe(&mut self.network_online, online)
    }

    pub fn observe_server(&mut self, available: bool) -> Transition {
        Self::observe(&mut self.server_available, available)
    }

    fn observe(previous: &mut bool, current: bool) -> Transition {
        let transition = match (*previous, current) {
            (false, true) => Transition::CameUp,
            (true, false) => Transition::WentDown,
            _ => Transition::Unchanged,
        };
        *previous = current;
        transition
    }
}
