/// ## Session settings

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Ceiling on nested program activations in one session.
    pub max_call_depth: usize,
    /// Activations refuse to start this close to the ceiling.
    pub depth_margin: usize,
    /// Copied onto programs created by the session.
    pub static_types: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_call_depth: 100,
            depth_margin: 4,
            static_types: true,
        }
    }
}

impl Config {
    /// Deepest call depth at which a new activation may still start.
    pub fn depth_limit(&self) -> usize {
        self.max_call_depth.saturating_sub(self.depth_margin)
    }
}
