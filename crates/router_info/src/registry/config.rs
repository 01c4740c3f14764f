/// Configuration for the router registry.
#[derive(Debug, Clone)]
pub struct RouterRegistryConfig {
    /// Remember the most recently resolved entry so repeated lookups of the
    /// same router skip the table lookup.
    pub access_hint: bool,
}

impl Default for RouterRegistryConfig {
    fn default() -> Self {
        Self { access_hint: true }
    }
}

impl RouterRegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the last-accessed entry hint.
    pub fn with_access_hint(mut self, enabled: bool) -> Self {
        self.access_hint = enabled;
        self
    }
}
