use std::default::Default;

/// Contains Config properties which will be used by a `MutationDispatcher`
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// A warning is logged each time the pending queue grows past a multiple
    /// of this many mutations. Zero disables the warning.
    pub backlog_warning_threshold: usize,
    /// Whether a mutation that panics is contained and logged instead of
    /// unwinding through the authority thread.
    pub catch_panics: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            backlog_warning_threshold: 1024,
            catch_panics: true,
        }
    }
}
