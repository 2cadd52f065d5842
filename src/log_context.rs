use std::sync::Arc;

/// Logging handle passed to each component at construction.
///
/// Every record a component emits goes through the `log` facade with
/// `target: ctx.target()`, so a whole run can be filtered with `RUST_LOG=<target>=debug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    target: Arc<str>,
}

impl LogContext {
    pub fn new(target: impl Into<Arc<str>>) -> Self {
        LogContext {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// A child context, `"<parent>::<name>"`.
    pub fn child(&self, name: &str) -> Self {
        LogContext::new(format!("{}::{name}", self.target))
    }
}

impl Default for LogContext {
    fn default() -> Self {
        LogContext::new("pointfit")
    }
}

#[cfg(test)]
mod log_context_test {
    use super::*;

    #[test]
    fn test_child_target() {
        let ctx = LogContext::default().child("fit");
        assert_eq!(ctx.target(), "pointfit::fit");
    }
}
