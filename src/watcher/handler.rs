//! Callback type and control-flow signal for element handlers.

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::dom::Element;

/// What a handler wants the watcher to do after seeing a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flow {
    /// Keep watching and report later matches too.
    #[default]
    Continue,
    /// Stop this watcher permanently.
    Stop,
}

impl From<()> for Flow {
    fn from(_: ()) -> Self {
        Flow::Continue
    }
}

/// `true` stops the watcher, mirroring "return true to stop".
impl From<bool> for Flow {
    fn from(stop: bool) -> Self {
        if stop { Flow::Stop } else { Flow::Continue }
    }
}

impl<B> From<ControlFlow<B>> for Flow {
    fn from(flow: ControlFlow<B>) -> Self {
        match flow {
            ControlFlow::Continue(()) => Flow::Continue,
            ControlFlow::Break(_) => Flow::Stop,
        }
    }
}

/// Handler invoked with each matched element.
pub(crate) type ElementHandler = Arc<dyn Fn(&Element) -> Flow + Send + Sync>;

pub(crate) fn handler<F, R>(f: F) -> ElementHandler
where
    F: Fn(&Element) -> R + Send + Sync + 'static,
    R: Into<Flow>,
{
    Arc::new(move |element: &Element| f(element).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_conversions() {
        assert_eq!(Flow::from(()), Flow::Continue);
        assert_eq!(Flow::from(false), Flow::Continue);
        assert_eq!(Flow::from(true), Flow::Stop);
        assert_eq!(Flow::from(ControlFlow::<()>::Break(())), Flow::Stop);
        assert_eq!(Flow::from(ControlFlow::<u8>::Continue(())), Flow::Continue);
    }
}
