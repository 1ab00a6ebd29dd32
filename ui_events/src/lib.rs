//! # UI Events
//!
//! Page lifecycle and user-input events with explicit registration.
//!
//! ## Philosophy
//!
//! - **Events, not polling**: components register continuations against
//!   an event source and are invoked when the event fires
//! - **Synchronous dispatch**: handlers run to completion, in
//!   registration order, before `dispatch` returns; no hidden threads
//! - **Ready fires once**: the page becomes ready exactly once; late
//!   or repeated ready dispatches are ignored
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A keyboard/pointer input subsystem
//! - An async executor
//! - A cross-page message bus

use core::fmt;
use serde::{Deserialize, Serialize};

/// Identifier of an addressable page control
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlId(String);

impl ControlId {
    /// Creates a control identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ControlId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A page event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiEvent {
    /// The page's content is fully parsed; fired once
    Ready,
    /// A control was activated by the user
    Click(ControlId),
}

/// Explicit event source for one page
///
/// Components register continuations with [`UiEventSource::on_ready`]
/// and [`UiEventSource::on_click`]; the host environment calls
/// [`UiEventSource::dispatch`] when events occur.
#[derive(Default)]
pub struct UiEventSource {
    ready_handlers: Vec<Box<dyn FnMut()>>,
    click_handlers: Vec<Box<dyn FnMut(&ControlId)>>,
    ready_fired: bool,
}

impl UiEventSource {
    /// Creates an event source with no registered handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a continuation for the ready event
    pub fn on_ready(&mut self, handler: impl FnMut() + 'static) {
        self.ready_handlers.push(Box::new(handler));
    }

    /// Registers a continuation for click events
    ///
    /// Every click handler sees every click; handlers filter by
    /// control themselves.
    pub fn on_click(&mut self, handler: impl FnMut(&ControlId) + 'static) {
        self.click_handlers.push(Box::new(handler));
    }

    /// Dispatches an event to all matching handlers, in registration
    /// order
    ///
    /// A second `Ready` dispatch is a no-op.
    pub fn dispatch(&mut self, event: UiEvent) {
        match event {
            UiEvent::Ready => {
                if self.ready_fired {
                    return;
                }
                self.ready_fired = true;
                for handler in &mut self.ready_handlers {
                    handler();
                }
            }
            UiEvent::Click(control) => {
                for handler in &mut self.click_handlers {
                    handler(&control);
                }
            }
        }
    }

    /// Returns true if the ready event has fired
    pub fn is_ready(&self) -> bool {
        self.ready_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_control_id_round_trip() {
        let id = ControlId::new("loginButton");
        assert_eq!(id.as_str(), "loginButton");
        assert_eq!(format!("{}", id), "loginButton");
        assert_eq!(ControlId::from("loginButton"), id);
    }

    #[test]
    fn test_ready_handler_runs() {
        let fired = Rc::new(RefCell::new(false));
        let mut source = UiEventSource::new();

        let flag = Rc::clone(&fired);
        source.on_ready(move || *flag.borrow_mut() = true);

        assert!(!source.is_ready());
        source.dispatch(UiEvent::Ready);
        assert!(*fired.borrow());
        assert!(source.is_ready());
    }

    #[test]
    fn test_ready_fires_at_most_once() {
        let count = Rc::new(RefCell::new(0));
        let mut source = UiEventSource::new();

        let counter = Rc::clone(&count);
        source.on_ready(move || *counter.borrow_mut() += 1);

        source.dispatch(UiEvent::Ready);
        source.dispatch(UiEvent::Ready);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_ready_handlers_run_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut source = UiEventSource::new();

        for name in ["navbar", "profile", "typewriter"] {
            let log = Rc::clone(&order);
            source.on_ready(move || log.borrow_mut().push(name));
        }

        source.dispatch(UiEvent::Ready);
        assert_eq!(*order.borrow(), vec!["navbar", "profile", "typewriter"]);
    }

    #[test]
    fn test_click_routes_control_to_handlers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut source = UiEventSource::new();

        let log = Rc::clone(&seen);
        source.on_click(move |control| log.borrow_mut().push(control.clone()));

        source.dispatch(UiEvent::Click(ControlId::new("logoutButton")));
        source.dispatch(UiEvent::Click(ControlId::new("homeButton")));

        assert_eq!(
            *seen.borrow(),
            vec![ControlId::new("logoutButton"), ControlId::new("homeButton")]
        );
    }

    #[test]
    fn test_clicks_do_not_require_ready() {
        let count = Rc::new(RefCell::new(0));
        let mut source = UiEventSource::new();

        let counter = Rc::clone(&count);
        source.on_click(move |_| *counter.borrow_mut() += 1);

        source.dispatch(UiEvent::Click(ControlId::new("homeButton")));
        assert_eq!(*count.borrow(), 1);
    }
}
