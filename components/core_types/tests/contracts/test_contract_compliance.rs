//! Contract compliance tests for core_types
//!
//! These tests pin down the shape of the shared types that the promise
//! engine and embedders build on.

use core_types::{ErrorKind, JsError, SettleFn, StackFrame, Thenable, Value};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Settles every subscriber immediately with a fixed value.
#[derive(Debug)]
struct Ready(Value);

impl Thenable for Ready {
    fn subscribe(&self, on_fulfilled: SettleFn, _on_rejected: SettleFn) -> Result<(), Value> {
        on_fulfilled(self.0.clone());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

mod value_contract_tests {
    use super::*;

    #[test]
    fn test_value_is_clone_and_debug() {
        let value = Value::Array(vec![Value::Smi(1), Value::from("two")]);
        let copy = value.clone();
        assert_eq!(value, copy);
        assert!(!format!("{:?}", copy).is_empty());
    }

    #[test]
    fn test_value_carries_errors() {
        let value = Value::from(JsError::new(ErrorKind::Error, "x"));
        assert!(matches!(value, Value::Error(ref e) if e.kind == ErrorKind::Error));
    }
}

mod thenable_contract_tests {
    use super::*;

    #[test]
    fn test_thenable_subscribe_delivers_value() {
        let thenable: Rc<dyn Thenable> = Rc::new(Ready(Value::Smi(5)));
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        let result = thenable.subscribe(
            Rc::new(move |v: Value| *s.borrow_mut() = Some(v)),
            Rc::new(|_: Value| {}),
        );
        assert!(result.is_ok());
        assert_eq!(*seen.borrow(), Some(Value::Smi(5)));
    }

    #[test]
    fn test_thenable_can_be_downcast() {
        let thenable: Rc<dyn Thenable> = Rc::new(Ready(Value::Null));
        assert!(thenable.as_any().downcast_ref::<Ready>().is_some());
    }
}

mod error_contract_tests {
    use super::*;

    #[test]
    fn test_error_stack_is_extendable() {
        let mut error = JsError::type_error("t");
        error.stack.push(StackFrame::annotation("frame"));
        assert_eq!(error.stack.len(), 1);
    }
}
