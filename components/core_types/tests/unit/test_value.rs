//! Unit tests for Value enum

use core_types::{JsError, SettleFn, Thenable, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug)]
struct Inert;

impl Thenable for Inert {
    fn subscribe(&self, _: SettleFn, _: SettleFn) -> Result<(), Value> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

mod equality_tests {
    use super::*;

    #[test]
    fn test_thenables_compare_by_identity() {
        let shared: Rc<dyn Thenable> = Rc::new(Inert);
        let a = Value::Thenable(shared.clone());
        let b = Value::Thenable(shared);
        let other = Value::Thenable(Rc::new(Inert));
        assert_eq!(a, b);
        assert_ne!(a, other);
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
    }

    #[test]
    fn test_smi_and_double_are_distinct() {
        assert_ne!(Value::Smi(1), Value::Double(1.0));
    }
}

mod conversion_tests {
    use super::*;

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(7), Value::Smi(7));
        assert_eq!(Value::from(2.5), Value::Double(2.5));
        assert_eq!(Value::from(String::from("a")), Value::from("a"));
        assert_eq!(Value::from(vec![Value::Null]), Value::Array(vec![Value::Null]));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Smi(3).as_smi(), Some(3));
        assert_eq!(Value::Double(3.0).as_smi(), None);
        assert!(Value::default().is_undefined());
        assert!(Value::Null.as_error().is_none());
        assert!(Value::from(JsError::cancellation(None)).is_cancellation());
    }
}

mod display_tests {
    use super::*;

    #[test]
    fn test_display_matches_string_conversion() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Double(1.5).to_string(), "1.5");
        assert_eq!(
            Value::Array(vec![Value::Smi(1), Value::Undefined, Value::from("b")]).to_string(),
            "1,,b"
        );
        assert_eq!(Value::Object(BTreeMap::new()).to_string(), "[object Object]");
    }

    #[test]
    fn test_display_of_errors() {
        let value = Value::from(JsError::type_error("nope"));
        assert_eq!(value.to_string(), "TypeError: nope");
    }
}
