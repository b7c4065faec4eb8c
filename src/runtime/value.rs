//! argument values
//!
//! everything generated code can pass as a field argument, directive
//! argument, or input object property converts into an [`InputValue`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// date or time value, encoded as quoted text
#[derive(Debug, Clone, PartialEq)]
pub enum Temporal {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// an argument value tree
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// numeric text emitted verbatim
    Decimal(String),
    String(String),
    /// enum member by wire name
    Enum(String),
    Temporal(Temporal),
    /// identifier emitted as quoted text
    Id(String),
    List(Vec<InputValue>),
    /// input object properties in declared order
    Object(Vec<Argument>),
    Variable(Variable),
}

impl InputValue {
    pub fn is_null(&self) -> bool {
        matches!(self, InputValue::Null)
    }
}

/// named value, used for arguments and input object properties
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: InputValue,
    /// chrono format string for temporal values
    pub format_mask: Option<String>,
}

impl Argument {
    pub fn new<V: ToInputValue + ?Sized>(name: impl Into<String>, value: &V) -> Self {
        Self {
            name: name.into(),
            value: value.to_input_value(),
            format_mask: None,
        }
    }

    pub fn with_format_mask(mut self, mask: impl Into<String>) -> Self {
        self.format_mask = Some(mask.into());
        self
    }
}

/// a `$variable` reference declared in the operation signature
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// graphql type literal, e.g. `ID!` or `[String]`
    pub graphql_type: String,
    pub default_value: Option<Box<InputValue>>,
}

impl Variable {
    pub fn new(name: impl Into<String>, graphql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graphql_type: graphql_type.into(),
            default_value: None,
        }
    }

    pub fn with_default<V: ToInputValue + ?Sized>(mut self, value: &V) -> Self {
        self.default_value = Some(Box::new(value.to_input_value()));
        self
    }
}

/// a literal value or a variable reference
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter<T> {
    Value(T),
    Variable(Variable),
}

impl<T> From<T> for Parameter<T> {
    fn from(value: T) -> Self {
        Parameter::Value(value)
    }
}

impl<T> Parameter<T> {
    pub fn variable(variable: Variable) -> Self {
        Parameter::Variable(variable)
    }
}

/// conversion into an argument value
pub trait ToInputValue {
    fn to_input_value(&self) -> InputValue;
}

/// generated input types list their set properties in declared order
pub trait InputObject {
    fn properties(&self) -> Vec<Argument>;
}

impl<T: ToInputValue> ToInputValue for Parameter<T> {
    fn to_input_value(&self) -> InputValue {
        match self {
            Parameter::Value(value) => value.to_input_value(),
            Parameter::Variable(variable) => InputValue::Variable(variable.clone()),
        }
    }
}

impl ToInputValue for InputValue {
    fn to_input_value(&self) -> InputValue {
        self.clone()
    }
}

impl ToInputValue for Variable {
    fn to_input_value(&self) -> InputValue {
        InputValue::Variable(self.clone())
    }
}

impl ToInputValue for bool {
    fn to_input_value(&self) -> InputValue {
        InputValue::Boolean(*self)
    }
}

macro_rules! signed {
    ($($ty:ty),*) => {$(
        impl ToInputValue for $ty {
            fn to_input_value(&self) -> InputValue {
                InputValue::Int(i64::from(*self))
            }
        }
    )*};
}

macro_rules! unsigned {
    ($($ty:ty),*) => {$(
        impl ToInputValue for $ty {
            fn to_input_value(&self) -> InputValue {
                InputValue::UInt(u64::from(*self))
            }
        }
    )*};
}

signed!(i8, i16, i32, i64);
unsigned!(u8, u16, u32, u64);

impl ToInputValue for f64 {
    fn to_input_value(&self) -> InputValue {
        InputValue::Float(*self)
    }
}

impl ToInputValue for f32 {
    fn to_input_value(&self) -> InputValue {
        if !self.is_finite() {
            return InputValue::Null;
        }
        // shortest text of the f32 itself, not of its widened f64
        InputValue::Decimal(format!("{self:?}"))
    }
}

impl ToInputValue for Decimal {
    fn to_input_value(&self) -> InputValue {
        InputValue::Decimal(self.to_string())
    }
}

impl ToInputValue for str {
    fn to_input_value(&self) -> InputValue {
        InputValue::String(self.to_string())
    }
}

impl ToInputValue for String {
    fn to_input_value(&self) -> InputValue {
        InputValue::String(self.clone())
    }
}

impl ToInputValue for Uuid {
    fn to_input_value(&self) -> InputValue {
        InputValue::Id(self.to_string())
    }
}

impl ToInputValue for DateTime<FixedOffset> {
    fn to_input_value(&self) -> InputValue {
        InputValue::Temporal(Temporal::DateTime(*self))
    }
}

impl ToInputValue for NaiveDate {
    fn to_input_value(&self) -> InputValue {
        InputValue::Temporal(Temporal::Date(*self))
    }
}

impl ToInputValue for NaiveTime {
    fn to_input_value(&self) -> InputValue {
        InputValue::Temporal(Temporal::Time(*self))
    }
}

impl ToInputValue for serde_json::Value {
    fn to_input_value(&self) -> InputValue {
        match self {
            serde_json::Value::Null => InputValue::Null,
            serde_json::Value::Bool(value) => InputValue::Boolean(*value),
            serde_json::Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    InputValue::Int(value)
                } else if let Some(value) = number.as_u64() {
                    InputValue::UInt(value)
                } else {
                    InputValue::Decimal(number.to_string())
                }
            }
            serde_json::Value::String(value) => InputValue::String(value.clone()),
            serde_json::Value::Array(items) => {
                InputValue::List(items.iter().map(ToInputValue::to_input_value).collect())
            }
            serde_json::Value::Object(map) => InputValue::Object(
                map.iter()
                    .map(|(name, value)| Argument::new(name.as_str(), value))
                    .collect(),
            ),
        }
    }
}

impl<T: ToInputValue> ToInputValue for Option<T> {
    fn to_input_value(&self) -> InputValue {
        match self {
            Some(value) => value.to_input_value(),
            None => InputValue::Null,
        }
    }
}

impl<T: ToInputValue> ToInputValue for Vec<T> {
    fn to_input_value(&self) -> InputValue {
        self.as_slice().to_input_value()
    }
}

impl<T: ToInputValue> ToInputValue for [T] {
    fn to_input_value(&self) -> InputValue {
        InputValue::List(self.iter().map(ToInputValue::to_input_value).collect())
    }
}

impl<T: ToInputValue + ?Sized> ToInputValue for Box<T> {
    fn to_input_value(&self) -> InputValue {
        (**self).to_input_value()
    }
}

impl<T: ToInputValue + ?Sized> ToInputValue for &T {
    fn to_input_value(&self) -> InputValue {
        (**self).to_input_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(7i32.to_input_value(), InputValue::Int(7));
        assert_eq!(7u16.to_input_value(), InputValue::UInt(7));
        assert_eq!(true.to_input_value(), InputValue::Boolean(true));
        assert_eq!(0.5f32.to_input_value(), InputValue::Decimal("0.5".to_string()));
        assert_eq!("x".to_input_value(), InputValue::String("x".to_string()));
        assert_eq!(None::<i32>.to_input_value(), InputValue::Null);
        assert_eq!(
            vec![Some(1i64), None].to_input_value(),
            InputValue::List(vec![InputValue::Int(1), InputValue::Null])
        );
    }

    #[test]
    fn test_parameter_conversions() {
        let value: Parameter<String> = "droid".to_string().into();
        assert_eq!(value.to_input_value(), InputValue::String("droid".to_string()));

        let variable = Variable::new("id", "ID!");
        let param: Parameter<String> = Parameter::variable(variable.clone());
        assert_eq!(param.to_input_value(), InputValue::Variable(variable));
    }

    #[test]
    fn test_json_conversion_keeps_order() {
        let json = serde_json::json!({"a": 1, "b": [true, null]});
        let InputValue::Object(properties) = json.to_input_value() else {
            panic!("expected object");
        };
        assert_eq!(properties[0].name, "a");
        assert_eq!(
            properties[1].value,
            InputValue::List(vec![InputValue::Boolean(true), InputValue::Null])
        );
    }
}
