//! Explicit conversions between data types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use morph_core::{DataType, FromValue, Primitive, Value};

/// A compiled value-level conversion. Returns `None` when the input cannot be
/// converted, in which case the destination is left untouched.
#[derive(Clone)]
pub struct Converter(Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>);

impl Converter {
    pub fn new(f: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Wrap an infallible typed conversion. Inputs that are not an `A`
    /// (including null) still fail.
    pub fn typed<A, B>(f: impl Fn(A) -> B + Send + Sync + 'static) -> Self
    where
        A: FromValue,
        B: Into<Value>,
    {
        Self::new(move |value| A::from_value(value).map(|a| f(a).into()))
    }

    pub fn fallible<A, B>(f: impl Fn(A) -> Option<B> + Send + Sync + 'static) -> Self
    where
        A: FromValue,
        B: Into<Value>,
    {
        Self::new(move |value| A::from_value(value).and_then(&f).map(Into::into))
    }

    #[must_use]
    pub fn convert(&self, value: &Value) -> Option<Value> {
        (self.0)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter")
    }
}

/// Conversions keyed by (from type, to type).
#[derive(Debug, Clone, Default)]
pub struct ConversionRegistry {
    conversions: HashMap<(DataType, DataType), Converter>,
}

macro_rules! casts {
    ($registry:ident: $($from:ty => $to:ty, $from_p:ident => $to_p:ident;)*) => {
        $(
            $registry.register_converter(
                Primitive::$from_p,
                Primitive::$to_p,
                Converter::typed(|v: $from| v as $to),
            );
        )*
    };
}

impl ConversionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with casts between all numeric primitives.
    ///
    /// Casts follow `as` semantics: integers wrap, floats saturate. They never
    /// report failure.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_lossless,
        clippy::cast_possible_wrap
    )]
    pub fn with_numeric_casts() -> Self {
        let mut registry = Self::new();
        casts! { registry:
            i32 => i64, Int32 => Int64;
            i32 => f32, Int32 => Float32;
            i32 => f64, Int32 => Float64;
            i64 => i32, Int64 => Int32;
            i64 => f32, Int64 => Float32;
            i64 => f64, Int64 => Float64;
            f32 => i32, Float32 => Int32;
            f32 => i64, Float32 => Int64;
            f32 => f64, Float32 => Float64;
            f64 => i32, Float64 => Int32;
            f64 => i64, Float64 => Int64;
            f64 => f32, Float64 => Float32;
        }
        registry
    }

    /// Register an infallible conversion. Replaces any earlier conversion
    /// between the same types.
    pub fn register<A, B>(
        &mut self,
        from: impl Into<DataType>,
        to: impl Into<DataType>,
        f: impl Fn(A) -> B + Send + Sync + 'static,
    ) -> &mut Self
    where
        A: FromValue,
        B: Into<Value>,
    {
        self.register_converter(from, to, Converter::typed(f))
    }

    pub fn register_fallible<A, B>(
        &mut self,
        from: impl Into<DataType>,
        to: impl Into<DataType>,
        f: impl Fn(A) -> Option<B> + Send + Sync + 'static,
    ) -> &mut Self
    where
        A: FromValue,
        B: Into<Value>,
    {
        self.register_converter(from, to, Converter::fallible(f))
    }

    pub fn register_converter(
        &mut self,
        from: impl Into<DataType>,
        to: impl Into<DataType>,
        converter: Converter,
    ) -> &mut Self {
        self.conversions.insert((from.into(), to.into()), converter);
        self
    }

    #[must_use]
    pub fn get(&self, from: &DataType, to: &DataType) -> Option<&Converter> {
        self.conversions.get(&(from.clone(), to.clone()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conversions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Primitive::Int32, Primitive::Int64, Value::Int32(-3), Value::Int64(-3))]
    #[case(Primitive::Int64, Primitive::Int32, Value::Int64(1 << 32), Value::Int32(0))]
    #[case(Primitive::Float64, Primitive::Int32, Value::Float64(1e20), Value::Int32(i32::MAX))]
    #[case(Primitive::Float32, Primitive::Float64, Value::Float32(0.5), Value::Float64(0.5))]
    #[case(Primitive::Int32, Primitive::Float64, Value::Int32(7), Value::Float64(7.0))]
    fn numeric_casts_use_as_semantics(
        #[case] from: Primitive,
        #[case] to: Primitive,
        #[case] input: Value,
        #[case] expected: Value,
    ) {
        let registry = ConversionRegistry::with_numeric_casts();
        let converter = registry.get(&from.into(), &to.into()).unwrap();
        assert_eq!(converter.convert(&input), Some(expected));
    }

    #[test]
    fn no_identity_or_text_casts_are_builtin() {
        let registry = ConversionRegistry::with_numeric_casts();
        assert_eq!(registry.len(), 12);
        let int: DataType = Primitive::Int32.into();
        let text: DataType = Primitive::Text.into();
        assert!(registry.get(&int, &int).is_none());
        assert!(registry.get(&int, &text).is_none());
    }

    #[test]
    fn typed_converter_rejects_wrong_input() {
        let converter = Converter::typed(|v: i32| v.to_string());
        assert_eq!(converter.convert(&Value::Int32(4)), Some(Value::Text("4".into())));
        assert_eq!(converter.convert(&Value::Null), None);
        assert_eq!(converter.convert(&Value::Int64(4)), None);
    }

    #[test]
    fn fallible_registration() {
        let mut registry = ConversionRegistry::new();
        registry.register_fallible(Primitive::Text, Primitive::Int32, |s: String| {
            s.parse::<i32>().ok()
        });
        let converter = registry
            .get(&Primitive::Text.into(), &Primitive::Int32.into())
            .unwrap();
        assert_eq!(converter.convert(&Value::from("12")), Some(Value::Int32(12)));
        assert_eq!(converter.convert(&Value::from("twelve")), None);
    }
}
