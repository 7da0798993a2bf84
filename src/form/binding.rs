use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::warn;

use super::controller::{
    FieldKey, FieldValue, FormController, FormResult, ValidationMode, write_lock,
};

/// Raw value carried by an input-change event, before coercion onto the
/// field-value map.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldInput {
    /// Text inputs, selects, radios.
    Text(String),
    /// Checkbox-like controls.
    Checkbox(bool),
    /// Number inputs.
    Numeric(f64),
}

impl FieldInput {
    /// `None` for numeric input with no decimal form (NaN, infinities).
    fn coerce(self) -> Option<FieldValue> {
        match self {
            FieldInput::Text(value) => Some(FieldValue::Text(value)),
            FieldInput::Checkbox(value) => Some(FieldValue::Flag(value)),
            FieldInput::Numeric(value) => decimal_from_f64(value).map(FieldValue::Number),
        }
    }
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldInput {
    fn from(value: bool) -> Self {
        Self::Checkbox(value)
    }
}

impl From<f64> for FieldInput {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

impl FormController {
    /// Apply an input-change event: coerce the raw value and store it.
    /// Any existing error on the field is cleared immediately, before any
    /// revalidation runs. Numeric input with no decimal form is dropped,
    /// leaving the stored value untouched.
    pub fn set_field(&self, key: impl Into<FieldKey>, input: impl Into<FieldInput>) -> FormResult<()> {
        let key = key.into();
        let Some(value) = input.into().coerce() else {
            warn!(field = %key, "ignoring numeric input with no decimal form");
            return Ok(());
        };
        self.set_field_value(key, value)
    }

    /// Programmatic equivalent of `set_field` for values computed outside a
    /// change event (custom widgets, derived values).
    pub fn set_field_value(
        &self,
        key: impl Into<FieldKey>,
        value: impl Into<FieldValue>,
    ) -> FormResult<()> {
        let key = key.into();
        {
            let mut state = write_lock(&self.state, "writing field value")?;
            state.values.insert(key.clone(), value.into());
            state.errors.remove(&key);
        }

        if self.options.validate_mode == ValidationMode::OnChange {
            let _ = self.validate_field(key)?;
        }
        Ok(())
    }

    /// `set_field_value` plus the field's registered async rules, for
    /// change handlers that await debounced server-side checks.
    pub async fn set_field_value_async(
        &self,
        key: impl Into<FieldKey>,
        value: impl Into<FieldValue>,
    ) -> FormResult<()> {
        let key = key.into();
        self.set_field_value(key.clone(), value)?;
        if self.options.validate_mode == ValidationMode::OnChange {
            let _ = self.run_async_rules(key).await?;
        }
        Ok(())
    }
}

pub(super) fn decimal_from_f64(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}
