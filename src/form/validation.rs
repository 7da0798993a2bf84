use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use futures_timer::Delay;
use tracing::debug;

use super::controller::{
    AsyncRuleEntry, AsyncRuleFn, FieldKey, FieldMap, FieldValue, FormController, FormResult,
    ValidationTicket, read_lock, write_lock,
};

/// Result of running the rule set against the current values.
#[derive(Clone, Debug)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: BTreeMap<FieldKey, String>,
}

impl FormController {
    /// Run every rule against the current values. Replaces the stored error
    /// map wholesale and never fails: a misbehaving rule marks its own field
    /// invalid instead of propagating.
    pub fn validate(&self) -> FormResult<ValidationReport> {
        let values = {
            read_lock(&self.state, "reading values for validation")?
                .values
                .clone()
        };

        let mut errors = BTreeMap::new();
        for (key, rules) in self.rules.iter() {
            if let Some(message) = rules.check(values.get(key), &values) {
                errors.insert(key.clone(), message);
            }
        }

        {
            let mut state = write_lock(&self.state, "applying validation result")?;
            state.errors = errors.clone();
        }

        debug!(invalid_fields = errors.len(), "form validated");
        Ok(ValidationReport {
            is_valid: errors.is_empty(),
            errors,
        })
    }

    /// Re-check a single field's rule, updating only its error entry.
    pub fn validate_field(&self, key: impl Into<FieldKey>) -> FormResult<bool> {
        let key = key.into();
        let values = {
            read_lock(&self.state, "reading values for field validation")?
                .values
                .clone()
        };
        let message = self
            .rules
            .get(&key)
            .and_then(|rules| rules.check(values.get(&key), &values));

        let mut state = write_lock(&self.state, "writing field validation result")?;
        let valid = message.is_none();
        match message {
            Some(message) => {
                state.errors.insert(key, message);
            }
            None => {
                state.errors.remove(&key);
            }
        }
        Ok(valid)
    }

    /// Register an asynchronous rule for one field (e.g. "email already
    /// registered" during signup). The rule receives the field's value and
    /// the full value map, and rejects with the message to display.
    pub fn register_async_rule<F, Fut>(&self, key: impl Into<FieldKey>, rule: F) -> FormResult<()>
    where
        F: Fn(FieldValue, FieldMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.register_async_rule_with_debounce(key, 0, rule)
    }

    pub fn register_async_rule_with_debounce<F, Fut>(
        &self,
        key: impl Into<FieldKey>,
        debounce_ms: u64,
        rule: F,
    ) -> FormResult<()>
    where
        F: Fn(FieldValue, FieldMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let wrapped: AsyncRuleFn = std::sync::Arc::new(move |value, values| {
            Box::pin(rule(value, values))
        });
        let entry = AsyncRuleEntry {
            debounce: Duration::from_millis(debounce_ms),
            rule: wrapped,
        };
        let mut rules = write_lock(&self.async_rules, "registering async rule")?;
        rules.entry(key.into()).or_default().push(entry);
        Ok(())
    }

    /// Run the registered async rules for one field. Each run takes a fresh
    /// ticket; only the latest ticket's result is kept, so a stale slow
    /// response never overwrites a newer one.
    pub async fn run_async_rules(
        &self,
        key: impl Into<FieldKey>,
    ) -> FormResult<Vec<ValidationTicket>> {
        let key = key.into();
        let entries = {
            read_lock(&self.async_rules, "reading async rules")?
                .get(&key)
                .cloned()
                .unwrap_or_default()
        };

        let mut tickets = Vec::with_capacity(entries.len());
        for entry in entries {
            let (ticket, value, values) = {
                let mut state = write_lock(&self.state, "starting async validation")?;
                let next = ValidationTicket(
                    state
                        .tickets
                        .get(&key)
                        .copied()
                        .unwrap_or(ValidationTicket(0))
                        .0
                        + 1,
                );
                state.tickets.insert(key.clone(), next);
                let value = state
                    .values
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| FieldValue::Text(String::new()));
                (next, value, state.values.clone())
            };

            if !entry.debounce.is_zero() {
                Delay::new(entry.debounce).await;
                if !self.is_latest_ticket(&key, ticket)? {
                    continue;
                }
            }

            let result = (entry.rule)(value, values).await;
            self.finish_async_rule(&key, ticket, result)?;
            tickets.push(ticket);
        }
        Ok(tickets)
    }

    /// Sync rules first, then every field with registered async rules.
    /// Used as the submit gate.
    pub(super) async fn validate_all_async(&self) -> FormResult<bool> {
        let report = self.validate()?;
        if !report.is_valid {
            return Ok(false);
        }

        let keys = {
            read_lock(&self.async_rules, "reading async rule keys")?
                .keys()
                .cloned()
                .collect::<Vec<_>>()
        };
        for key in keys {
            let _ = self.run_async_rules(key).await?;
        }

        Ok(read_lock(&self.state, "reading post-validation errors")?
            .errors
            .is_empty())
    }

    fn is_latest_ticket(&self, key: &FieldKey, ticket: ValidationTicket) -> FormResult<bool> {
        Ok(read_lock(&self.state, "checking latest validation ticket")?
            .tickets
            .get(key)
            .copied()
            == Some(ticket))
    }

    fn finish_async_rule(
        &self,
        key: &FieldKey,
        ticket: ValidationTicket,
        result: Result<(), String>,
    ) -> FormResult<()> {
        let mut state = write_lock(&self.state, "finishing async validation")?;
        if state.tickets.get(key).copied() != Some(ticket) {
            return Ok(());
        }
        match result {
            Ok(()) => {
                state.errors.remove(key);
            }
            Err(message) => {
                state.errors.insert(key.clone(), message);
            }
        }
        Ok(())
    }
}
