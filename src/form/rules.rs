use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::warn;

use super::controller::{FieldKey, FieldMap, FieldValue};

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile")
});

const PREDICATE_PANIC_MESSAGE: &str = "This value could not be validated";

type CustomPredicate = Arc<dyn Fn(&FieldValue, &FieldMap) -> bool + Send + Sync>;

#[derive(Clone)]
enum RuleCheck {
    Required {
        message: Option<String>,
    },
    Email {
        message: Option<String>,
    },
    MinLength {
        limit: usize,
        message: Option<String>,
    },
    MaxLength {
        limit: usize,
        message: Option<String>,
    },
    Pattern {
        pattern: Regex,
        message: String,
    },
    Custom {
        message: String,
        predicate: CustomPredicate,
    },
}

/// Declarative constraints for one form field, checked in registration
/// order; the first failing check supplies the field's error message.
#[derive(Clone, Default)]
pub struct FieldRules {
    checks: Vec<RuleCheck>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self) -> Self {
        self.push(RuleCheck::Required { message: None })
    }

    pub fn required_with(self, message: impl Into<String>) -> Self {
        self.push(RuleCheck::Required {
            message: Some(message.into()),
        })
    }

    pub fn email(self) -> Self {
        self.push(RuleCheck::Email { message: None })
    }

    pub fn min_length(self, limit: usize) -> Self {
        self.push(RuleCheck::MinLength {
            limit,
            message: None,
        })
    }

    pub fn max_length(self, limit: usize) -> Self {
        self.push(RuleCheck::MaxLength {
            limit,
            message: None,
        })
    }

    pub fn pattern(self, pattern: Regex, message: impl Into<String>) -> Self {
        self.push(RuleCheck::Pattern {
            pattern,
            message: message.into(),
        })
    }

    /// Cross-field predicate; returning `false` fails the field with
    /// `message`. A panicking predicate fails the field with a generic
    /// message instead of tearing down the controller.
    pub fn custom(
        self,
        message: impl Into<String>,
        predicate: impl Fn(&FieldValue, &FieldMap) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.push(RuleCheck::Custom {
            message: message.into(),
            predicate: Arc::new(predicate),
        })
    }

    fn push(mut self, check: RuleCheck) -> Self {
        self.checks.push(check);
        self
    }

    pub(super) fn check(&self, value: Option<&FieldValue>, values: &FieldMap) -> Option<String> {
        for check in &self.checks {
            if let Some(message) = run_check(check, value, values) {
                return Some(message);
            }
        }
        None
    }
}

fn run_check(check: &RuleCheck, value: Option<&FieldValue>, values: &FieldMap) -> Option<String> {
    match check {
        RuleCheck::Required { message } => {
            let blank = value.is_none_or(FieldValue::is_blank);
            blank.then(|| {
                message
                    .clone()
                    .unwrap_or_else(|| "This field is required".to_string())
            })
        }
        RuleCheck::Email { message } => {
            let text = value?.display();
            if text.is_empty() || EMAIL_SHAPE.is_match(&text) {
                None
            } else {
                Some(
                    message
                        .clone()
                        .unwrap_or_else(|| "Enter a valid email address".to_string()),
                )
            }
        }
        RuleCheck::MinLength { limit, message } => {
            let text = value?.display();
            (!text.is_empty() && text.chars().count() < *limit).then(|| {
                message
                    .clone()
                    .unwrap_or_else(|| format!("Must be at least {limit} characters"))
            })
        }
        RuleCheck::MaxLength { limit, message } => {
            let text = value?.display();
            (text.chars().count() > *limit).then(|| {
                message
                    .clone()
                    .unwrap_or_else(|| format!("Must be at most {limit} characters"))
            })
        }
        RuleCheck::Pattern { pattern, message } => {
            let text = value?.display();
            (!text.is_empty() && !pattern.is_match(&text)).then(|| message.clone())
        }
        RuleCheck::Custom { message, predicate } => {
            let value = value?;
            match catch_unwind(AssertUnwindSafe(|| predicate(value, values))) {
                Ok(true) => None,
                Ok(false) => Some(message.clone()),
                Err(_) => {
                    warn!("custom validation predicate panicked");
                    Some(PREDICATE_PANIC_MESSAGE.to_string())
                }
            }
        }
    }
}

/// The full validation-rule set for one form, keyed by field name. Only
/// fields present here can ever appear in the controller's error map.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<FieldKey, FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, key: impl Into<FieldKey>, rules: FieldRules) -> Self {
        self.rules.insert(key.into(), rules);
        self
    }

    pub fn contains(&self, key: &FieldKey) -> bool {
        self.rules.contains_key(key)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&FieldRules> {
        self.rules.get(key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldRules)> {
        self.rules.iter()
    }
}
