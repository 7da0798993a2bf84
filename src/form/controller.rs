use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{ApiError, ApiFailure, SubmitResponse};
use crate::feedback::{ToastEntry, ToastKind, ToastManager};

use super::rules::RuleSet;

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

/// Cheap-clone name of one form field ("email", "confirm_password", ...).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKey(Arc<str>);

impl FieldKey {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// One form field value: free text, a checkbox-like flag, or a decimal
/// number (prices, quantities).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Number(Decimal),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Flag(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
        }
    }

    /// Whether `required` should reject this value: blank text or an
    /// unchecked flag.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(value) => value.trim().is_empty(),
            Self::Flag(value) => !value,
            Self::Number(_) => false,
        }
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(value) => serde_json::Value::String(value.clone()),
            Self::Flag(value) => serde_json::Value::Bool(*value),
            Self::Number(value) => serde_json::to_value(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string())),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

pub type FieldMap = BTreeMap<FieldKey, FieldValue>;

/// Encode a value map as the JSON body a submit action sends to the API.
pub fn field_map_to_json(values: &FieldMap) -> serde_json::Value {
    serde_json::Value::Object(
        values
            .iter()
            .map(|(key, value)| (key.as_str().to_string(), value.to_json()))
            .collect(),
    )
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ValidationTicket(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationMode {
    OnChange,
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub validate_mode: ValidationMode,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_mode: ValidationMode::OnSubmit,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot {
    pub values: FieldMap,
    pub errors: BTreeMap<FieldKey, String>,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub last_response: Option<SubmitResponse>,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    AlreadySubmitting,
    MissingSubmitAction,
    DraftLoadFailed(String),
    DraftSaveFailed(String),
    DraftClearFailed(String),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::InvalidStateTransition { from, to } => {
                write!(f, "invalid submit state transition: {from:?} -> {to:?}")
            }
            FormError::AlreadySubmitting => f.write_str("form submit is already in progress"),
            FormError::MissingSubmitAction => f.write_str("no submit action has been registered"),
            FormError::DraftLoadFailed(error) => write!(f, "failed to load draft: {error}"),
            FormError::DraftSaveFailed(error) => write!(f, "failed to save draft: {error}"),
            FormError::DraftClearFailed(error) => write!(f, "failed to clear draft: {error}"),
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

/// Terminal result of one submit attempt.
#[derive(Clone, Debug)]
pub enum SubmitOutcome {
    /// Validation failed; the submit action was never invoked.
    Invalid(BTreeMap<FieldKey, String>),
    /// The action rejected, or the payload carried an explicit failure.
    Failed(ApiFailure),
    Succeeded(SubmitResponse),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

type BoxedSubmitFuture = Pin<Box<dyn Future<Output = Result<serde_json::Value, ApiError>> + Send>>;
pub(super) type SubmitActionFn = Arc<dyn Fn(FieldMap) -> BoxedSubmitFuture + Send + Sync>;
pub(super) type SuccessHandler = Arc<dyn Fn(&SubmitResponse) + Send + Sync>;
pub(super) type FailureHandler = Arc<dyn Fn(&ApiFailure) + Send + Sync>;
pub(super) type AsyncRuleFn = Arc<
    dyn Fn(FieldValue, FieldMap) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub(super) struct AsyncRuleEntry {
    pub(super) debounce: Duration,
    pub(super) rule: AsyncRuleFn,
}

pub(super) struct FormState {
    pub(super) id: FormId,
    pub(super) initial: FieldMap,
    pub(super) values: FieldMap,
    pub(super) errors: BTreeMap<FieldKey, String>,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) last_response: Option<SubmitResponse>,
    pub(super) tickets: BTreeMap<FieldKey, ValidationTicket>,
}

#[derive(Clone)]
pub struct FormController {
    pub(super) options: FormOptions,
    pub(super) rules: Arc<RuleSet>,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) submit_action: Arc<RwLock<Option<SubmitActionFn>>>,
    pub(super) async_rules: Arc<RwLock<BTreeMap<FieldKey, Vec<AsyncRuleEntry>>>>,
    pub(super) success_handlers: Arc<RwLock<Vec<SuccessHandler>>>,
    pub(super) failure_handlers: Arc<RwLock<Vec<FailureHandler>>>,
    pub(super) toasts: Arc<RwLock<Option<ToastManager>>>,
}

impl FormController {
    pub fn new(initial: FieldMap, rules: RuleSet, options: FormOptions) -> Self {
        Self {
            options,
            rules: Arc::new(rules),
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                initial: initial.clone(),
                values: initial,
                errors: BTreeMap::new(),
                submit_state: SubmitState::Idle,
                submit_count: 0,
                last_response: None,
                tickets: BTreeMap::new(),
            })),
            submit_action: Arc::new(RwLock::new(None)),
            async_rules: Arc::new(RwLock::new(BTreeMap::new())),
            success_handlers: Arc::new(RwLock::new(Vec::new())),
            failure_handlers: Arc::new(RwLock::new(Vec::new())),
            toasts: Arc::new(RwLock::new(None)),
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn register_submit_action<F, Fut>(&self, action: F) -> FormResult<()>
    where
        F: Fn(FieldMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ApiError>> + Send + 'static,
    {
        let wrapped: SubmitActionFn = Arc::new(move |values| Box::pin(action(values)));
        let mut slot = write_lock(&self.submit_action, "registering submit action")?;
        *slot = Some(wrapped);
        Ok(())
    }

    pub fn register_success_handler(
        &self,
        handler: impl Fn(&SubmitResponse) + Send + Sync + 'static,
    ) -> FormResult<()> {
        let mut handlers = write_lock(&self.success_handlers, "registering success handler")?;
        handlers.push(Arc::new(handler));
        Ok(())
    }

    pub fn register_failure_handler(
        &self,
        handler: impl Fn(&ApiFailure) + Send + Sync + 'static,
    ) -> FormResult<()> {
        let mut handlers = write_lock(&self.failure_handlers, "registering failure handler")?;
        handlers.push(Arc::new(handler));
        Ok(())
    }

    /// Route submit-time notifications through an ambient toast channel.
    pub fn attach_toasts(&self, manager: ToastManager) -> FormResult<()> {
        let mut slot = write_lock(&self.toasts, "attaching toast manager")?;
        *slot = Some(manager);
        Ok(())
    }

    pub fn value(&self, key: impl Borrow<str>) -> FormResult<Option<FieldValue>> {
        Ok(read_lock(&self.state, "reading field value")?
            .values
            .get(key.borrow())
            .cloned())
    }

    pub fn error(&self, key: impl Borrow<str>) -> FormResult<Option<String>> {
        Ok(read_lock(&self.state, "reading field error")?
            .errors
            .get(key.borrow())
            .cloned())
    }

    /// True from submit entry until the attempt settles, so a button can
    /// stay disabled across the whole validation-plus-request window.
    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(matches!(
            read_lock(&self.state, "reading submit flag")?.submit_state,
            SubmitState::Validating | SubmitState::Submitting
        ))
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            values: state.values.clone(),
            errors: state.errors.clone(),
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            last_response: state.last_response.clone(),
            is_valid: state.errors.is_empty(),
        })
    }

    /// Restore initial values, clear errors and the last response.
    pub fn reset(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        state.values = state.initial.clone();
        state.errors.clear();
        state.last_response = None;
        state.submit_state = SubmitState::Idle;
        state.tickets.clear();
        Ok(())
    }

    /// Run the submit state machine: count the attempt, gate on validation,
    /// await the registered action, map the result into a canonical outcome,
    /// and surface it through toasts and handlers. The submitting flag is
    /// cleared on every terminal path.
    pub async fn submit(&self) -> FormResult<SubmitOutcome> {
        let action = {
            let action = read_lock(&self.submit_action, "reading submit action")?;
            action.clone().ok_or(FormError::MissingSubmitAction)?
        };

        {
            let mut state = write_lock(&self.state, "preparing submit")?;
            // An attempt is in flight from Validating on: async rules can
            // dwell there for a full debounce window.
            if matches!(
                state.submit_state,
                SubmitState::Validating | SubmitState::Submitting
            ) {
                return Err(FormError::AlreadySubmitting);
            }
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
            debug!(form = state.id.0, attempt = state.submit_count, "submit started");
        }

        let is_valid = self.validate_all_async().await?;
        if !is_valid {
            let errors = {
                let mut state = write_lock(&self.state, "handling submit validation failure")?;
                transition_submit_state(&mut state, SubmitState::Failed)?;
                state.errors.clone()
            };
            if let Some(first) = errors.values().next() {
                self.notify(ToastKind::Error, first)?;
            }
            debug!(fields = errors.len(), "submit blocked by validation");
            return Ok(SubmitOutcome::Invalid(errors));
        }

        let values = {
            let mut state = write_lock(&self.state, "moving submit state to submitting")?;
            transition_submit_state(&mut state, SubmitState::Submitting)?;
            state.values.clone()
        };

        // A panic while invoking the action is the synchronous-throw case:
        // absorb it and complete the state machine as a generic failure.
        let call = catch_unwind(AssertUnwindSafe(|| action(values)));
        let result = match call {
            Ok(future) => future.await,
            Err(_) => {
                warn!("submit action panicked before returning a future");
                let failure = ApiFailure::generic();
                self.complete_failed(failure.clone())?;
                return Ok(SubmitOutcome::Failed(failure));
            }
        };

        match result {
            Ok(payload) => {
                if let Some(failure) = ApiFailure::from_payload(&payload) {
                    self.complete_failed(failure.clone())?;
                    Ok(SubmitOutcome::Failed(failure))
                } else {
                    let response = SubmitResponse::from_payload(payload);
                    self.complete_succeeded(response.clone())?;
                    Ok(SubmitOutcome::Succeeded(response))
                }
            }
            Err(error) => {
                let failure = ApiFailure::from_error(&error);
                self.complete_failed(failure.clone())?;
                Ok(SubmitOutcome::Failed(failure))
            }
        }
    }

    fn complete_succeeded(&self, response: SubmitResponse) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "completing submit")?;
            transition_submit_state(&mut state, SubmitState::Succeeded)?;
            state.last_response = Some(response.clone());
            debug!(form = state.id.0, "submit succeeded");
        }
        self.notify(ToastKind::Success, response.message_or_default())?;
        let handlers = read_lock(&self.success_handlers, "reading success handlers")?.clone();
        for handler in handlers {
            handler(&response);
        }
        Ok(())
    }

    fn complete_failed(&self, failure: ApiFailure) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "completing failed submit")?;
            transition_submit_state(&mut state, SubmitState::Failed)?;
            // Server field errors merge only onto fields this form validates;
            // anything else would break the errors-follow-rules invariant.
            for (field, message) in &failure.field_errors {
                let key = FieldKey::new(field.as_str());
                if self.rules.contains(&key) {
                    state.errors.insert(key, message.clone());
                } else {
                    warn!(field = %field, "dropping server error for unknown field");
                }
            }
            debug!(form = state.id.0, message = %failure.message, "submit failed");
        }
        self.notify(ToastKind::Error, &failure.message)?;
        let handlers = read_lock(&self.failure_handlers, "reading failure handlers")?.clone();
        for handler in handlers {
            handler(&failure);
        }
        Ok(())
    }

    pub(super) fn notify(&self, kind: ToastKind, message: &str) -> FormResult<()> {
        let toasts = read_lock(&self.toasts, "reading toast manager")?.clone();
        if let Some(manager) = toasts {
            let title = match kind {
                ToastKind::Success => "Success",
                ToastKind::Error => "Error",
                ToastKind::Warning => "Warning",
                ToastKind::Info => "Notice",
            };
            manager.show(ToastEntry::new(title, message).kind(kind));
        }
        Ok(())
    }
}

pub(super) fn transition_submit_state(state: &mut FormState, next: SubmitState) -> FormResult<()> {
    let current = state.submit_state;
    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
