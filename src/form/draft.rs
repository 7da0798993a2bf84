use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::controller::{
    FieldMap, FormController, FormError, FormId, FormResult, SubmitState, read_lock, write_lock,
};

/// Persistence seam for unsubmitted field values (abandoned-checkout
/// recovery, long product forms). Implementations serialize however the
/// host platform stores drafts.
pub trait FormDraftStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save(&self, form_id: FormId, values: &FieldMap) -> Result<(), Self::Error>;
    fn load(&self, form_id: FormId) -> Result<Option<FieldMap>, Self::Error>;
    fn clear(&self, form_id: FormId) -> Result<(), Self::Error>;
}

/// In-memory store that round-trips drafts through their serialized form,
/// matching what a real storage backend would hold.
#[derive(Clone, Default)]
pub struct InMemoryDraftStore {
    state: Arc<RwLock<BTreeMap<FormId, String>>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormDraftStore for InMemoryDraftStore {
    type Error = serde_json::Error;

    fn save(&self, form_id: FormId, values: &FieldMap) -> Result<(), Self::Error> {
        let encoded = serde_json::to_string(values)?;
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.insert(form_id, encoded);
        Ok(())
    }

    fn load(&self, form_id: FormId) -> Result<Option<FieldMap>, Self::Error> {
        let encoded = {
            let state = match self.state.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            state.get(&form_id).cloned()
        };
        encoded.map(|raw| serde_json::from_str(&raw)).transpose()
    }

    fn clear(&self, form_id: FormId) -> Result<(), Self::Error> {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.remove(&form_id);
        Ok(())
    }
}

impl FormController {
    pub fn save_draft<S>(&self, store: &S) -> FormResult<()>
    where
        S: FormDraftStore,
    {
        let state = read_lock(&self.state, "saving draft")?;
        store
            .save(state.id, &state.values)
            .map_err(|error| FormError::DraftSaveFailed(error.to_string()))
    }

    pub fn load_draft<S>(&self, store: &S) -> FormResult<bool>
    where
        S: FormDraftStore,
    {
        let form_id = self.form_id()?;
        let Some(draft) = store
            .load(form_id)
            .map_err(|error| FormError::DraftLoadFailed(error.to_string()))?
        else {
            return Ok(false);
        };

        let mut state = write_lock(&self.state, "loading draft into form")?;
        state.values = draft;
        state.errors.clear();
        state.submit_state = SubmitState::Idle;
        state.submit_count = 0;
        state.last_response = None;
        state.tickets.clear();
        Ok(true)
    }

    pub fn clear_draft<S>(&self, store: &S) -> FormResult<()>
    where
        S: FormDraftStore,
    {
        let form_id = self.form_id()?;
        store
            .clear(form_id)
            .map_err(|error| FormError::DraftClearFailed(error.to_string()))
    }
}
