use std::sync::Arc;

use lifeguide_assistant::Assistant;
use lifeguide_db::SharedStorage;
use lifeguide_gateway::chat::ChatRelay;
use lifeguide_gateway::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: SharedStorage,
    pub assistant: Arc<Assistant>,
    pub dispatcher: Dispatcher,
}

impl AppStateInner {
    pub fn new(store: SharedStorage, assistant: Assistant) -> Self {
        Self {
            store,
            assistant: Arc::new(assistant),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Chat pipeline sharing this state's store and assistant.
    pub fn relay(&self) -> ChatRelay {
        ChatRelay::new(self.store.clone(), self.assistant.clone())
    }
}
