use crate::server::database::store::Store;
use crate::server::model::config::PricingSource;

#[derive(Clone)]
pub(crate) struct AppState {
    store: Store,
    pricing: PricingSource,
}

impl AppState {
    pub fn new(store: Store, pricing: PricingSource) -> Self {
        Self { store, pricing }
    }

    pub fn get_store(&self) -> &Store {
        &self.store
    }

    pub fn get_pricing(&self) -> PricingSource {
        self.pricing
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::server::database::{Collection, DocumentStore};
    use serde_json::json;
    use std::time::Duration;

    #[actix_web::test]
    async fn clones_share_the_store() {
        let state = AppState::new(Store::memory(Duration::from_secs(1)), PricingSource::LineItem);
        let cloned = state.clone();
        let doc = json!({"table_id": "T1"}).as_object().cloned().unwrap();
        cloned.get_store().insert_one(Collection::Table, doc).await.unwrap();

        let found = state.get_store().find_many(Collection::Table, &Default::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(state.get_pricing(), PricingSource::LineItem);
    }
}
