//! # Bill Lifecycle Controller
//!
//! Owns the draft and the Drafting ⇄ Finalized state machine.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bill Lifecycle                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   generate_bill()    ┌─────────────────────┐  │
//! │  │      DRAFTING       │ ───────────────────► │     FINALIZED       │  │
//! │  │                     │  validate            │                     │  │
//! │  │  add / update /     │  mint id + number    │  current_bill()     │  │
//! │  │  remove product     │  snapshot Bill       │  (immutable)        │  │
//! │  │  edit shop details  │  history.append()    │                     │  │
//! │  │                     │  clear products      │                     │  │
//! │  └─────────────────────┘ ◄─────────────────── └─────────────────────┘  │
//! │       ▲       │          back_to_generator()                            │
//! │       │       │                                                         │
//! │       └───────┘  validation or store failure: stay, draft intact       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billgen_core::identity::BillIdentity;
use billgen_core::validation::validate_bill_draft;
use billgen_core::{Bill, CoreError, ProductInput, ShopDetails};
use billgen_store::{HistoryStore, KeyValueBackend};
use chrono::{Local, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::state::{Draft, DraftView, ShopField};

/// Where the controller is in the lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum BillState {
    /// Building a bill.
    Drafting,
    /// A bill was generated and saved.
    Finalized(Bill),
}

impl BillState {
    fn describe(&self) -> &'static str {
        match self {
            BillState::Drafting => "drafting",
            BillState::Finalized(_) => "a bill is finalized",
        }
    }
}

/// Drives one bill at a time from draft to history.
///
/// The history store is injected so tests can use an in-memory backend.
pub struct BillController<B> {
    history: Arc<HistoryStore<B>>,
    draft: Draft,
    state: BillState,
}

impl<B: KeyValueBackend> BillController<B> {
    /// Creates a controller with an empty draft.
    pub fn new(history: Arc<HistoryStore<B>>) -> Self {
        Self::with_shop(history, ShopDetails::default())
    }

    /// Creates a controller whose draft starts with `shop`.
    pub fn with_shop(history: Arc<HistoryStore<B>>, shop: ShopDetails) -> Self {
        BillController {
            history,
            draft: Draft::new(shop),
            state: BillState::Drafting,
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &Arc<HistoryStore<B>> {
        &self.history
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, BillState::Finalized(_))
    }

    /// The generated bill, while Finalized.
    pub fn current_bill(&self) -> Option<&Bill> {
        match &self.state {
            BillState::Finalized(bill) => Some(bill),
            BillState::Drafting => None,
        }
    }

    /// Draft snapshot with live totals. Available in every state.
    pub fn preview(&self) -> DraftView {
        self.draft.view()
    }

    /// Resolves a line number or id to a product id in the draft.
    pub fn resolve_product(&self, reference: &str) -> Option<String> {
        self.draft.resolve_product(reference)
    }

    // =========================================================================
    // Drafting Operations
    // =========================================================================

    pub fn add_product(&mut self, input: ProductInput) -> AppResult<DraftView> {
        self.ensure_drafting("add a product")?;
        self.draft.add_product(input)?;
        Ok(self.preview())
    }

    pub fn update_product(&mut self, id: &str, input: ProductInput) -> AppResult<DraftView> {
        self.ensure_drafting("update a product")?;
        self.draft.update_product(id, input)?;
        Ok(self.preview())
    }

    pub fn remove_product(&mut self, id: &str) -> AppResult<DraftView> {
        self.ensure_drafting("remove a product")?;
        self.draft.remove_product(id)?;
        Ok(self.preview())
    }

    pub fn set_shop_details(&mut self, shop: ShopDetails) -> AppResult<DraftView> {
        self.ensure_drafting("edit shop details")?;
        self.draft.set_shop_details(shop);
        Ok(self.preview())
    }

    pub fn set_shop_field(&mut self, field: ShopField, value: &str) -> AppResult<DraftView> {
        self.ensure_drafting("edit shop details")?;
        self.draft.set_shop_field(field, value);
        Ok(self.preview())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Validates the draft, saves a new bill to history and moves to Finalized.
    ///
    /// ## Failure
    /// Validation and store errors leave the controller in Drafting with the
    /// draft untouched, and nothing is appended.
    pub async fn generate_bill(&mut self) -> AppResult<Bill> {
        self.ensure_drafting("generate a bill")?;
        validate_bill_draft(self.draft.shop(), self.draft.products())?;

        let identity = BillIdentity::mint(Utc::now(), &Local);
        let bill = Bill::assemble(
            identity,
            self.draft.shop().clone(),
            self.draft.products().to_vec(),
        );

        if let Err(e) = self.history.append(bill.clone()).await {
            warn!(bill_number = %bill.bill_number, error = %e, "Bill not saved, draft kept");
            return Err(e.into());
        }

        info!(
            bill_id = %bill.id,
            bill_number = %bill.bill_number,
            items = bill.item_count(),
            total = %bill.total_amount,
            "Bill generated"
        );

        self.draft.clear_products();
        self.state = BillState::Finalized(bill.clone());
        Ok(bill)
    }

    /// Returns to Drafting with an empty product list and the same shop.
    pub fn back_to_generator(&mut self) -> DraftView {
        self.draft.clear_products();
        self.state = BillState::Drafting;
        self.preview()
    }

    fn ensure_drafting(&self, operation: &str) -> AppResult<()> {
        match self.state {
            BillState::Drafting => Ok(()),
            BillState::Finalized(_) => Err(CoreError::InvalidState {
                operation: operation.to_string(),
                state: self.state.describe().to_string(),
            }
            .into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use billgen_core::money::bill_totals;
    use billgen_store::{MemoryBackend, StoreError, StoreResult};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn controller() -> BillController<MemoryBackend> {
        let history = Arc::new(HistoryStore::new(MemoryBackend::new()));
        BillController::with_shop(history, ShopDetails::new("Shop A", "City"))
    }

    fn pen() -> ProductInput {
        ProductInput::new("Pen", 10.0, 5.0, 2)
    }

    /// Memory backend whose writes can be made to fail.
    #[derive(Clone, Default)]
    struct BrokenDisk {
        inner: MemoryBackend,
        broken: Arc<AtomicBool>,
    }

    impl KeyValueBackend for BrokenDisk {
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(StoreError::QueryFailed("disk full".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> StoreResult<()> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_generate_pen_bill() {
        let mut controller = controller();
        controller.add_product(pen()).unwrap();

        let bill = controller.generate_bill().await.unwrap();

        assert_eq!(bill.subtotal.to_string(), "20.00");
        assert_eq!(bill.total_gst.to_string(), "1.00");
        assert_eq!(bill.total_amount.to_string(), "21.00");
        assert!(bill.bill_number.starts_with("BILL-"));
        assert_eq!(bill.bill_number.len(), "BILL-20240115-143052".len());
        assert_ne!(bill.id, bill.bill_number);
    }

    #[tokio::test]
    async fn test_generate_appends_exactly_one_matching_entry() {
        let mut controller = controller();
        controller.add_product(pen()).unwrap();
        controller.add_product(ProductInput::new("Notebook", 45.5, 12.0, 3)).unwrap();

        let bill = controller.generate_bill().await.unwrap();
        let history = controller.history().list().await;

        assert_eq!(history.len(), 1);
        assert_eq!(history[0], bill);
        assert_eq!(history[0].totals(), bill_totals(&history[0].products));
        assert_eq!(
            bill.total_amount.value(),
            bill.subtotal.value() + bill.total_gst.value()
        );
    }

    #[tokio::test]
    async fn test_generate_moves_to_finalized_and_keeps_shop() {
        let mut controller = controller();
        controller.add_product(pen()).unwrap();
        let bill = controller.generate_bill().await.unwrap();

        assert!(controller.is_finalized());
        assert_eq!(controller.current_bill(), Some(&bill));
        assert!(controller.preview().lines.is_empty());
        assert_eq!(controller.preview().shop.name, "Shop A");
    }

    #[tokio::test]
    async fn test_empty_bill_fails_validation_and_never_appends() {
        let mut controller = controller();

        let err = controller.generate_bill().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailure);
        assert!(!controller.is_finalized());
        assert!(controller.history().list().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_shop_fields_fail_validation() {
        let history = Arc::new(HistoryStore::new(MemoryBackend::new()));
        let mut controller = BillController::new(history);
        controller.add_product(pen()).unwrap();

        let err = controller.generate_bill().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailure);
        assert_eq!(err.message, "shop name is required");

        controller.set_shop_field(ShopField::Name, "Shop A").unwrap();
        let err = controller.generate_bill().await.unwrap_err();
        assert_eq!(err.message, "shop location is required");

        controller.set_shop_field(ShopField::Location, "City").unwrap();
        assert!(controller.generate_bill().await.is_ok());
    }

    #[tokio::test]
    async fn test_store_failure_keeps_draft() {
        let backend = BrokenDisk::default();
        let history = Arc::new(HistoryStore::new(backend.clone()));
        let mut controller = BillController::with_shop(history, ShopDetails::new("Shop A", "City"));
        controller.add_product(pen()).unwrap();

        backend.broken.store(true, Ordering::SeqCst);
        let err = controller.generate_bill().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::PersistenceFailure);
        assert!(!controller.is_finalized());
        assert_eq!(controller.preview().lines.len(), 1);
        assert!(controller.history().list().await.is_empty());

        backend.broken.store(false, Ordering::SeqCst);
        assert!(controller.generate_bill().await.is_ok());
    }

    #[tokio::test]
    async fn test_finalized_rejects_edits() {
        let mut controller = controller();
        controller.add_product(pen()).unwrap();
        controller.generate_bill().await.unwrap();

        let err = controller.add_product(pen()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert_eq!(err.message, "Cannot add a product while a bill is finalized");

        assert!(controller.set_shop_field(ShopField::Name, "B").is_err());
        assert!(controller.generate_bill().await.is_err());
        assert_eq!(controller.history().len().await, 1);
    }

    #[tokio::test]
    async fn test_back_to_generator() {
        let mut controller = controller();
        controller.add_product(pen()).unwrap();
        controller.generate_bill().await.unwrap();

        let view = controller.back_to_generator();

        assert!(!controller.is_finalized());
        assert!(controller.current_bill().is_none());
        assert!(view.lines.is_empty());
        assert_eq!(view.shop, ShopDetails::new("Shop A", "City"));
        assert!(controller.add_product(pen()).is_ok());
    }

    #[tokio::test]
    async fn test_n_bills_newest_first() {
        let mut controller = controller();
        let mut ids = Vec::new();

        for _ in 0..3 {
            controller.add_product(pen()).unwrap();
            ids.push(controller.generate_bill().await.unwrap().id);
            controller.back_to_generator();
        }

        let history: Vec<String> = controller.history().list().await.into_iter().map(|b| b.id).collect();
        ids.reverse();
        assert_eq!(history, ids);
    }

    #[tokio::test]
    async fn test_bill_is_a_snapshot() {
        let mut controller = controller();
        controller.add_product(pen()).unwrap();
        let bill = controller.generate_bill().await.unwrap();

        controller.back_to_generator();
        controller.set_shop_field(ShopField::Name, "Renamed").unwrap();
        controller.add_product(ProductInput::new("Marker", 99.0, 18.0, 1)).unwrap();

        let stored = controller.history().get(&bill.id).await.unwrap().unwrap();
        assert_eq!(stored.shop_details.name, "Shop A");
        assert_eq!(stored.products.len(), 1);
        assert_eq!(stored.total_amount.value(), 21.0);
    }

    #[tokio::test]
    async fn test_invalid_product_reports_validation() {
        let mut controller = controller();
        let err = controller.add_product(ProductInput::new("Pen", 0.0, 5.0, 1)).unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailure);
        assert!(controller.preview().lines.is_empty());

        let err = controller.remove_product("nope").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_overflowing_amounts_never_reach_history() {
        let mut controller = controller();
        controller.add_product(pen()).unwrap();
        let earlier = controller.generate_bill().await.unwrap();
        controller.back_to_generator();

        let err = controller.add_product(ProductInput::new("Gold", 1e308, 0.0, 2)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailure);
        assert!(controller.preview().lines.is_empty());

        controller.add_product(ProductInput::new("Gold", 1e308, 0.0, 1)).unwrap();
        controller.add_product(ProductInput::new("Gold", 1e308, 0.0, 1)).unwrap();
        let err = controller.generate_bill().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailure);
        assert!(!controller.is_finalized());
        assert_eq!(controller.preview().lines.len(), 2);
        assert_eq!(controller.history().load().await.unwrap(), vec![earlier]);
    }
}
