//! Headless presentation layer: intents in, view snapshots out.
//!
//! `ProductManager` is the composition root's handle on the product store.
//! It keeps the screen-level state the store doesn't care about (open form,
//! pending delete confirmation, limit notification) and never lets anything
//! else write to the store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use pocketshop_core::ProductId;
use pocketshop_events::Subscription;
use pocketshop_products::{
    AddOutcome, Clock, FormErrors, Product, ProductEvent, ProductForm, ProductStore,
    RemoveOutcome, SystemClock, UpdateOutcome,
};

use crate::config::AppConfig;
use crate::view::{
    CardView, ConfirmationView, EmptyStateView, FormView, ManagerView, NotificationView,
    StatsView, TITLE, format_money,
};

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Tap on "+" (or the empty-state button).
    RequestAdd,
    /// Tap on a card's "Edit".
    Edit(ProductId),
    SetName(String),
    SetPrice(String),
    /// Result of the image picker; `None` means the picker was abandoned.
    SetPhoto(Option<String>),
    Submit,
    Cancel,
    /// Tap on a card's "Delete"; asks for confirmation first.
    RequestDelete(ProductId),
    ConfirmDelete,
    CancelDelete,
    DismissNotification,
    /// Time passed; expires the limit notification.
    Tick,
}

/// What a dispatched intent did.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    FormOpened,
    FormChanged,
    FormClosed,
    Invalid(FormErrors),
    Added(Product),
    Updated(Product),
    Removed(Product),
    LimitReached,
    ConfirmationRequested(ProductId),
    DeleteCancelled,
    NotificationDismissed,
    /// The intent did not apply to the current screen state.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormMode {
    Create,
    Edit(ProductId),
}

#[derive(Debug, Clone)]
struct FormSession {
    mode: FormMode,
    values: ProductForm,
    errors: FormErrors,
}

#[derive(Debug)]
pub struct ProductManager {
    store: ProductStore,
    clock: Arc<dyn Clock>,
    notification_timeout: Duration,
    form: Option<FormSession>,
    pending_delete: Option<ProductId>,
    notification_shown_at: Option<DateTime<Utc>>,
}

impl ProductManager {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let store = ProductStore::new(config.max_products).with_clock(clock.clone());
        Self {
            store,
            clock,
            notification_timeout: config.notification_timeout,
            form: None,
            pending_delete: None,
            notification_shown_at: None,
        }
    }

    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    /// Subscribe to store changes (for re-rendering).
    pub fn subscribe(&self) -> Subscription<ProductEvent> {
        self.store.subscribe()
    }

    pub fn is_form_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn is_notification_visible(&self) -> bool {
        self.notification_shown_at.is_some()
    }

    pub fn dispatch(&mut self, intent: Intent) -> Feedback {
        tracing::debug!(?intent, "dispatching intent");
        match intent {
            Intent::RequestAdd => self.request_add(),
            Intent::Edit(id) => self.open_edit(id),
            Intent::SetName(name) => self.edit_form(|form| form.name = name),
            Intent::SetPrice(price) => self.edit_form(|form| form.price = price),
            Intent::SetPhoto(Some(photo)) => self.edit_form(|form| form.photo = Some(photo)),
            Intent::SetPhoto(None) => Feedback::Ignored,
            Intent::Submit => self.submit(),
            Intent::Cancel => match self.form.take() {
                Some(_) => Feedback::FormClosed,
                None => Feedback::Ignored,
            },
            Intent::RequestDelete(id) => match self.store.get(id) {
                Some(_) => {
                    self.pending_delete = Some(id);
                    Feedback::ConfirmationRequested(id)
                }
                None => Feedback::Ignored,
            },
            Intent::ConfirmDelete => self.confirm_delete(),
            Intent::CancelDelete => match self.pending_delete.take() {
                Some(_) => Feedback::DeleteCancelled,
                None => Feedback::Ignored,
            },
            Intent::DismissNotification => self.dismiss_notification(),
            Intent::Tick => self.tick(),
        }
    }

    pub fn render(&self) -> ManagerView {
        let items = self.store.items();
        let max = self.store.max_products();

        ManagerView {
            title: TITLE,
            subtitle: format!("{}/{} products", items.len(), max),
            add_enabled: !self.store.is_full(),
            stats: (!items.is_empty()).then(|| StatsView {
                count: items.len(),
                total_value: format_money(self.store.total_value()),
            }),
            empty_state: items.is_empty().then(EmptyStateView::default),
            cards: items.iter().map(CardView::from_product).collect(),
            form: self.form.as_ref().map(|session| {
                let editing = matches!(session.mode, FormMode::Edit(_));
                FormView {
                    title: if editing { "Edit Product" } else { "Add Product" },
                    submit_label: if editing { "Update" } else { "Save" },
                    values: session.values.clone(),
                    errors: session.errors.clone(),
                }
            }),
            notification: self
                .notification_shown_at
                .map(|_| NotificationView::limit_reached(max)),
            confirmation: self
                .pending_delete
                .and_then(|id| self.store.get(id))
                .map(ConfirmationView::delete),
        }
    }

    fn request_add(&mut self) -> Feedback {
        if self.store.is_full() {
            self.show_notification();
            return Feedback::LimitReached;
        }
        self.form = Some(FormSession {
            mode: FormMode::Create,
            values: ProductForm::default(),
            errors: FormErrors::default(),
        });
        Feedback::FormOpened
    }

    fn open_edit(&mut self, id: ProductId) -> Feedback {
        let Ok(product) = self.store.require(id) else {
            tracing::debug!(product_id = %id, "edit requested for unknown product");
            return Feedback::Ignored;
        };
        self.form = Some(FormSession {
            mode: FormMode::Edit(id),
            values: ProductForm::from_product(product),
            errors: FormErrors::default(),
        });
        Feedback::FormOpened
    }

    fn edit_form(&mut self, change: impl FnOnce(&mut ProductForm)) -> Feedback {
        match self.form.as_mut() {
            Some(session) => {
                change(&mut session.values);
                Feedback::FormChanged
            }
            None => Feedback::Ignored,
        }
    }

    fn submit(&mut self) -> Feedback {
        let Some(session) = self.form.as_mut() else {
            return Feedback::Ignored;
        };

        let candidate = match session.values.clone().into_candidate() {
            Ok(candidate) => candidate,
            Err(errors) => {
                tracing::debug!(failed = errors.len(), "form rejected");
                session.errors = errors.clone();
                return Feedback::Invalid(errors);
            }
        };
        let mode = session.mode.clone();
        self.form = None;

        match mode {
            FormMode::Create => match self.store.add(candidate) {
                AddOutcome::Added(product) => Feedback::Added(product),
                AddOutcome::LimitReached { .. } => {
                    self.show_notification();
                    Feedback::LimitReached
                }
                AddOutcome::Rejected(err) => {
                    tracing::warn!(%err, "store rejected a validated product");
                    Feedback::Ignored
                }
            },
            FormMode::Edit(id) => {
                let Some(existing) = self.store.get(id) else {
                    return Feedback::Ignored;
                };
                let edited = existing.with_details(candidate);
                match self.store.update(edited) {
                    UpdateOutcome::Updated(product) => Feedback::Updated(product),
                    UpdateOutcome::NotFound => Feedback::Ignored,
                    UpdateOutcome::Rejected(err) => {
                        tracing::warn!(%err, "store rejected a validated update");
                        Feedback::Ignored
                    }
                }
            }
        }
    }

    fn confirm_delete(&mut self) -> Feedback {
        let Some(id) = self.pending_delete.take() else {
            return Feedback::Ignored;
        };
        match self.store.remove(id) {
            RemoveOutcome::Removed(product) => {
                // The edit form for a deleted product has nothing left to save.
                if matches!(&self.form, Some(s) if s.mode == FormMode::Edit(id)) {
                    self.form = None;
                }
                Feedback::Removed(product)
            }
            RemoveOutcome::NotFound => Feedback::Ignored,
        }
    }

    fn show_notification(&mut self) {
        self.notification_shown_at = Some(self.clock.now());
    }

    fn dismiss_notification(&mut self) -> Feedback {
        match self.notification_shown_at.take() {
            Some(_) => Feedback::NotificationDismissed,
            None => Feedback::Ignored,
        }
    }

    fn tick(&mut self) -> Feedback {
        match self.notification_shown_at {
            Some(shown_at) if self.clock.now() - shown_at >= self.notification_timeout => {
                self.notification_shown_at = None;
                Feedback::NotificationDismissed
            }
            _ => Feedback::Ignored,
        }
    }
}
