//! Integration tests for storebot.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (fakes and wiremock)
//! cargo test -p storebot-integration-tests
//!
//! # Include the PostgreSQL store test
//! STOREBOT_TEST_DATABASE_URL=postgres://... cargo test -p storebot-integration-tests -- --ignored
//! ```
//!
//! # Test Doubles
//!
//! - [`FakeCommerce`] - in-memory catalog, carts and customers that records
//!   every backend call
//! - [`RecordingTransport`] - captures everything the bot sends or deletes
//! - [`MemoryStore`] - conversation state in a map

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use storebot::chat::{ChatTransport, Event, EventKind, Keyboard, TransportError};
use storebot::commerce::{Commerce, CommerceError};
use storebot::controller::{Catalog, Controller};
use storebot::store::{StateStore, StoreError};
use storebot_core::{
    Cart, CartId, CartItem, CartItemId, ChatId, ConversationState, Customer, CustomerId, Email,
    FileId, MessageId, Product, ProductId, ProductSummary, Quantity, UserId,
};
use tokio::sync::Mutex;

// =============================================================================
// Commerce
// =============================================================================

/// A backend call as the fake saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommerceCall {
    ListProducts,
    GetProduct(ProductId),
    GetFileLink(FileId),
    AddToCart {
        cart: CartId,
        product: ProductId,
        quantity: u32,
    },
    RemoveFromCart {
        cart: CartId,
        item: CartItemId,
    },
    GetCartItems(CartId),
    FindCustomer(String),
    CreateCustomer {
        name: String,
        email: String,
    },
}

#[derive(Debug, Clone)]
struct FakeProduct {
    product: Product,
    unit_cents: u64,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<CommerceCall>,
    carts: HashMap<CartId, Vec<(CartItem, u64)>>,
    customers: Vec<Customer>,
    next_line: u32,
    fail_next: Option<u16>,
}

/// In-memory commerce backend.
///
/// Cart lines get ids `line-1`, `line-2`, ... and repeated adds create
/// repeated lines, like the real backend.
#[derive(Debug, Default)]
pub struct FakeCommerce {
    catalog: Vec<FakeProduct>,
    state: Mutex<FakeState>,
}

/// Render cents the way the backend formats prices.
#[must_use]
pub fn dollars(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

impl FakeCommerce {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product with a main image `img-<id>`.
    #[must_use]
    pub fn with_product(self, id: &str, name: &str, unit_cents: u64, stock: i64) -> Self {
        self.push_product(id, name, unit_cents, stock, Some(FileId::new(format!("img-{id}"))))
    }

    /// Add a product without a main image.
    #[must_use]
    pub fn with_imageless_product(self, id: &str, name: &str, unit_cents: u64, stock: i64) -> Self {
        self.push_product(id, name, unit_cents, stock, None)
    }

    fn push_product(
        mut self,
        id: &str,
        name: &str,
        unit_cents: u64,
        stock: i64,
        main_image: Option<FileId>,
    ) -> Self {
        self.catalog.push(FakeProduct {
            product: Product {
                id: ProductId::new(id),
                name: name.to_string(),
                description: format!("Fresh {}", name.to_lowercase()),
                price: dollars(unit_cents),
                stock_level: stock,
                main_image,
            },
            unit_cents,
        });
        self
    }

    /// Make the next backend call fail with this HTTP status.
    pub async fn fail_next(&self, status: u16) {
        self.state.lock().await.fail_next = Some(status);
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<CommerceCall> {
        self.state.lock().await.calls.clone()
    }

    /// Registered customers.
    pub async fn customers(&self) -> Vec<Customer> {
        self.state.lock().await.customers.clone()
    }

    /// Summaries for [`Catalog::new`].
    #[must_use]
    pub fn summaries(&self) -> Vec<ProductSummary> {
        self.catalog
            .iter()
            .map(|p| ProductSummary {
                id: p.product.id.clone(),
                name: p.product.name.clone(),
            })
            .collect()
    }

    /// Log `call`, failing it if a failure was queued.
    async fn record(&self, call: CommerceCall) -> Result<(), CommerceError> {
        let mut state = self.state.lock().await;
        state.calls.push(call);
        match state.fail_next.take() {
            Some(status) => Err(CommerceError::RemoteService {
                status,
                body: "injected failure".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn find(&self, id: &ProductId) -> Result<&FakeProduct, CommerceError> {
        self.catalog
            .iter()
            .find(|p| &p.product.id == id)
            .ok_or_else(|| CommerceError::RemoteService {
                status: 404,
                body: format!("product {id} not found"),
            })
    }
}

impl Commerce for FakeCommerce {
    async fn list_products(&self) -> Result<Vec<ProductSummary>, CommerceError> {
        self.record(CommerceCall::ListProducts).await?;
        Ok(self.summaries())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, CommerceError> {
        self.record(CommerceCall::GetProduct(id.clone())).await?;
        Ok(self.find(id)?.product.clone())
    }

    async fn get_file_link(&self, id: &FileId) -> Result<String, CommerceError> {
        self.record(CommerceCall::GetFileLink(id.clone())).await?;
        Ok(format!("https://files.example.com/{id}.png"))
    }

    async fn add_to_cart(
        &self,
        cart: &CartId,
        product: &ProductId,
        quantity: Quantity,
    ) -> Result<(), CommerceError> {
        self.record(CommerceCall::AddToCart {
            cart: cart.clone(),
            product: product.clone(),
            quantity: quantity.get(),
        })
        .await?;
        let fake = self.find(product)?;

        let mut state = self.state.lock().await;

        state.next_line += 1;
        let line_cents = fake.unit_cents * u64::from(quantity.get());
        let item = CartItem {
            id: CartItemId::new(format!("line-{}", state.next_line)),
            name: fake.product.name.clone(),
            description: fake.product.description.clone(),
            quantity: quantity.get(),
            unit_price: fake.product.price.clone(),
            line_total: dollars(line_cents),
        };
        state.carts.entry(cart.clone()).or_default().push((item, line_cents));
        Ok(())
    }

    async fn remove_from_cart(&self, cart: &CartId, item: &CartItemId) -> Result<(), CommerceError> {
        self.record(CommerceCall::RemoveFromCart {
            cart: cart.clone(),
            item: item.clone(),
        })
        .await?;
        let mut state = self.state.lock().await;
        if let Some(lines) = state.carts.get_mut(cart) {
            lines.retain(|(line, _)| &line.id != item);
        }
        Ok(())
    }

    async fn get_cart_items(&self, cart: &CartId) -> Result<Cart, CommerceError> {
        self.record(CommerceCall::GetCartItems(cart.clone())).await?;
        let state = self.state.lock().await;
        let lines = state.carts.get(cart).cloned().unwrap_or_default();
        let total: u64 = lines.iter().map(|(_, cents)| cents).sum();

        Ok(Cart {
            items: lines.into_iter().map(|(item, _)| item).collect(),
            total: dollars(total),
        })
    }

    async fn find_customer(&self, email: &Email) -> Result<Vec<Customer>, CommerceError> {
        self.record(CommerceCall::FindCustomer(email.to_string())).await?;
        let state = self.state.lock().await;
        Ok(state
            .customers
            .iter()
            .filter(|c| c.email == *email)
            .cloned()
            .collect())
    }

    async fn create_customer(&self, name: &str, email: &Email) -> Result<CustomerId, CommerceError> {
        self.record(CommerceCall::CreateCustomer {
            name: name.to_string(),
            email: email.to_string(),
        })
        .await?;
        let mut state = self.state.lock().await;
        let id = CustomerId::new(format!("cust-{}", state.customers.len() + 1));
        state.customers.push(Customer {
            id: id.clone(),
            name: name.to_string(),
            email: email.clone(),
        });
        Ok(id)
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Something the bot did in the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat: ChatId,
        id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        chat: ChatId,
        id: MessageId,
        url: String,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    Deleted {
        chat: ChatId,
        message: MessageId,
    },
}

impl Sent {
    /// Text or caption of a sent message.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Photo { caption, .. } => Some(caption),
            Self::Deleted { .. } => None,
        }
    }

    #[must_use]
    pub const fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Self::Text { keyboard, .. } | Self::Photo { keyboard, .. } => keyboard.as_ref(),
            Self::Deleted { .. } => None,
        }
    }

    #[must_use]
    pub const fn message_id(&self) -> Option<MessageId> {
        match self {
            Self::Text { id, .. } | Self::Photo { id, .. } => Some(*id),
            Self::Deleted { .. } => None,
        }
    }
}

/// Transport that records instead of talking to Telegram.
///
/// Sent message ids start at 1000 and increase by one.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    log: Mutex<Vec<Sent>>,
    sent_count: AtomicI32,
    refuse_deletes: AtomicBool,
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Sent> {
        self.log.lock().await.clone()
    }

    /// Forget everything recorded so far.
    pub async fn clear(&self) {
        self.log.lock().await.clear();
    }

    /// The most recent message carrying a keyboard: the screen the user sees.
    pub async fn screen(&self) -> Option<Sent> {
        self.log
            .lock()
            .await
            .iter()
            .rev()
            .find(|s| s.keyboard().is_some())
            .cloned()
    }

    /// Make every later delete fail, as Telegram does for messages older
    /// than 48 hours.
    pub fn refuse_deletes(&self) {
        self.refuse_deletes.store(true, Ordering::Relaxed);
    }

    fn next_id(&self) -> MessageId {
        MessageId::new(1000 + self.sent_count.fetch_add(1, Ordering::Relaxed))
    }
}

impl ChatTransport for RecordingTransport {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        let mut log = self.log.lock().await;
        let id = self.next_id();
        log.push(Sent::Text {
            chat,
            id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(id)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo_url: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        let mut log = self.log.lock().await;
        let id = self.next_id();
        log.push(Sent::Photo {
            chat,
            id,
            url: photo_url.to_string(),
            caption: caption.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(id)
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError> {
        if self.refuse_deletes.load(Ordering::Relaxed) {
            return Err(TransportError::Request(
                "Bad Request: message can't be deleted".to_string(),
            ));
        }
        self.log.lock().await.push(Sent::Deleted { chat, message });
        Ok(())
    }
}

// =============================================================================
// Store
// =============================================================================

/// Conversation state in a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tags: Mutex<HashMap<UserId, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw tag, bypassing [`ConversationState`].
    pub async fn insert_raw(&self, user: UserId, tag: &str) {
        self.tags.lock().await.insert(user, tag.to_string());
    }

    /// The parsed state for a user, if stored and known.
    pub async fn state(&self, user: UserId) -> Option<ConversationState> {
        self.tags.lock().await.get(&user)?.parse().ok()
    }
}

impl StateStore for MemoryStore {
    async fn get(&self, user: UserId) -> Result<Option<String>, StoreError> {
        Ok(self.tags.lock().await.get(&user).cloned())
    }

    async fn set(&self, user: UserId, state: ConversationState) -> Result<(), StoreError> {
        self.tags
            .lock()
            .await
            .insert(user, state.as_tag().to_string());
        Ok(())
    }
}

// =============================================================================
// Conversation harness
// =============================================================================

pub type TestController = Controller<FakeCommerce, RecordingTransport, MemoryStore>;

/// Apple ($2.00/kg, 120 kg), Pear ($3.50/kg, 40 kg, no image).
#[must_use]
pub fn fruit_shop() -> FakeCommerce {
    FakeCommerce::new()
        .with_product("p-apple", "Apple", 200, 120)
        .with_imageless_product("p-pear", "Pear", 350, 40)
}

/// Controller over the given backend with empty transport and store.
#[must_use]
pub fn controller(commerce: FakeCommerce) -> TestController {
    let catalog = Catalog::new(commerce.summaries());
    Controller::new(commerce, RecordingTransport::new(), MemoryStore::new(), catalog)
}

/// A chat user; chat id equals user id like in private chats.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: UserId,
    pub first_name: String,
}

impl TestUser {
    #[must_use]
    pub fn new(id: i64, first_name: &str) -> Self {
        Self {
            id: UserId::new(id),
            first_name: first_name.to_string(),
        }
    }

    fn event(&self, message: Option<MessageId>, kind: EventKind) -> Event {
        Event {
            user: self.id,
            chat: ChatId::new(self.id.get()),
            message,
            sender_name: self.first_name.clone(),
            kind,
        }
    }

    /// `/name` typed as message 1.
    #[must_use]
    pub fn command(&self, name: &str) -> Event {
        self.event(Some(MessageId::new(1)), EventKind::Command(name.to_string()))
    }

    /// Free text typed as message 2.
    #[must_use]
    pub fn text(&self, text: &str) -> Event {
        self.event(Some(MessageId::new(2)), EventKind::Text(text.to_string()))
    }

    /// Press a button with raw callback data on `message`.
    #[must_use]
    pub fn press_data(&self, message: MessageId, data: &str) -> Event {
        self.event(Some(message), EventKind::Button(data.to_string()))
    }
}

/// Press the button labelled `label` on the screen the user currently sees.
///
/// # Panics
///
/// Panics if no screen is shown or it has no such button.
pub async fn press(controller: &TestController, user: &TestUser, label: &str) -> Event {
    let screen = controller
        .transport()
        .screen()
        .await
        .unwrap_or_else(|| panic!("no screen to press {label:?} on"));
    let button = screen
        .keyboard()
        .and_then(|k| k.find(label))
        .unwrap_or_else(|| panic!("screen has no {label:?} button: {screen:?}"));
    let message = screen
        .message_id()
        .unwrap_or_else(|| panic!("screen has no message id"));

    user.press_data(message, &button.data)
}
