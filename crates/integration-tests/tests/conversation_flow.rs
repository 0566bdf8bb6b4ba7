//! End-to-end conversations against in-memory doubles.
//!
//! Every test drives the real controller; only the backend, the chat and the
//! state store are replaced.

#![allow(clippy::unwrap_used)]

use storebot::controller::{RoutingError, screens};
use storebot::error::BotError;
use storebot_core::{CartId, CartItemId, ConversationState, MessageId, ProductId};
use storebot_integration_tests::{
    CommerceCall, Sent, TestController, TestUser, controller, fruit_shop, press,
};

async fn start(controller: &TestController, user: &TestUser) {
    controller.handle(&user.command("start")).await.unwrap();
}

async fn state(controller: &TestController, user: &TestUser) -> Option<ConversationState> {
    controller.store().state(user.id).await
}

/// The last message with a keyboard, as text or caption.
async fn screen_body(controller: &TestController) -> String {
    controller
        .transport()
        .screen()
        .await
        .and_then(|s| s.body().map(ToString::to_string))
        .unwrap()
}

async fn screen_labels(controller: &TestController) -> Vec<String> {
    controller
        .transport()
        .screen()
        .await
        .and_then(|s| s.keyboard().cloned())
        .map(|k| k.labels().into_iter().map(String::from).collect())
        .unwrap()
}

// ============================================================================
// Browsing
// ============================================================================

#[tokio::test]
async fn test_browse_add_and_view_cart() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(42, "Ann");

    // /start shows the catalog plus the cart button.
    start(&controller, &user).await;
    assert_eq!(screen_body(&controller).await, screens::MENU_PROMPT);
    assert_eq!(
        screen_labels(&controller).await,
        vec!["Apple", "Pear", "Shopping cart"]
    );
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Menu));

    // Choosing Apple replaces the menu with a photo card.
    let menu_id = controller.transport().screen().await.unwrap().message_id().unwrap();
    let choose_apple = press(&controller, &user, "Apple").await;
    controller.transport().clear().await;
    controller.handle(&choose_apple).await.unwrap();
    let sent = controller.transport().sent().await;
    assert!(matches!(&sent[0], Sent::Deleted { message, .. } if *message == menu_id));
    let Sent::Photo { url, caption, .. } = &sent[1] else {
        panic!("expected a photo card, got {sent:?}");
    };
    assert_eq!(url, "https://files.example.com/img-p-apple.png");
    assert!(caption.starts_with("Apple\n\n"));
    assert!(caption.contains("$2.00 per kg"));
    assert!(caption.contains("120 kg in stock"));
    assert_eq!(
        screen_labels(&controller).await,
        vec!["1 kg", "5 kg", "10 kg", "Menu", "Shopping cart"]
    );
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Product));

    // 5 kg adds to the user's cart and shows the same card again.
    controller
        .handle(&press(&controller, &user, "5 kg").await)
        .await
        .unwrap();
    let calls = controller.commerce().calls().await;
    assert!(calls.contains(&CommerceCall::AddToCart {
        cart: CartId::new("42"),
        product: ProductId::new("p-apple"),
        quantity: 5,
    }));
    assert!(screen_body(&controller).await.starts_with("Apple\n\n"));
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Product));

    // The cart lists the line and the total.
    controller
        .handle(&press(&controller, &user, "Shopping cart").await)
        .await
        .unwrap();
    assert_eq!(
        screen_body(&controller).await,
        "Apple\nFresh apple\n$2.00 per kg\n5 kg in cart for $10.00\n\nTotal: $10.00"
    );
    assert_eq!(
        screen_labels(&controller).await,
        vec!["Remove Apple", "Menu", "Checkout"]
    );
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Cart));
}

#[tokio::test]
async fn test_product_without_image_is_sent_as_text() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(7, "Bo");

    start(&controller, &user).await;
    controller
        .handle(&press(&controller, &user, "Pear").await)
        .await
        .unwrap();

    let screen = controller.transport().screen().await.unwrap();
    assert!(matches!(&screen, Sent::Text { text, .. } if text.starts_with("Pear\n\n$3.50 per kg")));
    assert!(
        !controller
            .commerce()
            .calls()
            .await
            .iter()
            .any(|c| matches!(c, CommerceCall::GetFileLink(_)))
    );
}

#[tokio::test]
async fn test_empty_cart_shows_only_total() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(8, "Cy");

    start(&controller, &user).await;
    controller
        .handle(&press(&controller, &user, "Shopping cart").await)
        .await
        .unwrap();

    assert_eq!(screen_body(&controller).await, "Total: $0.00");
    assert_eq!(screen_labels(&controller).await, vec!["Menu", "Checkout"]);
}

#[tokio::test]
async fn test_remove_from_cart_rerenders_cart() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(9, "Di");

    start(&controller, &user).await;
    for (product, quantity) in [("Apple", "1 kg"), ("Menu", ""), ("Pear", "10 kg")] {
        controller
            .handle(&press(&controller, &user, product).await)
            .await
            .unwrap();
        if !quantity.is_empty() {
            controller
                .handle(&press(&controller, &user, quantity).await)
                .await
                .unwrap();
        }
    }
    controller
        .handle(&press(&controller, &user, "Shopping cart").await)
        .await
        .unwrap();
    assert!(screen_body(&controller).await.ends_with("Total: $37.00"));

    controller
        .handle(&press(&controller, &user, "Remove Apple").await)
        .await
        .unwrap();

    let calls = controller.commerce().calls().await;
    assert!(calls.contains(&CommerceCall::RemoveFromCart {
        cart: CartId::new("9"),
        item: CartItemId::new("line-1"),
    }));
    assert_eq!(
        screen_body(&controller).await,
        "Pear\nFresh pear\n$3.50 per kg\n10 kg in cart for $35.00\n\nTotal: $35.00"
    );
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Cart));
}

#[tokio::test]
async fn test_menu_button_returns_to_menu() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(10, "Ed");

    start(&controller, &user).await;
    controller
        .handle(&press(&controller, &user, "Apple").await)
        .await
        .unwrap();
    controller
        .handle(&press(&controller, &user, "Menu").await)
        .await
        .unwrap();

    assert_eq!(screen_body(&controller).await, screens::MENU_PROMPT);
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Menu));
}

// ============================================================================
// Checkout
// ============================================================================

async fn checkout(controller: &TestController, user: &TestUser, email: &str) {
    controller
        .handle(&press(controller, user, "Shopping cart").await)
        .await
        .unwrap();
    controller
        .handle(&press(controller, user, "Checkout").await)
        .await
        .unwrap();
    controller.handle(&user.text(email)).await.unwrap();
}

#[tokio::test]
async fn test_checkout_registers_customer_and_returns_to_menu() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(11, "Fay");

    start(&controller, &user).await;
    controller
        .handle(&press(&controller, &user, "Shopping cart").await)
        .await
        .unwrap();
    controller
        .handle(&press(&controller, &user, "Checkout").await)
        .await
        .unwrap();

    let prompt = controller.transport().sent().await.last().cloned().unwrap();
    assert!(matches!(prompt, Sent::Text { ref text, keyboard: None, .. } if text == screens::EMAIL_PROMPT));
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Checkout));

    controller.transport().clear().await;
    controller
        .handle(&user.text("fay@example.com"))
        .await
        .unwrap();

    let sent = controller.transport().sent().await;
    assert!(matches!(&sent[0], Sent::Deleted { message, .. } if *message == MessageId::new(2)));
    assert_eq!(sent[1].body(), Some(screens::THANK_YOU));
    assert_eq!(sent[2].body(), Some(screens::MENU_PROMPT));
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Menu));

    let customers = controller.commerce().customers().await;
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].name, "Fay");
    assert_eq!(customers[0].email.as_str(), "fay@example.com");
}

#[tokio::test]
async fn test_checkout_twice_creates_one_customer() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(12, "Gus");

    start(&controller, &user).await;
    checkout(&controller, &user, "gus@example.com").await;
    checkout(&controller, &user, "  gus@example.com ").await;

    assert_eq!(controller.commerce().customers().await.len(), 1);
    let creates = controller
        .commerce()
        .calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, CommerceCall::CreateCustomer { .. }))
        .count();
    assert_eq!(creates, 1);
}

#[tokio::test]
async fn test_invalid_email_reprompts_without_backend_call() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(13, "Hal");

    start(&controller, &user).await;
    checkout(&controller, &user, "not an email").await;

    let last = controller.transport().sent().await.last().cloned().unwrap();
    assert_eq!(last.body(), Some(screens::INVALID_EMAIL_PROMPT));
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Checkout));
    assert!(
        !controller
            .commerce()
            .calls()
            .await
            .iter()
            .any(|c| matches!(c, CommerceCall::FindCustomer(_)))
    );

    // A valid address afterwards completes checkout.
    controller
        .handle(&user.text("hal@example.com"))
        .await
        .unwrap();
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Menu));
}

// ============================================================================
// Routing errors
// ============================================================================

#[tokio::test]
async fn test_event_before_start_is_no_state() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(20, "Ida");

    let result = controller.handle(&user.press_data(MessageId::new(5), "cart")).await;

    assert!(matches!(result, Err(BotError::Routing(RoutingError::NoState))));
    assert!(controller.transport().sent().await.is_empty());
    assert_eq!(state(&controller, &user).await, None);
}

#[tokio::test]
async fn test_start_works_from_any_state() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(21, "Jo");

    start(&controller, &user).await;
    checkout(&controller, &user, "not an email").await;
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Checkout));

    start(&controller, &user).await;
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Menu));
}

#[tokio::test]
async fn test_unknown_stored_tag_is_fatal() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(22, "Kim");
    controller.store().insert_raw(user.id, "103").await;

    let result = controller.handle(&user.press_data(MessageId::new(5), "menu")).await;

    assert!(matches!(
        result,
        Err(BotError::Routing(RoutingError::UnknownState(tag))) if tag == "103"
    ));
    assert!(controller.transport().sent().await.is_empty());
}

#[tokio::test]
async fn test_unhandled_pairs_are_errors() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(23, "Lu");
    start(&controller, &user).await;

    // Checkout is only offered from the cart.
    let result = controller
        .handle(&user.press_data(MessageId::new(1000), "checkout"))
        .await;
    assert!(matches!(
        result,
        Err(BotError::Routing(RoutingError::Unhandled { state: ConversationState::Menu, .. }))
    ));

    // Free text outside checkout.
    let result = controller.handle(&user.text("hello")).await;
    assert!(matches!(
        result,
        Err(BotError::Routing(RoutingError::Unhandled { state: ConversationState::Menu, .. }))
    ));

    // Unknown commands.
    let result = controller.handle(&user.command("help")).await;
    assert!(matches!(result, Err(BotError::Routing(RoutingError::Unhandled { .. }))));

    assert_eq!(state(&controller, &user).await, Some(ConversationState::Menu));
}

#[tokio::test]
async fn test_malformed_button_data() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(24, "Mo");
    start(&controller, &user).await;

    let result = controller
        .handle(&user.press_data(MessageId::new(1000), "add:p-apple:0"))
        .await;

    assert!(matches!(
        result,
        Err(BotError::Routing(RoutingError::MalformedAction(data))) if data == "add:p-apple:0"
    ));
    assert!(
        !controller
            .commerce()
            .calls()
            .await
            .iter()
            .any(|c| matches!(c, CommerceCall::AddToCart { .. }))
    );
}

#[tokio::test]
async fn test_backend_failure_keeps_state_and_screen() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(25, "Ned");
    start(&controller, &user).await;
    let before = controller.transport().sent().await.len();

    controller.commerce().fail_next(503).await;
    let result = controller
        .handle(&press(&controller, &user, "Apple").await)
        .await;

    assert!(matches!(
        result,
        Err(BotError::Commerce(storebot::commerce::CommerceError::RemoteService { status: 503, .. }))
    ));
    assert_eq!(controller.transport().sent().await.len(), before);
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Menu));
}

#[tokio::test]
async fn test_undeletable_prior_screen_still_advances() {
    let controller = controller(fruit_shop());
    let user = TestUser::new(26, "Ola");
    start(&controller, &user).await;
    controller
        .handle(&press(&controller, &user, "Apple").await)
        .await
        .unwrap();

    // The card has aged past Telegram's deletion window.
    let add = press(&controller, &user, "5 kg").await;
    controller.transport().refuse_deletes();
    controller.transport().clear().await;
    controller.handle(&add).await.unwrap();

    let sent = controller.transport().sent().await;
    assert!(!sent.iter().any(|s| matches!(s, Sent::Deleted { .. })));
    assert!(matches!(&sent[0], Sent::Photo { caption, .. } if caption.starts_with("Apple\n\n")));
    assert!(controller.commerce().calls().await.contains(&CommerceCall::AddToCart {
        cart: CartId::new("26"),
        product: ProductId::new("p-apple"),
        quantity: 5,
    }));
    assert_eq!(state(&controller, &user).await, Some(ConversationState::Product));
}

#[tokio::test]
async fn test_users_have_separate_carts() {
    let controller = controller(fruit_shop());
    let ann = TestUser::new(30, "Ann");
    let bob = TestUser::new(31, "Bob");

    start(&controller, &ann).await;
    controller
        .handle(&press(&controller, &ann, "Apple").await)
        .await
        .unwrap();
    controller
        .handle(&press(&controller, &ann, "10 kg").await)
        .await
        .unwrap();

    start(&controller, &bob).await;
    controller
        .handle(&press(&controller, &bob, "Shopping cart").await)
        .await
        .unwrap();

    assert_eq!(screen_body(&controller).await, "Total: $0.00");
    assert_eq!(state(&controller, &ann).await, Some(ConversationState::Product));
    assert_eq!(state(&controller, &bob).await, Some(ConversationState::Cart));
}
