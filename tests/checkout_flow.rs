use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::executor::block_on;
use regex::Regex;
use serde_json::json;

use vitrine::prelude::*;

fn login_form() -> FormController {
    let rules = RuleSet::new()
        .rule("email", FieldRules::new().required().email())
        .rule("password", FieldRules::new().required().min_length(6));
    FormController::new(FieldMap::new(), rules, FormOptions::default())
}

fn checkout_form() -> FormController {
    let rules = RuleSet::new()
        .rule("shipping_address", FieldRules::new().required())
        .rule(
            "card_number",
            FieldRules::new().required().pattern(
                Regex::new(r"^\d{16}$").expect("card pattern compiles"),
                "Enter a 16-digit card number",
            ),
        )
        .rule(
            "accept_terms",
            FieldRules::new().required_with("You must accept the terms of sale"),
        );
    FormController::new(FieldMap::new(), rules, FormOptions::default())
}

/// Fake of the auth endpoint: one known account, everything else rejected.
fn wire_login_action(controller: &FormController) {
    controller
        .register_submit_action(|values| {
            let body = field_map_to_json(&values);
            async move {
                if body.get("email").and_then(serde_json::Value::as_str)
                    == Some("buyer@vitrine.shop")
                {
                    Ok(json!({
                        "success": true,
                        "message": "Welcome back",
                        "data": { "token": "tok_buyer_1", "role": "buyer" }
                    }))
                } else {
                    Err(ApiError::server(401, "Invalid email or password"))
                }
            }
        })
        .expect("register login action");
}

#[test]
fn login_then_checkout_round_trip() {
    let session = SessionContext::new();

    let login = login_form();
    wire_login_action(&login);
    {
        let session = session.clone();
        login
            .register_success_handler(move |response| {
                let data = &response.payload["data"];
                if let Some(token) = data.get("token").and_then(serde_json::Value::as_str) {
                    let role = data
                        .get("role")
                        .cloned()
                        .and_then(|raw| serde_json::from_value::<Role>(raw).ok())
                        .unwrap_or(Role::Buyer);
                    session.sign_in(token, role);
                }
            })
            .expect("register session handler");
    }

    login
        .set_field("email", "buyer@vitrine.shop")
        .expect("set email");
    login
        .set_field("password", "hunter22")
        .expect("set password");
    let outcome = block_on(login.submit()).expect("login settles");
    assert!(outcome.is_success());
    assert!(session.is_authenticated());
    assert_eq!(session.role(), Some(Role::Buyer));
    assert!(!session.role().expect("role").can_moderate());

    let checkout = checkout_form();
    let orders_placed = Arc::new(AtomicUsize::new(0));
    {
        let session = session.clone();
        let orders_placed = orders_placed.clone();
        checkout
            .register_submit_action(move |values| {
                let token = session.token();
                let orders_placed = orders_placed.clone();
                let body = field_map_to_json(&values);
                async move {
                    if token.is_none() {
                        return Err(ApiError::server(401, "Please sign in to continue"));
                    }
                    assert!(body.get("shipping_address").is_some());
                    orders_placed.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({
                        "success": true,
                        "message": "Order placed",
                        "data": { "order_id": "ord_1001" }
                    }))
                }
            })
            .expect("register checkout action");
    }

    // First attempt: terms never accepted, so the order call must not fire.
    checkout
        .set_field("shipping_address", "12 Rue de la Paix, Paris")
        .expect("set address");
    checkout
        .set_field("card_number", "4242424242424242")
        .expect("set card");
    let blocked = block_on(checkout.submit()).expect("blocked attempt settles");
    match blocked {
        SubmitOutcome::Invalid(errors) => assert_eq!(
            errors.get("accept_terms").map(String::as_str),
            Some("You must accept the terms of sale")
        ),
        other => panic!("expected a validation block, got {other:?}"),
    }
    assert_eq!(orders_placed.load(Ordering::SeqCst), 0);

    checkout
        .set_field("accept_terms", true)
        .expect("accept terms");
    let placed = block_on(checkout.submit()).expect("checkout settles");
    assert!(placed.is_success());
    assert_eq!(orders_placed.load(Ordering::SeqCst), 1);

    let snapshot = checkout.snapshot().expect("snapshot");
    assert_eq!(snapshot.submit_count, 2);
    let response = snapshot.last_response.expect("last response");
    assert_eq!(response.message.as_deref(), Some("Order placed"));
    assert_eq!(
        response.payload["data"]["order_id"].as_str(),
        Some("ord_1001")
    );
}

#[test]
fn checkout_rejects_an_anonymous_session() {
    let session = SessionContext::new();
    let checkout = checkout_form();
    {
        let session = session.clone();
        checkout
            .register_submit_action(move |_values| {
                let token = session.token();
                async move {
                    match token {
                        Some(_) => Ok(json!({ "success": true })),
                        None => Err(ApiError::server(401, "Please sign in to continue")),
                    }
                }
            })
            .expect("register checkout action");
    }

    checkout
        .set_field("shipping_address", "1 Bond Street, London")
        .expect("set address");
    checkout
        .set_field("card_number", "4000056655665556")
        .expect("set card");
    checkout.set_field("accept_terms", true).expect("accept terms");

    let outcome = block_on(checkout.submit()).expect("checkout settles");
    match outcome {
        SubmitOutcome::Failed(failure) => {
            assert_eq!(failure.message, "Please sign in to continue");
            assert_eq!(failure.status, Some(401));
        }
        other => panic!("expected an auth failure, got {other:?}"),
    }
}

#[test]
fn order_review_table_reflects_search_and_sort() {
    let rows: Vec<RowRecord> = [
        ("Silk Scarf", "Maison Lys", 420),
        ("Calfskin Tote", "Atelier Rive", 2890),
        ("Cashmere Coat", "Maison Lys", 3450),
    ]
    .into_iter()
    .map(|(name, brand, price)| {
        BTreeMap::from([
            (ColumnKey::from("item"), CellValue::from(name)),
            (ColumnKey::from("brand"), CellValue::from(brand)),
            (ColumnKey::from("price"), CellValue::from(price as i64)),
        ])
    })
    .collect();

    let table = TableView::new()
        .column(Column::new("item", "Item"))
        .column(Column::new("brand", "Brand"))
        .column(Column::new("price", "Price"))
        .rows(rows)
        .page_size(10);

    let mut query = TableQuery::default();
    on_search_change(&mut query, "maison");
    on_header_click(&mut query, "price");

    let snapshot = table.resolve(&query);
    assert_eq!(snapshot.total_matching, 2);
    assert_eq!(
        snapshot.rows[0]["item"].display(),
        "Silk Scarf",
        "ascending price puts the scarf first"
    );
    assert_eq!(snapshot.rows[1]["item"].display(), "Cashmere Coat");
}
