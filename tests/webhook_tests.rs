mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;

use wallet_engine::error::AppError;
use wallet_engine::models::TransactionStatus;
use wallet_engine::webhook;

#[tokio::test]
async fn test_success_notification_credits_once() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let initiation = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await
        .unwrap();

    // 5000 major units arrive as 500000 kobo.
    let (signature, payload) = common::signed_event("charge.success", &initiation.reference, 500_000);

    let ack = ctx
        .service
        .handle_gateway_notification(&signature, &payload)
        .await
        .unwrap();
    assert!(ack.status);
    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(5000));

    // Replayed delivery acknowledges without a second credit.
    let ack = ctx
        .service
        .handle_gateway_notification(&signature, &payload)
        .await
        .unwrap();
    assert!(ack.status);
    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(5000));

    let status = ctx
        .service
        .get_deposit_status(user_id, &initiation.reference)
        .await
        .unwrap();
    assert_eq!(status.status, TransactionStatus::Success);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_duplicate_deliveries_credit_once() {
    let ctx = Arc::new(common::setup());
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let initiation = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await
        .unwrap();
    let (signature, payload) = common::signed_event("charge.success", &initiation.reference, 500_000);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ctx = ctx.clone();
        let signature = signature.clone();
        let payload = payload.clone();
        handles.push(tokio::spawn(async move {
            ctx.service
                .handle_gateway_notification(&signature, &payload)
                .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().status);
    }

    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(5000));
}

#[tokio::test]
async fn test_forged_signature_never_mutates() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let initiation = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await
        .unwrap();

    let payload = serde_json::json!({
        "event": "charge.success",
        "data": { "reference": initiation.reference, "amount": 500_000 }
    });
    let bytes = serde_json::to_vec(&payload).unwrap();
    let forged = webhook::sign_payload("sk_live_attacker_key", &bytes);

    let result = ctx.service.handle_gateway_notification(&forged, &bytes).await;

    assert!(matches!(result, Err(AppError::InvalidSignature)));
    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(0));
    let status = ctx
        .service
        .get_deposit_status(user_id, &initiation.reference)
        .await
        .unwrap();
    assert_eq!(status.status, TransactionStatus::Pending);
}

#[tokio::test]
async fn test_unknown_reference_is_surfaced() {
    let ctx = common::setup();
    common::funded_wallet(&ctx, dec!(0)).await;

    let (signature, payload) =
        common::signed_event("charge.success", "TXN_000_never_created", 500_000);

    let result = ctx
        .service
        .handle_gateway_notification(&signature, &payload)
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_non_charge_events_are_acknowledged_without_mutation() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let initiation = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await
        .unwrap();

    let (signature, payload) =
        common::signed_event("subscription.create", &initiation.reference, 500_000);

    let ack = ctx
        .service
        .handle_gateway_notification(&signature, &payload)
        .await
        .unwrap();

    assert!(ack.status);
    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(0));
}

#[tokio::test]
async fn test_failed_charge_is_terminal() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let initiation = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await
        .unwrap();

    let (signature, payload) =
        common::signed_event("charge.failed", &initiation.reference, 500_000);
    let ack = ctx
        .service
        .handle_gateway_notification(&signature, &payload)
        .await
        .unwrap();
    assert!(ack.status);

    let status = ctx
        .service
        .get_deposit_status(user_id, &initiation.reference)
        .await
        .unwrap();
    assert_eq!(status.status, TransactionStatus::Failed);

    // A late success for the failed reference is acknowledged but the
    // status never reverses and nothing is credited.
    let (signature, payload) =
        common::signed_event("charge.success", &initiation.reference, 500_000);
    let ack = ctx
        .service
        .handle_gateway_notification(&signature, &payload)
        .await
        .unwrap();
    assert!(ack.status);

    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(0));
    let status = ctx
        .service
        .get_deposit_status(user_id, &initiation.reference)
        .await
        .unwrap();
    assert_eq!(status.status, TransactionStatus::Failed);
}

#[tokio::test]
async fn test_failure_never_reverses_settled_deposit() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let initiation = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await
        .unwrap();
    let (signature, payload) =
        common::signed_event("charge.success", &initiation.reference, 500_000);
    ctx.service
        .handle_gateway_notification(&signature, &payload)
        .await
        .unwrap();
    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(5000));

    // A stray failure for the settled reference is acknowledged but the
    // credit stands.
    let (signature, payload) =
        common::signed_event("charge.failed", &initiation.reference, 500_000);
    let ack = ctx
        .service
        .handle_gateway_notification(&signature, &payload)
        .await
        .unwrap();
    assert!(ack.status);

    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(5000));
    let status = ctx
        .service
        .get_deposit_status(user_id, &initiation.reference)
        .await
        .unwrap();
    assert_eq!(status.status, TransactionStatus::Success);
}

#[tokio::test]
async fn test_mismatched_payload_amount_credits_initiated_amount() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let initiation = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await
        .unwrap();

    // Gateway reports 9000 major units; the amount recorded at
    // initiation is authoritative.
    let (signature, payload) =
        common::signed_event("charge.success", &initiation.reference, 900_000);
    let ack = ctx
        .service
        .handle_gateway_notification(&signature, &payload)
        .await
        .unwrap();

    assert!(ack.status);
    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(5000));
}

#[tokio::test]
async fn test_malformed_payload_with_valid_signature_rejected() {
    let ctx = common::setup();

    let bytes = b"not json at all".to_vec();
    let signature = webhook::sign_payload(common::TEST_SECRET, &bytes);

    let result = ctx.service.handle_gateway_notification(&signature, &bytes).await;

    assert!(matches!(result, Err(AppError::InvalidOperation(_))));
}
