//! End-to-end workflow tests over an in-memory database: receiving and
//! consuming stock, corrections, and the full counting cycle.

use oficina_core::{MovementDirection, MovementKind, OperationContext, SessionStatus};
use oficina_db::{Database, DbConfig, MovementFilter, MovementSortKey, SortOrder};
use oficina_services::{Api, NewProduct, RecordMovement, ServiceError, Services};

async fn setup() -> (Services, OperationContext) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    (Services::new(db), OperationContext::new("tester"))
}

fn oil_filter() -> NewProduct {
    NewProduct {
        code: "FLT-OIL-001".to_string(),
        name: "Oil filter".to_string(),
        description: None,
        category_id: None,
        supplier_id: None,
        cost_cents: 1450,
        sale_price_cents: 2890,
        min_quantity: 10,
        max_quantity: 100,
    }
}

fn entry(product_id: &str, quantity: i64) -> RecordMovement {
    RecordMovement {
        product_id: product_id.to_string(),
        kind: MovementKind::Entry,
        direction: None,
        quantity,
        unit_value_cents: 1450,
        document_ref: Some("NF-2041".to_string()),
        moved_at: None,
    }
}

fn exit(product_id: &str, quantity: i64) -> RecordMovement {
    RecordMovement {
        product_id: product_id.to_string(),
        kind: MovementKind::Exit,
        direction: None,
        quantity,
        unit_value_cents: 0,
        document_ref: Some("OS-1118".to_string()),
        moved_at: None,
    }
}

#[tokio::test]
async fn receive_then_consume_updates_ledger_and_snapshots() {
    let (services, ctx) = setup().await;
    let product = services.products().create(&ctx, oil_filter()).await.unwrap();
    assert_eq!(product.quantity, 0);

    let received = services.stock().record(&ctx, entry(&product.id, 100)).await.unwrap();
    assert_eq!(received.direction, MovementDirection::In);
    assert_eq!(received.quantity_before, 0);
    assert_eq!(received.quantity_after, 100);

    let consumed = services.stock().record(&ctx, exit(&product.id, 30)).await.unwrap();
    assert_eq!(consumed.direction, MovementDirection::Out);
    assert_eq!(consumed.quantity_before, 100);
    assert_eq!(consumed.quantity_after, 70);

    let product = services.products().get(&product.id).await.unwrap();
    assert_eq!(product.quantity, 70);
}

#[tokio::test]
async fn overdraw_is_rejected_and_ledger_untouched() {
    let (services, ctx) = setup().await;
    let product = services.products().create(&ctx, oil_filter()).await.unwrap();
    services.stock().record(&ctx, entry(&product.id, 70)).await.unwrap();

    let err = services
        .stock()
        .record(&ctx, exit(&product.id, 80))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE");
    assert!(err.to_string().contains("available 70"));

    let product = services.products().get(&product.id).await.unwrap();
    assert_eq!(product.quantity, 70);

    // Only the entry made it into the history.
    let history = services
        .stock()
        .history(
            &MovementFilter {
                product_id: Some(product.id.clone()),
                ..Default::default()
            },
            MovementSortKey::MovedAt,
            SortOrder::Desc,
            50,
            0,
        )
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn adjustment_requires_direction_and_clamps() {
    let (services, ctx) = setup().await;
    let product = services.products().create(&ctx, oil_filter()).await.unwrap();
    services.stock().record(&ctx, entry(&product.id, 10)).await.unwrap();

    let missing_direction = RecordMovement {
        kind: MovementKind::Adjustment,
        direction: None,
        ..entry(&product.id, 5)
    };
    let err = services
        .stock()
        .record(&ctx, missing_direction)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");

    // An out-adjustment larger than the balance clamps at zero instead of
    // being rejected.
    let big_shrink = RecordMovement {
        kind: MovementKind::Adjustment,
        direction: Some(MovementDirection::Out),
        ..entry(&product.id, 25)
    };
    let adjustment = services.stock().record(&ctx, big_shrink).await.unwrap();
    assert_eq!(adjustment.quantity_after, 0);

    let product = services.products().get(&product.id).await.unwrap();
    assert_eq!(product.quantity, 0);
}

#[tokio::test]
async fn correction_appends_compensating_adjustment() {
    let (services, ctx) = setup().await;
    let product = services.products().create(&ctx, oil_filter()).await.unwrap();
    services.stock().record(&ctx, entry(&product.id, 100)).await.unwrap();
    let exit_movement = services.stock().record(&ctx, exit(&product.id, 30)).await.unwrap();

    // The exit should have been 20: correction puts 10 back.
    let correction = services
        .stock()
        .correct(&ctx, &exit_movement.id, 20, None)
        .await
        .unwrap();
    assert_eq!(correction.kind, MovementKind::Adjustment);
    assert_eq!(correction.direction, MovementDirection::In);
    assert_eq!(correction.quantity, 10);
    assert_eq!(correction.correction_of.as_deref(), Some(exit_movement.id.as_str()));

    let product = services.products().get(&product.id).await.unwrap();
    assert_eq!(product.quantity, 80);

    // The original row is untouched.
    let original = services.stock().get(&exit_movement.id).await.unwrap();
    assert_eq!(original.quantity, 30);

    // A no-op correction is rejected.
    let err = services
        .stock()
        .correct(&ctx, &correction.id, 10, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE");

    // The corrected movement is now protected from deletion.
    let err = services
        .stock()
        .delete(&ctx, &exit_movement.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE");
}

#[tokio::test]
async fn correcting_a_clamped_movement_lands_on_the_intended_quantity() {
    let (services, ctx) = setup().await;
    let product = services.products().create(&ctx, oil_filter()).await.unwrap();
    services.stock().record(&ctx, entry(&product.id, 10)).await.unwrap();

    // Out 25 against a balance of 10 clamps: only 10 actually left the
    // ledger.
    let clamped = services
        .stock()
        .record(
            &ctx,
            RecordMovement {
                kind: MovementKind::Adjustment,
                direction: Some(MovementDirection::Out),
                ..entry(&product.id, 25)
            },
        )
        .await
        .unwrap();
    assert_eq!(clamped.quantity_before, 10);
    assert_eq!(clamped.quantity_after, 0);

    // The adjustment should have been Out 5. The compensation must be
    // measured against what the clamp actually removed (10), not the
    // nominal 25 - otherwise 20 phantom units would appear.
    let correction = services
        .stock()
        .correct(&ctx, &clamped.id, 5, None)
        .await
        .unwrap();
    assert_eq!(correction.direction, MovementDirection::In);
    assert_eq!(correction.quantity, 5);

    let product = services.products().get(&product.id).await.unwrap();
    assert_eq!(product.quantity, 5);

    // Re-stating the applied quantity is a no-op.
    let err = services
        .stock()
        .correct(&ctx, &correction.id, 5, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE");
}

#[tokio::test]
async fn envelope_boundary_wraps_success_and_failure() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let api = Api::new(db);
    let ctx = OperationContext::new("tester");

    let created = api.create_product(&ctx, oil_filter()).await;
    assert!(created.success);
    assert_eq!(created.message, "Product created");
    let product = created.data.unwrap();
    assert!(created.errors.is_empty());

    let recorded = api.record_movement(&ctx, entry(&product.id, 70)).await;
    assert!(recorded.success);
    assert_eq!(recorded.data.unwrap().quantity_after, 70);

    // An overdraw comes back as an envelope, not an Err.
    let rejected = api.record_movement(&ctx, exit(&product.id, 80)).await;
    assert!(!rejected.success);
    assert!(rejected.data.is_none());
    assert_eq!(rejected.errors[0].code, "BUSINESS_RULE");
    assert!(rejected.message.contains("available 70"));

    // Same for a missing entity.
    let missing = api.get_product("nope").await;
    assert!(!missing.success);
    assert_eq!(missing.errors[0].code, "NOT_FOUND");

    // The whole counting cycle is reachable through the boundary.
    let opened = api.open_session(&ctx, "Envelope count", None).await;
    assert!(opened.success);
    let detail = opened.data.unwrap();
    let started = api.start_session(&ctx, &detail.session.id).await;
    assert!(started.success);
    let counted = api
        .record_count(&ctx, &detail.session.id, &detail.lines[0].id, 68, None)
        .await;
    assert!(counted.success);
    let finalized = api.finalize_session(&ctx, &detail.session.id).await;
    assert!(finalized.success);
    assert_eq!(finalized.data.unwrap().movements.len(), 1);
}

#[tokio::test]
async fn manual_inventory_count_movement_is_rejected() {
    let (services, ctx) = setup().await;
    let product = services.products().create(&ctx, oil_filter()).await.unwrap();

    let manual = RecordMovement {
        kind: MovementKind::InventoryCount,
        direction: Some(MovementDirection::In),
        ..entry(&product.id, 5)
    };
    let err = services.stock().record(&ctx, manual).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION");
}

#[tokio::test]
async fn full_inventory_cycle() {
    let (services, ctx) = setup().await;
    let short = services.products().create(&ctx, oil_filter()).await.unwrap();
    let exact = services
        .products()
        .create(
            &ctx,
            NewProduct {
                code: "BRK-PAD-010".to_string(),
                name: "Brake pad set".to_string(),
                ..oil_filter()
            },
        )
        .await
        .unwrap();
    services.stock().record(&ctx, entry(&short.id, 70)).await.unwrap();
    services.stock().record(&ctx, entry(&exact.id, 10)).await.unwrap();

    let detail = services
        .inventory()
        .open(&ctx, "Quarterly count", None)
        .await
        .unwrap();
    assert_eq!(detail.session.status, SessionStatus::Planned);
    assert_eq!(detail.lines.len(), 2);
    assert!(detail.lines.iter().all(|l| l.counted_quantity.is_none()));

    // Counting before start is rejected.
    let line_short = detail
        .lines
        .iter()
        .find(|l| l.product_id == short.id)
        .unwrap()
        .clone();
    let err = services
        .inventory()
        .count(&ctx, &detail.session.id, &line_short.id, 65, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE");

    services.inventory().start(&ctx, &detail.session.id).await.unwrap();
    services
        .inventory()
        .count(&ctx, &detail.session.id, &line_short.id, 65, Some("shelf B3"))
        .await
        .unwrap();
    let line_exact = detail
        .lines
        .iter()
        .find(|l| l.product_id == exact.id)
        .unwrap();
    services
        .inventory()
        .count(&ctx, &detail.session.id, &line_exact.id, 10, None)
        .await
        .unwrap();

    let divergences = services
        .inventory()
        .divergences(&detail.session.id)
        .await
        .unwrap();
    assert_eq!(divergences.len(), 1);
    assert_eq!(divergences[0].divergence, -5);

    let report = services
        .inventory()
        .finalize(&ctx, &detail.session.id)
        .await
        .unwrap();
    assert_eq!(report.session.status, SessionStatus::Finalized);
    assert_eq!(report.lines_counted, 2);
    assert_eq!(report.lines_uncounted, 0);
    assert_eq!(report.movements.len(), 1);
    assert_eq!(report.movements[0].kind, MovementKind::InventoryCount);
    assert_eq!(report.movements[0].direction, MovementDirection::Out);
    assert_eq!(report.movements[0].quantity, 5);

    let short = services.products().get(&short.id).await.unwrap();
    assert_eq!(short.quantity, 65);
    let exact = services.products().get(&exact.id).await.unwrap();
    assert_eq!(exact.quantity, 10);

    // Finalize is irreversible.
    let err = services
        .inventory()
        .finalize(&ctx, &report.session.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE");

    // The reconciliation movement is session-owned and protected.
    let err = services
        .stock()
        .delete(&ctx, &report.movements[0].id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE");
}

#[tokio::test]
async fn uncounted_lines_are_skipped_at_finalization() {
    let (services, ctx) = setup().await;
    let counted = services.products().create(&ctx, oil_filter()).await.unwrap();
    let skipped = services
        .products()
        .create(
            &ctx,
            NewProduct {
                code: "SPK-PLG-004".to_string(),
                name: "Spark plug".to_string(),
                ..oil_filter()
            },
        )
        .await
        .unwrap();
    services.stock().record(&ctx, entry(&counted.id, 40)).await.unwrap();
    services.stock().record(&ctx, entry(&skipped.id, 40)).await.unwrap();

    let detail = services.inventory().open(&ctx, "Spot check", None).await.unwrap();
    services.inventory().start(&ctx, &detail.session.id).await.unwrap();

    let line = detail
        .lines
        .iter()
        .find(|l| l.product_id == counted.id)
        .unwrap();
    services
        .inventory()
        .count(&ctx, &detail.session.id, &line.id, 38, None)
        .await
        .unwrap();

    let report = services.inventory().finalize(&ctx, &detail.session.id).await.unwrap();
    assert_eq!(report.lines_counted, 1);
    assert_eq!(report.lines_uncounted, 1);
    assert_eq!(report.movements.len(), 1);

    // The uncounted product keeps its ledger quantity.
    let skipped = services.products().get(&skipped.id).await.unwrap();
    assert_eq!(skipped.quantity, 40);
}

#[tokio::test]
async fn single_open_session_and_cancel() {
    let (services, ctx) = setup().await;
    let product = services.products().create(&ctx, oil_filter()).await.unwrap();
    services.stock().record(&ctx, entry(&product.id, 10)).await.unwrap();

    let first = services.inventory().open(&ctx, "First", None).await.unwrap();

    let err = services
        .inventory()
        .open(&ctx, "Second", None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");

    let cancelled = services
        .inventory()
        .cancel(&ctx, &first.session.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, SessionStatus::Cancelled);

    // Cancellation reconciles nothing.
    let product = services.products().get(&product.id).await.unwrap();
    assert_eq!(product.quantity, 10);

    // And unblocks the next cycle.
    let second = services.inventory().open(&ctx, "Second", None).await.unwrap();
    assert_eq!(second.session.status, SessionStatus::Planned);
    assert!(services.inventory().open_session().await.unwrap().is_some());
}

#[tokio::test]
async fn product_with_history_cannot_be_hard_deleted() {
    let (services, ctx) = setup().await;
    let fresh = services.products().create(&ctx, oil_filter()).await.unwrap();
    let used = services
        .products()
        .create(
            &ctx,
            NewProduct {
                code: "OIL-5W30-1L".to_string(),
                name: "Engine oil".to_string(),
                ..oil_filter()
            },
        )
        .await
        .unwrap();
    services.stock().record(&ctx, entry(&used.id, 5)).await.unwrap();

    // No history: hard delete is fine.
    services.products().delete(&ctx, &fresh.id).await.unwrap();
    let err = services.products().get(&fresh.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // With history: rejected, deactivate instead.
    let err = services.products().delete(&ctx, &used.id).await.unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE");

    services.products().deactivate(&ctx, &used.id).await.unwrap();
    assert!(services.products().list(100).await.unwrap().is_empty());

    // Inactive products refuse new movements.
    let err = services.stock().record(&ctx, entry(&used.id, 1)).await.unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE");
}

#[tokio::test]
async fn duplicate_code_is_a_conflict() {
    let (services, ctx) = setup().await;
    services.products().create(&ctx, oil_filter()).await.unwrap();

    let err = services.products().create(&ctx, oil_filter()).await.unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
}
