use super::*;

fn status(order_status: Option<OrderStatus>, payment_status: Option<PaymentStatus>) -> StatusChange {
    StatusChange {
        order_status,
        payment_status,
    }
}

// ========================================================================
// Status
// ========================================================================

#[tokio::test]
async fn test_confirm_without_payment_is_conflict() {
    let h = harness();
    let order = two_item_order(&h).await;

    let result = h.manager.set_status(
        &admin(),
        &order.order_id,
        status(Some(OrderStatus::Confirmed), None),
        None,
    );
    assert!(matches!(
        result,
        Err(ManagerError::StateConflict(ErrorCode::PaymentRequired, _))
    ));

    let app: shared::error::AppError = result.unwrap_err().into();
    assert_eq!(app.kind(), shared::error::ErrorKind::StateConflict);
    assert_eq!(h.manager.get_order(&admin(), &order.order_id).unwrap(), order);
}

#[tokio::test]
async fn test_confirm_and_pay_in_one_update() {
    let h = harness();
    let order = two_item_order(&h).await;

    let order = h
        .manager
        .set_status(
            &admin(),
            &order.order_id,
            status(Some(OrderStatus::Confirmed), Some(PaymentStatus::Paid)),
            None,
        )
        .unwrap();
    assert_eq!(order.order_status, OrderStatus::Confirmed);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.updated_by.as_deref(), Some("admin-1"));
}

#[tokio::test]
async fn test_set_status_requires_admin() {
    let h = harness();
    let order = two_item_order(&h).await;
    assert!(matches!(
        h.manager.set_status(
            &customer(),
            &order.order_id,
            status(Some(OrderStatus::Cancelled), None),
            None
        ),
        Err(ManagerError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn test_strict_transitions_keep_cancelled_final() {
    let config = LedgerConfig {
        strict_status_transitions: true,
        ..test_config()
    };
    let h = harness_with(config, MemoryFileStore::default());
    let order = two_item_order(&h).await;

    h.manager
        .set_status(&admin(), &order.order_id, status(Some(OrderStatus::Cancelled), None), None)
        .unwrap();
    let result = h.manager.set_status(
        &admin(),
        &order.order_id,
        status(Some(OrderStatus::Processing), None),
        None,
    );
    assert!(matches!(
        result,
        Err(ManagerError::StateConflict(ErrorCode::InvalidStatusTransition, _))
    ));
    assert_eq!(
        h.manager.get_order(&admin(), &order.order_id).unwrap().order_status,
        OrderStatus::Cancelled
    );
}

#[tokio::test]
async fn test_confirm_payment_marks_paid_and_clears_cart() {
    let h = harness();
    let actor = customer();
    let order = h
        .manager
        .create_order(&actor, checkout(vec![item_input("p-a", 1)]))
        .await
        .unwrap();
    h.manager
        .save_cart(
            &actor,
            Cart {
                items: vec![CartItem {
                    product_id: "p-b".to_string(),
                    quantity: 1,
                    selection: Selection::Original,
                }],
                updated_at: 0,
            },
        )
        .unwrap();

    let order = h
        .manager
        .confirm_payment(&actor, &order.order_id, "pay_42", Some(order.revision))
        .unwrap();

    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.order_status, OrderStatus::Confirmed);
    assert_eq!(order.payment_id.as_deref(), Some("pay_42"));
    assert!(h.manager.get_cart(&actor).unwrap().is_empty());

    assert!(matches!(
        h.manager.confirm_payment(&other_customer(), &order.order_id, "pay_43", None),
        Err(ManagerError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn test_repeated_confirm_payment_still_clears_cart() {
    let h = harness();
    let actor = customer();
    let order = h
        .manager
        .create_order(&actor, checkout(vec![item_input("p-a", 1)]))
        .await
        .unwrap();
    let paid = h
        .manager
        .confirm_payment(&actor, &order.order_id, "pay_42", None)
        .unwrap();

    h.manager
        .save_cart(
            &actor,
            Cart {
                items: vec![CartItem {
                    product_id: "p-b".to_string(),
                    quantity: 1,
                    selection: Selection::Original,
                }],
                updated_at: 0,
            },
        )
        .unwrap();
    let mut rx = h.manager.subscribe();

    let again = h
        .manager
        .confirm_payment(&actor, &order.order_id, "pay_42", None)
        .unwrap();

    assert_eq!(again, paid);
    assert!(h.manager.get_cart(&actor).unwrap().is_empty());
    assert_eq!(
        h.manager.get_order(&actor, &order.order_id).unwrap().revision,
        paid.revision
    );
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

// ========================================================================
// Proofs
// ========================================================================

#[tokio::test]
async fn test_attach_proof_requires_processing() {
    let h = harness();
    let order = two_item_order(&h).await;
    let file = StoredFile {
        url: "https://files.test/pay.png".to_string(),
        storage_id: "pay.png".to_string(),
        uploaded_at: 1,
    };

    let result = h.manager.attach_proof(
        &customer(),
        &order.order_id,
        ProofKind::Payment,
        file.clone(),
        None,
    );
    assert!(matches!(
        result,
        Err(ManagerError::StateConflict(ErrorCode::OrderNotProcessing, _))
    ));

    processing(&h, &order.order_id);
    let order = h
        .manager
        .attach_proof(&customer(), &order.order_id, ProofKind::Payment, file, None)
        .unwrap();
    assert_eq!(order.payment_status, PaymentStatus::PendingVerification);
    assert_eq!(order.payment_proof.as_ref().unwrap().storage_id, "pay.png");
}

#[tokio::test]
async fn test_upload_payment_proof() {
    let h = harness();
    let order = two_item_order(&h).await;
    processing(&h, &order.order_id);

    let updated = h
        .manager
        .upload_proof(
            &customer(),
            &order.order_id,
            ProofKind::Payment,
            b"png-bytes".to_vec(),
            "receipt.PNG",
            None,
        )
        .await
        .unwrap();

    let destination = format!("users/user-1/payment-proofs/payment-{}.png", order.order_id);
    assert_eq!(h.files.stored(&destination).as_deref(), Some(&b"png-bytes"[..]));
    let proof = updated.payment_proof.unwrap();
    assert_eq!(proof.storage_id, destination);
    assert_eq!(proof.url, format!("https://files.test/{destination}"));
    assert_eq!(updated.payment_status, PaymentStatus::PendingVerification);
}

#[tokio::test]
async fn test_upload_address_proof_by_non_owner_never_uploads() {
    let h = harness();
    let order = two_item_order(&h).await;
    processing(&h, &order.order_id);

    let result = h
        .manager
        .upload_proof(
            &other_customer(),
            &order.order_id,
            ProofKind::Address,
            b"pdf".to_vec(),
            "lease.pdf",
            None,
        )
        .await;
    assert!(matches!(result, Err(ManagerError::PermissionDenied(_))));
    assert_eq!(h.files.len(), 0);
}

#[tokio::test]
async fn test_failed_upload_leaves_order_untouched() {
    let h = harness_with(test_config(), MemoryFileStore::failing());
    let order = two_item_order(&h).await;
    let order = processing(&h, &order.order_id);

    let result = h
        .manager
        .upload_proof(
            &customer(),
            &order.order_id,
            ProofKind::Payment,
            b"png".to_vec(),
            "pay.png",
            None,
        )
        .await;
    assert!(matches!(result, Err(ManagerError::UploadFailed(_))));

    let app: shared::error::AppError = result.unwrap_err().into();
    assert_eq!(app.kind(), shared::error::ErrorKind::Dependency);
    assert_eq!(h.manager.get_order(&admin(), &order.order_id).unwrap(), order);
}

#[tokio::test]
async fn test_upload_timeout_leaves_order_untouched() {
    let config = LedgerConfig {
        upload_timeout_ms: 50,
        ..test_config()
    };
    let h = harness_with(config, MemoryFileStore::slow(Duration::from_secs(2)));
    let order = two_item_order(&h).await;
    let order = processing(&h, &order.order_id);

    let result = h
        .manager
        .upload_proof(
            &customer(),
            &order.order_id,
            ProofKind::Address,
            b"pdf".to_vec(),
            "proof.pdf",
            None,
        )
        .await;
    assert!(matches!(result, Err(ManagerError::Timeout(_))));
    assert_eq!(h.manager.get_order(&admin(), &order.order_id).unwrap(), order);
}

#[tokio::test]
async fn test_empty_proof_is_validation_error() {
    let h = harness();
    let order = two_item_order(&h).await;
    processing(&h, &order.order_id);

    let result = h
        .manager
        .upload_proof(&customer(), &order.order_id, ProofKind::Payment, Vec::new(), "x.png", None)
        .await;
    assert!(matches!(
        result,
        Err(ManagerError::Validation(ErrorCode::EmptyFile, _))
    ));
}

// ========================================================================
// Invoice
// ========================================================================

#[tokio::test]
async fn test_generate_invoice_records_url_after_upload() {
    let h = harness();
    let order = two_item_order(&h).await;

    let invoice = h
        .manager
        .generate_invoice(&admin(), &order.order_id)
        .await
        .unwrap();

    let destination = format!("users/user-1/invoices/invoice-{}.txt", order.order_id);
    assert_eq!(invoice.file_name, format!("invoice-{}.txt", order.order_id));
    assert_eq!(invoice.content_type, "text/plain");
    assert_eq!(h.files.stored(&destination), Some(invoice.document.clone()));

    let text = String::from_utf8(invoice.document).unwrap();
    assert!(text.contains(&order.order_number));
    assert!(text.contains("260.00"));

    let recorded = invoice.order.invoice.unwrap();
    assert_eq!(recorded.storage_id, destination);
    assert_eq!(invoice.order.revision, order.revision + 1);
}

#[tokio::test]
async fn test_generate_invoice_requires_admin() {
    let h = harness();
    let order = two_item_order(&h).await;
    assert!(matches!(
        h.manager.generate_invoice(&customer(), &order.order_id).await,
        Err(ManagerError::PermissionDenied(_))
    ));
    assert_eq!(h.files.len(), 0);
}

#[tokio::test]
async fn test_invoice_not_recorded_when_order_changes_during_upload() {
    let storage = OrderStorage::open_in_memory().unwrap();
    let seed = harness_on(storage.clone(), test_config(), MemoryFileStore::default());
    let order = two_item_order(&seed).await;

    let racing = MemoryFileStore {
        race: Some((storage.clone(), order.order_id.clone())),
        ..Default::default()
    };
    let h = harness_on(storage, test_config(), racing);

    let result = h.manager.generate_invoice(&admin(), &order.order_id).await;
    assert!(matches!(result, Err(ManagerError::RevisionConflict { .. })));

    let stored = h.manager.get_order(&admin(), &order.order_id).unwrap();
    assert!(stored.invoice.is_none());
    assert_eq!(stored.revision, order.revision + 1);
}

#[tokio::test]
async fn test_failed_invoice_upload_records_nothing() {
    let h = harness_with(test_config(), MemoryFileStore::failing());
    let order = two_item_order(&h).await;

    assert!(matches!(
        h.manager.generate_invoice(&admin(), &order.order_id).await,
        Err(ManagerError::UploadFailed(_))
    ));
    assert!(h
        .manager
        .get_order(&admin(), &order.order_id)
        .unwrap()
        .invoice
        .is_none());
}

// ========================================================================
// Reorder
// ========================================================================

#[tokio::test]
async fn test_reorder_uses_current_catalog_price_and_default_gst() {
    let h = harness();
    let actor = customer();
    let original = h
        .manager
        .create_order(&actor, checkout(vec![item_input("p-a", 2)]))
        .await
        .unwrap();
    assert_eq!(original.items[0].price, 100.0);

    h.catalog.upsert(product("p-a", "Product A", 110.0, 130.0));

    let reordered = h
        .manager
        .reorder(
            &actor,
            ReorderInput {
                items: vec![item_input("p-a", 2)],
                address: None,
            },
        )
        .await
        .unwrap();

    assert_ne!(reordered.order_id, original.order_id);
    assert_ne!(reordered.order_number, original.order_number);
    assert_eq!(reordered.source, OrderSource::Reorder);
    assert_eq!(reordered.order_status, OrderStatus::Pending);
    assert_eq!(reordered.items[0].price, 110.0);
    assert_eq!(reordered.items[0].gst_percentage, 18.0);
    assert_eq!(reordered.subtotal, 220.0);
    assert_eq!(reordered.gst_total, 39.6);
    assert_eq!(reordered.final_total, 259.6);
    // Address falls back to the customer's latest order
    assert_eq!(reordered.address, Some(address()));
    assert_total_identity(&reordered);

    // The earlier order keeps its frozen price
    let original = h.manager.get_order(&actor, &original.order_id).unwrap();
    assert_eq!(original.items[0].price, 100.0);
}

#[tokio::test]
async fn test_reorder_rejects_empty_and_unknown_items() {
    let h = harness();
    let actor = customer();

    assert!(matches!(
        h.manager
            .reorder(
                &actor,
                ReorderInput {
                    items: vec![],
                    address: None
                }
            )
            .await,
        Err(ManagerError::Validation(..))
    ));

    h.catalog.remove("p-b");
    assert!(matches!(
        h.manager
            .reorder(
                &actor,
                ReorderInput {
                    items: vec![item_input("p-b", 1)],
                    address: Some(address()),
                }
            )
            .await,
        Err(ManagerError::ProductNotFound(_))
    ));
    assert!(h.manager.order_history(&actor).unwrap().is_empty());
}
