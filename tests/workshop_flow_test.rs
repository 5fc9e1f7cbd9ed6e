mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use uuid::Uuid;
use workshop_api::{
    entities::job_card::JobStatus,
    errors::ServiceError,
    services::{
        invoicing::{GenerateInvoiceRequest, RecordPaymentRequest},
        job_cards::{NewJobCard, NewServiceTask},
        qc::{NewChecklistItem, QcVerdict},
        requisitions::NewRequisitionItem,
    },
};

use common::{admin, technician, TestApp};

fn new_job(ticket_id: Uuid) -> NewJobCard {
    NewJobCard {
        ticket_id,
        technician_id: None,
        notes: None,
        estimated_completion_at: None,
    }
}

fn passing_checklist() -> Vec<NewChecklistItem> {
    vec![NewChecklistItem {
        category: "brakes".into(),
        description: "pads seated, lever firm".into(),
        passed: true,
        photo_url: None,
    }]
}

#[tokio::test]
async fn full_job_lifecycle_from_intake_to_delivery() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);
    let reviewer = admin(dealer);

    let product = app.seed_product(dealer, "BP-001", 10, dec!(40.00)).await;

    // Intake and work start.
    let job = app
        .services
        .job_cards
        .create(&tech, new_job(Uuid::new_v4()))
        .await
        .unwrap();
    assert_eq!(job.status, "pending");

    let job = app.services.job_cards.start_work(&tech, job.id).await.unwrap();
    assert_eq!(job.status, "in_progress");

    app.services
        .job_cards
        .add_task(
            &tech,
            job.id,
            NewServiceTask {
                name: "Replace front brake pads".into(),
                description: None,
            },
        )
        .await
        .unwrap();

    // Requisition two pads; price is snapshotted from the catalog.
    let group = app
        .services
        .requisitions
        .create_group(
            &tech,
            job.id,
            vec![NewRequisitionItem {
                product_id: product.id,
                quantity: 2,
                notes: None,
            }],
        )
        .await
        .unwrap();
    assert_eq!(group.items.len(), 1);
    assert_eq!(group.items[0].unit_price, dec!(40.00));
    assert_eq!(group.items[0].total_price, dec!(80.00));

    // Stock is untouched until approval.
    let untouched = app.services.inventory.get_product(&tech, product.id).await.unwrap();
    assert_eq!(untouched.stock_quantity, 10);

    let outcome = app
        .services
        .requisitions
        .approve_group(&reviewer, group.requisition_group_id)
        .await
        .unwrap();
    assert_eq!(outcome.succeeded.len(), 1);
    assert!(outcome.failed.is_empty());

    let debited = app.services.inventory.get_product(&tech, product.id).await.unwrap();
    assert_eq!(debited.stock_quantity, 8);

    let (movements, total) = app
        .services
        .inventory
        .list_movements(&tech, product.id, 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(movements[0].quantity_before, 10);
    assert_eq!(movements[0].quantity_change, -2);
    assert_eq!(movements[0].quantity_after, 8);
    assert_eq!(movements[0].reference_type, "requisition");

    // QC round: requested by the technician, settled by someone else.
    let (job, request) = app
        .services
        .job_cards
        .submit_for_qc(&tech, job.id, None)
        .await
        .unwrap();
    assert_eq!(job.status, "qc_requested");
    assert_eq!(request.status, "pending");

    let detail = app
        .services
        .qc
        .review(
            &reviewer,
            request.id,
            QcVerdict {
                approved: true,
                notes: None,
                checklist: passing_checklist(),
            },
        )
        .await
        .unwrap();
    assert_eq!(detail.request.status, "approved");
    assert_eq!(detail.checklist.len(), 1);

    let job = app.services.job_cards.get(&tech, job.id).await.unwrap();
    assert_eq!(job.status, "qc_approved");

    // Invoice: 1 labor line at 75 + parts 80 = 155; 20% discount, then the
    // configured 10% tax on the 124 that remains.
    let invoice = app
        .services
        .invoicing
        .generate_invoice(
            &reviewer,
            job.id,
            GenerateInvoiceRequest {
                tax_pct: None,
                discount_pct: Some(dec!(20)),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(invoice.items.len(), 2);
    assert_eq!(invoice.invoice.subtotal, dec!(155.00));
    assert_eq!(invoice.invoice.discount_amount, dec!(31.00));
    assert_eq!(invoice.invoice.tax_amount, dec!(12.40));
    assert_eq!(invoice.invoice.grand_total, dec!(136.40));
    assert_eq!(invoice.invoice.due_amount, dec!(136.40));
    assert_eq!(invoice.invoice.payment_status, "unpaid");

    let job = app.services.job_cards.get(&tech, job.id).await.unwrap();
    assert_eq!(job.status, "completed");

    // Partial payment keeps paid + due == grand_total.
    let after_partial = app
        .services
        .invoicing
        .record_payment(
            &reviewer,
            invoice.invoice.id,
            RecordPaymentRequest {
                amount: dec!(100.00),
                method: "cash".into(),
                reference: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(after_partial.invoice.paid_amount, dec!(100.00));
    assert_eq!(after_partial.invoice.due_amount, dec!(36.40));
    assert_eq!(
        after_partial.invoice.paid_amount + after_partial.invoice.due_amount,
        after_partial.invoice.grand_total
    );
    assert_eq!(after_partial.invoice.payment_status, "partial");
    assert_eq!(after_partial.invoice.status, "issued");

    // Settlement completes the invoice and delivers the job.
    let settled = app
        .services
        .invoicing
        .record_payment(
            &reviewer,
            invoice.invoice.id,
            RecordPaymentRequest {
                amount: dec!(36.40),
                method: "card".into(),
                reference: Some("AUTH-1234".into()),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(settled.invoice.payment_status, "paid");
    assert_eq!(settled.invoice.status, "completed");
    assert_eq!(settled.invoice.due_amount, dec!(0.00));
    assert_eq!(settled.payments.len(), 2);

    let job = app.services.job_cards.get(&tech, job.id).await.unwrap();
    assert_eq!(job.status, "delivered");

    // The audit trail has one row per transition.
    let history = app.services.job_cards.history(&tech, job.id).await.unwrap();
    let transitions: Vec<(String, String)> = history
        .iter()
        .map(|h| (h.from_status.clone(), h.to_status.clone()))
        .collect();
    assert_eq!(
        transitions,
        vec![
            ("pending".to_string(), "in_progress".to_string()),
            ("in_progress".to_string(), "qc_requested".to_string()),
            ("qc_requested".to_string(), "qc_approved".to_string()),
            ("qc_approved".to_string(), "completed".to_string()),
            ("completed".to_string(), "delivered".to_string()),
        ]
    );
}

#[tokio::test]
async fn qc_rejection_sends_the_job_back_through_rework() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);
    let reviewer = admin(dealer);

    let job = app
        .services
        .job_cards
        .create(&tech, new_job(Uuid::new_v4()))
        .await
        .unwrap();
    app.services.job_cards.start_work(&tech, job.id).await.unwrap();
    app.services
        .job_cards
        .add_task(
            &tech,
            job.id,
            NewServiceTask {
                name: "Chain adjustment".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    let (_, request) = app
        .services
        .job_cards
        .submit_for_qc(&tech, job.id, None)
        .await
        .unwrap();

    // A rejection without notes is refused.
    let err = app
        .services
        .qc
        .review(
            &reviewer,
            request.id,
            QcVerdict {
                approved: false,
                notes: None,
                checklist: vec![],
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    app.services
        .qc
        .review(
            &reviewer,
            request.id,
            QcVerdict {
                approved: false,
                notes: Some("chain still slack at the rear".into()),
                checklist: vec![],
            },
        )
        .await
        .unwrap();

    let job = app.services.job_cards.get(&tech, job.id).await.unwrap();
    assert_eq!(job.status, "qc_rejected");

    // A rejected job cannot be invoiced.
    let err = app
        .services
        .invoicing
        .generate_invoice(
            &reviewer,
            job.id,
            GenerateInvoiceRequest {
                tax_pct: None,
                discount_pct: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition(_));

    // Rework: back to in_progress, through QC again, approved this time.
    let job = app.services.job_cards.start_work(&tech, job.id).await.unwrap();
    assert_eq!(job.status, "in_progress");

    let (_, request) = app
        .services
        .job_cards
        .submit_for_qc(&tech, job.id, None)
        .await
        .unwrap();
    app.services
        .qc
        .review(
            &reviewer,
            request.id,
            QcVerdict {
                approved: true,
                notes: None,
                checklist: passing_checklist(),
            },
        )
        .await
        .unwrap();

    let job = app.services.job_cards.get(&tech, job.id).await.unwrap();
    assert_eq!(job.status, "qc_approved");
}

#[tokio::test]
async fn the_requesting_technician_cannot_review_their_own_work() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);

    let job = app
        .services
        .job_cards
        .create(&tech, new_job(Uuid::new_v4()))
        .await
        .unwrap();
    app.services.job_cards.start_work(&tech, job.id).await.unwrap();
    let (_, request) = app
        .services
        .job_cards
        .submit_for_qc(&tech, job.id, None)
        .await
        .unwrap();

    let err = app
        .services
        .qc
        .review(
            &tech,
            request.id,
            QcVerdict {
                approved: true,
                notes: None,
                checklist: vec![],
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn invalid_job_transitions_are_conflicts() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);

    let job = app
        .services
        .job_cards
        .create(&tech, new_job(Uuid::new_v4()))
        .await
        .unwrap();

    // pending cannot go straight to qc_requested.
    let err = app
        .services
        .job_cards
        .submit_for_qc(&tech, job.id, None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition(_));

    // A second job card for the same ticket is a conflict.
    let err = app
        .services
        .job_cards
        .create(&tech, new_job(job.ticket_id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition(_));
}

#[tokio::test]
async fn overpayment_is_refused_and_residual_under_epsilon_settles() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);
    let reviewer = admin(dealer);

    let job = app
        .services
        .job_cards
        .create(&tech, new_job(Uuid::new_v4()))
        .await
        .unwrap();
    app.services.job_cards.start_work(&tech, job.id).await.unwrap();
    app.services
        .job_cards
        .add_task(
            &tech,
            job.id,
            NewServiceTask {
                name: "Fork seal replacement".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    let (_, request) = app
        .services
        .job_cards
        .submit_for_qc(&tech, job.id, None)
        .await
        .unwrap();
    app.services
        .qc
        .review(
            &reviewer,
            request.id,
            QcVerdict {
                approved: true,
                notes: None,
                checklist: vec![],
            },
        )
        .await
        .unwrap();

    // Labor only: 75 subtotal, 10% tax, 82.50 grand total.
    let invoice = app
        .services
        .invoicing
        .generate_invoice(
            &reviewer,
            job.id,
            GenerateInvoiceRequest {
                tax_pct: None,
                discount_pct: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(invoice.invoice.grand_total, dec!(82.50));

    // Non-positive amounts are invalid.
    let err = app
        .services
        .invoicing
        .record_payment(
            &reviewer,
            invoice.invoice.id,
            RecordPaymentRequest {
                amount: dec!(0),
                method: "cash".into(),
                reference: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Paying more than due + epsilon is over the limit.
    let err = app
        .services
        .invoicing
        .record_payment(
            &reviewer,
            invoice.invoice.id,
            RecordPaymentRequest {
                amount: dec!(82.52),
                method: "cash".into(),
                reference: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::OverLimit(_));

    // A residual of exactly one cent counts as settled.
    let settled = app
        .services
        .invoicing
        .record_payment(
            &reviewer,
            invoice.invoice.id,
            RecordPaymentRequest {
                amount: dec!(82.49),
                method: "cash".into(),
                reference: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(settled.invoice.due_amount, dec!(0.01));
    assert_eq!(settled.invoice.payment_status, "paid");
    assert_eq!(settled.invoice.status, "completed");

    // Once settled, further payments are refused.
    let err = app
        .services
        .invoicing
        .record_payment(
            &reviewer,
            invoice.invoice.id,
            RecordPaymentRequest {
                amount: dec!(0.01),
                method: "cash".into(),
                reference: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition(_));

    let job = app.services.job_cards.get(&tech, job.id).await.unwrap();
    assert_eq!(job.status, "delivered");
}

#[tokio::test]
async fn invoicing_a_job_with_nothing_billable_is_invalid() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);
    let reviewer = admin(dealer);

    let job = app
        .services
        .job_cards
        .create(&tech, new_job(Uuid::new_v4()))
        .await
        .unwrap();
    app.services.job_cards.start_work(&tech, job.id).await.unwrap();
    let (_, request) = app
        .services
        .job_cards
        .submit_for_qc(&tech, job.id, None)
        .await
        .unwrap();
    app.services
        .qc
        .review(
            &reviewer,
            request.id,
            QcVerdict {
                approved: true,
                notes: None,
                checklist: vec![],
            },
        )
        .await
        .unwrap();

    let err = app
        .services
        .invoicing
        .generate_invoice(
            &reviewer,
            job.id,
            GenerateInvoiceRequest {
                tax_pct: None,
                discount_pct: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // The job stays invoiceable; nothing was committed.
    let job = app.services.job_cards.get(&tech, job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::QcApproved.to_string());
}

#[tokio::test]
async fn per_invoice_rates_override_the_configured_tax() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);
    let reviewer = admin(dealer);

    let product = app.seed_product(dealer, "CH-900", 5, dec!(462.50)).await;

    let job = app
        .services
        .job_cards
        .create(&tech, new_job(Uuid::new_v4()))
        .await
        .unwrap();
    app.services.job_cards.start_work(&tech, job.id).await.unwrap();
    app.services
        .job_cards
        .add_task(
            &tech,
            job.id,
            NewServiceTask {
                name: "Full chain and sprocket service".into(),
                description: None,
            },
        )
        .await
        .unwrap();

    let group = app
        .services
        .requisitions
        .create_group(
            &tech,
            job.id,
            vec![NewRequisitionItem {
                product_id: product.id,
                quantity: 2,
                notes: None,
            }],
        )
        .await
        .unwrap();
    app.services
        .requisitions
        .approve_group(&reviewer, group.requisition_group_id)
        .await
        .unwrap();

    let (_, request) = app
        .services
        .job_cards
        .submit_for_qc(&tech, job.id, None)
        .await
        .unwrap();
    app.services
        .qc
        .review(
            &reviewer,
            request.id,
            QcVerdict {
                approved: true,
                notes: None,
                checklist: passing_checklist(),
            },
        )
        .await
        .unwrap();

    // Percentages out of range are refused before anything is written.
    let err = app
        .services
        .invoicing
        .generate_invoice(
            &reviewer,
            job.id,
            GenerateInvoiceRequest {
                tax_pct: None,
                discount_pct: Some(dec!(120)),
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .services
        .invoicing
        .generate_invoice(
            &reviewer,
            job.id,
            GenerateInvoiceRequest {
                tax_pct: Some(dec!(-1)),
                discount_pct: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Labor 75 + parts 925 = 1000; 10% discount, then 5% tax instead of the
    // configured 10%: taxable 900, tax 45, grand 945.
    let invoice = app
        .services
        .invoicing
        .generate_invoice(
            &reviewer,
            job.id,
            GenerateInvoiceRequest {
                tax_pct: Some(dec!(5)),
                discount_pct: Some(dec!(10)),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(invoice.invoice.subtotal, dec!(1000.00));
    assert_eq!(invoice.invoice.discount_amount, dec!(100.00));
    assert_eq!(invoice.invoice.tax_amount, dec!(45.00));
    assert_eq!(invoice.invoice.grand_total, dec!(945.00));
}
