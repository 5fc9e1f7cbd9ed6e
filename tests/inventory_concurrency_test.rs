mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;
use workshop_api::services::{
    job_cards::{NewJobCard, NewServiceTask},
    requisitions::NewRequisitionItem,
};

use common::{technician, TestApp};

/// Approvals racing on the same product must each read the quantity they
/// write against: every movement compounds on the previous one and the final
/// stock equals the seeded quantity minus everything debited.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_approvals_compound_without_lost_updates() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);

    let product = app.seed_product(dealer, "BRK-PAD", 20, dec!(10.00)).await;

    let job = app
        .services
        .job_cards
        .create(
            &tech,
            NewJobCard {
                ticket_id: Uuid::new_v4(),
                technician_id: None,
                notes: None,
                estimated_completion_at: None,
            },
        )
        .await
        .unwrap();
    app.services.job_cards.start_work(&tech, job.id).await.unwrap();
    app.services
        .job_cards
        .add_task(
            &tech,
            job.id,
            NewServiceTask {
                name: "Brake overhaul".into(),
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
            (0..5)
                .map(|_| NewRequisitionItem {
                    product_id: product.id,
                    quantity: 2,
                    notes: None,
                })
                .collect(),
        )
        .await
        .unwrap();

    let mut handles = Vec::new();
    for item in &group.items {
        let requisitions = app.services.requisitions.clone();
        let item_id = item.id;
        handles.push(tokio::spawn(async move {
            requisitions.approve_item(&tech, item_id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 20 seeded, 5 approvals of 2 each.
    let product_now = app
        .services
        .inventory
        .get_product(&tech, product.id)
        .await
        .unwrap();
    assert_eq!(product_now.stock_quantity, 10);

    let (mut movements, total) = app
        .services
        .inventory
        .list_movements(&tech, product.id, 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 5);

    // Each movement reads the quantity the previous one wrote: sorted by
    // their before-quantities they form one unbroken chain from 20 to 10.
    movements.sort_by(|a, b| b.quantity_before.cmp(&a.quantity_before));
    let mut expected_before = 20;
    for movement in &movements {
        assert_eq!(movement.quantity_before, expected_before);
        assert_eq!(movement.quantity_change, -2);
        assert_eq!(movement.quantity_after, expected_before - 2);
        expected_before = movement.quantity_after;
    }
    assert_eq!(expected_before, 10);
}
