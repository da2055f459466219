//! Parts catalog persistence: legacy import, lookups and deletion guards.

mod common;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use common::{connect, fixture};
use futures::future::join_all;
use inventra_core::catalog::{CatalogError, CostSource, LegacyPart, PartInput, PriceTiers};
use inventra_core::stock::ReferenceType;
use inventra_db::repositories::{
    AdjustStockInput, CatalogRepoError, PartClassification, PartRepository, StockRepository,
};
use inventra_shared::types::PartId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;
use uuid::Uuid;

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, 9, 0, 0).unwrap()
}

fn legacy(part_no: &str, cost: Decimal, cost_updated_day: Option<u32>) -> LegacyPart {
    LegacyPart {
        id: PartId::new(),
        part_no: part_no.to_string(),
        description: format!("Legacy {part_no}"),
        cost,
        cost_source: CostSource::Manual,
        cost_updated_at: cost_updated_day.map(at),
        prices: PriceTiers {
            retail: dec!(20.00),
            wholesale: dec!(18.00),
            dealer: dec!(16.00),
        },
        created_at: at(1),
        updated_at: at(1),
    }
}

fn unique_part_no(label: &str) -> String {
    format!("L-{}-{label}", &Uuid::new_v4().simple().to_string()[..8])
}

#[tokio::test]
async fn test_import_collapses_duplicate_part_numbers() {
    let Some(db) = connect().await else { return };
    let parts = PartRepository::new(db.clone());
    let filter = unique_part_no("FLT");
    let belt = unique_part_no("BLT");

    let summary = parts
        .import_legacy_rows(vec![
            legacy(&filter, dec!(4.00), Some(3)),
            legacy(&format!("  {filter} "), dec!(4.80), Some(9)),
            legacy(&filter, dec!(3.50), None),
            legacy(&belt, dec!(11.00), None),
        ])
        .await
        .unwrap();
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.discarded, 2);
    assert_eq!(summary.replaced, 0);

    let stored = parts.get_by_part_no(&filter).await.unwrap().unwrap();
    assert_eq!(stored.cost, dec!(4.80));
}

#[tokio::test]
async fn test_reimport_keeps_row_identity_and_newest_cost() {
    let Some(db) = connect().await else { return };
    let parts = PartRepository::new(db.clone());
    let part_no = unique_part_no("PAD");

    parts
        .import_legacy_rows(vec![legacy(&part_no, dec!(10.00), Some(5))])
        .await
        .unwrap();
    let original = parts.get_by_part_no(&part_no).await.unwrap().unwrap();

    let stale = parts
        .import_legacy_rows(vec![legacy(&part_no, dec!(9.00), Some(2))])
        .await
        .unwrap();
    assert_eq!(stale.discarded, 1);
    assert_eq!(
        parts.get_by_part_no(&part_no).await.unwrap().unwrap().cost,
        dec!(10.00)
    );

    let fresh = parts
        .import_legacy_rows(vec![legacy(&part_no, dec!(12.50), Some(20))])
        .await
        .unwrap();
    assert_eq!(fresh.replaced, 1);
    let updated = parts.get_by_part_no(&part_no).await.unwrap().unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.cost, dec!(12.50));
}

#[tokio::test]
async fn test_import_rejects_blank_part_number() {
    let Some(db) = connect().await else { return };
    let parts = PartRepository::new(db.clone());
    let part_no = unique_part_no("OK");

    let result = parts
        .import_legacy_rows(vec![legacy(&part_no, dec!(1.00), None), legacy("   ", dec!(1.00), None)])
        .await;
    assert!(matches!(
        result,
        Err(CatalogRepoError::Catalog(CatalogError::Validation { .. }))
    ));
    assert!(parts.get_by_part_no(&part_no).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_part_number_is_rejected() {
    let Some(db) = connect().await else { return };
    let parts = PartRepository::new(db.clone());
    let part_no = unique_part_no("DUP");
    let input = |part_no: String| PartInput {
        part_no,
        description: "Wiper blade".to_string(),
        cost: dec!(2.00),
        prices: PriceTiers::default(),
    };

    parts
        .create(input(part_no.clone()), PartClassification::default())
        .await
        .unwrap();
    let again = parts
        .create(input(format!(" {part_no}")), PartClassification::default())
        .await;
    assert!(matches!(
        again,
        Err(CatalogRepoError::Catalog(CatalogError::DuplicatePartNo(_)))
    ));
}

#[tokio::test]
async fn test_racing_creates_of_one_part_number() {
    const TASKS: usize = 5;
    let Some(db) = connect().await else { return };
    let parts = PartRepository::new(db.clone());
    let part_no = unique_part_no("RACE");

    let barrier = Arc::new(Barrier::new(TASKS));
    let handles = (0..TASKS).map(|_| {
        let barrier = Arc::clone(&barrier);
        let parts = parts.clone();
        let part_no = part_no.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            parts
                .create(
                    PartInput {
                        part_no,
                        description: "Spark plug".to_string(),
                        cost: dec!(3.00),
                        prices: PriceTiers::default(),
                    },
                    PartClassification::default(),
                )
                .await
        })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(
            matches!(result, Err(CatalogRepoError::Catalog(CatalogError::DuplicatePartNo(_)))),
            "unexpected outcome {result:?}"
        );
    }
}

#[tokio::test]
async fn test_part_with_movements_cannot_be_deleted() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    let part_id = fixture.part(&db, "DEL", dec!(5.00)).await.unwrap();
    let parts = PartRepository::new(db.clone());
    let part_no = parts.get(part_id).await.unwrap().unwrap().part_no;

    let outcome = StockRepository::new(db.clone())
        .adjust(AdjustStockInput {
            part_id,
            store_id: Some(fixture.store_id),
            delta: 3,
            reason: "Opening count".to_string(),
            adjusted_on: common::date(2026, 2, 1),
        })
        .await
        .unwrap();
    assert_eq!(outcome.movement.reference.reference_type, ReferenceType::Adjustment);

    let result = parts.delete(&part_no).await;
    assert!(matches!(
        result,
        Err(CatalogRepoError::Catalog(CatalogError::InUse { .. }))
    ));
}
