//! End-to-end sale flow against a file-backed SQLite database with a real
//! connection pool, so concurrent requests use separate connections.

use std::path::Path;
use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use shelf_core::aggregate::AggregationEngine;
use shelf_core::recorder::SaleRecorder;
use shelf_core::{CoreError, Product, ProductDraft, ProposedLine, SaleProposal};
use shelf_db::{Database, DbConfig};
use tempfile::TempDir;

/// A database file inside a temporary directory. The directory, together
/// with the `-wal` and `-shm` files, is removed when this is dropped.
struct TempDb {
    db: Database,
    _dir: TempDir,
}

impl TempDb {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("shelf.db")).max_connections(4))
            .await
            .unwrap();
        TempDb { db, _dir: dir }
    }

    fn recorder(&self) -> Arc<SaleRecorder> {
        Arc::new(SaleRecorder::new(
            Arc::new(self.db.ledger()),
            Arc::new(self.db.sales()),
            Arc::new(self.db.products()),
        ))
    }

    async fn product(&self, sku: &str, quantity: i64, price_cents: i64) -> Product {
        self.db
            .products()
            .create(&ProductDraft {
                name: sku.to_string(),
                category: "Indoor Plants".to_string(),
                sku: sku.to_string(),
                quantity,
                price_cents,
                description: String::new(),
                expiry_date: None,
            })
            .await
            .unwrap()
    }

    async fn quantity(&self, id: &str) -> i64 {
        self.db.products().get_by_id(id).await.unwrap().unwrap().quantity
    }

    fn dir(&self) -> &Path {
        self._dir.path()
    }
}

#[tokio::test]
async fn records_sale_and_updates_dashboard() {
    let t = TempDb::new().await;
    let monstera = t.product("IN-PL-001", 25, 2500).await;
    let fig = t.product("IN-PL-002", 15, 3500).await;

    let engine = AggregationEngine::new(
        Arc::new(t.db.products()),
        Arc::new(t.db.sales()),
        FixedOffset::east_opt(0).unwrap(),
    );
    assert_eq!(engine.total_inventory_value().await.unwrap().cents(), 115000);

    let sale = t
        .recorder()
        .record_sale(
            SaleProposal::new(
                "walk-in",
                vec![ProposedLine::new(&monstera.id, 2), ProposedLine::new(&fig.id, 1)],
            )
            .with_declared_total(8500),
        )
        .await
        .unwrap();

    assert_eq!(sale.total_cents, 8500);
    assert_eq!(t.quantity(&monstera.id).await, 23);
    assert_eq!(t.quantity(&fig.id).await, 14);

    let stored = t.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored, sale);

    let stats = engine.dashboard(Utc::now()).await.unwrap();
    assert_eq!(stats.total_inventory_value.cents(), 115000 - 8500);
    assert_eq!(stats.daily_sales.cents(), 8500);
    assert_eq!(stats.monthly_sales.len(), 1);
    assert_eq!(stats.monthly_sales[0].sales.cents(), 8500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_oversell() {
    let t = TempDb::new().await;
    let snake = t.product("IN-PL-003", 10, 1200).await;
    let recorder = t.recorder();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let recorder = recorder.clone();
            let id = snake.id.clone();
            tokio::spawn(async move {
                recorder
                    .record_sale(SaleProposal::new(
                        format!("cust-{}", i),
                        vec![ProposedLine::new(id, 1 + i % 3)],
                    ))
                    .await
            })
        })
        .collect();

    let mut sold = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(sale) => sold += sale.items[0].quantity,
            Err(CoreError::InsufficientStock(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let remaining = t.quantity(&snake.id).await;
    assert!(remaining >= 0);
    assert_eq!(remaining, 10 - sold);

    let recorded: i64 = t
        .db
        .sales()
        .list_recent(100)
        .await
        .unwrap()
        .iter()
        .map(|s| s.items[0].quantity)
        .sum();
    assert_eq!(recorded, sold);
}

#[tokio::test]
async fn rejected_sale_changes_nothing() {
    let t = TempDb::new().await;
    let pot = t.product("POT-MD-001", 5, 450).await;
    let gloves = t.product("TOOL-GL-001", 1, 250).await;
    let recorder = t.recorder();

    recorder
        .record_sale(SaleProposal::new("a", vec![ProposedLine::new(&pot.id, 3)]))
        .await
        .unwrap();

    let err = recorder
        .record_sale(SaleProposal::new(
            "b",
            vec![ProposedLine::new(&pot.id, 4), ProposedLine::new(&gloves.id, 1)],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::InsufficientStock(ref s) if s.len() == 1));
    assert_eq!(t.quantity(&pot.id).await, 2);
    assert_eq!(t.quantity(&gloves.id).await, 1);
    assert_eq!(t.db.sales().count().await.unwrap(), 1);
}

#[tokio::test]
async fn failed_sale_insert_restores_stock() {
    let t = TempDb::new().await;
    let fertilizer = t.product("FERT-AP-001", 8, 300).await;

    // Make the sale header insert fail after the ledger has committed.
    sqlx::query("ALTER TABLE sales RENAME TO sales_archive")
        .execute(t.db.pool())
        .await
        .unwrap();

    let err = t
        .recorder()
        .record_sale(SaleProposal::new("a", vec![ProposedLine::new(&fertilizer.id, 3)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::PartialCommitDetected { restored: true, .. }
    ));
    assert_eq!(t.quantity(&fertilizer.id).await, 8);
}

#[tokio::test]
async fn temp_database_removed_when_test_panics() {
    let t = TempDb::new().await;
    t.product("SEED-TM-001", 100, 50).await;

    let dir = t.dir().to_path_buf();
    assert!(dir.join("shelf.db").exists());

    let outcome = tokio::spawn(async move {
        let t = t;
        t.db.close().await;
        panic!("test failed with its database still in scope");
    })
    .await;

    assert!(outcome.unwrap_err().is_panic());
    assert!(!dir.exists());
}
