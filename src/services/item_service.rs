use crate::db::DatabasePool;
use crate::error::{AppError, AppResult};
use crate::models::{CreateItemRequest, Item, ItemsListResponse, UpdateItemRequest, WarehouseItem};
use chrono::Utc;
use sqlx::Row;

use super::parse_id;

pub const ITEMS_PER_PAGE: i64 = 50;

pub struct ItemService {
    db: DatabasePool,
}

impl ItemService {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }

    pub async fn create_item(&self, req: CreateItemRequest) -> AppResult<Item> {
        let now = Utc::now();

        match &self.db {
            DatabasePool::Postgres(pool) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO items (name, description, created_at, updated_at)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(&req.name)
                .bind(&req.description)
                .bind(now)
                .bind(now)
                .fetch_one(pool)
                .await?;

                let id: i64 = result.get("id");
                self.get_item_by_id(id).await
            }
            DatabasePool::Sqlite(pool) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO items (name, description, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                )
                .bind(&req.name)
                .bind(&req.description)
                .bind(now)
                .bind(now)
                .execute(pool)
                .await?;

                let id = result.last_insert_rowid();
                self.get_item_by_id(id).await
            }
        }
    }

    /// Paginated listing in insertion order, 50 items per page. Page numbers
    /// that failed to parse (`None`) or are not positive fall back to the
    /// first page rather than erroring.
    pub async fn list_items(&self, page: Option<i64>) -> AppResult<ItemsListResponse> {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let offset = (page - 1) * ITEMS_PER_PAGE;

        match &self.db {
            DatabasePool::Postgres(pool) => {
                let rows = sqlx::query(
                    r#"
                    SELECT id, name, description, created_at, updated_at
                    FROM items
                    ORDER BY id
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(ITEMS_PER_PAGE)
                .bind(offset)
                .fetch_all(pool)
                .await?;

                let items: Vec<Item> = rows
                    .into_iter()
                    .map(|row| self.row_to_item_postgres(row))
                    .collect();

                let count_row = sqlx::query("SELECT COUNT(*) as count FROM items")
                    .fetch_one(pool)
                    .await?;
                let total: i64 = count_row.get("count");

                Ok(ItemsListResponse {
                    items,
                    total,
                    page,
                    per_page: ITEMS_PER_PAGE,
                })
            }
            DatabasePool::Sqlite(pool) => {
                let rows = sqlx::query(
                    r#"
                    SELECT id, name, description, created_at, updated_at
                    FROM items
                    ORDER BY id
                    LIMIT ?1 OFFSET ?2
                    "#,
                )
                .bind(ITEMS_PER_PAGE)
                .bind(offset)
                .fetch_all(pool)
                .await?;

                let items: Vec<Item> = rows.into_iter().map(|row| self.row_to_item(row)).collect();

                let count_row = sqlx::query("SELECT COUNT(*) as count FROM items")
                    .fetch_one(pool)
                    .await?;
                let total: i64 = count_row.get("count");

                Ok(ItemsListResponse {
                    items,
                    total,
                    page,
                    per_page: ITEMS_PER_PAGE,
                })
            }
        }
    }

    pub async fn get_item(&self, id: &str) -> AppResult<Item> {
        let id = parse_id(id).ok_or_else(|| Self::not_found(id))?;
        self.get_item_by_id(id).await
    }

    async fn get_item_by_id(&self, id: i64) -> AppResult<Item> {
        match &self.db {
            DatabasePool::Postgres(pool) => {
                let row = sqlx::query(
                    r#"
                    SELECT id, name, description, created_at, updated_at
                    FROM items
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| Self::not_found(&id.to_string()))?;

                Ok(self.row_to_item_postgres(row))
            }
            DatabasePool::Sqlite(pool) => {
                let row = sqlx::query(
                    r#"
                    SELECT id, name, description, created_at, updated_at
                    FROM items
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| Self::not_found(&id.to_string()))?;

                Ok(self.row_to_item(row))
            }
        }
    }

    pub async fn update_item(&self, id: &str, req: UpdateItemRequest) -> AppResult<Item> {
        let id = parse_id(id).ok_or_else(|| Self::not_found(id))?;
        let _existing = self.get_item_by_id(id).await?;

        let now = Utc::now();

        match &self.db {
            DatabasePool::Postgres(pool) => {
                sqlx::query(
                    r#"
                    UPDATE items SET
                        name = COALESCE($2, name),
                        description = COALESCE($3, description),
                        updated_at = $4
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&req.name)
                .bind(&req.description)
                .bind(now)
                .execute(pool)
                .await?;
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    UPDATE items SET
                        name = COALESCE(?2, name),
                        description = COALESCE(?3, description),
                        updated_at = ?4
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .bind(&req.name)
                .bind(&req.description)
                .bind(now)
                .execute(pool)
                .await?;
            }
        }

        self.get_item_by_id(id).await
    }

    /// Unconditional delete attempt; reports how many rows were removed.
    /// Deleting an absent or malformed id is not an error, the count is 0.
    pub async fn delete_item(&self, id: &str) -> AppResult<u64> {
        let id = match parse_id(id) {
            Some(id) => id,
            None => return Ok(0),
        };

        let result = match &self.db {
            DatabasePool::Postgres(pool) => {
                sqlx::query("DELETE FROM items WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query("DELETE FROM items WHERE id = ?1")
                    .bind(id)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
        };

        Ok(result)
    }

    /// Total stock of one item across every warehouse: read each warehouse's
    /// inventory list and sum the amounts of the entries referencing this
    /// item. An item no warehouse stocks totals 0; this does not check that
    /// the item itself exists. The reduction happens in the service, not in
    /// a store-side pipeline.
    pub async fn get_total_inventory(&self, id: &str) -> AppResult<i64> {
        // Match by parsed row id, not raw text, so a reference written as
        // "05" still counts toward item 5. A malformed id matches nothing.
        let id = match parse_id(id) {
            Some(id) => id,
            None => return Ok(0),
        };

        let inventories: Vec<String> = match &self.db {
            DatabasePool::Postgres(pool) => sqlx::query("SELECT inventory FROM warehouses")
                .fetch_all(pool)
                .await?
                .into_iter()
                .map(|row| row.get("inventory"))
                .collect(),
            DatabasePool::Sqlite(pool) => sqlx::query("SELECT inventory FROM warehouses")
                .fetch_all(pool)
                .await?
                .into_iter()
                .map(|row| row.get("inventory"))
                .collect(),
        };

        let mut total = 0i64;
        for raw in inventories {
            let inventory: Vec<WarehouseItem> = serde_json::from_str(&raw)?;
            total += inventory
                .iter()
                .filter(|entry| parse_id(&entry.item) == Some(id))
                .map(|entry| entry.amount)
                .sum::<i64>();
        }

        Ok(total)
    }

    fn not_found(id: &str) -> AppError {
        AppError::NotFound(format!("Could not find an item with id {}. Does it exist?", id))
    }

    fn row_to_item(&self, row: sqlx::sqlite::SqliteRow) -> Item {
        Item {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn row_to_item_postgres(&self, row: sqlx::postgres::PgRow) -> Item {
        Item {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateWarehouseRequest;
    use crate::services::WarehouseService;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_db() -> DatabasePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        let db = DatabasePool::Sqlite(pool);
        db.migrate().await.expect("migrations");
        db
    }

    fn item_req(name: &str) -> CreateItemRequest {
        CreateItemRequest {
            name: name.to_string(),
            description: format!("{} description", name),
        }
    }

    fn entry(item: i64, amount: i64) -> WarehouseItem {
        WarehouseItem {
            item: item.to_string(),
            amount,
        }
    }

    #[tokio::test]
    async fn created_items_can_be_fetched_back() {
        let service = ItemService::new(test_db().await);

        let created = service.create_item(item_req("Pallet jack")).await.unwrap();
        assert_eq!(created.name, "Pallet jack");
        assert_eq!(created.description, "Pallet jack description");

        let fetched = service.get_item(&created.id.to_string()).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, created.name);
    }

    #[tokio::test]
    async fn absent_and_malformed_ids_both_read_as_not_found() {
        let service = ItemService::new(test_db().await);

        for id in ["9999", "not-a-number", ""] {
            match service.get_item(id).await {
                Err(AppError::NotFound(_)) => {}
                other => panic!("expected NotFound for {:?}, got {:?}", id, other.map(|i| i.id)),
            }
        }
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_alone() {
        let service = ItemService::new(test_db().await);
        let created = service.create_item(item_req("Forklift")).await.unwrap();

        let updated = service
            .update_item(
                &created.id.to_string(),
                UpdateItemRequest {
                    name: None,
                    description: Some("Electric, 2.5t".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Forklift");
        assert_eq!(updated.description, "Electric, 2.5t");
    }

    #[tokio::test]
    async fn updating_an_unknown_item_is_not_found() {
        let service = ItemService::new(test_db().await);

        let result = service
            .update_item(
                "123",
                UpdateItemRequest {
                    name: Some("anything".to_string()),
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_reports_removed_row_count() {
        let service = ItemService::new(test_db().await);
        let created = service.create_item(item_req("Hand truck")).await.unwrap();
        let id = created.id.to_string();

        assert_eq!(service.delete_item(&id).await.unwrap(), 1);
        assert!(matches!(
            service.get_item(&id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(service.delete_item(&id).await.unwrap(), 0);
        assert_eq!(service.delete_item("garbage").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn out_of_range_page_numbers_clamp_to_page_one() {
        let service = ItemService::new(test_db().await);
        for i in 0..3 {
            service.create_item(item_req(&format!("Item {}", i))).await.unwrap();
        }

        let baseline = service.list_items(Some(1)).await.unwrap();
        let ids: Vec<i64> = baseline.items.iter().map(|i| i.id).collect();

        for page in [Some(0), Some(-5), None] {
            let response = service.list_items(page).await.unwrap();
            let got: Vec<i64> = response.items.iter().map(|i| i.id).collect();
            assert_eq!(got, ids);
            assert_eq!(response.page, 1);
        }
    }

    #[tokio::test]
    async fn pages_hold_fifty_items_in_insertion_order() {
        let service = ItemService::new(test_db().await);
        let mut ids = Vec::new();
        for i in 0..60 {
            let item = service.create_item(item_req(&format!("Item {}", i))).await.unwrap();
            ids.push(item.id);
        }

        let first = service.list_items(Some(1)).await.unwrap();
        assert_eq!(first.items.len(), 50);
        assert_eq!(first.total, 60);
        let first_ids: Vec<i64> = first.items.iter().map(|i| i.id).collect();
        assert_eq!(first_ids, ids[..50]);

        let second = service.list_items(Some(2)).await.unwrap();
        assert_eq!(second.items.len(), 10);
        let second_ids: Vec<i64> = second.items.iter().map(|i| i.id).collect();
        assert_eq!(second_ids, ids[50..]);
    }

    #[tokio::test]
    async fn stock_totals_sum_across_warehouses() {
        let db = test_db().await;
        let items = ItemService::new(db.clone());
        let warehouses = WarehouseService::new(db);

        let a = items.create_item(item_req("Bolt")).await.unwrap();
        let b = items.create_item(item_req("Nut")).await.unwrap();

        warehouses
            .create_warehouse(CreateWarehouseRequest {
                name: "W1".to_string(),
                address: "1 First St".to_string(),
                inventory: vec![entry(a.id, 5), entry(b.id, 3)],
            })
            .await
            .unwrap();
        warehouses
            .create_warehouse(CreateWarehouseRequest {
                name: "W2".to_string(),
                address: "2 Second St".to_string(),
                inventory: vec![entry(a.id, 2)],
            })
            .await
            .unwrap();

        assert_eq!(items.get_total_inventory(&a.id.to_string()).await.unwrap(), 7);
        assert_eq!(items.get_total_inventory(&b.id.to_string()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn stock_totals_match_references_by_id_not_spelling() {
        let db = test_db().await;
        let items = ItemService::new(db.clone());
        let warehouses = WarehouseService::new(db);

        let a = items.create_item(item_req("Washer")).await.unwrap();

        // A zero-padded reference passes creation-time verification and is
        // persisted as written; it must still count toward the same item.
        warehouses
            .create_warehouse(CreateWarehouseRequest {
                name: "W1".to_string(),
                address: "1 First St".to_string(),
                inventory: vec![WarehouseItem {
                    item: format!("0{}", a.id),
                    amount: 4,
                }],
            })
            .await
            .unwrap();

        assert_eq!(items.get_total_inventory(&a.id.to_string()).await.unwrap(), 4);
        assert_eq!(
            items.get_total_inventory(&format!("0{}", a.id)).await.unwrap(),
            4
        );
    }

    #[tokio::test]
    async fn unreferenced_items_total_zero_without_error() {
        let db = test_db().await;
        let items = ItemService::new(db);

        let lonely = items.create_item(item_req("Shrink wrap")).await.unwrap();

        // Zero stock, an id that matches nothing, and a malformed id are all
        // indistinguishable at this layer.
        assert_eq!(items.get_total_inventory(&lonely.id.to_string()).await.unwrap(), 0);
        assert_eq!(items.get_total_inventory("424242").await.unwrap(), 0);
        assert_eq!(items.get_total_inventory("not-an-id").await.unwrap(), 0);
    }
}
