use crate::db::DatabasePool;
use crate::error::{AppError, AppResult};
use crate::models::{CreateWarehouseRequest, UpdateWarehouseRequest, Warehouse, WarehouseItem};
use chrono::Utc;
use futures::future::join_all;
use sqlx::Row;

use super::parse_id;

pub struct WarehouseService {
    db: DatabasePool,
}

impl WarehouseService {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }

    /// Confirms that every item referenced by the inventory list exists.
    /// The point lookups are independent, so they run concurrently; the
    /// caller gets the complete set of unresolved references in one error
    /// rather than discovering them one request at a time.
    async fn verify_item_refs(&self, inventory: &[WarehouseItem]) -> AppResult<()> {
        let lookups = inventory.iter().map(|entry| self.item_exists(&entry.item));
        let results = join_all(lookups).await;

        let mut missing_ids = Vec::new();
        for (entry, exists) in inventory.iter().zip(results) {
            if !exists? {
                missing_ids.push(entry.item.clone());
            }
        }

        if missing_ids.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed { missing_ids })
        }
    }

    async fn item_exists(&self, reference: &str) -> AppResult<bool> {
        // A reference that is not even a well-formed id reads as absent.
        let id = match parse_id(reference) {
            Some(id) => id,
            None => return Ok(false),
        };

        let found = match &self.db {
            DatabasePool::Postgres(pool) => sqlx::query("SELECT id FROM items WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?
                .is_some(),
            DatabasePool::Sqlite(pool) => sqlx::query("SELECT id FROM items WHERE id = ?1")
                .bind(id)
                .fetch_optional(pool)
                .await?
                .is_some(),
        };

        Ok(found)
    }

    /// Persists a new warehouse, but only after every inventory reference
    /// has been verified. Nothing is written when verification fails, so
    /// there is no partial state to roll back.
    pub async fn create_warehouse(&self, req: CreateWarehouseRequest) -> AppResult<Warehouse> {
        self.verify_item_refs(&req.inventory).await?;

        let inventory_json = serde_json::to_string(&req.inventory)?;
        let now = Utc::now();

        match &self.db {
            DatabasePool::Postgres(pool) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO warehouses (name, address, inventory, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(&req.name)
                .bind(&req.address)
                .bind(&inventory_json)
                .bind(now)
                .bind(now)
                .fetch_one(pool)
                .await?;

                let id: i64 = result.get("id");
                self.get_warehouse_by_id(id).await
            }
            DatabasePool::Sqlite(pool) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO warehouses (name, address, inventory, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )
                .bind(&req.name)
                .bind(&req.address)
                .bind(&inventory_json)
                .bind(now)
                .bind(now)
                .execute(pool)
                .await?;

                let id = result.last_insert_rowid();
                self.get_warehouse_by_id(id).await
            }
        }
    }

    pub async fn get_warehouse(&self, id: &str) -> AppResult<Warehouse> {
        let id = parse_id(id).ok_or_else(|| Self::not_found(id))?;
        self.get_warehouse_by_id(id).await
    }

    async fn get_warehouse_by_id(&self, id: i64) -> AppResult<Warehouse> {
        match &self.db {
            DatabasePool::Postgres(pool) => {
                let row = sqlx::query(
                    r#"
                    SELECT id, name, address, inventory, created_at, updated_at
                    FROM warehouses
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| Self::not_found(&id.to_string()))?;

                self.row_to_warehouse_postgres(row)
            }
            DatabasePool::Sqlite(pool) => {
                let row = sqlx::query(
                    r#"
                    SELECT id, name, address, inventory, created_at, updated_at
                    FROM warehouses
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| Self::not_found(&id.to_string()))?;

                self.row_to_warehouse(row)
            }
        }
    }

    /// Partial update. A replacement inventory list is written as-is: item
    /// references are only verified when the warehouse is first created,
    /// never on update.
    pub async fn update_warehouse(
        &self,
        id: &str,
        req: UpdateWarehouseRequest,
    ) -> AppResult<Warehouse> {
        let id = parse_id(id).ok_or_else(|| Self::not_found(id))?;
        let _existing = self.get_warehouse_by_id(id).await?;

        let inventory_json = req
            .inventory
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let now = Utc::now();

        match &self.db {
            DatabasePool::Postgres(pool) => {
                sqlx::query(
                    r#"
                    UPDATE warehouses SET
                        name = COALESCE($2, name),
                        address = COALESCE($3, address),
                        inventory = COALESCE($4, inventory),
                        updated_at = $5
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&req.name)
                .bind(&req.address)
                .bind(&inventory_json)
                .bind(now)
                .execute(pool)
                .await?;
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    UPDATE warehouses SET
                        name = COALESCE(?2, name),
                        address = COALESCE(?3, address),
                        inventory = COALESCE(?4, inventory),
                        updated_at = ?5
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .bind(&req.name)
                .bind(&req.address)
                .bind(&inventory_json)
                .bind(now)
                .execute(pool)
                .await?;
            }
        }

        self.get_warehouse_by_id(id).await
    }

    /// Unconditional delete attempt; reports how many rows were removed.
    pub async fn delete_warehouse(&self, id: &str) -> AppResult<u64> {
        let id = match parse_id(id) {
            Some(id) => id,
            None => return Ok(0),
        };

        let result = match &self.db {
            DatabasePool::Postgres(pool) => {
                sqlx::query("DELETE FROM warehouses WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query("DELETE FROM warehouses WHERE id = ?1")
                    .bind(id)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
        };

        Ok(result)
    }

    fn not_found(id: &str) -> AppError {
        AppError::NotFound(format!(
            "Could not find a warehouse with id {}. Does it exist?",
            id
        ))
    }

    fn row_to_warehouse(&self, row: sqlx::sqlite::SqliteRow) -> AppResult<Warehouse> {
        let inventory: Vec<WarehouseItem> =
            serde_json::from_str(&row.get::<String, _>("inventory"))?;

        Ok(Warehouse {
            id: row.get("id"),
            name: row.get("name"),
            address: row.get("address"),
            inventory,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_warehouse_postgres(&self, row: sqlx::postgres::PgRow) -> AppResult<Warehouse> {
        let inventory: Vec<WarehouseItem> =
            serde_json::from_str(&row.get::<String, _>("inventory"))?;

        Ok(Warehouse {
            id: row.get("id"),
            name: row.get("name"),
            address: row.get("address"),
            inventory,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
