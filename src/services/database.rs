use crate::error::AppError;
use crate::models::{BankAccount, Order, OrderStatus, Product};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        &*e.kind,
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

#[derive(Clone)]
pub struct OrderDb {
    client: MongoClient,
    db: Database,
}

impl OrderDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for order-service");

        let orders = self.orders();

        let order_id_index = IndexModel::builder()
            .keys(doc! { "order_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("order_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        orders.create_index(order_id_index, None).await.map_err(|e| {
            tracing::error!("Failed to create order_id index: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let status_index = IndexModel::builder()
            .keys(doc! { "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("status_idx".to_string())
                    .build(),
            )
            .build();

        orders.create_index(status_index, None).await.map_err(|e| {
            tracing::error!("Failed to create status index: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        // Descending so the newest-first listing uses the index
        let created_index = IndexModel::builder()
            .keys(doc! { "created_utc": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_utc_idx".to_string())
                    .build(),
            )
            .build();

        orders.create_index(created_index, None).await.map_err(|e| {
            tracing::error!("Failed to create created_utc index: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let currency_index = IndexModel::builder()
            .keys(doc! { "currency": 1, "is_active": 1 })
            .options(
                IndexOptions::builder()
                    .name("currency_active_idx".to_string())
                    .build(),
            )
            .build();

        self.bank_accounts()
            .create_index(currency_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create currency index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    pub fn orders(&self) -> Collection<Order> {
        self.db.collection("orders")
    }

    pub fn bank_accounts(&self) -> Collection<BankAccount> {
        self.db.collection("bank_accounts")
    }

    pub fn products(&self) -> Collection<Product> {
        self.db.collection("products")
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    pub async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        self.orders().insert_one(order, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                return AppError::Conflict(anyhow::anyhow!(
                    "Order id already exists: {}",
                    order.order_id
                ));
            }
            tracing::error!("Failed to insert order: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        Ok(())
    }

    pub async fn find_order(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        self.orders()
            .find_one(doc! { "order_id": order_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find order: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })
    }

    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, AppError> {
        let mut filter = doc! {};
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }

        let find_options = FindOptions::builder()
            .sort(doc! { "created_utc": -1 })
            .build();

        let cursor = self.orders().find(filter, find_options).await.map_err(|e| {
            tracing::error!("Failed to list orders: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect orders: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })
    }

    pub async fn set_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), AppError> {
        self.orders()
            .update_one(
                doc! { "order_id": order_id },
                doc! { "$set": { "status": status.as_str() } },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to update order status: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bank accounts
    // ------------------------------------------------------------------

    pub async fn find_active_bank_accounts(
        &self,
        currency: &str,
    ) -> Result<Vec<BankAccount>, AppError> {
        let cursor = self
            .bank_accounts()
            .find(doc! { "currency": currency, "is_active": true }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query bank accounts: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect bank accounts: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })
    }

    pub async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, AppError> {
        let cursor = self.bank_accounts().find(doc! {}, None).await.map_err(|e| {
            tracing::error!("Failed to list bank accounts: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect bank accounts: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })
    }

    pub async fn insert_bank_account(&self, account: &BankAccount) -> Result<ObjectId, AppError> {
        let result = self
            .bank_accounts()
            .insert_one(account, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert bank account: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::DatabaseError(anyhow::anyhow!("Missing inserted id")))
    }

    pub async fn update_bank_account(
        &self,
        id: ObjectId,
        patch: Document,
    ) -> Result<Option<BankAccount>, AppError> {
        self.bank_accounts()
            .update_one(doc! { "_id": id }, doc! { "$set": patch }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update bank account: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        self.bank_accounts()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e.to_string())))
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let cursor = self.products().find(doc! {}, None).await.map_err(|e| {
            tracing::error!("Failed to list products: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect products: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })
    }

    pub async fn insert_product(&self, product: &Product) -> Result<ObjectId, AppError> {
        let result = self.products().insert_one(product, None).await.map_err(|e| {
            tracing::error!("Failed to insert product: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::DatabaseError(anyhow::anyhow!("Missing inserted id")))
    }

    pub async fn update_product(
        &self,
        id: ObjectId,
        patch: Document,
    ) -> Result<Option<Product>, AppError> {
        self.products()
            .update_one(doc! { "_id": id }, doc! { "$set": patch }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update product: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        self.products()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e.to_string())))
    }

    pub async fn delete_product(&self, id: ObjectId) -> Result<bool, AppError> {
        let result = self
            .products()
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete product: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(result.deleted_count > 0)
    }
}
