use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::package_matcher::{BudgetTier, FuneralType, ServiceTag};

/// Represents a Telegram user in the database
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: String,
    pub last_activity: String,
}

/// Profile fields submitted through the registration form.
///
/// `None` and empty values never overwrite what is already stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientData {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub passport_series: Option<String>,
    pub passport_number: Option<String>,
    pub passport_issued_by: Option<String>,
    pub passport_issue_date: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub relationship: Option<String>,
}

/// Represents a registered client
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Client {
    pub id: i64,
    pub telegram_id: i64,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub passport_series: Option<String>,
    pub passport_number: Option<String>,
    pub passport_issued_by: Option<String>,
    pub passport_issue_date: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub relationship: Option<String>,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Client {
    pub fn data(&self) -> ClientData {
        ClientData {
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            birth_date: self.birth_date.clone(),
            passport_series: self.passport_series.clone(),
            passport_number: self.passport_number.clone(),
            passport_issued_by: self.passport_issued_by.clone(),
            passport_issue_date: self.passport_issue_date.clone(),
            address: self.address.clone(),
            emergency_contact: self.emergency_contact.clone(),
            relationship: self.relationship.clone(),
        }
    }
}

/// Represents a catalog product
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub photo_path: Option<String>,
    pub created_at: String,
}

/// Represents a memory record
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MemoryRecord {
    pub id: i64,
    pub telegram_id: i64,
    pub name: String,
    pub birth_date: String,
    pub death_date: String,
    pub memory_text: String,
    pub photo_path: Option<String>,
    pub html_path: Option<String>,
    pub candles_count: i64,
    pub created_at: String,
}

/// Values of a new memory record
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemoryRecord<'a> {
    pub telegram_id: i64,
    pub name: &'a str,
    pub birth_date: &'a str,
    pub death_date: &'a str,
    pub memory_text: &'a str,
    pub photo_path: Option<&'a str>,
}

/// Represents a submitted funeral intake form
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FuneralFormRecord {
    pub id: i64,
    pub telegram_id: i64,
    pub body_location: String,
    pub funeral_type: String,
    pub services: String,
    pub budget: String,
    pub created_at: String,
}

impl FuneralFormRecord {
    /// Services decoded from their JSON column
    pub fn service_tags(&self) -> Result<Vec<ServiceTag>> {
        serde_json::from_str(&self.services).context("Failed to decode funeral form services")
    }
}

/// Represents one logged chat message
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ChatLog {
    pub id: i64,
    pub telegram_id: i64,
    pub message_type: String,
    pub message_text: Option<String>,
    pub handler_name: Option<String>,
    pub is_user_message: bool,
    pub created_at: String,
}

/// Usage figures for the admin panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users_7d: i64,
    pub funeral_forms: i64,
    pub memory_records: i64,
}

/// Result of lighting a candle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleOutcome {
    Lit { candles_count: i64 },
    AlreadyLit,
    RecordNotFound,
}

/// Opens the SQLite database file, creating it when missing
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("Failed to open database")
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id INTEGER PRIMARY KEY,
            username TEXT,
            first_name TEXT,
            last_name TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_activity TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL UNIQUE,
            full_name TEXT,
            phone TEXT,
            email TEXT,
            birth_date TEXT,
            passport_series TEXT,
            passport_number TEXT,
            passport_issued_by TEXT,
            passport_issue_date TEXT,
            address TEXT,
            emergency_contact TEXT,
            relationship TEXT,
            is_verified BOOLEAN NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create clients table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price REAL NOT NULL,
            category TEXT NOT NULL,
            photo_path TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create products table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS memory_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            birth_date TEXT NOT NULL,
            death_date TEXT NOT NULL,
            memory_text TEXT NOT NULL,
            photo_path TEXT,
            html_path TEXT,
            candles_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create memory_records table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS memory_candles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            memory_record_id INTEGER NOT NULL REFERENCES memory_records(id) ON DELETE CASCADE,
            telegram_id INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(memory_record_id, telegram_id)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create memory_candles table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS funeral_forms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL,
            body_location TEXT NOT NULL,
            funeral_type TEXT NOT NULL,
            services TEXT NOT NULL,
            budget TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create funeral_forms table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS request_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL,
            request_type TEXT NOT NULL,
            request_data TEXT,
            response_data TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create request_logs table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS chat_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL,
            message_type TEXT NOT NULL,
            message_text TEXT,
            handler_name TEXT,
            is_user_message BOOLEAN NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create chat_logs table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)")
        .execute(pool)
        .await
        .context("Failed to create products category index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_memory_records_owner ON memory_records(telegram_id)")
        .execute(pool)
        .await
        .context("Failed to create memory_records owner index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Catalog inserted into an empty products table: name, description, price, category
const SEED_PRODUCTS: [(&str, &str, f64, &str); 10] = [
    ("Гроб деревянный стандартный", "Классический деревянный гроб из сосны", 15000.0, "coffin"),
    ("Гроб деревянный премиум", "Гроб из дуба с резными элементами", 25000.0, "coffin"),
    ("Гроб металлический", "Металлический гроб с отделкой", 35000.0, "coffin"),
    ("Гроб детский", "Детский гроб из дерева", 8000.0, "coffin"),
    ("Венок траурный стандартный", "Классический траурный венок", 3000.0, "wreath"),
    ("Венок премиум", "Венок из живых цветов", 8000.0, "wreath"),
    ("Венок детский", "Небольшой венок для детей", 2000.0, "wreath"),
    ("Крест деревянный", "Деревянный крест для могилы", 5000.0, "cross"),
    ("Крест металлический", "Металлический крест с покрытием", 12000.0, "cross"),
    ("Крест гранитный", "Гранитный крест", 25000.0, "cross"),
];

/// Seeds the product catalog when the table is empty. Returns the number of inserted rows.
pub async fn seed_products(pool: &SqlitePool) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await
        .context("Failed to count products")?;

    if count > 0 {
        debug!(existing = count, "Products already present, skipping seed");
        return Ok(0);
    }

    let mut tx = pool.begin().await.context("Failed to begin seed transaction")?;
    let mut per_category: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for (name, description, price, category) in SEED_PRODUCTS {
        let n = per_category.entry(category).or_insert(0);
        *n += 1;
        let photo_path = format!("photos/{category}{n}.jpg");

        sqlx::query(
            "INSERT INTO products (name, description, price, category, photo_path) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(category)
        .bind(photo_path)
        .execute(&mut *tx)
        .await
        .context("Failed to insert seed product")?;
    }

    tx.commit().await.context("Failed to commit seed products")?;
    info!(count = SEED_PRODUCTS.len(), "Product catalog seeded");
    Ok(SEED_PRODUCTS.len())
}

/// Creates the user or refreshes its names and activity time, keeping `created_at`
pub async fn upsert_user(
    pool: &SqlitePool,
    telegram_id: i64,
    username: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (telegram_id, username, first_name, last_name)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(telegram_id) DO UPDATE SET
            username = excluded.username,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            last_activity = CURRENT_TIMESTAMP",
    )
    .bind(telegram_id)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .execute(pool)
    .await
    .context("Failed to upsert user")?;

    Ok(())
}

pub async fn get_user(pool: &SqlitePool, telegram_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "SELECT telegram_id, username, first_name, last_name, created_at, last_activity
         FROM users WHERE telegram_id = ?",
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read user")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Saves a registration: inserts the first submission, later ones only
/// overwrite the fields that carry a non-empty value.
pub async fn save_client_data(pool: &SqlitePool, telegram_id: i64, data: &ClientData) -> Result<()> {
    info!(user_id = telegram_id, "Saving client data");

    sqlx::query(
        "INSERT INTO clients (
            telegram_id, full_name, phone, email, birth_date, passport_series, passport_number,
            passport_issued_by, passport_issue_date, address, emergency_contact, relationship
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(telegram_id) DO UPDATE SET
            full_name = COALESCE(excluded.full_name, clients.full_name),
            phone = COALESCE(excluded.phone, clients.phone),
            email = COALESCE(excluded.email, clients.email),
            birth_date = COALESCE(excluded.birth_date, clients.birth_date),
            passport_series = COALESCE(excluded.passport_series, clients.passport_series),
            passport_number = COALESCE(excluded.passport_number, clients.passport_number),
            passport_issued_by = COALESCE(excluded.passport_issued_by, clients.passport_issued_by),
            passport_issue_date = COALESCE(excluded.passport_issue_date, clients.passport_issue_date),
            address = COALESCE(excluded.address, clients.address),
            emergency_contact = COALESCE(excluded.emergency_contact, clients.emergency_contact),
            relationship = COALESCE(excluded.relationship, clients.relationship),
            updated_at = CURRENT_TIMESTAMP",
    )
    .bind(telegram_id)
    .bind(non_empty(&data.full_name))
    .bind(non_empty(&data.phone))
    .bind(non_empty(&data.email))
    .bind(non_empty(&data.birth_date))
    .bind(non_empty(&data.passport_series))
    .bind(non_empty(&data.passport_number))
    .bind(non_empty(&data.passport_issued_by))
    .bind(non_empty(&data.passport_issue_date))
    .bind(non_empty(&data.address))
    .bind(non_empty(&data.emergency_contact))
    .bind(non_empty(&data.relationship))
    .execute(pool)
    .await
    .context("Failed to save client data")?;

    Ok(())
}

pub async fn get_client(pool: &SqlitePool, telegram_id: i64) -> Result<Option<Client>> {
    sqlx::query_as::<_, Client>(
        "SELECT id, telegram_id, full_name, phone, email, birth_date, passport_series,
                passport_number, passport_issued_by, passport_issue_date, address,
                emergency_contact, relationship, is_verified, created_at, updated_at
         FROM clients WHERE telegram_id = ?",
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read client")
}

/// Marks the client as verified. Returns false when the user never registered.
pub async fn verify_client(pool: &SqlitePool, telegram_id: i64) -> Result<bool> {
    let rows = sqlx::query(
        "UPDATE clients SET is_verified = 1, updated_at = CURRENT_TIMESTAMP WHERE telegram_id = ?",
    )
    .bind(telegram_id)
    .execute(pool)
    .await
    .context("Failed to verify client")?
    .rows_affected();

    Ok(rows > 0)
}

/// Distinct product categories in catalog order
pub async fn get_categories(pool: &SqlitePool) -> Result<Vec<String>> {
    sqlx::query_scalar("SELECT category FROM products GROUP BY category ORDER BY MIN(id)")
        .fetch_all(pool)
        .await
        .context("Failed to read product categories")
}

/// Products of one category, or all of them when `category` is `None`
pub async fn get_products(pool: &SqlitePool, category: Option<&str>) -> Result<Vec<Product>> {
    let products = match category {
        Some(category) => {
            sqlx::query_as::<_, Product>(
                "SELECT id, name, description, price, category, photo_path, created_at
                 FROM products WHERE category = ? ORDER BY id",
            )
            .bind(category)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Product>(
                "SELECT id, name, description, price, category, photo_path, created_at
                 FROM products ORDER BY id",
            )
            .fetch_all(pool)
            .await
        }
    };

    products.context("Failed to read products")
}

pub async fn get_product(pool: &SqlitePool, id: i64) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>(
        "SELECT id, name, description, price, category, photo_path, created_at FROM products WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to read product")
}

/// Adds a product and returns its id
pub async fn add_product(
    pool: &SqlitePool,
    name: &str,
    description: &str,
    price: f64,
    category: &str,
    photo_path: Option<&str>,
) -> Result<i64> {
    info!(category = %category, "Adding product");

    let id = sqlx::query(
        "INSERT INTO products (name, description, price, category, photo_path) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(category)
    .bind(photo_path)
    .execute(pool)
    .await
    .context("Failed to insert product")?
    .last_insert_rowid();

    info!(product_id = id, "Product added");
    Ok(id)
}

/// Deletes a product of the given category. Returns false when no such product exists.
pub async fn delete_product(pool: &SqlitePool, id: i64, category: &str) -> Result<bool> {
    let rows = sqlx::query("DELETE FROM products WHERE id = ? AND category = ?")
        .bind(id)
        .bind(category)
        .execute(pool)
        .await
        .context("Failed to delete product")?
        .rows_affected();

    if rows > 0 {
        info!(product_id = id, "Product deleted");
    } else {
        info!(product_id = id, "No product to delete");
    }
    Ok(rows > 0)
}

pub async fn create_memory_record(pool: &SqlitePool, record: &NewMemoryRecord<'_>) -> Result<i64> {
    info!(user_id = record.telegram_id, "Creating memory record");

    let id = sqlx::query(
        "INSERT INTO memory_records (telegram_id, name, birth_date, death_date, memory_text, photo_path)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(record.telegram_id)
    .bind(record.name)
    .bind(record.birth_date)
    .bind(record.death_date)
    .bind(record.memory_text)
    .bind(record.photo_path)
    .execute(pool)
    .await
    .context("Failed to insert memory record")?
    .last_insert_rowid();

    info!(record_id = id, "Memory record created");
    Ok(id)
}

pub async fn set_memory_page_path(pool: &SqlitePool, id: i64, html_path: &str) -> Result<()> {
    sqlx::query("UPDATE memory_records SET html_path = ? WHERE id = ?")
        .bind(html_path)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to store memory page path")?;
    Ok(())
}

/// Memory records of one owner, or all of them, newest first
pub async fn get_memory_records(pool: &SqlitePool, owner: Option<i64>) -> Result<Vec<MemoryRecord>> {
    let records = match owner {
        Some(telegram_id) => {
            sqlx::query_as::<_, MemoryRecord>(
                "SELECT id, telegram_id, name, birth_date, death_date, memory_text, photo_path,
                        html_path, candles_count, created_at
                 FROM memory_records WHERE telegram_id = ? ORDER BY id DESC",
            )
            .bind(telegram_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, MemoryRecord>(
                "SELECT id, telegram_id, name, birth_date, death_date, memory_text, photo_path,
                        html_path, candles_count, created_at
                 FROM memory_records ORDER BY id DESC",
            )
            .fetch_all(pool)
            .await
        }
    };

    records.context("Failed to read memory records")
}

pub async fn get_memory_record(pool: &SqlitePool, id: i64) -> Result<Option<MemoryRecord>> {
    sqlx::query_as::<_, MemoryRecord>(
        "SELECT id, telegram_id, name, birth_date, death_date, memory_text, photo_path,
                html_path, candles_count, created_at
         FROM memory_records WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to read memory record")
}

/// Lights a candle for a record in one transaction. The unique
/// `(memory_record_id, telegram_id)` key makes a second lighting a no-op,
/// and the counter only moves when a row was actually inserted.
pub async fn light_candle(pool: &SqlitePool, record_id: i64, telegram_id: i64) -> Result<CandleOutcome> {
    let mut tx = pool.begin().await.context("Failed to begin candle transaction")?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM memory_records WHERE id = ?")
        .bind(record_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to look up memory record")?;

    if exists.is_none() {
        tx.rollback().await.context("Failed to roll back candle transaction")?;
        return Ok(CandleOutcome::RecordNotFound);
    }

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO memory_candles (memory_record_id, telegram_id) VALUES (?, ?)",
    )
    .bind(record_id)
    .bind(telegram_id)
    .execute(&mut *tx)
    .await
    .context("Failed to insert candle")?
    .rows_affected();

    if inserted == 0 {
        tx.rollback().await.context("Failed to roll back candle transaction")?;
        return Ok(CandleOutcome::AlreadyLit);
    }

    sqlx::query("UPDATE memory_records SET candles_count = candles_count + 1 WHERE id = ?")
        .bind(record_id)
        .execute(&mut *tx)
        .await
        .context("Failed to increment candle counter")?;

    let candles_count: i64 = sqlx::query_scalar("SELECT candles_count FROM memory_records WHERE id = ?")
        .bind(record_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to read candle counter")?;

    tx.commit().await.context("Failed to commit candle transaction")?;

    info!(record_id, user_id = telegram_id, candles_count, "Candle lit");
    Ok(CandleOutcome::Lit { candles_count })
}

/// Appends a funeral intake form and returns its id
pub async fn save_funeral_form(
    pool: &SqlitePool,
    telegram_id: i64,
    body_location: &str,
    funeral_type: FuneralType,
    services: &[ServiceTag],
    budget: BudgetTier,
) -> Result<i64> {
    let services_json = serde_json::to_string(services).context("Failed to encode services")?;

    let id = sqlx::query(
        "INSERT INTO funeral_forms (telegram_id, body_location, funeral_type, services, budget)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(telegram_id)
    .bind(body_location)
    .bind(funeral_type.as_str())
    .bind(services_json)
    .bind(budget.as_str())
    .execute(pool)
    .await
    .context("Failed to insert funeral form")?
    .last_insert_rowid();

    info!(user_id = telegram_id, form_id = id, "Funeral form saved");
    Ok(id)
}

pub async fn get_funeral_forms(pool: &SqlitePool, telegram_id: i64) -> Result<Vec<FuneralFormRecord>> {
    sqlx::query_as::<_, FuneralFormRecord>(
        "SELECT id, telegram_id, body_location, funeral_type, services, budget, created_at
         FROM funeral_forms WHERE telegram_id = ? ORDER BY id",
    )
    .bind(telegram_id)
    .fetch_all(pool)
    .await
    .context("Failed to read funeral forms")
}

pub async fn log_request(
    pool: &SqlitePool,
    telegram_id: i64,
    request_type: &str,
    request_data: &str,
    response_data: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO request_logs (telegram_id, request_type, request_data, response_data) VALUES (?, ?, ?, ?)",
    )
    .bind(telegram_id)
    .bind(request_type)
    .bind(request_data)
    .bind(response_data)
    .execute(pool)
    .await
    .context("Failed to log request")?;
    Ok(())
}

pub async fn log_chat_message(
    pool: &SqlitePool,
    telegram_id: i64,
    message_type: &str,
    message_text: Option<&str>,
    handler_name: &str,
    is_user_message: bool,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO chat_logs (telegram_id, message_type, message_text, handler_name, is_user_message)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(telegram_id)
    .bind(message_type)
    .bind(message_text)
    .bind(handler_name)
    .bind(is_user_message)
    .execute(pool)
    .await
    .context("Failed to log chat message")?;
    Ok(())
}

/// Most recent chat log rows of a user, newest first
pub async fn get_chat_logs(pool: &SqlitePool, telegram_id: i64, limit: i64) -> Result<Vec<ChatLog>> {
    sqlx::query_as::<_, ChatLog>(
        "SELECT id, telegram_id, message_type, message_text, handler_name, is_user_message, created_at
         FROM chat_logs WHERE telegram_id = ? ORDER BY id DESC LIMIT ?",
    )
    .bind(telegram_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to read chat logs")
}

pub async fn get_user_stats(pool: &SqlitePool) -> Result<UserStats> {
    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    let active_users_7d: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE last_activity >= datetime('now', '-7 days')")
            .fetch_one(pool)
            .await
            .context("Failed to count active users")?;

    let funeral_forms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM funeral_forms")
        .fetch_one(pool)
        .await
        .context("Failed to count funeral forms")?;

    let memory_records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memory_records")
        .fetch_one(pool)
        .await
        .context("Failed to count memory records")?;

    Ok(UserStats {
        total_users,
        active_users_7d,
        funeral_forms,
        memory_records,
    })
}
