use anyhow::Result;
use euroservice::db::*;
use euroservice::package_matcher::{BudgetTier, FuneralType, ServiceTag};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Opens a fresh database in a temporary directory. The directory must
/// outlive the pool, so both are returned.
async fn setup_test_db() -> Result<(TempDir, SqlitePool)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("test.db").display());

    let pool = connect(&url).await?;
    init_database_schema(&pool).await?;

    Ok((dir, pool))
}

async fn create_record(pool: &SqlitePool, owner: i64, name: &str) -> Result<i64> {
    create_memory_record(
        pool,
        &NewMemoryRecord {
            telegram_id: owner,
            name,
            birth_date: "01.01.1950",
            death_date: "02.02.2020",
            memory_text: "Светлая память, любим и помним",
            photo_path: None,
        },
    )
    .await
}

#[tokio::test]
async fn test_schema_init_is_idempotent() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    // Running it again must not fail on existing tables
    init_database_schema(&pool).await?;

    let stats = get_user_stats(&pool).await?;
    assert_eq!(stats, UserStats::default());
    Ok(())
}

#[tokio::test]
async fn test_seed_products_only_once() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    let inserted = seed_products(&pool).await?;
    assert_eq!(inserted, 10);

    let again = seed_products(&pool).await?;
    assert_eq!(again, 0);

    let products = get_products(&pool, None).await?;
    assert_eq!(products.len(), 10);

    let categories = get_categories(&pool).await?;
    assert_eq!(categories, vec!["coffin", "wreath", "cross"]);

    let coffins = get_products(&pool, Some("coffin")).await?;
    assert_eq!(coffins.len(), 4);
    assert_eq!(coffins[0].photo_path.as_deref(), Some("photos/coffin1.jpg"));
    assert_eq!(coffins[3].photo_path.as_deref(), Some("photos/coffin4.jpg"));

    let crosses = get_products(&pool, Some("cross")).await?;
    assert_eq!(crosses[0].photo_path.as_deref(), Some("photos/cross1.jpg"));
    Ok(())
}

#[tokio::test]
async fn test_user_upsert_keeps_created_at() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    upsert_user(&pool, 12345, Some("ivan"), Some("Иван"), None).await?;
    let first = get_user(&pool, 12345).await?.expect("user exists");
    assert_eq!(first.username.as_deref(), Some("ivan"));

    upsert_user(&pool, 12345, Some("ivan_new"), Some("Иван"), Some("Петров")).await?;
    let second = get_user(&pool, 12345).await?.expect("user exists");
    assert_eq!(second.username.as_deref(), Some("ivan_new"));
    assert_eq!(second.last_name.as_deref(), Some("Петров"));
    assert_eq!(second.created_at, first.created_at);

    assert!(get_user(&pool, 999).await?.is_none());

    let stats = get_user_stats(&pool).await?;
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.active_users_7d, 1);
    Ok(())
}

#[tokio::test]
async fn test_client_partial_update() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    let data = ClientData {
        full_name: Some("Иванов Иван Иванович".to_string()),
        phone: Some("+79991234567".to_string()),
        email: Some("ivan@mail.ru".to_string()),
        ..ClientData::default()
    };
    save_client_data(&pool, 42, &data).await?;

    // Empty and missing values leave stored ones untouched
    let update = ClientData {
        phone: Some("+79997654321".to_string()),
        email: Some("   ".to_string()),
        address: Some("Москва, ул. Ленина, 1".to_string()),
        ..ClientData::default()
    };
    save_client_data(&pool, 42, &update).await?;

    let client = get_client(&pool, 42).await?.expect("client exists");
    assert_eq!(client.full_name.as_deref(), Some("Иванов Иван Иванович"));
    assert_eq!(client.phone.as_deref(), Some("+79997654321"));
    assert_eq!(client.email.as_deref(), Some("ivan@mail.ru"));
    assert_eq!(client.address.as_deref(), Some("Москва, ул. Ленина, 1"));
    assert!(!client.is_verified);

    assert_eq!(client.data().phone.as_deref(), Some("+79997654321"));
    Ok(())
}

#[tokio::test]
async fn test_verify_client() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    assert!(!verify_client(&pool, 7).await?);

    save_client_data(
        &pool,
        7,
        &ClientData {
            full_name: Some("Петров Петр".to_string()),
            ..ClientData::default()
        },
    )
    .await?;
    assert!(verify_client(&pool, 7).await?);

    let client = get_client(&pool, 7).await?.expect("client exists");
    assert!(client.is_verified);
    Ok(())
}

#[tokio::test]
async fn test_product_add_and_delete_by_category() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    let id = add_product(&pool, "Венок еловый", "", 4500.0, "wreath", None).await?;
    let product = get_product(&pool, id).await?.expect("product exists");
    assert_eq!(product.name, "Венок еловый");
    assert_eq!(product.description, "");
    assert_eq!(product.price, 4500.0);

    // Wrong category does not delete
    assert!(!delete_product(&pool, id, "coffin").await?);
    assert!(get_product(&pool, id).await?.is_some());

    assert!(delete_product(&pool, id, "wreath").await?);
    assert!(get_product(&pool, id).await?.is_none());

    assert!(!delete_product(&pool, id, "wreath").await?);
    Ok(())
}

#[tokio::test]
async fn test_memory_records_by_owner() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    let first = create_record(&pool, 1, "Иванова Мария").await?;
    let second = create_record(&pool, 2, "Петров Николай").await?;
    let third = create_record(&pool, 1, "Сидоров Павел").await?;

    let mine = get_memory_records(&pool, Some(1)).await?;
    let ids: Vec<i64> = mine.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![third, first]);

    let all = get_memory_records(&pool, None).await?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, third);

    set_memory_page_path(&pool, second, "memory_pages/memory_2.html").await?;
    let record = get_memory_record(&pool, second).await?.expect("record exists");
    assert_eq!(record.html_path.as_deref(), Some("memory_pages/memory_2.html"));
    assert_eq!(record.candles_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_light_candle_once_per_user() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let record = create_record(&pool, 1, "Иванова Мария").await?;

    assert_eq!(
        light_candle(&pool, record, 100).await?,
        CandleOutcome::Lit { candles_count: 1 }
    );
    assert_eq!(light_candle(&pool, record, 100).await?, CandleOutcome::AlreadyLit);
    assert_eq!(
        light_candle(&pool, record, 200).await?,
        CandleOutcome::Lit { candles_count: 2 }
    );
    assert_eq!(light_candle(&pool, 9999, 100).await?, CandleOutcome::RecordNotFound);

    let stored = get_memory_record(&pool, record).await?.expect("record exists");
    assert_eq!(stored.candles_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_funeral_form_services_round_trip() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    let services = [ServiceTag::Transport, ServiceTag::Documents, ServiceTag::Hall];
    save_funeral_form(
        &pool,
        5,
        "Москва, морг №1",
        FuneralType::Cremation,
        &services,
        BudgetTier::From30kTo60k,
    )
    .await?;

    let forms = get_funeral_forms(&pool, 5).await?;
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].funeral_type, "cremation");
    assert_eq!(forms[0].budget, "30k_60k");
    assert_eq!(forms[0].services, r#"["transport","documents","hall"]"#);
    assert_eq!(forms[0].service_tags()?, services.to_vec());

    let stats = get_user_stats(&pool).await?;
    assert_eq!(stats.funeral_forms, 1);
    Ok(())
}

#[tokio::test]
async fn test_chat_logs_newest_first() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    log_chat_message(&pool, 3, "text", Some("привет"), "message_handler", true).await?;
    log_chat_message(&pool, 3, "voice", Some("расшифровка"), "voice_handler", true).await?;
    log_chat_message(&pool, 4, "text", Some("другой"), "message_handler", true).await?;
    log_request(&pool, 3, "ai_lawyer", "вопрос", "").await?;

    let logs = get_chat_logs(&pool, 3, 10).await?;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].message_type, "voice");
    assert_eq!(logs[0].handler_name.as_deref(), Some("voice_handler"));
    assert!(logs[0].is_user_message);

    let limited = get_chat_logs(&pool, 3, 1).await?;
    assert_eq!(limited.len(), 1);
    Ok(())
}
