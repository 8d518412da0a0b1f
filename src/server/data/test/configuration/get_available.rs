use super::*;

/// Tests that only enabled rows inside their validity window are available.
///
/// Expected: Ok with the single active row
#[tokio::test]
async fn filters_status_and_window() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let now = Utc::now();
    let active = factory::create_configuration(db, "blockIP", "1.1.1.1").await?;
    ConfigurationFactory::new(db).data("disabled").disabled().build().await?;
    ConfigurationFactory::new(db)
        .data("expired")
        .window(now - Duration::hours(2), now - Duration::hours(1))
        .build()
        .await?;
    ConfigurationFactory::new(db)
        .data("upcoming")
        .window(now + Duration::hours(1), now + Duration::hours(2))
        .build()
        .await?;

    let repo = ConfigurationRepository::new(db);
    let rows = repo.get_available(now).await?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, active.id);

    Ok(())
}

/// Tests that window bounds are exclusive.
///
/// Expected: Ok with no rows when `now` equals either bound
#[tokio::test]
async fn excludes_window_bounds() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let now = Utc::now();
    ConfigurationFactory::new(db)
        .window(now, now + Duration::hours(1))
        .build()
        .await?;
    ConfigurationFactory::new(db)
        .window(now - Duration::hours(1), now)
        .build()
        .await?;

    let repo = ConfigurationRepository::new(db);
    let rows = repo.get_available(now).await?;

    assert!(rows.is_empty());

    Ok(())
}

/// Tests that available rows are ordered by most recent update.
///
/// Expected: Ok with the newest edit first
#[tokio::test]
async fn orders_by_updated_at_desc() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let now = Utc::now();
    let older = ConfigurationFactory::new(db)
        .category("mockTime")
        .data("2020-01-01T00:00:00Z")
        .updated_at(now - Duration::minutes(10))
        .build()
        .await?;
    let newer = ConfigurationFactory::new(db)
        .category("mockTime")
        .data("2030-01-01T00:00:00Z")
        .updated_at(now - Duration::minutes(1))
        .build()
        .await?;

    let repo = ConfigurationRepository::new(db);
    let rows = repo.get_available(now).await?;

    assert_eq!(
        rows.iter().map(|row| row.id).collect::<Vec<_>>(),
        vec![newer.id, older.id]
    );

    Ok(())
}
