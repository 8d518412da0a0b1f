use super::*;

/// Tests getting an existing row by ID.
///
/// Expected: Ok(Some(Configuration))
#[tokio::test]
async fn gets_existing_configuration() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let row = factory::create_configuration(db, "signedKey", "k1,k2").await?;

    let repo = ConfigurationRepository::new(db);
    let found = repo.get_by_id(row.id).await?;

    assert!(found.is_some());
    let found = found.unwrap();
    assert_eq!(found.id, row.id);
    assert_eq!(found.category, "signedKey");
    assert_eq!(found.data, "k1,k2");

    Ok(())
}

/// Tests getting a row that does not exist.
///
/// Expected: Ok(None)
#[tokio::test]
async fn returns_none_for_missing_id() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = ConfigurationRepository::new(db);
    let found = repo.get_by_id(999).await?;

    assert!(found.is_none());

    Ok(())
}
