use super::*;

/// Tests paginating over all rows, most recently updated first.
///
/// Expected: Ok with two pages and the total count
#[tokio::test]
async fn paginates_newest_first() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let now = Utc::now();
    let mut ids = Vec::new();
    for age in 0..3 {
        let row = ConfigurationFactory::new(db)
            .updated_at(now - Duration::minutes(age))
            .build()
            .await?;
        ids.push(row.id);
    }

    let repo = ConfigurationRepository::new(db);
    let (first_page, total) = repo.get_paginated(None, 0, 2).await?;
    let (second_page, _) = repo.get_paginated(None, 1, 2).await?;

    assert_eq!(total, 3);
    assert_eq!(
        first_page.iter().map(|row| row.id).collect::<Vec<_>>(),
        vec![ids[0], ids[1]]
    );
    assert_eq!(
        second_page.iter().map(|row| row.id).collect::<Vec<_>>(),
        vec![ids[2]]
    );

    Ok(())
}

/// Tests filtering the page by category.
///
/// Expected: Ok with only rows of the requested category
#[tokio::test]
async fn filters_by_category() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    factory::create_configuration(db, "blockIP", "1.1.1.1").await?;
    factory::create_configuration(db, "blockIP", "2.2.2.2").await?;
    factory::create_configuration(db, "mockTime", "2030-01-01T00:00:00Z").await?;

    let repo = ConfigurationRepository::new(db);
    let (rows, total) = repo.get_paginated(Some("blockIP"), 0, 10).await?;

    assert_eq!(total, 2);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.category == "blockIP"));

    Ok(())
}

/// Tests requesting a page past the end.
///
/// Expected: Ok with an empty page and the real total
#[tokio::test]
async fn returns_empty_page_past_end() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    factory::create_configuration(db, "blockIP", "1.1.1.1").await?;

    let repo = ConfigurationRepository::new(db);
    let (rows, total) = repo.get_paginated(None, 5, 10).await?;

    assert!(rows.is_empty());
    assert_eq!(total, 1);

    Ok(())
}
