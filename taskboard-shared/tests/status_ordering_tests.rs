/// Status ordering against a real database
///
/// Skipped when `DATABASE_URL` is unset.

mod common;

use std::sync::Arc;

use common::Tenant;
use sqlx::PgPool;
use taskboard_shared::auth::access::{strategy_for, AccessMode, AccessStrategy};
use taskboard_shared::models::status::Status;
use taskboard_shared::services::statuses::{create_status, delete_status, list_statuses, move_status, MoveStatus};
use taskboard_shared::services::tasks::{create_task, NewTask};
use taskboard_shared::services::ErrorKind;
use uuid::Uuid;

fn org_access() -> Arc<dyn AccessStrategy> {
    strategy_for(AccessMode::Organization)
}

async fn names_in_order(pool: &PgPool, project_id: Uuid) -> anyhow::Result<Vec<String>> {
    Ok(Status::list_by_project(pool, project_id)
        .await?
        .into_iter()
        .map(|s| s.name)
        .collect())
}

async fn assert_dense(pool: &PgPool, project_id: Uuid) -> anyhow::Result<()> {
    let indices: Vec<i32> = Status::list_by_project(pool, project_id)
        .await?
        .iter()
        .map(|s| s.index)
        .collect();
    let expected: Vec<i32> = (0..indices.len() as i32).collect();
    assert_eq!(indices, expected);
    Ok(())
}

#[tokio::test]
async fn test_new_project_gets_default_workflow() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Launch").await?;

    let statuses = list_statuses(&pool, org_access().as_ref(), &tenant.ctx, project.id).await?;
    let slugs: Vec<&str> = statuses.iter().map(|s| s.slug.as_str()).collect();

    assert_eq!(slugs, vec!["todo", "in_progress", "done", "pending", "canceled"]);
    assert_dense(&pool, project.id).await
}

#[tokio::test]
async fn test_create_appends_at_end() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = org_access();
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Launch").await?;

    let review = create_status(&pool, access.as_ref(), &tenant.ctx, project.id, "In Review").await?;
    let qa = create_status(&pool, access.as_ref(), &tenant.ctx, project.id, "QA").await?;

    assert_eq!(review.index, 5);
    assert_eq!(review.slug, "in_review");
    assert_eq!(qa.index, 6);
    assert_dense(&pool, project.id).await?;

    let err = create_status(&pool, access.as_ref(), &tenant.ctx, project.id, "in review")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_creates_stay_dense() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = org_access();
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Launch").await?;

    let project_id = project.id;
    let mut handles = Vec::new();
    for n in 0..4 {
        let (pool, access, ctx) = (pool.clone(), access.clone(), tenant.ctx.clone());
        handles.push(tokio::spawn(async move {
            create_status(&pool, access.as_ref(), &ctx, project_id, &format!("Lane {}", n)).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(Status::list_by_project(&pool, project.id).await?.len(), 9);
    assert_dense(&pool, project.id).await
}

#[tokio::test]
async fn test_move_shifts_neighbours() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = org_access();
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Launch").await?;

    let statuses = Status::list_by_project(&pool, project.id).await?;
    let done = statuses.iter().find(|s| s.slug == "done").map(|s| s.id).unwrap();

    let moved = move_status(
        &pool,
        access.as_ref(),
        &tenant.ctx,
        done,
        MoveStatus {
            index: Some(0),
            name: None,
        },
    )
    .await?;
    assert_eq!(moved.index, 0);
    assert_eq!(
        names_in_order(&pool, project.id).await?,
        vec!["Done", "Todo", "In Progress", "Pending", "Canceled"]
    );

    move_status(
        &pool,
        access.as_ref(),
        &tenant.ctx,
        done,
        MoveStatus {
            index: Some(4),
            name: Some("Shipped".to_string()),
        },
    )
    .await?;
    assert_eq!(
        names_in_order(&pool, project.id).await?,
        vec!["Todo", "In Progress", "Pending", "Canceled", "Shipped"]
    );
    assert_dense(&pool, project.id).await
}

#[tokio::test]
async fn test_move_out_of_range_is_rejected() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = org_access();
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Launch").await?;
    let first = Status::list_by_project(&pool, project.id).await?[0].id;

    for index in [-1, 5, 99] {
        let err = move_status(
            &pool,
            access.as_ref(),
            &tenant.ctx,
            first,
            MoveStatus {
                index: Some(index),
                name: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    assert_dense(&pool, project.id).await
}

#[tokio::test]
async fn test_concurrent_moves_stay_dense() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = org_access();
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Launch").await?;
    let statuses = Status::list_by_project(&pool, project.id).await?;

    let mut handles = Vec::new();
    for (i, status) in statuses.iter().enumerate() {
        let (pool, access, ctx) = (pool.clone(), access.clone(), tenant.ctx.clone());
        let (status_id, target) = (status.id, (4 - i) as i32);
        handles.push(tokio::spawn(async move {
            move_status(
                &pool,
                access.as_ref(),
                &ctx,
                status_id,
                MoveStatus {
                    index: Some(target),
                    name: None,
                },
            )
            .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_dense(&pool, project.id).await
}

#[tokio::test]
async fn test_delete_compacts_and_refuses_when_in_use() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = org_access();
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Launch").await?;
    let statuses = Status::list_by_project(&pool, project.id).await?;
    let (todo, in_progress) = (statuses[0].id, statuses[1].id);

    create_task(
        &pool,
        access.as_ref(),
        &tenant.ctx,
        NewTask {
            project_id: project.id,
            title: "Write docs".to_string(),
            ..Default::default()
        },
    )
    .await?;

    let err = delete_status(&pool, access.as_ref(), &tenant.ctx, todo).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    delete_status(&pool, access.as_ref(), &tenant.ctx, in_progress).await?;
    assert_eq!(
        names_in_order(&pool, project.id).await?,
        vec!["Todo", "Done", "Pending", "Canceled"]
    );
    assert_dense(&pool, project.id).await?;

    let err = delete_status(&pool, access.as_ref(), &tenant.ctx, in_progress).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_statuses_of_other_tenant_are_invisible() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = org_access();
    let owner = Tenant::seed(&pool).await?;
    let stranger = Tenant::seed(&pool).await?;
    let project = owner.project(&pool, "Launch").await?;
    let first = Status::list_by_project(&pool, project.id).await?[0].id;

    let err = list_statuses(&pool, access.as_ref(), &stranger.ctx, project.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = delete_status(&pool, access.as_ref(), &stranger.ctx, first).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}
