/// Task assignment against a real database
///
/// Skipped when `DATABASE_URL` is unset.

mod common;

use common::{seed_user, Tenant};
use taskboard_shared::auth::access::{strategy_for, AccessMode};
use taskboard_shared::models::task_assignee::TaskAssignee;
use taskboard_shared::services::assignments::{replace_assignments, Identity};
use taskboard_shared::services::tasks::{
    assign_users, create_task, get_task, take_task, update_task, NewTask, TaskPatch, TaskView,
};
use taskboard_shared::services::ErrorKind;
use uuid::Uuid;

async fn seeded_task(pool: &sqlx::PgPool, tenant: &Tenant) -> anyhow::Result<TaskView> {
    let access = strategy_for(AccessMode::Organization);
    let project = tenant.project(pool, "Sprint").await?;

    Ok(create_task(
        pool,
        access.as_ref(),
        &tenant.ctx,
        NewTask {
            project_id: project.id,
            title: "Fix login".to_string(),
            ..Default::default()
        },
    )
    .await?)
}

#[tokio::test]
async fn test_assign_by_mixed_identities_reports_missing() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = strategy_for(AccessMode::Organization);
    let tenant = Tenant::seed(&pool).await?;
    let task = seeded_task(&pool, &tenant).await?;

    let ann = seed_user(&pool, "ann").await?;
    let bob = seed_user(&pool, "bob").await?;
    let ghost = format!("ghost-{}@example.com", Uuid::new_v4());

    let identities = vec![
        Identity::parse(&ann.email.to_uppercase()),
        Identity::parse(&ghost),
        Identity::UserId(bob.id),
        Identity::parse(&ann.email),
    ];

    let report = assign_users(&pool, access.as_ref(), &tenant.ctx, task.task.id, &identities).await?;

    assert_eq!(report.assigned_count, 2);
    assert_eq!(report.assigned_users, vec![ann.id, bob.id]);
    assert_eq!(report.missing_identities, vec![ghost]);

    // repeating the request is a no-op
    let again = assign_users(&pool, access.as_ref(), &tenant.ctx, task.task.id, &identities).await?;
    assert_eq!(again.assigned_count, 2);

    let view = get_task(&pool, access.as_ref(), &tenant.ctx, task.task.id).await?;
    assert_eq!(view.assignee_ids.len(), 2);

    let err = assign_users(&pool, access.as_ref(), &tenant.ctx, task.task.id, &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    Ok(())
}

#[tokio::test]
async fn test_replace_assignments() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let tenant = Tenant::seed(&pool).await?;
    let task = seeded_task(&pool, &tenant).await?;
    let ann = seed_user(&pool, "ann").await?;
    let bob = seed_user(&pool, "bob").await?;

    let written = replace_assignments(&pool, task.task.id, Some(vec![ann.id, Uuid::new_v4(), bob.id])).await?;
    assert_eq!(written, Some(vec![ann.id, bob.id]));

    assert_eq!(replace_assignments(&pool, task.task.id, None).await?, None);
    let assigned = TaskAssignee::user_ids_by_task(&pool, &[task.task.id]).await?;
    assert_eq!(assigned[&task.task.id].len(), 2);

    replace_assignments(&pool, task.task.id, Some(vec![])).await?;
    let assigned = TaskAssignee::user_ids_by_task(&pool, &[task.task.id]).await?;
    assert!(assigned[&task.task.id].is_empty());

    Ok(())
}

#[tokio::test]
async fn test_update_task_replaces_assignees_with_fields() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = strategy_for(AccessMode::Organization);
    let tenant = Tenant::seed(&pool).await?;
    let task = seeded_task(&pool, &tenant).await?;
    let (member, _) = tenant.add_member(&pool, "member").await?;

    let updated = update_task(
        &pool,
        access.as_ref(),
        &tenant.ctx,
        task.task.id,
        TaskPatch {
            title: Some("Fix login redirect".to_string()),
            assignee_ids: Some(vec![member.id]),
            ..Default::default()
        },
    )
    .await?;

    assert_eq!(updated.task.title, "Fix login redirect");
    assert_eq!(updated.assignee_ids, vec![member.id]);

    let untouched = update_task(
        &pool,
        access.as_ref(),
        &tenant.ctx,
        task.task.id,
        TaskPatch {
            title: Some("Fix login".to_string()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(untouched.assignee_ids, vec![member.id]);

    Ok(())
}

#[tokio::test]
async fn test_take_task_twice_conflicts() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = strategy_for(AccessMode::Organization);
    let tenant = Tenant::seed(&pool).await?;
    let task = seeded_task(&pool, &tenant).await?;
    let (member, member_ctx) = tenant.add_member(&pool, "member").await?;

    let taken = take_task(&pool, access.as_ref(), &member_ctx, task.task.id).await?;
    assert_eq!(taken.assignee_ids, vec![member.id]);

    let err = take_task(&pool, access.as_ref(), &member_ctx, task.task.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "You are already assigned to this task");

    Ok(())
}
