/// Project lifecycle, access strategies and accounts against a real database
///
/// Skipped when `DATABASE_URL` is unset.

mod common;

use chrono::Duration;
use common::{seed_user, Tenant};
use taskboard_shared::auth::access::{authorize, strategy_for, AccessMode, Resource};
use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::models::project::{Project, UpdateProject};
use taskboard_shared::models::project_member::ProjectMember;
use taskboard_shared::models::status::Status;
use taskboard_shared::models::task::Task;
use taskboard_shared::services::accounts::{log_in, sign_up, SignUp};
use taskboard_shared::services::assignments::Identity;
use taskboard_shared::services::organizations::{invite_member, list_members};
use taskboard_shared::services::projects::{
    delete_project, get_project, invite_project_member, list_projects, update_project,
};
use taskboard_shared::services::tasks::{assign_users, create_task, NewTask};
use taskboard_shared::models::task_assignee::TaskAssignee;
use taskboard_shared::services::{DeleteStage, ErrorKind, ServiceError};
use uuid::Uuid;

const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

#[tokio::test]
async fn test_delete_project_cascades() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = strategy_for(AccessMode::Organization);
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Doomed").await?;

    for title in ["One", "Two"] {
        let task = create_task(
            &pool,
            access.as_ref(),
            &tenant.ctx,
            NewTask {
                project_id: project.id,
                title: title.to_string(),
                ..Default::default()
            },
        )
        .await?;
        assign_users(
            &pool,
            access.as_ref(),
            &tenant.ctx,
            task.task.id,
            &[Identity::UserId(tenant.owner.id)],
        )
        .await?;
    }

    let summary = delete_project(&pool, access.as_ref(), &tenant.ctx, project.id).await?;

    assert_eq!(summary.assignments, 2);
    assert_eq!(summary.tasks, 2);
    assert_eq!(summary.statuses, 5);
    assert_eq!(summary.members, 1);

    assert!(Project::find_by_id(&pool, project.id).await?.is_none());
    assert!(Task::list_by_project(&pool, project.id).await?.is_empty());
    assert!(Status::list_by_project(&pool, project.id).await?.is_empty());
    assert!(!ProjectMember::exists(&pool, project.id, tenant.owner.id).await?);

    let err = delete_project(&pool, access.as_ref(), &tenant.ctx, project.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_failed_cascade_stage_rolls_back() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = strategy_for(AccessMode::Organization);
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Protected").await?;

    let task = create_task(
        &pool,
        access.as_ref(),
        &tenant.ctx,
        NewTask {
            project_id: project.id,
            title: "Keep me".to_string(),
            assignee_ids: Some(vec![tenant.owner.id]),
            ..Default::default()
        },
    )
    .await?;

    // make task deletion fail for this project only
    let function = format!("block_task_delete_{}", project.id.simple());
    sqlx::query(&format!(
        "CREATE FUNCTION {function}() RETURNS trigger AS $$ \
         BEGIN RAISE EXCEPTION 'task delete blocked'; END; $$ LANGUAGE plpgsql"
    ))
    .execute(&pool)
    .await?;
    sqlx::query(&format!(
        "CREATE TRIGGER {function} BEFORE DELETE ON tasks FOR EACH ROW \
         WHEN (OLD.project_id = '{}') EXECUTE FUNCTION {function}()",
        project.id
    ))
    .execute(&pool)
    .await?;

    let result = delete_project(&pool, access.as_ref(), &tenant.ctx, project.id).await;

    sqlx::query(&format!("DROP TRIGGER {function} ON tasks")).execute(&pool).await?;
    sqlx::query(&format!("DROP FUNCTION {function}()")).execute(&pool).await?;

    let err = result.unwrap_err();
    assert!(
        matches!(err, ServiceError::CascadeFailed { stage: DeleteStage::DeleteTasks, .. }),
        "unexpected error: {:?}",
        err
    );
    assert_eq!(err.kind(), ErrorKind::DependencyFailure);

    // the assignee rows cleared by the earlier stage are back
    assert!(Project::find_by_id(&pool, project.id).await?.is_some());
    assert_eq!(Task::list_by_project(&pool, project.id).await?.len(), 1);
    assert_eq!(Status::list_by_project(&pool, project.id).await?.len(), 5);
    assert!(TaskAssignee::exists(&pool, task.task.id, tenant.owner.id).await?);
    assert!(ProjectMember::exists(&pool, project.id, tenant.owner.id).await?);

    Ok(())
}

#[tokio::test]
async fn test_cross_tenant_access_is_not_found() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let access = strategy_for(AccessMode::Organization);
    let owner = Tenant::seed(&pool).await?;
    let other = Tenant::seed(&pool).await?;
    let project = owner.project(&pool, "Private").await?;

    let err = get_project(&pool, access.as_ref(), &other.ctx, project.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = update_project(
        &pool,
        access.as_ref(),
        &other.ctx,
        project.id,
        UpdateProject {
            name: Some("Hijacked".to_string()),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = delete_project(&pool, access.as_ref(), &other.ctx, project.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(!authorize(access.as_ref(), &pool, &other.ctx, Resource::Project(project.id)).await?);
    assert!(authorize(access.as_ref(), &pool, &owner.ctx, Resource::Project(project.id)).await?);

    // no tenant asserted at all
    let bare = AuthContext::from_jwt(owner.owner.id);
    let err = get_project(&pool, access.as_ref(), &bare, project.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let visible = list_projects(&pool, access.as_ref(), &owner.ctx).await?;
    assert!(visible.iter().any(|p| p.id == project.id));
    let visible = list_projects(&pool, access.as_ref(), &other.ctx).await?;
    assert!(visible.iter().all(|p| p.id != project.id));

    Ok(())
}

#[tokio::test]
async fn test_direct_membership_strategy() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let org_access = strategy_for(AccessMode::Organization);
    let direct = strategy_for(AccessMode::ProjectMembers);
    let tenant = Tenant::seed(&pool).await?;
    let project = tenant.project(&pool, "Shared").await?;

    let outsider = seed_user(&pool, "outsider").await?;
    let outsider_ctx = AuthContext::from_jwt(outsider.id);

    // no tenant needed, but no membership yet either
    let err = get_project(&pool, direct.as_ref(), &outsider_ctx, project.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    invite_project_member(&pool, org_access.as_ref(), &tenant.ctx, project.id, &outsider.email).await?;

    let seen = get_project(&pool, direct.as_ref(), &outsider_ctx, project.id).await?;
    assert_eq!(seen.id, project.id);
    let visible = list_projects(&pool, direct.as_ref(), &outsider_ctx).await?;
    assert_eq!(visible.len(), 1);

    let err = invite_project_member(&pool, org_access.as_ref(), &tenant.ctx, project.id, &outsider.email)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = invite_project_member(
        &pool,
        org_access.as_ref(),
        &tenant.ctx,
        project.id,
        "nobody-here@example.com",
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_sign_up_log_in_and_invite() -> anyhow::Result<()> {
    let Some(pool) = common::test_pool().await? else {
        return Ok(());
    };
    let email = format!("founder-{}@example.com", Uuid::new_v4());
    let org_name = format!("Founders {}", Uuid::new_v4());

    let account = sign_up(
        &pool,
        SECRET,
        Duration::hours(1),
        SignUp {
            email: email.clone(),
            password: "correct horse 1".to_string(),
            organization_name: Some(format!("  {}  ", org_name)),
        },
    )
    .await?;
    let organization = account.organization.clone().unwrap();
    assert_eq!(organization.name, org_name);
    assert_eq!(organization.owner_id, account.user.id);

    let err = sign_up(
        &pool,
        SECRET,
        Duration::hours(1),
        SignUp {
            email: email.to_uppercase(),
            password: "correct horse 1".to_string(),
            organization_name: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let session = log_in(&pool, SECRET, Duration::hours(1), &email, "correct horse 1").await?;
    assert_eq!(session.user.id, account.user.id);
    assert_eq!(session.tokens.expires_in, 3600);

    let wrong_password = log_in(&pool, SECRET, Duration::hours(1), &email, "wrong horse 1").await.unwrap_err();
    let unknown_email = log_in(&pool, SECRET, Duration::hours(1), "nobody@example.com", "x").await.unwrap_err();
    assert_eq!(wrong_password.kind(), ErrorKind::Unauthorized);
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());

    let ctx = AuthContext::from_jwt(account.user.id).with_organization(organization.id);
    let teammate = seed_user(&pool, "teammate").await?;
    invite_member(&pool, &ctx, &teammate.email).await?;

    let err = invite_member(&pool, &ctx, &teammate.email).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let members = list_members(&pool, &ctx).await?;
    let emails: Vec<&str> = members.iter().map(|m| m.email.as_str()).collect();
    assert_eq!(emails, vec![email.as_str(), teammate.email.as_str()]);

    Ok(())
}
