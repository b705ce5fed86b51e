//! Role-resolution integration tests: owner precedence, grant expiry at the
//! evaluation clock, fail-closed behavior on directory faults, and the
//! owner-claim write-through.

use anyhow::Result;
use chrono::{Duration, Utc};

use huddle::directory::{AdminGrant, DirectoryError, MemberDirectory, MemoryDirectory};
use huddle::identity::{claim_owner_role, resolve_role, resolve_role_at, resolve_role_local, Principal, Role};

const OWNER: &str = "leader@example.org";

fn principal(member_id: &str, email: &str) -> Principal {
    Principal { member_id: member_id.into(), email: email.into(), attrs: Default::default() }
}

#[tokio::test]
async fn owner_wins_regardless_of_grant_state() -> Result<()> {
    let dir = MemoryDirectory::new();
    // Expired grant and absent-expiry grant for the owner are both irrelevant.
    dir.put_admin_grant(OWNER, Some(Utc::now() - Duration::hours(2)));
    assert_eq!(resolve_role(&dir, OWNER, Some(OWNER)).await, Role::Owner);

    dir.put_admin_grant(OWNER, None);
    assert_eq!(resolve_role(&dir, OWNER, Some(OWNER)).await, Role::Owner);

    // Case-insensitive match on the configured email.
    assert_eq!(resolve_role(&dir, OWNER, Some("Leader@Example.ORG")).await, Role::Owner);
    assert_eq!(resolve_role(&dir, OWNER, Some("  leader@example.org  ")).await, Role::Owner);
    Ok(())
}

#[tokio::test]
async fn grant_expiry_is_evaluated_at_call_time() -> Result<()> {
    let dir = MemoryDirectory::new();
    let expires_at = Utc::now() + Duration::minutes(30);
    dir.put_admin_grant("sam@example.org", Some(expires_at));

    // Live grant.
    let before = expires_at - Duration::seconds(1);
    assert_eq!(
        resolve_role_at(&dir, OWNER, Some("sam@example.org"), before).await,
        Role::TemporaryAdmin(expires_at)
    );

    // The instant the clock reaches the expiry, the very next call demotes.
    assert_eq!(resolve_role_at(&dir, OWNER, Some("sam@example.org"), expires_at).await, Role::Member);
    let after = expires_at + Duration::seconds(1);
    assert_eq!(resolve_role_at(&dir, OWNER, Some("sam@example.org"), after).await, Role::Member);
    Ok(())
}

#[tokio::test]
async fn revoked_grant_takes_effect_on_the_next_call() -> Result<()> {
    let dir = MemoryDirectory::new();
    dir.put_admin_grant("sam@example.org", Some(Utc::now() + Duration::hours(1)));
    assert!(matches!(
        resolve_role(&dir, OWNER, Some("sam@example.org")).await,
        Role::TemporaryAdmin(_)
    ));

    dir.clear_admin_grant("sam@example.org");
    assert_eq!(resolve_role(&dir, OWNER, Some("sam@example.org")).await, Role::Member);
    Ok(())
}

#[tokio::test]
async fn missing_grant_or_missing_expiry_is_member() -> Result<()> {
    let dir = MemoryDirectory::new();
    assert_eq!(resolve_role(&dir, OWNER, Some("sam@example.org")).await, Role::Member);

    // A grant without an expiry is equivalent to no grant.
    dir.put_admin_grant("sam@example.org", None);
    assert_eq!(resolve_role(&dir, OWNER, Some("sam@example.org")).await, Role::Member);
    Ok(())
}

#[tokio::test]
async fn grant_lookup_uses_lowercased_email() -> Result<()> {
    let dir = MemoryDirectory::new();
    dir.put_admin_grant("Sam@Example.org", Some(Utc::now() + Duration::hours(1)));
    assert!(matches!(
        resolve_role(&dir, OWNER, Some("SAM@EXAMPLE.ORG")).await,
        Role::TemporaryAdmin(_)
    ));
    Ok(())
}

#[tokio::test]
async fn absent_email_is_guest() -> Result<()> {
    let dir = MemoryDirectory::new();
    assert_eq!(resolve_role(&dir, OWNER, None).await, Role::Guest);
    assert_eq!(resolve_role(&dir, OWNER, Some("")).await, Role::Guest);
    assert_eq!(resolve_role(&dir, OWNER, Some("   ")).await, Role::Guest);
    assert_eq!(resolve_role_local(OWNER, None), Role::Guest);
    Ok(())
}

/// Directory that fails every call.
struct FailingDirectory;

#[async_trait::async_trait]
impl MemberDirectory for FailingDirectory {
    async fn temporary_admin_grant(&self, _email_lower: &str) -> Result<Option<AdminGrant>, DirectoryError> {
        Err(DirectoryError::Unavailable("connection refused".into()))
    }

    async fn set_owner_role_flag(&self, _member_id: &str) -> Result<(), DirectoryError> {
        Err(DirectoryError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn directory_faults_resolve_as_member_never_elevated() -> Result<()> {
    let dir = FailingDirectory;
    assert_eq!(resolve_role(&dir, OWNER, Some("sam@example.org")).await, Role::Member);

    // Owner short-circuits before the lookup, so the fault never matters.
    assert_eq!(resolve_role(&dir, OWNER, Some(OWNER)).await, Role::Owner);
    Ok(())
}

#[tokio::test]
async fn advisory_resolver_never_claims_temporary_admin() -> Result<()> {
    let dir = MemoryDirectory::new();
    dir.put_admin_grant("sam@example.org", Some(Utc::now() + Duration::hours(1)));

    // The full resolver sees the grant; the store-free variant stays
    // conservative.
    assert!(matches!(
        resolve_role(&dir, OWNER, Some("sam@example.org")).await,
        Role::TemporaryAdmin(_)
    ));
    assert_eq!(resolve_role_local(OWNER, Some("sam@example.org")), Role::Member);
    assert_eq!(resolve_role_local(OWNER, Some(OWNER)), Role::Owner);
    Ok(())
}

#[tokio::test]
async fn claim_owner_rejects_non_owner_and_leaves_flag_untouched() -> Result<()> {
    let dir = MemoryDirectory::new();
    let sam = principal("m-sam", "sam@example.org");
    let err = claim_owner_role(&dir, OWNER, &sam).await.expect_err("non-owner must be rejected");
    assert_eq!(err.http_status(), 403);
    assert!(dir.role_flag("m-sam").is_none());

    // A live temporary-admin grant is still not ownership.
    dir.put_admin_grant("sam@example.org", Some(Utc::now() + Duration::hours(1)));
    let err = claim_owner_role(&dir, OWNER, &sam).await.expect_err("temporary admin is not owner");
    assert_eq!(err.http_status(), 403);
    assert!(dir.role_flag("m-sam").is_none());
    Ok(())
}

#[tokio::test]
async fn claim_owner_writes_through_for_the_owner() -> Result<()> {
    let dir = MemoryDirectory::new();
    let leader = principal("m-leader", "Leader@Example.org");
    claim_owner_role(&dir, OWNER, &leader).await.expect("owner claim succeeds");
    assert_eq!(dir.role_flag("m-leader").as_deref(), Some("owner"));
    Ok(())
}

#[tokio::test]
async fn claim_owner_surfaces_write_faults_without_raw_text() -> Result<()> {
    let dir = FailingDirectory;
    let leader = principal("m-leader", OWNER);
    let err = claim_owner_role(&dir, OWNER, &leader).await.expect_err("write fault propagates");
    assert_eq!(err.http_status(), 503);
    assert!(!err.message().is_empty());
    assert!(!err.message().contains("connection refused"));
    Ok(())
}

#[tokio::test]
async fn role_labels_and_admin_predicate() -> Result<()> {
    assert_eq!(Role::Owner.label(), "owner");
    assert_eq!(Role::Guest.label(), "guest");
    assert!(Role::Owner.is_admin());
    assert!(Role::TemporaryAdmin(Utc::now()).is_admin());
    assert!(!Role::Member.is_admin());
    assert!(!Role::Guest.is_admin());
    Ok(())
}
