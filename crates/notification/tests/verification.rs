//! Integration tests for the contact-method verification flow:
//! code issue, rate limiting, verify-and-enable, expiry, and the audit
//! journal.

use beacon_core::audit::actions;
use beacon_core::error::CoreError;
use beacon_core::permission::AuthContext;
use beacon_core::types::DbId;
use beacon_core::verification::{CODE_MAX, CODE_MIN};
use beacon_db::repositories::{AuditRepo, ContactMethodRepo, VerificationCodeRepo};
use beacon_notification::{NotificationStore, StoreError};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool) -> DbId {
    let id = DbId::new_v4();
    sqlx::query("INSERT INTO users (id, name) VALUES ($1, 'Test User')")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn seed_contact_method(pool: &PgPool, user_id: DbId, disabled: bool) -> DbId {
    let id = DbId::new_v4();
    sqlx::query("INSERT INTO user_contact_methods (id, user_id, disabled) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(user_id)
        .bind(disabled)
        .execute(pool)
        .await
        .unwrap();
    id
}

/// Reopen the rate-limit window without waiting it out.
async fn backdate_last_send(pool: &PgPool, cm_id: DbId) {
    sqlx::query(
        "UPDATE user_contact_methods \
         SET last_test_verify_at = now() - interval '2 minutes' \
         WHERE id = $1",
    )
    .bind(cm_id)
    .execute(pool)
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn verification_happy_path(pool: PgPool) {
    let store = NotificationStore::new(pool.clone());
    let user_id = seed_user(&pool).await;
    let cm_id = seed_contact_method(&pool, user_id, true).await;
    let ctx = AuthContext::user(user_id);

    store
        .send_contact_method_verification(&ctx, &cm_id.to_string())
        .await
        .unwrap();

    let code_row = VerificationCodeRepo::find_for_contact_method(&pool, cm_id)
        .await
        .unwrap()
        .expect("verification code should exist");
    assert!((CODE_MIN..=CODE_MAX).contains(&code_row.code));
    assert!(!code_row.sent);

    // Expiry lands 15 minutes out.
    let ttl: f64 = sqlx::query_scalar(
        "SELECT EXTRACT(EPOCH FROM (expires_at - now()))::float8 \
         FROM user_verification_codes WHERE contact_method_id = $1",
    )
    .bind(cm_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!((14.0 * 60.0..=15.0 * 60.0).contains(&ttl), "ttl was {ttl}");

    // The rate-limit clock advanced.
    let cm = ContactMethodRepo::find_by_id(&pool, cm_id)
        .await
        .unwrap()
        .unwrap();
    assert!(cm.last_test_verify_at.is_some());

    store
        .verify_contact_method(&ctx, &cm_id.to_string(), code_row.code)
        .await
        .unwrap();

    let cm = ContactMethodRepo::find_by_id(&pool, cm_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!cm.disabled, "contact method should be enabled");
    assert!(
        VerificationCodeRepo::find_for_contact_method(&pool, cm_id)
            .await
            .unwrap()
            .is_none(),
        "code should be consumed"
    );

    let audit = AuditRepo::list_for_contact_method(&pool, cm_id).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, actions::CONTACT_METHOD_VERIFIED);
    assert_eq!(audit[0].integrity_hash.len(), 64);
}

// ---------------------------------------------------------------------------
// Wrong / expired codes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_code_is_rejected_and_state_unchanged(pool: PgPool) {
    let store = NotificationStore::new(pool.clone());
    let user_id = seed_user(&pool).await;
    let cm_id = seed_contact_method(&pool, user_id, true).await;
    let ctx = AuthContext::user(user_id);

    store
        .send_contact_method_verification(&ctx, &cm_id.to_string())
        .await
        .unwrap();
    let code = VerificationCodeRepo::find_for_contact_method(&pool, cm_id)
        .await
        .unwrap()
        .unwrap()
        .code;

    let err = store
        .verify_contact_method(&ctx, &cm_id.to_string(), code + 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Core(CoreError::Field { field: "code", .. })
    ));

    let cm = ContactMethodRepo::find_by_id(&pool, cm_id)
        .await
        .unwrap()
        .unwrap();
    assert!(cm.disabled, "contact method must stay disabled");
    assert!(
        VerificationCodeRepo::find_for_contact_method(&pool, cm_id)
            .await
            .unwrap()
            .is_some(),
        "code must survive a failed attempt"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_code_is_rejected(pool: PgPool) {
    let store = NotificationStore::new(pool.clone());
    let user_id = seed_user(&pool).await;
    let cm_id = seed_contact_method(&pool, user_id, true).await;
    let ctx = AuthContext::user(user_id);

    store
        .send_contact_method_verification(&ctx, &cm_id.to_string())
        .await
        .unwrap();
    let code = VerificationCodeRepo::find_for_contact_method(&pool, cm_id)
        .await
        .unwrap()
        .unwrap()
        .code;

    sqlx::query(
        "UPDATE user_verification_codes \
         SET expires_at = now() - interval '1 minute' \
         WHERE contact_method_id = $1",
    )
    .bind(cm_id)
    .execute(&pool)
    .await
    .unwrap();

    let err = store
        .verify_contact_method(&ctx, &cm_id.to_string(), code)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Core(CoreError::Field { field: "code", .. })
    ));
}

// ---------------------------------------------------------------------------
// Resend semantics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn resend_preserves_code_and_resets_sent(pool: PgPool) {
    let store = NotificationStore::new(pool.clone());
    let user_id = seed_user(&pool).await;
    let cm_id = seed_contact_method(&pool, user_id, true).await;
    let ctx = AuthContext::user(user_id);

    store
        .send_contact_method_verification(&ctx, &cm_id.to_string())
        .await
        .unwrap();
    let first = VerificationCodeRepo::find_for_contact_method(&pool, cm_id)
        .await
        .unwrap()
        .unwrap();

    // Simulate the dispatcher having sent it, then the user asking again.
    sqlx::query("UPDATE user_verification_codes SET sent = true WHERE contact_method_id = $1")
        .bind(cm_id)
        .execute(&pool)
        .await
        .unwrap();
    backdate_last_send(&pool, cm_id).await;

    store
        .send_contact_method_verification(&ctx, &cm_id.to_string())
        .await
        .unwrap();
    let second = VerificationCodeRepo::find_for_contact_method(&pool, cm_id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(second.code, first.code, "resend keeps the in-flight code");
    assert_eq!(second.id, first.id, "row id survives the upsert");
    assert!(!second.sent, "resend queues the code for the dispatcher again");
    assert!(second.expires_at > first.expires_at, "expiry is refreshed");
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn verification_resend_is_rate_limited(pool: PgPool) {
    let store = NotificationStore::new(pool.clone());
    let user_id = seed_user(&pool).await;
    let cm_id = seed_contact_method(&pool, user_id, true).await;
    let ctx = AuthContext::user(user_id);

    store
        .send_contact_method_verification(&ctx, &cm_id.to_string())
        .await
        .unwrap();

    let err = store
        .send_contact_method_verification(&ctx, &cm_id.to_string())
        .await
        .unwrap_err();
    match err {
        StoreError::Core(CoreError::Field { field, message }) => {
            assert_eq!(field, "ContactMethod");
            assert!(message.starts_with("Too many messages!"), "got: {message}");
        }
        other => panic!("expected rate-limit field error, got {other:?}"),
    }

    // Once the window reopens, the send goes through.
    backdate_last_send(&pool, cm_id).await;
    store
        .send_contact_method_verification(&ctx, &cm_id.to_string())
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Code accessor
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn code_accessor_is_system_only(pool: PgPool) {
    let store = NotificationStore::new(pool.clone());
    let user_id = seed_user(&pool).await;
    let cm_id = seed_contact_method(&pool, user_id, true).await;
    let ctx = AuthContext::user(user_id);

    store
        .send_contact_method_verification(&ctx, &cm_id.to_string())
        .await
        .unwrap();
    let row = VerificationCodeRepo::find_for_contact_method(&pool, cm_id)
        .await
        .unwrap()
        .unwrap();

    let code = store
        .code(&AuthContext::system(), &row.id.to_string())
        .await
        .unwrap();
    assert_eq!(code, row.code);

    let err = store.code(&ctx, &row.id.to_string()).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Core(CoreError::PermissionDenied(_))
    ));

    let err = store
        .code(&AuthContext::system(), &DbId::new_v4().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Core(CoreError::NotFound { .. })));
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_owner_or_admin_may_verify(pool: PgPool) {
    let store = NotificationStore::new(pool.clone());
    let owner = seed_user(&pool).await;
    let stranger = seed_user(&pool).await;
    let cm_id = seed_contact_method(&pool, owner, true).await;

    let err = store
        .send_contact_method_verification(&AuthContext::user(stranger), &cm_id.to_string())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Core(CoreError::PermissionDenied(_))
    ));

    // An admin who is not the owner may act on the method.
    store
        .send_contact_method_verification(&AuthContext::admin(stranger), &cm_id.to_string())
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bad_contact_method_ids_are_field_errors(pool: PgPool) {
    let store = NotificationStore::new(pool.clone());
    let user_id = seed_user(&pool).await;
    let ctx = AuthContext::user(user_id);

    let err = store
        .send_contact_method_verification(&ctx, "not-a-uuid")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Core(CoreError::Field { field: "ContactMethodID", .. })
    ));

    let err = store
        .send_contact_method_verification(&ctx, &DbId::new_v4().to_string())
        .await
        .unwrap_err();
    match err {
        StoreError::Core(CoreError::Field { field, message }) => {
            assert_eq!(field, "ContactMethodID");
            assert_eq!(message, "does not exist");
        }
        other => panic!("expected field error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Audit chain
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn audit_entries_chain_across_verifications(pool: PgPool) {
    let store = NotificationStore::new(pool.clone());
    let user_id = seed_user(&pool).await;
    let ctx = AuthContext::user(user_id);

    for _ in 0..2 {
        let cm_id = seed_contact_method(&pool, user_id, true).await;
        store
            .send_contact_method_verification(&ctx, &cm_id.to_string())
            .await
            .unwrap();
        let code = VerificationCodeRepo::find_for_contact_method(&pool, cm_id)
            .await
            .unwrap()
            .unwrap()
            .code;
        store
            .verify_contact_method(&ctx, &cm_id.to_string(), code)
            .await
            .unwrap();
    }

    let hashes: Vec<String> =
        sqlx::query_scalar("SELECT integrity_hash FROM audit_events ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(hashes.len(), 2);
    assert_ne!(hashes[0], hashes[1]);
}
