//! Storage-layer guarantees against a real PostgreSQL.
//!
//! Run with `DATABASE_URL=postgres://... cargo test --test postgres_test -- --ignored`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use authhub_core::config::DatabaseConfig;
use authhub_core::error::ErrorKind;
use authhub_database::migration::run_migrations;
use authhub_database::store::{AccountStore, SessionStore, SubscriptionStore, TenantStore};
use authhub_database::{CredentialStore, DatabasePool};
use authhub_entity::account::{Account, AccountRole, CreateAccount};
use authhub_entity::plan::CreatePlan;
use authhub_entity::session::NewRefreshSession;
use authhub_entity::subscription::CreateSubscription;
use authhub_entity::tenant::{CreateTenant, PlanTier, Tenant};

async fn connect() -> CredentialStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let config = DatabaseConfig {
        url,
        ..DatabaseConfig::default()
    };
    let pool = DatabasePool::connect(&config)
        .await
        .expect("Failed to connect to test database")
        .into_pool();
    run_migrations(&pool).await.expect("Failed to run migrations");
    CredentialStore::postgres(pool)
}

fn unique(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}

async fn tenant(store: &CredentialStore) -> Tenant {
    store
        .tenants
        .create_tenant(&CreateTenant {
            name: "Acme".to_string(),
            subdomain: unique("t"),
            plan: PlanTier::Pro,
        })
        .await
        .unwrap()
}

async fn account(store: &CredentialStore, tenant: &Tenant) -> Account {
    store
        .accounts
        .create_account(&CreateAccount {
            email: format!("{}@acme.com", unique("u")),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            tenant_id: Some(tenant.id),
            role: AccountRole::User,
            active: true,
            email_verified_at: Some(Utc::now()),
        })
        .await
        .unwrap()
}

fn new_session(account: &Account) -> NewRefreshSession {
    NewRefreshSession {
        account_id: account.id,
        token_hash: unique("h"),
        token_version: account.token_version,
        expires_at: Utc::now() + Duration::days(7),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_rotation_has_one_winner() {
    let store = connect().await;
    let tenant = tenant(&store).await;
    let account = account(&store, &tenant).await;
    let (current, _) = store
        .sessions
        .insert_session_within_limit(&new_session(&account), 10, Utc::now())
        .await
        .unwrap();

    let current_id = current.id;
    let sessions = Arc::clone(&store.sessions);
    let attempts = (0..8).map(|_| {
        let sessions = Arc::clone(&sessions);
        let next = new_session(&account);
        tokio::spawn(async move { sessions.rotate_session(current_id, &next).await })
    });

    let attempts: Vec<_> = attempts.collect();
    let mut winners = 0;
    for attempt in attempts {
        if attempt.await.unwrap().unwrap().is_some() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let active = store
        .sessions
        .list_active_sessions(account.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_session_limit_evicts_oldest() {
    let store = connect().await;
    let tenant = tenant(&store).await;
    let account = account(&store, &tenant).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (session, _) = store
            .sessions
            .insert_session_within_limit(&new_session(&account), 3, Utc::now())
            .await
            .unwrap();
        ids.push(session.id);
    }

    let (_, evicted) = store
        .sessions
        .insert_session_within_limit(&new_session(&account), 3, Utc::now())
        .await
        .unwrap();
    assert_eq!(evicted, Some(ids[0]));
    assert_eq!(
        store
            .sessions
            .list_active_sessions(account.id, Utc::now())
            .await
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_uniqueness_is_enforced_by_the_database() {
    let store = connect().await;
    let tenant = tenant(&store).await;

    let duplicate = store
        .tenants
        .create_tenant(&CreateTenant {
            name: "Copy".to_string(),
            subdomain: tenant.subdomain.clone(),
            plan: PlanTier::Free,
        })
        .await
        .unwrap_err();
    assert!(duplicate.is(ErrorKind::Conflict));

    let plan = store
        .tenants
        .create_plan(&CreatePlan {
            name: unique("P"),
            price_cents: 0,
            max_users: 5,
            features: serde_json::json!({}),
        })
        .await
        .unwrap();
    let subscription = CreateSubscription {
        tenant_id: tenant.id,
        plan_id: plan.id,
        expires_at: Utc::now() + Duration::days(30),
    };
    store
        .subscriptions
        .create_subscription(&subscription)
        .await
        .unwrap();
    let second = store
        .subscriptions
        .create_subscription(&subscription)
        .await
        .unwrap_err();
    assert!(second.is(ErrorKind::Conflict));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_revoke_all_is_idempotent() {
    let store = connect().await;
    let tenant = tenant(&store).await;
    let account = account(&store, &tenant).await;
    for _ in 0..2 {
        store
            .sessions
            .insert_session_within_limit(&new_session(&account), 10, Utc::now())
            .await
            .unwrap();
    }

    assert_eq!(
        store.sessions.revoke_all_for_account(account.id).await.unwrap(),
        2
    );
    assert_eq!(
        store.sessions.revoke_all_for_account(account.id).await.unwrap(),
        0
    );
    assert!(store.sessions.sweep_expired_or_revoked(Utc::now()).await.unwrap() >= 2);
}
