//! Database-backed flow tests.
//!
//! Ignored by default; run with a real Postgres:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/coursehub_test cargo test -- --ignored
//! ```

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use bigdecimal::{BigDecimal, FromPrimitive};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use coursehub::config::AppConfig;
use coursehub::database::run_migrations;
use coursehub::models::course::{Course, CourseChanges, NewCourse};
use coursehub::models::enrollment::Enrollment;
use coursehub::models::newsletter::NewsletterSubscription;
use coursehub::models::profile::{ProfileChanges, UserProfile};
use coursehub::payments::webhook::compute_signature;
use coursehub::web::{build_router, AppState};

const WEBHOOK_SECRET: &str = "whsec_db_tests";

async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for db tests");
    let pool = PgPool::connect(&url).await.expect("connect to test database");
    run_migrations(&pool).await.expect("migrations apply");
    pool
}

/// Router wired to the real test database, with auth disabled so the given
/// dev identity is injected on protected routes.
fn api_router(pool: PgPool, dev_user_id: &str) -> axum::Router {
    let mut config = AppConfig::load_for_environment("test").expect("test config loads");
    config.auth.dev_user_id = dev_user_id.to_string();
    config.payments.webhook_secret = WEBHOOK_SECRET.to_string();
    build_router(AppState::new(config, pool))
}

fn signed_webhook_request(payload: &str) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp();
    let signature = compute_signature(payload.as_bytes(), WEBHOOK_SECRET, timestamp).unwrap();

    Request::post("/api/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json")
        .header("stripe-signature", format!("t={timestamp},v1={signature}"))
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()
}

fn sample_course(tutor_id: &str, max_students: Option<i32>) -> NewCourse {
    NewCourse {
        tutor_id: tutor_id.to_string(),
        title: "Intro to Rust".to_string(),
        description: "Ownership and borrowing".to_string(),
        duration: "6 weeks".to_string(),
        level: "beginner".to_string(),
        price: BigDecimal::from_f64(49.99).unwrap().with_scale(2),
        image_url: None,
        technologies: vec!["rust".to_string()],
        max_students,
        is_published: true,
    }
}

#[tokio::test]
#[ignore]
async fn test_course_crud_round_trip() {
    let pool = test_pool().await;
    let tutor = format!("user_tutor_{}", unique_suffix());

    let created = Course::create(&pool, sample_course(&tutor, Some(20)))
        .await
        .expect("course created");
    assert_eq!(created.current_students, 0);

    let fetched = Course::find_by_id(&pool, created.id)
        .await
        .expect("query ok")
        .expect("course exists");
    assert_eq!(fetched.title, "Intro to Rust");

    let updated = Course::update(
        &pool,
        created.id,
        CourseChanges {
            title: Some("Advanced Rust".to_string()),
            level: Some("advanced".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("query ok")
    .expect("course exists");
    assert_eq!(updated.title, "Advanced Rust");
    assert_eq!(updated.level, "advanced");
    // Untouched columns survive the partial update
    assert_eq!(updated.duration, "6 weeks");

    assert!(Course::delete(&pool, created.id).await.expect("query ok"));
    assert!(Course::find_by_id(&pool, created.id)
        .await
        .expect("query ok")
        .is_none());
}

#[tokio::test]
#[ignore]
async fn test_seat_claims_stop_at_capacity() {
    let pool = test_pool().await;
    let tutor = format!("user_tutor_{}", unique_suffix());

    let course = Course::create(&pool, sample_course(&tutor, Some(2)))
        .await
        .expect("course created");

    assert!(Course::try_claim_seat(&pool, course.id).await.unwrap());
    assert!(Course::try_claim_seat(&pool, course.id).await.unwrap());
    // Third claim finds the course full
    assert!(!Course::try_claim_seat(&pool, course.id).await.unwrap());

    let course = Course::find_by_id(&pool, course.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(course.current_students, 2);
    assert!(course.is_full());
}

#[tokio::test]
#[ignore]
async fn test_unlimited_course_never_fills() {
    let pool = test_pool().await;
    let tutor = format!("user_tutor_{}", unique_suffix());

    let course = Course::create(&pool, sample_course(&tutor, None))
        .await
        .expect("course created");

    for _ in 0..5 {
        assert!(Course::try_claim_seat(&pool, course.id).await.unwrap());
    }
}

#[tokio::test]
#[ignore]
async fn test_enrollment_uniqueness_and_paid_upsert() {
    let pool = test_pool().await;
    let tutor = format!("user_tutor_{}", unique_suffix());
    let student = format!("user_student_{}", unique_suffix());

    let course = Course::create(&pool, sample_course(&tutor, None))
        .await
        .expect("course created");

    let pending = Enrollment::create_pending(&pool, &student, "course", course.id)
        .await
        .expect("enrollment created");
    assert_eq!(pending.payment_status, "pending");

    // Second direct enrollment trips the unique constraint
    let duplicate = Enrollment::create_pending(&pool, &student, "course", course.id).await;
    assert!(duplicate.is_err());

    // A completed payment lands on the same row
    let amount = BigDecimal::from_f64(49.99).unwrap().with_scale(2);
    let paid = Enrollment::upsert_paid(&pool, &student, "course", course.id, Some("pi_1"), &amount)
        .await
        .expect("upsert ok");
    assert_eq!(paid.id, pending.id);
    assert_eq!(paid.payment_status, "paid");

    // Redelivered webhook is idempotent
    let again = Enrollment::upsert_paid(&pool, &student, "course", course.id, Some("pi_1"), &amount)
        .await
        .expect("upsert ok");
    assert_eq!(again.id, pending.id);

    let listed = Enrollment::list_for_user(&pool, &student)
        .await
        .expect("list ok");
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_profile_lazy_create_and_update() {
    let pool = test_pool().await;
    let user_id = format!("user_{}", unique_suffix());

    assert!(UserProfile::find_by_user_id(&pool, &user_id)
        .await
        .unwrap()
        .is_none());

    let created = UserProfile::create_default(&pool, &user_id, "student@example.com")
        .await
        .expect("profile created");
    assert_eq!(created.role, "student");
    assert!(!created.is_verified);

    let updated = UserProfile::update(
        &pool,
        &user_id,
        coursehub::models::profile::ProfileChanges {
            role: Some("tutor".to_string()),
            bio: Some("Teaching Rust since 2019".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("query ok")
    .expect("profile exists");
    assert_eq!(updated.role, "tutor");
    assert_eq!(updated.email, "student@example.com");
}

#[tokio::test]
#[ignore]
async fn test_webhook_redelivery_is_idempotent() {
    let pool = test_pool().await;
    let tutor = format!("user_tutor_{}", unique_suffix());
    let student = format!("user_student_{}", unique_suffix());

    let course = Course::create(&pool, sample_course(&tutor, Some(10)))
        .await
        .expect("course created");

    let session_id = format!("cs_{}", unique_suffix());
    let payload = json!({
        "id": format!("evt_{}", unique_suffix()),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_intent": format!("pi_{}", unique_suffix()),
                "amount_total": 4999,
                "currency": "usd",
                "metadata": { "course_id": course.id, "user_id": student },
                "payment_method_types": ["card"],
            }
        }
    })
    .to_string();

    for _ in 0..2 {
        let router = api_router(pool.clone(), &student);
        let response = router
            .oneshot(signed_webhook_request(&payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // One purchase: one seat, one enrollment, one payment row
    let reloaded = Course::find_by_id(&pool, course.id).await.unwrap().unwrap();
    assert_eq!(reloaded.current_students, 1);

    let enrollments = Enrollment::list_for_user(&pool, &student).await.unwrap();
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0].payment_status, "paid");

    let (payment_rows,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM payments WHERE provider_session_id = $1")
            .bind(&session_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(payment_rows, 1);
}

#[tokio::test]
#[ignore]
async fn test_delete_course_with_enrollments_is_refused() {
    let pool = test_pool().await;
    let tutor = format!("user_tutor_{}", unique_suffix());
    let student = format!("user_student_{}", unique_suffix());

    UserProfile::create_default(&pool, &tutor, "tutor@example.com")
        .await
        .expect("profile created");
    UserProfile::update(
        &pool,
        &tutor,
        ProfileChanges {
            role: Some("tutor".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("query ok")
    .expect("profile exists");

    let course = Course::create(&pool, sample_course(&tutor, None))
        .await
        .expect("course created");
    Enrollment::create_pending(&pool, &student, "course", course.id)
        .await
        .expect("enrollment created");

    let router = api_router(pool.clone(), &tutor);
    let response = router
        .oneshot(
            Request::delete(format!("/api/courses/{}", course.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The course survives the refused delete
    assert!(Course::find_by_id(&pool, course.id)
        .await
        .unwrap()
        .is_some());

    // A course without enrollments deletes normally
    let empty_course = Course::create(&pool, sample_course(&tutor, None))
        .await
        .expect("course created");
    let router = api_router(pool.clone(), &tutor);
    let response = router
        .oneshot(
            Request::delete(format!("/api/courses/{}", empty_course.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_enrollment_rejected_through_api() {
    let pool = test_pool().await;
    let tutor = format!("user_tutor_{}", unique_suffix());
    let student = format!("user_student_{}", unique_suffix());

    let course = Course::create(&pool, sample_course(&tutor, None))
        .await
        .expect("course created");

    let enroll = |pool: PgPool, student: String| {
        let body = json!({ "course_id": course.id }).to_string();
        async move {
            let router = api_router(pool, &student);
            router
                .oneshot(
                    Request::post("/api/enrollments")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap()
        }
    };

    let first = enroll(pool.clone(), student.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = enroll(pool.clone(), student.clone()).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    // The constraint violation a concurrent racer hits is classified as a
    // unique violation, which the handler maps to 400 rather than 500
    let race = Enrollment::create_pending(&pool, &student, "course", course.id)
        .await
        .expect_err("duplicate insert fails");
    assert!(race
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation()));

    let reloaded = Course::find_by_id(&pool, course.id).await.unwrap().unwrap();
    assert_eq!(reloaded.current_students, 1);
}

#[tokio::test]
#[ignore]
async fn test_newsletter_duplicate_detection() {
    let pool = test_pool().await;
    let email = format!("reader_{}@example.com", unique_suffix());

    assert!(NewsletterSubscription::find_by_email(&pool, &email)
        .await
        .unwrap()
        .is_none());

    let subscription = NewsletterSubscription::create(&pool, &email)
        .await
        .expect("subscription created");
    assert!(subscription.is_active);

    let found = NewsletterSubscription::find_by_email(&pool, &email)
        .await
        .unwrap();
    assert!(found.is_some());
}
