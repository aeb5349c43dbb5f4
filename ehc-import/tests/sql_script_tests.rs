//! The generated production script runs against the real schema

use chrono::Utc;
use ehc_common::db::init_schema;
use ehc_common::db::users::find_user_by_email;
use ehc_import::sql_script::generate_update_script;
use ehc_import::{import_members, parse_csv, MemberRow};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();
    pool
}

const HEADER: &str = "real_email,mindbody_id,first_name,last_name,phone,membership_tier,joined_on,total_bookings,last_booking_date,trackman_emails_linked";

#[tokio::test]
async fn test_script_executes_and_updates_existing_members() {
    let pool = memory_pool().await;
    let header = HEADER;
    let seed = format!("{}\nOBrien@x.com,1,Pat,Smith,,Core Membership,,1,,\n", header);
    import_members(&pool, &parse_csv(&seed)).await.unwrap();

    let update = format!(
        "{}\nobrien@x.com,77,Pat,O'Brien,5551234,VIP Membership,3/7/2024,9,,\"t'1@x.com\"\nmissing@x.com,,,,,Core Membership,,1,,\n",
        header
    );
    let members: Vec<MemberRow> = parse_csv(&update).iter().map(MemberRow::from_csv).collect();
    let script = generate_update_script(&members, Utc::now()).unwrap();

    sqlx::raw_sql(&script).execute(&pool).await.unwrap();

    let user = find_user_by_email(&pool, "obrien@x.com").await.unwrap().unwrap();
    assert_eq!(user.last_name.as_deref(), Some("O'Brien"));
    assert_eq!(user.tier.as_deref(), Some("VIP"));
    assert_eq!(user.mindbody_client_id.as_deref(), Some("77"));
    assert_eq!(user.lifetime_visits, 9);
    assert_eq!(user.linked_emails, vec!["t'1@x.com"]);
    assert_eq!(user.created_at, "2024-03-07 00:00:00");

    // Update-only: unknown members are not created
    assert!(find_user_by_email(&pool, "missing@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_script_never_lowers_lifetime_visits() {
    let pool = memory_pool().await;

    let first = format!("{}\na@x.com,1,Ada,Lovelace,,VIP Membership,,5,,\n", HEADER);
    import_members(&pool, &parse_csv(&first)).await.unwrap();
    let second = format!("{}\na@x.com,1,Ada,Lovelace,,VIP Membership,,3,,\n", HEADER);
    let rows = parse_csv(&second);
    import_members(&pool, &rows).await.unwrap();

    let members: Vec<MemberRow> = rows.iter().map(MemberRow::from_csv).collect();
    let script = generate_update_script(&members, Utc::now()).unwrap();
    sqlx::raw_sql(&script).execute(&pool).await.unwrap();

    let user = find_user_by_email(&pool, "a@x.com").await.unwrap().unwrap();
    assert_eq!(user.lifetime_visits, 5);

    // A higher count in the export still raises the stored value
    let third = format!("{}\na@x.com,1,Ada,Lovelace,,VIP Membership,,8,,\n", HEADER);
    let members: Vec<MemberRow> = parse_csv(&third).iter().map(MemberRow::from_csv).collect();
    let script = generate_update_script(&members, Utc::now()).unwrap();
    sqlx::raw_sql(&script).execute(&pool).await.unwrap();

    let user = find_user_by_email(&pool, "a@x.com").await.unwrap().unwrap();
    assert_eq!(user.lifetime_visits, 8);
}
