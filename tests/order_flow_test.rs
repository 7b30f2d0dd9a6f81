//! End-to-end order lifecycle over the storage and domain layers,
//! without the Telegram transport.

use badex::core::{SessionStore, UserState};
use badex::exchange::{check_amount, convert_to_crypto, find_currency, generate_comment, AmountCheck};
use badex::storage::db::{self, NewOrder};
use badex::storage::{create_pool, get_connection, DbPool};
use tempfile::TempDir;

const ADMINS: &[i64] = &[100];
const MIN_AMOUNT_RUB: f64 = 3000.0;

fn test_pool() -> (TempDir, DbPool) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.db");
    let pool = create_pool(path.to_str().unwrap(), ADMINS).unwrap();
    (dir, pool)
}

#[tokio::test]
async fn full_order_flow_persists_a_pending_order_with_receipt() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();
    let sessions = SessionStore::new();
    let user_id = 555;

    db::ensure_user_exists(&conn, user_id, Some("alice")).unwrap();

    // currency selection
    sessions.set(user_id, UserState::WaitingCrypto).await;
    let currency = find_currency("USDT").unwrap();
    sessions
        .set(
            user_id,
            UserState::WaitingAmount {
                crypto: currency.code.to_string(),
            },
        )
        .await;

    // amount entry
    let AmountCheck::Ok(amount_rub) = check_amount("5000", MIN_AMOUNT_RUB) else {
        panic!("5000 must be a valid amount");
    };
    let crypto_amount = convert_to_crypto(amount_rub, currency.rate);
    assert_eq!(crypto_amount, 55.55555556);

    // wallet + comment
    let comment = generate_comment();
    sessions
        .set(
            user_id,
            UserState::Confirming {
                crypto: currency.code.to_string(),
                amount_rub,
                crypto_amount,
                wallet_address: "TUSDTwallet".to_string(),
                comment: comment.clone(),
            },
        )
        .await;

    // confirmation persists the order
    let order_id = db::create_order(
        &conn,
        &NewOrder {
            user_id,
            username: "alice",
            amount_rub,
            crypto_type: currency.code,
            crypto_amount,
            wallet_address: "TUSDTwallet",
            comment: &comment,
            referral_code: None,
        },
    )
    .unwrap();
    sessions.set(user_id, UserState::WaitingReceipt { order_id }).await;

    let (status, stored_comment): (String, String) = conn
        .query_row("SELECT status, comment FROM orders WHERE id = ?", [order_id], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(status, "pending");
    assert_eq!(stored_comment, comment);

    // receipt upload attaches the file path and resets the dialog
    db::save_receipt_path(&conn, order_id, "receipts/receipt_555_42.jpg").unwrap();
    sessions.clear(user_id).await;

    let receipt: Option<String> = conn
        .query_row("SELECT receipt_file_path FROM orders WHERE id = ?", [order_id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(receipt.as_deref(), Some("receipts/receipt_555_42.jpg"));
    assert_eq!(sessions.get(user_id).await, None);
}

#[tokio::test]
async fn below_minimum_amount_keeps_the_dialog_in_waiting_amount() {
    let sessions = SessionStore::new();
    let user_id = 7;

    sessions
        .set(
            user_id,
            UserState::WaitingAmount {
                crypto: "USDT".to_string(),
            },
        )
        .await;

    // "2999" with a 3000 minimum is rejected: no transition happens
    assert_eq!(check_amount("2999", MIN_AMOUNT_RUB), AmountCheck::BelowMin);
    assert_eq!(
        sessions.get(user_id).await,
        Some(UserState::WaitingAmount {
            crypto: "USDT".to_string()
        })
    );
}

#[tokio::test]
async fn upload_in_idle_attaches_nothing() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();
    let sessions = SessionStore::new();
    let user_id = 9;

    db::ensure_user_exists(&conn, user_id, None).unwrap();
    let order_id = db::create_order(
        &conn,
        &NewOrder {
            user_id,
            username: "bob",
            amount_rub: 5000.0,
            crypto_type: "BTC",
            crypto_amount: 0.00142857,
            wallet_address: "bc1qwallet",
            comment: "x1y2z3a4b5",
            referral_code: None,
        },
    )
    .unwrap();

    // Idle user sends a photo: the upload handler requires
    // `WaitingReceipt`, so nothing may be recorded
    assert!(!matches!(
        sessions.get(user_id).await,
        Some(UserState::WaitingReceipt { .. })
    ));

    let receipt: Option<String> = conn
        .query_row("SELECT receipt_file_path FROM orders WHERE id = ?", [order_id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(receipt, None);
}

#[test]
fn referral_attribution_is_first_write_wins_across_links() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();

    let first_code = db::create_referral_link(&conn, ADMINS, 100, "Канал А").unwrap().unwrap();
    let second_code = db::create_referral_link(&conn, ADMINS, 100, "Канал Б").unwrap().unwrap();
    assert_ne!(first_code, second_code);

    db::ensure_user_exists(&conn, 1, None).unwrap();

    let owner = db::resolve_referral_code(&conn, &first_code).unwrap().unwrap();
    db::set_user_referrer(&conn, 1, owner).unwrap();

    // A later attempt through another link must not overwrite
    let other_owner = db::resolve_referral_code(&conn, &second_code).unwrap().unwrap();
    db::set_user_referrer(&conn, 1, other_owner + 1).unwrap();

    assert_eq!(db::get_referrer_id(&conn, 1).unwrap(), Some(owner));
}

#[test]
fn non_admin_gets_empty_results_from_admin_operations() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();
    let stranger = 31337;

    assert_eq!(db::create_referral_link(&conn, ADMINS, stranger, "nope").unwrap(), None);
    assert!(db::get_referral_links(&conn, ADMINS, stranger).unwrap().is_empty());
    assert_eq!(db::get_admin_stats(&conn, ADMINS, stranger).unwrap(), None);

    // Nothing was written on their behalf
    let link_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM referral_links WHERE user_id = ?",
            [stranger],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(link_count, 0);
}
