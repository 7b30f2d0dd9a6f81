use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Result;

use crate::core::error::AppResult;
use crate::exchange::generate_referral_code;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Данные новой заявки на обмен.
pub struct NewOrder<'a> {
    /// Telegram ID пользователя
    pub user_id: i64,
    /// Имя пользователя на момент создания заявки
    pub username: &'a str,
    /// Сумма в RUB
    pub amount_rub: f64,
    /// Код криптовалюты (BTC, ETH, LTC, USDT)
    pub crypto_type: &'a str,
    /// Сумма в криптовалюте по фиксированному курсу
    pub crypto_amount: f64,
    /// Адрес кошелька для отправки
    pub wallet_address: &'a str,
    /// Комментарий к платежу для ручной сверки
    pub comment: &'a str,
    /// Реферальный код, если заявка пришла по ссылке
    pub referral_code: Option<&'a str>,
}

/// Статистика по одной реферальной ссылке.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkStats {
    /// Количество приведенных пользователей
    pub referrals_count: i64,
    /// Количество заявок от приведенных пользователей
    pub orders_count: i64,
    /// Сумма завершенных заявок от приведенных пользователей, RUB
    pub total_amount: f64,
}

/// Реферальная ссылка со статистикой.
#[derive(Debug, Clone)]
pub struct ReferralLink {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub stats: LinkStats,
}

/// Общая статистика для панели администратора.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminStats {
    pub total_orders: i64,
    pub completed_orders: i64,
    pub waiting_orders: i64,
    pub processing_orders: i64,
    /// Сумма завершенных заявок, RUB
    pub total_amount: f64,
    pub total_referrals: i64,
}

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and ensures
/// the schema is up to date. Schema errors are fatal: a bot that cannot
/// write orders must not start.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
/// * `admin_ids` - Privileged user ids; each gets a default referral link
pub fn create_pool(database_path: &str, admin_ids: &[i64]) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    let conn = pool.get()?;
    init_schema(&conn, admin_ids)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> std::result::Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Initialize database schema idempotently
///
/// Creates missing tables, adds columns a prior schema lacks, and seeds
/// a default referral link for every admin that has none.
pub fn init_schema(conn: &rusqlite::Connection, admin_ids: &[i64]) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            username TEXT,
            referrer_id INTEGER,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            username TEXT,
            amount_rub REAL,
            crypto_type TEXT,
            crypto_amount REAL,
            wallet_address TEXT,
            comment TEXT,
            status TEXT DEFAULT 'pending',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            receipt_photo_id TEXT,
            receipt_file_path TEXT,
            referral_code TEXT
        )",
        [],
    )?;

    migrate_orders_table(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS referral_links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            name TEXT,
            referral_code TEXT UNIQUE,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Каждому админу - дефолтная ссылка, если у него еще нет ни одной
    for admin_id in admin_ids {
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM referral_links WHERE user_id = ?",
            [admin_id],
            |row| row.get(0),
        )?;
        if existing == 0 {
            let code = generate_referral_code();
            conn.execute(
                "INSERT INTO referral_links (user_id, name, referral_code) VALUES (?1, ?2, ?3)",
                &[
                    admin_id as &dyn rusqlite::ToSql,
                    &"Основная ссылка" as &dyn rusqlite::ToSql,
                    &code as &dyn rusqlite::ToSql,
                ],
            )?;
            log::info!("Created default referral link for admin {}", admin_id);
        }
    }

    Ok(())
}

/// Add receipt columns missing from a pre-receipt schema
fn migrate_orders_table(conn: &rusqlite::Connection) -> Result<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(orders)")?;
    let rows = stmt.query_map([], |row| {
        row.get::<_, String>(1) // column name
    })?;

    let mut columns = Vec::new();
    for row in rows {
        columns.push(row?);
    }

    if !columns.contains(&"receipt_file_path".to_string()) {
        log::info!("Adding missing column: receipt_file_path to orders table");
        conn.execute("ALTER TABLE orders ADD COLUMN receipt_file_path TEXT", [])?;
    }

    if !columns.contains(&"receipt_photo_id".to_string()) {
        log::info!("Adding missing column: receipt_photo_id to orders table");
        conn.execute("ALTER TABLE orders ADD COLUMN receipt_photo_id TEXT", [])?;
    }

    Ok(())
}

/// Создает пользователя, если его еще нет.
///
/// # Arguments
///
/// * `conn` - Соединение с базой данных
/// * `user_id` - Telegram ID пользователя
/// * `username` - Имя пользователя (опционально)
pub fn ensure_user_exists(conn: &DbConnection, user_id: i64, username: Option<&str>) -> Result<()> {
    let exists: i64 = conn.query_row("SELECT COUNT(*) FROM users WHERE user_id = ?", [user_id], |row| {
        row.get(0)
    })?;
    if exists == 0 {
        conn.execute(
            "INSERT INTO users (user_id, username) VALUES (?1, ?2)",
            &[
                &user_id as &dyn rusqlite::ToSql,
                &username.unwrap_or("") as &dyn rusqlite::ToSql,
            ],
        )?;
    }
    Ok(())
}

/// Устанавливает реферера для пользователя.
///
/// Срабатывает только если реферер еще не установлен: однажды
/// записанный реферер не перезаписывается.
pub fn set_user_referrer(conn: &DbConnection, user_id: i64, referrer_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE users SET referrer_id = ?1 WHERE user_id = ?2 AND referrer_id IS NULL",
        &[
            &referrer_id as &dyn rusqlite::ToSql,
            &user_id as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(())
}

/// Получает ID реферера пользователя.
pub fn get_referrer_id(conn: &DbConnection, user_id: i64) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT referrer_id FROM users WHERE user_id = ?")?;
    let mut rows = stmt.query([user_id])?;

    if let Some(row) = rows.next()? {
        Ok(row.get(0)?)
    } else {
        Ok(None)
    }
}

/// Получает ID всех пользователей (для legacy-проверки числовых
/// реферальных аргументов).
pub fn get_all_user_ids(conn: &DbConnection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT user_id FROM users")?;
    let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Находит владельца реферального кода.
pub fn resolve_referral_code(conn: &DbConnection, code: &str) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT user_id FROM referral_links WHERE referral_code = ?")?;
    let mut rows = stmt.query([code])?;

    if let Some(row) = rows.next()? {
        Ok(Some(row.get(0)?))
    } else {
        Ok(None)
    }
}

/// Создает новую реферальную ссылку.
///
/// Возвращает `None` без записи, если `user_id` не входит в список
/// администраторов - отказ выражается пустым результатом, не ошибкой.
pub fn create_referral_link(
    conn: &DbConnection,
    admin_ids: &[i64],
    user_id: i64,
    name: &str,
) -> Result<Option<String>> {
    if !admin_ids.contains(&user_id) {
        return Ok(None);
    }

    let code = generate_referral_code();
    conn.execute(
        "INSERT INTO referral_links (user_id, name, referral_code) VALUES (?1, ?2, ?3)",
        &[
            &user_id as &dyn rusqlite::ToSql,
            &name as &dyn rusqlite::ToSql,
            &code as &dyn rusqlite::ToSql,
        ],
    )?;

    Ok(Some(code))
}

/// Получает все реферальные ссылки админа со статистикой.
///
/// Для не-админа возвращает пустой список.
pub fn get_referral_links(conn: &DbConnection, admin_ids: &[i64], user_id: i64) -> Result<Vec<ReferralLink>> {
    if !admin_ids.contains(&user_id) {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT id, name, referral_code FROM referral_links WHERE user_id = ? ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut links = Vec::new();
    for row in rows {
        let (id, name, code) = row?;
        let stats = get_referral_stats(conn, &code)?;
        links.push(ReferralLink { id, name, code, stats });
    }
    Ok(links)
}

/// Получает статистику по реферальному коду.
///
/// Неизвестный код дает нулевую статистику.
pub fn get_referral_stats(conn: &DbConnection, code: &str) -> Result<LinkStats> {
    let owner_id = match resolve_referral_code(conn, code)? {
        Some(id) => id,
        None => {
            return Ok(LinkStats {
                referrals_count: 0,
                orders_count: 0,
                total_amount: 0.0,
            })
        }
    };

    let referrals_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE referrer_id = ?",
        [owner_id],
        |row| row.get(0),
    )?;

    let orders_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM orders o
         JOIN users u ON o.user_id = u.user_id
         WHERE u.referrer_id = ?",
        [owner_id],
        |row| row.get(0),
    )?;

    let total_amount: f64 = conn
        .query_row(
            "SELECT SUM(o.amount_rub) FROM orders o
             JOIN users u ON o.user_id = u.user_id
             WHERE u.referrer_id = ? AND o.status = 'completed'",
            [owner_id],
            |row| row.get::<_, Option<f64>>(0),
        )?
        .unwrap_or(0.0);

    Ok(LinkStats {
        referrals_count,
        orders_count,
        total_amount,
    })
}

/// Получает общую статистику для администратора.
///
/// Для не-админа возвращает `None` - отказ пустым результатом.
pub fn get_admin_stats(conn: &DbConnection, admin_ids: &[i64], user_id: i64) -> Result<Option<AdminStats>> {
    if !admin_ids.contains(&user_id) {
        return Ok(None);
    }

    let count_by_status = |status: &str| -> Result<i64> {
        conn.query_row("SELECT COUNT(*) FROM orders WHERE status = ?", [status], |row| {
            row.get(0)
        })
    };

    let total_orders: i64 = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
    let completed_orders = count_by_status("completed")?;
    let waiting_orders = count_by_status("waiting_payment")?;
    let processing_orders = count_by_status("processing")?;

    let total_amount: f64 = conn
        .query_row(
            "SELECT SUM(amount_rub) FROM orders WHERE status = 'completed'",
            [],
            |row| row.get::<_, Option<f64>>(0),
        )?
        .unwrap_or(0.0);

    let total_referrals: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE referrer_id = ?",
        [user_id],
        |row| row.get(0),
    )?;

    Ok(Some(AdminStats {
        total_orders,
        completed_orders,
        waiting_orders,
        processing_orders,
        total_amount,
        total_referrals,
    }))
}

/// Создает заявку со статусом `pending` и возвращает ее ID.
pub fn create_order(conn: &DbConnection, order: &NewOrder<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO orders (user_id, username, amount_rub, crypto_type, crypto_amount, wallet_address, comment, referral_code)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        &[
            &order.user_id as &dyn rusqlite::ToSql,
            &order.username as &dyn rusqlite::ToSql,
            &order.amount_rub as &dyn rusqlite::ToSql,
            &order.crypto_type as &dyn rusqlite::ToSql,
            &order.crypto_amount as &dyn rusqlite::ToSql,
            &order.wallet_address as &dyn rusqlite::ToSql,
            &order.comment as &dyn rusqlite::ToSql,
            &order.referral_code as &dyn rusqlite::ToSql,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Сохраняет путь к файлу чека для заявки.
///
/// Единственная мутация заявки после создания.
pub fn save_receipt_path(conn: &DbConnection, order_id: i64, file_path: &str) -> Result<()> {
    conn.execute(
        "UPDATE orders SET receipt_file_path = ?1 WHERE id = ?2",
        &[
            &file_path as &dyn rusqlite::ToSql,
            &order_id as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(())
}
