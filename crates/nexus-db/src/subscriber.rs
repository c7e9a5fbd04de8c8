//! The `subscriber` table: one row per configured EBICS subscriber,
//! holding connection details, the sealed key file, and the bank's public
//! keys once HPB has returned them. Key *material* interpretation (sealing
//! format, RSA parsing) belongs to `ebics-protocol`; this module only
//! moves bytes and the handshake state string.

use crate::error::Result;
use crate::pool::DbPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriberRow {
    pub id: Uuid,
    pub partner_id: String,
    pub user_id: String,
    pub host_id: String,
    pub ebics_url: String,
    pub dialect: String,
    pub state: String,
    pub key_salt: Vec<u8>,
    pub key_nonce: Vec<u8>,
    pub key_ciphertext: Vec<u8>,
    pub bank_auth_pub: Option<Vec<u8>>,
    pub bank_enc_pub: Option<Vec<u8>>,
}

pub async fn load(pool: &DbPool, id: Uuid) -> Result<Option<SubscriberRow>> {
    let row = sqlx::query_as("SELECT * FROM subscriber WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn load_all(pool: &DbPool) -> Result<Vec<SubscriberRow>> {
    let rows = sqlx::query_as("SELECT * FROM subscriber ORDER BY partner_id, user_id")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &DbPool,
    partner_id: &str,
    user_id: &str,
    host_id: &str,
    ebics_url: &str,
    dialect: &str,
    key_salt: &[u8],
    key_nonce: &[u8],
    key_ciphertext: &[u8],
) -> Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO subscriber
            (partner_id, user_id, host_id, ebics_url, dialect, state, key_salt, key_nonce, key_ciphertext)
        VALUES ($1, $2, $3, $4, $5, 'fresh', $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(partner_id)
    .bind(user_id)
    .bind(host_id)
    .bind(ebics_url)
    .bind(dialect)
    .bind(key_salt)
    .bind(key_nonce)
    .bind(key_ciphertext)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn advance_init_state(pool: &DbPool, id: Uuid, new_state: &str) -> Result<()> {
    sqlx::query("UPDATE subscriber SET state = $2 WHERE id = $1")
        .bind(id)
        .bind(new_state)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_bank_keys(
    pool: &DbPool,
    id: Uuid,
    bank_auth_pub: &[u8],
    bank_enc_pub: &[u8],
) -> Result<()> {
    sqlx::query(
        "UPDATE subscriber SET bank_auth_pub = $2, bank_enc_pub = $3, state = 'hpb_received' WHERE id = $1",
    )
    .bind(id)
    .bind(bank_auth_pub)
    .bind(bank_enc_pub)
    .execute(pool)
    .await?;
    Ok(())
}
