//! `ebics-nexus` binary entrypoint: CLI subcommands for running the
//! gateway daemon and for the one-shot administrative operations around
//! it (key setup, manual submit/fetch passes, payment initiation, local
//! testing, config introspection).
//!
//! Exit codes: `0` success, `1` generic failure, `2` lookup missing (e.g.
//! no subscriber registered yet), `77` prerequisite missing (e.g. the
//! database isn't reachable or isn't at the expected schema version) —
//! the same three-way split the teacher makes between a bind failure
//! (`process::exit(1)` in its own `src/main.rs`) and ordinary `Result`
//! propagation, extended with the two extra codes this gateway's CLI
//! surface needs.

mod config;
mod sig_down;
mod telemetry;

use axum::http::Method;
use clap::{Parser, Subcommand};
use config::{CliArgs, Config};
use ebics_protocol::download::{advance_transfer, finish_download, handle_init_response, DownloadPhase, InitOutcome};
use ebics_protocol::envelope::{build_download_init_request, build_download_receipt_request, build_download_transfer_request};
use ebics_protocol::key_management::{build_hia_request, build_ini_request, parse_hpb_response};
use ebics_protocol::subscriber::{public_key_to_pem, seal, unseal, BankKeys, KeyManagementState, SealedKeyFile, Subscriber};
use ebics_protocol::{envelope, Dialect};
use nexus_db::model::{NewIncomingPayment, NewInitiatedPayment};
use nexus_db::{DbPool, PoolConfig};
use nexus_scheduler::subscriber_context::SubscriberContext;
use nexus_scheduler::{BankClient, SchedulerRegistry};
use rsa::pkcs8::DecodePublicKey;
use rust_decimal::Decimal;
use sig_down::SigDown;
use std::process::ExitCode;
use std::sync::Arc;
use tower_http::cors;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "ebics-nexus", about = "EBICS bank-communication gateway")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the gateway daemon: the HTTP facade plus the submitter and
    /// fetcher background tasks.
    Serve,
    /// Generates a fresh subscriber keypair and registers it with the
    /// configured bank (INI/HIA). The keys letter still has to be printed
    /// and confirmed at the bank before HPB will succeed.
    EbicsSetup,
    /// Verifies the database is reachable and at the expected schema
    /// version. Migrations themselves are an external collaborator.
    Dbinit,
    /// Runs one upload transaction for the oldest pending initiation, if
    /// any.
    EbicsSubmit,
    /// Runs one download pass for both statement order types.
    EbicsFetch,
    /// Queues an outgoing payment.
    InitiatePayment {
        payto: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        request_uid: String,
    },
    /// Local testing helpers that bypass the bank.
    Testing {
        #[command(subcommand)]
        command: TestingCommand,
    },
    /// Configuration introspection.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TestingCommand {
    /// Records a simulated incoming payment as if the bank had reported
    /// it, without talking to the bank.
    FakeIncoming {
        payto: String,
        #[arg(long, default_value = "EUR:1.00")]
        amount: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Prints the fully-resolved configuration.
    Dump,
    /// Prints one configuration value (`section/key`).
    Get { key: String },
    /// Prints the configured Postgres `sql_dir`, substituting `~` with
    /// `$HOME`.
    Pathsub,
}

/// The three non-success exit families the CLI distinguishes, plus an
/// `anyhow`-wrapped catch-all for everything else.
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("{0}")]
    LookupMissing(String),
    #[error("{0}")]
    PrerequisiteMissing(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    telemetry::init();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start the async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::LookupMissing(msg)) => {
            tracing::error!("{msg}");
            ExitCode::from(2)
        }
        Err(AppError::PrerequisiteMissing(msg)) => {
            tracing::error!("{msg}");
            ExitCode::from(77)
        }
        Err(AppError::Other(err)) => {
            tracing::error!("{err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load(&cli.args)
        .map_err(|e| AppError::PrerequisiteMissing(format!("configuration: {e}")))?;

    match cli.command {
        Command::Serve => serve(&config).await,
        Command::EbicsSetup => ebics_setup(&config).await,
        Command::Dbinit => dbinit(&config).await,
        Command::EbicsSubmit => ebics_submit(&config).await,
        Command::EbicsFetch => ebics_fetch(&config).await,
        Command::InitiatePayment { payto, amount, subject, request_uid } => {
            initiate_payment(&config, payto, amount, subject, request_uid).await
        }
        Command::Testing { command: TestingCommand::FakeIncoming { payto, amount } } => {
            fake_incoming(&config, payto, amount).await
        }
        Command::Config { command } => config_command(&config, command),
    }
}

async fn connect(config: &Config) -> Result<DbPool, AppError> {
    nexus_db::create_pool(&PoolConfig {
        url: config.db.config.clone(),
        max_connections: 10,
        min_connections: 1,
    })
    .await
    .map_err(|e| AppError::PrerequisiteMissing(format!("database: {e}")))
}

fn passphrase() -> Result<String, AppError> {
    std::env::var("EBICS_NEXUS_PASSPHRASE").map_err(|_| {
        AppError::PrerequisiteMissing(
            "EBICS_NEXUS_PASSPHRASE must be set to unseal the subscriber's private keys".to_string(),
        )
    })
}

fn parse_dialect(text: &str) -> Result<Dialect, AppError> {
    match text.to_ascii_lowercase().as_str() {
        "h004" => Ok(Dialect::H004),
        "h005" => Ok(Dialect::H005),
        other => Err(AppError::Other(anyhow::anyhow!("unknown EBICS dialect {other:?}"))),
    }
}

fn dialect_label(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::H004 => "h004",
        Dialect::H005 => "h005",
    }
}

fn parse_state(text: &str) -> KeyManagementState {
    match text {
        "ini_sent" => KeyManagementState::IniSent,
        "hia_sent" => KeyManagementState::HiaSent,
        "keys_letter_printed" => KeyManagementState::KeysLetterPrinted,
        "hpb_received" => KeyManagementState::HpbReceived,
        "ready" => KeyManagementState::Ready,
        _ => KeyManagementState::Fresh,
    }
}

/// Loads the one configured subscriber's row, unseals its key material,
/// and assembles the in-memory context the scheduler operates on.
async fn load_context(pool: &DbPool, config: &Config) -> Result<SubscriberContext, AppError> {
    let passphrase = passphrase()?;
    let rows = nexus_db::subscriber::load_all(pool)
        .await
        .map_err(|e| AppError::Other(e.into()))?;
    let row = rows
        .into_iter()
        .find(|r| r.partner_id == config.ebics.partner_id && r.user_id == config.ebics.user_id)
        .ok_or_else(|| {
            AppError::LookupMissing(format!(
                "no subscriber registered for partner {:?} / user {:?} — run `ebics-setup` first",
                config.ebics.partner_id, config.ebics.user_id
            ))
        })?;

    let dialect = parse_dialect(&row.dialect)?;
    let state = parse_state(&row.state);
    let bank_keys = match (&row.bank_auth_pub, &row.bank_enc_pub) {
        (Some(auth), Some(enc)) => Some(BankKeys {
            authentication: parse_public_pem(auth)?,
            encryption: parse_public_pem(enc)?,
        }),
        _ => None,
    };

    let salt: [u8; 16] = row
        .key_salt
        .as_slice()
        .try_into()
        .map_err(|_| AppError::Other(anyhow::anyhow!("stored key salt is the wrong length")))?;
    let nonce: [u8; 12] = row
        .key_nonce
        .as_slice()
        .try_into()
        .map_err(|_| AppError::Other(anyhow::anyhow!("stored key nonce is the wrong length")))?;
    let sealed = SealedKeyFile { salt, nonce, ciphertext: row.key_ciphertext.clone() };
    let subscriber = unseal(&sealed, &passphrase, dialect, state, bank_keys)
        .map_err(|e| AppError::Other(e.into()))?;

    Ok(SubscriberContext {
        id: row.id,
        dialect,
        host_id: row.host_id,
        partner_id: row.partner_id,
        user_id: row.user_id,
        ebics_url: row.ebics_url,
        iban: config.ebics.iban.clone(),
        bic: config.ebics.bic.clone().unwrap_or_default(),
        name: config.ebics.name.clone(),
        currency: config.ebics.currency.clone(),
        subscriber,
    })
}

fn parse_public_pem(der_or_pem: &[u8]) -> Result<rsa::RsaPublicKey, AppError> {
    let text = std::str::from_utf8(der_or_pem)
        .map_err(|e| AppError::Other(anyhow::anyhow!("stored bank key is not valid UTF-8: {e}")))?;
    rsa::RsaPublicKey::from_public_key_pem(text)
        .map_err(|e| AppError::Other(anyhow::anyhow!("stored bank key is not valid PEM: {e}")))
}

async fn serve(config: &Config) -> Result<(), AppError> {
    let pool = connect(config).await?;
    nexus_db::pool::check_schema_version(&pool, 1)
        .await
        .map_err(|e| AppError::PrerequisiteMissing(format!("schema version: {e}")))?;

    let ctx = Arc::new(load_context(&pool, config).await?);
    let registry = Arc::new(SchedulerRegistry::new());
    let bank = BankClient::new();
    let sig_down = SigDown::try_new().map_err(|e| AppError::Other(e.into()))?;
    let shutdown = sig_down.cancellation_token();

    let submitter = tokio::spawn(nexus_scheduler::run_submitter(
        pool.clone(),
        registry.clone(),
        bank.clone(),
        ctx.clone(),
        shutdown.clone(),
    ));
    let fetcher = tokio::spawn(nexus_scheduler::run_fetcher(
        pool.clone(),
        registry.clone(),
        bank.clone(),
        ctx.clone(),
        shutdown.clone(),
    ));

    let account = nexus_gateway::AccountInfo {
        iban: config.ebics.iban.clone(),
        bic: config.ebics.bic.clone(),
        currency: config.ebics.currency.clone(),
    };
    let credentials: Arc<dyn nexus_gateway::CredentialStore> = Arc::new(nexus_gateway::StaticCredentialStore {
        username: config.gateway.username.clone(),
        password: config.gateway.password.clone(),
    });
    let state = nexus_gateway::AppState {
        pool: pool.clone(),
        registry: registry.clone(),
        credentials,
        account,
    };

    let app = nexus_gateway::routes(state).layer(
        cors::CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(cors::Any),
    );

    let addr: std::net::SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port)
        .parse()
        .map_err(|e| AppError::Other(anyhow::anyhow!("invalid gateway bind address: {e}")))?;
    tracing::info!("starting the wire-gateway facade at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::PrerequisiteMissing(format!("failed to bind to {addr}: {e}")))?;

    let graceful = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { graceful.cancelled().await })
        .await
        .map_err(|e| AppError::Other(e.into()))?;

    submitter.abort();
    fetcher.abort();
    Ok(())
}

async fn dbinit(config: &Config) -> Result<(), AppError> {
    let pool = connect(config).await?;
    nexus_db::pool::check_schema_version(&pool, 1)
        .await
        .map_err(|e| AppError::PrerequisiteMissing(format!("schema version: {e}")))?;
    println!("database reachable and at the expected schema version");
    Ok(())
}

async fn ebics_setup(config: &Config) -> Result<(), AppError> {
    let passphrase = passphrase()?;
    let dialect = parse_dialect(&config.ebics.bank_dialect)?;
    let subscriber = Subscriber::new_fresh(dialect).map_err(|e| AppError::Other(e.into()))?;

    let ini_xml = build_ini_request(
        dialect,
        &config.ebics.partner_id,
        &config.ebics.user_id,
        &subscriber.signature_keys.public,
    )
    .map_err(|e| AppError::Other(e.into()))?;
    let hia_xml = build_hia_request(
        dialect,
        &config.ebics.partner_id,
        &config.ebics.user_id,
        &subscriber.authentication_keys.public,
        &subscriber.encryption_keys.public,
    )
    .map_err(|e| AppError::Other(e.into()))?;

    let bank = BankClient::new();
    let ebics_url = &config.ebics.host_base_url;
    send_key_management(&bank, ebics_url, ini_xml).await?;
    send_key_management(&bank, ebics_url, hia_xml).await?;

    let sealed = seal(&subscriber, &passphrase).map_err(|e| AppError::Other(e.into()))?;
    std::fs::write(&config.ebics.client_private_keys_file, &sealed.ciphertext)
        .map_err(|e| AppError::Other(anyhow::anyhow!("writing sealed key file: {e}")))?;

    let pool = connect(config).await?;
    let id = nexus_db::subscriber::create(
        &pool,
        &config.ebics.partner_id,
        &config.ebics.user_id,
        &config.ebics.host_id,
        ebics_url,
        dialect_label(dialect),
        &sealed.salt,
        &sealed.nonce,
        &sealed.ciphertext,
    )
    .await
    .map_err(|e| AppError::Other(e.into()))?;
    nexus_db::subscriber::advance_init_state(&pool, id, "hia_sent")
        .await
        .map_err(|e| AppError::Other(e.into()))?;

    println!("INI and HIA sent for subscriber {id}.");
    println!(
        "signature public key:\n{}",
        public_key_to_pem(&subscriber.signature_keys.public).map_err(|e| AppError::Other(e.into()))?
    );

    // A real bank won't release keys via HPB until the printed keys letter
    // has been confirmed out of band; attempting it here anyway matches a
    // sandbox bank that accepts HPB immediately after HIA.
    match download_hpb(&bank, ebics_url, dialect, &config.ebics.host_id, &config.ebics.partner_id, &config.ebics.user_id, &subscriber)
        .await
    {
        Ok(bank_keys) => {
            let auth_pem = public_key_to_pem(&bank_keys.authentication).map_err(|e| AppError::Other(e.into()))?;
            let enc_pem = public_key_to_pem(&bank_keys.encryption).map_err(|e| AppError::Other(e.into()))?;
            let letter = format!("-- authentication key --\n{auth_pem}\n-- encryption key --\n{enc_pem}");
            std::fs::write(&config.ebics.bank_public_keys_file, &letter)
                .map_err(|e| AppError::Other(anyhow::anyhow!("writing bank keys file: {e}")))?;
            nexus_db::subscriber::update_bank_keys(&pool, id, auth_pem.as_bytes(), enc_pem.as_bytes())
                .await
                .map_err(|e| AppError::Other(e.into()))?;
            println!("HPB succeeded; bank public keys recorded and subscriber is ready to transact.");
        }
        Err(error) => {
            println!(
                "HPB did not succeed yet ({error}). Print and send the keys letter for {}/{}, confirm it at the bank, then run `ebics-setup` again.",
                config.ebics.partner_id, config.ebics.user_id
            );
        }
    }

    Ok(())
}

/// Runs the HPB download transaction to fetch the bank's authentication
/// and encryption public keys, using our own encryption key to decrypt the
/// response the way a real download transaction does.
async fn download_hpb(
    bank: &BankClient,
    url: &str,
    dialect: Dialect,
    host_id: &str,
    partner_id: &str,
    user_id: &str,
    subscriber: &Subscriber,
) -> Result<BankKeys, AppError> {
    let init_xml = build_download_init_request(
        dialect,
        host_id,
        partner_id,
        user_id,
        "HPB",
        None,
        &subscriber.authentication_keys.private,
    )
    .map_err(|e| AppError::Other(e.into()))?;
    let init_bytes = bank
        .post_xml(url, init_xml)
        .await
        .map_err(|e| AppError::Other(anyhow::anyhow!("bank connection failed: {e}")))?;
    let init_response = envelope::parse_response(&init_bytes).map_err(|e| AppError::Other(e.into()))?;
    if !init_response.return_code.is_ok() {
        return Err(AppError::Other(anyhow::anyhow!(
            "bank rejected the HPB request: {:?}",
            init_response.return_code
        )));
    }
    // Every response is re-verified once the bank's own authentication key
    // comes out of the decrypted HPB payload below, since that key isn't
    // known in advance of this transaction.
    let mut to_verify = vec![(init_bytes, init_response.clone())];

    let total_segments = init_response.num_segments.unwrap_or(1);
    let first_segment = init_response
        .order_data_segment
        .ok_or_else(|| AppError::Other(anyhow::anyhow!("HPB init response missing OrderData")))?;
    let transaction_id = init_response
        .transaction_id
        .ok_or_else(|| AppError::Other(anyhow::anyhow!("HPB init response missing TransactionID")))?;
    let transaction_key = {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        STANDARD
            .decode(
                init_response
                    .transaction_key_b64
                    .ok_or_else(|| AppError::Other(anyhow::anyhow!("HPB init response missing TransactionKey")))?,
            )
            .map_err(|e| AppError::Other(anyhow::anyhow!("HPB transaction key is not valid base64: {e}")))?
    };
    let recipient_digest = ebics_crypto::public_key_fingerprint(&subscriber.encryption_keys.public);

    let outcome = handle_init_response(
        init_response.return_code,
        total_segments,
        first_segment,
        transaction_key.clone(),
        recipient_digest,
    )
    .map_err(|e| AppError::Other(e.into()))?;
    let (mut phase, mut segments) = match outcome {
        InitOutcome::NoDataAvailable => {
            return Err(AppError::Other(anyhow::anyhow!("bank reported no HPB data available")))
        }
        InitOutcome::Data { phase, first_segment, .. } => (phase, vec![first_segment]),
    };

    while let DownloadPhase::Transfer { next_segment, .. } = phase {
        let segment_xml = build_download_transfer_request(
            dialect,
            &transaction_id,
            next_segment,
            &subscriber.authentication_keys.private,
        )
        .map_err(|e| AppError::Other(e.into()))?;
        let segment_bytes = bank
            .post_xml(url, segment_xml)
            .await
            .map_err(|e| AppError::Other(anyhow::anyhow!("bank connection failed: {e}")))?;
        let response = envelope::parse_response(&segment_bytes).map_err(|e| AppError::Other(e.into()))?;
        segments.push(
            response
                .order_data_segment
                .clone()
                .ok_or_else(|| AppError::Other(anyhow::anyhow!("HPB transfer response missing OrderData")))?,
        );
        to_verify.push((segment_bytes, response));
        phase = advance_transfer(phase);
    }

    let plaintext = finish_download(
        &segments,
        transaction_key,
        recipient_digest,
        &[("default", &subscriber.encryption_keys.private)],
    )
    .map_err(|e| AppError::Other(e.into()))?;

    let receipt_xml = build_download_receipt_request(dialect, &transaction_id, true, &subscriber.authentication_keys.private)
        .map_err(|e| AppError::Other(e.into()))?;
    bank.post_xml(url, receipt_xml)
        .await
        .map_err(|e| AppError::Other(anyhow::anyhow!("bank connection failed: {e}")))?;

    let bank_keys = parse_hpb_response(&plaintext).map_err(|e| AppError::Other(e.into()))?;

    for (raw, parsed) in &to_verify {
        envelope::verify_response_auth(raw, parsed, &bank_keys.authentication)
            .map_err(|e| AppError::Other(anyhow::anyhow!("HPB response failed signature verification: {e}")))?;
    }

    Ok(bank_keys)
}

async fn send_key_management(bank: &BankClient, url: &str, body: Vec<u8>) -> Result<(), AppError> {
    let response = bank
        .post_xml(url, body)
        .await
        .map_err(|e| AppError::Other(anyhow::anyhow!("bank connection failed: {e}")))?;
    let parsed = envelope::parse_response(&response).map_err(|e| AppError::Other(e.into()))?;
    if !parsed.return_code.is_ok() {
        return Err(AppError::Other(anyhow::anyhow!(
            "bank rejected the request: {:?}",
            parsed.return_code
        )));
    }
    Ok(())
}

async fn ebics_submit(config: &Config) -> Result<(), AppError> {
    let pool = connect(config).await?;
    let ctx = load_context(&pool, config).await?;
    let registry = SchedulerRegistry::new();
    let bank = BankClient::new();
    let processed = nexus_scheduler::submit_next(&pool, &registry, &bank, &ctx)
        .await
        .map_err(|e| AppError::Other(e.into()))?;
    if processed {
        println!("submitted the oldest pending initiation");
    } else {
        println!("no pending initiations");
    }
    Ok(())
}

async fn ebics_fetch(config: &Config) -> Result<(), AppError> {
    let pool = connect(config).await?;
    let ctx = load_context(&pool, config).await?;
    let registry = SchedulerRegistry::new();
    let bank = BankClient::new();
    nexus_scheduler::fetch_once(&pool, &registry, &bank, &ctx)
        .await
        .map_err(|e| AppError::Other(e.into()))?;
    println!("fetch pass complete");
    Ok(())
}

fn split_amount(text: &str) -> Result<(Decimal, String), AppError> {
    let (currency, value) = text
        .split_once(':')
        .ok_or_else(|| AppError::Other(anyhow::anyhow!("amount {text:?} missing currency prefix")))?;
    let amount: Decimal = value
        .parse()
        .map_err(|_| AppError::Other(anyhow::anyhow!("amount {text:?} is not a valid decimal")))?;
    Ok((amount, currency.to_string()))
}

async fn initiate_payment(
    config: &Config,
    payto: String,
    amount: String,
    subject: String,
    request_uid: String,
) -> Result<(), AppError> {
    let (amount, currency) = split_amount(&amount)?;
    let (credit_account, _params) =
        payment_domain::Payto::parse(&payto).map_err(|e| AppError::Other(e.into()))?;

    let pool = connect(config).await?;
    let row = nexus_db::initiated::create(
        &pool,
        NewInitiatedPayment {
            amount,
            currency,
            subject,
            credit_payto: credit_account.canonical(),
            request_uid,
        },
    )
    .await
    .map_err(|e| AppError::Other(e.into()))?;
    println!("queued initiation #{} for submission", row.id);
    Ok(())
}

async fn fake_incoming(config: &Config, payto: String, amount: String) -> Result<(), AppError> {
    let (amount, currency) = split_amount(&amount)?;
    let (debit_account, _params) =
        payment_domain::Payto::parse(&payto).map_err(|e| AppError::Other(e.into()))?;

    let pool = connect(config).await?;
    let new = NewIncomingPayment {
        amount,
        currency,
        debit_payto: debit_account.canonical(),
        subject: "manual test deposit".to_string(),
        execution_time: chrono::Utc::now(),
        bank_id: format!("testing-{}", Uuid::new_v4()),
        reserve_pub: None,
    };
    let outcome = nexus_db::incoming::record_if_new(&pool, new)
        .await
        .map_err(|e| AppError::Other(e.into()))?;
    match outcome {
        nexus_db::model::RecordOutcome::Created(row) => println!("recorded fake incoming payment #{}", row.id),
        nexus_db::model::RecordOutcome::Duplicate => println!("a payment with that bank id already existed"),
    }
    Ok(())
}

fn config_command(config: &Config, command: ConfigCommand) -> Result<(), AppError> {
    match command {
        ConfigCommand::Dump => {
            println!("{config:#?}");
            Ok(())
        }
        ConfigCommand::Get { key } => {
            let value = match key.as_str() {
                "nexus-ebics/currency" => config.ebics.currency.clone(),
                "nexus-ebics/host_base_url" => config.ebics.host_base_url.clone(),
                "nexus-ebics/host_id" => config.ebics.host_id.clone(),
                "nexus-ebics/iban" => config.ebics.iban.clone(),
                "nexus-fetch/frequency" => config.fetch.frequency.clone(),
                "libeufin-nexusdb-postgres/config" => config.db.config.clone(),
                other => return Err(AppError::LookupMissing(format!("unknown configuration key {other:?}"))),
            };
            println!("{value}");
            Ok(())
        }
        ConfigCommand::Pathsub => {
            if let Some(sql_dir) = &config.db.sql_dir {
                let text = sql_dir.to_string_lossy();
                let home = std::env::var("HOME").unwrap_or_default();
                println!("{}", text.replacen('~', &home, 1));
            } else {
                println!("(sql_dir not configured)");
            }
            Ok(())
        }
    }
}
