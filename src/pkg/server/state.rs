use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Pool, Postgres, Transaction, postgres::PgPoolOptions};

use crate::{
    conf::settings,
    pkg::internal::{
        ai::{analyze::AnalysisFunction, gateway::AiGateway, transcribe::TranscriptionFunction},
        business_case::BcqService,
        minio::{S3Storage, create_bucket},
        store::{BcqStore, PgStore},
    },
    prelude::Result,
};

#[async_trait]
pub trait GetTxn {
    async fn begin_txn(&self) -> Result<Transaction<'static, Postgres>>;
}

#[async_trait]
impl GetTxn for Arc<PgPool> {
    async fn begin_txn(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.begin().await?)
    }
}

pub fn db_pool() -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_pool_max_connections)
        .connect_lazy(&settings.database_url)?;
    Ok(pool)
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<PgPool>,
    pub bcq: BcqService,
    pub recruiter_key: Arc<str>,
}

impl AppState {
    pub async fn new() -> Result<AppState> {
        let db_pool = Arc::new(db_pool()?);
        let store: Arc<dyn BcqStore> = Arc::new(PgStore::new(db_pool.clone()));
        let storage = S3Storage::from_settings();
        if let Err(e) = create_bucket(storage.client(), &settings.s3_bucket_name).await {
            tracing::warn!("could not ensure bucket {}: {}", &settings.s3_bucket_name, &e);
        }
        let gateway = Arc::new(AiGateway::from_settings());
        let bcq = BcqService::new(
            store.clone(),
            Arc::new(storage),
            TranscriptionFunction::new(gateway.clone(), store.clone()),
            AnalysisFunction::new(gateway, store),
            &settings.s3_bucket_name,
            &settings.base_url,
        );
        if settings.recruiter_api_key.is_empty() {
            tracing::warn!("recruiter_api_key is not set, recruiter routes will reject every request");
        }
        Ok(AppState {
            db_pool,
            bcq,
            recruiter_key: Arc::from(settings.recruiter_api_key.as_str()),
        })
    }
}
