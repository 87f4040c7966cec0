use actix_web::{web, HttpResponse};
use airdrop_scanner_logic::{normalize_wallets, ScanOptions, ScanTotals, WalletSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{websocket, AppState};

/// Synchronous checks block an http worker per wallet batch, so the batch
/// stays small; larger lists go through the bulk job endpoints.
const MAX_SYNC_WALLETS: usize = 25;

pub fn configure(config: &mut web::ServiceConfig) {
    config
        .route("/health", web::get().to(health))
        .route("/ws", web::get().to(websocket::ws_entry))
        .service(
            web::scope("/api/v1")
                .route("/airdrops", web::get().to(list_airdrops))
                .route("/chains", web::get().to(list_chains))
                .route("/check", web::post().to(check_wallets))
                .route("/bulk/jobs", web::post().to(create_bulk_job))
                .route("/bulk/jobs/{id}", web::get().to(get_bulk_job))
                .route("/bulk/jobs/{id}/results", web::get().to(get_bulk_job_results)),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn list_airdrops(state: web::Data<AppState>) -> HttpResponse {
    let items = state.checker.catalog();
    HttpResponse::Ok().json(json!({
        "count": items.len(),
        "items": items,
    }))
}

#[derive(Serialize)]
struct ChainView<'a> {
    key: &'a str,
    family: airdrop_scanner_logic::ChainFamily,
    name: &'a str,
}

async fn list_chains(state: web::Data<AppState>) -> HttpResponse {
    let mut items: Vec<ChainView> = state
        .chains
        .iter()
        .map(|chain| ChainView {
            key: &chain.key,
            family: chain.family,
            name: &chain.name,
        })
        .collect();
    items.sort_by(|a, b| a.key.cmp(b.key));
    HttpResponse::Ok().json(json!({
        "count": items.len(),
        "items": items,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    #[serde(default)]
    wallets: Vec<String>,
    include_transfers: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckResponse {
    generated_at: DateTime<Utc>,
    wallets: Vec<WalletSummary>,
    totals: ScanTotals,
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": message }))
}

async fn check_wallets(
    state: web::Data<AppState>,
    body: web::Json<CheckRequest>,
) -> HttpResponse {
    let wallets = normalize_wallets(&body.wallets);
    if wallets.is_empty() {
        return bad_request("No valid wallets supplied");
    }
    if wallets.len() > MAX_SYNC_WALLETS {
        return bad_request("Too many wallets; maximum is 25 per request");
    }

    let options = ScanOptions {
        include_transfers: body.include_transfers.unwrap_or(true),
    };
    let mut summaries = Vec::with_capacity(wallets.len());
    for wallet in &wallets {
        summaries.push(state.checker.check_wallet(wallet, options).await);
    }
    let totals = ScanTotals::aggregate(&summaries);
    HttpResponse::Ok().json(CheckResponse {
        generated_at: Utc::now(),
        wallets: summaries,
        totals,
    })
}

async fn create_bulk_job(
    state: web::Data<AppState>,
    body: web::Json<CheckRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    let options = ScanOptions {
        include_transfers: body.include_transfers.unwrap_or(true),
    };
    match state.bulk.create_job(body.wallets, options) {
        Ok(id) => match state.bulk.get_job(id) {
            Some(view) => HttpResponse::Accepted().json(view),
            // the job finished and expired between the two calls; report it anyway
            None => HttpResponse::Accepted().json(json!({ "jobId": id })),
        },
        Err(err) => bad_request(&err.to_string()),
    }
}

async fn get_bulk_job(state: web::Data<AppState>, id: web::Path<Uuid>) -> HttpResponse {
    match state.bulk.get_job(*id) {
        Some(view) => HttpResponse::Ok().json(view),
        None => HttpResponse::NotFound().json(json!({ "error": "Job not found" })),
    }
}

async fn get_bulk_job_results(state: web::Data<AppState>, id: web::Path<Uuid>) -> HttpResponse {
    match state.bulk.get_job_results(*id) {
        Some(results) => HttpResponse::Ok().json(results),
        None => HttpResponse::NotFound()
            .json(json!({ "error": "Result not ready or job missing" })),
    }
}
