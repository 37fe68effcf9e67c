use actix_web::{HttpResponse, Result as ActixResult, web};
use distributor_common::hex_to_address;
use std::time::Instant;

use crate::app::AppState;
use crate::error::{Error, Result};
use crate::models::{
    BalanceResponse, ClaimRequest, ClaimResponse, ClaimedResponse, ProofResponse, RootResponse,
};
use crate::utils::to_hex;

/// Health check endpoint
pub async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({"status": "healthy"})))
}

/// The published commitment.
pub async fn root(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(RootResponse {
        merkle_root: to_hex(state.service.merkle_root()),
        leaf_count: state.tree.leaf_count(),
        depth: state.tree.depth(),
        claimed_count: state.service.claimed_count(),
        asset: state.service.asset().to_string(),
    }))
}

/// Inclusion proof plus the entry it proves, for distribution to the claimant.
pub async fn proof(
    path: web::Path<u64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let index = path.into_inner();
    let siblings = state.tree.proof(index)?;
    let entry = &state.entries[index as usize];

    Ok(HttpResponse::Ok().json(ProofResponse {
        index,
        account: to_hex(entry.account),
        amount: entry.amount,
        proof: siblings.iter().map(|sibling| to_hex(sibling)).collect(),
    }))
}

pub async fn claim(
    req: web::Json<ClaimRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let start_time = Instant::now();
    let req = req.into_inner();
    tracing::debug!(
        "Received claim request: index={}, account={}, amount={}, proof_len={}",
        req.index,
        req.account,
        req.amount,
        req.proof.len()
    );

    let (account, proof) = req.decode().inspect_err(|e| {
        tracing::warn!("Malformed claim request for index {}: {}", req.index, e);
    })?;

    // The transfer capability may block, so keep it off the async workers.
    let index = req.index;
    let amount = req.amount;
    let event = web::block(move || state.service.claim(index, &account, amount, &proof))
        .await
        .map_err(|e| Error::Internal(format!("claim worker failed: {e}")))??;

    tracing::info!(
        "Claim for index {} completed in {:.2}ms",
        event.index,
        start_time.elapsed().as_secs_f64() * 1000.0
    );

    Ok(HttpResponse::Ok().json(ClaimResponse {
        claimed: true,
        index: event.index,
        account: to_hex(event.account),
        amount: event.amount,
    }))
}

pub async fn is_claimed(
    path: web::Path<u64>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let index = path.into_inner();
    Ok(HttpResponse::Ok().json(ClaimedResponse {
        index,
        claimed: state.service.is_claimed(index),
    }))
}

pub async fn balance(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let account = hex_to_address(&path)
        .map_err(|e| Error::Hex(format!("account '{}': {}", path.as_str(), e)))?;

    match state.service.balance_of(&account) {
        Some(balance) => Ok(HttpResponse::Ok().json(BalanceResponse {
            account: to_hex(account),
            balance,
        })),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("{} does not report balances", state.service.asset())
        }))),
    }
}
