/*
 * Responsibility
 * - GET /api/v1/whoami: token の状態をそのまま返す (匿名でも 200)
 * - GET /api/v1/me: decode 済み token の claims (gate の後ろ)
 * - GET /api/v1/admin: role=admin の token のみ (gate の後ろ)
 */
use axum::{
    Json,
    extract::{Request, State},
};
use serde_json::{Value, json};
use token_gate::{Attribute, AttributesExt};

use crate::api::v1::extractors::auth_ctx::AuthCtxExtractor;
use crate::state::AppState;

pub async fn whoami(State(state): State<AppState>, req: Request) -> Json<Value> {
    let attrs = req.attributes();
    let names = &state.attributes;

    let body = match (attrs.get(names.token()), attrs.get(names.error())) {
        (Some(Attribute::Token(token)), _) => json!({
            "authenticated": true,
            "subject": token.subject(),
        }),
        (_, Some(error)) => json!({
            "authenticated": false,
            "error": error.to_json(),
        }),
        _ => json!({ "authenticated": false }),
    };
    Json(body)
}

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<Value> {
    Json(json!({
        "subject": ctx.subject,
        "roles": ctx.roles,
        "claims": ctx.claims,
    }))
}

pub async fn admin(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<Value> {
    Json(json!({
        "subject": ctx.subject,
        "admin": true,
    }))
}
