/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - token middleware を v1 全体に、gate (predicate middleware) を保護対象の route にだけ適用する
 *   - /whoami: token 任意
 *   - /me: 有効な token 必須
 *   - /admin: 有効な token かつ role=admin
 */
use axum::{Router, routing::get};
use token_gate::{AuthFactory, ConfigError, TokenSettings};

use crate::api::v1::extractors::auth_ctx::AuthCtx;
use crate::api::v1::handlers::me::{admin, me, whoami};
use crate::state::AppState;

pub fn routes(
    factory: &AuthFactory,
    settings: &TokenSettings,
) -> Result<Router<AppState>, ConfigError> {
    let names = &settings.attributes;

    let authenticated = factory
        .assert_tokens(names)
        .apply(Router::new().route("/me", get(me)));

    let admins = factory
        .inspect_tokens(
            |token, _req| AuthCtx::from_token(token).has_role("admin"),
            names,
        )
        .apply(Router::new().route("/admin", get(admin)));

    let router = Router::new()
        .route("/whoami", get(whoami))
        .merge(authenticated)
        .merge(admins);

    Ok(factory.decode_tokens(settings)?.apply(router))
}
