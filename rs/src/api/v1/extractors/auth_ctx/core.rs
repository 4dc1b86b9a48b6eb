use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use token_gate::AttributesExt;

use crate::error::AppError;
use crate::state::AppState;

use super::AuthCtx;

/// Handler で AuthCtx を受け取るための extractor
/// token middleware が token attribute に decode 済み token を書いている前提
/// 見つからない場合は 401 を返す (token なし / decode 失敗 / middleware 未設定)
pub struct AuthCtxExtractor(pub AuthCtx);

impl FromRequestParts<AppState> for AuthCtxExtractor
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .attributes()
            .token(state.attributes.token())
            .map(|token| AuthCtxExtractor(AuthCtx::from_token(token)))
            .ok_or(AppError::Unauthorized)
    }
}
