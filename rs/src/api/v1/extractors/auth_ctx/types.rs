/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - token middleware が decode して attributes に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - 署名/期限の検証は token_gate (JwtDecoder) の責務
 * - ここは claims から handler が使う値を取り出すだけ
 */
use serde_json::{Map, Value};
use token_gate::DecodedToken;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `subject` は `sub` claim (文字列でなければ None)
/// - `roles` は `roles` (文字列の配列) または `role` (文字列) claim
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub subject: Option<String>,
    pub roles: Vec<String>,
    pub claims: Map<String, Value>,
}

impl AuthCtx {
    pub fn from_token(token: &DecodedToken) -> Self {
        Self {
            subject: token.subject().map(str::to_string),
            roles: roles(token),
            claims: token.claims().clone(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

fn roles(token: &DecodedToken) -> Vec<String> {
    match (token.claim("roles"), token.claim("role")) {
        (Some(Value::Array(roles)), _) => roles
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        (_, Some(Value::String(role))) => vec![role.clone()],
        _ => Vec::new(),
    }
}
