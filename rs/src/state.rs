/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - extractor が attributes を読むための名前 (token / token.error)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use token_gate::AttributeNames;

#[derive(Clone, Debug)]
pub struct AppState {
    pub attributes: Arc<AttributeNames>,
}

impl AppState {
    pub fn new(attributes: AttributeNames) -> Self {
        Self {
            attributes: Arc::new(attributes),
        }
    }
}
